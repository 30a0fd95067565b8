//! 语言术语（隶属函数）
//!
//! 只提供规则求值需要的几种基本形状。NaN 输入一律得到 NaN。

use std::fmt;

pub trait Term: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// 在 x 处的隶属度
    fn membership(&self, x: f64) -> f64;
}

/// 三角形：顶点 (a, 0)、(b, 1)、(c, 0)
#[derive(Debug, Clone, PartialEq)]
pub struct Triangle {
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Triangle {
    pub fn new(name: impl Into<String>, a: f64, b: f64, c: f64) -> Self {
        Self {
            name: name.into(),
            a,
            b,
            c,
        }
    }
}

impl Term for Triangle {
    fn name(&self) -> &str {
        &self.name
    }

    fn membership(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.a || x > self.c {
            return 0.0;
        }
        if x == self.b {
            return 1.0;
        }
        if x < self.b {
            if self.a == f64::NEG_INFINITY {
                return 1.0;
            }
            return (x - self.a) / (self.b - self.a);
        }
        if self.c == f64::INFINITY {
            return 1.0;
        }
        (self.c - x) / (self.c - self.b)
    }
}

/// 梯形：顶点 (a, 0)、(b, 1)、(c, 1)、(d, 0)
#[derive(Debug, Clone, PartialEq)]
pub struct Trapezoid {
    pub name: String,
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl Trapezoid {
    pub fn new(name: impl Into<String>, a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            name: name.into(),
            a,
            b,
            c,
            d,
        }
    }
}

impl Term for Trapezoid {
    fn name(&self) -> &str {
        &self.name
    }

    fn membership(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if x < self.a || x > self.d {
            return 0.0;
        }
        if x < self.b {
            if self.a == f64::NEG_INFINITY {
                return 1.0;
            }
            return (x - self.a) / (self.b - self.a);
        }
        if x <= self.c {
            return 1.0;
        }
        if x < self.d {
            return (self.d - x) / (self.d - self.c);
        }
        if self.d == f64::INFINITY { 1.0 } else { 0.0 }
    }
}

/// 矩形：[start, end] 内为 1
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub name: String,
    pub start: f64,
    pub end: f64,
}

impl Rectangle {
    pub fn new(name: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            name: name.into(),
            start,
            end,
        }
    }
}

impl Term for Rectangle {
    fn name(&self) -> &str {
        &self.name
    }

    fn membership(&self, x: f64) -> f64 {
        if x.is_nan() {
            return f64::NAN;
        }
        if self.start <= x && x <= self.end { 1.0 } else { 0.0 }
    }
}

/// 常量
#[derive(Debug, Clone, PartialEq)]
pub struct Constant {
    pub name: String,
    pub value: f64,
}

impl Constant {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl Term for Constant {
    fn name(&self) -> &str {
        &self.name
    }

    fn membership(&self, x: f64) -> f64 {
        if x.is_nan() { f64::NAN } else { self.value }
    }
}
