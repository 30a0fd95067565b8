//! 基于容差的数值比较
//!
//! 相差小于容差的两个浮点数视为相等，因此永远不会被判定为严格有序。
//! NaN 与 NaN 视为相等：NaN 表示"未定义/不关心"的隶属度，
//! 这样 `neq` 不会在两个未定义值之间给出误报。

use crate::settings;

pub use crate::settings::{set_tolerance, tolerance};

/// `a == b`，或 `|a - b| < tolerance`，或两者均为 NaN
pub fn is_eq_with(a: f64, b: f64, tolerance: f64) -> bool {
    a == b || (a - b).abs() < tolerance || (a.is_nan() && b.is_nan())
}

pub fn is_neq_with(a: f64, b: f64, tolerance: f64) -> bool {
    !is_eq_with(a, b, tolerance)
}

pub fn is_gt_with(a: f64, b: f64, tolerance: f64) -> bool {
    !is_eq_with(a, b, tolerance) && a > b
}

pub fn is_ge_with(a: f64, b: f64, tolerance: f64) -> bool {
    is_eq_with(a, b, tolerance) || a > b
}

pub fn is_lt_with(a: f64, b: f64, tolerance: f64) -> bool {
    !is_eq_with(a, b, tolerance) && a < b
}

pub fn is_le_with(a: f64, b: f64, tolerance: f64) -> bool {
    is_eq_with(a, b, tolerance) || a < b
}

pub fn is_eq(a: f64, b: f64) -> bool {
    is_eq_with(a, b, settings::tolerance())
}

pub fn is_neq(a: f64, b: f64) -> bool {
    is_neq_with(a, b, settings::tolerance())
}

pub fn is_gt(a: f64, b: f64) -> bool {
    is_gt_with(a, b, settings::tolerance())
}

pub fn is_ge(a: f64, b: f64) -> bool {
    is_ge_with(a, b, settings::tolerance())
}

pub fn is_lt(a: f64, b: f64) -> bool {
    is_lt_with(a, b, settings::tolerance())
}

pub fn is_le(a: f64, b: f64) -> bool {
    is_le_with(a, b, settings::tolerance())
}

/// 将 x 限制在 [minimum, maximum] 内，NaN 原样返回
pub fn bound(x: f64, minimum: f64, maximum: f64) -> f64 {
    if x > maximum {
        maximum
    } else if x < minimum {
        minimum
    } else {
        x
    }
}

/// 逻辑值转换为 1.0 / 0.0
pub fn truth(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}
