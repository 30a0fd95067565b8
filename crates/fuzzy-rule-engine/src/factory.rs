//! 按字符串键注册的工厂
//!
//! - [`ConstructionFactory`]：键 → 无参构造闭包，每次构造一个新实例
//! - [`CloningFactory`]：键 → 原型值，每次返回原型的独立副本
//!
//! 查找未注册的键一律返回 `RuleError::Configuration`，错误信息同时包含
//! 工厂名称和键，不会静默返回默认值。
//!
//! [`Factories`] 汇总全部内置工厂，供规则块定义按键构建组合算子和激活策略。

use crate::activation::{Activation, activation_factory};
use crate::error::{Result, RuleError};
use crate::function::FunctionFactory;
use crate::hedge::{Hedge, hedge_factory};
use crate::norm::{SNorm, TNorm, snorm_factory, tnorm_factory};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

type Constructor<T> = Box<dyn Fn() -> T + Send + Sync>;

/// 构造工厂
pub struct ConstructionFactory<T> {
    name: &'static str,
    constructors: BTreeMap<String, Constructor<T>>,
}

impl<T> ConstructionFactory<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            constructors: BTreeMap::new(),
        }
    }

    /// 工厂名称（用于错误信息）
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 注册构造器，同名键会被覆盖
    pub fn register<F>(&mut self, key: impl Into<String>, constructor: F)
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        self.constructors.insert(key.into(), Box::new(constructor));
    }

    pub fn deregister(&mut self, key: &str) -> bool {
        self.constructors.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.constructors.contains_key(key)
    }

    /// 已注册的键（按字典序）
    pub fn keys(&self) -> Vec<&str> {
        self.constructors.keys().map(String::as_str).collect()
    }

    /// 构造新实例
    pub fn construct(&self, key: &str) -> Result<T> {
        self.constructors
            .get(key)
            .map(|constructor| constructor())
            .ok_or_else(|| RuleError::configuration(self.name, key))
    }
}

impl<T> fmt::Debug for ConstructionFactory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructionFactory")
            .field("name", &self.name)
            .field("keys", &self.keys())
            .finish()
    }
}

/// 克隆工厂
#[derive(Debug, Clone)]
pub struct CloningFactory<T: Clone> {
    name: &'static str,
    objects: BTreeMap<String, T>,
}

impl<T: Clone> CloningFactory<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            objects: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn register(&mut self, key: impl Into<String>, prototype: T) {
        self.objects.insert(key.into(), prototype);
    }

    pub fn deregister(&mut self, key: &str) -> bool {
        self.objects.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.objects.contains_key(key)
    }

    pub fn keys(&self) -> Vec<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    /// 原型的只读引用
    pub fn get(&self, key: &str) -> Option<&T> {
        self.objects.get(key)
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.objects.values()
    }

    /// 返回原型的独立副本
    pub fn copy(&self, key: &str) -> Result<T> {
        self.objects
            .get(key)
            .cloned()
            .ok_or_else(|| RuleError::configuration(self.name, key))
    }
}

/// 全部内置工厂
#[derive(Debug)]
pub struct Factories {
    pub tnorms: ConstructionFactory<Arc<dyn TNorm>>,
    pub snorms: ConstructionFactory<Arc<dyn SNorm>>,
    pub hedges: ConstructionFactory<Arc<dyn Hedge>>,
    pub activations: ConstructionFactory<Arc<dyn Activation>>,
    pub functions: FunctionFactory,
}

impl Factories {
    pub fn new() -> Self {
        Self {
            tnorms: tnorm_factory(),
            snorms: snorm_factory(),
            hedges: hedge_factory(),
            activations: activation_factory(),
            functions: FunctionFactory::new(),
        }
    }
}

impl Default for Factories {
    fn default() -> Self {
        Self::new()
    }
}
