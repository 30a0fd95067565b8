//! 语气算子（hedge）
//!
//! 作用于隶属度的单参数修饰函数。命题中的语气算子按声明顺序的逆序应用，
//! 离术语最近的先生效。

use crate::error::{ReferenceKind, Result, RuleError};
use crate::factory::ConstructionFactory;
use crate::function::Formula;
use std::fmt;
use std::sync::Arc;

pub trait Hedge: fmt::Debug + Send + Sync {
    /// 注册键，同时也是规则文本中的写法
    fn name(&self) -> &str;

    fn hedge(&self, x: f64) -> f64;
}

/// 是否为 `any`：出现在语气链末尾时命题不再查询隶属度
pub fn is_any(hedge: &dyn Hedge) -> bool {
    hedge.name() == Any::NAME
}

/// 任意值，恒为 1
#[derive(Debug, Clone, Copy, Default)]
pub struct Any;

impl Any {
    pub const NAME: &'static str = "any";
}

impl Hedge for Any {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn hedge(&self, _x: f64) -> f64 {
        1.0
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Extremely;

impl Hedge for Extremely {
    fn name(&self) -> &str {
        "extremely"
    }

    fn hedge(&self, x: f64) -> f64 {
        if x <= 0.5 {
            2.0 * x * x
        } else {
            1.0 - 2.0 * (1.0 - x) * (1.0 - x)
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Not;

impl Hedge for Not {
    fn name(&self) -> &str {
        "not"
    }

    fn hedge(&self, x: f64) -> f64 {
        1.0 - x
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Seldom;

impl Hedge for Seldom {
    fn name(&self) -> &str {
        "seldom"
    }

    fn hedge(&self, x: f64) -> f64 {
        if x <= 0.5 {
            (0.5 * x).sqrt()
        } else {
            1.0 - (0.5 * (1.0 - x)).sqrt()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Somewhat;

impl Hedge for Somewhat {
    fn name(&self) -> &str {
        "somewhat"
    }

    fn hedge(&self, x: f64) -> f64 {
        x.sqrt()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Very;

impl Hedge for Very {
    fn name(&self) -> &str {
        "very"
    }

    fn hedge(&self, x: f64) -> f64 {
        x * x
    }
}

/// 由公式定义的语气算子，公式中以 `x` 表示输入隶属度
#[derive(Debug, Clone)]
pub struct HedgeFunction {
    name: String,
    formula: Formula,
}

impl HedgeFunction {
    /// 公式只能引用 `x` 或公式自身已设置的变量
    pub fn new(name: impl Into<String>, formula: Formula) -> Result<Self> {
        if let Some(unbound) = formula.unbound_variables(&["x"]).into_iter().next() {
            return Err(RuleError::unresolved(ReferenceKind::Variable, unbound));
        }
        Ok(Self {
            name: name.into(),
            formula,
        })
    }

    pub fn parse(name: impl Into<String>, text: &str) -> Result<Self> {
        Self::new(name, Formula::parse(text)?)
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }
}

impl Hedge for HedgeFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn hedge(&self, x: f64) -> f64 {
        // 构造时已校验变量绑定，求值只可能因数值本身失败
        self.formula.evaluate_with(&[("x", x)]).unwrap_or(f64::NAN)
    }
}

/// 内置语气算子工厂
pub fn hedge_factory() -> ConstructionFactory<Arc<dyn Hedge>> {
    let mut factory: ConstructionFactory<Arc<dyn Hedge>> = ConstructionFactory::new("HedgeFactory");
    factory.register(Any::NAME, || Arc::new(Any));
    factory.register("extremely", || Arc::new(Extremely));
    factory.register("not", || Arc::new(Not));
    factory.register("seldom", || Arc::new(Seldom));
    factory.register("somewhat", || Arc::new(Somewhat));
    factory.register("very", || Arc::new(Very));
    factory
}
