//! T-范数与 S-范数
//!
//! 规则块的合取（conjunction）、析取（disjunction）与蕴含（implication）
//! 组合算子。所有实现均为无状态纯函数，可通过 `Arc` 在多个规则块间共享。

use crate::error::{ReferenceKind, Result, RuleError};
use crate::factory::ConstructionFactory;
use crate::function::Formula;
use crate::operation;
use std::fmt;
use std::sync::Arc;

/// T-范数（模糊与）
pub trait TNorm: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, a: f64, b: f64) -> f64;
}

/// S-范数（模糊或）
pub trait SNorm: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn compute(&self, a: f64, b: f64) -> f64;
}

macro_rules! norm {
    ($(#[$meta:meta])* $name:ident: $kind:ident, |$a:ident, $b:ident| $body:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
        pub struct $name;

        impl $kind for $name {
            fn name(&self) -> &str {
                stringify!($name)
            }

            fn compute(&self, $a: f64, $b: f64) -> f64 {
                $body
            }
        }
    };
}

// ==================== T-范数 ====================

norm!(AlgebraicProduct: TNorm, |a, b| a * b);

norm!(BoundedDifference: TNorm, |a, b| 0.0_f64.max(a + b - 1.0));

norm!(
    /// 任一为 1 时取最小值，否则为 0
    DrasticProduct: TNorm,
    |a, b| if operation::is_eq(a.max(b), 1.0) { a.min(b) } else { 0.0 }
);

norm!(EinsteinProduct: TNorm, |a, b| (a * b) / (2.0 - (a + b - a * b)));

norm!(HamacherProduct: TNorm, |a, b| {
    if operation::is_eq(a + b, 0.0) {
        0.0
    } else {
        (a * b) / (a + b - a * b)
    }
});

norm!(Minimum: TNorm, |a, b| a.min(b));

norm!(NilpotentMinimum: TNorm, |a, b| {
    if operation::is_gt(a + b, 1.0) {
        a.min(b)
    } else {
        0.0
    }
});

// ==================== S-范数 ====================

norm!(AlgebraicSum: SNorm, |a, b| a + b - (a * b));

norm!(BoundedSum: SNorm, |a, b| 1.0_f64.min(a + b));

norm!(
    /// 任一为 0 时取最大值，否则为 1
    DrasticSum: SNorm,
    |a, b| if operation::is_eq(a.min(b), 0.0) { a.max(b) } else { 1.0 }
);

norm!(EinsteinSum: SNorm, |a, b| (a + b) / (1.0 + a * b));

norm!(HamacherSum: SNorm, |a, b| {
    if operation::is_eq(a * b, 1.0) {
        1.0
    } else {
        (a + b - 2.0 * a * b) / (1.0 - a * b)
    }
});

norm!(Maximum: SNorm, |a, b| a.max(b));

norm!(NilpotentMaximum: SNorm, |a, b| {
    if operation::is_lt(a + b, 1.0) {
        a.max(b)
    } else {
        1.0
    }
});

norm!(NormalizedSum: SNorm, |a, b| (a + b) / 1.0_f64.max(a + b));

norm!(UnboundedSum: SNorm, |a, b| a + b);

/// 由公式定义的范数，公式中以 `a`、`b` 表示两个操作数，可同时用作 T/S-范数
#[derive(Debug, Clone)]
pub struct NormFunction {
    formula: Formula,
}

impl NormFunction {
    pub fn new(formula: Formula) -> Result<Self> {
        if let Some(unbound) = formula.unbound_variables(&["a", "b"]).into_iter().next() {
            return Err(RuleError::unresolved(ReferenceKind::Variable, unbound));
        }
        Ok(Self { formula })
    }

    pub fn parse(text: &str) -> Result<Self> {
        Self::new(Formula::parse(text)?)
    }

    pub fn formula(&self) -> &Formula {
        &self.formula
    }

    fn evaluate(&self, a: f64, b: f64) -> f64 {
        self.formula
            .evaluate_with(&[("a", a), ("b", b)])
            .unwrap_or(f64::NAN)
    }
}

impl TNorm for NormFunction {
    fn name(&self) -> &str {
        "NormFunction"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        self.evaluate(a, b)
    }
}

impl SNorm for NormFunction {
    fn name(&self) -> &str {
        "NormFunction"
    }

    fn compute(&self, a: f64, b: f64) -> f64 {
        self.evaluate(a, b)
    }
}

/// 内置 T-范数工厂，键为类型名
pub fn tnorm_factory() -> ConstructionFactory<Arc<dyn TNorm>> {
    let mut factory: ConstructionFactory<Arc<dyn TNorm>> = ConstructionFactory::new("TNormFactory");
    factory.register("AlgebraicProduct", || Arc::new(AlgebraicProduct));
    factory.register("BoundedDifference", || Arc::new(BoundedDifference));
    factory.register("DrasticProduct", || Arc::new(DrasticProduct));
    factory.register("EinsteinProduct", || Arc::new(EinsteinProduct));
    factory.register("HamacherProduct", || Arc::new(HamacherProduct));
    factory.register("Minimum", || Arc::new(Minimum));
    factory.register("NilpotentMinimum", || Arc::new(NilpotentMinimum));
    factory
}

/// 内置 S-范数工厂，键为类型名
pub fn snorm_factory() -> ConstructionFactory<Arc<dyn SNorm>> {
    let mut factory: ConstructionFactory<Arc<dyn SNorm>> = ConstructionFactory::new("SNormFactory");
    factory.register("AlgebraicSum", || Arc::new(AlgebraicSum));
    factory.register("BoundedSum", || Arc::new(BoundedSum));
    factory.register("DrasticSum", || Arc::new(DrasticSum));
    factory.register("EinsteinSum", || Arc::new(EinsteinSum));
    factory.register("HamacherSum", || Arc::new(HamacherSum));
    factory.register("Maximum", || Arc::new(Maximum));
    factory.register("NilpotentMaximum", || Arc::new(NilpotentMaximum));
    factory.register("NormalizedSum", || Arc::new(NormalizedSum));
    factory.register("UnboundedSum", || Arc::new(UnboundedSum));
    factory
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_tnorm(norm: &dyn TNorm, cases: &[(f64, f64, f64)]) {
        for &(a, b, expected) in cases {
            let actual = norm.compute(a, b);
            assert!(
                (actual - expected).abs() < 1e-9,
                "{}({a}, {b}) = {actual}, expected {expected}",
                norm.name()
            );
        }
    }

    fn assert_snorm(norm: &dyn SNorm, cases: &[(f64, f64, f64)]) {
        for &(a, b, expected) in cases {
            let actual = norm.compute(a, b);
            assert!(
                (actual - expected).abs() < 1e-9,
                "{}({a}, {b}) = {actual}, expected {expected}",
                norm.name()
            );
        }
    }

    #[test]
    fn test_minimum_and_maximum() {
        assert_tnorm(&Minimum, &[(0.3, 0.7, 0.3), (1.0, 0.0, 0.0)]);
        assert_snorm(&Maximum, &[(0.3, 0.7, 0.7), (1.0, 0.0, 1.0)]);
    }

    #[test]
    fn test_tnorms() {
        assert_tnorm(&AlgebraicProduct, &[(0.5, 0.5, 0.25), (1.0, 0.75, 0.75)]);
        assert_tnorm(&BoundedDifference, &[(0.5, 0.25, 0.0), (0.75, 0.75, 0.5)]);
        assert_tnorm(&DrasticProduct, &[(1.0, 0.25, 0.25), (0.75, 0.75, 0.0)]);
        assert_tnorm(&EinsteinProduct, &[(0.5, 0.5, 0.25 / 1.25), (1.0, 0.5, 0.5)]);
        assert_tnorm(&HamacherProduct, &[(0.0, 0.0, 0.0), (0.5, 0.5, 0.25 / 0.75)]);
        assert_tnorm(&NilpotentMinimum, &[(0.75, 0.5, 0.5), (0.5, 0.25, 0.0), (0.5, 0.5, 0.0)]);
    }

    #[test]
    fn test_snorms() {
        assert_snorm(&AlgebraicSum, &[(0.5, 0.5, 0.75), (0.0, 0.25, 0.25)]);
        assert_snorm(&BoundedSum, &[(0.75, 0.75, 1.0), (0.25, 0.5, 0.75)]);
        assert_snorm(&DrasticSum, &[(0.0, 0.25, 0.25), (0.5, 0.25, 1.0)]);
        assert_snorm(&EinsteinSum, &[(0.5, 0.5, 1.0 / 1.25), (0.0, 0.5, 0.5)]);
        assert_snorm(&HamacherSum, &[(1.0, 1.0, 1.0), (0.5, 0.5, 0.5 / 0.75)]);
        assert_snorm(&NilpotentMaximum, &[(0.25, 0.5, 0.5), (0.5, 0.5, 1.0)]);
        assert_snorm(&NormalizedSum, &[(0.25, 0.5, 0.75), (0.75, 0.75, 1.0)]);
        assert_snorm(&UnboundedSum, &[(0.75, 0.75, 1.5)]);
    }

    #[test]
    fn test_norm_function() {
        let norm = NormFunction::parse("a + b - (a * b)").unwrap();
        assert_snorm(&norm, &[(0.5, 0.5, 0.75)]);
        assert_tnorm(&NormFunction::parse("min(a, b)").unwrap(), &[(0.3, 0.7, 0.3)]);
    }

    #[test]
    fn test_norm_function_rejects_unbound_variables() {
        assert!(NormFunction::parse("a * c").is_err());
    }

    #[test]
    fn test_factories_are_keyed_by_type_name() {
        let tnorms = tnorm_factory();
        for key in tnorms.keys() {
            assert_eq!(tnorms.construct(key).unwrap().name(), key);
        }
        let snorms = snorm_factory();
        for key in snorms.keys() {
            assert_eq!(snorms.construct(key).unwrap().name(), key);
        }
        assert_eq!(tnorms.keys().len(), 7);
        assert_eq!(snorms.keys().len(), 9);
    }

    #[test]
    fn test_unknown_norm_key() {
        let err = tnorm_factory().construct("Maximum").unwrap_err().to_string();
        assert!(err.contains("TNormFactory"));
        assert!(err.contains("Maximum"));
    }
}
