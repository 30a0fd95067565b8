//! 规则前件
//!
//! 加载时把文本解析为表达式树，求值时递归遍历：
//! - 命题：变量禁用为 0；语气链以 `any` 结尾时从 NaN 起逆序应用语气链，
//!   不查询隶属度；否则取输入变量的隶属度或输出变量的累计激活度，
//!   再逆序应用语气链
//! - `and` / `or`：分别使用规则块的合取 / 析取算子

use crate::catalogue::{Catalogue, VariableKind};
use crate::error::{ParseError, Result, RuleError};
use crate::expression::{Expression, Proposition};
use crate::function::FunctionFactory;
use crate::norm::{SNorm, TNorm};
use crate::operators::LogicalOperator;
use crate::parser;

#[derive(Debug, Clone)]
pub struct Antecedent {
    text: String,
    expression: Option<Expression>,
}

impl Antecedent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            expression: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn expression(&self) -> Option<&Expression> {
        self.expression.as_ref()
    }

    pub fn is_loaded(&self) -> bool {
        self.expression.is_some()
    }

    /// 解析文本并解析所有名字，失败时保持未加载
    pub fn load(&mut self, catalogue: &dyn Catalogue) -> Result<()> {
        self.unload();
        let expression = parser::parse_antecedent(&self.text, catalogue, FunctionFactory::shared())?;
        self.expression = Some(expression);
        Ok(())
    }

    pub fn unload(&mut self) {
        self.expression = None;
    }

    /// 计算激活度
    pub fn activation_degree(
        &self,
        conjunction: Option<&dyn TNorm>,
        disjunction: Option<&dyn SNorm>,
        catalogue: &dyn Catalogue,
    ) -> Result<f64> {
        let expression = self
            .expression
            .as_ref()
            .ok_or_else(|| RuleError::NotLoaded(format!("antecedent '{}'", self.text)))?;
        evaluate(expression, conjunction, disjunction, catalogue)
    }
}

fn evaluate(
    expression: &Expression,
    conjunction: Option<&dyn TNorm>,
    disjunction: Option<&dyn SNorm>,
    catalogue: &dyn Catalogue,
) -> Result<f64> {
    match expression {
        Expression::Proposition(proposition) => evaluate_proposition(proposition, catalogue),
        Expression::Operator {
            operator: LogicalOperator::And,
            left,
            right,
        } => {
            let conjunction = conjunction.ok_or(RuleError::MissingCombinator("conjunction"))?;
            let a = evaluate(left, Some(conjunction), disjunction, catalogue)?;
            let b = evaluate(right, Some(conjunction), disjunction, catalogue)?;
            Ok(conjunction.compute(a, b))
        }
        Expression::Operator {
            operator: LogicalOperator::Or,
            left,
            right,
        } => {
            let disjunction = disjunction.ok_or(RuleError::MissingCombinator("disjunction"))?;
            let a = evaluate(left, conjunction, Some(disjunction), catalogue)?;
            let b = evaluate(right, conjunction, Some(disjunction), catalogue)?;
            Ok(disjunction.compute(a, b))
        }
    }
}

fn evaluate_proposition(proposition: &Proposition, catalogue: &dyn Catalogue) -> Result<f64> {
    let variable = proposition.variable.id;
    if !catalogue.is_enabled(variable) {
        return Ok(0.0);
    }

    if proposition.ends_with_any() {
        return Ok(proposition.apply_hedges(f64::NAN));
    }

    let term = proposition
        .term
        .as_ref()
        .ok_or_else(|| ParseError::IncompleteProposition(proposition.to_string()))?;

    let degree = match variable.kind {
        VariableKind::Input => catalogue.membership(variable, term.id),
        VariableKind::Output => catalogue.activation_degree(variable, term.id),
    };
    Ok(proposition.apply_hedges(degree))
}
