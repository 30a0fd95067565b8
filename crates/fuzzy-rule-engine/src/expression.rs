//! 前件表达式树
//!
//! 叶子为命题 `variable is [hedge]* term`，内部节点为 `and` / `or`。
//! 所有名字在加载时已解析为目录句柄，求值时不再做字符串查找。

use crate::catalogue::{TermId, VariableId};
use crate::hedge::{self, Hedge};
use crate::operators::{LogicalOperator, keyword};
use std::fmt;
use std::sync::Arc;

/// 已解析的变量引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariableRef {
    pub id: VariableId,
    pub name: String,
}

/// 已解析的术语引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TermRef {
    pub id: TermId,
    pub name: String,
}

/// 命题
///
/// 仅当语气链以 `any` 结尾时 `term` 才可以为空。
#[derive(Debug, Clone)]
pub struct Proposition {
    pub variable: VariableRef,
    pub hedges: Vec<Arc<dyn Hedge>>,
    pub term: Option<TermRef>,
}

impl Proposition {
    /// 语气链是否以 `any` 结尾
    pub fn ends_with_any(&self) -> bool {
        self.hedges.last().is_some_and(|h| hedge::is_any(h.as_ref()))
    }

    /// 按声明顺序的逆序应用语气链
    pub fn apply_hedges(&self, degree: f64) -> f64 {
        self.hedges
            .iter()
            .rev()
            .fold(degree, |degree, hedge| hedge.hedge(degree))
    }
}

impl fmt::Display for Proposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.variable.name, keyword::IS)?;
        for hedge in &self.hedges {
            write!(f, " {}", hedge.name())?;
        }
        if let Some(term) = &self.term {
            write!(f, " {}", term.name)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Expression {
    Proposition(Proposition),
    Operator {
        operator: LogicalOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn operator(operator: LogicalOperator, left: Expression, right: Expression) -> Self {
        Self::Operator {
            operator,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// 后缀形式，用于检查树形
    pub fn to_postfix(&self) -> String {
        match self {
            Self::Proposition(proposition) => proposition.to_string(),
            Self::Operator {
                operator,
                left,
                right,
            } => format!("{} {} {}", left.to_postfix(), right.to_postfix(), operator),
        }
    }

    /// 命题个数
    pub fn proposition_count(&self) -> usize {
        match self {
            Self::Proposition(_) => 1,
            Self::Operator { left, right, .. } => {
                left.proposition_count() + right.proposition_count()
            }
        }
    }
}

/// 中缀形式，嵌套的操作符节点加括号
impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Proposition(proposition) => write!(f, "{}", proposition),
            Self::Operator {
                operator,
                left,
                right,
            } => {
                write_operand(f, left)?;
                write!(f, " {} ", operator)?;
                write_operand(f, right)
            }
        }
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, expression: &Expression) -> fmt::Result {
    match expression {
        Expression::Proposition(_) => write!(f, "{}", expression),
        Expression::Operator { .. } => write!(f, "({})", expression),
    }
}
