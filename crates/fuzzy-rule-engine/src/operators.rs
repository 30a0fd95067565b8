//! 规则关键字与操作符定义

use crate::operation;
use std::fmt;
use std::str::FromStr;

/// 规则文本关键字，区分大小写
pub mod keyword {
    pub const IF: &str = "if";
    pub const IS: &str = "is";
    pub const THEN: &str = "then";
    pub const AND: &str = "and";
    pub const OR: &str = "or";
    pub const WITH: &str = "with";
}

/// 逻辑操作符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            keyword::AND => Some(Self::And),
            keyword::OR => Some(Self::Or),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::And => keyword::AND,
            Self::Or => keyword::OR,
        }
    }
}

impl fmt::Display for LogicalOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keyword())
    }
}

/// 比较操作符（基于容差）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Lte,
    Eq,
    Neq,
    Gte,
    Gt,
}

impl Comparison {
    pub fn compare(&self, a: f64, b: f64) -> bool {
        match self {
            Self::Lt => operation::is_lt(a, b),
            Self::Lte => operation::is_le(a, b),
            Self::Eq => operation::is_eq(a, b),
            Self::Neq => operation::is_neq(a, b),
            Self::Gte => operation::is_ge(a, b),
            Self::Gt => operation::is_gt(a, b),
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Gte => ">=",
            Self::Gt => ">",
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Comparison {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            "==" => Ok(Self::Eq),
            "!=" => Ok(Self::Neq),
            ">=" => Ok(Self::Gte),
            ">" => Ok(Self::Gt),
            other => Err(format!("未知的比较操作符: '{}'", other)),
        }
    }
}
