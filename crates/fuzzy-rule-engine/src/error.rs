//! 规则引擎错误类型
//!
//! 所有错误对触发它的操作都是终止性的，引擎内部不做重试也不回退到默认值，
//! 是否跳过某条有问题的规则由调用方决定。

use std::fmt;
use thiserror::Error;

/// 规则文本语法错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyntaxError {
    #[error("缺少关键字 '{0}'")]
    MissingKeyword(&'static str),

    #[error("'with' 之后缺少权重")]
    MissingWeight,

    #[error("无效的权重: '{0}'")]
    InvalidWeight(String),

    #[error("权重之后存在多余的记号: '{0}'")]
    TrailingTokens(String),

    #[error("{0} 子句为空")]
    EmptyClause(&'static str),
}

/// 表达式解析错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("括号不匹配: {0}")]
    UnbalancedParentheses(String),

    #[error("函数 '{function}' 需要 {expected} 个参数, 实际 {found} 个")]
    ArityMismatch {
        function: String,
        expected: usize,
        found: usize,
    },

    #[error("未知的操作符: '{0}'")]
    UnknownOperator(String),

    #[error("操作符 '{operator}' 缺少操作数")]
    MissingOperand { operator: String },

    #[error("期望 {expected}, 实际为 '{found}'")]
    UnexpectedToken {
        expected: &'static str,
        found: String,
    },

    #[error("命题不完整: '{0}'")]
    IncompleteProposition(String),

    #[error("无效的表达式: '{0}'")]
    MalformedExpression(String),
}

/// 未解析引用的类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceKind {
    Variable,
    Term,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Variable => write!(f, "variable"),
            Self::Term => write!(f, "term"),
        }
    }
}

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("规则语法错误: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("表达式解析失败: {0}")]
    Parse(#[from] ParseError),

    #[error("未解析的引用: {kind} '{name}'")]
    UnresolvedReference { kind: ReferenceKind, name: String },

    #[error("尚未加载: {0}")]
    NotLoaded(String),

    #[error("缺少组合算子: {0}")]
    MissingCombinator(&'static str),

    #[error("{registry} 中未注册键 '{key}'")]
    Configuration { registry: String, key: String },

    #[error("规则块 '{block}' 加载失败: {}", .messages.join("; "))]
    BlockLoad { block: String, messages: Vec<String> },

    #[error("无效的配置: {0}")]
    InvalidSetting(String),

    #[error("JSON 序列化错误: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl RuleError {
    pub(crate) fn unresolved(kind: ReferenceKind, name: impl Into<String>) -> Self {
        Self::UnresolvedReference {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn configuration(registry: impl Into<String>, key: impl Into<String>) -> Self {
        Self::Configuration {
            registry: registry.into(),
            key: key.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RuleError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_registry_and_key() {
        let err = RuleError::configuration("TNormFactory", "Mystery");
        let message = err.to_string();
        assert!(message.contains("TNormFactory"));
        assert!(message.contains("Mystery"));
    }

    #[test]
    fn test_block_load_joins_messages() {
        let err = RuleError::BlockLoad {
            block: "mamdani".to_string(),
            messages: vec!["a".to_string(), "b".to_string()],
        };
        assert!(err.to_string().ends_with("a; b"));
    }

    #[test]
    fn test_syntax_error_converts() {
        let err: RuleError = SyntaxError::MissingKeyword("then").into();
        assert!(matches!(err, RuleError::Syntax(SyntaxError::MissingKeyword("then"))));
    }
}
