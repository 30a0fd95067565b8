//! 模糊推理规则引擎
//!
//! 提供模糊规则的解析与评估能力，支持：
//! - `if <前件> then <后件> [with <权重>]` 规则文本解析
//! - 带优先级和语气算子的前件表达式
//! - 可配置的 T-范数 / S-范数组合算子与规则激活策略
//! - 以 JSON 描述的规则块定义

pub mod activation;
pub mod antecedent;
pub mod catalogue;
pub mod consequent;
pub mod definition;
pub mod engine;
pub mod error;
pub mod expression;
pub mod factory;
pub mod function;
pub mod hedge;
pub mod norm;
pub mod operation;
pub mod operators;
mod parser;
pub mod rule;
pub mod rule_block;
pub mod settings;
pub mod term;
pub mod variable;

pub use activation::{Activation, parse_activation};
pub use catalogue::{Catalogue, Conclusion, TermId, VariableId, VariableKind};
pub use definition::RuleBlockDefinition;
pub use engine::Engine;
pub use error::{ParseError, ReferenceKind, Result, RuleError, SyntaxError};
pub use factory::{CloningFactory, ConstructionFactory, Factories};
pub use function::{Formula, FunctionFactory};
pub use hedge::Hedge;
pub use norm::{SNorm, TNorm};
pub use operators::{Comparison, LogicalOperator};
pub use rule::{Rule, RuleText};
pub use rule_block::RuleBlock;
pub use term::Term;
pub use variable::{InputVariable, OutputVariable, Variables};
