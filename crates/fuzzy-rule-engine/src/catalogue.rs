//! 规则与外部变量目录之间的协作接口
//!
//! 解析阶段通过目录把变量、术语、语气算子的名字解析为句柄；
//! 求值阶段通过句柄读取隶属度；触发阶段把结论写回输出变量。

use crate::hedge::Hedge;
use crate::norm::TNorm;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableKind {
    Input,
    Output,
}

/// 变量句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariableId {
    pub kind: VariableKind,
    pub index: usize,
}

impl VariableId {
    pub fn input(index: usize) -> Self {
        Self {
            kind: VariableKind::Input,
            index,
        }
    }

    pub fn output(index: usize) -> Self {
        Self {
            kind: VariableKind::Output,
            index,
        }
    }

    pub fn is_output(&self) -> bool {
        self.kind == VariableKind::Output
    }
}

/// 术语在所属变量中的句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TermId(pub usize);

/// 一条被激活的结论
#[derive(Debug, Clone)]
pub struct Conclusion {
    pub variable: VariableId,
    pub term: TermId,
    pub degree: f64,
    pub implication: Option<Arc<dyn TNorm>>,
}

impl fmt::Display for Conclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}/{:?} = {}", self.variable, self.term, self.degree)?;
        if let Some(implication) = &self.implication {
            write!(f, " ({})", implication.name())?;
        }
        Ok(())
    }
}

/// 变量/术语/语气算子目录
#[cfg_attr(test, mockall::automock)]
pub trait Catalogue {
    fn find_variable(&self, name: &str) -> Option<VariableId>;

    fn find_term(&self, variable: VariableId, name: &str) -> Option<TermId>;

    fn find_hedge(&self, name: &str) -> Option<Arc<dyn Hedge>>;

    fn is_enabled(&self, variable: VariableId) -> bool;

    /// 输入变量：术语在当前清晰值处的隶属度
    fn membership(&self, variable: VariableId, term: TermId) -> f64;

    /// 输出变量：模糊输出中该术语已累计的激活度
    fn activation_degree(&self, variable: VariableId, term: TermId) -> f64;

    /// 结论写入点
    fn conclude(&mut self, conclusion: Conclusion);
}
