//! 推理引擎
//!
//! 持有变量目录和有序的规则块。一个处理周期先清空所有输出变量的模糊输出，
//! 再按顺序激活每个启用的规则块。

use crate::catalogue::Catalogue;
use crate::definition::RuleBlockDefinition;
use crate::error::{Result, RuleError};
use crate::factory::Factories;
use crate::rule_block::RuleBlock;
use crate::variable::Variables;
use fuzzy_shared::observability::metrics;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

#[derive(Debug, Clone)]
pub struct Engine {
    name: String,
    description: String,
    variables: Variables,
    blocks: Vec<RuleBlock>,
}

impl Engine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            variables: Variables::new(),
            blocks: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_block(mut self, block: RuleBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// 修改变量目录后需重新调用 [`Engine::load_rules`]
    pub fn variables_mut(&mut self) -> &mut Variables {
        &mut self.variables
    }

    pub fn blocks(&self) -> &[RuleBlock] {
        &self.blocks
    }

    pub fn add_block(&mut self, block: RuleBlock) {
        self.blocks.push(block);
    }

    pub fn block(&self, name: &str) -> Option<&RuleBlock> {
        self.blocks.iter().find(|block| block.name() == name)
    }

    pub fn block_mut(&mut self, name: &str) -> Option<&mut RuleBlock> {
        self.blocks.iter_mut().find(|block| block.name() == name)
    }

    pub fn set_input_value(&mut self, name: &str, value: f64) -> Result<()> {
        self.variables.set_input_value(name, value)
    }

    /// 从定义构建规则块，加载其规则后追加到引擎
    pub fn load_definition(
        &mut self,
        definition: &RuleBlockDefinition,
        factories: &Factories,
    ) -> Result<()> {
        let mut block = definition.build(factories)?;
        block.load_rules(&self.variables)?;
        self.blocks.push(block);
        Ok(())
    }

    /// 重新加载所有规则块
    ///
    /// 每个规则块都会尝试加载，返回遇到的第一个错误。
    #[instrument(skip(self), fields(engine = %self.name))]
    pub fn load_rules(&mut self) -> Result<()> {
        let mut first_error: Option<RuleError> = None;
        for block in &mut self.blocks {
            if let Err(e) = block.reload_rules(&self.variables) {
                warn!(block = %block.name(), error = %e, "规则块加载失败");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                info!(blocks = self.blocks.len(), "引擎规则加载完成");
                Ok(())
            }
        }
    }

    /// 执行一个推理周期
    #[instrument(skip(self), fields(engine = %self.name))]
    pub fn process(&mut self) -> Result<()> {
        let start = Instant::now();
        self.variables.clear_outputs();
        for block in &mut self.blocks {
            block.activate(&mut self.variables)?;
        }
        metrics::record_engine_process(&self.name, start.elapsed().as_secs_f64());
        debug!(outputs = %self.fuzzy_outputs(), "推理周期完成");
        Ok(())
    }

    /// 复位所有规则状态并清空模糊输出
    pub fn restart(&mut self) {
        self.variables.clear_outputs();
        for block in &mut self.blocks {
            for rule in block.rules_mut() {
                rule.deactivate();
            }
        }
    }

    fn fuzzy_outputs(&self) -> String {
        self.variables
            .outputs()
            .iter()
            .map(|output| format!("{}: {}", output.name, output.fuzzy_output_value()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// 输出变量 `variable` 中术语 `term` 的累计激活度
    pub fn activation_degree(&self, variable: &str, term: &str) -> Option<f64> {
        let id = self.variables.find_variable(variable)?;
        if !id.is_output() {
            return None;
        }
        let term = self.variables.find_term(id, term)?;
        Some(self.variables.activation_degree(id, term))
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Engine: {}", self.name)?;
        if !self.description.is_empty() {
            writeln!(f, "  description: {}", self.description)?;
        }
        write!(f, "{}", self.variables)?;
        for block in &self.blocks {
            write!(f, "{}", block)?;
        }
        Ok(())
    }
}
