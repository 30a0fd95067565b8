//! 规则块定义
//!
//! 规则块的可序列化描述，组合算子与激活策略以工厂键引用。
//! 构建时通过 [`Factories`] 实例化，导出时记录各组件的名称。

use crate::activation::parse_activation;
use crate::error::{Result, RuleError};
use crate::factory::Factories;
use crate::rule::Rule;
use crate::rule_block::RuleBlock;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

fn default_enabled() -> bool {
    true
}

/// 规则块定义
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBlockDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conjunction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disjunction: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implication: Option<String>,
    /// 激活策略，形如 `Highest 2` 或 `Threshold > 0.5`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation: Option<String>,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl RuleBlockDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            conjunction: None,
            disjunction: None,
            implication: None,
            activation: None,
            rules: Vec::new(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 从规则块导出定义
    pub fn from_block(block: &RuleBlock) -> Self {
        Self {
            name: block.name().to_string(),
            description: block.description().to_string(),
            enabled: block.is_enabled(),
            conjunction: block.conjunction().map(|c| c.name().to_string()),
            disjunction: block.disjunction().map(|d| d.name().to_string()),
            implication: block.implication().map(|i| i.name().to_string()),
            activation: block.activation().map(|a| a.to_string()),
            rules: block.rules().iter().map(|rule| rule.text()).collect(),
        }
    }

    /// 构建规则块（规则尚未加载）
    ///
    /// 工厂键未注册时立即失败；规则文本的语法错误逐条收集后汇总返回。
    #[instrument(skip(self, factories), fields(block = %self.name))]
    pub fn build(&self, factories: &Factories) -> Result<RuleBlock> {
        let mut block = RuleBlock::new(&self.name).with_description(&self.description);
        block.set_enabled(self.enabled);

        if let Some(key) = &self.conjunction {
            block.set_conjunction(Some(factories.tnorms.construct(key)?));
        }
        if let Some(key) = &self.disjunction {
            block.set_disjunction(Some(factories.snorms.construct(key)?));
        }
        if let Some(key) = &self.implication {
            block.set_implication(Some(factories.tnorms.construct(key)?));
        }
        if let Some(text) = &self.activation {
            block.set_activation(Some(parse_activation(text, &factories.activations)?));
        }

        let mut messages = Vec::new();
        for (index, text) in self.rules.iter().enumerate() {
            match Rule::parse(text) {
                Ok(rule) => block.add_rule(rule),
                Err(e) => {
                    warn!(index, rule = %text, error = %e, "规则解析失败");
                    messages.push(format!("[{}] '{}': {}", index, text, e));
                }
            }
        }

        if !messages.is_empty() {
            return Err(RuleError::BlockLoad {
                block: self.name.clone(),
                messages,
            });
        }

        info!(rules = self.rules.len(), "规则块构建完成");
        Ok(block)
    }
}
