//! 规则块
//!
//! 一组共享合取、析取、蕴含算子和激活策略的规则。
//! 组合算子以 `Arc` 共享，多个规则块可以引用同一实例。

use crate::activation::{Activation, General};
use crate::catalogue::Catalogue;
use crate::error::{Result, RuleError};
use crate::norm::{SNorm, TNorm};
use crate::rule::Rule;
use fuzzy_shared::observability::metrics;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// 规则块的组合算子快照，供激活策略在遍历规则时使用
#[derive(Debug, Clone, Default)]
pub struct Combinators {
    pub conjunction: Option<Arc<dyn TNorm>>,
    pub disjunction: Option<Arc<dyn SNorm>>,
    pub implication: Option<Arc<dyn TNorm>>,
}

impl Combinators {
    /// 计算规则激活度
    pub fn activate(&self, rule: &mut Rule, catalogue: &dyn Catalogue) -> Result<f64> {
        rule.activate_with(
            self.conjunction.as_deref(),
            self.disjunction.as_deref(),
            catalogue,
        )
    }

    /// 以蕴含算子触发规则
    pub fn trigger(&self, rule: &mut Rule, catalogue: &mut dyn Catalogue) -> Result<()> {
        rule.trigger(self.implication.as_ref(), catalogue)
    }
}

#[derive(Debug, Clone)]
pub struct RuleBlock {
    name: String,
    description: String,
    enabled: bool,
    conjunction: Option<Arc<dyn TNorm>>,
    disjunction: Option<Arc<dyn SNorm>>,
    implication: Option<Arc<dyn TNorm>>,
    activation: Option<Arc<dyn Activation>>,
    rules: Vec<Rule>,
}

impl RuleBlock {
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

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_conjunction(mut self, conjunction: Arc<dyn TNorm>) -> Self {
        self.conjunction = Some(conjunction);
        self
    }

    pub fn with_disjunction(mut self, disjunction: Arc<dyn SNorm>) -> Self {
        self.disjunction = Some(disjunction);
        self
    }

    pub fn with_implication(mut self, implication: Arc<dyn TNorm>) -> Self {
        self.implication = Some(implication);
        self
    }

    pub fn with_activation(mut self, activation: Arc<dyn Activation>) -> Self {
        self.activation = Some(activation);
        self
    }

    pub fn with_rule(mut self, rule: Rule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn conjunction(&self) -> Option<&Arc<dyn TNorm>> {
        self.conjunction.as_ref()
    }

    pub fn set_conjunction(&mut self, conjunction: Option<Arc<dyn TNorm>>) {
        self.conjunction = conjunction;
    }

    pub fn disjunction(&self) -> Option<&Arc<dyn SNorm>> {
        self.disjunction.as_ref()
    }

    pub fn set_disjunction(&mut self, disjunction: Option<Arc<dyn SNorm>>) {
        self.disjunction = disjunction;
    }

    pub fn implication(&self) -> Option<&Arc<dyn TNorm>> {
        self.implication.as_ref()
    }

    pub fn set_implication(&mut self, implication: Option<Arc<dyn TNorm>>) {
        self.implication = implication;
    }

    pub fn activation(&self) -> Option<&Arc<dyn Activation>> {
        self.activation.as_ref()
    }

    pub fn set_activation(&mut self, activation: Option<Arc<dyn Activation>>) {
        self.activation = activation;
    }

    pub fn combinators(&self) -> Combinators {
        Combinators {
            conjunction: self.conjunction.clone(),
            disjunction: self.disjunction.clone(),
            implication: self.implication.clone(),
        }
    }

    pub fn add_rule(&mut self, rule: Rule) {
        self.rules.push(rule);
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn rules_mut(&mut self) -> &mut [Rule] {
        &mut self.rules
    }

    pub fn remove_rule(&mut self, index: usize) -> Option<Rule> {
        (index < self.rules.len()).then(|| self.rules.remove(index))
    }

    /// 加载全部规则
    ///
    /// 逐条尝试加载，失败的规则记录警告后继续，最后汇总为一个错误。
    #[instrument(skip(self, catalogue), fields(block = %self.name))]
    pub fn load_rules(&mut self, catalogue: &dyn Catalogue) -> Result<()> {
        let mut messages = Vec::new();

        for (index, rule) in self.rules.iter_mut().enumerate() {
            if let Err(e) = rule.load(catalogue) {
                warn!(index, rule = %rule, error = %e, "规则加载失败");
                messages.push(format!("[{}] '{}': {}", index, rule, e));
            }
        }

        if messages.is_empty() {
            info!(count = self.rules.len(), "规则块加载完成");
            Ok(())
        } else {
            Err(RuleError::BlockLoad {
                block: self.name.clone(),
                messages,
            })
        }
    }

    pub fn unload_rules(&mut self) {
        for rule in &mut self.rules {
            rule.unload();
        }
    }

    /// 卸载后重新加载，用于变量目录变化之后
    pub fn reload_rules(&mut self, catalogue: &dyn Catalogue) -> Result<()> {
        self.unload_rules();
        self.load_rules(catalogue)
    }

    /// 执行一个激活周期，未设置激活策略时按 [`General`] 执行
    pub fn activate(&mut self, catalogue: &mut dyn Catalogue) -> Result<()> {
        if !self.enabled {
            debug!(block = %self.name, "规则块已禁用，跳过");
            return Ok(());
        }

        match self.activation.clone() {
            Some(activation) => activation.activate(self, catalogue)?,
            None => General.activate(self, catalogue)?,
        }

        let triggered = self.rules.iter().filter(|rule| rule.is_triggered()).count();
        metrics::record_block_activation(&self.name, triggered);
        debug!(block = %self.name, triggered, "规则块激活完成");
        Ok(())
    }
}

impl fmt::Display for RuleBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "RuleBlock: {}", self.name)?;
        if !self.enabled {
            writeln!(f, "  enabled: false")?;
        }
        if let Some(conjunction) = &self.conjunction {
            writeln!(f, "  conjunction: {}", conjunction.name())?;
        }
        if let Some(disjunction) = &self.disjunction {
            writeln!(f, "  disjunction: {}", disjunction.name())?;
        }
        if let Some(implication) = &self.implication {
            writeln!(f, "  implication: {}", implication.name())?;
        }
        if let Some(activation) = &self.activation {
            writeln!(f, "  activation: {}", activation)?;
        }
        for rule in &self.rules {
            writeln!(f, "  rule: {}", rule)?;
        }
        Ok(())
    }
}
