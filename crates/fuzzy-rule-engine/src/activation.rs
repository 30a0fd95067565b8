//! 规则激活策略
//!
//! 决定一个周期内规则块中哪些规则被触发：
//! - [`General`]：按顺序激活并触发所有启用的规则
//! - [`First`] / [`Last`]：按正序 / 逆序触发前若干条达到阈值的规则
//! - [`Highest`] / [`Lowest`]：触发激活度最高 / 最低的若干条规则
//! - [`Threshold`]：触发激活度满足比较条件的规则
//! - [`Proportional`]：按激活度总和归一化后触发全部规则

use crate::catalogue::Catalogue;
use crate::error::{Result, RuleError};
use crate::factory::ConstructionFactory;
use crate::operation;
use crate::operators::Comparison;
use crate::rule_block::RuleBlock;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

pub trait Activation: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// 参数的文本表示，无参数时为空
    fn parameters(&self) -> String {
        String::new()
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()>;
}

impl fmt::Display for dyn Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parameters = self.parameters();
        if parameters.is_empty() {
            write!(f, "{}", self.name())
        } else {
            write!(f, "{} {}", self.name(), parameters)
        }
    }
}

/// 激活所有启用的规则，返回 (下标, 激活度)，未启用的规则仅被复位
fn activate_enabled(block: &mut RuleBlock, catalogue: &dyn Catalogue) -> Result<Vec<(usize, f64)>> {
    let combinators = block.combinators();
    let mut degrees = Vec::with_capacity(block.rules().len());
    for (index, rule) in block.rules_mut().iter_mut().enumerate() {
        rule.deactivate();
        if rule.is_enabled() {
            degrees.push((index, combinators.activate(rule, catalogue)?));
        }
    }
    Ok(degrees)
}

fn trigger_indices(
    block: &mut RuleBlock,
    indices: impl IntoIterator<Item = usize>,
    catalogue: &mut dyn Catalogue,
) -> Result<()> {
    let combinators = block.combinators();
    let rules = block.rules_mut();
    for index in indices {
        if let Some(rule) = rules.get_mut(index) {
            combinators.trigger(rule, catalogue)?;
        }
    }
    Ok(())
}

/// 按列表顺序逐条复位、激活、触发
#[derive(Debug, Clone, Copy, Default)]
pub struct General;

impl Activation for General {
    fn name(&self) -> &str {
        "General"
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        let combinators = block.combinators();
        for rule in block.rules_mut() {
            rule.deactivate();
            if !rule.is_enabled() {
                continue;
            }
            combinators.activate(rule, &*catalogue)?;
            combinators.trigger(rule, catalogue)?;
        }
        Ok(())
    }
}

fn activate_in_order(
    block: &mut RuleBlock,
    catalogue: &mut dyn Catalogue,
    rules: usize,
    threshold: f64,
    reverse: bool,
) -> Result<()> {
    let combinators = block.combinators();
    let mut triggered = 0;

    let mut order: Vec<usize> = (0..block.rules().len()).collect();
    if reverse {
        order.reverse();
    }

    let all = block.rules_mut();
    for index in order {
        let rule = &mut all[index];
        rule.deactivate();
        if !rule.is_enabled() {
            continue;
        }
        let degree = combinators.activate(rule, &*catalogue)?;
        if triggered < rules && operation::is_gt(degree, 0.0) && operation::is_ge(degree, threshold) {
            combinators.trigger(rule, catalogue)?;
            triggered += 1;
        }
    }
    Ok(())
}

/// 按顺序触发前 `rules` 条激活度大于 0 且不低于 `threshold` 的规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct First {
    pub rules: usize,
    pub threshold: f64,
}

impl Default for First {
    fn default() -> Self {
        Self {
            rules: 1,
            threshold: 0.0,
        }
    }
}

impl Activation for First {
    fn name(&self) -> &str {
        "First"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.rules, self.threshold)
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        activate_in_order(block, catalogue, self.rules, self.threshold, false)
    }
}

/// 与 [`First`] 相同，但从列表末尾开始
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Last {
    pub rules: usize,
    pub threshold: f64,
}

impl Default for Last {
    fn default() -> Self {
        Self {
            rules: 1,
            threshold: 0.0,
        }
    }
}

impl Activation for Last {
    fn name(&self) -> &str {
        "Last"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.rules, self.threshold)
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        activate_in_order(block, catalogue, self.rules, self.threshold, true)
    }
}

/// 激活度大于 0 的规则按激活度排序后取前 `rules` 条，排序稳定
fn activate_ranked(
    block: &mut RuleBlock,
    catalogue: &mut dyn Catalogue,
    rules: usize,
    ordering: fn(f64, f64) -> Ordering,
) -> Result<()> {
    let mut candidates: Vec<(usize, f64)> = activate_enabled(block, &*catalogue)?
        .into_iter()
        .filter(|(_, degree)| operation::is_gt(*degree, 0.0))
        .collect();
    candidates.sort_by(|a, b| ordering(a.1, b.1));
    trigger_indices(
        block,
        candidates.into_iter().take(rules).map(|(index, _)| index),
        catalogue,
    )
}

/// 触发激活度最高的 `rules` 条规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highest {
    pub rules: usize,
}

impl Default for Highest {
    fn default() -> Self {
        Self { rules: 1 }
    }
}

impl Activation for Highest {
    fn name(&self) -> &str {
        "Highest"
    }

    fn parameters(&self) -> String {
        self.rules.to_string()
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        activate_ranked(block, catalogue, self.rules, |a, b| b.total_cmp(&a))
    }
}

/// 触发激活度最低（但大于 0）的 `rules` 条规则
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Lowest {
    pub rules: usize,
}

impl Default for Lowest {
    fn default() -> Self {
        Self { rules: 1 }
    }
}

impl Activation for Lowest {
    fn name(&self) -> &str {
        "Lowest"
    }

    fn parameters(&self) -> String {
        self.rules.to_string()
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        activate_ranked(block, catalogue, self.rules, |a, b| a.total_cmp(&b))
    }
}

/// 触发满足 `degree <comparison> value` 的规则
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Threshold {
    pub comparison: Comparison,
    pub value: f64,
}

impl Default for Threshold {
    fn default() -> Self {
        Self {
            comparison: Comparison::Gte,
            value: 0.0,
        }
    }
}

impl Activation for Threshold {
    fn name(&self) -> &str {
        "Threshold"
    }

    fn parameters(&self) -> String {
        format!("{} {}", self.comparison, self.value)
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        let selected: Vec<usize> = activate_enabled(block, &*catalogue)?
            .into_iter()
            .filter(|(_, degree)| self.comparison.compare(*degree, self.value))
            .map(|(index, _)| index)
            .collect();
        trigger_indices(block, selected, catalogue)
    }
}

/// 激活度按总和归一化后全部触发
#[derive(Debug, Clone, Copy, Default)]
pub struct Proportional;

impl Activation for Proportional {
    fn name(&self) -> &str {
        "Proportional"
    }

    fn activate(&self, block: &mut RuleBlock, catalogue: &mut dyn Catalogue) -> Result<()> {
        let degrees = activate_enabled(block, &*catalogue)?;
        let sum: f64 = degrees.iter().map(|(_, degree)| degree).sum();

        if operation::is_gt(sum, 0.0) {
            let rules = block.rules_mut();
            for &(index, degree) in &degrees {
                rules[index].set_activation_degree(degree / sum);
            }
        }
        trigger_indices(block, degrees.into_iter().map(|(index, _)| index), catalogue)
    }
}

/// 内置激活策略工厂，键为类型名，参数取默认值
pub fn activation_factory() -> ConstructionFactory<Arc<dyn Activation>> {
    let mut factory: ConstructionFactory<Arc<dyn Activation>> =
        ConstructionFactory::new("ActivationFactory");
    factory.register("First", || Arc::new(First::default()));
    factory.register("General", || Arc::new(General));
    factory.register("Highest", || Arc::new(Highest::default()));
    factory.register("Last", || Arc::new(Last::default()));
    factory.register("Lowest", || Arc::new(Lowest::default()));
    factory.register("Proportional", || Arc::new(Proportional));
    factory.register("Threshold", || Arc::new(Threshold::default()));
    factory
}

fn parse_parameter<T: std::str::FromStr>(key: &str, value: Option<&str>, default: T) -> Result<T> {
    match value {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| RuleError::InvalidSetting(format!("{} 的参数无效: '{}'", key, value))),
    }
}

/// 解析 `<键> [参数...]` 形式的激活策略描述，如 `First 2 0.5`、`Threshold > 0.5`
pub fn parse_activation(
    text: &str,
    factory: &ConstructionFactory<Arc<dyn Activation>>,
) -> Result<Arc<dyn Activation>> {
    let mut words = text.split_whitespace();
    let key = words.next().unwrap_or_default();
    let parameters: Vec<&str> = words.collect();
    if parameters.is_empty() {
        return factory.construct(key);
    }

    let first = parameters.first().copied();
    let second = parameters.get(1).copied();
    let activation: Arc<dyn Activation> = match key {
        "First" => Arc::new(First {
            rules: parse_parameter(key, first, 1)?,
            threshold: parse_parameter(key, second, 0.0)?,
        }),
        "Last" => Arc::new(Last {
            rules: parse_parameter(key, first, 1)?,
            threshold: parse_parameter(key, second, 0.0)?,
        }),
        "Highest" => Arc::new(Highest {
            rules: parse_parameter(key, first, 1)?,
        }),
        "Lowest" => Arc::new(Lowest {
            rules: parse_parameter(key, first, 1)?,
        }),
        "Threshold" => Arc::new(Threshold {
            comparison: parse_parameter(key, first, Comparison::Gte)?,
            value: parse_parameter(key, second, 0.0)?,
        }),
        // 未知键仍由工厂报告；无参数的策略不接受参数
        _ => {
            factory.construct(key)?;
            return Err(RuleError::InvalidSetting(format!(
                "{} 不接受参数: '{}'",
                key,
                parameters.join(" ")
            )));
        }
    };

    let limit = if key == "Highest" || key == "Lowest" { 1 } else { 2 };
    if parameters.len() > limit {
        return Err(RuleError::InvalidSetting(format!(
            "{} 的参数过多: '{}'",
            key,
            parameters.join(" ")
        )));
    }
    Ok(activation)
}
