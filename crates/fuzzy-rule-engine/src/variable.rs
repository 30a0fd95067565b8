//! 输入/输出变量与变量目录
//!
//! [`Variables`] 是 [`Catalogue`] 的具体实现：输入变量提供清晰值处的隶属度，
//! 输出变量在模糊输出中累计被激活的术语。

use crate::catalogue::{Catalogue, Conclusion, TermId, VariableId, VariableKind};
use crate::error::{ReferenceKind, Result, RuleError};
use crate::hedge::{Hedge, hedge_factory};
use crate::norm::{SNorm, TNorm};
use crate::operation;
use crate::term::Term;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// 输入变量
#[derive(Debug, Clone)]
pub struct InputVariable {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub minimum: f64,
    pub maximum: f64,
    /// 为 true 时设置的值被限制在 [minimum, maximum] 内
    pub lock_value_in_range: bool,
    value: f64,
    terms: Vec<Arc<dyn Term>>,
}

impl InputVariable {
    pub fn new(name: impl Into<String>, minimum: f64, maximum: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            minimum,
            maximum,
            lock_value_in_range: false,
            value: f64::NAN,
            terms: Vec::new(),
        }
    }

    pub fn with_term(mut self, term: impl Term + 'static) -> Self {
        self.terms.push(Arc::new(term));
        self
    }

    pub fn add_term(&mut self, term: Arc<dyn Term>) -> TermId {
        self.terms.push(term);
        TermId(self.terms.len() - 1)
    }

    pub fn terms(&self) -> &[Arc<dyn Term>] {
        &self.terms
    }

    pub fn find_term(&self, name: &str) -> Option<TermId> {
        self.terms.iter().position(|t| t.name() == name).map(TermId)
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = if self.lock_value_in_range {
            operation::bound(value, self.minimum, self.maximum)
        } else {
            value
        };
    }

    /// 术语在当前值处的隶属度，句柄越界时为 NaN
    pub fn membership(&self, term: TermId) -> f64 {
        self.terms
            .get(term.0)
            .map_or(f64::NAN, |t| t.membership(self.value))
    }

    /// 当前值的模糊化表示，如 `0.500/low + 0.500/high`
    pub fn fuzzify(&self) -> String {
        self.terms
            .iter()
            .map(|t| format!("{:.3}/{}", t.membership(self.value), t.name()))
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// 被激活的术语
#[derive(Debug, Clone)]
pub struct Activated {
    pub term: TermId,
    pub degree: f64,
    pub implication: Option<Arc<dyn TNorm>>,
}

/// 模糊输出：本周期被激活的术语，按写入顺序保存
#[derive(Debug, Clone, Default)]
pub struct Aggregated {
    pub aggregation: Option<Arc<dyn SNorm>>,
    terms: Vec<Activated>,
}

impl Aggregated {
    pub fn terms(&self) -> &[Activated] {
        &self.terms
    }

    pub fn push(&mut self, activated: Activated) {
        self.terms.push(activated);
    }

    pub fn clear(&mut self) {
        self.terms.clear();
    }

    /// 某术语的累计激活度：有聚合算子时逐个聚合，否则求和
    pub fn activation_degree(&self, term: TermId) -> f64 {
        self.terms
            .iter()
            .filter(|activated| activated.term == term)
            .fold(0.0, |result, activated| match &self.aggregation {
                Some(aggregation) => aggregation.compute(result, activated.degree),
                None => result + activated.degree,
            })
    }
}

/// 输出变量
#[derive(Debug, Clone)]
pub struct OutputVariable {
    pub name: String,
    pub description: String,
    pub enabled: bool,
    pub minimum: f64,
    pub maximum: f64,
    terms: Vec<Arc<dyn Term>>,
    fuzzy_output: Aggregated,
}

impl OutputVariable {
    pub fn new(name: impl Into<String>, minimum: f64, maximum: f64) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            enabled: true,
            minimum,
            maximum,
            terms: Vec::new(),
            fuzzy_output: Aggregated::default(),
        }
    }

    pub fn with_term(mut self, term: impl Term + 'static) -> Self {
        self.terms.push(Arc::new(term));
        self
    }

    pub fn with_aggregation(mut self, aggregation: Arc<dyn SNorm>) -> Self {
        self.fuzzy_output.aggregation = Some(aggregation);
        self
    }

    pub fn add_term(&mut self, term: Arc<dyn Term>) -> TermId {
        self.terms.push(term);
        TermId(self.terms.len() - 1)
    }

    pub fn terms(&self) -> &[Arc<dyn Term>] {
        &self.terms
    }

    pub fn find_term(&self, name: &str) -> Option<TermId> {
        self.terms.iter().position(|t| t.name() == name).map(TermId)
    }

    pub fn term_name(&self, term: TermId) -> Option<&str> {
        self.terms.get(term.0).map(|t| t.name())
    }

    pub fn fuzzy_output(&self) -> &Aggregated {
        &self.fuzzy_output
    }

    pub fn fuzzy_output_mut(&mut self) -> &mut Aggregated {
        &mut self.fuzzy_output
    }

    /// 模糊输出的文本表示，如 `0.500/left + 0.250/right`
    pub fn fuzzy_output_value(&self) -> String {
        self.fuzzy_output
            .terms
            .iter()
            .map(|activated| {
                format!(
                    "{:.3}/{}",
                    activated.degree,
                    self.term_name(activated.term).unwrap_or("?")
                )
            })
            .collect::<Vec<_>>()
            .join(" + ")
    }
}

/// 变量目录
#[derive(Debug, Clone)]
pub struct Variables {
    inputs: Vec<InputVariable>,
    outputs: Vec<OutputVariable>,
    hedges: BTreeMap<String, Arc<dyn Hedge>>,
}

impl Variables {
    /// 预置全部内置语气算子
    pub fn new() -> Self {
        let factory = hedge_factory();
        let hedges = factory
            .keys()
            .into_iter()
            .filter_map(|key| factory.construct(key).ok().map(|h| (key.to_string(), h)))
            .collect();
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
            hedges,
        }
    }

    pub fn add_input(&mut self, variable: InputVariable) -> VariableId {
        self.inputs.push(variable);
        VariableId::input(self.inputs.len() - 1)
    }

    pub fn add_output(&mut self, variable: OutputVariable) -> VariableId {
        self.outputs.push(variable);
        VariableId::output(self.outputs.len() - 1)
    }

    /// 注册（或替换）语气算子，键为其名称
    pub fn register_hedge(&mut self, hedge: Arc<dyn Hedge>) {
        self.hedges.insert(hedge.name().to_string(), hedge);
    }

    pub fn inputs(&self) -> &[InputVariable] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[OutputVariable] {
        &self.outputs
    }

    pub fn input(&self, name: &str) -> Option<&InputVariable> {
        self.inputs.iter().find(|v| v.name == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut InputVariable> {
        self.inputs.iter_mut().find(|v| v.name == name)
    }

    pub fn output(&self, name: &str) -> Option<&OutputVariable> {
        self.outputs.iter().find(|v| v.name == name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut OutputVariable> {
        self.outputs.iter_mut().find(|v| v.name == name)
    }

    /// 设置输入变量的清晰值
    pub fn set_input_value(&mut self, name: &str, value: f64) -> Result<()> {
        self.input_mut(name)
            .ok_or_else(|| RuleError::unresolved(ReferenceKind::Variable, name))?
            .set_value(value);
        Ok(())
    }

    /// 清空所有输出变量的模糊输出
    pub fn clear_outputs(&mut self) {
        for output in &mut self.outputs {
            output.fuzzy_output.clear();
        }
    }
}

impl Default for Variables {
    fn default() -> Self {
        Self::new()
    }
}

impl Catalogue for Variables {
    fn find_variable(&self, name: &str) -> Option<VariableId> {
        self.inputs
            .iter()
            .position(|v| v.name == name)
            .map(VariableId::input)
            .or_else(|| {
                self.outputs
                    .iter()
                    .position(|v| v.name == name)
                    .map(VariableId::output)
            })
    }

    fn find_term(&self, variable: VariableId, name: &str) -> Option<TermId> {
        match variable.kind {
            VariableKind::Input => self.inputs.get(variable.index)?.find_term(name),
            VariableKind::Output => self.outputs.get(variable.index)?.find_term(name),
        }
    }

    fn find_hedge(&self, name: &str) -> Option<Arc<dyn Hedge>> {
        self.hedges.get(name).cloned()
    }

    fn is_enabled(&self, variable: VariableId) -> bool {
        match variable.kind {
            VariableKind::Input => self.inputs.get(variable.index).is_some_and(|v| v.enabled),
            VariableKind::Output => self.outputs.get(variable.index).is_some_and(|v| v.enabled),
        }
    }

    fn membership(&self, variable: VariableId, term: TermId) -> f64 {
        match variable.kind {
            VariableKind::Input => self
                .inputs
                .get(variable.index)
                .map_or(f64::NAN, |v| v.membership(term)),
            VariableKind::Output => f64::NAN,
        }
    }

    fn activation_degree(&self, variable: VariableId, term: TermId) -> f64 {
        match variable.kind {
            VariableKind::Output => self
                .outputs
                .get(variable.index)
                .map_or(f64::NAN, |v| v.fuzzy_output.activation_degree(term)),
            VariableKind::Input => f64::NAN,
        }
    }

    fn conclude(&mut self, conclusion: Conclusion) {
        if let Some(output) = self.outputs.get_mut(conclusion.variable.index) {
            output.fuzzy_output.push(Activated {
                term: conclusion.term,
                degree: conclusion.degree,
                implication: conclusion.implication,
            });
        }
    }
}

impl fmt::Display for Variables {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for input in &self.inputs {
            writeln!(f, "{} = {} ({})", input.name, input.value, input.fuzzify())?;
        }
        for output in &self.outputs {
            writeln!(f, "{} = {}", output.name, output.fuzzy_output_value())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::norm::Maximum;
    use crate::term::Triangle;

    fn variables() -> Variables {
        let mut variables = Variables::new();
        variables.add_input(
            InputVariable::new("obstacle", 0.0, 1.0)
                .with_term(Triangle::new("left", 0.0, 0.0, 1.0))
                .with_term(Triangle::new("right", 0.0, 1.0, 1.0)),
        );
        variables.add_output(
            OutputVariable::new("steer", 0.0, 1.0)
                .with_term(Triangle::new("left", 0.0, 0.0, 1.0))
                .with_term(Triangle::new("right", 0.0, 1.0, 1.0)),
        );
        variables
    }

    #[test]
    fn test_find_variable_and_term() {
        let variables = variables();
        let obstacle = variables.find_variable("obstacle").unwrap();
        let steer = variables.find_variable("steer").unwrap();
        assert_eq!(obstacle, VariableId::input(0));
        assert_eq!(steer, VariableId::output(0));
        assert_eq!(variables.find_term(steer, "right"), Some(TermId(1)));
        assert_eq!(variables.find_term(obstacle, "center"), None);
        assert!(variables.find_variable("speed").is_none());
    }

    #[test]
    fn test_builtin_hedges_available() {
        let variables = variables();
        for name in ["any", "extremely", "not", "seldom", "somewhat", "very"] {
            assert!(variables.find_hedge(name).is_some(), "missing hedge {name}");
        }
        assert!(variables.find_hedge("rather").is_none());
    }

    #[test]
    fn test_input_membership() {
        let mut variables = variables();
        variables.set_input_value("obstacle", 0.25).unwrap();
        let obstacle = VariableId::input(0);
        assert_eq!(variables.membership(obstacle, TermId(0)), 0.75);
        assert_eq!(variables.membership(obstacle, TermId(1)), 0.25);
        assert!(variables.set_input_value("speed", 1.0).is_err());
    }

    #[test]
    fn test_lock_value_in_range() {
        let mut input = InputVariable::new("x", 0.0, 1.0);
        input.lock_value_in_range = true;
        input.set_value(5.0);
        assert_eq!(input.value(), 1.0);
    }

    #[test]
    fn test_conclusions_accumulate() {
        let mut variables = variables();
        let steer = VariableId::output(0);
        for degree in [0.25, 0.5] {
            variables.conclude(Conclusion {
                variable: steer,
                term: TermId(1),
                degree,
                implication: None,
            });
        }
        assert_eq!(variables.activation_degree(steer, TermId(1)), 0.75);
        assert_eq!(variables.activation_degree(steer, TermId(0)), 0.0);
        assert_eq!(
            variables.output("steer").unwrap().fuzzy_output_value(),
            "0.250/right + 0.500/right"
        );

        variables.clear_outputs();
        assert!(variables.output("steer").unwrap().fuzzy_output().terms().is_empty());
    }

    #[test]
    fn test_aggregation_operator() {
        let mut output = OutputVariable::new("y", 0.0, 1.0)
            .with_term(Triangle::new("t", 0.0, 0.5, 1.0))
            .with_aggregation(Arc::new(Maximum));
        for degree in [0.25, 0.5] {
            output.fuzzy_output_mut().push(Activated {
                term: TermId(0),
                degree,
                implication: None,
            });
        }
        assert_eq!(output.fuzzy_output().activation_degree(TermId(0)), 0.5);
    }

    #[test]
    fn test_disabled_variable() {
        let mut variables = variables();
        variables.input_mut("obstacle").unwrap().enabled = false;
        assert!(!variables.is_enabled(VariableId::input(0)));
        assert!(variables.is_enabled(VariableId::output(0)));
    }
}
