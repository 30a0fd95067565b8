//! 规则
//!
//! 规则文本格式：`if <前件> then <后件> [with <权重>] [# 注释]`。
//! [`RuleText::parse`] 用五状态机（None → If → Then → With → End）拆分文本，
//! [`Rule`] 持有前件/后件以及每个周期重算的激活度和触发标记。

use crate::antecedent::Antecedent;
use crate::catalogue::Catalogue;
use crate::consequent::Consequent;
use crate::error::{Result, RuleError, SyntaxError};
use crate::norm::{SNorm, TNorm};
use crate::operation;
use crate::operators::keyword;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// 拆分后的规则文本
#[derive(Debug, Clone, PartialEq)]
pub struct RuleText {
    pub antecedent: String,
    pub consequent: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    None,
    If,
    Then,
    With,
    End,
}

/// 权重必须为有限正数
fn validate_weight(weight: f64, token: &str) -> std::result::Result<f64, SyntaxError> {
    if weight.is_finite() && weight > 0.0 {
        Ok(weight)
    } else {
        Err(SyntaxError::InvalidWeight(token.to_string()))
    }
}

impl RuleText {
    pub fn parse(text: &str) -> std::result::Result<Self, SyntaxError> {
        let text = match text.find('#') {
            Some(comment) => &text[..comment],
            None => text,
        };

        let mut state = State::None;
        let mut antecedent: Vec<&str> = Vec::new();
        let mut consequent: Vec<&str> = Vec::new();
        let mut weight = 1.0;

        let mut tokens = text.split_whitespace();
        while let Some(token) = tokens.next() {
            match state {
                State::None => {
                    if token != keyword::IF {
                        return Err(SyntaxError::MissingKeyword(keyword::IF));
                    }
                    state = State::If;
                }
                State::If => {
                    if token == keyword::THEN {
                        state = State::Then;
                    } else {
                        antecedent.push(token);
                    }
                }
                State::Then => {
                    if token == keyword::WITH {
                        state = State::With;
                    } else {
                        consequent.push(token);
                    }
                }
                State::With => {
                    let parsed = token
                        .parse::<f64>()
                        .map_err(|_| SyntaxError::InvalidWeight(token.to_string()))?;
                    weight = validate_weight(parsed, token)?;
                    state = State::End;
                }
                State::End => {
                    let trailing: Vec<&str> = std::iter::once(token).chain(tokens.by_ref()).collect();
                    return Err(SyntaxError::TrailingTokens(trailing.join(" ")));
                }
            }
        }

        match state {
            State::None => return Err(SyntaxError::MissingKeyword(keyword::IF)),
            State::If => return Err(SyntaxError::MissingKeyword(keyword::THEN)),
            State::With => return Err(SyntaxError::MissingWeight),
            State::Then | State::End => {}
        }

        if antecedent.is_empty() {
            return Err(SyntaxError::EmptyClause("antecedent"));
        }
        if consequent.is_empty() {
            return Err(SyntaxError::EmptyClause("consequent"));
        }

        Ok(Self {
            antecedent: antecedent.join(" "),
            consequent: consequent.join(" "),
            weight,
        })
    }
}

/// 权重为 1.0 时省略 `with` 子句
impl fmt::Display for RuleText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            keyword::IF,
            self.antecedent,
            keyword::THEN,
            self.consequent
        )?;
        // 精确比较，接近 1.0 的权重也要写出
        if self.weight != 1.0 {
            write!(f, " {} {}", keyword::WITH, self.weight)?;
        }
        Ok(())
    }
}

/// 规则
#[derive(Debug, Clone)]
pub struct Rule {
    enabled: bool,
    weight: f64,
    activation_degree: f64,
    triggered: bool,
    antecedent: Antecedent,
    consequent: Consequent,
}

impl Rule {
    pub fn new(
        antecedent: impl Into<String>,
        consequent: impl Into<String>,
        weight: f64,
    ) -> Result<Self> {
        let weight = validate_weight(weight, &weight.to_string())?;
        Ok(Self {
            enabled: true,
            weight,
            activation_degree: 0.0,
            triggered: false,
            antecedent: Antecedent::new(antecedent),
            consequent: Consequent::new(consequent),
        })
    }

    /// 仅解析文本，不加载
    pub fn parse(text: &str) -> Result<Self> {
        let parsed = RuleText::parse(text)?;
        Self::new(parsed.antecedent, parsed.consequent, parsed.weight)
    }

    /// 解析并加载
    pub fn create(text: &str, catalogue: &dyn Catalogue) -> Result<Self> {
        let mut rule = Self::parse(text)?;
        rule.load(catalogue)?;
        Ok(rule)
    }

    pub fn text(&self) -> String {
        RuleText {
            antecedent: self.antecedent.text().to_string(),
            consequent: self.consequent.text().to_string(),
            weight: self.weight,
        }
        .to_string()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn weight(&self) -> f64 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f64) -> Result<()> {
        self.weight = validate_weight(weight, &weight.to_string())?;
        Ok(())
    }

    /// 最近一次激活的结果，只在本周期内有意义
    pub fn activation_degree(&self) -> f64 {
        self.activation_degree
    }

    pub(crate) fn set_activation_degree(&mut self, degree: f64) {
        self.activation_degree = degree;
    }

    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    pub fn antecedent(&self) -> &Antecedent {
        &self.antecedent
    }

    pub fn consequent(&self) -> &Consequent {
        &self.consequent
    }

    pub fn is_loaded(&self) -> bool {
        self.antecedent.is_loaded() && self.consequent.is_loaded()
    }

    /// 加载前件和后件，任一失败则两者都保持未加载
    pub fn load(&mut self, catalogue: &dyn Catalogue) -> Result<()> {
        let result = self
            .antecedent
            .load(catalogue)
            .and_then(|()| self.consequent.load(catalogue));
        if result.is_err() {
            self.unload();
        }
        result
    }

    pub fn unload(&mut self) {
        self.deactivate();
        self.antecedent.unload();
        self.consequent.unload();
    }

    pub fn deactivate(&mut self) {
        self.activation_degree = 0.0;
        self.triggered = false;
    }

    /// 计算激活度：权重 × 前件激活度
    pub fn activate_with(
        &mut self,
        conjunction: Option<&dyn TNorm>,
        disjunction: Option<&dyn SNorm>,
        catalogue: &dyn Catalogue,
    ) -> Result<f64> {
        if !self.is_loaded() {
            return Err(RuleError::NotLoaded(self.text()));
        }
        let degree = self
            .antecedent
            .activation_degree(conjunction, disjunction, catalogue)?;
        self.activation_degree = self.weight * degree;
        Ok(self.activation_degree)
    }

    /// 启用且激活度大于 0 时修改后件
    pub fn trigger(
        &mut self,
        implication: Option<&Arc<dyn TNorm>>,
        catalogue: &mut dyn Catalogue,
    ) -> Result<()> {
        if !self.is_loaded() {
            return Err(RuleError::NotLoaded(self.text()));
        }
        if self.enabled && operation::is_gt(self.activation_degree, 0.0) {
            debug!(rule = %self, degree = self.activation_degree, "规则触发");
            self.consequent
                .modify(self.activation_degree, implication, catalogue)?;
            self.triggered = true;
        }
        Ok(())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalogue::{MockCatalogue, TermId, VariableId};
    use crate::hedge::hedge_factory;
    use crate::norm::Minimum;
    use crate::term::Triangle;
    use crate::variable::{InputVariable, OutputVariable, Variables};

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

    // ==================== 规则文本 ====================

    #[test]
    fn test_round_trip() {
        let text = "if obstacle is left then steer is right";
        let parsed = RuleText::parse(text).unwrap();
        assert_eq!(parsed.antecedent, "obstacle is left");
        assert_eq!(parsed.consequent, "steer is right");
        assert_eq!(parsed.weight, 1.0);
        assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn test_weight_preserved() {
        let text = "if obstacle is left then steer is right with 0.5";
        let parsed = RuleText::parse(text).unwrap();
        assert_eq!(parsed.weight, 0.5);
        assert_eq!(parsed.to_string(), text);
    }

    #[test]
    fn test_weight_near_one_survives_round_trip() {
        let text = "if a is b then c is d with 1.0000005";
        let parsed = RuleText::parse(text).unwrap();
        assert_eq!(parsed.to_string(), text);

        let reparsed = RuleText::parse(&parsed.to_string()).unwrap();
        assert_eq!(reparsed.weight, parsed.weight);
        assert_eq!(reparsed.weight, 1.0000005);
    }

    #[test]
    fn test_comment_and_whitespace() {
        let parsed =
            RuleText::parse("  if  obstacle is left\tthen steer is right # avoid").unwrap();
        assert_eq!(parsed.to_string(), "if obstacle is left then steer is right");
    }

    #[test]
    fn test_missing_if() {
        let err = RuleText::parse("obstacle is left then steer is right").unwrap_err();
        assert_eq!(err, SyntaxError::MissingKeyword("if"));
        assert_eq!(RuleText::parse("").unwrap_err(), SyntaxError::MissingKeyword("if"));
    }

    #[test]
    fn test_missing_then() {
        let err = RuleText::parse("if obstacle is left steer is right").unwrap_err();
        assert_eq!(err, SyntaxError::MissingKeyword("then"));
    }

    #[test]
    fn test_weight_errors() {
        assert_eq!(
            RuleText::parse("if a is b then c is d with").unwrap_err(),
            SyntaxError::MissingWeight
        );
        assert_eq!(
            RuleText::parse("if a is b then c is d with heavy").unwrap_err(),
            SyntaxError::InvalidWeight("heavy".to_string())
        );
        assert_eq!(
            RuleText::parse("if a is b then c is d with -1").unwrap_err(),
            SyntaxError::InvalidWeight("-1".to_string())
        );
        assert_eq!(
            RuleText::parse("if a is b then c is d with 0.5 and more").unwrap_err(),
            SyntaxError::TrailingTokens("and more".to_string())
        );
    }

    #[test]
    fn test_empty_clauses() {
        assert_eq!(
            RuleText::parse("if then c is d").unwrap_err(),
            SyntaxError::EmptyClause("antecedent")
        );
        assert_eq!(
            RuleText::parse("if a is b then").unwrap_err(),
            SyntaxError::EmptyClause("consequent")
        );
    }

    // ==================== 规则生命周期 ====================

    #[test]
    fn test_create_and_trigger() {
        let mut variables = variables();
        variables.set_input_value("obstacle", 0.25).unwrap();

        let mut rule = Rule::create("if obstacle is left then steer is right", &variables).unwrap();
        assert!(rule.is_loaded());

        let degree = rule.activate_with(None, None, &variables).unwrap();
        assert_eq!(degree, 0.75);

        let implication: Arc<dyn TNorm> = Arc::new(Minimum);
        rule.trigger(Some(&implication), &mut variables).unwrap();
        assert!(rule.is_triggered());
        assert_eq!(
            variables.output("steer").unwrap().fuzzy_output_value(),
            "0.750/right"
        );
    }

    #[test]
    fn test_weight_scales_activation_after_hedges() {
        let mut variables = variables();
        variables.set_input_value("obstacle", 0.5).unwrap();

        let mut rule =
            Rule::create("if obstacle is very left then steer is right with 0.5", &variables)
                .unwrap();
        // 0.5 × very(0.5)
        assert_eq!(rule.activate_with(None, None, &variables).unwrap(), 0.125);
    }

    #[test]
    fn test_zero_degree_does_not_trigger() {
        let mut catalogue = MockCatalogue::new();
        catalogue.expect_find_variable().returning(|name| match name {
            "obstacle" => Some(VariableId::input(0)),
            "steer" => Some(VariableId::output(0)),
            _ => None,
        });
        catalogue.expect_find_term().returning(|_, _| Some(TermId(0)));
        catalogue
            .expect_find_hedge()
            .returning(|name| hedge_factory().construct(name).ok());
        catalogue.expect_is_enabled().returning(|_| true);
        catalogue.expect_membership().returning(|_, _| 0.0);
        catalogue.expect_conclude().times(0);

        let mut rule = Rule::create("if obstacle is left then steer is left", &catalogue).unwrap();
        assert_eq!(rule.activate_with(None, None, &catalogue).unwrap(), 0.0);
        rule.trigger(None, &mut catalogue).unwrap();
        assert!(!rule.is_triggered());
    }

    #[test]
    fn test_disabled_rule_does_not_trigger() {
        let mut variables = variables();
        variables.set_input_value("obstacle", 0.0).unwrap();
        let mut rule = Rule::create("if obstacle is left then steer is right", &variables).unwrap();
        rule.set_enabled(false);
        rule.activate_with(None, None, &variables).unwrap();
        rule.trigger(None, &mut variables).unwrap();
        assert!(!rule.is_triggered());
        assert!(variables.output("steer").unwrap().fuzzy_output().terms().is_empty());
    }

    #[test]
    fn test_not_loaded() {
        let mut variables = variables();
        let mut rule = Rule::parse("if obstacle is left then steer is right").unwrap();
        assert!(matches!(
            rule.activate_with(None, None, &variables),
            Err(RuleError::NotLoaded(_))
        ));
        assert!(matches!(
            rule.trigger(None, &mut variables),
            Err(RuleError::NotLoaded(_))
        ));
    }

    #[test]
    fn test_failed_load_unloads_both_clauses() {
        let variables = variables();
        let mut rule = Rule::parse("if obstacle is left then steer is sideways").unwrap();
        assert!(rule.load(&variables).is_err());
        assert!(!rule.antecedent().is_loaded());
        assert!(!rule.consequent().is_loaded());
    }

    #[test]
    fn test_deactivate_resets_transient_state() {
        let mut variables = variables();
        variables.set_input_value("obstacle", 0.0).unwrap();
        let mut rule = Rule::create("if obstacle is left then steer is right", &variables).unwrap();
        rule.activate_with(None, None, &variables).unwrap();
        rule.trigger(None, &mut variables).unwrap();
        assert!(rule.is_triggered());

        rule.deactivate();
        assert_eq!(rule.activation_degree(), 0.0);
        assert!(!rule.is_triggered());
    }

    #[test]
    fn test_invalid_weight_setter() {
        let mut rule = Rule::parse("if a is b then c is d").unwrap();
        assert!(rule.set_weight(0.0).is_err());
        assert!(rule.set_weight(f64::NAN).is_err());
        rule.set_weight(0.25).unwrap();
        assert_eq!(rule.text(), "if a is b then c is d with 0.25");
    }
}
