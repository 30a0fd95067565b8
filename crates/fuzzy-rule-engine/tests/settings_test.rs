//! 进程级容差设置测试
//!
//! 容差为全局状态，单独放在一个测试进程中修改。
//! 各测试设置相同的值，互不干扰。

use fuzzy_engine::norm::Minimum;
use fuzzy_engine::term::Triangle;
use fuzzy_engine::{operation, settings};
use fuzzy_engine::{InputVariable, OutputVariable, Rule, TNorm, Variables};
use fuzzy_shared::config::EngineConfig;
use std::sync::Arc;

const TOLERANCE: f64 = 1e-3;

fn apply_tolerance() {
    settings::apply(&EngineConfig {
        tolerance: TOLERANCE,
    })
    .unwrap();
}

#[test]
fn test_apply_changes_comparisons() {
    apply_tolerance();
    assert_eq!(settings::tolerance(), TOLERANCE);

    assert!(operation::is_eq(1.0, 1.0005));
    assert!(!operation::is_gt(1.0005, 1.0));
    assert!(!operation::is_neq(1.0, 1.0005));
    assert!(operation::is_gt(1.002, 1.0));
}

#[test]
fn test_invalid_setting_keeps_current_tolerance() {
    apply_tolerance();
    assert!(settings::apply(&EngineConfig { tolerance: 0.0 }).is_err());
    assert_eq!(settings::tolerance(), TOLERANCE);
}

#[test]
fn test_degree_within_tolerance_does_not_trigger() {
    apply_tolerance();

    let mut variables = Variables::new();
    variables.add_input(
        InputVariable::new("distance", 0.0, 1.0).with_term(Triangle::new("near", 0.0, 0.0, 1.0)),
    );
    variables.add_output(
        OutputVariable::new("brake", 0.0, 1.0).with_term(Triangle::new("hard", 0.0, 1.0, 1.0)),
    );
    // near(0.9995) ≈ 5e-4
    variables.set_input_value("distance", 0.9995).unwrap();

    let mut rule = Rule::create("if distance is near then brake is hard", &variables).unwrap();
    let degree = rule.activate_with(None, None, &variables).unwrap();
    assert!(degree > 0.0);
    assert!(degree < TOLERANCE);

    let implication: Arc<dyn TNorm> = Arc::new(Minimum);
    rule.trigger(Some(&implication), &mut variables).unwrap();
    assert!(!rule.is_triggered());
    assert!(variables.output("brake").unwrap().fuzzy_output().terms().is_empty());
}
