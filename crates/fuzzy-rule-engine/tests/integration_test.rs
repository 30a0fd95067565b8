//! 推理引擎集成测试
//!
//! 测试完整的定义构建、规则加载、推理周期工作流。

use fuzzy_engine::hedge::HedgeFunction;
use fuzzy_engine::norm::NormFunction;
use fuzzy_engine::term::{Trapezoid, Triangle};
use fuzzy_engine::{
    Engine, Factories, InputVariable, OutputVariable, RuleBlockDefinition, RuleError, Variables,
};
use std::sync::Arc;

const TIPPER: &str = r#"{
    "name": "tipper",
    "description": "service and food quality to tip",
    "conjunction": "Minimum",
    "disjunction": "Maximum",
    "implication": "Minimum",
    "activation": "General",
    "rules": [
        "if service is poor or food is rancid then tip is cheap",
        "if service is good then tip is average",
        "if service is excellent or food is delicious then tip is generous with 0.5"
    ]
}"#;

const REVIEW: &str = r#"{
    "name": "review",
    "activation": "Highest 1",
    "rules": [
        "if tip is cheap then mood is bad",
        "if tip is generous then mood is happy",
        "if tip is very average then mood is calm"
    ]
}"#;

fn create_variables() -> Variables {
    let mut variables = Variables::new();
    variables.add_input(
        InputVariable::new("service", 0.0, 10.0)
            .with_term(Triangle::new("poor", 0.0, 0.0, 5.0))
            .with_term(Triangle::new("good", 0.0, 5.0, 10.0))
            .with_term(Triangle::new("excellent", 5.0, 10.0, 10.0)),
    );
    variables.add_input(
        InputVariable::new("food", 0.0, 10.0)
            .with_term(Trapezoid::new("rancid", 0.0, 0.0, 1.0, 3.0))
            .with_term(Trapezoid::new("delicious", 7.0, 9.0, 10.0, 10.0)),
    );
    variables.add_output(
        OutputVariable::new("tip", 0.0, 30.0)
            .with_term(Triangle::new("cheap", 0.0, 5.0, 10.0))
            .with_term(Triangle::new("average", 10.0, 15.0, 20.0))
            .with_term(Triangle::new("generous", 20.0, 25.0, 30.0)),
    );
    variables.add_output(
        OutputVariable::new("mood", 0.0, 1.0)
            .with_term(Triangle::new("bad", 0.0, 0.0, 0.5))
            .with_term(Triangle::new("calm", 0.0, 0.5, 1.0))
            .with_term(Triangle::new("happy", 0.5, 1.0, 1.0)),
    );
    variables
}

fn create_engine(definitions: &[&str], factories: &Factories) -> Engine {
    let mut engine = Engine::new("tipper").with_variables(create_variables());
    for json in definitions {
        let definition = RuleBlockDefinition::from_json(json).unwrap();
        engine.load_definition(&definition, factories).unwrap();
    }
    engine
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let actual = actual.expect("term should exist");
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {}, got {}",
        expected,
        actual
    );
}

// ==================== 完整工作流测试 ====================

#[test]
fn test_tipper_cycle() {
    let mut engine = create_engine(&[TIPPER], &Factories::new());
    engine.set_input_value("service", 2.5).unwrap();
    engine.set_input_value("food", 8.0).unwrap();
    engine.process().unwrap();

    // poor = 0.5, good = 0.5, delicious = 0.5（权重 0.5）
    assert_close(engine.activation_degree("tip", "cheap"), 0.5);
    assert_close(engine.activation_degree("tip", "average"), 0.5);
    assert_close(engine.activation_degree("tip", "generous"), 0.25);

    let block = engine.block("tipper").unwrap();
    assert!(block.rules().iter().all(|rule| rule.is_triggered()));
    assert_eq!(block.rules()[2].activation_degree(), 0.25);
}

#[test]
fn test_chained_blocks_read_accumulated_outputs() {
    let mut engine = create_engine(&[TIPPER, REVIEW], &Factories::new());
    engine.set_input_value("service", 2.5).unwrap();
    engine.set_input_value("food", 8.0).unwrap();
    engine.process().unwrap();

    // cheap = 0.5, generous = 0.25, very average = 0.25，只触发最高的一条
    let review = engine.block("review").unwrap();
    let triggered: Vec<bool> = review.rules().iter().map(|r| r.is_triggered()).collect();
    assert_eq!(triggered, vec![true, false, false]);
    assert_close(engine.activation_degree("mood", "bad"), 0.5);
    assert_close(engine.activation_degree("mood", "happy"), 0.0);
    assert_close(engine.activation_degree("mood", "calm"), 0.0);
}

#[test]
fn test_repeated_cycles_are_independent() {
    let mut engine = create_engine(&[TIPPER], &Factories::new());

    engine.set_input_value("service", 2.5).unwrap();
    engine.set_input_value("food", 8.0).unwrap();
    engine.process().unwrap();

    engine.set_input_value("service", 10.0).unwrap();
    engine.set_input_value("food", 5.0).unwrap();
    engine.process().unwrap();

    assert_close(engine.activation_degree("tip", "cheap"), 0.0);
    assert_close(engine.activation_degree("tip", "average"), 0.0);
    assert_close(engine.activation_degree("tip", "generous"), 0.5);
    assert!(!engine.block("tipper").unwrap().rules()[0].is_triggered());
}

// ==================== 自定义组件测试 ====================

#[test]
fn test_custom_norm_and_hedge() {
    let mut factories = Factories::new();
    factories.tnorms.register("Product", || {
        Arc::new(NormFunction::parse("a * b").unwrap())
    });

    let json = r#"{
        "name": "custom",
        "conjunction": "Product",
        "rules": [
            "if service is good and food is delicious then tip is generous",
            "if service is quite good then tip is average"
        ]
    }"#;

    let mut engine = Engine::new("custom").with_variables(create_variables());
    engine
        .variables_mut()
        .register_hedge(Arc::new(HedgeFunction::parse("quite", "sqrt(x)").unwrap()));
    engine
        .load_definition(&RuleBlockDefinition::from_json(json).unwrap(), &factories)
        .unwrap();

    engine.set_input_value("service", 2.5).unwrap();
    engine.set_input_value("food", 8.0).unwrap();
    engine.process().unwrap();

    assert_close(engine.activation_degree("tip", "generous"), 0.25);
    assert_close(engine.activation_degree("tip", "average"), 0.5_f64.sqrt());
}

#[test]
fn test_disabled_output_is_not_modified() {
    let mut engine = create_engine(&[TIPPER], &Factories::new());
    engine.variables_mut().output_mut("tip").unwrap().enabled = false;
    engine.set_input_value("service", 2.5).unwrap();
    engine.set_input_value("food", 8.0).unwrap();
    engine.process().unwrap();

    assert!(engine.variables().output("tip").unwrap().fuzzy_output().terms().is_empty());
}

// ==================== 错误处理测试 ====================

#[test]
fn test_unresolved_term_fails_block_load() {
    let json = r#"{
        "name": "broken",
        "conjunction": "Minimum",
        "rules": [
            "if service is good then tip is average",
            "if service is superb then tip is generous"
        ]
    }"#;
    let mut engine = Engine::new("broken").with_variables(create_variables());
    let err = engine
        .load_definition(&RuleBlockDefinition::from_json(json).unwrap(), &Factories::new())
        .unwrap_err();

    match err {
        RuleError::BlockLoad { block, messages } => {
            assert_eq!(block, "broken");
            assert_eq!(messages.len(), 1);
            assert!(messages[0].contains("superb"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.blocks().is_empty());
}

#[test]
fn test_missing_conjunction_fails_cycle() {
    let json = r#"{
        "name": "no-conjunction",
        "rules": ["if service is good and food is rancid then tip is cheap"]
    }"#;
    let mut engine = Engine::new("strict").with_variables(create_variables());
    engine
        .load_definition(&RuleBlockDefinition::from_json(json).unwrap(), &Factories::new())
        .unwrap();

    let err = engine.process().unwrap_err();
    assert!(matches!(err, RuleError::MissingCombinator("conjunction")));
}

#[test]
fn test_unknown_norm_key() {
    let json = r#"{"name": "typo", "disjunction": "Maximun"}"#;
    let definition = RuleBlockDefinition::from_json(json).unwrap();
    let err = definition.build(&Factories::new()).unwrap_err();
    assert!(err.to_string().contains("SNormFactory"));
    assert!(err.to_string().contains("Maximun"));
}

// ==================== 导出测试 ====================

#[test]
fn test_exported_definitions_rebuild_identically() {
    let engine = create_engine(&[TIPPER, REVIEW], &Factories::new());
    let factories = Factories::new();

    for block in engine.blocks() {
        let exported = RuleBlockDefinition::from_block(block);
        let json = exported.to_json().unwrap();
        let rebuilt = RuleBlockDefinition::from_json(&json)
            .unwrap()
            .build(&factories)
            .unwrap();
        assert_eq!(rebuilt.to_string(), block.to_string());
    }
}
