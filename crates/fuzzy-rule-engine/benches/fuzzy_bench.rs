//! 解析器性能基准测试
//!
//! 针对规则文本、前件表达式和数学公式的解析进行细粒度的性能测试。

use criterion::{Criterion, criterion_group, criterion_main};
use fuzzy_engine::term::Triangle;
use fuzzy_engine::{Formula, InputVariable, OutputVariable, Rule, RuleText, Variables};
use std::hint::black_box;

fn create_variables() -> Variables {
    let mut variables = Variables::new();
    for name in ["a", "b", "c"] {
        variables.add_input(
            InputVariable::new(name, 0.0, 1.0)
                .with_term(Triangle::new("low", 0.0, 0.0, 1.0))
                .with_term(Triangle::new("high", 0.0, 1.0, 1.0)),
        );
    }
    variables.add_output(
        OutputVariable::new("out", 0.0, 1.0).with_term(Triangle::new("high", 0.0, 1.0, 1.0)),
    );
    variables
}

/// 规则文本切分基准
fn bench_rule_text(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_text");

    group.bench_function("simple", |b| {
        b.iter(|| RuleText::parse(black_box("if a is high then out is high")))
    });

    group.bench_function("weighted", |b| {
        b.iter(|| {
            RuleText::parse(black_box(
                "if a is high and b is low or c is high then out is high with 0.5 # comment",
            ))
        })
    });

    group.finish();
}

/// 规则加载（解析并解析名字）基准
fn bench_rule_load(c: &mut Criterion) {
    let mut group = c.benchmark_group("rule_load");
    let variables = create_variables();

    group.bench_function("flat", |b| {
        b.iter(|| Rule::create(black_box("if a is high and b is low then out is high"), &variables))
    });

    group.bench_function("nested_with_hedges", |b| {
        b.iter(|| {
            Rule::create(
                black_box("if (a is very high or b is not low) and (c is somewhat high or a is any) then out is extremely high"),
                &variables,
            )
        })
    });

    group.finish();
}

/// 公式解析与求值基准
fn bench_formula(c: &mut Criterion) {
    let mut group = c.benchmark_group("formula");

    group.bench_function("parse", |b| {
        b.iter(|| Formula::parse(black_box("3 + 4 * 2 / (1 - 5) ^ 2 ^ 3 + sin(x) * max(a, b)")))
    });

    let formula = Formula::parse("(a * b) / (a + b - a * b)").unwrap();
    group.bench_function("evaluate", |b| {
        b.iter(|| formula.evaluate_with(black_box(&[("a", 0.3), ("b", 0.7)])))
    });

    group.finish();
}

criterion_group!(benches, bench_rule_text, bench_rule_load, bench_formula);
criterion_main!(benches);
