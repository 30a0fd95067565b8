//! 操作符/函数注册表与自由数值表达式
//!
//! [`FunctionFactory`] 持有内置操作符和函数的原型（[`Element`]），
//! 解析得到的每个表达式节点都拥有原型的独立副本，
//! 修改某个节点的元数据不会影响注册表或其他表达式树。
//!
//! [`Formula`] 是自由格式的数值表达式（如 `a + b - (a * b)`），
//! 供 [`crate::norm::NormFunction`] 和 [`crate::hedge::HedgeFunction`] 使用。

use crate::error::{ReferenceKind, Result, RuleError};
use crate::factory::CloningFactory;
use crate::operation::{self, truth};
use crate::parser;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

/// 元素类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElementKind {
    Operator,
    Function,
}

/// 结合性
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

/// 元素的求值方法
#[derive(Debug, Clone, Copy)]
pub enum Method {
    Unary(fn(f64) -> f64),
    Binary(fn(f64, f64) -> f64),
}

/// 操作符或函数原型
#[derive(Debug, Clone)]
pub struct Element {
    pub name: String,
    pub description: String,
    pub kind: ElementKind,
    pub method: Method,
    pub precedence: i32,
    pub associativity: Associativity,
}

impl Element {
    pub fn operator(
        name: &str,
        description: &str,
        method: Method,
        precedence: i32,
        associativity: Associativity,
    ) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: ElementKind::Operator,
            method,
            precedence,
            associativity,
        }
    }

    /// 函数不参与优先级比较
    pub fn function(name: &str, description: &str, method: Method) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            kind: ElementKind::Function,
            method,
            precedence: 0,
            associativity: Associativity::Left,
        }
    }

    pub fn arity(&self) -> usize {
        match self.method {
            Method::Unary(_) => 1,
            Method::Binary(_) => 2,
        }
    }

    pub fn is_operator(&self) -> bool {
        self.kind == ElementKind::Operator
    }

    pub fn is_function(&self) -> bool {
        self.kind == ElementKind::Function
    }

    /// 以给定参数求值，参数个数必须等于元数
    pub fn evaluate(&self, arguments: &[f64]) -> Result<f64> {
        match (self.method, arguments) {
            (Method::Unary(f), [a]) => Ok(f(*a)),
            (Method::Binary(f), [a, b]) => Ok(f(*a, *b)),
            _ => Err(crate::error::ParseError::ArityMismatch {
                function: self.name.clone(),
                expected: self.arity(),
                found: arguments.len(),
            }
            .into()),
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// 逻辑真值：与 1.0 在容差内相等
fn is_true(x: f64) -> bool {
    operation::is_eq(x, 1.0)
}

/// 操作符与函数注册表
#[derive(Debug, Clone)]
pub struct FunctionFactory {
    elements: CloningFactory<Element>,
}

static SHARED: LazyLock<FunctionFactory> = LazyLock::new(FunctionFactory::new);

impl FunctionFactory {
    /// 创建包含全部内置元素的注册表
    pub fn new() -> Self {
        let mut factory = Self {
            elements: CloningFactory::new("FunctionFactory"),
        };
        factory.register_operators();
        factory.register_functions();
        factory
    }

    /// 进程内共享的只读注册表
    pub fn shared() -> &'static FunctionFactory {
        &SHARED
    }

    fn register_operators(&mut self) {
        use Associativity::{Left, Right};

        let p = 100;
        let operators = [
            Element::operator(
                "!",
                "Logical NOT",
                Method::Unary(|a| truth(!is_true(a))),
                p,
                Right,
            ),
            Element::operator("~", "Negation", Method::Unary(|a| -a), p, Right),
            Element::operator("^", "Power", Method::Binary(f64::powf), p - 10, Right),
            Element::operator("*", "Multiplication", Method::Binary(|a, b| a * b), p - 20, Left),
            Element::operator("/", "Division", Method::Binary(|a, b| a / b), p - 20, Left),
            Element::operator("%", "Modulo", Method::Binary(|a, b| a % b), p - 20, Left),
            Element::operator("+", "Addition", Method::Binary(|a, b| a + b), p - 30, Left),
            Element::operator("-", "Subtraction", Method::Binary(|a, b| a - b), p - 30, Left),
            Element::operator(
                "and",
                "Logical AND",
                Method::Binary(|a, b| truth(is_true(a) && is_true(b))),
                p - 40,
                Right,
            ),
            Element::operator(
                "or",
                "Logical OR",
                Method::Binary(|a, b| truth(is_true(a) || is_true(b))),
                p - 50,
                Right,
            ),
        ];

        for element in operators {
            self.register(element);
        }
    }

    fn register_functions(&mut self) {
        let comparisons = [
            ("gt", "Greater than (>)", Method::Binary(|a, b| truth(operation::is_gt(a, b)))),
            ("ge", "Greater than or equal to (>=)", Method::Binary(|a, b| truth(operation::is_ge(a, b)))),
            ("eq", "Equal to (==)", Method::Binary(|a, b| truth(operation::is_eq(a, b)))),
            ("neq", "Not equal to (!=)", Method::Binary(|a, b| truth(operation::is_neq(a, b)))),
            ("le", "Less than or equal to (<=)", Method::Binary(|a, b| truth(operation::is_le(a, b)))),
            ("lt", "Less than (<)", Method::Binary(|a, b| truth(operation::is_lt(a, b)))),
        ];

        let unary: [(&str, &str, fn(f64) -> f64); 21] = [
            ("acos", "Inverse cosine", f64::acos),
            ("asin", "Inverse sine", f64::asin),
            ("atan", "Inverse tangent", f64::atan),
            ("ceil", "Ceiling", f64::ceil),
            ("cos", "Cosine", f64::cos),
            ("cosh", "Hyperbolic cosine", f64::cosh),
            ("exp", "Exponential", f64::exp),
            ("abs", "Absolute", f64::abs),
            ("floor", "Floor", f64::floor),
            ("log", "Natural logarithm", f64::ln),
            ("log10", "Common logarithm", f64::log10),
            ("round", "Round", f64::round),
            ("sin", "Sine", f64::sin),
            ("sinh", "Hyperbolic sine", f64::sinh),
            ("sqrt", "Square root", f64::sqrt),
            ("tan", "Tangent", f64::tan),
            ("tanh", "Hyperbolic tangent", f64::tanh),
            ("log1p", "Natural logarithm plus one", f64::ln_1p),
            ("acosh", "Inverse hyperbolic cosine", f64::acosh),
            ("asinh", "Inverse hyperbolic sine", f64::asinh),
            ("atanh", "Inverse hyperbolic tangent", f64::atanh),
        ];

        let binary: [(&str, &str, fn(f64, f64) -> f64); 5] = [
            ("atan2", "Inverse tangent (y,x)", f64::atan2),
            ("pow", "Power", f64::powf),
            ("fmod", "Floating-point remainder", |a, b| a % b),
            ("min", "Minimum", f64::min),
            ("max", "Maximum", f64::max),
        ];

        for (name, description, method) in comparisons {
            self.register(Element::function(name, description, method));
        }
        for (name, description, f) in unary {
            self.register(Element::function(name, description, Method::Unary(f)));
        }
        for (name, description, f) in binary {
            self.register(Element::function(name, description, Method::Binary(f)));
        }
    }

    /// 注册或替换元素
    pub fn register(&mut self, element: Element) {
        self.elements.register(element.name.clone(), element);
    }

    pub fn deregister(&mut self, name: &str) -> bool {
        self.elements.deregister(name)
    }

    pub fn get(&self, name: &str) -> Option<&Element> {
        self.elements.get(name)
    }

    /// 原型的独立副本，未注册的键返回配置错误
    pub fn copy(&self, name: &str) -> Result<Element> {
        self.elements.copy(name)
    }

    pub fn is_operator(&self, name: &str) -> bool {
        self.get(name).is_some_and(Element::is_operator)
    }

    pub fn is_function(&self, name: &str) -> bool {
        self.get(name).is_some_and(Element::is_function)
    }

    pub fn operators(&self) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(|e| e.is_operator())
    }

    pub fn functions(&self) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(|e| e.is_function())
    }
}

impl Default for FunctionFactory {
    fn default() -> Self {
        Self::new()
    }
}

/// 数值表达式树节点
#[derive(Debug, Clone)]
pub enum FormulaNode {
    Element {
        element: Element,
        operands: Vec<FormulaNode>,
    },
    Variable(String),
    Constant(f64),
}

impl FormulaNode {
    /// 求值，变量通过 `lookup` 绑定
    pub fn evaluate(&self, lookup: &dyn Fn(&str) -> Option<f64>) -> Result<f64> {
        match self {
            Self::Constant(value) => Ok(*value),
            Self::Variable(name) => {
                lookup(name).ok_or_else(|| RuleError::unresolved(ReferenceKind::Variable, name))
            }
            Self::Element { element, operands } => {
                let arguments = operands
                    .iter()
                    .map(|operand| operand.evaluate(lookup))
                    .collect::<Result<Vec<_>>>()?;
                element.evaluate(&arguments)
            }
        }
    }

    /// 表达式中引用的全部变量名
    pub fn variables(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        self.collect_variables(&mut names);
        names
    }

    fn collect_variables(&self, names: &mut BTreeSet<String>) {
        match self {
            Self::Variable(name) => {
                names.insert(name.clone());
            }
            Self::Element { operands, .. } => {
                for operand in operands {
                    operand.collect_variables(names);
                }
            }
            Self::Constant(_) => {}
        }
    }

    pub fn to_postfix(&self) -> String {
        match self {
            Self::Constant(value) => value.to_string(),
            Self::Variable(name) => name.clone(),
            Self::Element { element, operands } => {
                let mut parts: Vec<String> = operands.iter().map(Self::to_postfix).collect();
                parts.push(element.name.clone());
                parts.join(" ")
            }
        }
    }

    pub fn to_prefix(&self) -> String {
        match self {
            Self::Constant(value) => value.to_string(),
            Self::Variable(name) => name.clone(),
            Self::Element { element, operands } => {
                let mut parts = vec![element.name.clone()];
                parts.extend(operands.iter().map(Self::to_prefix));
                parts.join(" ")
            }
        }
    }
}

/// 自由格式数值表达式
#[derive(Debug, Clone)]
pub struct Formula {
    text: String,
    root: FormulaNode,
    variables: BTreeMap<String, f64>,
}

impl Formula {
    /// 使用共享注册表解析
    pub fn parse(text: &str) -> Result<Self> {
        Self::parse_with(text, FunctionFactory::shared())
    }

    pub fn parse_with(text: &str, factory: &FunctionFactory) -> Result<Self> {
        let root = parser::parse_formula(text, factory)?;
        Ok(Self {
            text: text.trim().to_string(),
            root,
            variables: BTreeMap::new(),
        })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn root(&self) -> &FormulaNode {
        &self.root
    }

    /// 设置常驻变量值（求值时可被临时绑定覆盖）
    pub fn set_variable(&mut self, name: impl Into<String>, value: f64) {
        self.variables.insert(name.into(), value);
    }

    pub fn variables(&self) -> &BTreeMap<String, f64> {
        &self.variables
    }

    /// 引用了、但既未常驻也不在 `bound` 中的变量
    pub fn unbound_variables(&self, bound: &[&str]) -> Vec<String> {
        self.root
            .variables()
            .into_iter()
            .filter(|name| !bound.contains(&name.as_str()) && !self.variables.contains_key(name))
            .collect()
    }

    pub fn evaluate(&self) -> Result<f64> {
        self.evaluate_with(&[])
    }

    /// 以临时绑定求值，临时绑定优先于常驻变量
    pub fn evaluate_with(&self, bindings: &[(&str, f64)]) -> Result<f64> {
        let lookup = |name: &str| {
            bindings
                .iter()
                .find(|(bound, _)| *bound == name)
                .map(|(_, value)| *value)
                .or_else(|| self.variables.get(name).copied())
        };
        self.root.evaluate(&lookup)
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.text)
    }
}
