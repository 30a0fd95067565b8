//! 表达式解析器
//!
//! 使用调度场（shunting-yard）算法把中缀记号流转为后缀序列，再按文法构建树：
//! - 前件文法：只有 `and` / `or` 两个操作符，没有函数，
//!   连续的操作数单词由状态机组装为命题 `variable is [hedge]* term`
//! - 公式文法：数字、标识符以及注册表中的全部操作符和函数
//!
//! 同一个 `and` / `or` 在前件中生成逻辑节点，在公式中则是布尔运算，
//! 由调用方选择的文法决定。

use crate::catalogue::Catalogue;
use crate::error::{ParseError, ReferenceKind, Result, RuleError};
use crate::expression::{Expression, Proposition, TermRef, VariableRef};
use crate::function::{Associativity, Element, FormulaNode, FunctionFactory};
use crate::hedge::{self, Hedge};
use crate::operators::{LogicalOperator, keyword};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Operand(String),
    Operator(String),
    Function(String),
    LeftParen,
    RightParen,
    Comma,
}

impl Token {
    fn text(&self) -> String {
        match self {
            Self::Operand(s) | Self::Operator(s) | Self::Function(s) => s.clone(),
            Self::LeftParen => "(".to_string(),
            Self::RightParen => ")".to_string(),
            Self::Comma => ",".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
enum Postfix {
    Operand(String),
    Element(Element),
}

/// 调度场中待处理的项
enum Pending {
    Element(Element),
    Paren { call: bool },
}

fn tokenize_antecedent(text: &str) -> Vec<Token> {
    text.replace('(', " ( ")
        .replace(')', " ) ")
        .split_whitespace()
        .map(|word| match word {
            "(" => Token::LeftParen,
            ")" => Token::RightParen,
            keyword::AND | keyword::OR => Token::Operator(word.to_string()),
            _ => Token::Operand(word.to_string()),
        })
        .collect()
}

fn tokenize_formula(text: &str, factory: &FunctionFactory) -> Result<Vec<Token>> {
    let chars: Vec<char> = text.chars().collect();
    let mut tokens: Vec<Token> = Vec::new();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        if c.is_whitespace() {
            i += 1;
            continue;
        }

        let starts_number = c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).is_some_and(char::is_ascii_digit));
        if starts_number {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                i += 1;
            }
            // 科学计数法指数部分
            if i < chars.len() && (chars[i] == 'e' || chars[i] == 'E') {
                let mut j = i + 1;
                if j < chars.len() && (chars[j] == '+' || chars[j] == '-') {
                    j += 1;
                }
                if j < chars.len() && chars[j].is_ascii_digit() {
                    i = j;
                    while i < chars.len() && chars[i].is_ascii_digit() {
                        i += 1;
                    }
                }
            }
            tokens.push(Token::Operand(chars[start..i].iter().collect()));
            continue;
        }

        if c.is_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len()
                && (chars[i].is_alphanumeric() || chars[i] == '_' || chars[i] == '.')
            {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let next = chars[i..].iter().find(|c| !c.is_whitespace());

            let token = if factory.is_function(&word) {
                Token::Function(word)
            } else if factory.is_operator(&word) {
                Token::Operator(word)
            } else if next == Some(&'(') {
                return Err(ParseError::UnknownOperator(word).into());
            } else {
                Token::Operand(word)
            };
            tokens.push(token);
            continue;
        }

        let token = match c {
            '(' => Token::LeftParen,
            ')' => Token::RightParen,
            ',' => Token::Comma,
            _ => {
                let symbol = c.to_string();
                if !factory.is_operator(&symbol) {
                    return Err(ParseError::UnknownOperator(symbol).into());
                }
                // 处于操作数位置的 '-' 是取负
                let operand_position = matches!(
                    tokens.last(),
                    None | Some(Token::Operator(_) | Token::LeftParen | Token::Comma)
                );
                if symbol == "-" && operand_position {
                    Token::Operator("~".to_string())
                } else {
                    Token::Operator(symbol)
                }
            }
        };
        tokens.push(token);
        i += 1;
    }

    Ok(tokens)
}

fn pop_until_paren(pending: &mut Vec<Pending>, output: &mut Vec<Postfix>) {
    while matches!(pending.last(), Some(Pending::Element(_))) {
        if let Some(Pending::Element(element)) = pending.pop() {
            output.push(Postfix::Element(element));
        }
    }
}

/// 调度场算法：中缀记号 → 后缀序列
fn to_postfix(tokens: &[Token], factory: &FunctionFactory, text: &str) -> Result<Vec<Postfix>> {
    let unbalanced = || RuleError::from(ParseError::UnbalancedParentheses(text.to_string()));

    let mut output = Vec::with_capacity(tokens.len());
    let mut pending: Vec<Pending> = Vec::new();
    // 每层函数调用已读到的参数个数
    let mut arguments: Vec<usize> = Vec::new();

    for (position, token) in tokens.iter().enumerate() {
        match token {
            Token::Operand(word) => output.push(Postfix::Operand(word.clone())),

            Token::Function(name) => {
                let next = tokens.get(position + 1);
                if next != Some(&Token::LeftParen) {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'('",
                        found: next.map_or_else(|| "<end>".to_string(), Token::text),
                    }
                    .into());
                }
                pending.push(Pending::Element(factory.copy(name)?));
            }

            Token::Operator(symbol) => {
                let operator = factory
                    .get(symbol)
                    .filter(|element| element.is_operator())
                    .cloned()
                    .ok_or_else(|| ParseError::UnknownOperator(symbol.clone()))?;

                // 前缀一元操作符没有左操作数，不触发归约
                if operator.arity() == 2 {
                    while let Some(Pending::Element(top)) = pending.last() {
                        let reduce = top.is_operator()
                            && match operator.associativity {
                                Associativity::Left => operator.precedence <= top.precedence,
                                Associativity::Right => operator.precedence < top.precedence,
                            };
                        if !reduce {
                            break;
                        }
                        if let Some(Pending::Element(top)) = pending.pop() {
                            output.push(Postfix::Element(top));
                        }
                    }
                }
                pending.push(Pending::Element(operator));
            }

            Token::LeftParen => {
                let call = position > 0 && matches!(tokens[position - 1], Token::Function(_));
                if call {
                    let empty = tokens.get(position + 1) == Some(&Token::RightParen);
                    arguments.push(if empty { 0 } else { 1 });
                }
                pending.push(Pending::Paren { call });
            }

            Token::Comma => {
                pop_until_paren(&mut pending, &mut output);
                match (pending.last(), arguments.last_mut()) {
                    (Some(Pending::Paren { call: true }), Some(count)) => *count += 1,
                    _ => {
                        return Err(ParseError::UnexpectedToken {
                            expected: "function argument list",
                            found: ",".to_string(),
                        }
                        .into());
                    }
                }
            }

            Token::RightParen => {
                pop_until_paren(&mut pending, &mut output);
                let Some(Pending::Paren { call }) = pending.pop() else {
                    return Err(unbalanced());
                };
                if call {
                    let found = arguments.pop().unwrap_or(0);
                    let Some(Pending::Element(function)) = pending.pop() else {
                        return Err(unbalanced());
                    };
                    if found != function.arity() {
                        return Err(ParseError::ArityMismatch {
                            function: function.name.clone(),
                            expected: function.arity(),
                            found,
                        }
                        .into());
                    }
                    output.push(Postfix::Element(function));
                }
            }
        }
    }

    while let Some(item) = pending.pop() {
        match item {
            Pending::Element(element) => output.push(Postfix::Element(element)),
            Pending::Paren { .. } => return Err(unbalanced()),
        }
    }

    Ok(output)
}

fn operand_node(word: &str) -> Result<FormulaNode> {
    if word.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        let value = word
            .parse::<f64>()
            .map_err(|_| ParseError::MalformedExpression(word.to_string()))?;
        Ok(FormulaNode::Constant(value))
    } else {
        Ok(FormulaNode::Variable(word.to_string()))
    }
}

/// 解析自由格式数值表达式
pub(crate) fn parse_formula(text: &str, factory: &FunctionFactory) -> Result<FormulaNode> {
    let tokens = tokenize_formula(text, factory)?;
    if tokens.is_empty() {
        return Err(ParseError::MalformedExpression(text.to_string()).into());
    }

    let mut stack: Vec<FormulaNode> = Vec::new();
    for item in to_postfix(&tokens, factory, text)? {
        match item {
            Postfix::Operand(word) => stack.push(operand_node(&word)?),
            Postfix::Element(element) => {
                let arity = element.arity();
                if stack.len() < arity {
                    return Err(ParseError::MissingOperand {
                        operator: element.name,
                    }
                    .into());
                }
                let operands = stack.split_off(stack.len() - arity);
                stack.push(FormulaNode::Element { element, operands });
            }
        }
    }

    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(ParseError::MalformedExpression(text.to_string()).into()),
    }
}

/// 命题所在的子句
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Clause {
    Antecedent,
    Consequent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Expect {
    Variable,
    Is,
    HedgeOrTerm,
}

/// 命题组装状态机：variable → is → hedge* → term
struct PropositionBuilder {
    clause: Clause,
    expect: Expect,
    words: Vec<String>,
    variable: Option<VariableRef>,
    hedges: Vec<Arc<dyn Hedge>>,
}

impl PropositionBuilder {
    fn new(clause: Clause) -> Self {
        Self {
            clause,
            expect: Expect::Variable,
            words: Vec::new(),
            variable: None,
            hedges: Vec::new(),
        }
    }

    fn is_idle(&self) -> bool {
        self.expect == Expect::Variable
    }

    fn incomplete(&self) -> RuleError {
        ParseError::IncompleteProposition(self.words.join(" ")).into()
    }

    fn finish(&mut self, term: Option<TermRef>) -> Result<Proposition> {
        let variable = self.variable.take().ok_or_else(|| self.incomplete())?;
        self.expect = Expect::Variable;
        self.words.clear();
        Ok(Proposition {
            variable,
            hedges: std::mem::take(&mut self.hedges),
            term,
        })
    }

    /// 读入一个单词，命题完整时返回
    fn accept(&mut self, word: &str, catalogue: &dyn Catalogue) -> Result<Option<Proposition>> {
        self.words.push(word.to_string());

        match self.expect {
            Expect::Variable => {
                let id = catalogue
                    .find_variable(word)
                    .ok_or_else(|| RuleError::unresolved(ReferenceKind::Variable, word))?;
                if self.clause == Clause::Consequent && !id.is_output() {
                    return Err(ParseError::UnexpectedToken {
                        expected: "output variable",
                        found: word.to_string(),
                    }
                    .into());
                }
                self.variable = Some(VariableRef {
                    id,
                    name: word.to_string(),
                });
                self.expect = Expect::Is;
                Ok(None)
            }

            Expect::Is => {
                if word != keyword::IS {
                    return Err(ParseError::UnexpectedToken {
                        expected: "'is'",
                        found: word.to_string(),
                    }
                    .into());
                }
                self.expect = Expect::HedgeOrTerm;
                Ok(None)
            }

            Expect::HedgeOrTerm => {
                // 语气算子优先于同名术语
                if let Some(hedge) = catalogue.find_hedge(word) {
                    let any = hedge::is_any(hedge.as_ref());
                    if any && self.clause == Clause::Consequent {
                        return Err(ParseError::UnexpectedToken {
                            expected: "term",
                            found: word.to_string(),
                        }
                        .into());
                    }
                    self.hedges.push(hedge);
                    return if any { self.finish(None).map(Some) } else { Ok(None) };
                }

                let variable = self.variable.as_ref().ok_or_else(|| self.incomplete())?;
                let id = catalogue
                    .find_term(variable.id, word)
                    .ok_or_else(|| RuleError::unresolved(ReferenceKind::Term, word))?;
                self.finish(Some(TermRef {
                    id,
                    name: word.to_string(),
                }))
                .map(Some)
            }
        }
    }
}

/// 解析前件文本为表达式树，所有名字在目录中解析
pub(crate) fn parse_antecedent(
    text: &str,
    catalogue: &dyn Catalogue,
    factory: &FunctionFactory,
) -> Result<Expression> {
    let tokens = tokenize_antecedent(text);
    if tokens.is_empty() {
        return Err(ParseError::MalformedExpression(text.to_string()).into());
    }

    let mut builder = PropositionBuilder::new(Clause::Antecedent);
    let mut stack: Vec<Expression> = Vec::new();

    for item in to_postfix(&tokens, factory, text)? {
        match item {
            Postfix::Operand(word) => {
                if let Some(proposition) = builder.accept(&word, catalogue)? {
                    stack.push(Expression::Proposition(proposition));
                }
            }
            Postfix::Element(element) => {
                if !builder.is_idle() {
                    return Err(builder.incomplete());
                }
                let operator = LogicalOperator::from_keyword(&element.name)
                    .ok_or_else(|| ParseError::UnknownOperator(element.name.clone()))?;
                let (Some(right), Some(left)) = (stack.pop(), stack.pop()) else {
                    return Err(ParseError::MissingOperand {
                        operator: element.name,
                    }
                    .into());
                };
                stack.push(Expression::operator(operator, left, right));
            }
        }
    }

    if !builder.is_idle() {
        return Err(builder.incomplete());
    }
    match (stack.pop(), stack.is_empty()) {
        (Some(root), true) => Ok(root),
        _ => Err(ParseError::MalformedExpression(text.to_string()).into()),
    }
}

/// 解析后件文本：`variable is [hedge]* term (and variable is [hedge]* term)*`
pub(crate) fn parse_consequent(text: &str, catalogue: &dyn Catalogue) -> Result<Vec<Proposition>> {
    let mut builder = PropositionBuilder::new(Clause::Consequent);
    let mut conclusions = Vec::new();
    let mut expect_and = false;

    for word in text.split_whitespace() {
        if expect_and {
            if word != keyword::AND {
                return Err(ParseError::UnexpectedToken {
                    expected: "'and'",
                    found: word.to_string(),
                }
                .into());
            }
            expect_and = false;
            continue;
        }
        if let Some(proposition) = builder.accept(word, catalogue)? {
            conclusions.push(proposition);
            expect_and = true;
        }
    }

    if !builder.is_idle() {
        return Err(builder.incomplete());
    }
    if conclusions.is_empty() || !expect_and {
        return Err(ParseError::MalformedExpression(text.to_string()).into());
    }
    Ok(conclusions)
}
