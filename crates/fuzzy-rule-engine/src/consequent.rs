//! 规则后件
//!
//! 每条结论指定一个输出变量和术语，触发时把激活度逆序经过语气链后
//! 连同蕴含算子写入目录。

use crate::catalogue::{Catalogue, Conclusion};
use crate::error::{Result, RuleError};
use crate::expression::Proposition;
use crate::norm::TNorm;
use crate::parser;
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct Consequent {
    text: String,
    conclusions: Option<Vec<Proposition>>,
}

impl Consequent {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            conclusions: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// 已加载的结论，未加载时为空
    pub fn conclusions(&self) -> &[Proposition] {
        self.conclusions.as_deref().unwrap_or_default()
    }

    pub fn is_loaded(&self) -> bool {
        self.conclusions.is_some()
    }

    pub fn load(&mut self, catalogue: &dyn Catalogue) -> Result<()> {
        self.unload();
        self.conclusions = Some(parser::parse_consequent(&self.text, catalogue)?);
        Ok(())
    }

    pub fn unload(&mut self) {
        self.conclusions = None;
    }

    /// 按激活度修改输出变量，禁用的输出变量被跳过
    pub fn modify(
        &self,
        activation_degree: f64,
        implication: Option<&Arc<dyn TNorm>>,
        catalogue: &mut dyn Catalogue,
    ) -> Result<()> {
        let conclusions = self
            .conclusions
            .as_ref()
            .ok_or_else(|| RuleError::NotLoaded(format!("consequent '{}'", self.text)))?;

        for proposition in conclusions {
            let variable = proposition.variable.id;
            if !catalogue.is_enabled(variable) {
                continue;
            }
            let Some(term) = &proposition.term else {
                continue;
            };

            let degree = proposition.apply_hedges(activation_degree);
            debug!(conclusion = %proposition, degree, "写入结论");
            catalogue.conclude(Conclusion {
                variable,
                term: term.id,
                degree,
                implication: implication.cloned(),
            });
        }
        Ok(())
    }
}
