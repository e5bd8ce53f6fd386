//! Line substitution pass
//!
//! Each template line gets at most one rule applied, tried in this order:
//!
//! 1. `{{ name }}` placeholders, variables consulted in insertion order
//! 2. the `{% css() %}` directive
//! 3. the `{% preload() %}` directive
//!
//! Lines are handled as raw bytes so anything that matches no rule passes
//! through untouched.

use std::borrow::Cow;
use std::fmt;

use indexmap::IndexMap;
use regex::bytes::{NoExpand, Regex};
use tracing::debug;

use crate::error::AuroraResult;
use crate::integrity::Assets;

/// Generated-markup directives a template may contain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Css,
    Preload,
}

impl Directive {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Css => "css",
            Self::Preload => "preload",
        }
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One successful substitution, recorded for the variables report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Replacement {
    Variable(String),
    Directive(Directive),
}

/// Placeholder pattern for a variable name
fn placeholder_pattern(name: &str) -> String {
    format!(r"\{{\{{\s?{}\s?\}}\}}", regex::escape(name))
}

/// Directive pattern; the line break after the directive is consumed
fn directive_pattern(call: &str) -> String {
    format!(r"\{{%\s?{}\s?%\}}(?:\r?\n)?", regex::escape(call))
}

struct Placeholder {
    name: String,
    pattern: Regex,
    value: String,
}

/// Compiled substitution rules for one render pass
pub struct Substituter {
    placeholders: Vec<Placeholder>,
    css: Regex,
    preload: Regex,
}

impl Substituter {
    /// Compile the rules for the given variable table
    pub fn new(vars: &IndexMap<String, String>) -> AuroraResult<Self> {
        let mut placeholders = Vec::with_capacity(vars.len());
        for (name, value) in vars {
            placeholders.push(Placeholder {
                name: name.clone(),
                pattern: Regex::new(&placeholder_pattern(name))?,
                value: value.clone(),
            });
        }
        Ok(Self {
            placeholders,
            css: Regex::new(&directive_pattern("css()"))?,
            preload: Regex::new(&directive_pattern("preload()"))?,
        })
    }

    /// Apply the first matching rule to `line`.
    ///
    /// Returns the line borrowed and unchanged when nothing matches. Markup
    /// for a directive is only generated once its directive is found, so an
    /// integrity failure surfaces on the line that needed it.
    pub fn replace_line<'l>(
        &self,
        line: &'l [u8],
        assets: &Assets,
        log: &mut Vec<Replacement>,
    ) -> AuroraResult<Cow<'l, [u8]>> {
        for placeholder in &self.placeholders {
            if placeholder.pattern.is_match(line) {
                debug!(name = %placeholder.name, "replace_line: placeholder matched");
                log.push(Replacement::Variable(placeholder.name.clone()));
                return Ok(placeholder
                    .pattern
                    .replace_all(line, NoExpand(placeholder.value.as_bytes())));
            }
        }

        if self.css.is_match(line) {
            debug!("replace_line: css directive matched");
            let markup = assets.styles_markup()?;
            log.push(Replacement::Directive(Directive::Css));
            return Ok(Cow::Owned(self.css.replace_all(line, NoExpand(markup.as_bytes())).into_owned()));
        }

        if self.preload.is_match(line) {
            debug!("replace_line: preload directive matched");
            let markup = assets.preload_markup()?;
            log.push(Replacement::Directive(Directive::Preload));
            return Ok(Cow::Owned(
                self.preload.replace_all(line, NoExpand(markup.as_bytes())).into_owned(),
            ));
        }

        Ok(Cow::Borrowed(line))
    }
}
