//! Text substitution for `{{...}}` actions
//!
//! Supports `{{.VAR}}` lookups, quoted literals and a `default` pipe stage:
//! `{{.DIR | default "docs"}}`. The first error is remembered and every later
//! substitution yields an empty string until it is collected with [`Templater::err`].

use crate::error::{TemplateError, TemplateResult};
use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Printed for a variable with no value unless `remove_no_value` is set
pub const NO_VALUE: &str = "<no value>";

/// Stateful substituter over a fixed variable set
#[derive(Debug, Default)]
pub struct Templater {
    /// Variables visible to `{{.NAME}}`
    pub vars: HashMap<String, String>,

    /// Drop lookups that resolve to nothing instead of printing [`NO_VALUE`]
    pub remove_no_value: bool,

    err: Option<TemplateError>,
}

impl Templater {
    pub fn new(vars: HashMap<String, String>) -> Self {
        Templater {
            vars,
            remove_no_value: false,
            err: None,
        }
    }

    pub fn with_remove_no_value(mut self, remove: bool) -> Self {
        self.remove_no_value = remove;
        self
    }

    /// Substitute every action in `s`
    pub fn replace(&mut self, s: &str) -> String {
        if self.err.is_some() || s.is_empty() {
            return String::new();
        }
        match self.render(s) {
            Ok(rendered) => rendered,
            Err(e) => {
                self.err = Some(e);
                String::new()
            }
        }
    }

    /// First error seen by any `replace` call
    pub fn err(&self) -> TemplateResult<()> {
        match &self.err {
            Some(e) => Err(e.clone()),
            None => Ok(()),
        }
    }

    fn render(&self, template: &str) -> TemplateResult<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        let mut trim_next = false;

        for caps in action_regex().captures_iter(template) {
            let Some(whole) = caps.get(0) else {
                continue;
            };

            let mut text = &template[last..whole.start()];
            if trim_next {
                text = text.trim_start();
            }
            if caps.get(1).is_some() {
                text = text.trim_end();
            }
            push_text(&mut out, text, template)?;

            if let Some(value) = self.eval(caps[2].trim(), template)? {
                out.push_str(&value);
            } else if !self.remove_no_value {
                out.push_str(NO_VALUE);
            }

            trim_next = caps.get(3).is_some();
            last = whole.end();
        }

        let mut tail = &template[last..];
        if trim_next {
            tail = tail.trim_start();
        }
        push_text(&mut out, tail, template)?;
        Ok(out)
    }

    fn eval(&self, action: &str, template: &str) -> TemplateResult<Option<String>> {
        let mut stages = action.split('|').map(str::trim);
        let operand = stages.next().unwrap_or_default();
        let mut value = self.operand(operand, template)?;

        for stage in stages {
            match stage.split_once(char::is_whitespace) {
                Some(("default", fallback)) => {
                    let fallback = self.operand(fallback.trim(), template)?;
                    if value.as_deref().map_or(true, str::is_empty) {
                        value = fallback;
                    }
                }
                _ => return Err(unsupported(stage, template)),
            }
        }

        Ok(value)
    }

    fn operand(&self, operand: &str, template: &str) -> TemplateResult<Option<String>> {
        if let Some(name) = operand.strip_prefix('.') {
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(unsupported(operand, template));
            }
            return Ok(self.vars.get(name).cloned());
        }

        if operand.len() >= 2 && operand.starts_with('"') && operand.ends_with('"') {
            return Ok(Some(operand[1..operand.len() - 1].to_string()));
        }

        Err(unsupported(operand, template))
    }
}

/// `{{ action }}`, with optional `{{- ` and ` -}}` trim markers in groups 1 and 3
fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)\{\{(-\s)?(.*?)(\s-)?\}\}").expect("template action pattern is valid")
    })
}

/// Copy literal text between actions; a stray `{{` means an action was never closed
fn push_text(out: &mut String, text: &str, template: &str) -> TemplateResult<()> {
    if text.contains("{{") {
        return Err(TemplateError::UnclosedAction(template.to_string()));
    }
    out.push_str(text);
    Ok(())
}

fn unsupported(expr: &str, template: &str) -> TemplateError {
    TemplateError::UnsupportedExpression {
        expr: expr.to_string(),
        template: template.to_string(),
    }
}
