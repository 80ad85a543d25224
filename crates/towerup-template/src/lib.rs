//! Manifest rendering for towerup.
//!
//! Two rendering modes are provided. [`render`] parses a YAML manifest,
//! applies BOSH-style ops fragments (`replace`/`remove` operations addressed
//! by slash-separated paths) and then substitutes `((variable))` placeholders.
//! [`render_simple`] renders a cloud-config style template from a flat
//! parameter struct and cross-checks that the struct and the template agree
//! on the set of field names.
//!
//! Both modes are pure: identical inputs always produce identical output.

pub mod interpolate;
pub mod ops;
pub mod simple;
pub mod variables;

pub use interpolate::interpolate;
pub use ops::{apply_ops, parse_ops, Op, OpKind};
pub use simple::{render_simple, validate_simple};
pub use variables::Variables;

use serde_yaml::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("invalid template: {0}")]
    Parse(#[source] serde_yaml::Error),
    #[error("invalid ops fragment: {0}")]
    InvalidOps(String),
    #[error("invalid ops path '{path}': {reason}")]
    InvalidPath { path: String, reason: String },
    #[error("ops path '{path}' does not exist in the template")]
    MissingPath { path: String },
    #[error("ops path '{path}' expected a {expected} at '{token}'")]
    PathType {
        path: String,
        token: String,
        expected: &'static str,
    },
    #[error("missing variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),
    #[error("variable '{0}' is not a scalar and cannot be embedded in a string")]
    NonScalarVariable(String),
    #[error("template '{template}' never references field '{field}'")]
    UnusedField { template: String, field: String },
    #[error("template '{template}' references '{name}', which is not a known field")]
    UnknownField { template: String, name: String },
    #[error("template '{template}' parameters must serialize to a map of fields")]
    InvalidParams { template: String },
    #[error("failed to render template '{template}': {message}")]
    Render { template: String, message: String },
    #[error("failed to serialize rendered manifest: {0}")]
    Serialize(#[source] serde_yaml::Error),
}

/// Options controlling [`render_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RenderOptions {
    /// Fail when a `((placeholder))` has no matching variable instead of
    /// leaving it in place for a later pass.
    pub strict: bool,
}

/// Render a manifest template with ops fragments and variables, leaving
/// unknown placeholders untouched.
pub fn render(template: &str, ops: &[&str], vars: &Variables) -> Result<String, TemplateError> {
    render_with(template, ops, vars, RenderOptions::default())
}

/// Render a manifest template with explicit options.
///
/// Every fragment must be a YAML sequence of operations; fragments are
/// applied in the order given, as if they had been concatenated.
pub fn render_with(
    template: &str,
    ops: &[&str],
    vars: &Variables,
    options: RenderOptions,
) -> Result<String, TemplateError> {
    let mut doc: Value = serde_yaml::from_str(template).map_err(TemplateError::Parse)?;

    let mut all_ops = Vec::new();
    for fragment in ops {
        all_ops.extend(parse_ops(fragment)?);
    }
    apply_ops(&mut doc, &all_ops)?;

    let missing = interpolate(&mut doc, vars)?;
    if options.strict && !missing.is_empty() {
        return Err(TemplateError::MissingVariables(missing.into_iter().collect()));
    }
    if !missing.is_empty() {
        tracing::debug!(
            "{} placeholder(s) left for a later pass: {}",
            missing.len(),
            missing.iter().cloned().collect::<Vec<_>>().join(", ")
        );
    }

    serde_yaml::to_string(&doc).map_err(TemplateError::Serialize)
}
