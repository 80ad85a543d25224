//! Field-substitution rendering for cloud-config templates.
//!
//! Templates use jinja syntax (`{{ zone }}`, `{% if spot %}`) over a flat
//! parameter struct. Before rendering, the names the template reads are
//! compared with the fields the struct exposes: a field nobody reads and a
//! name no field provides are both errors, so the two cannot drift apart.

use crate::TemplateError;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

fn environment<'source>() -> Environment<'source> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    env
}

fn render_error(name: &str, err: &minijinja::Error) -> TemplateError {
    TemplateError::Render {
        template: name.to_owned(),
        message: err.to_string(),
    }
}

fn field_names(name: &str, params: &impl Serialize) -> Result<BTreeSet<String>, TemplateError> {
    let value = serde_json::to_value(params).map_err(|_| TemplateError::InvalidParams {
        template: name.to_owned(),
    })?;
    match value {
        serde_json::Value::Object(map) => Ok(map.keys().cloned().collect()),
        _ => Err(TemplateError::InvalidParams {
            template: name.to_owned(),
        }),
    }
}

fn check_fields(
    name: &str,
    fields: &BTreeSet<String>,
    referenced: &HashSet<String>,
) -> Result<(), TemplateError> {
    let referenced: BTreeSet<&String> = referenced.iter().collect();
    if let Some(unknown) = referenced.iter().find(|r| !fields.contains(r.as_str())) {
        return Err(TemplateError::UnknownField {
            template: name.to_owned(),
            name: (*unknown).clone(),
        });
    }
    if let Some(unused) = fields.iter().find(|f| !referenced.contains(f)) {
        return Err(TemplateError::UnusedField {
            template: name.to_owned(),
            field: unused.clone(),
        });
    }
    Ok(())
}

/// Check that `template` and `params` agree on their field set without
/// rendering.
pub fn validate_simple(
    name: &str,
    template: &str,
    params: &impl Serialize,
) -> Result<(), TemplateError> {
    let env = environment();
    let tmpl = env
        .template_from_named_str(name, template)
        .map_err(|e| render_error(name, &e))?;
    let fields = field_names(name, params)?;
    check_fields(name, &fields, &tmpl.undeclared_variables(false))
}

/// Render `template` from the fields of `params`.
pub fn render_simple(
    name: &str,
    template: &str,
    params: &impl Serialize,
) -> Result<String, TemplateError> {
    let env = environment();
    let tmpl = env
        .template_from_named_str(name, template)
        .map_err(|e| render_error(name, &e))?;
    let fields = field_names(name, params)?;
    check_fields(name, &fields, &tmpl.undeclared_variables(false))?;
    tmpl.render(params).map_err(|e| render_error(name, &e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Default)]
    struct Params {
        zone: String,
        spot: bool,
    }

    const TEMPLATE: &str = "az: {{ zone }}\n{% if spot %}spot: true\n{% endif %}";

    #[test]
    fn renders_fields_and_conditionals() {
        let p = Params {
            zone: "eu-west-1a".to_owned(),
            spot: true,
        };
        let out = render_simple("cc", TEMPLATE, &p).unwrap();
        assert_eq!(out, "az: eu-west-1a\nspot: true\n");

        let p = Params {
            zone: "eu-west-1a".to_owned(),
            spot: false,
        };
        assert_eq!(render_simple("cc", TEMPLATE, &p).unwrap(), "az: eu-west-1a\n");
    }

    #[test]
    fn keeps_trailing_newline_and_does_not_escape() {
        let p = Params {
            zone: "<a&b>".to_owned(),
            spot: false,
        };
        let out = render_simple("cc.yml", "z: {{ zone }}{{ spot }}\n", &p).unwrap();
        assert_eq!(out, "z: <a&b>false\n");
    }

    #[test]
    fn unused_field_fails() {
        let err = validate_simple("cc", "az: {{ zone }}\n", &Params::default()).unwrap_err();
        assert!(matches!(err, TemplateError::UnusedField { field, .. } if field == "spot"));
    }

    #[test]
    fn unknown_name_fails() {
        let err = validate_simple(
            "cc",
            "az: {{ zone }} {{ region }}{% if spot %}{% endif %}",
            &Params::default(),
        )
        .unwrap_err();
        assert!(matches!(err, TemplateError::UnknownField { name, .. } if name == "region"));
    }

    #[test]
    fn syntax_error_fails() {
        let err = render_simple("cc", "{% if spot %}", &Params::default()).unwrap_err();
        assert!(matches!(err, TemplateError::Render { .. }));
    }

    #[test]
    fn non_struct_params_fail() {
        let err = render_simple("cc", "x", &42).unwrap_err();
        assert!(matches!(err, TemplateError::InvalidParams { .. }));
    }
}
