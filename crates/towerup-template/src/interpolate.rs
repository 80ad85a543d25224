use crate::{TemplateError, Variables};
use serde_yaml::Value;
use std::collections::BTreeSet;

const OPEN: &str = "((";
const CLOSE: &str = "))";

/// Substitute `((name))` placeholders throughout `doc`.
///
/// A string that is exactly one placeholder is replaced by the variable's
/// structured value; placeholders embedded in longer strings are replaced by
/// the variable's scalar text. Unresolved names are left in place and
/// returned so the caller can decide whether they are an error.
pub fn interpolate(doc: &mut Value, vars: &Variables) -> Result<BTreeSet<String>, TemplateError> {
    let mut missing = BTreeSet::new();
    walk(doc, vars, &mut missing)?;
    Ok(missing)
}

fn walk(node: &mut Value, vars: &Variables, missing: &mut BTreeSet<String>) -> Result<(), TemplateError> {
    match node {
        Value::String(s) => {
            if let Some(name) = whole_placeholder(s) {
                match vars.resolve(name) {
                    Some(value) => *node = value.clone(),
                    None => {
                        missing.insert(name.to_owned());
                    }
                }
            } else if s.contains(OPEN) {
                *s = substitute_inline(s, vars, missing)?;
            }
        }
        Value::Sequence(seq) => {
            for item in seq {
                walk(item, vars, missing)?;
            }
        }
        Value::Mapping(map) => {
            for (_, value) in map.iter_mut() {
                walk(value, vars, missing)?;
            }
        }
        Value::Tagged(tagged) => walk(&mut tagged.value, vars, missing)?,
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
    Ok(())
}

fn whole_placeholder(s: &str) -> Option<&str> {
    let name = s.strip_prefix(OPEN)?.strip_suffix(CLOSE)?;
    is_valid_name(name).then_some(name)
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.' | '/' | ':'))
}

fn substitute_inline(
    s: &str,
    vars: &Variables,
    missing: &mut BTreeSet<String>,
) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(start) = rest.find(OPEN) {
        out.push_str(&rest[..start]);
        let after_open = &rest[start + OPEN.len()..];
        let Some(end) = after_open.find(CLOSE) else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = &after_open[..end];
        let placeholder = &rest[start..start + OPEN.len() + end + CLOSE.len()];

        match vars.resolve(name).filter(|_| is_valid_name(name)) {
            Some(value) => out.push_str(&scalar_text(name, value)?),
            None => {
                if is_valid_name(name) {
                    missing.insert(name.to_owned());
                }
                out.push_str(placeholder);
            }
        }
        rest = &after_open[end + CLOSE.len()..];
    }
    out.push_str(rest);
    Ok(out)
}

fn scalar_text(name: &str, value: &Value) -> Result<String, TemplateError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            Err(TemplateError::NonScalarVariable(name.to_owned()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    #[test]
    fn whole_value_keeps_structure() {
        let mut doc = parse("tags: ((tags))\n");
        let mut vars = Variables::new();
        let tags = std::collections::BTreeMap::from([("env".to_owned(), "prod".to_owned())]);
        vars.insert_map("tags", &tags);

        let missing = interpolate(&mut doc, &vars).unwrap();
        assert!(missing.is_empty());
        assert_eq!(doc["tags"]["env"], Value::from("prod"));
    }

    #[test]
    fn inline_placeholders_are_stringified() {
        let mut doc = parse("url: https://((ip)):((port))/x\n");
        let vars = Variables::new().with("ip", "10.0.0.6").with("port", 25555);
        interpolate(&mut doc, &vars).unwrap();
        assert_eq!(doc["url"], Value::from("https://10.0.0.6:25555/x"));
    }

    #[test]
    fn inline_map_is_rejected() {
        let mut doc = parse("x: prefix-((tags))\n");
        let mut vars = Variables::new();
        vars.insert_map("tags", &std::collections::BTreeMap::new());
        let err = interpolate(&mut doc, &vars).unwrap_err();
        assert!(matches!(err, TemplateError::NonScalarVariable(n) if n == "tags"));
    }

    #[test]
    fn unknown_names_are_reported_and_kept() {
        let mut doc = parse("a: ((one))\nb: [x-((two))]\n");
        let missing = interpolate(&mut doc, &Variables::new()).unwrap();
        assert_eq!(missing.into_iter().collect::<Vec<_>>(), vec!["one", "two"]);
        assert_eq!(doc["a"], Value::from("((one))"));
        assert_eq!(doc["b"][0], Value::from("x-((two))"));
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        let mut doc = parse("a: 'value ((open'\n");
        interpolate(&mut doc, &Variables::new()).unwrap();
        assert_eq!(doc["a"], Value::from("value ((open"));
    }
}
