//! BOSH-style ops fragments.
//!
//! An ops fragment is a YAML sequence of operations:
//!
//! ```yaml
//! - type: replace
//!   path: /instance_groups/name=bosh/jobs/-
//!   value: {name: aws_cpi, release: bosh-aws-cpi}
//! - type: remove
//!   path: /resource_pools/0/env?
//! ```
//!
//! Path tokens are map keys, numeric indices, `-` (append to a sequence) or
//! `key=value` (the sequence element whose `key` equals `value`). A trailing
//! `?` marks the token and every token after it as optional: missing
//! intermediate maps and elements are created on `replace` and skipped on
//! `remove`.

use crate::TemplateError;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpKind {
    Replace,
    Remove,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Op {
    #[serde(rename = "type")]
    pub kind: OpKind,
    pub path: String,
    #[serde(default)]
    pub value: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Key { name: String, optional: bool },
    Index { index: usize, optional: bool },
    Append,
    Match { key: String, value: String, optional: bool },
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Key { name, .. } => name.clone(),
            Token::Index { index, .. } => index.to_string(),
            Token::Append => "-".to_owned(),
            Token::Match { key, value, .. } => format!("{key}={value}"),
        }
    }

    fn empty_container(&self) -> Value {
        match self {
            Token::Key { .. } => Value::Mapping(Mapping::new()),
            Token::Index { .. } | Token::Append | Token::Match { .. } => Value::Sequence(Vec::new()),
        }
    }
}

/// Parse one ops fragment. Blank fragments yield no operations.
pub fn parse_ops(fragment: &str) -> Result<Vec<Op>, TemplateError> {
    if fragment.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ops: Option<Vec<Op>> =
        serde_yaml::from_str(fragment).map_err(|e| TemplateError::InvalidOps(e.to_string()))?;
    let ops = ops.unwrap_or_default();
    for op in &ops {
        if op.kind == OpKind::Replace && op.value.is_none() {
            return Err(TemplateError::InvalidOps(format!(
                "replace operation at '{}' has no value",
                op.path
            )));
        }
    }
    Ok(ops)
}

/// Apply operations to `doc` in order.
pub fn apply_ops(doc: &mut Value, ops: &[Op]) -> Result<(), TemplateError> {
    for op in ops {
        let tokens = parse_path(&op.path)?;
        match op.kind {
            OpKind::Replace => {
                let value = op.value.clone().unwrap_or(Value::Null);
                replace(doc, &tokens, value, &op.path)?;
            }
            OpKind::Remove => {
                if tokens.is_empty() {
                    return Err(TemplateError::InvalidPath {
                        path: op.path.clone(),
                        reason: "cannot remove the document root".to_owned(),
                    });
                }
                remove(doc, &tokens, &op.path)?;
            }
        }
    }
    Ok(())
}

fn parse_path(path: &str) -> Result<Vec<Token>, TemplateError> {
    let Some(body) = path.strip_prefix('/') else {
        return Err(TemplateError::InvalidPath {
            path: path.to_owned(),
            reason: "must start with '/'".to_owned(),
        });
    };
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut optional = false;
    let mut tokens = Vec::new();
    for raw in body.split('/') {
        let raw = match raw.strip_suffix('?') {
            Some(stripped) => {
                optional = true;
                stripped
            }
            None => raw,
        };
        let raw = raw.replace("~1", "/").replace("~0", "~");
        if raw.is_empty() {
            return Err(TemplateError::InvalidPath {
                path: path.to_owned(),
                reason: "empty path segment".to_owned(),
            });
        }

        let token = if raw == "-" {
            Token::Append
        } else if let Ok(index) = raw.parse::<usize>() {
            Token::Index { index, optional }
        } else if let Some((key, value)) = raw.split_once('=') {
            Token::Match {
                key: key.to_owned(),
                value: value.to_owned(),
                optional,
            }
        } else {
            Token::Key {
                name: raw,
                optional,
            }
        };
        tokens.push(token);
    }
    Ok(tokens)
}

fn type_error(path: &str, token: &Token, expected: &'static str) -> TemplateError {
    TemplateError::PathType {
        path: path.to_owned(),
        token: token.describe(),
        expected,
    }
}

fn missing(path: &str) -> TemplateError {
    TemplateError::MissingPath {
        path: path.to_owned(),
    }
}

fn matches_element(item: &Value, key: &str, value: &str) -> bool {
    item.as_mapping()
        .and_then(|m| m.get(key))
        .is_some_and(|v| match v {
            Value::String(s) => s == value,
            Value::Number(n) => n.to_string() == value,
            Value::Bool(b) => b.to_string() == value,
            _ => false,
        })
}

fn replace(node: &mut Value, tokens: &[Token], value: Value, path: &str) -> Result<(), TemplateError> {
    let Some((token, rest)) = tokens.split_first() else {
        *node = value;
        return Ok(());
    };

    match token {
        Token::Key { name, optional } => {
            if node.is_null() && *optional {
                *node = Value::Mapping(Mapping::new());
            }
            let map = node
                .as_mapping_mut()
                .ok_or_else(|| type_error(path, token, "map"))?;
            let key = Value::from(name.as_str());
            if !map.contains_key(&key) {
                if !optional {
                    return Err(missing(path));
                }
                let fresh = rest.first().map_or(Value::Null, Token::empty_container);
                map.insert(key.clone(), fresh);
            }
            let child = map.get_mut(&key).ok_or_else(|| missing(path))?;
            replace(child, rest, value, path)
        }
        Token::Index { index, .. } => {
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| type_error(path, token, "sequence"))?;
            let child = seq.get_mut(*index).ok_or_else(|| missing(path))?;
            replace(child, rest, value, path)
        }
        Token::Append => {
            if node.is_null() {
                *node = Value::Sequence(Vec::new());
            }
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| type_error(path, token, "sequence"))?;
            let fresh = rest.first().map_or(Value::Null, Token::empty_container);
            seq.push(fresh);
            let last = seq.len() - 1;
            replace(&mut seq[last], rest, value, path)
        }
        Token::Match {
            key,
            value: wanted,
            optional,
        } => {
            if node.is_null() && *optional {
                *node = Value::Sequence(Vec::new());
            }
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| type_error(path, token, "sequence"))?;
            let position = match seq.iter().position(|item| matches_element(item, key, wanted)) {
                Some(position) => position,
                None if *optional => {
                    let mut element = Mapping::new();
                    element.insert(Value::from(key.as_str()), Value::from(wanted.as_str()));
                    seq.push(Value::Mapping(element));
                    seq.len() - 1
                }
                None => return Err(missing(path)),
            };
            replace(&mut seq[position], rest, value, path)
        }
    }
}

fn remove(node: &mut Value, tokens: &[Token], path: &str) -> Result<(), TemplateError> {
    let Some((token, rest)) = tokens.split_first() else {
        return Ok(());
    };
    let last = rest.is_empty();

    match token {
        Token::Key { name, optional } => {
            if node.is_null() && *optional {
                return Ok(());
            }
            let map = node
                .as_mapping_mut()
                .ok_or_else(|| type_error(path, token, "map"))?;
            let key = Value::from(name.as_str());
            if !map.contains_key(&key) {
                return if *optional { Ok(()) } else { Err(missing(path)) };
            }
            if last {
                map.remove(&key);
                return Ok(());
            }
            let child = map.get_mut(&key).ok_or_else(|| missing(path))?;
            remove(child, rest, path)
        }
        Token::Index { index, optional } => {
            if node.is_null() && *optional {
                return Ok(());
            }
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| type_error(path, token, "sequence"))?;
            if *index >= seq.len() {
                return if *optional { Ok(()) } else { Err(missing(path)) };
            }
            if last {
                seq.remove(*index);
                return Ok(());
            }
            remove(&mut seq[*index], rest, path)
        }
        Token::Append => Err(TemplateError::InvalidPath {
            path: path.to_owned(),
            reason: "'-' cannot be used with remove".to_owned(),
        }),
        Token::Match {
            key,
            value: wanted,
            optional,
        } => {
            if node.is_null() && *optional {
                return Ok(());
            }
            let seq = node
                .as_sequence_mut()
                .ok_or_else(|| type_error(path, token, "sequence"))?;
            let Some(position) = seq.iter().position(|item| matches_element(item, key, wanted))
            else {
                return if *optional { Ok(()) } else { Err(missing(path)) };
            };
            if last {
                seq.remove(position);
                return Ok(());
            }
            remove(&mut seq[position], rest, path)
        }
    }
}
