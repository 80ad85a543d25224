use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// Variable map used to resolve `((name))` placeholders.
///
/// Keys may contain dots (`director_ssl.certificate`). Lookup tries the
/// whole key first and then walks nested maps segment by segment, so both
/// `{"director_ssl.ca": ..}` and `{"director_ssl": {"ca": ..}}` resolve
/// `((director_ssl.ca))`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Variables {
    entries: BTreeMap<String, Value>,
}

impl Variables {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(key.into(), value.into());
    }

    /// Insert a string-to-string map as a nested YAML mapping.
    pub fn insert_map<'a>(
        &mut self,
        key: impl Into<String>,
        map: impl IntoIterator<Item = (&'a String, &'a String)>,
    ) {
        let mapping: Mapping = map
            .into_iter()
            .map(|(k, v)| (Value::from(k.as_str()), Value::from(v.as_str())))
            .collect();
        self.entries.insert(key.into(), Value::Mapping(mapping));
    }

    pub fn resolve(&self, name: &str) -> Option<&Value> {
        if let Some(v) = self.entries.get(name) {
            return Some(v);
        }
        let mut segments = name.split('.');
        let mut current = self.entries.get(segments.next()?)?;
        for segment in segments {
            current = current.as_mapping()?.get(segment)?;
        }
        Some(current)
    }
}
