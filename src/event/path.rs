//! Field paths and payload helpers
//!
//! Event payloads are JSON objects. A [`FieldPath`] addresses a value inside
//! one, either as a dotted string (`"direction.in"`) or as a list of segments
//! (`["direction", "in"]`).

use serde_json::{Map, Value};

/// Event payload
pub type Data = Map<String, Value>;

/// Path to a (possibly nested) field in event data
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldPath(Vec<String>);

impl FieldPath {
    /// Build from explicit segments
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(segments.into_iter().map(Into::into).collect())
    }

    /// Parse a dotted path
    pub fn parse(s: &str) -> Self {
        Self(s.split('.').map(str::to_string).collect())
    }

    /// The default `value` column
    pub fn value() -> Self {
        Self(vec!["value".to_string()])
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Last segment, used to name derived fields
    pub fn leaf(&self) -> &str {
        self.0.last().map(String::as_str).unwrap_or("")
    }

    /// Same path with a suffix appended to the leaf, e.g. `in` -> `in_rate`
    pub fn with_suffix(&self, suffix: &str) -> Self {
        let mut segments = self.0.clone();
        if let Some(last) = segments.last_mut() {
            last.push_str(suffix);
        }
        Self(segments)
    }

    /// Dotted rendering
    pub fn to_dotted(&self) -> String {
        self.0.join(".")
    }
}

impl Default for FieldPath {
    fn default() -> Self {
        Self::value()
    }
}

impl std::fmt::Display for FieldPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_dotted())
    }
}

impl From<&str> for FieldPath {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl From<String> for FieldPath {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<&String> for FieldPath {
    fn from(s: &String) -> Self {
        Self::parse(s)
    }
}

impl From<Vec<String>> for FieldPath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for FieldPath {
    fn from(segments: &[&str]) -> Self {
        Self::new(segments.iter().copied())
    }
}

impl From<&FieldPath> for FieldPath {
    fn from(path: &FieldPath) -> Self {
        path.clone()
    }
}

/// Turn a list of path-like values into field paths
pub fn field_spec<I, P>(paths: I) -> Vec<FieldPath>
where
    I: IntoIterator<Item = P>,
    P: Into<FieldPath>,
{
    paths.into_iter().map(Into::into).collect()
}

/// Look up a nested value, `None` if any segment is absent
pub fn nested_get<'a>(data: &'a Data, path: &FieldPath) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    let mut current = data.get(first)?;
    for segment in rest {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Set a nested value, creating intermediate objects as needed
pub fn nested_set(data: &mut Data, path: &FieldPath, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    let mut current = data;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}

/// A value is valid when present, not null and not an empty string
pub fn is_valid(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

/// Every leaf path in a payload, depth first in key order
pub fn leaf_paths(data: &Data) -> Vec<FieldPath> {
    fn walk(map: &Data, prefix: &mut Vec<String>, out: &mut Vec<FieldPath>) {
        for (key, value) in map {
            prefix.push(key.clone());
            match value {
                Value::Object(inner) if !inner.is_empty() => walk(inner, prefix, out),
                _ => out.push(FieldPath(prefix.clone())),
            }
            prefix.pop();
        }
    }

    let mut out = Vec::new();
    walk(data, &mut Vec::new(), &mut out);
    out
}

/// Wrap bare scalars as `{"value": scalar}`
pub fn to_data(value: Value) -> Data {
    match value {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(v: Value) -> Data {
        to_data(v)
    }

    #[test]
    fn test_parse_and_display() {
        let path = FieldPath::from("direction.in");
        assert_eq!(path.segments(), &["direction".to_string(), "in".to_string()]);
        assert_eq!(path.to_string(), "direction.in");
        assert_eq!(path.leaf(), "in");
        assert_eq!(path.with_suffix("_rate").to_string(), "direction.in_rate");
        assert_eq!(FieldPath::default(), FieldPath::from("value"));
    }

    #[test]
    fn test_nested_get() {
        let d = data(json!({"direction": {"in": 1, "out": 2}, "value": 3}));
        assert_eq!(nested_get(&d, &"direction.in".into()), Some(&json!(1)));
        assert_eq!(nested_get(&d, &"value".into()), Some(&json!(3)));
        assert_eq!(nested_get(&d, &"direction.sideways".into()), None);
        assert_eq!(nested_get(&d, &"value.deeper".into()), None);
    }

    #[test]
    fn test_nested_set_creates_parents() {
        let mut d = Data::new();
        nested_set(&mut d, &"a.b.c".into(), json!(5));
        assert_eq!(Value::Object(d.clone()), json!({"a": {"b": {"c": 5}}}));

        nested_set(&mut d, &"a.b".into(), json!(1));
        assert_eq!(Value::Object(d), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid(Some(&json!(0))));
        assert!(is_valid(Some(&json!("ok"))));
        assert!(!is_valid(Some(&json!(""))));
        assert!(!is_valid(Some(&Value::Null)));
        assert!(!is_valid(None));
    }

    #[test]
    fn test_leaf_paths() {
        let d = data(json!({"direction": {"in": 1, "out": 2}, "value": 3}));
        let paths: Vec<String> = leaf_paths(&d).iter().map(|p| p.to_string()).collect();
        assert_eq!(paths, vec!["direction.in", "direction.out", "value"]);
    }

    #[test]
    fn test_scalar_shorthand() {
        assert_eq!(Value::Object(to_data(json!(18))), json!({"value": 18}));
    }
}
