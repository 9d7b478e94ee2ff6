//! Wire format
//!
//! ```text
//! { "name": "traffic",
//!   "columns": ["time", "value", "status"],
//!   "points": [[1400425947000, 52, "ok"], ...],
//!   "index": "1d-625",          optional
//!   "utc": true,                optional, defaults to true
//!   ...any other keys are kept as metadata }
//! ```
//!
//! The first column names the key of every row: epoch ms for `time`,
//! `[begin_ms, end_ms]` for `timerange`, an index string for `index`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

fn default_utc() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireFormat {
    #[serde(default)]
    pub name: String,

    pub columns: Vec<String>,

    #[serde(default)]
    pub points: Vec<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,

    #[serde(default = "default_utc")]
    pub utc: bool,

    #[serde(flatten)]
    pub meta: Map<String, Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_and_extra_meta() {
        let wire: WireFormat = serde_json::from_value(json!({
            "name": "traffic",
            "columns": ["time", "value"],
            "points": [[1000, 1]],
            "site": "chicago"
        }))
        .unwrap();
        assert!(wire.utc);
        assert_eq!(wire.index, None);
        assert_eq!(wire.meta.get("site"), Some(&json!("chicago")));

        let back = serde_json::to_value(&wire).unwrap();
        assert_eq!(back["site"], json!("chicago"));
        assert!(back.get("index").is_none());
    }

    #[test]
    fn test_columns_required() {
        let res: Result<WireFormat, _> = serde_json::from_value(json!({"name": "x"}));
        assert!(res.is_err());
    }
}
