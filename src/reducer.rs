//! Reducers and missing-value policies
//!
//! A [`Reducer`] turns a list of values into one value. Before reducing, its
//! [`MissingPolicy`] decides what to do with missing entries (`null`, empty
//! strings, absent fields):
//!
//! | policy      | effect on `[1, null, 3]`                     |
//! |-------------|----------------------------------------------|
//! | `Keep`      | kept as-is; numeric reducers yield `null`    |
//! | `Ignore`    | dropped: `[1, 3]`                            |
//! | `Zero`      | replaced: `[1, 0, 3]`                        |
//! | `Propagate` | the whole result is `null`                   |

use serde_json::Value;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

use crate::event::path::is_valid;

/// Raised for unknown policy or interpolation names
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FilterError {
    #[error("Unknown missing-value filter: {0}")]
    UnknownPolicy(String),

    #[error("Unknown percentile interpolation: {0}")]
    UnknownInterpolation(String),
}

/// What to do with missing values before reducing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingPolicy {
    /// Leave the list untouched
    #[default]
    Keep,
    /// Drop missing values
    Ignore,
    /// Replace missing values with zero
    Zero,
    /// Any missing value makes the result missing
    Propagate,
}

impl MissingPolicy {
    /// Apply the policy; `None` means the reduction result is missing
    pub fn apply(&self, values: &[Value]) -> Option<Vec<Value>> {
        match self {
            MissingPolicy::Keep => Some(values.to_vec()),
            MissingPolicy::Ignore => Some(
                values
                    .iter()
                    .filter(|v| is_valid(Some(v)))
                    .cloned()
                    .collect(),
            ),
            MissingPolicy::Zero => Some(
                values
                    .iter()
                    .map(|v| if is_valid(Some(v)) { v.clone() } else { Value::from(0) })
                    .collect(),
            ),
            MissingPolicy::Propagate => {
                if values.iter().all(|v| is_valid(Some(v))) {
                    Some(values.to_vec())
                } else {
                    None
                }
            }
        }
    }
}

impl FromStr for MissingPolicy {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "keep" | "keep_missing" => Ok(MissingPolicy::Keep),
            "ignore" | "ignore_missing" | "drop" | "drop_missing" => Ok(MissingPolicy::Ignore),
            "zero" | "zero_missing" => Ok(MissingPolicy::Zero),
            "propagate" | "propagate_missing" => Ok(MissingPolicy::Propagate),
            _ => Err(FilterError::UnknownPolicy(s.to_string())),
        }
    }
}

/// How a percentile falls between two sorted samples
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interpolation {
    #[default]
    Linear,
    Lower,
    Higher,
    Nearest,
    Midpoint,
}

impl FromStr for Interpolation {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "linear" => Ok(Interpolation::Linear),
            "lower" => Ok(Interpolation::Lower),
            "higher" => Ok(Interpolation::Higher),
            "nearest" => Ok(Interpolation::Nearest),
            "midpoint" => Ok(Interpolation::Midpoint),
            _ => Err(FilterError::UnknownInterpolation(s.to_string())),
        }
    }
}

/// Custom reduction function
pub type ReduceFn = Arc<dyn Fn(&[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
enum ReducerKind {
    Sum,
    Avg,
    Max,
    Min,
    Count,
    First,
    Last,
    Median,
    Stdev,
    Difference,
    Percentile(f64, Interpolation),
    Custom(String, ReduceFn),
}

/// A list-to-value reduction with a missing-value policy
#[derive(Clone)]
pub struct Reducer {
    kind: ReducerKind,
    policy: MissingPolicy,
}

impl Reducer {
    fn of(kind: ReducerKind) -> Self {
        Self {
            kind,
            policy: MissingPolicy::default(),
        }
    }

    pub fn sum() -> Self {
        Self::of(ReducerKind::Sum)
    }

    pub fn avg() -> Self {
        Self::of(ReducerKind::Avg)
    }

    pub fn max() -> Self {
        Self::of(ReducerKind::Max)
    }

    pub fn min() -> Self {
        Self::of(ReducerKind::Min)
    }

    pub fn count() -> Self {
        Self::of(ReducerKind::Count)
    }

    pub fn first() -> Self {
        Self::of(ReducerKind::First)
    }

    pub fn last() -> Self {
        Self::of(ReducerKind::Last)
    }

    pub fn median() -> Self {
        Self::of(ReducerKind::Median)
    }

    /// Population standard deviation
    pub fn stdev() -> Self {
        Self::of(ReducerKind::Stdev)
    }

    /// `max - min`
    pub fn difference() -> Self {
        Self::of(ReducerKind::Difference)
    }

    /// `q`-th percentile, `q` in `[0, 100]`
    pub fn percentile(q: f64, interp: Interpolation) -> Self {
        Self::of(ReducerKind::Percentile(q, interp))
    }

    /// Wrap an arbitrary reduction; the policy still applies first
    pub fn custom<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self::of(ReducerKind::Custom(name.into(), Arc::new(f)))
    }

    /// Look a reducer up by name (`avg`, `sum`, `p95`, ...)
    pub fn from_name(name: &str) -> Option<Self> {
        let lower = name.to_lowercase();
        let reducer = match lower.as_str() {
            "sum" => Self::sum(),
            "avg" | "mean" | "average" => Self::avg(),
            "max" => Self::max(),
            "min" => Self::min(),
            "count" => Self::count(),
            "first" => Self::first(),
            "last" => Self::last(),
            "median" => Self::median(),
            "stdev" | "stddev" => Self::stdev(),
            "difference" => Self::difference(),
            other => {
                let q: f64 = other.strip_prefix('p')?.parse().ok()?;
                Self::percentile(q, Interpolation::Linear)
            }
        };
        Some(reducer)
    }

    /// Builder: set the missing-value policy
    pub fn with_policy(mut self, policy: MissingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> MissingPolicy {
        self.policy
    }

    pub fn name(&self) -> String {
        match &self.kind {
            ReducerKind::Sum => "sum".to_string(),
            ReducerKind::Avg => "avg".to_string(),
            ReducerKind::Max => "max".to_string(),
            ReducerKind::Min => "min".to_string(),
            ReducerKind::Count => "count".to_string(),
            ReducerKind::First => "first".to_string(),
            ReducerKind::Last => "last".to_string(),
            ReducerKind::Median => "median".to_string(),
            ReducerKind::Stdev => "stdev".to_string(),
            ReducerKind::Difference => "difference".to_string(),
            ReducerKind::Percentile(q, _) => format!("p{}", q),
            ReducerKind::Custom(name, _) => name.clone(),
        }
    }

    /// Reduce a list of values
    pub fn reduce(&self, values: &[Value]) -> Value {
        let Some(values) = self.policy.apply(values) else {
            return Value::Null;
        };

        match &self.kind {
            ReducerKind::Count => Value::from(values.len()),
            ReducerKind::First => values.first().cloned().unwrap_or(Value::Null),
            ReducerKind::Last => values.last().cloned().unwrap_or(Value::Null),
            ReducerKind::Custom(_, f) => f(&values),
            numeric => {
                let Some(nums) = values.iter().map(Value::as_f64).collect::<Option<Vec<f64>>>()
                else {
                    return Value::Null;
                };
                reduce_numbers(numeric, &nums).map_or(Value::Null, Value::from)
            }
        }
    }
}

fn reduce_numbers(kind: &ReducerKind, nums: &[f64]) -> Option<f64> {
    if let ReducerKind::Sum = kind {
        return Some(nums.iter().sum());
    }
    if nums.is_empty() {
        return None;
    }

    let n = nums.len() as f64;
    match kind {
        ReducerKind::Avg => Some(nums.iter().sum::<f64>() / n),
        ReducerKind::Max => nums.iter().cloned().reduce(f64::max),
        ReducerKind::Min => nums.iter().cloned().reduce(f64::min),
        ReducerKind::Difference => {
            let max = nums.iter().cloned().reduce(f64::max)?;
            let min = nums.iter().cloned().reduce(f64::min)?;
            Some(max - min)
        }
        ReducerKind::Median => {
            let sorted = sorted(nums);
            let mid = sorted.len() / 2;
            if sorted.len() % 2 == 0 {
                Some((sorted[mid - 1] + sorted[mid]) / 2.0)
            } else {
                Some(sorted[mid])
            }
        }
        ReducerKind::Stdev => {
            let mean = nums.iter().sum::<f64>() / n;
            let variance = nums.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
            Some(variance.sqrt())
        }
        ReducerKind::Percentile(q, interp) => percentile_of_sorted(&sorted(nums), *q, *interp),
        _ => None,
    }
}

fn sorted(nums: &[f64]) -> Vec<f64> {
    let mut out = nums.to_vec();
    out.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
    out
}

/// Percentile of already sorted samples
pub fn percentile_of_sorted(sorted: &[f64], q: f64, interp: Interpolation) -> Option<f64> {
    if sorted.is_empty() || !(0.0..=100.0).contains(&q) {
        return None;
    }

    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - rank.floor();

    let value = match interp {
        Interpolation::Linear => sorted[lower] + fraction * (sorted[upper] - sorted[lower]),
        Interpolation::Lower => sorted[lower],
        Interpolation::Higher => sorted[upper],
        Interpolation::Nearest => sorted[rank.round() as usize],
        Interpolation::Midpoint => (sorted[lower] + sorted[upper]) / 2.0,
    };
    Some(value)
}

impl std::fmt::Debug for Reducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reducer")
            .field("name", &self.name())
            .field("policy", &self.policy)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn values(v: Value) -> Vec<Value> {
        v.as_array().cloned().unwrap()
    }

    #[test]
    fn test_policies_on_sum() {
        let vals = values(json!([1, null, 3]));
        let sum = |p| Reducer::sum().with_policy(p).reduce(&vals);

        assert_eq!(sum(MissingPolicy::Ignore).as_f64(), Some(4.0));
        assert_eq!(sum(MissingPolicy::Zero).as_f64(), Some(4.0));
        assert_eq!(sum(MissingPolicy::Propagate), Value::Null);
        assert_eq!(sum(MissingPolicy::Keep), Value::Null);
    }

    #[test]
    fn test_zero_policy_keeps_length_for_avg() {
        let vals = values(json!([1, null, 3]));
        let avg = Reducer::avg().with_policy(MissingPolicy::Zero).reduce(&vals);
        assert!((avg.as_f64().unwrap() - 4.0 / 3.0).abs() < 1e-12);

        let avg = Reducer::avg().with_policy(MissingPolicy::Ignore).reduce(&vals);
        assert_eq!(avg.as_f64(), Some(2.0));
    }

    #[test]
    fn test_basic_reducers() {
        let vals = values(json!([3, 1, 4, 1, 5]));
        assert_eq!(Reducer::sum().reduce(&vals).as_f64(), Some(14.0));
        assert_eq!(Reducer::max().reduce(&vals).as_f64(), Some(5.0));
        assert_eq!(Reducer::min().reduce(&vals).as_f64(), Some(1.0));
        assert_eq!(Reducer::count().reduce(&vals), json!(5));
        assert_eq!(Reducer::first().reduce(&vals), json!(3));
        assert_eq!(Reducer::last().reduce(&vals), json!(5));
        assert_eq!(Reducer::median().reduce(&vals).as_f64(), Some(3.0));
        assert_eq!(Reducer::difference().reduce(&vals).as_f64(), Some(4.0));
    }

    #[test]
    fn test_stdev_is_population() {
        let vals = values(json!([2, 4, 4, 4, 5, 5, 7, 9]));
        assert_eq!(Reducer::stdev().reduce(&vals).as_f64(), Some(2.0));
    }

    #[test]
    fn test_empty_inputs() {
        assert_eq!(Reducer::sum().reduce(&[]).as_f64(), Some(0.0));
        assert_eq!(Reducer::avg().reduce(&[]), Value::Null);
        assert_eq!(Reducer::first().reduce(&[]), Value::Null);
        assert_eq!(Reducer::count().reduce(&[]), json!(0));
    }

    #[test]
    fn test_non_numeric_values() {
        let vals = values(json!(["a", "b"]));
        assert_eq!(Reducer::avg().reduce(&vals), Value::Null);
        assert_eq!(Reducer::first().reduce(&vals), json!("a"));
    }

    #[test]
    fn test_percentile_interpolations() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        let p = |q, i| percentile_of_sorted(&sorted, q, i).unwrap();

        assert_eq!(p(50.0, Interpolation::Linear), 2.5);
        assert_eq!(p(50.0, Interpolation::Lower), 2.0);
        assert_eq!(p(50.0, Interpolation::Higher), 3.0);
        assert_eq!(p(50.0, Interpolation::Midpoint), 2.5);
        assert_eq!(p(25.0, Interpolation::Nearest), 2.0);
        assert_eq!(p(0.0, Interpolation::Linear), 1.0);
        assert_eq!(p(100.0, Interpolation::Linear), 4.0);
        assert_eq!(percentile_of_sorted(&sorted, 101.0, Interpolation::Linear), None);
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("drop".parse::<MissingPolicy>(), Ok(MissingPolicy::Ignore));
        assert_eq!("PROPAGATE".parse::<MissingPolicy>(), Ok(MissingPolicy::Propagate));
        assert_eq!(
            "bogus".parse::<MissingPolicy>(),
            Err(FilterError::UnknownPolicy("bogus".to_string()))
        );
        assert_eq!("midpoint".parse::<Interpolation>(), Ok(Interpolation::Midpoint));
        assert!("cubic".parse::<Interpolation>().is_err());
    }

    #[test]
    fn test_from_name() {
        assert_eq!(Reducer::from_name("avg").unwrap().name(), "avg");
        assert_eq!(Reducer::from_name("p95").unwrap().name(), "p95");
        assert!(Reducer::from_name("nope").is_none());
    }

    #[test]
    fn test_custom_reducer() {
        let joined = Reducer::custom("join", |vals| {
            Value::from(
                vals.iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(","),
            )
        })
        .with_policy(MissingPolicy::Ignore);
        assert_eq!(joined.reduce(&values(json!(["a", null, "b"]))), json!("a,b"));
    }
}
