//! Windowing, grouping and emission settings
//!
//! These are the pipeline-wide settings that stateful processors (the
//! aggregator, the taker, collection outputs) read when they are added to a
//! pipeline.

use chrono::{DateTime, Utc};
use serde_json::Value;
use std::rc::Rc;
use std::str::FromStr;

use super::error::{PipelineError, PipelineResult};
use crate::event::{Event, FieldPath};
use crate::time::index::{fixed_window_millis, Index};

/// Time bucketing strategy
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Window {
    /// Everything in one bucket
    #[default]
    Global,
    /// Fixed-duration buckets such as `5m` or `1h`
    Fixed(String),
    Daily,
    Monthly,
    Yearly,
}

impl Window {
    /// Parse `global`, `daily`, `monthly`, `yearly` or a duration like `30s`
    pub fn parse(s: &str) -> PipelineResult<Self> {
        match s {
            "global" => Ok(Window::Global),
            "daily" => Ok(Window::Daily),
            "monthly" => Ok(Window::Monthly),
            "yearly" => Ok(Window::Yearly),
            duration => {
                fixed_window_millis(duration)
                    .map_err(|_| PipelineError::InvalidWindow(duration.to_string()))?;
                Ok(Window::Fixed(duration.to_string()))
            }
        }
    }

    pub fn is_fixed(&self) -> bool {
        matches!(self, Window::Fixed(_))
    }

    pub fn is_global(&self) -> bool {
        matches!(self, Window::Global)
    }

    /// Bucket key of an instant under this window
    pub fn key_for(&self, t: &DateTime<Utc>, utc: bool) -> PipelineResult<String> {
        Ok(match self {
            Window::Global => "global".to_string(),
            Window::Fixed(duration) => Index::get_index_string(duration, t)?,
            Window::Daily => Index::get_daily_index_string(t, utc),
            Window::Monthly => Index::get_monthly_index_string(t, utc),
            Window::Yearly => Index::get_yearly_index_string(t, utc),
        })
    }
}

impl std::fmt::Display for Window {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Window::Global => write!(f, "global"),
            Window::Fixed(duration) => write!(f, "{}", duration),
            Window::Daily => write!(f, "daily"),
            Window::Monthly => write!(f, "monthly"),
            Window::Yearly => write!(f, "yearly"),
        }
    }
}

/// When a collector hands its collections downstream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmitOn {
    /// Every held collection, on every event
    #[default]
    EachEvent,
    /// Only windows sealed by the arrival of a newer window
    Discard,
    /// Nothing until the stream is flushed
    Flush,
}

impl FromStr for EmitOn {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "eachEvent" => Ok(EmitOn::EachEvent),
            "discard" => Ok(EmitOn::Discard),
            "flush" => Ok(EmitOn::Flush),
            other => Err(PipelineError::UnknownEmitOn(other.to_string())),
        }
    }
}

impl std::fmt::Display for EmitOn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitOn::EachEvent => write!(f, "eachEvent"),
            EmitOn::Discard => write!(f, "discard"),
            EmitOn::Flush => write!(f, "flush"),
        }
    }
}

/// Function computing a group key for an event
pub type GroupFn = Rc<dyn Fn(&Event) -> Option<String>>;

/// How events are split into groups
#[derive(Clone, Default)]
pub enum GroupBy {
    /// No grouping
    #[default]
    None,
    /// Group on the value of a field
    Field(FieldPath),
    /// Group on a computed key
    Func(GroupFn),
}

impl GroupBy {
    pub fn func<F>(f: F) -> Self
    where
        F: Fn(&Event) -> Option<String> + 'static,
    {
        GroupBy::Func(Rc::new(f))
    }

    /// Group key of an event, `None` when ungrouped
    pub fn key(&self, event: &Event) -> Option<String> {
        match self {
            GroupBy::None => None,
            GroupBy::Field(path) => event.get_path(path).map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            GroupBy::Func(f) => f(event),
        }
    }
}

impl From<&str> for GroupBy {
    fn from(field: &str) -> Self {
        GroupBy::Field(FieldPath::parse(field))
    }
}

impl From<FieldPath> for GroupBy {
    fn from(path: FieldPath) -> Self {
        GroupBy::Field(path)
    }
}

impl std::fmt::Debug for GroupBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GroupBy::None => write!(f, "GroupBy::None"),
            GroupBy::Field(path) => write!(f, "GroupBy::Field({})", path),
            GroupBy::Func(_) => write!(f, "GroupBy::Func(..)"),
        }
    }
}

/// Settings shared by windowed processors
#[derive(Debug, Clone, Default)]
pub struct WindowConfig {
    pub window: Window,
    pub utc: bool,
    pub emit_on: EmitOn,
    pub group_by: GroupBy,
}

impl WindowConfig {
    pub fn new() -> Self {
        Self {
            utc: true,
            ..Default::default()
        }
    }

    /// `window_key` plus `::group` when grouped
    pub fn collection_key(window_key: &str, group_key: Option<&str>) -> String {
        match group_key {
            Some(group) => format!("{}::{}", window_key, group),
            None => window_key.to_string(),
        }
    }
}
