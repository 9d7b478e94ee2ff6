//! Collector: keyed window/group accumulation
//!
//! Every event is routed to a collection keyed by its window and group:
//!
//! ```text
//! window key:      "5m-4754394" | "2015-03-14" | "global"
//! collection key:  "<window key>::<group key>"  or just "<window key>"
//! ```
//!
//! When a fixed-window key is created, every held collection from another
//! window is considered sealed. What gets emitted, and when, depends on
//! [`EmitOn`].

use std::collections::HashMap;

use super::error::PipelineResult;
use super::window::{EmitOn, WindowConfig};
use crate::collection::Collection;
use crate::event::Event;

/// A collection emitted by the collector, with its keys
#[derive(Debug, Clone, PartialEq)]
pub struct WindowedCollection {
    pub window_key: String,
    pub group_key: Option<String>,
    pub collection: Collection,
}

impl WindowedCollection {
    /// Result key used by collection outputs: `window--group`, or `all`
    pub fn output_key(&self) -> String {
        let mut parts = Vec::with_capacity(2);
        if self.window_key != "global" {
            parts.push(self.window_key.as_str());
        }
        if let Some(group) = self.group_key.as_deref().filter(|g| *g != "all") {
            parts.push(group);
        }
        if parts.is_empty() {
            "all".to_string()
        } else {
            parts.join("--")
        }
    }
}

/// Accumulates events into window/group collections
#[derive(Debug)]
pub struct Collector {
    config: WindowConfig,
    order: Vec<String>,
    collections: HashMap<String, WindowedCollection>,
}

impl Collector {
    pub fn new(config: WindowConfig) -> Self {
        Self {
            config,
            order: Vec::new(),
            collections: HashMap::new(),
        }
    }

    /// Number of collections currently held
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Add an event, returning whatever the emit policy releases
    pub fn add_event(&mut self, event: Event) -> PipelineResult<Vec<WindowedCollection>> {
        let window_key = self.config.window.key_for(&event.timestamp(), self.config.utc)?;
        let group_key = self.config.group_by.key(&event);
        let key = WindowConfig::collection_key(&window_key, group_key.as_deref());

        let created = !self.collections.contains_key(&key);
        if created {
            self.order.push(key.clone());
            self.collections.insert(
                key.clone(),
                WindowedCollection {
                    window_key: window_key.clone(),
                    group_key,
                    collection: Collection::new(),
                },
            );
        }

        if let Some(slot) = self.collections.get_mut(&key) {
            slot.collection.push(event)?;
        }

        let sealed: Vec<String> = if created && self.config.window.is_fixed() {
            self.order
                .iter()
                .filter(|k| {
                    self.collections
                        .get(*k)
                        .is_some_and(|c| c.window_key != window_key)
                })
                .cloned()
                .collect()
        } else {
            Vec::new()
        };

        match self.config.emit_on {
            EmitOn::EachEvent => Ok(self.snapshot()),
            EmitOn::Discard => {
                if !sealed.is_empty() {
                    tracing::trace!(count = sealed.len(), "sealing windows");
                }
                Ok(sealed.iter().filter_map(|k| self.evict(k)).collect())
            }
            EmitOn::Flush => Ok(Vec::new()),
        }
    }

    /// Release every held collection, in first-insertion order
    pub fn flush(&mut self) -> Vec<WindowedCollection> {
        let order = std::mem::take(&mut self.order);
        order
            .iter()
            .filter_map(|k| self.collections.remove(k))
            .collect()
    }

    fn snapshot(&self) -> Vec<WindowedCollection> {
        self.order
            .iter()
            .filter_map(|k| self.collections.get(k).cloned())
            .collect()
    }

    fn evict(&mut self, key: &str) -> Option<WindowedCollection> {
        self.order.retain(|k| k != key);
        self.collections.remove(key)
    }
}
