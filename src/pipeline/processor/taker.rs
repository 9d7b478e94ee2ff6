//! Taker: pass the first `limit` events of each window/group

use std::collections::HashMap;

use super::{Emitter, Processor};
use crate::event::Event;
use crate::pipeline::error::PipelineResult;
use crate::pipeline::window::WindowConfig;

#[derive(Debug, Clone)]
pub struct Taker {
    limit: usize,
    config: WindowConfig,
    counts: HashMap<String, usize>,
}

impl Taker {
    /// `config` is the pipeline's window and grouping at the time `take`
    /// was called
    pub fn new(limit: usize, config: WindowConfig) -> Self {
        Self {
            limit,
            config,
            counts: HashMap::new(),
        }
    }
}

impl Processor for Taker {
    fn name(&self) -> &'static str {
        "taker"
    }

    fn fresh(&self) -> Box<dyn Processor> {
        Box::new(Taker::new(self.limit, self.config.clone()))
    }

    fn add_event(&mut self, event: Event, out: &mut Emitter<'_>) -> PipelineResult<()> {
        if !out.has_observers() {
            return Ok(());
        }
        let window_key = self.config.window.key_for(&event.timestamp(), self.config.utc)?;
        let group_key = self.config.group_by.key(&event);
        let key = WindowConfig::collection_key(&window_key, group_key.as_deref());

        let count = self.counts.entry(key).or_insert(0);
        *count += 1;
        if *count <= self.limit {
            out.emit(event)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::processor::testing::run;
    use crate::pipeline::window::{GroupBy, Window};
    use serde_json::json;

    fn events() -> Vec<Event> {
        (0..10)
            .map(|i| {
                let side = if i % 2 == 0 { "left" } else { "right" };
                Event::new(i * 30_000, json!({"value": i, "side": side})).unwrap()
            })
            .collect()
    }

    #[test]
    fn test_take_global() {
        let mut taker = Taker::new(3, WindowConfig::new());
        let out = run(&mut taker, events()).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].value(), Some(&json!(2)));
    }

    #[test]
    fn test_take_per_window() {
        let mut config = WindowConfig::new();
        config.window = Window::parse("1m").unwrap();
        let mut taker = Taker::new(1, config);
        let out = run(&mut taker, events()).unwrap();
        let values: Vec<_> = out.iter().filter_map(|e| e.value().cloned()).collect();
        assert_eq!(values, vec![json!(0), json!(2), json!(4), json!(6), json!(8)]);
    }

    #[test]
    fn test_take_per_group() {
        let mut config = WindowConfig::new();
        config.group_by = GroupBy::from("side");
        let mut taker = Taker::new(2, config);
        let out = run(&mut taker, events()).unwrap();
        let values: Vec<_> = out.iter().filter_map(|e| e.value().cloned()).collect();
        assert_eq!(values, vec![json!(0), json!(1), json!(2), json!(3)]);
    }
}
