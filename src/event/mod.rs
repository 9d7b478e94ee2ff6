//! Events
//!
//! - **types**: [`Event`], its [`EventKey`] variants and [`EventType`] tag
//! - **path**: field paths and payload helpers
//! - **ops**: merge, combine, map/reduce, selector and collapse
//! - **error**: [`EventError`]

pub mod error;
pub mod ops;
pub mod path;
pub mod types;

pub use error::{EventError, EventResult};
pub use path::{field_spec, Data, FieldPath};
pub use types::{Event, EventKey, EventType};
