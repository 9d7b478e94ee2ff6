//! Time primitives
//!
//! Everything in pond is positioned in time by one of three things:
//!
//! - **instants**: `DateTime<Utc>`, converted from epoch milliseconds or
//!   timezone-aware datetimes via [`IntoInstant`]
//! - **ranges**: [`TimeRange`], an ordered `[begin, end]` pair with an
//!   interval algebra (contains, overlaps, intersection, ...)
//! - **indexes**: [`Index`], a string naming a calendar bucket (`2015-07`) or
//!   a fixed-size bucket (`5m-4754394`) that resolves to a `TimeRange`
//!
//! # Index string grammar
//!
//! ```text
//! fixed:    <N><s|m|h|d>-<position>   position = floor(epoch_ms / bucket_ms)
//! yearly:   YYYY
//! monthly:  YYYY-MM
//! daily:    YYYY-MM-DD
//! ```

pub mod error;
pub mod index;
pub mod range;
pub mod util;

pub use error::{IndexError, IndexResult, TimeRangeError, TimeRangeResult, UtilityError, UtilityResult};
pub use index::Index;
pub use range::TimeRange;
pub use util::{dt_from_ms, ms_from_dt, IntoInstant};
