//! Aggregation domain: pure functions over the records fetched from the API.
//!
//! - [`time`]: timestamp parsing, legacy correction, local wall-clock
//! - [`sessions`]: merging activities, feedings and visits into one list
//! - [`buckets`]: splitting sessions into day and month buckets
//! - [`statistics`]: per-type counts and durations for today, week, month
//! - [`growth`]: percentile reference alignment of weight observations
//! - [`feeding`]: breastfeeding summaries
//! - [`feeding_timer`]: the two-sided feeding stopwatch
//! - [`relative_time`]: "3 hours ago" phrasing
//! - [`activity_types`]: built-in, derived and custom activity types
//! - [`resources`]: the dashboard MCP resource

pub mod activity_types;
pub mod buckets;
pub mod feeding;
pub mod feeding_timer;
pub mod growth;
pub mod relative_time;
pub mod resources;
pub mod sessions;
pub mod statistics;
pub mod time;
