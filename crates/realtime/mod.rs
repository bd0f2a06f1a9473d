//! Realtime view synchronization.
//!
//! A view subscribes to the change feed for its scope, bulk-loads the collection, then
//! folds notifications into an id-keyed [`event_log::EventLog`] so duplicates and late
//! arrivals are harmless. Switching scope always tears the previous subscription down
//! before opening the next one.

pub mod change_feed;
pub mod event_log;
pub mod overlay;
pub mod scoped_view;
