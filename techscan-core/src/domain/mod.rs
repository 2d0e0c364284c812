//! Domain types for techscan

pub mod bar;
pub mod snapshot;

pub use bar::{with_close, Bar};
pub use snapshot::{ScoreState, Signal, TickerSnapshot, Trend, VolumeState};
