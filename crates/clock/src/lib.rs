//! Animation clock: per-frame tick dispatch and fixed-rate simulation pacing.
//!
//! # Invariants
//! - All listeners of a tick run before [`Clock::tick`] returns.
//! - A panicking listener never stops the others or later ticks.
//! - A stopped clock dispatches nothing; resuming needs no catch-up.

mod clock;
mod fixed_step;

pub use clock::{Clock, ClockEvent, ListenerId, TickReport};
pub use fixed_step::FixedStep;

pub fn crate_info() -> &'static str {
    "rtgl-clock v0.1.0"
}
