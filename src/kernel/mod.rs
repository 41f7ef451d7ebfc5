//! Deterministic core: events in, state deltas and side effects out.

pub mod event;
pub mod intent;
pub mod phrases;
pub mod reactor;
pub mod scheduler;
pub mod state;
pub mod time;
