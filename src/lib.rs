//! # Tindux
//!
//! A single-writer state container for Rust, in the reducer style.
//!
//! One [`Store`] owns one state value. The only way to change it is to hand
//! the store an [`Action`]; a pure [`Reducer`] turns the current state and
//! the action into the next state, and every subscriber is sent the result.
//!
//! ## Entry points
//!
//! - [`Store::submit`] / [`Store::try_submit`] - queue an action and move on
//! - [`Store::dispatch`] - queue an action and wait until it is applied and
//!   every subscriber has been notified
//!
//! Both feed the same queue, drained by one dispatcher task, so there is a
//! single global order of state transitions.
//!
//! ## Reading and subscribing
//!
//! - [`Store::get_state`] / [`Store::read`] - consistent snapshot, never torn
//! - [`Store::subscription`] / [`Store::subscribe`] - buffered channel per
//!   subscriber with an explicit [`Overflow`] policy
//! - [`Store::watch`] - latest-value subscriber that never blocks
//! - [`Store::history`] - bounded log of applied actions, see [`Options`]
//!
//! A store needs a tokio runtime; its dispatcher runs as a spawned task
//! until [`Store::close`], [`Store::cancel`], or the last handle is dropped.

pub mod error;
pub mod reducer;
pub mod store;

// Re-export main types for convenience
pub use error::{ReducerError, StoreError};
pub use reducer::{Action, Reducer, Reduction};
pub use store::{Options, Overflow, Store, StoreBuilder, StoreConfig};
