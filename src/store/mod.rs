//! The reducer-driven store.
//!
//! A [`Store`] owns one state value. Actions reach it through a bounded
//! queue, a single dispatcher task applies them in order, and each new state
//! is fanned out to subscribers after the state lock is released.

mod dispatcher;
mod history;
mod options;
mod store;
mod subscribers;

pub use options::{Options, Overflow, StoreConfig};
pub use store::{Store, StoreBuilder};
