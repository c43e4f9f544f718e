//! Actions and the pure transition functions applied to them.
//!
//! A reducer never touches the store directly: it receives the current
//! state by reference and hands back a [`Reduction`] holding the next state
//! and, optionally, an error describing what went wrong.

mod reducer;

pub use reducer::{Action, Reducer, Reduction};
