//! Adaptive kana typing drill: weighted character selection, an input
//! matching state machine, combo scoring and a cancellable countdown, shared
//! by the classic drill and the falling, spiral and snake modes.
//!
//! The terminal host lives in the binary; everything here is driven by
//! explicit `input_changed` / `tick` calls and has no I/O besides `store`
//! and `config`.

pub mod config;
pub mod engine;
pub mod modes;
pub mod session;
pub mod store;
