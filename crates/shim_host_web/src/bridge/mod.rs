//! Browser primitive bridge used by the adapters in this crate.
//!
//! Adapters call only these functions; `interop` picks the `wasm32` or native implementation.

mod interop;

pub use interop::*;
