// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// block construction and the engine, derived read views, and validation.

pub mod core;
pub use core::*;
