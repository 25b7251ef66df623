//! AeroChain - A tamper-evident ledger of maintenance records
//!
//! # Architecture
//!
//! Every maintenance record is sealed in a block whose hash commits to the
//! record, its creation time, its index and the previous block's hash, so
//! any retroactive edit is detectable.
//!
//! ## Ledger Engine
//! - [`blockchain`] - Block construction, the [`Ledger`](blockchain::Ledger) engine and chain validation
//! - [`record`] - Maintenance record types and input validation
//!
//! ## Cryptography
//! - [`crypto`] - Pluggable hash functions (SHA-256 by default)
//!
//! ## Storage
//! - [`persistence`] - Key-value byte stores (SQLite, files, memory) and the chain codec
//!
//! ## Integration
//! - [`api`] - REST API (feature `api`)
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`error`] - Error types
//! - [`cli`] - Helpers shared by the binaries

#![forbid(unsafe_code)]

// ============================================================================
// Ledger Engine
// ============================================================================
pub mod blockchain;
pub mod record;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;

// ============================================================================
// Storage
// ============================================================================
pub mod persistence;

// ============================================================================
// Integration
// ============================================================================
#[cfg(feature = "api")]
pub mod api;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod cli;
pub mod config;
pub mod error;
