//! Shared foundational types used across the Aion FPGA toolchain.
//!
//! This crate provides core types including interned identifiers, content hashing,
//! and common result types.

#![warn(missing_docs)]

pub mod hash;
pub mod ident;
pub mod result;

pub use hash::ContentHash;
pub use ident::{Ident, Interner};
pub use result::{AionResult, InternalError};
