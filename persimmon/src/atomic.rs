//! Atomic types used across the crate
//!
//! The `portable-atomic` feature switches to polyfilled atomics for
//! targets without native 64bit support.

#[cfg(not(feature = "portable-atomic"))]
pub(crate) use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

#[cfg(feature = "portable-atomic")]
pub(crate) use portable_atomic::{AtomicU32, AtomicU64, Ordering};
