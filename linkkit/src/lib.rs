//! Fitcoin account-linking SDK.
//!
//! Re-exports [`linkkit_core`]. With the `ffi` feature this crate is also the
//! library that foreign bindings are generated from.

pub use linkkit_core::*;

#[cfg(feature = "ffi")]
linkkit_core::uniffi_reexport_scaffolding!();
