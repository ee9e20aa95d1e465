//! # Ceremony Types
//!
//! Rust type definitions for the JSON shapes exchanged with a FIDO2 relying
//! party during registration (attestation) and authentication (assertion)
//! ceremonies.
//!
//! All binary fields travel as unpadded `base64url` text and are represented
//! in memory by the [`Bytes`] newtype, which guarantees that decoding and
//! re-encoding a canonical value is lossless.

mod utils;

pub mod webauthn;

// Re-exports
pub use utils::{
    bytes::{Bytes, NotBase64Encoded},
    encoding, rand,
    serde as serde_helpers,
};
