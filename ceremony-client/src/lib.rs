//! # Ceremony Client
//!
//! This crate drives WebAuthn sign-in ceremonies against a FIDO2 relying
//! party. It is split along a strict boundary:
//!
//! * the [`api`] module is the **ceremony codec**: pure functions building
//!   the outbound JSON for the four ceremony calls and parsing the relying
//!   party's responses into the types of [`ceremony_types`]. It performs no
//!   I/O and knows nothing about state or storage.
//! * [`SignInFlow`] is the **orchestrator**: it owns the sign-in state
//!   machine, talks to the relying party through the [`Transport`] seam,
//!   hands ceremony options to the platform authenticator through the
//!   [`AuthenticatorCapability`] seam, and persists session data through the
//!   [`SettingsStore`] seam. It knows nothing about the wire format.
//!
//! Networking, key handling, and durable storage all live behind those
//! traits; this crate ships a [`MemoryStore`] for tests and examples and,
//! behind the `reqwest` feature, a `ReqwestTransport`.

use std::fmt;

pub mod api;

mod authenticator;
mod flow;
mod state;
mod store;
mod transport;

pub use api::{ApiResult, CeremonyOutcome, Endpoint, SUCCESS_STATUS};
#[cfg(any(test, feature = "testable"))]
pub use authenticator::MockAuthenticatorCapability;
pub use authenticator::{AuthenticatorCapability, AuthenticatorError};
pub use flow::SignInFlow;
pub use state::SignInState;
pub use store::{
    encode_records, parse_records, MemoryStore, SessionUpdate, SettingsStore, StorageError,
    StoredCredential,
};
#[cfg(feature = "reqwest")]
pub use transport::ReqwestTransport;
pub use transport::{Transport, TransportError, TransportResponse};

/// Errors produced by ceremony operations.
///
/// Nothing in this crate retries automatically; retries, if any, belong to
/// the transport implementation. A server-side *rejection* of a ceremony is
/// not an error here; the orchestrator publishes it as
/// [`SignInState::SignInError`] with the server-supplied indicator.
#[derive(Debug)]
pub enum CeremonyError {
    /// The transport failed before producing a response. The ceremony is
    /// aborted and the published state is left unchanged.
    Transport(TransportError),

    /// The server payload was malformed, incomplete, or empty. Carries the
    /// call that produced it and the underlying message, which names the
    /// offending field when one is missing.
    Parse {
        /// The endpoint whose response failed to decode.
        call: Endpoint,
        /// What went wrong.
        message: String,
    },

    /// The platform authenticator failed or the user declined. The ceremony
    /// is aborted and the pre-ceremony state is restored.
    Authenticator(AuthenticatorError),

    /// The durable settings store failed.
    Storage(StorageError),

    /// A ceremony is already in flight on this orchestrator; starting a
    /// second one is rejected rather than queued.
    CeremonyPending,

    /// A `complete_*` operation was invoked with no matching `start_*`
    /// ceremony pending.
    NoPendingCeremony,
}

impl fmt::Display for CeremonyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CeremonyError::Transport(err) => write!(f, "transport failure: {err}"),
            CeremonyError::Parse { call, message } => {
                write!(f, "cannot parse response from {call}: {message}")
            }
            CeremonyError::Authenticator(err) => write!(f, "authenticator failure: {err}"),
            CeremonyError::Storage(err) => write!(f, "settings store failure: {err}"),
            CeremonyError::CeremonyPending => {
                write!(f, "another ceremony is already in flight")
            }
            CeremonyError::NoPendingCeremony => {
                write!(f, "no ceremony is pending completion")
            }
        }
    }
}

impl std::error::Error for CeremonyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CeremonyError::Transport(err) => Some(err),
            CeremonyError::Authenticator(err) => Some(err),
            CeremonyError::Storage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TransportError> for CeremonyError {
    fn from(err: TransportError) -> Self {
        CeremonyError::Transport(err)
    }
}

impl From<AuthenticatorError> for CeremonyError {
    fn from(err: AuthenticatorError) -> Self {
        CeremonyError::Authenticator(err)
    }
}

impl From<StorageError> for CeremonyError {
    fn from(err: StorageError) -> Self {
        CeremonyError::Storage(err)
    }
}

#[cfg(test)]
mod tests;
