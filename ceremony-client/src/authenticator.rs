//! The platform authenticator capability boundary.
//!
//! The component that holds private keys and produces signed credentials is
//! external to this crate: a platform API, a hardware key bridge, or a
//! software authenticator. The orchestrator only needs the two operations
//! below, both asynchronous and both cancellable by the user.

use std::fmt;

use ceremony_types::webauthn::{
    AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential,
    PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
};

/// A failure of the authenticator capability, distinct from transport and
/// ceremony errors. Either way the ceremony is aborted and the sign-in state
/// returns to its pre-ceremony value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthenticatorError {
    /// The user declined the operation.
    Cancelled,
    /// The platform reported a failure.
    Platform(String),
}

impl fmt::Display for AuthenticatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthenticatorError::Cancelled => f.write_str("cancelled by the user"),
            AuthenticatorError::Platform(message) => write!(f, "platform failure: {message}"),
        }
    }
}

impl std::error::Error for AuthenticatorError {}

/// Pluggable capability producing credentials and assertions.
///
/// Each ceremony consumes its options exactly once: the orchestrator hands
/// the decoded options to one call on this trait and assembles whatever comes
/// back into the result payload for the relying party.
#[cfg_attr(any(test, feature = "testable"), mockall::automock)]
#[async_trait::async_trait]
pub trait AuthenticatorCapability {
    /// Mint a new credential (public key + attestation) for the given
    /// creation options.
    async fn create_credential(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, AuthenticatorError>;

    /// Produce an assertion (signature + authenticator data) for the given
    /// request options.
    async fn get_assertion(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, AuthenticatorError>;
}
