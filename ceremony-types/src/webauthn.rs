//! Types for the ceremony payloads defined by [WebAuthn Level 3], reduced to
//! the fields this relying party actually produces and consumes.
//!
//! [WebAuthn Level 3]: https://w3c.github.io/webauthn

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{utils::serde::ignore_unknown, Bytes};

mod assertion;
mod attestation;
mod common;

// re-export types
pub use self::{assertion::*, attestation::*, common::*};

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::AuthenticatorAssertionResponse {}
    impl Sealed for super::AuthenticatorAttestationResponse {}
}

/// Marker trait for response types
pub trait AuthenticatorResponse: sealed::Sealed {}

impl AuthenticatorResponse for AuthenticatorAssertionResponse {}
impl AuthenticatorResponse for AuthenticatorAttestationResponse {}

/// The credential produced by a successful creation or assertion operation of
/// the platform authenticator.
///
/// It is recommended to use the type aliases depending on which response you
/// are expecting:
/// * Credential creation: [`CreatedPublicKeyCredential`]
/// * Credential assertion: [`AuthenticatedPublicKeyCredential`]
///
/// <https://w3c.github.io/webauthn/#iface-pkcredential>
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredential<R: AuthenticatorResponse> {
    /// The credential ID, chosen by the authenticator. This is the base64url
    /// encoded data of [`Self::raw_id`].
    pub id: String,

    /// The raw bytes of the credential ID, see [`Self::id`].
    pub raw_id: Bytes,

    /// Always [`PublicKeyCredentialType::PublicKey`] for credentials produced
    /// by a webauthn authenticator.
    #[serde(rename = "type", deserialize_with = "ignore_unknown", default)]
    pub ty: PublicKeyCredentialType,

    /// The authenticator's response to the operation: either an
    /// [`AuthenticatorAttestationResponse`] for credential creation or an
    /// [`AuthenticatorAssertionResponse`] for an authentication assertion.
    pub response: R,
}
