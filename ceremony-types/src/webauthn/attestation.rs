//! Types specific to public key credential creation (registration).

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{ignore_unknown, ignore_unknown_vec, maybe_stringified},
    webauthn::{
        PublicKeyCredential, PublicKeyCredentialDescriptor, PublicKeyCredentialParameters,
        PublicKeyCredentialRpEntity, PublicKeyCredentialUserEntity,
    },
    Bytes,
};

/// The response to the successful creation of a PublicKeyCredential
#[typeshare]
pub type CreatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAttestationResponse>;

/// The options returned by the relying party's attestation options endpoint,
/// consumed once by the platform authenticator to mint a new credential.
///
/// Parsing is tolerant: unknown fields (the server also sends `status`,
/// `errorMessage`, `attestation`, `extensions`, ...) are ignored, and entries
/// of [`Self::pub_key_cred_params`] or [`Self::exclude_credentials`] that fail
/// to parse are dropped from their list.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialcreationoptions>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialCreationOptions {
    /// A name and an identifier for the relying party responsible for the
    /// request.
    pub rp: PublicKeyCredentialRpEntity,

    /// Names and an identifier for the user account performing the
    /// registration.
    pub user: PublicKeyCredentialUserEntity,

    /// The challenge the authenticator signs, along with other data, when
    /// producing an attestation for the newly created credential. Base64url
    /// text on the wire; raw bytes here.
    pub challenge: Bytes,

    /// The key types and signature algorithms the relying party supports,
    /// ordered from most preferred to least preferred.
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    pub pub_key_cred_params: Vec<PublicKeyCredentialParameters>,

    /// The time, in milliseconds, the relying party is willing to wait for the
    /// call to complete. A hint; fractional values are preserved as sent.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "maybe_stringified"
    )]
    pub timeout: Option<f64>,

    /// Existing credentials mapped to this user account. The authenticator
    /// must not mint a new credential on an authenticator that already holds
    /// one of these.
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    pub exclude_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// Capabilities and settings the authenticator should satisfy. Advisory:
    /// parsed and carried, but not acted upon by this client; the server
    /// decides, and the platform authenticator applies its own policy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authenticator_selection: Option<AuthenticatorSelectionCriteria>,
}

/// Authenticator attribute requirements echoed by the relying party.
///
/// This server spells several of these values as strings (e.g.
/// `"requiresResidentKey": "false"`), so every field is kept loose and
/// optional; a value of an unexpected shape becomes `None` instead of failing
/// the ceremony.
///
/// <https://w3c.github.io/webauthn/#dictdef-authenticatorselectioncriteria>
#[derive(Debug, Default, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorSelectionCriteria {
    /// Requested authenticator attachment modality, e.g. `"platform"`.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown"
    )]
    pub authenticator_attachment: Option<String>,

    /// Discoverable credential requirement, spelled as a string by this
    /// server.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown"
    )]
    pub requires_resident_key: Option<String>,

    /// WebAuthn Level 1 compatibility twin of
    /// [`Self::requires_resident_key`], spelled as a boolean.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown"
    )]
    pub require_resident_key: Option<bool>,

    /// User verification requirement, spelled as a string by this server.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "ignore_unknown"
    )]
    pub user_verification: Option<String>,
}

/// The authenticator's response to a client's request to create a new public
/// key credential.
///
/// <https://w3c.github.io/webauthn/#iface-authenticatorattestationresponse>
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorAttestationResponse {
    /// The JSON serialization of the client data passed to the authenticator
    /// by the client in order to generate this credential. The exact
    /// serialization MUST be preserved, as the hash of the serialized client
    /// data has been computed over it.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The CBOR attestation object containing the authenticator data and the
    /// attestation statement. Opaque to this client; the relying party
    /// verifies it.
    pub attestation_object: Bytes,
}
