//! Types used for public key authentication (assertion).

use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{ignore_unknown, ignore_unknown_vec, maybe_stringified},
    webauthn::{PublicKeyCredential, PublicKeyCredentialDescriptor, UserVerificationRequirement},
    Bytes,
};

#[cfg(doc)]
use crate::webauthn::PublicKeyCredentialUserEntity;

/// The response to the successful authentication of a [`PublicKeyCredential`]
#[typeshare]
pub type AuthenticatedPublicKeyCredential = PublicKeyCredential<AuthenticatorAssertionResponse>;

/// The options returned by the relying party's assertion options endpoint,
/// consumed once by the platform authenticator to produce an assertion.
///
/// Parsing follows the same tolerance rules as
/// [`super::PublicKeyCredentialCreationOptions`].
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrequestoptions>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialRequestOptions {
    /// The challenge the authenticator signs, along with other data, when
    /// producing an authentication assertion.
    pub challenge: Bytes,

    /// The RP ID claimed by the relying party. The authenticator verifies
    /// that it matches the scope of the credential used.
    pub rp_id: String,

    /// The time, in milliseconds, the relying party is willing to wait for the
    /// call to complete. A hint; fractional values are preserved as sent.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "maybe_stringified"
    )]
    pub timeout: Option<f64>,

    /// Credential descriptors for the user's registered credentials, ordered
    /// in descending order of preference. Entries that fail to parse are
    /// dropped from the list.
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    pub allow_credentials: Vec<PublicKeyCredentialDescriptor>,

    /// The relying party's user verification requirement for this assertion.
    /// Advisory here: echoed through to the platform authenticator.
    #[serde(default, deserialize_with = "ignore_unknown")]
    pub user_verification: UserVerificationRequirement,
}

/// An authenticator's response to a client's request for generation of an
/// authentication assertion: a cryptographic signature proving possession of
/// the credential private key.
///
/// <https://w3c.github.io/webauthn/#iface-authenticatorassertionresponse>
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct AuthenticatorAssertionResponse {
    /// The JSON serialization of the client data passed to the authenticator
    /// by the client in order to generate this assertion. The exact
    /// serialization MUST be preserved.
    #[serde(rename = "clientDataJSON")]
    pub client_data_json: Bytes,

    /// The authenticator data used to produce the signature.
    pub authenticator_data: Bytes,

    /// The raw signature returned from the authenticator.
    pub signature: Bytes,

    /// The user handle returned from the authenticator, or `None` if the
    /// authenticator did not return one. Mirrors
    /// [`PublicKeyCredentialUserEntity::id`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_handle: Option<Bytes>,
}
