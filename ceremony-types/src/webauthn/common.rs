//! Common types used in both attestation (registration) and assertion
//! (authentication) ceremonies.

use coset::iana;
use serde::{Deserialize, Serialize};
use typeshare::typeshare;

use crate::{
    utils::serde::{i64_to_iana, ignore_unknown},
    Bytes,
};

#[cfg(doc)]
use crate::webauthn::{
    PublicKeyCredential, PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
};

/// This enumeration defines the valid credential types. It is an extension
/// point; values can be added to it in the future, as more credential types
/// are defined.
///
/// <https://w3c.github.io/webauthn/#enumdef-publickeycredentialtype>
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
#[typeshare(serialized_as = "String")]
pub enum PublicKeyCredentialType {
    /// Currently the only type defined is a `PublicKey` meaning the public
    /// counterpart of an asymmetric key pair.
    PublicKey,
    /// This is the default as it will be ignored if the value is unknown
    /// during deserialization.
    #[default]
    Unknown,
}

/// Identifies a specific public key credential. Used in
/// [`PublicKeyCredentialCreationOptions::exclude_credentials`] to prevent
/// creating duplicate credentials on the same authenticator, and in
/// [`PublicKeyCredentialRequestOptions::allow_credentials`] to determine if
/// and how the credential can currently be reached by the client.
///
/// A list entry whose `id` is absent or not valid base64(url) is dropped by
/// the list deserializer rather than failing the ceremony.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialdescriptor>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[typeshare]
pub struct PublicKeyCredentialDescriptor {
    /// The type of the public key credential the caller is referring to. The
    /// value SHOULD be a member of [`PublicKeyCredentialType`] but client
    /// platforms MUST ignore any descriptor with an unknown type.
    #[serde(rename = "type", deserialize_with = "ignore_unknown", default)]
    pub ty: PublicKeyCredentialType,

    /// The credential ID of the public key credential the caller is referring
    /// to. Mirrors the [`PublicKeyCredential::raw_id`] field.
    pub id: Bytes,
}

impl PublicKeyCredentialDescriptor {
    /// Checks whether [`Self::ty`] is not of value
    /// [`PublicKeyCredentialType::Unknown`]. This should be used for
    /// filtering a list of descriptors down to those of a known type.
    pub fn is_known(&self) -> bool {
        match self.ty {
            PublicKeyCredentialType::PublicKey => true,
            PublicKeyCredentialType::Unknown => false,
        }
    }
}

/// This type is used to supply additional parameters when creating a new
/// credential. The algorithm travels on the wire as a COSE algorithm
/// identifier, e.g. `-7` for ES256 and `-257` for RS256.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialparameters>
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[typeshare]
pub struct PublicKeyCredentialParameters {
    /// The type of credential to be created. The value SHOULD be a member of
    /// [`PublicKeyCredentialType`] but client platforms MUST ignore unknown
    /// values.
    #[serde(rename = "type", deserialize_with = "ignore_unknown", default)]
    pub ty: PublicKeyCredentialType,

    /// The cryptographic signature algorithm with which the newly generated
    /// credential will be used. An entry carrying an algorithm identifier
    /// this client does not know is dropped from the parameter list.
    #[serde(with = "i64_to_iana")]
    #[typeshare(serialized_as = "I54")] // because i64 fails for js
    pub alg: iana::Algorithm,
}

/// Name and identifier for the relying party responsible for a ceremony.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialrpentity>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[typeshare]
pub struct PublicKeyCredentialRpEntity {
    /// A unique identifier for the relying party entity, which sets the RP ID.
    pub id: String,

    /// A human-palatable identifier for the relying party, intended only for
    /// display.
    pub name: String,
}

/// Names and an identifier for the user account performing a registration.
///
/// <https://w3c.github.io/webauthn/#dictdef-publickeycredentialuserentity>
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct PublicKeyCredentialUserEntity {
    /// The user handle of the user account: an opaque byte sequence, base64url
    /// on the wire, not meant to be displayed to the user. Authentication and
    /// authorization decisions MUST be made on the basis of this member, not
    /// [`Self::name`] nor [`Self::display_name`].
    pub id: Bytes,

    /// A human-palatable identifier for the user account, intended only for
    /// display, e.g. `"alexm"` or `"alex.mueller@example.com"`.
    pub name: String,

    /// A human-palatable name for the user account, intended only for display,
    /// e.g. `"Alex Müller"`. Servers may omit it.
    #[serde(default)]
    pub display_name: String,
}

/// A relying party may require user verification for some of its operations
/// but not for others, and may use this type to express its needs.
///
/// <https://w3c.github.io/webauthn/#enumdef-userverificationrequirement>
#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
#[typeshare(serialized_as = "String")]
pub enum UserVerificationRequirement {
    /// The relying party requires user verification and will fail the overall
    /// ceremony if the response does not have the UV flag set.
    Required,

    /// The relying party prefers user verification if possible, but will not
    /// fail the operation if the response does not have the UV flag set.
    #[default]
    Preferred,

    /// The relying party does not want user verification employed during the
    /// operation.
    Discouraged,
}
