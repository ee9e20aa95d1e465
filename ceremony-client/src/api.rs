//! The ceremony codec: builders for the four outbound ceremony payloads and
//! tolerant parsers for the relying party's responses.
//!
//! Everything here is a pure function of its input: no I/O, no retries, no
//! state. The orchestrator owns sequencing; the transport owns the network.

use std::fmt;

use ceremony_types::{
    encoding, serde_helpers::ignore_unknown_vec,
    webauthn::{
        AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential,
        PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
    },
};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;
use typeshare::typeshare;

use crate::{store::StoredCredential, transport::TransportResponse, CeremonyError};

/// The four relying-party endpoints of the ceremony protocol, POSTed to with
/// an `application/json` body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Fetch creation options to begin a registration ceremony.
    AttestationOptions,
    /// Submit the newly minted credential to finish registration.
    AttestationResult,
    /// Fetch request options to begin an authentication ceremony.
    AssertionOptions,
    /// Submit the assertion to finish authentication.
    AssertionResult,
}

impl Endpoint {
    /// Path of this endpoint relative to the relying party's API root.
    pub fn path(self) -> &'static str {
        match self {
            Endpoint::AttestationOptions => "attestation/options",
            Endpoint::AttestationResult => "attestation/result",
            Endpoint::AssertionOptions => "assertion/options",
            Endpoint::AssertionResult => "assertion/result",
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// Indicator value the relying party uses for a successful ceremony.
pub const SUCCESS_STATUS: &str = "ok";

/// Prefix of the session cookie the relying party issues.
const SESSION_ID_KEY: &str = "connect.sid=";

/// The evaluated response to one ceremony call.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResult<T> {
    /// The call produced a decodable payload.
    Success {
        /// The decoded payload.
        data: T,
        /// A session id refreshed by the server through its session cookie.
        session_id: Option<String>,
    },
    /// The server no longer recognizes this session (HTTP 401); the caller
    /// must force a sign-out.
    SignedOutFromServer,
}

/// The result envelope both `*/result` endpoints produce.
///
/// The relying party reports rejection inside this envelope rather than
/// through the HTTP status line, and may also return the account's registered
/// credential list.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
#[typeshare]
pub struct CeremonyOutcome {
    /// Coarse status, `"ok"` on success.
    #[serde(default)]
    pub status: String,

    /// Server-supplied failure text; empty on success.
    #[serde(default)]
    pub error_message: String,

    /// Credentials registered for this account, when the server returns them.
    /// Entries that fail to parse are dropped, not fatal.
    #[serde(default, deserialize_with = "ignore_unknown_vec")]
    pub credentials: Vec<StoredCredential>,
}

impl CeremonyOutcome {
    /// The indicator callers act on: a non-empty [`Self::error_message`]
    /// takes precedence over [`Self::status`]. With both absent the
    /// indicator is the empty string, which is ambiguous and must never be
    /// treated as success.
    pub fn indicator(&self) -> &str {
        if self.error_message.is_empty() {
            &self.status
        } else {
            &self.error_message
        }
    }

    /// Whether the indicator equals the success value.
    pub fn is_success(&self) -> bool {
        self.indicator() == SUCCESS_STATUS
    }
}

/// Body for [`Endpoint::AttestationOptions`], opening a registration
/// ceremony for `username`.
///
/// The authenticator selection echoed here is fixed: this client registers
/// platform credentials. The server spells the nested values as strings.
pub fn attestation_options_request(username: &str) -> String {
    json!({
        "username": username,
        "userVerification": "preferred",
        "displayName": username,
        "attestation": "direct",
        "authenticatorSelection": {
            "requiresResidentKey": "false",
            "userVerification": "true",
            "authenticatorAttachment": "platform",
        },
    })
    .to_string()
}

/// Body for [`Endpoint::AssertionOptions`], opening an authentication
/// ceremony for `username`.
pub fn assertion_options_request(username: &str) -> String {
    json!({
        "username": username,
        "userVerification": "required",
    })
    .to_string()
}

/// Body for [`Endpoint::AttestationResult`]: the newly minted credential,
/// re-encoded into the exact wire shape the server verifies.
pub fn attestation_result_payload(credential: &CreatedPublicKeyCredential) -> String {
    let raw_id = encoding::base64url(&credential.raw_id);
    json!({
        "id": raw_id,
        "type": "public-key",
        "rawId": raw_id,
        "response": {
            "clientDataJSON": encoding::base64url(&credential.response.client_data_json),
            "attestationObject": encoding::base64url(&credential.response.attestation_object),
        },
    })
    .to_string()
}

/// Body for [`Endpoint::AssertionResult`]: the assertion, re-encoded into the
/// exact wire shape the server verifies. An absent user handle travels as the
/// empty string.
pub fn assertion_result_payload(credential: &AuthenticatedPublicKeyCredential) -> String {
    let raw_id = encoding::base64url(&credential.raw_id);
    let user_handle = credential
        .response
        .user_handle
        .as_ref()
        .map(|handle| encoding::base64url(handle))
        .unwrap_or_default();
    json!({
        "id": raw_id,
        "type": "public-key",
        "rawId": raw_id,
        "response": {
            "clientDataJSON": encoding::base64url(&credential.response.client_data_json),
            "authenticatorData": encoding::base64url(&credential.response.authenticator_data),
            "signature": encoding::base64url(&credential.response.signature),
            "userHandle": user_handle,
        },
    })
    .to_string()
}

/// Evaluate the response to [`Endpoint::AttestationOptions`].
pub fn creation_options(
    response: &TransportResponse,
) -> Result<ApiResult<PublicKeyCredentialCreationOptions>, CeremonyError> {
    evaluate(Endpoint::AttestationOptions, response)
}

/// Evaluate the response to [`Endpoint::AssertionOptions`].
pub fn request_options(
    response: &TransportResponse,
) -> Result<ApiResult<PublicKeyCredentialRequestOptions>, CeremonyError> {
    evaluate(Endpoint::AssertionOptions, response)
}

/// Evaluate the response to [`Endpoint::AttestationResult`].
pub fn attestation_outcome(
    response: &TransportResponse,
) -> Result<ApiResult<CeremonyOutcome>, CeremonyError> {
    evaluate(Endpoint::AttestationResult, response)
}

/// Evaluate the response to [`Endpoint::AssertionResult`].
pub fn assertion_outcome(
    response: &TransportResponse,
) -> Result<ApiResult<CeremonyOutcome>, CeremonyError> {
    evaluate(Endpoint::AssertionResult, response)
}

/// Shared evaluation: a 401 is the server-side sign-out signal; every other
/// status, success or not, routes through body decoding, because this
/// relying party reports ceremony failures in a decodable body.
fn evaluate<T: DeserializeOwned>(
    endpoint: Endpoint,
    response: &TransportResponse,
) -> Result<ApiResult<T>, CeremonyError> {
    if response.status == 401 {
        return Ok(ApiResult::SignedOutFromServer);
    }
    let data = decode(endpoint, &response.body)?;
    let session_id = response
        .set_cookie
        .as_deref()
        .and_then(session_id_from_cookie);
    Ok(ApiResult::Success { data, session_id })
}

/// Decode a response body, naming the originating call in any error.
fn decode<T: DeserializeOwned>(endpoint: Endpoint, body: &str) -> Result<T, CeremonyError> {
    if body.trim().is_empty() {
        return Err(CeremonyError::Parse {
            call: endpoint,
            message: "empty response body".to_owned(),
        });
    }
    serde_json::from_str(body).map_err(|err| CeremonyError::Parse {
        call: endpoint,
        message: err.to_string(),
    })
}

fn session_id_from_cookie(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix(SESSION_ID_KEY))
        .map(ToOwned::to_owned)
}
