//! End-to-end demonstration of the sign-in ceremony flow against an
//! in-process stand-in for the relying party.

use std::sync::Arc;

use async_trait::async_trait;
use ceremony::{
    client::{
        AuthenticatorCapability, AuthenticatorError, Endpoint, MemoryStore, SettingsStore,
        SignInFlow, Transport, TransportError, TransportResponse,
    },
    types::{
        encoding,
        rand::random_vec,
        webauthn::{
            AuthenticatedPublicKeyCredential, AuthenticatorAssertionResponse,
            AuthenticatorAttestationResponse, CreatedPublicKeyCredential, PublicKeyCredential,
            PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
            PublicKeyCredentialType,
        },
        Bytes,
    },
};
use serde_json::json;

/// A relying party that issues fresh challenges and accepts every result.
struct DemoRelyingParty;

#[async_trait]
impl Transport for DemoRelyingParty {
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: String,
    ) -> Result<TransportResponse, TransportError> {
        let request: serde_json::Value =
            serde_json::from_str(&body).map_err(|err| TransportError::new(err.to_string()))?;

        let reply = match endpoint {
            Endpoint::AttestationOptions => json!({
                "status": "ok",
                "errorMessage": "",
                "rp": {"id": "demo.example.org", "name": "Demo"},
                "user": {
                    "id": encoding::base64url(&random_vec(16)),
                    "name": request["username"],
                    "displayName": request["displayName"],
                },
                "challenge": encoding::base64url(&random_vec(32)),
                "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
                "timeout": 1000000,
                "excludeCredentials": [],
                "attestation": "direct"
            }),
            Endpoint::AssertionOptions => json!({
                "status": "ok",
                "errorMessage": "",
                "challenge": encoding::base64url(&random_vec(32)),
                "timeout": 20000,
                "rpId": "demo.example.org",
                "allowCredentials": [],
                "userVerification": "required"
            }),
            Endpoint::AttestationResult | Endpoint::AssertionResult => json!({
                "status": "ok",
                "errorMessage": "",
                "credentials": [
                    {"credId": request["rawId"], "publicKey": "demo-public-key"}
                ]
            }),
        };

        Ok(TransportResponse {
            status: 200,
            body: reply.to_string(),
            set_cookie: Some("connect.sid=demo-session; Path=/; HttpOnly".to_owned()),
        })
    }
}

/// A platform authenticator stand-in minting dummy credentials.
struct DemoAuthenticator {
    credential_id: Vec<u8>,
}

fn client_data(ty: &str, challenge: &[u8]) -> Bytes {
    json!({
        "type": ty,
        "challenge": encoding::base64url(challenge),
        "origin": "https://demo.example.org",
    })
    .to_string()
    .into_bytes()
    .into()
}

#[async_trait]
impl AuthenticatorCapability for DemoAuthenticator {
    async fn create_credential(
        &self,
        options: PublicKeyCredentialCreationOptions,
    ) -> Result<CreatedPublicKeyCredential, AuthenticatorError> {
        Ok(PublicKeyCredential {
            id: encoding::base64url(&self.credential_id),
            raw_id: self.credential_id.clone().into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAttestationResponse {
                client_data_json: client_data("webauthn.create", &options.challenge),
                attestation_object: random_vec(64).into(),
            },
        })
    }

    async fn get_assertion(
        &self,
        options: PublicKeyCredentialRequestOptions,
    ) -> Result<AuthenticatedPublicKeyCredential, AuthenticatorError> {
        Ok(PublicKeyCredential {
            id: encoding::base64url(&self.credential_id),
            raw_id: self.credential_id.clone().into(),
            ty: PublicKeyCredentialType::PublicKey,
            response: AuthenticatorAssertionResponse {
                client_data_json: client_data("webauthn.get", &options.challenge),
                authenticator_data: random_vec(37).into(),
                signature: random_vec(64).into(),
                user_handle: None,
            },
        })
    }
}

#[tokio::main]
async fn main() {
    let store = Arc::new(MemoryStore::new());
    let flow = SignInFlow::new(DemoRelyingParty, Arc::clone(&store));
    let mut states = flow.state();

    let authenticator = DemoAuthenticator {
        credential_id: random_vec(16),
    };

    flow.register("alice", &authenticator)
        .await
        .expect("registration failed");
    println!("after registration:   {:?}", *states.borrow_and_update());

    flow.authenticate("alice", &authenticator)
        .await
        .expect("authentication failed");
    println!("after authentication: {:?}", *states.borrow_and_update());

    let credentials = flow.credentials().await.expect("store read failed");
    println!("credentials on server: {credentials:?}");
    let session = store.read_session_id().await.expect("store read failed");
    println!("session id: {session:?}");

    flow.sign_out().await;
    println!("after sign-out:       {:?}", *states.borrow_and_update());
}
