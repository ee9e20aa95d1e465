use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use ceremony_types::webauthn::{
    AuthenticatorAssertionResponse, AuthenticatorAttestationResponse, PublicKeyCredential,
    PublicKeyCredentialType,
};

use crate::{
    api::Endpoint, AuthenticatorError, CeremonyError, MemoryStore, MockAuthenticatorCapability,
    SettingsStore, SignInFlow, SignInState, Transport, TransportError, TransportResponse,
};

const CREATION_OPTIONS: &str = r#"{
    "status": "ok",
    "errorMessage": "",
    "rp": {"id": "example.org", "name": "Example"},
    "user": {"id": "MTIz", "name": "alice", "displayName": "alice"},
    "challenge": "P76voTkd3es-HD_1reQLTCu37eYMTj5_ttNk0hZJoug",
    "pubKeyCredParams": [{"type": "public-key", "alg": -7}],
    "timeout": 1000000,
    "excludeCredentials": [],
    "attestation": "direct"
}"#;

const REQUEST_OPTIONS: &str = r#"{
    "status": "ok",
    "errorMessage": "",
    "challenge": "eqV7misjj1XqbmscSdMleVl1jRQjxM3-HE1WnDC_WOQ",
    "timeout": 20000,
    "rpId": "example.org",
    "allowCredentials": [],
    "userVerification": "required"
}"#;

const RESULT_OK: &str = r#"{"status":"ok","errorMessage":""}"#;

struct StubTransport {
    responses: Mutex<VecDeque<Result<TransportResponse, TransportError>>>,
    requests: Arc<Mutex<Vec<(Endpoint, String)>>>,
}

impl StubTransport {
    fn new(responses: Vec<Result<TransportResponse, TransportError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn replying(bodies: &[&str]) -> Self {
        Self::new(bodies.iter().map(|body| Ok(ok_response(body))).collect())
    }

    fn request_log(&self) -> Arc<Mutex<Vec<(Endpoint, String)>>> {
        Arc::clone(&self.requests)
    }
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn post_json(
        &self,
        endpoint: Endpoint,
        body: String,
    ) -> Result<TransportResponse, TransportError> {
        self.requests.lock().unwrap().push((endpoint, body));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::new("no response scripted")))
    }
}

fn ok_response(body: &str) -> TransportResponse {
    TransportResponse {
        status: 200,
        body: body.to_owned(),
        set_cookie: None,
    }
}

fn created_credential() -> ceremony_types::webauthn::CreatedPublicKeyCredential {
    PublicKeyCredential {
        id: "Y3JlZC1pZA".to_owned(),
        raw_id: b"cred-id".to_vec().into(),
        ty: PublicKeyCredentialType::PublicKey,
        response: AuthenticatorAttestationResponse {
            client_data_json: b"{}".to_vec().into(),
            attestation_object: b"attestation".to_vec().into(),
        },
    }
}

fn assertion_credential() -> ceremony_types::webauthn::AuthenticatedPublicKeyCredential {
    PublicKeyCredential {
        id: "Y3JlZC1pZA".to_owned(),
        raw_id: b"cred-id".to_vec().into(),
        ty: PublicKeyCredentialType::PublicKey,
        response: AuthenticatorAssertionResponse {
            client_data_json: b"{}".to_vec().into(),
            authenticator_data: b"auth-data".to_vec().into(),
            signature: b"signature".to_vec().into(),
            user_handle: Some(b"123".to_vec().into()),
        },
    }
}

fn flow_with(
    bodies: &[&str],
) -> (SignInFlow<StubTransport, Arc<MemoryStore>>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let flow = SignInFlow::new(StubTransport::replying(bodies), Arc::clone(&store));
    (flow, store)
}

#[tokio::test]
async fn initial_state_is_signed_out() {
    let (flow, _store) = flow_with(&[]);
    assert_eq!(flow.current_state(), SignInState::SignedOut);
    assert_eq!(*flow.state().borrow(), SignInState::SignedOut);
}

#[tokio::test]
async fn registration_ceremony_reaches_signed_in() {
    let (flow, store) = flow_with(&[CREATION_OPTIONS, RESULT_OK]);

    let options = flow
        .start_registration("alice")
        .await
        .expect("options call succeeds")
        .expect("server did not sign us out");
    assert_eq!(options.challenge.len(), 32);
    assert_eq!(options.user.id.as_slice(), b"123");
    assert_eq!(flow.current_state(), SignInState::SigningIn("alice".into()));

    flow.complete_registration(&created_credential())
        .await
        .expect("result call succeeds");
    assert_eq!(flow.current_state(), SignInState::SignedIn("alice".into()));

    // the session triple was committed with the credential that was used
    assert_eq!(
        store.read_credential_id().await.unwrap().as_deref(),
        Some("Y3JlZC1pZA")
    );
    assert_eq!(store.read_username().await.unwrap().as_deref(), Some("alice"));
}

#[tokio::test]
async fn registration_posts_to_the_attestation_endpoints() {
    let transport = StubTransport::replying(&[CREATION_OPTIONS, RESULT_OK]);
    let log = transport.request_log();
    let flow = SignInFlow::new(transport, MemoryStore::new());

    flow.start_registration("alice").await.unwrap();
    flow.complete_registration(&created_credential()).await.unwrap();

    let calls: Vec<Endpoint> = log.lock().unwrap().iter().map(|(e, _)| *e).collect();
    assert_eq!(
        calls,
        [Endpoint::AttestationOptions, Endpoint::AttestationResult]
    );
}

#[tokio::test]
async fn authentication_failure_carries_the_indicator_verbatim() {
    let (flow, store) = flow_with(&[
        REQUEST_OPTIONS,
        r#"{"status":"fail","errorMessage":""}"#,
    ]);

    flow.start_authentication("alice").await.unwrap();
    flow.complete_authentication(&assertion_credential())
        .await
        .expect("a server rejection is not an Err");

    assert_eq!(flow.current_state(), SignInState::SignInError("fail".into()));
    // nothing was committed for a rejected ceremony
    assert_eq!(store.read_credential_id().await.unwrap(), None);
}

#[tokio::test]
async fn authentication_success_reaches_completed_sign_in() {
    let (flow, store) = flow_with(&[REQUEST_OPTIONS, RESULT_OK]);

    let options = flow
        .start_authentication("alice")
        .await
        .unwrap()
        .expect("options decoded");
    assert_eq!(options.rp_id, "example.org");

    flow.complete_authentication(&assertion_credential())
        .await
        .unwrap();
    assert_eq!(
        flow.current_state(),
        SignInState::CompletedSignIn("alice".into())
    );
    assert_eq!(
        store.read_credential_id().await.unwrap().as_deref(),
        Some("Y3JlZC1pZA")
    );
}

#[tokio::test]
async fn error_message_wins_end_to_end() {
    let (flow, _store) = flow_with(&[
        CREATION_OPTIONS,
        r#"{"status":"ok","errorMessage":"bad signature"}"#,
    ]);

    flow.start_registration("alice").await.unwrap();
    flow.complete_registration(&created_credential()).await.unwrap();
    assert_eq!(
        flow.current_state(),
        SignInState::SignInError("bad signature".into())
    );
}

#[tokio::test]
async fn sign_out_is_idempotent_from_every_state() {
    let (flow, _store) = flow_with(&[CREATION_OPTIONS, RESULT_OK]);

    flow.sign_out().await;
    assert_eq!(flow.current_state(), SignInState::SignedOut);

    flow.start_registration("alice").await.unwrap();
    flow.sign_out().await;
    assert_eq!(flow.current_state(), SignInState::SignedOut);

    flow.sign_out().await;
    flow.force_sign_out().await;
    assert_eq!(flow.current_state(), SignInState::SignedOut);
}

#[tokio::test]
async fn unauthorized_options_response_forces_signed_out() {
    let store = Arc::new(MemoryStore::new());
    let transport = StubTransport::new(vec![Ok(TransportResponse {
        status: 401,
        body: String::new(),
        set_cookie: None,
    })]);
    let flow = SignInFlow::new(transport, Arc::clone(&store));

    let options = flow.start_registration("alice").await.unwrap();
    assert!(options.is_none());
    assert_eq!(flow.current_state(), SignInState::SignedOut);

    // the pending slot was released: a fresh ceremony may start
    assert!(matches!(
        flow.complete_registration(&created_credential()).await,
        Err(CeremonyError::NoPendingCeremony)
    ));
}

#[tokio::test]
async fn second_ceremony_is_rejected_while_one_is_pending() {
    let (flow, _store) = flow_with(&[CREATION_OPTIONS, REQUEST_OPTIONS]);

    flow.start_registration("alice").await.unwrap();
    assert!(matches!(
        flow.start_authentication("alice").await,
        Err(CeremonyError::CeremonyPending)
    ));
    // the original ceremony is still the pending one
    assert_eq!(flow.current_state(), SignInState::SigningIn("alice".into()));
}

#[tokio::test]
async fn transport_failure_leaves_state_unchanged_and_slot_free() {
    let store = Arc::new(MemoryStore::new());
    let transport = StubTransport::new(vec![
        Err(TransportError::new("connection reset")),
        Ok(ok_response(CREATION_OPTIONS)),
    ]);
    let flow = SignInFlow::new(transport, Arc::clone(&store));

    assert!(matches!(
        flow.start_registration("alice").await,
        Err(CeremonyError::Transport(_))
    ));
    assert_eq!(flow.current_state(), SignInState::SignedOut);

    // the failed ceremony does not wedge the orchestrator
    let options = flow.start_registration("alice").await.unwrap();
    assert!(options.is_some());
}

#[tokio::test]
async fn cancel_restores_the_pre_ceremony_state() {
    let (flow, _store) = flow_with(&[CREATION_OPTIONS]);

    flow.start_registration("alice").await.unwrap();
    assert_eq!(flow.current_state(), SignInState::SigningIn("alice".into()));

    flow.cancel_ceremony().await;
    assert_eq!(flow.current_state(), SignInState::SignedOut);

    // cancelling again is a no-op
    flow.cancel_ceremony().await;
    assert_eq!(flow.current_state(), SignInState::SignedOut);
}

#[tokio::test]
async fn complete_without_start_is_rejected() {
    let (flow, _store) = flow_with(&[RESULT_OK]);
    assert!(matches!(
        flow.complete_registration(&created_credential()).await,
        Err(CeremonyError::NoPendingCeremony)
    ));

    // a pending registration does not satisfy an authentication completion
    let (flow, _store) = flow_with(&[CREATION_OPTIONS, RESULT_OK]);
    flow.start_registration("alice").await.unwrap();
    assert!(matches!(
        flow.complete_authentication(&assertion_credential()).await,
        Err(CeremonyError::NoPendingCeremony)
    ));
    // and the registration can still complete
    flow.complete_registration(&created_credential()).await.unwrap();
    assert_eq!(flow.current_state(), SignInState::SignedIn("alice".into()));
}

#[tokio::test]
async fn late_subscribers_see_only_the_latest_state() {
    let (flow, _store) = flow_with(&[CREATION_OPTIONS, RESULT_OK]);

    flow.start_registration("alice").await.unwrap();
    flow.complete_registration(&created_credential()).await.unwrap();

    // subscribed after both transitions: no history, just the newest value
    let late = flow.state();
    assert_eq!(*late.borrow(), SignInState::SignedIn("alice".into()));

    // an early subscriber that never polled sees the newest value too
    let mut early = flow.state();
    flow.sign_out().await;
    flow.force_sign_out().await;
    assert!(early.has_changed().unwrap());
    assert_eq!(*early.borrow_and_update(), SignInState::SignedOut);
}

#[tokio::test]
async fn success_state_requires_a_known_username() {
    let (flow, store) = flow_with(&[CREATION_OPTIONS, RESULT_OK]);

    flow.start_registration("alice").await.unwrap();
    // the username was blanked between start and completion
    store.write_username("").await.unwrap();

    flow.complete_registration(&created_credential()).await.unwrap();
    match flow.current_state() {
        SignInState::SignInError(_) => {}
        other => panic!("must not reach a success state without a username, got {other:?}"),
    }
}

#[tokio::test]
async fn registration_commits_the_server_credential_list() {
    let result_with_credentials = r#"{
        "status": "ok",
        "errorMessage": "",
        "credentials": [
            {"credId": "first", "publicKey": "pk1"},
            {"credId": "second", "publicKey": "pk2"}
        ]
    }"#;
    let (flow, _store) = flow_with(&[CREATION_OPTIONS, result_with_credentials]);

    flow.start_registration("alice").await.unwrap();
    flow.complete_registration(&created_credential()).await.unwrap();

    let credentials = flow.credentials().await.unwrap();
    let ids: Vec<&str> = credentials.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, ["first", "second"]);
}

#[tokio::test]
async fn cancelled_authenticator_restores_state_through_register() {
    let (flow, _store) = flow_with(&[CREATION_OPTIONS]);

    let mut authenticator = MockAuthenticatorCapability::new();
    authenticator
        .expect_create_credential()
        .returning(|_| Err(AuthenticatorError::Cancelled));

    let err = flow
        .register("alice", &authenticator)
        .await
        .expect_err("cancellation surfaces as an error");
    assert!(matches!(
        err,
        CeremonyError::Authenticator(AuthenticatorError::Cancelled)
    ));
    assert_eq!(flow.current_state(), SignInState::SignedOut);
}

#[tokio::test]
async fn full_ceremonies_through_the_capability_seam() {
    let (flow, _store) = flow_with(&[
        CREATION_OPTIONS,
        RESULT_OK,
        REQUEST_OPTIONS,
        RESULT_OK,
    ]);

    let mut authenticator = MockAuthenticatorCapability::new();
    authenticator
        .expect_create_credential()
        .withf(|options| options.user.name == "alice")
        .returning(|_| Ok(created_credential()));
    authenticator
        .expect_get_assertion()
        .withf(|options| options.rp_id == "example.org")
        .returning(|_| Ok(assertion_credential()));

    flow.register("alice", &authenticator).await.unwrap();
    assert_eq!(flow.current_state(), SignInState::SignedIn("alice".into()));

    flow.authenticate("alice", &authenticator).await.unwrap();
    assert_eq!(
        flow.current_state(),
        SignInState::CompletedSignIn("alice".into())
    );
}
