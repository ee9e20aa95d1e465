//! The sign-in orchestrator: drives registration and authentication
//! ceremonies against the relying party and publishes the state machine.

use ceremony_types::{
    encoding,
    webauthn::{
        AuthenticatedPublicKeyCredential, CreatedPublicKeyCredential,
        PublicKeyCredentialCreationOptions, PublicKeyCredentialRequestOptions,
    },
};
use log::{debug, warn};
use tokio::sync::{watch, Mutex};

use crate::{
    api::{self, ApiResult, Endpoint},
    authenticator::AuthenticatorCapability,
    state::SignInState,
    store::{SessionUpdate, SettingsStore, StoredCredential},
    transport::Transport,
    CeremonyError,
};

/// Which ceremony is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CeremonyKind {
    Registration,
    Authentication,
}

/// Bookkeeping for the single ceremony allowed in flight: its kind, and the
/// state to restore if it is cancelled.
#[derive(Debug)]
struct PendingCeremony {
    kind: CeremonyKind,
    prior: SignInState,
}

/// Owns the authentication state machine.
///
/// One logical ceremony may be in flight per instance: starting a second
/// registration or authentication before the first resolves is rejected with
/// [`CeremonyError::CeremonyPending`]. State transitions are committed one at
/// a time and broadcast through a single-slot channel, so observers see a
/// total order of states and late subscribers receive the latest one.
///
/// Both suspension points of a ceremony (awaiting the transport and awaiting
/// the platform authenticator) are cancellable: dropping the future and then
/// calling [`Self::cancel_ceremony`] restores the pre-ceremony state rather
/// than leaving [`SignInState::SigningIn`] stuck.
pub struct SignInFlow<T, S> {
    transport: T,
    store: S,
    state: watch::Sender<SignInState>,
    pending: Mutex<Option<PendingCeremony>>,
}

impl<T, S> SignInFlow<T, S>
where
    T: Transport + Send + Sync,
    S: SettingsStore + Send + Sync,
{
    /// Create an orchestrator in the [`SignInState::SignedOut`] state.
    /// Previously persisted session data is read lazily, never used to
    /// short-circuit the initial state.
    pub fn new(transport: T, store: S) -> Self {
        let (state, _) = watch::channel(SignInState::SignedOut);
        Self {
            transport,
            store,
            state,
            pending: Mutex::new(None),
        }
    }

    /// Subscribe to state transitions. The receiver immediately holds the
    /// current state; if transitions outpace the observer only the newest is
    /// retained.
    pub fn state(&self) -> watch::Receiver<SignInState> {
        self.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn current_state(&self) -> SignInState {
        self.state.borrow().clone()
    }

    /// The credentials registered on the server, from the last committed
    /// ceremony.
    pub async fn credentials(&self) -> Result<Vec<StoredCredential>, CeremonyError> {
        Ok(self.store.read_credentials().await?)
    }

    /// The persisted username, if any.
    pub async fn username(&self) -> Result<Option<String>, CeremonyError> {
        Ok(self.store.read_username().await?)
    }

    /// Open a registration ceremony: persist the username, fetch and decode
    /// the creation options, and move to [`SignInState::SigningIn`].
    ///
    /// Returns the decoded options, the ceremony context the caller hands to
    /// the platform authenticator before calling
    /// [`Self::complete_registration`]. Returns `Ok(None)` when the server
    /// reported a sign-out, in which case the state is forced to
    /// [`SignInState::SignedOut`] instead.
    pub async fn start_registration(
        &self,
        username: &str,
    ) -> Result<Option<PublicKeyCredentialCreationOptions>, CeremonyError> {
        self.store.write_username(username).await?;
        self.begin(CeremonyKind::Registration).await?;

        let response = match self
            .transport
            .post_json(
                Endpoint::AttestationOptions,
                api::attestation_options_request(username),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.abandon().await;
                return Err(err.into());
            }
        };

        match api::creation_options(&response) {
            Ok(ApiResult::Success { data, .. }) => {
                self.emit(SignInState::SigningIn(username.to_owned()));
                Ok(Some(data))
            }
            Ok(ApiResult::SignedOutFromServer) => {
                self.abandon().await;
                self.emit(SignInState::SignedOut);
                Ok(None)
            }
            Err(err) => {
                self.abandon().await;
                Err(err)
            }
        }
    }

    /// Close a registration ceremony with the credential the platform
    /// authenticator minted for the options returned by
    /// [`Self::start_registration`].
    ///
    /// Moves to [`SignInState::SignedIn`] only when the server's decoded
    /// indicator is the success value *and* a username is persisted; any
    /// other indicator is published verbatim as
    /// [`SignInState::SignInError`]. The (session id, credential list,
    /// credential id) triple is committed atomically before the success state
    /// is visible.
    pub async fn complete_registration(
        &self,
        credential: &CreatedPublicKeyCredential,
    ) -> Result<(), CeremonyError> {
        self.take_pending(CeremonyKind::Registration).await?;

        let response = self
            .transport
            .post_json(
                Endpoint::AttestationResult,
                api::attestation_result_payload(credential),
            )
            .await?;

        match api::attestation_outcome(&response)? {
            ApiResult::SignedOutFromServer => {
                self.emit(SignInState::SignedOut);
                Ok(())
            }
            ApiResult::Success { data, session_id } => {
                // a blank username counts as unknown
                let username = self.store.read_username().await?.filter(|u| !u.is_empty());
                match username {
                    Some(username) if data.is_success() => {
                        self.store
                            .commit_session(SessionUpdate {
                                session_id,
                                credentials: data.credentials,
                                credential_id: encoding::base64url(&credential.raw_id),
                            })
                            .await?;
                        self.emit(SignInState::SignedIn(username));
                    }
                    _ => {
                        warn!("registration rejected: {}", data.indicator());
                        self.emit(SignInState::SignInError(data.indicator().to_owned()));
                    }
                }
                Ok(())
            }
        }
    }

    /// Open an authentication ceremony; the assertion mirror of
    /// [`Self::start_registration`].
    pub async fn start_authentication(
        &self,
        username: &str,
    ) -> Result<Option<PublicKeyCredentialRequestOptions>, CeremonyError> {
        self.store.write_username(username).await?;
        self.begin(CeremonyKind::Authentication).await?;

        let response = match self
            .transport
            .post_json(
                Endpoint::AssertionOptions,
                api::assertion_options_request(username),
            )
            .await
        {
            Ok(response) => response,
            Err(err) => {
                self.abandon().await;
                return Err(err.into());
            }
        };

        match api::request_options(&response) {
            Ok(ApiResult::Success { data, .. }) => {
                self.emit(SignInState::SigningIn(username.to_owned()));
                Ok(Some(data))
            }
            Ok(ApiResult::SignedOutFromServer) => {
                self.abandon().await;
                self.emit(SignInState::SignedOut);
                Ok(None)
            }
            Err(err) => {
                self.abandon().await;
                Err(err)
            }
        }
    }

    /// Close an authentication ceremony with the assertion the platform
    /// authenticator produced; the mirror of [`Self::complete_registration`].
    /// Success moves to [`SignInState::CompletedSignIn`] and persists the id
    /// of the credential used.
    pub async fn complete_authentication(
        &self,
        credential: &AuthenticatedPublicKeyCredential,
    ) -> Result<(), CeremonyError> {
        self.take_pending(CeremonyKind::Authentication).await?;

        let response = self
            .transport
            .post_json(
                Endpoint::AssertionResult,
                api::assertion_result_payload(credential),
            )
            .await?;

        match api::assertion_outcome(&response)? {
            ApiResult::SignedOutFromServer => {
                self.emit(SignInState::SignedOut);
                Ok(())
            }
            ApiResult::Success { data, session_id } => {
                // a blank username counts as unknown
                let username = self.store.read_username().await?.filter(|u| !u.is_empty());
                match username {
                    Some(username) if data.is_success() => {
                        self.store
                            .commit_session(SessionUpdate {
                                session_id,
                                credentials: data.credentials,
                                credential_id: encoding::base64url(&credential.raw_id),
                            })
                            .await?;
                        self.emit(SignInState::CompletedSignIn(username));
                    }
                    _ => {
                        warn!("authentication rejected: {}", data.indicator());
                        self.emit(SignInState::SignInError(data.indicator().to_owned()));
                    }
                }
                Ok(())
            }
        }
    }

    /// Run a full registration ceremony through the authenticator capability.
    /// Authenticator failure or cancellation restores the pre-ceremony state.
    pub async fn register<A>(&self, username: &str, authenticator: &A) -> Result<(), CeremonyError>
    where
        A: AuthenticatorCapability + Sync,
    {
        let Some(options) = self.start_registration(username).await? else {
            return Ok(());
        };
        match authenticator.create_credential(options).await {
            Ok(credential) => self.complete_registration(&credential).await,
            Err(err) => {
                self.cancel_ceremony().await;
                Err(err.into())
            }
        }
    }

    /// Run a full authentication ceremony through the authenticator
    /// capability; the mirror of [`Self::register`].
    pub async fn authenticate<A>(
        &self,
        username: &str,
        authenticator: &A,
    ) -> Result<(), CeremonyError>
    where
        A: AuthenticatorCapability + Sync,
    {
        let Some(options) = self.start_authentication(username).await? else {
            return Ok(());
        };
        match authenticator.get_assertion(options).await {
            Ok(credential) => self.complete_authentication(&credential).await,
            Err(err) => {
                self.cancel_ceremony().await;
                Err(err.into())
            }
        }
    }

    /// Clear any ceremony in flight and publish
    /// [`SignInState::SignedOut`]. Safe to call from any state, including
    /// `SignedOut`.
    pub async fn sign_out(&self) {
        self.pending.lock().await.take();
        self.emit(SignInState::SignedOut);
    }

    /// Unconditional sign-out. This is the path taken when the server
    /// reports that it no longer recognizes the session; idempotent.
    pub async fn force_sign_out(&self) {
        self.sign_out().await;
    }

    /// Abort the ceremony in flight and restore the state observed before it
    /// began. A no-op when nothing is pending.
    pub async fn cancel_ceremony(&self) {
        if let Some(pending) = self.pending.lock().await.take() {
            debug!("ceremony cancelled, restoring prior state");
            self.emit(pending.prior);
        }
    }

    async fn begin(&self, kind: CeremonyKind) -> Result<(), CeremonyError> {
        let mut pending = self.pending.lock().await;
        if pending.is_some() {
            warn!("rejecting {kind:?} ceremony: another is in flight");
            return Err(CeremonyError::CeremonyPending);
        }
        *pending = Some(PendingCeremony {
            kind,
            prior: self.current_state(),
        });
        Ok(())
    }

    async fn take_pending(&self, kind: CeremonyKind) -> Result<PendingCeremony, CeremonyError> {
        let mut pending = self.pending.lock().await;
        match pending.take() {
            Some(ceremony) if ceremony.kind == kind => Ok(ceremony),
            other => {
                *pending = other;
                Err(CeremonyError::NoPendingCeremony)
            }
        }
    }

    async fn abandon(&self) {
        self.pending.lock().await.take();
    }

    fn emit(&self, state: SignInState) {
        debug!("sign-in state -> {state:?}");
        self.state.send_replace(state);
    }
}
