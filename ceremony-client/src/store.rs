//! The durable settings seam: the small key/value surface the sign-in flow
//! persists, and the record codec for the credential list.
//!
//! Four logical keys exist: the username, the server session id, the set of
//! credentials registered on the server, and the id of the credential last
//! used on this device. The last three form one unit: they are only ever
//! written together, after a verified success indicator, via
//! [`SettingsStore::commit_session`].

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use typeshare::typeshare;

/// A failure of the durable settings store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageError {
    message: String,
}

impl StorageError {
    /// Create an error with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for StorageError {}

/// Summary of a credential registered on the server, as returned by the
/// result endpoints and as persisted locally.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[typeshare]
pub struct StoredCredential {
    /// Credential id, base64url text.
    #[serde(rename = "credId", alias = "id")]
    pub id: String,

    /// Credential public key as conveyed by the server.
    #[serde(default, rename = "publicKey")]
    pub public_key: String,
}

/// The unit committed atomically when a ceremony completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUpdate {
    /// Refreshed session id; `None` leaves the stored value untouched.
    pub session_id: Option<String>,
    /// The credential list reported by the server, replacing the stored one.
    pub credentials: Vec<StoredCredential>,
    /// The id of the credential this ceremony used or created.
    pub credential_id: String,
}

/// Durable key/value storage for the sign-in flow.
///
/// Implementations persist the credential list in the record format of
/// [`encode_records`]/[`parse_records`] so that insertion order survives an
/// unordered backing store.
#[async_trait]
pub trait SettingsStore {
    /// The username of the account being signed in, if one was ever saved.
    async fn read_username(&self) -> Result<Option<String>, StorageError>;

    /// Save the username of the account being signed in.
    async fn write_username(&self, username: &str) -> Result<(), StorageError>;

    /// The session id from the last committed ceremony, if any.
    async fn read_session_id(&self) -> Result<Option<String>, StorageError>;

    /// The credential list from the last committed ceremony, in the server's
    /// order.
    async fn read_credentials(&self) -> Result<Vec<StoredCredential>, StorageError>;

    /// The id of the credential last used on this device, if any.
    async fn read_credential_id(&self) -> Result<Option<String>, StorageError>;

    /// Apply `update` as one unit. A crash or failure part-way through must
    /// not leave the three keys inconsistent with each other.
    async fn commit_session(&self, update: SessionUpdate) -> Result<(), StorageError>;
}

/// Encode credentials as `index;id;publicKey` records. The leading index
/// carries the list order through backing stores that only offer an
/// unordered string set.
pub fn encode_records(credentials: &[StoredCredential]) -> Vec<String> {
    credentials
        .iter()
        .enumerate()
        .map(|(index, credential)| format!("{index};{};{}", credential.id, credential.public_key))
        .collect()
}

/// Decode `index;id;publicKey` records back into an ordered credential list.
/// Records that do not split into three fields or whose index is not a number
/// are skipped.
pub fn parse_records<I>(records: I) -> Vec<StoredCredential>
where
    I: IntoIterator<Item = String>,
{
    let mut indexed: Vec<(usize, StoredCredential)> = records
        .into_iter()
        .filter_map(|record| {
            let mut fields = record.splitn(3, ';');
            let index: usize = fields.next()?.parse().ok()?;
            let id = fields.next()?.to_owned();
            let public_key = fields.next()?.to_owned();
            Some((index, StoredCredential { id, public_key }))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    indexed
        .into_iter()
        .map(|(_, credential)| credential)
        .collect()
}

#[async_trait]
impl<S> SettingsStore for std::sync::Arc<S>
where
    S: SettingsStore + Send + Sync,
{
    async fn read_username(&self) -> Result<Option<String>, StorageError> {
        (**self).read_username().await
    }

    async fn write_username(&self, username: &str) -> Result<(), StorageError> {
        (**self).write_username(username).await
    }

    async fn read_session_id(&self) -> Result<Option<String>, StorageError> {
        (**self).read_session_id().await
    }

    async fn read_credentials(&self) -> Result<Vec<StoredCredential>, StorageError> {
        (**self).read_credentials().await
    }

    async fn read_credential_id(&self) -> Result<Option<String>, StorageError> {
        (**self).read_credential_id().await
    }

    async fn commit_session(&self, update: SessionUpdate) -> Result<(), StorageError> {
        (**self).commit_session(update).await
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    username: Option<String>,
    session_id: Option<String>,
    credentials: Vec<String>,
    credential_id: Option<String>,
}

/// In-memory [`SettingsStore`].
///
/// Useful for tests and examples.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryInner>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn read_username(&self) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().await.username.clone())
    }

    async fn write_username(&self, username: &str) -> Result<(), StorageError> {
        self.inner.lock().await.username = Some(username.to_owned());
        Ok(())
    }

    async fn read_session_id(&self) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().await.session_id.clone())
    }

    async fn read_credentials(&self) -> Result<Vec<StoredCredential>, StorageError> {
        let records = self.inner.lock().await.credentials.clone();
        Ok(parse_records(records))
    }

    async fn read_credential_id(&self) -> Result<Option<String>, StorageError> {
        Ok(self.inner.lock().await.credential_id.clone())
    }

    async fn commit_session(&self, update: SessionUpdate) -> Result<(), StorageError> {
        let mut inner = self.inner.lock().await;
        if let Some(session_id) = update.session_id {
            inner.session_id = Some(session_id);
        }
        inner.credentials = encode_records(&update.credentials);
        inner.credential_id = Some(update.credential_id);
        Ok(())
    }
}
