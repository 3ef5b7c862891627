use std::sync::Arc;

use tokio::sync::broadcast;

use crate::{
    error::Result,
    management::storage::{FileStorage, Storage, StorageEvent},
    types::TokenRecord,
};

pub const ACCESS_TOKEN_KEY: &str = "accessToken";
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
pub const TOKEN_EXPIRATION_KEY: &str = "tokenExpiration";
pub const CODE_VERIFIER_KEY: &str = "pkce_code_verifier";

pub const TOKEN_KEYS: [&str; 4] = [
    ACCESS_TOKEN_KEY,
    REFRESH_TOKEN_KEY,
    TOKEN_EXPIRATION_KEY,
    CODE_VERIFIER_KEY,
];

/// Owns the persisted token record and the in-flight PKCE verifier.
#[derive(Clone)]
pub struct TokenStore {
    storage: Arc<dyn Storage>,
}

impl TokenStore {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        TokenStore { storage }
    }

    /// Opens the token store on the default storage file.
    pub async fn load() -> Result<Self> {
        let storage = FileStorage::open(FileStorage::default_path()).await?;
        Ok(Self::new(Arc::new(storage)))
    }

    /// Returns the stored record, or `None` when no non-empty access token is
    /// stored.
    ///
    /// An unreadable expiration counts as already expired.
    pub async fn record(&self) -> Result<Option<TokenRecord>> {
        let Some(access_token) = self.access_token().await? else {
            return Ok(None);
        };

        let refresh_token = self
            .storage
            .get(REFRESH_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty());
        let expires_at = self
            .storage
            .get(TOKEN_EXPIRATION_KEY)
            .await?
            .and_then(|raw| raw.trim().parse::<i64>().ok())
            .unwrap_or(0);

        Ok(Some(TokenRecord {
            access_token,
            refresh_token,
            expires_at,
        }))
    }

    /// Replaces the stored record as a whole.
    pub async fn save_record(&self, record: &TokenRecord) -> Result<()> {
        self.storage
            .set(TOKEN_EXPIRATION_KEY, &record.expires_at.to_string())
            .await?;
        match &record.refresh_token {
            Some(refresh_token) => self.storage.set(REFRESH_TOKEN_KEY, refresh_token).await?,
            None => self.storage.remove(REFRESH_TOKEN_KEY).await?,
        }
        // written last so a concurrent reader never sees a token without its expiry
        self.storage
            .set(ACCESS_TOKEN_KEY, &record.access_token)
            .await
    }

    pub async fn access_token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(ACCESS_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    pub async fn refresh_token(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(REFRESH_TOKEN_KEY)
            .await?
            .filter(|t| !t.is_empty()))
    }

    pub async fn code_verifier(&self) -> Result<Option<String>> {
        Ok(self
            .storage
            .get(CODE_VERIFIER_KEY)
            .await?
            .filter(|v| !v.is_empty()))
    }

    /// Stores the verifier of the login attempt in flight, replacing any
    /// verifier left behind by an abandoned attempt.
    pub async fn save_code_verifier(&self, verifier: &str) -> Result<()> {
        self.storage.set(CODE_VERIFIER_KEY, verifier).await
    }

    pub async fn remove_code_verifier(&self) -> Result<()> {
        self.storage.remove(CODE_VERIFIER_KEY).await
    }

    /// Removes tokens and verifier. Clearing an empty store is a no-op.
    pub async fn clear(&self) -> Result<()> {
        // access token first so readers stop treating the session as valid
        for key in TOKEN_KEYS {
            self.storage.remove(key).await?;
        }
        Ok(())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        for key in TOKEN_KEYS {
            if self.storage.get(key).await?.is_some() {
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
        self.storage.subscribe()
    }

    pub fn is_token_key(key: &str) -> bool {
        TOKEN_KEYS.contains(&key)
    }
}
