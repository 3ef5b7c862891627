use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::{
    config::SpotifyConfig,
    error::{ClientError, Result},
    management::TokenStore,
    types::{OAuthErrorResponse, PkcePair, TokenRecord, TokenResponse},
    utils,
};

const TOKEN_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client for the Spotify accounts service: builds the PKCE login URL,
/// exchanges authorization codes and refreshes access tokens.
///
/// Results are written to the [`TokenStore`]; the client holds no token
/// state of its own.
#[derive(Clone)]
pub struct OAuthClient {
    config: SpotifyConfig,
    http: Client,
    store: TokenStore,
}

impl OAuthClient {
    pub fn new(config: SpotifyConfig, store: TokenStore) -> Self {
        let http = Client::builder()
            .timeout(TOKEN_REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            config,
            http,
            store,
        }
    }

    pub fn config(&self) -> &SpotifyConfig {
        &self.config
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Generates a fresh PKCE pair using the configured verifier length.
    pub fn generate_pkce(&self) -> Result<PkcePair> {
        let verifier = utils::generate_code_verifier(self.config.verifier_length)?;
        let challenge = utils::generate_code_challenge(&verifier);
        Ok(PkcePair {
            verifier,
            challenge,
        })
    }

    /// Builds the authorization URL the user has to visit.
    ///
    /// Stores the new verifier in the token store, replacing the verifier of
    /// any earlier attempt, so only the most recent login can be completed.
    ///
    /// # Errors
    ///
    /// Fails when the authorize endpoint is not a valid URL, the configured
    /// verifier length is out of range or the verifier cannot be stored.
    pub async fn build_login_url(&self) -> Result<Url> {
        let pkce = self.generate_pkce()?;

        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("response_type", "code"),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("scope", self.config.scope.as_str()),
                ("code_challenge_method", "S256"),
                ("code_challenge", pkce.challenge.as_str()),
            ],
        )
        .map_err(|e| ClientError::Config(format!("invalid authorize url: {e}")))?;

        self.store.save_code_verifier(&pkce.verifier).await?;
        Ok(url)
    }

    /// Exchanges an authorization code for a token record.
    ///
    /// Requires the verifier stored by [`OAuthClient::build_login_url`]. On
    /// success the record replaces whatever was stored and the verifier is
    /// removed. Authorization codes are single use, so a failed exchange is
    /// never retried.
    ///
    /// # Errors
    ///
    /// - [`ClientError::MissingVerifier`] when no login is in flight; the
    ///   store is left untouched.
    /// - [`ClientError::TokenExchangeFailed`] with the provider's error
    ///   description for any other failure.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord> {
        let verifier = self
            .store
            .code_verifier()
            .await?
            .ok_or(ClientError::MissingVerifier)?;

        let response = self
            .request_token(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("client_id", self.config.client_id.as_str()),
                ("code_verifier", verifier.as_str()),
            ])
            .await
            .map_err(ClientError::TokenExchangeFailed)?;

        let record = TokenRecord {
            access_token: response.access_token,
            refresh_token: response.refresh_token.filter(|t| !t.is_empty()),
            expires_at: utils::expires_at(response.expires_in),
        };

        self.store.save_record(&record).await?;
        self.store.remove_code_verifier().await?;
        Ok(record)
    }

    /// Trades the stored refresh token for a new access token.
    ///
    /// The stored record is replaced. The refresh token is rotated only when
    /// the provider returns a new one.
    ///
    /// # Errors
    ///
    /// - [`ClientError::NoRefreshToken`] when no refresh token is stored.
    /// - [`ClientError::RefreshFailed`] when the provider rejects the request.
    ///   The refresh token is unusable afterwards.
    pub async fn refresh(&self) -> Result<TokenRecord> {
        let refresh_token = self
            .store
            .refresh_token()
            .await?
            .ok_or(ClientError::NoRefreshToken)?;

        let response = self
            .request_token(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", refresh_token.as_str()),
                ("client_id", self.config.client_id.as_str()),
            ])
            .await
            .map_err(ClientError::RefreshFailed)?;

        let record = TokenRecord {
            access_token: response.access_token,
            refresh_token: response
                .refresh_token
                .filter(|t| !t.is_empty())
                .or(Some(refresh_token)),
            expires_at: utils::expires_at(response.expires_in),
        };

        self.store.save_record(&record).await?;
        Ok(record)
    }

    /// Posts a form to the token endpoint. Errors carry the provider's
    /// description when it sent one.
    async fn request_token(
        &self,
        form: &[(&str, &str)],
    ) -> std::result::Result<TokenResponse, String> {
        let res = self
            .http
            .post(&self.config.token_url)
            .form(form)
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(match serde_json::from_str::<OAuthErrorResponse>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("HTTP {}", status.as_u16()),
            });
        }

        let token: TokenResponse = res.json().await.map_err(|e| e.to_string())?;
        if token.access_token.is_empty() {
            return Err("response did not contain an access token".to_string());
        }
        Ok(token)
    }
}
