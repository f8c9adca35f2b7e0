//! HTTPS client for the hosted backend.
//!
//! Auth calls go to `/auth/v1/*`; table reads go to `/rest/v1/*` with the
//! caller's access token so row-level security applies.

use crate::config::BackendConfig;
use crate::error::BackendError;
use crate::wire::{
    InviteBody, PasswordGrant, PasswordUpdate, PkceGrant, RefreshGrant, TokenResponse,
    classify_auth_error, classify_store_error,
};
use async_trait::async_trait;
use ataraxia_core::UserId;
use ataraxia_platform_access::{
    AuthGateway, AuthenticationError, Invitation, Profile, ProfileStore, Session, StoreError, User,
};
use reqwest::{Client, RequestBuilder, Response};
use rootcause::prelude::Report;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

/// Header carrying the project key.
const APIKEY_HEADER: &str = "apikey";

/// Client for the hosted auth and data service.
#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: Url,
    anon_key: String,
    service_role_key: SecretString,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl BackendClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the project URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, Report<BackendError>> {
        let base_url = Url::parse(config.url()).map_err(|e| BackendError::InvalidUrl {
            url: config.url().to_string(),
            details: e.to_string(),
        })?;

        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds()))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| BackendError::ClientBuild {
                details: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url,
            anon_key: config.anon_key().to_string(),
            service_role_key: config.service_role_key().clone(),
        })
    }

    /// Builds an absolute endpoint URL.
    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        url.set_path(path);
        if query.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(query);
        }
        url
    }

    /// Starts a request authenticated with the public key only.
    fn anon(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header(APIKEY_HEADER, &self.anon_key)
    }

    /// Starts a request on behalf of a signed-in user.
    fn as_user(&self, builder: RequestBuilder, access_token: &str) -> RequestBuilder {
        self.anon(builder).bearer_auth(access_token)
    }

    /// Starts a request with the privileged key.
    fn as_service(&self, builder: RequestBuilder) -> RequestBuilder {
        let key = self.service_role_key.expose_secret();
        builder.header(APIKEY_HEADER, key).bearer_auth(key)
    }

    /// Requests a token with the given grant.
    async fn token<B: Serialize + Sync>(
        &self,
        grant_type: &str,
        body: &B,
        email: Option<&str>,
    ) -> Result<Session, Report<AuthenticationError>> {
        let url = self.endpoint("/auth/v1/token", &[("grant_type", grant_type)]);
        let response = send_auth(self.anon(self.http.post(url)).json(body)).await?;
        let token: TokenResponse = read_auth(response, email).await?;
        Ok(token.into_session())
    }
}

async fn send_auth(builder: RequestBuilder) -> Result<Response, Report<AuthenticationError>> {
    Ok(builder.send().await.map_err(|e| {
        error!(error = %e, "auth service request failed");
        AuthenticationError::Transport {
            details: e.to_string(),
        }
    })?)
}

/// Checks the status and decodes a JSON body from the auth service.
async fn read_auth<T: DeserializeOwned>(
    response: Response,
    email: Option<&str>,
) -> Result<T, Report<AuthenticationError>> {
    let response = check_auth(response, email).await?;
    Ok(response.json().await.map_err(|e| {
        error!(error = %e, "failed to decode auth service response");
        AuthenticationError::InvalidResponse {
            details: e.to_string(),
        }
    })?)
}

/// Turns a non-success status into an [`AuthenticationError`].
async fn check_auth(
    response: Response,
    email: Option<&str>,
) -> Result<Response, Report<AuthenticationError>> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify_auth_error(status.as_u16(), &body, email);
    debug!(status = %status, error = %err, "auth service rejected request");
    Err(err.into())
}

async fn send_store(builder: RequestBuilder) -> Result<Response, Report<StoreError>> {
    let response = builder.send().await.map_err(|e| {
        error!(error = %e, "data service request failed");
        StoreError::Transport {
            details: e.to_string(),
        }
    })?;
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let err = classify_store_error(status.as_u16(), &body);
    warn!(status = %status, error = %err, "data service rejected request");
    Err(err.into())
}

async fn read_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, Report<StoreError>> {
    Ok(response.json().await.map_err(|e| StoreError::Decode {
        details: e.to_string(),
    })?)
}

#[async_trait]
impl AuthGateway for BackendClient {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, Report<AuthenticationError>> {
        let session = self
            .token("password", &PasswordGrant { email, password }, Some(email))
            .await?;
        info!(user_id = %session.user_id(), "signed in");
        Ok(session)
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn sign_out(&self, session: &Session) -> Result<(), Report<AuthenticationError>> {
        let url = self.endpoint("/auth/v1/logout", &[]);
        let response = send_auth(self.as_user(self.http.post(url), session.access_token())).await?;
        check_auth(response, None).await?;
        info!("signed out");
        Ok(())
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn invite_user(
        &self,
        email: &str,
        redirect_to: &str,
    ) -> Result<Invitation, Report<AuthenticationError>> {
        let url = self.endpoint("/auth/v1/invite", &[("redirect_to", redirect_to)]);
        let response =
            send_auth(self.as_service(self.http.post(url)).json(&InviteBody { email })).await?;
        let raw: serde_json::Value = read_auth(response, Some(email)).await?;
        let user: User = serde_json::from_value(raw.clone()).map_err(|e| {
            AuthenticationError::InvalidResponse {
                details: e.to_string(),
            }
        })?;
        info!(user_id = %user.id(), "invitation sent");
        Ok(Invitation { user, raw })
    }

    #[instrument(skip(self, session, new_password), fields(user_id = %session.user_id()))]
    async fn update_password(
        &self,
        session: &Session,
        new_password: &str,
    ) -> Result<User, Report<AuthenticationError>> {
        let url = self.endpoint("/auth/v1/user", &[]);
        let builder = self
            .as_user(self.http.put(url), session.access_token())
            .json(&PasswordUpdate {
                password: new_password,
            });
        let user: User = read_auth(send_auth(builder).await?, None).await?;
        info!("password updated");
        Ok(user)
    }

    #[instrument(skip_all)]
    async fn exchange_code(
        &self,
        code: &str,
        code_verifier: Option<&str>,
    ) -> Result<Session, Report<AuthenticationError>> {
        let grant = PkceGrant {
            auth_code: code,
            code_verifier,
        };
        match self.token("pkce", &grant, None).await {
            Ok(session) => {
                info!(user_id = %session.user_id(), "one-time code exchanged");
                Ok(session)
            }
            Err(report) => match report.current_context() {
                AuthenticationError::Transport { .. } => Err(report),
                other => Err(AuthenticationError::InvalidCode {
                    reason: other.to_string(),
                }
                .into()),
            },
        }
    }

    #[instrument(skip_all)]
    async fn refresh_session(
        &self,
        refresh_token: &str,
    ) -> Result<Session, Report<AuthenticationError>> {
        let session = self
            .token("refresh_token", &RefreshGrant { refresh_token }, None)
            .await?;
        debug!(user_id = %session.user_id(), "session refreshed");
        Ok(session)
    }

    #[instrument(skip_all)]
    async fn get_user(&self, access_token: &str) -> Result<User, Report<AuthenticationError>> {
        let url = self.endpoint("/auth/v1/user", &[]);
        let response = send_auth(self.as_user(self.http.get(url), access_token)).await?;
        read_auth(response, None).await
    }
}

#[async_trait]
impl ProfileStore for BackendClient {
    #[instrument(skip(self, session), fields(id = %id))]
    async fn find_profile(
        &self,
        session: &Session,
        id: UserId,
    ) -> Result<Option<Profile>, Report<StoreError>> {
        let filter = format!("eq.{id}");
        let url = self.endpoint("/rest/v1/profiles", &[("select", "*"), ("id", &filter)]);
        let response = send_store(self.as_user(self.http.get(url), session.access_token())).await?;
        let rows: Vec<Profile> = read_rows(response).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, session), fields(user_id = %session.user_id()))]
    async fn list_profiles(&self, session: &Session) -> Result<Vec<Profile>, Report<StoreError>> {
        let url = self.endpoint(
            "/rest/v1/profiles",
            &[("select", "*"), ("order", "created_at.desc")],
        );
        let response = send_store(self.as_user(self.http.get(url), session.access_token())).await?;
        let rows: Vec<Profile> = read_rows(response).await?;
        debug!(count = rows.len(), "listed profiles");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(url: &str) -> BackendClient {
        let config = BackendConfig::new(
            url.to_string(),
            "anon".to_string(),
            SecretString::from("service"),
        );
        BackendClient::new(&config).expect("client")
    }

    #[test]
    fn rejects_invalid_url() {
        let config = BackendConfig::new(
            "not a url".to_string(),
            "anon".to_string(),
            SecretString::from("service"),
        );
        let err = BackendClient::new(&config).expect_err("invalid url");
        assert!(matches!(
            err.current_context(),
            BackendError::InvalidUrl { .. }
        ));
    }

    #[test]
    fn endpoint_replaces_path_and_encodes_query() {
        let client = client("https://example.supabase.co/");
        let url = client.endpoint(
            "/auth/v1/invite",
            &[(
                "redirect_to",
                "https://app.example/auth/callback?next=/update-password",
            )],
        );
        assert_eq!(url.path(), "/auth/v1/invite");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![(
                "redirect_to".to_string(),
                "https://app.example/auth/callback?next=/update-password".to_string()
            )]
        );
    }

    #[test]
    fn profile_filter_uses_postgrest_syntax() {
        let client = client("https://example.supabase.co");
        let id: UserId = "00000000-0000-0000-0000-000000000001".parse().expect("id");
        let filter = format!("eq.{id}");
        let url = client.endpoint("/rest/v1/profiles", &[("select", "*"), ("id", &filter)]);
        assert_eq!(
            url.query(),
            Some("select=*&id=eq.00000000-0000-0000-0000-000000000001")
        );
    }

    #[test]
    fn debug_hides_keys() {
        let client = client("https://example.supabase.co");
        let debug = format!("{client:?}");
        assert!(!debug.contains("service"));
        assert!(!debug.contains("anon"));
    }

    #[tokio::test]
    async fn unreachable_service_is_a_transport_error() {
        let client = client("http://127.0.0.1:9");
        let err = client
            .sign_in("a@b.com", "secret")
            .await
            .expect_err("should fail");
        assert!(matches!(
            err.current_context(),
            AuthenticationError::Transport { .. }
        ));
    }
}
