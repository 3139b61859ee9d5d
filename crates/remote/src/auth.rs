//! Cloud-backed implementation of [`AuthClient`].
//!
//! Sign-in exchanges email and password for an access token at the token
//! endpoint, then resolves the admin flag from the user's profile row. The
//! flag is captured at sign-in time; price writes re-check it server-side
//! anyway, so a stale flag can deny but never grant.

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use kover_core::auth::{AdminSession, AuthClient};
use kover_core::errors::{Error, Result};
use kover_core::prices::RemotePriceStore;

use crate::client::RemoteClient;

const TOKEN_PATH: &str = "/auth/v1/token?grant_type=password";
const LOGOUT_PATH: &str = "/auth/v1/logout";
const USER_PATH: &str = "/auth/v1/user";

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

#[derive(Debug, Serialize)]
struct PasswordUpdate<'a> {
    password: &'a str,
}

/// [`AuthClient`] backed by the remote auth endpoints.
///
/// Shares the price store client so the admin flag comes from the same
/// profile lookup that gates price writes.
pub struct RemoteAuthClient {
    client: RemoteClient,
    prices: Arc<dyn RemotePriceStore>,
}

impl RemoteAuthClient {
    pub fn new(client: RemoteClient, prices: Arc<dyn RemotePriceStore>) -> Self {
        Self { client, prices }
    }
}

#[async_trait]
impl AuthClient for RemoteAuthClient {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminSession> {
        let grant = PasswordGrant { email, password };
        let token: TokenResponse = self
            .client
            .request_json(Method::POST, TOKEN_PATH, Some(&grant), None, None)
            .await
            .map_err(|e| match e {
                // The token endpoint reports bad credentials as 400.
                Error::Network(detail) if detail.contains("400") => Error::Auth(detail),
                other => other,
            })?;

        let mut session = AdminSession::new(token.user.id, token.access_token, false);
        session.is_admin = self.prices.is_admin(&session).await;
        debug!(
            "[auth] signed in user {} (admin: {})",
            session.user_id, session.is_admin
        );
        Ok(session)
    }

    async fn sign_out(&self, session: &AdminSession) {
        let result: Result<serde_json::Value> = self
            .client
            .request_json::<(), _>(
                Method::POST,
                LOGOUT_PATH,
                None,
                Some(&session.access_token),
                None,
            )
            .await;
        if let Err(e) = result {
            // Local session state is dropped regardless; the server token
            // expires on its own.
            warn!("[auth] sign-out request failed: {e}");
        }
    }

    async fn update_password(&self, session: &AdminSession, new_password: &str) -> Result<()> {
        let update = PasswordUpdate {
            password: new_password,
        };
        let _: serde_json::Value = self
            .client
            .request_json(
                Method::PUT,
                USER_PATH,
                Some(&update),
                Some(&session.access_token),
                None,
            )
            .await?;
        Ok(())
    }
}
