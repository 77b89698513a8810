// ── Authentication ──

use secrecy::SecretString;
use serde_json::json;
use tracing::{debug, info};

use kumly_api::CallContext;

use super::Session;
use crate::error::CoreError;

impl Session {
    /// Log in with username and password, plus a TOTP code when two-factor
    /// authentication is enabled on the account.
    pub async fn login(
        &self,
        ctx: &CallContext,
        username: &str,
        password: &str,
        totp: Option<&str>,
    ) -> Result<(), CoreError> {
        let response = self
            .request(
                ctx,
                "login",
                vec![json!({
                    "username": username,
                    "password": password,
                    "token": totp.unwrap_or_default(),
                })],
            )
            .await?;

        if response.flag("tokenRequired") {
            return Err(CoreError::TwoFactorRequired);
        }
        if !response.ok {
            return Err(CoreError::AuthenticationFailed {
                message: response.message().to_owned(),
            });
        }

        let token: String = response.field("token")?;
        self.lock_state().token = Some(SecretString::from(token));
        info!(username, "logged in");
        Ok(())
    }

    /// Re-authenticate with a JWT from an earlier login.
    pub async fn login_by_token(&self, ctx: &CallContext, token: &str) -> Result<(), CoreError> {
        let response = self.request(ctx, "loginByToken", vec![json!(token)]).await?;
        if !response.ok {
            return Err(CoreError::AuthenticationFailed {
                message: response.message().to_owned(),
            });
        }
        self.lock_state().token = Some(SecretString::from(token.to_owned()));
        debug!("authenticated with stored token");
        Ok(())
    }

    /// Invalidate the server-side login. The connection stays open.
    pub async fn logout(&self, ctx: &CallContext) -> Result<(), CoreError> {
        self.ensure_open()?;
        // The acknowledgment carries no envelope.
        self.inner.emitter.request_raw(ctx, "logout", Vec::new()).await?;
        self.lock_state().token = None;
        info!("logged out");
        Ok(())
    }

    /// Ask whether two-factor authentication is enabled for the account.
    pub async fn two_factor_status(&self, ctx: &CallContext) -> Result<bool, CoreError> {
        let response = self.emit(ctx, "twoFAStatus", Vec::new()).await?;
        let enabled: bool = response.field("status")?;
        self.lock_state().two_factor_enabled = enabled;
        Ok(enabled)
    }
}
