//! Billing provider (Polka) webhooks.

use std::fmt;
use std::sync::Arc;

use chirpy_auth::credential::verify_api_key;
use chirpy_models::store::UserStore;
use serde::Deserialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::prelude::*;

/// The only event that has an effect.
pub const USER_UPGRADED: &str = "user.upgraded";

#[derive(Debug, Clone, Deserialize)]
pub struct PolkaEvent {
    pub event: String,
    pub data: PolkaEventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolkaEventData {
    pub user_id: Uuid,
}

#[derive(Clone)]
pub struct PolkaWebhook {
    users: Arc<dyn UserStore>,
    api_key: String,
}

impl fmt::Debug for PolkaWebhook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PolkaWebhook")
            .field("api_key", &"REDACTED")
            .finish_non_exhaustive()
    }
}

impl PolkaWebhook {
    pub fn new(users: Arc<dyn UserStore>, api_key: impl Into<String>) -> Self {
        Self {
            users,
            api_key: api_key.into(),
        }
    }

    /// Handles one raw event body delivered with `Authorization: ApiKey <key>`.
    ///
    /// The key is checked before the body is parsed, so an unauthenticated
    /// caller learns nothing about the payload format.
    ///
    /// # Arguments
    ///
    /// * `header` - The raw `Authorization` header, if any.
    /// * `body` - The request body as received.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the event is applied or ignored. Events other than
    /// [`USER_UPGRADED`] are acknowledged and ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Unauthorized`] for a missing or wrong key,
    /// [`Error::InvalidPayload`] for a body that is not a [`PolkaEvent`] and
    /// [`Error::UserNotFound`] when the upgraded user does not exist.
    pub fn handle(&self, header: Option<&str>, body: &[u8]) -> Result<()> {
        verify_api_key(header, &self.api_key).map_err(|err| {
            warn!("Webhook rejected: {err}");
            Error::Unauthorized
        })?;

        let event: PolkaEvent = serde_json::from_slice(body).map_err(Error::InvalidPayload)?;
        if event.event != USER_UPGRADED {
            debug!("Ignoring webhook event {}", event.event);
            return Ok(());
        }

        let user = self.users.upgrade_user(&event.data.user_id).map_err(|err| {
            if err.is_not_found() {
                Error::UserNotFound
            } else {
                Error::Models(err)
            }
        })?;
        info!("Upgraded user {}", user.id);
        Ok(())
    }
}
