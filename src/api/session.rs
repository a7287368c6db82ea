use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use tower_cookies::Cookies;

use crate::api::handlers::AppState;
use crate::db::{self, models::Submitter};
use crate::{Error, Result};

/// The logged-in user behind a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: i64,
    pub name: Option<String>,
}

impl From<SessionUser> for Submitter {
    fn from(user: SessionUser) -> Self {
        Submitter {
            credits: user.name,
            user_num: Some(user.user_id),
        }
    }
}

/// Session lookup that tolerates anonymous requests
#[derive(Debug, Clone)]
pub struct MaybeSessionUser(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeSessionUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| Error::Internal(msg.to_string()))?;

        let Some(cookie) = cookies.get(&state.settings.session.cookie_name) else {
            return Ok(MaybeSessionUser(None));
        };

        let session = db::sessions::get_session(&state.pool, cookie.value()).await?;
        Ok(MaybeSessionUser(session.map(|s| SessionUser {
            user_id: s.user_id,
            name: s.name,
        })))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for SessionUser {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        MaybeSessionUser::from_request_parts(parts, state)
            .await?
            .0
            .ok_or_else(|| Error::Unauthorized("Login required".to_string()))
    }
}
