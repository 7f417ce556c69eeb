use crate::errors::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;

pub const USER_HEADER: &str = "x-user-id";
const MAX_USER_ID_LEN: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        match parts.headers.get(USER_HEADER) {
            Some(value) => {
                let raw = value
                    .to_str()
                    .map_err(|_| AppError::bad_request("x-user-id must be visible ASCII"))?;
                validate_user_id(raw).map(CurrentUser)
            }
            None => Ok(CurrentUser(state.config.default_user.clone())),
        }
    }
}

/// Ids become a store path segment.
pub fn validate_user_id(raw: &str) -> Result<String, AppError> {
    let id = raw.trim();
    if id.is_empty() || id.len() > MAX_USER_ID_LEN {
        return Err(AppError::bad_request("invalid user id"));
    }
    if id.contains(['/', '.', '#', '$', '[', ']']) || id.chars().any(char::is_control) {
        return Err(AppError::bad_request("invalid user id"));
    }
    Ok(id.to_string())
}
