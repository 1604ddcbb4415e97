//! Request DTOs.

use serde::Deserialize;

use feedback_core::error::AppError;
use feedback_core::types::{IdentityKey, PrincipalRole};

/// Query parameters of `GET /ws`.
///
/// Fields are taken as raw strings so that every malformed value is
/// reported as a validation error rather than a query rejection.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WsConnectQuery {
    /// Principal ID, a positive integer.
    pub user_id: Option<String>,
    /// Principal role code: 1, 2 or 3.
    pub user_type: Option<String>,
    /// Display name. Defaults to `User-<id>`.
    pub user_name: Option<String>,
}

impl WsConnectQuery {
    /// Validate the parameters into an identity key and display name.
    pub fn into_identity(self) -> Result<(IdentityKey, String), AppError> {
        let id = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("user_id is required"))?
            .parse::<u64>()
            .ok()
            .filter(|id| *id != 0)
            .ok_or_else(|| AppError::validation("user_id must be a positive integer"))?;

        let code = self
            .user_type
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::validation("user_type is required"))?
            .parse::<u8>()
            .map_err(|_| AppError::validation("user_type must be 1, 2 or 3"))?;
        let role = PrincipalRole::from_code(code)?;

        let name = match self.user_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("User-{id}"),
        };

        Ok((IdentityKey::new(id, role), name))
    }
}
