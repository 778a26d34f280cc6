//! Principal (user/role) models.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Host reported for engines without host-scoped principals.
pub const HOST_NOT_APPLICABLE: &str = "N/A";

/// Host scope used by MySQL when the caller gives none.
pub const DEFAULT_USER_HOST: &str = "%";

/// One principal as reported by `GET /api/users`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserItem {
    /// Principal name.
    pub user: String,
    /// Host scope, or `N/A`.
    pub host: String,
}

/// Payload of `GET /api/users`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserList {
    /// Principals defined on the server.
    pub users: Vec<UserItem>,
}

/// Request body for `POST /api/users`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// Principal name.
    #[serde(default)]
    #[validate(custom(
        function = "crate::utils::validate_identifier",
        message = "Invalid username. Use only letters, numbers, and underscores."
    ))]
    pub username: String,
    /// Password, interpolated verbatim into the generated statement.
    #[serde(default)]
    pub password: String,
    /// Host scope (MySQL/MariaDB only, default `%`).
    #[serde(default)]
    pub host: Option<String>,
}

/// Query string of `DELETE /api/users/{username}`.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DropUserParams {
    /// Host scope (MySQL/MariaDB only, default `%`).
    pub host: Option<String>,
}

/// Resolves an optional caller-supplied host scope to the MySQL default.
pub fn user_host_or_default(host: Option<&str>) -> &str {
    match host {
        Some(h) if !h.is_empty() => h,
        _ => DEFAULT_USER_HOST,
    }
}
