//! Database catalog models.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Request body for `POST /api/databases`.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateDatabaseRequest {
    /// Name of the database to create.
    #[serde(default)]
    #[validate(custom(
        function = "crate::utils::validate_identifier",
        message = "Invalid database name. Use only letters, numbers, and underscores."
    ))]
    pub name: String,
}

/// Payload of `GET /api/databases`.
#[derive(Debug, Serialize, ToSchema)]
pub struct DatabaseList {
    /// Database names visible to the connected principal.
    pub databases: Vec<String>,
}
