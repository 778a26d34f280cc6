//! Shared data models.

pub mod connection;
pub mod database;
pub mod query;
pub mod user;

// Re-export commonly used types
pub use connection::{
    ConnectionInfo, ConnectionParams, DbType, TestConnectionData, TestConnectionRequest,
};
pub use database::{CreateDatabaseRequest, DatabaseList};
pub use query::{QueryRequest, QueryResult};
pub use user::{CreateUserRequest, DropUserParams, UserItem, UserList};
