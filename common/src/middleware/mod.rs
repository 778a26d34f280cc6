//! Middleware components.

pub mod request_id;
pub mod session;

// Re-export commonly used types
pub use request_id::{request_id_middleware, RequestId, REQUEST_ID_HEADER};
pub use session::{session_middleware, SessionConfig, SessionId};
