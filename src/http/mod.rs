//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, health endpoints)
//!     → request.rs (request ID)
//!     → routing layer decides upstream
//!     → proxy layer forwards and streams back
//!     → response.rs (failures → JSON error bodies)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use response::{translate, ErrorBody};
pub use server::GatewayServer;
