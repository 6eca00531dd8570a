//! Board Core - shared identity, session and configuration types
//!
//! Everything the server and the client must agree on lives here: the user
//! record, the credential format, the error taxonomy and its wire body.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
