//! HTTP request handlers for the board server
//!
//! Session endpoints live in `auth::handlers`; everything here sits behind
//! the session extractor.

pub mod health;
pub mod messages;
pub mod types;
pub mod users;
pub mod welcome;

pub use health::*;
pub use messages::*;
pub use users::*;
pub use welcome::*;

pub use types::*;
