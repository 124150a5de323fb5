//! Domain models

pub mod code;
pub mod session;
pub mod user;

// Re-export for convenience
pub use code::{GeneratedCode, ImagePayload, NewCode, SubmitForm};
pub use session::{Session, SessionToken};
pub use user::{Credentials, NewUser, User};
