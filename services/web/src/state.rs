//! Application state shared across handlers

use crate::{auth::AuthService, codes::CodeService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub codes: CodeService,
    /// Set the `Secure` flag on the session cookie
    pub cookie_secure: bool,
}
