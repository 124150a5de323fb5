//! Session cookie resolution and access control

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use tracing::error;

use crate::{
    models::{Session, SessionToken},
    state::AppState,
};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "qr_session";

/// The session resolved for the current request, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentSession(pub Option<Session>);

impl CurrentSession {
    pub fn session(&self) -> Option<&Session> {
        self.0.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.0.is_some()
    }
}

/// Resolve the session cookie and attach a [`CurrentSession`] to the request
///
/// Unknown, expired or unreadable sessions leave the request anonymous.
pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let session = match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let token = SessionToken::from_client(cookie.value());
            match state.auth.resolve_session(&token).await {
                Ok(session) => session,
                Err(e) => {
                    error!("Failed to resolve session: {}", e);
                    None
                }
            }
        }
        None => None,
    };

    req.extensions_mut().insert(CurrentSession(session));
    next.run(req).await
}

/// Send anonymous visitors to the login page
pub async fn require_session(req: Request, next: Next) -> Response {
    let signed_in = req
        .extensions()
        .get::<CurrentSession>()
        .is_some_and(CurrentSession::is_signed_in);

    if !signed_in {
        return Redirect::to("/login").into_response();
    }

    next.run(req).await
}

/// Cookie handed out on successful login
pub fn session_cookie(token: &SessionToken, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token.as_str().to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .build()
}

/// Cookie used to clear the session on logout
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE).path("/").build()
}
