//! Web routes

use axum::{
    Extension, Form, Json, Router,
    extract::{Path, Query, State},
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::{
    error::{PageError, ServiceError},
    middleware::{
        CurrentSession, removal_cookie, require_session, session_cookie, session_middleware,
    },
    models::{Credentials, SubmitForm},
    state::AppState,
    views,
};

/// `?status=` flag carried across redirects
#[derive(Debug, Default, Deserialize)]
pub struct StatusQuery {
    pub status: Option<String>,
}

/// Create the router for the web service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/my_qrs", get(my_codes))
        .route("/delete_qr_code/:id", post(delete_code))
        .route_layer(middleware::from_fn(require_session));

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(index).post(submit))
        .route("/result/:id", get(show_result))
        .route("/register", get(register_form).post(register))
        .route("/login", get(login_form).post(login))
        .route("/logout", get(logout))
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "qr-web"
    }))
}

/// Recoverable errors are shown next to the form, the rest become their own page
fn inline_message(err: ServiceError) -> Result<String, PageError> {
    if err.is_internal() {
        Err(err.into())
    } else {
        Ok(err.user_message())
    }
}

fn parse_code_id(raw: &str) -> Result<Uuid, PageError> {
    Uuid::parse_str(raw).map_err(|_| PageError(ServiceError::NotFound))
}

pub async fn index(Extension(current): Extension<CurrentSession>) -> Html<String> {
    Html(views::index_page(current.is_signed_in(), None, ""))
}

/// Generate a QR code for the submitted URL
pub async fn submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Form(form): Form<SubmitForm>,
) -> Result<Response, PageError> {
    match state.codes.submit(current.session(), &form.url).await {
        Ok(code) => Ok(Redirect::to(&format!("/result/{}", code.id)).into_response()),
        Err(e) => {
            let message = inline_message(e)?;
            Ok(Html(views::index_page(
                current.is_signed_in(),
                Some(&message),
                &form.url,
            ))
            .into_response())
        }
    }
}

pub async fn show_result(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Html<String>, PageError> {
    let code_id = parse_code_id(&id)?;
    let code = state.codes.get(current.session(), code_id).await?;
    Ok(Html(views::result_page(current.is_signed_in(), &code)))
}

pub async fn my_codes(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Query(query): Query<StatusQuery>,
) -> Result<Html<String>, PageError> {
    let codes = state.codes.list_mine(current.session()).await?;
    let status = match query.status.as_deref() {
        Some("deleted") => Some("QR code deleted."),
        Some("not_found") => Some("QR Code not found"),
        _ => None,
    };
    Ok(Html(views::my_codes_page(&codes, status)))
}

pub async fn delete_code(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    Path(id): Path<String>,
) -> Result<Redirect, PageError> {
    let Ok(code_id) = Uuid::parse_str(&id) else {
        return Ok(Redirect::to("/my_qrs?status=not_found"));
    };

    match state.codes.delete(current.session(), code_id).await {
        Ok(()) => Ok(Redirect::to("/my_qrs?status=deleted")),
        Err(ServiceError::NotFound) => Ok(Redirect::to("/my_qrs?status=not_found")),
        Err(e) => Err(e.into()),
    }
}

pub async fn register_form() -> Html<String> {
    Html(views::register_page(None, ""))
}

pub async fn register(
    State(state): State<AppState>,
    Form(credentials): Form<Credentials>,
) -> Result<Response, PageError> {
    match state
        .auth
        .register(&credentials.username, &credentials.password)
        .await
    {
        Ok(_) => Ok(Redirect::to("/login?status=registered").into_response()),
        Err(e) => {
            let message = inline_message(e)?;
            Ok(Html(views::register_page(Some(&message), &credentials.username)).into_response())
        }
    }
}

pub async fn login_form(Query(query): Query<StatusQuery>) -> Html<String> {
    let status = match query.status.as_deref() {
        Some("registered") => Some("Registration successful. Please log in."),
        Some("logged_out") => Some("You have been logged out."),
        _ => None,
    };
    Html(views::login_page(None, status, ""))
}

/// Verify credentials and hand out the session cookie
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(credentials): Form<Credentials>,
) -> Result<Response, PageError> {
    match state
        .auth
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(session) => {
            let jar = jar.add(session_cookie(&session.token, state.cookie_secure));
            Ok((jar, Redirect::to("/")).into_response())
        }
        Err(e) => {
            let message = inline_message(e)?;
            Ok(Html(views::login_page(
                Some(&message),
                None,
                &credentials.username,
            ))
            .into_response())
        }
    }
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentSession>,
    jar: CookieJar,
) -> Result<Response, PageError> {
    if let Some(session) = current.session() {
        state.auth.logout(session).await?;
    }

    Ok((
        jar.remove(removal_cookie()),
        Redirect::to("/login?status=logged_out"),
    )
        .into_response())
}
