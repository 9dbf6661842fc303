//! Session endpoints: login, logout and the session probe the frontend polls.

use crate::auth::SESSION_COOKIE;
use crate::errors::ServiceError;
use crate::AppState;
use axum::extract::{ConnectInfo, State};
use axum::http::HeaderMap;
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

/// Throttle key for a login attempt: proxy-forwarded address when present,
/// else the peer address.
fn client_key(headers: &HeaderMap, connect_info: Option<&ConnectInfo<SocketAddr>>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .or_else(|| connect_info.map(|info| info.0.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn session_cookie(sid: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, sid))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(body): Json<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), ServiceError> {
    let missing = || {
        ServiceError::ValidationError("Usuario y contraseña son requeridos".to_string())
    };
    let username = body
        .username
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(missing)?;
    let password = body
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(missing)?;

    let key = client_key(&headers, connect_info.as_ref());
    let (principal, sid) = state.auth.login(username, password, &key).await?;

    Ok((
        jar.add(session_cookie(sid)),
        Json(json!({ "success": true, "user": principal })),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<Value>), ServiceError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.auth.logout(cookie.value()).await?;
    }
    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    Ok((
        jar,
        Json(json!({ "success": true, "message": "Sesión cerrada correctamente" })),
    ))
}

/// 200 either way; the body says whether the session is live.
pub async fn check_auth(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<Json<Value>, ServiceError> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        if let Some(principal) = state.auth.authenticate(cookie.value()).await? {
            return Ok(Json(json!({ "authenticated": true, "user": principal })));
        }
    }
    Ok(Json(json!({ "authenticated": false })))
}
