use axum::{body::Bytes, http::StatusCode, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    models::user::UserRecord,
    services::session::SessionJar,
};

/// Response for `GET /api/user`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct UserResponse {
    pub user: Option<UserRecord>,
}

/// Response for `GET /api/user/init`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct InitResponse {
    pub ok: bool,
    pub initialized: bool,
}

/// Response for `POST /api/user`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct SaveResponse {
    pub ok: bool,
    pub saved: bool,
}

/// Response for `POST /api/user/logout`.
#[derive(Serialize, Deserialize, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub ok: bool,
    pub logged_out: bool,
}

/// Initializes the session cookie with an encrypted `null`.
pub async fn init_user(jar: SessionJar) -> Result<impl IntoResponse> {
    tracing::debug!("🍪 Initializing session cookie");
    jar.init_session()?;

    Ok((
        StatusCode::OK,
        Json(InitResponse {
            ok: true,
            initialized: true,
        }),
    ))
}

/// Returns the user stored in the session cookie, or `null`.
pub async fn get_user(jar: SessionJar) -> Json<UserResponse> {
    let user = jar.get_session().into_user();
    tracing::debug!("🔍 Session read: {}", if user.is_some() { "user" } else { "anonymous" });

    Json(UserResponse { user })
}

/// Stores the request body in the session cookie.
///
/// Bodies that are not a JSON object are stored as `null`.
pub async fn set_user(jar: SessionJar, body: Bytes) -> Result<impl IntoResponse> {
    let payload = parse_payload(&body);
    jar.set_session(payload.as_ref())?;

    Ok((
        StatusCode::OK,
        Json(SaveResponse {
            ok: true,
            saved: true,
        }),
    ))
}

/// Expires the session cookie.
pub async fn logout(jar: SessionJar) -> impl IntoResponse {
    jar.remove_session();

    (
        StatusCode::OK,
        Json(LogoutResponse {
            ok: true,
            logged_out: true,
        }),
    )
}

fn parse_payload(body: &[u8]) -> Option<UserRecord> {
    match serde_json::from_slice::<serde_json::Value>(body) {
        Ok(value) => UserRecord::from_value(value),
        Err(e) => {
            tracing::debug!("⚠️ Session body is not JSON, storing null: {}", e);
            None
        }
    }
}
