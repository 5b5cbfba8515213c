use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use jsonwebtoken::{DecodingKey, Validation, decode};

use lockebox_types::api::Claims;

use crate::auth::AppState;
use crate::error::ApiError;

/// Cookie used by browser clients; API clients send a bearer header instead.
pub const TOKEN_COOKIE: &str = "token";

/// Extract and validate the JWT from the Authorization header, falling back
/// to the httpOnly session cookie. A missing token is 401, a bad one 403.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let bearer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::to_owned);

    let token = match bearer {
        Some(token) => token,
        None => CookieJar::from_headers(req.headers())
            .get(TOKEN_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .ok_or(ApiError::MissingToken)?,
    };

    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| ApiError::InvalidToken)?;

    req.extensions_mut().insert(token_data.claims);
    Ok(next.run(req).await)
}
