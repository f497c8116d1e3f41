//! Authentication middleware that validates bearer tokens.

use axum::{
    RequestPartsExt,
    extract::{FromRef, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use jsonwebtoken::DecodingKey;

use crate::{AppState, Error, auth::token::decode_token};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key for verifying the signature of bearer tokens.
    pub decoding_key: DecodingKey,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            decoding_key: state.jwt_keys.decoding_key.clone(),
        }
    }
}

/// Middleware function that checks for a valid bearer token in the `Authorization` header.
/// The user ID is placed into request and then the request executed normally if the token is valid, otherwise a 401 response is returned.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();

    let bearer = match parts.extract::<TypedHeader<Authorization<Bearer>>>().await {
        Ok(TypedHeader(Authorization(bearer))) => bearer,
        Err(rejection) => {
            tracing::debug!("Missing or malformed authorization header: {rejection}");
            return Error::InvalidToken.into_response();
        }
    };

    let claims = match decode_token(bearer.token(), &state.decoding_key) {
        Ok(claims) => claims,
        Err(error) => return error.into_response(),
    };

    parts.extensions.insert(claims.user_id());
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
