use crate::{AppState, Error};
use axum::{
    extract::{FromRequestParts, Query},
    http::{header::AUTHORIZATION, request::Parts},
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use log::*;
use secrecy::ExposeSecret;
use serde::Deserialize;
use sse::connection::{SubscriberId, ANONYMOUS_SUBSCRIBER};

/// Claims the relay reads from a subscriber token. `sub` becomes the subscriber id.
#[derive(Debug, Deserialize)]
pub(crate) struct SubscriberClaims {
    pub(crate) sub: String,
}

#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// The verified identity of an event stream subscriber.
pub(crate) struct AuthenticatedSubscriber(pub SubscriberId);

impl FromRequestParts<AppState> for AuthenticatedSubscriber {
    type Rejection = Error;

    // Browsers' EventSource cannot set headers, so the token may also arrive as
    // `?token=`. A request without any token is only accepted when anonymous
    // connections are enabled; a token that fails verification never is.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let config = &state.config;

        let Some(token) = bearer_token(parts).or_else(|| query_token(parts)) else {
            if config.allow_anonymous_connections {
                debug!("Accepting anonymous event stream connection");
                return Ok(AuthenticatedSubscriber(ANONYMOUS_SUBSCRIBER.to_string()));
            }
            warn!("Rejecting event stream connection without a token");
            return Err(Error::unauthenticated("Missing subscriber token"));
        };

        let Some(secret) = config.jwt_secret() else {
            warn!("Rejecting event stream connection: no JWT secret configured");
            return Err(Error::unauthenticated(
                "Subscriber authentication unavailable",
            ));
        };

        // Validation::new checks the signature and requires an unexpired `exp`
        let claims = decode::<SubscriberClaims>(
            &token,
            &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            warn!("Rejecting event stream connection with invalid token: {e}");
            Error::unauthenticated("Invalid subscriber token")
        })?
        .claims;

        if claims.sub.is_empty() {
            return Err(Error::unauthenticated("Subscriber token has no subject"));
        }
        // The sentinel is reserved for tokenless connections
        if claims.sub == ANONYMOUS_SUBSCRIBER {
            warn!("Rejecting event stream token claiming the anonymous subscriber id");
            return Err(Error::unauthenticated("Subscriber token has a reserved subject"));
        }

        trace!("Verified event stream subscriber {}", claims.sub);
        Ok(AuthenticatedSubscriber(claims.sub))
    }
}

fn bearer_token(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn query_token(parts: &Parts) -> Option<String> {
    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}
