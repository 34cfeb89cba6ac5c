//! Identity extraction from gateway-supplied headers.
//!
//! The engine sits behind a gateway that has already authenticated the
//! caller; the gateway forwards the verified claims as headers. Requests
//! without the subject and organization headers are rejected before any
//! handler runs.

use axum::extract::Request;
use axum::http::{HeaderMap, header};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use uuid::Uuid;

use entiva_core::{ActorIdentity, AppError, Etag, OrgId};

use crate::error::ApiError;

const SUBJECT_HEADER: &str = "x-entiva-subject";
const DISPLAY_NAME_HEADER: &str = "x-entiva-display-name";
const ORG_HEADER: &str = "x-entiva-org";
const GROUPS_HEADER: &str = "x-entiva-groups";
const ADMIN_HEADER: &str = "x-entiva-admin";

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Result<Option<&'a str>, ApiError> {
    match headers.get(name) {
        None => Ok(None),
        Some(value) => value.to_str().map(Some).map_err(|_| {
            ApiError(AppError::Unauthorized(format!(
                "header '{name}' is not valid UTF-8"
            )))
        }),
    }
}

fn identity_from_headers(headers: &HeaderMap) -> Result<ActorIdentity, ApiError> {
    let subject = header_value(headers, SUBJECT_HEADER)?
        .map(str::trim)
        .filter(|subject| !subject.is_empty())
        .ok_or_else(|| {
            ApiError(AppError::Unauthorized(format!(
                "header '{SUBJECT_HEADER}' is required"
            )))
        })?;

    let org_id = header_value(headers, ORG_HEADER)?
        .and_then(|value| Uuid::parse_str(value.trim()).ok())
        .map(OrgId::from_uuid)
        .ok_or_else(|| {
            ApiError(AppError::Unauthorized(format!(
                "header '{ORG_HEADER}' must carry the organization UUID"
            )))
        })?;

    let display_name = header_value(headers, DISPLAY_NAME_HEADER)?
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(subject);

    let group_ids = header_value(headers, GROUPS_HEADER)?
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|group| !group.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    let is_administrator = header_value(headers, ADMIN_HEADER)?
        .is_some_and(|value| value.trim().eq_ignore_ascii_case("true"));

    Ok(ActorIdentity::new(
        subject,
        display_name,
        org_id,
        group_ids,
        is_administrator,
    ))
}

/// Rejects requests without a forwarded identity, attaches it otherwise.
pub async fn require_identity(mut request: Request, next: Next) -> Response {
    match identity_from_headers(request.headers()) {
        Ok(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Err(error) => error.into_response(),
    }
}

/// Reads the `If-Match` header carrying the expected etag for a
/// compare-and-swap mutation.
pub fn expected_etag(headers: &HeaderMap) -> Result<Etag, ApiError> {
    let value = headers
        .get(header::IF_MATCH)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().trim_matches('"'))
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            ApiError(AppError::Validation(
                "the If-Match header must carry the current etag".to_owned(),
            ))
        })?;

    Etag::from_value(value).map_err(ApiError::from)
}
