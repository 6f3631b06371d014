use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::UserId;
use super::repository::{RideRepository, UserRepository};
use super::service::{MatchRequest, MatchService, MatchServiceError};

/// Header carrying the authenticated caller, set by the upstream session layer.
pub const CALLER_HEADER: &str = "x-user-id";

/// Wire shape of a match request.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchRequestBody {
    #[serde(rename = "rideId")]
    pub ride_id: String,
    #[serde(rename = "useAI", default)]
    pub use_ai: bool,
}

/// Router builder exposing the host-facing match endpoint.
pub fn match_router<R, U>(service: Arc<MatchService<R, U>>) -> Router
where
    R: RideRepository + 'static,
    U: UserRepository + 'static,
{
    Router::new()
        .route("/api/v1/matches", post(match_handler::<R, U>))
        .with_state(service)
}

pub(crate) async fn match_handler<R, U>(
    State(service): State<Arc<MatchService<R, U>>>,
    headers: HeaderMap,
    payload: Result<Json<MatchRequestBody>, JsonRejection>,
) -> Response
where
    R: RideRepository + 'static,
    U: UserRepository + 'static,
{
    let Some(caller) = caller_identity(&headers) else {
        let payload = json!({ "error": "caller identity required" });
        return (StatusCode::UNAUTHORIZED, Json(payload)).into_response();
    };

    let body = match payload {
        Ok(Json(body)) => body,
        Err(rejection) => {
            let error = MatchServiceError::Validation(rejection.body_text());
            return error_response(&error);
        }
    };

    let request = match MatchRequest::parse(&body.ride_id, body.use_ai) {
        Ok(request) => request,
        Err(error) => return error_response(&error),
    };

    match service.find_matches(&caller, request).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome.response())).into_response(),
        Err(error) => error_response(&error),
    }
}

fn caller_identity(headers: &HeaderMap) -> Option<UserId> {
    headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| UserId(value.to_string()))
}

fn error_response(error: &MatchServiceError) -> Response {
    let status = match error {
        MatchServiceError::Validation(_) => StatusCode::BAD_REQUEST,
        MatchServiceError::NotFound(_) => StatusCode::NOT_FOUND,
        MatchServiceError::Forbidden => StatusCode::FORBIDDEN,
        MatchServiceError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    // Internal's Display carries no store details.
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}
