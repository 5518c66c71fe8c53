use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::access::{ActorClaims, ActorRole, PipelineAuthority};
use super::audit;
use super::domain::{ApplicationId, ApplicationStatus, ApplicationSubmission, JobPostingId};
use super::notification::StatusNotifier;
use super::repository::ApplicationRepository;
use super::service::{ApplicationPipelineService, ApplicationServiceError};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// Router builder exposing the application pipeline over HTTP.
pub fn application_router<R, N>(service: Arc<ApplicationPipelineService<R, N>>) -> Router
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    Router::new()
        .route("/api/v1/applications", post(submit_handler::<R, N>))
        .route(
            "/api/v1/applications/:application_id",
            get(application_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/status",
            patch(change_status_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/history",
            get(history_handler::<R, N>),
        )
        .route(
            "/api/v1/applications/:application_id/notes",
            put(notes_handler::<R, N>),
        )
        .route(
            "/api/v1/postings/:posting_id/applications",
            get(pipeline_handler::<R, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChangeRequest {
    pub(crate) status: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesRequest {
    #[serde(default)]
    pub(crate) notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct HistoryQuery {
    #[serde(default)]
    pub(crate) format: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PipelineQuery {
    #[serde(default)]
    pub(crate) status: Option<String>,
}

pub(crate) async fn submit_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    payload: Result<Json<ApplicationSubmission>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    let Json(submission) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };

    match service.submit(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record.summary())).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn application_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    match service.get(&ApplicationId(application_id)) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn change_status_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    let authority = match authority_from_headers(&headers) {
        Ok(authority) => authority,
        Err(denied) => return denied.into_response(),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };
    let requested = match request.status.parse::<ApplicationStatus>() {
        Ok(status) => status,
        Err(err) => return ApplicationServiceError::from(err).into_response(),
    };

    let id = ApplicationId(application_id);
    match service.change_status(&id, requested, &authority).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn history_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    Path(application_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    let records = match service.history(&ApplicationId(application_id)) {
        Ok(records) => records,
        Err(err) => return err.into_response(),
    };

    match query.format.as_deref().map(str::to_ascii_lowercase).as_deref() {
        None | Some("json") => (StatusCode::OK, Json(records)).into_response(),
        Some("csv") => match audit::history_csv(&records) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(err) => {
                error!(error = %err, "audit CSV export failed");
                internal_error()
            }
        },
        Some(other) => ApplicationServiceError::MalformedInput(format!(
            "unsupported history format '{other}'"
        ))
        .into_response(),
    }
}

pub(crate) async fn notes_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    Path(application_id): Path<String>,
    headers: HeaderMap,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    let authority = match authority_from_headers(&headers) {
        Ok(authority) => authority,
        Err(denied) => return denied.into_response(),
    };
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return malformed_body(rejection),
    };

    match service.annotate(&ApplicationId(application_id), request.notes, &authority) {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(err) => err.into_response(),
    }
}

pub(crate) async fn pipeline_handler<R, N>(
    State(service): State<Arc<ApplicationPipelineService<R, N>>>,
    Path(posting_id): Path<String>,
    Query(query): Query<PipelineQuery>,
) -> Response
where
    R: ApplicationRepository + 'static,
    N: StatusNotifier + 'static,
{
    let status = match query.status.as_deref().map(str::parse::<ApplicationStatus>) {
        None => None,
        Some(Ok(status)) => Some(status),
        Some(Err(err)) => return ApplicationServiceError::from(err).into_response(),
    };

    match service.pipeline(&JobPostingId(posting_id), status) {
        Ok(records) => {
            let summaries: Vec<_> = records.iter().map(|record| record.summary()).collect();
            (StatusCode::OK, Json(summaries)).into_response()
        }
        Err(err) => err.into_response(),
    }
}

/// Caller could not be granted pipeline authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum AccessDenied {
    Unauthenticated(String),
    Forbidden,
}

impl IntoResponse for AccessDenied {
    fn into_response(self) -> Response {
        match self {
            AccessDenied::Unauthenticated(message) => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": message, "code": "UNAUTHENTICATED" })),
            )
                .into_response(),
            AccessDenied::Forbidden => (
                StatusCode::FORBIDDEN,
                Json(json!({
                    "error": "only company or admin accounts may manage applications",
                    "code": "FORBIDDEN",
                })),
            )
                .into_response(),
        }
    }
}

pub(crate) fn authority_from_headers(headers: &HeaderMap) -> Result<PipelineAuthority, AccessDenied> {
    let header_value = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    let actor_id = header_value(ACTOR_ID_HEADER)
        .ok_or_else(|| AccessDenied::Unauthenticated(format!("missing {ACTOR_ID_HEADER} header")))?;
    let role = header_value(ACTOR_ROLE_HEADER)
        .ok_or_else(|| {
            AccessDenied::Unauthenticated(format!("missing {ACTOR_ROLE_HEADER} header"))
        })?
        .parse::<ActorRole>()
        .map_err(AccessDenied::Unauthenticated)?;

    ActorClaims::new(actor_id, role)
        .pipeline_authority()
        .ok_or(AccessDenied::Forbidden)
}

fn malformed_body(rejection: JsonRejection) -> Response {
    ApplicationServiceError::MalformedInput(rejection.body_text()).into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "error": "internal error", "code": "INTERNAL_ERROR" })),
    )
        .into_response()
}

impl IntoResponse for ApplicationServiceError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, payload) = match self {
            ApplicationServiceError::MalformedInput(_) => (
                StatusCode::BAD_REQUEST,
                json!({ "error": message, "code": "MALFORMED_INPUT" }),
            ),
            ApplicationServiceError::NotFound(application_id) => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": message,
                    "code": "APPLICATION_NOT_FOUND",
                    "application_id": application_id,
                }),
            ),
            ApplicationServiceError::InvalidTransition {
                application_id,
                current,
                attempted,
                reason,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": message,
                    "code": "STATUS_TRANSITION_NOT_ALLOWED",
                    "reason": reason.code(),
                    "application_id": application_id,
                    "current_status": current,
                    "attempted_status": attempted,
                }),
            ),
            ApplicationServiceError::ConcurrentModification {
                application_id,
                stored,
                attempted,
            } => (
                StatusCode::CONFLICT,
                json!({
                    "error": message,
                    "code": "CONCURRENT_MODIFICATION",
                    "application_id": application_id,
                    "current_status": stored,
                    "attempted_status": attempted,
                }),
            ),
            ApplicationServiceError::Persistence(err) => {
                error!(error = %err, "application pipeline persistence failure");
                return internal_error();
            }
        };

        (status, Json(payload)).into_response()
    }
}
