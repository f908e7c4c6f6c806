use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

use super::ballot::VoteRequest;
use super::export::EXPORT_FILENAME;
use super::service::{PollService, PollServiceError};
use super::store::BallotStore;
use super::views::{BallotView, ResultsView};
use crate::error::AppError;

const VOTED_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 90;

/// Router exposing ballot submission, results, CSV export, and the admin reset.
pub fn poll_router<S>(service: Arc<PollService<S>>) -> Router
where
    S: BallotStore + 'static,
{
    Router::new()
        .route("/", get(ballot_handler::<S>))
        .route("/vote", post(vote_handler::<S>))
        .route("/results", get(results_handler::<S>))
        .route("/export.csv", get(export_handler::<S>))
        .route("/reset", get(reset_handler::<S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResetParams {
    #[serde(default)]
    pub(crate) token: String,
}

pub(crate) async fn ballot_handler<S>(
    State(service): State<Arc<PollService<S>>>,
) -> Json<BallotView>
where
    S: BallotStore + 'static,
{
    Json(BallotView::new(service.config()))
}

pub(crate) async fn vote_handler<S>(
    State(service): State<Arc<PollService<S>>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response
where
    S: BallotStore + 'static,
{
    let config = service.config();
    if config.single_vote() && has_voted(&headers, config.cookie_name()) {
        warn!("duplicate vote refused by cookie");
        let payload = json!({ "ok": false, "msg": "this browser has already voted" });
        return (StatusCode::TOO_MANY_REQUESTS, Json(payload)).into_response();
    }

    let request = VoteRequest::from_body(&body);
    match run_blocking(&service, move |poll| poll.submit(request.order)).await {
        Ok(_) => {
            let mut response = Json(json!({ "ok": true })).into_response();
            if config.single_vote() {
                let cookie = format!(
                    "{}=1; Max-Age={VOTED_COOKIE_MAX_AGE}; Path=/; SameSite=Lax",
                    config.cookie_name()
                );
                if let Ok(value) = HeaderValue::from_str(&cookie) {
                    response.headers_mut().insert(header::SET_COOKIE, value);
                }
            }
            response
        }
        Err(PollServiceError::InvalidBallot(err)) => {
            let payload = json!({ "ok": false, "msg": err.to_string() });
            (StatusCode::BAD_REQUEST, Json(payload)).into_response()
        }
        Err(other) => {
            error!(error = %other, "failed to record ballot");
            let payload = json!({ "ok": false, "msg": other.to_string() });
            (other.status_code(), Json(payload)).into_response()
        }
    }
}

pub(crate) async fn results_handler<S>(
    State(service): State<Arc<PollService<S>>>,
) -> Result<Json<ResultsView>, AppError>
where
    S: BallotStore + 'static,
{
    let results = run_blocking(&service, |poll| poll.results())
        .await
        .inspect_err(|err| {
            error!(error = %err, "failed to compute results");
        })?;
    Ok(Json(results))
}

pub(crate) async fn export_handler<S>(
    State(service): State<Arc<PollService<S>>>,
) -> Result<Response, AppError>
where
    S: BallotStore + 'static,
{
    let csv = run_blocking(&service, |poll| poll.export())
        .await
        .inspect_err(|err| {
            error!(error = %err, "failed to export ballots");
        })?;

    let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

pub(crate) async fn reset_handler<S>(
    State(service): State<Arc<PollService<S>>>,
    Query(params): Query<ResetParams>,
) -> Result<Response, AppError>
where
    S: BallotStore + 'static,
{
    match run_blocking(&service, move |poll| poll.reset(&params.token)).await {
        Ok(()) => {
            let expired = format!("{}=; Max-Age=0; Path=/", service.config().cookie_name());
            Ok(([(header::SET_COOKIE, expired)], Redirect::to("/results")).into_response())
        }
        Err(PollServiceError::Unauthorized) => {
            Ok((StatusCode::FORBIDDEN, "unauthorized").into_response())
        }
        Err(other) => {
            error!(error = %other, "failed to clear ballot log");
            Err(other.into())
        }
    }
}

/// Run a service call on the blocking pool; the file store does synchronous I/O under a lock.
async fn run_blocking<S, T, F>(
    service: &Arc<PollService<S>>,
    task: F,
) -> Result<T, PollServiceError>
where
    S: BallotStore + 'static,
    T: Send + 'static,
    F: FnOnce(&PollService<S>) -> Result<T, PollServiceError> + Send + 'static,
{
    let service = Arc::clone(service);
    tokio::task::spawn_blocking(move || task(&service))
        .await
        .map_err(|err| PollServiceError::Worker(err.to_string()))?
}

fn has_voted(headers: &HeaderMap, cookie_name: &str) -> bool {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|raw| raw.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .any(|(name, value)| name == cookie_name && value == "1")
}
