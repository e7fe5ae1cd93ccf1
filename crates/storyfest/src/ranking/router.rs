use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use super::cooldown::VoteEligibility;
use super::domain::{EntryId, EventId, RankingMetric, VoterIdentity};
use super::repository::{ContestRepository, RepositoryError, VoteNotifier};
use super::service::{RankingService, RankingServiceError, VoteOutcome};

#[derive(Debug, Default, Deserialize)]
pub(crate) struct MetricQuery {
    #[serde(default)]
    pub(crate) metric: Option<RankingMetric>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoterQuery {
    pub(crate) voter: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VoterPayload {
    pub(crate) voter: String,
}

/// Router builder exposing leaderboard reads and vote/view writes.
pub fn ranking_router<R, N>(service: Arc<RankingService<R, N>>) -> Router
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/events/:event_id/podium",
            get(podium_handler::<R, N>),
        )
        .route(
            "/api/v1/events/:event_id/leaderboard",
            get(leaderboard_handler::<R, N>),
        )
        .route(
            "/api/v1/events/:event_id/eligible",
            get(eligible_handler::<R, N>),
        )
        .route(
            "/api/v1/entries/:entry_id/cooldown",
            get(cooldown_handler::<R, N>),
        )
        .route(
            "/api/v1/entries/:entry_id/views",
            post(view_handler::<R, N>),
        )
        .route(
            "/api/v1/entries/:entry_id/votes",
            post(vote_handler::<R, N>),
        )
        .with_state(service)
}

pub(crate) async fn podium_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(event_id): Path<String>,
    Query(query): Query<MetricQuery>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    let event_id = EventId(event_id);
    let metric = query.metric.unwrap_or_default();
    match service.podium(&event_id, metric) {
        Ok(podium) => {
            let payload = json!({
                "event_id": event_id,
                "metric": metric,
                "podium": podium,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn leaderboard_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(event_id): Path<String>,
    Query(query): Query<MetricQuery>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    let event_id = EventId(event_id);
    match service.leaderboard(&event_id, query.metric.unwrap_or_default()) {
        Ok(board) => (StatusCode::OK, axum::Json(board)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn eligible_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(event_id): Path<String>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    match service.eligible_pool(&EventId(event_id)) {
        Ok(pool) => (StatusCode::OK, axum::Json(pool)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn cooldown_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(entry_id): Path<String>,
    Query(query): Query<VoterQuery>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    let voter = match VoterIdentity::parse(&query.voter) {
        Ok(voter) => voter,
        Err(err) => return invalid_voter(err),
    };

    match service.can_vote(&EntryId(entry_id), &voter, Utc::now()) {
        Ok(eligibility) => (StatusCode::OK, axum::Json(eligibility)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn view_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(entry_id): Path<String>,
    axum::Json(payload): axum::Json<VoterPayload>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    let voter = match VoterIdentity::parse(&payload.voter) {
        Ok(voter) => voter,
        Err(err) => return invalid_voter(err),
    };

    match service.record_view(&EntryId(entry_id), &voter) {
        Ok(outcome) => (StatusCode::OK, axum::Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn vote_handler<R, N>(
    State(service): State<Arc<RankingService<R, N>>>,
    Path(entry_id): Path<String>,
    axum::Json(payload): axum::Json<VoterPayload>,
) -> Response
where
    R: ContestRepository + 'static,
    N: VoteNotifier + 'static,
{
    let voter = match VoterIdentity::parse(&payload.voter) {
        Ok(voter) => voter,
        Err(err) => return invalid_voter(err),
    };

    match service.cast_vote(&EntryId(entry_id), &voter, Utc::now()) {
        Ok(outcome @ VoteOutcome::Accepted { .. }) => {
            (StatusCode::OK, axum::Json(outcome)).into_response()
        }
        Ok(VoteOutcome::CoolingDown { hours_remaining }) => {
            let payload = json!({
                "status": "cooling_down",
                "hours_remaining": hours_remaining,
                "message": VoteEligibility::wait(hours_remaining).summary(),
            });
            (StatusCode::TOO_MANY_REQUESTS, axum::Json(payload)).into_response()
        }
        Ok(outcome @ VoteOutcome::NotEligible) => {
            (StatusCode::FORBIDDEN, axum::Json(outcome)).into_response()
        }
        Err(err) => error_response(err),
    }
}

fn invalid_voter(err: impl std::fmt::Display) -> Response {
    let payload = json!({ "error": err.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
}

fn error_response(err: RankingServiceError) -> Response {
    let status = match &err {
        RankingServiceError::UnknownEntry(_)
        | RankingServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        RankingServiceError::Repository(RepositoryError::Unavailable(_)) => {
            StatusCode::SERVICE_UNAVAILABLE
        }
    };
    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
