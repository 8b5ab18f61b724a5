use axum::{extract::State, http::StatusCode, response::Json};
use chrono::Utc;
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::sync::Arc;

use crate::db::matches;
use crate::error::MatchError;
use crate::models::profile::{Gender, MemberRecord};
use crate::models::{MatchConfig, MatchOutcome, MatchProposal, MatchResponse};
use crate::services::matchmaker::{self, MatchStatusReport};

pub type AppState = (SqlitePool, Arc<MatchConfig>);

#[derive(Debug, Serialize)]
pub struct MatchApiError {
    pub error: String,
}

/// Maps the domain taxonomy onto the HTTP boundary: eligibility problems
/// are explained to the caller verbatim, storage problems are logged and
/// collapsed into a retry message.
fn error_response(err: MatchError) -> (StatusCode, Json<MatchApiError>) {
    let status = match &err {
        MatchError::Storage(_) | MatchError::InvalidConfig(_) => StatusCode::INTERNAL_SERVER_ERROR,
        MatchError::MatchNotFound => StatusCode::NOT_FOUND,
        MatchError::NotYourMatch => StatusCode::FORBIDDEN,
        MatchError::CooldownActive { .. } | MatchError::LimitReached { .. } => {
            StatusCode::TOO_MANY_REQUESTS
        }
        _ => StatusCode::BAD_REQUEST,
    };

    let message = if err.is_eligibility() {
        err.to_string()
    } else {
        tracing::error!("Matchmaking operation failed: {}", err);
        "Something went wrong. Please try again.".to_string()
    };

    (status, Json(MatchApiError { error: message }))
}

#[derive(Debug, Deserialize)]
pub struct FindMatchRequest {
    pub requester: MemberRecord,
    pub preferred_gender: Gender,
    /// Current guild population with tag snapshots, supplied by the
    /// platform glue that dispatched the command
    pub population: Vec<MemberRecord>,
}

#[derive(Debug, Serialize)]
pub struct FindMatchResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<MatchProposal>,
    pub message: String,
}

pub async fn find_match(
    State((pool, config)): State<AppState>,
    Json(req): Json<FindMatchRequest>,
) -> Result<Json<FindMatchResponse>, (StatusCode, Json<MatchApiError>)> {
    let mut rng = StdRng::from_os_rng();

    match matchmaker::find_match(
        &pool,
        &config,
        &req.requester,
        &req.population,
        req.preferred_gender,
        &mut rng,
        Utc::now(),
    )
    .await
    {
        Ok(Some(proposal)) => Ok(Json(FindMatchResponse {
            found: true,
            message: format!("Found a {:.2}% match!", proposal.percentage),
            proposal: Some(proposal),
        })),
        Ok(None) => Ok(Json(FindMatchResponse {
            found: false,
            proposal: None,
            message: "No suitable match found right now. Try again later.".to_string(),
        })),
        Err(err) => Err(error_response(err)),
    }
}

#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub match_id: i64,
    pub user_id: i64,
    pub response: MatchResponse,
}

pub async fn respond(
    State((pool, _config)): State<AppState>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<MatchOutcome>, (StatusCode, Json<MatchApiError>)> {
    matchmaker::respond_to_match(&pool, req.match_id, req.user_id, req.response, Utc::now())
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct NotificationRefRequest {
    pub match_id: i64,
    pub notification_ref: String,
}

#[derive(Debug, Serialize)]
pub struct NotificationRefResponse {
    pub match_id: i64,
}

/// Called by the notification layer once the proposal prompt is delivered,
/// so the posted prompt can be traced back from the match row.
pub async fn record_notification(
    State((pool, _config)): State<AppState>,
    Json(req): Json<NotificationRefRequest>,
) -> Result<Json<NotificationRefResponse>, (StatusCode, Json<MatchApiError>)> {
    matches::set_notification_ref(&pool, req.match_id, &req.notification_ref)
        .await
        .map_err(|e| error_response(MatchError::Storage(e)))?;

    Ok(Json(NotificationRefResponse {
        match_id: req.match_id,
    }))
}

#[derive(Debug, Deserialize)]
pub struct UnmatchRequest {
    pub user_id: i64,
    pub other_user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct UnmatchResponse {
    pub match_id: i64,
}

pub async fn unmatch(
    State((pool, _config)): State<AppState>,
    Json(req): Json<UnmatchRequest>,
) -> Result<Json<UnmatchResponse>, (StatusCode, Json<MatchApiError>)> {
    let match_id = matchmaker::unmatch(&pool, req.user_id, req.other_user_id, Utc::now())
        .await
        .map_err(error_response)?;

    Ok(Json(UnmatchResponse { match_id }))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub user: MemberRecord,
}

pub async fn match_status(
    State((pool, config)): State<AppState>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<MatchStatusReport>, (StatusCode, Json<MatchApiError>)> {
    matchmaker::match_status(&pool, &config, &req.user)
        .await
        .map(Json)
        .map_err(error_response)
}

#[derive(Debug, Deserialize)]
pub struct PreferencesRequest {
    pub user_id: i64,
    pub opt_out: bool,
}

#[derive(Debug, Serialize)]
pub struct PreferencesResponse {
    pub user_id: i64,
    pub opt_out: bool,
}

pub async fn set_preferences(
    State((pool, _config)): State<AppState>,
    Json(req): Json<PreferencesRequest>,
) -> Result<Json<PreferencesResponse>, (StatusCode, Json<MatchApiError>)> {
    matchmaker::set_opt_out(&pool, req.user_id, req.opt_out)
        .await
        .map_err(error_response)?;

    Ok(Json(PreferencesResponse {
        user_id: req.user_id,
        opt_out: req.opt_out,
    }))
}
