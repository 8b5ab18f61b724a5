use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::constants::{MATCH_ACCEPTANCE_TIMEOUT_HOURS, MATCH_COMMAND_COOLDOWN_SECS};
use crate::db::{matches, preferences};
use crate::error::MatchError;
use crate::models::profile::{Gender, MemberRecord};
use crate::models::{ActiveMatch, MatchConfig, MatchOutcome, MatchProposal, MatchResponse, MatchStatus};
use crate::services::{limits, profile, scoring, selector};

/// One user's current matchmaking standing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchStatusReport {
    pub user_id: i64,
    pub active: Vec<ActiveMatch>,
    pub limit: u32,
    pub usage: String,
    pub opt_out: bool,
}

/// Full find flow: eligibility gates, candidate selection, then the pending
/// record and cooldown stamp. Ok(None) means nobody suitable was found.
pub async fn find_match<R: Rng + ?Sized>(
    pool: &SqlitePool,
    config: &MatchConfig,
    requester: &MemberRecord,
    population: &[MemberRecord],
    preferred_gender: Gender,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Option<MatchProposal>, MatchError> {
    let prefs = preferences::get_or_create(pool, requester.user_id).await?;
    if prefs.opt_out {
        return Err(MatchError::OptedOut);
    }

    if let Some(last) = prefs.last_match_time {
        let elapsed = (now - last).num_seconds();
        if elapsed < MATCH_COMMAND_COOLDOWN_SECS {
            return Err(MatchError::CooldownActive {
                retry_after_secs: MATCH_COMMAND_COOLDOWN_SECS - elapsed,
            });
        }
    }

    let active = matches::get_all_active_matches(pool, requester.user_id).await?;
    let limit = limits::match_limit(&requester.tags, &config.catalog);
    if limits::is_at_limit(active.len() as u32, limit) {
        return Err(MatchError::LimitReached {
            active: active.len() as u32,
            limit,
        });
    }

    let Some(candidate) =
        selector::find_best_match(pool, config, requester, population, preferred_gender, rng, now)
            .await?
    else {
        return Ok(None);
    };

    let expires_at = now + Duration::hours(MATCH_ACCEPTANCE_TIMEOUT_HOURS);
    let pending = matches::create_pending_match(
        pool,
        requester.user_id,
        candidate.profile.user_id,
        candidate.score,
        now,
        expires_at,
    )
    .await?;
    preferences::update_last_match_time(pool, requester.user_id, now).await?;

    let requester_profile = profile::extract(requester.user_id, &requester.tags, &config.catalog);
    tracing::info!(
        "Proposed match {} for {} -> {} (score {})",
        pending.id,
        requester.user_id,
        candidate.profile.user_id,
        candidate.score
    );

    Ok(Some(MatchProposal {
        match_id: pending.id,
        requester_summary: requester_profile.summary(),
        target_summary: candidate.profile.summary(),
        score: candidate.score,
        percentage: scoring::score_percentage(candidate.score, &config.weights),
        expires_at,
    }))
}

/// Applies the target's accept/decline/block. A response that arrives after
/// the deadline expires the row exactly as the sweep would have.
pub async fn respond_to_match(
    pool: &SqlitePool,
    match_id: i64,
    actor_id: i64,
    response: MatchResponse,
    now: DateTime<Utc>,
) -> Result<MatchOutcome, MatchError> {
    let Some(m) = matches::get_pending_match(pool, match_id).await? else {
        return Err(MatchError::MatchNotFound);
    };
    if m.target_id != actor_id {
        return Err(MatchError::NotYourMatch);
    }
    if m.status != MatchStatus::Pending {
        return Err(MatchError::AlreadyResolved { status: m.status });
    }
    if now > m.expires_at {
        matches::expire_match(pool, &m, now).await?;
        return Err(MatchError::MatchExpired);
    }

    let (applied, status) = match response {
        MatchResponse::Accept => (matches::accept_match(pool, &m, now).await?, MatchStatus::Accepted),
        MatchResponse::Decline => {
            (matches::decline_match(pool, &m, now).await?, MatchStatus::Declined)
        }
        MatchResponse::Block => (matches::block_match(pool, &m, now).await?, MatchStatus::Blocked),
    };

    if !applied {
        // lost the race against another response or the sweep
        let current = matches::get_pending_match(pool, match_id)
            .await?
            .map(|row| row.status)
            .unwrap_or(m.status);
        return Err(MatchError::AlreadyResolved { status: current });
    }

    tracing::info!("Match {} resolved as {:?} by {}", match_id, status, actor_id);
    Ok(MatchOutcome {
        match_id,
        status,
        requester_id: m.requester_id,
        target_id: m.target_id,
    })
}

/// Dissolves an accepted pairing on behalf of `actor_id`. Returns the
/// dissolved match id.
pub async fn unmatch(
    pool: &SqlitePool,
    actor_id: i64,
    other_id: i64,
    now: DateTime<Utc>,
) -> Result<i64, MatchError> {
    match matches::unmatch(pool, actor_id, other_id, now).await? {
        Some(match_id) => {
            tracing::info!("{} unmatched {} (match {})", actor_id, other_id, match_id);
            Ok(match_id)
        }
        None => Err(MatchError::NoActiveMatch),
    }
}

pub async fn set_opt_out(
    pool: &SqlitePool,
    user_id: i64,
    opt_out: bool,
) -> Result<(), MatchError> {
    preferences::set_opt_out(pool, user_id, opt_out).await?;
    Ok(())
}

pub async fn match_status(
    pool: &SqlitePool,
    config: &MatchConfig,
    user: &MemberRecord,
) -> Result<MatchStatusReport, MatchError> {
    let prefs = preferences::get_or_create(pool, user.user_id).await?;
    let active = matches::get_all_active_matches(pool, user.user_id).await?;
    let limit = limits::match_limit(&user.tags, &config.catalog);

    Ok(MatchStatusReport {
        user_id: user.user_id,
        usage: limits::usage_summary(active.len() as u32, limit),
        active,
        limit,
        opt_out: prefs.opt_out,
    })
}
