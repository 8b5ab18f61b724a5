use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

use crate::models::{ActiveMatch, HistoryStatus, MatchHistoryEntry, MatchStatus, PendingMatch};

/// Canonical key for an unordered user pair, smaller id first
pub fn pair_key(a: i64, b: i64) -> String {
    let (lower, upper) = if a < b { (a, b) } else { (b, a) };
    format!("{}:{}", lower, upper)
}

async fn insert_history(
    conn: &mut SqliteConnection,
    user_id: i64,
    other_user_id: i64,
    score: i64,
    status: HistoryStatus,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO match_history (user_id, other_user_id, score, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(other_user_id)
    .bind(score)
    .bind(status)
    .bind(now)
    .execute(conn)
    .await?;

    Ok(())
}

/// Records a proposed pairing: the pending row plus one history entry per
/// direction, so each user's history is self-contained from the start.
pub async fn create_pending_match(
    pool: &SqlitePool,
    requester_id: i64,
    target_id: i64,
    score: i64,
    now: DateTime<Utc>,
    expires_at: DateTime<Utc>,
) -> Result<PendingMatch, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO pending_matches (requester_id, target_id, score, status, created_at, expires_at)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(requester_id)
    .bind(target_id)
    .bind(score)
    .bind(MatchStatus::Pending)
    .bind(now)
    .bind(expires_at)
    .fetch_one(&mut *tx)
    .await?;

    insert_history(&mut tx, requester_id, target_id, score, HistoryStatus::Pending, now).await?;
    insert_history(&mut tx, target_id, requester_id, score, HistoryStatus::Pending, now).await?;

    tx.commit().await?;

    Ok(PendingMatch {
        id,
        requester_id,
        target_id,
        score,
        notification_ref: None,
        status: MatchStatus::Pending,
        created_at: now,
        expires_at,
    })
}

pub async fn get_pending_match(
    pool: &SqlitePool,
    match_id: i64,
) -> Result<Option<PendingMatch>, sqlx::Error> {
    sqlx::query_as::<_, PendingMatch>(
        r#"
        SELECT id, requester_id, target_id, score, notification_ref, status, created_at, expires_at
        FROM pending_matches
        WHERE id = ?
        "#,
    )
    .bind(match_id)
    .fetch_optional(pool)
    .await
}

/// Records where the proposal prompt was delivered, once the notification
/// layer has posted it.
pub async fn set_notification_ref(
    pool: &SqlitePool,
    match_id: i64,
    notification_ref: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE pending_matches SET notification_ref = ? WHERE id = ?")
        .bind(notification_ref)
        .bind(match_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Target accepted. Returns false if the row was no longer pending (already
/// resolved or swept), in which case nothing is written.
pub async fn accept_match(
    pool: &SqlitePool,
    m: &PendingMatch,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE pending_matches SET status = ? WHERE id = ? AND status = ?")
        .bind(MatchStatus::Accepted)
        .bind(m.id)
        .bind(MatchStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    insert_history(&mut tx, m.requester_id, m.target_id, m.score, HistoryStatus::Accepted, now)
        .await?;
    insert_history(&mut tx, m.target_id, m.requester_id, m.score, HistoryStatus::Accepted, now)
        .await?;

    let (lower, upper) = if m.requester_id < m.target_id {
        (m.requester_id, m.target_id)
    } else {
        (m.target_id, m.requester_id)
    };
    sqlx::query(
        r#"
        INSERT OR REPLACE INTO active_matches (pair_key, user_id_1, user_id_2, match_id, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(pair_key(m.requester_id, m.target_id))
    .bind(lower)
    .bind(upper)
    .bind(m.id)
    .bind(now)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(true)
}

/// Target declined. One history row; the exclusion-window query scans both
/// id columns so the pairing is hidden from both sides.
pub async fn decline_match(
    pool: &SqlitePool,
    m: &PendingMatch,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE pending_matches SET status = ? WHERE id = ? AND status = ?")
        .bind(MatchStatus::Declined)
        .bind(m.id)
        .bind(MatchStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    insert_history(&mut tx, m.target_id, m.requester_id, m.score, HistoryStatus::Declined, now)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Target blocked the requester: decline-equivalent exclusion plus a
/// permanent entry in the target's block list, all in one transaction.
pub async fn block_match(
    pool: &SqlitePool,
    m: &PendingMatch,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE pending_matches SET status = ? WHERE id = ? AND status = ?")
        .bind(MatchStatus::Blocked)
        .bind(m.id)
        .bind(MatchStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    insert_history(&mut tx, m.target_id, m.requester_id, m.score, HistoryStatus::Declined, now)
        .await?;
    crate::db::preferences::add_blocked_user_conn(&mut tx, m.target_id, m.requester_id).await?;

    tx.commit().await?;
    Ok(true)
}

/// Either party dissolves an accepted pairing. Returns the match id of the
/// dissolved pairing, or None when no active pairing exists.
pub async fn unmatch(
    pool: &SqlitePool,
    actor_id: i64,
    other_id: i64,
    now: DateTime<Utc>,
) -> Result<Option<i64>, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let key = pair_key(actor_id, other_id);
    let row: Option<(i64, Option<i64>)> = sqlx::query_as(
        r#"
        SELECT am.match_id, pm.score
        FROM active_matches am
        LEFT JOIN pending_matches pm ON pm.id = am.match_id
        WHERE am.pair_key = ?
        "#,
    )
    .bind(&key)
    .fetch_optional(&mut *tx)
    .await?;

    let Some((match_id, score)) = row else {
        return Ok(None);
    };
    let score = score.unwrap_or(0);

    sqlx::query("DELETE FROM active_matches WHERE pair_key = ?")
        .bind(&key)
        .execute(&mut *tx)
        .await?;

    insert_history(&mut tx, actor_id, other_id, score, HistoryStatus::UnmatchedByUser, now).await?;
    insert_history(&mut tx, other_id, actor_id, score, HistoryStatus::UnmatchedByOther, now).await?;

    tx.commit().await?;
    Ok(Some(match_id))
}

pub async fn get_all_active_matches(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<ActiveMatch>, sqlx::Error> {
    let rows: Vec<(i64, i64, i64)> = sqlx::query_as(
        r#"
        SELECT user_id_1, user_id_2, match_id
        FROM active_matches
        WHERE user_id_1 = ? OR user_id_2 = ?
        ORDER BY created_at ASC
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(u1, u2, match_id)| ActiveMatch {
            other_user_id: if u1 == user_id { u2 } else { u1 },
            match_id,
        })
        .collect())
}

pub async fn has_active_match(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Option<ActiveMatch>, sqlx::Error> {
    Ok(get_all_active_matches(pool, user_id).await?.into_iter().next())
}

/// Users this user declined, was declined by, or unmatched with inside the
/// exclusion window. An entry aged exactly `days` is outside the window.
pub async fn get_excluded_matches(
    pool: &SqlitePool,
    user_id: i64,
    days: i64,
    now: DateTime<Utc>,
) -> Result<HashSet<i64>, sqlx::Error> {
    let cutoff = now - Duration::days(days);

    let rows: Vec<(i64, i64)> = sqlx::query_as(
        r#"
        SELECT user_id, other_user_id
        FROM match_history
        WHERE (user_id = ? OR other_user_id = ?)
          AND status IN (?, ?, ?)
          AND created_at > ?
        "#,
    )
    .bind(user_id)
    .bind(user_id)
    .bind(HistoryStatus::Declined)
    .bind(HistoryStatus::UnmatchedByUser)
    .bind(HistoryStatus::UnmatchedByOther)
    .bind(cutoff)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|(u, other)| if u == user_id { other } else { u })
        .collect())
}

pub async fn get_match_history(
    pool: &SqlitePool,
    user_id: i64,
    limit: i64,
) -> Result<Vec<MatchHistoryEntry>, sqlx::Error> {
    sqlx::query_as::<_, MatchHistoryEntry>(
        r#"
        SELECT id, user_id, other_user_id, score, status, created_at
        FROM match_history
        WHERE user_id = ?
        ORDER BY created_at DESC, id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(pool)
    .await
}

/// Transitions one overdue pending row to expired. Returns false when the
/// row was already resolved, so racing with a live response is harmless.
pub async fn expire_match(
    pool: &SqlitePool,
    m: &PendingMatch,
    now: DateTime<Utc>,
) -> Result<bool, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query("UPDATE pending_matches SET status = ? WHERE id = ? AND status = ?")
        .bind(MatchStatus::Expired)
        .bind(m.id)
        .bind(MatchStatus::Pending)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    if updated == 0 {
        return Ok(false);
    }

    insert_history(&mut tx, m.requester_id, m.target_id, m.score, HistoryStatus::Expired, now)
        .await?;
    insert_history(&mut tx, m.target_id, m.requester_id, m.score, HistoryStatus::Expired, now)
        .await?;

    tx.commit().await?;
    Ok(true)
}

/// Expiry sweep entry point. Safe to run on a timer concurrently with live
/// responses; sweeping an already-resolved row is a no-op.
pub async fn cleanup_expired(pool: &SqlitePool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
    let due = sqlx::query_as::<_, PendingMatch>(
        r#"
        SELECT id, requester_id, target_id, score, notification_ref, status, created_at, expires_at
        FROM pending_matches
        WHERE status = ? AND expires_at <= ?
        "#,
    )
    .bind(MatchStatus::Pending)
    .bind(now)
    .fetch_all(pool)
    .await?;

    let mut swept = 0u64;
    for m in &due {
        if expire_match(pool, m, now).await? {
            swept += 1;
        }
    }

    Ok(swept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{connection::memory_pool, preferences};

    #[test]
    fn pair_key_is_order_independent() {
        assert_eq!(pair_key(7, 3), "3:7");
        assert_eq!(pair_key(3, 7), "3:7");
    }

    #[tokio::test]
    async fn accept_creates_active_pair_and_history() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let expires = now + Duration::hours(24);

        let m = create_pending_match(&pool, 1, 2, 50, now, expires).await.unwrap();
        assert_eq!(m.status, MatchStatus::Pending);

        assert!(accept_match(&pool, &m, now).await.unwrap());

        let stored = get_pending_match(&pool, m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Accepted);

        let active = get_all_active_matches(&pool, 1).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].other_user_id, 2);
        assert_eq!(active[0].match_id, m.id);

        let first = has_active_match(&pool, 2).await.unwrap().unwrap();
        assert_eq!(first.other_user_id, 1);

        // pending + accepted, one row each per direction
        let history = get_match_history(&pool, 1, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert!(history.iter().any(|h| h.status == HistoryStatus::Accepted));
        assert!(history.iter().any(|h| h.status == HistoryStatus::Pending));
    }

    #[tokio::test]
    async fn accept_is_guarded_against_double_resolution() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 40, now, now + Duration::hours(24))
            .await
            .unwrap();

        assert!(accept_match(&pool, &m, now).await.unwrap());
        assert!(!accept_match(&pool, &m, now).await.unwrap());
        assert!(!decline_match(&pool, &m, now).await.unwrap());

        let history = get_match_history(&pool, 1, 10).await.unwrap();
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn decline_excludes_both_directions() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 40, now, now + Duration::hours(24))
            .await
            .unwrap();

        assert!(decline_match(&pool, &m, now).await.unwrap());
        assert!(get_all_active_matches(&pool, 1).await.unwrap().is_empty());

        let excluded_for_requester = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(excluded_for_requester.contains(&2));

        let excluded_for_target = get_excluded_matches(&pool, 2, 7, now).await.unwrap();
        assert!(excluded_for_target.contains(&1));
    }

    #[tokio::test]
    async fn exclusion_window_boundary_is_exclusive() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 40, now, now + Duration::hours(24))
            .await
            .unwrap();
        assert!(decline_match(&pool, &m, now).await.unwrap());

        // age the declined entry to exactly the window edge
        let edge = now - Duration::days(7);
        sqlx::query("UPDATE match_history SET created_at = ? WHERE status = ?")
            .bind(edge)
            .bind(HistoryStatus::Declined)
            .execute(&pool)
            .await
            .unwrap();
        let excluded = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(!excluded.contains(&2), "entry aged exactly 7 days is eligible again");

        // one minute inside the window it is still hidden
        let inside = edge + Duration::minutes(1);
        sqlx::query("UPDATE match_history SET created_at = ? WHERE status = ?")
            .bind(inside)
            .bind(HistoryStatus::Declined)
            .execute(&pool)
            .await
            .unwrap();
        let excluded = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(excluded.contains(&2));
    }

    #[tokio::test]
    async fn block_is_permanent_and_excluding() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 40, now, now + Duration::hours(24))
            .await
            .unwrap();

        assert!(block_match(&pool, &m, now).await.unwrap());

        let stored = get_pending_match(&pool, m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Blocked);

        let prefs = preferences::get_or_create(&pool, 2).await.unwrap();
        assert!(prefs.has_blocked(1));

        let excluded = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(excluded.contains(&2));
    }

    #[tokio::test]
    async fn unmatch_removes_pair_and_logs_both_sides() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 60, now, now + Duration::hours(24))
            .await
            .unwrap();
        assert!(accept_match(&pool, &m, now).await.unwrap());

        let dissolved = unmatch(&pool, 1, 2, now).await.unwrap();
        assert_eq!(dissolved, Some(m.id));
        assert!(get_all_active_matches(&pool, 1).await.unwrap().is_empty());
        assert!(get_all_active_matches(&pool, 2).await.unwrap().is_empty());

        let actor_history = get_match_history(&pool, 1, 10).await.unwrap();
        assert!(actor_history.iter().any(|h| h.status == HistoryStatus::UnmatchedByUser
            && h.other_user_id == 2
            && h.score == 60));
        let other_history = get_match_history(&pool, 2, 10).await.unwrap();
        assert!(other_history.iter().any(|h| h.status == HistoryStatus::UnmatchedByOther));

        // unmatched pairs re-enter the exclusion window
        let excluded = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(excluded.contains(&2));
    }

    #[tokio::test]
    async fn unmatch_without_active_pair_is_none() {
        let pool = memory_pool().await;
        assert_eq!(unmatch(&pool, 1, 2, Utc::now()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cleanup_is_idempotent_and_does_not_exclude() {
        let pool = memory_pool().await;
        let now = Utc::now();
        // already past its expiry when the sweep runs
        let m = create_pending_match(&pool, 1, 2, 40, now - Duration::hours(25), now - Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(cleanup_expired(&pool, now).await.unwrap(), 1);
        let stored = get_pending_match(&pool, m.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MatchStatus::Expired);

        assert_eq!(cleanup_expired(&pool, now).await.unwrap(), 0);

        // expiry never puts the pair in the exclusion window
        let excluded = get_excluded_matches(&pool, 1, 7, now).await.unwrap();
        assert!(!excluded.contains(&2));
    }

    #[tokio::test]
    async fn notification_ref_round_trips() {
        let pool = memory_pool().await;
        let now = Utc::now();
        let m = create_pending_match(&pool, 1, 2, 40, now, now + Duration::hours(24))
            .await
            .unwrap();

        set_notification_ref(&pool, m.id, "channel-9/msg-1234").await.unwrap();
        let stored = get_pending_match(&pool, m.id).await.unwrap().unwrap();
        assert_eq!(stored.notification_ref.as_deref(), Some("channel-9/msg-1234"));
    }
}
