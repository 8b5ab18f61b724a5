use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};

use crate::models::UserPreferences;

#[derive(Debug, FromRow)]
struct PreferencesRow {
    user_id: i64,
    opt_out: bool,
    blocked_users: String,
    last_match_time: Option<DateTime<Utc>>,
    preferences_json: Option<String>,
}

impl From<PreferencesRow> for UserPreferences {
    fn from(row: PreferencesRow) -> Self {
        UserPreferences {
            user_id: row.user_id,
            opt_out: row.opt_out,
            blocked_users: serde_json::from_str(&row.blocked_users).unwrap_or_default(),
            last_match_time: row.last_match_time,
            preferences_json: row.preferences_json,
        }
    }
}

/// Fetches a user's preferences, creating the default row on first access
pub async fn get_or_create(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<UserPreferences, sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO user_preferences (user_id) VALUES (?)")
        .bind(user_id)
        .execute(pool)
        .await?;

    let row = sqlx::query_as::<_, PreferencesRow>(
        r#"
        SELECT user_id, opt_out, blocked_users, last_match_time, preferences_json
        FROM user_preferences
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

pub async fn set_opt_out(
    pool: &SqlitePool,
    user_id: i64,
    opt_out: bool,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, opt_out)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET opt_out = excluded.opt_out
        "#,
    )
    .bind(user_id)
    .bind(opt_out)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn update_last_match_time(
    pool: &SqlitePool,
    user_id: i64,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO user_preferences (user_id, last_match_time)
        VALUES (?, ?)
        ON CONFLICT(user_id) DO UPDATE SET last_match_time = excluded.last_match_time
        "#,
    )
    .bind(user_id)
    .bind(now)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn add_blocked_user(
    pool: &SqlitePool,
    user_id: i64,
    blocked_id: i64,
) -> Result<(), sqlx::Error> {
    let mut conn = pool.acquire().await?;
    add_blocked_user_conn(&mut conn, user_id, blocked_id).await
}

/// Appends to the JSON block list. Takes a connection so `block_match` can
/// run it inside the same transaction as the status transition.
pub(crate) async fn add_blocked_user_conn(
    conn: &mut SqliteConnection,
    user_id: i64,
    blocked_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO user_preferences (user_id) VALUES (?)")
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    let raw: String =
        sqlx::query_scalar("SELECT blocked_users FROM user_preferences WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&mut *conn)
            .await?;

    let mut blocked: Vec<i64> = serde_json::from_str(&raw).unwrap_or_default();
    if !blocked.contains(&blocked_id) {
        blocked.push(blocked_id);
    }
    let raw = serde_json::to_string(&blocked).unwrap_or_else(|_| "[]".to_string());

    sqlx::query("UPDATE user_preferences SET blocked_users = ? WHERE user_id = ?")
        .bind(raw)
        .bind(user_id)
        .execute(&mut *conn)
        .await?;

    Ok(())
}

/// True when either user has blocked the other
pub async fn is_blocked_between(
    pool: &SqlitePool,
    a: i64,
    b: i64,
) -> Result<bool, sqlx::Error> {
    let a_prefs = get_or_create(pool, a).await?;
    let b_prefs = get_or_create(pool, b).await?;
    Ok(a_prefs.has_blocked(b) || b_prefs.has_blocked(a))
}
