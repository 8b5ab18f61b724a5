use chrono::{DateTime, Utc};
use rand::Rng;
use sqlx::SqlitePool;

use crate::constants::DECLINED_MATCHES_EXCLUSION_DAYS;
use crate::db::{matches, preferences};
use crate::error::MatchError;
use crate::models::MatchConfig;
use crate::models::profile::{Gender, MemberRecord, UserProfile};
use crate::services::{profile, scoring};

#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub profile: UserProfile,
    pub score: i64,
}

/// Scans the supplied population for the best-scoring eligible candidate.
/// Ties at the top score are broken uniformly at random. Returns Ok(None)
/// when nobody is eligible; that is a result, not an error.
pub async fn find_best_match<R: Rng + ?Sized>(
    pool: &SqlitePool,
    config: &MatchConfig,
    requester: &MemberRecord,
    population: &[MemberRecord],
    preferred_gender: Gender,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Result<Option<ScoredCandidate>, MatchError> {
    let requester_profile = profile::extract(requester.user_id, &requester.tags, &config.catalog);
    let requester_prefs = preferences::get_or_create(pool, requester.user_id).await?;

    let active: std::collections::HashSet<i64> =
        matches::get_all_active_matches(pool, requester.user_id)
            .await?
            .into_iter()
            .map(|m| m.other_user_id)
            .collect();
    let excluded =
        matches::get_excluded_matches(pool, requester.user_id, DECLINED_MATCHES_EXCLUSION_DAYS, now)
            .await?;

    let mut best: Vec<ScoredCandidate> = Vec::new();
    let mut best_score: Option<i64> = None;

    for member in population {
        if member.user_id == requester.user_id || member.is_bot {
            continue;
        }

        let candidate = profile::extract(member.user_id, &member.tags, &config.catalog);
        if candidate.gender != Some(preferred_gender) {
            continue;
        }
        if scoring::is_hard_excluded(&candidate, config) {
            continue;
        }
        if active.contains(&member.user_id) || excluded.contains(&member.user_id) {
            continue;
        }

        let candidate_prefs = preferences::get_or_create(pool, member.user_id).await?;
        if candidate_prefs.opt_out {
            continue;
        }
        if candidate_prefs.has_blocked(requester.user_id)
            || requester_prefs.has_blocked(member.user_id)
        {
            continue;
        }

        let score = scoring::score(&requester_profile, &candidate, config);
        if score < config.min_score_threshold {
            continue;
        }

        let scored = ScoredCandidate { profile: candidate, score };
        match best_score {
            Some(top) if score > top => {
                best_score = Some(score);
                best = vec![scored];
            }
            Some(top) if score == top => best.push(scored),
            Some(_) => {}
            None => {
                best_score = Some(score);
                best = vec![scored];
            }
        }
    }

    if best.is_empty() {
        return Ok(None);
    }
    let winner = best.swap_remove(rng.random_range(0..best.len()));
    Ok(Some(winner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::connection::memory_pool;
    use chrono::Duration;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::HashMap;

    fn member(user_id: i64, tags: &[i64]) -> MemberRecord {
        MemberRecord {
            user_id,
            is_bot: false,
            tags: tags.to_vec(),
        }
    }

    // man looking for a woman; open, single, no directional preferences
    fn requester() -> MemberRecord {
        member(1, &[102, 161, 151])
    }

    // scores 45 against requester(): dms 10 + relationship 10 + age 15 + height 10
    fn eligible_woman(user_id: i64) -> MemberRecord {
        member(user_id, &[101, 161, 151])
    }

    #[tokio::test]
    async fn ineligible_candidates_are_filtered_out() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let mut bot = eligible_woman(4);
        bot.is_bot = true;

        let population = vec![
            requester(),                  // self
            bot,                          // automated account
            member(3, &[102, 161, 151]),  // wrong gender
            member(5, &[101, 163, 151]),  // closed visibility
            member(6, &[101, 161, 152]),  // taken
            member(7, &[101, 161, 151, 301]), // exclusion tag
        ];

        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn opted_out_candidates_are_skipped() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        preferences::set_opt_out(&pool, 2, true).await.unwrap();
        let population = vec![eligible_woman(2)];

        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn blocked_either_direction_is_skipped() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let population = vec![eligible_woman(2)];

        preferences::add_blocked_user(&pool, 2, 1).await.unwrap();
        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());

        // and the reverse direction
        let pool = memory_pool().await;
        preferences::add_blocked_user(&pool, 1, 2).await.unwrap();
        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn highest_score_wins() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        // 2 scores 45; 3 additionally matches the requester's region under
        // a local distance preference
        let mut requester = requester();
        requester.tags.extend([143, 191]);
        let population = vec![eligible_woman(2), member(3, &[101, 161, 151, 143])];

        let result = find_best_match(
            &pool, &config, &requester, &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(result.profile.user_id, 3);
    }

    #[tokio::test]
    async fn below_threshold_is_no_match() {
        let pool = memory_pool().await;
        let mut config = MatchConfig::builtin();
        config.min_score_threshold = 50;
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let population = vec![eligible_woman(2)]; // scores 45
        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn ties_are_broken_uniformly_at_random() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let population = vec![eligible_woman(2), eligible_woman(3)];

        let mut picks: HashMap<i64, u32> = HashMap::new();
        for seed in 0..40 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let result = find_best_match(
                &pool, &config, &requester(), &population, Gender::Woman, &mut rng, Utc::now(),
            )
            .await
            .unwrap()
            .unwrap();
            *picks.entry(result.profile.user_id).or_default() += 1;
        }

        assert!(picks.get(&2).copied().unwrap_or(0) > 0, "candidate 2 never picked: {picks:?}");
        assert!(picks.get(&3).copied().unwrap_or(0) > 0, "candidate 3 never picked: {picks:?}");
    }

    #[tokio::test]
    async fn declined_candidate_reappears_after_the_window() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let now = Utc::now();

        let m = matches::create_pending_match(&pool, 1, 2, 45, now, now + Duration::hours(24))
            .await
            .unwrap();
        matches::decline_match(&pool, &m, now).await.unwrap();

        let population = vec![eligible_woman(2)];
        let hidden = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, now,
        )
        .await
        .unwrap();
        assert!(hidden.is_none());

        // outside the window the candidate is eligible again
        let later = now + Duration::days(DECLINED_MATCHES_EXCLUSION_DAYS);
        let visible = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, later,
        )
        .await
        .unwrap();
        assert!(visible.is_some());
    }

    #[tokio::test]
    async fn already_matched_candidate_is_skipped() {
        let pool = memory_pool().await;
        let config = MatchConfig::builtin();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let now = Utc::now();

        let m = matches::create_pending_match(&pool, 1, 2, 45, now, now + Duration::hours(24))
            .await
            .unwrap();
        matches::accept_match(&pool, &m, now).await.unwrap();

        let population = vec![eligible_woman(2)];
        let result = find_best_match(
            &pool, &config, &requester(), &population, Gender::Woman, &mut rng, now,
        )
        .await
        .unwrap();
        assert!(result.is_none());
    }
}
