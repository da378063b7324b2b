use crate::database::Database;
use crate::models::{Tier, TierScenario};

/// Built-in scenario table, used whenever no override is stored for a tier.
pub fn default_scenario(tier: Tier) -> TierScenario {
    let categories = |names: &[&str]| names.iter().map(|n| n.to_string()).collect();
    match tier {
        Tier::Micro => TierScenario {
            daily_tweet_limit: 5,
            categories: categories(&["General"]),
            min_followers: 100,
            bonus_multiplier: 1.0,
        },
        Tier::Rising => TierScenario {
            daily_tweet_limit: 10,
            categories: categories(&["General", "Meme"]),
            min_followers: 1_000,
            bonus_multiplier: 1.2,
        },
        Tier::Star => TierScenario {
            daily_tweet_limit: 15,
            categories: categories(&["General", "Meme", "Thread"]),
            min_followers: 5_000,
            bonus_multiplier: 1.5,
        },
        Tier::Legend => TierScenario {
            daily_tweet_limit: 20,
            categories: categories(&["General", "Meme", "Thread", "Review"]),
            min_followers: 20_000,
            bonus_multiplier: 2.0,
        },
        Tier::Hero => TierScenario {
            daily_tweet_limit: 30,
            categories: categories(&["General", "Meme", "Thread", "Review", "Spaces"]),
            min_followers: 50_000,
            bonus_multiplier: 3.0,
        },
    }
}

/// The effective scenario for a tier. Never fails: a store miss or a store
/// error both fall back to the built-in default.
pub async fn get_scenarios(db: &Database, tier: Tier) -> TierScenario {
    match db.get_scenario_override(tier).await {
        Ok(Some(scenario)) => scenario,
        Ok(None) => default_scenario(tier),
        Err(e) => {
            warn!("Scenario lookup failed for {}: {}", tier.as_str(), e);
            default_scenario(tier)
        }
    }
}

/// Partial update for a tier's scenario. `None` fields are left at their
/// current effective value; this is a merge, never a full replace.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScenarioPatch {
    pub daily_tweet_limit: Option<u32>,
    pub min_followers: Option<u32>,
    pub bonus_multiplier: Option<f64>,
}

impl ScenarioPatch {
    pub fn is_empty(&self) -> bool {
        self.daily_tweet_limit.is_none()
            && self.min_followers.is_none()
            && self.bonus_multiplier.is_none()
    }
}

pub fn merge_scenario(current: &TierScenario, patch: &ScenarioPatch) -> TierScenario {
    TierScenario {
        daily_tweet_limit: patch.daily_tweet_limit.unwrap_or(current.daily_tweet_limit),
        min_followers: patch.min_followers.unwrap_or(current.min_followers),
        // The multiplier invariant is >= 1.0; out-of-range patches clamp
        // instead of zeroing every advisory point value.
        bonus_multiplier: patch
            .bonus_multiplier
            .map(|m| m.max(1.0))
            .unwrap_or(current.bonus_multiplier),
        categories: current.categories.clone(),
    }
}

/// Merge the patch over the current effective scenario and persist the result.
pub async fn update_scenarios(
    db: &Database,
    tier: Tier,
    patch: &ScenarioPatch,
) -> Result<TierScenario, anyhow::Error> {
    let current = get_scenarios(db, tier).await;
    let merged = merge_scenario(&current, patch);
    db.put_scenario(tier, &merged).await?;
    info!(
        "Updated scenario for {}: limit={} followers={} multiplier={}",
        tier.as_str(),
        merged.daily_tweet_limit,
        merged.min_followers,
        merged.bonus_multiplier
    );
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_tier_has_a_default() {
        for tier in [Tier::Micro, Tier::Rising, Tier::Star, Tier::Legend, Tier::Hero] {
            let scenario = default_scenario(tier);
            assert!(scenario.daily_tweet_limit > 0);
            assert!(scenario.bonus_multiplier >= 1.0);
            assert!(scenario.categories.contains(&"General".to_string()));
        }
    }

    #[test]
    fn merge_keeps_unpatched_fields() {
        let current = default_scenario(Tier::Star);
        let patch = ScenarioPatch {
            daily_tweet_limit: Some(25),
            ..Default::default()
        };
        let merged = merge_scenario(&current, &patch);
        assert_eq!(merged.daily_tweet_limit, 25);
        assert_eq!(merged.min_followers, current.min_followers);
        assert_eq!(merged.bonus_multiplier, current.bonus_multiplier);
        assert_eq!(merged.categories, current.categories);
    }

    #[test]
    fn merge_applies_all_patched_fields() {
        let current = default_scenario(Tier::Micro);
        let patch = ScenarioPatch {
            daily_tweet_limit: Some(7),
            min_followers: Some(250),
            bonus_multiplier: Some(1.1),
        };
        let merged = merge_scenario(&current, &patch);
        assert_eq!(merged.daily_tweet_limit, 7);
        assert_eq!(merged.min_followers, 250);
        assert_eq!(merged.bonus_multiplier, 1.1);
    }

    #[test]
    fn multiplier_patch_clamps_to_minimum() {
        let current = default_scenario(Tier::Star);
        for bad in [0.0, -2.5, 0.99] {
            let merged = merge_scenario(
                &current,
                &ScenarioPatch {
                    bonus_multiplier: Some(bad),
                    ..Default::default()
                },
            );
            assert_eq!(merged.bonus_multiplier, 1.0);
        }
        let merged = merge_scenario(
            &current,
            &ScenarioPatch {
                bonus_multiplier: Some(2.5),
                ..Default::default()
            },
        );
        assert_eq!(merged.bonus_multiplier, 2.5);
    }

    #[test]
    fn empty_patch_is_detected() {
        assert!(ScenarioPatch::default().is_empty());
        assert!(!ScenarioPatch {
            min_followers: Some(1),
            ..Default::default()
        }
        .is_empty());
    }
}
