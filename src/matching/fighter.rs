use crate::config::MatchingConfig;
use crate::domain::{Fighter, FighterAlias, FighterArgs};
use crate::error::{ReconcilerError, Result};
use crate::normalize::normalize_name;
use crate::similarity::similarity;
use crate::storage::Storage;
use crate::variations::are_variations;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Last names discriminate better than first names in fight rosters, so the
/// combined score leans on them.
const LAST_NAME_WEIGHT: f64 = 0.6;
const FIRST_NAME_WEIGHT: f64 = 0.4;

/// A variation-confirmed first name lifts the combined score to at least
/// this, provided the last name is essentially identical.
const VARIATION_SCORE_FLOOR: f64 = 0.9;
const VARIATION_LAST_NAME_MIN: f64 = 0.9;

/// Result of scoring one scraped name against one stored fighter name
#[derive(Debug, Clone)]
pub struct NameMatch {
    pub matches: bool,
    pub score: f64,
    pub reason: String,
}

impl NameMatch {
    fn no_match(score: f64) -> Self {
        Self {
            matches: false,
            score,
            reason: "No match".to_string(),
        }
    }
}

/// How a directory candidate was found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    Exact,
    Alias,
    Variation,
    Fuzzy,
}

/// A scored candidate from a directory search
#[derive(Debug, Clone)]
pub struct FighterCandidate {
    pub fighter: Fighter,
    pub score: f64,
    pub match_type: MatchType,
}

/// Options for a directory search
#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub min_similarity: f64,
    pub limit: usize,
    pub include_aliases: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            min_similarity: 0.7,
            limit: 10,
            include_aliases: true,
        }
    }
}

/// Result of a fuzzy upsert into the fighter directory
#[derive(Debug, Clone)]
pub struct UpsertResult {
    pub id: Uuid,
    pub was_created: bool,
    pub match_type: Option<MatchType>,
}

/// Split a full name into (first, last) by treating the final token as the
/// last name. Single-token names become an empty first name.
pub fn split_full_name(full_name: &str) -> (String, String) {
    let tokens: Vec<&str> = full_name.split_whitespace().collect();
    match tokens.as_slice() {
        [] => (String::new(), String::new()),
        [only] => (String::new(), (*only).to_string()),
        [rest @ .., last] => (rest.join(" "), (*last).to_string()),
    }
}

/// Score whether a scraped full name denotes the stored (first, last) pair.
///
/// Exact normalized equality wins outright; otherwise the candidate is split
/// on its final token and compared piecewise, weighted toward the last name,
/// with the variation table able to lift nickname-style first names. A
/// whole-string comparison backstops names that split badly
/// (e.g. "Jan Blachowicz Jr").
pub fn score_name_match(
    candidate_name: &str,
    db_first_name: &str,
    db_last_name: &str,
    min_similarity: f64,
) -> NameMatch {
    let candidate_full = normalize_name(candidate_name);
    let db_full = normalize_name(&format!("{} {}", db_first_name, db_last_name));

    if candidate_full.is_empty() || db_full.is_empty() {
        return NameMatch::no_match(0.0);
    }

    if candidate_full == db_full {
        return NameMatch {
            matches: true,
            score: 1.0,
            reason: "Exact match".to_string(),
        };
    }

    let (candidate_first, candidate_last) = split_full_name(candidate_name);
    let last_sim = similarity(&normalize_name(&candidate_last), &normalize_name(db_last_name));
    let first_sim = similarity(&normalize_name(&candidate_first), &normalize_name(db_first_name));
    let is_variation = are_variations(&candidate_first, db_first_name);

    let mut combined = last_sim * LAST_NAME_WEIGHT + first_sim * FIRST_NAME_WEIGHT;
    if is_variation && last_sim >= VARIATION_LAST_NAME_MIN {
        combined = combined.max(VARIATION_SCORE_FLOOR);
    }

    if combined >= min_similarity {
        let reason = if is_variation {
            format!(
                "Name variation match ({} ~ {})",
                candidate_first, db_first_name
            )
        } else {
            "Fuzzy name match".to_string()
        };
        return NameMatch {
            matches: true,
            score: combined,
            reason,
        };
    }

    // Names with suffixes or unhyphenated double-barrels split badly; give
    // the whole string a chance before giving up.
    let full_sim = similarity(&candidate_full, &db_full);
    if full_sim >= min_similarity {
        return NameMatch {
            matches: true,
            score: full_sim,
            reason: "Full name similarity match".to_string(),
        };
    }

    NameMatch::no_match(combined.max(full_sim))
}

/// Matches scraped fighter names against the canonical fighter directory.
pub struct FighterMatcher {
    storage: Arc<dyn Storage>,
    config: MatchingConfig,
}

impl FighterMatcher {
    pub fn new(storage: Arc<dyn Storage>, config: MatchingConfig) -> Self {
        Self { storage, config }
    }

    /// Search the directory for fighters matching (first, last).
    ///
    /// Exact and alias hits return immediately as single 1.0-scored results;
    /// otherwise every fighter is scored and the best survivors are returned
    /// in descending score order.
    pub async fn find_matches(
        &self,
        first_name: &str,
        last_name: &str,
        options: &SearchOptions,
    ) -> Result<Vec<FighterCandidate>> {
        if let Some(fighter) = self
            .storage
            .get_fighter_by_name(first_name, last_name)
            .await?
        {
            return Ok(vec![FighterCandidate {
                fighter,
                score: 1.0,
                match_type: MatchType::Exact,
            }]);
        }

        if options.include_aliases {
            if let Some(alias) = self.storage.find_alias(first_name, last_name).await? {
                if let Some(fighter) = self.storage.get_fighter(alias.fighter_id).await? {
                    debug!(
                        "Alias hit: {} {} -> {}",
                        first_name,
                        last_name,
                        fighter.full_name()
                    );
                    return Ok(vec![FighterCandidate {
                        fighter,
                        score: 1.0,
                        match_type: MatchType::Alias,
                    }]);
                }
            }
        }

        // Full fuzzy scan of the directory. Linear, which is fine at tens of
        // thousands of fighters; anything larger belongs behind a blocking
        // index inside the Storage implementation.
        let candidate_name = format!("{} {}", first_name, last_name);
        let mut candidates = Vec::new();
        for fighter in self.storage.list_fighters().await? {
            let result = score_name_match(
                &candidate_name,
                &fighter.first_name,
                &fighter.last_name,
                options.min_similarity,
            );
            if result.matches {
                let match_type = if are_variations(first_name, &fighter.first_name) {
                    MatchType::Variation
                } else {
                    MatchType::Fuzzy
                };
                candidates.push(FighterCandidate {
                    fighter,
                    score: result.score,
                    match_type,
                });
            }
        }

        candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(options.limit);
        Ok(candidates)
    }

    /// Create or update a fighter, matching fuzzily before creating.
    ///
    /// Alias and fuzzy matches record the scraped spelling as an alias so the
    /// next run resolves it exactly. Creation races are resolved by
    /// re-fetching the exact match a concurrent caller created.
    pub async fn upsert_with_fuzzy_match(&self, args: &FighterArgs) -> Result<UpsertResult> {
        // Exact matches update in place and never record aliases.
        if let Some(existing) = self
            .storage
            .get_fighter_by_name(&args.first_name, &args.last_name)
            .await?
        {
            let id = self.apply_update(existing, args).await?;
            return Ok(UpsertResult {
                id,
                was_created: false,
                match_type: Some(MatchType::Exact),
            });
        }

        if let Some(alias) = self
            .storage
            .find_alias(&args.first_name, &args.last_name)
            .await?
        {
            if let Some(existing) = self.storage.get_fighter(alias.fighter_id).await? {
                let id = self.apply_update(existing, args).await?;
                self.record_alias(id, args).await?;
                return Ok(UpsertResult {
                    id,
                    was_created: false,
                    match_type: Some(MatchType::Alias),
                });
            }
        }

        let options = SearchOptions {
            min_similarity: self.config.min_name_similarity,
            limit: 1,
            include_aliases: false,
        };
        let fuzzy = self
            .find_matches(&args.first_name, &args.last_name, &options)
            .await?;
        if let Some(best) = fuzzy.into_iter().next() {
            info!(
                "Fuzzy upsert matched {} {} -> {} (score {:.3})",
                args.first_name,
                args.last_name,
                best.fighter.full_name(),
                best.score
            );
            let id = self.apply_update(best.fighter, args).await?;
            self.record_alias(id, args).await?;
            return Ok(UpsertResult {
                id,
                was_created: false,
                match_type: Some(best.match_type),
            });
        }

        let mut fighter = Fighter::new(args);
        match self.storage.create_fighter(&mut fighter).await {
            Ok(()) => Ok(UpsertResult {
                id: fighter.id.expect("storage assigns id on create"),
                was_created: true,
                match_type: None,
            }),
            Err(ReconcilerError::DuplicateFighter { .. }) => {
                // Lost a creation race; the winner's row is now the match.
                warn!(
                    "Concurrent creation of {} {}, updating existing row",
                    args.first_name, args.last_name
                );
                let existing = self
                    .storage
                    .get_fighter_by_name(&args.first_name, &args.last_name)
                    .await?
                    .ok_or_else(|| ReconcilerError::Storage {
                        message: format!(
                            "Fighter {} {} vanished after duplicate-create conflict",
                            args.first_name, args.last_name
                        ),
                    })?;
                let id = self.apply_update(existing, args).await?;
                Ok(UpsertResult {
                    id,
                    was_created: false,
                    match_type: Some(MatchType::Exact),
                })
            }
            Err(e) => Err(e),
        }
    }

    async fn apply_update(&self, mut fighter: Fighter, args: &FighterArgs) -> Result<Uuid> {
        if args.nickname.is_some() {
            fighter.nickname = args.nickname.clone();
        }
        if args.weight_class.is_some() {
            fighter.weight_class = args.weight_class.clone();
        }
        self.storage.update_fighter(&fighter).await?;
        Ok(fighter.id.expect("stored fighter has id"))
    }

    async fn record_alias(&self, fighter_id: Uuid, args: &FighterArgs) -> Result<()> {
        let mut alias = FighterAlias {
            id: None,
            fighter_id,
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            source: args.source.clone(),
            created_at: Utc::now(),
        };
        self.storage.create_alias(&mut alias).await
    }
}
