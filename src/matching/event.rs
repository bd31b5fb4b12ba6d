use crate::config::MatchingConfig;
use crate::domain::{Confidence, Event};
use crate::error::Result;
use crate::normalize::normalize_event_name;
use crate::similarity::similarity;
use crate::storage::Storage;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// An event name with the promotion prefix guaranteed to be present.
///
/// Legacy rows store names like "324" or "Fight Night Lewis vs Spivac"
/// without the promotion; both sides of a comparison must go through
/// [`canonicalize_event_name`] or exact/fuzzy matching silently fails.
/// `EventMatcher` only accepts this type, so the transform cannot be skipped
/// on one side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalEventName {
    name: String,
}

impl CanonicalEventName {
    pub fn as_str(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for CanonicalEventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Prefix an event name with its promotion unless it already carries it.
pub fn canonicalize_event_name(raw_name: &str, promotion: &str) -> CanonicalEventName {
    let trimmed = raw_name.trim();
    let key = normalize_event_name(trimmed);
    let promotion_key = normalize_event_name(promotion);

    let already_prefixed = !promotion_key.is_empty()
        && (key == promotion_key || key.starts_with(&format!("{} ", promotion_key)));

    let name = if already_prefixed || promotion_key.is_empty() || trimmed.is_empty() {
        trimmed.to_string()
    } else {
        format!("{} {}", promotion.trim(), trimmed)
    };
    CanonicalEventName { name }
}

/// Result of resolving a scraped event against the stored event directory
#[derive(Debug, Clone)]
pub struct EventMatch {
    pub event: Option<Event>,
    pub confidence: Confidence,
    pub reason: String,
}

impl EventMatch {
    fn none() -> Self {
        Self {
            event: None,
            confidence: Confidence::None,
            reason: "No matching event found".to_string(),
        }
    }
}

/// Resolves scraped event descriptions to canonical stored events.
pub struct EventMatcher {
    storage: Arc<dyn Storage>,
    config: MatchingConfig,
}

impl EventMatcher {
    pub fn new(storage: Arc<dyn Storage>, config: MatchingConfig) -> Self {
        Self { storage, config }
    }

    /// Try exact, numbered, then fuzzy resolution, in that order.
    pub async fn match_event(
        &self,
        scraped_name: &CanonicalEventName,
        promotion: &str,
    ) -> Result<EventMatch> {
        let candidates = self.storage.list_events_by_promotion(promotion).await?;
        if candidates.is_empty() {
            return Ok(EventMatch::none());
        }

        let scraped_key = normalize_event_name(scraped_name.as_str());

        // Strategy 1: exact name match within the promotion
        for event in &candidates {
            let candidate = canonicalize_event_name(&event.name, promotion);
            if normalize_event_name(candidate.as_str()) == scraped_key {
                return Ok(EventMatch {
                    event: Some(event.clone()),
                    confidence: Confidence::High,
                    reason: "Exact name match".to_string(),
                });
            }
        }

        // Strategy 2: numbered events ("UFC 300")
        if let Some(number) = extract_event_number(&scraped_key, promotion) {
            for event in &candidates {
                let candidate_key =
                    normalize_event_name(canonicalize_event_name(&event.name, promotion).as_str());
                if !candidate_key.contains(&number.to_string()) {
                    continue;
                }
                // Re-extract from the candidate so "UFC 300" cannot claim
                // "UFC 3001".
                if leading_event_number(&candidate_key, promotion) == Some(number) {
                    debug!("Numbered match: {} -> {}", scraped_name, event.name);
                    return Ok(EventMatch {
                        event: Some(event.clone()),
                        confidence: Confidence::High,
                        reason: format!("Event number match ({})", number),
                    });
                }
            }
        }

        // Strategy 3: fuzzy name similarity
        let mut best: Option<(Event, f64)> = None;
        for event in &candidates {
            let candidate_key =
                normalize_event_name(canonicalize_event_name(&event.name, promotion).as_str());
            let score = similarity(&scraped_key, &candidate_key);
            if best.as_ref().map_or(true, |(_, s)| score > *s) {
                best = Some((event.clone(), score));
            }
        }

        if let Some((event, score)) = best {
            if score >= self.config.event_fuzzy_threshold {
                let confidence = if score >= self.config.event_high_threshold {
                    Confidence::High
                } else if score >= self.config.event_medium_threshold {
                    Confidence::Medium
                } else {
                    Confidence::Low
                };
                return Ok(EventMatch {
                    event: Some(event),
                    confidence,
                    reason: format!("Fuzzy name match (score {:.2})", score),
                });
            }
        }

        Ok(EventMatch::none())
    }
}

/// Extract the event number when a normalized name is exactly
/// "<promotion> <n>" (optionally "#<n>").
fn extract_event_number(normalized_name: &str, promotion: &str) -> Option<u64> {
    let promotion_key = normalize_event_name(promotion);
    let pattern = format!(r"^{}\s*#?\s*(\d+)$", regex::escape(&promotion_key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(normalized_name)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

/// Extract the number directly following the promotion prefix, if any
/// ("ufc 300 pereira vs hill" -> 300).
fn leading_event_number(normalized_name: &str, promotion: &str) -> Option<u64> {
    let promotion_key = normalize_event_name(promotion);
    let pattern = format!(r"^{}\s*#?\s*(\d+)\b", regex::escape(&promotion_key));
    let re = Regex::new(&pattern).ok()?;
    re.captures(normalized_name)?
        .get(1)?
        .as_str()
        .parse()
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStorage, StoreSeed};
    use chrono::NaiveDate;

    fn seed_event(name: &str, promotion: &str) -> Event {
        Event {
            id: None,
            name: name.to_string(),
            date: NaiveDate::from_ymd_opt(2024, 4, 13).unwrap(),
            promotion: promotion.to_string(),
            created_at: chrono::Utc::now(),
        }
    }

    fn matcher(events: Vec<Event>) -> EventMatcher {
        let storage = Arc::new(InMemoryStorage::from_seed(StoreSeed {
            events,
            ..Default::default()
        }));
        EventMatcher::new(storage, MatchingConfig::default())
    }

    #[test]
    fn canonicalization_prefixes_bare_legacy_names() {
        assert_eq!(canonicalize_event_name("324", "UFC").as_str(), "UFC 324");
        assert_eq!(
            canonicalize_event_name("Fight Night Lewis vs Spivac", "UFC").as_str(),
            "UFC Fight Night Lewis vs Spivac"
        );
    }

    #[test]
    fn canonicalization_leaves_prefixed_names_alone() {
        assert_eq!(
            canonicalize_event_name("UFC 300: Pereira vs. Hill", "UFC").as_str(),
            "UFC 300: Pereira vs. Hill"
        );
        assert_eq!(
            canonicalize_event_name("  ufc 229  ", "UFC").as_str(),
            "ufc 229"
        );
    }

    #[tokio::test]
    async fn exact_match_wins_within_promotion() {
        let m = matcher(vec![
            seed_event("UFC 300: Pereira vs. Hill", "UFC"),
            seed_event("UFC 299: O'Malley vs. Vera 2", "UFC"),
        ]);
        let result = m
            .match_event(
                &canonicalize_event_name("UFC 300: Pereira vs. Hill", "UFC"),
                "UFC",
            )
            .await
            .unwrap();

        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.reason, "Exact name match");
        assert_eq!(result.event.unwrap().name, "UFC 300: Pereira vs. Hill");
    }

    #[tokio::test]
    async fn numbered_match_resolves_bare_event_numbers() {
        let m = matcher(vec![
            seed_event("UFC 300: Pereira vs. Hill", "UFC"),
            seed_event("UFC 299: O'Malley vs. Vera 2", "UFC"),
        ]);
        let result = m
            .match_event(&canonicalize_event_name("UFC 300", "UFC"), "UFC")
            .await
            .unwrap();

        assert_eq!(result.confidence, Confidence::High);
        assert_eq!(result.reason, "Event number match (300)");
        assert_eq!(result.event.unwrap().name, "UFC 300: Pereira vs. Hill");
    }

    #[tokio::test]
    async fn numbered_match_rejects_prefix_collisions() {
        let m = matcher(vec![seed_event("UFC 3001: Far Future", "UFC")]);
        let result = m
            .match_event(&canonicalize_event_name("UFC 300", "UFC"), "UFC")
            .await
            .unwrap();

        assert!(result.event.is_none());
        assert_eq!(result.confidence, Confidence::None);
    }

    #[tokio::test]
    async fn fuzzy_match_tolerates_spelling_drift() {
        let m = matcher(vec![seed_event("UFC Fight Night: Lewis vs. Spivac", "UFC")]);
        let result = m
            .match_event(
                &canonicalize_event_name("Fight Night Lewis vs Spivak", "UFC"),
                "UFC",
            )
            .await
            .unwrap();

        assert!(result.event.is_some(), "reason: {}", result.reason);
        assert!(result.confidence >= Confidence::Medium);
    }

    #[tokio::test]
    async fn unrelated_names_do_not_match() {
        let m = matcher(vec![seed_event("UFC 300: Pereira vs. Hill", "UFC")]);
        let result = m
            .match_event(
                &canonicalize_event_name("Bellator 301: Amosov vs. Jackson", "UFC"),
                "UFC",
            )
            .await
            .unwrap();

        assert!(result.event.is_none());
        assert_eq!(result.reason, "No matching event found");
    }
}
