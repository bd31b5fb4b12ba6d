use crate::config::MatchingConfig;
use crate::domain::{Confidence, Fight, ScrapedFight, WinnerOutcome};
use crate::matching::fighter::{score_name_match, split_full_name, NameMatch};
use tracing::debug;

/// Winner-side score required to accept a fight when the loser side fails to
/// corroborate.
const UNCORROBORATED_WINNER_MIN: f64 = 0.9;

/// Result of resolving a scraped fight against an event's stored fights
#[derive(Debug, Clone)]
pub struct FightMatch {
    pub fight_id: Option<uuid::Uuid>,
    pub winner: WinnerOutcome,
    pub confidence: Confidence,
    pub reason: String,
}

/// Canonicalize a free-text victory method ("tko (punches)" -> "TKO").
///
/// Substring rules run in fixed priority order; draw and no-contest come
/// first so "majority draw" never reads as a majority decision. Unrecognized
/// strings pass through with the first letter capitalized.
pub fn canonicalize_method(method: &str) -> String {
    let lower = method.trim().to_lowercase();

    if lower.contains("draw") {
        return "Draw".to_string();
    }
    if lower.contains("no contest") || lower == "nc" {
        return "No Contest".to_string();
    }
    if lower.contains("disqualification") || lower == "dq" {
        return "DQ".to_string();
    }
    if lower.contains("tko") || lower.contains("technical knockout") {
        return "TKO".to_string();
    }
    if lower.contains("ko") || lower.contains("knockout") {
        return "KO".to_string();
    }
    if lower.contains("submission") {
        return "Submission".to_string();
    }
    if lower.contains("unanimous") {
        return "Decision (Unanimous)".to_string();
    }
    if lower.contains("split") {
        return "Decision (Split)".to_string();
    }
    if lower.contains("majority") {
        return "Decision (Majority)".to_string();
    }
    if lower.contains("decision") {
        return "Decision".to_string();
    }

    let mut chars = method.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Matches scraped fight outcomes against stored fights and determines the
/// winning fighter.
pub struct FightMatcher {
    config: MatchingConfig,
}

struct Orientation {
    winner_match: NameMatch,
    loser_match: NameMatch,
}

impl FightMatcher {
    pub fn new(config: MatchingConfig) -> Self {
        Self { config }
    }

    /// Find the stored fight for a scraped result and decide the winner.
    pub fn match_fight(&self, scraped: &ScrapedFight, candidates: &[Fight]) -> FightMatch {
        let winner_name = scraped.winner.trim();
        let loser_name = scraped.loser.trim();

        if winner_name.is_empty() || loser_name.is_empty() {
            return FightMatch {
                fight_id: None,
                winner: WinnerOutcome::Undetermined,
                confidence: Confidence::None,
                reason: "Scraped fight is missing a winner or loser name".to_string(),
            };
        }

        // First pass: a candidate where one orientation matches both names.
        for fight in candidates {
            let (forward, reverse) = self.score_orientations(winner_name, loser_name, fight);
            let matched = (forward.winner_match.matches && forward.loser_match.matches)
                || (reverse.winner_match.matches && reverse.loser_match.matches);
            if matched {
                debug!(
                    "Matched scraped fight '{}' vs '{}' to stored fight {} vs {}",
                    winner_name, loser_name, fight.fighter1_name, fight.fighter2_name
                );
                return self.determine_winner(scraped, fight, forward, reverse);
            }
        }

        // Second pass: garbled loser names are common in scraped results, so
        // a candidate whose winner side matches is still accepted; the
        // missing corroboration caps confidence in determine_winner.
        for fight in candidates {
            let (forward, reverse) = self.score_orientations(winner_name, loser_name, fight);
            if forward.winner_match.matches || reverse.winner_match.matches {
                return self.determine_winner(scraped, fight, forward, reverse);
            }
        }

        FightMatch {
            fight_id: None,
            winner: WinnerOutcome::Undetermined,
            confidence: Confidence::None,
            reason: format!(
                "No matching fight found for '{}' vs '{}'",
                winner_name, loser_name
            ),
        }
    }

    /// Score both orientations of a candidate: winner as fighter1 with loser
    /// as fighter2 (forward), and the reverse.
    fn score_orientations(
        &self,
        winner_name: &str,
        loser_name: &str,
        fight: &Fight,
    ) -> (Orientation, Orientation) {
        let (f1_first, f1_last) = split_full_name(&fight.fighter1_name);
        let (f2_first, f2_last) = split_full_name(&fight.fighter2_name);
        let min = self.config.min_name_similarity;

        let forward = Orientation {
            winner_match: score_name_match(winner_name, &f1_first, &f1_last, min),
            loser_match: score_name_match(loser_name, &f2_first, &f2_last, min),
        };
        let reverse = Orientation {
            winner_match: score_name_match(winner_name, &f2_first, &f2_last, min),
            loser_match: score_name_match(loser_name, &f1_first, &f1_last, min),
        };
        (forward, reverse)
    }

    fn determine_winner(
        &self,
        scraped: &ScrapedFight,
        fight: &Fight,
        forward: Orientation,
        reverse: Orientation,
    ) -> FightMatch {
        let fight_id = fight.id;
        let method = scraped.method.to_lowercase();

        if method.contains("draw") {
            return FightMatch {
                fight_id,
                winner: WinnerOutcome::Draw,
                confidence: Confidence::High,
                reason: "Method indicates a draw".to_string(),
            };
        }
        if method.contains("no contest") || method.trim() == "nc" {
            return FightMatch {
                fight_id,
                winner: WinnerOutcome::NoContest,
                confidence: Confidence::High,
                reason: "Method indicates a no contest".to_string(),
            };
        }

        // Corroborated orientations: winner matches one fighter AND loser
        // matches the other. Prefer the better-scoring orientation if both
        // somehow clear.
        let forward_ok = forward.winner_match.matches && forward.loser_match.matches;
        let reverse_ok = reverse.winner_match.matches && reverse.loser_match.matches;
        let forward_avg = (forward.winner_match.score + forward.loser_match.score) / 2.0;
        let reverse_avg = (reverse.winner_match.score + reverse.loser_match.score) / 2.0;

        if forward_ok || reverse_ok {
            let (winner_id, avg) = if forward_ok && (!reverse_ok || forward_avg >= reverse_avg) {
                (fight.fighter1_id, forward_avg)
            } else {
                (fight.fighter2_id, reverse_avg)
            };
            let confidence = if avg >= self.config.winner_high_threshold {
                Confidence::High
            } else if avg >= self.config.winner_medium_threshold {
                Confidence::Medium
            } else {
                Confidence::Low
            };
            return FightMatch {
                fight_id,
                winner: WinnerOutcome::FighterWin(winner_id),
                confidence,
                reason: format!(
                    "Winner and loser both matched (avg score {:.2})",
                    avg
                ),
            };
        }

        // Uncorroborated winner: trust a strong winner-side match but cap
        // confidence, and say which loser name failed to resolve.
        if forward.winner_match.score >= UNCORROBORATED_WINNER_MIN {
            return FightMatch {
                fight_id,
                winner: WinnerOutcome::FighterWin(fight.fighter1_id),
                confidence: Confidence::Medium,
                reason: format!(
                    "Winner matched {} but loser '{}' did not match {}",
                    fight.fighter1_name, scraped.loser, fight.fighter2_name
                ),
            };
        }
        if reverse.winner_match.score >= UNCORROBORATED_WINNER_MIN {
            return FightMatch {
                fight_id,
                winner: WinnerOutcome::FighterWin(fight.fighter2_id),
                confidence: Confidence::Medium,
                reason: format!(
                    "Winner matched {} but loser '{}' did not match {}",
                    fight.fighter2_name, scraped.loser, fight.fighter1_name
                ),
            };
        }

        let failing_side = if forward.winner_match.score.max(reverse.winner_match.score)
            < forward.loser_match.score.max(reverse.loser_match.score)
        {
            format!("winner '{}'", scraped.winner)
        } else {
            format!("loser '{}'", scraped.loser)
        };
        FightMatch {
            fight_id,
            winner: WinnerOutcome::Undetermined,
            confidence: Confidence::Low,
            reason: format!("Could not resolve {} to a stored fighter", failing_side),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn fight(fighter1: &str, fighter2: &str) -> Fight {
        Fight {
            id: Some(Uuid::new_v4()),
            event_id: Uuid::new_v4(),
            fighter1_id: Uuid::new_v4(),
            fighter2_id: Uuid::new_v4(),
            fighter1_name: fighter1.to_string(),
            fighter2_name: fighter2.to_string(),
            winner: None,
            method: None,
            round: None,
            time: None,
            has_started: false,
            is_complete: false,
            created_at: Utc::now(),
        }
    }

    fn scraped(winner: &str, loser: &str, method: &str) -> ScrapedFight {
        ScrapedFight {
            card_type: None,
            weight_class: None,
            winner: winner.to_string(),
            loser: loser.to_string(),
            method: method.to_string(),
            round: None,
            time: None,
            notes: None,
        }
    }

    fn matcher() -> FightMatcher {
        FightMatcher::new(MatchingConfig::default())
    }

    #[test]
    fn forward_orientation_resolves_winner() {
        let f = fight("Jon Jones", "Stipe Miocic");
        let result = matcher().match_fight(&scraped("Jon Jones", "Stipe Miocic", "TKO"), &[f.clone()]);

        assert_eq!(result.fight_id, f.id);
        assert_eq!(result.winner, WinnerOutcome::FighterWin(f.fighter1_id));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn reverse_orientation_resolves_swapped_order() {
        // Stored order has the loser first
        let f = fight("Conor McGregor", "Michael Chandler");
        let result = matcher().match_fight(
            &scraped("Michael Chandler", "Conor McGregor", "Decision (Unanimous)"),
            &[f.clone()],
        );

        assert_eq!(result.fight_id, f.id);
        assert_eq!(result.winner, WinnerOutcome::FighterWin(f.fighter2_id));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn draw_method_yields_draw_sentinel() {
        let f = fight("Jon Jones", "Stipe Miocic");
        let result = matcher().match_fight(&scraped("Jon Jones", "Stipe Miocic", "Majority Draw"), &[f]);

        assert_eq!(result.winner, WinnerOutcome::Draw);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn no_contest_method_yields_nc_sentinel() {
        let f = fight("Jon Jones", "Stipe Miocic");
        let result = matcher().match_fight(&scraped("Jon Jones", "Stipe Miocic", "NC"), &[f]);

        assert_eq!(result.winner, WinnerOutcome::NoContest);
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn variation_boost_carries_fight_match() {
        let f = fight("Jon Jones", "Alexander Volkanovski");
        let result = matcher().match_fight(
            &scraped("Jon Jones", "Alex Volkanovski", "TKO (Punches)"),
            &[f.clone()],
        );

        assert_eq!(result.fight_id, f.id);
        assert_eq!(result.winner, WinnerOutcome::FighterWin(f.fighter1_id));
        assert_eq!(result.confidence, Confidence::High);
    }

    #[test]
    fn uncorroborated_winner_is_capped_at_medium() {
        let f = fight("Jan Blachowicz", "Aleksandar Rakic");
        // Winner is close but not exact; loser is garbage from the scrape
        let result = matcher().match_fight(
            &scraped("Jan Blachowycz", "Aleksander Rakitic III", "TKO"),
            &[f.clone()],
        );

        assert_eq!(result.fight_id, f.id);
        assert_eq!(result.winner, WinnerOutcome::FighterWin(f.fighter1_id));
        assert_eq!(result.confidence, Confidence::Medium);
        assert!(
            result.reason.contains("did not match"),
            "reason: {}",
            result.reason
        );
    }

    #[test]
    fn unmatched_candidates_report_both_names() {
        let f = fight("Sean O'Malley", "Marlon Vera");
        let result = matcher().match_fight(&scraped("Jon Jones", "Stipe Miocic", "KO"), &[f]);

        assert!(result.fight_id.is_none());
        assert_eq!(result.confidence, Confidence::None);
        assert!(result.reason.contains("Jon Jones"));
        assert!(result.reason.contains("Stipe Miocic"));
    }

    #[test]
    fn missing_names_degrade_gracefully() {
        let f = fight("Jon Jones", "Stipe Miocic");
        let result = matcher().match_fight(&scraped("", "Stipe Miocic", "KO"), &[f]);

        assert!(result.fight_id.is_none());
        assert_eq!(result.confidence, Confidence::None);
        assert!(result.reason.contains("missing"));
    }

    #[test]
    fn method_canonicalization_priority() {
        assert_eq!(canonicalize_method("ko"), "KO");
        assert_eq!(canonicalize_method("TKO (Punches)"), "TKO");
        assert_eq!(canonicalize_method("technical knockout"), "TKO");
        assert_eq!(canonicalize_method("Submission (Rear-Naked Choke)"), "Submission");
        assert_eq!(canonicalize_method("Decision (Unanimous)"), "Decision (Unanimous)");
        assert_eq!(canonicalize_method("split decision"), "Decision (Split)");
        assert_eq!(canonicalize_method("majority decision"), "Decision (Majority)");
        assert_eq!(canonicalize_method("Majority Draw"), "Draw");
        assert_eq!(canonicalize_method("No Contest (Accidental Eye Poke)"), "No Contest");
        assert_eq!(canonicalize_method("nc"), "No Contest");
        assert_eq!(canonicalize_method("dq"), "DQ");
        assert_eq!(canonicalize_method("forfeit"), "Forfeit");
        assert_eq!(canonicalize_method(""), "");
    }
}
