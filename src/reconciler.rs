use crate::config::MatchingConfig;
use crate::domain::{
    Confidence, FightOutcome, ReconciliationRun, ScrapedEvent, ScrapedFight, WinnerOutcome,
};
use crate::error::Result;
use crate::matching::{
    canonicalize_event_name, canonicalize_method, EventMatcher, FightMatcher,
};
use crate::storage::Storage;
use chrono::Utc;
use metrics::{counter, histogram};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Options for a reconciliation run
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub dry_run: bool,
    pub min_confidence: Confidence,
    pub verbose: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            min_confidence: Confidence::Medium,
            verbose: false,
        }
    }
}

/// A scraped event that could not be resolved to a stored event
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmatchedEvent {
    pub event_name: String,
    pub reason: String,
}

/// A scraped fight recorded in the report with its resolution reason
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FightReportItem {
    pub event_name: String,
    pub winner: String,
    pub loser: String,
    pub confidence: Confidence,
    pub reason: String,
}

/// A caught per-item failure, with enough context for manual follow-up
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportError {
    pub event_name: String,
    pub context: String,
    pub error: String,
}

/// Aggregate result of one reconciliation run
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationReport {
    pub promotion: String,
    pub dry_run: bool,
    pub events_processed: usize,
    pub events_matched: usize,
    pub events_unmatched: usize,
    pub fights_processed: usize,
    pub fights_updated: usize,
    pub fights_low_confidence: usize,
    pub fights_unmatched: usize,
    pub write_errors: usize,
    pub unmatched_events: Vec<UnmatchedEvent>,
    pub low_confidence_fights: Vec<FightReportItem>,
    pub unmatched_fights: Vec<FightReportItem>,
    pub errors: Vec<ReportError>,
}

/// Batch orchestrator: resolves scraped events and fights against the store
/// and writes gated fight outcomes through it.
pub struct Reconciler {
    storage: Arc<dyn Storage>,
    event_matcher: EventMatcher,
    fight_matcher: FightMatcher,
}

impl Reconciler {
    pub fn new(storage: Arc<dyn Storage>, config: MatchingConfig) -> Self {
        Self {
            event_matcher: EventMatcher::new(storage.clone(), config.clone()),
            fight_matcher: FightMatcher::new(config),
            storage,
        }
    }

    /// Reconcile a batch of scraped events against the store.
    ///
    /// One bad record never aborts the batch: per-item failures are counted,
    /// recorded in the report and processing moves on.
    #[instrument(skip(self, scraped_events, promotion, options), fields(promotion = %promotion))]
    pub async fn run(
        &self,
        scraped_events: &[ScrapedEvent],
        promotion: &str,
        options: &RunOptions,
    ) -> Result<ReconciliationReport> {
        let mut run = ReconciliationRun::new(
            self.run_name(promotion, options),
            promotion.to_string(),
            options.dry_run,
        );
        self.storage.create_run(&mut run).await?;
        info!(run_id = ?run.id, "Starting reconciliation run");
        counter!("fightrec_runs_total", "promotion" => promotion.to_string()).increment(1);
        let run_start = std::time::Instant::now();

        let mut report = ReconciliationReport {
            promotion: promotion.to_string(),
            dry_run: options.dry_run,
            ..Default::default()
        };

        for scraped_event in scraped_events {
            report.events_processed += 1;
            if let Err(e) = self
                .process_scraped_event(scraped_event, promotion, options, &mut report)
                .await
            {
                error!("Failed to process event {}: {}", scraped_event.event_name, e);
                report.errors.push(ReportError {
                    event_name: scraped_event.event_name.clone(),
                    context: "event processing".to_string(),
                    error: e.to_string(),
                });
            }
        }

        run.finish();
        self.storage.update_run(&run).await?;

        let duration = run_start.elapsed().as_secs_f64();
        histogram!("fightrec_run_duration_seconds", "promotion" => promotion.to_string())
            .record(duration);
        counter!("fightrec_events_matched_total", "promotion" => promotion.to_string())
            .increment(report.events_matched as u64);
        counter!("fightrec_fights_updated_total", "promotion" => promotion.to_string())
            .increment(report.fights_updated as u64);

        info!(
            run_id = ?run.id,
            "Finished reconciliation run: {}/{} events matched, {} fights updated",
            report.events_matched,
            report.events_processed,
            report.fights_updated
        );
        Ok(report)
    }

    async fn process_scraped_event(
        &self,
        scraped_event: &ScrapedEvent,
        promotion: &str,
        options: &RunOptions,
        report: &mut ReconciliationReport,
    ) -> Result<()> {
        let canonical = canonicalize_event_name(&scraped_event.event_name, promotion);
        let event_match = self.event_matcher.match_event(&canonical, promotion).await?;

        let event = match event_match.event {
            Some(event) => event,
            None => {
                warn!(
                    "No stored event for '{}': {}",
                    scraped_event.event_name, event_match.reason
                );
                report.events_unmatched += 1;
                report.unmatched_events.push(UnmatchedEvent {
                    event_name: scraped_event.event_name.clone(),
                    reason: event_match.reason,
                });
                return Ok(());
            }
        };

        if options.verbose {
            info!(
                "Matched '{}' -> '{}' ({}, {})",
                scraped_event.event_name, event.name, event_match.confidence, event_match.reason
            );
        } else {
            debug!(
                "Matched '{}' -> '{}' ({})",
                scraped_event.event_name, event.name, event_match.confidence
            );
        }
        report.events_matched += 1;

        let event_id = event.id.expect("stored event has id");
        let stored_fights = self.storage.get_fights_for_event(event_id).await?;
        // Only fights without an outcome are candidates for reconciliation
        let pending: Vec<_> = stored_fights
            .into_iter()
            .filter(|f| f.winner.is_none())
            .collect();

        for scraped_fight in &scraped_event.fights {
            report.fights_processed += 1;
            self.process_scraped_fight(scraped_fight, &event.name, &pending, options, report)
                .await;
        }

        Ok(())
    }

    async fn process_scraped_fight(
        &self,
        scraped_fight: &ScrapedFight,
        event_name: &str,
        pending: &[crate::domain::Fight],
        options: &RunOptions,
        report: &mut ReconciliationReport,
    ) {
        let fight_match = self.fight_matcher.match_fight(scraped_fight, pending);

        let fight_id = match fight_match.fight_id {
            Some(id) => id,
            None => {
                report.fights_unmatched += 1;
                report.unmatched_fights.push(FightReportItem {
                    event_name: event_name.to_string(),
                    winner: scraped_fight.winner.clone(),
                    loser: scraped_fight.loser.clone(),
                    confidence: fight_match.confidence,
                    reason: fight_match.reason,
                });
                return;
            }
        };

        // An undetermined winner never produces a write instruction, no
        // matter how low the configured threshold is.
        let gated = fight_match.winner == WinnerOutcome::Undetermined
            || !fight_match.confidence.meets_threshold(options.min_confidence);
        if gated {
            if options.verbose {
                info!(
                    "Below threshold ({} < {}): '{}' vs '{}': {}",
                    fight_match.confidence,
                    options.min_confidence,
                    scraped_fight.winner,
                    scraped_fight.loser,
                    fight_match.reason
                );
            }
            report.fights_low_confidence += 1;
            report.low_confidence_fights.push(FightReportItem {
                event_name: event_name.to_string(),
                winner: scraped_fight.winner.clone(),
                loser: scraped_fight.loser.clone(),
                confidence: fight_match.confidence,
                reason: fight_match.reason,
            });
            return;
        }

        let outcome = FightOutcome {
            winner: fight_match.winner.as_sentinel(),
            method: Some(canonicalize_method(&scraped_fight.method)),
            round: scraped_fight.round,
            time: scraped_fight.time.clone(),
        };

        report.fights_updated += 1;
        if options.dry_run {
            info!(
                "[dry-run] Would update fight {}: '{}' def. '{}' ({})",
                fight_id, scraped_fight.winner, scraped_fight.loser, fight_match.confidence
            );
            return;
        }

        if let Err(e) = self.storage.update_fight_outcome(fight_id, &outcome).await {
            error!("Failed to write outcome for fight {}: {}", fight_id, e);
            report.write_errors += 1;
            report.errors.push(ReportError {
                event_name: event_name.to_string(),
                context: format!(
                    "outcome write for '{}' vs '{}'",
                    scraped_fight.winner, scraped_fight.loser
                ),
                error: e.to_string(),
            });
        } else {
            debug!(
                "Updated fight {}: '{}' def. '{}'",
                fight_id, scraped_fight.winner, scraped_fight.loser
            );
        }
    }

    fn run_name(&self, promotion: &str, options: &RunOptions) -> String {
        format!(
            "Reconciliation Run - {} - Min Confidence: {} - Dry Run: {}",
            promotion, options.min_confidence, options.dry_run
        )
    }
}

/// Persist a report to `<output_dir>/reconciliation_<timestamp>.json`.
pub fn persist_report(report: &ReconciliationReport, output_dir: &str) -> Result<String> {
    fs::create_dir_all(output_dir)?;

    let timestamp = Utc::now().format("%Y%m%d_%H%M%S");
    let filename = format!("reconciliation_{timestamp}.json");
    let filepath = Path::new(output_dir).join(&filename);

    let json_content = serde_json::to_string_pretty(report)?;
    fs::write(&filepath, json_content)?;

    Ok(filepath.to_string_lossy().to_string())
}
