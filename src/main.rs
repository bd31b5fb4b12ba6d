use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use fightrec::config::Config;
use fightrec::domain::{Confidence, ScrapedEvent};
use fightrec::logging;
use fightrec::matching::{canonicalize_event_name, EventMatcher, FighterMatcher, SearchOptions};
use fightrec::reconciler::{persist_report, Reconciler, RunOptions};
use fightrec::storage::{InMemoryStorage, Storage};

#[derive(Parser)]
#[command(name = "fightrec")]
#[command(about = "Combat-sports fight outcome reconciliation engine")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile scraped event results against the stored directory
    Reconcile {
        /// JSON file of scraped events
        #[arg(long)]
        events: PathBuf,
        /// JSON seed file with fighters, events and fights
        #[arg(long)]
        store: PathBuf,
        /// Promotion the scraped events belong to
        #[arg(long)]
        promotion: String,
        /// Match and report without writing any outcomes
        #[arg(long)]
        dry_run: bool,
        /// Minimum confidence required to write an outcome
        #[arg(long, default_value = "medium")]
        min_confidence: Confidence,
        /// Log every match decision
        #[arg(long)]
        verbose: bool,
        /// Directory for the report file
        #[arg(long, default_value = "output")]
        output_dir: String,
    },
    /// Search the fighter directory for a name
    MatchFighter {
        /// JSON seed file with fighters and aliases
        #[arg(long)]
        store: PathBuf,
        /// Full name to search for
        #[arg(long)]
        name: String,
    },
    /// Resolve an event name against the stored events of a promotion
    MatchEvent {
        /// JSON seed file with events
        #[arg(long)]
        store: PathBuf,
        /// Promotion to search within
        #[arg(long)]
        promotion: String,
        /// Scraped event name
        #[arg(long)]
        name: String,
    },
}

fn load_scraped_events(path: &PathBuf) -> Result<Vec<ScrapedEvent>, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let verbose = matches!(&cli.command, Commands::Reconcile { verbose: true, .. });
    logging::init_logging(verbose);

    let config = Config::load()?;

    match cli.command {
        Commands::Reconcile {
            events,
            store,
            promotion,
            dry_run,
            min_confidence,
            verbose,
            output_dir,
        } => {
            println!("🔄 Running reconciliation for {}...", promotion);

            let scraped_events = load_scraped_events(&events)?;
            let storage = Arc::new(InMemoryStorage::from_seed_file(&store)?);
            info!(
                "Loaded {} scraped events and store seed from {}",
                scraped_events.len(),
                store.display()
            );

            let reconciler = Reconciler::new(storage, config.matching);
            let options = RunOptions {
                dry_run,
                min_confidence,
                verbose,
            };
            match reconciler.run(&scraped_events, &promotion, &options).await {
                Ok(report) => {
                    println!("\n📊 Reconciliation Results for {}:", promotion);
                    println!(
                        "   Events: {} processed, {} matched, {} unmatched",
                        report.events_processed, report.events_matched, report.events_unmatched
                    );
                    println!(
                        "   Fights: {} processed, {} updated{}, {} low-confidence, {} unmatched",
                        report.fights_processed,
                        report.fights_updated,
                        if dry_run { " (dry run)" } else { "" },
                        report.fights_low_confidence,
                        report.fights_unmatched
                    );
                    if report.write_errors > 0 {
                        println!("   ⚠️  Write errors: {}", report.write_errors);
                    }
                    for item in &report.unmatched_events {
                        println!("   ❓ Unmatched event: {} ({})", item.event_name, item.reason);
                    }
                    for item in &report.low_confidence_fights {
                        println!(
                            "   ⚠️  Low confidence [{}]: '{}' vs '{}': {}",
                            item.confidence, item.winner, item.loser, item.reason
                        );
                    }

                    let report_file = persist_report(&report, &output_dir)?;
                    println!("\n💾 Report saved to {}", report_file);
                }
                Err(e) => {
                    error!("Reconciliation failed: {}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::MatchFighter { store, name } => {
            let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::from_seed_file(&store)?);
            let options = SearchOptions {
                min_similarity: config.matching.min_search_similarity,
                ..Default::default()
            };
            let matcher = FighterMatcher::new(storage, config.matching);

            let (first_name, last_name) = fightrec::matching::split_full_name(&name);
            let matches = matcher
                .find_matches(&first_name, &last_name, &options)
                .await?;

            if matches.is_empty() {
                println!("No candidates for '{}'", name);
            } else {
                println!("Candidates for '{}':", name);
                for candidate in matches {
                    println!(
                        "   {:.3}  {} ({:?})",
                        candidate.score,
                        candidate.fighter.full_name(),
                        candidate.match_type
                    );
                }
            }
        }
        Commands::MatchEvent {
            store,
            promotion,
            name,
        } => {
            let storage: Arc<dyn Storage> = Arc::new(InMemoryStorage::from_seed_file(&store)?);
            let matcher = EventMatcher::new(storage, config.matching);

            let canonical = canonicalize_event_name(&name, &promotion);
            let result = matcher.match_event(&canonical, &promotion).await?;
            match result.event {
                Some(event) => println!(
                    "✅ {} -> {} [{}] ({})",
                    name, event.name, result.confidence, result.reason
                ),
                None => println!("❓ {} -> no match ({})", name, result.reason),
            }
        }
    }

    Ok(())
}
