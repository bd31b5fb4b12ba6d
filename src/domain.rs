use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// How certain the pipeline is that two records denote the same entity.
///
/// The derived ordering is load-bearing: every downstream consumer gates
/// results with `meets_threshold`, which compares ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
}

impl Confidence {
    pub fn meets_threshold(&self, min: Confidence) -> bool {
        *self >= min
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Confidence::None => write!(f, "NONE"),
            Confidence::Low => write!(f, "LOW"),
            Confidence::Medium => write!(f, "MEDIUM"),
            Confidence::High => write!(f, "HIGH"),
        }
    }
}

impl FromStr for Confidence {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(Confidence::None),
            "low" => Ok(Confidence::Low),
            "medium" => Ok(Confidence::Medium),
            "high" => Ok(Confidence::High),
            other => Err(format!("unknown confidence level: {}", other)),
        }
    }
}

/// Outcome of a fight as determined by the matcher.
///
/// The legacy schema stores `"draw"` and `"nc"` sentinels in the same column
/// that holds a winner id; in-core those are distinct variants and the
/// sentinel strings only exist at the persistence edge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WinnerOutcome {
    FighterWin(Uuid),
    Draw,
    NoContest,
    Undetermined,
}

impl WinnerOutcome {
    pub const DRAW_SENTINEL: &'static str = "draw";
    pub const NO_CONTEST_SENTINEL: &'static str = "nc";

    /// Legacy string form written to the fight row's winner column.
    pub fn as_sentinel(&self) -> Option<String> {
        match self {
            WinnerOutcome::FighterWin(id) => Some(id.to_string()),
            WinnerOutcome::Draw => Some(Self::DRAW_SENTINEL.to_string()),
            WinnerOutcome::NoContest => Some(Self::NO_CONTEST_SENTINEL.to_string()),
            WinnerOutcome::Undetermined => None,
        }
    }

    pub fn from_sentinel(value: Option<&str>) -> Self {
        match value {
            None => WinnerOutcome::Undetermined,
            Some(s) if s == Self::DRAW_SENTINEL => WinnerOutcome::Draw,
            Some(s) if s == Self::NO_CONTEST_SENTINEL => WinnerOutcome::NoContest,
            Some(s) => match Uuid::parse_str(s) {
                Ok(id) => WinnerOutcome::FighterWin(id),
                Err(_) => WinnerOutcome::Undetermined,
            },
        }
    }
}

/// A fighter in the canonical directory
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fighter {
    pub id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub weight_class: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// An alternate spelling that resolves to one canonical fighter
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FighterAlias {
    pub id: Option<Uuid>,
    pub fighter_id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub source: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A canonical stored event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Option<Uuid>,
    pub name: String,
    pub date: NaiveDate,
    pub promotion: String,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

/// A stored fight between two fighters
///
/// The matcher only reads the denormalized name projections and writes the
/// outcome fields; it never creates or deletes fight rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fight {
    pub id: Option<Uuid>,
    pub event_id: Uuid,
    pub fighter1_id: Uuid,
    pub fighter2_id: Uuid,
    pub fighter1_name: String,
    pub fighter2_name: String,
    #[serde(default)]
    pub winner: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub has_started: bool,
    #[serde(default)]
    pub is_complete: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Fight {
    pub fn outcome(&self) -> WinnerOutcome {
        WinnerOutcome::from_sentinel(self.winner.as_deref())
    }
}

/// Outcome fields written back to a stored fight
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FightOutcome {
    pub winner: Option<String>,
    pub method: Option<String>,
    pub round: Option<u32>,
    pub time: Option<String>,
}

/// Mutable fighter fields supplied to the fuzzy upsert
#[derive(Debug, Clone)]
pub struct FighterArgs {
    pub first_name: String,
    pub last_name: String,
    pub nickname: Option<String>,
    pub weight_class: Option<String>,
    pub source: String,
}

impl Fighter {
    /// Create a new fighter from upsert args
    pub fn new(args: &FighterArgs) -> Self {
        Self {
            id: None,
            first_name: args.first_name.clone(),
            last_name: args.last_name.clone(),
            nickname: args.nickname.clone(),
            weight_class: args.weight_class.clone(),
            created_at: Utc::now(),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A scraped event record, as produced by the (external) scrapers
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedEvent {
    pub event_name: String,
    #[serde(default)]
    pub event_date: Option<NaiveDate>,
    #[serde(default)]
    pub venue: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub fights: Vec<ScrapedFight>,
}

/// A scraped fight result under a scraped event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapedFight {
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub weight_class: Option<String>,
    pub winner: String,
    pub loser: String,
    pub method: String,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// A reconciliation run record, persisted at start and finish
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconciliationRun {
    pub id: Option<Uuid>,
    pub name: String,
    pub promotion: String,
    pub dry_run: bool,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ReconciliationRun {
    pub fn new(name: String, promotion: String, dry_run: bool) -> Self {
        Self {
            id: None,
            name,
            promotion,
            dry_run,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Mark the run as finished
    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }
}
