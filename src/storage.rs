use crate::domain::{
    Event, Fight, FightOutcome, Fighter, FighterAlias, ReconciliationRun,
};
use crate::error::{ReconcilerError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;
use uuid::Uuid;

/// Storage trait for the canonical fighter/event/fight store.
///
/// The matching core never touches persistence directly; everything goes
/// through this trait so tests can observe writes with an in-memory fake.
#[async_trait]
pub trait Storage: Send + Sync {
    // Fighter operations
    async fn create_fighter(&self, fighter: &mut Fighter) -> Result<()>;
    async fn update_fighter(&self, fighter: &Fighter) -> Result<()>;
    async fn get_fighter(&self, fighter_id: Uuid) -> Result<Option<Fighter>>;
    async fn get_fighter_by_name(&self, first_name: &str, last_name: &str)
        -> Result<Option<Fighter>>;
    async fn list_fighters(&self) -> Result<Vec<Fighter>>;

    // Alias operations
    async fn find_alias(&self, first_name: &str, last_name: &str)
        -> Result<Option<FighterAlias>>;
    async fn create_alias(&self, alias: &mut FighterAlias) -> Result<()>;
    async fn list_aliases_for_fighter(&self, fighter_id: Uuid) -> Result<Vec<FighterAlias>>;

    // Event operations
    async fn list_events_by_promotion(&self, promotion: &str) -> Result<Vec<Event>>;

    // Fight operations
    async fn get_fights_for_event(&self, event_id: Uuid) -> Result<Vec<Fight>>;
    async fn update_fight_outcome(&self, fight_id: Uuid, outcome: &FightOutcome) -> Result<()>;

    // Reconciliation run operations
    async fn create_run(&self, run: &mut ReconciliationRun) -> Result<()>;
    async fn update_run(&self, run: &ReconciliationRun) -> Result<()>;
}

/// Seed shape for loading a store from a JSON file
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSeed {
    #[serde(default)]
    pub fighters: Vec<Fighter>,
    #[serde(default)]
    pub aliases: Vec<FighterAlias>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub fights: Vec<Fight>,
}

/// In-memory storage implementation for development/testing
pub struct InMemoryStorage {
    fighters: Arc<Mutex<HashMap<Uuid, Fighter>>>,
    aliases: Arc<Mutex<HashMap<Uuid, FighterAlias>>>,
    events: Arc<Mutex<HashMap<Uuid, Event>>>,
    fights: Arc<Mutex<HashMap<Uuid, Fight>>>,
    runs: Arc<Mutex<HashMap<Uuid, ReconciliationRun>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self {
            fighters: Arc::new(Mutex::new(HashMap::new())),
            aliases: Arc::new(Mutex::new(HashMap::new())),
            events: Arc::new(Mutex::new(HashMap::new())),
            fights: Arc::new(Mutex::new(HashMap::new())),
            runs: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Build a store from a seed, assigning ids to any record missing one.
    pub fn from_seed(seed: StoreSeed) -> Self {
        let storage = Self::new();
        {
            let mut fighters = storage.fighters.lock().unwrap();
            for mut fighter in seed.fighters {
                let id = fighter.id.unwrap_or_else(Uuid::new_v4);
                fighter.id = Some(id);
                fighters.insert(id, fighter);
            }
        }
        {
            let mut aliases = storage.aliases.lock().unwrap();
            for mut alias in seed.aliases {
                let id = alias.id.unwrap_or_else(Uuid::new_v4);
                alias.id = Some(id);
                aliases.insert(id, alias);
            }
        }
        {
            let mut events = storage.events.lock().unwrap();
            for mut event in seed.events {
                let id = event.id.unwrap_or_else(Uuid::new_v4);
                event.id = Some(id);
                events.insert(id, event);
            }
        }
        {
            let mut fights = storage.fights.lock().unwrap();
            for mut fight in seed.fights {
                let id = fight.id.unwrap_or_else(Uuid::new_v4);
                fight.id = Some(id);
                fights.insert(id, fight);
            }
        }
        storage
    }

    /// Load a seed JSON file into a fresh store
    pub fn from_seed_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let seed: StoreSeed = serde_json::from_str(&content)?;
        Ok(Self::from_seed(seed))
    }

    /// Snapshot of all aliases, for inspection after a run
    pub fn all_aliases(&self) -> Vec<FighterAlias> {
        self.aliases.lock().unwrap().values().cloned().collect()
    }

    /// Snapshot of a fight row, for inspection after a run
    pub fn get_fight(&self, fight_id: Uuid) -> Option<Fight> {
        self.fights.lock().unwrap().get(&fight_id).cloned()
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn create_fighter(&self, fighter: &mut Fighter) -> Result<()> {
        let mut fighters = self.fighters.lock().unwrap();

        // Exact case-insensitive names are unique; a concurrent creator wins
        // the race and the caller is expected to re-fetch and update.
        let exists = fighters.values().any(|f| {
            f.first_name.eq_ignore_ascii_case(&fighter.first_name)
                && f.last_name.eq_ignore_ascii_case(&fighter.last_name)
        });
        if exists {
            return Err(ReconcilerError::DuplicateFighter {
                first_name: fighter.first_name.clone(),
                last_name: fighter.last_name.clone(),
            });
        }

        let id = Uuid::new_v4();
        fighter.id = Some(id);
        fighters.insert(id, fighter.clone());

        debug!("Created fighter: {} with id {}", fighter.full_name(), id);
        Ok(())
    }

    async fn update_fighter(&self, fighter: &Fighter) -> Result<()> {
        let fighter_id = fighter.id.ok_or_else(|| ReconcilerError::Storage {
            message: "Cannot update fighter without ID".to_string(),
        })?;

        let mut fighters = self.fighters.lock().unwrap();
        fighters.insert(fighter_id, fighter.clone());

        debug!("Updated fighter: {} with id {}", fighter.full_name(), fighter_id);
        Ok(())
    }

    async fn get_fighter(&self, fighter_id: Uuid) -> Result<Option<Fighter>> {
        let fighters = self.fighters.lock().unwrap();
        Ok(fighters.get(&fighter_id).cloned())
    }

    async fn get_fighter_by_name(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<Fighter>> {
        let fighters = self.fighters.lock().unwrap();
        let fighter = fighters
            .values()
            .find(|f| {
                f.first_name.eq_ignore_ascii_case(first_name)
                    && f.last_name.eq_ignore_ascii_case(last_name)
            })
            .cloned();
        Ok(fighter)
    }

    async fn list_fighters(&self) -> Result<Vec<Fighter>> {
        let fighters = self.fighters.lock().unwrap();
        Ok(fighters.values().cloned().collect())
    }

    async fn find_alias(
        &self,
        first_name: &str,
        last_name: &str,
    ) -> Result<Option<FighterAlias>> {
        let aliases = self.aliases.lock().unwrap();
        let alias = aliases
            .values()
            .find(|a| {
                a.first_name.eq_ignore_ascii_case(first_name)
                    && a.last_name.eq_ignore_ascii_case(last_name)
            })
            .cloned();
        Ok(alias)
    }

    async fn create_alias(&self, alias: &mut FighterAlias) -> Result<()> {
        let mut aliases = self.aliases.lock().unwrap();

        // Recording the same spelling twice is tolerated; reuse the row.
        if let Some(existing) = aliases.values().find(|a| {
            a.fighter_id == alias.fighter_id
                && a.first_name.eq_ignore_ascii_case(&alias.first_name)
                && a.last_name.eq_ignore_ascii_case(&alias.last_name)
        }) {
            alias.id = existing.id;
            return Ok(());
        }

        let id = Uuid::new_v4();
        alias.id = Some(id);
        aliases.insert(id, alias.clone());

        debug!(
            "Created alias: {} {} -> fighter {}",
            alias.first_name, alias.last_name, alias.fighter_id
        );
        Ok(())
    }

    async fn list_aliases_for_fighter(&self, fighter_id: Uuid) -> Result<Vec<FighterAlias>> {
        let aliases = self.aliases.lock().unwrap();
        Ok(aliases
            .values()
            .filter(|a| a.fighter_id == fighter_id)
            .cloned()
            .collect())
    }

    async fn list_events_by_promotion(&self, promotion: &str) -> Result<Vec<Event>> {
        let events = self.events.lock().unwrap();
        let mut matching: Vec<Event> = events
            .values()
            .filter(|e| e.promotion.eq_ignore_ascii_case(promotion))
            .cloned()
            .collect();

        // Sort by date so numbered/fuzzy scans behave deterministically
        matching.sort_by(|a, b| a.date.cmp(&b.date));
        Ok(matching)
    }

    async fn get_fights_for_event(&self, event_id: Uuid) -> Result<Vec<Fight>> {
        let fights = self.fights.lock().unwrap();
        Ok(fights
            .values()
            .filter(|f| f.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn update_fight_outcome(&self, fight_id: Uuid, outcome: &FightOutcome) -> Result<()> {
        let mut fights = self.fights.lock().unwrap();
        let fight = fights.get_mut(&fight_id).ok_or_else(|| ReconcilerError::Storage {
            message: format!("Cannot update unknown fight {}", fight_id),
        })?;

        fight.winner = outcome.winner.clone();
        fight.method = outcome.method.clone();
        fight.round = outcome.round;
        fight.time = outcome.time.clone();
        fight.has_started = true;
        fight.is_complete = true;

        debug!("Updated outcome for fight {}", fight_id);
        Ok(())
    }

    async fn create_run(&self, run: &mut ReconciliationRun) -> Result<()> {
        let id = Uuid::new_v4();
        run.id = Some(id);

        let mut runs = self.runs.lock().unwrap();
        runs.insert(id, run.clone());

        debug!("Created reconciliation run: {} with id {}", run.name, id);
        Ok(())
    }

    async fn update_run(&self, run: &ReconciliationRun) -> Result<()> {
        let run_id = run.id.ok_or_else(|| ReconcilerError::Storage {
            message: "Cannot update run without ID".to_string(),
        })?;

        let mut runs = self.runs.lock().unwrap();
        runs.insert(run_id, run.clone());

        debug!("Updated reconciliation run: {} with id {}", run.name, run_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FighterArgs;

    fn fighter(first: &str, last: &str) -> Fighter {
        Fighter::new(&FighterArgs {
            first_name: first.to_string(),
            last_name: last.to_string(),
            nickname: None,
            weight_class: None,
            source: "test".to_string(),
        })
    }

    #[tokio::test]
    async fn duplicate_fighter_creation_is_rejected() {
        let storage = InMemoryStorage::new();
        let mut first = fighter("Jon", "Jones");
        storage.create_fighter(&mut first).await.unwrap();

        let mut dup = fighter("JON", "JONES");
        let err = storage.create_fighter(&mut dup).await.unwrap_err();
        assert!(matches!(err, ReconcilerError::DuplicateFighter { .. }));
    }

    #[tokio::test]
    async fn alias_creation_is_idempotent() {
        let storage = InMemoryStorage::new();
        let mut f = fighter("Alexander", "Volkanovski");
        storage.create_fighter(&mut f).await.unwrap();
        let fighter_id = f.id.unwrap();

        let mut alias = FighterAlias {
            id: None,
            fighter_id,
            first_name: "Alex".to_string(),
            last_name: "Volkanovski".to_string(),
            source: "wikipedia".to_string(),
            created_at: chrono::Utc::now(),
        };
        storage.create_alias(&mut alias.clone()).await.unwrap();
        storage.create_alias(&mut alias).await.unwrap();

        assert_eq!(storage.all_aliases().len(), 1);
    }

    #[tokio::test]
    async fn reapplying_an_outcome_is_a_noop() {
        let storage = InMemoryStorage::from_seed(StoreSeed {
            fighters: vec![],
            aliases: vec![],
            events: vec![],
            fights: vec![Fight {
                id: None,
                event_id: Uuid::new_v4(),
                fighter1_id: Uuid::new_v4(),
                fighter2_id: Uuid::new_v4(),
                fighter1_name: "A B".to_string(),
                fighter2_name: "C D".to_string(),
                winner: None,
                method: None,
                round: None,
                time: None,
                has_started: false,
                is_complete: false,
                created_at: chrono::Utc::now(),
            }],
        });

        let fight_id = storage.fights.lock().unwrap().keys().next().cloned().unwrap();
        let outcome = FightOutcome {
            winner: Some("draw".to_string()),
            method: Some("Draw".to_string()),
            round: Some(3),
            time: Some("5:00".to_string()),
        };
        storage.update_fight_outcome(fight_id, &outcome).await.unwrap();
        let first = storage.get_fight(fight_id).unwrap();
        storage.update_fight_outcome(fight_id, &outcome).await.unwrap();
        let second = storage.get_fight(fight_id).unwrap();

        assert_eq!(first.winner, second.winner);
        assert_eq!(first.method, second.method);
        assert!(second.is_complete);
        assert_eq!(second.outcome(), crate::domain::WinnerOutcome::Draw);
    }
}
