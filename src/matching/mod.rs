pub mod event;
pub mod fight;
pub mod fighter;

pub use event::{canonicalize_event_name, CanonicalEventName, EventMatch, EventMatcher};
pub use fight::{canonicalize_method, FightMatch, FightMatcher};
pub use fighter::{
    score_name_match, split_full_name, FighterCandidate, FighterMatcher, MatchType, NameMatch,
    SearchOptions, UpsertResult,
};
