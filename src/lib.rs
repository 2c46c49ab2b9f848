//! Word and short-phrase lookup between English/French and Ghomala/Fulfulde,
//! with fuzzy fallback and a reviewed contribution workflow that feeds
//! validated pairs back into the dictionaries.

pub mod config;
pub mod error;
pub mod model;
pub mod protocol;
pub mod services;

pub use config::Settings;
pub use error::{CoreError, Result};
pub use model::contribution::{
    Contribution, ContributionFilter, ContributionStatus, LanguagePairStats, NewContribution,
};
pub use model::language::LanguagePair;
pub use model::term::{MatchResult, MatchType, TermMapping};
pub use services::engine::Engine;
pub use services::lifecycle::ContributionManager;
pub use services::resolver::resolve;
