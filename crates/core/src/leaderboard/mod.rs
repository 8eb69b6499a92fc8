//! Leaderboard module - additive per-donor totals, rename/merge and the edit log.

mod leaderboard_model;
mod leaderboard_service;
mod leaderboard_traits;


pub use leaderboard_model::{
    IncrementResult, LeaderboardEditRecord, LeaderboardEntry, MigrationFailure, MigrationReport,
    RenameAction, RenameOutcome, WriteResult,
};
pub use leaderboard_service::LeaderboardService;
pub use leaderboard_traits::LeaderboardServiceTrait;
