//! Game Module
//!
//! 진행 추적 / 레벨 이어하기 / 리더보드

mod leaderboard;
mod resolve;
mod tracker;

pub use leaderboard::{level_leaderboard, LEADERBOARD_SIZE};
pub use resolve::{resolve_current_level, ResolvedVia};
pub use tracker::{is_level_completed, ProgressTracker};
