//! WordVine - 단어 퍼즐 게임 백엔드 라이브러리
//!
//! 레벨 진행 추적, 이어하기, 리더보드를 SQLite 위에서 제공합니다.
//! 페이지 렌더링 코드가 소비하는 라이브러리로, 자체 네트워크 계층은 없습니다.

pub mod db;
pub mod error;
pub mod game;
pub mod models;
pub mod service;

use std::path::Path;

pub use db::{Database, DbState};
pub use error::{GameError, ServiceError, ServiceResult};
pub use game::{is_level_completed, level_leaderboard, resolve_current_level, ProgressTracker, ResolvedVia};
pub use models::{Game, Leaderboard, LeaderboardEntry, Level, LevelState, SubmitOutcome};

/// 데이터베이스 열기 + 스키마 초기화 + 공유 상태로 래핑
pub fn open_database(path: &Path) -> Result<DbState, GameError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::new(path)?;
    db.initialize()?;
    Ok(DbState(std::sync::Mutex::new(db)))
}
