//! Service Layer
//!
//! 페이지/AJAX 핸들러가 소비하는 함수 계층. 공유 DB 상태를 잠그고
//! 도메인 에러를 직렬화 가능한 응답 에러로 변환한다.

use std::path::Path;

use serde::Serialize;

use crate::db::DbState;
use crate::error::{ServiceError, ServiceResult};
use crate::game::{
    is_level_completed, level_leaderboard, resolve_current_level, ProgressTracker, ResolvedVia,
};
use crate::models::{Game, Leaderboard, Level, LevelState, SubmitOutcome};

/// 플레이 세션 열기 응답: 결정된 레벨 + 진행 스냅샷
#[derive(Debug, Serialize)]
pub struct PlaySession {
    pub level: Level,
    #[serde(rename = "resolvedVia")]
    pub resolved_via: ResolvedVia,
    pub state: LevelState,
    #[serde(rename = "totalWords")]
    pub total_words: usize,
    pub completed: bool,
}

fn lock_error(e: impl std::fmt::Display) -> ServiceError {
    ServiceError {
        code: "LOCK_ERROR".to_string(),
        message: format!("Failed to acquire database lock: {}", e),
        details: None,
    }
}

/// 플레이 세션 열기: 현재 레벨을 결정하고 진행 스냅샷을 로드.
/// 결정된 레벨은 다음 방문을 위한 이어하기 레벨로 저장된다.
pub fn open_session(user_id: String, game_id: i64, db_state: &DbState) -> ServiceResult<PlaySession> {
    let db = db_state.0.lock().map_err(lock_error)?;

    let (level, resolved_via) =
        resolve_current_level(&db, &user_id, game_id).ok_or_else(|| ServiceError {
            code: "NO_LEVELS".to_string(),
            message: format!("game {} has no levels", game_id),
            details: None,
        })?;

    // 이어하기 저장 실패는 세션 열기를 막지 않는다
    if let Err(e) = db.set_preference_level(&user_id, game_id, level.level_id) {
        log::warn!("[Game] preference save failed user:{} err:{}", user_id, e);
    }

    let tracker = ProgressTracker::load(&db, &user_id, level.level_id);
    Ok(PlaySession {
        total_words: tracker.total_words(),
        completed: tracker.is_completed(),
        state: tracker.state().clone(),
        level,
        resolved_via,
    })
}

/// 단어 제출 (수락/거절은 반환값으로 구분)
pub fn submit_word(
    user_id: String,
    level_id: i64,
    word: String,
    db_state: &DbState,
) -> ServiceResult<SubmitOutcome> {
    let db = db_state.0.lock().map_err(lock_error)?;
    let mut tracker = ProgressTracker::load(&db, &user_id, level_id);
    Ok(tracker.submit_word(&word))
}

/// 힌트 사용 (갱신된 사용 횟수 반환)
pub fn use_hint(user_id: String, level_id: i64, db_state: &DbState) -> ServiceResult<u32> {
    let db = db_state.0.lock().map_err(lock_error)?;
    let mut tracker = ProgressTracker::load(&db, &user_id, level_id);
    Ok(tracker.use_hint())
}

/// 레벨 리셋 (삭제 성공 여부 반환)
pub fn reset_level(user_id: String, level_id: i64, db_state: &DbState) -> ServiceResult<bool> {
    let db = db_state.0.lock().map_err(lock_error)?;
    let mut tracker = ProgressTracker::load(&db, &user_id, level_id);
    Ok(tracker.reset())
}

/// 레벨 완료 여부 (배지 표시용)
pub fn level_completed(user_id: String, level_id: i64, db_state: &DbState) -> ServiceResult<bool> {
    let db = db_state.0.lock().map_err(lock_error)?;
    Ok(is_level_completed(&db, &user_id, level_id))
}

/// 레벨 리더보드 조회
pub fn leaderboard(level_id: i64, user_id: String, db_state: &DbState) -> ServiceResult<Leaderboard> {
    let db = db_state.0.lock().map_err(lock_error)?;
    Ok(level_leaderboard(&db, level_id, &user_id))
}

// ---- 관리자 ----

/// 게임 생성
pub fn create_game(title: String, db_state: &DbState) -> ServiceResult<Game> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.create_game(&title).map_err(ServiceError::from)
}

/// 게임 목록
pub fn list_games(db_state: &DbState) -> ServiceResult<Vec<Game>> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.list_games().map_err(ServiceError::from)
}

/// 게임 삭제 (연쇄 삭제)
pub fn delete_game(game_id: i64, db_state: &DbState) -> ServiceResult<()> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.delete_game(game_id).map_err(ServiceError::from)
}

/// 레벨 생성
pub fn create_level(
    game_id: i64,
    difficulty: u8,
    level_number: i64,
    given_letters: String,
    db_state: &DbState,
) -> ServiceResult<Level> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.create_level(game_id, difficulty, level_number, &given_letters)
        .map_err(ServiceError::from)
}

/// 레벨 수정
pub fn update_level(level: Level, db_state: &DbState) -> ServiceResult<()> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.update_level(&level).map_err(ServiceError::from)
}

/// 레벨 삭제 (연쇄 삭제)
pub fn delete_level(level_id: i64, db_state: &DbState) -> ServiceResult<()> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.delete_level(level_id).map_err(ServiceError::from)
}

/// 게임의 레벨 목록
pub fn list_levels(game_id: i64, db_state: &DbState) -> ServiceResult<Vec<Level>> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.list_levels(game_id).map_err(ServiceError::from)
}

/// 레벨 단어 목록 교체 (정규화/중복 제거 후 저장된 개수 반환)
pub fn set_level_words(level_id: i64, words: Vec<String>, db_state: &DbState) -> ServiceResult<usize> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.set_level_words(level_id, &words).map_err(ServiceError::from)
}

/// 레벨 단어 목록 조회
pub fn level_words(level_id: i64, db_state: &DbState) -> ServiceResult<Vec<String>> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.level_words(level_id)
        .map(|words| words.into_iter().collect())
        .map_err(ServiceError::from)
}

/// DB 백업 파일 내보내기
pub fn export_backup(out_path: &Path, db_state: &DbState) -> ServiceResult<()> {
    let db = db_state.0.lock().map_err(lock_error)?;
    db.export_db_to_file(out_path).map_err(ServiceError::from)
}

/// DB 백업 파일 가져오기 (현재 내용을 덮어씀)
pub fn import_backup(in_path: &Path, db_state: &DbState) -> ServiceResult<()> {
    let mut db = db_state.0.lock().map_err(lock_error)?;
    db.import_db_from_file(in_path).map_err(ServiceError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::open_database;
    use tempfile::tempdir;

    fn setup(dir: &tempfile::TempDir) -> (DbState, i64, i64) {
        let state = open_database(&dir.path().join("test.db")).unwrap();
        let game = create_game("테스트".to_string(), &state).unwrap();
        let level = create_level(game.game_id, 1, 1, "tcas".to_string(), &state).unwrap();
        set_level_words(
            level.level_id,
            vec!["cat".to_string(), "cats".to_string(), "act".to_string()],
            &state,
        )
        .unwrap();
        (state, game.game_id, level.level_id)
    }

    #[test]
    fn test_open_session_resolves_and_saves_preference() {
        let dir = tempdir().unwrap();
        let (state, game_id, level_id) = setup(&dir);

        let session = open_session("u1".to_string(), game_id, &state).unwrap();
        assert_eq!(session.level.level_id, level_id);
        assert_eq!(session.resolved_via, ResolvedVia::FirstLevel);
        assert_eq!(session.total_words, 3);
        assert!(!session.completed);

        // 두 번째 방문부터는 저장된 이어하기 레벨 사용
        let second = open_session("u1".to_string(), game_id, &state).unwrap();
        assert_eq!(second.resolved_via, ResolvedVia::Preference);
    }

    #[test]
    fn test_submit_and_leaderboard_through_service() {
        let dir = tempdir().unwrap();
        let (state, _game_id, level_id) = setup(&dir);

        let outcome = submit_word("u1".to_string(), level_id, "CAT".to_string(), &state).unwrap();
        assert_eq!(outcome, SubmitOutcome::Accepted { score: 3 });

        let board = leaderboard(level_id, "u1".to_string(), &state).unwrap();
        assert_eq!(board.my_rank, Some(1));
        assert_eq!(board.entries[0].score, 3);
    }

    #[test]
    fn test_empty_game_session_fails() {
        let dir = tempdir().unwrap();
        let (state, _game_id, _level_id) = setup(&dir);

        let empty = create_game("빈 게임".to_string(), &state).unwrap();
        let err = open_session("u1".to_string(), empty.game_id, &state).unwrap_err();
        assert_eq!(err.code, "NO_LEVELS");
    }
}
