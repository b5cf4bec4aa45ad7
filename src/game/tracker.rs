//! Progress Tracker
//!
//! (사용자, 레벨) 단위 진행 상태 객체. 세션 전역 대신 명시적 상태 객체를
//! 요청마다 생성하고, 모든 변경은 즉시 DB에 기록한다 (write-through).

use std::collections::BTreeSet;

use crate::db::Database;
use crate::models::{LevelState, SubmitOutcome};

/// (사용자, 레벨) 진행 추적기
///
/// 스냅샷은 생성 시 한 번 로드되고, 변경 후 쓰기 실패 시 세션 상태가
/// 저장 상태보다 앞서게 된다 (last write wins, 다음 쓰기에서 수렴).
pub struct ProgressTracker<'a> {
    db: &'a Database,
    user_id: String,
    level_id: i64,
    /// 레벨 정답 단어 집합 스냅샷 (소문자)
    words: BTreeSet<String>,
    state: LevelState,
}

impl<'a> ProgressTracker<'a> {
    /// 저장된 진행 상태를 로드해 추적기 생성.
    /// 조회 실패는 빈 단어 목록 / 기본 상태로 대체한다 (에러를 던지지 않음).
    pub fn load(db: &'a Database, user_id: &str, level_id: i64) -> Self {
        let words = db.level_words(level_id).unwrap_or_else(|e| {
            log::warn!("[Game] word list load failed level:{} err:{}", level_id, e);
            BTreeSet::new()
        });

        let now = chrono::Utc::now().timestamp_millis();
        let state = match db.load_progress(user_id, level_id) {
            Ok(Some(state)) => state,
            Ok(None) => LevelState::new(now),
            Err(e) => {
                log::warn!(
                    "[Game] progress load failed user:{} level:{} err:{}",
                    user_id, level_id, e
                );
                LevelState::new(now)
            }
        };

        Self {
            db,
            user_id: user_id.to_string(),
            level_id,
            words,
            state,
        }
    }

    /// 단어 제출. 공백 제거 후 소문자로 정규화하며,
    /// 수락/거절은 에러가 아닌 반환값으로 구분한다.
    pub fn submit_word(&mut self, word: &str) -> SubmitOutcome {
        let normalized = word.trim().to_lowercase();

        if !self.words.contains(&normalized) {
            return SubmitOutcome::NotInWordList;
        }
        if self.state.found_words.contains(&normalized) {
            return SubmitOutcome::AlreadyFound;
        }

        self.state.found_words.insert(normalized);
        self.state.score = self.state.computed_score();
        self.state.last_played = chrono::Utc::now().timestamp_millis();
        self.persist();

        SubmitOutcome::Accepted { score: self.state.score }
    }

    /// 힌트 사용. 카운터를 무조건 증가시키고 저장하며 항상 성공한다.
    /// 갱신된 힌트 사용 횟수를 반환.
    pub fn use_hint(&mut self) -> u32 {
        self.state.hints_used += 1;
        self.state.last_played = chrono::Utc::now().timestamp_millis();
        self.persist();
        self.state.hints_used
    }

    /// 레벨 리셋: 진행 행을 삭제하고 메모리 상태를 초기화.
    /// 삭제 쿼리의 성공 여부를 반환한다.
    pub fn reset(&mut self) -> bool {
        match self.db.delete_progress(&self.user_id, self.level_id) {
            Ok(_) => {
                self.state = LevelState::new(chrono::Utc::now().timestamp_millis());
                true
            }
            Err(e) => {
                log::warn!(
                    "[Game] reset failed user:{} level:{} err:{}",
                    self.user_id, self.level_id, e
                );
                false
            }
        }
    }

    /// 현재 스냅샷 기준 레벨 완료 여부
    pub fn is_completed(&self) -> bool {
        !self.words.is_empty() && self.state.found_words.len() == self.words.len()
    }

    pub fn found_words(&self) -> &BTreeSet<String> {
        &self.state.found_words
    }

    pub fn score(&self) -> i64 {
        self.state.score
    }

    pub fn hints_used(&self) -> u32 {
        self.state.hints_used
    }

    pub fn state(&self) -> &LevelState {
        &self.state
    }

    pub fn total_words(&self) -> usize {
        self.words.len()
    }

    /// 현재 스냅샷을 DB에 기록. 실패해도 세션 상태는 유지한다.
    fn persist(&self) {
        if let Err(e) = self.db.save_progress(&self.user_id, self.level_id, &self.state) {
            log::warn!(
                "[Game] progress write failed user:{} level:{} err:{}",
                self.user_id, self.level_id, e
            );
        }
    }
}

/// 저장된 행 기준 레벨 완료 여부.
/// 진행 행이 없거나 조회에 실패하면 false (절대 에러를 던지지 않음).
pub fn is_level_completed(db: &Database, user_id: &str, level_id: i64) -> bool {
    let total = match db.level_word_count(level_id) {
        Ok(n) if n > 0 => n,
        Ok(_) => return false,
        Err(e) => {
            log::warn!("[Game] word count failed level:{} err:{}", level_id, e);
            return false;
        }
    };

    match db.load_progress(user_id, level_id) {
        Ok(Some(state)) => state.found_words.len() as i64 == total,
        Ok(None) => false,
        Err(e) => {
            log::warn!(
                "[Game] progress load failed user:{} level:{} err:{}",
                user_id, level_id, e
            );
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Level;
    use tempfile::tempdir;

    fn setup(dir: &tempfile::TempDir) -> (Database, Level) {
        let db = Database::new(&dir.path().join("test.db")).unwrap();
        db.initialize().unwrap();
        let game = db.create_game("테스트").unwrap();
        let level = db.create_level(game.game_id, 1, 3, "tcas").unwrap();
        db.set_level_words(
            level.level_id,
            &["cat".to_string(), "cats".to_string(), "act".to_string()],
        )
        .unwrap();
        (db, level)
    }

    #[test]
    fn test_submit_scenario_cat_cats_act() {
        let dir = tempdir().unwrap();
        let (db, level) = setup(&dir);
        let mut tracker = ProgressTracker::load(&db, "u1", level.level_id);

        // "CAT" → 수락, 점수 3
        assert_eq!(tracker.submit_word("CAT"), SubmitOutcome::Accepted { score: 3 });
        assert_eq!(tracker.found_words().len(), 1);
        assert!(tracker.found_words().contains("cat"));

        // "cat" 재제출 → 거절, 점수 유지
        assert_eq!(tracker.submit_word("cat"), SubmitOutcome::AlreadyFound);
        assert_eq!(tracker.score(), 3);

        // 목록에 없는 단어 → 거절, 상태 유지
        assert_eq!(tracker.submit_word("dog"), SubmitOutcome::NotInWordList);
        assert_eq!(tracker.score(), 3);
        assert_eq!(tracker.found_words().len(), 1);

        // "Act" → 수락, 점수 6
        assert_eq!(tracker.submit_word(" Act "), SubmitOutcome::Accepted { score: 6 });
        assert_eq!(tracker.found_words().len(), 2);

        // write-through 확인: 새 추적기로 다시 로드해도 같은 상태
        let reloaded = ProgressTracker::load(&db, "u1", level.level_id);
        assert_eq!(reloaded.score(), 6);
        assert!(reloaded.found_words().contains("act"));
    }

    #[test]
    fn test_each_word_submits_once() {
        let dir = tempdir().unwrap();
        let (db, level) = setup(&dir);
        let mut tracker = ProgressTracker::load(&db, "u1", level.level_id);

        for word in ["cat", "cats", "act"] {
            assert!(matches!(tracker.submit_word(word), SubmitOutcome::Accepted { .. }));
            assert_eq!(tracker.submit_word(word), SubmitOutcome::AlreadyFound);
        }
        assert_eq!(tracker.score(), 10);
    }

    #[test]
    fn test_hint_counter() {
        let dir = tempdir().unwrap();
        let (db, level) = setup(&dir);
        let mut tracker = ProgressTracker::load(&db, "u1", level.level_id);

        assert_eq!(tracker.use_hint(), 1);
        assert_eq!(tracker.use_hint(), 2);

        let reloaded = ProgressTracker::load(&db, "u1", level.level_id);
        assert_eq!(reloaded.hints_used(), 2);
        // 힌트는 점수에 영향 없음
        assert_eq!(reloaded.score(), 0);
    }

    #[test]
    fn test_completion() {
        let dir = tempdir().unwrap();
        let (db, level) = setup(&dir);

        // 진행 행 없는 사용자는 false
        assert!(!is_level_completed(&db, "u1", level.level_id));

        let mut tracker = ProgressTracker::load(&db, "u1", level.level_id);
        tracker.submit_word("cat");
        tracker.submit_word("cats");
        assert!(!tracker.is_completed());
        assert!(!is_level_completed(&db, "u1", level.level_id));

        tracker.submit_word("act");
        assert!(tracker.is_completed());
        assert!(is_level_completed(&db, "u1", level.level_id));
    }

    #[test]
    fn test_reset_clears_row_and_state() {
        let dir = tempdir().unwrap();
        let (db, level) = setup(&dir);

        let mut tracker = ProgressTracker::load(&db, "u1", level.level_id);
        tracker.submit_word("cat");
        tracker.submit_word("cats");
        tracker.submit_word("act");
        tracker.use_hint();
        assert!(is_level_completed(&db, "u1", level.level_id));

        assert!(tracker.reset());
        assert_eq!(tracker.score(), 0);
        assert!(tracker.found_words().is_empty());
        assert_eq!(tracker.hints_used(), 0);
        assert!(!is_level_completed(&db, "u1", level.level_id));

        // 리셋 후 다시 로드하면 기본 상태
        let reloaded = ProgressTracker::load(&db, "u1", level.level_id);
        assert!(reloaded.found_words().is_empty());
        assert_eq!(reloaded.score(), 0);
    }

    #[test]
    fn test_unknown_level_rejects_everything() {
        let dir = tempdir().unwrap();
        let (db, _level) = setup(&dir);

        // 단어 목록이 비는 레벨은 어떤 제출도 수락하지 않는다
        let mut tracker = ProgressTracker::load(&db, "u1", 9999);
        assert_eq!(tracker.submit_word("cat"), SubmitOutcome::NotInWordList);
        assert!(!tracker.is_completed());
        assert!(!is_level_completed(&db, "u1", 9999));
    }
}
