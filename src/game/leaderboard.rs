//! Leaderboard
//!
//! 레벨별 순위: 점수 내림차순 → 힌트 오름차순 → 경과 시간(초) 오름차순.

use crate::db::Database;
use crate::models::Leaderboard;

/// 리더보드 표시 인원
pub const LEADERBOARD_SIZE: usize = 10;

/// 레벨 리더보드 조회.
///
/// 요청자가 상위 10명 안이면 그 순번(1부터)이 순위가 되고,
/// 밖이면 "자신보다 엄격히 앞서는 행 수 + 1"로 순위를 계산한 뒤
/// 본인 행을 별도로 조회해 함께 반환한다.
/// 조회 실패는 빈 목록 / None으로 대체한다 (에러를 던지지 않음).
pub fn level_leaderboard(db: &Database, level_id: i64, user_id: &str) -> Leaderboard {
    let entries = match db.top_progress_rows(level_id, LEADERBOARD_SIZE) {
        Ok(entries) => entries,
        Err(e) => {
            log::warn!("[Game] leaderboard load failed level:{} err:{}", level_id, e);
            Vec::new()
        }
    };

    // 상위 10명 안에 있으면 그 순번이 곧 순위
    if let Some(pos) = entries.iter().position(|e| e.user_id == user_id) {
        return Leaderboard {
            entries,
            my_rank: Some(pos as u32 + 1),
            my_entry: None,
        };
    }

    // 밖이면 본인 행을 따로 조회해 순위 계산
    let my_entry = match db.progress_entry(level_id, user_id) {
        Ok(entry) => entry,
        Err(e) => {
            log::warn!(
                "[Game] own entry load failed user:{} level:{} err:{}",
                user_id, level_id, e
            );
            None
        }
    };

    let my_rank = my_entry.as_ref().and_then(|me| {
        match db.outrank_count(level_id, me) {
            Ok(ahead) => Some(ahead as u32 + 1),
            Err(e) => {
                log::warn!(
                    "[Game] rank count failed user:{} level:{} err:{}",
                    user_id, level_id, e
                );
                None
            }
        }
    });

    Leaderboard { entries, my_rank, my_entry }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LevelState;
    use tempfile::tempdir;

    fn setup(dir: &tempfile::TempDir) -> (Database, i64) {
        let db = Database::new(&dir.path().join("test.db")).unwrap();
        db.initialize().unwrap();
        let game = db.create_game("테스트").unwrap();
        let level = db.create_level(game.game_id, 1, 1, "abc").unwrap();
        (db, level.level_id)
    }

    /// score/hints/elapsed를 직접 지정해 진행 행 삽입
    fn insert_row(db: &Database, level_id: i64, user_id: &str, score: i64, hints: u32, elapsed_secs: i64) {
        // found_words로 원하는 점수를 만들 수 없으므로 길이 score짜리 단어 하나로 구성
        let mut state = LevelState::new(0);
        state.found_words.insert("x".repeat(score as usize));
        state.hints_used = hints;
        state.start_time = 0;
        state.last_played = elapsed_secs * 1000;
        db.save_progress(user_id, level_id, &state).unwrap();
    }

    #[test]
    fn test_tiebreak_ordering() {
        let dir = tempdir().unwrap();
        let (db, level_id) = setup(&dir);

        // 점수 [50,50,30], 힌트 [2,1,0], 경과 [10,5,100]
        insert_row(&db, level_id, "many-hints", 50, 2, 10);
        insert_row(&db, level_id, "few-hints", 50, 1, 5);
        insert_row(&db, level_id, "low-score", 30, 0, 100);

        let board = level_leaderboard(&db, level_id, "few-hints");

        // 동점은 힌트 적은 쪽이 위, 낮은 점수는 마지막
        let order: Vec<&str> = board.entries.iter().map(|e| e.user_id.as_str()).collect();
        assert_eq!(order, vec!["few-hints", "many-hints", "low-score"]);
        assert_eq!(board.my_rank, Some(1));
        assert!(board.my_entry.is_none());
    }

    #[test]
    fn test_speed_breaks_full_tie() {
        let dir = tempdir().unwrap();
        let (db, level_id) = setup(&dir);

        insert_row(&db, level_id, "slow", 40, 1, 90);
        insert_row(&db, level_id, "fast", 40, 1, 30);

        let board = level_leaderboard(&db, level_id, "slow");
        assert_eq!(board.entries[0].user_id, "fast");
        assert_eq!(board.entries[1].user_id, "slow");
        assert_eq!(board.my_rank, Some(2));
    }

    #[test]
    fn test_rank_outside_top_ten() {
        let dir = tempdir().unwrap();
        let (db, level_id) = setup(&dir);

        // 점수 12..1의 12명: "me"는 점수 1로 꼴찌
        for i in 0..11 {
            insert_row(&db, level_id, &format!("u{}", i), 12 - i as i64, 0, 10);
        }
        insert_row(&db, level_id, "me", 1, 0, 10);

        let board = level_leaderboard(&db, level_id, "me");
        assert_eq!(board.entries.len(), LEADERBOARD_SIZE);
        assert!(board.entries.iter().all(|e| e.user_id != "me"));
        assert_eq!(board.my_rank, Some(12));

        let me = board.my_entry.unwrap();
        assert_eq!(me.user_id, "me");
        assert_eq!(me.score, 1);
    }

    #[test]
    fn test_no_progress_row_has_no_rank() {
        let dir = tempdir().unwrap();
        let (db, level_id) = setup(&dir);

        insert_row(&db, level_id, "u1", 10, 0, 5);

        let board = level_leaderboard(&db, level_id, "stranger");
        assert_eq!(board.entries.len(), 1);
        assert_eq!(board.my_rank, None);
        assert!(board.my_entry.is_none());
    }

    #[test]
    fn test_elapsed_in_whole_seconds() {
        let dir = tempdir().unwrap();
        let (db, level_id) = setup(&dir);

        // 밀리초 차이는 절삭되어 같은 초로 비교된다
        let mut state = LevelState::new(0);
        state.found_words.insert("abc".to_string());
        state.last_played = 5_900; // 5.9s → 5초
        db.save_progress("u1", level_id, &state).unwrap();

        let board = level_leaderboard(&db, level_id, "u1");
        assert_eq!(board.entries[0].elapsed_secs, 5);
    }
}
