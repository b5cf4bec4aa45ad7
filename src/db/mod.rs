//! Database Module
//!
//! SQLite 데이터베이스 관리

mod schema;

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Mutex;

use rusqlite::backup::Backup;
use rusqlite::{Connection, OptionalExtension};

use crate::error::GameError;
use crate::models::{Game, LeaderboardEntry, Level, LevelState};

/// 데이터베이스 상태 (서비스 계층에서 공유)
pub struct DbState(pub Mutex<Database>);

/// 데이터베이스 래퍼
pub struct Database {
    conn: Connection,
}

impl Database {
    /// 새 데이터베이스 연결 생성
    pub fn new(path: &Path) -> Result<Self, GameError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// 데이터베이스 스키마 초기화
    pub fn initialize(&self) -> Result<(), GameError> {
        self.conn.execute_batch(schema::CREATE_SCHEMA)?;
        Ok(())
    }

    /// 현재 DB를 파일로 내보내기 (관리자 백업용, SQLite DB 파일)
    pub fn export_db_to_file(&self, out_path: &Path) -> Result<(), GameError> {
        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut out_conn = Connection::open(out_path)?;
        // 백업이 전체 DB를 복제하지만 일부 환경에서의 안정성을 위해 명시적으로 초기화합니다.
        out_conn.execute_batch(schema::CREATE_SCHEMA)?;

        let backup = Backup::new(&self.conn, &mut out_conn)?;
        backup.run_to_completion(5, std::time::Duration::from_millis(10), None)?;
        Ok(())
    }

    /// 백업 파일을 현재 DB로 가져오기 (현재 DB 내용을 덮어씀)
    pub fn import_db_from_file(&mut self, in_path: &Path) -> Result<(), GameError> {
        let in_conn = Connection::open(in_path)?;

        let backup = Backup::new(&in_conn, &mut self.conn)?;
        backup.run_to_completion(5, std::time::Duration::from_millis(10), None)?;
        Ok(())
    }

    // ---- 게임 ----

    /// 게임 생성
    pub fn create_game(&self, title: &str) -> Result<Game, GameError> {
        let now = chrono::Utc::now().timestamp_millis();
        self.conn.execute(
            "INSERT INTO games (title, created_at) VALUES (?1, ?2)",
            (title, now),
        )?;
        Ok(Game {
            game_id: self.conn.last_insert_rowid(),
            title: title.to_string(),
            created_at: now,
        })
    }

    /// 게임 목록 조회
    pub fn list_games(&self) -> Result<Vec<Game>, GameError> {
        let mut stmt = self
            .conn
            .prepare("SELECT game_id, title, created_at FROM games ORDER BY created_at DESC")?;
        let iter = stmt.query_map([], |row| {
            Ok(Game {
                game_id: row.get(0)?,
                title: row.get(1)?,
                created_at: row.get(2)?,
            })
        })?;

        let mut out = Vec::new();
        for game in iter {
            out.push(game?);
        }
        Ok(out)
    }

    /// 게임 삭제 (레벨/단어/진행/이어하기 행을 한 트랜잭션으로 연쇄 삭제)
    pub fn delete_game(&self, game_id: i64) -> Result<(), GameError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute(
            "DELETE FROM progress WHERE level_id IN (SELECT level_id FROM levels WHERE game_id = ?1)",
            [game_id],
        )?;
        tx.execute(
            "DELETE FROM words WHERE level_id IN (SELECT level_id FROM levels WHERE game_id = ?1)",
            [game_id],
        )?;
        tx.execute("DELETE FROM user_game_preference WHERE game_id = ?1", [game_id])?;
        tx.execute("DELETE FROM levels WHERE game_id = ?1", [game_id])?;
        let affected = tx.execute("DELETE FROM games WHERE game_id = ?1", [game_id])?;

        if affected == 0 {
            // 존재하지 않는 게임: 커밋 없이 롤백
            tx.rollback()?;
            return Err(GameError::GameNotFound(game_id));
        }

        tx.commit()?;
        log::info!("[Admin] game deleted id:{}", game_id);
        Ok(())
    }

    // ---- 레벨 ----

    /// 레벨 생성 (난이도 1~3, level_number는 게임 내 유일)
    pub fn create_level(
        &self,
        game_id: i64,
        difficulty: u8,
        level_number: i64,
        given_letters: &str,
    ) -> Result<Level, GameError> {
        if !(1..=3).contains(&difficulty) {
            return Err(GameError::InvalidOperation(format!(
                "difficulty must be 1-3, got {}",
                difficulty
            )));
        }

        let game_exists: Option<i64> = self
            .conn
            .query_row("SELECT game_id FROM games WHERE game_id = ?1", [game_id], |row| {
                row.get(0)
            })
            .optional()?;
        if game_exists.is_none() {
            return Err(GameError::GameNotFound(game_id));
        }

        if self.level_by_number(game_id, level_number)?.is_some() {
            return Err(GameError::InvalidOperation(format!(
                "level number {} already exists in game {}",
                level_number, game_id
            )));
        }

        self.conn.execute(
            "INSERT INTO levels (game_id, difficulty, level_number, given_letters)
             VALUES (?1, ?2, ?3, ?4)",
            (game_id, difficulty, level_number, given_letters),
        )?;

        Ok(Level {
            level_id: self.conn.last_insert_rowid(),
            game_id,
            difficulty,
            level_number,
            given_letters: given_letters.to_string(),
        })
    }

    /// 레벨 수정
    pub fn update_level(&self, level: &Level) -> Result<(), GameError> {
        if !(1..=3).contains(&level.difficulty) {
            return Err(GameError::InvalidOperation(format!(
                "difficulty must be 1-3, got {}",
                level.difficulty
            )));
        }

        // 같은 게임의 다른 레벨과 순번 충돌 검사
        let conflict: Option<i64> = self
            .conn
            .query_row(
                "SELECT level_id FROM levels
                 WHERE game_id = ?1 AND level_number = ?2 AND level_id != ?3",
                (level.game_id, level.level_number, level.level_id),
                |row| row.get(0),
            )
            .optional()?;
        if conflict.is_some() {
            return Err(GameError::InvalidOperation(format!(
                "level number {} already exists in game {}",
                level.level_number, level.game_id
            )));
        }

        let affected = self.conn.execute(
            "UPDATE levels SET difficulty = ?1, level_number = ?2, given_letters = ?3
             WHERE level_id = ?4",
            (level.difficulty, level.level_number, &level.given_letters, level.level_id),
        )?;
        if affected == 0 {
            return Err(GameError::LevelNotFound(level.level_id));
        }
        Ok(())
    }

    /// 레벨 삭제 (단어/진행/이어하기 행을 한 트랜잭션으로 연쇄 삭제)
    pub fn delete_level(&self, level_id: i64) -> Result<(), GameError> {
        let tx = self.conn.unchecked_transaction()?;

        tx.execute("DELETE FROM progress WHERE level_id = ?1", [level_id])?;
        tx.execute("DELETE FROM words WHERE level_id = ?1", [level_id])?;
        tx.execute(
            "DELETE FROM user_game_preference WHERE current_level_id = ?1",
            [level_id],
        )?;
        let affected = tx.execute("DELETE FROM levels WHERE level_id = ?1", [level_id])?;

        if affected == 0 {
            tx.rollback()?;
            return Err(GameError::LevelNotFound(level_id));
        }

        tx.commit()?;
        log::info!("[Admin] level deleted id:{}", level_id);
        Ok(())
    }

    /// 레벨 조회
    pub fn get_level(&self, level_id: i64) -> Result<Level, GameError> {
        let mut stmt = self.conn.prepare(
            "SELECT level_id, game_id, difficulty, level_number, given_letters
             FROM levels WHERE level_id = ?1",
        )?;

        stmt.query_row([level_id], |row| {
            Ok(Level {
                level_id: row.get(0)?,
                game_id: row.get(1)?,
                difficulty: row.get(2)?,
                level_number: row.get(3)?,
                given_letters: row.get(4)?,
            })
        })
        .map_err(|_| GameError::LevelNotFound(level_id))
    }

    /// 게임 내 순번으로 레벨 조회
    pub fn level_by_number(&self, game_id: i64, level_number: i64) -> Result<Option<Level>, GameError> {
        let level = self
            .conn
            .query_row(
                "SELECT level_id, game_id, difficulty, level_number, given_letters
                 FROM levels WHERE game_id = ?1 AND level_number = ?2",
                (game_id, level_number),
                |row| {
                    Ok(Level {
                        level_id: row.get(0)?,
                        game_id: row.get(1)?,
                        difficulty: row.get(2)?,
                        level_number: row.get(3)?,
                        given_letters: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(level)
    }

    /// 게임의 레벨 목록 (순번 오름차순)
    pub fn list_levels(&self, game_id: i64) -> Result<Vec<Level>, GameError> {
        let mut stmt = self.conn.prepare(
            "SELECT level_id, game_id, difficulty, level_number, given_letters
             FROM levels WHERE game_id = ?1 ORDER BY level_number",
        )?;

        let iter = stmt.query_map([game_id], |row| {
            Ok(Level {
                level_id: row.get(0)?,
                game_id: row.get(1)?,
                difficulty: row.get(2)?,
                level_number: row.get(3)?,
                given_letters: row.get(4)?,
            })
        })?;

        let mut out = Vec::new();
        for level in iter {
            out.push(level?);
        }
        Ok(out)
    }

    // ---- 정답 단어 ----

    /// 레벨 단어 목록 교체 (공백 제거/소문자/중복 제거 후 저장, 저장된 개수 반환)
    pub fn set_level_words(&self, level_id: i64, words: &[String]) -> Result<usize, GameError> {
        // 삽입 전 입력 단계에서 정규화 및 중복 제거
        let normalized: BTreeSet<String> = words
            .iter()
            .map(|w| w.trim().to_lowercase())
            .filter(|w| !w.is_empty())
            .collect();

        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM words WHERE level_id = ?1", [level_id])?;
        for word in &normalized {
            tx.execute(
                "INSERT INTO words (level_id, word) VALUES (?1, ?2)",
                (level_id, word),
            )?;
        }
        tx.commit()?;

        Ok(normalized.len())
    }

    /// 레벨 정답 단어 집합 (소문자)
    pub fn level_words(&self, level_id: i64) -> Result<BTreeSet<String>, GameError> {
        let mut stmt = self
            .conn
            .prepare("SELECT word FROM words WHERE level_id = ?1")?;
        let iter = stmt.query_map([level_id], |row| row.get::<_, String>(0))?;

        let mut out = BTreeSet::new();
        for word in iter {
            out.insert(word?.to_lowercase());
        }
        Ok(out)
    }

    /// 레벨 정답 단어 개수
    pub fn level_word_count(&self, level_id: i64) -> Result<i64, GameError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM words WHERE level_id = ?1",
            [level_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    // ---- 진행 상태 ----

    /// 진행 상태 로드 (행이 없으면 None)
    pub fn load_progress(&self, user_id: &str, level_id: i64) -> Result<Option<LevelState>, GameError> {
        let state = self
            .conn
            .query_row(
                "SELECT found_words_json, score, hints_used, start_time, last_played
                 FROM progress WHERE user_id = ?1 AND level_id = ?2",
                (user_id, level_id),
                |row| {
                    let found_json: String = row.get(0)?;
                    Ok(LevelState {
                        found_words: serde_json::from_str(&found_json).unwrap_or_default(),
                        score: row.get(1)?,
                        hints_used: row.get(2)?,
                        start_time: row.get(3)?,
                        last_played: row.get(4)?,
                    })
                },
            )
            .optional()?;
        Ok(state)
    }

    /// 진행 상태 저장 (score는 항상 found_words에서 재계산하여 기록)
    pub fn save_progress(&self, user_id: &str, level_id: i64, state: &LevelState) -> Result<(), GameError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO progress
             (user_id, level_id, found_words_json, score, hints_used, start_time, last_played)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                user_id,
                level_id,
                serde_json::to_string(&state.found_words)?,
                state.computed_score(),
                state.hints_used,
                state.start_time,
                state.last_played,
            ),
        )?;
        Ok(())
    }

    /// 진행 상태 삭제 (레벨 리셋, 삭제 여부 반환)
    pub fn delete_progress(&self, user_id: &str, level_id: i64) -> Result<bool, GameError> {
        let affected = self.conn.execute(
            "DELETE FROM progress WHERE user_id = ?1 AND level_id = ?2",
            (user_id, level_id),
        )?;
        Ok(affected > 0)
    }

    /// 사용자가 플레이한 최고 레벨 순번 (진행 기록이 없으면 None)
    pub fn max_played_level_number(&self, user_id: &str, game_id: i64) -> Result<Option<i64>, GameError> {
        let max: Option<i64> = self.conn.query_row(
            "SELECT MAX(l.level_number)
             FROM progress p JOIN levels l ON l.level_id = p.level_id
             WHERE p.user_id = ?1 AND l.game_id = ?2",
            (user_id, game_id),
            |row| row.get(0),
        )?;
        Ok(max)
    }

    // ---- 이어하기 ----

    /// 저장된 이어하기 레벨 조회
    pub fn preference_level(&self, user_id: &str, game_id: i64) -> Result<Option<i64>, GameError> {
        let level_id = self
            .conn
            .query_row(
                "SELECT current_level_id FROM user_game_preference
                 WHERE user_id = ?1 AND game_id = ?2",
                (user_id, game_id),
                |row| row.get(0),
            )
            .optional()?;
        Ok(level_id)
    }

    /// 이어하기 레벨 저장 (upsert)
    pub fn set_preference_level(&self, user_id: &str, game_id: i64, level_id: i64) -> Result<(), GameError> {
        self.conn.execute(
            "INSERT OR REPLACE INTO user_game_preference (user_id, game_id, current_level_id)
             VALUES (?1, ?2, ?3)",
            (user_id, game_id, level_id),
        )?;
        Ok(())
    }

    // ---- 리더보드 ----

    /// 레벨 진행 행을 순위 기준으로 상위 limit개 조회.
    /// 정렬 기준: 점수 내림차순, 힌트 사용 오름차순, 경과 시간(초) 오름차순.
    pub fn top_progress_rows(&self, level_id: i64, limit: usize) -> Result<Vec<LeaderboardEntry>, GameError> {
        let mut stmt = self.conn.prepare(
            "SELECT user_id, score, hints_used, (last_played - start_time) / 1000 AS elapsed
             FROM progress WHERE level_id = ?1
             ORDER BY score DESC, hints_used ASC, elapsed ASC
             LIMIT ?2",
        )?;

        let iter = stmt.query_map((level_id, limit as i64), |row| {
            Ok(LeaderboardEntry {
                user_id: row.get(0)?,
                score: row.get(1)?,
                hints_used: row.get(2)?,
                elapsed_secs: row.get(3)?,
            })
        })?;

        let mut out = Vec::new();
        for entry in iter {
            out.push(entry?);
        }
        Ok(out)
    }

    /// 특정 사용자의 리더보드 행 조회
    pub fn progress_entry(&self, level_id: i64, user_id: &str) -> Result<Option<LeaderboardEntry>, GameError> {
        let entry = self
            .conn
            .query_row(
                "SELECT user_id, score, hints_used, (last_played - start_time) / 1000
                 FROM progress WHERE level_id = ?1 AND user_id = ?2",
                (level_id, user_id),
                |row| {
                    Ok(LeaderboardEntry {
                        user_id: row.get(0)?,
                        score: row.get(1)?,
                        hints_used: row.get(2)?,
                        elapsed_secs: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(entry)
    }

    /// 주어진 행보다 엄격히 앞서는 행 수.
    /// 앞선다 = 점수가 더 높거나, 점수가 같고 힌트가 더 적거나,
    /// 점수와 힌트가 같고 경과 시간(초)이 더 짧은 경우.
    pub fn outrank_count(&self, level_id: i64, entry: &LeaderboardEntry) -> Result<i64, GameError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM progress
             WHERE level_id = ?1 AND user_id != ?2
               AND (score > ?3
                    OR (score = ?3 AND hints_used < ?4)
                    OR (score = ?3 AND hints_used = ?4
                        AND (last_played - start_time) / 1000 < ?5))",
            (level_id, &entry.user_id, entry.score, entry.hints_used, entry.elapsed_secs),
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
