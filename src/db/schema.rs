//! Database Schema
//!
//! SQLite 테이블 스키마 정의

/// 데이터베이스 스키마 생성 SQL
pub const CREATE_SCHEMA: &str = r#"
-- 게임 테이블
CREATE TABLE IF NOT EXISTS games (
    game_id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- 레벨 테이블
CREATE TABLE IF NOT EXISTS levels (
    level_id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id INTEGER NOT NULL,
    difficulty INTEGER NOT NULL CHECK (difficulty BETWEEN 1 AND 3),
    level_number INTEGER NOT NULL,
    given_letters TEXT NOT NULL,
    FOREIGN KEY (game_id) REFERENCES games(game_id) ON DELETE CASCADE
);

-- 레벨 인덱스
CREATE INDEX IF NOT EXISTS idx_levels_game ON levels(game_id);
CREATE INDEX IF NOT EXISTS idx_levels_number ON levels(game_id, level_number);

-- 정답 단어 테이블 (중복 제거는 입력 단계에서 수행, 제약조건 없음)
CREATE TABLE IF NOT EXISTS words (
    level_id INTEGER NOT NULL,
    word TEXT NOT NULL,
    FOREIGN KEY (level_id) REFERENCES levels(level_id) ON DELETE CASCADE
);

-- 단어 인덱스
CREATE INDEX IF NOT EXISTS idx_words_level ON words(level_id);

-- 진행 상태 테이블 (사용자 x 레벨 당 1행)
CREATE TABLE IF NOT EXISTS progress (
    user_id TEXT NOT NULL,
    level_id INTEGER NOT NULL,
    found_words_json TEXT NOT NULL,  -- JSON Array (소문자, 정렬)
    score INTEGER NOT NULL DEFAULT 0,
    hints_used INTEGER NOT NULL DEFAULT 0,
    start_time INTEGER NOT NULL,
    last_played INTEGER NOT NULL,
    PRIMARY KEY (user_id, level_id),
    FOREIGN KEY (level_id) REFERENCES levels(level_id) ON DELETE CASCADE
);

-- 진행 상태 인덱스 (리더보드 조회용)
CREATE INDEX IF NOT EXISTS idx_progress_level ON progress(level_id);

-- 사용자 이어하기 테이블 (게임별 마지막 플레이 레벨)
CREATE TABLE IF NOT EXISTS user_game_preference (
    user_id TEXT NOT NULL,
    game_id INTEGER NOT NULL,
    current_level_id INTEGER NOT NULL,
    PRIMARY KEY (user_id, game_id),
    FOREIGN KEY (game_id) REFERENCES games(game_id) ON DELETE CASCADE
);
"#;
