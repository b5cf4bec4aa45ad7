//! WordVine Data Models
//!
//! 프런트엔드(JS) 타입과 매핑되는 Rust 데이터 모델

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// 게임 (레벨 묶음)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    #[serde(rename = "gameId")]
    pub game_id: i64,
    pub title: String,
    #[serde(rename = "createdAt")]
    pub created_at: i64,
}

/// 레벨 정의 (주어진 글자와 정답 목록을 가진 퍼즐 한 판)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Level {
    #[serde(rename = "levelId")]
    pub level_id: i64,
    #[serde(rename = "gameId")]
    pub game_id: i64,
    /// 난이도 (1~3)
    pub difficulty: u8,
    /// 게임 내 레벨 순번 (게임 단위로 유일)
    #[serde(rename = "levelNumber")]
    pub level_number: i64,
    #[serde(rename = "givenLetters")]
    pub given_letters: String,
}

/// 사용자별 레벨 진행 상태 스냅샷
///
/// found_words가 원본 데이터이며 score는 항상 단어 길이 합으로 재계산된다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelState {
    /// 찾은 단어 집합 (소문자, 중복 없음, 정렬 저장)
    #[serde(rename = "foundWords")]
    pub found_words: BTreeSet<String>,
    pub score: i64,
    #[serde(rename = "hintsUsed")]
    pub hints_used: u32,
    /// 최초 플레이 시각 (epoch millis)
    #[serde(rename = "startTime")]
    pub start_time: i64,
    /// 마지막 플레이 시각 (epoch millis)
    #[serde(rename = "lastPlayed")]
    pub last_played: i64,
}

impl LevelState {
    /// 새 세션용 기본 상태 (시작/마지막 시각을 now로 초기화)
    pub fn new(now: i64) -> Self {
        Self {
            found_words: BTreeSet::new(),
            score: 0,
            hints_used: 0,
            start_time: now,
            last_played: now,
        }
    }

    /// 찾은 단어 길이 합 (score의 유일한 정의)
    pub fn computed_score(&self) -> i64 {
        self.found_words.iter().map(|w| w.chars().count() as i64).sum()
    }
}

/// 단어 제출 결과 - 호출자는 에러가 아닌 이 값으로 수락/거절을 구분한다
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum SubmitOutcome {
    /// 수락됨 (갱신된 점수 포함)
    Accepted { score: i64 },
    /// 레벨 단어 목록에 없는 단어
    NotInWordList,
    /// 이미 찾은 단어 (no-op)
    AlreadyFound,
}

/// 리더보드 한 줄
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    #[serde(rename = "userId")]
    pub user_id: String,
    pub score: i64,
    #[serde(rename = "hintsUsed")]
    pub hints_used: u32,
    /// 경과 시간 (초 단위, last_played - start_time)
    #[serde(rename = "elapsedSecs")]
    pub elapsed_secs: i64,
}

/// 레벨 리더보드: 상위 10명 + 요청자 순위
#[derive(Debug, Clone, Serialize)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
    /// 요청자 순위 (1부터, 진행 기록이 없으면 None)
    #[serde(rename = "myRank")]
    pub my_rank: Option<u32>,
    /// 요청자가 상위 10명 밖일 때 별도 표시용 본인 행
    #[serde(rename = "myEntry")]
    pub my_entry: Option<LeaderboardEntry>,
}
