//! Current Level Resolution
//!
//! 사용자 이어하기 레벨 결정. 분기가 섞이기 쉬운 3단 폴백이라
//! 각 분기를 이름 붙은 값으로 구분하고 개별적으로 테스트한다.

use serde::Serialize;

use crate::db::Database;
use crate::models::Level;

/// 이어하기 레벨이 결정된 경로
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResolvedVia {
    /// 저장된 이어하기 레벨 사용
    Preference,
    /// (플레이한 최고 순번) + 1 레벨
    NextAfterHighest,
    /// 다음 레벨이 없어 플레이한 최고 순번으로 고정
    ClampToHighest,
    /// 진행 기록 없음: 1번 레벨(없으면 가장 낮은 순번)
    FirstLevel,
}

/// 사용자의 현재 레벨 결정.
///
/// 1. 저장된 이어하기 레벨이 있고 아직 존재하면 그대로 사용
/// 2. 진행 기록이 있으면 (최고 플레이 순번 + 1) 레벨
/// 3. 그 다음 레벨이 없으면 최고 플레이 순번 레벨로 고정
/// 4. 그 외에는 1번 레벨 (없으면 게임의 가장 낮은 순번)
///
/// 게임에 레벨이 하나도 없을 때만 None. 조회 실패는 다음 분기로 넘어간다.
pub fn resolve_current_level(
    db: &Database,
    user_id: &str,
    game_id: i64,
) -> Option<(Level, ResolvedVia)> {
    // 1) 이어하기 레벨
    match db.preference_level(user_id, game_id) {
        Ok(Some(level_id)) => {
            if let Ok(level) = db.get_level(level_id) {
                return Some((level, ResolvedVia::Preference));
            }
            // 삭제된 레벨을 가리키는 낡은 행이면 폴백 계속
        }
        Ok(None) => {}
        Err(e) => {
            log::warn!("[Game] preference load failed user:{} err:{}", user_id, e);
        }
    }

    // 2) / 3) 진행 기록 기반
    let max_played = match db.max_played_level_number(user_id, game_id) {
        Ok(max) => max,
        Err(e) => {
            log::warn!("[Game] max level lookup failed user:{} err:{}", user_id, e);
            None
        }
    };

    if let Some(max) = max_played {
        if let Ok(Some(level)) = db.level_by_number(game_id, max + 1) {
            return Some((level, ResolvedVia::NextAfterHighest));
        }
        if let Ok(Some(level)) = db.level_by_number(game_id, max) {
            return Some((level, ResolvedVia::ClampToHighest));
        }
    }

    // 4) 1번 레벨, 없으면 가장 낮은 순번
    if let Ok(Some(level)) = db.level_by_number(game_id, 1) {
        return Some((level, ResolvedVia::FirstLevel));
    }
    match db.list_levels(game_id) {
        Ok(levels) => levels.into_iter().next().map(|l| (l, ResolvedVia::FirstLevel)),
        Err(e) => {
            log::warn!("[Game] level list failed game:{} err:{}", game_id, e);
            None
        }
    }
}
