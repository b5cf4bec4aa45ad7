//! WordVine Error Types
//!
//! 게임 백엔드 전역 에러 타입 정의

use serde::Serialize;
use thiserror::Error;

/// WordVine 게임 에러
#[derive(Error, Debug)]
pub enum GameError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Game not found: {0}")]
    GameNotFound(i64),

    #[error("Level not found: {0}")]
    LevelNotFound(i64),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

/// 페이지/AJAX 응답용 직렬화 가능한 에러
#[derive(Debug, Serialize)]
pub struct ServiceError {
    pub code: String,
    pub message: String,
    pub details: Option<String>,
}

impl From<GameError> for ServiceError {
    fn from(error: GameError) -> Self {
        let code = match &error {
            GameError::Database(_) => "DB_ERROR",
            GameError::Io(_) => "IO_ERROR",
            GameError::Serialization(_) => "SERIALIZATION_ERROR",
            GameError::GameNotFound(_) => "GAME_NOT_FOUND",
            GameError::LevelNotFound(_) => "LEVEL_NOT_FOUND",
            GameError::InvalidOperation(_) => "INVALID_OPERATION",
        };

        ServiceError {
            code: code.to_string(),
            message: error.to_string(),
            details: None,
        }
    }
}

/// 서비스 계층 결과 타입
pub type ServiceResult<T> = Result<T, ServiceError>;
