use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WellBomError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("未対応のファイル形式: {0}")]
    UnsupportedContentType(String),

    #[error("画像データが空です")]
    EmptyImage,

    #[error("画像を読み込めません: {0}")]
    ImageDecode(String),

    #[error("画像が見つかりません: {0}")]
    NoImagesFound(String),

    #[error("外部モデル呼び出しエラー: {0}")]
    Collaborator(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("Excel生成エラー: {0}")]
    ExcelGeneration(String),
}

impl WellBomError {
    /// 機械可読なエラー種別
    pub fn kind(&self) -> &'static str {
        match self {
            WellBomError::Config(_) => "ConfigError",
            WellBomError::FileNotFound(_) => "FileNotFound",
            WellBomError::FolderNotFound(_) => "FolderNotFound",
            WellBomError::UnsupportedContentType(_) => "UnsupportedContentType",
            WellBomError::EmptyImage => "EmptyImage",
            WellBomError::ImageDecode(_) => "ImageDecodeError",
            WellBomError::NoImagesFound(_) => "NoImagesFound",
            WellBomError::Collaborator(_) => "CollaboratorError",
            WellBomError::JsonParse(_) => "JsonError",
            WellBomError::Io(_) => "IoError",
            WellBomError::ExcelGeneration(_) => "ExcelError",
        }
    }
}

/// 失敗時の構造化レスポンス
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureResponse {
    pub success: bool,
    pub error: String,
    pub error_type: String,
}

impl From<&WellBomError> for FailureResponse {
    fn from(err: &WellBomError) -> Self {
        Self {
            success: false,
            error: err.to_string(),
            error_type: err.kind().to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, WellBomError>;
