use crate::error::{Result, WellBomError};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// OCR（tesseract）設定
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrConfig {
    /// 実行ファイル
    pub command: String,
    pub language: String,
    /// 順に試すページ分割モード
    pub psm_modes: Vec<u8>,
    /// これ以下の信頼度の断片は捨てる
    pub min_confidence: f64,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".into(),
            language: "rus+eng".into(),
            psm_modes: vec![6, 7, 8, 9, 10, 11, 12, 13],
            min_confidence: 0.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ocr: OcrConfig,
    /// 物体検出の信頼度閾値（全閾値の結果をまとめてから重複除去）
    pub detection_thresholds: Vec<f64>,
    /// 前処理バリアントを生成するか（false なら原画像のみ）
    pub generate_variants: bool,
    pub upscale_factor: f32,
    /// 記録済み信号ファイルの接尾辞（scheme.png → scheme.signals.json）
    pub signals_suffix: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ocr: OcrConfig::default(),
            detection_thresholds: vec![0.25, 0.35, 0.45, 0.55],
            generate_variants: true,
            upscale_factor: 2.0,
            signals_suffix: ".signals.json".into(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            tracing::debug!(path = %config_path.display(), "設定を読み込み");
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| WellBomError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("well-bom").join("config.json"))
    }
}
