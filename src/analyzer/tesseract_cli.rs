//! tesseract CLI連携
//!
//! バリアント画像を一時ファイルに書き出し、ページ分割モードごとに tesseract を実行する。

use super::{TextFragment, TextRecognizer};
use crate::config::OcrConfig;
use crate::error::{Result, WellBomError};
use crate::preprocess::ImageVariant;
use std::path::Path;
use std::process::Command;

#[derive(Debug, Clone)]
pub struct TesseractCli {
    command: String,
    language: String,
    psm_modes: Vec<u8>,
}

impl TesseractCli {
    pub fn from_config(config: &OcrConfig) -> Self {
        Self {
            command: config.command.clone(),
            language: config.language.clone(),
            psm_modes: config.psm_modes.clone(),
        }
    }

    fn run(&self, image_path: &Path, psm: u8) -> Result<Option<String>> {
        let output = Command::new(&self.command)
            .arg(image_path)
            .arg("stdout")
            .args(["-l", &self.language, "--psm", &psm.to_string()])
            .output()
            .map_err(|e| WellBomError::Collaborator(format!("tesseract実行エラー: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(psm, code = ?output.status.code(), "tesseract失敗: {}", stderr.trim());
            return Ok(None);
        }

        Ok(Some(String::from_utf8_lossy(&output.stdout).to_string()))
    }
}

impl TextRecognizer for TesseractCli {
    fn recognize(&self, variant: &ImageVariant) -> Result<Vec<TextFragment>> {
        let temp = tempfile::Builder::new()
            .prefix("well-bom-")
            .suffix(".png")
            .tempfile()?;
        variant
            .image
            .save(temp.path())
            .map_err(|e| WellBomError::Collaborator(format!("一時画像の保存に失敗: {}", e)))?;

        let mut fragments = Vec::new();
        for &psm in &self.psm_modes {
            // 実行ファイルがない場合はここでエラーを返す
            if let Some(text) = self.run(temp.path(), psm)? {
                if !text.trim().is_empty() {
                    fragments.push(TextFragment::new(text, None));
                }
            }
        }

        tracing::debug!(variant = variant.name, fragments = fragments.len(), "tesseract完了");
        Ok(fragments)
    }
}
