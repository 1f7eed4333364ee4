//! フォルダ一括処理
//!
//! 画像ごとのリクエストは独立しているため rayon で並列に処理する。
//! 失敗した画像は構造化エラーとして結果に残し、他の画像の処理は続ける。

use crate::analyzer::{
    compute_hash, respond, BatchItem, CacheFile, Collaborators, DetectionResponse, MaterialDetector,
    Outcome,
};
use crate::analyzer::cache::CacheEntry;
use crate::config::Config;
use crate::error::{FailureResponse, Result};
use crate::scanner::{ImageInfo, SchemeImage};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// バッチ処理のオプション
#[derive(Debug, Clone, Default)]
pub struct BatchOptions {
    pub use_cache: bool,
    pub with_analysis: bool,
    pub show_progress: bool,
}

/// バッチ結果一式
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    /// 生成日時 (RFC 3339)
    pub generated_at: String,
    pub folder: String,
    pub total: usize,
    pub succeeded: usize,
    pub items: Vec<BatchItem>,
}

impl BatchReport {
    pub fn new(folder: &Path, items: Vec<BatchItem>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            folder: folder.display().to_string(),
            total: items.len(),
            succeeded: items.iter().filter(|i| i.is_success()).count(),
            items,
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }
}

/// 画像1件を処理する（キャッシュヒット時は外部モデルを呼ばない）
fn process_image(
    info: &ImageInfo,
    config: &Config,
    cache: Option<&CacheFile>,
    with_analysis: bool,
) -> Result<(DetectionResponse, Option<(String, CacheEntry)>)> {
    let image = SchemeImage::from_path(&info.path)?;
    let hash = compute_hash(&image.bytes);

    if let Some(entry) = cache.and_then(|c| c.get(&hash)) {
        tracing::debug!(file = %info.file_name, "キャッシュヒット");
        return Ok((respond(&entry.signals, entry.processed_images, with_analysis), None));
    }

    let collaborators = Collaborators::resolve(config, Some(&info.path), None)?;
    let detector = MaterialDetector::new(collaborators, config.clone());
    let gathered = detector.gather_signals(&image);
    let response = respond(&gathered.signals, gathered.processed_images, with_analysis);

    let entry = CacheEntry {
        file_name: info.file_name.clone(),
        file_size: image.bytes.len() as u64,
        processed_images: gathered.processed_images,
        signals: gathered.signals,
    };
    Ok((response, Some((hash, entry))))
}

/// フォルダ内の画像をまとめて処理する
pub fn run_batch(
    images: &[ImageInfo],
    folder: &Path,
    config: &Config,
    options: &BatchOptions,
) -> Result<BatchReport> {
    let mut cache = if options.use_cache {
        Some(CacheFile::load(folder))
    } else {
        None
    };

    let progress = if options.show_progress {
        let pb = ProgressBar::new(images.len() as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
        {
            pb.set_style(style.progress_chars("#>-"));
        }
        pb
    } else {
        ProgressBar::hidden()
    };

    let cache_ref = cache.as_ref();
    let outcomes: Vec<(BatchItem, Option<(String, CacheEntry)>)> = images
        .par_iter()
        .map(|info| {
            let result = process_image(info, config, cache_ref, options.with_analysis);
            progress.inc(1);
            match result {
                Ok((response, new_entry)) => (
                    BatchItem {
                        file_name: info.file_name.clone(),
                        outcome: Outcome::Success(Box::new(response)),
                    },
                    new_entry,
                ),
                Err(e) => {
                    tracing::warn!(file = %info.file_name, "処理失敗: {}", e);
                    (
                        BatchItem {
                            file_name: info.file_name.clone(),
                            outcome: Outcome::Failure(FailureResponse::from(&e)),
                        },
                        None,
                    )
                }
            }
        })
        .collect();
    progress.finish_and_clear();

    let mut items = Vec::with_capacity(outcomes.len());
    let mut new_entries = 0usize;
    for (item, new_entry) in outcomes {
        if let (Some(cache), Some((hash, entry))) = (cache.as_mut(), new_entry) {
            cache.insert(hash, entry);
            new_entries += 1;
        }
        items.push(item);
    }

    if let Some(cache) = &cache {
        if new_entries > 0 {
            cache.save(folder)?;
            tracing::info!(added = new_entries, total = cache.len(), "キャッシュを更新");
        }
    }

    Ok(BatchReport::new(folder, items))
}
