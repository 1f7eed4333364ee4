//! テキストからの資材候補抽出
//!
//! 行単位で全カテゴリを走査し、2系統で候補を作る:
//! - パターン抽出: 正規表現の一致全体を名称に、捕捉した数値をサイズにする
//! - キーワード抽出: キーワードの出現ごとに周辺からサイズを推定する
//!
//! 同じ記述から両系統の候補が出るのは意図どおりで、後段の統合で解消する。

use crate::taxonomy::{KeywordRule, MaterialCategoryDefinition, Taxonomy};
use crate::types::{CaptionResult, MaterialCandidate, Provenance, STANDARD_SIZE};
use regex::{Captures, Regex};

/// パターン抽出の信頼度
pub const PATTERN_CONFIDENCE: f64 = 0.9;
/// キーワード抽出の信頼度
pub const KEYWORD_CONFIDENCE: f64 = 0.7;

/// これより短い行は無視
const MIN_LINE_CHARS: usize = 2;

/// 抽出対象テキストの出所
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextOrigin {
    /// OCRテキスト
    Ocr,
    /// キャプション・質問応答
    Caption,
}

impl TextOrigin {
    fn pattern_provenance(self) -> Provenance {
        match self {
            TextOrigin::Ocr => Provenance::TextPattern,
            TextOrigin::Caption => Provenance::CaptionText,
        }
    }

    fn keyword_provenance(self) -> Provenance {
        match self {
            TextOrigin::Ocr => Provenance::TextKeyword,
            TextOrigin::Caption => Provenance::CaptionText,
        }
    }
}

lazy_static::lazy_static! {
    /// 数量推定（先に一致したものを採用）
    static ref QUANTITY_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"(\d+)\s*(?:шт|штук|дона|pc|pieces|комплект)").unwrap(),
        Regex::new(r"количество\s*[:-]?\s*(\d+)").unwrap(),
        Regex::new(r"qty\s*[:-]?\s*(\d+)").unwrap(),
        Regex::new(r"к[-]во\s*[:-]?\s*(\d+)").unwrap(),
    ];
}

/// テキストから資材候補を抽出する
///
/// # Arguments
/// * `text` - 改行区切りの自由テキスト
/// * `taxonomy` - 使用するタクソノミー
/// * `origin` - テキストの出所（抽出経路の判定に使用）
///
/// # Returns
/// 重複を含む候補リスト（入力が同じなら常に同じ結果）
pub fn extract_candidates(
    text: &str,
    taxonomy: &Taxonomy,
    origin: TextOrigin,
) -> Vec<MaterialCandidate> {
    let mut candidates = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.chars().count() < MIN_LINE_CHARS {
            continue;
        }

        let line_lower = line.to_lowercase();

        for definition in &taxonomy.definitions {
            pattern_pass(&line_lower, definition, origin, &mut candidates);
            keyword_pass(&line_lower, definition, origin, &mut candidates);
        }
    }

    tracing::debug!(
        taxonomy = ?taxonomy.kind,
        origin = ?origin,
        count = candidates.len(),
        "テキスト候補を抽出"
    );

    candidates
}

/// キャプションと回答から候補を抽出する
pub fn extract_caption_candidates(
    caption: &CaptionResult,
    taxonomy: &Taxonomy,
) -> Vec<MaterialCandidate> {
    if caption.is_empty() {
        return Vec::new();
    }
    extract_candidates(&caption.combined_text(), taxonomy, TextOrigin::Caption)
}

fn pattern_pass(
    line: &str,
    definition: &MaterialCategoryDefinition,
    origin: TextOrigin,
    out: &mut Vec<MaterialCandidate>,
) {
    for pattern in &definition.patterns {
        for caps in pattern.captures_iter(line) {
            let Some(whole) = caps.get(0) else { continue };
            let matched = whole.as_str().trim();
            if matched.is_empty() {
                continue;
            }

            out.push(MaterialCandidate {
                name: title_case(matched),
                size: size_from_groups(&caps),
                quantity: infer_quantity(line, matched),
                category: definition.key.to_string(),
                unit: definition.unit.to_string(),
                confidence: PATTERN_CONFIDENCE,
                source: origin.pattern_provenance(),
                notes: Vec::new(),
            });
        }
    }
}

fn keyword_pass(
    line: &str,
    definition: &MaterialCategoryDefinition,
    origin: TextOrigin,
    out: &mut Vec<MaterialCandidate>,
) {
    for rule in &definition.keywords {
        if !line.contains(rule.keyword) {
            continue;
        }

        out.push(MaterialCandidate {
            name: title_case(rule.keyword),
            size: infer_keyword_size(line, rule),
            quantity: 1,
            category: definition.key.to_string(),
            unit: definition.unit.to_string(),
            confidence: KEYWORD_CONFIDENCE,
            source: origin.keyword_provenance(),
            notes: Vec::new(),
        });
    }
}

/// 捕捉グループからサイズ文字列を作る
///
/// 1個なら `Ø{n}мм`、2個なら `{a}-{b}`、それ以外は番兵値。
fn size_from_groups(caps: &Captures<'_>) -> String {
    let parts: Vec<&str> = caps
        .iter()
        .skip(1)
        .flatten()
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .collect();

    match parts.as_slice() {
        [n] => format!("Ø{}мм", n),
        [a, b] => format!("{}-{}", a, b),
        _ => STANDARD_SIZE.to_string(),
    }
}

/// キーワード周辺からサイズを推定する
fn infer_keyword_size(line: &str, rule: &KeywordRule) -> String {
    for pattern in &rule.size_patterns {
        let Some(caps) = pattern.captures(line) else { continue };
        let Some(first) = caps.get(1) else { continue };

        return match caps.get(2).filter(|m| !m.as_str().is_empty()) {
            Some(second) => format!("{}-{}", first.as_str(), second.as_str()),
            None => format!("Ø{}мм", first.as_str()),
        };
    }

    STANDARD_SIZE.to_string()
}

/// 行から数量を推定する（既定1）
///
/// 最後の手段として「数値 + 一致した名称」を探す。名称は正規表現として
/// エスケープしてから埋め込む。
fn infer_quantity(line: &str, matched: &str) -> u32 {
    for pattern in QUANTITY_PATTERNS.iter() {
        if let Some(quantity) = capture_quantity(pattern, line) {
            return quantity;
        }
    }

    let preceding = format!(r"(\d+)\s*{}", regex::escape(matched));
    match Regex::new(&preceding) {
        Ok(pattern) => capture_quantity(&pattern, line).unwrap_or(1),
        Err(e) => {
            tracing::debug!(pattern = %preceding, "数量パターンをスキップ: {}", e);
            1
        }
    }
}

fn capture_quantity(pattern: &Regex, line: &str) -> Option<u32> {
    pattern
        .captures(line)?
        .get(1)?
        .as_str()
        .parse::<u32>()
        .ok()
        .filter(|q| *q > 0)
}

/// 単語先頭を大文字、それ以外を小文字にする
///
/// 英字以外の文字の直後を単語先頭とみなす（`кс-20` → `Кс-20`）。
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut prev_alpha = false;

    for c in text.chars() {
        if prev_alpha {
            out.extend(c.to_lowercase());
        } else {
            out.extend(c.to_uppercase());
        }
        prev_alpha = c.is_alphabetic();
    }

    out
}
