//! 井戸スキームの追加分析
//!
//! 統合済み明細から井戸の種別・寸法・資材の充足度を推定する。

use crate::taxonomy::{UsageKind, ESSENTIAL_CATEGORIES, USAGE_CONTEXTS};
use crate::types::MaterialRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

const UNKNOWN: &str = "unknown";

/// 井戸分析結果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WellAnalysis {
    pub scheme_type: String,
    pub depth_estimate: String,
    pub diameter_estimate: String,
    /// 必須カテゴリの充足率 (0.0〜1.0)
    pub material_completeness: f64,
    pub construction_feasibility: String,
    pub estimated_cost: String,
}

impl Default for WellAnalysis {
    fn default() -> Self {
        Self {
            scheme_type: UNKNOWN.to_string(),
            depth_estimate: "не определена".to_string(),
            diameter_estimate: "не определен".to_string(),
            material_completeness: 0.0,
            construction_feasibility: UNKNOWN.to_string(),
            estimated_cost: "не рассчитана".to_string(),
        }
    }
}

/// 井戸スキームを分析する（井戸でなければ既定値）
pub fn analyze_well(materials: &[MaterialRecord], is_well_scheme: bool) -> WellAnalysis {
    let mut analysis = WellAnalysis::default();
    if !is_well_scheme {
        return analysis;
    }

    analysis.scheme_type = scheme_type(materials).to_string();

    if let Some((diameter, depth)) = estimate_dimensions(materials) {
        analysis.diameter_estimate = diameter;
        analysis.depth_estimate = depth;
    }

    analysis.material_completeness = completeness(materials);
    analysis.construction_feasibility = feasibility(analysis.material_completeness).to_string();

    tracing::debug!(
        scheme_type = %analysis.scheme_type,
        completeness = analysis.material_completeness,
        "井戸スキームを分析"
    );

    analysis
}

/// 用途メモ・名称から井戸の種別を決める（下水 → 上水 → 排水の順）
fn scheme_type(materials: &[MaterialRecord]) -> &'static str {
    let mentions = |kind: UsageKind| {
        USAGE_CONTEXTS.iter().filter(|ctx| ctx.kind == kind).any(|ctx| {
            materials.iter().any(|m| {
                let name = m.name.to_lowercase();
                m.notes.iter().any(|n| n == ctx.note)
                    || ctx.keywords.iter().any(|kw| name.contains(kw))
            })
        })
    };

    if mentions(UsageKind::Sewage) {
        "канализационный колодец"
    } else if mentions(UsageKind::Water) {
        "водопроводный колодец"
    } else if mentions(UsageKind::Drainage) {
        "дренажный колодец"
    } else {
        "универсальный колодец"
    }
}

/// リングの "直径-高さ" サイズから (直径, 深さ) を推定
///
/// 深さ = 高さ × リング総数
fn estimate_dimensions(materials: &[MaterialRecord]) -> Option<(String, String)> {
    let rings: Vec<&MaterialRecord> = materials
        .iter()
        .filter(|m| m.name.to_lowercase().contains("кольцо"))
        .collect();
    let total_rings: u64 = rings.iter().map(|m| u64::from(m.quantity)).sum();

    rings.iter().find_map(|ring| {
        let (diameter, height) = ring.size.split_once('-')?;
        let height: u64 = height.trim().parse().ok()?;
        let diameter = diameter.trim();
        if diameter.is_empty() {
            return None;
        }
        Some((
            format!("{}0 см", diameter),
            format!("{} см", height * total_rings),
        ))
    })
}

fn completeness(materials: &[MaterialRecord]) -> f64 {
    let found: HashSet<&str> = materials.iter().map(|m| m.category.as_str()).collect();
    let present = ESSENTIAL_CATEGORIES
        .iter()
        .filter(|c| found.contains(*c))
        .count();
    present as f64 / ESSENTIAL_CATEGORIES.len() as f64
}

fn feasibility(completeness: f64) -> &'static str {
    if completeness > 0.8 {
        "высокая"
    } else if completeness > 0.6 {
        "средняя"
    } else {
        "низкая"
    }
}
