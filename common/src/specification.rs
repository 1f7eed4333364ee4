//! 資材仕様と対応資材カタログ

use crate::taxonomy::{taxonomy, TaxonomyKind, SCHEME_KEYWORDS};
use crate::types::MaterialRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const TO_DETERMINE: &str = "определить";
const TO_CLARIFY: &str = "уточнить";
const CURRENCY: &str = "сум";

const SUPPLIERS: &[&str] = &[
    "Местные строительные базы",
    "Региональные дистрибьюторы",
    "Производители железобетонных изделий",
    "Специализированные поставщики",
];

/// 技術仕様
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TechnicalSpecs {
    pub standard: String,
    pub material_type: String,
    pub strength_class: String,
    pub temperature_range: String,
    pub pressure_rating: String,
}

impl Default for TechnicalSpecs {
    fn default() -> Self {
        Self {
            standard: "ГОСТ/СНиП".to_string(),
            material_type: TO_DETERMINE.to_string(),
            strength_class: TO_DETERMINE.to_string(),
            temperature_range: TO_DETERMINE.to_string(),
            pressure_rating: TO_DETERMINE.to_string(),
        }
    }
}

/// 価格帯（価格DB未接続のため仮値）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
    pub min_price: String,
    pub max_price: String,
    pub currency: String,
    pub unit: String,
    pub last_updated: String,
}

/// 明細1件の仕様
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSpecification {
    pub name: String,
    pub size: String,
    pub quantity: u32,
    pub unit: String,
    pub technical_specs: TechnicalSpecs,
    pub suppliers: Vec<String>,
    pub price_range: PriceRange,
    pub installation_notes: Vec<String>,
}

/// 名称から判別する資材ファミリー
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Ring,
    Pipe,
    Hatch,
}

fn family(name: &str) -> Option<Family> {
    let lower = name.to_lowercase();
    if lower.contains("кольцо") {
        Some(Family::Ring)
    } else if lower.contains("труба") {
        Some(Family::Pipe)
    } else if lower.contains("люк") {
        Some(Family::Hatch)
    } else {
        None
    }
}

fn specs(values: [&str; 5]) -> TechnicalSpecs {
    let [standard, material_type, strength_class, temperature_range, pressure_rating] = values;
    TechnicalSpecs {
        standard: standard.to_string(),
        material_type: material_type.to_string(),
        strength_class: strength_class.to_string(),
        temperature_range: temperature_range.to_string(),
        pressure_rating: pressure_rating.to_string(),
    }
}

/// 技術仕様を返す
pub fn technical_specs(record: &MaterialRecord) -> TechnicalSpecs {
    match family(&record.name) {
        Some(Family::Ring) => specs([
            "ГОСТ 8020-90",
            "железобетон",
            "B15-B25",
            "-40°C до +50°C",
            "до 0.1 МПа",
        ]),
        Some(Family::Pipe) => specs([
            "ГОСТ 18599-2001",
            "полиэтилен низкого давления",
            "SDR 17",
            "-20°C до +40°C",
            "1.0 МПа",
        ]),
        Some(Family::Hatch) => specs([
            "ГОСТ 3634-99",
            "чугун",
            "класс A15",
            "-40°C до +70°C",
            "нагрузка 1.5 т",
        ]),
        None => TechnicalSpecs::default(),
    }
}

pub fn price_range(record: &MaterialRecord) -> PriceRange {
    PriceRange {
        min_price: TO_CLARIFY.to_string(),
        max_price: TO_CLARIFY.to_string(),
        currency: CURRENCY.to_string(),
        unit: record.unit.clone(),
        last_updated: "требует актуализации".to_string(),
    }
}

/// 施工上の注意
pub fn installation_notes(record: &MaterialRecord) -> Vec<String> {
    let notes: &[&str] = match family(&record.name) {
        Some(Family::Ring) => &[
            "Установка с использованием крана",
            "Проверка герметичности стыков",
            "Обязательная гидроизоляция",
        ],
        Some(Family::Pipe) => &[
            "Соблюдение уклонов",
            "Проверка на герметичность",
            "Использование специальных фитингов",
        ],
        Some(Family::Hatch) => &[
            "Установка на уровне покрытия",
            "Обеспечение доступа для обслуживания",
            "Проверка несущей способности",
        ],
        None => &[],
    };
    notes.iter().map(|n| n.to_string()).collect()
}

/// 明細1件の仕様をまとめる
pub fn specify(record: &MaterialRecord) -> MaterialSpecification {
    MaterialSpecification {
        name: record.name.clone(),
        size: record.size.clone(),
        quantity: record.quantity,
        unit: record.unit.clone(),
        technical_specs: technical_specs(record),
        suppliers: SUPPLIERS.iter().map(|s| s.to_string()).collect(),
        price_range: price_range(record),
        installation_notes: installation_notes(record),
    }
}

pub fn specify_all(records: &[MaterialRecord]) -> Vec<MaterialSpecification> {
    records.iter().map(specify).collect()
}

/// 対応資材カタログ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialCatalogue {
    pub well_materials: Vec<String>,
    pub general_materials: Vec<String>,
    pub detection_keywords: Vec<String>,
    /// グループ名 → カテゴリキー
    pub well_groups: BTreeMap<String, Vec<String>>,
    pub general_groups: BTreeMap<String, Vec<String>>,
    /// 井戸タクソノミーのパターン総数
    pub total_patterns: usize,
}

fn owned_groups(groups: BTreeMap<&'static str, Vec<&'static str>>) -> BTreeMap<String, Vec<String>> {
    groups
        .into_iter()
        .map(|(group, keys)| (group.to_string(), keys.into_iter().map(String::from).collect()))
        .collect()
}

pub fn catalogue() -> MaterialCatalogue {
    let well = taxonomy(TaxonomyKind::Well);
    let general = taxonomy(TaxonomyKind::General);
    MaterialCatalogue {
        well_materials: well.keys().into_iter().map(String::from).collect(),
        general_materials: general.keys().into_iter().map(String::from).collect(),
        detection_keywords: SCHEME_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        well_groups: owned_groups(well.groups()),
        general_groups: owned_groups(general.groups()),
        total_patterns: well.total_patterns(),
    }
}
