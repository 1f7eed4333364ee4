//! 資材タクソノミー
//!
//! 資材カテゴリごとの正規表現・キーワード・標準サイズ・単位を保持する。
//! 井戸（колодец）専用と汎用建設の2系統があり、スキーム判定で切り替える。
//! 起動時に一度だけコンパイルし、以後は読み取り専用で共有する。

use crate::error::Result;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// タクソノミーの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxonomyKind {
    /// 井戸・マンホール専用
    Well,
    /// 汎用建設資材
    General,
}

/// カテゴリ定義の静的データ
struct CategorySpec {
    key: &'static str,
    patterns: &'static [&'static str],
    keywords: &'static [&'static str],
    sizes: &'static [&'static str],
    unit: &'static str,
    group: &'static str,
}

/// キーワード1件と周辺サイズ推定用の正規表現
#[derive(Debug)]
pub struct KeywordRule {
    pub keyword: &'static str,
    /// 数値後置・数値前置・Ø記法・d記法の順
    ///
    /// Ø記法とd記法の数値はキーワードより前にあるため、常に数値前置が先に一致する。
    pub size_patterns: Vec<Regex>,
}

/// 資材カテゴリ定義
#[derive(Debug)]
pub struct MaterialCategoryDefinition {
    pub key: &'static str,
    pub patterns: Vec<Regex>,
    pub keywords: Vec<KeywordRule>,
    /// 先頭が既定サイズ
    pub sizes: &'static [&'static str],
    pub unit: &'static str,
    pub group: &'static str,
}

/// タクソノミー本体
#[derive(Debug)]
pub struct Taxonomy {
    pub kind: TaxonomyKind,
    pub definitions: Vec<MaterialCategoryDefinition>,
}

impl Taxonomy {
    fn compile(kind: TaxonomyKind, specs: &[CategorySpec]) -> Self {
        Self {
            kind,
            definitions: specs.iter().map(MaterialCategoryDefinition::compile).collect(),
        }
    }

    /// カテゴリキーで定義を検索
    pub fn definition(&self, key: &str) -> Option<&MaterialCategoryDefinition> {
        self.definitions.iter().find(|d| d.key == key)
    }

    /// カテゴリの既定サイズ
    pub fn default_size(&self, key: &str) -> Option<&'static str> {
        self.definition(key).and_then(|d| d.sizes.first().copied())
    }

    pub fn keys(&self) -> Vec<&'static str> {
        self.definitions.iter().map(|d| d.key).collect()
    }

    /// グループ名ごとのカテゴリキー（定義順）
    pub fn groups(&self) -> BTreeMap<&'static str, Vec<&'static str>> {
        let mut groups: BTreeMap<&'static str, Vec<&'static str>> = BTreeMap::new();
        for definition in &self.definitions {
            groups.entry(definition.group).or_default().push(definition.key);
        }
        groups
    }

    pub fn total_patterns(&self) -> usize {
        self.definitions.iter().map(|d| d.patterns.len()).sum()
    }
}

impl MaterialCategoryDefinition {
    fn compile(spec: &CategorySpec) -> Self {
        let patterns = spec
            .patterns
            .iter()
            .filter_map(|p| match compile_pattern(p) {
                Ok(re) => Some(re),
                Err(e) => {
                    tracing::warn!(category = spec.key, pattern = *p, "パターンをスキップ: {}", e);
                    None
                }
            })
            .collect();

        let keywords = spec.keywords.iter().map(|k| KeywordRule::compile(k)).collect();

        Self {
            key: spec.key,
            patterns,
            keywords,
            sizes: spec.sizes,
            unit: spec.unit,
            group: spec.group,
        }
    }
}

impl KeywordRule {
    fn compile(keyword: &'static str) -> Self {
        let kw = regex::escape(keyword);
        let size_patterns = [
            format!(r"(?:{}).*?(\d+)(?:[-.](\d+))?(?:\s*мм)?", kw),
            format!(r"(\d+)(?:[-.](\d+))?\s*.*?{}", kw),
            format!(r"ø\s*(\d+).*?{}", kw),
            format!(r"d\s*(\d+).*?{}", kw),
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect();

        Self { keyword, size_patterns }
    }
}

/// 大文字小文字を区別しない正規表現をコンパイル
pub fn compile_pattern(pattern: &str) -> Result<Regex> {
    Ok(RegexBuilder::new(pattern).case_insensitive(true).build()?)
}

const WELL_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        key: "concrete_rings",
        patterns: &[
            r"кольцо\s*(?:кс|жби|бетонное)?[-\s]*(\d+)[-.]?(\d+)?",
            r"кс[-]?(\d+)[-.]?(\d+)?",
            r"жби\s*кольцо\s*(\d+)[-.]?(\d+)?",
            r"бетонное\s*кольцо\s*(\d+)x(\d+)",
            r"ring\s*(\d+)[-.]?(\d+)?",
            r"concrete\s*ring\s*(\d+)[-.]?(\d+)?",
        ],
        keywords: &["кольцо", "кс", "жби", "бетонное кольцо", "ring", "concrete ring"],
        sizes: &["10-9", "15-9", "20-9", "10-6", "15-6", "20-6"],
        unit: "дона",
        group: "concrete_elements",
    },
    CategorySpec {
        key: "concrete_covers",
        patterns: &[
            r"крышка\s*(?:кс|жби|бетонная)?\s*(\d+)",
            r"плита\s*(?:перекрытия|крышка)?\s*(\d+)",
            r"пкс[-]?(\d+)",
            r"cover\s*(\d+)",
            r"lid\s*(\d+)",
        ],
        keywords: &["крышка", "плита перекрытия", "пкс", "cover", "lid"],
        sizes: &["10", "15", "20"],
        unit: "дона",
        group: "concrete_elements",
    },
    CategorySpec {
        key: "bottom_plates",
        patterns: &[
            r"плита\s*(?:днища|дна|опорная)?\s*(\d+)",
            r"пд[-]?(\d+)",
            r"опорная\s*плита\s*(\d+)",
            r"bottom\s*plate\s*(\d+)",
        ],
        keywords: &["плита днища", "пд", "опорная плита", "bottom plate"],
        sizes: &["10", "15", "20"],
        unit: "дона",
        group: "concrete_elements",
    },
    CategorySpec {
        key: "pipes",
        patterns: &[
            r"труба\s*(?:пнд|пэ|стальная|металлическая|водопроводная)?\s*(?:ø|d|диаметр)?\s*(\d+)(?:\s*мм)?",
            r"водопроводная\s*труба\s*(?:ø|d)?\s*(\d+)",
            r"трубопровод\s*(?:ø|d)?\s*(\d+)",
            r"pipe\s*(?:ø|d)?\s*(\d+)",
            r"quvur\s*(?:ø|d)?\s*(\d+)",
        ],
        keywords: &["труба", "водопроводная труба", "трубопровод", "pipe", "quvur"],
        sizes: &["110", "50", "63", "75", "90", "125", "160", "200"],
        unit: "метр",
        group: "pipes",
    },
    CategorySpec {
        key: "fittings",
        patterns: &[
            r"муфта\s*(?:соединительная|пнд)?\s*(?:ø|d)?\s*(\d+)",
            r"тройник\s*(?:пнд|водопроводный)?\s*(?:ø|d)?\s*(\d+)(?:x(\d+))?",
            r"отвод\s*(?:90°|45°)?\s*(?:ø|d)?\s*(\d+)",
            r"переход\s*(?:ø|d)?\s*(\d+)x(\d+)",
            r"заглушка\s*(?:ø|d)?\s*(\d+)",
        ],
        keywords: &["муфта", "тройник", "отвод", "переход", "заглушка"],
        sizes: &["50", "63", "75", "90", "110", "125"],
        unit: "дона",
        group: "fittings",
    },
    CategorySpec {
        key: "valves",
        patterns: &[
            r"задвижка\s*(?:водопроводная|чугунная)?\s*(?:ø|d)?\s*(\d+)",
            r"вентиль\s*(?:водопроводный|запорный)?\s*(?:ø|d)?\s*(\d+)",
            r"кран\s*(?:шаровой|запорный|водопроводный)?\s*(?:ø|d)?\s*(\d+)",
            r"клапан\s*(?:обратный|запорный)?\s*(?:ø|d)?\s*(\d+)",
        ],
        keywords: &["задвижка", "вентиль", "кран", "клапан"],
        sizes: &["50", "63", "75", "80", "100", "125"],
        unit: "дона",
        group: "valves",
    },
    CategorySpec {
        key: "manholes",
        patterns: &[
            r"люк\s*(?:чугунный|стальной|канализационный)?\s*(\d+)",
            r"лаз\s*(?:люк)?\s*(\d+)",
            r"крышка\s*люка\s*(\d+)",
            r"manhole\s*(\d+)",
        ],
        keywords: &["люк", "лаз", "крышка люка", "manhole"],
        sizes: &["600", "700", "800"],
        unit: "дона",
        group: "manholes",
    },
    CategorySpec {
        key: "sealing",
        patterns: &[
            r"уплотнитель\s*(?:резиновый)?\s*(\d+)",
            r"прокладка\s*(?:резиновая)?\s*(\d+)",
            r"герметик\s*(?:битумный|полимерный)?",
            r"мастика\s*(?:битумная|гидроизоляционная)?",
        ],
        keywords: &["уплотнитель", "прокладка", "герметик", "мастика"],
        sizes: &["стандарт"],
        unit: "комплект",
        group: "sealing",
    },
];

const GENERAL_CATEGORIES: &[CategorySpec] = &[
    CategorySpec {
        key: "cement",
        patterns: &[
            r"цемент\s*(?:пц|м)?\s*(\d+)",
            r"cement\s*(?:m)?\s*(\d+)",
        ],
        keywords: &["цемент", "cement"],
        sizes: &["400", "500"],
        unit: "мешок",
        group: "binders",
    },
    CategorySpec {
        key: "concrete_mix",
        patterns: &[
            r"бетон\s*(?:м|в)?\s*(\d+)",
            r"concrete\s*(?:m|b)?\s*(\d+)",
        ],
        keywords: &["бетон", "concrete"],
        sizes: &["200", "300"],
        unit: "м³",
        group: "concrete",
    },
    CategorySpec {
        key: "rebar",
        patterns: &[
            r"арматура\s*(?:а-?\d{1,3})?\s*(?:ø|d)?\s*(\d+)",
            r"rebar\s*(?:ø|d)?\s*(\d+)",
        ],
        keywords: &["арматура", "rebar"],
        sizes: &["12", "8", "10", "14", "16"],
        unit: "тонна",
        group: "metal",
    },
    CategorySpec {
        key: "bricks",
        patterns: &[
            r"кирпич\s*(?:керамический|силикатный)?\s*(?:м)?(\d+)?",
            r"brick\s*(?:m)?(\d+)?",
        ],
        keywords: &["кирпич", "brick"],
        sizes: &["150", "100", "200"],
        unit: "дона",
        group: "masonry",
    },
    CategorySpec {
        key: "sand",
        patterns: &[
            r"песок\s*(?:речной|карьерный|строительный)?",
            r"sand",
        ],
        keywords: &["песок", "sand"],
        sizes: &["средний", "мелкий", "крупный"],
        unit: "м³",
        group: "aggregates",
    },
    CategorySpec {
        key: "crushed_stone",
        patterns: &[
            r"щебень\s*(?:фр\.?|фракции)?\s*(\d+)[-.](\d+)",
            r"gravel\s*(\d+)[-.](\d+)",
        ],
        keywords: &["щебень", "gravel"],
        sizes: &["20-40", "5-20", "40-70"],
        unit: "м³",
        group: "aggregates",
    },
    CategorySpec {
        key: "pipes",
        patterns: &[
            r"труба\s*(?:ø|d|диаметр)?\s*(\d+)(?:\s*мм)?",
            r"pipe\s*(?:ø|d)?\s*(\d+)",
        ],
        keywords: &["труба", "pipe"],
        sizes: &["110", "50", "160"],
        unit: "метр",
        group: "pipes",
    },
    CategorySpec {
        key: "insulation",
        patterns: &[
            r"гидроизоляция\s*(?:битумная|рулонная)?",
            r"утеплитель\s*(\d+)?",
            r"insulation\s*(\d+)?",
        ],
        keywords: &["гидроизоляция", "утеплитель", "insulation"],
        sizes: &["50", "100"],
        unit: "м²",
        group: "insulation",
    },
    CategorySpec {
        key: "timber",
        patterns: &[
            r"брус\s*(\d+)[xх×](\d+)",
            r"доска\s*(\d+)[xх×](\d+)",
            r"timber\s*(\d+)x(\d+)",
        ],
        keywords: &["брус", "доска", "timber"],
        sizes: &["100-100", "50-150"],
        unit: "м³",
        group: "timber",
    },
];

lazy_static::lazy_static! {
    static ref WELL_TAXONOMY: Taxonomy = Taxonomy::compile(TaxonomyKind::Well, WELL_CATEGORIES);
    static ref GENERAL_TAXONOMY: Taxonomy = Taxonomy::compile(TaxonomyKind::General, GENERAL_CATEGORIES);
}

/// タクソノミーを取得
pub fn taxonomy(kind: TaxonomyKind) -> &'static Taxonomy {
    match kind {
        TaxonomyKind::Well => &*WELL_TAXONOMY,
        TaxonomyKind::General => &*GENERAL_TAXONOMY,
    }
}

/// 井戸スキーム判定キーワード（露・英・ウズベク）
pub const SCHEME_KEYWORDS: &[&str] = &[
    "колодец", "скважина", "водопровод", "канализация", "дренаж",
    "well", "water", "sewage", "drainage", "manhole",
    "quduq", "suv", "kanalizatsiya", "drenaj",
];

/// 井戸スキームを示す分類ラベル
pub const WELL_LABELS: &[&str] = &[
    "water well",
    "sewage system",
    "plumbing diagram",
    "water supply system",
    "drainage system",
];

/// 分類ラベルの確率閾値
pub const WELL_LABEL_THRESHOLD: f64 = 0.3;

/// ゼロショット分類器に渡すラベル語彙
pub const CLASSIFIER_LABELS: &[&str] = &[
    "concrete ring", "concrete cylinder", "water well", "sewage system",
    "pipe", "tube", "fitting", "valve", "manhole cover", "bottom plate",
    "technical drawing", "construction scheme", "plumbing diagram",
    "water supply system", "drainage system",
];

/// 分類結果の上位件数
pub const CLASSIFIER_TOP_K: usize = 5;

/// キャプションモデルへの固定質問
pub const CAPTION_QUESTIONS: &[&str] = &[
    "What construction materials are visible in this technical drawing?",
    "What pipes or tubes can you see in this scheme?",
    "Are there any concrete rings or cylinders?",
    "What metal objects or fittings are present?",
    "Is this a water well or sewage system diagram?",
    "What circular or cylindrical objects are shown?",
    "Are there any valves or connection points?",
    "What measurements or dimensions are visible?",
    "Are there any covers or lids shown?",
    "What type of construction scheme is this?",
];

/// 井戸資材の事前分布（標準サイズはタクソノミーの先頭サイズ）
#[derive(Debug, Clone, Copy)]
pub struct DomainPrior {
    pub keyword: &'static str,
    pub category_key: &'static str,
    pub typical_quantity: u32,
}

pub const DOMAIN_PRIORS: &[DomainPrior] = &[
    DomainPrior { keyword: "кольцо", category_key: "concrete_rings", typical_quantity: 5 },
    DomainPrior { keyword: "крышка", category_key: "concrete_covers", typical_quantity: 1 },
    DomainPrior { keyword: "плита", category_key: "bottom_plates", typical_quantity: 1 },
    DomainPrior { keyword: "труба", category_key: "pipes", typical_quantity: 10 },
    DomainPrior { keyword: "люк", category_key: "manholes", typical_quantity: 1 },
];

/// 用途の種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsageKind {
    Water,
    Sewage,
    Drainage,
}

/// 用途キーワード群と付与するメモ
#[derive(Debug, Clone, Copy)]
pub struct UsageContext {
    pub kind: UsageKind,
    pub keywords: &'static [&'static str],
    pub note: &'static str,
}

pub const USAGE_CONTEXTS: &[UsageContext] = &[
    UsageContext {
        kind: UsageKind::Water,
        keywords: &["водопровод", "water"],
        note: "Для водопроводной системы",
    },
    UsageContext {
        kind: UsageKind::Sewage,
        keywords: &["канализация", "sewage"],
        note: "Для канализационной системы",
    },
    UsageContext {
        kind: UsageKind::Drainage,
        keywords: &["дренаж", "drainage"],
        note: "Для дренажной системы",
    },
];

/// 井戸の必須資材ファミリー（リング・蓋・ハッチ・管）
pub const ESSENTIAL_FAMILIES: &[&str] = &["кольцо", "крышка", "люк", "труба"];

/// 完成度評価の必須カテゴリ
pub const ESSENTIAL_CATEGORIES: &[&str] = &[
    "concrete_rings",
    "concrete_covers",
    "bottom_plates",
    "pipes",
    "manholes",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_patterns_compile() {
        let well = taxonomy(TaxonomyKind::Well);
        let expected: usize = WELL_CATEGORIES.iter().map(|c| c.patterns.len()).sum();
        assert_eq!(well.total_patterns(), expected);

        let general = taxonomy(TaxonomyKind::General);
        let expected: usize = GENERAL_CATEGORIES.iter().map(|c| c.patterns.len()).sum();
        assert_eq!(general.total_patterns(), expected);
    }

    #[test]
    fn test_keyword_rules_have_four_strategies() {
        for kind in [TaxonomyKind::Well, TaxonomyKind::General] {
            for def in &taxonomy(kind).definitions {
                for rule in &def.keywords {
                    assert_eq!(rule.size_patterns.len(), 4, "{}", rule.keyword);
                }
            }
        }
    }

    #[test]
    fn test_well_keys_in_order() {
        let keys = taxonomy(TaxonomyKind::Well).keys();
        assert_eq!(keys.first(), Some(&"concrete_rings"));
        assert_eq!(keys.len(), 8);
        assert!(keys.contains(&"manholes"));
    }

    #[test]
    fn test_default_size_is_first() {
        let well = taxonomy(TaxonomyKind::Well);
        assert_eq!(well.default_size("concrete_rings"), Some("10-9"));
        assert_eq!(well.default_size("pipes"), Some("110"));
        assert_eq!(well.default_size("unknown"), None);
    }

    #[test]
    fn test_priors_resolve_in_well_taxonomy() {
        let well = taxonomy(TaxonomyKind::Well);
        for prior in DOMAIN_PRIORS {
            assert!(well.default_size(prior.category_key).is_some(), "{}", prior.keyword);
        }
    }

    #[test]
    fn test_compile_pattern_is_case_insensitive() {
        let re = compile_pattern(r"кольцо\s*(\d+)").unwrap();
        assert!(re.is_match("КОЛЬЦО 20"));
    }

    #[test]
    fn test_groups_follow_definitions() {
        let groups = taxonomy(TaxonomyKind::Well).groups();
        assert_eq!(
            groups.get("concrete_elements"),
            Some(&vec!["concrete_rings", "concrete_covers", "bottom_plates"])
        );
        assert_eq!(groups.get("manholes"), Some(&vec!["manholes"]));

        let general = taxonomy(TaxonomyKind::General).groups();
        assert_eq!(general.get("aggregates").map(Vec::len), Some(2));
    }

    #[test]
    fn test_compile_pattern_error() {
        assert!(matches!(
            compile_pattern(r"(\d+"),
            Err(crate::error::Error::Pattern(_))
        ));
    }
}
