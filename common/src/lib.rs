//! Well BOM Common Library
//!
//! 井戸・マンホール図面の資材抽出エンジン。
//! 外部モデルの出力（OCR・キャプション・分類・検出）を統合して資材明細を作る。
//! I/Oやモデル呼び出しは含まない。

pub mod analysis;
pub mod classifier;
pub mod context;
pub mod detection;
pub mod engine;
pub mod error;
pub mod extractor;
pub mod merge;
pub mod scoring;
pub mod specification;
pub mod taxonomy;
pub mod types;

pub use analysis::{analyze_well, WellAnalysis};
pub use classifier::{classify_scheme, rank_classifications};
pub use context::enhance_candidates;
pub use detection::detection_candidates;
pub use engine::{build_report, extract_materials, Extraction};
pub use error::{Error, Result};
pub use extractor::{extract_candidates, TextOrigin};
pub use merge::merge_candidates;
pub use scoring::{generate_recommendations, overall_confidence};
pub use specification::{catalogue, specify, specify_all, MaterialCatalogue, MaterialSpecification};
pub use taxonomy::{taxonomy, Taxonomy, TaxonomyKind};
pub use types::{
    BoundingBox, CaptionResult, Detection, LabelScore, MaterialCandidate, MaterialRecord,
    MaterialReport, Provenance, Recommendation, RecommendationKind, SchemeClassification,
    SchemeSignals,
};
