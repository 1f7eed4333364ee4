//! well-bom
//!
//! 井戸・マンホール図面から資材明細を作るツールのライブラリ部分。
//! 抽出エンジン本体は well_bom_common にある。

pub mod analyzer;
pub mod batch;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod logging;
pub mod preprocess;
pub mod scanner;

pub use well_bom_common as engine;
