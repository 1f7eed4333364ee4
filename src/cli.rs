use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "well-bom")]
#[command(about = "井戸・マンホール図面の資材抽出・数量表生成ツール", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 図面画像1枚から資材を検出
    Detect {
        /// 画像ファイル（--base64 指定時は base64 テキストファイル）
        #[arg(required = true)]
        image: PathBuf,

        /// 記録済み信号ファイル（省略時は画像の隣の *.signals.json を探す）
        #[arg(long)]
        signals: Option<PathBuf>,

        /// 入力を base64 テキストとして読む
        #[arg(long)]
        base64: bool,

        /// 井戸スキームの追加分析を含める
        #[arg(long)]
        analysis: bool,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 記録済み信号ファイルから資材明細を作成（画像不要）
    Report {
        /// 信号JSONファイル
        #[arg(required = true)]
        signals: PathBuf,

        /// 井戸スキームの追加分析を含める
        #[arg(long)]
        analysis: bool,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// フォルダ内の図面を一括処理
    Batch {
        /// 画像フォルダのパス
        #[arg(required = true)]
        folder: PathBuf,

        /// 出力JSONファイル（デフォルト: 入力フォルダ/materials.json）
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// キャッシュを使用（再推論をスキップ）
        #[arg(long)]
        use_cache: bool,

        /// 井戸スキームの追加分析を含める
        #[arg(long)]
        analysis: bool,
    },

    /// 検出結果から資材仕様を作成
    Specs {
        /// 検出結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力JSONファイル（省略時は標準出力）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 対応資材の一覧を表示
    Materials,

    /// 検出結果をJSON/Excelで出力
    Export {
        /// 検出結果JSONファイル
        #[arg(required = true)]
        input: PathBuf,

        /// 出力形式 (json/excel/both)
        #[arg(short, long, default_value = "both")]
        format: ExportFormat,

        /// 出力ファイル/ディレクトリ
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// ドキュメントタイトル
        #[arg(short, long, default_value = "Ведомость материалов")]
        title: String,
    },

    /// 設定を表示/初期化
    Config {
        /// 設定を表示
        #[arg(long)]
        show: bool,

        /// 既定値で設定ファイルを作成
        #[arg(long)]
        init: bool,
    },

    /// キャッシュ管理
    Cache {
        /// キャッシュを削除
        #[arg(long)]
        clear: bool,

        /// 対象フォルダ（省略時はカレント）
        #[arg(short, long)]
        folder: Option<PathBuf>,

        /// キャッシュ情報を表示
        #[arg(long)]
        info: bool,
    },
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Excel,
    #[default]
    Both,
}

impl std::str::FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "excel" | "xlsx" => Ok(ExportFormat::Excel),
            "both" => Ok(ExportFormat::Both),
            _ => Err(format!("Unknown format: {}. Use json, excel, or both", s)),
        }
    }
}
