use clap::Parser;
use std::path::{Path, PathBuf};
use well_bom::analyzer::{self, Collaborators, DetectionResponse, MaterialDetector, RecordedSignals};
use well_bom::batch::{self, BatchOptions};
use well_bom::{cli, config, engine, error, export, logging, scanner};
use cli::{Cli, Commands};
use config::Config;
use error::{FailureResponse, Result, WellBomError};

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if let Err(e) = run(cli) {
        tracing::error!(kind = e.kind(), "{}", e);
        let failure = FailureResponse::from(&e);
        match serde_json::to_string_pretty(&failure) {
            Ok(json) => println!("{}", json),
            Err(_) => eprintln!("{}", e),
        }
        std::process::exit(1);
    }
}

/// 出力先があればファイルへ、なければ標準出力へJSONを書く
fn emit<T: serde::Serialize>(value: &T, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            export::write_json(value, path)?;
            eprintln!("✔ 結果を保存: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

fn read_response(input: &Path) -> Result<DetectionResponse> {
    if !input.is_file() {
        return Err(WellBomError::FileNotFound(input.display().to_string()));
    }
    let content = std::fs::read_to_string(input)?;
    Ok(serde_json::from_str(&content)?)
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Detect { image, signals, base64, analysis, output } => {
            let scheme = if base64 {
                if !image.is_file() {
                    return Err(WellBomError::FileNotFound(image.display().to_string()));
                }
                scanner::SchemeImage::from_base64(&std::fs::read_to_string(&image)?)?
            } else {
                scanner::SchemeImage::from_path(&image)?
            };

            let image_path = if base64 { None } else { Some(image.as_path()) };
            let collaborators = Collaborators::resolve(&config, image_path, signals.as_deref())?;
            let detector = MaterialDetector::new(collaborators, config);
            let response = detector.detect(&scheme, analysis);

            eprintln!(
                "✔ {}件の資材を検出 (信頼度 {:.0}%)",
                response.materials.len(),
                response.overall_confidence * 100.0
            );
            emit(&response, output.as_deref())?;
        }

        Commands::Report { signals, analysis, output } => {
            let recorded = RecordedSignals::load(&signals)?;
            let response = analyzer::respond(recorded.signals(), 0, analysis);
            emit(&response, output.as_deref())?;
        }

        Commands::Batch { folder, output, use_cache, analysis } => {
            println!("🧱 well-bom - 一括処理\n");

            println!("[1/2] 図面をスキャン中...");
            let images = scanner::scan_folder(&folder)?;
            println!("✔ {}枚の図面を検出\n", images.len());

            if images.is_empty() {
                return Err(WellBomError::NoImagesFound(folder.display().to_string()));
            }

            println!("[2/2] 資材を検出中...{}", if use_cache { " (キャッシュ有効)" } else { "" });
            let options = BatchOptions {
                use_cache,
                with_analysis: analysis,
                show_progress: true,
            };
            let report = batch::run_batch(&images, &folder, &config, &options)?;
            println!("✔ 完了: 成功 {}件 / 失敗 {}件\n", report.succeeded, report.failed());

            let output = output.unwrap_or_else(|| folder.join("materials.json"));
            export::write_json(&report, &output)?;
            println!("✔ 結果を保存: {}", output.display());
        }

        Commands::Specs { input, output } => {
            let response = read_response(&input)?;
            let specifications = engine::specify_all(&response.materials);
            let payload = serde_json::json!({
                "success": true,
                "total_items": specifications.len(),
                "specifications": specifications,
            });
            emit(&payload, output.as_deref())?;
        }

        Commands::Materials => {
            emit(&engine::catalogue(), None)?;
        }

        Commands::Export { input, format, output, title } => {
            println!("📄 well-bom - エクスポート\n");

            let response = read_response(&input)?;
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            for path in export::export_response(&response, &format, &output_dir, &title)? {
                println!("✔ 出力: {}", path.display());
            }

            println!("\n✅ エクスポート完了");
        }

        Commands::Config { show, init } => {
            if init {
                config.save()?;
                println!("✔ 設定ファイルを作成しました: {}", Config::config_path()?.display());
            }

            if show || !init {
                println!("設定: {}", Config::config_path()?.display());
                println!("{}", serde_json::to_string_pretty(&config)?);
            }
        }

        Commands::Cache { clear, folder, info } => {
            let target = folder.unwrap_or_else(|| PathBuf::from("."));
            let cache_path = analyzer::CacheFile::cache_path(&target);

            if info || !clear {
                // デフォルトまたは--info: 情報表示
                if cache_path.exists() {
                    let cache = analyzer::CacheFile::load(&target);
                    println!("キャッシュ情報:");
                    println!("  パス: {}", cache_path.display());
                    println!("  件数: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  サイズ: {} bytes", meta.len());
                    }
                } else {
                    println!("キャッシュファイルが存在しません: {}", cache_path.display());
                }
            }

            if clear {
                match analyzer::CacheFile::clear(&target) {
                    Ok(true) => println!("✔ キャッシュを削除しました: {}", cache_path.display()),
                    Ok(false) => println!("キャッシュファイルが存在しません"),
                    Err(e) => println!("キャッシュ削除エラー: {}", e),
                }
            }
        }
    }

    Ok(())
}
