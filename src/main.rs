use anyhow::{bail, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use shelf_insight::analyzer::{Dispatcher, OpenRouterClient};
use shelf_insight::cli::{Cli, Commands};
use shelf_insight::config::Config;
use shelf_insight::error::ShelfInsightError;
use shelf_insight::{export, logging, render, report, scanner, server};
use shelf_insight_common::{AnalysisMode, AnalysisResult, AnalysisSession, MODELS};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;

    logging::init(
        logging::effective_level(&config.log_level, cli.verbose),
        cli.json_logs,
    );

    match cli.command {
        Commands::Serve { bind, port } => {
            if let Some(bind) = bind {
                config.bind_address = bind;
            }
            if let Some(port) = port {
                config.port = port;
            }

            let addr: SocketAddr = format!("{}:{}", config.bind_address, config.port)
                .parse()
                .context("invalid bind address")?;

            if config.api_key().is_err() {
                warn!("OpenRouter API key is not set; /analyze will answer with a configuration error");
            }
            info!(addr = %addr, model = %config.model, "Starting shelf-insight server");

            let provider = OpenRouterClient::new(&config)?;
            let dispatcher = Arc::new(Dispatcher::new(config, provider));
            server::start_server(addr, dispatcher).await?;
        }

        Commands::Analyze { paths, mode, model, output, annotate, export: workbook } => {
            println!("shelf-insight - {}\n", mode.label());

            // 1. スキャンとエンコード
            println!("[1/3] Preparing images...");
            let images = scanner::collect_images(&paths)?;
            if images.is_empty() {
                return Err(ShelfInsightError::NoImagesFound(display_paths(&paths)).into());
            }
            let spinner = start_spinner(format!("Encoding {} image(s)", images.len()));
            let encoded =
                scanner::encode_images(&images, config.max_image_dimension, config.jpeg_quality);
            spinner.finish_and_clear();
            let encoded = encoded?;
            println!("✔ {} image(s) ready\n", encoded.len());

            // 2. 解析
            let mut session = AnalysisSession::new();
            session.begin(mode, encoded)?;

            println!("[2/3] Analyzing...");
            let provider = OpenRouterClient::new(&config)?;
            let dispatcher = Dispatcher::new(config, provider);
            let model_id = dispatcher.resolve_model(model.as_deref()).to_string();

            println!("- Model: {}", report::model_label(&model_id));
            let spinner = start_spinner(format!("Waiting for {}", model_id));
            let outcome = dispatcher
                .dispatch(session.images(), mode.as_str(), Some(&model_id))
                .await;
            spinner.finish_and_clear();

            let outcome = match outcome.and_then(|o| o.result().map(|r| (o, r))) {
                Ok(pair) => pair,
                Err(err) => {
                    session.fail(err.to_string())?;
                    return Err(err.into());
                }
            };
            let (outcome, result) = outcome;
            session.succeed(result)?;
            println!("✔ Analysis complete\n");

            let result = match session.result() {
                Some(result) => result,
                None => bail!("analysis finished without a result"),
            };
            println!("{}", report::render_report(result));

            // 3. 出力
            println!("[3/3] Saving...");
            if let Some(path) = output {
                let json = serde_json::to_string_pretty(&outcome.document)?;
                std::fs::write(&path, json)?;
                println!("✔ Result saved: {}", path.display());
            }

            if let Some(dir) = annotate {
                match result.as_shelf() {
                    Some(shelf) => {
                        print!("{}", report::box_listing(&shelf.products));
                        for image in &images {
                            let target = dir.join(annotated_name(&image.path));
                            let drawn = render::annotate_file(
                                &image.path.to_string_lossy(),
                                &shelf.products,
                                &target,
                            )?;
                            println!("✔ {} box(es): {}", drawn, target.display());
                        }
                    }
                    None => println!("- Annotation skipped (shelf mode only)"),
                }
            }

            if let Some(target) = workbook {
                let path = export::export_excel(result, &target)?;
                println!("✔ Excel saved: {}", path.display());
            }

            // エンコード済み画像を手放す
            session.reset()?;
            println!("\nDone");
        }

        Commands::Export { input, mode, output } => {
            let result = load_result(&input, mode)?;
            let target = output.unwrap_or_else(|| parent_dir(&input));

            println!("- Generating Excel...");
            let path = export::export_excel(&result, &target)?;
            println!("✔ Excel saved: {}", path.display());
        }

        Commands::Annotate { image, result, output } => {
            let result = load_result(&result, AnalysisMode::Shelf)?;
            let products = result
                .as_shelf()
                .map(|shelf| shelf.products.as_slice())
                .unwrap_or_default();

            print!("{}", report::box_listing(products));
            let target = output.unwrap_or_else(|| parent_dir(&image).join(annotated_name(&image)));
            let drawn = render::annotate_file(&image.to_string_lossy(), products, &target)?;
            println!("✔ {} box(es): {}", drawn, target.display());
        }

        Commands::Models => {
            for model in MODELS {
                let marker = if model.id == config.model { "*" } else { " " };
                println!("{} {:<36} {}", marker, model.id, model.name);
            }
        }

        Commands::Config { set_api_key, show } => {
            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }

            if show {
                println!("Config file: {}", Config::config_path()?.display());
                println!(
                    "API key: {}",
                    if config.api_key().is_ok() { "set" } else { "not set" }
                );
                println!("Model: {}", config.model);
                println!("Base URL: {}", config.base_url);
                println!("Site: {} ({})", config.site_name, config.site_url);
                println!("Server: {}:{}", config.bind_address, config.port);
                println!("Timeout: {}s", config.timeout_seconds);
                println!(
                    "Images: max {}px, JPEG quality {}",
                    config.max_image_dimension, config.jpeg_quality
                );
            }
        }
    }

    Ok(())
}

fn start_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg} ({elapsed})") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn load_result(path: &Path, mode: AnalysisMode) -> Result<AnalysisResult> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)?;
    Ok(AnalysisResult::from_value(mode, &value)?)
}

fn annotated_name(image: &Path) -> String {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "image".into());
    format!("{}_annotated.png", stem)
}

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn display_paths(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
