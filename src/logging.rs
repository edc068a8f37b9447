//! ロガー初期化
//!
//! `RUST_LOG` が設定ファイルのレベルより優先される

use tracing_subscriber::{fmt, EnvFilter};

/// グローバルsubscriberを登録（2回目以降は何もしない）
pub fn init(level: &str, json: bool) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}

/// 設定値と `--verbose` から実際のレベルを決める
pub fn effective_level(configured: &str, verbose: bool) -> &str {
    if verbose {
        "debug"
    } else {
        configured
    }
}
