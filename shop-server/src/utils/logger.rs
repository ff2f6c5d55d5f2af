//! Logging Infrastructure
//!
//! `RUST_LOG` wins when set; otherwise the crate and `tower_http` log at the
//! configured level. With a log directory, output goes to a daily rolling file.

use std::path::Path;
use tracing_subscriber::EnvFilter;

fn default_directives(level: &str) -> String {
    format!("shop_server={level},tower_http={level}")
}

/// Initialize the global subscriber
pub fn init_logger(log_level: &str, json: bool, log_dir: Option<&str>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(true);

    let file_appender = log_dir.and_then(|dir| {
        let path = Path::new(dir);
        if let Err(e) = std::fs::create_dir_all(path) {
            eprintln!("Failed to create log directory {dir}: {e}");
            return None;
        }
        Some(tracing_appender::rolling::daily(path, "shop-server"))
    });

    match (json, file_appender) {
        (true, Some(writer)) => builder.json().with_writer(writer).init(),
        (true, None) => builder.json().init(),
        (false, Some(writer)) => builder.with_ansi(false).with_writer(writer).init(),
        (false, None) => builder.init(),
    }
}
