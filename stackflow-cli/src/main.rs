mod cli;
mod commands;

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use stackflow::cancellation::CancellationToken;
use stackflow::errors::StackflowError;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let json_logs = cli.json_logs;
    init_logging(cli.verbose, json_logs);

    let cancel = Arc::new(CancellationToken::new());
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel("interrupted");
            }
        });
    }

    match commands::run(cli, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", render_error(&err, json_logs));
            ExitCode::FAILURE
        }
    }
}

/// Formats a failure for stderr; engine errors become a JSON object under `--json-logs`.
fn render_error(err: &anyhow::Error, json: bool) -> String {
    if json {
        if let Some(engine) = err.downcast_ref::<StackflowError>() {
            let mut dict = engine.to_dict();
            dict.insert("message".to_string(), serde_json::json!(format!("{err:#}")));
            if let Ok(line) = serde_json::to_string(&dict) {
                return line;
            }
        }
    }
    format!("Error: {err:#}")
}

fn init_logging(verbose: u8, json: bool) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,stackflow={level},stackflow_cli={level}")));

    if json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_renders_as_json() {
        let err = anyhow::Error::from(StackflowError::stack_not_found("ghost"));
        let line = render_error(&err, true);
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["type"], "StackNotFound");
        assert_eq!(value["stack"], "ghost");
        assert_eq!(value["message"], "Additional stack not found: ghost");
    }

    #[test]
    fn test_plain_rendering_without_json_logs() {
        let err = anyhow::Error::from(StackflowError::stack_not_found("ghost"));
        assert_eq!(render_error(&err, false), "Error: Additional stack not found: ghost");

        let other = anyhow::anyhow!("bad flag");
        assert_eq!(render_error(&other, true), "Error: bad flag");
    }
}
