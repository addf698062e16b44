//! Network Speed Tester - Main CLI Application
//!
//! Measures latency, jitter, download and upload throughput against a
//! selectable test server.

use clap::Parser;
use network_speed_tester::{
    app::App,
    cli::Cli,
    error::{AppError, ErrorReporter, Result},
};
use std::process;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        eprintln!("Please report this issue together with the output of `nst --version-info`.");
        process::exit(AppError::internal("panic").exit_code());
    }));

    let cli = Cli::parse();
    let reporter = ErrorReporter::new(!cli.no_color && !cli.json, cli.verbose || cli.debug);

    if let Err(e) = run_application(cli).await {
        reporter.report_error(&e);
        print_error_suggestions(&e);
        process::exit(e.exit_code());
    }
}

async fn run_application(cli: Cli) -> Result<()> {
    App::new(cli)?.run().await
}

/// Print helpful suggestions for common errors
fn print_error_suggestions(error: &AppError) {
    match error {
        AppError::Config(_) | AppError::UnknownServer(_) => {
            eprintln!();
            eprintln!("Configuration help:");
            eprintln!("  - Run `nst --list-servers` to see valid server identifiers");
            eprintln!("  - Check your .env file (`nst --print-env-example` shows the format)");
            eprintln!("  - Timeouts and sizes must be positive numbers within their limits");
        }
        AppError::Network(_) | AppError::Download(_) | AppError::Upload(_) => {
            eprintln!();
            eprintln!("Network troubleshooting:");
            eprintln!("  - Check your internet connection");
            eprintln!("  - Try another server with --server");
            eprintln!("  - Verify firewall or proxy settings");
        }
        AppError::Timeout(_) => {
            eprintln!();
            eprintln!("Timeout help:");
            eprintln!("  - Increase --transfer-timeout for slow links");
            eprintln!("  - Use a smaller --upload-size");
        }
        _ => {}
    }
}
