//! Main application orchestration and execution

use crate::{
    cli::Cli,
    client::NetworkClient,
    config::{display_config_summary, env::DEFAULT_ENV_FILE, load_config, EnvManager},
    engine::SpeedTestEngine,
    error::{AppError, Result},
    logging,
    models::{Config, ProgressEvent, TestResult},
    output::{OutputCoordinator, OutputFormatterFactory},
    registry::ServerRegistry,
    types::Phase,
};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{info, warn};

/// Build metadata shown by `--version-info`
pub fn version_info() -> String {
    format!(
        "{} v{}\nBuild time: {}\nGit commit: {}\nTarget: {}",
        crate::PKG_NAME,
        crate::VERSION,
        env!("BUILD_TIME"),
        env!("GIT_COMMIT"),
        env!("TARGET_TRIPLE"),
    )
}

/// Decides which progress events are worth a console line
///
/// Prints the first event of each phase, then one line per 10% step.
#[derive(Debug, Default)]
pub struct ProgressThrottle {
    phase: Option<Phase>,
    last_step: i64,
    indeterminate_shown: bool,
}

impl ProgressThrottle {
    pub fn should_print(&mut self, event: &ProgressEvent) -> bool {
        let step = (event.value / 10.0).floor() as i64;

        if self.phase != Some(event.phase) {
            self.phase = Some(event.phase);
            self.last_step = step;
            self.indeterminate_shown = event.indeterminate;
            return true;
        }

        if event.indeterminate {
            let first = !self.indeterminate_shown;
            self.indeterminate_shown = true;
            return first;
        }

        if step > self.last_step {
            self.last_step = step;
            return true;
        }
        false
    }
}

/// Main application struct that coordinates all components
pub struct App {
    cli: Cli,
}

impl App {
    /// Create a new application instance with CLI configuration
    pub fn new(cli: Cli) -> Result<Self> {
        cli.validate().map_err(AppError::validation)?;
        Ok(Self { cli })
    }

    /// Run the application
    pub async fn run(self) -> Result<()> {
        if self.cli.is_informational() {
            return self.run_informational();
        }

        let config = load_config(self.cli.clone())?;
        logging::init_logging(&config)?;
        let output = self.output_for(&config);

        for warning in settings_warnings(self.cli.env_file.as_deref()) {
            eprintln!("{}", output.display_warning(&warning)?);
        }
        if config.verbose && !config.json {
            println!("{}\n", display_config_summary(&config));
        }

        let client = Arc::new(NetworkClient::new()?);
        let engine = SpeedTestEngine::new(&config, client)?;
        run_tests(&engine, &config, &output).await
    }

    /// Flags that print something and exit without testing
    fn run_informational(&self) -> Result<()> {
        if self.cli.version_info {
            println!("{}", version_info());
            return Ok(());
        }
        if self.cli.print_env_example {
            print!("{}", EnvManager::create_example_env_content());
            return Ok(());
        }
        if let Some(path) = &self.cli.write_env_example {
            EnvManager::save_example_env_file(path)?;
            let output = OutputCoordinator::new(OutputFormatterFactory::create_formatter(self.cli.use_colors(), false));
            println!("{}", output.display_success(&format!("Wrote example settings to {}", path.display()))?);
            return Ok(());
        }

        // --list-servers honours DEFAULT_SERVER, so it needs the full config
        let config = load_config(self.cli.clone())?;
        let output = self.output_for(&config);
        let registry = ServerRegistry::builtin().with_default(&config.default_server)?;
        println!("{}", output.display_servers(&registry)?);
        Ok(())
    }

    /// Colour is used when the settings allow it and the terminal supports it
    fn output_for(&self, config: &Config) -> OutputCoordinator {
        let use_color = config.enable_color && self.cli.use_colors();
        if !use_color {
            colored::control::set_override(false);
        }
        OutputCoordinator::new(OutputFormatterFactory::create_formatter(use_color, config.verbose))
    }
}

/// Problems in the process environment and in the settings file
///
/// The file is `env_file` or `./.env`. Values that the environment or the
/// command line override are still reported.
pub fn settings_warnings(env_file: Option<&Path>) -> Vec<String> {
    let mut warnings = EnvManager::validate_current_env();

    let path = env_file.unwrap_or_else(|| Path::new(DEFAULT_ENV_FILE));
    if path.exists() {
        match EnvManager::check_env_file(path) {
            Ok(found) => warnings.extend(found),
            Err(e) => warnings.push(format!("Cannot check {}: {}", path.display(), e)),
        }
    }

    warnings
}

/// Run the configured number of tests and print results and history
pub async fn run_tests(engine: &SpeedTestEngine, config: &Config, output: &OutputCoordinator) -> Result<()> {
    let mut progress = engine.subscribe().progress;
    let mut results: Vec<TestResult> = Vec::new();

    for index in 1..=config.runs {
        info!(run = index, of = config.runs, server = %config.server, "starting run");
        let result = run_once(engine, config, output, &mut progress).await?;

        if !config.json {
            println!("{}\n", output.display_result(&result, index, config.runs)?);
        }
        results.push(result);
    }

    let history = engine.history().recent(config.history_display).await;
    if config.json {
        println!("{}", OutputCoordinator::json_report(&results, &history)?);
    } else {
        println!("{}", output.display_history(&history)?);
    }

    Ok(())
}

/// Drive one run, printing progress and cancelling on Ctrl-C
async fn run_once(
    engine: &SpeedTestEngine,
    config: &Config,
    output: &OutputCoordinator,
    progress: &mut broadcast::Receiver<ProgressEvent>,
) -> Result<TestResult> {
    run_until_interrupted(engine, config, output, progress, tokio::signal::ctrl_c()).await
}

/// Drive one run, cancelling it when `interrupt` resolves
///
/// `interrupt` is polled across the whole run, so a signal arriving while a
/// progress line is printed is still seen.
async fn run_until_interrupted<I>(
    engine: &SpeedTestEngine,
    config: &Config,
    output: &OutputCoordinator,
    progress: &mut broadcast::Receiver<ProgressEvent>,
    interrupt: I,
) -> Result<TestResult>
where
    I: Future<Output = std::io::Result<()>>,
{
    let mut throttle = ProgressThrottle::default();
    let mut print = |event: ProgressEvent| -> Result<()> {
        if !config.json && throttle.should_print(&event) {
            println!("{}", output.progress_line(&event)?);
        }
        Ok(())
    };

    let run = engine.start_run(&config.server);
    tokio::pin!(run);
    tokio::pin!(interrupt);
    let mut listening = true;

    let outcome = loop {
        tokio::select! {
            outcome = &mut run => break outcome,
            event = progress.recv() => match event {
                Ok(event) => print(event)?,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "progress display fell behind");
                }
                Err(broadcast::error::RecvError::Closed) => break (&mut run).await,
            },
            signal = &mut interrupt, if listening => {
                listening = false;
                match signal {
                    Ok(()) => {
                        warn!("interrupted, cancelling run");
                        engine.cancel();
                    }
                    Err(e) => warn!(error = %e, "cannot listen for Ctrl-C"),
                }
            }
        }
    };

    // Progress sent just before the run returned
    loop {
        match progress.try_recv() {
            Ok(event) => print(event)?,
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }

    outcome
}
