use std::path::PathBuf;
use std::process::ExitCode;

use app_update_checker::config::{CheckerConfig, LogFormat, log_path};
use app_update_checker::error::RunError;
use app_update_checker::{logging, run};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(name = "app-update-checker")]
#[command(version, about = "Check download pages for new app versions")]
struct Cli {
    /// JSON config file; built-in defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// File listing the pages to check, one URL per line
    #[arg(long)]
    urls: Option<PathBuf>,

    /// Tracker file with the last recorded version per app and variant
    #[arg(long)]
    tracker: Option<PathBuf>,

    /// Where to write the JSON update report
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// File to append `updates_count=N` to (defaults to $GITHUB_OUTPUT)
    #[arg(long)]
    ci_output: Option<PathBuf>,

    /// Record discovered versions in the tracker after the run
    #[arg(long)]
    update_tracker: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,

    /// Also write logs to a file (defaults to the data directory)
    #[arg(long, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Command-line flags win over the config file
    fn apply(self, config: &mut CheckerConfig) {
        let files = &mut config.files;
        if let Some(urls) = self.urls {
            files.url_list = urls;
        }
        if let Some(tracker) = self.tracker {
            files.tracker = tracker;
        }
        if let Some(output) = self.output {
            files.output = output;
        }
        if self.ci_output.is_some() {
            files.ci_output = self.ci_output;
        }
        files.update_tracker |= self.update_tracker;

        if let Some(timeout) = self.timeout {
            config.http.timeout_secs = timeout;
        }
        if let Some(format) = self.log_format {
            config.logging.format = format;
        }
        if let Some(file) = self.log_file {
            config.logging.file = Some(file.unwrap_or_else(log_path));
        }
    }
}

fn exit_code(error: &RunError) -> ExitCode {
    if error.is_configuration() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let mut config = match CheckerConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return exit_code(&RunError::from(e));
        }
    };
    cli.apply(&mut config);

    let _guard = match logging::init(&config.logging, level) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("Error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!(error = %e, "Failed to start async runtime");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run::execute(&config)) {
        Ok(summary) => {
            info!(
                targets = summary.targets,
                updates = summary.updates,
                report = %summary.report_path.display(),
                tracker_updated = summary.tracker_updated,
                "Check complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Check failed");
            exit_code(&e)
        }
    }
}
