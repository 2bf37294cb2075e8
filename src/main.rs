use anyhow::Context;
use clap::Parser;
use iconshot::{
    CaptureConfig, CaptureEntry, CaptureJob, DocumentRef, Error, FailurePolicy, JobReport, Settle,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Render an HTML document in headless Chrome and save PNG snapshots of it.
#[derive(Parser, Debug)]
#[command(name = "iconshot", version, about)]
struct Cli {
    /// HTML file or URL to render
    document: String,

    /// Snapshot to take, as WIDTHxHEIGHT=PATH (repeatable, taken in order).
    /// Defaults to a 512 and a 192 pixel icon in --out-dir.
    #[arg(short, long = "size", value_name = "WxH=PATH")]
    sizes: Vec<CaptureEntry>,

    /// Directory for the default icon pair
    #[arg(long, default_value = "public")]
    out_dir: PathBuf,

    /// File name prefix for the default icon pair
    #[arg(long, default_value = "icon")]
    prefix: String,

    /// Wait after the document loads, in milliseconds
    #[arg(long, default_value_t = 2000)]
    load_settle_ms: u64,

    /// Wait after each resize, in milliseconds
    #[arg(long, default_value_t = 1000)]
    resize_settle_ms: u64,

    /// Poll the page for a stable layout instead of sleeping; the settle
    /// values become upper bounds
    #[arg(long)]
    poll_settle: bool,

    /// Give up loading the document after this many milliseconds
    #[arg(long, default_value_t = 30000)]
    load_timeout_ms: u64,

    /// Stop at the first failed snapshot
    #[arg(long)]
    fail_fast: bool,

    /// Launch Chrome without its sandbox
    #[arg(long)]
    no_sandbox: bool,

    /// Chrome executable to use instead of the discovered one
    #[arg(long, value_name = "PATH")]
    chrome: Option<PathBuf>,

    /// Print the job report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn settle(&self, ms: u64) -> Settle {
        let d = Duration::from_millis(ms);
        if self.poll_settle {
            Settle::Poll {
                interval: Duration::from_millis(50),
                timeout: d,
            }
        } else {
            Settle::Fixed(d)
        }
    }

    fn config(&self) -> CaptureConfig {
        CaptureConfig {
            load_timeout_ms: self.load_timeout_ms,
            load_settle: self.settle(self.load_settle_ms),
            resize_settle: self.settle(self.resize_settle_ms),
            failure_policy: if self.fail_fast {
                FailurePolicy::FailFast
            } else {
                FailurePolicy::ContinueOnError
            },
            sandbox: !self.no_sandbox,
            chrome_path: self.chrome.clone(),
            ..Default::default()
        }
    }

    fn job(&self) -> iconshot::Result<CaptureJob> {
        if self.sizes.is_empty() {
            CaptureJob::icon_pair(&self.out_dir, &self.prefix)
        } else {
            CaptureJob::new(self.sizes.clone())
        }
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn report_json(report: &JobReport) -> serde_json::Value {
    let entries: Vec<_> = report
        .entries
        .iter()
        .map(|e| match &e.result {
            Ok(outcome) => serde_json::json!({
                "index": e.index,
                "status": "ok",
                "outcome": outcome,
            }),
            Err(err) => serde_json::json!({
                "index": e.index,
                "status": "failed",
                "resolution": e.resolution,
                "destination": e.destination,
                "error": err.to_string(),
            }),
        })
        .collect();
    serde_json::json!({
        "total": report.total,
        "succeeded": report.succeeded(),
        "skipped": report.skipped(),
        "entries": entries,
    })
}

fn run(cli: &Cli) -> anyhow::Result<JobReport> {
    let document = DocumentRef::parse(&cli.document).context("invalid document reference")?;
    let job = cli.job().context("invalid capture job")?;
    let capturer = iconshot::new_capturer(cli.config());
    let report = capturer.run_job(&document, &job)?;
    Ok(report)
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let report = match run(&cli) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("iconshot: {:#}", e);
            return match e.downcast_ref::<Error>() {
                Some(Error::RenderInitError(_)) | Some(Error::InvalidJob(_)) => ExitCode::from(2),
                _ => ExitCode::from(1),
            };
        }
    };

    if cli.json {
        println!("{}", report_json(&report));
    } else {
        for entry in &report.entries {
            println!("{}", entry);
        }
    }

    if report.is_success() {
        if !cli.json {
            println!("Screenshots saved successfully!");
        }
        ExitCode::SUCCESS
    } else {
        if report.skipped() > 0 {
            eprintln!("iconshot: {} snapshot(s) skipped after failure", report.skipped());
        }
        ExitCode::from(1)
    }
}
