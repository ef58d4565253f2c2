//! n4a - checks a published approval model once and posts when it moved.
//!
//! Meant for cron: every invocation does at most one fetch and one post,
//! then exits. Logs go to stderr; stdout carries only the report.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use need4approval::sources::{self, DEFAULT_SOURCE, SOURCE_NAMES};
use need4approval::{
    check_source, deliver, AccountConfig, MastodonNotifier, Notifier, Outcome, Settings,
    StdoutNotifier, UnknownSource,
};

#[derive(Debug, Parser)]
#[command(name = "n4a", version, about = "Post approval-model updates when the estimates move")]
struct Cli {
    /// Data source to check.
    #[arg(default_value = DEFAULT_SOURCE)]
    source: String,

    /// Print the report instead of posting it.
    #[arg(short = 'n', long)]
    print: bool,

    /// Post this text instead of checking the source.
    #[arg(short, long, value_name = "TEXT")]
    message: Option<String>,

    /// Storage directory for etags.json / last_update.json.
    #[arg(short, long, value_name = "DIR")]
    base: Option<PathBuf>,

    /// Account config with the instance url and token.
    #[arg(long, value_name = "PATH")]
    account: Option<PathBuf>,

    /// Days of history behind the trend line.
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    days: Option<i64>,

    /// List known sources and exit.
    #[arg(long)]
    list: bool,
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("need4approval=info,n4a=info,warn"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_target(false).with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    if cli.list {
        for name in SOURCE_NAMES {
            let src = sources::lookup(name)?;
            println!("{name}\t{}", src.link_url);
        }
        return Ok(());
    }

    // Resolve the source before touching any state.
    let source = sources::lookup(&cli.source)?;

    let mut settings = Settings::from_env();
    if let Some(dir) = cli.base {
        settings.base_dir = Some(dir);
    }
    if let Some(path) = cli.account {
        settings.account_path = path;
    }
    if let Some(days) = cli.days {
        settings.history_days = days;
    }

    let client = settings.http_client()?;

    let text = match cli.message {
        Some(text) => text,
        None => {
            let dir = settings.storage_dir(&source.name);
            match check_source(&client, &source, &dir, settings.history_days).await? {
                Outcome::Report(text) => text,
                Outcome::NotModified | Outcome::NoChange => return Ok(()),
            }
        }
    };

    let notifier: Box<dyn Notifier> = if cli.print {
        Box::new(StdoutNotifier)
    } else {
        let account = AccountConfig::load_from_file(&settings.account_path)?;
        Box::new(MastodonNotifier::new(account, client))
    };
    deliver(notifier.as_ref(), &text).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env in local/dev; no-op when absent.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if e.downcast_ref::<UnknownSource>().is_some() => {
            tracing::error!("{e}");
            ExitCode::from(2)
        }
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
