use std::{borrow::Cow, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use domain_feed::{
    feed::{self, FeedDocument},
    sources::nist::{self, FeedSettings},
};
use dotenvy::dotenv;
use env_logger::Env;

use cvefeed::configuration::FromEnv;

fn main() -> Result<()> {
    let opts = Opts::parse();

    dotenv().ok();

    // Setup logger
    {
        #[cfg(debug_assertions)]
        let default_env_filter = "debug";
        #[cfg(not(debug_assertions))]
        let default_env_filter = "info";

        let env = Env::default().default_filter_or(default_env_filter);
        env_logger::Builder::from_env(env)
            .try_init()
            .context("Failed to setup logger")?;
    }

    let mut settings = FeedSettings::try_from_env().context("Invalid configuration")?;
    if let Some(output) = opts.output {
        settings.output = output;
    }

    match opts.cmd {
        Some(Commands::Show) => {
            let document = feed::read_feed(&settings.output)?;
            show(&document);
        }
        None => {
            log::info!("cvefeed {} updating {}", cvefeed::version(), settings.output.display());

            let document = nist::update(&settings)?;

            log::info!("{}", report_message(&document));
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(author, version = cvefeed::version(), about)]
#[command(disable_help_subcommand = true)]
struct Opts {
    /// Feed file path
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Prints the items of the current feed file
    #[command(name = "show")]
    Show,
}

fn show(document: &FeedDocument) {
    log::info!(
        "{} items from {} generated at {}",
        document.items.len(),
        document.source,
        document.generated_at
    );

    for item in &document.items {
        let badge = match item.cvss {
            Some(score) => format!("{} {:.1}", item.severity(), score),
            None => item.severity().to_string(),
        };
        log::info!("{} [{}] {} {}", item.id, badge, item.published, item.url);
    }
}

fn report_message(document: &FeedDocument) -> Cow<'static, str> {
    if document.items.is_empty() {
        Cow::Borrowed("No recent CVEs, feed is empty")
    } else {
        Cow::Owned(format!("{} CVEs written to feed", document.items.len()))
    }
}
