use args::BuildArgs;
use clap::Parser;
use folio::{Folio, Paths};
use miette::Result;
use tracing::metadata::LevelFilter;
use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};

use crate::args::Args;

mod args;

#[tokio::main]
async fn main() -> Result<()> {
    let args: Args = Args::parse();
    init_tracing(args.verbose);

    match args.command {
        args::Command::Build(build_args) => build(build_args).await,
    }
}

async fn build(args: BuildArgs) -> Result<()> {
    let mut folio = Folio::load(Paths {
        site_dir: args.directory,
        config: args.config,
        output: args.output,
    })
    .await?;
    if args.drafts {
        folio.include_drafts();
    }
    let summary = folio.build().await?;
    eprintln!(
        "{} pages, {} listings, {} feeds, {} files written to {:?}",
        summary.pages,
        summary.listings,
        summary.feeds,
        summary.files,
        folio.context().dirs.output_dir
    );

    Ok(())
}

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    };
    let span_events = if default_level == LevelFilter::TRACE {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };
    let filter = EnvFilter::builder()
        .with_default_directive(default_level.into())
        .from_env_lossy();

    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_span_events(span_events)
        .compact()
        .init();
}
