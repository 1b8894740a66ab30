use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::LevelFilter;

use bookrec::api::html;
use bookrec::common::log as logging;
use bookrec::data::domain::UserId;
use bookrec::{AppCfg, AppContext};

/// Render book recommendations from a ratings dataset and fitted models.
#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// key=value configuration file (defaults to $BOOKREC_CONFIG)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Write HTML here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    /// Raise log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the books with the highest average rating
    Top,
    /// Rank the books a user has not rated yet
    Recommend {
        /// Reader id
        #[arg(short, long)]
        user: u64,

        /// NormalPredictor, KNN, SVD or SVD++
        #[arg(short, long, default_value = "SVD")]
        method: String,

        /// Number of recommendations
        #[arg(short, long, default_value_t = 5)]
        n: usize,
    },
}

fn raise(level: LevelFilter, by: u8) -> LevelFilter {
    let mut level = level;
    for _ in 0..by {
        level = match level {
            LevelFilter::Off => LevelFilter::Error,
            LevelFilter::Error => LevelFilter::Warn,
            LevelFilter::Warn => LevelFilter::Info,
            LevelFilter::Info => LevelFilter::Debug,
            LevelFilter::Debug | LevelFilter::Trace => LevelFilter::Trace,
        };
    }
    level
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let cfg = match &cli.config {
        Some(path) => AppCfg::load_from(Some(path.as_path())),
        None => AppCfg::load(),
    }
    .context("loading configuration")?;
    logging::init(raise(cfg.log_level, cli.verbose));

    let ctx = AppContext::load(cfg).context("loading dataset and models")?;

    let page = match cli.command {
        Commands::Top => {
            let books = ctx.top_rated();
            let title = format!("Top {} Recommended Books", ctx.cfg().top_rated_limit);
            html::render_page(&title, &html::render_books(&books))
        }
        Commands::Recommend { user, method, n } => {
            let rec = ctx.recommend(&method, UserId(user), n)?;
            html::render_page(
                "Book Recommendation System",
                &html::render_recommendation(&rec),
            )
        }
    };

    match cli.output {
        Some(path) => fs::write(&path, page)
            .with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().lock().write_all(page.as_bytes())?,
    }
    Ok(())
}
