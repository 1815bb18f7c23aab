//! rboard - Review Board code review from the terminal
//!
//! Stand-in for an editor integration: every subcommand runs one session
//! query or command and prints the resulting lines.

mod logger;
mod prompt;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use rb_client::FileKey;
use rb_config::AppConfig;
use rb_diff::DiffSide;
use rboard::{BodyField, Session};
use std::sync::Arc;

use crate::prompt::TerminalPrompt;

#[derive(Parser)]
#[command(name = "rboard")]
#[command(about = "Review Board code review from the terminal")]
#[command(version)]
struct Cli {
    /// Review Board server (overrides config and RBOARD_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Side {
    Src,
    Dst,
}

impl From<Side> for DiffSide {
    fn from(side: Side) -> Self {
        match side {
            Side::Src => DiffSide::Source,
            Side::Dst => DiffSide::Dest,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Body {
    Top,
    Bottom,
}

impl From<Body> for BodyField {
    fn from(body: Body) -> Self {
        match body {
            Body::Top => BodyField::Top,
            Body::Bottom => BodyField::Bottom,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List review requests
    List {
        /// Offset of the first review request
        #[arg(short, long, default_value_t = 0)]
        start: usize,
    },

    /// Show a review request and the files of its latest diff
    Show { id: u64 },

    /// Print one side of a filediff
    Diff {
        id: u64,
        revision: u32,
        filediff: u64,

        #[arg(long, value_enum, default_value = "dst")]
        side: Side,
    },

    /// Comment on displayed lines START..=END of a filediff
    Comment {
        id: u64,
        revision: u32,
        filediff: u64,
        start: usize,
        end: usize,
        text: String,

        #[arg(long, value_enum, default_value = "dst")]
        side: Side,
    },

    /// Show the draft review
    Draft { id: u64 },

    /// Replace the header or tail of the draft review
    Body {
        id: u64,
        #[arg(value_enum)]
        field: Body,
        text: String,
    },

    /// Publish the draft review
    Submit { id: u64 },
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load();
    if let Some(url) = cli.url {
        config.server_url = url;
    }
    logger::init(&config)?;

    let prompt = Arc::new(TerminalPrompt::new(config.username.clone()));
    let session = Session::connect(&config, prompt)
        .await
        .with_context(|| format!("Failed to connect to {}", config.server_url))?;

    match cli.command {
        Commands::List { start } => {
            print_lines(&session.review_request_lines(start).await?);
        }
        Commands::Show { id } => {
            let view = session.review_request_view(id).await?;
            print_lines(&view.lines);
            if let Some(revision) = view.diff_revision {
                let mut files: Vec<_> = view.files.into_iter().collect();
                files.sort();
                println!();
                for (path, filediff) in files {
                    println!("{} {} {}", revision, filediff, path);
                }
            }
        }
        Commands::Diff {
            id,
            revision,
            filediff,
            side,
        } => {
            let view = session
                .diff_view(FileKey::new(id, revision, filediff))
                .await
                .context("Failed to load diff")?;
            match DiffSide::from(side) {
                DiffSide::Source => {
                    println!("{}", view.source_name);
                    match view.source_lines {
                        Some(lines) => print_lines(&lines),
                        None => println!("(new file)"),
                    }
                }
                DiffSide::Dest => {
                    println!("{}", view.dest_name);
                    print_lines(&view.dest_lines);
                }
            }
        }
        Commands::Comment {
            id,
            revision,
            filediff,
            start,
            end,
            text,
            side,
        } => {
            let comment = session
                .make_comment(
                    FileKey::new(id, revision, filediff),
                    side.into(),
                    start,
                    end,
                    &text,
                )
                .await
                .context("Failed to save comment")?;
            println!(
                "Commented on lines {}-{}",
                comment.first_line,
                comment.last_line()
            );
        }
        Commands::Draft { id } => {
            print_lines(&session.draft_review_lines(id).await?);
        }
        Commands::Body { id, field, text } => {
            session.update_body(id, field.into(), &text).await?;
            println!("Updated review body.");
        }
        Commands::Submit { id } => {
            session.submit_review(id).await?;
            println!("Submitted review.");
        }
    }

    log::info!("Exiting rboard");
    Ok(())
}
