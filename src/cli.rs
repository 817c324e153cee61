use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::{self, CommandReport};
use crate::folio::Site;
use crate::folio::projects::ProjectRequest;

#[derive(Parser, Debug)]
#[command(
    name = "folio",
    version,
    about = "Keep a static portfolio's index, listing and tag pages in sync",
    arg_required_else_help = true
)]
pub struct Cli {
    /// Portfolio root (default: FOLIO_BASE_DIR, then the current directory).
    #[arg(long, global = true, value_name = "PATH")]
    pub base_dir: Option<PathBuf>,

    /// Print the command report as JSON.
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the index pages and artifact directories.
    Init,
    /// Print every tag, writeup and project.
    List,
    /// Create a tag.
    Tag(TagArgs),
    /// Delete a tag no writeup references.
    RemoveTag(NameArgs),
    /// Create a writeup and list it on every page that should show it.
    Writeup(WriteupArgs),
    /// Remove a writeup by title.
    Remove(TitleArgs),
    /// Append a project.
    Project(ProjectArgs),
    /// Re-synchronize every index page from the artifacts.
    Update,
    /// Check that every page agrees with the artifacts.
    Verify,
}

#[derive(Args, Debug)]
pub struct TagArgs {
    pub name: String,
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args, Debug)]
pub struct NameArgs {
    pub name: String,
}

#[derive(Args, Debug)]
pub struct TitleArgs {
    pub title: String,
}

#[derive(Args, Debug)]
pub struct WriteupArgs {
    pub title: String,
    /// One or more tags; created when missing.
    #[arg(long, num_args = 1.., required = true)]
    pub tags: Vec<String>,
    #[arg(long, value_name = "URL")]
    pub machine_photo: Option<String>,
    /// Display date, e.g. "January 01, 2025" (default: today).
    #[arg(long, value_name = "DATE")]
    pub created_date: Option<String>,
    /// Display date (default: the created date).
    #[arg(long, value_name = "DATE")]
    pub updated_date: Option<String>,
    #[arg(long)]
    pub difficulty: Option<String>,
    #[arg(long)]
    pub os: Option<String>,
    #[arg(long)]
    pub ip: Option<String>,
    /// Markdown file holding the writeup body.
    #[arg(long, value_name = "FILE")]
    pub content: Option<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ProjectArgs {
    pub title: String,
    pub description: String,
    pub url: String,
    /// Display date (default: today).
    #[arg(long, value_name = "DATE")]
    pub date: Option<String>,
}

fn print_report(report: &CommandReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }
    println!("{}: {}", report.command, if report.ok { "ok" } else { "failed" });
    for detail in &report.details {
        println!("  {detail}");
    }
    for issue in &report.issues {
        println!("  issue: {issue}");
    }
    Ok(())
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let site = Site::open(cli.base_dir.as_deref())?;

    let report = match cli.command {
        Command::Init => commands::init::run(&site)?,
        Command::List => commands::list::run(&site)?,
        Command::Tag(args) => commands::tag::run(
            &site,
            &commands::tag::TagOptions {
                name: args.name,
                description: args.description,
            },
        )?,
        Command::RemoveTag(args) => commands::tag::run_remove(&site, &args.name)?,
        Command::Writeup(args) => commands::writeup::run(
            &site,
            commands::writeup::WriteupOptions {
                title: args.title,
                tags: args.tags,
                machine_photo: args.machine_photo,
                created_date: args.created_date,
                updated_date: args.updated_date,
                difficulty: args.difficulty,
                os: args.os,
                ip: args.ip,
                content: args.content,
            },
        )?,
        Command::Remove(args) => commands::writeup::run_remove(&site, &args.title)?,
        Command::Project(args) => commands::project::run(
            &site,
            &ProjectRequest {
                title: args.title,
                description: args.description,
                url: args.url,
                date: args.date,
            },
        )?,
        Command::Update => commands::update::run(&site)?,
        Command::Verify => commands::verify::run(&site)?,
    };

    print_report(&report, cli.json)?;
    if !report.ok {
        bail!("{} reported {} issue(s)", report.command, report.issues.len());
    }
    Ok(())
}
