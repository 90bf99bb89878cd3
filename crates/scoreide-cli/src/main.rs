mod launcher;
mod render;
mod terminal;

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::path::PathBuf;

use scoreide::{Boilerplate, Collaborators, Configuration, Ide};
use scoreide_git::GitRepository;

use crate::launcher::SystemLauncher;
use crate::render::ProcessRenderer;
use crate::terminal::{LineEditor, PlainTerminal};

#[derive(Parser, Debug)]
#[command(name = "ide")]
#[command(about = "Navigate, edit, and build score package trees")]
struct Cli {
    /// Configuration file [default: ~/.scoreide/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Scores directory, overriding the configuration
    #[arg(long)]
    scores_dir: Option<PathBuf>,

    /// Example scores directory, used as home in test mode
    #[arg(long)]
    example_scores_dir: Option<PathBuf>,

    /// Record commits, renders and launches instead of performing them
    #[arg(long)]
    test: bool,

    /// Whitespace-separated tokens to run before reading the terminal
    #[arg(long)]
    input: Option<String>,

    /// Write the session transcript to this file as JSON on exit
    #[arg(long)]
    transcript: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log errors only
    #[arg(short, long)]
    quiet: bool,
}

/// `~/.scoreide`, holding the configuration and line history.
fn app_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".scoreide")
}

fn init_logging(verbose: bool, quiet: bool) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if quiet {
        builder.filter_level(log::LevelFilter::Error);
    } else if verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

fn load_configuration(cli: &Cli) -> Result<Configuration> {
    let path = cli
        .config
        .clone()
        .unwrap_or_else(|| app_directory().join("config.toml"));
    let mut config = Configuration::load(&path)
        .with_context(|| format!("Failed to read configuration {}", path.display()))?;
    if let Some(scores) = &cli.scores_dir {
        config.scores_directory = Some(scores.clone());
    }
    if let Some(examples) = &cli.example_scores_dir {
        config.example_scores_directory = Some(examples.clone());
    }
    if config.lilypond_log.is_none() {
        config.lilypond_log = Some(app_directory().join("lily.log"));
    }
    Ok(config)
}

fn collaborators(config: &Configuration) -> Result<Collaborators> {
    let mut templates = Boilerplate::builtin();
    if let Some(directory) = &config.boilerplate_directory {
        templates = templates.with_directory(directory);
    }
    let collaborators = Collaborators::inert()
        .with_repository(GitRepository::new())
        .with_renderer(ProcessRenderer::new(config))
        .with_templates(templates)
        .with_launcher(SystemLauncher::new(config));
    Ok(if std::io::stdin().is_terminal() {
        collaborators.with_terminal(LineEditor::new(app_directory().join("history.txt"))?)
    } else {
        collaborators.with_terminal(PlainTerminal::new())
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    let config = load_configuration(&cli)?;
    let collaborators = collaborators(&config)?;
    let mut ide = Ide::new(config, collaborators, cli.test)?;

    let outcome = ide.run(cli.input.as_deref());
    if let Some(path) = &cli.transcript {
        let json = serde_json::to_string_pretty(ide.transcript())?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write transcript {}", path.display()))?;
    }
    outcome?;
    Ok(())
}
