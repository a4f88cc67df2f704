//! bookjibe command-line entry point.
//!
//! This crate is the composition root (DI wiring layer): it reads the
//! configuration and opens `BookApp` on the state folder.

mod app;
mod cli;

#[cfg(test)]
mod tests;

use anyhow::Context;
use clap::Parser;
use rustyline::DefaultEditor;
use tracing_subscriber::EnvFilter;

use bookjibe_types::{book::ChapterVersions, config::BookjibeConfig};

use app::{BookApp, ChapterOutcome};
use cli::{Cli, Command};

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let dotenv = load_dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv? {
        Some(path) => log::debug!("Environment loaded from {}", path),
        None => log::debug!("No .env file found"),
    }

    let cli = Cli::parse();
    let config = BookjibeConfig::from_env()?;
    let app = BookApp::open(config, cli.session)?;

    run(&app, cli.command).await
}

/// Load `BOOKJIBE_CONFIG_FILE` if set (it must exist), else `.env` if present.
fn load_dotenv() -> anyhow::Result<Option<String>> {
    match std::env::var("BOOKJIBE_CONFIG_FILE") {
        Ok(path) => {
            dotenvy::from_filename(&path).with_context(|| format!("loading {}", path))?;
            Ok(Some(path))
        }
        Err(_) => Ok(dotenvy::dotenv()
            .ok()
            .map(|p| p.display().to_string())),
    }
}

async fn run(app: &BookApp, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Prompts => {
            for name in app.prompts().await? {
                println!("{}", name);
            }
        }
        Command::Models => {
            for model in app.models().await? {
                println!("{}", model);
            }
        }
        Command::Init {
            prompt_file,
            description,
        } => {
            let synopsis = app.init(&prompt_file, &description).await?;
            println!("{}", synopsis);
        }
        Command::Chapter {
            description,
            number,
        } => {
            let mut editor = DefaultEditor::new()?;
            let description = match description {
                Some(d) => d,
                None => editor.readline("Chapter description: ")?,
            };
            let outcome = app
                .chapter(&description, number, |versions| {
                    ask_choice(&mut editor, versions)
                })
                .await?;
            match outcome {
                ChapterOutcome::Accepted { chapter, choice } => {
                    println!("Chapter {} added (version {}).", chapter, choice)
                }
                ChapterOutcome::Discarded { chapter } => {
                    println!("Chapter {} discarded.", chapter)
                }
            }
        }
        Command::Show { number } => println!("{}", app.show(number).await?),
        Command::Import { file } => {
            let sections = app.import(&file).await?;
            println!("Imported {} sections from {}", sections, file.display());
        }
        Command::SaveBook { path } => {
            app.save_book(&path).await?;
            println!("Book saved to {}", path.display());
        }
        Command::SaveHistory { path } => {
            app.save_history(&path).await?;
            println!("History saved to {}", path.display());
        }
        Command::LoadHistory { path, keep } => {
            let loaded = app.load_history(&path, keep).await?;
            println!("Loaded {} sections from {}", loaded, path.display());
        }
        Command::GeneratePrompt {
            fragment,
            text,
            output,
        } => {
            let generated = app.generate_prompt(&fragment, &text, &output).await?;
            println!("{}", generated.prompt);
            println!("\nSaved as {} (draft: {})", generated.prompt_name, generated.draft_name);
        }
        Command::Restart => {
            app.restart().await?;
            println!("Session cleared.");
        }
    }
    Ok(())
}

fn ask_choice(editor: &mut DefaultEditor, versions: &ChapterVersions) -> anyhow::Result<u8> {
    for (i, candidate) in versions.candidates.iter().enumerate() {
        println!("── Version {} ──\n{}\n", i + 1, candidate.ai_message);
    }
    loop {
        let line = editor.readline("Keep version 1 or 2 (0 discards both): ")?;
        match line.trim().parse::<u8>() {
            Ok(choice @ 0..=2) => return Ok(choice),
            _ => println!("Please answer 0, 1 or 2."),
        }
    }
}
