//! Command-line surface.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "bookjibe")]
#[command(about = "Write a book chapter by chapter with a language model")]
#[command(version)]
pub struct Cli {
    /// Name of the stored session to work on
    #[arg(long, global = true, default_value = "default")]
    pub session: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Command {
    /// List the selectable story starters
    Prompts,

    /// List the models offered by the generation service
    Models,

    /// Start a new book: generate the synopsis from a story starter
    Init {
        #[arg(long)]
        prompt_file: String,
        #[arg(long)]
        description: String,
    },

    /// Generate two versions of a chapter and keep one
    Chapter {
        /// What should happen in the chapter (asked interactively if absent)
        #[arg(long)]
        description: Option<String>,
        /// Chapter number; defaults to the one after the last written
        #[arg(long)]
        number: Option<u32>,
    },

    /// Print chapter N (0 for the synopsis); without N, list the chapters
    Show { number: Option<u32> },

    /// Replace the session with a book imported from JSON, CSV or TSV
    Import { file: PathBuf },

    /// Write the book text to a file
    SaveBook { path: PathBuf },

    /// Write the section history as JSON
    SaveHistory { path: PathBuf },

    /// Append the sections of a saved history
    LoadHistory {
        path: PathBuf,
        /// Stop after this chapter
        #[arg(long)]
        keep: Option<u32>,
    },

    /// Generate a new story starter from a generator fragment
    GeneratePrompt {
        #[arg(long)]
        fragment: String,
        #[arg(long)]
        text: String,
        /// Base name of the files written to the prompt folder
        #[arg(long)]
        output: String,
    },

    /// Forget the stored session
    Restart,
}
