//! Command-line interface for subgen
//!
//! Provides argument parsing using clap derive macros.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Offline subtitle generation for video and audio files
#[derive(Parser, Debug)]
#[command(
    name = "subgen",
    version,
    about = "Offline subtitle generation for video and audio files"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Video or audio file to transcribe
    #[arg(value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Subtitle output path (default: input file with .srt extension)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Whisper model (default: small, multilingual). See `subgen models list`
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Language code for transcription (default: auto-detect). Examples: auto, en, de, es, fr
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Sampling temperature between 0.0 and 1.0 (default: 0.0)
    #[arg(long, value_name = "TEMP")]
    pub temperature: Option<f32>,

    /// Translate the transcript to English instead of transcribing
    #[arg(long)]
    pub translate: bool,

    /// Initial prompt to bias decoding (names, spellings, punctuation style)
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Path to an ffmpeg binary (default: PATH lookup, then managed download)
    #[arg(long, value_name = "PATH")]
    pub ffmpeg: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress output (quiet mode)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output (-v: stage progress, -vv: full diagnostics)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage Whisper models
    Models {
        /// Action to perform
        #[command(subcommand)]
        action: ModelsAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        shell: Shell,
    },
}

/// Model management actions
#[derive(Subcommand, Debug)]
pub enum ModelsAction {
    /// List available models
    List {
        /// Print the catalog as JSON
        #[arg(long)]
        json: bool,
    },
    /// Download and install a model
    Install {
        /// Model name (e.g., tiny, small, large-v3-turbo)
        name: String,
    },
    /// Set the default transcription model
    Use {
        /// Model name (e.g., tiny, small, large-v3-turbo)
        name: String,
    },
}
