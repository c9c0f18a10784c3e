//! CLI module for Fortell.

pub mod commands;
mod output;

pub use output::{format_minutes, Output};

use clap::{Parser, Subcommand};

/// Fortell - Audiobook Generation
///
/// A CLI tool and HTTP service for generating narrated audiobooks from a short brief.
/// The name "Fortell" comes from the Norwegian word for "tell" or "narrate."
#[derive(Parser, Debug)]
#[command(name = "fortell")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize Fortell and verify system requirements
    Init,

    /// Check system requirements and configuration
    Doctor,

    /// Generate an audiobook from a topic brief
    Generate {
        /// Topic of the audiobook
        topic: String,

        /// Audience expertise level (e.g. "novice", "PhD economist")
        #[arg(short, long, default_value = "general")]
        expertise: String,

        /// Target narration length in minutes
        #[arg(short, long, default_value = "10")]
        length: u32,

        /// Pipeline topology (linear, planned); overrides config
        #[arg(short, long)]
        topology: Option<String>,

        /// Copy the finished audio to this path as well
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Start HTTP API server for frontend integration
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
