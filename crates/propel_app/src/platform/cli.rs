use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "propel", version, about = "Turn the page you are reading into startup ideas")]
pub struct Cli {
    /// Configuration file (RON). Defaults to ./propel.ron when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Also write logs to ./propel.log.
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract a page (http(s) url or saved .html file) and generate ideas from it.
    Ideas { target: String },
    /// Log in and remember the bearer token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PROPEL_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Forget the stored bearer token.
    Logout,
    /// Check that the backend is up.
    Greeting,
    /// Generate from a free-form prompt.
    Generate {
        prompt: String,
        #[arg(long)]
        tone: Option<String>,
    },
    /// List previously generated ideas.
    History,
    /// Toggle the star on an idea.
    Star { id: u64 },
    /// Delete an idea.
    Delete { id: u64 },
}
