use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// vskill - VideoDB skills as JSON-in, JSON-out commands
#[derive(Parser, Debug)]
#[command(name = "vskill")]
#[command(about = "Search, index, transcribe, and upload VideoDB videos", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Extra .env file, taking precedence over the discovered ones
    #[arg(long, global = true, value_name = "PATH")]
    pub env_file: Option<PathBuf>,

    /// Override the VideoDB API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,

    /// Log debug details to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Search a video or the whole collection, indexing on demand
    Search(SkillArgs),

    /// Create, list, or search scene indexes of a video
    SceneIndex(SkillArgs),

    /// Fetch a video's transcript, generating it when missing
    Transcript(SkillArgs),

    /// Upload a video, or list and inspect uploaded videos
    Upload(SkillArgs),
}

#[derive(Parser, Debug)]
pub struct SkillArgs {
    /// JSON object with the skill's input; read from stdin when omitted
    pub input: Option<String>,
}

impl Commands {
    pub fn input(&self) -> Option<&str> {
        match self {
            Commands::Search(args)
            | Commands::SceneIndex(args)
            | Commands::Transcript(args)
            | Commands::Upload(args) => args.input.as_deref(),
        }
    }
}
