//! Clap derive structures for the `folio` CLI.
//!
//! Defines the command tree, global flags, and shared types.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// folio -- manage portfolio content from the command line
#[derive(Debug, Parser)]
#[command(
    name = "folio",
    version,
    about = "Manage portfolio content from the command line",
    long_about = "Read and edit the projects, tech stack, social links, and work \
        experience behind a portfolio site.\n\n\
        Edits are applied optimistically and rolled back if the data API rejects them; \
        `folio watch` streams realtime changes as they land.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Profile to use
    #[arg(long, short = 'p', env = "FOLIO_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Data API base URL (overrides profile)
    #[arg(long, env = "FOLIO_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Bearer token (overrides profile and keyring)
    #[arg(long, env = "FOLIO_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Act with admin rights (required for create/update/delete)
    #[arg(long, env = "FOLIO_ADMIN", global = true)]
    pub admin: bool,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FOLIO_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "FOLIO_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one id per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage portfolio projects
    #[command(alias = "p")]
    Projects(ProjectsArgs),

    /// Manage the tech stack
    #[command(alias = "t")]
    Tech(TechArgs),

    /// Manage social links
    #[command(alias = "s")]
    Socials(SocialsArgs),

    /// Manage work experience entries
    #[command(alias = "exp", alias = "e")]
    Experience(ExperienceArgs),

    /// Stream realtime changes until interrupted
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared arguments ─────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct IdArg {
    /// Resource ID
    pub id: String,
}

/// Read the payload from a JSON file instead of flags.
#[derive(Debug, Args)]
pub struct FromFile {
    /// JSON file holding the full payload (overrides field flags)
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  PROJECTS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ProjectsArgs {
    #[command(subcommand)]
    pub command: ProjectsCommand,
}

#[derive(Debug, Subcommand)]
pub enum ProjectsCommand {
    /// List all projects
    #[command(alias = "ls")]
    List,

    /// Show project details
    Show(IdArg),

    /// Create a project
    Create {
        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: ProjectFields,
    },

    /// Update a project (only the given fields change)
    Update {
        /// Project ID
        id: String,

        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: ProjectFields,
    },

    /// Delete a project
    #[command(alias = "rm")]
    Delete(IdArg),
}

#[derive(Debug, Args)]
pub struct ProjectFields {
    /// Project title
    #[arg(long)]
    pub title: Option<String>,

    /// Short description
    #[arg(long)]
    pub description: Option<String>,

    /// Cover image URL
    #[arg(long)]
    pub image_url: Option<String>,

    /// Technologies used (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub tech: Option<Vec<String>>,

    /// Live demo URL
    #[arg(long)]
    pub live_url: Option<String>,

    /// Source repository URL
    #[arg(long)]
    pub repo_url: Option<String>,

    /// Feature the project on the landing page
    #[arg(long)]
    pub featured: Option<bool>,

    /// Sort position
    #[arg(long)]
    pub order: Option<i32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  TECH STACK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct TechArgs {
    #[command(subcommand)]
    pub command: TechCommand,
}

#[derive(Debug, Subcommand)]
pub enum TechCommand {
    /// List the tech stack
    #[command(alias = "ls")]
    List,

    /// Show tech item details
    Show(IdArg),

    /// Add a tech item
    Create {
        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: TechFields,
    },

    /// Update a tech item
    Update {
        /// Tech item ID
        id: String,

        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: TechFields,
    },

    /// Delete a tech item
    #[command(alias = "rm")]
    Delete(IdArg),
}

#[derive(Debug, Args)]
pub struct TechFields {
    /// Technology name
    #[arg(long)]
    pub name: Option<String>,

    /// Category (e.g., "language", "framework")
    #[arg(long)]
    pub category: Option<String>,

    /// Icon URL
    #[arg(long)]
    pub icon_url: Option<String>,

    /// Proficiency, 0-100
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub proficiency: Option<u8>,

    /// Sort position
    #[arg(long)]
    pub order: Option<i32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  SOCIAL LINKS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct SocialsArgs {
    #[command(subcommand)]
    pub command: SocialsCommand,
}

#[derive(Debug, Subcommand)]
pub enum SocialsCommand {
    /// List social links
    #[command(alias = "ls")]
    List,

    /// Show social link details
    Show(IdArg),

    /// Add a social link
    Create {
        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: SocialFields,
    },

    /// Update a social link
    Update {
        /// Social link ID
        id: String,

        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: SocialFields,
    },

    /// Delete a social link
    #[command(alias = "rm")]
    Delete(IdArg),
}

#[derive(Debug, Args)]
pub struct SocialFields {
    /// Platform name (e.g., "github")
    #[arg(long)]
    pub platform: Option<String>,

    /// Profile URL
    #[arg(long)]
    pub url: Option<String>,

    /// Icon name
    #[arg(long)]
    pub icon: Option<String>,

    /// Sort position
    #[arg(long)]
    pub order: Option<i32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WORK EXPERIENCE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ExperienceArgs {
    #[command(subcommand)]
    pub command: ExperienceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ExperienceCommand {
    /// List work experience
    #[command(alias = "ls")]
    List,

    /// Show experience details
    Show(IdArg),

    /// Add a work experience entry
    Create {
        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: ExperienceFields,
    },

    /// Update a work experience entry
    Update {
        /// Experience ID
        id: String,

        #[command(flatten)]
        file: FromFile,

        #[command(flatten)]
        fields: ExperienceFields,
    },

    /// Delete a work experience entry
    #[command(alias = "rm")]
    Delete(IdArg),
}

#[derive(Debug, Args)]
pub struct ExperienceFields {
    /// Company name
    #[arg(long)]
    pub company: Option<String>,

    /// Job title
    #[arg(long)]
    pub position: Option<String>,

    /// Location
    #[arg(long)]
    pub location: Option<String>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub start: Option<NaiveDate>,

    /// End date (YYYY-MM-DD)
    #[arg(long, conflicts_with = "current")]
    pub end: Option<NaiveDate>,

    /// Still in this role (clears the end date)
    #[arg(long)]
    pub current: Option<bool>,

    /// Role description
    #[arg(long)]
    pub description: Option<String>,

    /// Highlight bullet (repeatable)
    #[arg(long = "highlight")]
    pub highlights: Option<Vec<String>>,

    /// Sort position
    #[arg(long)]
    pub order: Option<i32>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  WATCH
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Collections to watch (default: all)
    #[arg(long, short = 'k', value_enum, value_delimiter = ',')]
    pub kind: Vec<WatchKind>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WatchKind {
    Projects,
    Tech,
    Socials,
    Experience,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display the current configuration (tokens redacted)
    Show,

    /// Store a bearer token in the system keyring
    SetToken {
        /// Token value (prompted for when omitted)
        #[arg(long)]
        value: Option<String>,
    },

    /// Print the config file path
    Path,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
