//! Clap derive structures for the `adminkit` CLI.
//!
//! Defines the command tree, global flags, and shared argument types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// adminkit -- admin console for users and posts
#[derive(Debug, Parser)]
#[command(
    name = "adminkit",
    version,
    about = "Manage users and posts on an adminkit server",
    long_about = "Admin console for an adminkit server.\n\n\
        Lists, creates, edits and deletes users and posts through the server's\n\
        JSON API, and exposes the typed route proxy for raw requests.",
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
    /// Server profile to use
    #[arg(long, short = 'p', env = "ADMINKIT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 's', env = "ADMINKIT_SERVER", global = true)]
    pub server: Option<String>,

    /// Bearer token
    #[arg(long, env = "ADMINKIT_TOKEN", global = true, hide_env = true)]
    pub token: Option<String>,

    /// Output format [default: from config, else table]
    #[arg(long, short = 'o', env = "ADMINKIT_OUTPUT", global = true)]
    pub output: Option<OutputFormat>,

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

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "ADMINKIT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "ADMINKIT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,

    /// Directory for downloaded files
    #[arg(long, env = "ADMINKIT_DOWNLOAD_DIR", global = true)]
    pub download_dir: Option<PathBuf>,
}

impl GlobalOpts {
    pub fn output_format(&self) -> OutputFormat {
        self.output.clone().unwrap_or_default()
    }
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    #[default]
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
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
    /// Manage users
    #[command(alias = "u")]
    Users(UsersArgs),

    /// Manage posts
    Posts(PostsArgs),

    /// Send a raw request through the route proxy
    #[command(alias = "req")]
    Request(RequestArgs),

    /// Check that the server answers
    Hello(HelloArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Screens ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct UsersArgs {
    #[command(subcommand)]
    pub command: CrudCommand,
}

#[derive(Debug, Args)]
pub struct PostsArgs {
    #[command(subcommand)]
    pub command: PostsCommand,
}

#[derive(Debug, Subcommand)]
pub enum PostsCommand {
    #[command(flatten)]
    Crud(CrudCommand),

    /// Move a post to the position of another post on the same page
    Move(MoveArgs),
}

/// Operations shared by every CRUD screen.
#[derive(Debug, Subcommand)]
pub enum CrudCommand {
    /// List one page of records
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one record
    Get {
        /// Record ID
        id: String,
    },

    /// Create a record from field=value pairs
    Create {
        /// Field values, e.g. name=Ada email=ada@example.com
        #[arg(required = true, value_name = "FIELD=VALUE")]
        values: Vec<String>,
    },

    /// Update fields of a record
    Update {
        /// Record ID
        id: String,

        /// Field values to change
        #[arg(required = true, value_name = "FIELD=VALUE")]
        values: Vec<String>,
    },

    /// Delete a record
    #[command(alias = "rm")]
    Delete {
        /// Record ID
        id: String,
    },
}

/// Page, sort and filter arguments for list views.
#[derive(Debug, Args)]
pub struct PageArgs {
    /// Page number (1-based)
    #[arg(long, default_value = "1")]
    pub page: u32,

    /// Rows per page [default: from config]
    #[arg(long, short = 'n')]
    pub size: Option<u32>,

    /// Sort column, as field or field:asc / field:desc
    #[arg(long)]
    pub sort: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[command(flatten)]
    pub page: PageArgs,

    /// Column filter (repeat a key to select several values)
    #[arg(long, short = 'f', value_name = "COLUMN=VALUE")]
    pub filter: Vec<String>,

    /// Search form value
    #[arg(long, short = 'S', value_name = "FIELD=VALUE")]
    pub search: Vec<String>,
}

#[derive(Debug, Args)]
pub struct MoveArgs {
    /// ID of the post to move
    pub id: String,

    /// ID of the post whose position it takes
    pub over: String,

    #[command(flatten)]
    pub page: PageArgs,
}

// ── Raw request ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct RequestArgs {
    /// Route segments, e.g. `posts item`
    #[arg(required = true)]
    pub segments: Vec<String>,

    /// HTTP method [default: POST with a body, else GET]
    #[arg(long, short = 'X')]
    pub method: Option<String>,

    /// Path parameter for `:name` placeholders
    #[arg(long = "param", short = 'P', value_name = "NAME=VALUE")]
    pub params: Vec<String>,

    /// Query string value (repeat a key for arrays)
    #[arg(long = "query", short = 'Q', value_name = "KEY=VALUE")]
    pub query: Vec<String>,

    /// Extra request header
    #[arg(long = "header", short = 'H', value_name = "NAME:VALUE")]
    pub headers: Vec<String>,

    /// JSON request body
    #[arg(long, conflicts_with = "body_file")]
    pub body: Option<String>,

    /// Read the JSON request body from a file
    #[arg(long)]
    pub body_file: Option<PathBuf>,

    /// Do not report a rejected session as a login redirect
    #[arg(long)]
    pub no_redirect: bool,
}

#[derive(Debug, Args)]
pub struct HelloArgs {
    /// Use POST instead of GET
    #[arg(long)]
    pub post: bool,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Interactive setup wizard
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a profile value
    Set {
        /// Config key (server, token_env, download_dir, timeout, insecure, ca_cert, login_url)
        key: String,
        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name
        name: String,
    },

    /// Store a bearer token in the system keyring
    SetToken {
        /// Profile name [default: active profile]
        #[arg(long)]
        profile: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
