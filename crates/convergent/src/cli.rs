//! Clap derive structures for the `convergent` CLI.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};

use convergent_core::{OperationKind, TerminalStatuses};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// convergent -- drive declared configuration to convergence
#[derive(Debug, Parser)]
#[command(
    name = "convergent",
    version,
    about = "Reconcile declared configuration with remote services and wait for convergence",
    long_about = "Submits mutations to a remote configuration service that applies \
        changes asynchronously, polls until they reach a terminal status, and \
        reconciles the declared items with what the service reports back.",
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
    /// Service profile to use
    #[arg(long, short = 'p', env = "CONVERGENT_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Service base URL (overrides profile)
    #[arg(long, short = 'e', env = "CONVERGENT_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Bearer token (overrides profile and keyring)
    #[arg(long, env = "CONVERGENT_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "CONVERGENT_OUTPUT",
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

    /// Accept invalid TLS certificates
    #[arg(long, short = 'k', env = "CONVERGENT_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "CONVERGENT_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
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

#[derive(Debug, Clone, Copy, ValueEnum)]
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
    /// Merge declared items with observed items, offline
    #[command(alias = "rec")]
    Reconcile(ReconcileArgs),

    /// Find the surrogate id of an item by its business key, offline
    Resolve(ResolveArgs),

    /// Submit a desired state and wait for it to converge
    Apply(ApplyArgs),

    /// Wait on an operation that was submitted earlier
    Wait(WaitArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  OFFLINE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// JSON or YAML array of declared items, in the order you want them kept
    #[arg(long, short = 'd')]
    pub declared: PathBuf,

    /// JSON or YAML array of items as the service reports them
    #[arg(long, short = 'O')]
    pub observed: PathBuf,
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// JSON or YAML array of items as the service reports them
    #[arg(long, short = 'O')]
    pub observed: PathBuf,

    /// Business key parts, in order (integers are matched as integers)
    #[arg(required = true)]
    pub key: Vec<String>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  REMOTE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct PollArgs {
    /// Seconds (or a duration like "2m") between status polls
    #[arg(long, value_parser = parse_duration)]
    pub poll_interval: Option<Duration>,

    /// Give up waiting after this long (e.g. "30m")
    #[arg(long, value_parser = parse_duration)]
    pub deadline: Option<Duration>,
}

#[derive(Debug, Args)]
pub struct ApplyArgs {
    /// Desired-state document (JSON or YAML)
    pub file: PathBuf,

    /// Return as soon as the service accepts the mutation
    #[arg(long)]
    pub no_wait: bool,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Args)]
pub struct WaitArgs {
    /// Operation handle returned at submission
    pub handle: String,

    /// Kind of the submitted operation
    #[arg(long, value_enum, default_value = "activate")]
    pub kind: KindArg,

    /// Status vocabulary the operation reports in
    #[arg(long, value_enum, default_value = "activation")]
    pub vocabulary: Vocabulary,

    #[command(flatten)]
    pub poll: PollArgs,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum KindArg {
    Activate,
    Deactivate,
    Update,
}

impl From<KindArg> for OperationKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Activate => Self::Activate,
            KindArg::Deactivate => Self::Deactivate,
            KindArg::Update => Self::Update,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum Vocabulary {
    /// ACTIVATED / DEACTIVATED, failing on FAILED or ABORTED
    Activation,
    /// COMPLETE, failing on DENIED
    Propagation,
    /// ACTIVE, failing on FAILED
    Provisioning,
}

impl Vocabulary {
    pub fn statuses(self, kind: OperationKind) -> TerminalStatuses {
        match self {
            Self::Activation => TerminalStatuses::activation(kind),
            Self::Propagation => TerminalStatuses::propagation(),
            Self::Provisioning => TerminalStatuses::provisioning(),
        }
    }
}

/// Bare integers are seconds; anything else goes through humantime.
fn parse_duration(raw: &str) -> Result<Duration, String> {
    if let Ok(secs) = raw.parse::<u64>() {
        return Ok(Duration::from_secs(secs));
    }
    humantime::parse_duration(raw).map_err(|e| e.to_string())
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
    /// Write a config file with one profile
    Init {
        /// Profile name
        #[arg(long, default_value = "default")]
        name: String,

        /// Service base URL
        #[arg(long = "url")]
        url: String,

        /// Environment variable holding the bearer token
        #[arg(long)]
        token_env: Option<String>,

        /// Overwrite an existing profile of the same name
        #[arg(long)]
        force: bool,
    },

    /// Display current resolved configuration
    Show,

    /// Print the config file location
    Path,

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },

    /// Store a token read from stdin in the system keyring
    SetToken,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  COMPLETIONS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn durations_accept_seconds_and_units() {
        assert_eq!(parse_duration("90"), Ok(Duration::from_secs(90)));
        assert_eq!(parse_duration("2m"), Ok(Duration::from_secs(120)));
        assert!(parse_duration("soon").is_err());
    }
}
