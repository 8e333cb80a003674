//! Clap derive structures for the `knob` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// knob -- manage Knob SSH bastions, targets and bindings
#[derive(Debug, Parser)]
#[command(
    name = "knob",
    version,
    about = "Manage Knob SSH bastions from the command line",
    long_about = "Provision SSH gates (bastion hosts), the targets reachable through them,\n\
        and the associate/delegate bindings on top, via the Knob REST API.",
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
    /// Configuration profile to use
    #[arg(long, short = 'p', env = "KNOB_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Knob endpoint URL (overrides profile)
    #[arg(long, env = "KNOB_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Project ID sent with every request
    #[arg(long, env = "OS_PROJECT_ID", global = true)]
    pub project_id: Option<String>,

    /// Pre-issued auth token
    #[arg(long, env = "OS_AUTH_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Project name
    #[arg(long, env = "OS_PROJECT_NAME", global = true, help_heading = "Identity")]
    pub os_project_name: Option<String>,

    /// User name
    #[arg(long, env = "OS_USERNAME", global = true, help_heading = "Identity")]
    pub os_username: Option<String>,

    /// User domain ID
    #[arg(long, env = "OS_USER_DOMAIN_ID", global = true, help_heading = "Identity")]
    pub os_user_domain_id: Option<String>,

    /// Project domain ID
    #[arg(long, env = "OS_PROJECT_DOMAIN_ID", global = true, help_heading = "Identity")]
    pub os_project_domain_id: Option<String>,

    /// Region used to pick the endpoint from the service catalog
    #[arg(long, env = "OS_REGION_NAME", global = true)]
    pub os_region_name: Option<String>,

    /// Endpoint interface used with the service catalog
    #[arg(long, env = "OS_INTERFACE", global = true)]
    pub os_interface: Option<String>,

    /// API version path segment
    #[arg(long, env = "KNOB_API_VERSION", global = true)]
    pub api_version: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "KNOB_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Skip TLS certificate verification
    #[arg(long, short = 'k', env = "KNOB_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds
    #[arg(long, env = "KNOB_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output Enum ──────────────────────────────────────────────────────

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
    /// Plain text, one value per line (scripting)
    Plain,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage SSH gates (bastion hosts)
    #[command(alias = "gates", alias = "g")]
    Gate(GateArgs),

    /// Manage targets reachable through gates
    #[command(alias = "targets", alias = "t")]
    Target(TargetArgs),

    /// Manage associates (target/service bindings)
    #[command(alias = "associates")]
    Associate(BindingArgs),

    /// Manage delegates (target/identity bindings)
    #[command(alias = "delegates")]
    Delegate(BindingArgs),

    /// List available ssh-proxy services
    #[command(alias = "services")]
    Service(ServiceArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared Arguments ─────────────────────────────────────────────────

/// Shared filtering arguments for list commands.
#[derive(Debug, Args)]
pub struct ListArgs {
    /// List resources of all projects (admin only)
    #[arg(long)]
    pub all_projects: bool,

    /// Server-side filter, passed through as a query parameter
    #[arg(long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,
}

// ── Gates ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GateArgs {
    #[command(subcommand)]
    pub command: GateCommand,
}

#[derive(Debug, Subcommand)]
pub enum GateCommand {
    /// List gates
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one gate
    Show {
        /// Gate ID
        gate: String,
    },

    /// Create a gate
    Create {
        /// Gate name
        name: String,

        /// Private network to attach the gate to
        #[arg(long)]
        net_id: Option<String>,

        /// Public network for the gate's floating address
        #[arg(long)]
        public_net_id: Option<String>,

        /// Public key authorized on the gate
        #[arg(long, conflicts_with = "public_key_file")]
        public_key: Option<String>,

        /// File holding the public key to authorize
        #[arg(long)]
        public_key_file: Option<PathBuf>,

        /// Extra field for the request body (repeatable)
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },

    /// Update a gate
    Update(UpdateArgs),

    /// Delete one or more gates
    #[command(alias = "rm")]
    Delete {
        /// Gate IDs
        #[arg(required = true)]
        gates: Vec<String>,
    },

    /// Manage targets attached to a gate
    Target(GateTargetArgs),

    /// Manage public keys authorized on a gate
    Key(GateKeyArgs),
}

#[derive(Debug, Args)]
pub struct GateTargetArgs {
    #[command(subcommand)]
    pub command: GateTargetCommand,
}

#[derive(Debug, Subcommand)]
pub enum GateTargetCommand {
    /// List targets attached to a gate
    List {
        /// Gate ID
        gate: String,
    },

    /// Attach a target to a gate
    Add {
        /// Gate ID
        gate: String,

        /// Target ID
        target: String,

        /// Extra field for the request body (repeatable)
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },

    /// Detach a target from a gate
    Remove {
        /// Gate ID
        gate: String,

        /// Target ID
        target: String,
    },
}

#[derive(Debug, Args)]
pub struct GateKeyArgs {
    #[command(subcommand)]
    pub command: GateKeyCommand,
}

#[derive(Debug, Subcommand)]
pub enum GateKeyCommand {
    /// List keys authorized on a gate
    List {
        /// Gate ID
        gate: String,
    },

    /// Authorize a public key on a gate
    Add {
        /// Gate ID
        gate: String,

        /// Public key text
        #[arg(long, required_unless_present = "public_key_file")]
        public_key: Option<String>,

        /// File holding the public key
        #[arg(long, conflicts_with = "public_key")]
        public_key_file: Option<PathBuf>,

        /// Key label
        #[arg(long)]
        name: Option<String>,
    },

    /// Revoke a key from a gate
    Remove {
        /// Gate ID
        gate: String,

        /// Key ID
        key: String,
    },
}

// ── Targets ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct TargetArgs {
    #[command(subcommand)]
    pub command: TargetCommand,
}

#[derive(Debug, Subcommand)]
pub enum TargetCommand {
    /// List targets
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one target
    Show {
        /// Target ID
        target: String,
    },

    /// Create a target
    Create {
        /// Target name
        name: String,

        /// Host name or address of the target
        #[arg(long)]
        hostname: String,

        /// Gate the target is reached through
        #[arg(long)]
        gate: Option<String>,

        /// Extra field for the request body (repeatable)
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },

    /// Update a target
    Update(UpdateArgs),

    /// Delete one or more targets
    #[command(alias = "rm")]
    Delete {
        /// Target IDs
        #[arg(required = true)]
        targets: Vec<String>,
    },
}

// ── Associates / Delegates ───────────────────────────────────────────

#[derive(Debug, Args)]
pub struct BindingArgs {
    #[command(subcommand)]
    pub command: BindingCommand,
}

#[derive(Debug, Subcommand)]
pub enum BindingCommand {
    /// List bindings
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one binding
    Show {
        /// Binding ID
        id: String,
    },

    /// Create a binding
    Create {
        /// Binding name
        name: String,

        /// Target the binding applies to
        #[arg(long)]
        target: String,

        /// Service (associates) or identity (delegates) to bind
        #[arg(long)]
        service: Option<String>,

        /// Extra field for the request body (repeatable)
        #[arg(long = "property", value_name = "KEY=VALUE")]
        properties: Vec<String>,
    },

    /// Update a binding
    Update(UpdateArgs),

    /// Delete one or more bindings
    #[command(alias = "rm")]
    Delete {
        /// Binding IDs
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

/// Shared arguments for every `update` command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Resource ID
    pub id: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// Field to set (repeatable)
    #[arg(long = "property", value_name = "KEY=VALUE")]
    pub properties: Vec<String>,

    /// Send only the given fields (PATCH) instead of replacing (PUT)
    #[arg(long)]
    pub merge: bool,
}

// ── Services ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommand,
}

#[derive(Debug, Subcommand)]
pub enum ServiceCommand {
    /// List ssh-proxy services
    #[command(alias = "ls")]
    List {
        /// Only services of this type
        #[arg(long = "type", value_name = "TYPE")]
        service_type: Option<String>,

        /// List services of all projects (admin only)
        #[arg(long)]
        all_projects: bool,

        /// Catalog index to query
        #[arg(long)]
        index: Option<String>,
    },
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the config file path
    Path,

    /// Show the current configuration
    Show,

    /// Set a profile field
    Set {
        /// Field name (e.g., endpoint, project_id, user_name)
        key: String,

        /// New value
        value: String,
    },

    /// Store the auth token in the system keyring
    SetToken {
        /// Read the token from this environment variable instead of prompting
        #[arg(long, value_name = "VAR")]
        from_env: Option<String>,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
