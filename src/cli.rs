use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "craftform")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Declarative blocks, fills and entities for Minecraft worlds", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Manifest describing the desired world state
    #[arg(
        short,
        long,
        global = true,
        env = "CRAFTFORM_MANIFEST",
        default_value = "craftform.toml"
    )]
    pub manifest: PathBuf,

    /// State file (default: craftform.state.toml next to the manifest)
    #[arg(long, global = true)]
    pub state: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show what apply would change
    Plan(PlanArgs),

    /// Send the commands that make the world match the manifest
    Apply(ApplyArgs),

    /// Clear every recorded resource from the world
    Destroy(DestroyArgs),

    /// Record an existing resource under a manifest address
    Import(ImportArgs),

    /// Show recorded state
    Show(ShowArgs),

    /// Describe the attributes of each resource kind
    Schema {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

// ============================================================================
// Shared Arguments
// ============================================================================

/// Connection overrides, taking precedence over the manifest's [provider] table
#[derive(Args, Default)]
pub struct ProviderArgs {
    /// RCON address, host:port
    #[arg(long)]
    pub address: Option<String>,

    /// RCON password
    #[arg(long)]
    pub password: Option<String>,
}

// ============================================================================
// Commands
// ============================================================================

#[derive(Args)]
pub struct PlanArgs {
    /// Only plan specific targets: kind or kind.name
    pub target: Option<String>,

    /// Print the command strings each entry would send
    #[arg(long)]
    pub commands: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args)]
pub struct ApplyArgs {
    /// Only apply specific targets: kind or kind.name
    pub target: Option<String>,

    /// Show what would be sent without connecting
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args)]
pub struct DestroyArgs {
    /// Only destroy specific targets: kind or kind.name
    pub target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    #[command(flatten)]
    pub provider: ProviderArgs,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Manifest address to record the resource under, e.g. block.beacon
    pub address: String,

    /// Resource ID, e.g. block-0-64-0
    pub id: String,
}

#[derive(Args)]
pub struct ShowArgs {
    /// Only show this address
    pub address: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}
