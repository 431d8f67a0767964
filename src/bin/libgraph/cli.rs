//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

/// libgraph - lazy module graphs for compiled libraries
#[derive(Parser)]
#[command(name = "libgraph")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Load libraries and show their package fragments
    Inspect(InspectArgs),

    /// Resolve a class id across libraries
    Lookup(LookupArgs),

    /// Run the two-stage interop build
    Interop(InteropArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Args)]
pub struct InspectArgs {
    /// Library directories
    #[arg(required = true)]
    pub libraries: Vec<PathBuf>,

    /// List the classifiers of every fragment (decodes all payloads)
    #[arg(long)]
    pub classifiers: bool,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct LookupArgs {
    /// Class id, e.g. `cnames.structs/SDL_Window`
    pub class_id: String,

    /// Library directories, in load order
    #[arg(short, long = "library", required = true)]
    pub libraries: Vec<PathBuf>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args)]
pub struct InteropArgs {
    /// Flavor passed to the header-import tool
    #[arg(long, env = "LIBGRAPH_INTEROP_FLAVOR")]
    pub flavor: Option<String>,

    /// Header-import program
    #[arg(long)]
    pub tool: Option<PathBuf>,

    /// Print the library-production arguments instead of running it
    #[arg(long)]
    pub print_only: bool,

    /// Arguments shared by both stages
    #[arg(last = true, allow_hyphen_values = true)]
    pub args: Vec<String>,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
