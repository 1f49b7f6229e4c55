//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueEnum, ValueHint};

/// KPI decomposition trees: parse metric formulas into a laid-out forest of factors
#[derive(Parser, Debug)]
#[command(name = "kpitree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Keep the forest in memory only (nothing is persisted)
    #[arg(long, global = true, conflicts_with = "store")]
    pub memory: bool,

    /// Store file (overrides config)
    #[arg(long, global = true, value_hint = ValueHint::FilePath)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate decomposition trees from formulas
    Generate {
        /// File with one formula per line (`#` starts a comment)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
        /// Formula given inline, e.g. -e "profit = revenue - cost"
        #[arg(short = 'e', long = "formula")]
        formulas: Vec<String>,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },

    /// Browse and apply formula templates
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },

    /// Inspect the persisted forest
    Forest {
        #[command(subcommand)]
        command: ForestCommands,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Indented tree with coordinates
    Tree,
    /// Decomposition map as JSON
    Json,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// List industries and tree types
    List,

    /// Show the formulas of a template
    Show {
        tree_type: String,
        kpi: String,
    },

    /// Generate trees from a template
    Generate {
        tree_type: String,
        kpi: String,
        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,
    },
}

#[derive(Subcommand, Debug)]
pub enum ForestCommands {
    /// List stored nodes with coordinates
    Nodes,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
