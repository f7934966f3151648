pub mod categories;
pub mod classify;
pub mod import;
pub mod info;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "penny", about = "Classify bank statement spending and remember how you did it.")]
pub struct Cli {
    /// Data directory for this run (default: from ~/.config/penny/settings.json)
    #[arg(long = "data-dir", global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Import raw.csv (or raw.xlsx), remove returns and classify every transaction.
    Import,
    /// Fold manually typed rows from unclassified.csv back into the classified set.
    Classify,
    /// Manage spending categories and their keywords.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show the data directory and transaction counts.
    Info {
        /// Count each distinct description once
        #[arg(long)]
        unique: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add categories, e.g. `penny categories add "Home,Gym" --keyword IKEA`.
    Add {
        /// Comma separated category names
        names: String,
        /// Keyword (case-insensitive regex) for the new categories; repeatable
        #[arg(long = "keyword")]
        keywords: Vec<String>,
    },
    /// Delete categories and forget transactions learned under them.
    Delete {
        /// Comma separated category names
        names: String,
    },
    /// Show categories, their keywords and how many transactions use them.
    Show,
}
