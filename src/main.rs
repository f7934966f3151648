mod categories;
mod classifier;
mod cli;
mod dataset;
mod error;
mod fmt;
mod importer;
mod matcher;
mod reconciler;
mod settings;
mod store;
mod summary;
mod table_format;
mod workspace;

use clap::Parser;

use cli::{CategoriesCommands, Cli, Commands};
use workspace::Workspace;

fn main() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "penny=warn".into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = settings::resolve(cli.data_dir);

    let result = Workspace::from_settings(&settings).and_then(|ws| match cli.command {
        Commands::Import => cli::import::run(&ws, &settings),
        Commands::Classify => cli::classify::run(&ws),
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { names, keywords } => {
                cli::categories::add(&ws, &settings, &names, &keywords)
            }
            CategoriesCommands::Delete { names } => cli::categories::delete(&ws, &settings, &names),
            CategoriesCommands::Show => cli::categories::show(&ws),
        },
        Commands::Info { unique } => cli::info::run(&ws, &settings, unique),
    });

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
