use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::categories::{self, parse_names, CategoryChange, TEMPLATE};
use crate::error::Result;
use crate::fmt::amount;
use crate::settings::Settings;
use crate::store::Store;
use crate::summary;
use crate::workspace::Workspace;

pub fn add(ws: &Workspace, settings: &Settings, names: &str, keywords: &[String]) -> Result<()> {
    let names = parse_names(names)?;
    let mut store = Store::load(&ws.categories())?;
    let change = categories::add(&mut store, &names, keywords)?;
    store.write()?;
    show_change("Adding", &change);
    reprocess(ws, settings, &change)
}

pub fn delete(ws: &Workspace, settings: &Settings, names: &str) -> Result<()> {
    let names = parse_names(names)?;
    let mut store = Store::load(&ws.categories())?;
    let mut mappings = Store::load(&ws.mappings())?;
    let change = categories::delete(&mut store, &mut mappings, &names)?;
    mappings.write()?;
    store.write()?;
    show_change("Deleting", &change);
    reprocess(ws, settings, &change)
}

pub fn show(ws: &Workspace) -> Result<()> {
    let store = Store::load(&ws.categories())?;
    if store.is_empty() {
        println!("No categories defined in {}.", ws.categories().display());
        println!("For example...\n{TEMPLATE}");
        return Ok(());
    }
    let classified = ws.read_statements(&ws.classified())?;
    let unclassified = ws.read_statements(&ws.unclassified())?;

    let mut table = Table::new();
    table.set_header(vec!["Category", "Keywords", "Transactions", "Amount"]);
    for c in summary::categories(&store, &classified) {
        let name = if c.blacklist {
            Cell::new(c.name.red())
        } else {
            Cell::new(c.name)
        };
        table.add_row(vec![
            name,
            Cell::new(c.keywords.join(", ")),
            Cell::new(c.transactions),
            Cell::new(amount(c.amount)),
        ]);
    }
    println!("Classified transactions\n{table}");
    println!("\nUnclassified transactions\n >> {}", unclassified.count_rows());
    Ok(())
}

fn show_change(action: &str, change: &CategoryChange) {
    println!("{action} categories...");
    for category in &change.categories {
        println!(" >> {category}");
    }
}

fn reprocess(ws: &Workspace, settings: &Settings, change: &CategoryChange) -> Result<()> {
    if change.reprocess && ws.raw_file().is_some() {
        println!("\nRe-processing raw data...");
        super::import::run(ws, settings)?;
    }
    Ok(())
}
