use colored::Colorize;

use crate::error::Result;
use crate::fmt::ratio;
use crate::importer::migrate;
use crate::settings::Settings;
use crate::workspace::Workspace;

pub fn run(ws: &Workspace, settings: &Settings) -> Result<()> {
    println!("Importing data from {}...", ws.dir().display());
    let result = migrate(ws, settings)?;

    if result.summary.total == 0 {
        println!(" >> {} is empty", result.source);
        return Ok(());
    }
    if !result.matched_returns.is_empty() || result.audited_returns > 0 {
        println!(
            " >> Returns removed: {} ({} left for review in {})",
            result.matched_returns.len(),
            result.audited_returns,
            ws.excluded_returns().display()
        );
    }

    let s = result.summary;
    println!(" >> Classified: {}", ratio(s.classified, s.total).green());
    let unclassified = ratio(s.unclassified, s.total);
    if s.unclassified == 0 {
        println!(" >> Unclassified: {unclassified}");
    } else {
        println!(" >> Unclassified: {}", unclassified.yellow());
        println!(
            " >> Fill in the Type column of {} ({} rows) and run `penny classify`",
            ws.unclassified().display(),
            result.to_review
        );
    }
    Ok(())
}
