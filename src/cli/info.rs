use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::{settings_path, Settings};
use crate::summary::{self, Count};
use crate::workspace::Workspace;

pub fn run(ws: &Workspace, settings: &Settings, unique: bool) -> Result<()> {
    println!("Settings:   {}", settings_path().display());
    println!("Data dir:   {}", ws.dir().display());
    println!(
        "Raw data:   {}",
        ws.raw_file()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(not found)".to_string())
    );
    println!("Date format: {}", settings.date_format);

    let count = if unique { Count::Unique } else { Count::Total };
    let mut table = Table::new();
    table.set_header(vec!["File", "Total", "Classified", "Unclassified"]);
    for path in [ws.classified(), ws.unclassified()] {
        let data = ws.read_statements(&path)?;
        let s = summary::transactions(&data, count);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(name),
            Cell::new(s.total),
            Cell::new(s.classified),
            Cell::new(s.unclassified),
        ]);
    }
    let heading = if unique { "Transactions (unique)" } else { "Transactions" };
    println!("\n{heading}\n{table}");
    Ok(())
}
