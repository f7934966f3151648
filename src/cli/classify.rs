use colored::Colorize;

use crate::error::Result;
use crate::fmt::ratio;
use crate::reconciler::{self, NoOp, Outcome};
use crate::workspace::Workspace;

pub fn run(ws: &Workspace) -> Result<()> {
    println!("Classifying data from {}...", ws.unclassified().display());
    match reconciler::run(ws)? {
        Outcome::NoOp(NoOp::NothingToReconcile) => {
            println!(" >> All transactions classified already");
        }
        Outcome::NoOp(NoOp::NoNewClassifications { pending }) => {
            println!(" >> No new classifications available ({pending} waiting)");
        }
        Outcome::Reconciled(r) => {
            println!(
                " >> New classifications: {}",
                ratio(r.summary.newly_classified, r.summary.pending).green()
            );
            if r.auto_resolved > 0 {
                println!(" >> Matching transactions resolved: {}", r.auto_resolved);
            }
            if r.remaining == 0 {
                println!(" >> {}", "Nothing left to classify".green());
            } else {
                println!(" >> Still unclassified: {}", r.remaining.to_string().yellow());
            }
        }
    }
    Ok(())
}
