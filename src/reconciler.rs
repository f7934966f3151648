//! Folds manual classifications from the unclassified file back into the
//! classified set and the learned mappings.
//!
//! ```text
//! Unprocessed ──► Summarized ──► Reconciled
//!      └────────► NoOp
//! ```

use std::collections::HashSet;

use crate::classifier::{Classifier, Keywords, Labels};
use crate::dataset::{Dataset, INFO, TYPE};
use crate::error::Result;
use crate::store::Store;
use crate::workspace::{delete_file, Workspace};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoOp {
    /// The unclassified file is missing or empty.
    NothingToReconcile,
    /// Rows are waiting but none has a `Type` yet.
    NoNewClassifications { pending: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    /// Rows in the unclassified file before this run.
    pub pending: usize,
    /// Rows given a `Type` by hand since the last run.
    pub newly_classified: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub summary: Summary,
    /// Classified rows that gained a type without being edited by hand.
    pub auto_resolved: usize,
    /// Rows left in the unclassified file.
    pub remaining: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    NoOp(NoOp),
    Reconciled(Reconciled),
}

/// In-memory state for one run. Datasets and stores are handed in by the
/// caller, who also decides when to persist them.
pub struct Reconciler<'a> {
    classified: &'a mut Dataset,
    unclassified: &'a mut Dataset,
    mappings: &'a mut Store,
    keywords: &'a Keywords,
}

enum Stage {
    Unprocessed,
    Summarized { summary: Summary, newly: Dataset },
    Done(Outcome),
}

impl<'a> Reconciler<'a> {
    pub fn new(
        classified: &'a mut Dataset,
        unclassified: &'a mut Dataset,
        mappings: &'a mut Store,
        keywords: &'a Keywords,
    ) -> Self {
        Self {
            classified,
            unclassified,
            mappings,
            keywords,
        }
    }

    pub fn run(mut self) -> Result<Outcome> {
        let mut stage = Stage::Unprocessed;
        loop {
            stage = match stage {
                Stage::Unprocessed => self.summarize(),
                Stage::Summarized { summary, newly } => Stage::Done(self.reconcile(summary, &newly)?),
                Stage::Done(outcome) => return Ok(outcome),
            };
        }
    }

    fn summarize(&self) -> Stage {
        if self.unclassified.is_blank() {
            return Stage::Done(Outcome::NoOp(NoOp::NothingToReconcile));
        }
        let pending = self.unclassified.count_rows();
        let newly = self.unclassified.filter(|r| !r.is_blank(TYPE));
        if newly.is_blank() {
            return Stage::Done(Outcome::NoOp(NoOp::NoNewClassifications { pending }));
        }
        tracing::info!("{}/{pending} unclassified rows classified by hand", newly.count_rows());
        Stage::Summarized {
            summary: Summary {
                pending,
                newly_classified: newly.count_rows(),
            },
            newly,
        }
    }

    fn reconcile(&mut self, summary: Summary, newly: &Dataset) -> Result<Outcome> {
        let typed_before: HashSet<u64> = typed_ids(self.classified);

        self.classified.update(newly);
        // Taught before re-classifying so the new entries propagate
        for row in newly.rows() {
            if let Some(labels) = Labels::parse(&row.text(TYPE)) {
                self.mappings.update(row.text(INFO), labels.to_value());
            }
        }

        let classifier = Classifier::new(self.mappings, self.keywords);
        classifier.apply(self.classified);

        let manual: HashSet<u64> = newly.ids().into_iter().collect();
        let auto_resolved = typed_ids(self.classified)
            .iter()
            .filter(|id| !typed_before.contains(id) && !manual.contains(id))
            .count();

        let resolved: Vec<u64> = self
            .unclassified
            .rows()
            .iter()
            .filter(|r| manual.contains(&r.id) || classifier.classify(&r.text(INFO)).is_some())
            .map(|r| r.id)
            .collect();
        self.unclassified.drop_rows(&resolved)?;

        Ok(Outcome::Reconciled(Reconciled {
            summary,
            auto_resolved,
            remaining: self.unclassified.count_rows(),
        }))
    }
}

fn typed_ids(data: &Dataset) -> HashSet<u64> {
    data.rows()
        .iter()
        .filter(|r| !r.is_blank(TYPE))
        .map(|r| r.id)
        .collect()
}

/// Load the workspace files, reconcile, and persist. Classified rows and
/// mappings are written before the unclassified file, so an interrupted
/// run can simply be repeated.
pub fn run(ws: &Workspace) -> Result<Outcome> {
    let mut unclassified = ws.read_statements(&ws.unclassified())?;
    if unclassified.is_blank() {
        return Ok(Outcome::NoOp(NoOp::NothingToReconcile));
    }
    let keywords = Keywords::load(&ws.categories())?;
    let mut classified = ws.read_statements(&ws.classified())?;
    let mut mappings = Store::load(&ws.mappings())?;

    let outcome = Reconciler::new(&mut classified, &mut unclassified, &mut mappings, &keywords).run()?;
    if let Outcome::Reconciled(_) = outcome {
        classified.write(&ws.classified())?;
        mappings.write()?;
        if unclassified.is_blank() {
            delete_file(&ws.unclassified())?;
        } else {
            unclassified.write(&ws.unclassified())?;
        }
    }
    Ok(outcome)
}
