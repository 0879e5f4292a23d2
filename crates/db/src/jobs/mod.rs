//! Offline batch jobs that recompute and persist recommendation lists.
//!
//! Both jobs load everything they need, compute every list in memory and
//! then write one transaction. They own disjoint fields of the stored
//! record, so they can run in either order, but the caller must not run
//! them concurrently.

pub mod also_bought;
pub mod recommendations;

use serde::Serialize;

use glimmer_core::domain::interaction::EventKind;
use glimmer_core::domain::product::ProductId;
use glimmer_core::domain::recommendation::WriteReport;

pub use also_bought::AlsoBoughtJob;
pub use recommendations::RecommendationJob;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobOutcome {
    Completed,
    /// Nothing to compute from; no list was written.
    Aborted,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PopularitySource {
    Interactions,
    CatalogOrder,
    #[default]
    Unused,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SignalUsage {
    pub content: bool,
    pub behavior: bool,
    pub popularity: PopularitySource,
    /// Event kind the also-bought lists were derived from.
    pub basket_source: Option<EventKind>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct JobReport {
    pub job: &'static str,
    pub outcome: JobOutcome,
    pub products: usize,
    pub computed: usize,
    pub saved: usize,
    pub skipped: Vec<ProductId>,
    pub signals: SignalUsage,
    pub warnings: Vec<String>,
}

impl JobReport {
    pub(crate) fn new(job: &'static str) -> Self {
        Self {
            job,
            outcome: JobOutcome::Completed,
            products: 0,
            computed: 0,
            saved: 0,
            skipped: Vec::new(),
            signals: SignalUsage::default(),
            warnings: Vec::new(),
        }
    }

    pub(crate) fn abort(mut self, reason: impl Into<String>) -> Self {
        self.outcome = JobOutcome::Aborted;
        self.warnings.push(reason.into());
        self
    }

    pub(crate) fn record_writes(&mut self, writes: WriteReport) {
        self.saved = writes.saved;
        self.skipped = writes.skipped;
    }

    pub fn is_aborted(&self) -> bool {
        self.outcome == JobOutcome::Aborted
    }

    /// One-line operator summary.
    pub fn summary(&self) -> String {
        if self.is_aborted() {
            let reason = self.warnings.last().map(String::as_str).unwrap_or("nothing to do");
            return format!("{} aborted: {reason}", self.job);
        }

        let mut signals = Vec::new();
        if self.signals.content {
            signals.push("content".to_string());
        }
        if self.signals.behavior {
            signals.push("behavior".to_string());
        }
        match self.signals.popularity {
            PopularitySource::Interactions => signals.push("popularity".to_string()),
            PopularitySource::CatalogOrder => signals.push("catalog order".to_string()),
            PopularitySource::Unused => {}
        }
        if let Some(kind) = self.signals.basket_source {
            signals.push(format!("{} baskets", kind.as_str()));
        }
        let signals = if signals.is_empty() { "none".to_string() } else { signals.join(", ") };

        let mut summary = format!(
            "{} completed: {} products, {} lists computed, {} saved, {} skipped, {} (signals: {signals})",
            self.job,
            self.products,
            self.computed,
            self.saved,
            self.skipped.len(),
            plural(self.warnings.len(), "warning"),
        );
        if !self.warnings.is_empty() {
            summary.push_str("; warnings: ");
            summary.push_str(&self.warnings.join("; "));
        }
        summary
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}
