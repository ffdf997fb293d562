pub mod checker;
pub mod cli;
pub mod config;
pub mod document;
pub mod render;
pub mod runner;

pub use config::Options;
pub use runner::Runner;

use std::path::PathBuf;

/// Outcome of checking one word against a speller session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Word found in the dictionary.
    Correct,
    /// Accepted as a run-together compound.
    Compound,
    /// Not in the dictionary; carries the speller's position hint and
    /// suggested alternatives (possibly empty).
    Misspelled {
        position: usize,
        suggestions: Vec<String>,
    },
}

impl Verdict {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Verdict::Misspelled { .. })
    }
}

/// Final state of one checked document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentStatus {
    Clean,
    Annotated {
        output: PathBuf,
        misspellings: usize,
    },
}

#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub documents: Vec<(PathBuf, DocumentStatus)>,
    /// True when fail-fast stopped the loop before all inputs were seen.
    pub halted: bool,
}

impl RunSummary {
    pub fn any_annotated(&self) -> bool {
        self.documents
            .iter()
            .any(|(_, status)| matches!(status, DocumentStatus::Annotated { .. }))
    }
}
