//! The document loop: render, parse, walk, check, reconcile, report.

use crate::checker::segmenter::{self, SpanKind};
use crate::checker::{PendingVerdict, SessionPool};
use crate::cli::output;
use crate::document::reconcile::{self, WordCheck};
use crate::document::{self, walker};
use crate::{render, DocumentStatus, Options, RunSummary, Verdict};
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;

/// Checks a set of documents against a shared pool of speller sessions.
pub struct Runner {
    options: Options,
    pool: SessionPool,
    colored: bool,
}

/// A span whose verdict is either already known (separators) or still on the
/// wire (words). Keeping the slots ordered is what lets word checks run
/// concurrently while reconciliation stays in document order.
enum Slot {
    Ready(WordCheck),
    Waiting { text: String, pending: PendingVerdict },
}

impl Runner {
    pub fn new(options: Options, colored: bool) -> Self {
        let pool = SessionPool::new(&options);
        Self {
            options,
            pool,
            colored,
        }
    }

    /// Check every input in order. With fail-fast, the loop halts after the
    /// first annotated document; sessions are shut down either way.
    pub async fn run(&mut self, inputs: &[impl AsRef<Path>]) -> Result<RunSummary> {
        let mut summary = RunSummary::default();
        for input in inputs {
            let path = input.as_ref();
            let status = match self.check_document(path).await {
                Ok(status) => status,
                Err(error) => {
                    // Sessions are closed even when a fault aborts the loop;
                    // the fault itself is what the caller needs to see.
                    let _ = self.pool.shutdown().await;
                    return Err(error)
                        .with_context(|| format!("while checking {}", path.display()));
                }
            };
            output::print_document_status(path, &status, self.colored);

            let annotated = matches!(status, DocumentStatus::Annotated { .. });
            summary.documents.push((path.to_path_buf(), status));
            if annotated && self.options.fail_fast {
                summary.halted = true;
                break;
            }
        }
        self.pool
            .shutdown()
            .await
            .context("while closing speller sessions")?;
        Ok(summary)
    }

    async fn check_document(&mut self, path: &Path) -> Result<DocumentStatus> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let html = if render::is_markdown(path) {
            let title = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("document");
            render::render_page(&source, title)
        } else {
            source
        };

        let dom = document::parse(&html);
        let root = document::select_root(&dom, &self.options.root_selector).ok_or_else(|| {
            anyhow!(
                "root selector `{}` matched nothing",
                self.options.root_selector
            )
        })?;

        let targets = walker::collect_targets(&root, &self.options);
        let mut misspellings = 0;
        for target in &targets {
            if misspellings > 0 && self.options.fail_fast {
                break;
            }
            let checks = self.check_text(&target.text, &target.language).await?;
            if self.options.verbosity >= 1 {
                for check in &checks {
                    if let Verdict::Misspelled { suggestions, .. } = &check.verdict {
                        output::print_misspelling(
                            &check.text,
                            &target.language,
                            suggestions,
                            self.colored,
                        );
                    }
                }
            }
            misspellings +=
                reconcile::annotate_node(&target.parent, &target.node, &checks, &target.language);
        }

        if misspellings == 0 {
            return Ok(DocumentStatus::Clean);
        }

        reconcile::inject_style(&dom);
        let output_path = document::annotated_path(path, self.options.output_dir.as_deref());
        let markup = document::serialize_tree(&dom)?;
        fs::write(&output_path, markup)
            .with_context(|| format!("Failed to write {}", output_path.display()))?;
        Ok(DocumentStatus::Annotated {
            output: output_path,
            misspellings,
        })
    }

    /// Check one text node: submit every word span without waiting, then
    /// collect the verdicts in span order. Separator spans never touch the
    /// speller, and a node with no word spans never spawns one.
    async fn check_text(&mut self, text: &str, language: &str) -> Result<Vec<WordCheck>> {
        let has_words = segmenter::segment(text).any(|s| matches!(s.kind, SpanKind::Word));
        let mut session = if has_words {
            Some(self.pool.session(language)?)
        } else {
            None
        };

        let mut slots = Vec::new();
        for span in segmenter::segment(text) {
            match span.kind {
                SpanKind::Word => {
                    let session = session.as_mut().expect("word spans imply a session");
                    slots.push(Slot::Waiting {
                        text: span.text.to_string(),
                        pending: session.check_word(span.text).await?,
                    });
                }
                SpanKind::Separator => slots.push(Slot::Ready(WordCheck {
                    text: span.text.to_string(),
                    verdict: Verdict::Correct,
                })),
            }
        }

        let mut checks = Vec::with_capacity(slots.len());
        for slot in slots {
            match slot {
                Slot::Ready(check) => checks.push(check),
                Slot::Waiting { text, pending } => checks.push(WordCheck {
                    text,
                    verdict: pending.verdict().await?,
                }),
            }
        }
        Ok(checks)
    }
}
