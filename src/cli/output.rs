use crate::{DocumentStatus, RunSummary};
use colored::*;
use std::path::Path;

/// One line per document: the input and either "Ok" or where the annotated
/// copy was written.
pub fn print_document_status(path: &Path, status: &DocumentStatus, colored: bool) {
    let name = path.display().to_string();
    match status {
        DocumentStatus::Clean => {
            if colored {
                println!("{}: {}", name, "Ok".green().bold());
            } else {
                println!("{name}: Ok");
            }
        }
        DocumentStatus::Annotated {
            output,
            misspellings,
        } => {
            let word = if *misspellings == 1 {
                "misspelling"
            } else {
                "misspellings"
            };
            if colored {
                println!(
                    "{}: {} {} → {}",
                    name,
                    misspellings.to_string().red().bold(),
                    word,
                    output.display()
                );
            } else {
                println!("{name}: {misspellings} {word} → {}", output.display());
            }
        }
    }
}

/// Per-word detail, shown at verbosity >= 1.
pub fn print_misspelling(word: &str, language: &str, suggestions: &[String], colored: bool) {
    let alternatives = if suggestions.is_empty() {
        "(no suggestions)".to_string()
    } else {
        suggestions.join(", ")
    };
    if colored {
        eprintln!(
            "  {} [{}] → {}",
            word.red().bold(),
            language,
            alternatives.green()
        );
    } else {
        eprintln!("  {word} [{language}] → {alternatives}");
    }
}

pub fn print_run_summary(summary: &RunSummary, colored: bool) {
    let annotated = summary
        .documents
        .iter()
        .filter(|(_, status)| matches!(status, DocumentStatus::Annotated { .. }))
        .count();
    let total = summary.documents.len();

    println!();
    if annotated == 0 {
        if colored {
            println!("{}", "✓ No spelling errors found!".green().bold());
        } else {
            println!("✓ No spelling errors found!");
        }
    } else {
        let doc_word = if total == 1 { "document" } else { "documents" };
        if colored {
            println!(
                "{} {} of {} {} annotated",
                "✗".red().bold(),
                annotated.to_string().red().bold(),
                total,
                doc_word
            );
        } else {
            println!("✗ {annotated} of {total} {doc_word} annotated");
        }
    }
    if summary.halted {
        println!("(stopped early: fail-fast)");
    }
}
