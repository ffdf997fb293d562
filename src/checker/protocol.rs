//! Line-oriented response protocol of an ispell-compatible speller running
//! in pipe mode: one verdict line per submitted word, in submission order.

use crate::Verdict;
use thiserror::Error;

/// One parsed verdict line from the speller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// `*`: word found in the dictionary.
    Correct,
    /// `-`: accepted as a run-together compound.
    Compound,
    /// `& <word> <count> <offset>: <sugg>, <sugg>, ...`
    Miss {
        word: String,
        position: usize,
        suggestions: Vec<String>,
    },
    /// `# <word> <offset>`: not found, nothing to suggest.
    NoSuggestion { word: String, position: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed speller response line: `{0}`")]
pub struct MalformedResponse(pub String);

/// Parse one line of speller output. Returns `Ok(None)` for lines that carry
/// no verdict: the `@` startup banner and the blank separator emitted between
/// one word's result and the next.
pub fn parse_line(line: &str) -> Result<Option<Response>, MalformedResponse> {
    let line = line.trim_end_matches('\r');
    if line.is_empty() || line.starts_with('@') {
        return Ok(None);
    }
    let malformed = || MalformedResponse(line.to_string());
    match line.as_bytes()[0] {
        b'*' => Ok(Some(Response::Correct)),
        b'-' => Ok(Some(Response::Compound)),
        b'&' => {
            let (head, tail) = line[1..].split_once(':').ok_or_else(malformed)?;
            let mut fields = head.split_whitespace();
            let word = fields.next().ok_or_else(malformed)?.to_string();
            let _count = fields.next().ok_or_else(malformed)?;
            let position = fields
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(malformed)?;
            let suggestions = tail
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            Ok(Some(Response::Miss {
                word,
                position,
                suggestions,
            }))
        }
        b'#' => {
            let mut fields = line[1..].split_whitespace();
            let word = fields.next().ok_or_else(malformed)?.to_string();
            let position = fields
                .next()
                .and_then(|p| p.parse().ok())
                .ok_or_else(malformed)?;
            Ok(Some(Response::NoSuggestion { word, position }))
        }
        _ => Err(malformed()),
    }
}

impl Response {
    /// The word this verdict claims to describe, when the line carries one.
    /// `*` and `-` lines do not repeat the word.
    pub fn claimed_word(&self) -> Option<&str> {
        match self {
            Response::Correct | Response::Compound => None,
            Response::Miss { word, .. } | Response::NoSuggestion { word, .. } => Some(word),
        }
    }

    pub fn into_verdict(self) -> Verdict {
        match self {
            Response::Correct => Verdict::Correct,
            Response::Compound => Verdict::Compound,
            Response::Miss {
                position,
                suggestions,
                ..
            } => Verdict::Misspelled {
                position,
                suggestions,
            },
            Response::NoSuggestion { position, .. } => Verdict::Misspelled {
                position,
                suggestions: Vec::new(),
            },
        }
    }
}
