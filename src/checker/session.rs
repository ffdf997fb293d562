//! One long-lived speller process per language, driven over pipes.
//!
//! Words go down the child's stdin one per line; verdict lines come back on
//! stdout in the same order. Correlation is strictly positional: every
//! submitted word is pushed onto a FIFO queue and the next verdict line
//! resolves the queue head. Verdict lines that repeat the word (`&` and `#`)
//! double as a desync check.

use crate::checker::protocol;
use crate::checker::segmenter;
use crate::Verdict;
use std::collections::VecDeque;
use std::process::Stdio;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("failed to start speller `{program}` for {language}: {message}")]
    Start {
        program: String,
        language: String,
        message: String,
    },
    #[error("speller diagnostic for {language}: {message}")]
    Diagnostic { language: String, message: String },
    #[error("speller for {language} out of sync: queued `{queued}`, response names `{claimed}`")]
    OutOfSync {
        language: String,
        queued: String,
        claimed: String,
    },
    #[error("speller for {language} answered with no request pending: `{line}`")]
    Unsolicited { language: String, line: String },
    #[error("unparseable speller response for {language}: `{line}`")]
    Malformed { language: String, line: String },
    #[error("speller for {language} exited before answering `{word}`")]
    Exited { language: String, word: String },
}

struct Pending {
    word: String,
    reply: oneshot::Sender<Result<Verdict, SessionError>>,
}

type Queue = Arc<Mutex<VecDeque<Pending>>>;
type Fault = Arc<Mutex<Option<SessionError>>>;

/// A word that has been submitted but not yet answered.
pub struct PendingVerdict {
    word: String,
    language: String,
    reply: oneshot::Receiver<Result<Verdict, SessionError>>,
    fault: Fault,
}

impl PendingVerdict {
    /// Resolve this request. If the session died before answering, surface
    /// the session fault rather than a bare closed-channel error.
    pub async fn verdict(self) -> Result<Verdict, SessionError> {
        match self.reply.await {
            Ok(verdict) => verdict,
            Err(_) => Err(self.fault.lock().unwrap().clone().unwrap_or(
                SessionError::Exited {
                    language: self.language,
                    word: self.word,
                },
            )),
        }
    }
}

/// One speller process bound to a single language for the run's duration.
pub struct LanguageSession {
    language: String,
    stdin: Option<ChildStdin>,
    child: Child,
    queue: Queue,
    fault: Fault,
    reader: JoinHandle<()>,
    diagnostics: JoinHandle<()>,
}

impl LanguageSession {
    pub fn spawn(program: &str, args: &[String], language: &str) -> Result<Self, SessionError> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SessionError::Start {
                program: program.to_string(),
                language: language.to_string(),
                message: e.to_string(),
            })?;

        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let queue: Queue = Arc::new(Mutex::new(VecDeque::new()));
        let fault: Fault = Arc::new(Mutex::new(None));

        let reader = tokio::spawn(read_verdicts(
            stdout,
            Arc::clone(&queue),
            Arc::clone(&fault),
            language.to_string(),
        ));
        let diagnostics = tokio::spawn(read_diagnostics(
            stderr,
            Arc::clone(&fault),
            language.to_string(),
        ));

        Ok(Self {
            language: language.to_string(),
            stdin: Some(stdin),
            child,
            queue,
            fault,
            reader,
            diagnostics,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Queue one word for checking and send it to the speller. The word must
    /// be a pure word-class token; feeding separators or mixed text here is a
    /// caller bug.
    pub async fn check_word(&mut self, word: &str) -> Result<PendingVerdict, SessionError> {
        debug_assert!(
            segmenter::is_word(word),
            "check_word received non-word token `{word}`"
        );
        if let Some(fault) = self.fault.lock().unwrap().clone() {
            return Err(fault);
        }

        let (tx, rx) = oneshot::channel();
        self.queue.lock().unwrap().push_back(Pending {
            word: word.to_string(),
            reply: tx,
        });

        if let Some(stdin) = self.stdin.as_mut() {
            // A failed write is not fatal on its own: the pipe can close
            // while the speller is still draining verdicts it already read.
            if let Err(e) = stdin.write_all(format!("{word}\n").as_bytes()).await {
                eprintln!("warning: write to {} speller failed: {e}", self.language);
            }
        }

        Ok(PendingVerdict {
            word: word.to_string(),
            language: self.language.clone(),
            reply: rx,
            fault: Arc::clone(&self.fault),
        })
    }

    /// Half-close stdin, let the speller flush its remaining verdicts and
    /// exit, then surface the first fault the session hit, if any.
    pub async fn end(mut self) -> Result<(), SessionError> {
        drop(self.stdin.take());
        let _ = self.reader.await;
        let _ = self.diagnostics.await;
        if let Err(e) = self.child.wait().await {
            eprintln!("warning: wait on {} speller failed: {e}", self.language);
        }
        match self.fault.lock().unwrap().clone() {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}

fn record_fault(fault: &Fault, error: SessionError) {
    let mut slot = fault.lock().unwrap();
    if slot.is_none() {
        *slot = Some(error);
    }
}

async fn read_verdicts(stdout: ChildStdout, queue: Queue, fault: Fault, language: String) {
    let mut lines = BufReader::new(stdout).lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) | Err(_) => break,
        };
        let response = match protocol::parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(response)) => response,
            Err(_) => {
                record_fault(
                    &fault,
                    SessionError::Malformed {
                        language: language.clone(),
                        line,
                    },
                );
                break;
            }
        };

        let pending = queue.lock().unwrap().pop_front();
        let Some(pending) = pending else {
            record_fault(
                &fault,
                SessionError::Unsolicited {
                    language: language.clone(),
                    line,
                },
            );
            break;
        };

        // Positional matching, backed by a word-equality assertion for the
        // lines that repeat the word. Two adjacent identical words still
        // match purely by position.
        if let Some(claimed) = response.claimed_word() {
            if claimed != pending.word {
                let error = SessionError::OutOfSync {
                    language: language.clone(),
                    queued: pending.word.clone(),
                    claimed: claimed.to_string(),
                };
                record_fault(&fault, error.clone());
                let _ = pending.reply.send(Err(error));
                break;
            }
        }
        let _ = pending.reply.send(Ok(response.into_verdict()));
    }

    // Unanswered requests resolve as errors at their await points instead of
    // hanging on a dead channel.
    queue.lock().unwrap().clear();
}

async fn read_diagnostics(stderr: ChildStderr, fault: Fault, language: String) {
    let mut lines = BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if line.trim().is_empty() {
            continue;
        }
        eprintln!("{language} speller: {line}");
        record_fault(
            &fault,
            SessionError::Diagnostic {
                language: language.clone(),
                message: line,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stub(script: &str) -> Vec<String> {
        vec!["-c".to_string(), script.to_string()]
    }

    // A speller that understands a fixed vocabulary, in the real protocol.
    const ECHO_SPELLER: &str = r#"
echo '@(#) stub speller 0.1'
while read -r w; do
  case "$w" in
    hello) echo '*' ;;
    wrold) echo '& wrold 2 0: world, word' ;;
    zzzzq) echo '# zzzzq 0' ;;
    webmail) echo '-' ;;
    *) echo '*' ;;
  esac
  echo
done
"#;

    #[tokio::test(flavor = "current_thread")]
    async fn test_verdicts_resolve_in_submission_order() {
        let mut session = LanguageSession::spawn("sh", &stub(ECHO_SPELLER), "en_US").unwrap();

        let a = session.check_word("hello").await.unwrap();
        let b = session.check_word("wrold").await.unwrap();
        let c = session.check_word("zzzzq").await.unwrap();
        let d = session.check_word("webmail").await.unwrap();

        assert_eq!(a.verdict().await.unwrap(), Verdict::Correct);
        assert_eq!(
            b.verdict().await.unwrap(),
            Verdict::Misspelled {
                position: 0,
                suggestions: vec!["world".to_string(), "word".to_string()],
            }
        );
        assert_eq!(
            c.verdict().await.unwrap(),
            Verdict::Misspelled {
                position: 0,
                suggestions: Vec::new(),
            }
        );
        assert_eq!(d.verdict().await.unwrap(), Verdict::Compound);

        session.end().await.unwrap();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_repeated_identical_words_each_resolve_once() {
        let mut session = LanguageSession::spawn("sh", &stub(ECHO_SPELLER), "en_US").unwrap();
        let first = session.check_word("wrold").await.unwrap();
        let second = session.check_word("wrold").await.unwrap();
        assert!(!first.verdict().await.unwrap().is_ok());
        assert!(!second.verdict().await.unwrap().is_ok());
        session.end().await.unwrap();
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_mismatched_response_word_is_a_fault() {
        // Always answers for a word nobody asked about.
        let script = r#"
while read -r w; do
  echo '& other 1 0: nope'
  echo
done
"#;
        let mut session = LanguageSession::spawn("sh", &stub(script), "en_US").unwrap();
        let pending = session.check_word("hello").await.unwrap();
        match pending.verdict().await {
            Err(SessionError::OutOfSync { queued, claimed, .. }) => {
                assert_eq!(queued, "hello");
                assert_eq!(claimed, "other");
            }
            other => panic!("expected OutOfSync, got {other:?}"),
        }
        assert!(session.end().await.is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_exit_before_answer_surfaces_as_error() {
        let mut session = LanguageSession::spawn("sh", &stub("exit 0"), "en_US").unwrap();
        let pending = session.check_word("hello").await.unwrap();
        match pending.verdict().await {
            Err(SessionError::Exited { word, .. }) => assert_eq!(word, "hello"),
            other => panic!("expected Exited, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_stderr_output_is_a_fault_at_teardown() {
        let script = r#"echo 'cannot open dictionary' >&2"#;
        let session = LanguageSession::spawn("sh", &stub(script), "en_US").unwrap();
        match session.end().await {
            Err(SessionError::Diagnostic { message, .. }) => {
                assert!(message.contains("dictionary"));
            }
            other => panic!("expected Diagnostic, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_spawn_failure_is_reported() {
        let result = LanguageSession::spawn("definitely-not-a-speller-xyz", &[], "en_US");
        assert!(matches!(result, Err(SessionError::Start { .. })));
    }
}
