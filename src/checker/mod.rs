pub mod protocol;
pub mod segmenter;
pub mod session;

pub use session::{LanguageSession, PendingVerdict, SessionError};

use crate::Options;
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

/// Speller sessions, one per language, spawned lazily the first time a
/// language is needed and shared by every document in the run.
pub struct SessionPool {
    program: String,
    extra_args: Vec<String>,
    dictionaries: BTreeMap<String, PathBuf>,
    sessions: HashMap<String, LanguageSession>,
}

impl SessionPool {
    pub fn new(options: &Options) -> Self {
        Self {
            program: options.checker_program.clone(),
            extra_args: options.checker_args.clone(),
            dictionaries: options.dictionaries.clone(),
            sessions: HashMap::new(),
        }
    }

    /// The session for `language`, spawning it on first use.
    pub fn session(&mut self, language: &str) -> Result<&mut LanguageSession, SessionError> {
        if !self.sessions.contains_key(language) {
            let args = self.speller_args(language);
            let session = LanguageSession::spawn(&self.program, &args, language)?;
            self.sessions.insert(language.to_string(), session);
        }
        Ok(self
            .sessions
            .get_mut(language)
            .expect("session was just inserted"))
    }

    fn speller_args(&self, language: &str) -> Vec<String> {
        let mut args = vec!["-a".to_string(), format!("--lang={language}")];
        args.extend(self.extra_args.iter().cloned());
        if let Some(path) = self.dictionaries.get(language) {
            args.push(format!("--personal={}", path.display()));
        }
        args
    }

    /// Close every session, letting each speller flush and exit. The first
    /// fault any of them hit fails the whole run.
    pub async fn shutdown(&mut self) -> Result<(), SessionError> {
        let mut first_fault = None;
        for (_, session) in self.sessions.drain() {
            if let Err(e) = session.end().await {
                first_fault.get_or_insert(e);
            }
        }
        match first_fault {
            Some(fault) => Err(fault),
            None => Ok(()),
        }
    }
}
