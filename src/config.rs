use anyhow::{bail, Context, Result};
use directories::ProjectDirs;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Runtime options, read-only once the run starts.
#[derive(Debug, Clone)]
pub struct Options {
    /// Element name or `#id` marking the subtree to check.
    pub root_selector: String,
    /// Language inherited by everything without a more specific override.
    pub language: String,
    /// Element name → language code, e.g. `em` → `pt_BR`.
    pub element_languages: BTreeMap<String, String>,
    /// Element names whose subtrees are never checked.
    pub ignored_elements: BTreeSet<String>,
    /// Language code → personal dictionary path.
    pub dictionaries: BTreeMap<String, PathBuf>,
    pub checker_program: String,
    pub checker_args: Vec<String>,
    pub fail_fast: bool,
    pub output_dir: Option<PathBuf>,
    pub verbosity: u8,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            root_selector: "body".to_string(),
            language: "en_US".to_string(),
            element_languages: BTreeMap::new(),
            ignored_elements: ["pre", "code", "kbd", "samp", "script", "style"]
                .into_iter()
                .map(str::to_string)
                .collect(),
            dictionaries: BTreeMap::new(),
            checker_program: "aspell".to_string(),
            checker_args: vec!["--encoding=utf-8".to_string()],
            fail_fast: false,
            output_dir: None,
            verbosity: 0,
        }
    }
}

/// Subset of options accepted from a config file; CLI flags win over these.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileOptions {
    root_selector: Option<String>,
    language: Option<String>,
    element_languages: Option<BTreeMap<String, String>>,
    ignored_elements: Option<Vec<String>>,
    dictionaries: Option<BTreeMap<String, PathBuf>>,
    checker_program: Option<String>,
    checker_args: Option<Vec<String>>,
    output_dir: Option<PathBuf>,
}

impl Options {
    /// Load options with priority: defaults < global config < local config.
    /// CLI overrides are applied by the caller afterwards.
    pub fn from_files() -> Result<Self> {
        let mut options = Self::default();

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                options.apply_file(&FileOptions::read(&global_path)?);
            }
        }

        let local_path = PathBuf::from(".htmlspell.toml");
        if local_path.exists() {
            options.apply_file(&FileOptions::read(&local_path)?);
        }

        Ok(options)
    }

    fn apply_file(&mut self, file: &FileOptions) {
        if let Some(root) = &file.root_selector {
            self.root_selector = root.clone();
        }
        if let Some(language) = &file.language {
            self.language = language.clone();
        }
        if let Some(overrides) = &file.element_languages {
            self.element_languages.extend(overrides.clone());
        }
        if let Some(ignored) = &file.ignored_elements {
            self.ignored_elements.extend(ignored.iter().cloned());
        }
        if let Some(dictionaries) = &file.dictionaries {
            self.dictionaries.extend(dictionaries.clone());
        }
        if let Some(program) = &file.checker_program {
            self.checker_program = program.clone();
        }
        if let Some(args) = &file.checker_args {
            self.checker_args = args.clone();
        }
        if let Some(dir) = &file.output_dir {
            self.output_dir = Some(dir.clone());
        }
    }

    pub fn global_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "htmlspell").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

impl FileOptions {
    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

/// Parse repeated `key=value` flags into a map. Duplicate keys keep the last
/// value; a missing `=` is a configuration fault.
pub fn parse_pairs(pairs: &[String], what: &str) -> Result<BTreeMap<String, String>> {
    let mut map = BTreeMap::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("invalid {what} `{pair}`: expected KEY=VALUE");
        };
        if key.is_empty() || value.is_empty() {
            bail!("invalid {what} `{pair}`: expected KEY=VALUE");
        }
        map.insert(key.to_string(), value.to_string());
    }
    Ok(map)
}

/// Parse `--dictionary` flags: `LANGUAGE=PATH` pairs, or a bare path that
/// applies to the base language.
pub fn parse_dictionaries(
    entries: &[String],
    base_language: &str,
) -> Result<BTreeMap<String, PathBuf>> {
    let mut map = BTreeMap::new();
    for entry in entries {
        match entry.split_once('=') {
            Some((language, path)) if !language.is_empty() && !path.is_empty() => {
                map.insert(language.to_string(), PathBuf::from(path));
            }
            Some(_) => bail!("invalid dictionary `{entry}`: expected LANGUAGE=PATH or a path"),
            None => {
                map.insert(base_language.to_string(), PathBuf::from(entry));
            }
        }
    }
    Ok(map)
}
