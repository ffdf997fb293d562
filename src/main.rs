use anyhow::{bail, Result};
use clap::{ArgAction, CommandFactory, Parser};
use clap_complete::{generate, Shell};
use htmlspell::{cli, config, document, render, Options, Runner};
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser, Debug)]
#[command(name = "htmlspell")]
#[command(version, about = "Spellcheck rendered HTML with an external speller", long_about = None)]
struct Cli {
    /// Files or directories to check (.html pages or .md sources)
    #[arg(value_name = "PATHS")]
    paths: Vec<PathBuf>,

    /// Element name or #id to treat as the checking root
    #[arg(long, value_name = "SELECTOR")]
    root: Option<String>,

    /// Base language passed to the speller (e.g. en_US, en_GB)
    #[arg(short, long)]
    language: Option<String>,

    /// Per-element language override (ELEMENT=LANGUAGE, repeatable)
    #[arg(long = "element-language", value_name = "ELEMENT=LANGUAGE")]
    element_languages: Vec<String>,

    /// Element whose subtree is never checked (repeatable)
    #[arg(long = "ignore-element", value_name = "ELEMENT")]
    ignored_elements: Vec<String>,

    /// Personal dictionary: LANGUAGE=PATH, or a bare path for the base language
    #[arg(long = "dictionary", value_name = "LANGUAGE=PATH")]
    dictionaries: Vec<String>,

    /// Speller executable to drive
    #[arg(long, value_name = "PROGRAM")]
    checker: Option<String>,

    /// Extra argument passed to the speller (repeatable)
    #[arg(long = "checker-arg", value_name = "ARG", allow_hyphen_values = true)]
    checker_args: Vec<String>,

    /// Stop at the first document with misspellings
    #[arg(long)]
    fail_fast: bool,

    /// Directory for annotated output (defaults to each input's directory)
    #[arg(long, value_name = "DIR")]
    out_dir: Option<PathBuf>,

    /// Increase diagnostic detail (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completion: Option<Shell>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle shell completion generation
    if let Some(shell) = cli.completion {
        let mut cmd = Cli::command();
        generate(shell, &mut cmd, "htmlspell", &mut io::stdout());
        return Ok(());
    }

    let options = build_options(&cli)?;

    if cli.paths.is_empty() {
        bail!("No inputs specified. Use --help for usage information.");
    }
    let inputs = expand_inputs(&cli.paths)?;
    if inputs.is_empty() {
        bail!("No checkable documents found under the given paths.");
    }

    let mut runner = Runner::new(options, !cli.no_color);
    let summary = runner.run(&inputs).await?;
    cli::output::print_run_summary(&summary, !cli.no_color);

    if summary.any_annotated() {
        std::process::exit(1);
    }
    Ok(())
}

/// Defaults, then config files, then CLI flags. The base language must be
/// settled before dictionaries, since a bare dictionary path binds to it.
fn build_options(cli: &Cli) -> Result<Options> {
    let mut options = Options::from_files()?;

    if let Some(root) = &cli.root {
        options.root_selector = root.clone();
    }
    if let Some(language) = &cli.language {
        options.language = language.clone();
    }
    options
        .element_languages
        .extend(config::parse_pairs(&cli.element_languages, "element language")?);
    options
        .ignored_elements
        .extend(cli.ignored_elements.iter().cloned());
    options
        .dictionaries
        .extend(config::parse_dictionaries(&cli.dictionaries, &options.language)?);
    if let Some(checker) = &cli.checker {
        options.checker_program = checker.clone();
    }
    if !cli.checker_args.is_empty() {
        options.checker_args = cli.checker_args.clone();
    }
    if cli.fail_fast {
        options.fail_fast = true;
    }
    if let Some(dir) = &cli.out_dir {
        options.output_dir = Some(dir.clone());
    }
    options.verbosity = cli.verbose;

    Ok(options)
}

/// Explicit files are taken as-is; directories expand to the markup and
/// markdown files they contain, skipping outputs of earlier runs.
fn expand_inputs(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut inputs = Vec::new();
    for path in paths {
        if !path.exists() {
            bail!("Input not found: {}", path.display());
        }
        if path.is_dir() {
            for entry in WalkDir::new(path)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
            {
                let candidate = entry.path();
                if candidate.is_file()
                    && is_checkable(candidate)
                    && !document::is_annotated_output(candidate)
                {
                    inputs.push(candidate.to_path_buf());
                }
            }
        } else {
            inputs.push(path.clone());
        }
    }
    Ok(inputs)
}

fn is_checkable(path: &Path) -> bool {
    matches!(
        path.extension().and_then(OsStr::to_str),
        Some("html" | "htm")
    ) || render::is_markdown(path)
}
