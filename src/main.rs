use std::{io, path::PathBuf, process::ExitCode};

use anyhow::{Context, Result};
use clap::Parser;
use kfind_search::{FindOptions, Finder};

mod commands;
mod config;
mod document;
mod output;

use commands::search::SearchRequest;
use config::{AppConfig, OutputFormat};
use document::Document;
use output::Printer;

#[derive(Parser)]
#[command(name = "kfind")]
#[command(about = "Find and replace text line by line", long_about = None)]
#[command(version)]
struct Cli {
    /// Text or regular expression to look for
    pattern: Option<String>,

    /// Files to search; `-` or nothing reads stdin
    files: Vec<String>,

    /// Ignore letter case
    #[arg(short = 'i', long, conflicts_with = "case_sensitive")]
    ignore_case: bool,

    /// Match letter case exactly
    #[arg(short = 's', long)]
    case_sensitive: bool,

    /// Only match whole words
    #[arg(short = 'w', long)]
    whole_words: bool,

    /// Treat the pattern as a regular expression
    #[arg(short = 'e', long)]
    regex: bool,

    /// Search from the end towards the start
    #[arg(short = 'b', long)]
    backwards: bool,

    /// Start at LINE:COL of the first input instead of at the edge
    #[arg(long, value_name = "LINE:COL")]
    from: Option<String>,

    /// Continue from the other edge after the last match
    #[arg(long)]
    wrap: bool,

    /// Show the replacement for each match
    #[arg(long, value_name = "TEMPLATE")]
    replace: Option<String>,

    /// Expand \N placeholders in the replacement
    #[arg(long)]
    placeholders: bool,

    /// Apply the replacement and write the inputs back
    #[arg(long, requires = "replace")]
    write: bool,

    /// Only print the number of matches
    #[arg(short = 'c', long)]
    count: bool,

    /// Print one JSON object per match
    #[arg(long)]
    json: bool,

    /// Print only the matched text instead of the whole line
    #[arg(long)]
    no_context: bool,

    /// Read settings from this file instead of the default location
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Create the default config file if missing and print its path
    #[arg(long)]
    init_config: bool,

    /// Display the effective configuration
    #[arg(long)]
    show_config: bool,

    /// List replacement placeholders available for the pattern
    #[arg(long)]
    list_placeholders: bool,

    /// List common regular expression terms
    #[arg(long)]
    list_regex_terms: bool,
}

impl Cli {
    /// Command line flags win over the config file.
    fn apply_to(&self, config: &mut AppConfig) {
        if self.ignore_case {
            config.case_sensitive = false;
        }
        if self.case_sensitive {
            config.case_sensitive = true;
        }
        config.whole_words |= self.whole_words;
        config.regex |= self.regex;
        config.backwards |= self.backwards;
        config.wrap |= self.wrap;
        config.placeholders |= self.placeholders;
        if self.json {
            config.output = OutputFormat::Json;
        }
        if self.no_context {
            config.context = false;
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("kfind: {e:#}");
            ExitCode::from(2)
        }
    }
}

/// Returns whether anything matched.
fn run(cli: Cli) -> Result<bool> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    if cli.init_config {
        let path = config::ensure_config_file()?;
        println!("{}", path.display());
        return Ok(true);
    }
    if cli.show_config {
        commands::show_config::run(&config, cli.config.as_deref());
        return Ok(true);
    }
    if cli.list_regex_terms {
        commands::list_regex_terms::run();
        return Ok(true);
    }

    let mut options = config.find_options();
    if cli.list_placeholders {
        commands::list_placeholders::run(cli.pattern.as_deref(), options)?;
        return Ok(true);
    }

    let pattern = cli.pattern.clone().context("missing PATTERN")?;
    kfind_search::validate_pattern(&pattern, options)
        .with_context(|| format!("invalid pattern `{pattern}`"))?;

    let document = Document::load(&cli.files)?;
    let mut finder = Finder::new();
    document.populate(&mut finder)?;

    let anchor = match &cli.from {
        Some(from) => {
            options |= FindOptions::FROM_CURSOR;
            Some(document.position_at(from)?)
        }
        None => None,
    };
    let request = SearchRequest {
        pattern,
        options,
        anchor,
        wrap: config.wrap,
        replace: cli.replace.clone(),
        context: config.context,
    };

    if cli.count {
        let count = commands::search::count(&mut finder, &request)?;
        Printer::new(io::stdout().lock(), config.output).count(count)?;
        return Ok(count > 0);
    }

    if cli.write
        && let Some(template) = &cli.replace
    {
        let changed = commands::search::replace_all(&mut finder, &document, &request, template)?;
        return Ok(changed > 0);
    }

    let mut printer = Printer::new(io::stdout().lock(), config.output);
    let outcome = commands::search::run(&mut finder, &document, &request, &mut printer)?;
    if config.output == OutputFormat::Json || outcome.wrapped {
        printer.summary(outcome.matches, outcome.total, outcome.wrapped)?;
    }
    log::debug!(
        "searched {} line(s) in {} input(s)",
        document.line_count(),
        document.sources().len()
    );
    Ok(outcome.matches > 0)
}
