use std::{
    env, fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use kfind_search::FindOptions;

pub const DEFAULT_CONFIG: &str = "# Default search options, overridden by command line flags\n\
# Match letter case exactly\n\
case_sensitive = false\n\
# Only match whole words\n\
whole_words = false\n\
# Treat the pattern as a regular expression\n\
regex = false\n\
# Search from the end towards the start\n\
backwards = false\n\
# Start over from the top once the end is reached\n\
# wrap = false\n\
# Expand \\N placeholders in replacement text\n\
# placeholders = false\n\
# Output format (plain|json)\n\
# output = plain\n\
# Print the matched line after each match location\n\
# context = true\n";

const VALID_KEYS: &[&str] = &[
    "case_sensitive",
    "whole_words",
    "regex",
    "backwards",
    "wrap",
    "placeholders",
    "output",
    "context",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Plain,
    Json,
}

impl OutputFormat {
    fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "plain" | "text" => Some(Self::Plain),
            "json" => Some(Self::Json),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Plain => "plain",
            Self::Json => "json",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub case_sensitive: bool,
    pub whole_words: bool,
    pub regex: bool,
    pub backwards: bool,
    pub wrap: bool,
    pub placeholders: bool,
    pub output: OutputFormat,
    pub context: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            whole_words: false,
            regex: false,
            backwards: false,
            wrap: false,
            placeholders: false,
            output: OutputFormat::Plain,
            context: true,
        }
    }
}

impl AppConfig {
    /// Reads `path` when given, otherwise the default location. A missing
    /// default file means built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            return Ok(Self::from_contents(&contents));
        }

        let Some(path) = config_path() else {
            return Ok(Self::default());
        };
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Self::from_contents(&contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => {
                Err(e).with_context(|| format!("failed to read config file {}", path.display()))
            }
        }
    }

    pub fn from_contents(contents: &str) -> Self {
        let mut config = Self::default();

        for (line_number, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                log::warn!("config line {}: expected `key = value`", line_number + 1);
                continue;
            };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            if !VALID_KEYS.contains(&key.as_str()) {
                log::warn!("config line {}: unknown key `{}`", line_number + 1, key);
                continue;
            }

            if key == "output" {
                match OutputFormat::from_str(value) {
                    Some(output) => config.output = output,
                    None => {
                        log::warn!("config line {}: invalid output `{value}`", line_number + 1)
                    }
                }
                continue;
            }

            let Some(flag) = parse_bool(value) else {
                log::warn!("config line {}: `{}` is not a boolean", line_number + 1, value);
                continue;
            };
            match key.as_str() {
                "case_sensitive" => config.case_sensitive = flag,
                "whole_words" => config.whole_words = flag,
                "regex" => config.regex = flag,
                "backwards" => config.backwards = flag,
                "wrap" => config.wrap = flag,
                "placeholders" => config.placeholders = flag,
                "context" => config.context = flag,
                _ => {}
            }
        }

        config
    }

    pub fn find_options(&self) -> FindOptions {
        let mut options = FindOptions::empty();
        options.set(FindOptions::CASE_SENSITIVE, self.case_sensitive);
        options.set(FindOptions::WHOLE_WORDS_ONLY, self.whole_words);
        options.set(FindOptions::REGULAR_EXPRESSION, self.regex);
        options.set(FindOptions::FIND_BACKWARDS, self.backwards);
        options.set(FindOptions::BACK_REFERENCE, self.placeholders);
        options
    }

    /// The effective settings in config file syntax.
    pub fn to_contents(&self) -> String {
        format!(
            "case_sensitive = {}\n\
             whole_words = {}\n\
             regex = {}\n\
             backwards = {}\n\
             wrap = {}\n\
             placeholders = {}\n\
             output = {}\n\
             context = {}\n",
            self.case_sensitive,
            self.whole_words,
            self.regex,
            self.backwards,
            self.wrap,
            self.placeholders,
            self.output.as_str(),
            self.context,
        )
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn config_path() -> Option<PathBuf> {
    if let Ok(xdg_config_home) = env::var("XDG_CONFIG_HOME")
        && !xdg_config_home.trim().is_empty()
    {
        return Some(Path::new(&xdg_config_home).join("kfind/config.txt"));
    }

    dirs::home_dir().map(|home| home.join(".config").join("kfind").join("config.txt"))
}

/// Writes the default config file if there is none yet.
pub fn ensure_config_file() -> Result<PathBuf> {
    let path = config_path().context("could not determine config directory")?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&path, DEFAULT_CONFIG)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(path)
}
