use anyhow::{Context, Result};
use kfind_search::{FindOptions, Finder, Placeholder};

/// Placeholder menu entries for `pattern`. Only regular expressions have
/// captured groups.
pub fn entries(pattern: Option<&str>, options: FindOptions) -> Result<Vec<Placeholder>> {
    let mut finder = Finder::new();
    finder.set_options(options)?;
    if let Some(pattern) = pattern {
        finder
            .set_pattern(pattern)
            .with_context(|| format!("invalid pattern `{pattern}`"))?;
    }
    Ok(finder.placeholders())
}

pub fn run(pattern: Option<&str>, options: FindOptions) -> Result<()> {
    for placeholder in entries(pattern, options)? {
        println!("{:<4} {}", placeholder.token(), placeholder.label);
    }
    Ok(())
}
