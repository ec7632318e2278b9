use std::{collections::HashSet, io::Write};

use anyhow::{Context, Result};
use kfind_search::{FindOptions, Finder, Match, Position};

use crate::document::Document;
use crate::output::{MatchRecord, Printer};

#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    pub pattern: String,
    pub options: FindOptions,
    pub anchor: Option<Position>,
    pub wrap: bool,
    pub replace: Option<String>,
    pub context: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchOutcome {
    pub matches: usize,
    /// Matches in the whole input, whatever the anchor.
    pub total: usize,
    pub wrapped: bool,
}

fn prepare(finder: &mut Finder, request: &SearchRequest) -> Result<()> {
    finder.set_options(request.options)?;
    finder.set_anchor(request.anchor);
    finder
        .set_pattern(&request.pattern)
        .with_context(|| format!("invalid pattern `{}`", request.pattern))
}

/// Steps through the matches one `advance` at a time, printing each.
///
/// With `wrap`, a scan that started at the anchor continues from the top
/// of the input once it runs out, and stops at the first match it has
/// already reported.
pub fn run<W: Write>(
    finder: &mut Finder,
    document: &Document,
    request: &SearchRequest,
    printer: &mut Printer<W>,
) -> Result<SearchOutcome> {
    prepare(finder, request)?;

    let mut all = finder.find_all()?;
    let mut seen: HashSet<Match> = HashSet::new();
    let mut outcome = SearchOutcome {
        total: all.count(),
        ..SearchOutcome::default()
    };
    loop {
        let Some(found) = finder.advance()? else {
            let from_anchor = finder.session().options().uses_anchor()
                && finder.session().anchor().is_some();
            if request.wrap && !outcome.wrapped && from_anchor {
                log::debug!("reached the end of the input, wrapping around");
                outcome.wrapped = true;
                finder.set_options(
                    request.options - (FindOptions::FROM_CURSOR | FindOptions::SELECTED_TEXT),
                )?;
                finder.restart();
                continue;
            }
            break;
        };
        if !seen.insert(found) {
            break;
        }
        outcome.matches += 1;

        let replacement = match &request.replace {
            Some(template) => Some(finder.replacement(template)?),
            None => None,
        };
        let ordinal = all.select(found);
        report(finder, document, request, printer, found, ordinal, replacement)?;
    }

    log::debug!(
        "{} match(es), {} segment(s) scanned on the last step",
        outcome.matches,
        finder.stats().segments_scanned
    );
    Ok(outcome)
}

fn report<W: Write>(
    finder: &Finder,
    document: &Document,
    request: &SearchRequest,
    printer: &mut Printer<W>,
    found: Match,
    ordinal: Option<usize>,
    replacement: Option<String>,
) -> Result<()> {
    let segment = finder
        .corpus()
        .get(found.segment())
        .with_context(|| format!("match in unknown segment {}", found.segment()))?;
    let location = document
        .locate(found.segment())
        .with_context(|| format!("no source for segment {}", found.segment()))?;

    printer.record(&MatchRecord {
        path: location.source,
        line: location.line,
        column: found.index() + 1,
        length: found.length(),
        matched: &segment.text()[found.range()],
        line_text: request.context.then_some(segment.text()),
        ordinal,
        replacement,
    })
}

/// Number of matches in the whole input.
pub fn count(finder: &mut Finder, request: &SearchRequest) -> Result<usize> {
    prepare(finder, request)?;
    Ok(finder.find_all()?.count())
}

/// Applies the replacement to every match and writes changed sources back.
/// Returns how many lines changed.
pub fn replace_all(
    finder: &mut Finder,
    document: &Document,
    request: &SearchRequest,
    template: &str,
) -> Result<usize> {
    prepare(finder, request)?;

    let mut changed = 0;
    for (id, text) in finder.replace_all(template)? {
        if finder.replace(id, text)? {
            changed += 1;
        }
    }

    for source in document.sources() {
        if source.is_stdin() || document.is_modified(source, finder.corpus()) {
            document.write_back(source, finder.corpus())?;
        }
    }
    log::info!("rewrote {changed} line(s)");
    Ok(changed)
}
