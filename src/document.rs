use std::{
    fs,
    io::{self, Read},
    ops::Range,
    path::Path,
};

use anyhow::{Context, Result, bail};
use kfind_search::{Finder, Position, SearchCorpus, SegmentId};

pub const STDIN_NAME: &str = "-";

/// One input file or stdin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    first_segment: SegmentId,
    line_count: usize,
}

impl Source {
    pub fn is_stdin(&self) -> bool {
        self.name == STDIN_NAME
    }

    fn segments(&self) -> Range<SegmentId> {
        self.first_segment..self.first_segment + self.line_count as SegmentId
    }
}

/// Where a segment came from. `line` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Location<'a> {
    pub source: &'a str,
    pub line: usize,
}

/// The loaded inputs, one search segment per line. Segment ids are
/// assigned in input order so corpus order matches reading order.
#[derive(Debug, Default)]
pub struct Document {
    sources: Vec<Source>,
    lines: Vec<String>,
    /// Terminator of each line as read: `"\n"`, `"\r\n"` or empty for a
    /// last line without one. Kept out of the searchable text.
    endings: Vec<&'static str>,
}

fn split_ending(line: &str) -> (&str, &'static str) {
    if let Some(text) = line.strip_suffix("\r\n") {
        (text, "\r\n")
    } else if let Some(text) = line.strip_suffix('\n') {
        (text, "\n")
    } else {
        (line, "")
    }
}

impl Document {
    pub fn load(paths: &[String]) -> Result<Self> {
        let mut document = Self::default();
        if paths.is_empty() {
            document.push_source(STDIN_NAME, read_stdin()?);
            return Ok(document);
        }

        for path in paths {
            let contents = if path == STDIN_NAME {
                read_stdin()?
            } else {
                fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?
            };
            document.push_source(path, contents);
        }
        Ok(document)
    }

    pub fn push_source(&mut self, name: &str, contents: String) {
        let first_segment = self.lines.len() as SegmentId;
        let mut line_count = 0;
        for line in contents.split_inclusive('\n') {
            let (text, ending) = split_ending(line);
            self.lines.push(text.to_string());
            self.endings.push(ending);
            line_count += 1;
        }
        log::debug!("loaded {name}: {line_count} line(s)");

        self.sources.push(Source {
            name: name.to_string(),
            first_segment,
            line_count,
        });
    }

    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Moves every line into `finder` as its own segment.
    pub fn populate(&self, finder: &mut Finder) -> Result<()> {
        for (id, line) in self.lines.iter().enumerate() {
            finder
                .insert(id as SegmentId, line.as_str())
                .with_context(|| format!("failed to add line {}", id + 1))?;
        }
        Ok(())
    }

    pub fn locate(&self, segment: SegmentId) -> Option<Location<'_>> {
        let source = self
            .sources
            .iter()
            .find(|source| source.segments().contains(&segment))?;
        Some(Location {
            source: &source.name,
            line: (segment - source.first_segment) as usize + 1,
        })
    }

    /// Parses `LINE:COL` (both 1-based, COL in bytes) against the first input.
    pub fn position_at(&self, location: &str) -> Result<Position> {
        let Some((line, column)) = location.split_once(':') else {
            bail!("expected LINE:COL, got `{location}`");
        };
        let line: usize = line
            .trim()
            .parse()
            .with_context(|| format!("invalid line in `{location}`"))?;
        let column: usize = column
            .trim()
            .parse()
            .with_context(|| format!("invalid column in `{location}`"))?;
        if line == 0 || column == 0 {
            bail!("line and column start at 1");
        }

        let Some(source) = self.sources.first() else {
            bail!("no input to position in");
        };
        if line > source.line_count {
            bail!("{} has only {} line(s)", source.name, source.line_count);
        }
        Ok(Position::new(
            source.first_segment + (line - 1) as SegmentId,
            column - 1,
        ))
    }

    /// Reassembles a source from the current corpus text, with every line
    /// ending as it was read.
    pub fn render(&self, source: &Source, corpus: &SearchCorpus) -> String {
        let mut out = String::new();
        for id in source.segments() {
            if let Some(segment) = corpus.get(id) {
                out.push_str(segment.text());
            }
            if let Some(ending) = self.endings.get(id as usize) {
                out.push_str(ending);
            }
        }
        out
    }

    /// Whether any line of `source` was rewritten in the corpus.
    pub fn is_modified(&self, source: &Source, corpus: &SearchCorpus) -> bool {
        source
            .segments()
            .any(|id| corpus.get(id).is_some_and(|segment| segment.is_dirty()))
    }

    pub fn write_back(&self, source: &Source, corpus: &SearchCorpus) -> Result<()> {
        let rendered = self.render(source, corpus);
        if source.is_stdin() {
            print!("{rendered}");
            return Ok(());
        }
        fs::write(Path::new(&source.name), rendered)
            .with_context(|| format!("failed to write {}", source.name))
    }
}

fn read_stdin() -> Result<String> {
    let mut contents = String::new();
    io::stdin()
        .read_to_string(&mut contents)
        .context("failed to read stdin")?;
    Ok(contents)
}

#[cfg(test)]
mod tests {
    use super::{Document, Location};
    use kfind_search::{Finder, Position};

    fn document() -> Document {
        let mut document = Document::default();
        document.push_source("a.txt", "one fox\r\ntwo\n".to_string());
        document.push_source("b.txt", "three fox".to_string());
        document
    }

    #[test]
    fn lines_become_segments_in_order() {
        let document = document();
        let mut finder = Finder::new();
        document.populate(&mut finder).unwrap();

        assert_eq!(document.line_count(), 3);
        assert_eq!(finder.corpus().len(), 3);
        assert_eq!(finder.corpus().get(0).unwrap().text(), "one fox");
        assert_eq!(finder.corpus().get(2).unwrap().text(), "three fox");
    }

    #[test]
    fn locate_maps_segments_back_to_sources() {
        let document = document();
        let at = |source, line| Some(Location { source, line });
        assert_eq!(document.locate(1), at("a.txt", 2));
        assert_eq!(document.locate(2), at("b.txt", 1));
        assert_eq!(document.locate(3), None);
    }

    #[test]
    fn position_at_parses_line_and_column() {
        let document = document();
        assert_eq!(document.position_at("2:3").unwrap(), Position::new(1, 2));
        assert!(document.position_at("0:1").is_err());
        assert!(document.position_at("9:1").is_err());
        assert!(document.position_at("nope").is_err());
    }

    #[test]
    fn render_reflects_replaced_lines() {
        let document = document();
        let mut finder = Finder::new();
        document.populate(&mut finder).unwrap();
        finder.replace(0, "one dog").unwrap();

        let sources = document.sources();
        assert!(document.is_modified(&sources[0], finder.corpus()));
        assert!(!document.is_modified(&sources[1], finder.corpus()));
        assert_eq!(document.render(&sources[0], finder.corpus()), "one dog\r\ntwo\n");
        assert_eq!(document.render(&sources[1], finder.corpus()), "three fox");
    }

    #[test]
    fn render_keeps_line_endings() {
        let mut document = Document::default();
        let contents = "crlf\r\nlf\n\r\nlast";
        document.push_source("mixed.txt", contents.to_string());
        let mut finder = Finder::new();
        document.populate(&mut finder).unwrap();

        assert_eq!(finder.corpus().len(), 4);
        assert_eq!(finder.corpus().get(0).unwrap().text(), "crlf");
        assert_eq!(finder.corpus().get(2).unwrap().text(), "");
        let rendered = document.render(&document.sources()[0], finder.corpus());
        assert_eq!(rendered, contents);
    }
}
