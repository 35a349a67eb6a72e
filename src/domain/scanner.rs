//! Line scanner that finds the content to redact.
//!
//! A [`ContentQuery`] walks the lines of extracted page text and yields the
//! first pattern match of every line inside the active region. The region is
//! opened by a line containing the start marker (that line is scanned) and
//! closed after a line containing the end marker (that line is scanned too).
//! Matches covered by the skip list are dropped.

use regex::Regex;

use crate::error::{ManagerError, ManagerResult};

/// Search configuration for content redaction.
#[derive(Debug, Clone)]
pub struct ContentQuery {
    pattern: Regex,
    region_start: Option<String>,
    region_end: Option<String>,
    skip: Vec<String>,
    skip_exact: bool,
}

impl ContentQuery {
    /// Compiles `pattern` into a query that scans every line.
    pub fn new(pattern: &str) -> ManagerResult<Self> {
        let pattern = Regex::new(pattern).map_err(|e| ManagerError::Pattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            pattern,
            region_start: None,
            region_end: None,
            skip: Vec::new(),
            skip_exact: false,
        })
    }

    /// Scanning stays inactive until a line contains `marker`.
    ///
    /// An empty marker is the same as no marker.
    pub fn starting_at(mut self, marker: impl Into<String>) -> Self {
        self.region_start = Some(marker.into()).filter(|m: &String| !m.is_empty());
        self
    }

    /// Scanning stops after a line containing `marker`.
    ///
    /// An empty marker is the same as no marker.
    pub fn ending_at(mut self, marker: impl Into<String>) -> Self {
        self.region_end = Some(marker.into()).filter(|m: &String| !m.is_empty());
        self
    }

    /// Adds strings whose matches are never yielded.
    pub fn skipping<I, S>(mut self, skip: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.skip.extend(skip.into_iter().map(Into::into));
        self
    }

    /// Compares skip entries against whole matches instead of substrings.
    pub fn skip_exact(mut self, exact: bool) -> Self {
        self.skip_exact = exact;
        self
    }

    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    /// Scans `lines` lazily. Each call starts a fresh scan.
    pub fn scan<'q, 'l, I>(&'q self, lines: I) -> Matches<'q, 'l, I::IntoIter>
    where
        I: IntoIterator<Item = &'l str>,
    {
        Matches {
            query: self,
            lines: lines.into_iter(),
            active: self.region_start.is_none(),
        }
    }

    fn is_skipped(&self, found: &str) -> bool {
        if self.skip_exact {
            self.skip.iter().any(|entry| entry == found)
        } else {
            self.skip.iter().any(|entry| found.contains(entry.as_str()))
        }
    }
}

/// Lazy iterator over the matches of a [`ContentQuery`].
#[derive(Debug)]
pub struct Matches<'q, 'l, I>
where
    I: Iterator<Item = &'l str>,
{
    query: &'q ContentQuery,
    lines: I,
    active: bool,
}

impl<'l, I> Iterator for Matches<'_, 'l, I>
where
    I: Iterator<Item = &'l str>,
{
    type Item = &'l str;

    fn next(&mut self) -> Option<Self::Item> {
        for line in self.lines.by_ref() {
            if !self.active {
                match &self.query.region_start {
                    Some(start) if line.contains(start.as_str()) => self.active = true,
                    _ => continue,
                }
            }

            let found = self
                .query
                .pattern
                .find(line)
                .map(|m| m.as_str())
                .filter(|found| !self.query.is_skipped(found));

            if let Some(end) = &self.query.region_end {
                if line.contains(end.as_str()) {
                    self.active = false;
                }
            }

            if found.is_some() {
                return found;
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, self.lines.size_hint().1)
    }
}
