//! Recognition-site patterns and occurrence scanning on both strands.

use crate::{
    error::{GenedomError, Result},
    iupac_code::IupacCode,
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Strand {
    Forward,
    Reverse,
}

/// A named recognition pattern, possibly degenerate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SitePattern {
    name: String,
    sequence: String,
    forward: Vec<IupacCode>,
    reverse: Vec<IupacCode>,
    is_palindromic: bool,
}

impl SitePattern {
    pub fn new(name: &str, sequence: &str) -> Result<Self> {
        let sequence = sequence.trim().to_ascii_uppercase();
        if sequence.is_empty() {
            return Err(GenedomError::invalid_configuration(
                "site",
                format!("empty pattern for '{name}'"),
            ));
        }
        if let Some(c) = sequence.bytes().find(|c| *c == b'U' || !IupacCode::is_valid_letter(*c)) {
            return Err(GenedomError::invalid_configuration(
                "site",
                format!("'{}' is not an IUPAC letter in '{name}'", c as char),
            ));
        }
        let forward: Vec<IupacCode> = sequence.bytes().map(IupacCode::from_letter).collect();
        let reverse: Vec<IupacCode> = forward.iter().rev().map(|c| c.complement()).collect();
        let is_palindromic = forward == reverse;
        Ok(Self {
            name: name.to_string(),
            sequence,
            forward,
            reverse,
            is_palindromic,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sequence(&self) -> &str {
        &self.sequence
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    pub fn is_palindromic(&self) -> bool {
        self.is_palindromic
    }

    fn codes(&self, strand: Strand) -> &[IupacCode] {
        match strand {
            Strand::Forward => &self.forward,
            Strand::Reverse => &self.reverse,
        }
    }

    /// Does the pattern match at `position`? On the reverse strand this tests the
    /// reverse complement of the pattern against the forward sequence.
    pub fn matches(&self, sequence: &[u8], position: usize, strand: Strand) -> bool {
        let codes = self.codes(strand);
        match sequence.get(position..position + codes.len()) {
            Some(window) => codes
                .iter()
                .zip(window)
                .all(|(code, base)| code.matches_base(*base)),
            None => false,
        }
    }

    /// Would `base` at `offset` within the pattern still satisfy it on `strand`?
    pub fn accepts(&self, offset: usize, base: u8, strand: Strand) -> bool {
        self.codes(strand)
            .get(offset)
            .is_some_and(|code| code.matches_base(base))
    }

    fn strands(&self) -> &'static [Strand] {
        if self.is_palindromic {
            &[Strand::Forward]
        } else {
            &[Strand::Forward, Strand::Reverse]
        }
    }
}

/// One match of a site in a sequence, `start..end` on the forward coordinates.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SiteOccurrence {
    pub site: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
}

impl SiteOccurrence {
    pub fn overlaps(&self, range: &Range<usize>) -> bool {
        self.start < range.end && range.start < self.end
    }

    pub fn within(&self, range: &Range<usize>) -> bool {
        range.start <= self.start && self.end <= range.end
    }

    /// True if the occurrence covers the boundary between `boundary - 1` and `boundary`.
    pub fn spans(&self, boundary: usize) -> bool {
        self.start < boundary && boundary < self.end
    }
}

/// Sites that must not occur. Names are unique; the first definition wins.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ForbiddenSiteSet {
    sites: Vec<SitePattern>,
}

impl ForbiddenSiteSet {
    pub fn new(sites: impl IntoIterator<Item = SitePattern>) -> Self {
        let mut ret = Self::default();
        ret.extend(sites);
        ret
    }

    /// Builds a set from `(name, pattern)` pairs.
    pub fn from_patterns<'a>(
        patterns: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self> {
        let sites = patterns
            .into_iter()
            .map(|(name, sequence)| SitePattern::new(name, sequence))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(sites))
    }

    pub fn extend(&mut self, sites: impl IntoIterator<Item = SitePattern>) {
        for site in sites {
            if !self.sites.iter().any(|s| s.name == site.name) {
                self.sites.push(site);
            }
        }
    }

    pub fn union(&self, other: &ForbiddenSiteSet) -> Self {
        let mut ret = self.clone();
        ret.extend(other.sites.iter().cloned());
        ret
    }

    pub fn sites(&self) -> &[SitePattern] {
        &self.sites
    }

    pub fn names(&self) -> Vec<&str> {
        self.sites.iter().map(|s| s.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn max_site_len(&self) -> usize {
        self.sites.iter().map(|s| s.len()).max().unwrap_or(0)
    }

    pub fn get(&self, name: &str) -> Option<&SitePattern> {
        self.sites.iter().find(|s| s.name == name)
    }

    /// Every occurrence of every site on both strands, overlapping matches included,
    /// ordered by start, then site order in the set, then strand.
    pub fn find_all(&self, sequence: &[u8]) -> Vec<SiteOccurrence> {
        self.find_starting_in(sequence, 0..sequence.len())
    }

    /// Occurrences lying completely inside `window`.
    pub fn find_in_window(&self, sequence: &[u8], window: Range<usize>) -> Vec<SiteOccurrence> {
        let end = window.end.min(sequence.len());
        self.find_starting_in(&sequence[..end], window.start..end)
    }

    /// Occurrences sharing at least one base with `window`.
    pub fn find_overlapping(&self, sequence: &[u8], window: Range<usize>) -> Vec<SiteOccurrence> {
        let reach = self.max_site_len().saturating_sub(1);
        let from = window.start.saturating_sub(reach);
        self.find_starting_in(sequence, from..window.end.min(sequence.len()))
            .into_iter()
            .filter(|o| o.overlaps(&window))
            .collect()
    }

    /// True if any site occurs anywhere in the sequence.
    pub fn any_match(&self, sequence: &[u8]) -> bool {
        (0..sequence.len()).any(|start| {
            self.sites
                .iter()
                .any(|site| site.strands().iter().any(|&st| site.matches(sequence, start, st)))
        })
    }

    fn find_starting_in(&self, sequence: &[u8], starts: Range<usize>) -> Vec<SiteOccurrence> {
        let mut ret = vec![];
        for start in starts {
            for site in &self.sites {
                for &strand in site.strands() {
                    if site.matches(sequence, start, strand) {
                        ret.push(SiteOccurrence {
                            site: site.name.to_owned(),
                            start,
                            end: start + site.len(),
                            strand,
                        });
                    }
                }
            }
        }
        ret
    }
}
