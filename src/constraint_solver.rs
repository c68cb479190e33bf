//! Local search removing forbidden sites with single-base substitutions.
//!
//! The solver repeatedly takes the leftmost remaining occurrence, lists every
//! substitution inside it that breaks the match (and keeps the encoded protein,
//! if requested), picks the candidate leaving the fewest occurrences around the
//! edited base, and rescans only that neighbourhood. Nothing here is random: the
//! same input always yields the same mutation list.

use crate::{
    dna_sequence::{DNAsequence, Mutation},
    error::{GenedomError, Result},
    genetic_code,
    iupac_code::DNA_BASES,
    site_pattern::{ForbiddenSiteSet, SiteOccurrence, Strand},
};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, ops::Range};

/// What must survive the edits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreservationConstraint {
    #[default]
    None,
    /// The protein read from `frame_offset` (complete codons only) must not change.
    /// Bases outside complete codons are never edited.
    Translation { frame_offset: usize },
}

impl PreservationConstraint {
    pub fn coding(is_cds: bool) -> Self {
        if is_cds {
            Self::Translation { frame_offset: 0 }
        } else {
            Self::None
        }
    }

    fn allows(&self, sequence: &[u8], position: usize, base: u8) -> bool {
        match self {
            Self::None => true,
            Self::Translation { frame_offset } => {
                genetic_code::is_synonymous(sequence, *frame_offset, position, base)
            }
        }
    }
}

/// Order among equally good substitutions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TieBreak {
    /// Lowest position first, then lexicographically smallest new base.
    #[default]
    PositionThenBase,
    /// Lexicographically smallest new base first, then lowest position.
    BaseThenPosition,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    /// Hard cap on applied substitutions before giving up.
    pub max_mutations: usize,
    pub tie_break: TieBreak,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_mutations: 1000,
            tie_break: TieBreak::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnresolvedReason {
    /// Every base of the site is pinned by the preservation constraint.
    NoConstraintPreservingEscape,
    /// The pattern accepts every base at every position, no substitution can break it.
    NoEscape,
    /// The mutation budget ran out first.
    BudgetExhausted,
    /// The part needs edits but edits were disabled.
    EditsNotAllowed,
}

impl UnresolvedReason {
    pub fn describe(&self) -> &'static str {
        match self {
            Self::NoConstraintPreservingEscape => "no constraint-preserving escape",
            Self::NoEscape => "no substitution breaks the site",
            Self::BudgetExhausted => "mutation budget exhausted",
            Self::EditsNotAllowed => "edits not allowed",
        }
    }
}

/// A forbidden occurrence still present when the solver gave up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedSite {
    pub site: String,
    pub start: usize,
    pub end: usize,
    pub strand: Strand,
    pub reason: UnresolvedReason,
}

impl UnresolvedSite {
    pub fn new(occurrence: &SiteOccurrence, reason: UnresolvedReason) -> Self {
        Self {
            site: occurrence.site.to_owned(),
            start: occurrence.start,
            end: occurrence.end,
            strand: occurrence.strand,
            reason,
        }
    }
}

impl std::fmt::Display for UnresolvedSite {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{} at {}..{} ({:?}): {}",
            self.site,
            self.start,
            self.end,
            self.strand,
            self.reason.describe()
        )
    }
}

type OccurrenceKey = (usize, String, Strand);

fn key(o: &SiteOccurrence) -> OccurrenceKey {
    (o.start, o.site.to_owned(), o.strand)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Candidate {
    cost: usize,
    position: usize,
    base: u8,
}

pub struct ConstraintSolver<'a> {
    sites: &'a ForbiddenSiteSet,
    preservation: PreservationConstraint,
    window: Option<Range<usize>>,
    settings: SolverSettings,
}

impl<'a> ConstraintSolver<'a> {
    pub fn new(sites: &'a ForbiddenSiteSet) -> Self {
        Self {
            sites,
            preservation: PreservationConstraint::None,
            window: None,
            settings: SolverSettings::default(),
        }
    }

    pub fn with_preservation(mut self, preservation: PreservationConstraint) -> Self {
        self.preservation = preservation;
        self
    }

    /// Only occurrences lying fully inside `window` are forbidden, and only bases
    /// inside it are edited.
    pub fn with_window(mut self, window: Range<usize>) -> Self {
        self.window = Some(window);
        self
    }

    pub fn with_settings(mut self, settings: SolverSettings) -> Self {
        self.settings = settings;
        self
    }

    fn window_for(&self, len: usize) -> Range<usize> {
        match &self.window {
            Some(w) => w.start.min(len)..w.end.min(len),
            None => 0..len,
        }
    }

    /// Forbidden occurrences the solver would have to remove.
    pub fn occurrences(&self, sequence: &DNAsequence) -> Vec<SiteOccurrence> {
        let window = self.window_for(sequence.len());
        self.sites.find_in_window(sequence.forward(), window)
    }

    /// The substitutions, in application order, that clear every forbidden
    /// occurrence. Fails with `InfeasibleConstraint` listing what is left.
    pub fn solve(&self, sequence: &DNAsequence) -> Result<Vec<Mutation>> {
        let window = self.window_for(sequence.len());
        let mut seq = sequence.forward().to_vec();
        let mut occurrences = self.sites.find_in_window(&seq, window.clone());
        if occurrences.is_empty() {
            return Ok(vec![]);
        }

        let mut mutations: Vec<Mutation> = vec![];
        let mut given_up: HashMap<OccurrenceKey, UnresolvedReason> = HashMap::new();

        loop {
            let Some(target) = occurrences
                .iter()
                .find(|o| !given_up.contains_key(&key(o)))
                .cloned()
            else {
                break;
            };

            if mutations.len() >= self.settings.max_mutations {
                log::debug!(
                    "Mutation budget of {} exhausted with {} site(s) left",
                    self.settings.max_mutations,
                    occurrences.len()
                );
                break;
            }

            let (best, breakable) = self.best_candidate(&mut seq, &target, &window);
            let Some(best) = best else {
                let reason = match breakable {
                    true => UnresolvedReason::NoConstraintPreservingEscape,
                    false => UnresolvedReason::NoEscape,
                };
                log::debug!("Giving up on {} at {}: {}", target.site, target.start, reason.describe());
                given_up.insert(key(&target), reason);
                continue;
            };

            let mutation = Mutation::new(best.position, seq[best.position], best.base);
            log::debug!("Breaking {} at {} with {mutation}", target.site, target.start);
            seq[best.position] = best.base;
            mutations.push(mutation);
            self.rescan(&seq, best.position, &window, &mut occurrences);
        }

        // The incremental bookkeeping must agree with a full scan.
        let remaining = self.sites.find_in_window(&seq, window);
        if remaining.is_empty() {
            return Ok(mutations);
        }
        let unresolved = remaining
            .iter()
            .map(|o| {
                let reason = given_up
                    .get(&key(o))
                    .copied()
                    .unwrap_or(UnresolvedReason::BudgetExhausted);
                UnresolvedSite::new(o, reason)
            })
            .collect();
        Err(GenedomError::InfeasibleConstraint { unresolved })
    }

    /// The cheapest preserving escape, and whether any substitution in the
    /// window breaks the site at all.
    fn best_candidate(
        &self,
        seq: &mut [u8],
        target: &SiteOccurrence,
        window: &Range<usize>,
    ) -> (Option<Candidate>, bool) {
        let Some(site) = self.sites.get(&target.site) else {
            return (None, false);
        };
        let reach = self.sites.max_site_len().saturating_sub(1);
        let neighbourhood =
            target.start.saturating_sub(reach)..(target.end + reach).min(seq.len());
        let mut best: Option<Candidate> = None;
        let mut breakable = false;
        for position in target.start.max(window.start)..target.end.min(window.end) {
            let original = seq[position];
            for base in DNA_BASES {
                if base == original || site.accepts(position - target.start, base, target.strand) {
                    continue;
                }
                breakable = true;
                if !self.preservation.allows(seq, position, base) {
                    continue;
                }
                seq[position] = base;
                let cost = self
                    .sites
                    .find_overlapping(seq, neighbourhood.clone())
                    .iter()
                    .filter(|o| o.within(window))
                    .count();
                seq[position] = original;

                let candidate = Candidate {
                    cost,
                    position,
                    base,
                };
                if best.is_none_or(|b| self.is_better(&candidate, &b)) {
                    best = Some(candidate);
                }
            }
        }
        (best, breakable)
    }

    fn is_better(&self, a: &Candidate, b: &Candidate) -> bool {
        let order = match self.settings.tie_break {
            TieBreak::PositionThenBase => (a.cost, a.position, a.base).cmp(&(b.cost, b.position, b.base)),
            TieBreak::BaseThenPosition => (a.cost, a.base, a.position).cmp(&(b.cost, b.base, b.position)),
        };
        order.is_lt()
    }

    /// Replaces every occurrence touching `position` with a fresh local scan.
    fn rescan(
        &self,
        seq: &[u8],
        position: usize,
        window: &Range<usize>,
        occurrences: &mut Vec<SiteOccurrence>,
    ) {
        let touched = position..position + 1;
        occurrences.retain(|o| !o.overlaps(&touched));
        occurrences.extend(
            self.sites
                .find_overlapping(seq, touched)
                .into_iter()
                .filter(|o| o.within(window)),
        );
        let order: HashMap<&str, usize> = self
            .sites
            .names()
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();
        occurrences.sort_by_key(|o| (o.start, order.get(o.site.as_str()).copied(), o.strand));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENZYMES;

    fn sites(patterns: &[(&str, &str)]) -> ForbiddenSiteSet {
        ForbiddenSiteSet::from_patterns(patterns.iter().copied()).unwrap()
    }

    fn dna(s: &str) -> DNAsequence {
        DNAsequence::from_sequence(s).unwrap()
    }

    #[test]
    fn test_clean_sequence_fast_path() {
        let forbidden = sites(&[("HindIII", "AAGCTT")]);
        let mutations = ConstraintSolver::new(&forbidden)
            .solve(&dna("ACGTACGTACGT"))
            .unwrap();
        assert!(mutations.is_empty());
    }

    #[test]
    fn test_hindiii_single_mutation() {
        let forbidden = sites(&[("HindIII", "AAGCTT")]);
        let seq = dna("AAGAAGCTTAAG");
        let mutations = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        assert_eq!(mutations, vec![Mutation::new(3, b'A', b'C')]);
        let edited = seq.with_mutations(&mutations).unwrap();
        assert_eq!(edited.get_forward_string(), "AAGCAGCTTAAG");
        assert!(forbidden.find_all(edited.forward()).is_empty());
        assert!(forbidden.find_all(edited.reverse_complement().forward()).is_empty());
    }

    #[test]
    fn test_reverse_strand_site() {
        let forbidden = ENZYMES.forbidden_sites(&["BsaI"]).unwrap();
        let seq = dna("TTTGAGACCTTT");
        let mutations = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        assert_eq!(mutations.len(), 1);
        let edited = seq.with_mutations(&mutations).unwrap();
        assert!(forbidden.find_all(edited.forward()).is_empty());
    }

    #[test]
    fn test_avoids_creating_new_sites() {
        let forbidden = sites(&[("EcoRI", "GAATTC"), ("HindIII", "AAGCTT"), ("BamHI", "GGATCC")]);
        let seq = dna("AAGCTTGAATTCGGATCCAAGCTT");
        let mutations = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        let edited = seq.with_mutations(&mutations).unwrap();
        assert!(forbidden.find_all(edited.forward()).is_empty());
        assert_eq!(mutations.len(), 4);
    }

    #[test]
    fn test_overlapping_sites_one_edit() {
        let forbidden = sites(&[("A5", "AAAAA")]);
        let seq = dna("AAAAAA");
        let mutations = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        // A single base in the shared core breaks both overlapping matches.
        assert_eq!(mutations, vec![Mutation::new(1, b'A', b'C')]);
    }

    #[test]
    fn test_translation_preserved() {
        let forbidden = ENZYMES.forbidden_sites(&["BsaI", "BsmBI", "HindIII"]).unwrap();
        // AAGCTT, GGTCTC, GAGACG and CGTCTC, all in frame 0.
        let seq = dna("ATGAAGCTTGGTCTCCTGGAGACGTCTCGCGTAA");
        let preservation = PreservationConstraint::Translation { frame_offset: 0 };
        let mutations = ConstraintSolver::new(&forbidden)
            .with_preservation(preservation)
            .solve(&seq)
            .unwrap();
        assert!(!mutations.is_empty());
        let edited = seq.with_mutations(&mutations).unwrap();
        assert!(forbidden.find_all(edited.forward()).is_empty());
        assert_eq!(
            genetic_code::translate(edited.forward(), 0),
            genetic_code::translate(seq.forward(), 0)
        );
    }

    #[test]
    fn test_no_constraint_preserving_escape() {
        // ATG TGG (Met Trp) has no synonymous codon at all.
        let forbidden = sites(&[("MW", "ATGTGG")]);
        let seq = dna("ATGTGG");
        let err = ConstraintSolver::new(&forbidden)
            .with_preservation(PreservationConstraint::Translation { frame_offset: 0 })
            .solve(&seq)
            .unwrap_err();
        match err {
            GenedomError::InfeasibleConstraint { unresolved } => {
                assert_eq!(unresolved.len(), 1);
                assert_eq!(unresolved[0].site, "MW");
                assert_eq!(unresolved[0].start, 0);
                assert_eq!(unresolved[0].reason, UnresolvedReason::NoConstraintPreservingEscape);
            }
            other => panic!("unexpected {other:?}"),
        }
        // Without the constraint it is trivial.
        assert!(ConstraintSolver::new(&forbidden).solve(&seq).is_ok());
    }

    #[test]
    fn test_reports_all_unresolved() {
        let forbidden = sites(&[("NNN", "NNN"), ("MW", "ATGTGG")]);
        let err = ConstraintSolver::new(&forbidden)
            .with_preservation(PreservationConstraint::Translation { frame_offset: 0 })
            .solve(&dna("ATGTGG"))
            .unwrap_err();
        let GenedomError::InfeasibleConstraint { unresolved } = err else {
            panic!("expected infeasible");
        };
        assert_eq!(unresolved.len(), 5);
        for u in &unresolved {
            let expected = match u.site.as_str() {
                "MW" => UnresolvedReason::NoConstraintPreservingEscape,
                _ => UnresolvedReason::NoEscape,
            };
            assert_eq!(u.reason, expected, "{u}");
        }
        assert!(unresolved.iter().any(|u| u.site == "MW"));
    }

    #[test]
    fn test_unbreakable_site_is_no_escape_under_translation() {
        let forbidden = sites(&[("NNNN", "NNNN")]);
        let err = ConstraintSolver::new(&forbidden)
            .with_preservation(PreservationConstraint::Translation { frame_offset: 0 })
            .solve(&dna("GCTGCTGCT"))
            .unwrap_err();
        let GenedomError::InfeasibleConstraint { unresolved } = err else {
            panic!("expected infeasible");
        };
        assert_eq!(unresolved.len(), 6);
        assert!(unresolved.iter().all(|u| u.reason == UnresolvedReason::NoEscape));
    }

    #[test]
    fn test_budget_exhausted() {
        let forbidden = sites(&[("HindIII", "AAGCTT")]);
        let settings = SolverSettings {
            max_mutations: 1,
            ..SolverSettings::default()
        };
        let err = ConstraintSolver::new(&forbidden)
            .with_settings(settings)
            .solve(&dna("AAGCTTAAGCTT"))
            .unwrap_err();
        let GenedomError::InfeasibleConstraint { unresolved } = err else {
            panic!("expected infeasible");
        };
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].start, 6);
        assert_eq!(unresolved[0].reason, UnresolvedReason::BudgetExhausted);
    }

    #[test]
    fn test_window() {
        let forbidden = sites(&[("EcoRI", "GAATTC")]);
        let seq = dna("GAATTCAAAGAATTC");
        let mutations = ConstraintSolver::new(&forbidden)
            .with_window(6..15)
            .solve(&seq)
            .unwrap();
        assert_eq!(mutations.len(), 1);
        assert!(mutations[0].position >= 9);
        let edited = seq.with_mutations(&mutations).unwrap();
        assert_eq!(forbidden.find_all(edited.forward()).len(), 1);
    }

    #[test]
    fn test_tie_break_policy() {
        let forbidden = sites(&[("HindIII", "AAGCTT")]);
        let seq = dna("AAGCTT");
        let settings = SolverSettings {
            tie_break: TieBreak::BaseThenPosition,
            ..SolverSettings::default()
        };
        let mutations = ConstraintSolver::new(&forbidden)
            .with_settings(settings)
            .solve(&seq)
            .unwrap();
        // Smallest base overall is A, first usable at position 2 (G -> A).
        assert_eq!(mutations, vec![Mutation::new(2, b'G', b'A')]);
    }

    #[test]
    fn test_deterministic() {
        let forbidden = ENZYMES.forbidden_sites(&["BsaI", "BsmBI", "BbsI", "EcoRI"]).unwrap();
        let seq = dna("GGTCTCGAAGACGAATTCCGTCTCGAGACCGTCTTC");
        let a = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        let b = ConstraintSolver::new(&forbidden).solve(&seq).unwrap();
        assert_eq!(a, b);
    }
}
