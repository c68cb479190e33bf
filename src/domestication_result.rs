use crate::{
    constraint_solver::UnresolvedSite,
    dna_sequence::{DNAsequence, Mutation},
    error::{GenedomError, Result},
    site_pattern::SiteOccurrence,
};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fmt};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlankSide {
    Left,
    Right,
}

/// A fixed sequence added to one end of a part after all internal edits.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flank {
    pub label: String,
    pub side: FlankSide,
    pub sequence: String,
}

impl Flank {
    pub fn new(label: &str, side: FlankSide, sequence: &str) -> Result<Self> {
        let dna = DNAsequence::from_sequence(sequence)?;
        Ok(Self {
            label: label.to_string(),
            side,
            sequence: dna.get_forward_string(),
        })
    }

    pub fn left(label: &str, sequence: &str) -> Result<Self> {
        Self::new(label, FlankSide::Left, sequence)
    }

    pub fn right(label: &str, sequence: &str) -> Result<Self> {
        Self::new(label, FlankSide::Right, sequence)
    }

    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }
}

/// Why a part could not be domesticated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum FailureReason {
    Alphabet { position: usize, letter: char },
    Infeasible { unresolved: Vec<UnresolvedSite> },
    JunctionCollision { occurrences: Vec<SiteOccurrence> },
    UnknownSlot { slot: String },
    Error { message: String },
}

impl From<GenedomError> for FailureReason {
    fn from(err: GenedomError) -> Self {
        match err {
            GenedomError::Alphabet { position, letter } => Self::Alphabet { position, letter },
            GenedomError::InfeasibleConstraint { unresolved } => Self::Infeasible { unresolved },
            GenedomError::JunctionCollision { occurrences } => Self::JunctionCollision { occurrences },
            GenedomError::UnknownSlot(slot) => Self::UnknownSlot { slot },
            other => Self::Error {
                message: other.to_string(),
            },
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Alphabet { position, letter } => {
                write!(f, "invalid base '{letter}' at position {position}")
            }
            Self::Infeasible { unresolved } => {
                let sites: Vec<String> = unresolved.iter().map(|u| u.to_string()).collect();
                write!(f, "unresolved sites: {}", sites.join("; "))
            }
            Self::JunctionCollision { occurrences } => {
                let sites: Vec<String> = occurrences
                    .iter()
                    .map(|o| format!("{} at {}..{}", o.site, o.start, o.end))
                    .collect();
                write!(f, "junction creates {}", sites.join(", "))
            }
            Self::UnknownSlot { slot } => write!(f, "no domesticator for slot '{slot}'"),
            Self::Error { message } => write!(f, "{message}"),
        }
    }
}

/// The outcome of domesticating one record. Built once, never changed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomesticationResult {
    record_id: String,
    domesticator: String,
    original: String,
    final_sequence: Option<String>,
    mutations: Vec<Mutation>,
    flanks: Vec<Flank>,
    failure: Option<FailureReason>,
}

impl DomesticationResult {
    pub fn succeeded(
        record_id: &str,
        domesticator: &str,
        original: &DNAsequence,
        final_sequence: &DNAsequence,
        mutations: Vec<Mutation>,
        flanks: Vec<Flank>,
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            domesticator: domesticator.to_string(),
            original: original.get_forward_string(),
            final_sequence: Some(final_sequence.get_forward_string()),
            mutations,
            flanks,
            failure: None,
        }
    }

    /// A failed attempt. Mutations found before the failure are kept for reporting.
    pub fn failed(
        record_id: &str,
        domesticator: &str,
        original: &str,
        mutations: Vec<Mutation>,
        reason: FailureReason,
    ) -> Self {
        Self {
            record_id: record_id.to_string(),
            domesticator: domesticator.to_string(),
            original: original.to_string(),
            final_sequence: None,
            mutations,
            flanks: vec![],
            failure: Some(reason),
        }
    }

    pub fn record_id(&self) -> &str {
        &self.record_id
    }

    pub fn domesticator(&self) -> &str {
        &self.domesticator
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn final_sequence(&self) -> Option<&str> {
        self.final_sequence.as_deref()
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn flanks(&self) -> &[Flank] {
        &self.flanks
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        self.failure.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Positions whose final base differs from the original one.
    pub fn number_of_edits(&self) -> usize {
        let mut net: BTreeMap<usize, (u8, u8)> = BTreeMap::new();
        for m in &self.mutations {
            net.entry(m.position)
                .and_modify(|(_, new)| *new = m.new)
                .or_insert((m.original, m.new));
        }
        net.values().filter(|(from, to)| from != to).count()
    }

    /// Length gained through flanks; zero for failures.
    pub fn added_bp(&self) -> usize {
        self.final_sequence
            .as_ref()
            .map(|s| s.len().saturating_sub(self.original.len()))
            .unwrap_or(0)
    }

    pub fn summary(&self) -> String {
        match &self.failure {
            None => format!("SUCCESS - {} nucleotides edited.", self.number_of_edits()),
            Some(reason) => format!("FAILURE - {reason}"),
        }
    }
}
