use crate::{constraint_solver::UnresolvedSite, site_pattern::SiteOccurrence};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenedomError>;

#[derive(Error, Debug)]
pub enum GenedomError {
    /// A part contains something other than A, C, G or T.
    #[error("Invalid base '{letter}' at position {position}")]
    Alphabet { position: usize, letter: char },

    #[error("No edit set satisfies all constraints ({} unresolved site(s))", .unresolved.len())]
    InfeasibleConstraint { unresolved: Vec<UnresolvedSite> },

    #[error("Flanks create {} forbidden site(s) at a junction", .occurrences.len())]
    JunctionCollision { occurrences: Vec<SiteOccurrence> },

    #[error(
        "Could not find {count} barcodes of length {length} at distance >= {min_distance}: \
         {accepted} accepted before {retries} consecutive rejections"
    )]
    RetryBudgetExceeded {
        length: usize,
        count: usize,
        min_distance: usize,
        accepted: usize,
        retries: usize,
    },

    #[error("Invalid parameter '{parameter}': {reason}")]
    InvalidConfiguration { parameter: String, reason: String },

    #[error("Unknown restriction enzyme '{0}'")]
    UnknownEnzyme(String),

    #[error("Unknown assembly standard '{0}'")]
    UnknownStandard(String),

    #[error("No domesticator for slot '{0}'")]
    UnknownSlot(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl GenedomError {
    pub fn invalid_configuration(parameter: &str, reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            parameter: parameter.to_string(),
            reason: reason.into(),
        }
    }
}
