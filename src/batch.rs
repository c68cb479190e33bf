use crate::{
    domestication_result::DomesticationResult,
    domesticator::{failure_for, DomesticationOptions, PartDomesticator},
    error::Result,
    records::PartRecord,
    standards::StandardDomesticatorsSet,
};
use itertools::Itertools;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which domesticator handles which record.
#[derive(Clone, Copy, Debug)]
pub enum DomesticatorSelector<'a> {
    /// The same domesticator for every record.
    Single(&'a PartDomesticator),
    /// The slot named by the record id up to the first `_`.
    Standard(&'a StandardDomesticatorsSet),
}

impl<'a> DomesticatorSelector<'a> {
    pub fn select(&self, record_id: &str) -> Result<&'a PartDomesticator> {
        match *self {
            Self::Single(d) => Ok(d),
            Self::Standard(set) => set.domesticator_for_record(record_id),
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Single(d) => d.name(),
            Self::Standard(set) => set.name(),
        }
    }
}

pub fn domesticate_record(
    record: &PartRecord,
    selector: &DomesticatorSelector,
    options: &DomesticationOptions,
) -> DomesticationResult {
    let domesticator = match selector.select(&record.id) {
        Ok(d) => d,
        Err(err) => {
            log::warn!("{}: {err}", record.id);
            return failure_for(&record.id, selector.name(), &record.sequence, err);
        }
    };
    match record.is_cds {
        Some(is_cds) => {
            let options = DomesticationOptions {
                is_cds: Some(is_cds),
                ..options.clone()
            };
            domesticator.domesticate(&record.id, &record.sequence, &options)
        }
        None => domesticator.domesticate(&record.id, &record.sequence, options),
    }
}

/// One result per record, in input order. A failing record never stops the others.
pub fn batch_domesticate(
    records: &[PartRecord],
    selector: &DomesticatorSelector,
    options: &DomesticationOptions,
) -> Vec<DomesticationResult> {
    let results: Vec<DomesticationResult> = records
        .par_iter()
        .map(|record| domesticate_record(record, selector, options))
        .collect();
    let summary = BatchSummary::from_results(&results);
    log::info!(
        "Domesticated {} record(s): {} succeeded, {} failed, {} bp edited",
        summary.total,
        summary.succeeded,
        summary.failed,
        summary.total_edits
    );
    results
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_edits: usize,
    pub added_bp: usize,
    /// Record count per domesticator name.
    pub domesticators: BTreeMap<String, usize>,
}

impl BatchSummary {
    pub fn from_results(results: &[DomesticationResult]) -> Self {
        let succeeded = results.iter().filter(|r| r.is_success()).count();
        Self {
            total: results.len(),
            succeeded,
            failed: results.len() - succeeded,
            total_edits: results.iter().map(|r| r.number_of_edits()).sum(),
            added_bp: results.iter().map(|r| r.added_bp()).sum(),
            domesticators: results
                .iter()
                .map(|r| r.domesticator().to_string())
                .counts()
                .into_iter()
                .collect(),
        }
    }

    /// Ids of the failed records, comma separated.
    pub fn failed_ids(results: &[DomesticationResult]) -> String {
        results
            .iter()
            .filter(|r| !r.is_success())
            .map(|r| r.record_id())
            .join(", ")
    }
}
