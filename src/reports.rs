//! Conversion of results into the JSON contracts of `genedom-protocol`.

use crate::{
    barcodes::{BarcodeSettings, BarcodesCollection},
    domestication_result::{DomesticationResult, FailureReason},
    site_pattern::{SiteOccurrence, Strand},
    standards::{StandardDomesticatorsSet, STANDARDS_VERSION},
};
use genedom_protocol::{
    BarcodeRecord, BarcodeReport, BatchReport, MutationRecord, RecordReport, SiteHit, SitesReport,
    StandardReport, StandardSlotReport, BARCODE_REPORT_SCHEMA, SITES_REPORT_SCHEMA,
    STANDARD_REPORT_SCHEMA,
};

fn failure_kind(reason: &FailureReason) -> &'static str {
    match reason {
        FailureReason::Alphabet { .. } => "Alphabet",
        FailureReason::Infeasible { .. } => "Infeasible",
        FailureReason::JunctionCollision { .. } => "JunctionCollision",
        FailureReason::UnknownSlot { .. } => "UnknownSlot",
        FailureReason::Error { .. } => "Error",
    }
}

pub fn record_report(result: &DomesticationResult) -> RecordReport {
    RecordReport {
        record_id: result.record_id().to_string(),
        domesticator: result.domesticator().to_string(),
        success: result.is_success(),
        summary: result.summary(),
        original_length: result.original().len(),
        final_sequence: result.final_sequence().map(|s| s.to_string()),
        mutations: result
            .mutations()
            .iter()
            .map(|m| MutationRecord {
                position: m.position,
                from: (m.original as char).to_string(),
                to: (m.new as char).to_string(),
            })
            .collect(),
        added_bp: result.added_bp(),
        edited_bp: result.number_of_edits(),
        failure_kind: result.failure().map(|f| failure_kind(f).to_string()),
    }
}

pub fn batch_report(results: &[DomesticationResult]) -> BatchReport {
    BatchReport::new(STANDARDS_VERSION, results.iter().map(record_report).collect())
}

pub fn barcode_report(settings: &BarcodeSettings, collection: &BarcodesCollection) -> BarcodeReport {
    BarcodeReport {
        schema: BARCODE_REPORT_SCHEMA.to_string(),
        seed: settings.seed,
        length: settings.length,
        count: collection.len(),
        min_distance: settings.min_distance,
        metric: format!("{:?}", settings.metric),
        barcodes: collection
            .iter()
            .map(|(name, sequence)| BarcodeRecord {
                name: name.to_string(),
                sequence: sequence.to_string(),
            })
            .collect(),
    }
}

pub fn sites_report(record_id: &str, sequence_length: usize, sites: &[SiteOccurrence]) -> SitesReport {
    SitesReport {
        schema: SITES_REPORT_SCHEMA.to_string(),
        record_id: record_id.to_string(),
        sequence_length,
        sites: sites
            .iter()
            .map(|o| SiteHit {
                site: o.site.to_owned(),
                start: o.start,
                end: o.end,
                strand: match o.strand {
                    Strand::Forward => "+".to_string(),
                    Strand::Reverse => "-".to_string(),
                },
            })
            .collect(),
    }
}

pub fn standard_report(set: &StandardDomesticatorsSet) -> StandardReport {
    StandardReport {
        schema: STANDARD_REPORT_SCHEMA.to_string(),
        name: set.name().to_string(),
        version: STANDARDS_VERSION.to_string(),
        overhangs: set.list_overhangs(),
        slots: set
            .slots()
            .into_iter()
            .zip(set.domesticators())
            .map(|(slot, d)| StandardSlotReport {
                slot: slot.to_string(),
                domesticator: d.name().to_string(),
                is_cds: d.cds_by_default(),
                details: d.details_list(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dna_sequence::{DNAsequence, Mutation},
        standards::BuiltinStandard,
        STANDARDS,
    };

    #[test]
    fn test_record_report() {
        let original = DNAsequence::from_sequence("AAGCTT").unwrap();
        let mutations = vec![Mutation::new(2, b'G', b'A')];
        let edited = original.with_mutations(&mutations).unwrap();
        let ok = DomesticationResult::succeeded("p", "d", &original, &edited, mutations, vec![]);
        let report = record_report(&ok);
        assert!(report.success);
        assert_eq!(report.mutations[0].from, "G");
        assert_eq!(report.mutations[0].to, "A");
        assert_eq!(report.edited_bp, 1);
        assert_eq!(report.failure_kind, None);

        let failed = DomesticationResult::failed(
            "q",
            "d",
            "ACGT",
            vec![],
            FailureReason::UnknownSlot {
                slot: "q".to_string(),
            },
        );
        let batch = batch_report(&[ok, failed]);
        assert_eq!(batch.failed, 1);
        assert_eq!(batch.records[1].failure_kind.as_deref(), Some("UnknownSlot"));
        assert_eq!(batch.standards_version, STANDARDS_VERSION);
    }

    #[test]
    fn test_standard_report() {
        let report = standard_report(STANDARDS.get(BuiltinStandard::MocloPlant));
        assert_eq!(report.name, "moclo_plant");
        assert_eq!(report.slots.len(), 9);
        assert_eq!(report.slots[4].slot, "CDS");
        assert!(report.slots[4].is_cds);
        assert_eq!(report.overhangs[0], "GGAG");
    }
}
