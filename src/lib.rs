use dna_sequence::DNAsequence;
use domestication_result::{DomesticationResult, Flank};
use domesticator::{DomesticationOptions, PartDomesticator};
use enzymes::Enzymes;
use lazy_static::lazy_static;
use site_pattern::{ForbiddenSiteSet, SiteOccurrence};
use standards::Standards;

pub mod barcodes;
pub mod batch;
pub mod constraint_solver;
pub mod dna_sequence;
pub mod domestication_result;
pub mod domesticator;
pub mod enzymes;
pub mod error;
pub mod genetic_code;
pub mod iupac_code;
pub mod records;
pub mod reports;
pub mod restriction_enzyme;
pub mod site_pattern;
pub mod standards;

pub use barcodes::BarcodesCollection;
pub use batch::{batch_domesticate, BatchSummary, DomesticatorSelector};
pub use error::{GenedomError, Result};

lazy_static! {
    // Restriction enzymes
    pub static ref ENZYMES: Enzymes = Enzymes::default();

    // Builtin assembly standards
    pub static ref STANDARDS: Standards = Standards::default();
}

/// Removes `forbidden_sites` from `sequence` and adds the optional flanks.
/// Only invalid flanks are an error; everything else is reported in the result.
pub fn domesticate(
    sequence: &str,
    forbidden_sites: &ForbiddenSiteSet,
    preserve_translation: bool,
    left_flank: Option<&str>,
    right_flank: Option<&str>,
) -> Result<DomesticationResult> {
    let left = left_flank.map(|s| Flank::left("left flank", s)).transpose()?;
    let right = right_flank.map(|s| Flank::right("right flank", s)).transpose()?;
    let domesticator = PartDomesticator::new("custom", forbidden_sites.clone()).with_flanks(left, right);
    let options = DomesticationOptions {
        is_cds: Some(preserve_translation),
        ..DomesticationOptions::default()
    };
    Ok(domesticator.domesticate("sequence", sequence, &options))
}

/// `count` barcodes of `length` bases, pairwise Hamming distance at least `min_distance`.
pub fn generate_barcodes(
    length: usize,
    count: usize,
    min_distance: usize,
    seed: u64,
    exclude_sites: Option<&ForbiddenSiteSet>,
) -> Result<BarcodesCollection> {
    let settings = barcodes::BarcodeSettings::new(length, count, min_distance, seed);
    BarcodesCollection::from_settings(&settings, exclude_sites)
}

/// Every occurrence of the sites on both strands, ordered by position.
pub fn find_sites(sequence: &DNAsequence, forbidden_sites: &ForbiddenSiteSet) -> Vec<SiteOccurrence> {
    forbidden_sites.find_all(sequence.forward())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hindiii_scenario() {
        let sites = ForbiddenSiteSet::from_patterns([("HindIII", "AAGCTT")]).unwrap();
        let result = domesticate("AAGAAGCTTAAG", &sites, false, None, None).unwrap();
        assert!(result.is_success());
        assert_eq!(result.mutations().len(), 1);
        assert!((3..9).contains(&result.mutations()[0].position));
        let edited = DNAsequence::from_sequence(result.final_sequence().unwrap()).unwrap();
        assert!(find_sites(&edited, &sites).is_empty());
        assert!(find_sites(&edited.reverse_complement(), &sites).is_empty());
    }

    #[test]
    fn test_junction_scenario() {
        let sites = ForbiddenSiteSet::from_patterns([("HhaI", "GCGC")]).unwrap();
        let result = domesticate("ATTATTAATG", &sites, false, Some("GGAG"), Some("CGCT")).unwrap();
        assert!(matches!(
            result.failure(),
            Some(domestication_result::FailureReason::JunctionCollision { .. })
        ));
        assert_eq!(result.final_sequence(), None);
        assert_eq!(result.original(), "ATTATTAATG");
        assert!(domesticate("ACGT", &sites, false, Some("GGNG"), None).is_err());
    }

    #[test]
    fn test_deterministic_domestication() {
        let sites = ENZYMES.forbidden_sites(&["BsaI", "BsmBI", "BbsI"]).unwrap();
        let seq = "ATGGGTCTCGAAGACCGTCTCAAGAGACCTAA";
        let a = domesticate(seq, &sites, true, Some("GGAG"), Some("CGCT")).unwrap();
        let b = domesticate(seq, &sites, true, Some("GGAG"), Some("CGCT")).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_barcodes() {
        let exclude = ENZYMES.forbidden_sites(&["BsaI"]).unwrap();
        let collection = generate_barcodes(8, 10, 3, 5, Some(&exclude)).unwrap();
        assert_eq!(collection.len(), 10);
        assert_eq!(collection, generate_barcodes(8, 10, 3, 5, Some(&exclude)).unwrap());
        assert!(matches!(
            generate_barcodes(0, 10, 3, 5, None),
            Err(GenedomError::InvalidConfiguration { .. })
        ));
    }
}
