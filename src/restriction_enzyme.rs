use serde::{Deserialize, Serialize};

use crate::{error::Result, site_pattern::SitePattern};

/// A catalog entry. Only the recognition sequence matters for domestication;
/// cut positions in the catalog are ignored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RestrictionEnzyme {
    pub name: String,
    pub sequence: String,
    pub note: Option<String>,
}

impl RestrictionEnzyme {
    pub fn site_pattern(&self) -> Result<SitePattern> {
        SitePattern::new(&self.name, &self.sequence)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dna_sequence::DNAsequence,
        site_pattern::{ForbiddenSiteSet, Strand},
    };

    fn enzyme(name: &str, sequence: &str) -> RestrictionEnzyme {
        RestrictionEnzyme {
            name: name.to_string(),
            sequence: sequence.to_string(),
            note: None,
        }
    }

    fn sites_in(re: &RestrictionEnzyme, seq: &str) -> Vec<(usize, Strand)> {
        let sites = ForbiddenSiteSet::new([re.site_pattern().unwrap()]);
        let seq = DNAsequence::from_sequence(seq).unwrap();
        sites
            .find_all(seq.forward())
            .into_iter()
            .map(|o| (o.start, o.strand))
            .collect()
    }

    #[test]
    fn test_palindromic_site_once() {
        let re = enzyme("EcoRI", "GAATTC");
        assert!(re.site_pattern().unwrap().is_palindromic());
        assert_eq!(sites_in(&re, "GAATTC"), vec![(0, Strand::Forward)]);
    }

    #[test]
    fn test_type_iis_site_both_strands() {
        let re = enzyme("BsaI", "GGTCTC");
        assert!(!re.site_pattern().unwrap().is_palindromic());
        assert_eq!(
            sites_in(&re, "GGTCTCGAGACC"),
            vec![(0, Strand::Forward), (6, Strand::Reverse)]
        );
    }

    #[test]
    fn test_degenerate_site() {
        let re = enzyme("BsaHI", "GRCGYC");
        assert!(re.site_pattern().unwrap().is_palindromic());
        assert!(enzyme("Bad", "GGZ").site_pattern().is_err());
    }

    #[test]
    fn test_catalog_row() {
        let re: RestrictionEnzyme = serde_json::from_str(
            r#"{"name": "BsmBI", "sequence": "CGTCTC", "note": null, "cut": 7, "overlap": 4}"#,
        )
        .unwrap();
        assert_eq!(re.name, "BsmBI");
        assert_eq!(re.site_pattern().unwrap().sequence(), "CGTCTC");
    }
}
