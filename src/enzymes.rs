use crate::{
    error::{GenedomError, Result},
    restriction_enzyme::RestrictionEnzyme,
    site_pattern::ForbiddenSiteSet,
};
use anyhow::anyhow;
use std::fs;

const BUILTIN_ENZYMES_JSON: &str = include_str!("../assets/enzymes.json");

#[derive(Clone, Debug)]
pub struct Enzymes {
    restriction_enzymes: Vec<RestrictionEnzyme>,
}

impl Enzymes {
    pub fn new(json_text: &str) -> anyhow::Result<Self> {
        let mut ret = Self {
            restriction_enzymes: vec![],
        };
        let res: serde_json::Value = serde_json::from_str(json_text)?;
        let arr = res
            .as_array()
            .ok_or(anyhow!("Enzymes file is not a JSON array"))?;
        for row in arr {
            match row.get("type").and_then(|t| t.as_str()) {
                Some("restriction") => {
                    let re: RestrictionEnzyme = serde_json::from_value(row.to_owned())
                        .map_err(|e| anyhow!("Bad restriction enzyme: {row}: {e}"))?;
                    re.site_pattern()?;
                    ret.restriction_enzymes.push(re);
                }
                Some(other) => {
                    log::debug!("Skipping enzyme of type '{other}': {row}");
                }
                None => return Err(anyhow!("Missing enzyme type for {}", row)),
            }
        }
        Ok(ret)
    }

    pub fn restriction_enzymes(&self) -> &Vec<RestrictionEnzyme> {
        &self.restriction_enzymes
    }

    pub fn restriction_enzyme(&self, name: &str) -> Result<&RestrictionEnzyme> {
        self.restriction_enzymes
            .iter()
            .find(|re| re.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| GenedomError::UnknownEnzyme(name.to_string()))
    }

    /// The sites of the named enzymes, in the order given.
    pub fn forbidden_sites<S: AsRef<str>>(&self, names: &[S]) -> Result<ForbiddenSiteSet> {
        let sites = names
            .iter()
            .map(|name| self.restriction_enzyme(name.as_ref())?.site_pattern())
            .collect::<Result<Vec<_>>>()?;
        Ok(ForbiddenSiteSet::new(sites))
    }
}

pub fn load_restriction_enzymes_from_path(path: &str) -> anyhow::Result<Enzymes> {
    let text = fs::read_to_string(path)?;
    Enzymes::new(&text)
}

impl Default for Enzymes {
    fn default() -> Self {
        // The embedded catalog is validated by the tests below.
        Enzymes::new(BUILTIN_ENZYMES_JSON).unwrap_or_else(|e| panic!("Builtin enzyme catalog: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENZYMES;

    #[test]
    fn test_from_json_file() {
        let enzymes = Enzymes::default();
        assert!(enzymes
            .restriction_enzymes
            .iter()
            .any(|e| e.name == "EcoRI"));
        assert!(enzymes.restriction_enzyme("bsai").is_ok());
    }

    #[test]
    fn test_forbidden_sites() {
        let sites = ENZYMES.forbidden_sites(&["BsaI", "BsmBI"]).unwrap();
        assert_eq!(sites.names(), vec!["BsaI", "BsmBI"]);
        assert_eq!(sites.get("BsmBI").unwrap().sequence(), "CGTCTC");
        match ENZYMES.forbidden_sites(&["BsaI", "NoSuchI"]) {
            Err(GenedomError::UnknownEnzyme(name)) => assert_eq!(name, "NoSuchI"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_bad_json() {
        assert!(Enzymes::new("{}").is_err());
        assert!(Enzymes::new(r#"[{"name": "X"}]"#).is_err());
        assert!(Enzymes::new(
            r#"[{"type": "restriction", "name": "X", "sequence": "GGZ", "note": null, "cut": 1, "overlap": 1}]"#
        )
        .is_err());
        let proteases = Enzymes::new(
            r#"[{"type": "protease", "name": "Clostripain", "sequence": "R", "note": null, "cut": 1}]"#,
        )
        .unwrap();
        assert!(proteases.restriction_enzymes().is_empty());
    }
}
