//! Assembly standards: named sets of Golden Gate domesticators, one per slot.

use crate::{
    domesticator::{GoldenGateParameters, PartDomesticator},
    enzymes::Enzymes,
    error::{GenedomError, Result},
};
use csv::{ReaderBuilder, Trim};
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Read, path::Path};

/// Version of the builtin standard tables. Changes whenever a builtin CSV does.
pub const STANDARDS_VERSION: &str = "1.0.0";

const MOCLO_PLANT_CSV: &str = include_str!("../assets/standards/moclo_plant.csv");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuiltinStandard {
    MocloPlant,
}

impl BuiltinStandard {
    pub const ALL: [BuiltinStandard; 1] = [BuiltinStandard::MocloPlant];

    pub fn name(&self) -> &'static str {
        match self {
            Self::MocloPlant => "moclo_plant",
        }
    }

    fn csv(&self) -> &'static str {
        match self {
            Self::MocloPlant => MOCLO_PLANT_CSV,
        }
    }

    pub fn from_name(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.name().eq_ignore_ascii_case(name))
            .ok_or_else(|| GenedomError::UnknownStandard(name.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct StandardRow {
    slot_name: String,
    left_overhang: String,
    right_overhang: String,
    #[serde(default)]
    left_addition: String,
    #[serde(default)]
    right_addition: String,
    enzyme: String,
    #[serde(default)]
    extra_avoided_sites: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    is_cds: Option<String>,
}

impl StandardRow {
    fn into_parameters(self, name_prefix: &str) -> GoldenGateParameters {
        GoldenGateParameters {
            name: format!("{name_prefix}{}", self.slot_name),
            description: self.description.filter(|d| !d.is_empty()),
            left_overhang: self.left_overhang,
            right_overhang: self.right_overhang,
            left_addition: self.left_addition,
            right_addition: self.right_addition,
            enzyme: self.enzyme,
            extra_avoided_sites: self
                .extra_avoided_sites
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            cds_by_default: self.is_cds.as_deref() == Some("yes"),
        }
    }
}

/// Slot name to domesticator, in table order.
#[derive(Clone, Debug)]
pub struct StandardDomesticatorsSet {
    name: String,
    domesticators: Vec<(String, PartDomesticator)>,
}

impl StandardDomesticatorsSet {
    /// Reads a table with the columns `slot_name`, `left_overhang`, `right_overhang`,
    /// `left_addition`, `right_addition`, `enzyme`, `extra_avoided_sites`
    /// (comma separated), `description` and `is_cds` (`yes`/`no`).
    pub fn from_csv_reader<R: Read>(
        name: &str,
        reader: R,
        enzymes: &Enzymes,
        name_prefix: &str,
    ) -> Result<Self> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let mut domesticators: Vec<(String, PartDomesticator)> = vec![];
        for row in rdr.deserialize() {
            let row: StandardRow = row?;
            let slot = row.slot_name.to_owned();
            if slot.is_empty() {
                return Err(GenedomError::invalid_configuration("slot_name", "empty slot name"));
            }
            if domesticators.iter().any(|(s, _)| *s == slot) {
                return Err(GenedomError::invalid_configuration(
                    "slot_name",
                    format!("slot '{slot}' is defined twice in '{name}'"),
                ));
            }
            let domesticator = PartDomesticator::golden_gate(row.into_parameters(name_prefix), enzymes)?;
            domesticators.push((slot, domesticator));
        }
        if domesticators.is_empty() {
            return Err(GenedomError::invalid_configuration(
                "standard",
                format!("'{name}' has no slots"),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            domesticators,
        })
    }

    /// Loads a standard from a CSV file. The file stem names the standard and
    /// prefixes the domesticator names.
    pub fn from_path(path: &Path, enzymes: &Enzymes) -> Result<Self> {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let file = File::open(path)?;
        Self::from_csv_reader(&name, file, enzymes, &format!("{name}_"))
    }

    pub fn builtin(standard: BuiltinStandard, enzymes: &Enzymes) -> Result<Self> {
        let name = standard.name();
        Self::from_csv_reader(name, standard.csv().as_bytes(), enzymes, &format!("{name}_"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slots(&self) -> Vec<&str> {
        self.domesticators.iter().map(|(s, _)| s.as_str()).collect()
    }

    pub fn domesticators(&self) -> impl Iterator<Item = &PartDomesticator> {
        self.domesticators.iter().map(|(_, d)| d)
    }

    pub fn domesticator(&self, slot: &str) -> Result<&PartDomesticator> {
        self.domesticators
            .iter()
            .find(|(s, _)| s == slot)
            .map(|(_, d)| d)
            .ok_or_else(|| GenedomError::UnknownSlot(slot.to_string()))
    }

    /// The domesticator for a record named `<slot>_<anything>`.
    pub fn domesticator_for_record(&self, record_id: &str) -> Result<&PartDomesticator> {
        let slot = record_id.split('_').next().unwrap_or_default();
        self.domesticator(slot)
    }

    /// Every overhang of the standard, first left overhang first, no repeats.
    pub fn list_overhangs(&self) -> Vec<String> {
        let mut overhangs: Vec<String> = vec![];
        let parameters = self
            .domesticators()
            .filter_map(|d| d.golden_gate_parameters());
        for p in parameters {
            if overhangs.is_empty() {
                overhangs.push(p.left_overhang.to_owned());
            }
            for o in [&p.right_overhang, &p.left_overhang] {
                if !overhangs.contains(o) {
                    overhangs.push(o.to_owned());
                }
            }
        }
        overhangs
    }
}

/// The builtin standards, parsed once.
#[derive(Clone, Debug)]
pub struct Standards {
    sets: Vec<(BuiltinStandard, StandardDomesticatorsSet)>,
}

impl Standards {
    pub fn new(enzymes: &Enzymes) -> Result<Self> {
        let sets = BuiltinStandard::ALL
            .into_iter()
            .map(|s| Ok((s, StandardDomesticatorsSet::builtin(s, enzymes)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { sets })
    }

    pub fn version(&self) -> &'static str {
        STANDARDS_VERSION
    }

    pub fn get(&self, standard: BuiltinStandard) -> &StandardDomesticatorsSet {
        // `new` builds one set per variant.
        self.sets
            .iter()
            .find(|(s, _)| *s == standard)
            .map(|(_, set)| set)
            .unwrap_or_else(|| panic!("Builtin standard {} missing", standard.name()))
    }

    pub fn by_name(&self, name: &str) -> Result<&StandardDomesticatorsSet> {
        Ok(self.get(BuiltinStandard::from_name(name)?))
    }

    pub fn all(&self) -> impl Iterator<Item = &StandardDomesticatorsSet> {
        self.sets.iter().map(|(_, set)| set)
    }
}

impl Default for Standards {
    fn default() -> Self {
        Standards::new(&crate::ENZYMES).unwrap_or_else(|e| panic!("Builtin standards: {e}"))
    }
}
