//! Part domestication: remove forbidden sites from a core, add flanks, check junctions.

use crate::{
    constraint_solver::{
        ConstraintSolver, PreservationConstraint, SolverSettings, UnresolvedReason, UnresolvedSite,
    },
    dna_sequence::DNAsequence,
    domestication_result::{DomesticationResult, FailureReason, Flank, FlankSide},
    enzymes::Enzymes,
    error::{GenedomError, Result},
    genetic_code,
    iupac_code::IupacCode,
    site_pattern::{ForbiddenSiteSet, SiteOccurrence},
};
use serde::{Deserialize, Serialize};

/// Per-call settings of a domestication.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct DomesticationOptions {
    /// Keep the encoded protein. `None` uses the domesticator's default.
    pub is_cds: Option<bool>,
    pub frame_offset: usize,
    /// With edits disabled, a part that contains a forbidden site fails.
    pub allow_edits: bool,
    /// Added left of everything once the part is domesticated.
    #[serde(skip)]
    pub barcode: Option<DNAsequence>,
    pub barcode_spacer: String,
    pub solver: SolverSettings,
}

impl Default for DomesticationOptions {
    fn default() -> Self {
        Self {
            is_cds: None,
            frame_offset: 0,
            allow_edits: true,
            barcode: None,
            barcode_spacer: "AA".to_string(),
            solver: SolverSettings::default(),
        }
    }
}

impl DomesticationOptions {
    pub fn with_barcode(mut self, barcode: &str) -> Result<Self> {
        self.barcode = Some(DNAsequence::from_sequence(barcode)?);
        Ok(self)
    }
}

/// What a Golden Gate domesticator was built from, kept for reports.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoldenGateParameters {
    pub name: String,
    pub description: Option<String>,
    pub left_overhang: String,
    pub right_overhang: String,
    pub left_addition: String,
    pub right_addition: String,
    pub enzyme: String,
    pub extra_avoided_sites: Vec<String>,
    pub cds_by_default: bool,
}

impl Default for GoldenGateParameters {
    fn default() -> Self {
        Self {
            name: "unnamed_domesticator".to_string(),
            description: Some("Golden Gate domesticator".to_string()),
            left_overhang: String::new(),
            right_overhang: String::new(),
            left_addition: String::new(),
            right_addition: String::new(),
            enzyme: "BsmBI".to_string(),
            extra_avoided_sites: vec![],
            cds_by_default: false,
        }
    }
}

#[derive(Clone, Debug)]
pub struct PartDomesticator {
    name: String,
    description: Option<String>,
    left_flank: Option<Flank>,
    right_flank: Option<Flank>,
    forbidden: ForbiddenSiteSet,
    cds_by_default: bool,
    golden_gate: Option<(GoldenGateParameters, String)>,
}

impl PartDomesticator {
    pub fn new(name: &str, forbidden: ForbiddenSiteSet) -> Self {
        Self {
            name: name.to_string(),
            description: None,
            left_flank: None,
            right_flank: None,
            forbidden,
            cds_by_default: false,
            golden_gate: None,
        }
    }

    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    pub fn with_flanks(mut self, left: Option<Flank>, right: Option<Flank>) -> Self {
        self.left_flank = left;
        self.right_flank = right;
        self
    }

    pub fn with_cds_by_default(mut self, cds_by_default: bool) -> Self {
        self.cds_by_default = cds_by_default;
        self
    }

    /// Adds caller-supplied sites to the ones this domesticator already avoids.
    pub fn with_extra_sites(mut self, extra: &ForbiddenSiteSet) -> Self {
        self.forbidden = self.forbidden.union(extra);
        self
    }

    /// A Golden Gate domesticator: the assembly enzyme site plus one spacer base
    /// and the overhang on each side, the enzyme and extra avoided sites forbidden
    /// inside the part.
    pub fn golden_gate(parameters: GoldenGateParameters, enzymes: &Enzymes) -> Result<Self> {
        let enzyme = enzymes.restriction_enzyme(&parameters.enzyme)?;
        let mut site_names = vec![parameters.enzyme.as_str()];
        site_names.extend(parameters.extra_avoided_sites.iter().map(|s| s.as_str()));
        let forbidden = enzymes.forbidden_sites(&site_names)?;

        let site_and_spacer = format!("{}A", enzyme.sequence);
        let left = format!(
            "{site_and_spacer}{}{}",
            parameters.left_overhang, parameters.left_addition
        );
        let right = format!(
            "{}{}{}",
            parameters.right_addition,
            parameters.right_overhang,
            String::from_utf8_lossy(&IupacCode::reverse_complement(site_and_spacer.as_bytes()))
        );
        let left_flank = Flank::left("left flank", &left)?;
        let right_flank = Flank::right("right flank", &right)?;

        let mut ret = Self::new(&parameters.name, forbidden)
            .with_flanks(Some(left_flank), Some(right_flank))
            .with_cds_by_default(parameters.cds_by_default);
        ret.description = parameters.description.clone();
        ret.golden_gate = Some((parameters, enzyme.sequence.to_owned()));
        Ok(ret)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn forbidden_sites(&self) -> &ForbiddenSiteSet {
        &self.forbidden
    }

    pub fn cds_by_default(&self) -> bool {
        self.cds_by_default
    }

    pub fn left_flank(&self) -> Option<&Flank> {
        self.left_flank.as_ref()
    }

    pub fn right_flank(&self) -> Option<&Flank> {
        self.right_flank.as_ref()
    }

    pub fn golden_gate_parameters(&self) -> Option<&GoldenGateParameters> {
        self.golden_gate.as_ref().map(|(p, _)| p)
    }

    /// Domesticates one part. Failures are returned inside the result.
    pub fn domesticate(
        &self,
        record_id: &str,
        sequence: &str,
        options: &DomesticationOptions,
    ) -> DomesticationResult {
        let core = match DNAsequence::from_sequence(sequence) {
            Ok(core) => core,
            Err(err) => {
                log::debug!("{record_id}: {err}");
                return DomesticationResult::failed(
                    record_id,
                    &self.name,
                    sequence,
                    vec![],
                    FailureReason::from(err),
                );
            }
        };
        self.domesticate_sequence(record_id, &core, options)
    }

    /// Reverse-translates `protein` and domesticates it as a coding part.
    pub fn domesticate_protein(
        &self,
        record_id: &str,
        protein: &str,
        options: &DomesticationOptions,
    ) -> DomesticationResult {
        let core = match genetic_code::reverse_translate(protein) {
            Ok(core) => core,
            Err(err) => {
                return DomesticationResult::failed(
                    record_id,
                    &self.name,
                    protein,
                    vec![],
                    FailureReason::from(err),
                );
            }
        };
        let options = DomesticationOptions {
            is_cds: Some(true),
            frame_offset: 0,
            ..options.clone()
        };
        self.domesticate_sequence(record_id, &core, &options)
    }

    pub fn domesticate_sequence(
        &self,
        record_id: &str,
        core: &DNAsequence,
        options: &DomesticationOptions,
    ) -> DomesticationResult {
        let is_cds = options.is_cds.unwrap_or(self.cds_by_default);
        let preservation = match is_cds {
            true => PreservationConstraint::Translation {
                frame_offset: options.frame_offset,
            },
            false => PreservationConstraint::None,
        };
        let solver = ConstraintSolver::new(&self.forbidden)
            .with_preservation(preservation)
            .with_settings(options.solver.clone());

        let failed = |mutations, reason: FailureReason| {
            log::debug!("{record_id}: {reason}");
            DomesticationResult::failed(
                record_id,
                &self.name,
                &core.get_forward_string(),
                mutations,
                reason,
            )
        };

        if !options.allow_edits {
            let occurrences = solver.occurrences(core);
            if !occurrences.is_empty() {
                let unresolved = occurrences
                    .iter()
                    .map(|o| UnresolvedSite::new(o, UnresolvedReason::EditsNotAllowed))
                    .collect();
                return failed(vec![], FailureReason::Infeasible { unresolved });
            }
        }

        let mutations = match solver.solve(core) {
            Ok(mutations) => mutations,
            Err(err) => return failed(vec![], FailureReason::from(err)),
        };
        let edited = match core.with_mutations(&mutations) {
            Ok(edited) => edited,
            Err(err) => return failed(mutations, FailureReason::from(err)),
        };

        let (flanks, left, right) = match self.flanks_for(options) {
            Ok(flanks) => flanks,
            Err(err) => return failed(mutations, FailureReason::from(err)),
        };
        let full = edited.flanked(&left, &right);
        let collisions = self.junction_collisions(&full, left.len(), edited.len());
        if !collisions.is_empty() {
            return failed(
                mutations,
                FailureReason::JunctionCollision {
                    occurrences: collisions,
                },
            );
        }

        log::debug!("{record_id}: {} substitution(s) with {}", mutations.len(), self.name);
        DomesticationResult::succeeded(record_id, &self.name, core, &full, mutations, flanks)
    }

    /// Flanks in application order (outermost left first) plus the joined left and
    /// right sequences.
    fn flanks_for(
        &self,
        options: &DomesticationOptions,
    ) -> Result<(Vec<Flank>, DNAsequence, DNAsequence)> {
        let mut flanks = vec![];
        if let Some(barcode) = &options.barcode {
            let prefix = format!("{}{}", barcode.get_forward_string(), options.barcode_spacer);
            flanks.push(Flank::left("barcode", &prefix)?);
        }
        flanks.extend(self.left_flank.iter().cloned());
        flanks.extend(self.right_flank.iter().cloned());

        let join = |side: FlankSide| -> Result<DNAsequence> {
            let joined: String = flanks
                .iter()
                .filter(|f| f.side == side)
                .map(|f| f.sequence.as_str())
                .collect();
            DNAsequence::from_sequence(&joined)
        };
        let left = join(FlankSide::Left)?;
        let right = join(FlankSide::Right)?;
        Ok((flanks, left, right))
    }

    /// Occurrences crossing either core boundary. Sites wholly inside a flank are
    /// deliberate and not reported.
    fn junction_collisions(
        &self,
        full: &DNAsequence,
        core_start: usize,
        core_len: usize,
    ) -> Vec<SiteOccurrence> {
        let core_end = core_start + core_len;
        self.forbidden
            .find_all(full.forward())
            .into_iter()
            .filter(|o| o.spans(core_start) || o.spans(core_end))
            .collect()
    }

    /// Label/value pairs describing this domesticator in reports.
    pub fn details_list(&self) -> Vec<(String, String)> {
        let mut ret = vec![("Name".to_string(), self.name.to_owned())];
        if let Some(description) = self.description.as_ref().filter(|d| !d.is_empty()) {
            ret.push(("Description".to_string(), description.to_owned()));
        }
        for (label, flank) in [
            ("Left addition", &self.left_flank),
            ("Right addition", &self.right_flank),
        ] {
            if let Some(flank) = flank.as_ref().filter(|f| !f.is_empty()) {
                ret.push((label.to_string(), flank.sequence.to_owned()));
            }
        }
        match &self.golden_gate {
            Some((parameters, site)) => {
                ret.push(("Enzyme".to_string(), format!("{} ({site})", parameters.enzyme)));
                ret.push(("Left overhang".to_string(), parameters.left_overhang.to_owned()));
                ret.push(("Right overhang".to_string(), parameters.right_overhang.to_owned()));
                if !parameters.extra_avoided_sites.is_empty() {
                    ret.push((
                        "Other avoided sites".to_string(),
                        parameters.extra_avoided_sites.join(", "),
                    ));
                }
            }
            None => {
                if !self.forbidden.is_empty() {
                    ret.push(("Avoided sites".to_string(), self.forbidden.names().join(", ")));
                }
            }
        }
        ret
    }
}

impl std::fmt::Display for PartDomesticator {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match &self.golden_gate {
            Some((p, _)) => write!(
                f,
                "GgDomesticator[{}]({}-{})",
                p.enzyme, p.left_overhang, p.right_overhang
            ),
            None => write!(f, "PartDomesticator[{}]", self.name),
        }
    }
}

/// Turns a domestication error into a failure value when a caller wants one.
pub fn failure_for(record_id: &str, domesticator: &str, sequence: &str, err: GenedomError) -> DomesticationResult {
    DomesticationResult::failed(record_id, domesticator, sequence, vec![], FailureReason::from(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ENZYMES;

    fn golden_gate(cds: bool) -> PartDomesticator {
        PartDomesticator::golden_gate(
            GoldenGateParameters {
                name: "CDS".to_string(),
                left_overhang: "AATG".to_string(),
                right_overhang: "GCTT".to_string(),
                enzyme: "BsaI".to_string(),
                extra_avoided_sites: vec!["BpiI".to_string()],
                cds_by_default: cds,
                ..GoldenGateParameters::default()
            },
            &ENZYMES,
        )
        .unwrap()
    }

    #[test]
    fn test_golden_gate_flanks() {
        let d = golden_gate(false);
        assert_eq!(d.left_flank().unwrap().sequence, "GGTCTCAAATG");
        assert_eq!(d.right_flank().unwrap().sequence, "GCTTTGAGACC");
        assert_eq!(d.forbidden_sites().names(), vec!["BsaI", "BpiI"]);
        assert_eq!(d.to_string(), "GgDomesticator[BsaI](AATG-GCTT)");
    }

    #[test]
    fn test_golden_gate_unknown_enzyme() {
        let params = GoldenGateParameters {
            enzyme: "NoSuchI".to_string(),
            ..GoldenGateParameters::default()
        };
        assert!(matches!(
            PartDomesticator::golden_gate(params, &ENZYMES),
            Err(GenedomError::UnknownEnzyme(_))
        ));
    }

    #[test]
    fn test_domesticate_removes_internal_site() {
        let d = golden_gate(false);
        let result = d.domesticate("p1", "ACCGGTCTCTTACG", &DomesticationOptions::default());
        assert!(result.is_success(), "{}", result.summary());
        assert_eq!(result.number_of_edits(), 1);
        assert_eq!(result.added_bp(), 22);
        let full = result.final_sequence().unwrap();
        assert!(full.starts_with("GGTCTCAAATG"));
        assert!(full.ends_with("GCTTTGAGACC"));
        // The only BsaI sites left are the two deliberate ones in the flanks.
        let sites = d.forbidden_sites().find_all(full.as_bytes());
        assert_eq!(sites.len(), 2);
    }

    #[test]
    fn test_domesticate_cds_keeps_protein() {
        let d = golden_gate(true);
        let core = "ATGGGTCTCAAAGAAGACTAA";
        let result = d.domesticate("cds", core, &DomesticationOptions::default());
        assert!(result.is_success(), "{}", result.summary());
        let full = result.final_sequence().unwrap();
        let edited = &full[11..11 + core.len()];
        assert_eq!(
            genetic_code::translate(edited.as_bytes(), 0),
            genetic_code::translate(core.as_bytes(), 0)
        );
    }

    #[test]
    fn test_alphabet_failure() {
        let d = golden_gate(false);
        let result = d.domesticate("bad", "ACGTXACGT", &DomesticationOptions::default());
        assert_eq!(
            result.failure(),
            Some(&FailureReason::Alphabet {
                position: 4,
                letter: 'X'
            })
        );
        assert!(result.mutations().is_empty());
    }

    #[test]
    fn test_edits_not_allowed() {
        let d = golden_gate(false);
        let options = DomesticationOptions {
            allow_edits: false,
            ..DomesticationOptions::default()
        };
        let result = d.domesticate("p", "AAGGTCTCAA", &options);
        match result.failure() {
            Some(FailureReason::Infeasible { unresolved }) => {
                assert_eq!(unresolved.len(), 1);
                assert_eq!(unresolved[0].reason, UnresolvedReason::EditsNotAllowed);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(d.domesticate("p", "AAAATTTT", &options).is_success());
    }

    #[test]
    fn test_junction_collision() {
        let hhai = ForbiddenSiteSet::from_patterns([("HhaI", "GCGC")]).unwrap();
        let d = PartDomesticator::new("junction", hhai).with_flanks(
            Some(Flank::left("left", "GGAG").unwrap()),
            Some(Flank::right("right", "CGCT").unwrap()),
        );
        let result = d.domesticate("p", "ATTATTAATG", &DomesticationOptions::default());
        match result.failure() {
            Some(FailureReason::JunctionCollision { occurrences }) => {
                assert_eq!(occurrences.len(), 1);
                assert_eq!(occurrences[0].site, "HhaI");
                assert_eq!(occurrences[0].start, 13);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(result.final_sequence().is_none());
    }

    #[test]
    fn test_left_junction_collision() {
        let hhai = ForbiddenSiteSet::from_patterns([("HhaI", "GCGC")]).unwrap();
        let left = Flank::left("left", "TTGCG").unwrap();
        let d = PartDomesticator::new("junction", hhai).with_flanks(Some(left), None);
        let result = d.domesticate("p", "CATTAT", &DomesticationOptions::default());
        match result.failure() {
            Some(FailureReason::JunctionCollision { occurrences }) => {
                assert_eq!(occurrences.len(), 1);
                assert_eq!(occurrences[0].start, 2);
                assert!(occurrences[0].start < 5 && occurrences[0].end > 5);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(result.original(), "CATTAT");
        assert!(result.mutations().is_empty());
    }

    #[test]
    fn test_flank_internal_site_ignored() {
        let bsai = ENZYMES.forbidden_sites(&["BsaI"]).unwrap();
        let d = PartDomesticator::new("flanked", bsai).with_flanks(
            Some(Flank::left("left", "GGTCTCA").unwrap()),
            None,
        );
        let result = d.domesticate("p", "TTTTTT", &DomesticationOptions::default());
        assert!(result.is_success());
        assert_eq!(result.final_sequence(), Some("GGTCTCATTTTTT"));
    }

    #[test]
    fn test_barcode_prefix() {
        let d = golden_gate(false);
        let options = DomesticationOptions::default().with_barcode("ACGTACGT").unwrap();
        let result = d.domesticate("p", "TTTTTT", &options);
        assert!(result.is_success(), "{}", result.summary());
        assert!(result.final_sequence().unwrap().starts_with("ACGTACGTAAGGTCTC"));
        assert_eq!(result.flanks()[0].label, "barcode");
        assert!(DomesticationOptions::default().with_barcode("ACNT").is_err());
    }

    #[test]
    fn test_domesticate_protein() {
        let d = golden_gate(false);
        let result = d.domesticate_protein("prot", "MKGLW*", &DomesticationOptions::default());
        assert!(result.is_success(), "{}", result.summary());
        assert_eq!(result.original(), "ATGAAAGGCCTGTGGTAA");
        assert!(d.domesticate_protein("prot", "MJ", &DomesticationOptions::default()).failure().is_some());
    }

    #[test]
    fn test_details_list() {
        let details = golden_gate(false).details_list();
        let labels: Vec<&str> = details.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(
            labels,
            vec![
                "Name",
                "Description",
                "Left addition",
                "Right addition",
                "Enzyme",
                "Left overhang",
                "Right overhang",
                "Other avoided sites"
            ]
        );
        assert_eq!(details[4].1, "BsaI (GGTCTC)");
    }
}
