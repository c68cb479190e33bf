//! JSON contracts printed by the `genedom` command line tool.

use serde::{Deserialize, Serialize};

pub const BATCH_REPORT_SCHEMA: &str = "genedom.batch_report.v1";
pub const BARCODE_REPORT_SCHEMA: &str = "genedom.barcode_report.v1";
pub const SITES_REPORT_SCHEMA: &str = "genedom.sites_report.v1";
pub const STANDARD_REPORT_SCHEMA: &str = "genedom.standard_report.v1";
pub const CAPABILITIES_SCHEMA: &str = "genedom.capabilities.v1";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub position: usize,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReport {
    pub record_id: String,
    pub domesticator: String,
    pub success: bool,
    pub summary: String,
    pub original_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_sequence: Option<String>,
    #[serde(default)]
    pub mutations: Vec<MutationRecord>,
    pub added_bp: usize,
    pub edited_bp: usize,
    /// `Alphabet`, `Infeasible`, `JunctionCollision`, `UnknownSlot` or `Error`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub schema: String,
    pub standards_version: String,
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub total_edits: usize,
    pub records: Vec<RecordReport>,
}

impl BatchReport {
    pub fn new(standards_version: &str, records: Vec<RecordReport>) -> Self {
        let succeeded = records.iter().filter(|r| r.success).count();
        Self {
            schema: BATCH_REPORT_SCHEMA.to_string(),
            standards_version: standards_version.to_string(),
            total: records.len(),
            succeeded,
            failed: records.len() - succeeded,
            total_edits: records.iter().map(|r| r.edited_bp).sum(),
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeRecord {
    pub name: String,
    pub sequence: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeReport {
    pub schema: String,
    pub seed: u64,
    pub length: usize,
    pub count: usize,
    pub min_distance: usize,
    pub metric: String,
    pub barcodes: Vec<BarcodeRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteHit {
    pub site: String,
    pub start: usize,
    pub end: usize,
    pub strand: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SitesReport {
    pub schema: String,
    pub record_id: String,
    pub sequence_length: usize,
    pub sites: Vec<SiteHit>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardSlotReport {
    pub slot: String,
    pub domesticator: String,
    pub is_cds: bool,
    pub details: Vec<(String, String)>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandardReport {
    pub schema: String,
    pub name: String,
    pub version: String,
    pub overhangs: Vec<String>,
    pub slots: Vec<StandardSlotReport>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub schema: String,
    pub version: String,
    pub commands: Vec<String>,
    pub enzymes: Vec<String>,
    pub standards: Vec<String>,
}
