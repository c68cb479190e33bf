//! Loading parts from FASTA or GenBank files, writing domesticated parts back out.

use crate::domestication_result::DomesticationResult;
use anyhow::{anyhow, Result};
use bio::io::fasta;
use flate2::read::GzDecoder;
use gb_io::reader::SeqReader;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufRead, BufReader, Read, Write},
    path::Path,
};

/// One part to domesticate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartRecord {
    pub id: String,
    pub sequence: String,
    pub description: Option<String>,
    /// `None` leaves the choice to the domesticator.
    pub is_cds: Option<bool>,
}

impl PartRecord {
    pub fn new(id: &str, sequence: &str) -> Self {
        Self {
            id: id.to_string(),
            sequence: sequence.to_string(),
            description: None,
            is_cds: None,
        }
    }

    pub fn with_cds(mut self, is_cds: bool) -> Self {
        self.is_cds = Some(is_cds);
        self
    }

    fn from_fasta_record(record: &fasta::Record) -> Self {
        let description = record.desc().map(|d| d.to_string());
        let is_cds = description
            .as_deref()
            .is_some_and(|d| d.split_whitespace().any(|w| w == "is_cds"))
            .then_some(true);
        Self {
            id: record.id().to_string(),
            sequence: String::from_utf8_lossy(record.seq()).to_string(),
            description,
            is_cds,
        }
    }

    fn from_genbank_seq(seq: gb_io::seq::Seq) -> Self {
        let is_cds = seq
            .features
            .iter()
            .any(|f| f.kind.to_string().eq_ignore_ascii_case("CDS"))
            .then_some(true);
        Self {
            id: seq.name.clone().unwrap_or_default(),
            sequence: String::from_utf8_lossy(&seq.seq).to_string(),
            description: seq.definition.clone(),
            is_cds,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordFormat {
    Fasta,
    GenBank,
}

impl RecordFormat {
    /// Guess from the file name, ignoring a trailing `.gz`.
    pub fn from_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
        let name = name.strip_suffix(".gz").unwrap_or(&name);
        let extension = name.rsplit('.').next()?;
        match extension {
            "fa" | "fasta" | "fna" | "fas" => Some(Self::Fasta),
            "gb" | "gbk" | "genbank" => Some(Self::GenBank),
            _ => None,
        }
    }

    fn sniff(first_line: &str) -> Option<Self> {
        let line = first_line.trim_start();
        if line.starts_with('>') {
            Some(Self::Fasta)
        } else if line.starts_with("LOCUS") {
            Some(Self::GenBank)
        } else {
            None
        }
    }
}

fn open(path: &Path) -> Result<Box<dyn BufRead>> {
    let file = File::open(path).map_err(|e| anyhow!("Cannot open {}: {e}", path.display()))?;
    let is_gz = path
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("gz"));
    let reader: Box<dyn Read> = match is_gz {
        true => Box::new(GzDecoder::new(file)),
        false => Box::new(file),
    };
    Ok(Box::new(BufReader::new(reader)))
}

/// Reads every record of a FASTA or GenBank file, optionally gzipped.
pub fn load_records(path: &Path) -> Result<Vec<PartRecord>> {
    let mut reader = open(path)?;
    let format = match RecordFormat::from_path(path) {
        Some(format) => format,
        None => {
            let buffer = reader.fill_buf()?;
            let head = String::from_utf8_lossy(&buffer[..buffer.len().min(64)]).to_string();
            RecordFormat::sniff(&head)
                .ok_or_else(|| anyhow!("Unknown sequence format: {}", path.display()))?
        }
    };
    let records = read_records(reader, format)?;
    log::info!("Loaded {} record(s) from {}", records.len(), path.display());
    Ok(records)
}

pub fn read_records<R: BufRead>(reader: R, format: RecordFormat) -> Result<Vec<PartRecord>> {
    match format {
        RecordFormat::Fasta => fasta::Reader::from_bufread(reader)
            .records()
            .map(|record| Ok(PartRecord::from_fasta_record(&record?)))
            .collect(),
        RecordFormat::GenBank => SeqReader::new(reader)
            .map(|seq| Ok(PartRecord::from_genbank_seq(seq?)))
            .collect(),
    }
}

/// FASTA of the successfully domesticated parts, ids suffixed with `suffix`.
pub fn write_domesticated_fasta<W: Write>(
    writer: W,
    results: &[DomesticationResult],
    suffix: &str,
) -> Result<()> {
    let mut writer = fasta::Writer::new(writer);
    for result in results {
        if let Some(seq) = result.final_sequence() {
            let id = format!("{}{suffix}", result.record_id());
            writer.write(&id, Some(result.domesticator()), seq.as_bytes())?;
        }
    }
    writer.flush()?;
    Ok(())
}

/// One CSV row per record: id, domesticator, outcome, added and edited bp.
pub fn write_summary_csv<W: Write>(writer: W, results: &[DomesticationResult]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["record", "domesticator", "status", "added_bp", "edited_bp"])?;
    for result in results {
        wtr.write_record([
            result.record_id().to_string(),
            result.domesticator().to_string(),
            result.summary(),
            result.added_bp().to_string(),
            result.number_of_edits().to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
