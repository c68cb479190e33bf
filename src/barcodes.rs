//! Seeded generation of barcode sets with a minimum pairwise distance.

use crate::{
    dna_sequence::gc_content,
    error::{GenedomError, Result},
    iupac_code::{IupacCode, DNA_BASES},
    site_pattern::ForbiddenSiteSet,
};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    #[default]
    Hamming,
    Levenshtein,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[u8], b: &[u8]) -> usize {
        match self {
            Self::Hamming => hamming(a, b),
            Self::Levenshtein => levenshtein(a, b),
        }
    }
}

/// Mismatches over the shared length, plus the length difference.
pub fn hamming(a: &[u8], b: &[u8]) -> usize {
    let mismatches = a.iter().zip(b).filter(|(x, y)| x != y).count();
    mismatches + a.len().abs_diff(b.len())
}

/// Edit distance with unit costs for substitution, insertion and deletion.
pub fn levenshtein(a: &[u8], b: &[u8]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];
    for (i, x) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, y) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(x != y);
            current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}

/// Length of the longest substring shared by `a` and `b`.
pub fn longest_common_substring(a: &[u8], b: &[u8]) -> usize {
    let mut previous = vec![0; b.len() + 1];
    let mut current = vec![0; b.len() + 1];
    let mut longest = 0;
    for x in a {
        for (j, y) in b.iter().enumerate() {
            current[j + 1] = if x == y { previous[j] + 1 } else { 0 };
            longest = longest.max(current[j + 1]);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    longest
}

/// Primer melting temperature in °C. The Wallace rule below 14 bases,
/// the GC-content formula above.
pub fn melting_temperature(bases: &[u8]) -> f32 {
    let gc = bases.iter().filter(|&&c| c == b'G' || c == b'C').count() as f32;
    let at = bases.len() as f32 - gc;
    if bases.len() < 14 {
        2.0 * at + 4.0 * gc
    } else {
        64.9 + 41.0 * (gc - 16.4) / bases.len() as f32
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeOrder {
    /// The order in which barcodes were accepted.
    #[default]
    Drawn,
    Sorted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BarcodeSettings {
    pub length: usize,
    pub count: usize,
    pub min_distance: usize,
    pub seed: u64,
    pub metric: DistanceMetric,
    /// Allowed GC fraction of each barcode, bounds included.
    pub gc_window: Option<(f32, f32)>,
    /// Allowed melting temperature of each barcode in °C, bounds included.
    pub tm_window: Option<(f32, f32)>,
    /// Longest stretch a barcode may share with another barcode or its
    /// reverse complement.
    pub max_homology_length: Option<usize>,
    /// Consecutive rejected candidates tolerated before giving up.
    pub max_retries: usize,
    /// Appended to every barcode after generation; not part of the distance.
    pub spacer: Option<String>,
    /// printf-style name of barcode `i`, starting at 1.
    pub names_template: String,
    pub order: BarcodeOrder,
}

impl Default for BarcodeSettings {
    fn default() -> Self {
        Self {
            length: 20,
            count: 96,
            min_distance: 3,
            seed: 0,
            metric: DistanceMetric::default(),
            gc_window: None,
            tm_window: None,
            max_homology_length: None,
            max_retries: 10_000,
            spacer: None,
            names_template: "B_%03d".to_string(),
            order: BarcodeOrder::default(),
        }
    }
}

impl BarcodeSettings {
    pub fn new(length: usize, count: usize, min_distance: usize, seed: u64) -> Self {
        Self {
            length,
            count,
            min_distance,
            seed,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.length == 0 {
            return Err(GenedomError::invalid_configuration("length", "must be positive"));
        }
        if self.count == 0 {
            return Err(GenedomError::invalid_configuration("count", "must be positive"));
        }
        if self.min_distance == 0 {
            return Err(GenedomError::invalid_configuration(
                "min_distance",
                "must be at least 1 so that barcodes are distinct",
            ));
        }
        if self.min_distance > self.length {
            return Err(GenedomError::invalid_configuration(
                "min_distance",
                format!(
                    "{} exceeds the largest possible distance between barcodes of length {}",
                    self.min_distance, self.length
                ),
            ));
        }
        if let Some((lo, hi)) = self.gc_window {
            if !(0.0..=1.0).contains(&lo) || !(0.0..=1.0).contains(&hi) || lo > hi {
                return Err(GenedomError::invalid_configuration(
                    "gc_window",
                    format!("{lo}..{hi} is not a range within 0..1"),
                ));
            }
        }
        if let Some((lo, hi)) = self.tm_window {
            if !lo.is_finite() || !hi.is_finite() || lo > hi {
                return Err(GenedomError::invalid_configuration(
                    "tm_window",
                    format!("{lo}..{hi} is not a temperature range"),
                ));
            }
        }
        if self.max_homology_length == Some(0) {
            return Err(GenedomError::invalid_configuration(
                "max_homology_length",
                "must be positive",
            ));
        }
        if let Some(spacer) = &self.spacer {
            if let Some(c) = spacer.bytes().find(|c| !DNA_BASES.contains(&c.to_ascii_uppercase())) {
                return Err(GenedomError::invalid_configuration(
                    "spacer",
                    format!("'{}' is not a base", c as char),
                ));
            }
        }
        format_name(&self.names_template, 1)?;
        Ok(())
    }
}

/// Expands the first `%d`, `%Nd` or `%0Nd` of `template` with `index`.
pub fn format_name(template: &str, index: usize) -> Result<String> {
    let bad = || {
        GenedomError::invalid_configuration(
            "names_template",
            format!("'{template}' needs one %d placeholder"),
        )
    };
    let start = template.find('%').ok_or_else(bad)?;
    let rest = &template[start + 1..];
    let digits_len = rest.find('d').ok_or_else(bad)?;
    let digits = &rest[..digits_len];
    if !digits.bytes().all(|c| c.is_ascii_digit()) {
        return Err(bad());
    }
    let zero_pad = digits.starts_with('0');
    let width: usize = if digits.is_empty() {
        0
    } else {
        digits.parse().map_err(|_| bad())?
    };
    let number = match zero_pad {
        true => format!("{index:0width$}"),
        false => format!("{index:width$}"),
    };
    Ok(format!(
        "{}{number}{}",
        &template[..start],
        &rest[digits_len + 1..]
    ))
}

/// Named barcodes in output order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodesCollection {
    barcodes: Vec<(String, String)>,
}

impl BarcodesCollection {
    pub fn new(barcodes: Vec<(String, String)>) -> Self {
        Self { barcodes }
    }

    /// Generates `settings.count` barcodes. With `exclude`, no barcode (spacer
    /// included) contains any of those sites on either strand.
    pub fn from_settings(
        settings: &BarcodeSettings,
        exclude: Option<&ForbiddenSiteSet>,
    ) -> Result<Self> {
        settings.validate()?;
        let drawn = BarcodeGenerator::new(settings, exclude).run()?;
        let spacer = settings
            .spacer
            .as_deref()
            .unwrap_or_default()
            .to_ascii_uppercase();
        let mut sequences: Vec<String> = drawn
            .into_iter()
            .map(|b| format!("{}{spacer}", String::from_utf8_lossy(&b)))
            .collect();
        if settings.order == BarcodeOrder::Sorted {
            sequences.sort();
        }
        let barcodes = sequences
            .into_iter()
            .enumerate()
            .map(|(i, seq)| Ok((format_name(&settings.names_template, i + 1)?, seq)))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { barcodes })
    }

    pub fn len(&self) -> usize {
        self.barcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.barcodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.barcodes.iter().map(|(n, s)| (n.as_str(), s.as_str()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.iter().find(|(n, _)| *n == name).map(|(_, s)| s)
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(n, _)| n).collect()
    }

    pub fn to_sequences_list(&self) -> Vec<String> {
        self.barcodes.iter().map(|(_, s)| s.to_owned()).collect()
    }

    pub fn to_fasta(&self) -> String {
        let mut ret = String::new();
        for (name, seq) in self.iter() {
            let _ = writeln!(ret, ">{name}\n{seq}");
        }
        ret
    }
}

struct BarcodeGenerator<'a> {
    settings: &'a BarcodeSettings,
    exclude: Option<&'a ForbiddenSiteSet>,
    spacer: Vec<u8>,
    rng: Xoshiro256PlusPlus,
}

impl<'a> BarcodeGenerator<'a> {
    fn new(settings: &'a BarcodeSettings, exclude: Option<&'a ForbiddenSiteSet>) -> Self {
        Self {
            settings,
            exclude,
            spacer: settings
                .spacer
                .as_deref()
                .unwrap_or_default()
                .to_ascii_uppercase()
                .into_bytes(),
            rng: Xoshiro256PlusPlus::seed_from_u64(settings.seed),
        }
    }

    fn draw(&mut self) -> Vec<u8> {
        (0..self.settings.length)
            .map(|_| DNA_BASES[self.rng.gen_range(0..DNA_BASES.len())])
            .collect()
    }

    fn gc_ok(&self, candidate: &[u8]) -> bool {
        let Some((lo, hi)) = self.settings.gc_window else {
            return true;
        };
        let gc = gc_content(candidate);
        lo <= gc && gc <= hi
    }

    fn tm_ok(&self, candidate: &[u8]) -> bool {
        let Some((lo, hi)) = self.settings.tm_window else {
            return true;
        };
        let tm = melting_temperature(candidate);
        lo <= tm && tm <= hi
    }

    fn homology_ok(&self, candidate: &[u8], accepted: &[Vec<u8>]) -> bool {
        let Some(max) = self.settings.max_homology_length else {
            return true;
        };
        accepted.iter().all(|b| {
            longest_common_substring(candidate, b) <= max
                && longest_common_substring(candidate, &IupacCode::reverse_complement(b)) <= max
        })
    }

    fn sites_ok(&self, candidate: &[u8]) -> bool {
        let Some(exclude) = self.exclude else {
            return true;
        };
        let mut with_spacer = candidate.to_vec();
        with_spacer.extend_from_slice(&self.spacer);
        !exclude.any_match(&with_spacer)
    }

    fn run(mut self) -> Result<Vec<Vec<u8>>> {
        let settings = self.settings;
        let mut accepted: Vec<Vec<u8>> = Vec::with_capacity(settings.count);
        let mut rejections = 0;
        while accepted.len() < settings.count {
            let candidate = self.draw();
            let ok = self.gc_ok(&candidate)
                && self.tm_ok(&candidate)
                && self.sites_ok(&candidate)
                && accepted
                    .iter()
                    .all(|b| settings.metric.distance(b, &candidate) >= settings.min_distance)
                && self.homology_ok(&candidate, &accepted);
            if ok {
                accepted.push(candidate);
                rejections = 0;
                continue;
            }
            rejections += 1;
            if rejections > settings.max_retries {
                log::debug!(
                    "Giving up after {rejections} rejections with {} of {} barcodes",
                    accepted.len(),
                    settings.count
                );
                return Err(GenedomError::RetryBudgetExceeded {
                    length: settings.length,
                    count: settings.count,
                    min_distance: settings.min_distance,
                    accepted: accepted.len(),
                    retries: settings.max_retries,
                });
            }
        }
        Ok(accepted)
    }
}
