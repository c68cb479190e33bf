//! Standard genetic code (NCBI table 1).

use crate::{
    dna_sequence::DNAsequence,
    error::{GenedomError, Result},
};

// Codons in A, C, G, T order: AAA, AAC, AAG, AAT, ACA, ... TTT
const STANDARD_CODE: &[u8; 64] =
    b"KNKNTTTTRSRSIIMIQHQHPPPPRRRRLLLLEDEDAAAAGGGGVVVV*Y*YSSSS*CWCLFLF";

// One codon per amino acid, used for reverse translation.
const PREFERRED_CODONS: [(u8, &[u8; 3]); 21] = [
    (b'A', b"GCG"),
    (b'C', b"TGC"),
    (b'D', b"GAT"),
    (b'E', b"GAA"),
    (b'F', b"TTT"),
    (b'G', b"GGC"),
    (b'H', b"CAT"),
    (b'I', b"ATT"),
    (b'K', b"AAA"),
    (b'L', b"CTG"),
    (b'M', b"ATG"),
    (b'N', b"AAC"),
    (b'P', b"CCG"),
    (b'Q', b"CAG"),
    (b'R', b"CGT"),
    (b'S', b"AGC"),
    (b'T', b"ACC"),
    (b'V', b"GTG"),
    (b'W', b"TGG"),
    (b'Y', b"TAT"),
    (b'*', b"TAA"),
];

fn base_index(b: u8) -> Option<usize> {
    match b {
        b'A' => Some(0),
        b'C' => Some(1),
        b'G' => Some(2),
        b'T' => Some(3),
        _ => None,
    }
}

/// Amino acid (one-letter, `*` for stop) of a codon, `None` if the codon is not ACGT.
#[inline(always)]
pub fn translate_codon(codon: &[u8]) -> Option<u8> {
    match codon {
        [a, b, c] => {
            let idx = base_index(*a)? * 16 + base_index(*b)? * 4 + base_index(*c)?;
            Some(STANDARD_CODE[idx])
        }
        _ => None,
    }
}

/// Translates the complete codons starting at `frame_offset`. Trailing partial codons are ignored.
pub fn translate(sequence: &[u8], frame_offset: usize) -> Vec<u8> {
    sequence
        .get(frame_offset..)
        .unwrap_or_default()
        .chunks_exact(3)
        .map(|codon| translate_codon(codon).unwrap_or(b'X'))
        .collect()
}

/// Index range of the codon containing `position`, if that codon is complete.
pub fn codon_span(sequence_len: usize, frame_offset: usize, position: usize) -> Option<(usize, usize)> {
    if position < frame_offset {
        return None;
    }
    let start = position - (position - frame_offset) % 3;
    let end = start + 3;
    (end <= sequence_len).then_some((start, end))
}

/// Would replacing the base at `position` by `base` keep the encoded amino acid?
/// Bases outside complete codons never qualify.
pub fn is_synonymous(sequence: &[u8], frame_offset: usize, position: usize, base: u8) -> bool {
    let Some((start, end)) = codon_span(sequence.len(), frame_offset, position) else {
        return false;
    };
    let mut codon = [0u8; 3];
    codon.copy_from_slice(&sequence[start..end]);
    let before = translate_codon(&codon);
    codon[position - start] = base;
    before.is_some() && before == translate_codon(&codon)
}

/// A DNA sequence encoding `protein` with one fixed codon per amino acid.
pub fn reverse_translate(protein: &str) -> Result<DNAsequence> {
    let mut dna = Vec::with_capacity(protein.len() * 3);
    for (position, aa) in protein.bytes().filter(|c| !c.is_ascii_whitespace()).enumerate() {
        let aa = aa.to_ascii_uppercase();
        let codon = PREFERRED_CODONS
            .iter()
            .find(|(letter, _)| *letter == aa)
            .map(|(_, codon)| codon)
            .ok_or(GenedomError::Alphabet {
                position,
                letter: aa as char,
            })?;
        dna.extend_from_slice(codon.as_slice());
    }
    DNAsequence::from_u8(&dna)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_codon() {
        assert_eq!(translate_codon(b"ATG"), Some(b'M'));
        assert_eq!(translate_codon(b"TGG"), Some(b'W'));
        assert_eq!(translate_codon(b"TAA"), Some(b'*'));
        assert_eq!(translate_codon(b"GCT"), Some(b'A'));
        assert_eq!(translate_codon(b"AGA"), Some(b'R'));
        assert_eq!(translate_codon(b"ANA"), None);
        assert_eq!(translate_codon(b"AT"), None);
    }

    #[test]
    fn test_translate() {
        assert_eq!(translate(b"ATGAAAGCTTAA", 0), b"MKA*".to_vec());
        assert_eq!(translate(b"CATGAAAG", 1), b"MK".to_vec());
        assert_eq!(translate(b"AT", 0), Vec::<u8>::new());
        assert_eq!(translate(b"AT", 5), Vec::<u8>::new());
    }

    #[test]
    fn test_is_synonymous() {
        // GCT (Ala): third position is free, first is not.
        assert!(is_synonymous(b"GCT", 0, 2, b'A'));
        assert!(!is_synonymous(b"GCT", 0, 0, b'A'));
        // ATG (Met) has no synonymous codon.
        assert!(!is_synonymous(b"ATG", 0, 2, b'A'));
        // Incomplete trailing codon is frozen.
        assert!(!is_synonymous(b"GCTGC", 0, 4, b'A'));
        assert!(!is_synonymous(b"AGCT", 1, 0, b'T'));
    }

    #[test]
    fn test_codon_span() {
        assert_eq!(codon_span(9, 0, 4), Some((3, 6)));
        assert_eq!(codon_span(9, 1, 4), Some((4, 7)));
        assert_eq!(codon_span(8, 0, 7), None);
    }

    #[test]
    fn test_reverse_translate() {
        let dna = reverse_translate("MKA*").unwrap();
        assert_eq!(dna.get_forward_string(), "ATGAAAGCGTAA");
        assert_eq!(translate(dna.forward(), 0), b"MKA*".to_vec());
        for (aa, codon) in PREFERRED_CODONS {
            assert_eq!(translate_codon(codon), Some(aa));
        }
        assert!(reverse_translate("MZ").is_err());
    }
}
