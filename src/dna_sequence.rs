use crate::{
    error::{GenedomError, Result},
    iupac_code::{IupacCode, DNA_BASES},
};
use serde::{Deserialize, Serialize};
use std::fmt;

type DNAstring = Vec<u8>;

/// A single-base substitution. Domestication never inserts or deletes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Mutation {
    pub position: usize,
    #[serde(with = "base_as_char")]
    pub original: u8,
    #[serde(with = "base_as_char")]
    pub new: u8,
}

impl Mutation {
    pub fn new(position: usize, original: u8, new: u8) -> Self {
        Self {
            position,
            original,
            new,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}{}>{}",
            self.position,
            self.original as char,
            self.new as char
        )
    }
}

mod base_as_char {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(base: &u8, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_char(*base as char)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u8, D::Error> {
        let c = char::deserialize(deserializer)?;
        Ok(c as u8)
    }
}

/// A linear DNA sequence over A, C, G and T.
///
/// Once created the bases never change; edits produce a new sequence.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DNAsequence {
    bases: DNAstring,
}

impl DNAsequence {
    /// Parses and validates a sequence. Whitespace is dropped and lowercase is accepted;
    /// anything that is not A, C, G or T is an alphabet error at its index in `sequence`.
    pub fn from_sequence(sequence: &str) -> Result<DNAsequence> {
        Self::from_u8(sequence.as_bytes())
    }

    pub fn from_u8(s: &[u8]) -> Result<Self> {
        let mut bases = Vec::with_capacity(s.len());
        for (position, c) in s.iter().enumerate().filter(|(_, c)| !c.is_ascii_whitespace()) {
            let c = c.to_ascii_uppercase();
            if !DNA_BASES.contains(&c) {
                return Err(GenedomError::Alphabet {
                    position,
                    letter: c as char,
                });
            }
            bases.push(c);
        }
        Ok(Self { bases })
    }

    #[inline(always)]
    pub fn forward(&self) -> &[u8] {
        &self.bases
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.bases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bases.is_empty()
    }

    pub fn reverse_complement(&self) -> Self {
        Self {
            bases: self
                .bases
                .iter()
                .rev()
                .map(|c| IupacCode::letter_complement(*c))
                .collect(),
        }
    }

    /// Applies substitutions in order. Each mutation must name the base currently
    /// at its position.
    pub fn with_mutations(&self, mutations: &[Mutation]) -> Result<Self> {
        let mut bases = self.bases.clone();
        for m in mutations {
            match bases.get_mut(m.position) {
                Some(b) if *b == m.original && DNA_BASES.contains(&m.new) => *b = m.new,
                _ => {
                    return Err(GenedomError::invalid_configuration(
                        "mutation",
                        format!("{m} does not apply to a sequence of length {}", bases.len()),
                    ));
                }
            }
        }
        Ok(Self { bases })
    }

    /// `left + self + right`.
    pub fn flanked(&self, left: &DNAsequence, right: &DNAsequence) -> Self {
        let mut bases = Vec::with_capacity(left.len() + self.len() + right.len());
        bases.extend_from_slice(left.forward());
        bases.extend_from_slice(self.forward());
        bases.extend_from_slice(right.forward());
        Self { bases }
    }

    pub fn get_forward_string(&self) -> String {
        String::from_utf8_lossy(&self.bases).to_string()
    }
}

/// Fraction of G and C among `bases`; 0 for an empty slice.
pub fn gc_content(bases: &[u8]) -> f32 {
    if bases.is_empty() {
        return 0.0;
    }
    let gc = bases.iter().filter(|&&c| c == b'G' || c == b'C').count() as f32;
    gc / bases.len() as f32
}

impl fmt::Display for DNAsequence {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", String::from_utf8_lossy(&self.bases))
    }
}

impl TryFrom<&str> for DNAsequence {
    type Error = GenedomError;

    fn try_from(s: &str) -> Result<Self> {
        DNAsequence::from_sequence(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_sequence() {
        let dna = DNAsequence::from_sequence("atg c\nGT").unwrap();
        assert_eq!(dna.get_forward_string(), "ATGCGT");
        assert_eq!(dna.len(), 6);
    }

    #[test]
    fn test_alphabet_error() {
        match DNAsequence::from_sequence("ACGNT") {
            Err(GenedomError::Alphabet { position, letter }) => {
                assert_eq!(position, 3);
                assert_eq!(letter, 'N');
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(DNAsequence::from_sequence("ACGU").is_err());
        match DNAsequence::from_sequence("ACG T\nX") {
            Err(GenedomError::Alphabet { position, letter }) => {
                assert_eq!(position, 6);
                assert_eq!(letter, 'X');
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_reverse_complement() {
        let dna = DNAsequence::from_sequence("AAGCTTC").unwrap();
        assert_eq!(dna.reverse_complement().get_forward_string(), "GAAGCTT");
    }

    #[test]
    fn test_with_mutations() {
        let dna = DNAsequence::from_sequence("AAGCTT").unwrap();
        let edited = dna
            .with_mutations(&[Mutation::new(2, b'G', b'A')])
            .unwrap();
        assert_eq!(edited.get_forward_string(), "AAACTT");
        assert_eq!(dna.get_forward_string(), "AAGCTT");
        assert!(dna.with_mutations(&[Mutation::new(2, b'C', b'A')]).is_err());
        assert!(dna.with_mutations(&[Mutation::new(9, b'G', b'A')]).is_err());
    }

    #[test]
    fn test_flanked_and_gc() {
        let core = DNAsequence::from_sequence("AT").unwrap();
        let left = DNAsequence::from_sequence("GG").unwrap();
        let right = DNAsequence::from_sequence("CC").unwrap();
        let full = core.flanked(&left, &right);
        assert_eq!(full.get_forward_string(), "GGATCC");
        assert!((gc_content(full.forward()) - 4.0 / 6.0).abs() < 1e-6);
        assert_eq!(gc_content(b""), 0.0);
    }

    #[test]
    fn test_mutation_json() {
        let m = Mutation::new(4, b'A', b'G');
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, r#"{"position":4,"original":"A","new":"G"}"#);
        assert_eq!(serde_json::from_str::<Mutation>(&json).unwrap(), m);
        assert_eq!(m.to_string(), "4A>G");
    }
}
