const DNA_BITMASK_A: u8 = 1;
const DNA_BITMASK_C: u8 = 2;
const DNA_BITMASK_G: u8 = 4;
const DNA_BITMASK_T: u8 = 8;
const DNA_BITMASK_N: u8 = DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T;

/// The four unambiguous bases, in lexicographic order.
pub const DNA_BASES: [u8; 4] = [b'A', b'C', b'G', b'T'];

/// A bitmasked IUPAC code for DNA bases, eg DNA_BITMASK_A|DNA_BITMASK_C
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct IupacCode(u8);

impl IupacCode {
    pub fn new(bitmask: u8) -> Self {
        Self(bitmask & DNA_BITMASK_N)
    }

    #[inline(always)]
    pub fn from_letter(letter: u8) -> Self {
        match letter.to_ascii_uppercase() {
            b'A' => Self(DNA_BITMASK_A),
            b'C' => Self(DNA_BITMASK_C),
            b'G' => Self(DNA_BITMASK_G),
            b'T' => Self(DNA_BITMASK_T),
            b'U' => Self(DNA_BITMASK_T),
            b'W' => Self(DNA_BITMASK_A | DNA_BITMASK_T),
            b'S' => Self(DNA_BITMASK_C | DNA_BITMASK_G),
            b'M' => Self(DNA_BITMASK_A | DNA_BITMASK_C),
            b'K' => Self(DNA_BITMASK_G | DNA_BITMASK_T),
            b'R' => Self(DNA_BITMASK_A | DNA_BITMASK_G),
            b'Y' => Self(DNA_BITMASK_C | DNA_BITMASK_T),
            b'B' => Self(DNA_BITMASK_C | DNA_BITMASK_G | DNA_BITMASK_T),
            b'D' => Self(DNA_BITMASK_A | DNA_BITMASK_G | DNA_BITMASK_T),
            b'H' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_T),
            b'V' => Self(DNA_BITMASK_A | DNA_BITMASK_C | DNA_BITMASK_G),
            b'N' => Self(DNA_BITMASK_N),
            _ => Self(0),
        }
    }

    /// Inverse of `from_letter`; the empty code maps to `-`.
    pub fn to_letter(self) -> u8 {
        match self.0 {
            DNA_BITMASK_A => b'A',
            DNA_BITMASK_C => b'C',
            DNA_BITMASK_G => b'G',
            DNA_BITMASK_T => b'T',
            0b1001 => b'W',
            0b0110 => b'S',
            0b0011 => b'M',
            0b1100 => b'K',
            0b0101 => b'R',
            0b1010 => b'Y',
            0b1110 => b'B',
            0b1101 => b'D',
            0b1011 => b'H',
            0b0111 => b'V',
            DNA_BITMASK_N => b'N',
            _ => b'-',
        }
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// True if the (unambiguous) base is one of the bases this code stands for.
    #[inline(always)]
    pub fn matches_base(self, base: u8) -> bool {
        let base = Self::from_letter(base);
        base.is_unambiguous() && base.0 & self.0 != 0
    }

    /// Exactly one base.
    #[inline(always)]
    pub fn is_unambiguous(self) -> bool {
        self.0.count_ones() == 1
    }

    /// The code on the opposite strand (A<->T, C<->G for every member base).
    #[inline(always)]
    pub fn complement(self) -> Self {
        let mut ret = 0;
        if self.0 & DNA_BITMASK_A != 0 {
            ret |= DNA_BITMASK_T;
        }
        if self.0 & DNA_BITMASK_C != 0 {
            ret |= DNA_BITMASK_G;
        }
        if self.0 & DNA_BITMASK_G != 0 {
            ret |= DNA_BITMASK_C;
        }
        if self.0 & DNA_BITMASK_T != 0 {
            ret |= DNA_BITMASK_A;
        }
        Self(ret)
    }

    #[inline(always)]
    pub fn is_valid_letter(letter: u8) -> bool {
        !Self::from_letter(letter).is_empty()
    }

    #[inline(always)]
    pub fn letter_complement(letter: u8) -> u8 {
        match letter.to_ascii_uppercase() {
            b'A' => b'T',
            b'C' => b'G',
            b'G' => b'C',
            b'T' => b'A',
            b'U' => b'A',
            _ => b' ',
        }
    }

    /// Reverse complement of an IUPAC string; ambiguity codes are complemented too.
    pub fn reverse_complement(letters: &[u8]) -> Vec<u8> {
        letters
            .iter()
            .rev()
            .map(|c| Self::from_letter(*c).complement().to_letter())
            .collect()
    }
}
