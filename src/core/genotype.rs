//! Genotype encoding and category bucketing
//!
//! Genotypes travel through the pipeline as strings such as `"0|1"` or
//! `"1/1"`. Plots group them into a fixed, ordered set of categories that
//! depends on whether the run treats calls as phased.

/// Display order of phased categories
pub const PHASED_CATEGORIES: [&str; 4] = ["0|0", "0|1", "1|0", "1|1"];

/// Display order of unphased categories
pub const UNPHASED_CATEGORIES: [&str; 3] = ["0/0", "0/1", "1/1"];

/// Encode an allele pair as `a|b` (phased) or `a/b` (unphased)
pub fn encode_genotype(first: u32, second: u32, phased: bool) -> String {
    let sep = if phased { '|' } else { '/' };
    format!("{}{}{}", first, sep, second)
}

/// Split an encoded genotype back into its allele indices and phase
pub fn decode_genotype(genotype: &str) -> Option<(u32, u32, bool)> {
    let (sep_pos, phased) = match (genotype.find('|'), genotype.find('/')) {
        (Some(pos), None) => (pos, true),
        (None, Some(pos)) => (pos, false),
        _ => return None,
    };
    let first = genotype[..sep_pos].parse().ok()?;
    let second = genotype[sep_pos + 1..].parse().ok()?;
    Some((first, second, phased))
}

/// How genotypes are grouped for display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phasing {
    /// Four ordered categories; `0|1` and `1|0` stay distinct
    Phased,
    /// Three ordinal categories; heterozygotes collapse into `0/1`
    Unphased,
}

impl Phasing {
    pub fn from_flag(phased: bool) -> Self {
        if phased {
            Phasing::Phased
        } else {
            Phasing::Unphased
        }
    }

    /// Categories in fixed left-to-right order
    pub fn categories(self) -> &'static [&'static str] {
        match self {
            Phasing::Phased => &PHASED_CATEGORIES,
            Phasing::Unphased => &UNPHASED_CATEGORIES,
        }
    }

    /// Map a genotype string to its display category, if it has one
    pub fn normalize(self, genotype: &str) -> Option<&'static str> {
        match self {
            Phasing::Phased => PHASED_CATEGORIES.iter().copied().find(|c| *c == genotype),
            Phasing::Unphased => unphased_category(genotype),
        }
    }

    /// Index of the genotype's category in [`Phasing::categories`]
    pub fn category_index(self, genotype: &str) -> Option<usize> {
        let category = self.normalize(genotype)?;
        self.categories().iter().position(|c| *c == category)
    }

    /// Whether categories can be treated as an ordinal allele dosage
    pub fn is_ordinal(self) -> bool {
        matches!(self, Phasing::Unphased)
    }
}

/// Collapse any biallelic call onto the unphased vocabulary
pub fn unphased_category(genotype: &str) -> Option<&'static str> {
    match genotype {
        "0|0" | "0/0" => Some("0/0"),
        "0|1" | "1|0" | "0/1" | "1/0" => Some("0/1"),
        "1|1" | "1/1" => Some("1/1"),
        _ => None,
    }
}

/// Alternate allele dosage of an unphased category
pub fn dosage(category: &str) -> Option<u8> {
    match category {
        "0/0" => Some(0),
        "0/1" => Some(1),
        "1/1" => Some(2),
        _ => None,
    }
}
