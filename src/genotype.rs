// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Encoding of the diploid genotype space.
//!
//! All dense vectors and matrices in this crate agree on the following
//! canonical orderings:
//!
//! * nucleotides: A, C, G, T (indices 0..4);
//! * genotypes: ordered allele pairs, index `4 * first + second`, i.e.
//!   AA, AC, AG, AT, CA, ..., TT (indices 0..16); for a child genotype the
//!   first allele is by convention the maternally transmitted one;
//! * parent pairs: ordered (mother, father) genotype pairs, index
//!   `16 * mother + father` (indices 0..256).

use std::fmt;

use itertools::iproduct;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

pub const NUCLEOTIDE_COUNT: usize = 4;
pub const GENOTYPE_COUNT: usize = NUCLEOTIDE_COUNT * NUCLEOTIDE_COUNT;
pub const PARENT_PAIR_COUNT: usize = GENOTYPE_COUNT * GENOTYPE_COUNT;

#[derive(EnumIter, Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Nucleotide {
    A,
    C,
    G,
    T,
}

impl Nucleotide {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Self {
        match index {
            0 => Nucleotide::A,
            1 => Nucleotide::C,
            2 => Nucleotide::G,
            3 => Nucleotide::T,
            _ => panic!("bug: nucleotide index {} out of range", index),
        }
    }
}

impl fmt::Display for Nucleotide {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let symbol = match self {
            Nucleotide::A => 'A',
            Nucleotide::C => 'C',
            Nucleotide::G => 'G',
            Nucleotide::T => 'T',
        };
        write!(f, "{}", symbol)
    }
}

/// A diploid genotype as an ordered allele pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Genotype {
    first: Nucleotide,
    second: Nucleotide,
}

impl Genotype {
    pub fn new(first: Nucleotide, second: Nucleotide) -> Self {
        Genotype { first, second }
    }

    /// Canonical index in 0..16, `4 * first + second`.
    pub fn index(self) -> usize {
        NUCLEOTIDE_COUNT * self.first.index() + self.second.index()
    }

    pub fn from_index(index: usize) -> Self {
        Genotype {
            first: Nucleotide::from_index(index / NUCLEOTIDE_COUNT),
            second: Nucleotide::from_index(index % NUCLEOTIDE_COUNT),
        }
    }

    /// All 16 genotypes in canonical order.
    pub fn iter() -> impl Iterator<Item = Genotype> {
        iproduct!(Nucleotide::iter(), Nucleotide::iter())
            .map(|(first, second)| Genotype::new(first, second))
    }

    pub fn alleles(self) -> [Nucleotide; 2] {
        [self.first, self.second]
    }

    pub fn is_homozygous(self) -> bool {
        self.first == self.second
    }

    pub fn contains(self, base: Nucleotide) -> bool {
        self.first == base || self.second == base
    }

    /// Number of alleles (0, 1 or 2) equal to the given base.
    pub fn allele_count(self, base: Nucleotide) -> usize {
        self.alleles().iter().filter(|&&a| a == base).count()
    }

    /// Per-base allele counts in canonical nucleotide order.
    pub fn base_counts(self) -> [f64; 4] {
        let mut counts = [0.0; 4];
        counts[self.first.index()] += 1.0;
        counts[self.second.index()] += 1.0;
        counts
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.first, self.second)
    }
}

/// Canonical index of an ordered (mother, father) genotype pair in 0..256.
pub fn parent_pair_index(mother: Genotype, father: Genotype) -> usize {
    GENOTYPE_COUNT * mother.index() + father.index()
}

/// All 256 (mother, father) genotype pairs in canonical order.
pub fn parent_pairs() -> impl Iterator<Item = (Genotype, Genotype)> {
    Genotype::iter().flat_map(|mother| Genotype::iter().map(move |father| (mother, father)))
}
