// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Germline transmission.
//!
//! Each parent transmits one allele, drawn uniformly from its two alleles and
//! copied faithfully with probability `1 - rate`, or mutated into each of the
//! other three bases with probability `rate / 3`. The 16x256 matrices map
//! (mother, father) genotype pairs (columns) to child genotypes (rows); the
//! child's first allele is the maternal one. The no-mutation and
//! with-mutation variants partition the full matrix, which lets the trio
//! model evaluate the pedigree restricted to transmission paths that contain
//! at least one germline mutation.

use ndarray::Array2;
use strum::IntoEnumIterator;

use crate::genotype::{
    parent_pairs, Genotype, Nucleotide, GENOTYPE_COUNT, NUCLEOTIDE_COUNT, PARENT_PAIR_COUNT,
};

#[derive(Clone, Debug)]
pub(crate) struct GermlineMatrices {
    /// P(transmitted allele | parent genotype), 4x16, full model.
    pub(crate) single: Array2<f64>,
    /// P(child genotype | parent pair), 16x256, full model.
    pub(crate) full: Array2<f64>,
    /// Paths where neither transmitted allele mutated.
    pub(crate) no_mutation: Array2<f64>,
    /// Complement of `no_mutation`: at least one allele mutated.
    pub(crate) with_mutation: Array2<f64>,
    /// P(transmitted allele matches | homozygous matching parent).
    pub(crate) homozygous_match: f64,
    /// P(transmitted allele matches | heterozygous parent with one match).
    pub(crate) heterozygous_match: f64,
    /// P(transmitted allele | parent without that allele).
    pub(crate) no_match: f64,
}

pub(crate) fn derive(rate: f64) -> GermlineMatrices {
    let single = single_parent_matrix(rate, false);
    let single_no_mutation = single_parent_matrix(rate, true);
    let full = parent_pair_matrix(&single);
    let no_mutation = parent_pair_matrix(&single_no_mutation);
    let with_mutation = &full - &no_mutation;

    GermlineMatrices {
        single,
        full,
        no_mutation,
        with_mutation,
        homozygous_match: 1.0 - rate,
        heterozygous_match: (1.0 - rate) / 2.0 + rate / 6.0,
        no_match: rate / 3.0,
    }
}

/// Probability that the given parent transmits the given allele. With
/// `no_mutation_only`, only faithful-copy paths contribute.
fn transmission(child: Nucleotide, parent: Genotype, rate: f64, no_mutation_only: bool) -> f64 {
    parent
        .alleles()
        .iter()
        .map(|&allele| {
            if allele == child {
                1.0 - rate
            } else if no_mutation_only {
                0.0
            } else {
                rate / 3.0
            }
        })
        .sum::<f64>()
        / 2.0
}

fn single_parent_matrix(rate: f64, no_mutation_only: bool) -> Array2<f64> {
    let mut matrix = Array2::zeros((NUCLEOTIDE_COUNT, GENOTYPE_COUNT));
    for genotype in Genotype::iter() {
        for child in Nucleotide::iter() {
            matrix[[child.index(), genotype.index()]] =
                transmission(child, genotype, rate, no_mutation_only);
        }
    }
    matrix
}

fn parent_pair_matrix(single: &Array2<f64>) -> Array2<f64> {
    let mut matrix = Array2::zeros((GENOTYPE_COUNT, PARENT_PAIR_COUNT));
    for (pair, (mother, father)) in parent_pairs().enumerate() {
        for child in Genotype::iter() {
            let [maternal, paternal] = child.alleles();
            matrix[[child.index(), pair]] = single[[maternal.index(), mother.index()]]
                * single[[paternal.index(), father.index()]];
        }
    }
    matrix
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Axis;

    #[test]
    fn test_single_parent_matrix_columns_sum_to_one() {
        let matrices = derive(1e-6);
        for column in matrices.single.axis_iter(Axis(1)) {
            assert_relative_eq!(column.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_parent_pair_matrix_columns_sum_to_one() {
        let matrices = derive(1e-6);
        for column in matrices.full.axis_iter(Axis(1)) {
            assert_relative_eq!(column.sum(), 1.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_variants_partition_full_matrix() {
        let matrices = derive(1e-4);
        let reconstructed = &matrices.no_mutation + &matrices.with_mutation;
        for (expected, actual) in matrices.full.iter().zip(reconstructed.iter()) {
            assert_relative_eq!(expected, actual, epsilon = 1e-15);
        }
    }

    #[test]
    fn test_no_mutation_mass_is_independent_of_parents() {
        // summed over child genotypes, faithful transmission from any parent
        // pair has probability (1 - rate)^2
        let rate = 1e-4;
        let matrices = derive(rate);
        for column in matrices.no_mutation.axis_iter(Axis(1)) {
            assert_relative_eq!(column.sum(), (1.0 - rate) * (1.0 - rate), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_match_probabilities() {
        let rate = 1e-4;
        let matrices = derive(rate);
        assert_relative_eq!(matrices.homozygous_match, 1.0 - rate);
        assert_relative_eq!(matrices.heterozygous_match, (1.0 - rate) / 2.0 + rate / 6.0);
        assert_relative_eq!(matrices.no_match, rate / 3.0);
        // and the single matrix realizes them
        let homozygous = Genotype::new(Nucleotide::A, Nucleotide::A);
        let heterozygous = Genotype::new(Nucleotide::A, Nucleotide::C);
        assert_relative_eq!(
            matrices.single[[Nucleotide::A.index(), homozygous.index()]],
            matrices.homozygous_match
        );
        assert_relative_eq!(
            matrices.single[[Nucleotide::A.index(), heterozygous.index()]],
            matrices.heterozygous_match
        );
        assert_relative_eq!(
            matrices.single[[Nucleotide::G.index(), heterozygous.index()]],
            matrices.no_match
        );
    }
}
