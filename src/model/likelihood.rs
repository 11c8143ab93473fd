// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Dirichlet-multinomial read likelihoods.
//!
//! For each candidate genotype, the observed per-base read counts of one
//! individual are modeled as a Dirichlet-multinomial draw whose concentrations
//! are the genotype's expected base composition under per-read sequencing
//! error, scaled by the dispersion parameter. Everything is evaluated with
//! log-gamma and only exponentiated after rescaling by the per-individual
//! maximum, so arbitrary read depths cannot overflow. The discarded scale is
//! reported alongside the matrix; it cancels in all probability ratios and
//! posteriors but is needed to recover absolute site log-likelihoods.

use bio::stats::LogProb;
use ndarray::{Array2, ArrayView1};
use strum::IntoEnumIterator;

use crate::genotype::{Genotype, Nucleotide, GENOTYPE_COUNT, NUCLEOTIDE_COUNT};
use crate::model::{ReadCounts, TrioReadCounts};
use crate::utils::{ln_multinomial_coefficient, ln_polya};

/// Dirichlet concentrations per genotype (16x4). Alleles of the genotype get
/// the faithful-read mass, the other bases the error mass `rate / 3`.
pub(crate) fn genotype_alphas(dispersion: f64, error_rate: f64) -> Array2<f64> {
    let mut alphas = Array2::zeros((GENOTYPE_COUNT, NUCLEOTIDE_COUNT));
    for genotype in Genotype::iter() {
        for base in Nucleotide::iter() {
            let share = genotype.allele_count(base) as f64 / 2.0;
            let expected = share * (1.0 - error_rate) + (1.0 - share) * error_rate / 3.0;
            alphas[[genotype.index(), base.index()]] = dispersion * expected;
        }
    }
    alphas
}

/// Log Dirichlet-multinomial probability of the observed counts under the
/// given concentrations.
pub(crate) fn ln_dirichlet_multinomial(alphas: ArrayView1<f64>, reads: &ReadCounts) -> LogProb {
    let counts = reads.as_floats();
    let alphas = [alphas[0], alphas[1], alphas[2], alphas[3]];
    LogProb(ln_multinomial_coefficient(&counts) + ln_polya(&alphas, &counts))
}

/// Per-site 3x16 likelihood matrix (rows: child, mother, father) together
/// with the total log scale removed from the rows.
pub(crate) fn sequencing_likelihoods(
    alphas: &Array2<f64>,
    site: &TrioReadCounts,
) -> (Array2<f64>, f64) {
    let mut matrix = Array2::zeros((3, GENOTYPE_COUNT));
    let mut ln_scale = 0.0;
    for (row, reads) in [site.child(), site.mother(), site.father()].iter().enumerate() {
        let ln_likelihoods: Vec<f64> = Genotype::iter()
            .map(|genotype| *ln_dirichlet_multinomial(alphas.row(genotype.index()), reads))
            .collect();
        let max = ln_likelihoods
            .iter()
            .cloned()
            .fold(f64::NEG_INFINITY, f64::max);
        assert!(max.is_finite());
        for (genotype, &ln) in ln_likelihoods.iter().enumerate() {
            matrix[[row, genotype]] = (ln - max).exp();
        }
        ln_scale += max;
    }
    (matrix, ln_scale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Axis;

    fn reads(counts: [u32; 4]) -> ReadCounts {
        ReadCounts::new(counts)
    }

    #[test]
    fn test_alphas_sum_to_dispersion() {
        let alphas = genotype_alphas(1000.0, 0.005);
        for row in alphas.axis_iter(Axis(0)) {
            assert_relative_eq!(row.sum(), 1000.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_alphas_composition() {
        let dispersion = 1000.0;
        let error_rate = 0.005;
        let alphas = genotype_alphas(dispersion, error_rate);
        // homozygous AA
        assert_relative_eq!(alphas[[0, 0]], dispersion * (1.0 - error_rate));
        assert_relative_eq!(alphas[[0, 1]], dispersion * error_rate / 3.0);
        // heterozygous AC
        assert_relative_eq!(alphas[[1, 0]], dispersion * (1.0 - 2.0 * error_rate / 3.0) / 2.0);
        assert_relative_eq!(alphas[[1, 3]], dispersion * error_rate / 3.0);
    }

    #[test]
    fn test_empty_counts_have_unit_likelihood() {
        let alphas = genotype_alphas(1000.0, 0.005);
        for genotype in Genotype::iter() {
            let ln = ln_dirichlet_multinomial(alphas.row(genotype.index()), &reads([0; 4]));
            assert_relative_eq!(*ln, 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_single_read_matches_expected_composition() {
        // with one read, the Dirichlet-multinomial reduces to alpha_k / sum(alpha)
        let dispersion = 1000.0;
        let error_rate = 0.005;
        let alphas = genotype_alphas(dispersion, error_rate);
        let ln = ln_dirichlet_multinomial(alphas.row(0), &reads([1, 0, 0, 0]));
        assert_relative_eq!(ln.exp(), 1.0 - error_rate, epsilon = 1e-12);
        let ln = ln_dirichlet_multinomial(alphas.row(0), &reads([0, 1, 0, 0]));
        assert_relative_eq!(ln.exp(), error_rate / 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_high_depth_stays_finite() {
        let alphas = genotype_alphas(1000.0, 0.005);
        let ln = ln_dirichlet_multinomial(alphas.row(0), &reads([100_000, 500, 500, 0]));
        assert!(ln.is_finite());
        assert!(*ln < 0.0);
    }

    #[test]
    fn test_likelihood_matrix_is_rescaled() {
        let alphas = genotype_alphas(1000.0, 0.005);
        let site = TrioReadCounts::new(
            reads([1000, 0, 0, 0]),
            reads([1000, 0, 0, 0]),
            reads([1000, 0, 0, 0]),
        );
        let (matrix, ln_scale) = sequencing_likelihoods(&alphas, &site);
        for row in matrix.axis_iter(Axis(0)) {
            let max = row.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            assert_relative_eq!(max, 1.0, epsilon = 1e-12);
        }
        assert!(ln_scale.is_finite());
        assert!(ln_scale < 0.0);
    }

    #[test]
    fn test_zero_error_rate_excludes_mismatched_genotypes() {
        let alphas = genotype_alphas(1000.0, 0.0);
        // genotype AA cannot generate C reads without sequencing errors
        let ln = ln_dirichlet_multinomial(alphas.row(0), &reads([10, 1, 0, 0]));
        assert_eq!(*ln, f64::NEG_INFINITY);
    }
}
