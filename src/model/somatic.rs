// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Somatic mutation between the germline genotype and the genotype present in
//! sequenced tissue.
//!
//! Each allele stays with probability `1 - rate` and shifts to each of the
//! other three bases with probability `rate / 3`; both alleles mutate
//! independently, so the kernel is symmetric in nucleotide identity. The
//! 16x16 matrix maps true genotypes (rows) to sequenced genotypes (columns).
//! A diagonal-only variant, keeping only the no-change mass, is retained for
//! computations in which somatic mutation is suppressed.

use ndarray::Array2;

use crate::genotype::{Genotype, Nucleotide, GENOTYPE_COUNT};

#[derive(Clone, Debug)]
pub(crate) struct SomaticMatrices {
    pub(crate) full: Array2<f64>,
    pub(crate) diagonal: Array2<f64>,
}

pub(crate) fn derive(rate: f64) -> SomaticMatrices {
    let mut full = Array2::zeros((GENOTYPE_COUNT, GENOTYPE_COUNT));
    for from in Genotype::iter() {
        for to in Genotype::iter() {
            let [from_first, from_second] = from.alleles();
            let [to_first, to_second] = to.alleles();
            full[[from.index(), to.index()]] =
                allele_shift(from_first, to_first, rate) * allele_shift(from_second, to_second, rate);
        }
    }

    let diagonal = Array2::from_diag(&full.diag());

    SomaticMatrices { full, diagonal }
}

fn allele_shift(from: Nucleotide, to: Nucleotide, rate: f64) -> f64 {
    if from == to {
        1.0 - rate
    } else {
        rate / 3.0
    }
}
