// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Population genotype priors.
//!
//! Priors follow a Pólya urn over the parental alleles with concentrations
//! `population_mutation_rate * nucleotide_frequencies`. Each ordered allele
//! sequence corresponds to exactly one genotype (two draws) resp. parent pair
//! (four draws), so each prior row sums to 1. Identical alleles clump in the
//! urn, which favors homozygous over heterozygous genotypes by a factor of
//! the order of the mutation rate.

use ndarray::Array1;

use crate::genotype::{parent_pairs, Genotype, GENOTYPE_COUNT, PARENT_PAIR_COUNT};
use crate::model::Parameters;
use crate::utils::ln_polya;

#[derive(Clone, Debug)]
pub(crate) struct PopulationPriors {
    /// Priors over the 16 genotypes of a single individual.
    pub(crate) single: Array1<f64>,
    /// Priors over the 256 (mother, father) genotype pairs.
    pub(crate) parent_pair: Array1<f64>,
}

pub(crate) fn derive(parameters: &Parameters) -> PopulationPriors {
    let alphas = concentrations(parameters);

    let mut single = Array1::zeros(GENOTYPE_COUNT);
    for genotype in Genotype::iter() {
        single[genotype.index()] = ln_polya(&alphas, &genotype.base_counts()).exp();
    }

    let mut parent_pair = Array1::zeros(PARENT_PAIR_COUNT);
    for (index, (mother, father)) in parent_pairs().enumerate() {
        let mut counts = mother.base_counts();
        for (count, father_count) in counts.iter_mut().zip(father.base_counts().iter()) {
            *count += father_count;
        }
        parent_pair[index] = ln_polya(&alphas, &counts).exp();
    }

    PopulationPriors {
        single,
        parent_pair,
    }
}

fn concentrations(parameters: &Parameters) -> [f64; 4] {
    let rate = parameters.population_mutation_rate();
    let frequencies = parameters.nucleotide_frequencies();
    let mut alphas = [0.0; 4];
    for base in 0..4 {
        alphas[base] = rate * frequencies[base];
    }
    alphas
}
