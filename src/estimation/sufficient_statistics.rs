// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Expected sufficient statistics of the sequencing error rate (E-step).
//!
//! Treating the per-read error indicators as the missing data, the
//! complete-data maximum likelihood estimate of the error rate is the
//! fraction of erroneous reads. The E-step therefore accumulates, per site
//! and individual, the expected number of erroneous reads under the current
//! posterior genotype distribution together with the total read count.

use getset::CopyGetters;
use rayon::prelude::*;
use strum::IntoEnumIterator;

use crate::genotype::{Genotype, Nucleotide};
use crate::model::{ReadCounts, TrioModel, TrioReadCounts};

#[derive(Clone, Debug, Default, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct SufficientStatistics {
    /// Posterior-expected number of erroneous reads.
    expected_mismatches: f64,
    /// Total number of reads seen.
    total_reads: u64,
    /// Number of sites accumulated.
    sites: usize,
}

impl SufficientStatistics {
    pub fn new() -> Self {
        SufficientStatistics::default()
    }

    /// One E-step pass: accumulate the statistics of all sites under the
    /// model's current parameters. Sites are independent and processed in
    /// parallel.
    pub fn update(&mut self, model: &TrioModel, sites: &[TrioReadCounts]) {
        let error_rate = model.parameters().sequencing_error_rate();
        let (mismatches, reads) = sites
            .par_iter()
            .map(|site| {
                let evaluation = model.evaluate(site);
                let posteriors = model.genotype_posteriors(&evaluation);
                let mut mismatches = 0.0;
                let mut reads = 0u64;
                let counts = [site.child(), site.mother(), site.father()];
                for (posterior, counts) in posteriors.individuals().iter().zip(counts.iter()) {
                    for genotype in Genotype::iter() {
                        mismatches += posterior[genotype.index()]
                            * expected_errors(genotype, counts, error_rate);
                    }
                    reads += u64::from(counts.depth());
                }
                (mismatches, reads)
            })
            .reduce(|| (0.0, 0), |a, b| (a.0 + b.0, a.1 + b.1));

        self.expected_mismatches += mismatches;
        self.total_reads += reads;
        self.sites += sites.len();
    }

    /// Reset all running totals.
    pub fn clear(&mut self) {
        self.expected_mismatches = 0.0;
        self.total_reads = 0;
        self.sites = 0;
    }

    /// The M-step: the error rate maximizing the expected complete-data
    /// log-likelihood, i.e. expected erroneous reads over total reads.
    /// Defined as 0 when no reads have been accumulated.
    pub fn max_sequencing_error_rate(&self) -> f64 {
        if self.total_reads == 0 {
            0.0
        } else {
            self.expected_mismatches / self.total_reads as f64
        }
    }
}

/// Expected number of erroneous reads given a sequenced genotype and the
/// observed counts. Reads on a base outside the genotype are errors with
/// certainty; reads on one allele of a heterozygote may be errors from the
/// other allele, with probability e / (3 - 2e); reads on the homozygous base
/// cannot be errors under the uniform miscall model.
fn expected_errors(genotype: Genotype, reads: &ReadCounts, error_rate: f64) -> f64 {
    Nucleotide::iter()
        .map(|base| {
            let probability = match genotype.allele_count(base) {
                2 => 0.0,
                1 => error_rate / (3.0 - 2.0 * error_rate),
                _ => 1.0,
            };
            f64::from(reads.count(base)) * probability
        })
        .sum()
}
