// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The EM loop fitting the sequencing error rate.
//!
//! Alternates E-steps ([`SufficientStatistics::update`]) and M-steps
//! ([`SufficientStatistics::max_sequencing_error_rate`]) until the estimate
//! is a fixed point within the configured tolerance. The loop is bounded;
//! running out of iterations is a distinct, explicitly represented outcome
//! rather than an endless loop.

use getset::CopyGetters;

use crate::errors::Error;
use crate::estimation::sufficient_statistics::SufficientStatistics;
use crate::model::{TrioModel, TrioReadCounts};
use crate::utils::approx_equal;

pub const DEFAULT_MAX_ITERATIONS: usize = 100;
pub const DEFAULT_TOLERANCE: f64 = 1e-10;

#[derive(Clone, Copy, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct ExpectationMaximization {
    /// Upper bound on EM iterations.
    max_iterations: usize,
    /// Convergence tolerance for the error rate estimate.
    tolerance: f64,
}

impl Default for ExpectationMaximization {
    fn default() -> Self {
        ExpectationMaximization {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

/// How a fit terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Termination {
    Converged,
    IterationLimitReached,
}

/// Result of one EM fit.
#[derive(Clone, Copy, Debug, CopyGetters)]
#[getset(get_copy = "pub")]
pub struct Fit {
    /// The final sequencing error rate estimate.
    sequencing_error_rate: f64,
    /// Number of M-step updates that were installed into the model.
    iterations: usize,
    termination: Termination,
    /// Observed-data log-likelihood of the sites under the final estimate.
    ln_likelihood: f64,
}

impl Fit {
    pub fn converged(&self) -> bool {
        self.termination == Termination::Converged
    }
}

impl ExpectationMaximization {
    pub fn new(max_iterations: usize, tolerance: f64) -> Self {
        ExpectationMaximization {
            max_iterations,
            tolerance,
        }
    }

    /// Fit the sequencing error rate against the given sites, starting from
    /// the model's current rate. The final estimate is installed into the
    /// model.
    pub fn fit(&self, model: &mut TrioModel, sites: &[TrioReadCounts]) -> Result<Fit, Error> {
        let mut stats = SufficientStatistics::new();
        stats.update(model, sites);

        let mut iterations = 0;
        loop {
            let current = model.parameters().sequencing_error_rate();
            let candidate = stats.max_sequencing_error_rate();
            if approx_equal(current, candidate, self.tolerance) {
                debug!(
                    "EM converged after {} iterations at sequencing error rate {:e}",
                    iterations, current
                );
                return Ok(self.finish(model, sites, iterations, Termination::Converged));
            }
            if iterations >= self.max_iterations {
                warn!(
                    "EM stopped after reaching the iteration limit of {}; \
                     last estimate {:e}",
                    self.max_iterations, current
                );
                return Ok(self.finish(
                    model,
                    sites,
                    iterations,
                    Termination::IterationLimitReached,
                ));
            }

            model.set_sequencing_error_rate(candidate)?;
            iterations += 1;
            debug!(
                "EM iteration {}: sequencing error rate {:e}",
                iterations, candidate
            );
            stats.clear();
            stats.update(model, sites);
        }
    }

    fn finish(
        &self,
        model: &TrioModel,
        sites: &[TrioReadCounts],
        iterations: usize,
        termination: Termination,
    ) -> Fit {
        let ln_likelihood = sites
            .iter()
            .map(|site| model.evaluate(site).ln_likelihood())
            .sum();
        Fit {
            sequencing_error_rate: model.parameters().sequencing_error_rate(),
            iterations,
            termination,
            ln_likelihood,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParametersBuilder, ReadCounts};

    fn clean_sites() -> Vec<TrioReadCounts> {
        let reads = ReadCounts::new([40, 0, 0, 0]);
        vec![TrioReadCounts::new(reads, reads, reads)]
    }

    #[test]
    fn test_clean_reads_converge_to_zero() {
        let mut model = TrioModel::new(
            ParametersBuilder::default()
                .sequencing_error_rate(0.01)
                .build()
                .unwrap(),
        );
        let fit = ExpectationMaximization::default()
            .fit(&mut model, &clean_sites())
            .unwrap();
        assert!(fit.converged());
        assert!(fit.sequencing_error_rate() < 1e-6);
        assert!(fit.iterations() <= 10);
        assert_relative_eq!(
            model.parameters().sequencing_error_rate(),
            fit.sequencing_error_rate()
        );
    }

    #[test]
    fn test_fixed_point_terminates_immediately() {
        let mut model = TrioModel::new(
            ParametersBuilder::default()
                .sequencing_error_rate(0.01)
                .build()
                .unwrap(),
        );
        let em = ExpectationMaximization::default();
        em.fit(&mut model, &clean_sites()).unwrap();
        // the rate is already at its maximizer, so no further update happens
        let again = em.fit(&mut model, &clean_sites()).unwrap();
        assert!(again.converged());
        assert_eq!(again.iterations(), 0);
    }

    #[test]
    fn test_iteration_limit_is_represented() {
        let mut model = TrioModel::new(
            ParametersBuilder::default()
                .sequencing_error_rate(0.1)
                .build()
                .unwrap(),
        );
        let em = ExpectationMaximization::new(0, 0.0);
        let fit = em.fit(&mut model, &clean_sites()).unwrap();
        assert_eq!(fit.termination(), Termination::IterationLimitReached);
        assert!(!fit.converged());
    }

    #[test]
    fn test_mismatched_reads_recover_error_rate() {
        // 2 errors in 40 reads per individual: the fit approaches 0.05
        let reads = ReadCounts::new([38, 2, 0, 0]);
        let sites = vec![TrioReadCounts::new(reads, reads, reads)];
        let mut model = TrioModel::default();
        let fit = ExpectationMaximization::default()
            .fit(&mut model, &sites)
            .unwrap();
        assert!(fit.converged());
        assert_relative_eq!(fit.sequencing_error_rate(), 0.05, epsilon = 1e-2);
        assert!(fit.ln_likelihood().is_finite());
    }
}
