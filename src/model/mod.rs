// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! The trio model.
//!
//! `TrioModel` owns an immutable, validated set of [`Parameters`] together
//! with all matrices derived from them: population priors, germline and
//! somatic transition matrices and the Dirichlet concentrations of the read
//! likelihood. Per-site computation is side-effect free: [`TrioModel::evaluate`]
//! returns an [`Evaluation`] holding the peeled pedigree for one site, from
//! which the mutation probability and per-individual genotype posteriors are
//! read off.

use derive_builder::Builder;
use getset::{CopyGetters, Getters};
use itertools::iproduct;
use ndarray::{Array1, Array2};

use crate::errors::Error;
use crate::genotype::{Nucleotide, GENOTYPE_COUNT, PARENT_PAIR_COUNT};
use crate::utils::{approx_equal, FREQUENCY_SUM_TOLERANCE};

pub(crate) mod germline;
pub(crate) mod likelihood;
pub(crate) mod priors;
pub(crate) mod somatic;

/// Per-base read counts (A, C, G, T) of one individual at one site.
///
/// Counts are unsigned by construction; negative counts are unrepresentable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadCounts([u32; 4]);

impl ReadCounts {
    pub fn new(counts: [u32; 4]) -> Self {
        ReadCounts(counts)
    }

    pub fn count(&self, base: Nucleotide) -> u32 {
        self.0[base.index()]
    }

    /// Total read depth.
    pub fn depth(&self) -> u32 {
        self.0.iter().sum()
    }

    pub(crate) fn as_floats(&self) -> [f64; 4] {
        let mut counts = [0.0; 4];
        for (count, &n) in counts.iter_mut().zip(self.0.iter()) {
            *count = f64::from(n);
        }
        counts
    }
}

impl From<[u32; 4]> for ReadCounts {
    fn from(counts: [u32; 4]) -> Self {
        ReadCounts(counts)
    }
}

/// Read counts of one site in fixed order: child, mother, father.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct TrioReadCounts {
    child: ReadCounts,
    mother: ReadCounts,
    father: ReadCounts,
}

impl TrioReadCounts {
    pub fn new(child: ReadCounts, mother: ReadCounts, father: ReadCounts) -> Self {
        TrioReadCounts {
            child,
            mother,
            father,
        }
    }
}

/// Model parameters. Constructed via [`ParametersBuilder`], which validates
/// all fields, or via `Default`, which yields the upstream default
/// parametrization.
#[derive(Builder, Clone, Debug, PartialEq, CopyGetters, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate", error = "Error"))]
#[getset(get_copy = "pub")]
pub struct Parameters {
    /// Scaled population mutation rate (theta) of the Pólya urn prior.
    #[builder(default = "1e-3")]
    population_mutation_rate: f64,
    /// Per-allele germline mutation rate.
    #[builder(default = "2e-8")]
    germline_mutation_rate: f64,
    /// Per-allele somatic mutation rate.
    #[builder(default = "2e-8")]
    somatic_mutation_rate: f64,
    /// Per-read probability of a miscalled base.
    #[builder(default = "5e-3")]
    sequencing_error_rate: f64,
    /// Dirichlet-multinomial overdispersion of the read likelihood.
    #[builder(default = "1000.0")]
    dirichlet_dispersion: f64,
    /// Population frequencies of A, C, G, T; must sum to 1.
    #[builder(default = "[0.25; 4]")]
    nucleotide_frequencies: [f64; 4],
}

impl Default for Parameters {
    fn default() -> Self {
        ParametersBuilder::default()
            .build()
            .unwrap()
    }
}

impl ParametersBuilder {
    fn validate(&self) -> Result<(), Error> {
        if let Some(rate) = self.population_mutation_rate {
            ensure_population_mutation_rate(rate)?;
        }
        if let Some(rate) = self.germline_mutation_rate {
            ensure_mutation_rate("germline mutation rate", rate)?;
        }
        if let Some(rate) = self.somatic_mutation_rate {
            ensure_mutation_rate("somatic mutation rate", rate)?;
        }
        if let Some(rate) = self.sequencing_error_rate {
            ensure_sequencing_error_rate(rate)?;
        }
        if let Some(dispersion) = self.dirichlet_dispersion {
            ensure_dirichlet_dispersion(dispersion)?;
        }
        if let Some(ref frequencies) = self.nucleotide_frequencies {
            ensure_nucleotide_frequencies(frequencies)?;
        }
        Ok(())
    }
}

fn ensure_population_mutation_rate(rate: f64) -> Result<(), Error> {
    if rate > 0.0 && rate.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidPopulationMutationRate { value: rate })
    }
}

fn ensure_mutation_rate(name: &'static str, rate: f64) -> Result<(), Error> {
    if (0.0..=1.0).contains(&rate) {
        Ok(())
    } else {
        Err(Error::InvalidMutationRate { name, value: rate })
    }
}

fn ensure_sequencing_error_rate(rate: f64) -> Result<(), Error> {
    if (0.0..1.0).contains(&rate) {
        Ok(())
    } else {
        Err(Error::InvalidSequencingErrorRate { value: rate })
    }
}

fn ensure_dirichlet_dispersion(dispersion: f64) -> Result<(), Error> {
    if dispersion > 0.0 && dispersion.is_finite() {
        Ok(())
    } else {
        Err(Error::InvalidDirichletDispersion { value: dispersion })
    }
}

fn ensure_nucleotide_frequencies(frequencies: &[f64; 4]) -> Result<(), Error> {
    let sum: f64 = frequencies.iter().sum();
    if frequencies.iter().all(|&f| f >= 0.0)
        && approx_equal(sum, 1.0, FREQUENCY_SUM_TOLERANCE)
    {
        Ok(())
    } else {
        Err(Error::InvalidNucleotideFrequencies { sum })
    }
}

/// The trio model: parameters plus derived matrices.
#[derive(Clone, Debug, Getters)]
pub struct TrioModel {
    #[getset(get = "pub")]
    parameters: Parameters,
    priors: priors::PopulationPriors,
    germline: germline::GermlineMatrices,
    somatic: somatic::SomaticMatrices,
    alphas: Array2<f64>,
}

impl Default for TrioModel {
    fn default() -> Self {
        TrioModel::new(Parameters::default())
    }
}

impl TrioModel {
    /// Build the model, eagerly deriving all rate-dependent matrices.
    pub fn new(parameters: Parameters) -> Self {
        let priors = priors::derive(&parameters);
        let germline = germline::derive(parameters.germline_mutation_rate());
        let somatic = somatic::derive(parameters.somatic_mutation_rate());
        let alphas = likelihood::genotype_alphas(
            parameters.dirichlet_dispersion(),
            parameters.sequencing_error_rate(),
        );
        TrioModel {
            parameters,
            priors,
            germline,
            somatic,
            alphas,
        }
    }

    /// Probability of at least one germline de novo mutation at the given
    /// site, as the ratio of the mutation-restricted over the unrestricted
    /// pedigree evaluation.
    pub fn mutation_probability(&self, site: &TrioReadCounts) -> f64 {
        self.evaluate(site).probability()
    }

    /// Peel the pedigree bottom-up for one site.
    pub fn evaluate(&self, site: &TrioReadCounts) -> Evaluation {
        let (likelihoods, ln_scale) = likelihood::sequencing_likelihoods(&self.alphas, site);

        // marginalize the somatic layer: P(reads | true genotype)
        let child_somatic = self.somatic.full.dot(&likelihoods.row(0));
        let mother_somatic = self.somatic.full.dot(&likelihoods.row(1));
        let father_somatic = self.somatic.full.dot(&likelihoods.row(2));

        // project child evidence through the germline layer onto parent pairs
        let child_germline = self.germline.full.t().dot(&child_somatic);
        let child_germline_mutation = self.germline.with_mutation.t().dot(&child_somatic);

        let mut parent_evidence = Array1::zeros(PARENT_PAIR_COUNT);
        for (mother, father) in iproduct!(0..GENOTYPE_COUNT, 0..GENOTYPE_COUNT) {
            parent_evidence[GENOTYPE_COUNT * mother + father] =
                mother_somatic[mother] * father_somatic[father];
        }

        let root = &self.priors.parent_pair * &parent_evidence;
        let denominator = (&child_germline * &root).sum();
        let numerator = (&child_germline_mutation * &root).sum();
        assert!(denominator > 0.0);

        Evaluation {
            site: *site,
            likelihoods,
            ln_scale,
            child_somatic,
            mother_somatic,
            father_somatic,
            child_germline,
            child_germline_mutation,
            parent_evidence,
            numerator,
            denominator,
        }
    }

    /// Posterior distributions over each individual's sequenced genotype,
    /// peeling the pedigree with the focal individual's likelihood factored
    /// out.
    pub fn genotype_posteriors(&self, evaluation: &Evaluation) -> GenotypePosteriors {
        // evidence from the rest of the pedigree for each true parent genotype
        let mut mother_weights = Array1::zeros(GENOTYPE_COUNT);
        let mut father_weights = Array1::zeros(GENOTYPE_COUNT);
        for (mother, father) in iproduct!(0..GENOTYPE_COUNT, 0..GENOTYPE_COUNT) {
            let pair = GENOTYPE_COUNT * mother + father;
            let weight = self.priors.parent_pair[pair] * evaluation.child_germline[pair];
            mother_weights[mother] += weight * evaluation.father_somatic[father];
            father_weights[father] += weight * evaluation.mother_somatic[mother];
        }
        // and for each true child genotype
        let child_weights = self
            .germline
            .full
            .dot(&(&self.priors.parent_pair * &evaluation.parent_evidence));

        let posterior = |weights: &Array1<f64>, row: usize| {
            let unnormalized =
                &self.somatic.full.t().dot(weights) * &evaluation.likelihoods.row(row);
            let sum = unnormalized.sum();
            assert!(sum > 0.0);
            unnormalized / sum
        };

        GenotypePosteriors {
            child: posterior(&child_weights, 0),
            mother: posterior(&mother_weights, 1),
            father: posterior(&father_weights, 2),
        }
    }

    /// Structural equality of all parameters within the given epsilon.
    pub fn approx_eq(&self, other: &TrioModel, epsilon: f64) -> bool {
        let a = &self.parameters;
        let b = &other.parameters;
        approx_equal(
            a.population_mutation_rate(),
            b.population_mutation_rate(),
            epsilon,
        ) && approx_equal(
            a.germline_mutation_rate(),
            b.germline_mutation_rate(),
            epsilon,
        ) && approx_equal(a.somatic_mutation_rate(), b.somatic_mutation_rate(), epsilon)
            && approx_equal(
                a.sequencing_error_rate(),
                b.sequencing_error_rate(),
                epsilon,
            )
            && approx_equal(a.dirichlet_dispersion(), b.dirichlet_dispersion(), epsilon)
            && a.nucleotide_frequencies()
                .iter()
                .zip(b.nucleotide_frequencies().iter())
                .all(|(&x, &y)| approx_equal(x, y, epsilon))
    }

    pub fn set_population_mutation_rate(&mut self, rate: f64) -> Result<(), Error> {
        ensure_population_mutation_rate(rate)?;
        self.parameters.population_mutation_rate = rate;
        self.priors = priors::derive(&self.parameters);
        Ok(())
    }

    pub fn set_germline_mutation_rate(&mut self, rate: f64) -> Result<(), Error> {
        ensure_mutation_rate("germline mutation rate", rate)?;
        self.parameters.germline_mutation_rate = rate;
        self.germline = germline::derive(rate);
        Ok(())
    }

    pub fn set_somatic_mutation_rate(&mut self, rate: f64) -> Result<(), Error> {
        ensure_mutation_rate("somatic mutation rate", rate)?;
        self.parameters.somatic_mutation_rate = rate;
        self.somatic = somatic::derive(rate);
        Ok(())
    }

    pub fn set_sequencing_error_rate(&mut self, rate: f64) -> Result<(), Error> {
        ensure_sequencing_error_rate(rate)?;
        self.parameters.sequencing_error_rate = rate;
        self.rebuild_alphas();
        Ok(())
    }

    pub fn set_dirichlet_dispersion(&mut self, dispersion: f64) -> Result<(), Error> {
        ensure_dirichlet_dispersion(dispersion)?;
        self.parameters.dirichlet_dispersion = dispersion;
        self.rebuild_alphas();
        Ok(())
    }

    pub fn set_nucleotide_frequencies(&mut self, frequencies: [f64; 4]) -> Result<(), Error> {
        ensure_nucleotide_frequencies(&frequencies)?;
        self.parameters.nucleotide_frequencies = frequencies;
        self.priors = priors::derive(&self.parameters);
        Ok(())
    }

    fn rebuild_alphas(&mut self) {
        self.alphas = likelihood::genotype_alphas(
            self.parameters.dirichlet_dispersion(),
            self.parameters.sequencing_error_rate(),
        );
    }

    pub fn population_priors_single(&self) -> &Array1<f64> {
        &self.priors.single
    }

    pub fn population_priors(&self) -> &Array1<f64> {
        &self.priors.parent_pair
    }

    pub fn germline_matrix_single(&self) -> &Array2<f64> {
        &self.germline.single
    }

    pub fn germline_matrix(&self) -> &Array2<f64> {
        &self.germline.full
    }

    pub fn germline_matrix_no_mutation(&self) -> &Array2<f64> {
        &self.germline.no_mutation
    }

    pub fn germline_matrix_with_mutation(&self) -> &Array2<f64> {
        &self.germline.with_mutation
    }

    pub fn somatic_matrix(&self) -> &Array2<f64> {
        &self.somatic.full
    }

    pub fn somatic_matrix_diagonal(&self) -> &Array2<f64> {
        &self.somatic.diagonal
    }

    pub fn alphas(&self) -> &Array2<f64> {
        &self.alphas
    }

    pub fn homozygous_match(&self) -> f64 {
        self.germline.homozygous_match
    }

    pub fn heterozygous_match(&self) -> f64 {
        self.germline.heterozygous_match
    }

    pub fn no_match(&self) -> f64 {
        self.germline.no_match
    }
}

/// The peeled pedigree for one site.
#[derive(Clone, Debug, Getters, CopyGetters)]
pub struct Evaluation {
    #[getset(get = "pub")]
    site: TrioReadCounts,
    /// 3x16 sequencing likelihoods (rows: child, mother, father), rescaled
    /// per row by the maximum entry.
    #[getset(get = "pub")]
    likelihoods: Array2<f64>,
    ln_scale: f64,
    pub(crate) child_somatic: Array1<f64>,
    pub(crate) mother_somatic: Array1<f64>,
    pub(crate) father_somatic: Array1<f64>,
    pub(crate) child_germline: Array1<f64>,
    pub(crate) child_germline_mutation: Array1<f64>,
    pub(crate) parent_evidence: Array1<f64>,
    /// Pedigree mass restricted to mutation-containing germline paths.
    #[getset(get_copy = "pub")]
    numerator: f64,
    /// Unrestricted pedigree mass.
    #[getset(get_copy = "pub")]
    denominator: f64,
}

impl Evaluation {
    /// Probability of at least one germline de novo mutation at this site.
    pub fn probability(&self) -> f64 {
        let probability = self.numerator / self.denominator;
        assert!((0.0..=1.0).contains(&probability));
        probability
    }

    /// Absolute log-likelihood of the site under the model.
    pub fn ln_likelihood(&self) -> f64 {
        self.denominator.ln() + self.ln_scale
    }
}

/// Posterior genotype distributions of the three individuals at one site.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct GenotypePosteriors {
    child: Array1<f64>,
    mother: Array1<f64>,
    father: Array1<f64>,
}

impl GenotypePosteriors {
    pub fn individuals(&self) -> [&Array1<f64>; 3] {
        [&self.child, &self.mother, &self.father]
    }
}
