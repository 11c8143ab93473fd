use approx::assert_relative_eq;

use denovotrio::estimation::{ExpectationMaximization, SufficientStatistics};
use denovotrio::model::{ParametersBuilder, ReadCounts, TrioModel, TrioReadCounts};
use denovotrio::simulation;

fn uniform_site(depth: u32) -> TrioReadCounts {
    let reads = ReadCounts::new([depth, 0, 0, 0]);
    TrioReadCounts::new(reads, reads, reads)
}

#[test]
fn test_prior_rows_sum_to_one() {
    let model = TrioModel::default();
    assert_relative_eq!(model.population_priors_single().sum(), 1.0, epsilon = 1e-9);
    assert_relative_eq!(model.population_priors().sum(), 1.0, epsilon = 1e-9);
}

#[test]
fn test_germline_variants_partition_transition_matrix() {
    let model = TrioModel::default();
    let reconstructed = model.germline_matrix_no_mutation() + model.germline_matrix_with_mutation();
    for (expected, actual) in model.germline_matrix().iter().zip(reconstructed.iter()) {
        assert_relative_eq!(expected, actual, epsilon = 1e-15);
    }
}

#[test]
fn test_golden_concordant_trio() {
    // all three individuals homozygous A at depth 30: no evidence of a
    // transmission error, the probability stays below the prior-only
    // baseline driven by the mutation rates
    let model = TrioModel::default();
    let baseline = model.mutation_probability(&uniform_site(0));
    let probability = model.mutation_probability(&uniform_site(30));
    assert!(probability > 0.0);
    assert!(probability <= baseline);
    assert!(probability < model.parameters().population_mutation_rate());
    // golden regression value: prior-only baseline is 1 - (1 - g)^2
    let g = model.parameters().germline_mutation_rate();
    assert_relative_eq!(baseline, 1.0 - (1.0 - g) * (1.0 - g), epsilon = 1e-12);
}

#[test]
fn test_discordant_trio_raises_probability() {
    // child shows an allele neither parent carries
    let model = TrioModel::default();
    let site = TrioReadCounts::new(
        ReadCounts::new([15, 15, 0, 0]),
        ReadCounts::new([30, 0, 0, 0]),
        ReadCounts::new([30, 0, 0, 0]),
    );
    let concordant = model.mutation_probability(&uniform_site(30));
    let discordant = model.mutation_probability(&site);
    assert!(discordant > concordant);
    assert!(discordant <= 1.0);
}

#[test]
fn test_evaluation_is_reproducible() {
    let model = TrioModel::default();
    let site = TrioReadCounts::new(
        ReadCounts::new([12, 3, 0, 1]),
        ReadCounts::new([20, 0, 0, 0]),
        ReadCounts::new([0, 17, 2, 2]),
    );
    assert_eq!(
        model.mutation_probability(&site),
        model.mutation_probability(&site)
    );
}

#[test]
fn test_em_convergence_on_clean_reads() {
    let mut model = TrioModel::new(
        ParametersBuilder::default()
            .sequencing_error_rate(0.01)
            .build()
            .unwrap(),
    );
    let sites = vec![uniform_site(40)];
    let fit = ExpectationMaximization::default()
        .fit(&mut model, &sites)
        .unwrap();
    assert!(fit.converged());
    assert!(fit.sequencing_error_rate() < 1e-6);
    assert!(fit.iterations() <= 10);
}

#[test]
fn test_em_agrees_with_manual_steps() {
    let model = TrioModel::default();
    let sites = vec![uniform_site(40)];
    let mut stats = SufficientStatistics::new();
    stats.update(&model, &sites);
    let candidate = stats.max_sequencing_error_rate();
    stats.clear();
    stats.update(&model, &sites);
    assert_relative_eq!(candidate, stats.max_sequencing_error_rate());
}

#[test]
fn test_models_with_identical_parameters_are_equal() {
    let a = TrioModel::default();
    let b = TrioModel::default();
    assert!(a.approx_eq(&b, 1e-12));
}

#[test]
fn test_simulation_cross_check() {
    let input = b"0\t10\t90\n1\t0\t0\n" as &[u8];
    let records = simulation::read_counts(input).unwrap();
    let probabilities = simulation::empirical_probabilities(&records);
    assert_relative_eq!(probabilities[0], 0.1);
    assert_relative_eq!(probabilities[1], 0.0);
}
