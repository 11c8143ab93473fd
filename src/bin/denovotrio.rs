use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use structopt::StructOpt;

use denovotrio::estimation::ExpectationMaximization;
use denovotrio::model::{ParametersBuilder, ReadCounts, TrioModel, TrioReadCounts};
use denovotrio::simulation;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "denovotrio",
    about = "Probabilistic calling of de novo mutations from parent-child trio read counts."
)]
enum Denovotrio {
    #[structopt(
        name = "mutation-probability",
        about = "Compute the de novo mutation probability for each site of a trio read count file."
    )]
    MutationProbability {
        #[structopt(
            parse(from_os_str),
            help = "Tab-separated file with one site per line: child, mother and father \
                    read counts as four columns (A, C, G, T) each."
        )]
        sites: PathBuf,
        #[structopt(flatten)]
        parameters: ParameterArgs,
    },
    #[structopt(
        name = "estimate-error-rate",
        about = "Fit the sequencing error rate to a trio read count file via expectation-maximization."
    )]
    EstimateErrorRate {
        #[structopt(parse(from_os_str), help = "Tab-separated trio read count file.")]
        sites: PathBuf,
        #[structopt(flatten)]
        parameters: ParameterArgs,
        #[structopt(long, default_value = "100", help = "Maximum number of EM iterations.")]
        max_iterations: usize,
        #[structopt(
            long,
            default_value = "1e-10",
            help = "Convergence tolerance for the error rate estimate."
        )]
        tolerance: f64,
    },
    #[structopt(
        name = "counts-probability",
        about = "Derive empirical mutation probabilities from a simulation counts file \
                 (columns: trio index, replicates with mutation, replicates without)."
    )]
    CountsProbability {
        #[structopt(parse(from_os_str), help = "Simulation counts file.")]
        input: PathBuf,
        #[structopt(
            parse(from_os_str),
            help = "Output file with one probability per line (if omitted, write to STDOUT)."
        )]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, StructOpt)]
struct ParameterArgs {
    #[structopt(long, default_value = "1e-3", help = "Population mutation rate.")]
    population_mutation_rate: f64,
    #[structopt(long, default_value = "2e-8", help = "Germline mutation rate per allele.")]
    germline_mutation_rate: f64,
    #[structopt(long, default_value = "2e-8", help = "Somatic mutation rate per allele.")]
    somatic_mutation_rate: f64,
    #[structopt(long, default_value = "5e-3", help = "Initial sequencing error rate.")]
    sequencing_error_rate: f64,
    #[structopt(
        long,
        default_value = "1000.0",
        help = "Dirichlet-multinomial dispersion of the read likelihood."
    )]
    dirichlet_dispersion: f64,
}

impl ParameterArgs {
    fn model(&self) -> Result<TrioModel> {
        let parameters = ParametersBuilder::default()
            .population_mutation_rate(self.population_mutation_rate)
            .germline_mutation_rate(self.germline_mutation_rate)
            .somatic_mutation_rate(self.somatic_mutation_rate)
            .sequencing_error_rate(self.sequencing_error_rate)
            .dirichlet_dispersion(self.dirichlet_dispersion)
            .build()?;
        Ok(TrioModel::new(parameters))
    }
}

fn read_sites(path: &Path) -> Result<Vec<TrioReadCounts>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("unable to read sites from {}", path.display()))?;
    let mut sites = Vec::new();
    for record in reader.deserialize() {
        let counts: [u32; 12] = record?;
        sites.push(TrioReadCounts::new(
            ReadCounts::new([counts[0], counts[1], counts[2], counts[3]]),
            ReadCounts::new([counts[4], counts[5], counts[6], counts[7]]),
            ReadCounts::new([counts[8], counts[9], counts[10], counts[11]]),
        ));
    }
    Ok(sites)
}

fn main() -> Result<()> {
    let opt = Denovotrio::from_args();

    fern::Dispatch::new()
        .format(|out, message, record| out.finish(format_args!("[{}] {}", record.level(), message)))
        .level(log::LevelFilter::Info)
        .chain(io::stderr())
        .apply()?;

    match opt {
        Denovotrio::MutationProbability { sites, parameters } => {
            let model = parameters.model()?;
            let stdout = io::stdout();
            let mut out = stdout.lock();
            for site in read_sites(&sites)? {
                writeln!(out, "{}", model.mutation_probability(&site))?;
            }
        }
        Denovotrio::EstimateErrorRate {
            sites,
            parameters,
            max_iterations,
            tolerance,
        } => {
            let mut model = parameters.model()?;
            let sites = read_sites(&sites)?;
            let em = ExpectationMaximization::new(max_iterations, tolerance);
            let fit = em.fit(&mut model, &sites)?;
            println!("{:e}", fit.sequencing_error_rate());
            if !fit.converged() {
                anyhow::bail!(
                    "EM did not converge within {} iterations",
                    max_iterations
                );
            }
        }
        Denovotrio::CountsProbability { input, output } => {
            let file = File::open(&input)
                .with_context(|| format!("unable to open {}", input.display()))?;
            let records = simulation::read_counts(BufReader::new(file))?;
            let mut out: Box<dyn Write> = match output {
                Some(path) => Box::new(BufWriter::new(File::create(&path).with_context(
                    || format!("unable to create {}", path.display()),
                )?)),
                None => Box::new(io::stdout()),
            };
            for probability in simulation::empirical_probabilities(&records) {
                writeln!(out, "{}", probability)?;
            }
        }
    }

    Ok(())
}
