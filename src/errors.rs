use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("nucleotide frequencies must be non-negative and sum to 1 (sum is {sum})")]
    InvalidNucleotideFrequencies { sum: f64 },
    #[error("{name} must lie in [0, 1] (got {value})")]
    InvalidMutationRate { name: &'static str, value: f64 },
    #[error("population mutation rate must be positive and finite (got {value})")]
    InvalidPopulationMutationRate { value: f64 },
    #[error("sequencing error rate must lie in [0, 1) (got {value})")]
    InvalidSequencingErrorRate { value: f64 },
    #[error("Dirichlet dispersion must be positive and finite (got {value})")]
    InvalidDirichletDispersion { value: f64 },
    #[error("model parameter {name} has not been set")]
    MissingParameter { name: &'static str },
    #[error("invalid simulation count record at line {line}: {msg}")]
    InvalidCountsRecord { line: usize, msg: String },
    #[error("unable to read simulation counts: {0}")]
    CountsIo(#[from] std::io::Error),
}

impl From<derive_builder::UninitializedFieldError> for Error {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        Error::MissingParameter {
            name: e.field_name(),
        }
    }
}
