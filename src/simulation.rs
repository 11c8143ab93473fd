// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Empirical cross-check against simulated trio counts.
//!
//! A simulation run tallies, per reference trio, how many simulated replicates
//! carried a mutation and how many did not. The empirical mutation
//! probability of each trio is the ratio of mutated replicates over all
//! replicates, which should match [`crate::model::TrioModel::mutation_probability`]
//! evaluated on the corresponding read data.

use std::io::BufRead;

use getset::CopyGetters;

use crate::errors::Error;

/// One row of a simulation counts file: whitespace-separated trio index,
/// number of replicates with a mutation, number of replicates without.
#[derive(Clone, Copy, Debug, PartialEq, Eq, CopyGetters, Serialize, Deserialize)]
#[getset(get_copy = "pub")]
pub struct SimulatedCounts {
    index: u64,
    with_mutation: u64,
    without_mutation: u64,
}

impl SimulatedCounts {
    pub fn new(index: u64, with_mutation: u64, without_mutation: u64) -> Self {
        SimulatedCounts {
            index,
            with_mutation,
            without_mutation,
        }
    }

    /// Fraction of replicates carrying a mutation; 0 if there are none.
    pub fn empirical_probability(&self) -> f64 {
        let total = self.with_mutation + self.without_mutation;
        if total == 0 {
            0.0
        } else {
            self.with_mutation as f64 / total as f64
        }
    }
}

/// Parse a simulation counts file.
pub fn read_counts<R: BufRead>(reader: R) -> Result<Vec<SimulatedCounts>, Error> {
    let mut records = Vec::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != 3 {
            return Err(Error::InvalidCountsRecord {
                line: i + 1,
                msg: format!("expected 3 columns, found {}", fields.len()),
            });
        }
        let mut parsed = [0u64; 3];
        for (value, field) in parsed.iter_mut().zip(fields.iter()) {
            *value = field.parse().map_err(|e| Error::InvalidCountsRecord {
                line: i + 1,
                msg: format!("{}: {}", field, e),
            })?;
        }
        records.push(SimulatedCounts::new(parsed[0], parsed[1], parsed[2]));
    }
    Ok(records)
}

/// Empirical probabilities of all records, in input order.
pub fn empirical_probabilities(records: &[SimulatedCounts]) -> Vec<f64> {
    records
        .iter()
        .map(SimulatedCounts::empirical_probability)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empirical_probabilities() {
        let records = [
            SimulatedCounts::new(0, 10, 90),
            SimulatedCounts::new(1, 0, 0),
        ];
        let probabilities = empirical_probabilities(&records);
        assert_relative_eq!(probabilities[0], 0.1);
        assert_relative_eq!(probabilities[1], 0.0);
    }

    #[test]
    fn test_read_counts() {
        let input = b"0\t10\t90\n1\t0\t0\n" as &[u8];
        let records = read_counts(input).unwrap();
        assert_eq!(
            records,
            vec![
                SimulatedCounts::new(0, 10, 90),
                SimulatedCounts::new(1, 0, 0),
            ]
        );
    }

    #[test]
    fn test_read_counts_accepts_space_separation() {
        let input = b"0 10 90\n\n1 0 0\n" as &[u8];
        let records = read_counts(input).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_read_counts_rejects_malformed_rows() {
        let input = b"0\t10\n" as &[u8];
        match read_counts(input) {
            Err(Error::InvalidCountsRecord { line, .. }) => assert_eq!(line, 1),
            other => panic!("unexpected result: {:?}", other),
        }
        let input = b"0\t10\t-4\n" as &[u8];
        assert!(read_counts(input).is_err());
    }
}
