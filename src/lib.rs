// Copyright 2016-2019 Johannes Köster, David Lähnemann.
// Licensed under the GNU GPLv3 license (https://opensource.org/licenses/GPL-3.0)
// This file may not be copied, modified, or distributed
// except according to those terms.

//! Probabilistic calling of de novo mutations from parent-child trio sequencing data.
//!
//! The trio model combines population genotype priors, germline transmission,
//! somatic mutation and a Dirichlet-multinomial read likelihood into a joint
//! model over the 256 mother-father genotype combinations. The probability of a
//! de novo mutation at a site is the ratio of two evaluations of that model:
//! the numerator restricted to transmission paths containing at least one
//! germline mutation, the denominator unrestricted.
//!
//! ```
//! use denovotrio::estimation::ExpectationMaximization;
//! use denovotrio::model::{ReadCounts, TrioModel, TrioReadCounts};
//!
//! let model = TrioModel::default();
//! let site = TrioReadCounts::new(
//!     ReadCounts::new([30, 0, 0, 0]),
//!     ReadCounts::new([30, 0, 0, 0]),
//!     ReadCounts::new([30, 0, 0, 0]),
//! );
//! let probability = model.mutation_probability(&site);
//! assert!(probability >= 0.0 && probability <= 1.0);
//!
//! // Fit the sequencing error rate against a collection of sites.
//! let mut model = TrioModel::default();
//! let fit = ExpectationMaximization::default()
//!     .fit(&mut model, &[site])
//!     .unwrap();
//! assert!(fit.converged());
//! ```

#[macro_use]
extern crate approx;
#[macro_use]
extern crate log;
#[macro_use]
extern crate serde_derive;

pub mod errors;
pub mod estimation;
pub mod genotype;
pub mod model;
pub mod simulation;
pub(crate) mod utils;

pub use crate::errors::Error;
