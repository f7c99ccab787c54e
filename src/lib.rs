// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Exact multiplication of integer polynomials using number-theoretic
//! transforms under several NTT-friendly primes, followed by
//! Chinese remainder reconstruction of signed coefficients.
//!
//! The entry point is [`multiply_exact`] or, for repeated use with the
//! same set of primes, [`multimod::MultiModulus`].

use std::fmt;
use std::str::FromStr;

pub mod arith;
pub mod crt;
pub mod modulus;
pub mod roots;

// Transforms and products
pub mod convolve;
pub mod multimod;
pub mod ntt;

// Prime suppliers
pub mod primes;

pub use modulus::Modulus;

// Reconstructed coefficients may exceed machine words.
pub type Int = bnum::types::I512;
pub type Uint = bnum::types::U512;

/// Multiplies polynomials a and b exactly, using the given primes.
///
/// The product of primes must exceed 2 max_abs + 1 where max_abs
/// bounds the absolute value of every coefficient of a*b.
pub fn multiply_exact(
    a: &[i64],
    b: &[i64],
    primes: &[Modulus],
    max_abs: &Uint,
) -> Result<Vec<Int>, Error> {
    let mm = multimod::MultiModulus::new(primes.to_vec())?;
    mm.multiply_exact(a, b, max_abs, &Preferences::default(), None)
}

#[derive(Clone, Debug, Default)]
pub struct Preferences {
    pub threads: Option<usize>,
    pub verbosity: Verbosity,
}

impl Preferences {
    pub fn verbose(&self, v: Verbosity) -> bool {
        self.verbosity >= v
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    #[default]
    Silent,
    Info,
    Verbose,
    Debug,
}

impl FromStr for Verbosity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "silent" => Ok(Self::Silent),
            "info" => Ok(Self::Info),
            "verbose" => Ok(Self::Verbose),
            "debug" => Ok(Self::Debug),
            _ => Err(format!("invalid verbosity level {s:?}")),
        }
    }
}

/// Failures of the multiplication pipeline.
/// They are deterministic functions of the inputs: none is retried.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// Transform order n does not divide p-1.
    Capacity { p: u64, n: u64 },
    /// The candidate does not have exact multiplicative order n modulo p.
    PrimitiveRoot { p: u64, n: u64, candidate: u64 },
    /// No element of order n modulo p was found.
    RootNotFound { p: u64, n: u64 },
    /// The product of moduli cannot represent the coefficient range.
    InsufficientModulusProduct { got: Uint, required: Uint },
    /// Moduli are not pairwise coprime.
    NonCoprimeModuli { modulus: u64 },
    /// Modular inverse of a non-unit.
    NonInvertible { value: u64, modulus: u64 },
    /// Transform length is not a power of two.
    NotPowerOfTwo(usize),
    /// Not a prime, or outside the supported range.
    InvalidModulus(u64),
    /// Product of moduli does not fit the reconstruction integer type.
    ProductTooLarge { bits: u32 },
    /// Residue vector or matrix does not match the number of moduli.
    ResidueCount { expected: usize, got: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Capacity { p, n } => {
                write!(f, "no root of unity of order {n} modulo {p}: {n} does not divide p-1")
            }
            Error::PrimitiveRoot { p, n, candidate } => {
                write!(f, "{candidate} is not a primitive {n}-th root of unity modulo {p}")
            }
            Error::RootNotFound { p, n } => {
                write!(f, "no primitive {n}-th root of unity found modulo {p}")
            }
            Error::InsufficientModulusProduct { got, required } => write!(
                f,
                "product of moduli {got} does not exceed required bound {required}"
            ),
            Error::NonCoprimeModuli { modulus } => {
                write!(f, "modulus {modulus} is not coprime to the other moduli")
            }
            Error::NonInvertible { value, modulus } => {
                write!(f, "{value} is not invertible modulo {modulus}")
            }
            Error::NotPowerOfTwo(len) => write!(f, "transform length {len} is not a power of two"),
            Error::InvalidModulus(p) => write!(f, "invalid modulus {p}"),
            Error::ProductTooLarge { bits } => {
                write!(f, "product of moduli is too large ({bits} bits)")
            }
            Error::ResidueCount { expected, got } => {
                write!(f, "expected {expected} residues, got {got}")
            }
        }
    }
}

impl std::error::Error for Error {}
