// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Chinese remainder reconstruction of exact integers.
//!
//! Given residues a_i modulo pairwise coprime m_i, Garner's mixed radix
//! method computes the unique x in [0, M) where M = Prod(m_i):
//!
//!   x = t_1 + t_2 m_1 + t_3 m_1 m_2 + ...
//!
//! where each digit t_i is in [0, m_i). The sign is then recovered by
//! mapping x to the symmetric range (-M/2, M/2].
//!
//! Gauss's construction Sum(a_i M_i (M_i^-1 mod m_i)) mod M
//! is also provided as an independent check.

use bnum::cast::CastFrom;
use rayon::prelude::*;

use crate::arith::{ZmodP, MAX_MODULUS};
use crate::{Error, Int, Uint};

// Leave room for the sign bit and for additions in Gauss's method.
const MAX_PRODUCT_BITS: u32 = 510;

/// Product of moduli, checked against the capacity of Uint.
pub fn modulus_product(moduli: &[u64]) -> Result<Uint, Error> {
    moduli.iter().try_fold(Uint::ONE, |m, &p| mul_word(&m, p))
}

fn mul_word(m: &Uint, p: u64) -> Result<Uint, Error> {
    match m.checked_mul(Uint::from(p)) {
        Some(mp) if mp.bits() <= MAX_PRODUCT_BITS => Ok(mp),
        _ => Err(Error::ProductTooLarge {
            bits: m.bits() + (64 - p.leading_zeros()),
        }),
    }
}

fn rem_word(x: &Uint, p: u64) -> u64 {
    (*x % Uint::from(p)).digits()[0]
}

fn field(m: u64) -> Result<ZmodP, Error> {
    if m < 2 || m >= MAX_MODULUS {
        return Err(Error::InvalidModulus(m));
    }
    Ok(ZmodP::new(m))
}

/// Garner's algorithm on a sequence of (residue, modulus) pairs.
/// Returns (x, M) where x in [0, M) is the unique solution.
pub fn mixed_radix(column: &[(u64, u64)]) -> Result<(Uint, Uint), Error> {
    column
        .iter()
        .try_fold((Uint::ZERO, Uint::ONE), |(x, running), &(a, m)| {
            let zm = field(m)?;
            let rinv = zm
                .inv(rem_word(&running, m))
                .map_err(|_| Error::NonCoprimeModuli { modulus: m })?;
            let t = zm.mul(zm.sub(a % m, rem_word(&x, m)), rinv);
            let next = mul_word(&running, m)?;
            Ok((x + Uint::from(t) * running, next))
        })
}

/// Maps x in [0, M) to the symmetric range: x - M if x > M/2.
pub fn to_signed(x: &Uint, m: &Uint) -> Int {
    debug_assert!(x < m);
    if *x > *m >> 1 {
        Int::cast_from(*x) - Int::cast_from(*m)
    } else {
        Int::cast_from(*x)
    }
}

/// Signed integer congruent to each residue.
pub fn reconstruct(column: &[(u64, u64)]) -> Result<Int, Error> {
    let (x, m) = mixed_radix(column)?;
    Ok(to_signed(&x, &m))
}

/// Gauss's construction. Returns x in [0, M).
pub fn gauss(column: &[(u64, u64)]) -> Result<Uint, Error> {
    let moduli: Vec<u64> = column.iter().map(|&(_, m)| m).collect();
    let m = modulus_product(&moduli)?;
    let mut sum = Uint::ZERO;
    for &(a, mi) in column {
        let zm = field(mi)?;
        let cofactor = m / Uint::from(mi);
        let y = zm
            .inv(rem_word(&cofactor, mi))
            .map_err(|_| Error::NonCoprimeModuli { modulus: mi })?;
        // cofactor * (a y mod mi) < M
        let term = cofactor * Uint::from(zm.mul(a % mi, y));
        sum = (sum + term) % m;
    }
    Ok(sum)
}

/// Precomputed data for Garner's algorithm with a fixed list of moduli:
/// the prefix products m_1...m_(i-1) and their inverses modulo m_i.
#[derive(Clone, Debug)]
pub struct CrtBasis {
    moduli: Vec<u64>,
    prefix: Vec<Uint>,
    prefix_inv: Vec<u64>,
    product: Uint,
}

impl CrtBasis {
    pub fn new(moduli: &[u64]) -> Result<Self, Error> {
        let mut prefix = Vec::with_capacity(moduli.len());
        let mut prefix_inv = Vec::with_capacity(moduli.len());
        let mut running = Uint::ONE;
        for &m in moduli {
            let zm = field(m)?;
            let rinv = zm
                .inv(rem_word(&running, m))
                .map_err(|_| Error::NonCoprimeModuli { modulus: m })?;
            prefix.push(running);
            prefix_inv.push(rinv);
            running = mul_word(&running, m)?;
        }
        Ok(CrtBasis {
            moduli: moduli.to_vec(),
            prefix,
            prefix_inv,
            product: running,
        })
    }

    pub fn product(&self) -> &Uint {
        &self.product
    }

    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Value in [0, M) with the given residues (in the order of moduli).
    pub fn mixed_radix(&self, residues: &[u64]) -> Result<Uint, Error> {
        if residues.len() != self.moduli.len() {
            return Err(Error::ResidueCount {
                expected: self.moduli.len(),
                got: residues.len(),
            });
        }
        let mut x = Uint::ZERO;
        for i in 0..residues.len() {
            let zm = ZmodP::new(self.moduli[i]);
            let a = residues[i] % zm.p;
            let t = zm.mul(zm.sub(a, rem_word(&x, zm.p)), self.prefix_inv[i]);
            x += Uint::from(t) * self.prefix[i];
        }
        Ok(x)
    }

    pub fn reconstruct(&self, residues: &[u64]) -> Result<Int, Error> {
        Ok(to_signed(&self.mixed_radix(residues)?, &self.product))
    }

    /// Reconstructs every coefficient of a residue matrix,
    /// where rows[i] holds residues modulo moduli[i].
    /// All rows must have the same length.
    pub fn reconstruct_rows(
        &self,
        rows: &[Vec<u64>],
        tpool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<Int>, Error> {
        if rows.len() != self.moduli.len() {
            return Err(Error::ResidueCount {
                expected: self.moduli.len(),
                got: rows.len(),
            });
        }
        let len = rows.first().map_or(0, |r| r.len());
        if let Some(r) = rows.iter().find(|r| r.len() != len) {
            return Err(Error::ResidueCount {
                expected: len,
                got: r.len(),
            });
        }
        let column = |j: usize| -> Result<Int, Error> {
            let residues: Vec<u64> = rows.iter().map(|r| r[j]).collect();
            self.reconstruct(&residues)
        };
        match tpool {
            Some(pool) => pool.install(|| (0..len).into_par_iter().map(column).collect()),
            None => (0..len).map(column).collect(),
        }
    }
}
