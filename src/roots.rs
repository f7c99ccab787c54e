// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Roots of unity modulo NTT-friendly primes.
//!
//! A transform of order N modulo p requires an element of exact
//! multiplicative order N, which exists if and only if N divides p-1.
//! Callers may provide their own supplier: every root handed to the
//! transform is verified again before use.

use crate::arith::{isprime64, prime_factors, ZmodP, MAX_MODULUS};
use crate::Error;

/// A source of primitive roots of unity.
pub trait RootSupplier {
    /// Returns an element of exact multiplicative order n modulo p.
    fn primitive_root(&self, p: u64, n: u64) -> Result<u64, Error>;
}

/// Default supplier: tries g = 2, 3, ... and returns the first
/// g^((p-1)/n) having exact order n.
#[derive(Clone, Copy, Debug, Default)]
pub struct OrderSearch;

// For a power-of-two order, half of the candidates succeed.
const MAX_CANDIDATES: u64 = 1 << 16;

impl RootSupplier for OrderSearch {
    fn primitive_root(&self, p: u64, n: u64) -> Result<u64, Error> {
        check_prime(p)?;
        check_capacity(p, n)?;
        let zp = ZmodP::new(p);
        let cofactor = (p - 1) / n;
        let factors = prime_factors(n);
        for g in 2..std::cmp::min(p, MAX_CANDIDATES) {
            let w = zp.pow(g, cofactor);
            if has_order(&zp, w, n, &factors) {
                return Ok(w);
            }
        }
        Err(Error::RootNotFound { p, n })
    }
}

pub(crate) fn check_prime(p: u64) -> Result<(), Error> {
    if p < 3 || p >= MAX_MODULUS || !isprime64(p) {
        return Err(Error::InvalidModulus(p));
    }
    Ok(())
}

/// Checks that p admits roots of unity of order n.
pub fn check_capacity(p: u64, n: u64) -> Result<(), Error> {
    if n == 0 || (p - 1) % n != 0 {
        return Err(Error::Capacity { p, n });
    }
    Ok(())
}

/// Checks that root has exact multiplicative order n modulo p.
pub fn verify_root(zp: &ZmodP, root: u64, n: u64) -> Result<(), Error> {
    check_capacity(zp.p, n)?;
    if root >= zp.p || !has_order(zp, root, n, &prime_factors(n)) {
        return Err(Error::PrimitiveRoot {
            p: zp.p,
            n,
            candidate: root,
        });
    }
    Ok(())
}

// x has order n iff x^n = 1 and x^(n/q) != 1 for all primes q dividing n.
fn has_order(zp: &ZmodP, x: u64, n: u64, factors: &[u64]) -> bool {
    zp.pow(x, n) == 1 && factors.iter().all(|&q| zp.pow(x, n / q) != 1)
}

/// Whether g generates the multiplicative group modulo prime p.
pub fn is_generator(p: u64, g: u64) -> bool {
    if g == 0 || g >= p {
        return false;
    }
    let zp = ZmodP::new(p);
    has_order(&zp, g, p - 1, &prime_factors(p - 1))
}

/// Smallest generator of the multiplicative group modulo prime p.
pub fn find_generator(p: u64) -> Result<u64, Error> {
    check_prime(p)?;
    let zp = ZmodP::new(p);
    let factors = prime_factors(p - 1);
    (2..p)
        .take(MAX_CANDIDATES as usize)
        .find(|&g| has_order(&zp, g, p - 1, &factors))
        .ok_or(Error::RootNotFound { p, n: p - 1 })
}
