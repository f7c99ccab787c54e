// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Exact polynomial products using several NTT primes.
//!
//! The product is computed modulo each prime independently,
//! and coefficients are recovered by Chinese remaindering.
//! This is correct as long as the product M of primes
//! exceeds 2 B + 1 where B bounds the absolute value of
//! product coefficients: this is checked before any transform.

use std::cmp::min;
use std::time::Instant;

use rayon::prelude::*;

use crate::convolve::{self, transform_size};
use crate::crt::CrtBasis;
use crate::modulus::Modulus;
use crate::roots::{check_capacity, RootSupplier};
use crate::{Error, Int, Preferences, Uint, Verbosity};

/// A set of distinct NTT primes, in a fixed order which is
/// also the order of Chinese remaindering.
#[derive(Clone, Debug)]
pub struct MultiModulus {
    moduli: Vec<Modulus>,
    basis: CrtBasis,
}

impl MultiModulus {
    pub fn new(moduli: Vec<Modulus>) -> Result<Self, Error> {
        for (i, m) in moduli.iter().enumerate() {
            if moduli[..i].iter().any(|m2| m2.p == m.p) {
                return Err(Error::NonCoprimeModuli { modulus: m.p });
            }
        }
        let primes: Vec<u64> = moduli.iter().map(|m| m.p).collect();
        let basis = CrtBasis::new(&primes)?;
        Ok(MultiModulus { moduli, basis })
    }

    pub fn moduli(&self) -> &[Modulus] {
        &self.moduli
    }

    /// The product M of all primes.
    pub fn product(&self) -> &Uint {
        self.basis.product()
    }

    /// Largest transform order supported by all primes.
    pub fn max_order(&self) -> Option<u64> {
        self.moduli.iter().map(|m| m.max_order()).min()
    }

    /// Product of a and b, where max_abs bounds the absolute value
    /// of the product coefficients.
    pub fn multiply_exact(
        &self,
        a: &[i64],
        b: &[i64],
        max_abs: &Uint,
        prefs: &Preferences,
        tpool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<Int>, Error> {
        self.multiply_exact_with(a, b, max_abs, self, prefs, tpool)
    }

    /// Same as multiply_exact, where roots of unity are obtained
    /// from the given supplier instead of the moduli generators.
    pub fn multiply_exact_with<R: RootSupplier + Sync + ?Sized>(
        &self,
        a: &[i64],
        b: &[i64],
        max_abs: &Uint,
        roots: &R,
        prefs: &Preferences,
        tpool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<Int>, Error> {
        let Some((l, n)) = transform_size(a.len(), b.len()) else {
            return Ok(vec![]);
        };
        let required = required_product(max_abs)?;
        if *self.product() <= required {
            return Err(Error::InsufficientModulusProduct {
                got: *self.product(),
                required,
            });
        }
        for m in &self.moduli {
            check_capacity(m.p, n as u64)?;
        }
        if prefs.verbose(Verbosity::Info) {
            eprintln!(
                "Multiplying lengths {}x{} (N={n}) using {} primes ({} bits)",
                a.len(),
                b.len(),
                self.moduli.len(),
                self.product().bits()
            );
        }
        let rows = self.residues(a, b, roots, prefs, tpool)?;
        let start = Instant::now();
        let res = self.basis.reconstruct_rows(&rows, tpool)?;
        if prefs.verbose(Verbosity::Verbose) {
            eprintln!(
                "Reconstructed {l} coefficients in {:.3}s",
                start.elapsed().as_secs_f64()
            );
        }
        debug_assert_eq!(res.len(), l);
        Ok(res)
    }

    /// Same as multiply_exact, bounding coefficients from the inputs.
    pub fn multiply(
        &self,
        a: &[i64],
        b: &[i64],
        prefs: &Preferences,
        tpool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<Int>, Error> {
        self.multiply_exact(a, b, &coefficient_bound(a, b), prefs, tpool)
    }

    /// The residue matrix: row i is the product modulo the i-th prime.
    /// The first failure aborts the whole computation.
    pub fn residues<R: RootSupplier + Sync + ?Sized>(
        &self,
        a: &[i64],
        b: &[i64],
        roots: &R,
        prefs: &Preferences,
        tpool: Option<&rayon::ThreadPool>,
    ) -> Result<Vec<Vec<u64>>, Error> {
        let row = |m: &Modulus| -> Result<Vec<u64>, Error> {
            let start = Instant::now();
            let res = convolve::convolve_with(a, b, m, roots, prefs.verbosity)?;
            if prefs.verbose(Verbosity::Verbose) {
                eprintln!(
                    "Convolution modulo {} in {:.3}s",
                    m.p,
                    start.elapsed().as_secs_f64()
                );
            }
            Ok(res)
        };
        match tpool {
            Some(pool) => pool.install(|| self.moduli.par_iter().map(row).collect()),
            None => self.moduli.iter().map(row).collect(),
        }
    }
}

/// Roots of unity derived from the generator of each modulus.
impl RootSupplier for MultiModulus {
    fn primitive_root(&self, p: u64, n: u64) -> Result<u64, Error> {
        match self.moduli.iter().find(|m| m.p == p) {
            Some(m) => m.root_of_unity(n),
            None => Err(Error::InvalidModulus(p)),
        }
    }
}

/// The bound 2 max_abs + 1 which the product of moduli must exceed.
pub fn required_product(max_abs: &Uint) -> Result<Uint, Error> {
    max_abs
        .checked_mul(Uint::from(2u64))
        .and_then(|x| x.checked_add(Uint::ONE))
        .ok_or(Error::ProductTooLarge {
            bits: max_abs.bits() + 1,
        })
}

/// An upper bound on the absolute value of coefficients of a*b:
/// min(len a, len b) max|a| max|b|.
pub fn coefficient_bound(a: &[i64], b: &[i64]) -> Uint {
    let amax = a.iter().map(|x| x.unsigned_abs()).max().unwrap_or(0);
    let bmax = b.iter().map(|x| x.unsigned_abs()).max().unwrap_or(0);
    let terms = min(a.len(), b.len()) as u64;
    Uint::from(amax) * Uint::from(bmax) * Uint::from(terms)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arith::ZmodP;
    use crate::roots::OrderSearch;
    use num_traits::ToPrimitive;
    use rand::{self, Rng};

    fn primes3() -> Vec<Modulus> {
        vec![
            Modulus::new(469762049, 3).unwrap(),
            Modulus::new(998244353, 3).unwrap(),
            Modulus::new(167772161, 3).unwrap(),
        ]
    }

    fn schoolbook(a: &[i64], b: &[i64]) -> Vec<i128> {
        let mut res = vec![0; a.len() + b.len() - 1];
        for i in 0..a.len() {
            for j in 0..b.len() {
                res[i + j] += a[i] as i128 * b[j] as i128;
            }
        }
        res
    }

    #[test]
    fn test_exact_large_coefficient() {
        // 500_000_000 aliases to 30237951 modulo 469762049 alone.
        let max_abs = Uint::from(500_000_000u64);
        let single = MultiModulus::new(primes3()[..1].to_vec()).unwrap();
        assert_eq!(
            single.multiply_exact(&[25000], &[20000], &max_abs, &Preferences::default(), None),
            Err(Error::InsufficientModulusProduct {
                got: Uint::from(469762049u64),
                required: Uint::from(1_000_000_001u64),
            })
        );
        let mm = MultiModulus::new(primes3()).unwrap();
        let res = mm
            .multiply_exact(&[25000], &[20000], &max_abs, &Preferences::default(), None)
            .unwrap();
        assert_eq!(res, vec![Int::from(500_000_000i64)]);
    }

    #[test]
    fn test_exact_2_60() {
        // (2^30 + 2^30 x)^2 = 2^60 + 2^61 x + 2^60 x^2
        let primes = vec![
            Modulus::new(2013265921, 31).unwrap(),
            Modulus::new(469762049, 3).unwrap(),
            Modulus::new(1811939329, 13).unwrap(),
        ];
        let mm = MultiModulus::new(primes).unwrap();
        let x = 1i64 << 30;
        let res = mm
            .multiply(&[x, x], &[x, x], &Preferences::default(), None)
            .unwrap();
        let expect: Vec<Int> = [1i64 << 60, 1 << 61, 1 << 60]
            .iter()
            .map(|&c| Int::from(c))
            .collect();
        assert_eq!(res, expect);
    }

    #[test]
    fn test_exact_small() {
        let mm = MultiModulus::new(primes3()).unwrap();
        let prefs = Preferences::default();
        let res = mm.multiply(&[1, 2, 3], &[4, 5], &prefs, None).unwrap();
        let expect: Vec<Int> = [4i64, 13, 22, 15].iter().map(|&c| Int::from(c)).collect();
        assert_eq!(res, expect);
        let res = mm.multiply(&[1, -2, 3], &[-4, 5], &prefs, None).unwrap();
        let expect: Vec<Int> = [-4i64, 13, -22, 15].iter().map(|&c| Int::from(c)).collect();
        assert_eq!(res, expect);
        assert_eq!(mm.multiply(&[], &[1, 2], &prefs, None), Ok(vec![]));
    }

    #[test]
    fn test_exact_random() {
        let mut rng = rand::thread_rng();
        let mm = MultiModulus::new(primes3()).unwrap();
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let prefs = Preferences::default();
        for (la, lb) in [(1, 1), (5, 3), (64, 65), (300, 200), (1000, 1000)] {
            let a: Vec<i64> = (0..la).map(|_| rng.gen_range(-(1 << 30)..1 << 30)).collect();
            let b: Vec<i64> = (0..lb).map(|_| rng.gen_range(-(1 << 30)..1 << 30)).collect();
            let expect = schoolbook(&a, &b);
            let res = mm.multiply(&a, &b, &prefs, None).unwrap();
            let resp = mm.multiply(&a, &b, &prefs, Some(&pool)).unwrap();
            assert_eq!(res, resp);
            assert_eq!(res.len(), expect.len());
            for i in 0..res.len() {
                assert_eq!(res[i].to_i128(), Some(expect[i]), "index {i}");
            }
        }
    }

    // Squares of valid roots have half the required order.
    struct SquaredRoots;

    impl RootSupplier for SquaredRoots {
        fn primitive_root(&self, p: u64, n: u64) -> Result<u64, Error> {
            let w = OrderSearch.primitive_root(p, n)?;
            Ok(ZmodP::new(p).mul(w, w))
        }
    }

    #[test]
    fn test_root_supplier() {
        let mm = MultiModulus::new(primes3()).unwrap();
        let prefs = Preferences::default();
        let a: [i64; 4] = [1 << 40, -(1 << 41), 3, 12345];
        let b: [i64; 3] = [-7, 1 << 20, 99];
        let bound = coefficient_bound(&a, &b);
        let expect = mm.multiply_exact(&a, &b, &bound, &prefs, None).unwrap();
        let res = mm.multiply_exact_with(&a, &b, &bound, &OrderSearch, &prefs, None);
        assert_eq!(res, Ok(expect.clone()));
        let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
        let res = mm.multiply_exact_with(&a, &b, &bound, &OrderSearch, &prefs, Some(&pool));
        assert_eq!(res, Ok(expect));
        // Product length 6 requires N=8.
        let w8 = OrderSearch.primitive_root(469762049, 8).unwrap();
        let zp = ZmodP::new(469762049);
        assert_eq!(
            mm.multiply_exact_with(&a, &b, &bound, &SquaredRoots, &prefs, None),
            Err(Error::PrimitiveRoot {
                p: 469762049,
                n: 8,
                candidate: zp.mul(w8, w8)
            })
        );
        assert_eq!(mm.primitive_root(998244353, 8), mm.moduli()[1].root_of_unity(8));
        assert_eq!(mm.primitive_root(17, 8), Err(Error::InvalidModulus(17)));
    }

    #[test]
    fn test_preconditions() {
        let mut primes = primes3();
        primes.push(primes[1]);
        assert_eq!(
            MultiModulus::new(primes).map(|_| ()),
            Err(Error::NonCoprimeModuli { modulus: 998244353 })
        );
        // 998244353 only supports N <= 2^23.
        let mm = MultiModulus::new(primes3()).unwrap();
        assert_eq!(mm.max_order(), Some(1 << 23));
        let a = vec![1; (1 << 22) + 1];
        assert_eq!(
            mm.multiply(&a, &a, &Preferences::default(), None),
            Err(Error::Capacity {
                p: 998244353,
                n: 1 << 24
            })
        );
        // No primes at all.
        let empty = MultiModulus::new(vec![]).unwrap();
        assert!(matches!(
            empty.multiply(&[1], &[1], &Preferences::default(), None),
            Err(Error::InsufficientModulusProduct { .. })
        ));
    }

    #[test]
    fn test_coefficient_bound() {
        assert_eq!(coefficient_bound(&[1, -7, 3], &[2, 5]), Uint::from(70u64));
        assert_eq!(coefficient_bound(&[], &[2, 5]), Uint::ZERO);
        assert_eq!(
            coefficient_bound(&[i64::MIN], &[i64::MIN]),
            Uint::from(1u128 << 126)
        );
        assert_eq!(required_product(&Uint::from(1155u64)), Ok(Uint::from(2311u64)));
    }
}
