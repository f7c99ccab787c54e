// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! NTT-friendly primes p = k 2^n + 1.
//!
//! Primes are ranked by the largest supported transform size first,
//! then by low Hamming weight, then by small generator:
//!
//!   score = 1000 v - 10 popcount(p) - g
//!
//! where v is the 2-adic valuation of p-1.
//!
//! Primes of special forms 2^n - c and 2^n - 2^m +/- 1, which allow
//! fast reduction but rarely large transforms, can also be listed.

use std::fmt;

use crate::arith::{isprime64, two_adic_valuation, ZmodP, MAX_MODULUS};
use crate::crt::modulus_product;
use crate::modulus::Modulus;
use crate::multimod::required_product;
use crate::roots;
use crate::{Error, Uint};

/// Known NTT primes with their smallest generator.
/// The first three are the default configuration of nttmul.
pub const NTT_PRIMES: &[(u64, u64)] = &[
    (2013265921, 31), // 15 2^27 + 1
    (469762049, 3),   // 7 2^26 + 1
    (1811939329, 13), // 27 2^26 + 1
    (998244353, 3),   // 119 2^23 + 1
    (167772161, 3),   // 5 2^25 + 1
    (754974721, 11),  // 45 2^24 + 1
    (3221225473, 5),  // 3 2^30 + 1
    (2281701377, 3),  // 17 2^27 + 1
    (4253024257, 5),  // 507 2^23 + 1
    (104857601, 3),   // 25 2^22 + 1
    (7340033, 3),     // 7 2^20 + 1
];

/// A source of distinct NTT primes supporting a given transform order.
pub trait PrimeSupplier {
    /// Returns at most count distinct primes p such that order divides p-1,
    /// in order of preference.
    fn ntt_primes(&self, order: u64, count: usize) -> Vec<Modulus>;
}

/// Supplies primes from the NTT_PRIMES table.
#[derive(Clone, Copy, Debug, Default)]
pub struct KnownPrimes;

impl PrimeSupplier for KnownPrimes {
    fn ntt_primes(&self, order: u64, count: usize) -> Vec<Modulus> {
        NTT_PRIMES
            .iter()
            .filter(|&&(p, _)| roots::check_capacity(p, order).is_ok())
            .filter_map(|&(p, g)| Modulus::new(p, g).ok())
            .take(count)
            .collect()
    }
}

/// Supplies primes by searching p = k 2^min_power + 1 below bound.
#[derive(Clone, Copy, Debug)]
pub struct PrimeSearch {
    pub min_power: u32,
    pub bound: u64,
    // Reject generators larger than 10.
    pub lower_g: bool,
}

impl Default for PrimeSearch {
    fn default() -> Self {
        PrimeSearch {
            min_power: 20,
            bound: 1 << 31,
            lower_g: false,
        }
    }
}

impl PrimeSupplier for PrimeSearch {
    fn ntt_primes(&self, order: u64, count: usize) -> Vec<Modulus> {
        if order == 0 || !order.is_power_of_two() {
            return vec![];
        }
        let n_power = std::cmp::max(self.min_power, order.trailing_zeros());
        search_ntt_primes(n_power, self.bound, self.lower_g, count)
            .into_iter()
            .map(|np| np.modulus)
            .collect()
    }
}

/// A prime found by search_ntt_primes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NttPrime {
    pub modulus: Modulus,
    pub popcount: u32,
    pub score: i64,
    // Primitive root of unity of order 2^v.
    pub max_root: u64,
}

impl NttPrime {
    fn new(modulus: Modulus) -> Self {
        let popcount = modulus.p.count_ones();
        let score = 1000 * modulus.v as i64 - 10 * popcount as i64 - modulus.g as i64;
        let zp = ZmodP::new(modulus.p);
        let max_root = zp.pow(modulus.g, (modulus.p - 1) >> modulus.v);
        NttPrime {
            modulus,
            popcount,
            score,
            max_root,
        }
    }
}

/// Enumerates primes p = k 2^n_power + 1 < bound and returns the count
/// best ones by decreasing score.
pub fn search_ntt_primes(n_power: u32, bound: u64, lower_g: bool, count: usize) -> Vec<NttPrime> {
    // Every candidate would exceed MAX_MODULUS.
    if n_power >= 62 {
        return vec![];
    }
    let step = 1u64 << n_power;
    let bound = std::cmp::min(bound, MAX_MODULUS);
    let mut candidates = vec![];
    let mut p = step + 1;
    while p < bound {
        if isprime64(p) {
            debug_assert!(two_adic_valuation(p) >= n_power);
            if let Ok(m) = Modulus::from_prime(p) {
                if !lower_g || m.g <= 10 {
                    candidates.push(NttPrime::new(m));
                }
            }
        }
        p = match p.checked_add(step) {
            Some(next) => next,
            None => break,
        };
    }
    // Stable: equal scores keep increasing order of p.
    candidates.sort_by_key(|c| -c.score);
    candidates.truncate(count);
    candidates
}

/// Shape of a prime found by search_solinas_primes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolinasForm {
    /// 2^n - c
    PseudoMersenne { n: u32, c: u64 },
    /// 2^n - 2^m + sign
    Solinas { n: u32, m: u32, sign: i8 },
}

impl fmt::Display for SolinasForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            SolinasForm::PseudoMersenne { n, c } => write!(f, "2^{n} - {c}"),
            SolinasForm::Solinas { n, m, sign } => {
                let s = if sign < 0 { '-' } else { '+' };
                write!(f, "2^{n} - 2^{m} {s} 1")
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SolinasPrime {
    pub p: u64,
    pub form: SolinasForm,
    pub score: i64,
    // 2-adic valuation of p-1
    pub v: u32,
}

impl SolinasPrime {
    /// m = n/2 allows Karatsuba-like reduction.
    pub fn golden(&self) -> bool {
        matches!(self.form, SolinasForm::Solinas { n, m, .. } if 2 * m == n)
    }

    pub fn near_golden(&self) -> bool {
        matches!(self.form, SolinasForm::Solinas { n, m, .. } if (2 * m).abs_diff(n) == 1)
    }
}

// Limits of the special form search.
const MAX_PSEUDO_MERSENNE_C: u64 = 100;
const SOLINAS_BOUND: u64 = 1 << 31;

/// Lists, for n_start <= n <= n_end, the smallest c such that 2^n - c is
/// prime and all primes 2^n - 2^m +/- 1 (m <= n/2) below 2^31.
/// Results are sorted by decreasing score then decreasing p, where
/// Solinas primes score 100 if 2m = n, 50 if |2m - n| = 1, +20 if
/// 32 divides n, and pseudo-Mersenne primes score -c.
pub fn search_solinas_primes(n_start: u32, n_end: u32) -> Vec<SolinasPrime> {
    let n_end = std::cmp::min(n_end, 63);
    let mut candidates = vec![];
    for n in n_start..=n_end {
        let top = 1u64 << n;
        if let Some(c) = (1..std::cmp::min(MAX_PSEUDO_MERSENNE_C, top)).find(|&c| isprime64(top - c)) {
            let p = top - c;
            candidates.push(SolinasPrime {
                p,
                form: SolinasForm::PseudoMersenne { n, c },
                score: -(c as i64),
                v: (p - 1).trailing_zeros(),
            });
        }
        for m in 1..=n / 2 {
            for sign in [-1i8, 1] {
                let p = if sign < 0 {
                    top - (1 << m) - 1
                } else {
                    top - (1 << m) + 1
                };
                if p >= SOLINAS_BOUND || !isprime64(p) {
                    continue;
                }
                let mut score = 0;
                if 2 * m == n {
                    score += 100;
                } else if (2 * m).abs_diff(n) == 1 {
                    score += 50;
                }
                if n % 32 == 0 {
                    score += 20;
                }
                candidates.push(SolinasPrime {
                    p,
                    form: SolinasForm::Solinas { n, m, sign },
                    score,
                    v: (p - 1).trailing_zeros(),
                });
            }
        }
    }
    candidates.sort_by(|x, y| (y.score, y.p).cmp(&(x.score, x.p)));
    candidates
}

/// Takes primes from supplier until their product exceeds 2 max_abs + 1.
pub fn select_primes<S: PrimeSupplier + ?Sized>(
    supplier: &S,
    order: u64,
    max_abs: &Uint,
) -> Result<Vec<Modulus>, Error> {
    let required = required_product(max_abs)?;
    let mut selected: Vec<Modulus> = vec![];
    let mut product = Uint::ONE;
    for m in supplier.ntt_primes(order, usize::MAX) {
        if product > required {
            break;
        }
        if selected.iter().any(|s| s.p == m.p) {
            continue;
        }
        selected.push(m);
        let primes: Vec<u64> = selected.iter().map(|s| s.p).collect();
        product = modulus_product(&primes)?;
    }
    if product <= required {
        return Err(Error::InsufficientModulusProduct {
            got: product,
            required,
        });
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_primes() {
        for &(p, g) in NTT_PRIMES {
            let m = Modulus::new(p, g).unwrap();
            assert_eq!(roots::find_generator(p), Ok(g), "p={p}");
            assert_eq!((p - 1) >> m.v << m.v, p - 1);
        }
        let ps: Vec<u64> = KnownPrimes.ntt_primes(1 << 20, 3).iter().map(|m| m.p).collect();
        assert_eq!(ps, vec![2013265921, 469762049, 1811939329]);
        // Only 3 2^30 + 1 supports N = 2^28.
        let ps: Vec<u64> = KnownPrimes.ntt_primes(1 << 28, 10).iter().map(|m| m.p).collect();
        assert_eq!(ps, vec![3221225473]);
        assert!(KnownPrimes.ntt_primes(1 << 31, 10).is_empty());
    }

    #[test]
    fn test_search() {
        let res = search_ntt_primes(20, 1 << 31, false, 5);
        let ps: Vec<(u64, u32, u64)> = res
            .iter()
            .map(|np| (np.modulus.p, np.modulus.v, np.modulus.g))
            .collect();
        assert_eq!(
            ps,
            vec![
                (2013265921, 27, 31),
                (469762049, 26, 3),
                (1811939329, 26, 13),
                (167772161, 25, 3),
                (1107296257, 25, 10),
            ]
        );
        assert_eq!(res[0].score, 26919);
        assert_eq!(res[0].popcount, 5);
        assert_eq!(res[0].max_root, 440564289);
        assert_eq!(res[1].max_root, 2187);
        // Scores are non-increasing.
        let all = search_ntt_primes(20, 1 << 31, false, usize::MAX);
        assert_eq!(all.len(), 202);
        assert!(all.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_search_lower_g() {
        let res = search_ntt_primes(20, 1 << 31, true, 4);
        let ps: Vec<u64> = res.iter().map(|np| np.modulus.p).collect();
        assert_eq!(ps, vec![469762049, 167772161, 1107296257, 2113929217]);
        assert_eq!(search_ntt_primes(20, 1 << 31, true, usize::MAX).len(), 163);
    }

    #[test]
    fn test_search_large_power() {
        assert!(search_ntt_primes(62, u64::MAX, false, 5).is_empty());
        assert!(search_ntt_primes(64, u64::MAX, false, 5).is_empty());
        assert!(search_ntt_primes(200, 1 << 31, true, 5).is_empty());
        let s = PrimeSearch {
            min_power: 64,
            ..PrimeSearch::default()
        };
        assert!(s.ntt_primes(2, 1).is_empty());
        assert!(PrimeSearch::default().ntt_primes(1 << 63, 1).is_empty());
        // 2^57 divides p-1 for the only such prime below 2^62.
        let res = search_ntt_primes(57, u64::MAX, false, 5);
        let ps: Vec<u64> = res.iter().map(|np| np.modulus.p).collect();
        assert_eq!(ps, vec![4179340454199820289]);
    }

    #[test]
    fn test_search_solinas() {
        let res = search_solinas_primes(20, 31);
        assert_eq!(res.len(), 52);
        assert_eq!(res[0].p, 1047551);
        assert_eq!(res[0].form, SolinasForm::Solinas { n: 20, m: 10, sign: -1 });
        assert_eq!(res[0].form.to_string(), "2^20 - 2^10 - 1");
        assert!(res[0].golden());
        assert_eq!(res[1].p, 33550337);
        assert!(res[1].near_golden());
        assert_eq!((res[1].score, res[1].v), (50, 12));
        assert_eq!(res[2].form, SolinasForm::Solinas { n: 31, m: 1, sign: 1 });
        assert_eq!(res[2].p, (1 << 31) - 1);
        // 2^28 - 57 has the largest offset.
        let last = res.last().unwrap();
        assert_eq!(last.p, 268435399);
        assert_eq!(last.form, SolinasForm::PseudoMersenne { n: 28, c: 57 });
        assert_eq!(last.form.to_string(), "2^28 - 57");
        assert_eq!(last.score, -57);
        let pm: Vec<u64> = res
            .iter()
            .filter(|sp| matches!(sp.form, SolinasForm::PseudoMersenne { .. }))
            .map(|sp| sp.p)
            .collect();
        assert_eq!(pm.len(), 12);
        assert!(pm.contains(&1048573));
        // Sorted by decreasing score.
        assert!(res.windows(2).all(|w| w[0].score >= w[1].score));
        // Above 2^31 only the pseudo-Mersenne form is listed.
        let res = search_solinas_primes(63, 80);
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].form, SolinasForm::PseudoMersenne { n: 63, c: 25 });
    }

    #[test]
    fn test_prime_search_supplier() {
        let s = PrimeSearch::default();
        let ps: Vec<u64> = s.ntt_primes(1 << 26, 2).iter().map(|m| m.p).collect();
        assert_eq!(ps, vec![2013265921, 469762049]);
        assert!(s.ntt_primes(1 << 28, 2).is_empty());
        assert!(s.ntt_primes(3, 2).is_empty());
    }

    #[test]
    fn test_select_primes() {
        let ps = select_primes(&KnownPrimes, 1 << 10, &Uint::from(1000u64)).unwrap();
        assert_eq!(ps.len(), 1);
        // 2^60 needs more than 61 bits.
        let ps = select_primes(&KnownPrimes, 1 << 10, &Uint::from(1u64 << 60)).unwrap();
        let ps: Vec<u64> = ps.iter().map(|m| m.p).collect();
        assert_eq!(ps, vec![2013265921, 469762049, 1811939329]);
        let ps = select_primes(&PrimeSearch::default(), 1 << 20, &Uint::from(1u64 << 60)).unwrap();
        assert_eq!(ps.len(), 3);
        let huge = Uint::ONE << 400;
        assert!(matches!(
            select_primes(&KnownPrimes, 1 << 10, &huge),
            Err(Error::InsufficientModulusProduct { .. })
        ));
    }
}
