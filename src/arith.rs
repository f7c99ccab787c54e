// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Arithmetic modulo a fixed word-sized prime.
//!
//! Elements are plain u64 values in [0, p) and products use
//! 128-bit intermediate values, so any modulus below 2^62 is supported.

use num_integer::Integer;

use crate::Error;

/// Largest supported modulus (exclusive).
pub const MAX_MODULUS: u64 = 1 << 62;

/// Context for arithmetic modulo p.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ZmodP {
    pub p: u64,
}

impl ZmodP {
    pub fn new(p: u64) -> Self {
        debug_assert!(1 < p && p < MAX_MODULUS);
        ZmodP { p }
    }

    #[inline]
    pub fn add(&self, x: u64, y: u64) -> u64 {
        debug_assert!(x < self.p && y < self.p);
        let s = x + y;
        if s >= self.p {
            s - self.p
        } else {
            s
        }
    }

    #[inline]
    pub fn sub(&self, x: u64, y: u64) -> u64 {
        debug_assert!(x < self.p && y < self.p);
        if x >= y {
            x - y
        } else {
            x + self.p - y
        }
    }

    #[inline]
    pub fn mul(&self, x: u64, y: u64) -> u64 {
        ((x as u128 * y as u128) % self.p as u128) as u64
    }

    /// Square-and-multiply exponentiation.
    pub fn pow(&self, x: u64, k: u64) -> u64 {
        let mut res = 1 % self.p;
        let mut sq = x % self.p;
        let mut k = k;
        while k > 0 {
            if k & 1 == 1 {
                res = self.mul(res, sq);
            }
            sq = self.mul(sq, sq);
            k >>= 1;
        }
        res
    }

    /// Modular inverse by the extended Euclidean algorithm.
    pub fn inv(&self, x: u64) -> Result<u64, Error> {
        let e = Integer::extended_gcd(&(x as i128), &(self.p as i128));
        if e.gcd != 1 {
            return Err(Error::NonInvertible {
                value: x,
                modulus: self.p,
            });
        }
        Ok(e.x.rem_euclid(self.p as i128) as u64)
    }

    /// Reduces a signed integer into [0, p).
    #[inline]
    pub fn from_int(&self, x: i64) -> u64 {
        (x as i128).rem_euclid(self.p as i128) as u64
    }

    /// Maps a residue to the symmetric range (-p/2, p/2].
    pub fn to_signed(&self, x: u64) -> i64 {
        if x > self.p / 2 {
            x as i64 - self.p as i64
        } else {
            x as i64
        }
    }
}

/// Exponent of the largest power of two dividing p-1.
pub fn two_adic_valuation(p: u64) -> u32 {
    debug_assert!(p > 1);
    (p - 1).trailing_zeros()
}

/// Deterministic Miller-Rabin test for 64-bit integers.
pub fn isprime64(n: u64) -> bool {
    // These bases are enough for all n < 3.3e24.
    const BASES: [u64; 12] = [2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37];
    if n < 2 {
        return false;
    }
    for &b in &BASES {
        if n % b == 0 {
            return n == b;
        }
    }
    let zn = Zmod64(n);
    let s = (n - 1).trailing_zeros();
    let d = (n - 1) >> s;
    'bases: for &b in &BASES {
        let mut x = zn.pow(b, d);
        if x == 1 || x == n - 1 {
            continue;
        }
        for _ in 1..s {
            x = zn.mul(x, x);
            if x == n - 1 {
                continue 'bases;
            }
        }
        return false;
    }
    true
}

// Same as ZmodP without the range restriction, for primality tests.
struct Zmod64(u64);

impl Zmod64 {
    fn mul(&self, x: u64, y: u64) -> u64 {
        ((x as u128 * y as u128) % self.0 as u128) as u64
    }

    fn pow(&self, x: u64, k: u64) -> u64 {
        let (mut res, mut sq, mut k) = (1, x % self.0, k);
        while k > 0 {
            if k & 1 == 1 {
                res = self.mul(res, sq);
            }
            sq = self.mul(sq, sq);
            k >>= 1;
        }
        res
    }
}

/// Distinct prime factors of n, by trial division of the odd part.
///
/// This is only meant for numbers like p-1 where p is an NTT prime,
/// whose odd part is small.
pub fn prime_factors(n: u64) -> Vec<u64> {
    let mut factors = vec![];
    let mut n = n;
    if n > 0 && n % 2 == 0 {
        factors.push(2);
        n >>= n.trailing_zeros();
    }
    let mut d = 3;
    while d <= n / d {
        if n % d == 0 {
            factors.push(d);
            while n % d == 0 {
                n /= d;
            }
        }
        d += 2;
    }
    if n > 1 {
        factors.push(n);
    }
    factors
}
