// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Number-theoretic transform modulo a word-sized prime.
//!
//! forward computes dst[j] = Sum(src[i] ω^ij) where ω is a primitive
//! N-th root of unity modulo p and N is the input length.
//!
//! The inverse transform replaces ω by ω^-1 and divides by N:
//! the division is part of the inverse, callers never scale results.
//!
//! Both transforms are computed in place: a bit-reversal permutation
//! followed by log2(N) stages of butterflies, where stage s combines
//! elements 2^s apart using powers of ω^(N/2^(s+1)).

use crate::arith::ZmodP;
use crate::roots::{check_capacity, verify_root};
use crate::Error;

/// Forward transform of values (in [0, p)) using root of order values.len().
pub fn forward(values: &mut [u64], p: u64, root: u64) -> Result<(), Error> {
    let zp = prepare(values, p, root)?;
    transform(&zp, values, root);
    Ok(())
}

/// Inverse transform, where root_inv is the inverse of the forward root.
pub fn inverse(values: &mut [u64], p: u64, root_inv: u64) -> Result<(), Error> {
    let zp = prepare(values, p, root_inv)?;
    transform(&zp, values, root_inv);
    let ninv = zp.inv(values.len() as u64 % p)?;
    for x in values.iter_mut() {
        *x = zp.mul(*x, ninv);
    }
    Ok(())
}

// Checks preconditions before any arithmetic is done.
fn prepare(values: &[u64], p: u64, root: u64) -> Result<ZmodP, Error> {
    let n = values.len();
    if !n.is_power_of_two() {
        return Err(Error::NotPowerOfTwo(n));
    }
    crate::roots::check_prime(p)?;
    check_capacity(p, n as u64)?;
    let zp = ZmodP::new(p);
    verify_root(&zp, root, n as u64)?;
    debug_assert!(values.iter().all(|&x| x < p));
    Ok(zp)
}

fn transform(zp: &ZmodP, a: &mut [u64], root: u64) {
    let n = a.len();
    bit_reverse(a);
    let mut len = 2;
    while len <= n {
        let half = len / 2;
        // Primitive len-th root of unity.
        let wlen = zp.pow(root, (n / len) as u64);
        let mut twiddles = Vec::with_capacity(half);
        let mut w = 1;
        for _ in 0..half {
            twiddles.push(w);
            w = zp.mul(w, wlen);
        }
        for block in a.chunks_exact_mut(len) {
            let (lo, hi) = block.split_at_mut(half);
            for j in 0..half {
                let u = lo[j];
                let v = zp.mul(hi[j], twiddles[j]);
                lo[j] = zp.add(u, v);
                hi[j] = zp.sub(u, v);
            }
        }
        len <<= 1;
    }
}

/// Swaps a[i] and a[j] where j is i with its log2(N) low bits reversed.
pub fn bit_reverse<T>(a: &mut [T]) {
    let n = a.len();
    debug_assert!(n.is_power_of_two());
    if n <= 2 {
        return;
    }
    let shift = usize::BITS - n.trailing_zeros();
    for i in 0..n {
        let j = i.reverse_bits() >> shift;
        if i < j {
            a.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roots::{OrderSearch, RootSupplier};
    use rand::{self, Rng};

    #[test]
    fn test_bit_reverse() {
        let mut v: Vec<usize> = (0..8).collect();
        bit_reverse(&mut v);
        assert_eq!(v, vec![0, 4, 2, 6, 1, 5, 3, 7]);
        let mut v: Vec<usize> = (0..16).collect();
        bit_reverse(&mut v);
        assert_eq!(v[1], 8);
        assert_eq!(v[3], 12);
        assert_eq!(v[15], 15);
    }

    #[test]
    fn test_forward_small() {
        let mut a = vec![1, 2, 3, 4, 0, 0, 0, 0];
        forward(&mut a, 17, 9).unwrap();
        assert_eq!(a, vec![10, 16, 6, 11, 15, 13, 7, 15]);
        // A(1) = 10, A(9) = 16
        assert_eq!(a[0], (1 + 2 + 3 + 4) % 17);
        let zp = ZmodP::new(17);
        let a9 = (0..4).fold(0, |acc, i| zp.add(acc, zp.mul(i + 1, zp.pow(9, i))));
        assert_eq!(a[1], a9);
        // Inverse transform
        inverse(&mut a, 17, zp.inv(9).unwrap()).unwrap();
        assert_eq!(a, vec![1, 2, 3, 4, 0, 0, 0, 0]);
    }

    #[test]
    fn test_forward_naive() {
        // Compare with the O(N²) definition.
        let p = 998244353;
        let zp = ZmodP::new(p);
        let mut rng = rand::thread_rng();
        for n in [1, 2, 4, 8, 32, 64] {
            let w = OrderSearch.primitive_root(p, n as u64).unwrap();
            let src: Vec<u64> = (0..n).map(|_| rng.gen_range(0..p)).collect();
            let mut dst = src.clone();
            forward(&mut dst, p, w).unwrap();
            for j in 0..n {
                let wj = zp.pow(w, j as u64);
                let mut expect = 0;
                for i in (0..n).rev() {
                    expect = zp.add(zp.mul(expect, wj), src[i]);
                }
                assert_eq!(dst[j], expect, "n={n} j={j}");
            }
        }
    }

    #[test]
    fn test_roundtrip() {
        let mut rng = rand::thread_rng();
        for p in [17, 469762049, 998244353, 2013265921, 4179340454199820289] {
            let zp = ZmodP::new(p);
            for k in 0..=12 {
                let n = 1usize << k;
                if (p - 1) % n as u64 != 0 {
                    continue;
                }
                let w = OrderSearch.primitive_root(p, n as u64).unwrap();
                let winv = zp.inv(w).unwrap();
                let orig: Vec<u64> = (0..n).map(|_| rng.gen_range(0..p)).collect();
                let mut v = orig.clone();
                forward(&mut v, p, w).unwrap();
                inverse(&mut v, p, winv).unwrap();
                assert_eq!(v, orig, "p={p} n={n}");
            }
        }
    }

    #[test]
    fn test_preconditions() {
        let mut v = vec![1, 2, 3, 4, 5, 6, 7, 8];
        // 32 does not divide 16.
        let mut w = vec![0; 32];
        assert_eq!(forward(&mut w, 17, 3), Err(Error::Capacity { p: 17, n: 32 }));
        // 4 does not divide 18.
        assert_eq!(
            forward(&mut v[..4], 19, 2),
            Err(Error::Capacity { p: 19, n: 4 })
        );
        // Wrong order: 13 = 9^2 has order 4.
        assert_eq!(
            forward(&mut v, 17, 13),
            Err(Error::PrimitiveRoot {
                p: 17,
                n: 8,
                candidate: 13
            })
        );
        assert_eq!(forward(&mut v[..6], 17, 9), Err(Error::NotPowerOfTwo(6)));
        assert_eq!(inverse(&mut v, 16, 9), Err(Error::InvalidModulus(16)));
        // Inputs are untouched on failure.
        assert_eq!(v, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
