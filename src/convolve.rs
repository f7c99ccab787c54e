// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Polynomial product modulo a single NTT prime.
//!
//! Operands are padded with zeros to the smallest power of two N
//! which is at least the product length L = len(a) + len(b) - 1,
//! so that the cyclic convolution of size N never wraps around.
//! The result is trimmed back to exactly L residues.
//!
//! Residues are not interpreted: a coefficient larger than p/2
//! in absolute value is silently reduced. Exact products require
//! multiple moduli, see [`crate::multimod`].

use crate::modulus::Modulus;
use crate::ntt;
use crate::roots::{verify_root, RootSupplier};
use crate::{Error, Verbosity};

/// Length of the product and size of the transform.
/// Returns None if one of the operands is empty.
pub fn transform_size(len_a: usize, len_b: usize) -> Option<(usize, usize)> {
    if len_a == 0 || len_b == 0 {
        return None;
    }
    let l = len_a + len_b - 1;
    Some((l, l.next_power_of_two()))
}

/// Product of a and b, with coefficients reduced modulo m.p.
pub fn multiply(a: &[i64], b: &[i64], m: &Modulus) -> Result<Vec<u64>, Error> {
    convolve(a, b, m, Verbosity::Silent)
}

/// Same as multiply, printing intermediate values to stderr
/// if verbosity is Debug.
pub fn convolve(a: &[i64], b: &[i64], m: &Modulus, v: Verbosity) -> Result<Vec<u64>, Error> {
    convolve_with(a, b, m, m, v)
}

/// Product of a and b modulo m.p, using roots of unity from the given
/// supplier. Supplied roots are checked to have the exact required order.
pub fn convolve_with<R: RootSupplier + ?Sized>(
    a: &[i64],
    b: &[i64],
    m: &Modulus,
    roots: &R,
    v: Verbosity,
) -> Result<Vec<u64>, Error> {
    let Some((l, n)) = transform_size(a.len(), b.len()) else {
        return Ok(vec![]);
    };
    let zp = m.field();
    // Roots are obtained (and checked) before allocating anything.
    let w = roots.primitive_root(m.p, n as u64)?;
    verify_root(&zp, w, n as u64)?;
    let winv = zp.inv(w)?;
    let mut fa = vec![0; n];
    let mut fb = vec![0; n];
    for (i, &x) in a.iter().enumerate() {
        fa[i] = zp.from_int(x);
    }
    for (i, &x) in b.iter().enumerate() {
        fb[i] = zp.from_int(x);
    }
    let debug = v >= Verbosity::Debug;
    if debug {
        eprintln!("[p={}] transform size N={n} for product length {l}", m.p);
        eprintln!("[p={}] padded A = {}", m.p, preview(&fa));
        eprintln!("[p={}] padded B = {}", m.p, preview(&fb));
    }
    ntt::forward(&mut fa, m.p, w)?;
    ntt::forward(&mut fb, m.p, w)?;
    if debug {
        eprintln!("[p={}] NTT(A) = {}", m.p, preview(&fa));
        eprintln!("[p={}] NTT(B) = {}", m.p, preview(&fb));
    }
    // Pointwise product
    for (x, &y) in fa.iter_mut().zip(&fb) {
        *x = zp.mul(*x, y);
    }
    if debug {
        eprintln!("[p={}] NTT(A)*NTT(B) = {}", m.p, preview(&fa));
    }
    ntt::inverse(&mut fa, m.p, winv)?;
    // The tail (N-L values) is structurally zero.
    debug_assert!(fa[l..].iter().all(|&x| x == 0));
    fa.truncate(l);
    if debug {
        eprintln!("[p={}] trimmed product = {}", m.p, preview(&fa));
    }
    Ok(fa)
}

fn preview(v: &[u64]) -> String {
    const MAX: usize = 8;
    if v.len() <= MAX {
        format!("{:?}", v)
    } else {
        format!("{:?}... ({} values)", &v[..MAX], v.len())
    }
}
