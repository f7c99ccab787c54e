// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::fmt;

use crate::arith::{two_adic_valuation, ZmodP};
use crate::roots::{self, check_prime, RootSupplier};
use crate::Error;

/// An NTT-friendly prime p = c 2^v + 1 with a generator g
/// of the multiplicative group modulo p.
///
/// Transforms of any order N dividing 2^v can be computed modulo p.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Modulus {
    pub p: u64,
    // 2-adic valuation of p-1
    pub v: u32,
    pub g: u64,
}

impl Modulus {
    /// Validates that p is a supported prime and g generates (Z/pZ)*.
    pub fn new(p: u64, g: u64) -> Result<Self, Error> {
        check_prime(p)?;
        if !roots::is_generator(p, g) {
            return Err(Error::PrimitiveRoot {
                p,
                n: p - 1,
                candidate: g,
            });
        }
        Ok(Modulus {
            p,
            v: two_adic_valuation(p),
            g,
        })
    }

    /// Builds a modulus using the smallest generator modulo p.
    pub fn from_prime(p: u64) -> Result<Self, Error> {
        let g = roots::find_generator(p)?;
        Self::new(p, g)
    }

    pub fn field(&self) -> ZmodP {
        ZmodP::new(self.p)
    }

    /// Largest supported transform order.
    pub fn max_order(&self) -> u64 {
        1 << self.v
    }

    /// Returns g^((p-1)/n), an element of exact order n.
    pub fn root_of_unity(&self, n: u64) -> Result<u64, Error> {
        roots::check_capacity(self.p, n)?;
        let zp = self.field();
        let w = zp.pow(self.g, (self.p - 1) / n);
        roots::verify_root(&zp, w, n)?;
        Ok(w)
    }
}

impl RootSupplier for Modulus {
    fn primitive_root(&self, p: u64, n: u64) -> Result<u64, Error> {
        if p != self.p {
            return Err(Error::InvalidModulus(p));
        }
        self.root_of_unity(n)
    }
}

impl fmt::Display for Modulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (2^{} | p-1, g={})", self.p, self.v, self.g)
    }
}
