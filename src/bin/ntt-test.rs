// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Random multiplication testing.
//!
//! This program generates random signed polynomials, multiplies them
//! using several NTT primes and checks the result against
//! schoolbook multiplication.

use std::str::FromStr;
use std::time::Instant;

use num_traits::ToPrimitive;
use rand::{self, Rng};

use crtntt::multimod::{coefficient_bound, MultiModulus};
use crtntt::primes::{select_primes, KnownPrimes};
use crtntt::{Preferences, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        eprintln!("Usage: ntt-test [OPTIONS]");
        eprintln!("");
        eprintln!("Options:");
        eprintln!("  --help                    show this help");
        eprintln!("  --verbose silent|info|verbose|debug");
        eprintln!("  --threads N:              enable up to N computation threads");
        eprintln!("  --len L:                  length of input polynomials (default 1000)");
        eprintln!("  --bits B:                 bit length of coefficients (default 32, max 63)");
        eprintln!("  --count C:                number of products (default: unlimited)");
        return;
    }
    let len = arg.get::<usize>("len").unwrap_or(1000);
    let bits = arg.get::<u32>("bits").unwrap_or(32);
    let count = arg.get::<usize>("count");
    let v = arg.get::<String>("verbose").unwrap_or("silent".into());
    assert!(len > 0 && (1..=63).contains(&bits));
    // Schoolbook products are computed using i128.
    let lenbits = usize::BITS - len.leading_zeros();
    assert!(2 * (bits - 1) + lenbits < 127, "coefficients are too large for this length");
    let mut prefs = Preferences::default();
    prefs.threads = arg.get::<usize>("threads");
    prefs.verbosity = Verbosity::from_str(&v).unwrap();
    let tpool: Option<rayon::ThreadPool> = prefs.threads.map(|t| {
        rayon::ThreadPoolBuilder::new()
            .num_threads(t)
            .build()
            .expect("cannot create thread pool")
    });

    let mut rng = rand::thread_rng();
    let max = (1u64 << (bits - 1)) as i64;
    let t0 = Instant::now();
    let mut i = 0;
    while count.map_or(true, |c| i < c) {
        let a: Vec<i64> = (0..len).map(|_| rng.gen_range(-max..max)).collect();
        let b: Vec<i64> = (0..len).map(|_| rng.gen_range(-max..max)).collect();
        let bound = coefficient_bound(&a, &b);
        let primes = select_primes(&KnownPrimes, (2 * len).next_power_of_two() as u64, &bound)
            .expect("cannot select primes");
        let mm = MultiModulus::new(primes).unwrap();
        let res = mm.multiply(&a, &b, &prefs, tpool.as_ref()).unwrap();
        let expect = schoolbook(&a, &b);
        for (j, (c, e)) in res.iter().zip(&expect).enumerate() {
            if c.to_i128() != Some(*e) {
                eprintln!("ERROR coefficient {j}: got {c} expected {e}");
                std::process::exit(1);
            }
        }
        assert_eq!(res.len(), expect.len());
        i += 1;
        let elapsed = t0.elapsed().as_secs_f64();
        let avg = elapsed / (i as f64) * 1000.;
        if i % 10 == 0 {
            eprintln!(
                "Processed {i} products using {} primes in {elapsed:.3}s (average {avg:.3}ms)",
                mm.moduli().len()
            );
        }
    }
}

fn schoolbook(a: &[i64], b: &[i64]) -> Vec<i128> {
    let mut res = vec![0i128; a.len() + b.len() - 1];
    for (i, &x) in a.iter().enumerate() {
        for (j, &y) in b.iter().enumerate() {
            res[i + j] += x as i128 * y as i128;
        }
    }
    res
}
