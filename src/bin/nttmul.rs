// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

use std::str::FromStr;
use std::time::Instant;

use crtntt::convolve;
use crtntt::crt;
use crtntt::multimod::{coefficient_bound, MultiModulus};
use crtntt::primes::{self, KnownPrimes};
use crtntt::{Modulus, Preferences, Verbosity};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    let mode = arg.get::<String>("mode").unwrap_or("exact".into());
    let nargs = if mode == "crt" { 1 } else { 2 };
    if arg.get::<bool>("help").is_some() || arg.orphans.len() < nargs {
        eprintln!("Usage: nttmul [OPTIONS] A B");
        eprintln!("       nttmul --mode crt RESIDUE:MODULUS...");
        eprintln!("");
        eprintln!("Polynomials are given as comma-separated coefficients");
        eprintln!("in increasing degree order, for example 1,2,3 for 1+2x+3x^2");
        eprintln!("");
        eprintln!("Options:");
        eprintln!("  --help                    show this help");
        eprintln!("  --verbose silent|info|verbose|debug");
        eprintln!("  --threads N:              enable up to N computation threads");
        eprintln!("  --mode exact|single|crt:  exact product, product modulo a single prime,");
        eprintln!("                            or Chinese remaindering of given residues");
        eprintln!("  --primes P1,P2,...:       primes for exact mode (default: automatic)");
        eprintln!("  --modulus P:              prime for single mode (default 469762049)");
        return;
    }
    let v = arg.get::<String>("verbose").unwrap_or("info".into());
    let mut prefs = Preferences::default();
    prefs.threads = arg.get::<usize>("threads");
    prefs.verbosity = Verbosity::from_str(&v).unwrap();

    match &mode[..] {
        "exact" => {
            let a = parse_poly(&arg.orphans[0]);
            let b = parse_poly(&arg.orphans[1]);
            let primes = arg.get::<String>("primes");
            multiply_exact(&a, &b, primes.as_deref(), &prefs);
        }
        "single" => {
            let a = parse_poly(&arg.orphans[0]);
            let b = parse_poly(&arg.orphans[1]);
            let p = arg.get::<u64>("modulus").unwrap_or(469762049);
            multiply_single(&a, &b, p, &prefs);
        }
        "crt" => chinese_remainder(&arg.orphans, &prefs),
        _ => {
            eprintln!("invalid mode {mode:?}");
            std::process::exit(1);
        }
    }
}

fn parse_poly(s: &str) -> Vec<i64> {
    s.split(',')
        .filter(|w| !w.trim().is_empty())
        .map(|w| i64::from_str(w.trim()).expect("could not read coefficient"))
        .collect()
}

fn multiply_exact(a: &[i64], b: &[i64], prime_list: Option<&str>, prefs: &Preferences) {
    let bound = coefficient_bound(a, b);
    let order = convolve::transform_size(a.len(), b.len()).map_or(1, |(_, n)| n as u64);
    let moduli: Vec<Modulus> = match prime_list {
        Some(s) => s
            .split(',')
            .map(|w| {
                let p = u64::from_str(w.trim()).expect("could not read prime");
                Modulus::from_prime(p).unwrap_or_else(|e| die(e))
            })
            .collect(),
        None => primes::select_primes(&KnownPrimes, order, &bound).unwrap_or_else(|e| die(e)),
    };
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Coefficient bound {bound} ({} bits)", bound.bits());
        for m in &moduli {
            eprintln!("Using prime {m}");
        }
    }
    let mm = MultiModulus::new(moduli).unwrap_or_else(|e| die(e));
    let tpool = thread_pool(prefs);
    let start = Instant::now();
    let res = mm
        .multiply_exact(a, b, &bound, prefs, tpool.as_ref())
        .unwrap_or_else(|e| die(e));
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Product computed in {:.3}s", start.elapsed().as_secs_f64());
    }
    let words: Vec<String> = res.iter().map(|c| c.to_string()).collect();
    println!("{}", words.join(","));
}

fn multiply_single(a: &[i64], b: &[i64], p: u64, prefs: &Preferences) {
    let m = Modulus::from_prime(p).unwrap_or_else(|e| die(e));
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Modulus {m}");
        let bound = coefficient_bound(a, b);
        if bound >= crtntt::Uint::from(p / 2) {
            eprintln!("WARNING: coefficients up to {bound} may exceed p/2, results are residues");
        }
    }
    let res = convolve::convolve(a, b, &m, prefs.verbosity).unwrap_or_else(|e| die(e));
    let words: Vec<String> = res.iter().map(|c| c.to_string()).collect();
    println!("{} (mod {p})", words.join(","));
}

fn chinese_remainder(pairs: &[String], prefs: &Preferences) {
    let column: Vec<(u64, u64)> = pairs
        .iter()
        .map(|s| {
            let (a, m) = s.split_once(':').expect("expected RESIDUE:MODULUS");
            let a = u64::from_str(a).expect("could not read residue");
            let m = u64::from_str(m).expect("could not read modulus");
            (a, m)
        })
        .collect();
    let (x, m) = crt::mixed_radix(&column).unwrap_or_else(|e| die(e));
    let g = crt::gauss(&column).unwrap_or_else(|e| die(e));
    if prefs.verbose(Verbosity::Info) {
        eprintln!("Moduli product M = {m}");
        eprintln!("Mixed radix (Garner) {x}");
        eprintln!("Direct (Gauss) {g}");
    }
    assert_eq!(x, g, "Garner and Gauss methods disagree");
    println!("{x} (signed {})", crt::to_signed(&x, &m));
}

fn thread_pool(prefs: &Preferences) -> Option<rayon::ThreadPool> {
    match prefs.threads {
        None | Some(1) => None,
        Some(t) => {
            if prefs.verbose(Verbosity::Verbose) {
                eprintln!("Using a pool of {t} threads");
            }
            Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(t)
                    .build()
                    .expect("cannot create thread pool"),
            )
        }
    }
}

fn die(e: crtntt::Error) -> ! {
    eprintln!("Error: {e}");
    std::process::exit(1);
}
