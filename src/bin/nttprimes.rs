// Copyright 2022 Rémy Oudompheng. All rights reserved.
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! Search for NTT-friendly primes p = k 2^n + 1,
//! or for primes of special forms 2^n - c and 2^n - 2^m +/- 1.

use std::time::Instant;

use crtntt::primes::{self, SolinasForm};

fn main() {
    let arg = arguments::parse(std::env::args()).unwrap();
    if arg.get::<bool>("help").is_some() {
        eprintln!("Usage: nttprimes [OPTIONS]");
        eprintln!("");
        eprintln!("Options:");
        eprintln!("  --help                    show this help");
        eprintln!("  --mode ntt|goldilocks:    search NTT primes or special forms");
        eprintln!("  --from N --to M:          exponent range for goldilocks mode (default 20-31)");
        eprintln!("  --power N:                search primes k 2^N + 1 (default 20)");
        eprintln!("  --count C:                number of primes to print (default 5)");
        eprintln!("  --bound B:                upper bound for primes (default 2^31)");
        eprintln!("  --lower-g true|false:     reject primitive roots larger than 10");
        return;
    }
    let mode = arg.get::<String>("mode").unwrap_or("ntt".into());
    match &mode[..] {
        "ntt" => {}
        "goldilocks" => {
            let from = arg.get::<u32>("from").unwrap_or(20);
            let to = arg.get::<u32>("to").unwrap_or(31);
            special_forms(from, to);
            return;
        }
        _ => {
            eprintln!("invalid mode {mode:?}");
            std::process::exit(1);
        }
    }
    let power = arg.get::<u32>("power").unwrap_or(20);
    let count = arg.get::<usize>("count").unwrap_or(5);
    let bound = arg.get::<u64>("bound").unwrap_or(1 << 31);
    let lower_g = arg.get::<bool>("lower-g").unwrap_or(false);
    if power == 0 || power >= 62 {
        eprintln!("power must be between 1 and 61");
        std::process::exit(1);
    }

    eprintln!("Searching for NTT primes p = k 2^{power} + 1 < {bound}");
    let start = Instant::now();
    let res = primes::search_ntt_primes(power, bound, lower_g, count);
    eprintln!(
        "Search done in {:.3}s, selected {} primes",
        start.elapsed().as_secs_f64(),
        res.len()
    );
    for (idx, np) in res.iter().enumerate() {
        let m = &np.modulus;
        println!("Rank {}: {}", idx + 1, m.p);
        println!("    2-adic valuation {} (max N = {})", m.v, m.max_order());
        println!("    primitive root g = {}", m.g);
        println!("    root of unity of order {} = {}", m.max_order(), np.max_root);
        println!("    popcount {} score {}", np.popcount, np.score);
        println!("    hex {:#x}", m.p);
    }
}

fn special_forms(from: u32, to: u32) {
    eprintln!("Searching for primes 2^n - c and 2^n - 2^m +/- 1 for n in {from}..={to}");
    let res = primes::search_solinas_primes(from, to);
    println!("{:<20} | {:<20} | {:<16} | {}", "Prime", "Form", "Type", "Note");
    for sp in &res {
        let (kind, n) = match sp.form {
            SolinasForm::PseudoMersenne { n, .. } => ("Pseudo-Mersenne", n),
            SolinasForm::Solinas { n, .. } => ("Solinas", n),
        };
        let mut notes = vec![];
        if sp.golden() {
            notes.push("golden".to_string());
        } else if sp.near_golden() {
            notes.push("near golden".to_string());
        }
        if n % 32 == 0 {
            notes.push("word aligned".to_string());
        }
        notes.push(format!("2^{} | p-1", sp.v));
        println!(
            "{:<20} | {:<20} | {:<16} | {}",
            sp.p,
            sp.form.to_string(),
            kind,
            notes.join(", ")
        );
    }
}
