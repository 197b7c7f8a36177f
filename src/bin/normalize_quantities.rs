//! Normalize recipe quantities from the command line
//! Usage: cargo run --bin normalize_quantities -- "1,5 kg" "2 c. de chá"
//! With no arguments, reads one quantity per line from stdin.

use std::io::BufRead;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let inputs: Vec<String> = if args.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .filter(|line| !line.trim().is_empty())
            .collect()
    } else {
        args
    };

    let mut failures = 0;
    for raw in &inputs {
        match despensa::quantity::normalize(raw) {
            Ok(q) => match &q.extra {
                Some(extra) => println!("{:<30} {} {} (+ {} {})", raw, q.value, q.unit, extra.value, extra.unit),
                None => println!("{:<30} {} {}", raw, q.value, q.unit),
            },
            Err(e) => {
                failures += 1;
                println!("{:<30} ERROR: {}", raw, e);
            }
        }
    }

    if failures > 0 {
        eprintln!("{} of {} quantities could not be normalized", failures, inputs.len());
    }

    Ok(())
}
