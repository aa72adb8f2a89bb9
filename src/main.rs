mod generator;
mod releaser;
mod sieve;
mod storage;

use clap::Parser;
use std::io::{BufWriter, Write};
use std::thread;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "psieve")]
#[command(about = "Stream prime numbers up to a limit from a concurrent sieve", long_about = None)]
struct Cli {
    #[arg(help = "The inclusive upper bound to search for primes")]
    limit: usize,
    #[arg(
        short,
        long,
        default_value = "0",
        help = "Milliseconds to pause between printed primes"
    )]
    delay_ms: u64,
    #[arg(short, long, help = "Suppress per-prime output, only print the summary")]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    // Bound validation happens before any worker thread exists
    let generator = match generator::PrimeGenerator::new(cli.limit) {
        Ok(generator) => generator,
        Err(e) => {
            eprintln!("Error: {}", e);
            return;
        }
    };

    let start = Instant::now();
    let primes = generator.start();

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    let mut itoa_buf = itoa::Buffer::new();
    let mut count: usize = 0;

    for prime in primes {
        if !cli.quiet {
            if let Err(e) = writer.write_all(itoa_buf.format(prime).as_bytes()) {
                eprintln!("Error writing to stdout: {}", e);
                return;
            }
            if let Err(e) = writer.write_all(b"\n") {
                eprintln!("Error writing to stdout: {}", e);
                return;
            }
        }

        count += 1;

        if cli.delay_ms > 0 {
            // Flush so paced output is actually visible between pauses
            if let Err(e) = writer.flush() {
                eprintln!("Error flushing stdout: {}", e);
                return;
            }
            thread::sleep(Duration::from_millis(cli.delay_ms));
        }
    }

    if let Err(e) = writer.flush() {
        eprintln!("Error flushing stdout: {}", e);
    }

    let duration = start.elapsed();
    let duration_us = duration.as_micros();

    println!("\nTotal: {} primes found", count);
    println!(
        "Execution time: {}us ({:.2}ms)",
        duration_us,
        duration_us as f64 / 1000.0
    );

    if let Err(e) = storage::log_execution(cli.limit, count, duration_us) {
        eprintln!("Warning: Failed to log execution: {}", e);
    }
}
