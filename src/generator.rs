use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender, SyncSender};
use std::thread;

use crate::releaser::Releaser;
use crate::sieve::Sieve;

/// Bounded capacity of the outgoing prime stream. A consumer that falls
/// this far behind suspends the releaser; correctness never depends on
/// consumption speed, only throughput does.
pub const PRIME_CHANNEL_CAPACITY: usize = 1024;

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    /// The sieve stores limit+1 flags, so the bound must leave room for one
    /// more addressable index.
    #[error("limit {0} exceeds the sieve's addressable range")]
    LimitOverflow(usize),
}

/// Prime generator facade.
///
/// Owns the inclusive upper bound and wires up the sieve, the marking
/// workers, the completion tracker and the releaser. The stream returned
/// by [`PrimeGenerator::start`] produces every prime <= limit in strictly
/// increasing order and closes once the last one has been sent.
pub struct PrimeGenerator {
    limit: usize,
}

impl PrimeGenerator {
    /// Validate the bound before any allocation or thread exists. A bound
    /// below 2 is not an error - it just yields an empty stream.
    pub fn new(limit: usize) -> Result<Self, GeneratorError> {
        if limit.checked_add(1).is_none() {
            return Err(GeneratorError::LimitOverflow(limit));
        }

        Ok(PrimeGenerator { limit })
    }

    /// Start sieving in the background and immediately return the receiving
    /// end of the prime stream. Production happens concurrently; iterating
    /// the receiver blocks until the next prime is verified.
    pub fn start(self) -> Receiver<usize> {
        let (prime_tx, prime_rx) = mpsc::sync_channel(PRIME_CHANNEL_CAPACITY);
        thread::spawn(move || self.run(prime_tx));
        prime_rx
    }

    fn run(self, prime_tx: SyncSender<usize>) {
        let sieve = Arc::new(Sieve::new(self.limit));
        let sqrt_limit = self.limit.isqrt();

        // One marking worker per candidate. Completions arrive in arbitrary
        // order - larger candidates have fewer multiples and often finish
        // before smaller ones.
        let (done_tx, done_rx) = mpsc::channel();
        for k in 2..=sqrt_limit {
            let sieve = Arc::clone(&sieve);
            let done_tx = done_tx.clone();
            let limit = self.limit;
            thread::spawn(move || mark_multiples(&sieve, k, limit, &done_tx));
        }
        drop(done_tx);

        let (boundary_tx, boundary_rx) = mpsc::channel();
        let releaser = Releaser::new(self.limit, sqrt_limit, Arc::clone(&sieve), prime_tx);
        let releaser_handle = thread::spawn(move || releaser.listen(boundary_rx));

        // Completion tracker: sole owner of the completion set and the
        // release frontier. Workers finish unordered, but boundaries must
        // go out in increasing order to preserve output ordering, so the
        // frontier only advances once every smaller candidate is confirmed.
        let mut done = vec![false; sqrt_limit + 1];
        let mut frontier = 2;

        while frontier <= sqrt_limit {
            if done[frontier] {
                // Candidates 2..=frontier have all completed, so every
                // composite up to frontier^2 is marked. Safe to release.
                if boundary_tx.send(frontier).is_err() {
                    break; // releaser bailed out: consumer disconnected
                }
                frontier += 1;
                continue;
            }

            // Block for the next completion, whichever worker it is from
            let k = done_rx
                .recv()
                .expect("marking worker exited without reporting completion");
            assert!(
                (2..=sqrt_limit).contains(&k),
                "completion for {k} outside candidate range 2..={sqrt_limit}"
            );
            done[k] = true;
        }

        // Closing the boundary channel is the single termination event:
        // the releaser flushes the tail window and returns, dropping the
        // only prime sender, which in turn closes the output stream.
        drop(boundary_tx);
        let _ = releaser_handle.join();
    }
}

/// Marking worker for candidate `k`: marks every multiple of k from k^2
/// through `limit`, then reports completion exactly once. k <= isqrt(limit)
/// guarantees k*k cannot overflow.
fn mark_multiples(sieve: &Sieve, k: usize, limit: usize, done_tx: &Sender<usize>) {
    for multiple in (k * k..=limit).step_by(k) {
        sieve.mark(multiple);
    }

    // Tracker may already be gone if the consumer walked away early
    let _ = done_tx.send(k);
}
