use std::sync::Arc;
use std::sync::mpsc::{Receiver, SyncSender};

use crate::sieve::Sieve;

/// Release worker - waits for boundary notifications from the completion
/// tracker and streams each newly-verified window of the sieve downstream.
///
/// Boundaries arrive strictly increasing and windows are scanned in index
/// order, so the emitted primes are strictly increasing overall.
pub struct Releaser {
    limit: usize,
    sqrt_limit: usize,
    sieve: Arc<Sieve>,
    prime_tx: SyncSender<usize>,
    released_through: usize,
}

impl Releaser {
    pub fn new(
        limit: usize,
        sqrt_limit: usize,
        sieve: Arc<Sieve>,
        prime_tx: SyncSender<usize>,
    ) -> Self {
        Releaser {
            limit,
            sqrt_limit,
            sieve,
            prime_tx,
            // 0 and 1 are pre-marked; nothing above them is released yet
            released_through: 1,
        }
    }

    /// Consume boundary notifications until the tracker closes the channel,
    /// then flush the tail. Dropping `prime_tx` on return closes the output
    /// stream - the single termination event the generator waits on.
    pub fn listen(mut self, boundary_rx: Receiver<usize>) {
        for m in boundary_rx {
            if !self.release(m) {
                return; // consumer disconnected, skip the tail
            }
        }

        // Boundary stream closed: every candidate has completed, so any
        // composite <= limit (prime factor <= sqrt_limit) is marked by now.
        // Release whatever lies past the last square window, through limit.
        // For limit < 4 there are no candidates at all and this is the only
        // window, [2, limit].
        self.release_range(self.released_through + 1, self.limit);
    }

    /// Send all primes in the sieve between (M-1)^2 and min(M^2, limit)
    /// downstream. Window ends are squares, hence composite, so the shared
    /// endpoint of consecutive windows can never emit twice.
    fn release(&mut self, m: usize) -> bool {
        assert!(
            (2..=self.sqrt_limit).contains(&m),
            "boundary {m} outside candidate range 2..={}",
            self.sqrt_limit
        );

        let low = (m - 1) * (m - 1);
        let high = (m * m).min(self.limit);
        self.released_through = high;

        self.release_range(low, high)
    }

    /// Returns false once the consumer has dropped the receiving end.
    fn release_range(&self, low: usize, high: usize) -> bool {
        for q in low..=high {
            if !self.sieve.is_composite(q) && self.prime_tx.send(q).is_err() {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    /// Fully sieved store, marked sequentially so only the release logic
    /// is under test here.
    fn sieved(limit: usize) -> Arc<Sieve> {
        let sieve = Arc::new(Sieve::new(limit));
        for k in 2..=limit.isqrt() {
            let mut j = k * k;
            while j <= limit {
                sieve.mark(j);
                j += k;
            }
        }
        sieve
    }

    #[test]
    fn test_windows_then_tail_cover_the_full_range() {
        let limit = 30; // isqrt = 5, last square window ends at 25
        let (prime_tx, prime_rx) = mpsc::sync_channel(8);
        let (boundary_tx, boundary_rx) = mpsc::channel();

        let releaser = Releaser::new(limit, 5, sieved(limit), prime_tx);
        let handle = thread::spawn(move || releaser.listen(boundary_rx));

        for m in 2..=5 {
            boundary_tx.send(m).unwrap();
        }
        drop(boundary_tx);

        let primes: Vec<usize> = prime_rx.iter().collect();
        handle.join().unwrap();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29]);
    }

    #[test]
    fn test_no_boundaries_releases_only_the_tail() {
        // With no candidates the tail window is everything in [2, limit]
        let limit = 3;
        let (prime_tx, prime_rx) = mpsc::sync_channel(8);
        let (boundary_tx, boundary_rx) = mpsc::channel::<usize>();
        drop(boundary_tx);

        Releaser::new(limit, limit.isqrt(), Arc::new(Sieve::new(limit)), prime_tx)
            .listen(boundary_rx);

        let primes: Vec<usize> = prime_rx.iter().collect();
        assert_eq!(primes, vec![2, 3]);
    }
}
