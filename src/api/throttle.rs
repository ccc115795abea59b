use std::thread;
use std::time::{Duration, Instant};

/// Runs tasks one after another with a fixed minimum pause between them.
///
/// Nominatim allows at most one request per second. The first task runs
/// immediately.
#[derive(Debug)]
pub struct RateLimitedRunner {
    delay: Duration,
    last_finished: Option<Instant>,
}

impl RateLimitedRunner {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_finished: None,
        }
    }

    /// Run one task, waiting first if the previous one finished less than
    /// `delay` ago
    pub fn run<T>(&mut self, task: impl FnOnce() -> T) -> T {
        if let Some(last) = self.last_finished {
            let elapsed = last.elapsed();
            if elapsed < self.delay {
                thread::sleep(self.delay - elapsed);
            }
        }

        let output = task();
        self.last_finished = Some(Instant::now());
        output
    }

    /// Apply `task` to every item in order, rate limited
    pub fn run_all<I, T, U, F>(&mut self, items: I, mut task: F) -> Vec<U>
    where
        I: IntoIterator<Item = T>,
        F: FnMut(T) -> U,
    {
        items
            .into_iter()
            .map(|item| self.run(|| task(item)))
            .collect()
    }
}
