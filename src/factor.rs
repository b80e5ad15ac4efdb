use std::collections::HashMap;

/// Divisor enumeration with a per-run cache.
///
/// Every candidate tile shape is a (divisor, cofactor) pair of the item's
/// unit count, so the same counts get factored over and over during a
/// configuration. Values are pure functions of `n`; the cache is never
/// invalidated.
#[derive(Debug, Default)]
pub struct Factorizer {
    cache: HashMap<u64, Vec<u64>>,
}

impl Factorizer {
    pub fn new() -> Self {
        Self {
            cache: HashMap::new(),
        }
    }

    /// All positive divisors of `n` in ascending order, including 1 and `n`.
    pub fn factors(&mut self, n: u64) -> Vec<u64> {
        if let Some(cached) = self.cache.get(&n) {
            return cached.clone();
        }
        let factors = compute_factors(n);
        self.cache.insert(n, factors.clone());
        factors
    }
}

fn compute_factors(n: u64) -> Vec<u64> {
    if n == 1 {
        return vec![1];
    }

    let mut factors = vec![1];
    let half = n / 2;
    // Odd numbers have no even divisors, so those can be skipped entirely.
    let (mut i, step) = if n % 2 == 0 { (2, 1) } else { (3, 2) };
    while i <= half {
        if n % i == 0 {
            factors.push(i);
        }
        i += step;
    }
    factors.push(n);
    factors
}
