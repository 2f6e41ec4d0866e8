//! Prime capacity selection.
//!
//! Table capacities are always prime. The first capacity is the smallest prime
//! at least one and a half times the requested entry count, and every growth
//! step picks the smallest prime at least twice the current capacity.

/// Returns `true` if `n` is prime.
///
/// Trial division by every integer in `2..=⌊√n⌋`. Zero and one are not prime.
///
/// # Examples
///
/// ```rust
/// use prime_probe::primes::is_prime;
///
/// assert!(is_prime(2));
/// assert!(is_prime(17));
/// assert!(!is_prime(1));
/// assert!(!is_prime(21));
/// ```
pub fn is_prime(n: usize) -> bool {
    if n <= 1 {
        return false;
    }

    let mut divisor = 2usize;
    // `divisor <= n / divisor` is `divisor * divisor <= n` without overflow.
    while divisor <= n / divisor {
        if n % divisor == 0 {
            return false;
        }
        divisor += 1;
    }

    true
}

/// Returns the smallest prime greater than or equal to `n`.
///
/// The search is a linear scan and has no upper bound.
///
/// # Examples
///
/// ```rust
/// use prime_probe::primes::next_prime;
///
/// assert_eq!(next_prime(0), 2);
/// assert_eq!(next_prime(7), 7);
/// assert_eq!(next_prime(14), 17);
/// ```
pub fn next_prime(mut n: usize) -> usize {
    while !is_prime(n) {
        n += 1;
    }
    n
}

/// Slot count for a table created for `requested` entries: the smallest prime
/// at least `⌊1.5 * requested⌋`.
#[inline]
pub fn initial_capacity(requested: usize) -> usize {
    next_prime(requested.saturating_add(requested / 2))
}

/// Slot count after growing a table of `capacity` slots: the smallest prime at
/// least twice as large.
#[inline]
pub fn grown_capacity(capacity: usize) -> usize {
    next_prime(capacity.saturating_mul(2))
}
