use rand::Rng;
use rand::seq::SliceRandom;

/// Quotes shown in the inspiration section
pub const QUOTES: [&str; 5] = [
    "Believe you can and you're halfway there.",
    "Challenges are what make life interesting.",
    "Every day is a chance to get better.",
    "Growth is painful. Change is painful. But nothing is as painful as staying stuck.",
    "Success is the sum of small efforts repeated daily.",
];

/// Pick one quote uniformly at random
pub fn random_quote() -> &'static str {
    quote_with(&mut rand::thread_rng())
}

/// Pick one quote using the given random source
pub fn quote_with<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    // QUOTES is a non-empty constant
    QUOTES.choose(rng).copied().unwrap_or(QUOTES[0])
}
