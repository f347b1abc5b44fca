//! Lenient comparison of typed answers.

/// Characters ignored at the end of an answer.
const TRAILING_PUNCTUATION: &[char] = &['.', '!', '?', ',', ';', ':'];

/// Lowercases, trims, drops trailing punctuation and collapses whitespace.
#[must_use]
pub fn normalize(answer: &str) -> String {
    let lowered = answer.trim().to_lowercase();
    let stripped = lowered.trim_end_matches(TRAILING_PUNCTUATION);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether `given` matches any of the accepted answers.
#[must_use]
pub fn is_correct(given: &str, accepted: &[&str]) -> bool {
    let given = normalize(given);
    if given.is_empty() {
        return false;
    }
    accepted.iter().any(|candidate| normalize(candidate) == given)
}
