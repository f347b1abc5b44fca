use super::plan::DailyProgram;
use super::progress::DailyCompletionSet;

fn is_open(program: &DailyProgram, completion: &DailyCompletionSet, index: usize) -> bool {
    program
        .key_at(index)
        .is_some_and(|key| !completion.contains(&key))
}

/// First item, in program order, that is not complete yet.
#[must_use]
pub fn next_incomplete(program: &DailyProgram, completion: &DailyCompletionSet) -> Option<usize> {
    (0..program.len()).find(|&index| is_open(program, completion, index))
}

/// Next open item after `current`, wrapping around to the start.
///
/// Returns `current` itself only when it is the last open item, and `None`
/// once everything is complete. An out-of-range `current` scans from the start.
#[must_use]
pub fn skip(
    program: &DailyProgram,
    completion: &DailyCompletionSet,
    current: usize,
) -> Option<usize> {
    let len = program.len();
    if current >= len {
        return next_incomplete(program, completion);
    }
    (current + 1..len)
        .chain(0..current)
        .find(|&index| is_open(program, completion, index))
        .or_else(|| is_open(program, completion, current).then_some(current))
}
