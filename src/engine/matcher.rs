use icu_normalizer::ComposingNormalizerBorrowed;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Match {
    /// Input equals one of the accepted answers.
    Exact,
    /// Input is a proper start of at least one accepted answer.
    Prefix,
    /// Nothing typed yet (or only whitespace).
    Empty,
    /// Input can no longer become an accepted answer.
    Miss,
}

/// NFKC-fold, lowercase and trim. NFKC maps full-width IME output
/// (`ｓｈｉ`, ideographic space) onto plain ASCII.
pub fn normalize(input: &str) -> String {
    let folded = ComposingNormalizerBorrowed::new_nfkc().normalize(input);
    folded.to_lowercase().trim().to_string()
}

pub fn is_exact_match<S: AsRef<str>>(input: &str, answers: &[S]) -> bool {
    let typed = normalize(input);
    answers.iter().any(|a| normalize(a.as_ref()) == typed)
}

pub fn is_valid_prefix<S: AsRef<str>>(input: &str, answers: &[S]) -> bool {
    let typed = normalize(input);
    if typed.is_empty() {
        return false;
    }
    answers
        .iter()
        .any(|a| normalize(a.as_ref()).starts_with(typed.as_str()))
}

pub fn classify<S: AsRef<str>>(input: &str, answers: &[S]) -> Match {
    if normalize(input).is_empty() {
        Match::Empty
    } else if is_exact_match(input, answers) {
        Match::Exact
    } else if is_valid_prefix(input, answers) {
        Match::Prefix
    } else {
        Match::Miss
    }
}
