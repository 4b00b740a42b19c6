//! Answer-span resolution: locating an answer's literal text inside a context
//! and reporting its character offset.

/// A resolved answer span. `answer_start` counts characters, not bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub answer_start: usize,
}

/// Character offset of the first literal occurrence of `needle` in `context`.
pub fn char_offset_of(context: &str, needle: &str) -> Option<usize> {
    context
        .find(needle)
        .map(|byte_idx| context.get(..byte_idx).map_or(0, |prefix| prefix.chars().count()))
}

/// Tries `candidates` in order and returns the first one that occurs in
/// `context`. First match wins; no attempt is made to prefer longer matches.
pub fn find_span<I, S>(context: &str, candidates: I) -> Option<Span>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates.into_iter().find_map(|candidate| {
        let candidate = candidate.as_ref();
        char_offset_of(context, candidate).map(|answer_start| Span {
            text: candidate.to_string(),
            answer_start,
        })
    })
}

/// Resolves every candidate independently, keeping one span per candidate
/// that occurs in `context`, in candidate order.
pub fn find_all_spans<I, S>(context: &str, candidates: I) -> Vec<Span>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    candidates
        .into_iter()
        .filter_map(|candidate| find_span(context, [candidate]))
        .collect()
}

/// Returns true when `text` occurs in `context` starting at character
/// offset `answer_start`.
pub fn span_matches(context: &str, text: &str, answer_start: usize) -> bool {
    if context.chars().count() < answer_start {
        return false;
    }
    context
        .chars()
        .skip(answer_start)
        .take(text.chars().count())
        .eq(text.chars())
}
