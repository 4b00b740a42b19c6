use std::path::Path;

use anyhow::{Context, Result};
use common::{
    error::ConversionError,
    span::find_span,
    squad::{SquadDataset, SquadQuestion},
};
use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::Conversion;

#[derive(Debug, Deserialize)]
struct NewsQaRow {
    story_id: String,
    story_text: String,
    question: String,
    #[serde(default)]
    answer_token_ranges: Option<String>,
}

pub fn convert_newsqa(newsqa_file: &Path) -> Result<Conversion> {
    let mut reader = csv::Reader::from_path(newsqa_file)
        .with_context(|| format!("opening NewsQA file at {}", newsqa_file.display()))?;

    let mut dataset = SquadDataset::new();
    let mut records = 0usize;
    for (row_idx, row) in reader.deserialize::<NewsQaRow>().enumerate() {
        let row = row.with_context(|| {
            format!(
                "parsing NewsQA row {} from {}",
                row_idx + 1,
                newsqa_file.display()
            )
        })?;
        records += 1;

        let answer = answer_text(&row.story_text, row.answer_token_ranges.as_deref())
            .with_context(|| {
                format!(
                    "resolving answer for story {} (row {})",
                    row.story_id,
                    row_idx + 1
                )
            })?;
        let span = answer
            .filter(|text| !text.is_empty())
            .and_then(|text| find_span(&row.story_text, [text]));
        if span.is_none() {
            debug!(story_id = %row.story_id, "NewsQA answer not found in story");
        }

        let question = SquadQuestion::new(Uuid::new_v4().simple().to_string(), row.question)
            .with_span(span);
        dataset.push_question(row.story_text, question);
    }

    Ok(Conversion {
        dataset,
        records,
        dropped: 0,
    })
}

/// Reconstructs the answer from the first token range in `answer_token_ranges`
/// by joining the whitespace-separated story tokens it covers.
///
/// Returns `None` when no range is given. The joined text normalises spacing,
/// so it does not always occur verbatim in the story.
fn answer_text(
    story_text: &str,
    answer_token_ranges: Option<&str>,
) -> Result<Option<String>, ConversionError> {
    let Some(ranges) = answer_token_ranges.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    let (start, end) = parse_token_range(ranges)?;

    let tokens: Vec<&str> = story_text.split_whitespace().collect();
    let (start, end) = slice_bounds(tokens.len(), start, end);
    let answer = tokens.get(start..end).unwrap_or_default().join(" ");

    Ok(Some(answer))
}

/// Parses `"start:end"` style ranges. Every `:`/`,` separated piece must be an
/// integer; only the first pair is returned.
fn parse_token_range(ranges: &str) -> Result<(i64, i64), ConversionError> {
    let bounds = ranges
        .split([':', ','])
        .map(|piece| piece.trim().parse::<i64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| ConversionError::InvalidTokenRange(ranges.to_string()))?;

    match bounds.as_slice() {
        [start, end, ..] => Ok((*start, *end)),
        _ => Err(ConversionError::InvalidTokenRange(ranges.to_string())),
    }
}

/// Clamps a `[start, end)` slice request to `len`, counting negative indices
/// from the end. An inverted range collapses to empty.
fn slice_bounds(len: usize, start: i64, end: i64) -> (usize, usize) {
    let len_i = i64::try_from(len).unwrap_or(i64::MAX);
    let clamp = |idx: i64| {
        let idx = if idx < 0 { idx.saturating_add(len_i) } else { idx };
        usize::try_from(idx.clamp(0, len_i)).unwrap_or(len)
    };
    let (start, end) = (clamp(start), clamp(end));
    (start, end.max(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconstructs_answer_from_token_range() {
        let answer = answer_text("The cat sat down", Some("1:3")).unwrap();
        assert_eq!(answer.as_deref(), Some("cat sat"));

        let span = find_span("The cat sat down", [answer.unwrap()]).unwrap();
        assert_eq!(span.answer_start, 4);
    }

    #[test]
    fn range_end_is_exclusive() {
        let answer = answer_text("The cat sat down", Some("2:4")).unwrap().unwrap();
        assert_eq!(answer, "sat down");

        let span = find_span("The cat sat down", [answer]).unwrap();
        assert_eq!(span.answer_start, 8);
    }

    #[test]
    fn only_first_range_is_used() {
        let answer = answer_text("a b c d e f", Some("0:2,3:5")).unwrap();
        assert_eq!(answer.as_deref(), Some("a b"));
    }

    #[test]
    fn comma_separates_bounds_too() {
        assert_eq!(parse_token_range("4,7").unwrap(), (4, 7));
        assert_eq!(parse_token_range(" 4 : 7 ").unwrap(), (4, 7));
    }

    #[test]
    fn missing_ranges_have_no_answer() {
        assert_eq!(answer_text("story", None).unwrap(), None);
        assert_eq!(answer_text("story", Some("")).unwrap(), None);
    }

    #[test]
    fn malformed_ranges_are_errors() {
        assert!(matches!(
            parse_token_range("12"),
            Err(ConversionError::InvalidTokenRange(_))
        ));
        assert!(matches!(
            parse_token_range("1:x"),
            Err(ConversionError::InvalidTokenRange(_))
        ));
    }

    #[test]
    fn out_of_range_tokens_clamp_to_story() {
        assert_eq!(slice_bounds(4, 2, 10), (2, 4));
        assert_eq!(slice_bounds(4, 5, 9), (4, 4));
        assert_eq!(slice_bounds(4, 3, 1), (3, 3));
        assert_eq!(slice_bounds(4, -2, 4), (2, 4));

        let answer = answer_text("one two", Some("5:9")).unwrap();
        assert_eq!(answer.as_deref(), Some(""));
    }

    #[test]
    fn whitespace_join_can_miss_story_spacing() {
        let story = "He said:\n\"no\"  twice";
        let answer = answer_text(story, Some("1:3")).unwrap().unwrap();

        assert_eq!(answer, "said: \"no\"");
        assert!(find_span(story, [answer]).is_none());
    }
}
