use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use common::{
    error::ConversionError,
    span::find_all_spans,
    squad::{SquadDataset, SquadQuestion},
    utils::text::render_html_range,
};
use flate2::read::MultiGzDecoder;
use serde::Deserialize;
use tracing::{debug, info};

use super::Conversion;

/// Raw token that must close a long answer for it to be used as context.
const PARAGRAPH_CLOSE_TAG: &str = "</P>";
/// Agreeing annotations required when an example has more than one.
const MIN_AGREEING_ANNOTATIONS: usize = 2;

#[derive(Debug, Deserialize)]
struct NqExample {
    example_id: serde_json::Number,
    question_text: String,
    document_html: String,
    document_tokens: Vec<NqToken>,
    annotations: Vec<NqAnnotation>,
}

#[derive(Debug, Deserialize)]
struct NqToken {
    token: String,
}

#[derive(Debug, Deserialize)]
struct NqAnnotation {
    long_answer: NqSpan,
    short_answers: Vec<NqSpan>,
    yes_no_answer: String,
}

#[derive(Debug, Deserialize)]
struct NqSpan {
    start_byte: i64,
    end_byte: i64,
    end_token: i64,
}

impl NqSpan {
    fn bounds(&self) -> (i64, i64) {
        (self.start_byte, self.end_byte)
    }
}

impl NqAnnotation {
    fn has_long_answer(&self) -> bool {
        self.long_answer.start_byte >= 0
    }

    fn has_short_answer(&self) -> bool {
        !self.short_answers.is_empty() || self.yes_no_answer != "NONE"
    }
}

impl NqExample {
    /// A lone annotation decides by itself; otherwise at least two annotations
    /// must satisfy `predicate`.
    fn corroborated(&self, predicate: impl Fn(&NqAnnotation) -> bool) -> bool {
        match self.annotations.as_slice() {
            [single] => predicate(single),
            annotations => {
                annotations.iter().filter(|a| predicate(a)).count() >= MIN_AGREEING_ANNOTATIONS
            }
        }
    }

    fn has_long_answer(&self) -> bool {
        self.corroborated(NqAnnotation::has_long_answer)
    }

    fn has_short_answer(&self) -> bool {
        self.corroborated(NqAnnotation::has_short_answer)
    }

    /// The most frequent long-answer byte range; ties go to the first seen.
    fn majority_long_answer(&self) -> Option<&NqSpan> {
        let present: Vec<&NqSpan> = self
            .annotations
            .iter()
            .filter(|a| a.has_long_answer())
            .map(|a| &a.long_answer)
            .collect();

        let mut best: Option<(&NqSpan, usize)> = None;
        for &span in &present {
            let votes = present
                .iter()
                .filter(|other| other.bounds() == span.bounds())
                .count();
            if best.map_or(true, |(_, best_votes)| votes > best_votes) {
                best = Some((span, votes));
            }
        }
        best.map(|(span, _)| span)
    }

    /// Rendered text of the agreed long answer, or `None` when the example has
    /// no usable long answer.
    fn long_answer_text(&self) -> Result<Option<String>, ConversionError> {
        if !self.has_long_answer() {
            return Ok(None);
        }
        let Some(long_answer) = self.majority_long_answer() else {
            return Ok(None);
        };

        let last_token = long_answer.end_token.saturating_sub(1);
        let token = usize::try_from(last_token)
            .ok()
            .and_then(|idx| self.document_tokens.get(idx))
            .ok_or(ConversionError::TokenOutOfRange {
                index: last_token,
                len: self.document_tokens.len(),
            })?;
        if token.token != PARAGRAPH_CLOSE_TAG {
            return Ok(None);
        }

        render_html_range(
            &self.document_html,
            long_answer.start_byte,
            long_answer.end_byte,
        )
        .map(Some)
    }

    /// One candidate per annotation with short answers: its rendered spans
    /// joined with ", ". Duplicates are removed, keeping first-seen order;
    /// callers must not rely on that order.
    fn short_answer_texts(&self) -> Result<Vec<String>, ConversionError> {
        if !self.has_short_answer() {
            return Ok(Vec::new());
        }

        let mut seen = HashSet::new();
        let mut texts = Vec::new();
        for annotation in self.annotations.iter().filter(|a| !a.short_answers.is_empty()) {
            let rendered = annotation
                .short_answers
                .iter()
                .map(|s| render_html_range(&self.document_html, s.start_byte, s.end_byte))
                .collect::<Result<Vec<_>, _>>()?;
            let text = rendered.join(", ");
            if seen.insert(text.clone()) {
                texts.push(text);
            }
        }
        Ok(texts)
    }
}

fn shard_paths(nq_dir: &Path) -> Result<Vec<PathBuf>> {
    let pattern = format!(
        "{}/*.gz",
        glob::Pattern::escape(&nq_dir.to_string_lossy())
    );
    let mut paths = glob::glob(&pattern)
        .with_context(|| format!("building glob pattern {pattern}"))?
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("listing Natural Questions files in {}", nq_dir.display()))?;
    paths.sort();
    Ok(paths)
}

pub fn convert_nq(nq_dir: &Path) -> Result<Conversion> {
    let shards = shard_paths(nq_dir)?;
    info!(
        dir = %nq_dir.display(),
        shards = shards.len(),
        "Found Natural Questions shards"
    );

    let mut conversion = Conversion {
        dataset: SquadDataset::new(),
        records: 0,
        dropped: 0,
    };
    for shard in &shards {
        convert_shard(shard, &mut conversion)?;
    }

    Ok(conversion)
}

fn convert_shard(shard: &Path, conversion: &mut Conversion) -> Result<()> {
    let file = File::open(shard)
        .with_context(|| format!("opening Natural Questions file at {}", shard.display()))?;
    let reader = BufReader::new(MultiGzDecoder::new(file));

    for (line_idx, line) in reader.lines().enumerate() {
        let line = line.with_context(|| {
            format!(
                "reading Natural Questions line {} from {}",
                line_idx + 1,
                shard.display()
            )
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let example: NqExample = serde_json::from_str(&line).with_context(|| {
            format!(
                "parsing Natural Questions JSON (line {}) at {}",
                line_idx + 1,
                shard.display()
            )
        })?;
        conversion.records += 1;

        let context_error = || {
            format!(
                "resolving answers for example {} (line {}) at {}",
                example.example_id,
                line_idx + 1,
                shard.display()
            )
        };
        let context = match example.long_answer_text().with_context(context_error)? {
            Some(text) if !text.is_empty() => text,
            _ => {
                debug!(example_id = %example.example_id, "Dropping example without usable long answer");
                conversion.dropped += 1;
                continue;
            }
        };

        let candidates = example.short_answer_texts().with_context(context_error)?;
        let mut question =
            SquadQuestion::new(example.example_id.to_string(), example.question_text);
        for span in find_all_spans(&context, &candidates) {
            question.push_span(span);
        }
        conversion.dataset.push_question(context, question);
    }

    Ok(())
}
