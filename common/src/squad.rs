//! Unified SQuAD 2.0 output model.
//!
//! Struct fields are declared in lexicographic order so the serialised JSON
//! has sorted keys at every level.

use std::{fs, io::Write, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::span::Span;

pub const SQUAD_VERSION: &str = "2.0";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadDataset {
    pub data: Vec<SquadArticle>,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadArticle {
    pub paragraphs: Vec<SquadParagraph>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadParagraph {
    pub context: String,
    pub qas: Vec<SquadQuestion>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadQuestion {
    pub answers: Vec<SquadAnswer>,
    pub id: String,
    pub is_impossible: bool,
    pub question: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SquadAnswer {
    pub answer_start: usize,
    pub text: String,
}

impl SquadQuestion {
    /// A question with no answers yet; it stays impossible until an answer is
    /// pushed.
    pub fn new(id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            answers: Vec::new(),
            id: id.into(),
            is_impossible: true,
            question: question.into(),
        }
    }

    pub fn push_answer(&mut self, text: impl Into<String>, answer_start: usize) {
        self.answers.push(SquadAnswer {
            answer_start,
            text: text.into(),
        });
        self.is_impossible = false;
    }

    pub fn push_span(&mut self, span: Span) {
        self.push_answer(span.text, span.answer_start);
    }

    #[must_use]
    pub fn with_span(mut self, span: Option<Span>) -> Self {
        if let Some(span) = span {
            self.push_span(span);
        }
        self
    }
}

impl Default for SquadDataset {
    fn default() -> Self {
        Self {
            data: Vec::new(),
            version: SQUAD_VERSION.to_string(),
        }
    }
}

impl SquadDataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a question under its own single-paragraph article.
    pub fn push_question(&mut self, context: impl Into<String>, question: SquadQuestion) {
        self.data.push(SquadArticle {
            paragraphs: vec![SquadParagraph {
                context: context.into(),
                qas: vec![question],
            }],
        });
    }

    /// Iterates `(context, question)` pairs across every article.
    pub fn questions(&self) -> impl Iterator<Item = (&str, &SquadQuestion)> {
        self.data
            .iter()
            .flat_map(|article| article.paragraphs.iter())
            .flat_map(|paragraph| {
                paragraph
                    .qas
                    .iter()
                    .map(move |qa| (paragraph.context.as_str(), qa))
            })
    }

    pub fn question_count(&self) -> usize {
        self.questions().count()
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating parent directory for {}", path.display()))?;
    }
    Ok(())
}

/// Renders the dataset as pretty-printed JSON and replaces `output_path` in a
/// single rename, so a failed write leaves any existing file untouched.
pub fn write_squad(dataset: &SquadDataset, output_path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(dataset).context("serialising SQuAD dataset to JSON")?;

    ensure_parent(output_path)?;
    let dir = match output_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating staging file in {}", dir.display()))?;
    staged
        .write_all(json.as_bytes())
        .with_context(|| format!("staging SQuAD output for {}", output_path.display()))?;
    staged
        .as_file()
        .sync_all()
        .with_context(|| format!("flushing SQuAD output for {}", output_path.display()))?;
    staged
        .persist(output_path)
        .with_context(|| format!("writing SQuAD output to {}", output_path.display()))?;

    debug!(path = %output_path.display(), bytes = json.len(), "Wrote SQuAD dataset");
    Ok(())
}

pub fn read_squad(path: &Path) -> Result<SquadDataset> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading SQuAD dataset at {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing SQuAD dataset at {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> SquadDataset {
        let mut dataset = SquadDataset::new();
        let mut answered = SquadQuestion::new("q1", "Where did the cat sit?");
        answered.push_answer("sat down", 8);
        dataset.push_question("The cat sat down", answered);
        dataset.push_question("Ünïcödé context", SquadQuestion::new("q2", "Why?"));
        dataset
    }

    #[test]
    fn new_question_is_impossible_until_answered() {
        let mut qa = SquadQuestion::new("id", "q");
        assert!(qa.is_impossible);
        assert!(qa.answers.is_empty());

        qa.push_answer("a", 0);
        assert!(!qa.is_impossible);
        assert_eq!(qa.answers.len(), 1);
    }

    #[test]
    fn each_question_gets_its_own_article() {
        let dataset = sample();

        assert_eq!(dataset.data.len(), 2);
        assert!(dataset.data.iter().all(|a| a.paragraphs.len() == 1));
        assert_eq!(dataset.question_count(), 2);
        assert_eq!(dataset.version, "2.0");
    }

    #[test]
    fn serialised_keys_are_sorted_and_unicode_is_literal() {
        let json = serde_json::to_string_pretty(&sample()).unwrap();

        let data = json.find("\"data\"").unwrap();
        let version = json.find("\"version\"").unwrap();
        assert!(data < version);

        let answers = json.find("\"answers\"").unwrap();
        let id = json.find("\"id\"").unwrap();
        let impossible = json.find("\"is_impossible\"").unwrap();
        let question = json.find("\"question\"").unwrap();
        assert!(answers < id && id < impossible && impossible < question);

        let start = json.find("\"answer_start\"").unwrap();
        let text = json.find("\"text\"").unwrap();
        assert!(start < text);

        assert!(json.contains("Ünïcödé context"));
        assert!(!json.contains("\\u"));
        assert!(json.contains("\n  \"data\": ["));
    }

    #[test]
    fn write_then_read_preserves_dataset() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested/out.json");

        write_squad(&sample(), &path).unwrap();
        let restored = read_squad(&path).unwrap();

        assert_eq!(restored, sample());
    }

    #[test]
    fn existing_output_is_replaced_whole() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.json");
        fs::write(&path, "previous contents that are much longer than needed").unwrap();

        write_squad(&SquadDataset::new(), &path).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert_eq!(written, "{\n  \"data\": [],\n  \"version\": \"2.0\"\n}");
    }
}
