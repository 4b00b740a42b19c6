use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use common::{
    span::{find_span, Span},
    squad::{SquadDataset, SquadQuestion},
    utils::{
        config::DEFAULT_TRIVIAQA_MAX_WORDS,
        text::{read_file_contents, split_sentences, split_words},
    },
};
use serde::Deserialize;
use tracing::debug;

use super::Conversion;

/// Token inserted between paragraphs of the truncated evidence.
const PARAGRAPH_BREAK: &str = "\n";
/// Domain whose verified files also mark individual documents as verified.
const WEB_DOMAIN: &str = "Web";

#[derive(Debug, Clone)]
pub struct TriviaQaOptions {
    /// Directory holding Wikipedia evidence documents.
    pub data_dir: PathBuf,
    /// Directory holding web search evidence; defaults to `data_dir`.
    pub web_dir: Option<PathBuf>,
    pub max_words: usize,
}

impl TriviaQaOptions {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            web_dir: None,
            max_words: DEFAULT_TRIVIAQA_MAX_WORDS,
        }
    }

    fn evidence_path(&self, source: EvidenceSource, filename: &str) -> PathBuf {
        let dir = match source {
            EvidenceSource::Wikipedia => &self.data_dir,
            EvidenceSource::Web => self.web_dir.as_ref().unwrap_or(&self.data_dir),
        };
        dir.join(filename)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TriviaQaDataset {
    data: Vec<TriviaQaDatum>,
    #[serde(default)]
    domain: String,
    #[serde(default)]
    verified_eval: bool,
}

impl TriviaQaDataset {
    fn keeps_question(&self, datum: &TriviaQaDatum) -> bool {
        !self.verified_eval || datum.question_part_of_verified_eval
    }

    fn keeps_document(&self, document: &TriviaQaDocument) -> bool {
        !(self.verified_eval && self.domain == WEB_DOMAIN) || document.doc_part_of_verified_eval
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TriviaQaDatum {
    question: String,
    question_id: String,
    answer: TriviaQaAnswer,
    #[serde(default)]
    entity_pages: Vec<TriviaQaDocument>,
    #[serde(default)]
    search_results: Vec<TriviaQaDocument>,
    #[serde(default)]
    question_part_of_verified_eval: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TriviaQaAnswer {
    aliases: Vec<String>,
    normalized_aliases: Vec<String>,
    normalized_value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct TriviaQaDocument {
    filename: String,
    #[serde(default)]
    doc_part_of_verified_eval: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EvidenceSource {
    Wikipedia,
    Web,
}

/// One question paired with one of its evidence documents.
#[derive(Debug)]
struct QadTriple<'a> {
    question: &'a str,
    question_id: &'a str,
    answer: &'a TriviaQaAnswer,
    filename: &'a str,
    source: EvidenceSource,
}

impl QadTriple<'_> {
    fn id(&self) -> String {
        format!("{}--{}", self.question_id, self.filename)
    }
}

/// Pairs every question with each of its documents, entity pages first.
/// Verified-evaluation files keep only the verified questions, and in the web
/// domain only the verified documents of those questions.
fn qad_triples(dataset: &TriviaQaDataset) -> Vec<QadTriple<'_>> {
    dataset
        .data
        .iter()
        .filter(|datum| dataset.keeps_question(datum))
        .flat_map(move |datum| {
            let pages = datum
                .entity_pages
                .iter()
                .map(|doc| (doc, EvidenceSource::Wikipedia));
            let results = datum
                .search_results
                .iter()
                .map(|doc| (doc, EvidenceSource::Web));
            pages
                .chain(results)
                .filter(move |(doc, _)| dataset.keeps_document(doc))
                .map(move |(doc, source)| QadTriple {
                    question: &datum.question,
                    question_id: &datum.question_id,
                    answer: &datum.answer,
                    filename: &doc.filename,
                    source,
                })
        })
        .collect()
}

pub fn convert_triviaqa(triviaqa_file: &Path, options: &TriviaQaOptions) -> Result<Conversion> {
    let raw = fs::read_to_string(triviaqa_file)
        .with_context(|| format!("reading TriviaQA file at {}", triviaqa_file.display()))?;
    let parsed: TriviaQaDataset = serde_json::from_str(&raw)
        .with_context(|| format!("parsing TriviaQA file at {}", triviaqa_file.display()))?;

    let triples = qad_triples(&parsed);
    let mut dataset = SquadDataset::new();
    for triple in &triples {
        let evidence_path = options.evidence_path(triple.source, triple.filename);
        let text = read_file_contents(&evidence_path).with_context(|| {
            format!(
                "reading evidence for question {} at {}",
                triple.question_id,
                evidence_path.display()
            )
        })?;
        let context = select_relevant_portion(&text, options.max_words);

        let span = resolve_answer(triple.answer, &context);
        if span.is_none() {
            debug!(
                question_id = triple.question_id,
                filename = triple.filename,
                normalized_value = %triple.answer.normalized_value,
                "TriviaQA answer not found in evidence"
            );
        }

        let question = SquadQuestion::new(triple.id(), triple.question).with_span(span);
        dataset.push_question(context, question);
    }

    Ok(Conversion {
        dataset,
        records: triples.len(),
        dropped: 0,
    })
}

/// Keeps the first `max_words` word tokens of `text`, stopping mid-sentence if
/// needed. Paragraph breaks are kept as standalone newline tokens and every
/// token is re-joined with single spaces.
fn select_relevant_portion(text: &str, max_words: usize) -> String {
    let mut selected: Vec<&str> = Vec::new();
    'paragraphs: for paragraph in text.split('\n') {
        for sentence in split_sentences(paragraph) {
            for word in split_words(sentence) {
                selected.push(word);
                if selected.len() >= max_words {
                    break 'paragraphs;
                }
            }
        }
        selected.push(PARAGRAPH_BREAK);
    }

    selected.join(" ").trim().to_string()
}

/// Tries every alias, then every normalised alias, against the context.
/// Without a literal match the question is unanswerable; the normalised value
/// is never searched.
fn resolve_answer(answer: &TriviaQaAnswer, context: &str) -> Option<Span> {
    let candidates = answer.aliases.iter().chain(&answer.normalized_aliases);
    find_span(context, candidates)
}
