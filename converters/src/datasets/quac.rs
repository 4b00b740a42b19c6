use std::{fs, path::Path};

use anyhow::{Context, Result};
use common::squad::{SquadDataset, SquadQuestion};
use serde::Deserialize;

use super::Conversion;

/// Answer text QuAC uses for questions the annotator could not answer.
pub const CANNOT_ANSWER: &str = "CANNOTANSWER";

pub fn convert_quac(quac_file: &Path) -> Result<Conversion> {
    #[derive(Debug, Deserialize)]
    struct QuacDataset {
        data: Vec<QuacArticle>,
    }

    #[derive(Debug, Deserialize)]
    struct QuacArticle {
        paragraphs: Vec<QuacParagraph>,
    }

    #[derive(Debug, Deserialize)]
    struct QuacParagraph {
        context: String,
        qas: Vec<QuacQuestion>,
    }

    #[derive(Debug, Deserialize)]
    struct QuacQuestion {
        id: String,
        question: String,
        orig_answer: QuacAnswer,
    }

    #[derive(Debug, Deserialize)]
    struct QuacAnswer {
        text: String,
        answer_start: usize,
    }

    let raw = fs::read_to_string(quac_file)
        .with_context(|| format!("reading QuAC file at {}", quac_file.display()))?;
    let parsed: QuacDataset = serde_json::from_str(&raw)
        .with_context(|| format!("parsing QuAC file at {}", quac_file.display()))?;

    let mut dataset = SquadDataset::new();
    let mut records = 0usize;
    for article in parsed.data {
        for paragraph in article.paragraphs {
            for qa in paragraph.qas {
                records += 1;
                let mut question = SquadQuestion::new(qa.id, qa.question);
                // offsets are taken from the source as-is
                if qa.orig_answer.text != CANNOT_ANSWER {
                    question.push_answer(qa.orig_answer.text, qa.orig_answer.answer_start);
                }
                dataset.push_question(paragraph.context.clone(), question);
            }
        }
    }

    Ok(Conversion {
        dataset,
        records,
        dropped: 0,
    })
}
