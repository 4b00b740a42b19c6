//! Verifies that a unified SQuAD document satisfies the answer invariants.

use common::{span::span_matches, squad::SquadDataset};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    #[error("question {id} is impossible but has {count} answers")]
    ImpossibleWithAnswers { id: String, count: usize },
    #[error("question {id} is answerable but has no answers")]
    AnswerableWithoutAnswers { id: String },
    #[error("question {id}: answer '{text}' does not occur at offset {answer_start}")]
    SpanMismatch {
        id: String,
        text: String,
        answer_start: usize,
    },
}

pub fn check_dataset(dataset: &SquadDataset) -> Vec<Violation> {
    let mut violations = Vec::new();
    for (context, qa) in dataset.questions() {
        if qa.is_impossible {
            if !qa.answers.is_empty() {
                violations.push(Violation::ImpossibleWithAnswers {
                    id: qa.id.clone(),
                    count: qa.answers.len(),
                });
            }
            continue;
        }

        if qa.answers.is_empty() {
            violations.push(Violation::AnswerableWithoutAnswers { id: qa.id.clone() });
        }
        violations.extend(
            qa.answers
                .iter()
                .filter(|answer| !span_matches(context, &answer.text, answer.answer_start))
                .map(|answer| Violation::SpanMismatch {
                    id: qa.id.clone(),
                    text: answer.text.clone(),
                    answer_start: answer.answer_start,
                }),
        );
    }
    violations
}
