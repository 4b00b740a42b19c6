mod newsqa;
mod nq;
mod quac;
mod triviaqa;

use std::fmt;

use common::squad::SquadDataset;

pub use newsqa::convert_newsqa;
pub use nq::convert_nq;
pub use quac::{convert_quac, CANNOT_ANSWER};
pub use triviaqa::{convert_triviaqa, TriviaQaOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatasetKind {
    NewsQa,
    NaturalQuestions,
    Quac,
    TriviaQa,
}

impl DatasetKind {
    pub fn id(self) -> &'static str {
        match self {
            Self::NewsQa => "newsqa",
            Self::NaturalQuestions => "nq",
            Self::Quac => "quac",
            Self::TriviaQa => "triviaqa",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::NewsQa => "NewsQA",
            Self::NaturalQuestions => "Natural Questions",
            Self::Quac => "QuAC",
            Self::TriviaQa => "TriviaQA",
        }
    }
}

/// Output of a single converter run.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub dataset: SquadDataset,
    /// Source records read (rows, examples, questions or question/document pairs).
    pub records: usize,
    /// Records that produced no question at all.
    pub dropped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionStats {
    pub records: usize,
    pub questions: usize,
    pub answerable: usize,
    pub impossible: usize,
    pub dropped: usize,
}

impl Conversion {
    pub fn stats(&self) -> ConversionStats {
        let (answerable, impossible) = self.dataset.questions().fold(
            (0usize, 0usize),
            |(answerable, impossible), (_, qa)| {
                if qa.is_impossible {
                    (answerable, impossible + 1)
                } else {
                    (answerable + 1, impossible)
                }
            },
        );

        ConversionStats {
            records: self.records,
            questions: answerable + impossible,
            answerable,
            impossible,
            dropped: self.dropped,
        }
    }
}

impl fmt::Display for ConversionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{records} records → {questions} questions ({answerable} answerable, {impossible} impossible, {dropped} dropped)",
            records = self.records,
            questions = self.questions,
            answerable = self.answerable,
            impossible = self.impossible,
            dropped = self.dropped,
        )
    }
}
