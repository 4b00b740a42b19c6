use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use converters::datasets::TriviaQaOptions;

#[derive(Parser, Debug, Clone)]
#[command(
    author,
    version,
    about = "Convert question-answering datasets into SQuAD 2.0 JSON",
    long_about = None
)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Convert a NewsQA CSV file
    #[command(name = "newsqa")]
    NewsQa(NewsQaArgs),

    /// Convert a directory of gzip-compressed Natural Questions JSON-lines files
    #[command(name = "nq")]
    NaturalQuestions(NqArgs),

    /// Convert a QuAC JSON file
    #[command(name = "quac")]
    Quac(QuacArgs),

    /// Convert a TriviaQA question file and its evidence documents
    #[command(name = "triviaqa")]
    TriviaQa(TriviaQaArgs),

    /// Verify answer offsets of a converted SQuAD file
    #[command(name = "check")]
    Check(CheckArgs),
}

#[derive(Debug, Clone, Args)]
pub struct NewsQaArgs {
    /// NewsQA file
    #[arg(long)]
    pub newsqa_file: PathBuf,

    /// Output file in SQuAD format
    #[arg(long)]
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct NqArgs {
    /// Directory of NQ .gz files
    #[arg(long)]
    pub nq_dir: PathBuf,

    /// Output file in SQuAD format
    #[arg(long)]
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct QuacArgs {
    /// QuAC file
    #[arg(long)]
    pub quac_file: PathBuf,

    /// Output file in SQuAD format
    #[arg(long)]
    pub output_file: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct TriviaQaArgs {
    /// TriviaQA file
    #[arg(long)]
    pub triviaqa_file: PathBuf,

    /// Wikipedia data directory
    #[arg(long)]
    pub data_dir: PathBuf,

    /// Web evidence directory (defaults to --data-dir)
    #[arg(long)]
    pub web_dir: Option<PathBuf>,

    /// Word cap for each evidence context (overrides SQUADIFY_TRIVIAQA_MAX_WORDS)
    #[arg(long)]
    pub max_words: Option<usize>,

    /// Output file in SQuAD format
    #[arg(long)]
    pub output_file: PathBuf,
}

impl TriviaQaArgs {
    /// Resolves evidence settings, with `--max-words` overriding the
    /// configured cap. The resolved cap must be positive.
    pub fn options(&self, default_max_words: usize) -> Result<TriviaQaOptions> {
        let max_words = self.max_words.unwrap_or(default_max_words);
        if max_words == 0 {
            bail!("TriviaQA word cap must be greater than zero");
        }
        Ok(TriviaQaOptions {
            data_dir: self.data_dir.clone(),
            web_dir: self.web_dir.clone(),
            max_words,
        })
    }
}

#[derive(Debug, Clone, Args)]
pub struct CheckArgs {
    /// SQuAD file to verify
    #[arg(long)]
    pub squad_file: PathBuf,
}

pub fn parse() -> Config {
    Config::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_newsqa_flags() {
        let config = Config::try_parse_from([
            "squadify",
            "newsqa",
            "--newsqa-file",
            "train.csv",
            "--output-file",
            "out.json",
        ])
        .unwrap();

        let Command::NewsQa(args) = &config.command else {
            panic!("expected newsqa command");
        };
        assert_eq!(args.newsqa_file, PathBuf::from("train.csv"));
        assert_eq!(args.output_file, PathBuf::from("out.json"));
    }

    #[test]
    fn help_is_answered_by_argument_parsing_alone() {
        let err = Config::try_parse_from(["squadify", "--help"]).unwrap_err();

        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }

    #[test]
    fn missing_input_flag_is_rejected() {
        let result = Config::try_parse_from(["squadify", "quac", "--output-file", "out.json"]);

        assert!(result.is_err());
    }

    #[test]
    fn triviaqa_word_cap_prefers_flag_over_config() {
        let config = Config::try_parse_from([
            "squadify",
            "triviaqa",
            "--triviaqa-file",
            "wikipedia-dev.json",
            "--data-dir",
            "evidence/wikipedia",
            "--max-words",
            "400",
            "--output-file",
            "out.json",
        ])
        .unwrap();
        let Command::TriviaQa(args) = &config.command else {
            panic!("expected triviaqa command");
        };

        let options = args.options(800).unwrap();
        assert_eq!(options.max_words, 400);
        assert_eq!(options.web_dir, None);
    }

    fn triviaqa_args(extra: &[&str]) -> TriviaQaArgs {
        let mut argv = vec![
            "squadify",
            "triviaqa",
            "--triviaqa-file",
            "t.json",
            "--data-dir",
            "d",
            "--output-file",
            "o.json",
        ];
        argv.extend_from_slice(extra);
        let Command::TriviaQa(args) = Config::try_parse_from(argv).unwrap().command else {
            panic!("expected triviaqa command");
        };
        args
    }

    #[test]
    fn configured_word_cap_applies_without_flag() {
        let options = triviaqa_args(&[]).options(250).unwrap();

        assert_eq!(options.max_words, 250);
    }

    #[test]
    fn zero_word_cap_from_flag_is_rejected() {
        assert!(triviaqa_args(&["--max-words", "0"]).options(800).is_err());
    }

    #[test]
    fn zero_word_cap_from_config_is_rejected() {
        assert!(triviaqa_args(&[]).options(0).is_err());
    }
}
