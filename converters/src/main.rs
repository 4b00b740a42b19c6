mod args;

use std::path::Path;

use anyhow::{bail, Context};
use common::{
    squad::{read_squad, write_squad},
    utils::config::get_config,
};
use converters::{
    check::check_dataset,
    datasets::{
        convert_newsqa, convert_nq, convert_quac, convert_triviaqa, Conversion, DatasetKind,
    },
};
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::args::Command;

fn main() -> anyhow::Result<()> {
    let config = args::parse();
    let app_config = get_config().context("loading squadify configuration")?;

    // RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&app_config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .ok();

    match &config.command {
        Command::NewsQa(args) => run_conversion(DatasetKind::NewsQa, &args.output_file, || {
            convert_newsqa(&args.newsqa_file)
        }),
        Command::NaturalQuestions(args) => {
            run_conversion(DatasetKind::NaturalQuestions, &args.output_file, || {
                convert_nq(&args.nq_dir)
            })
        }
        Command::Quac(args) => run_conversion(DatasetKind::Quac, &args.output_file, || {
            convert_quac(&args.quac_file)
        }),
        Command::TriviaQa(args) => {
            let options = args.options(app_config.triviaqa_max_words)?;
            info!(
                max_words = options.max_words,
                data_dir = %options.data_dir.display(),
                "Using TriviaQA evidence settings"
            );
            run_conversion(DatasetKind::TriviaQa, &args.output_file, || {
                convert_triviaqa(&args.triviaqa_file, &options)
            })
        }
        Command::Check(args) => run_check(&args.squad_file),
    }
}

fn run_conversion(
    dataset: DatasetKind,
    output_file: &Path,
    convert: impl FnOnce() -> anyhow::Result<Conversion>,
) -> anyhow::Result<()> {
    info!(dataset = dataset.id(), "Starting dataset conversion");
    let conversion = convert().with_context(|| format!("converting {} dataset", dataset.label()))?;

    let stats = conversion.stats();
    info!(
        dataset = dataset.id(),
        records = stats.records,
        questions = stats.questions,
        answerable = stats.answerable,
        impossible = stats.impossible,
        dropped = stats.dropped,
        "Dataset converted"
    );

    write_squad(&conversion.dataset, output_file)
        .with_context(|| format!("writing converted dataset to {}", output_file.display()))?;
    println!(
        "[{}] {stats} → {}",
        dataset.label(),
        output_file.display()
    );
    Ok(())
}

fn run_check(squad_file: &Path) -> anyhow::Result<()> {
    let dataset = read_squad(squad_file)?;
    let violations = check_dataset(&dataset);
    for violation in &violations {
        error!(%violation, "Invariant violated");
    }

    if !violations.is_empty() {
        bail!(
            "{} invariant violations in {}",
            violations.len(),
            squad_file.display()
        );
    }
    println!(
        "{} questions in {} are consistent",
        dataset.question_count(),
        squad_file.display()
    );
    Ok(())
}
