use crate::infra::file_poll_service;
use borda_poll::config::AppConfig;
use borda_poll::error::AppError;
use borda_poll::poll::ResultsView;
use clap::Args;
use std::io::Write;
use std::path::PathBuf;

#[derive(Args, Debug, Default)]
pub(crate) struct ResultsArgs {
    /// Ballot log to read (defaults to POLL_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ExportArgs {
    /// Ballot log to read (defaults to POLL_DATA_FILE)
    #[arg(long)]
    pub(crate) data_file: Option<PathBuf>,
    /// Destination file; the CSV goes to stdout when omitted
    #[arg(long)]
    pub(crate) output: Option<PathBuf>,
}

fn load_config(data_file: Option<PathBuf>) -> Result<AppConfig, AppError> {
    let mut config = AppConfig::load()?;
    if let Some(path) = data_file {
        config.storage.data_file = path;
    }
    Ok(config)
}

pub(crate) fn run_results(args: ResultsArgs) -> Result<(), AppError> {
    let config = load_config(args.data_file)?;
    let service = file_poll_service(&config);
    let results = service.results()?;

    print!("{}", render_results(&results));
    Ok(())
}

pub(crate) fn run_export(args: ExportArgs) -> Result<(), AppError> {
    let config = load_config(args.data_file)?;
    let service = file_poll_service(&config);
    let csv = service.export()?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &csv)?;
            eprintln!("Wrote {} bytes to {}", csv.len(), path.display());
        }
        None => std::io::stdout().write_all(&csv)?,
    }
    Ok(())
}

fn ordinal(position: usize) -> String {
    let suffix = match (position % 10, position % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{position}{suffix}")
}

pub(crate) fn render_results(results: &ResultsView) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Borda poll results: {} vote(s), up to {} points per ballot\n",
        results.total_votes, results.sum_weights
    ));

    match &results.winner {
        Some(winner) => out.push_str(&format!("Winner: {winner}\n")),
        None => {
            out.push_str("Winner: none (no votes recorded)\n");
            return out;
        }
    }

    out.push_str("\nLeaderboard\n");
    for row in &results.ranking {
        let podium = results
            .podium_counts
            .iter()
            .enumerate()
            .map(|(pos, tier)| {
                let count = tier.get(&row.name).copied().unwrap_or_default();
                format!("{} {count}", ordinal(pos + 1))
            })
            .collect::<Vec<_>>()
            .join(", ");
        out.push_str(&format!(
            "{:>2}. {} - {} pts ({podium})\n",
            row.position, row.name, row.score
        ));
    }
    out
}
