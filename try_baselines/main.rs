use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};
use try_baselines::*;

use pricecast::core::io::file_stem;
use pricecast::{SeriesStore, output_path};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "try_baselines=info,pricecast=info".into()),
        )
        .init();

    // Load configuration
    let cli = Config::parse();
    let config = match &cli.config {
        Some(path) => {
            let mut config = Config::from_file(path)?;
            if config.data_file.is_empty() {
                config.data_file = cli.data_file.clone();
            }
            config
        }
        None => cli,
    };
    config.validate()?;

    // Load and adjust the series
    let store = SeriesStore::load(&config.data_file, config.adjustment()?)?;
    let series = store.series();
    info!(
        n_obs = series.len(),
        first = ?series.first_date(),
        last = ?series.last_date(),
        "loaded series"
    );

    let predictors = build_predictors(&config);
    let result = run_experiment(series, &config.plan(), &predictors);

    println!("\n{}", "=".repeat(75));
    println!("Baseline forecast comparison");
    println!("{}", "=".repeat(75));
    print!("{}", result.table);

    let log_path = write_results(&config.output_path, &config, &result)?;
    let summary_path = write_summary(&config.output_path, &config, &result)?;
    info!(log = %log_path.display(), summary = %summary_path.display(), "wrote results");

    if config.plot {
        write_plots(&config, &result)?;
    }

    if let Some(best) = result.table.best() {
        println!("\nBest method: {}", best.name);
    }
    if result.table.n_failed() > 0 {
        warn!(failed = result.table.n_failed(), "some methods did not produce a score");
    }

    Ok(())
}

fn write_plots(config: &Config, result: &ExperimentResult) -> Result<()> {
    let Some(split) = &result.split else {
        return Ok(());
    };

    for report in &result.reports {
        let Ok(run) = &report.outcome else {
            continue;
        };
        let name = format!("{}.png", file_stem(report.method.name()));
        let path = output_path(&config.output_path, &name)?;
        plot_prediction(&split.history, &split.actual, &run.predictions, &path)
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        if let Some(history) = run.model.loss_history() {
            let path = output_path(&config.output_path, "nn_loss.png")?;
            plot_loss_history(history, &path).map_err(|e| anyhow::anyhow!("{}", e))?;
        }
    }

    info!(dir = %config.output_path, "wrote plots");
    Ok(())
}
