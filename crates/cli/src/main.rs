use std::process;

use clap::Parser;
use schedcop_cli::{
    load_schedule, render_analysis, render_experiment, AnalyzeArgs, App, Command, Error,
    ExperimentArgs,
};
use schedcop_core::{Analysis, Analyzer, AnalyzerOptions};
use schedcop_testgen::{Experiment, ExperimentParams};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let app = App::parse();
    let result = match &app.command {
        Command::Analyze(args) => analyze(args),
        Command::Experiment(args) => experiment(args),
        Command::Schema => schema(),
    };

    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1);
    }
}

fn analyze(args: &AnalyzeArgs) -> Result<(), Error> {
    let schedule = load_schedule(&args.file, args.strict)?;
    let analysis = Analyzer::new(args.options()).analyze(&schedule);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&analysis)?);
    } else {
        print!("{}", render_analysis(&analysis));
    }
    Ok(())
}

fn experiment(args: &ExperimentArgs) -> Result<(), Error> {
    let schedule = load_schedule(&args.file, false)?;
    let participants: Vec<_> = schedule.participants().into_iter().collect();
    let template = schedule.split_by_transaction();

    let params = ExperimentParams {
        source: args.file.display().to_string(),
        trials: args.trials,
        bounds: args.bounds,
        seed: args.seed,
        parallel: args.parallel,
        options: AnalyzerOptions::default(),
    };
    let experiment = Experiment::run(&template, params);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&experiment)?);
    } else {
        print!("{}", render_experiment(&experiment, &participants));
    }
    Ok(())
}

fn schema() -> Result<(), Error> {
    let schema = schemars::schema_for!(Analysis);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
