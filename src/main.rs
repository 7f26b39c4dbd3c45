use clap::{arg, command, value_parser, Command};
use colored::*;
use lbm_obstacle as lbm;
use lbm::d2q9::{RunReport, Termination};
use rayon::ThreadPoolBuilder;
use std::process;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = command!()
        .arg(
            arg!(
                -n --number_of_threads <NUMBER_OF_THREADS> "Sets the number of threads"
            )
            .required(false)
            .value_parser(value_parser!(usize)),
        )
        .subcommand(
            Command::new("run")
                .about("Runs the simulation")
                .arg(
                    arg!(
                        -b --benchmark "Runs the benchmark"
                    )
                    .required(false),
                ),
        )
        .subcommand(
            Command::new("post")
                .about("Runs the post-processing: writes the vtk files")
        )
        .get_matches();

    if let Some(&num_threads) = matches.get_one::<usize>("number_of_threads") {
        if let Err(e) = ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
        {
            eprintln!("Error while building the thread pool: {e}.");
            process::exit(1);
        }
    }

    match matches.subcommand() {
        Some(("run", sub_matches)) => {
            let result = match sub_matches.get_flag("benchmark") {
                false => lbm::d2q9::run(),
                true => lbm::d2q9::run_benchmark(),
            };
            match result {
                Ok(report) => print_report(&report),
                Err(e) => {
                    eprintln!("{} {e}.", "Error:".red().bold());
                    process::exit(1);
                }
            }
        }
        Some(("post", _)) => {
            if let Err(e) = lbm::d2q9::post::vtk::run_vtk_post_processing() {
                eprintln!("{} {e}.", "Error:".red().bold());
                process::exit(1);
            }
        }
        _ => {}
    }
}

fn print_report(report: &RunReport) {
    match &report.termination {
        Termination::Completed => {
            println!(
                "\n{} {} steps.",
                "Simulation completed:".green().bold(),
                report.steps_completed
            );
        }
        Termination::Cancelled { step } => {
            println!("\n{} at step {step}.", "Simulation stopped".yellow().bold());
        }
        Termination::Diverged { step, reason } => {
            eprintln!(
                "\n{} at step {step}: {reason}. Try a larger tau.",
                "Numerical divergence".red().bold()
            );
            if let Some(snapshot) = &report.last_snapshot {
                eprintln!("Last valid snapshot: step {}.", snapshot.time_step);
            }
            process::exit(2);
        }
    }
}
