use clap::Parser;
use fcompile::{cli::Cli, default_cache_path, manifest, FcompileError};
use tracing_subscriber::EnvFilter;
use yansi::Paint;

#[tokio::main]
async fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let jobs = match cli.jobs() {
        Ok(jobs) => jobs,
        Err(err) => {
            eprintln!("{} {err}", Paint::red("error:"));
            return std::process::ExitCode::FAILURE;
        }
    };

    let tasks = match manifest::read_tasks(std::io::stdin()) {
        Ok(tasks) => tasks,
        Err(err) => {
            eprintln!("{} failed to read task manifest: {err}", Paint::red("error:"));
            return std::process::ExitCode::FAILURE;
        }
    };

    match fcompile::build(tasks, jobs, cli.dry, default_cache_path()).await {
        Ok(_) => std::process::ExitCode::SUCCESS,
        Err(FcompileError::CompilationError { unit, retcode }) => {
            eprintln!("{} compilation of {unit} returned {retcode}.", Paint::red("error:"));
            std::process::ExitCode::FAILURE
        }
        Err(FcompileError::Interrupted) => std::process::ExitCode::FAILURE,
        Err(err) => {
            eprintln!("{} {err}", Paint::red("error:"));
            std::process::ExitCode::FAILURE
        }
    }
}
