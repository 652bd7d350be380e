use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use petrisim::{CLIArguments, inspect_main, simulate_main};

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    let args = CLIArguments::parse();

    match args {
        CLIArguments::Simulate(args) => simulate_main(args),
        CLIArguments::Inspect(args) => inspect_main(args),
    }
}
