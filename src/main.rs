use clap::Parser;
use portmix::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
