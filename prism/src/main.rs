use clap::{Parser, Subcommand};
use prism_core::cli::{ServeArgs, SetupCmd, serve, setup};
use prism_core::logging::init_logging;

#[derive(Parser, Debug)]
#[command(
    name = "prism",
    version,
    about = "Prism: static asset server with precompressed variants"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the assets described by a setup document
    Serve(ServeArgs),

    #[command(flatten)]
    Setup(SetupCmd),
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Serve(args) => {
            init_logging();
            serve::run(args)
        }
        Command::Setup(cmd) => setup::run(cmd),
    };

    if let Err(e) = result {
        eprintln!("{e:#}");
        std::process::exit(1);
    }
}
