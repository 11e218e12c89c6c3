use std::process::ExitCode;

use clap::CommandFactory;
use tracing::error;

use cloudstrap::cli::{self, Commands};

fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{:#}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(log_level) = args.command.log_level()
        && let Err(e) = cloudstrap::init_logging(log_level)
    {
        eprintln!("{:#}", e);
        return ExitCode::FAILURE;
    }

    let result = match &args.command {
        Commands::Bootstrap(opts) => cloudstrap::run_bootstrap(opts).map(|_| ()),
        Commands::Validate(opts) => cloudstrap::run_validate(opts),
        Commands::Backends(opts) => cloudstrap::run_backends(opts).map(|names| {
            for name in names {
                println!("{}", name);
            }
        }),
        Commands::Completions(opts) => {
            let mut cmd = cli::Cli::command();
            clap_complete::generate(
                opts.shell,
                &mut cmd,
                env!("CARGO_PKG_NAME"),
                &mut std::io::stdout(),
            );
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
