use clap::Parser;
use search_agg::{AggError, CliArgs, LoggingConfig, init_logging, run_command};
use std::process::ExitCode;

fn main() -> anyhow::Result<ExitCode> {
    let cli = CliArgs::parse();
    let _guard = init_logging(&LoggingConfig::from_env(cli.verbose))?;

    match run_command(&cli) {
        Ok(output) => {
            println!("{output}");
            Ok(ExitCode::SUCCESS)
        }
        Err(error) => {
            match error.downcast_ref::<AggError>() {
                Some(agg_error) => {
                    let code = agg_error.code();
                    tracing::error!(
                        error.code = code.code(),
                        error.category = code.category(),
                        "{error:#}"
                    );
                }
                None => tracing::error!("{error:#}"),
            }
            Ok(ExitCode::FAILURE)
        }
    }
}
