mod cli;
mod commands;
mod config;
mod params;
mod paths;
mod pipeline;
mod resource;
mod scripts;
mod ui;

use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    let result = match cli.command {
        Command::Package {
            config,
            no_validate,
            output,
        } => commands::package::run(&ctx, config, no_validate, output),
        Command::Render {
            template,
            config,
            show_parameters,
        } => commands::render::run(&ctx, &template, config, show_parameters),
        Command::Validate { config } => commands::validate::run(&ctx, config),
        Command::Verify { deb, public_key } => commands::verify::run(&ctx, &deb, &public_key),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "dwpackage", &mut io::stdout());
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            report_error(&err);
            ExitCode::FAILURE
        }
    }
}

/// Print the error, its causes, and advice for the first cause we know.
fn report_error(err: &anyhow::Error) {
    ui::error(&err.to_string());
    for cause in err.chain().skip(1) {
        eprintln!("  caused by: {cause}");
    }
    if let Some(advice) = advice(err) {
        ui::hint(advice);
    }
}

fn advice(err: &anyhow::Error) -> Option<&'static str> {
    err.chain().find_map(|cause| {
        if let Some(e) = cause.downcast_ref::<resource::ExtractionError>() {
            match e {
                resource::ExtractionError::Render(inner) => Some(inner.category().advice()),
                _ => Some(e.category().advice()),
            }
        } else if let Some(e) = cause.downcast_ref::<templater::Error>() {
            Some(e.category().advice())
        } else if let Some(e) = cause.downcast_ref::<appcheck::Error>() {
            Some(e.category().advice())
        } else {
            cause
                .downcast_ref::<debkit::Error>()
                .map(|e| e.category().advice())
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;

    #[test]
    fn test_advice_found_through_context() {
        let err: anyhow::Result<()> = Err(debkit::Error::Unsigned {
            path: "svc.deb".into(),
        })
        .context("Failed to verify");
        let err = err.unwrap_err();
        assert_eq!(
            advice(&err),
            Some(debkit::ErrorCategory::Signing.advice())
        );
    }

    #[test]
    fn test_no_advice_for_plain_errors() {
        let err = anyhow::anyhow!("something else");
        assert_eq!(advice(&err), None);
    }
}
