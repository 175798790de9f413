use clap::{Arg, ArgAction, Command};
use colored::*;
use std::process::ExitCode;

use statusboard::commands;
use statusboard::config::DEFAULT_CONFIG_FILE;

fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("Path to the configuration file")
        .default_value(DEFAULT_CONFIG_FILE)
}

fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .help("Log progress to stderr")
        .action(ArgAction::SetTrue)
}

fn cli() -> Command {
    Command::new("statusboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Static status dashboard generator")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("generate")
                .about("Run all checks and write the dashboard")
                .arg(config_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Output file")
                        .default_value("index.html"),
                )
                .arg(
                    Arg::new("dry-run")
                        .long("dry-run")
                        .help("Show what would be checked without executing anything")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Write the evaluated results as JSON instead of HTML")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("concurrency")
                        .long("concurrency")
                        .value_name("N")
                        .help("Max parallel checks (0 = auto)")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    Arg::new("generate-first")
                        .long("generate-first")
                        .help("Run each tile's generate command before its slot checks")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    Arg::new("deadline")
                        .long("deadline")
                        .value_name("DURATION")
                        .help("Cancel checks still running after this long (e.g. 2m)"),
                )
                .arg(verbose_arg()),
        )
        .subcommand(
            Command::new("validate")
                .about("Parse and validate the configuration file")
                .arg(config_arg())
                .arg(verbose_arg()),
        )
        .subcommand(Command::new("version").about("Print the version"))
}

fn main() -> ExitCode {
    let matches = cli().get_matches();

    let verbose = matches
        .subcommand()
        .and_then(|(_, sub)| sub.try_get_one::<bool>("verbose").ok().flatten().copied())
        .unwrap_or(false);
    statusboard::init_logging(verbose);

    let result = match matches.subcommand() {
        Some(("generate", sub_matches)) => commands::generate(sub_matches),
        Some(("validate", sub_matches)) => commands::validate(sub_matches),
        Some(("version", _)) => commands::version(),
        _ => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}
