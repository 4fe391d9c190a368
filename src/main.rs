use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use selenium_migrate::runner::list_converted;
use selenium_migrate::{run_all, MigrationConfig, MigrationDriver, TsNodeRunner};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    Command::new("selenium-migrate")
        .about("Converts Selenium Java page objects and tests into Playwright TypeScript")
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .global(true)
                .help("JSON configuration file"),
        )
        .subcommand(
            Command::new("convert")
                .about("Convert page objects and tests")
                .arg(Arg::new("input").long("input").value_name("DIR").help("Project root to read"))
                .arg(Arg::new("output").long("output").value_name("DIR").help("Directory to write into"))
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print the manifest as JSON"),
                ),
        )
        .subcommand(Command::new("list").about("List converted pages and tests"))
        .subcommand(Command::new("run-tests").about("Run every converted test script"))
}

fn load_config(matches: &ArgMatches) -> anyhow::Result<MigrationConfig> {
    match matches.get_one::<String>("config") {
        Some(path) => MigrationConfig::from_file(&PathBuf::from(path))
            .with_context(|| format!("loading configuration from {}", path)),
        None => Ok(MigrationConfig::default()),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // logs go to stderr; stdout carries the report or manifest JSON
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let mut command = cli();
    let matches = command.clone().get_matches();
    let mut config = load_config(&matches)?;

    match matches.subcommand() {
        Some(("convert", sub)) => {
            if let Some(input) = sub.get_one::<String>("input") {
                config.paths.input_root = PathBuf::from(input);
            }
            if let Some(output) = sub.get_one::<String>("output") {
                config.paths.output_root = PathBuf::from(output);
            }
            let manifest = MigrationDriver::new(config).run();
            if sub.get_flag("json") {
                println!("{}", manifest.to_json()?);
            } else {
                print!("{}", manifest.report());
            }
            if manifest.has_failures() {
                std::process::exit(1);
            }
        }
        Some(("list", _)) => {
            let listing = list_converted(&config.page_output_dir(), &config.test_output_dir())?;
            println!("Pages:");
            for page in &listing.pages {
                println!("  - {}", page);
            }
            println!("Tests:");
            for test in &listing.tests {
                println!("  - {}", test);
            }
        }
        Some(("run-tests", _)) => {
            let runner = TsNodeRunner::new(config.runner.clone());
            let summary = run_all(&runner, &config.test_output_dir()).await?;
            println!("Passed: {}", summary.passed);
            println!("Failed: {}", summary.failed);
            println!("Total: {}", summary.total);
            if !summary.all_passed() {
                std::process::exit(1);
            }
        }
        _ => command.print_help()?,
    }

    Ok(())
}
