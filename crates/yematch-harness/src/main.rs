//! `yematch` command line

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgGroup, ArgMatches, Command};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use yematch_connector::{RemoteTransport, SshConnector};
use yematch_harness::config::LoggingConfig;
use yematch_harness::prelude::*;
use yematch_harness::{logging, NewSystemApi, NewSystemClient};

fn cli() -> Command {
    Command::new("yematch")
        .version(yematch_harness::VERSION)
        .about("Year-end parity runs between the Legacy and New payroll systems")
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .global(true)
                .default_value("yematch.toml")
                .value_parser(value_parser!(PathBuf))
                .help("Harness configuration file"),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("run")
                .about("Run activities in order, stopping at the first error")
                .arg(
                    Arg::new("names")
                        .value_name("NAME")
                        .num_args(1..)
                        .action(ArgAction::Append)
                        .help("Catalog names, e.g. P01 R17 ParityPAY426N-03"),
                )
                .arg(
                    Arg::new("all")
                        .long("all")
                        .action(ArgAction::SetTrue)
                        .help("Run every parallel step P00..P29"),
                )
                .group(ArgGroup::new("selection").args(["names", "all"]).required(true)),
        )
        .subcommand(Command::new("list").about("Print every catalog name"))
        .subcommand(
            Command::new("parse")
                .about("Parse a Legacy report and print its totals")
                .arg(Arg::new("report").value_name("REPORT-ID").required(true))
                .arg(
                    Arg::new("file")
                        .value_name("FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
        .subcommand(
            Command::new("diff")
                .about("Compare a Legacy report with New-system JSON")
                .arg(Arg::new("report").value_name("REPORT-ID").required(true))
                .arg(
                    Arg::new("legacy")
                        .value_name("LEGACY-FILE")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                )
                .arg(
                    Arg::new("new")
                        .value_name("NEW-JSON")
                        .required(true)
                        .value_parser(value_parser!(PathBuf)),
                ),
        )
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    match dispatch(&matches).await {
        Ok(passed) => std::process::exit(if passed { 0 } else { 1 }),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(2);
        }
    }
}

async fn dispatch(matches: &ArgMatches) -> anyhow::Result<bool> {
    let config_path = arg::<PathBuf>(matches, "config")?;
    match matches.subcommand() {
        Some(("run", args)) => {
            let config = load(config_path)?;
            let (catalog, transport, api) = build_catalog(&config)?;
            let activities = if args.get_flag("all") {
                catalog.parallel()
            } else {
                let names: Vec<&String> = args.get_many::<String>("names").into_iter().flatten().collect();
                Runner::specify(&catalog, &names)?
            };

            let runner = Runner::new(&config.data_directory).with_new_system(api);
            let ctrl_c = runner.stop_on_ctrl_c();
            println!("Starting run with {} activities. Press Ctrl-C to stop after the current one.", activities.len());
            let report = runner.run(&activities).await;
            ctrl_c.abort();
            transport.close().await;
            let report = report?;

            println!("{}", report.generate_text());
            Ok(report.passed())
        }
        Some(("list", _)) => {
            let config = load(config_path)?;
            let (catalog, _, _) = build_catalog(&config)?;
            for name in catalog.names() {
                println!("{name}");
            }
            Ok(true)
        }
        Some(("parse", args)) => {
            logging::init(LoggingConfig::default())?;
            let extractor = yematch_reports::default_extractors().require(arg::<String>(args, "report")?)?;
            let text = read(arg::<PathBuf>(args, "file")?)?;
            let summary = extractor.check(&text)?;
            println!("{}", summary.generate_text());
            Ok(true)
        }
        Some(("diff", args)) => {
            logging::init(LoggingConfig::default())?;
            let extractor = yematch_reports::default_extractors().require(arg::<String>(args, "report")?)?;
            let legacy = read(arg::<PathBuf>(args, "legacy")?)?;
            let new = read(arg::<PathBuf>(args, "new")?)?;
            let comparison = extractor.compare_json(&legacy, &new)?;
            println!("{}", comparison.generate_text());
            Ok(comparison.passed())
        }
        _ => anyhow::bail!("no subcommand given"),
    }
}

fn arg<'a, T: Clone + Send + Sync + 'static>(matches: &'a ArgMatches, id: &str) -> anyhow::Result<&'a T> {
    matches
        .get_one::<T>(id)
        .with_context(|| format!("missing argument {id}"))
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))
}

fn load(path: &Path) -> anyhow::Result<HarnessConfig> {
    let config = HarnessConfig::load(path).with_context(|| format!("loading {}", path.display()))?;
    logging::init(config.logging)?;
    Ok(config)
}

fn build_catalog(
    config: &HarnessConfig,
) -> anyhow::Result<(Catalog, Arc<dyn RemoteTransport>, Arc<dyn NewSystemApi>)> {
    let transport: Arc<dyn RemoteTransport> = Arc::new(SshConnector::new(config.remote.clone())?);
    let api: Arc<dyn NewSystemApi> = Arc::new(NewSystemClient::new(&config.new_system)?);
    let extractors = Arc::new(yematch_reports::default_extractors());
    let context = CatalogContext::new(config.clone(), Arc::clone(&transport), Arc::clone(&api), extractors);
    Ok((Catalog::build(&context)?, transport, api))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_is_well_formed() {
        cli().debug_assert();
    }

    #[test]
    fn run_needs_names_or_all() {
        assert!(cli().try_get_matches_from(["yematch", "run"]).is_err());
        assert!(cli()
            .try_get_matches_from(["yematch", "run", "--all", "P01"])
            .is_err());

        let matches = cli()
            .try_get_matches_from(["yematch", "--config", "x.toml", "run", "P01", "R17"])
            .unwrap();
        let (_, run) = matches.subcommand().unwrap();
        let names: Vec<&String> = run.get_many::<String>("names").unwrap().collect();
        assert_eq!(names, ["P01", "R17"]);
        assert_eq!(matches.get_one::<PathBuf>("config").unwrap(), Path::new("x.toml"));
    }
}
