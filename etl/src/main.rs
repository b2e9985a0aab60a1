use clap::{Arg, Command};
use common::config::Settings;
use common::telemetry::init_tracing;
use std::process;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("Renewable Energy ETL")
        .version("1.0")
        .about("Normalizes raw renewable-energy extracts into the processed lake")
        .subcommand(
            Command::new("transform")
                .about("Rebuild the processed lake from the raw files")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("transform", transform_matches)) => {
            let config_path = transform_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/lakehouse.toml");

            let settings = Settings::new(config_path)?;
            init_tracing(&settings.logging);

            let summary = etl::run_transform(&settings);
            println!("{}", serde_json::to_string_pretty(&summary)?);

            if summary.has_failures() {
                process::exit(1);
            }
        }
        _ => {
            eprintln!("Please specify a valid subcommand");
            process::exit(1);
        }
    }

    Ok(())
}
