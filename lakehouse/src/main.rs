use clap::{Arg, ArgAction, Command};
use common::config::Settings;
use common::telemetry::init_tracing;
use std::process;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let matches = Command::new("Renewable Energy Lakehouse")
        .version("1.0")
        .about("Serves filtered reads over the processed renewable-energy lake")
        .subcommand(
            Command::new("serve")
                .about("Run the read API")
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Sets a custom config file"),
                )
                .arg(
                    Arg::new("rebuild")
                        .long("rebuild")
                        .action(ArgAction::SetTrue)
                        .help("Rebuild the processed lake from raw files before serving"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("serve", serve_matches)) => {
            let config_path = serve_matches
                .get_one::<String>("config")
                .map(|s| s.as_str())
                .unwrap_or("config/lakehouse.toml");

            let settings = Settings::new(config_path)?;
            init_tracing(&settings.logging);

            lakehouse::run_server(&settings, serve_matches.get_flag("rebuild")).await?;
        }
        _ => {
            eprintln!("No subcommand specified. Use --help for usage information.");
            process::exit(1);
        }
    }

    Ok(())
}
