use super::prelude::*;
use crate::config::EnumerationConfig;
use crate::enumeration::run;

pub const NAME: &str = "enumerate";

pub fn command() -> Command {
    Command::new(NAME)
        .about("Enumerate R-group combinations on a core and write the unique products")
        .arg(
            Arg::new("config")
                .required(true)
                .long("config")
                .short('c')
                .num_args(1),
        )
        .arg(
            Arg::new("output")
                .required(false)
                .long("output")
                .short('o')
                .num_args(1),
        )
        .arg(
            Arg::new("limit")
                .required(false)
                .long("limit")
                .short('l')
                .num_args(1),
        )
        .arg(
            Arg::new("seed")
                .required(false)
                .long("seed")
                .short('s')
                .num_args(1),
        )
        .arg(
            Arg::new("random_order")
                .required(false)
                .long("random-order")
                .action(ArgAction::SetTrue),
        )
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .ok_or(eyre::eyre!("Failed to extract config path"))?;
    let output = matches.get_one::<String>("output");
    let limit = matches.get_one::<String>("limit");
    let seed = matches.get_one::<String>("seed");

    let mut config = EnumerationConfig::from_path(config_path)?;
    if let Some(output) = output {
        config.output = output.into();
    }
    if let Some(limit) = limit {
        config.limit = Some(limit.parse::<usize>()?);
    }
    if let Some(seed) = seed {
        config.seed = Some(seed.parse::<u64>()?);
    }
    if matches.get_flag("random_order") {
        config.random_order = true;
    }

    log::info!(
        "config={}, output={:?}, format={}, limit={:?}",
        config_path,
        config.output,
        config.output_format,
        config.limit
    );

    let stats = run(&config)?;
    println!("{}", serde_json::to_string_pretty(&stats)?);

    Ok(())
}
