use super::prelude::*;
use crate::config::EnumerationConfig;
use crate::enumeration::total;
use crate::inputs::load_inputs;

pub const NAME: &str = "count";

pub fn command() -> Command {
    Command::new(NAME)
        .about("Validate the inputs and print the number of combinations")
        .arg(
            Arg::new("config")
                .required(true)
                .long("config")
                .short('c')
                .num_args(1),
        )
}

pub fn action(matches: &ArgMatches) -> eyre::Result<()> {
    let config_path = matches
        .get_one::<String>("config")
        .ok_or(eyre::eyre!("Failed to extract config path"))?;

    let config = EnumerationConfig::from_path(config_path)?;
    let (_core, rgroups) = load_inputs(&config)?;

    let radices = rgroups
        .iter()
        .map(|g| g.fragments.len())
        .collect::<Vec<_>>();
    for group in &rgroups {
        println!("{}: {} fragments", group.label, group.fragments.len());
    }
    println!("combinations: {}", total(&radices)?);

    Ok(())
}
