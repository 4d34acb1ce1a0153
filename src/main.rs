use rgenum::command_line::{count, enumerate, prelude::*};
use tracing_subscriber::EnvFilter;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let app = Command::new("rgenum")
        .about("R-group enumeration on a molecular core")
        .subcommand_required(true)
        .subcommand(enumerate::command())
        .subcommand(count::command());
    let matches = app.get_matches();

    match matches.subcommand() {
        Some((enumerate::NAME, sub_matches)) => enumerate::action(sub_matches),
        Some((count::NAME, sub_matches)) => count::action(sub_matches),
        Some((unknown, _)) => Err(eyre::eyre!("Unknown command: {}", unknown)),
        None => Err(eyre::eyre!("No command given")),
    }
}
