mod commands;
mod terminal;

use commands::CommandLine;
use terminal::{logging, print};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CommandLine::parse_args();

    logging::init_logging(cli.verbose);
    print::banner(cli.no_banner, cli.command.is_quiet());

    commands::run::run(cli.command).await
}
