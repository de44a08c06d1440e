use adaptive_steg::cli::{CommandLineHandler, CommandLineInterface};
use clap::Parser;

fn main() -> anyhow::Result<()> {
    let command_line_interface = CommandLineInterface::parse();
    command_line_interface.init_logging();

    let cli_handler = CommandLineHandler::new(command_line_interface.config.as_deref())?;
    cli_handler.process_command(command_line_interface)?;

    Ok(())
}
