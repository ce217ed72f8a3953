mod commands;
mod handlers;
mod output;

use clap::Parser;
use commands::Cli;

fn main() {
    let cli = Cli::parse();
    output::init_logging(cli.verbose);
    if let Err(err) = handlers::handle_command(cli.command) {
        output::print_error(&err.to_string());
        std::process::exit(1);
    }
}
