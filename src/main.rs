use colored::Colorize;
use native_export::cli::CommandLineInterface;

fn main() {
    let command_line_interface = CommandLineInterface::load();
    command_line_interface.init_tracing();
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
