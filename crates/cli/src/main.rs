use std::process::ExitCode;

fn main() -> ExitCode {
    quartermaster_cli::run()
}
