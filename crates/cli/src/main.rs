use std::process::ExitCode;

fn main() -> ExitCode {
    stayline_cli::run()
}
