use std::process::ExitCode;

fn main() -> ExitCode {
    labquote_cli::run()
}
