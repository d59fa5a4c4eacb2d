use std::process::ExitCode;

fn main() -> ExitCode {
    reloom_cli::run()
}
