use std::process::ExitCode;

fn main() -> ExitCode {
    changereq_cli::run()
}
