use std::process::ExitCode;

fn main() -> ExitCode {
    glimmer_cli::run()
}
