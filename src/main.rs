use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(err) = detprep::run() {
        eprintln!("Error: {err}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
