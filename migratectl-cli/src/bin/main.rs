use std::process::ExitCode;

fn main() -> ExitCode {
    match migratectl_cli::main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
