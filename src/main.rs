use std::process;

fn main() {
    if let Err(e) = taskfile::cli::run() {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
