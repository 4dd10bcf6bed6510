fn main() {
    if let Err(error) = unenroll_cli::run() {
        eprintln!("Error: {error:#}");
        std::process::exit(1);
    }
}
