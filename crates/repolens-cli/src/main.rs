fn main() {
    if let Err(error) = repolens_cli::run() {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}
