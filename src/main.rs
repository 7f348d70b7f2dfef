fn main() {
    if let Err(e) = kombot::cli::main() {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
