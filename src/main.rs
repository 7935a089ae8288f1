// Cadenza CLI entry point

fn main() {
    if let Err(error) = cadenza_lib::run() {
        eprintln!("Error: {}", error.message());
        std::process::exit(1);
    }
}
