fn main() {
    if let Err(err) = catalog_sheets::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
