fn main() {
    if let Err(err) = order_insights::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
