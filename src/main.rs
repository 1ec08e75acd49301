fn main() {
    if let Err(err) = costar_layout::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
