fn main() {
    if let Err(err) = hubkit::cli::run() {
        hubkit::ui::output::error(format!("{:#}", err));
        std::process::exit(1);
    }
}
