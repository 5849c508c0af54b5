fn main() {
    #[cfg(not(target_arch = "wasm32"))]
    if let Err(error) = studio_core::run() {
        log::error!("{error}");
        std::process::exit(1);
    }
}
