fn main() {
    if let Err(err) = camerapath_lib::run() {
        eprintln!("camerapath: {err}");
        std::process::exit(1);
    }
}
