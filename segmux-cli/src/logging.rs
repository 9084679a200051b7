// segmux-cli/src/logging.rs
//
// Logging setup. The application uses the standard `log` facade with
// env_logger as the backend; RUST_LOG overrides the level chosen here.
//
// - default: warnings and errors
// - --verbose: debug, which includes raw engine log lines under the
//   "segmux::ffmpeg" target

pub fn init(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}
