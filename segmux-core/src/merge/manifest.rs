//! Concat demuxer manifest generation.

/// Builds the text manifest consumed by ffmpeg's concat demuxer: one
/// `file '<name>'` line per artifact, in the given order. Embedded single
/// quotes are escaped with the `'\''` idiom so quoted names survive the
/// demuxer's parser.
pub fn build_concat_manifest<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|name| format!("file '{}'", name.as_ref().replace('\'', "'\\''")))
        .collect::<Vec<_>>()
        .join("\n")
}
