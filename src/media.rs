//! Input classification by declared media type.
//!
//! We look at the file extension only, never the contents. A file that *claims* to be an audio
//! container is handed to the transcription backend as-is; everything else goes through the
//! extractor first.

use std::path::Path;

/// Extension → MIME type table for the containers we recognize.
static MEDIA_TYPES: &[(&str, &str)] = &[
    // audio
    ("aac", "audio/aac"),
    ("aif", "audio/aiff"),
    ("aiff", "audio/aiff"),
    ("flac", "audio/flac"),
    ("m4a", "audio/mp4"),
    ("mp3", "audio/mpeg"),
    ("oga", "audio/ogg"),
    ("ogg", "audio/ogg"),
    ("opus", "audio/opus"),
    ("wav", "audio/wav"),
    ("wave", "audio/wav"),
    ("weba", "audio/webm"),
    // video
    ("3gp", "video/3gpp"),
    ("avi", "video/x-msvideo"),
    ("flv", "video/x-flv"),
    ("m4v", "video/x-m4v"),
    ("mkv", "video/x-matroska"),
    ("mov", "video/quicktime"),
    ("mp4", "video/mp4"),
    ("mpeg", "video/mpeg"),
    ("mpg", "video/mpeg"),
    ("ts", "video/mp2t"),
    ("webm", "video/webm"),
    ("wmv", "video/x-ms-wmv"),
];

/// Return the declared media type of `path`, if its extension is one we know.
pub fn media_type(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    MEDIA_TYPES
        .iter()
        .find(|(known, _)| *known == ext)
        .map(|(_, mime)| *mime)
}

/// Whether `path` declares itself as a playable audio container.
pub fn is_audio_container(path: &Path) -> bool {
    media_type(path).is_some_and(|mime| mime.starts_with("audio/"))
}
