//! Audio file filtering.
//!
//! A file counts as audio when its MIME type is in the allow-list OR its
//! name carries an allow-listed extension; either condition alone is
//! sufficient. Trashed files never count. The same lists drive both the
//! server-side listing query and the local predicate.

use mellow_bridge::storage::RemoteFile;

/// MIME types accepted as audio.
pub const AUDIO_MIME_TYPES: &[&str] = &[
    "audio/mpeg",   // MP3
    "audio/flac",   // FLAC
    "audio/wav",    // WAV
    "audio/x-wav",  // WAV alternative
    "audio/aac",    // AAC
    "audio/mp4",    // M4A
    "audio/ogg",    // OGG
    "audio/vorbis", // OGG Vorbis
];

/// File extensions accepted as audio.
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "aac", "m4a", "ogg", "oga"];

/// Pure audio predicate over a file descriptor.
pub fn is_audio_file(file: &RemoteFile) -> bool {
    if file.trashed || file.is_folder {
        return false;
    }

    let mime_matches = file
        .mime_type
        .as_deref()
        .is_some_and(|mime| AUDIO_MIME_TYPES.contains(&mime));

    let name = file.name.to_lowercase();
    let extension_matches = AUDIO_EXTENSIONS
        .iter()
        .any(|ext| name.ends_with(&format!(".{}", ext)));

    mime_matches || extension_matches
}

/// Drive `q` expression selecting non-trashed audio files.
pub(crate) fn audio_query() -> String {
    let mime_clauses: Vec<String> = AUDIO_MIME_TYPES
        .iter()
        .map(|mime| format!("mimeType='{}'", mime))
        .collect();
    let extension_clauses: Vec<String> = AUDIO_EXTENSIONS
        .iter()
        .map(|ext| format!("name contains '.{}'", ext))
        .collect();

    format!(
        "({} or {}) and trashed=false",
        mime_clauses.join(" or "),
        extension_clauses.join(" or ")
    )
}
