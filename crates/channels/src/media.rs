//! Local media loading helpers for transport implementations.

use std::path::Path;

use bytes::Bytes;

use crate::{Error, Result, message::MediaRef};

/// Guess a MIME type from a file extension.
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mp3" => "audio/mpeg",
        "ogg" | "opus" => "audio/ogg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// Read a file into a [`MediaRef`].
pub async fn read_media_file(path: &Path) -> Result<MediaRef> {
    let file_name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| Error::invalid_input(format!("not a file path: {}", path.display())))?;
    let data = tokio::fs::read(path)
        .await
        .map_err(|e| Error::media_unavailable(path.display(), e))?;
    Ok(MediaRef::new(
        mime_from_path(path),
        Some(file_name),
        Bytes::from(data),
    ))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest};

    #[rstest]
    #[case("live.PNG", "image/png")]
    #[case("intro.mp4", "video/mp4")]
    #[case("horn.ogg", "audio/ogg")]
    #[case("sticker.webp", "image/webp")]
    #[case("notes", "application/octet-stream")]
    fn guesses_mime(#[case] name: &str, #[case] expected: &str) {
        assert_eq!(mime_from_path(Path::new(name)), expected);
    }

    #[tokio::test]
    async fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("banner.jpg");
        std::fs::write(&path, b"jpeg-bytes").unwrap();

        let media = read_media_file(&path).await.unwrap();
        assert_eq!(media.mime_type, "image/jpeg");
        assert_eq!(media.file_name.as_deref(), Some("banner.jpg"));
        assert_eq!(&media.data[..], b"jpeg-bytes");
    }

    #[tokio::test]
    async fn missing_file_is_media_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_media_file(&dir.path().join("gone.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MediaUnavailable { .. }));
    }
}
