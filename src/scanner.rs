//! Directory scanner: discover supported images under the library root.

use std::path::Path;
use walkdir::WalkDir;

use crate::error::FrameError;
use crate::ImageRef;

/// Strip Windows extended-length path prefix (`\\?\`) if present.
pub(crate) fn clean_path(s: &str) -> String {
    s.strip_prefix(r"\\?\").unwrap_or(s).to_string()
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "heic"];

pub fn is_image_ext(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(is_image_ext)
        .unwrap_or(false)
}

/// Recursively list supported images under `root`, sorted by path with
/// duplicates (e.g. the same file reached through a symlink) removed.
pub fn discover(root: &Path) -> Result<Vec<ImageRef>, FrameError> {
    if !root.is_dir() {
        let err = std::fs::metadata(root)
            .err()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "not a directory"));
        return Err(FrameError::io(root, err));
    }

    let mut found: Vec<ImageRef> = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
    {
        if !entry.file_type().is_file() || !is_image(entry.path()) {
            continue;
        }

        // Canonical paths make symlinked duplicates collapse in dedup below.
        let path = match entry.path().canonicalize() {
            Ok(p) => clean_path(&p.to_string_lossy()),
            Err(_) => continue,
        };
        let modified = entry.metadata().ok().and_then(|m| m.modified().ok());
        found.push(ImageRef::new(path, modified));
    }

    found.sort_by(|a, b| a.path.cmp(&b.path));
    found.dedup();
    log::debug!("scan: {} images under {}", found.len(), root.display());
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn names(images: &[ImageRef]) -> Vec<String> {
        images.iter().map(|i| i.file_name()).collect()
    }

    // ── extension filtering ─────────────────────────────────────────────

    #[test]
    fn image_ext_supported() {
        for ext in &["jpg", "jpeg", "png", "bmp", "heic"] {
            assert!(is_image_ext(ext), "{} should be supported", ext);
        }
    }

    #[test]
    fn image_ext_case_insensitive() {
        assert!(is_image_ext("JPG"));
        assert!(is_image_ext("Png"));
        assert!(is_image_ext("HEIC"));
    }

    #[test]
    fn unsupported_ext_rejected() {
        for ext in &["gif", "webp", "tiff", "mp4", "txt", "pdf", "heif", ""] {
            assert!(!is_image_ext(ext), "{} should NOT be supported", ext);
        }
    }

    #[test]
    fn clean_path_strips_verbatim_prefix() {
        assert_eq!(clean_path(r"\\?\C:\Pics\a.jpg"), r"C:\Pics\a.jpg");
        assert_eq!(clean_path("/home/pi/Pics/a.jpg"), "/home/pi/Pics/a.jpg");
    }

    // ── discover ────────────────────────────────────────────────────────

    #[test]
    fn discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("c.png"), b"img").unwrap();
        fs::write(dir.path().join("a.JPG"), b"img").unwrap();
        fs::write(dir.path().join("b.bmp"), b"img").unwrap();
        fs::write(dir.path().join("notes.txt"), b"nope").unwrap();
        fs::write(dir.path().join("clip.mp4"), b"nope").unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(names(&found), vec!["a.JPG", "b.bmp", "c.png"]);
        assert!(found.iter().all(|i| i.modified.is_some()));
    }

    #[test]
    fn discover_recurses() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("2024/summer")).unwrap();
        fs::write(dir.path().join("top.jpg"), b"img").unwrap();
        fs::write(dir.path().join("2024/summer/beach.heic"), b"img").unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found.len(), 2);
        assert!(names(&found).contains(&"beach.heic".to_string()));
    }

    #[test]
    fn discover_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for n in ["x.jpg", "m.png", "a.jpeg"] {
            fs::write(dir.path().join(n), b"img").unwrap();
        }
        let a = discover(dir.path()).unwrap();
        let b = discover(dir.path()).unwrap();
        assert_eq!(a, b);
    }

    #[cfg(unix)]
    #[test]
    fn discover_dedups_symlinked_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("real")).unwrap();
        fs::write(dir.path().join("real/a.jpg"), b"img").unwrap();
        std::os::unix::fs::symlink(dir.path().join("real"), dir.path().join("link")).unwrap();

        let found = discover(dir.path()).unwrap();
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn discover_empty_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn discover_missing_root_errors() {
        let dir = tempfile::tempdir().unwrap();
        let err = discover(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, FrameError::Io { .. }));
    }
}
