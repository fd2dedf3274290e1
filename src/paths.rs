//! Local naming: collision-free destination paths and exported file names.

use std::path::{Path, PathBuf};

/// Make a remote display name usable as a single local path component.
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c => c,
        })
        .collect();

    match cleaned.as_str() {
        "" | "." | ".." => "_".to_string(),
        _ => cleaned,
    }
}

/// Split `name` into stem and final extension (dot included). A leading
/// dot or a trailing dot does not start an extension, so `"Budget."` has
/// the stem `"Budget."` and no extension.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(i) if i > 0 && i + 1 < name.len() => name.split_at(i),
        _ => (name, ""),
    }
}

/// Name of an exported document: the final extension of `name` is replaced
/// by `extension` (given without the dot).
pub fn exported_name(name: &str, extension: &str) -> String {
    let (stem, _) = split_extension(name);
    format!("{}.{}", stem, extension)
}

/// Return `directory/desired_name`, or the first free `stem (n).ext`
/// variant when that path is taken. Only inspects the filesystem.
///
/// The check is not atomic with the write that follows; the output
/// directory is assumed to be owned by a single writer.
pub fn resolve(directory: &Path, desired_name: &str) -> PathBuf {
    first_free(directory, desired_name, occupied)
}

/// Local directory for a remote subfolder. An existing directory of that
/// name is reused so reruns merge into it; a file or link in the way
/// pushes the folder to the first ` (n)` name that is free or already a
/// directory.
pub fn resolve_dir(directory: &Path, desired_name: &str) -> PathBuf {
    first_free(directory, desired_name, |path| {
        occupied(path) && !std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
    })
}

fn first_free(directory: &Path, desired_name: &str, taken: impl Fn(&Path) -> bool) -> PathBuf {
    let candidate = directory.join(desired_name);
    if !taken(&candidate) {
        return candidate;
    }

    let (stem, suffix) = split_extension(desired_name);
    let mut n: u64 = 1;
    loop {
        let candidate = directory.join(format!("{} ({}){}", stem, n, suffix));
        if !taken(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

// Dangling symlinks count as taken.
fn occupied(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_resolve_free_path() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve(dir.path(), "a.txt"), dir.path().join("a.txt"));
    }

    #[test]
    fn test_resolve_sequence_of_collisions() {
        let dir = TempDir::new().unwrap();
        let mut produced = Vec::new();
        for _ in 0..4 {
            let path = resolve(dir.path(), "photo.jpg");
            fs::write(&path, b"x").unwrap();
            produced.push(path.file_name().unwrap().to_string_lossy().into_owned());
        }
        assert_eq!(
            produced,
            vec!["photo.jpg", "photo (1).jpg", "photo (2).jpg", "photo (3).jpg"]
        );
    }

    #[test]
    fn test_resolve_without_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("README"), b"x").unwrap();
        assert_eq!(resolve(dir.path(), "README"), dir.path().join("README (1)"));
    }

    #[test]
    fn test_resolve_only_last_extension_is_kept() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("data.tar.gz"), b"x").unwrap();
        assert_eq!(
            resolve(dir.path(), "data.tar.gz"),
            dir.path().join("data.tar (1).gz")
        );
    }

    #[test]
    fn test_resolve_skips_existing_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("notes")).unwrap();
        assert_eq!(resolve(dir.path(), "notes"), dir.path().join("notes (1)"));
    }

    #[test]
    fn test_resolve_does_not_create_anything() {
        let dir = TempDir::new().unwrap();
        let _ = resolve(dir.path(), "ghost.bin");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_resolve_trailing_dot_has_no_extension() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Budget."), b"x").unwrap();
        assert_eq!(resolve(dir.path(), "Budget."), dir.path().join("Budget. (1)"));
    }

    #[test]
    fn test_resolve_hidden_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".env"), b"x").unwrap();
        assert_eq!(resolve(dir.path(), ".env"), dir.path().join(".env (1)"));
    }

    #[test]
    fn test_resolve_dir_reuses_existing_directory() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("notes")).unwrap();
        assert_eq!(resolve_dir(dir.path(), "notes"), dir.path().join("notes"));
    }

    #[test]
    fn test_resolve_dir_steps_around_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes"), b"x").unwrap();
        fs::write(dir.path().join("notes (1)"), b"x").unwrap();
        assert_eq!(resolve_dir(dir.path(), "notes"), dir.path().join("notes (2)"));

        fs::create_dir(dir.path().join("notes (2)")).unwrap();
        assert_eq!(resolve_dir(dir.path(), "notes"), dir.path().join("notes (2)"));
    }

    #[test]
    fn test_exported_name() {
        assert_eq!(exported_name("Budget", "xlsx"), "Budget.xlsx");
        assert_eq!(exported_name("Plan.v2", "xlsx"), "Plan.xlsx");
        assert_eq!(exported_name("Notes", "pdf"), "Notes.pdf");
        assert_eq!(exported_name("Budget.", "xlsx"), "Budget..xlsx");
        assert_eq!(exported_name(".profile", "pdf"), ".profile.pdf");
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_name(".."), "_");
        assert_eq!(sanitize_name(""), "_");
        assert_eq!(sanitize_name("Q1.docx"), "Q1.docx");
    }
}
