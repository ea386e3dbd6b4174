use std::path::{Path, PathBuf};

/// Turns a filename written in a cue sheet into a path that can be opened.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, filename: &str, cue_dir: &Path) -> Option<PathBuf>;
}

/// Looks the file up on the host filesystem: as written, next to the cue
/// sheet, and finally with DOS-style `\` separators turned into `/`.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPathResolver;

impl PathResolver for HostPathResolver {
    fn resolve(&self, filename: &str, cue_dir: &Path) -> Option<PathBuf> {
        let converted = filename.replace('\\', "/");

        [filename, converted.as_str()]
            .into_iter()
            .flat_map(|name| [PathBuf::from(name), cue_dir.join(name)])
            .find(|candidate| candidate.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn resolves_relative_to_cue_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("track01.bin"), b"").unwrap();

        let resolved = HostPathResolver.resolve("track01.bin", dir.path());
        assert_eq!(resolved, Some(dir.path().join("track01.bin")));
    }

    #[test]
    fn resolves_absolute_path_as_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("image.bin");
        fs::write(&path, b"").unwrap();

        let resolved = HostPathResolver.resolve(path.to_str().unwrap(), Path::new("/nonexistent"));
        assert_eq!(resolved, Some(path));
    }

    #[test]
    fn resolves_backslash_separators() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("audio")).unwrap();
        fs::write(dir.path().join("audio/track02.wav"), b"").unwrap();

        let resolved = HostPathResolver.resolve("audio\\track02.wav", dir.path());
        assert_eq!(resolved, Some(dir.path().join("audio/track02.wav")));
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempdir().unwrap();
        assert_eq!(HostPathResolver.resolve("missing.bin", dir.path()), None);
    }
}
