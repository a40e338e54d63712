use crate::error::MaskwardError;
use crate::infrastructure::error::InfrastructureError;
use std::io::Write;
use std::path::{Component, Path, PathBuf};

/// Write content to a file atomically using a temporary file.
///
/// The temporary file is created next to the target (same filesystem), filled,
/// then renamed over the target. Readers see either the old or the new content.
/// Missing parent directories are created.
pub fn atomic_write<P: AsRef<Path>, C: AsRef<[u8]>>(
    path: P,
    content: C,
) -> Result<(), InfrastructureError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(InfrastructureError::Io)?;

    temp_file
        .write_all(content.as_ref())
        .map_err(InfrastructureError::Io)?;

    temp_file
        .persist(path)
        .map_err(|e| InfrastructureError::Io(e.error))?;

    Ok(())
}

/// Join a relative path under `root`, refusing absolute paths and `..` escapes.
pub fn resolve_within(root: &Path, relative: &str) -> Result<PathBuf, MaskwardError> {
    let rel = Path::new(relative);
    let escapes = rel.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if escapes || relative.is_empty() {
        return Err(MaskwardError::UnsafePath(relative.to_string()));
    }
    Ok(root.join(rel))
}
