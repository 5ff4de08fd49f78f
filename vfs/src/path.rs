use crate::VfsError;

/// Characters that may not appear in a directory or resource name.
const ILLEGAL_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Normalize a provider path.
///
/// - Replaces backslashes with forward slashes
/// - Collapses redundant separators (`a///b` → `a/b`)
/// - Drops `.` segments
/// - Rejects `..` segments (path traversal not allowed)
/// - Strips leading and trailing slashes
///
/// Returns `Err(VfsError::InvalidPath)` if the path is empty or contains `..`.
pub fn normalize(path: &str) -> Result<String, VfsError> {
    let normalized = normalize_dir(path)?;
    if normalized.is_empty() {
        return Err(VfsError::InvalidPath("empty path".into()));
    }
    Ok(normalized)
}

/// Like [`normalize`], but an empty result (the root) is allowed.
pub fn normalize_dir(path: &str) -> Result<String, VfsError> {
    let mut segments = Vec::new();
    for segment in segments_of(path) {
        if segment == ".." {
            return Err(VfsError::InvalidPath(
                "path traversal (..) not allowed".into(),
            ));
        }
        segments.push(segment);
    }
    Ok(segments.join("/"))
}

/// Non-empty, non-`.` segments of a path, splitting on either separator.
pub fn segments_of(path: &str) -> impl Iterator<Item = &str> {
    path.split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
}

/// Whether a path is rooted: leading separator or a drive letter (`C:`).
pub fn is_absolute(path: &str) -> bool {
    if path.starts_with('/') || path.starts_with('\\') {
        return true;
    }
    let bytes = path.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Whether `name` can name a single directory or resource.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(ILLEGAL_NAME_CHARS)
        && !name.chars().any(char::is_control)
}

/// Whether `path` is a valid project-relative directory path.
///
/// The empty path (the database root) is valid. Absolute paths and paths
/// with `..` segments are not.
pub fn is_valid_directory_path(path: &str) -> bool {
    if is_absolute(path) {
        return false;
    }
    segments_of(path).all(is_valid_name)
}

/// Join a directory and a child with a single `/`.
pub fn join(dir: &str, child: &str) -> String {
    let dir = dir.trim_end_matches(['/', '\\']);
    let child = child.trim_start_matches(['/', '\\']);
    if dir.is_empty() {
        child.to_owned()
    } else if child.is_empty() {
        dir.to_owned()
    } else {
        format!("{dir}/{child}")
    }
}

/// Final component of a path (after the last separator).
pub fn file_name(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(pos) => &path[pos + 1..],
        None => path,
    }
}

/// Final component without its extension.
pub fn file_stem(path: &str) -> &str {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => name,
        Some(pos) => &name[..pos],
    }
}

/// Extension of the final component, without the dot.
pub fn extension(path: &str) -> Option<&str> {
    let name = file_name(path);
    match name.rfind('.') {
        Some(0) | None => None,
        Some(pos) => Some(&name[pos + 1..]),
    }
}

/// Everything before the final separator, or `""` if there is none.
pub fn parent(path: &str) -> &str {
    match path.rfind(['/', '\\']) {
        Some(0) => &path[..1],
        Some(pos) => &path[..pos],
        None => "",
    }
}
