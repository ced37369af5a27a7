//! Lexical path helpers.
//!
//! Paths inside task manifests refer to locations in a container filesystem, never the host, so
//! these helpers operate purely on text and always use `/` as the separator.

/// Lexically normalizes a slash-separated path.
///
/// Repeated separators collapse, `.` segments vanish, and `..` removes the preceding segment
/// (never climbing above the root of an absolute path). An empty result becomes `.`.
pub fn clean(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(&last) if last != ".." => {
                    segments.pop();
                }
                _ if absolute => {}
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    let joined = segments.join("/");
    match (absolute, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

/// Joins `relative` under `base` and normalizes the result.
pub fn join_clean(base: &str, relative: &str) -> String {
    clean(&format!("{base}/{relative}"))
}
