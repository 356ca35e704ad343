//! Slash-delimited tree path helpers.

/// Join a parent tree path with a child node name.
///
/// An empty parent yields the child unchanged, and a trailing `/` on the
/// parent is not doubled.
pub fn append_child(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        return child.to_string();
    }
    let mut path = String::with_capacity(parent.len() + 1 + child.len());
    path.push_str(parent);
    path.push('/');
    path.push_str(child);
    path
}

/// The parent tree path of `path`, or `""` for a top-level node.
pub fn parent_path(path: &str) -> &str {
    path.rsplit_once('/').map_or("", |(parent, _)| parent)
}

/// The last component of `path`.
pub fn node_name(path: &str) -> &str {
    path.rsplit_once('/').map_or(path, |(_, name)| name)
}
