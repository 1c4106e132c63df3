//! Notepath ordering.
//!
//! `/` separates the parts of a notepath, so `a` is the parent of `a/b`.
//! Plain sorting would put `a(b)` between `a` and `a/b` because `(` sorts
//! before `/`. Sorting on a key where `/` becomes `\0` (and case is ignored)
//! keeps every parent directly followed by its children.

/// Separator between the parts of a notepath.
pub const PATH_SEPARATOR: char = '/';

/// Sort key that keeps parents and children adjacent.
pub fn path_sort_key(path: &str) -> String {
    path.to_lowercase().replace(PATH_SEPARATOR, "\0")
}

/// Sort notepaths in place, parents before children.
pub fn sort_paths<S: AsRef<str>>(paths: &mut [S]) {
    paths.sort_by_cached_key(|p| path_sort_key(p.as_ref()));
}

/// Sorted copy of the given paths.
pub fn sorted_paths<'a, I>(paths: I) -> Vec<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut paths: Vec<&str> = paths.into_iter().map(String::as_str).collect();
    sort_paths(&mut paths);
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_before_children() {
        let mut paths = vec!["a/b", "a", "a(b)"];
        sort_paths(&mut paths);
        assert_eq!(paths, vec!["a", "a/b", "a(b)"]);
    }

    #[test]
    fn test_case_is_ignored() {
        let mut paths = vec!["b".to_string(), "A/x".to_string(), "a".to_string(), "A b".to_string()];
        sort_paths(&mut paths);
        assert_eq!(paths, vec!["a", "A/x", "A b", "b"]);
    }
}
