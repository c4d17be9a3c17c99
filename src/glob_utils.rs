//! Glob pattern matching utilities for path filtering

use globset::Glob;

/// Check if a file path matches any of the given patterns
///
/// A pattern matches when it is a glob matching the path (or one of its
/// suffixes), or when it names one of the path's components exactly.
///
/// # Examples
///
/// ```
/// use type_context::glob_utils::matches_any_pattern;
///
/// let patterns = vec!["target".to_string(), "**/generated/*.rs".to_string()];
/// assert!(matches_any_pattern("/ws/target/debug/build.rs", &patterns));
/// assert!(matches_any_pattern("/ws/src/generated/api.rs", &patterns));
/// assert!(!matches_any_pattern("/ws/src/lib.rs", &patterns));
/// ```
pub fn matches_any_pattern(path: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|pattern| {
        if path.split('/').any(|component| component == pattern) {
            return true;
        }

        match Glob::new(pattern) {
            Ok(glob) => {
                let matcher = glob.compile_matcher();

                if matcher.is_match(path) || matcher.is_match(path.trim_start_matches('/')) {
                    return true;
                }

                // For patterns like "gen/**", also try matching against path suffixes
                if pattern.contains('*') {
                    let path_parts: Vec<&str> = path.split('/').collect();
                    for i in 0..path_parts.len() {
                        let suffix = path_parts[i..].join("/");
                        if matcher.is_match(&suffix) {
                            return true;
                        }
                    }
                }

                false
            }
            Err(e) => {
                tracing::warn!(
                    "Invalid glob pattern '{}', falling back to substring match: {}",
                    pattern,
                    e
                );
                path.contains(pattern)
            }
        }
    })
}
