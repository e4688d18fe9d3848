//! Processor configuration and include-path resolution.

use std::path::{Path, PathBuf};

pub const DEFAULT_LEFT_QUOTE: &str = "`";
pub const DEFAULT_RIGHT_QUOTE: &str = "'";
pub const DEFAULT_BEGIN_COMMENT: &str = "#";
pub const DEFAULT_END_COMMENT: &str = "\n";
pub const DEFAULT_NESTING_LIMIT: usize = 300;

/// Runtime configuration for a [`Processor`](crate::Processor).
///
/// The quote and comment delimiters are mutable at run time through the
/// `changequote`/`changecom` builtins and take effect for the next token
/// read.
#[derive(Debug, Clone)]
pub struct Config {
    pub left_quote: String,
    pub right_quote: String,
    pub begin_comment: String,
    pub end_comment: String,
    /// Emit `#line N "file"` directives when the output line drifts from
    /// the input line.
    pub sync_output: bool,
    /// Maximum `expand_macro` recursion depth.
    pub nesting_limit: usize,
    /// Skip GNU-extension builtins and predefine the legacy platform
    /// names (`unix`/`windows`) instead of `__unix__`/`__windows__`.
    pub no_gnu_extensions: bool,
    /// Register every builtin under an `m4_` prefix.
    pub prefix_all_builtins: bool,
    /// Name reported by the `__program__` builtin.
    pub program_name: String,
    /// Directories searched for relative include names, in order.
    pub include_path: Vec<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            left_quote: DEFAULT_LEFT_QUOTE.to_string(),
            right_quote: DEFAULT_RIGHT_QUOTE.to_string(),
            begin_comment: DEFAULT_BEGIN_COMMENT.to_string(),
            end_comment: DEFAULT_END_COMMENT.to_string(),
            sync_output: true,
            nesting_limit: DEFAULT_NESTING_LIMIT,
            no_gnu_extensions: false,
            prefix_all_builtins: false,
            program_name: "mfour".to_string(),
            include_path: vec![PathBuf::from(".")],
        }
    }
}

impl Config {
    /// Resolves an include name.
    ///
    /// Absolute paths are used as-is; relative names are tried against
    /// each include directory in order and the first existing file wins.
    pub fn search_file(&self, name: &str) -> Option<PathBuf> {
        let path = Path::new(name);
        if path.is_absolute() {
            return path.is_file().then(|| path.to_path_buf());
        }
        for dir in &self.include_path {
            let candidate = dir.join(path);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn absolute_path_used_as_is() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("inc.m4");
        fs::write(&file, "x").unwrap();

        let config = Config::default();
        assert_eq!(config.search_file(file.to_str().unwrap()), Some(file));
    }

    #[test]
    fn relative_name_resolved_along_include_path() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("inc.m4"), "x").unwrap();

        let mut config = Config::default();
        config.include_path = vec![dir.path().to_path_buf()];
        assert_eq!(
            config.search_file("inc.m4"),
            Some(dir.path().join("inc.m4"))
        );
    }

    #[test]
    fn earlier_include_directory_wins() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        fs::write(first.path().join("inc.m4"), "a").unwrap();
        fs::write(second.path().join("inc.m4"), "b").unwrap();

        let mut config = Config::default();
        config.include_path = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(
            config.search_file("inc.m4"),
            Some(first.path().join("inc.m4"))
        );
    }

    #[test]
    fn missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.include_path = vec![dir.path().to_path_buf()];
        assert_eq!(config.search_file("nope.m4"), None);
    }
}
