use crate::utils::error::{DeployError, Result};
use glob::{MatchOptions, Pattern};
use std::path::Path;
use walkdir::WalkDir;

/// 以逗號分隔的 glob 檔案樣式，例如 `*.py,*.config,requirements.txt`
///
/// 樣式相對於來源目錄比對，`*` 不跨越目錄，需要遞迴時使用 `**/*.js`。
#[derive(Debug, Clone)]
pub struct FileSelector {
    patterns: Vec<Pattern>,
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

impl FileSelector {
    pub fn parse(pattern: &str) -> Result<Self> {
        let patterns = pattern
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(Pattern::new)
            .collect::<std::result::Result<Vec<_>, _>>()?;

        if patterns.is_empty() {
            return Err(DeployError::InvalidConfigValueError {
                field: "file_path".to_string(),
                value: pattern.to_string(),
                reason: "File pattern selects nothing".to_string(),
            });
        }

        Ok(Self { patterns })
    }

    pub fn matches(&self, relative: &str) -> bool {
        self.patterns
            .iter()
            .any(|p| p.matches_with(relative, MATCH_OPTIONS))
    }

    /// 列出來源目錄下符合樣式的檔案，回傳以 `/` 分隔的相對路徑並排序
    pub fn select(&self, root: &Path) -> Result<Vec<String>> {
        let mut selected = Vec::new();

        let walker = WalkDir::new(root)
            .min_depth(1)
            .into_iter()
            .filter_entry(|e| e.file_name() != ".git");

        for entry in walker {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }

            let relative = relative_path(root, entry.path())?;
            if self.matches(&relative) {
                selected.push(relative);
            }
        }

        selected.sort();
        Ok(selected)
    }
}

fn relative_path(root: &Path, path: &Path) -> Result<String> {
    let relative = path.strip_prefix(root).map_err(|_| {
        DeployError::staging(format!("{} is outside {}", path.display(), root.display()))
    })?;

    let parts = relative
        .components()
        .map(|c| {
            c.as_os_str().to_str().map(str::to_string).ok_or_else(|| {
                DeployError::staging(format!("Non UTF-8 file name: {}", relative.display()))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"x").unwrap();
    }

    #[test]
    fn test_parse_trims_and_skips_empty_entries() {
        let selector = FileSelector::parse(" *.js , ,*.json").unwrap();
        assert!(selector.matches("index.js"));
        assert!(selector.matches("package.json"));
        assert!(!selector.matches("index.php"));
    }

    #[test]
    fn test_parse_rejects_empty_pattern() {
        assert!(FileSelector::parse("").is_err());
        assert!(FileSelector::parse(" , ").is_err());
    }

    #[test]
    fn test_parse_rejects_malformed_glob() {
        let err = FileSelector::parse("[abc").unwrap_err();
        assert!(matches!(err, DeployError::PatternError(_)));
    }

    #[test]
    fn test_star_does_not_cross_directories() {
        let selector = FileSelector::parse("*.js").unwrap();
        assert!(selector.matches("index.js"));
        assert!(!selector.matches("lib/util.js"));

        let recursive = FileSelector::parse("**/*.js").unwrap();
        assert!(recursive.matches("lib/util.js"));
    }

    #[test]
    fn test_select_walks_tree_and_skips_git_dir() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "main.py");
        touch(dir.path(), "requirements.txt");
        touch(dir.path(), "notes.md");
        touch(dir.path(), "pkg/helper.py");
        touch(dir.path(), ".git/hooks/pre-commit.py");

        let selector = FileSelector::parse("**/*.py,requirements.txt").unwrap();
        let selected = selector.select(dir.path()).unwrap();

        assert_eq!(selected, vec!["main.py", "pkg/helper.py", "requirements.txt"]);
    }

    #[test]
    fn test_select_missing_root_is_an_error() {
        let dir = TempDir::new().unwrap();
        let selector = FileSelector::parse("*.php").unwrap();

        let err = selector.select(&dir.path().join("dist")).unwrap_err();
        assert!(matches!(err, DeployError::WalkError(_)));
    }
}
