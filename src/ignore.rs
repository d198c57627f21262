use ignore::gitignore::{Gitignore, GitignoreBuilder};
use std::path::Path;

/// Gitignore-style filter applied while walking a repository.
pub struct IgnoreFilter {
    inner: Gitignore,
}

impl IgnoreFilter {
    pub fn new(root: &Path, extra_excludes: &[String]) -> Self {
        let mut builder = GitignoreBuilder::new(root);

        // 1. Repository ignore files
        builder.add(root.join(".gitignore"));
        builder.add(root.join(".ignore"));

        // 2. Defaults
        let defaults = [
            // Environments and caches
            "venv/", ".venv/", "env/", ".tox/", ".nox/", "__pycache__/", "*.egg-info/",
            ".mypy_cache/", ".pytest_cache/", ".ruff_cache/", "site-packages/",

            // Build output and tooling
            "build/", "dist/", "node_modules/", "target/", ".git/", ".semgraph/",
            ".vscode/", ".idea/",

            // Compiled artifacts
            "*.pyc", "*.pyo", "*.pyd", "*.so",
        ];

        for pattern in defaults {
            builder.add_line(None, pattern).ok();
        }

        // 3. User excludes from config
        for pattern in extra_excludes {
            if let Err(e) = builder.add_line(None, pattern) {
                tracing::warn!("Ignoring invalid exclude pattern {:?}: {}", pattern, e);
            }
        }

        Self {
            inner: builder.build().unwrap_or_else(|_| Gitignore::empty()),
        }
    }

    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        self.inner.matched(path, is_dir).is_ignore()
    }
}
