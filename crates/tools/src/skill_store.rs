//! Filesystem skill store — one directory per skill, protocol in `SKILL.md`.
//!
//! Layout: `<root>/<skill-name>/SKILL.md`. Any scripts the protocol refers
//! to live next to it and are run through `run_shell`.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use skillloop_core::error::SkillError;
use skillloop_core::skill::SkillStore;
use tracing::debug;

const SKILL_FILE: &str = "SKILL.md";

pub struct FsSkillStore {
    root: PathBuf,
}

impl FsSkillStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn validate_name(name: &str) -> Result<(), SkillError> {
        let name = name.trim();
        if name.is_empty()
            || name.contains('/')
            || name.contains('\\')
            || name.contains("..")
        {
            return Err(SkillError::InvalidName(name.to_string()));
        }
        Ok(())
    }

    /// Directory names to try for `name`: as given, then snake_case → kebab-case.
    fn candidates(name: &str) -> Vec<String> {
        let name = name.trim();
        let mut out = vec![name.to_string()];
        let kebab = name.replace('_', "-");
        if kebab != name {
            out.push(kebab);
        }
        out
    }
}

#[async_trait]
impl SkillStore for FsSkillStore {
    async fn load(&self, name: &str) -> Result<Option<String>, SkillError> {
        Self::validate_name(name)?;

        for candidate in Self::candidates(name) {
            let path = self.root.join(&candidate).join(SKILL_FILE);
            match tokio::fs::read_to_string(&path).await {
                Ok(text) => {
                    debug!(skill = %name, path = %path.display(), "Loaded skill protocol");
                    return Ok(Some(text));
                }
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(SkillError::Io {
                        name: name.to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        debug!(skill = %name, root = %self.root.display(), "Skill not found");
        Ok(None)
    }

    async fn list(&self) -> Result<Vec<String>, SkillError> {
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(SkillError::Io {
                    name: self.root.display().to_string(),
                    reason: e.to_string(),
                });
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = match dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(SkillError::Io {
                        name: self.root.display().to_string(),
                        reason: e.to_string(),
                    });
                }
            };
            let path = entry.path();
            if path.join(SKILL_FILE).is_file()
                && let Some(name) = path.file_name().and_then(|n| n.to_str())
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn install(root: &Path, dir: &str, body: &str) {
        std::fs::create_dir_all(root.join(dir)).unwrap();
        std::fs::write(root.join(dir).join(SKILL_FILE), body).unwrap();
    }

    #[tokio::test]
    async fn load_by_exact_name() {
        let root = tempfile::tempdir().unwrap();
        install(root.path(), "web_scraper", "Use requests+BeautifulSoup...");

        let store = FsSkillStore::new(root.path());
        let text = store.load("web_scraper").await.unwrap();
        assert_eq!(text.as_deref(), Some("Use requests+BeautifulSoup..."));
    }

    #[tokio::test]
    async fn load_falls_back_to_kebab_case() {
        let root = tempfile::tempdir().unwrap();
        install(root.path(), "image-to-pdf", "merge images");

        let store = FsSkillStore::new(root.path());
        assert_eq!(
            store.load("image_to_pdf").await.unwrap().as_deref(),
            Some("merge images")
        );
    }

    #[tokio::test]
    async fn missing_skill_is_none() {
        let root = tempfile::tempdir().unwrap();
        let store = FsSkillStore::new(root.path());
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn path_like_names_rejected() {
        let root = tempfile::tempdir().unwrap();
        let store = FsSkillStore::new(root.path());
        for bad in ["../etc", "a/b", "a\\b", ""] {
            assert!(matches!(
                store.load(bad).await,
                Err(SkillError::InvalidName(_))
            ));
        }
    }

    #[tokio::test]
    async fn list_only_dirs_with_skill_file() {
        let root = tempfile::tempdir().unwrap();
        install(root.path(), "web_scraper", "a");
        install(root.path(), "excel_master", "b");
        std::fs::create_dir_all(root.path().join("empty_dir")).unwrap();
        std::fs::write(root.path().join("stray.md"), "c").unwrap();

        let store = FsSkillStore::new(root.path());
        assert_eq!(store.list().await.unwrap(), vec!["excel_master", "web_scraper"]);
    }

    #[tokio::test]
    async fn list_missing_root_is_empty() {
        let store = FsSkillStore::new("/nonexistent/skillloop/skills");
        assert!(store.list().await.unwrap().is_empty());
    }
}
