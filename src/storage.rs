use crate::error::Result;
use crate::models::{ChapterRef, OutputFormat, PageRef};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Filesystem layout of one work:
///
/// ```text
/// {location}/{work}/chapter-{n}/NNN.jpg     scratch pages
/// {location}/{work}/{work}-{n}[ (vV)].cbz   finished chapter
/// ```
#[derive(Debug, Clone)]
pub struct StorageManager {
    work_dir: PathBuf,
}

impl StorageManager {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
        }
    }

    pub async fn ensure_work_dir(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.work_dir).await?;
        Ok(())
    }

    pub fn chapter_dir(&self, chapter: &ChapterRef) -> PathBuf {
        self.work_dir.join(sanitize_filename(&chapter.scratch_dir_name()))
    }

    pub async fn create_chapter_dir(&self, chapter: &ChapterRef) -> Result<PathBuf> {
        let path = self.chapter_dir(chapter);
        tokio::fs::create_dir_all(&path).await?;
        debug!("Created chapter directory: {:?}", path);
        Ok(path)
    }

    pub fn page_path(chapter_dir: &Path, page: &PageRef) -> PathBuf {
        chapter_dir.join(page.file_name())
    }

    pub fn artifact_path(
        &self,
        work_name: &str,
        chapter: &ChapterRef,
        format: OutputFormat,
    ) -> PathBuf {
        let stem = sanitize_filename(&chapter.artifact_stem(work_name));
        self.work_dir.join(format!("{}.{}", stem, format.extension()))
    }
}

pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim_matches('.')
        .trim_matches(' ')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ChapterNumber;

    #[test]
    fn lays_out_scratch_and_artifacts_side_by_side() {
        let storage = StorageManager::new("/data/berserk");
        let chapter = ChapterRef::new("10.5".parse::<ChapterNumber>().unwrap(), "http://x");

        assert_eq!(storage.chapter_dir(&chapter), PathBuf::from("/data/berserk/chapter-10.5"));
        assert_eq!(
            StorageManager::page_path(&storage.chapter_dir(&chapter), &PageRef::new("u", 4)),
            PathBuf::from("/data/berserk/chapter-10.5/004.jpg")
        );
        assert_eq!(
            storage.artifact_path("berserk", &chapter, OutputFormat::Cbz),
            PathBuf::from("/data/berserk/berserk-10.5.cbz")
        );
        assert_eq!(
            storage.artifact_path("berserk", &chapter.clone().with_volume(2), OutputFormat::Pdf),
            PathBuf::from("/data/berserk/berserk-10.5 (v2).pdf")
        );
    }

    #[test]
    fn sanitizes_reserved_characters() {
        assert_eq!(sanitize_filename("a/b:c*d?"), "a_b_c_d_");
        assert_eq!(sanitize_filename("..name.."), "name");
        assert_eq!(sanitize_filename("  spaced  "), "spaced");
    }

    #[tokio::test]
    async fn creates_directories_on_demand() {
        let root = tempfile::tempdir().unwrap();
        let storage = StorageManager::new(root.path().join("work"));
        storage.ensure_work_dir().await.unwrap();
        let chapter = ChapterRef::new(ChapterNumber::whole(1), "http://x");
        let dir = storage.create_chapter_dir(&chapter).await.unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("chapter-1"));
    }
}
