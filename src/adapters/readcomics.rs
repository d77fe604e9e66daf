use crate::adapters::{hrefs, resolve, selector};
use crate::catalog::ChapterCatalog;
use crate::models::{ChapterNumber, ChapterRef, PageRef, Work};
use crate::registry::SiteKind;
use crate::traits::SiteAdapter;
use scraper::Html;
use tracing::{debug, info};

/// Direct reader: the `/full` view of an issue embeds every page image.
pub struct ReadComicsAdapter;

impl ReadComicsAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for ReadComicsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SiteAdapter for ReadComicsAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::ReadComics
    }

    fn parse_chapters(&self, work: &Work, html: &str) -> ChapterCatalog {
        let document = Html::parse_document(html);
        let mut catalog = ChapterCatalog::new();

        for link in hrefs(&document) {
            if !(link.contains(&work.name) && link.contains("chapter")) {
                continue;
            }
            let link = link.trim_end_matches('/');
            let Some(token) = link.rsplit('-').next() else {
                continue;
            };
            let Ok(number) = token.parse::<ChapterNumber>() else {
                continue;
            };
            let Some(chapter_url) = resolve(&work.url, &format!("{}/full", link)) else {
                continue;
            };
            if !catalog.insert(ChapterRef::new(number, chapter_url.clone())) {
                debug!("[READCOMICS] Duplicate issue link skipped: {}", chapter_url);
            }
        }

        info!("[READCOMICS] Found {} issues for {}", catalog.len(), work.name);
        catalog
    }

    fn parse_pages(&self, chapter: &ChapterRef, html: &str) -> Option<Vec<PageRef>> {
        let document = Html::parse_document(html);
        let image_selector = selector("img.chapter_img");

        let pages: Vec<PageRef> = document
            .select(&image_selector)
            .filter_map(|img| img.value().attr("src"))
            .filter_map(|src| resolve(&chapter.url, src.trim()))
            .enumerate()
            .map(|(index, url)| PageRef::new(url, index as u32 + 1))
            .collect();

        if pages.is_empty() {
            None
        } else {
            Some(pages)
        }
    }

    fn parse_image_url(&self, page: &PageRef, _html: &str) -> Option<String> {
        Some(page.url.clone())
    }

    fn has_viewer(&self) -> bool {
        false
    }
}
