use crate::adapters::{first_image, hrefs, resolve, selector};
use crate::catalog::ChapterCatalog;
use crate::models::{ChapterNumber, ChapterRef, PageRef, Work};
use crate::registry::SiteKind;
use crate::traits::SiteAdapter;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{debug, info};

static CHAPTER_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/([\d .]+)").expect("valid chapter pattern"));

/// Menu-driven reader: a `pageMenu` select on the chapter page lists one
/// URL per page, and every page is a viewer document around the image.
pub struct MangaReaderAdapter;

impl MangaReaderAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MangaReaderAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SiteAdapter for MangaReaderAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::MangaReader
    }

    fn parse_chapters(&self, work: &Work, html: &str) -> ChapterCatalog {
        let document = Html::parse_document(html);
        let mut catalog = ChapterCatalog::new();

        for link in hrefs(&document) {
            if !link.contains(&work.name) {
                continue;
            }
            let Some(chapter_url) = resolve(&work.url, &link) else {
                continue;
            };
            let Some(caps) = CHAPTER_NUMBER.captures(&chapter_url) else {
                continue;
            };
            let Ok(number) = caps[1].parse::<ChapterNumber>() else {
                continue;
            };
            if !catalog.insert(ChapterRef::new(number, chapter_url.clone())) {
                debug!("[MANGAREADER] Duplicate chapter link skipped: {}", chapter_url);
            }
        }

        info!("[MANGAREADER] Found {} chapters for {}", catalog.len(), work.name);
        catalog
    }

    fn parse_pages(&self, chapter: &ChapterRef, html: &str) -> Option<Vec<PageRef>> {
        let document = Html::parse_document(html);
        let option_selector = selector(r#"select[name*="pageMenu"] option"#);

        // Options are listed in reading order; their position is the page number.
        let pages: Vec<PageRef> = document
            .select(&option_selector)
            .filter_map(|option| option.value().attr("value"))
            .filter_map(|value| resolve(&chapter.url, value.trim()))
            .enumerate()
            .map(|(index, url)| PageRef::new(url, index as u32 + 1))
            .collect();

        if pages.is_empty() {
            None
        } else {
            Some(pages)
        }
    }

    fn parse_image_url(&self, page: &PageRef, html: &str) -> Option<String> {
        first_image(html, "#imgholder img", &page.url)
    }
}
