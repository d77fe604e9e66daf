use crate::adapters::{first_image, resolve, selector};
use crate::catalog::ChapterCatalog;
use crate::models::{ChapterNumber, ChapterRef, PageRef, Work};
use crate::registry::SiteKind;
use crate::traits::SiteAdapter;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{debug, info};
use url::Url;

static LEADING_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d.]+)").expect("valid chapter pattern"));

/// Menu-driven reader: the chapter list is a table on the work page and the
/// page list is the dropdown whose first entry points at the chapter itself.
pub struct MangaStreamAdapter;

impl MangaStreamAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MangaStreamAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SiteAdapter for MangaStreamAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::MangaStream
    }

    fn parse_chapters(&self, work: &Work, html: &str) -> ChapterCatalog {
        let document = Html::parse_document(html);
        let entry_selector = selector("table a[href]");
        let mut catalog = ChapterCatalog::new();

        for entry in document.select(&entry_selector) {
            let Some(href) = entry.value().attr("href") else {
                continue;
            };
            let Some(chapter_url) = resolve(&work.url, href.trim()) else {
                continue;
            };
            let title = entry.text().collect::<String>();
            let Some(caps) = LEADING_NUMBER.captures(&title) else {
                continue;
            };
            let Ok(number) = caps[1].parse::<ChapterNumber>() else {
                continue;
            };
            if !catalog.insert(ChapterRef::new(number, chapter_url.clone())) {
                debug!("[MANGASTREAM] Duplicate chapter entry skipped: {}", chapter_url);
            }
        }

        info!("[MANGASTREAM] Found {} chapters for {}", catalog.len(), work.name);
        catalog
    }

    fn parse_pages(&self, chapter: &ChapterRef, html: &str) -> Option<Vec<PageRef>> {
        let chapter_path = Url::parse(&chapter.url).ok()?.path().trim_end_matches('/').to_string();
        let document = Html::parse_document(html);
        let menu_selector = selector("ul");
        let first_link_selector = selector("li a[href]");
        let link_selector = selector("a[href]");

        let menu = document.select(&menu_selector).find(|menu| {
            menu.select(&first_link_selector)
                .next()
                .and_then(|a| a.value().attr("href"))
                .is_some_and(|href| href.contains(&chapter_path))
        })?;

        // Menu entries are in reading order; their position is the page number.
        let pages: Vec<PageRef> = menu
            .select(&link_selector)
            .filter_map(|a| a.value().attr("href"))
            .filter_map(|href| resolve(&chapter.url, href.trim()))
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
        first_image(html, "div.page img", &page.url)
    }
}
