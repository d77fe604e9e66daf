use crate::adapters::{first_image, hrefs, resolve, selector};
use crate::catalog::ChapterCatalog;
use crate::models::{ChapterNumber, ChapterRef, PageRef, Work};
use crate::registry::SiteKind;
use crate::traits::SiteAdapter;
use regex::Regex;
use scraper::Html;
use std::sync::LazyLock;
use tracing::{debug, info};

static VOLUME_CHAPTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"v(\d*)/c([\d .]*)").expect("valid volume/chapter pattern"));
static CHAPTER_ONLY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"c([\d.]+)").expect("valid chapter pattern"));
static TOTAL_PAGES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"var total_pages\s?=\s?(\d*)\s?;").expect("valid total_pages pattern")
});

/// Paginated reader: chapter pages live at `{chapter}/{n}.html` and the
/// page count is only available from an inline script.
pub struct MangaFoxAdapter;

impl MangaFoxAdapter {
    pub fn new() -> Self {
        Self
    }

    /// `.../manga/name/v01/c001/1.html` -> `.../manga/name/v01/c001`.
    fn chapter_link(base: &str, link: &str) -> Option<String> {
        let (parent, _) = link.rsplit_once('/')?;
        resolve(base, parent)
    }

    fn harvest(links: &[String], base: &str, with_volume: bool) -> ChapterCatalog {
        let mut catalog = ChapterCatalog::new();
        for link in links {
            let Some(chapter_url) = Self::chapter_link(base, link) else {
                continue;
            };

            let chapter = if with_volume {
                let Some(caps) = VOLUME_CHAPTER.captures(&chapter_url) else {
                    continue;
                };
                let Ok(number) = caps[2].parse::<ChapterNumber>() else {
                    continue;
                };
                let volume = caps[1].parse::<u32>().unwrap_or(1);
                ChapterRef::new(number, chapter_url.clone()).with_volume(volume)
            } else {
                let Some(caps) = CHAPTER_ONLY.captures(&chapter_url) else {
                    continue;
                };
                let Ok(number) = caps[1].parse::<ChapterNumber>() else {
                    continue;
                };
                ChapterRef::new(number, chapter_url.clone())
            };

            if !catalog.insert(chapter) {
                debug!("[MANGAFOX] Duplicate chapter link skipped: {}", chapter_url);
            }
        }
        catalog
    }
}

impl Default for MangaFoxAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl SiteAdapter for MangaFoxAdapter {
    fn kind(&self) -> SiteKind {
        SiteKind::MangaFox
    }

    fn parse_chapters(&self, work: &Work, html: &str) -> ChapterCatalog {
        let document = Html::parse_document(html);
        let links: Vec<String> = hrefs(&document)
            .into_iter()
            .filter(|href| href.contains(&work.name) && href.contains("manga"))
            .collect();
        debug!("[MANGAFOX] {} candidate chapter links", links.len());

        let mut catalog = Self::harvest(&links, &work.url, true);
        if catalog.is_empty() && !links.is_empty() {
            info!("[MANGAFOX] No volume numbers found for {}, retrying without volumes", work.name);
            catalog = Self::harvest(&links, &work.url, false);
        }

        info!("[MANGAFOX] Found {} chapters for {}", catalog.len(), work.name);
        catalog
    }

    fn pages_url(&self, chapter: &ChapterRef) -> String {
        format!("{}/1.html", chapter.url)
    }

    fn parse_pages(&self, chapter: &ChapterRef, html: &str) -> Option<Vec<PageRef>> {
        let document = Html::parse_document(html);
        let script_selector = selector("script");

        let total_pages = document.select(&script_selector).find_map(|script| {
            let body = script.text().collect::<String>();
            TOTAL_PAGES.captures(&body)?[1].parse::<u32>().ok()
        })?;
        if total_pages == 0 {
            return None;
        }

        Some(
            (1..=total_pages)
                .map(|n| PageRef::new(format!("{}/{}.html", chapter.url, n), n))
                .collect(),
        )
    }

    fn parse_image_url(&self, page: &PageRef, html: &str) -> Option<String> {
        first_image(html, "img#image", &page.url)
    }
}
