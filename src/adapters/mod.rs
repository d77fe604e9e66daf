pub mod mangafox;
pub mod mangareader;
pub mod mangastream;
pub mod readcomics;

use scraper::{Html, Selector};
use url::Url;

/// Compiles one of the selectors hard-coded in the adapters.
pub(crate) fn selector(css: &'static str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{}': {:?}", css, e))
}

/// Every `href` on the page, in document order.
pub(crate) fn hrefs(document: &Html) -> Vec<String> {
    let link_selector = selector("a[href]");
    document
        .select(&link_selector)
        .filter_map(|a| a.value().attr("href"))
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
        .collect()
}

/// Resolves `href` against `base`, the way a browser would.
pub(crate) fn resolve(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    base.join(href).ok().map(String::from)
}

/// `src` of the first element matching `css`, resolved against `base`.
pub(crate) fn first_image(html: &str, css: &'static str, base: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let image_selector = selector(css);
    let src = document
        .select(&image_selector)
        .find_map(|img| img.value().attr("src"))?
        .trim();
    if src.is_empty() {
        return None;
    }
    resolve(base, src)
}
