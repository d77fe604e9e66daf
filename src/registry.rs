use crate::adapters::mangafox::MangaFoxAdapter;
use crate::adapters::mangareader::MangaReaderAdapter;
use crate::adapters::mangastream::MangaStreamAdapter;
use crate::adapters::readcomics::ReadComicsAdapter;
use crate::traits::SiteAdapter;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// Every site family the scraper knows how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteKind {
    MangaFox,
    MangaReader,
    MangaStream,
    ReadComics,
}

impl SiteKind {
    pub const ALL: [SiteKind; 4] = [
        SiteKind::MangaFox,
        SiteKind::MangaReader,
        SiteKind::MangaStream,
        SiteKind::ReadComics,
    ];

    /// Token a host name must contain to be handled by this site kind.
    fn host_marker(self) -> &'static str {
        match self {
            SiteKind::MangaFox => "mangafox",
            SiteKind::MangaReader => "mangareader",
            SiteKind::MangaStream => "mangastream",
            SiteKind::ReadComics => "readcomics",
        }
    }

    pub fn from_url(url: &str) -> Option<Self> {
        let parsed = Url::parse(url).ok()?;
        let host = parsed.host_str()?.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| host.contains(kind.host_marker()))
    }

    /// Upper-case tag used as a log prefix.
    pub fn label(self) -> &'static str {
        match self {
            SiteKind::MangaFox => "MANGAFOX",
            SiteKind::MangaReader => "MANGAREADER",
            SiteKind::MangaStream => "MANGASTREAM",
            SiteKind::ReadComics => "READCOMICS",
        }
    }

    pub fn adapter(self) -> Arc<dyn SiteAdapter> {
        match self {
            SiteKind::MangaFox => Arc::new(MangaFoxAdapter::new()),
            SiteKind::MangaReader => Arc::new(MangaReaderAdapter::new()),
            SiteKind::MangaStream => Arc::new(MangaStreamAdapter::new()),
            SiteKind::ReadComics => Arc::new(ReadComicsAdapter::new()),
        }
    }
}

impl fmt::Display for SiteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_marker())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_site_from_host() {
        assert_eq!(
            SiteKind::from_url("http://mangafox.me/manga/onepunch_man/"),
            Some(SiteKind::MangaFox)
        );
        assert_eq!(
            SiteKind::from_url("https://www.mangareader.net/naruto"),
            Some(SiteKind::MangaReader)
        );
        assert_eq!(
            SiteKind::from_url("https://mangastream.com/manga/one_piece"),
            Some(SiteKind::MangaStream)
        );
        assert_eq!(
            SiteKind::from_url("http://www.readcomics.tv/comic/spider-man-2016"),
            Some(SiteKind::ReadComics)
        );
    }

    #[test]
    fn unknown_or_malformed_urls_have_no_site() {
        assert_eq!(SiteKind::from_url("https://example.com/mangafox/x"), None);
        assert_eq!(SiteKind::from_url("not a url"), None);
    }

    #[test]
    fn adapters_report_their_kind() {
        for kind in SiteKind::ALL {
            assert_eq!(kind.adapter().kind(), kind);
        }
    }
}
