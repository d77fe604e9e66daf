use crate::error::{ComicScraperError, Result};
use crate::models::{ChapterNumber, ChapterRef};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::str::FromStr;

/// Chapters discovered for one work, keyed and ordered by chapter number.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChapterCatalog {
    chapters: BTreeMap<ChapterNumber, ChapterRef>,
}

impl ChapterCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a chapter unless one with the same number is already known.
    /// Returns whether the chapter was kept.
    pub fn insert(&mut self, chapter: ChapterRef) -> bool {
        match self.chapters.entry(chapter.number) {
            Entry::Vacant(slot) => {
                slot.insert(chapter);
                true
            }
            Entry::Occupied(_) => false,
        }
    }

    pub fn get(&self, number: ChapterNumber) -> Option<&ChapterRef> {
        self.chapters.get(&number)
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn numbers(&self) -> Vec<ChapterNumber> {
        self.chapters.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChapterRef> {
        self.chapters.values()
    }

    /// Chapters inside `requested` (all of them when `None`), ascending.
    pub fn filter(&self, requested: Option<&ChapterRange>) -> Vec<(ChapterNumber, ChapterRef)> {
        self.chapters
            .iter()
            .filter(|(number, _)| requested.map_or(true, |range| range.contains(**number)))
            .map(|(number, chapter)| (*number, chapter.clone()))
            .collect()
    }
}

impl FromIterator<ChapterRef> for ChapterCatalog {
    fn from_iter<I: IntoIterator<Item = ChapterRef>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for chapter in iter {
            catalog.insert(chapter);
        }
        catalog
    }
}

/// Inclusive chapter range given as `start` or `start:end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: ChapterNumber,
    pub end: ChapterNumber,
}

impl ChapterRange {
    pub fn contains(&self, number: ChapterNumber) -> bool {
        self.start <= number && number <= self.end
    }
}

impl FromStr for ChapterRange {
    type Err = ComicScraperError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            ComicScraperError::invalid_chapter_range(format!(
                "'{}' (expected start or start:end, e.g. 10:20)",
                s
            ))
        };
        let parts: Vec<&str> = s.split(':').collect();
        let (start, end) = match parts.as_slice() {
            [single] => {
                let n: ChapterNumber = single.parse().map_err(|_| invalid())?;
                (n, n)
            }
            [start, end] => (
                start.parse().map_err(|_| invalid())?,
                end.parse().map_err(|_| invalid())?,
            ),
            _ => return Err(invalid()),
        };
        if start > end {
            return Err(invalid());
        }
        Ok(Self { start, end })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(s: &str) -> ChapterNumber {
        s.parse().unwrap()
    }

    fn numbers(selected: Vec<(ChapterNumber, ChapterRef)>) -> Vec<ChapterNumber> {
        selected.into_iter().map(|(k, _)| k).collect()
    }

    fn catalog(numbers: &[&str]) -> ChapterCatalog {
        numbers
            .iter()
            .map(|s| ChapterRef::new(n(s), format!("http://site/c{}", s)))
            .collect()
    }

    #[test]
    fn first_discovery_wins() {
        let mut catalog = ChapterCatalog::new();
        assert!(catalog.insert(ChapterRef::new(n("1"), "first-1")));
        assert!(catalog.insert(ChapterRef::new(n("2"), "first-2")));
        assert!(!catalog.insert(ChapterRef::new(n("2"), "second-2")));
        assert!(catalog.insert(ChapterRef::new(n("3.5"), "first-3.5")));
        assert!(!catalog.insert(ChapterRef::new(n("3.50"), "second-3.5")));

        assert_eq!(catalog.numbers(), vec![n("1"), n("2"), n("3.5")]);
        assert_eq!(catalog.get(n("2")).unwrap().url, "first-2");
        assert_eq!(catalog.get(n("3.5")).unwrap().url, "first-3.5");
    }

    #[test]
    fn range_selects_inclusive_intersection() {
        let catalog = catalog(&["1", "2", "3", "4"]);
        let range: ChapterRange = "2:3".parse().unwrap();
        let selected = numbers(catalog.filter(Some(&range)));
        assert_eq!(selected, vec![n("2"), n("3")]);
    }

    #[test]
    fn range_includes_half_chapters() {
        let catalog = catalog(&["9", "10", "10.5", "11", "12"]);
        let range: ChapterRange = "10:11".parse().unwrap();
        let selected = numbers(catalog.filter(Some(&range)));
        assert_eq!(selected, vec![n("10"), n("10.5"), n("11")]);
    }

    #[test]
    fn no_range_selects_everything_in_order() {
        let catalog = catalog(&["3", "1", "2.5"]);
        let selected = numbers(catalog.filter(None));
        assert_eq!(selected, vec![n("1"), n("2.5"), n("3")]);
    }

    #[test]
    fn missing_requested_numbers_are_dropped() {
        let catalog = catalog(&["1", "2", "4"]);
        let range: ChapterRange = "2:99".parse().unwrap();
        let selected = numbers(catalog.filter(Some(&range)));
        assert_eq!(selected, vec![n("2"), n("4")]);
    }

    #[test]
    fn range_outside_catalog_is_empty() {
        let catalog = catalog(&["1", "2"]);
        let range: ChapterRange = "5:8".parse().unwrap();
        assert!(catalog.filter(Some(&range)).is_empty());
    }

    #[test]
    fn parses_ranges() {
        assert_eq!(
            "7".parse::<ChapterRange>().unwrap(),
            ChapterRange { start: n("7"), end: n("7") }
        );
        assert_eq!(
            "1.5:3".parse::<ChapterRange>().unwrap(),
            ChapterRange { start: n("1.5"), end: n("3") }
        );
        assert!("3:1".parse::<ChapterRange>().is_err());
        assert!("1:2:3".parse::<ChapterRange>().is_err());
        assert!("a:b".parse::<ChapterRange>().is_err());
        assert!(":".parse::<ChapterRange>().is_err());
    }
}
