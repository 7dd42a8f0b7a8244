use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::LazyLock;

use chrono::{Datelike, Days, NaiveDate};
use regex::Regex;
use tracing::{debug, warn};

use crate::error::ExtractError;

/// Start date assumed for a menu link whose name carries no date.
#[must_use]
pub fn unknown_week_start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2000, 6, 1).unwrap_or(NaiveDate::MIN)
}

static DATE_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+[.]\d+[.]\d+").expect("date token pattern is valid"));

/// First `d.m.y` shaped token in `text`.
#[must_use]
pub fn find_date_token(text: &str) -> Option<&str> {
    DATE_TOKEN.find(text).map(|found| found.as_str())
}

/// Last path segment of a link, without query or fragment.
#[must_use]
pub fn link_file_name(href: &str) -> &str {
    let path = href.split(['?', '#']).next().unwrap_or_default();
    path.rsplit('/').next().unwrap_or(path)
}

/// Parses `dd.mm.yyyy`, falling back to `dd.mm.yy`.
pub fn parse_menu_date(token: &str) -> Result<NaiveDate, ExtractError> {
    let token = token.trim();
    let year_digits = token.rsplit('.').next().map_or(0, str::len);
    let format = match year_digits {
        4 => "%d.%m.%Y",
        2 => "%d.%m.%y",
        _ => {
            return Err(ExtractError::FormatMismatch(format!(
                "'{token}' is not a dd.mm.yyyy or dd.mm.yy date"
            )));
        }
    };
    NaiveDate::parse_from_str(token, format)
        .map_err(|error| ExtractError::FormatMismatch(format!("'{token}': {error}")))
}

/// Start date encoded in the file name of a menu link, or the unknown-week
/// sentinel when none can be read. Host and directories are ignored.
#[must_use]
pub fn menu_week_start(href: &str) -> NaiveDate {
    let name = link_file_name(href);
    let parsed = find_date_token(name)
        .ok_or_else(|| ExtractError::FormatMismatch(format!("no date in '{name}'")))
        .and_then(parse_menu_date);
    match parsed {
        Ok(date) => date,
        Err(error) => {
            debug!(%error, "using unknown week start");
            unknown_week_start()
        }
    }
}

#[must_use]
pub fn monday_of(date: NaiveDate) -> NaiveDate {
    date.checked_sub_days(Days::new(u64::from(date.weekday().num_days_from_monday())))
        .unwrap_or(date)
}

/// Monday of the week named by the first date found in document text.
pub fn week_start_from_text(text: &str) -> Result<NaiveDate, ExtractError> {
    let token = find_date_token(text)
        .ok_or_else(|| ExtractError::FormatMismatch("no date in document text".to_string()))?;
    parse_menu_date(token).map(monday_of)
}

/// ISO year and week number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WeekKey {
    pub year: i32,
    pub week: u32,
}

impl WeekKey {
    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        let iso = date.iso_week();
        Self {
            year: iso.year(),
            week: iso.week(),
        }
    }
}

impl Display for WeekKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

/// Resolved menu document URL per ISO week.
#[derive(Debug, Clone, Default)]
pub struct DocumentUrlCache {
    entries: HashMap<WeekKey, String>,
}

impl DocumentUrlCache {
    #[must_use]
    pub fn get(&self, week: WeekKey) -> Option<&str> {
        self.entries.get(&week).map(String::as_str)
    }

    pub fn insert(&mut self, week: WeekKey, url: impl Into<String>) -> Option<String> {
        self.entries.insert(week, url.into())
    }

    /// Drops the entry so the next lookup resolves the link again.
    pub fn invalidate(&mut self, week: WeekKey) -> Option<String> {
        self.entries.remove(&week)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Whether a link points at a cafeteria menu PDF.
#[must_use]
pub fn is_menu_link(href: &str) -> bool {
    let lower = href.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    path.ends_with(".pdf") && lower.contains("caf")
}

/// Picks the menu link for `today`'s week: the link whose dated name falls
/// into the same ISO week, otherwise the last menu link on the page.
#[must_use]
pub fn select_menu_link<S: AsRef<str>>(hrefs: &[S], today: NaiveDate) -> Option<&str> {
    let current = WeekKey::of(today);
    let candidates = hrefs
        .iter()
        .map(AsRef::as_ref)
        .filter(|href| is_menu_link(href))
        .collect::<Vec<_>>();

    if let Some(found) = candidates
        .iter()
        .copied()
        .find(|href| WeekKey::of(menu_week_start(href)) == current)
    {
        debug!(week = %current, href = found, "menu link for current week");
        return Some(found);
    }

    let fallback = candidates.last().copied();
    if let Some(href) = fallback {
        warn!(week = %current, href, "no menu link for current week, using last link");
    }
    fallback
}

/// Menu link for `today`'s ISO week, answered from `cache` when that week
/// was resolved before. A fresh selection is stored under the week.
pub fn resolve_menu_link<S: AsRef<str>>(
    cache: &mut DocumentUrlCache,
    hrefs: &[S],
    today: NaiveDate,
) -> Option<String> {
    let week = WeekKey::of(today);
    if let Some(url) = cache.get(week) {
        debug!(%week, url, "menu link from cache");
        return Some(url.to_string());
    }

    let selected = select_menu_link(hrefs, today)?.to_string();
    cache.insert(week, selected.clone());
    Some(selected)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{
        DocumentUrlCache, WeekKey, find_date_token, is_menu_link, link_file_name,
        menu_week_start, monday_of, parse_menu_date, resolve_menu_link, select_menu_link,
        unknown_week_start, week_start_from_text,
    };

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    #[test]
    fn parses_long_and_short_years() {
        assert_eq!(parse_menu_date("14.10.2024").expect("long"), date(2024, 10, 14));
        assert_eq!(parse_menu_date("14.10.24").expect("short"), date(2024, 10, 14));
        assert!(parse_menu_date("14.10.024").is_err());
        assert!(parse_menu_date("31.02.2024").is_err());
    }

    #[test]
    fn week_start_defaults_to_sentinel() {
        assert_eq!(
            menu_week_start("/files/Speiseplan_Cafeteria_14.10.2024.pdf"),
            date(2024, 10, 14)
        );
        assert_eq!(menu_week_start("/files/Speiseplan_Cafeteria.pdf"), unknown_week_start());
        assert_eq!(unknown_week_start(), date(2000, 6, 1));
    }

    #[test]
    fn finds_date_tokens_and_mondays() {
        assert_eq!(find_date_token("KW 42 vom 16.10.2024 bis"), Some("16.10.2024"));
        assert_eq!(find_date_token("keine Daten"), None);
        assert_eq!(monday_of(date(2024, 10, 16)), date(2024, 10, 14));
        assert_eq!(
            week_start_from_text("Speiseplan 16.10.2024").expect("date in text"),
            date(2024, 10, 14)
        );
        assert!(week_start_from_text("Speiseplan").is_err());
    }

    #[test]
    fn formats_week_keys() {
        assert_eq!(WeekKey::of(date(2024, 10, 14)).to_string(), "2024-W42");
        assert_eq!(WeekKey::of(date(2024, 12, 30)).to_string(), "2025-W01");
    }

    #[test]
    fn url_cache_invalidates_single_weeks() {
        let mut cache = DocumentUrlCache::default();
        let week = WeekKey::of(date(2024, 10, 14));
        cache.insert(week, "https://example.org/caf_14.10.2024.pdf");
        cache.insert(WeekKey::of(date(2024, 10, 21)), "https://example.org/caf_21.10.2024.pdf");

        assert_eq!(cache.get(week), Some("https://example.org/caf_14.10.2024.pdf"));
        assert!(cache.invalidate(week).is_some());
        assert_eq!(cache.get(week), None);
        assert_eq!(cache.len(), 1);
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn recognizes_menu_links() {
        assert!(is_menu_link("/media/Cafeteria_14.10.2024.PDF"));
        assert!(is_menu_link("/media/cafe.pdf?download=1"));
        assert!(!is_menu_link("/media/Mensa.pdf"));
        assert!(!is_menu_link("/media/cafeteria.html"));
    }

    #[test]
    fn selects_current_week_or_last_link() {
        let hrefs = vec![
            "/media/cafeteria_07.10.2024.pdf",
            "/media/cafeteria_14.10.2024.pdf",
            "/media/impressum.pdf",
            "/media/cafeteria_21.10.24.pdf",
        ];
        assert_eq!(
            select_menu_link(&hrefs, date(2024, 10, 16)),
            Some("/media/cafeteria_14.10.2024.pdf")
        );
        assert_eq!(
            select_menu_link(&hrefs, date(2024, 11, 20)),
            Some("/media/cafeteria_21.10.24.pdf")
        );
        assert_eq!(select_menu_link::<&str>(&[], date(2024, 10, 16)), None);
    }

    #[test]
    fn dates_are_read_from_the_file_name_only() {
        assert_eq!(
            link_file_name("https://10.0.0.5/media/cafeteria_14.10.2024.pdf?v=1.2.3#page=1"),
            "cafeteria_14.10.2024.pdf"
        );
        assert_eq!(
            menu_week_start("https://10.0.0.5/media/cafeteria_14.10.2024.pdf"),
            date(2024, 10, 14)
        );
        assert_eq!(
            menu_week_start("https://10.0.0.5/01.02.2023/cafeteria.pdf"),
            unknown_week_start()
        );

        let hrefs = [
            "https://10.0.0.5/media/cafeteria_14.10.2024.pdf",
            "https://10.0.0.5/media/cafeteria_21.10.2024.pdf",
        ];
        assert_eq!(
            select_menu_link(&hrefs, date(2024, 10, 16)),
            Some("https://10.0.0.5/media/cafeteria_14.10.2024.pdf")
        );
    }

    #[test]
    fn resolves_links_through_the_week_cache() {
        let mut cache = DocumentUrlCache::default();
        let hrefs = ["/media/cafeteria_14.10.2024.pdf", "/media/cafeteria_21.10.2024.pdf"];

        assert_eq!(
            resolve_menu_link(&mut cache, &hrefs, date(2024, 10, 16)).as_deref(),
            Some("/media/cafeteria_14.10.2024.pdf")
        );
        assert_eq!(
            cache.get(WeekKey::of(date(2024, 10, 14))),
            Some("/media/cafeteria_14.10.2024.pdf")
        );

        let newer = ["/media/cafeteria_14.10.2024_v2.pdf"];
        assert_eq!(
            resolve_menu_link(&mut cache, &newer, date(2024, 10, 18)).as_deref(),
            Some("/media/cafeteria_14.10.2024.pdf")
        );

        cache.invalidate(WeekKey::of(date(2024, 10, 18)));
        assert_eq!(
            resolve_menu_link(&mut cache, &newer, date(2024, 10, 18)).as_deref(),
            Some("/media/cafeteria_14.10.2024_v2.pdf")
        );
        assert_eq!(resolve_menu_link::<&str>(&mut cache, &[], date(2024, 11, 4)), None);
        assert_eq!(cache.len(), 1);
    }
}
