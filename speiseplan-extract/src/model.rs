use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

/// Monday-first working day of a menu week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mo,
    Di,
    Mi,
    Do,
    Fr,
}

impl Weekday {
    pub const ALL: [Weekday; 5] = [Self::Mo, Self::Di, Self::Mi, Self::Do, Self::Fr];

    #[must_use]
    pub fn from_ordinal(ordinal: u32) -> Option<Self> {
        usize::try_from(ordinal)
            .ok()
            .and_then(|index| Self::ALL.get(index).copied())
    }

    #[must_use]
    pub const fn ordinal(self) -> u32 {
        match self {
            Self::Mo => 0,
            Self::Di => 1,
            Self::Mi => 2,
            Self::Do => 3,
            Self::Fr => 4,
        }
    }

    #[must_use]
    pub const fn short_label(self) -> &'static str {
        match self {
            Self::Mo => "Mo",
            Self::Di => "Di",
            Self::Mi => "Mi",
            Self::Do => "Do",
            Self::Fr => "Fr",
        }
    }

    #[must_use]
    pub const fn german_name(self) -> &'static str {
        match self {
            Self::Mo => "Montag",
            Self::Di => "Dienstag",
            Self::Mi => "Mittwoch",
            Self::Do => "Donnerstag",
            Self::Fr => "Freitag",
        }
    }

    /// Parses `Mo`, `Mo.`, `MONTAG`, `Montag, 14.10.` and similar day labels.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        let word = label
            .trim()
            .chars()
            .take_while(|ch| ch.is_alphabetic())
            .flat_map(char::to_lowercase)
            .collect::<String>();
        if word.chars().count() < 2 {
            return None;
        }

        Self::ALL
            .into_iter()
            .find(|day| day.german_name().to_lowercase().starts_with(&word))
    }

    #[must_use]
    pub fn from_chrono(day: chrono::Weekday) -> Option<Self> {
        Self::from_ordinal(day.num_days_from_monday())
    }
}

impl Display for Weekday {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_label())
    }
}

/// The two dish choices of one day, as cleaned word tokens.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DishPair {
    pub meat: Vec<String>,
    pub vegetarian: Vec<String>,
}

impl DishPair {
    #[must_use]
    pub fn new(meat: Vec<String>, vegetarian: Vec<String>) -> Self {
        Self { meat, vegetarian }
    }

    #[must_use]
    pub fn meat_text(&self) -> String {
        self.meat.join(" ")
    }

    #[must_use]
    pub fn vegetarian_text(&self) -> String {
        self.vegetarian.join(" ")
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.meat.is_empty() && self.vegetarian.is_empty()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyMenu {
    pub week_start: Option<NaiveDate>,
    pub days: BTreeMap<Weekday, DishPair>,
}

impl WeeklyMenu {
    /// Inserts the dishes of `day`, returning whatever was stored before.
    pub fn insert(&mut self, day: Weekday, dishes: DishPair) -> Option<DishPair> {
        self.days.insert(day, dishes)
    }

    #[must_use]
    pub fn get(&self, day: Weekday) -> Option<&DishPair> {
        self.days.get(&day)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Weekday, &DishPair)> {
        self.days.iter().map(|(day, dishes)| (*day, dishes))
    }

    #[must_use]
    pub fn date_of(&self, day: Weekday) -> Option<NaiveDate> {
        self.week_start?
            .checked_add_days(Days::new(u64::from(day.ordinal())))
    }
}

/// A run of text drawn at one position on the page, in PDF user space.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub x: f64,
    pub y: f64,
    pub font_size: f64,
}

/// A straight ruling line, normalized so that `x0 <= x1` and `y0 <= y1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Segment {
    #[must_use]
    pub fn new(ax: f64, ay: f64, bx: f64, by: f64) -> Self {
        Self {
            x0: ax.min(bx),
            y0: ay.min(by),
            x1: ax.max(bx),
            y1: ay.max(by),
        }
    }

    #[must_use]
    pub fn is_horizontal(&self, tolerance: f64) -> bool {
        self.y1 - self.y0 <= tolerance && self.x1 - self.x0 > tolerance
    }

    #[must_use]
    pub fn is_vertical(&self, tolerance: f64) -> bool {
        self.x1 - self.x0 <= tolerance && self.y1 - self.y0 > tolerance
    }
}

/// Decoded geometry of the first page of a menu document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageLayout {
    pub spans: Vec<TextSpan>,
    pub segments: Vec<Segment>,
}

/// Ordered raw cells of one table row, before normalization.
pub type RawTableRow = Vec<String>;

/// One row of the positional grid; `None` marks a blank cell.
pub type GridRow = Vec<Option<String>>;
