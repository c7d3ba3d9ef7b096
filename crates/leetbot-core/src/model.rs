use crate::clock::Clock;
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a daily task: the UTC calendar date as `YYYYMMDD` digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DayKey(u32);

impl DayKey {
    pub fn from_date(date: NaiveDate) -> Self {
        // Years before 0 never reach us; month and day are at most two digits.
        let year = date.year().max(0) as u32;
        Self(year * 10_000 + date.month() * 100 + date.day())
    }

    /// Today's key according to `clock`, in UTC.
    pub fn today(clock: &dyn Clock) -> Self {
        Self::from_date(clock.now().date_naive())
    }

    /// Wrap a raw value, rejecting numbers that are not a calendar date.
    pub fn from_raw(raw: u32) -> Option<Self> {
        let key = Self(raw);
        key.date().map(|_| key)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// The calendar date this key was derived from.
    pub fn date(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt((self.0 / 10_000) as i32, self.0 / 100 % 100, self.0 % 100)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task difficulty as reported by the provider.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
    #[default]
    Unknown,
}

impl Difficulty {
    /// Parse the provider's label. Anything unrecognised is `Unknown`.
    pub fn parse(label: &str) -> Self {
        match label {
            "Easy" => Self::Easy,
            "Medium" => Self::Medium,
            "Hard" => Self::Hard,
            _ => Self::Unknown,
        }
    }

    /// Numeric code used by the durable store.
    pub fn code(self) -> u8 {
        match self {
            Self::Easy => 0,
            Self::Medium => 1,
            Self::Hard => 2,
            Self::Unknown => 3,
        }
    }

    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::Easy,
            1 => Self::Medium,
            2 => Self::Hard,
            _ => Self::Unknown,
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::Unknown => "Not known",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The challenge for one calendar day.
///
/// Immutable once created; a later save for the same key replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub day_key: DayKey,
    pub question_id: u64,
    pub title: String,
    pub content: String,
    /// Ordered; hint N is always addressed by index.
    pub hints: Vec<String>,
    pub difficulty: Difficulty,
    /// Provider reference used to build links to the problem page.
    pub title_slug: String,
}

impl Task {
    pub fn hint(&self, index: usize) -> Option<&str> {
        self.hints.get(index).map(String::as_str)
    }

    /// The text delivered to subscribers.
    pub fn text(&self) -> String {
        format!("<strong>{}</strong>\n\n{}", self.title, self.content)
    }

    /// Link to the problem page under `problems_base`.
    pub fn url(&self, problems_base: &str) -> String {
        format!("{}/{}", problems_base.trim_end_matches('/'), self.title_slug)
    }
}

/// A recipient and their subscription state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Stable identity on the chat platform.
    pub id: i64,
    /// Where messages are delivered. May differ from `id`.
    pub chat_id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub subscribed: bool,
    /// Meaningless while `subscribed` is false.
    pub sending_hour: u8,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_day_key_from_date() {
        let date = NaiveDate::from_ymd_opt(2021, 12, 31).unwrap();
        assert_eq!(DayKey::from_date(date).get(), 20211231);
        let date = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();
        assert_eq!(DayKey::from_date(date).get(), 20230605);
    }

    #[test]
    fn test_day_key_uses_utc_date() {
        // 23:30 at UTC-5 on the 14th is already the 15th in UTC.
        let clock = FixedClock::new(Utc.with_ymd_and_hms(2023, 6, 15, 4, 30, 0).unwrap());
        assert_eq!(DayKey::today(&clock).get(), 20230615);
    }

    #[test]
    fn test_day_key_round_trip_and_ordering() {
        let key = DayKey::from_raw(20240229).unwrap();
        assert_eq!(key.date(), NaiveDate::from_ymd_opt(2024, 2, 29));
        assert!(DayKey::from_raw(20230229).is_none());
        assert!(DayKey::from_raw(20231301).is_none());
        assert!(DayKey::from_raw(20231231).unwrap() < DayKey::from_raw(20240101).unwrap());
        assert_eq!(key.to_string(), "20240229");
    }

    #[test]
    fn test_difficulty_codes() {
        for d in [
            Difficulty::Easy,
            Difficulty::Medium,
            Difficulty::Hard,
            Difficulty::Unknown,
        ] {
            assert_eq!(Difficulty::from_code(d.code()), d);
        }
        assert_eq!(Difficulty::from_code(42), Difficulty::Unknown);
        assert_eq!(Difficulty::parse("Medium"), Difficulty::Medium);
        assert_eq!(Difficulty::parse("insane"), Difficulty::Unknown);
        assert_eq!(Difficulty::Unknown.to_string(), "Not known");
    }

    #[test]
    fn test_task_text_and_hints() {
        let task = Task {
            day_key: DayKey::from_raw(20230615).unwrap(),
            question_id: 1,
            title: "Two Sum".into(),
            content: "Find them.".into(),
            hints: vec!["a".into(), "b".into()],
            difficulty: Difficulty::Easy,
            title_slug: "two-sum".into(),
        };
        assert_eq!(task.text(), "<strong>Two Sum</strong>\n\nFind them.");
        assert_eq!(task.hint(1), Some("b"));
        assert_eq!(task.hint(2), None);
        assert_eq!(
            task.url("https://leetcode.com/problems/"),
            "https://leetcode.com/problems/two-sum"
        );
    }
}
