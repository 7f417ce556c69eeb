use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// The five daily prayers, in the order they fall during the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Prayer::Fajr => "Fajr",
            Prayer::Dhuhr => "Dhuhr",
            Prayer::Asr => "Asr",
            Prayer::Maghrib => "Maghrib",
            Prayer::Isha => "Isha",
        }
    }
}

impl fmt::Display for Prayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Prayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" => Ok(Prayer::Fajr),
            "dhuhr" | "zuhr" => Ok(Prayer::Dhuhr),
            "asr" => Ok(Prayer::Asr),
            "maghrib" => Ok(Prayer::Maghrib),
            "isha" => Ok(Prayer::Isha),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeedKind {
    Good,
    Bad,
}

impl FromStr for DeedKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "good" => Ok(DeedKind::Good),
            "bad" => Ok(DeedKind::Bad),
            _ => Err(s.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeedEntry {
    pub description: String,
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: DeedKind,
    pub created_at: i64,
}

/// Everything tracked for one calendar date, stored at `days/{YYYY-MM-DD}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(
        default,
        deserialize_with = "known_prayers",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub prayers: BTreeMap<Prayer, bool>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub deeds: BTreeMap<String, DeedEntry>,
    #[serde(default)]
    pub score: i64,
}

/// Keeps only recognised prayer names with boolean flags. Anything else in a
/// stored day is dropped and disappears on the next write of that user.
fn known_prayers<'de, D>(deserializer: D) -> Result<BTreeMap<Prayer, bool>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(name, done)| Some((name.parse::<Prayer>().ok()?, done.as_bool()?)))
        .collect())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamadanTotals {
    #[serde(default)]
    pub prayers: i64,
    #[serde(default)]
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuaEntry {
    pub text: String,
    pub created_at: i64,
}

/// Pages read per surah, keyed by date and then by surah name.
pub type QuranLog = BTreeMap<String, BTreeMap<String, u32>>;

/// The document stored under `users/{uid}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub days: BTreeMap<String, DayRecord>,
    #[serde(default)]
    pub ramadan_totals: RamadanTotals,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub duas: BTreeMap<String, DuaEntry>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub quran: QuranLog,
}

impl UserData {
    pub fn from_snapshot(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value)
    }
}

/// A point or page count as typed by the user; forms send text, JSON clients
/// usually send numbers. Anything else lands in `Other` and fails validation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum MagnitudeInput {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

/// Fields are optional so a missing or `null` value is reported as a
/// validation error rather than a decode failure.
#[derive(Debug, Deserialize)]
pub struct DeedRequest {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub points: Option<MagnitudeInput>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DeedForm {
    pub description: String,
    pub points: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct DuaRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct QuranRequest {
    #[serde(default)]
    pub surah: Option<String>,
    #[serde(default)]
    pub pages: Option<MagnitudeInput>,
}

#[derive(Debug, Deserialize)]
pub struct WatchQuery {
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrayerStatus {
    pub name: Prayer,
    pub done: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeedView {
    pub id: String,
    pub description: String,
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: DeedKind,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub date: String,
    pub prayers: Vec<PrayerStatus>,
    pub prayers_done: u32,
    pub prayer_score: i64,
    pub deed_score: i64,
    pub score: i64,
    pub good_deeds: Vec<DeedView>,
    pub bad_deeds: Vec<DeedView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BestDay {
    pub date: String,
    pub score: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_days: u32,
    pub total_prayers: u32,
    pub total_score: i64,
    pub prayer_completion: u8,
    pub avg_score_per_day: i64,
    pub best_day: Option<BestDay>,
    pub good_deeds: u32,
    pub bad_deeds: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecentDeed {
    pub date: String,
    pub description: String,
    pub points: i64,
    #[serde(rename = "type")]
    pub kind: DeedKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileResponse {
    #[serde(flatten)]
    pub summary: Summary,
    pub rank: crate::scoring::Rank,
    pub recent_deeds: Vec<RecentDeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuaView {
    pub id: String,
    pub text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuranProgressResponse {
    pub days: QuranLog,
    pub total_pages: u64,
}

#[derive(Debug, Serialize)]
pub struct DailyPoint {
    pub date: String,
    pub prayers_done: u32,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyPoint {
    pub week: String,
    pub start_date: String,
    pub end_date: String,
    pub prayers_done: u32,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct WeeklyAveragePoint {
    pub week: String,
    pub days_counted: u8,
    pub avg_prayers: f64,
    pub avg_score: f64,
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub last_7_days: Vec<DailyPoint>,
    pub weekly_totals: Vec<WeeklyPoint>,
    pub weekly_averages: Vec<WeeklyAveragePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn day_record_reads_stored_layout() {
        let value = json!({
            "prayers": { "Fajr": true, "Isha": true },
            "deeds": {
                "a1": { "description": "Fed a neighbour", "points": 15, "type": "good", "createdAt": 1700000000000i64 }
            },
            "score": 35
        });

        let day: DayRecord = serde_json::from_value(value).unwrap();
        assert_eq!(day.prayers.get(&Prayer::Fajr), Some(&true));
        assert_eq!(day.deeds["a1"].kind, DeedKind::Good);
        assert_eq!(day.deeds["a1"].created_at, 1_700_000_000_000);
        assert_eq!(day.score, 35);
    }

    #[test]
    fn empty_collections_are_not_written() {
        let value = serde_json::to_value(DayRecord::default()).unwrap();
        assert_eq!(value, json!({ "score": 0 }));
    }

    #[test]
    fn user_data_from_null_snapshot_is_empty() {
        let data = UserData::from_snapshot(serde_json::Value::Null).unwrap();
        assert_eq!(data, UserData::default());
    }

    #[test]
    fn prayer_names_parse_case_insensitively() {
        assert_eq!("maghrib".parse::<Prayer>(), Ok(Prayer::Maghrib));
        assert_eq!("Zuhr".parse::<Prayer>(), Ok(Prayer::Dhuhr));
        assert!("Tahajjud".parse::<Prayer>().is_err());
    }

    #[test]
    fn magnitude_accepts_numbers_and_text() {
        let from_number: MagnitudeInput = serde_json::from_value(json!(12)).unwrap();
        let from_text: MagnitudeInput = serde_json::from_value(json!("12")).unwrap();
        assert_eq!(from_number, MagnitudeInput::Number(12.0));
        assert_eq!(from_text, MagnitudeInput::Text("12".to_string()));
    }

    #[test]
    fn deed_request_tolerates_missing_and_null_fields() {
        let missing: DeedRequest =
            serde_json::from_value(json!({ "description": "x", "type": "good" })).unwrap();
        assert_eq!(missing.points, None);

        let null: DeedRequest =
            serde_json::from_value(json!({ "description": null, "points": null })).unwrap();
        assert_eq!(null.description, None);
        assert_eq!(null.points, None);
        assert_eq!(null.kind, None);

        let flag: DeedRequest =
            serde_json::from_value(json!({ "description": "x", "points": true, "type": "good" }))
                .unwrap();
        assert_eq!(flag.points, Some(MagnitudeInput::Other(json!(true))));
    }

    #[test]
    fn unknown_prayer_keys_are_dropped() {
        let value = json!({
            "prayers": { "Fajr": true, "Tahajjud": true, "Isha": "yes" },
            "score": 10
        });
        let day: DayRecord = serde_json::from_value(value).unwrap();
        assert_eq!(day.prayers.len(), 1);
        assert_eq!(day.prayers.get(&Prayer::Fajr), Some(&true));

        let null_prayers: DayRecord = serde_json::from_value(json!({ "prayers": null })).unwrap();
        assert!(null_prayers.prayers.is_empty());
    }
}
