use crate::models::{
    DayRecord, DeedEntry, DeedKind, DeedRequest, MagnitudeInput, Prayer, RamadanTotals, UserData,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const PRAYER_POINTS: i64 = 10;
pub const DAILY_PRAYERS: u32 = 5;

/// Largest magnitude accepted for points or pages.
const MAX_MAGNITUDE: f64 = 1_000_000.0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("points must be a positive whole number")]
    InvalidPoints,
    #[error("deed type must be 'good' or 'bad', got '{0}'")]
    UnknownDeedKind(String),
    #[error("unknown prayer '{0}'")]
    UnknownPrayer(String),
    #[error("dua text must not be empty")]
    EmptyDua,
    #[error("select a surah")]
    MissingSurah,
    #[error("pages must be a positive whole number")]
    InvalidPages,
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}

/// A validated deed, ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct DeedDraft {
    pub description: String,
    pub points: i64,
    pub kind: DeedKind,
}

impl DeedDraft {
    pub fn new(
        description: &str,
        magnitude: &MagnitudeInput,
        kind: &str,
    ) -> Result<Self, ValidationError> {
        let description = description.trim();
        if description.is_empty() {
            return Err(ValidationError::EmptyDescription);
        }
        let magnitude = parse_magnitude(magnitude).ok_or(ValidationError::InvalidPoints)?;
        let kind: DeedKind = kind.parse().map_err(ValidationError::UnknownDeedKind)?;

        Ok(Self {
            description: description.to_string(),
            points: signed_points(kind, magnitude),
            kind,
        })
    }

    pub fn into_entry(self, created_at: i64) -> DeedEntry {
        DeedEntry {
            description: self.description,
            points: self.points,
            kind: self.kind,
            created_at,
        }
    }
}

impl DeedRequest {
    pub fn to_draft(&self) -> Result<DeedDraft, ValidationError> {
        let missing = MagnitudeInput::Other(serde_json::Value::Null);
        DeedDraft::new(
            self.description.as_deref().unwrap_or_default(),
            self.points.as_ref().unwrap_or(&missing),
            self.kind.as_deref().unwrap_or_default(),
        )
    }
}

pub fn signed_points(kind: DeedKind, magnitude: i64) -> i64 {
    match kind {
        DeedKind::Good => magnitude,
        DeedKind::Bad => -magnitude,
    }
}

/// Parses a strictly positive whole number. Fractions, zero, negatives and
/// non-numeric text are rejected.
pub fn parse_magnitude(input: &MagnitudeInput) -> Option<i64> {
    let value = match input {
        MagnitudeInput::Number(value) => *value,
        MagnitudeInput::Text(text) => text.trim().parse::<f64>().ok()?,
        MagnitudeInput::Other(_) => return None,
    };
    if !value.is_finite() || value <= 0.0 || value.fract() != 0.0 || value > MAX_MAGNITUDE {
        return None;
    }
    Some(value as i64)
}

/// Rounds half up, the way browser `Math.round` does (`-2.5` becomes `-2`).
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

pub fn completion_percent(total_prayers: u32, days: u32) -> u8 {
    if days == 0 {
        return 0;
    }
    let expected = f64::from(days) * f64::from(DAILY_PRAYERS);
    round_half_up(100.0 * f64::from(total_prayers) / expected).clamp(0, 100) as u8
}

pub fn average_score(total_score: i64, days: u32) -> i64 {
    if days == 0 {
        return 0;
    }
    round_half_up(total_score as f64 / f64::from(days))
}

impl DayRecord {
    pub fn is_done(&self, prayer: Prayer) -> bool {
        self.prayers.get(&prayer).copied().unwrap_or(false)
    }

    pub fn prayers_done(&self) -> u32 {
        self.prayers.values().filter(|done| **done).count() as u32
    }

    pub fn prayer_score(&self) -> i64 {
        i64::from(self.prayers_done()) * PRAYER_POINTS
    }

    pub fn deed_score(&self) -> i64 {
        self.deeds.values().map(|deed| deed.points).sum()
    }

    pub fn computed_score(&self) -> i64 {
        self.prayer_score() + self.deed_score()
    }

    /// Returns `false` when the prayer was already marked, leaving the day untouched.
    pub fn mark_prayer(&mut self, prayer: Prayer) -> bool {
        if self.is_done(prayer) {
            return false;
        }
        self.prayers.insert(prayer, true);
        true
    }

    /// Returns `false` when the prayer was not marked.
    pub fn revoke_prayer(&mut self, prayer: Prayer) -> bool {
        self.prayers.remove(&prayer).unwrap_or(false)
    }

    /// Replaces the mutable fields of a deed; the creation time is kept.
    pub fn edit_deed(&mut self, id: &str, draft: DeedDraft) -> Option<&DeedEntry> {
        let entry = self.deeds.get_mut(id)?;
        let created_at = entry.created_at;
        *entry = draft.into_entry(created_at);
        Some(entry)
    }

    pub fn refresh_score(&mut self) {
        self.score = self.computed_score();
    }
}

impl UserData {
    /// Rewrites every day score and the running totals from the raw records.
    pub fn refresh_totals(&mut self) {
        let mut totals = RamadanTotals::default();
        for day in self.days.values_mut() {
            day.refresh_score();
            totals.prayers += i64::from(day.prayers_done());
            totals.score += day.score;
        }
        self.ramadan_totals = totals;
    }
}

/// Profile tier earned from the lifetime score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Murid,
    Abid,
    Muttaqi,
    Hafiz,
}

impl Rank {
    pub fn for_score(score: i64) -> Self {
        match score {
            s if s >= 500 => Rank::Hafiz,
            s if s >= 300 => Rank::Muttaqi,
            s if s >= 150 => Rank::Abid,
            _ => Rank::Murid,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Rank::Murid => "Murid",
            Rank::Abid => "Abid",
            Rank::Muttaqi => "Muttaqi",
            Rank::Hafiz => "Hafiz",
        }
    }
}
