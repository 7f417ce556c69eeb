use crate::models::{
    BestDay, DailyPoint, DayRecord, DayView, DeedView, PrayerStatus, ProfileResponse, Prayer,
    RecentDeed, StatsResponse, Summary, WeeklyAveragePoint, WeeklyPoint,
};
use crate::scoring::{average_score, completion_percent, Rank, ValidationError};
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

const RECENT_DEED_LIMIT: usize = 6;

pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

pub fn parse_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(value.to_string()))
}

/// Aggregates every tracked day. Keys are ISO dates, so map order is date order.
pub fn summarize(days: &BTreeMap<String, DayRecord>) -> Summary {
    let mut total_prayers = 0u32;
    let mut total_score = 0i64;
    let mut good_deeds = 0u32;
    let mut bad_deeds = 0u32;
    let mut best_day: Option<BestDay> = None;

    for (date, day) in days {
        let score = day.computed_score();
        total_prayers += day.prayers_done();
        total_score += score;

        if best_day.as_ref().is_none_or(|best| score > best.score) {
            best_day = Some(BestDay {
                date: date.clone(),
                score,
            });
        }

        for deed in day.deeds.values() {
            if deed.points > 0 {
                good_deeds += 1;
            } else {
                bad_deeds += 1;
            }
        }
    }

    let total_days = days.len() as u32;
    Summary {
        total_days,
        total_prayers,
        total_score,
        prayer_completion: completion_percent(total_prayers, total_days),
        avg_score_per_day: average_score(total_score, total_days),
        best_day,
        good_deeds,
        bad_deeds,
    }
}

pub fn build_profile(days: &BTreeMap<String, DayRecord>) -> ProfileResponse {
    let summary = summarize(days);
    let rank = Rank::for_score(summary.total_score);

    let mut recent_deeds: Vec<(&String, &crate::models::DeedEntry)> = days
        .iter()
        .flat_map(|(date, day)| day.deeds.values().map(move |deed| (date, deed)))
        .collect();
    recent_deeds.sort_by(|(a_date, a), (b_date, b)| {
        b_date.cmp(a_date).then(b.created_at.cmp(&a.created_at))
    });

    let recent_deeds = recent_deeds
        .into_iter()
        .take(RECENT_DEED_LIMIT)
        .map(|(date, deed)| RecentDeed {
            date: date.clone(),
            description: deed.description.clone(),
            points: deed.points,
            kind: deed.kind,
        })
        .collect();

    ProfileResponse {
        summary,
        rank,
        recent_deeds,
    }
}

/// Calendar view of a single day; a date with no record renders as empty.
pub fn day_view(date: &str, day: &DayRecord) -> DayView {
    let prayers = Prayer::ALL
        .iter()
        .map(|prayer| PrayerStatus {
            name: *prayer,
            done: day.is_done(*prayer),
        })
        .collect();

    let mut deeds: Vec<DeedView> = day
        .deeds
        .iter()
        .map(|(id, deed)| DeedView {
            id: id.clone(),
            description: deed.description.clone(),
            points: deed.points,
            kind: deed.kind,
            created_at: deed.created_at,
        })
        .collect();
    deeds.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    let (good_deeds, bad_deeds): (Vec<DeedView>, Vec<DeedView>) = deeds.into_iter().partition(|deed| deed.points > 0);

    DayView {
        date: date.to_string(),
        prayers,
        prayers_done: day.prayers_done(),
        prayer_score: day.prayer_score(),
        deed_score: day.deed_score(),
        score: day.computed_score(),
        good_deeds,
        bad_deeds,
    }
}

pub fn build_stats_at(today: NaiveDate, days: &BTreeMap<String, DayRecord>) -> StatsResponse {
    const WEEK_COUNT: usize = 8;

    let day_totals = |date: NaiveDate| {
        days.get(&date_key(date))
            .map(|day| (day.prayers_done(), day.computed_score()))
            .unwrap_or((0, 0))
    };

    let mut last_7_days = Vec::with_capacity(7);
    for offset in (0..7).rev() {
        let date = today - Duration::days(offset as i64);
        let (prayers_done, score) = day_totals(date);
        last_7_days.push(DailyPoint {
            date: date_key(date),
            prayers_done,
            score,
        });
    }

    let current_week_start = week_start(today);
    let mut weekly_totals = Vec::with_capacity(WEEK_COUNT);
    let mut weekly_averages = Vec::with_capacity(WEEK_COUNT);

    for offset in (0..WEEK_COUNT).rev() {
        let start = current_week_start - Duration::weeks(offset as i64);
        let end = start + Duration::days(6);

        let mut prayer_sum = 0u32;
        let mut score_sum = 0i64;
        for day_offset in 0..7 {
            let (prayers_done, score) = day_totals(start + Duration::days(day_offset));
            prayer_sum += prayers_done;
            score_sum += score;
        }

        let days_counted = if today < start {
            0
        } else if today > end {
            7
        } else {
            (today - start).num_days() as u8 + 1
        };
        let denom = if days_counted == 0 { 1.0 } else { f64::from(days_counted) };

        weekly_totals.push(WeeklyPoint {
            week: week_label(start),
            start_date: date_key(start),
            end_date: date_key(end),
            prayers_done: prayer_sum,
            score: score_sum,
        });

        weekly_averages.push(WeeklyAveragePoint {
            week: week_label(start),
            days_counted,
            avg_prayers: f64::from(prayer_sum) / denom,
            avg_score: score_sum as f64 / denom,
        });
    }

    StatsResponse {
        last_7_days,
        weekly_totals,
        weekly_averages,
    }
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_monday() as i64)
}

fn week_label(date: NaiveDate) -> String {
    let iso = date.iso_week();
    format!("{}-W{:02}", iso.year(), iso.week())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DeedEntry, DeedKind};

    fn day_with(prayers: &[Prayer], deeds: &[(&str, i64, i64)]) -> DayRecord {
        let mut day = DayRecord::default();
        for prayer in prayers {
            day.mark_prayer(*prayer);
        }
        for (id, points, created_at) in deeds {
            day.deeds.insert(
                id.to_string(),
                DeedEntry {
                    description: format!("deed {id}"),
                    points: *points,
                    kind: if *points > 0 { DeedKind::Good } else { DeedKind::Bad },
                    created_at: *created_at,
                },
            );
        }
        day
    }

    #[test]
    fn summary_of_no_days_is_zero() {
        let summary = summarize(&BTreeMap::new());
        assert_eq!(summary.total_days, 0);
        assert_eq!(summary.prayer_completion, 0);
        assert_eq!(summary.avg_score_per_day, 0);
        assert_eq!(summary.best_day, None);
    }

    #[test]
    fn summary_counts_prayers_across_days() {
        let mut days = BTreeMap::new();
        days.insert("2026-03-01".to_string(), day_with(&Prayer::ALL, &[]));
        days.insert(
            "2026-03-02".to_string(),
            day_with(&[Prayer::Fajr, Prayer::Asr, Prayer::Isha], &[]),
        );
        days.insert(
            "2026-03-03".to_string(),
            day_with(&[Prayer::Fajr, Prayer::Dhuhr, Prayer::Asr, Prayer::Isha], &[]),
        );

        let summary = summarize(&days);
        assert_eq!(summary.total_prayers, 12);
        assert_eq!(summary.prayer_completion, 80);
        assert_eq!(summary.total_score, 120);
        assert_eq!(summary.avg_score_per_day, 40);
        assert_eq!(
            summary.best_day,
            Some(BestDay { date: "2026-03-01".to_string(), score: 50 })
        );
    }

    #[test]
    fn best_day_ties_go_to_earliest_date() {
        let mut days = BTreeMap::new();
        days.insert("2026-03-05".to_string(), day_with(&[Prayer::Fajr], &[]));
        days.insert("2026-03-02".to_string(), day_with(&[], &[("a", 10, 1)]));
        days.insert("2026-03-04".to_string(), day_with(&[], &[("b", -3, 1)]));

        let best = summarize(&days).best_day.unwrap();
        assert_eq!(best.date, "2026-03-02");
        assert_eq!(best.score, 10);
    }

    #[test]
    fn zero_point_deeds_count_as_bad() {
        let mut days = BTreeMap::new();
        days.insert(
            "2026-03-01".to_string(),
            day_with(&[], &[("a", 5, 1), ("b", 0, 2), ("c", -2, 3)]),
        );
        let summary = summarize(&days);
        assert_eq!(summary.good_deeds, 1);
        assert_eq!(summary.bad_deeds, 2);
    }

    #[test]
    fn profile_lists_newest_deeds_first_and_caps_them() {
        let mut days = BTreeMap::new();
        days.insert(
            "2026-03-01".to_string(),
            day_with(&[], &[("a", 100, 1), ("b", 100, 2), ("c", 100, 3)]),
        );
        days.insert(
            "2026-03-02".to_string(),
            day_with(&[], &[("d", 5, 1), ("e", 5, 2), ("f", 5, 3), ("g", -5, 4)]),
        );

        let profile = build_profile(&days);
        assert_eq!(profile.recent_deeds.len(), RECENT_DEED_LIMIT);
        assert_eq!(profile.recent_deeds[0].description, "deed g");
        assert_eq!(profile.recent_deeds[4].description, "deed c");
        assert_eq!(profile.summary.total_score, 310);
        assert_eq!(profile.rank, Rank::Muttaqi);
    }

    #[test]
    fn day_view_splits_deeds_and_lists_all_prayers() {
        let day = day_with(&[Prayer::Fajr, Prayer::Dhuhr], &[("x", -5, 20), ("y", 15, 10)]);
        let view = day_view("2026-03-01", &day);

        assert_eq!(view.prayers.len(), 5);
        assert!(view.prayers[0].done);
        assert!(!view.prayers[4].done);
        assert_eq!(view.deed_score, 10);
        assert_eq!(view.prayer_score, 20);
        assert_eq!(view.score, 30);
        assert_eq!(view.good_deeds[0].id, "y");
        assert_eq!(view.bad_deeds[0].id, "x");
    }

    #[test]
    fn stats_last_7_days_includes_each_day() {
        let mut days = BTreeMap::new();
        let today = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let two_days_ago = today - Duration::days(2);
        days.insert(
            date_key(two_days_ago),
            day_with(&[Prayer::Fajr, Prayer::Isha], &[("a", 3, 1)]),
        );

        let stats = build_stats_at(today, &days);
        assert_eq!(stats.last_7_days.len(), 7);
        let point = stats
            .last_7_days
            .iter()
            .find(|day| day.date == date_key(two_days_ago))
            .expect("missing day");
        assert_eq!(point.prayers_done, 2);
        assert_eq!(point.score, 23);
    }

    #[test]
    fn stats_weekly_series_lengths() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        let stats = build_stats_at(today, &BTreeMap::new());
        assert_eq!(stats.weekly_totals.len(), 8);
        assert_eq!(stats.weekly_averages.len(), 8);
        // 2026-03-05 is a Thursday
        assert_eq!(stats.weekly_averages[7].days_counted, 4);
    }

    #[test]
    fn parse_date_rejects_other_formats() {
        assert!(parse_date("2026-03-05").is_ok());
        assert_eq!(
            parse_date("05/03/2026"),
            Err(ValidationError::InvalidDate("05/03/2026".to_string()))
        );
    }
}
