//! Time-of-day and day-of-week congestion heuristic.

use std::ops::RangeInclusive;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::Serialize;

/// Source of the current local time.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayPeriod {
    MorningPeak,
    LunchHour,
    EveningPeak,
    ActiveNight,
    OffPeak,
}

/// Checked in order; hours outside every band are off-peak.
const HOUR_BANDS: [(RangeInclusive<u32>, DayPeriod); 4] = [
    (7..=9, DayPeriod::MorningPeak),
    (12..=14, DayPeriod::LunchHour),
    (17..=19, DayPeriod::EveningPeak),
    (20..=22, DayPeriod::ActiveNight),
];

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        HOUR_BANDS
            .iter()
            .find(|(hours, _)| hours.contains(&hour))
            .map_or(DayPeriod::OffPeak, |(_, period)| *period)
    }

    pub fn factor(self) -> f64 {
        match self {
            DayPeriod::MorningPeak | DayPeriod::EveningPeak => 1.0,
            DayPeriod::LunchHour => 0.8,
            DayPeriod::ActiveNight => 0.6,
            DayPeriod::OffPeak => 0.3,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayPeriod::MorningPeak => "Morning peak",
            DayPeriod::LunchHour => "Lunch hour",
            DayPeriod::EveningPeak => "Evening peak",
            DayPeriod::ActiveNight => "Active night",
            DayPeriod::OffPeak => "Off-peak/overnight",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayKind {
    Workday,
    Saturday,
    Sunday,
}

impl DayKind {
    /// `weekday` counts from Monday = 0.
    pub fn from_weekday(weekday: u32) -> Self {
        match weekday {
            0..=4 => DayKind::Workday,
            5 => DayKind::Saturday,
            _ => DayKind::Sunday,
        }
    }

    pub fn factor(self) -> f64 {
        match self {
            DayKind::Workday => 1.0,
            DayKind::Saturday => 0.7,
            DayKind::Sunday => 0.5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DayKind::Workday => "Workday",
            DayKind::Saturday => "Saturday",
            DayKind::Sunday => "Sunday",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrafficTier {
    High,
    Medium,
    Low,
}

impl TrafficTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            TrafficTier::High
        } else if score >= 0.5 {
            TrafficTier::Medium
        } else {
            TrafficTier::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrafficTier::High => "High – congestion expected",
            TrafficTier::Medium => "Medium – moderate flow",
            TrafficTier::Low => "Low – free flow",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrafficEstimate {
    pub hour: u32,
    pub weekday: u32,
    pub period: DayPeriod,
    pub day_kind: DayKind,
    pub hour_factor: f64,
    pub day_factor: f64,
    /// `hour_factor × day_factor`, rounded to two decimals.
    pub score: f64,
    pub tier: TrafficTier,
}

pub fn estimate_traffic(hour: u32, weekday: u32) -> TrafficEstimate {
    let period = DayPeriod::from_hour(hour);
    let day_kind = DayKind::from_weekday(weekday);
    let score = period.factor() * day_kind.factor();

    TrafficEstimate {
        hour,
        weekday,
        period,
        day_kind,
        hour_factor: period.factor(),
        day_factor: day_kind.factor(),
        score: (score * 100.0).round() / 100.0,
        tier: TrafficTier::from_score(score),
    }
}

pub fn estimate_traffic_at(time: NaiveDateTime) -> TrafficEstimate {
    estimate_traffic(time.hour(), time.weekday().num_days_from_monday())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn wednesday_morning_is_high() {
        let e = estimate_traffic(8, 2);
        assert_eq!(e.period, DayPeriod::MorningPeak);
        assert_eq!(e.day_kind, DayKind::Workday);
        assert!(approx(e.hour_factor, 1.0));
        assert!(approx(e.day_factor, 1.0));
        assert!(approx(e.score, 1.0));
        assert_eq!(e.tier.label(), "High – congestion expected");
    }

    #[test]
    fn sunday_night_is_low() {
        let e = estimate_traffic(21, 6);
        assert_eq!(e.period, DayPeriod::ActiveNight);
        assert!(approx(e.hour_factor, 0.6));
        assert!(approx(e.day_factor, 0.5));
        assert!(approx(e.score, 0.3));
        assert_eq!(e.tier.label(), "Low – free flow");
    }

    #[test]
    fn band_edges() {
        assert_eq!(DayPeriod::from_hour(6), DayPeriod::OffPeak);
        assert_eq!(DayPeriod::from_hour(7), DayPeriod::MorningPeak);
        assert_eq!(DayPeriod::from_hour(9), DayPeriod::MorningPeak);
        assert_eq!(DayPeriod::from_hour(10), DayPeriod::OffPeak);
        assert_eq!(DayPeriod::from_hour(14), DayPeriod::LunchHour);
        assert_eq!(DayPeriod::from_hour(19), DayPeriod::EveningPeak);
        assert_eq!(DayPeriod::from_hour(22), DayPeriod::ActiveNight);
        assert_eq!(DayPeriod::from_hour(23), DayPeriod::OffPeak);
        assert_eq!(DayPeriod::from_hour(0), DayPeriod::OffPeak);
        assert_eq!(DayKind::from_weekday(4), DayKind::Workday);
        assert_eq!(DayKind::from_weekday(5), DayKind::Saturday);
    }

    #[test]
    fn tier_thresholds() {
        // Lunch on a workday sits exactly on the high threshold.
        assert_eq!(estimate_traffic(13, 0).tier, TrafficTier::High);
        assert_eq!(estimate_traffic(8, 5).tier, TrafficTier::Medium);
        assert_eq!(estimate_traffic(8, 6).tier, TrafficTier::Medium);
        assert_eq!(estimate_traffic(13, 6).tier, TrafficTier::Low);
        assert_eq!(estimate_traffic(3, 1).tier, TrafficTier::Low);
    }

    #[test]
    fn every_hour_and_day_is_deterministic_and_bounded() {
        for hour in 0..24 {
            for weekday in 0..7 {
                let e = estimate_traffic(hour, weekday);
                assert_eq!(e, estimate_traffic(hour, weekday));
                assert!(e.score >= 0.15 && e.score <= 1.0, "{hour}h day {weekday}: {}", e.score);
                assert!(approx(e.score, ((e.hour_factor * e.day_factor) * 100.0).round() / 100.0));
            }
        }
    }

    #[test]
    fn fixed_clock_drives_estimate() {
        // 2024-05-19 is a Sunday.
        let time = NaiveDate::from_ymd_opt(2024, 5, 19)
            .unwrap()
            .and_hms_opt(21, 15, 0)
            .unwrap();
        let clock = FixedClock(time);
        let e = estimate_traffic_at(clock.now());
        assert_eq!(e, estimate_traffic(21, 6));
    }
}
