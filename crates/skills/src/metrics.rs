//! Shared numeric routines, so every skill reports change, trend and aging the
//! same way.

use serde::Serialize;

/// Changes within ±5 % read as stable.
pub const TREND_THRESHOLD: f64 = 5.0;

/// Round half away from zero to `decimals` places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

/// Percentage change from `previous` to `current`, one decimal.
///
/// From a zero baseline, any growth reads as 100 % and no growth has no defined
/// change.
pub fn percentage_change(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        return (current > 0.0).then_some(100.0);
    }
    Some(round_to((current - previous) / previous * 100.0, 1))
}

/// `part` as a percentage of `total`, one decimal; `None` when `total` is zero.
pub fn share_of(part: f64, total: f64) -> Option<f64> {
    if total == 0.0 {
        return None;
    }
    Some(round_to(part / total * 100.0, 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn from_change(change: Option<f64>) -> Self {
        match change {
            Some(c) if c > TREND_THRESHOLD => Trend::Up,
            Some(c) if c < -TREND_THRESHOLD => Trend::Down,
            _ => Trend::Stable,
        }
    }
}

/// A metric in two periods.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Change {
    pub current: f64,
    pub previous: f64,
    pub change_pct: Option<f64>,
    pub trend: Trend,
}

impl Change {
    pub fn between(current: f64, previous: f64) -> Self {
        let change_pct = percentage_change(current, previous);
        Self {
            current,
            previous,
            change_pct,
            trend: Trend::from_change(change_pct),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AgingBucket {
    #[serde(rename = "0-30")]
    UpTo30,
    #[serde(rename = "31-60")]
    Days31To60,
    #[serde(rename = "61-90")]
    Days61To90,
    #[serde(rename = "90+")]
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 4] = [
        AgingBucket::UpTo30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// Negative ages (not yet due) land in the first bucket.
    pub fn for_age(days: i64) -> Self {
        match days {
            ..=30 => AgingBucket::UpTo30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::UpTo30 => "0-30",
            AgingBucket::Days31To60 => "31-60",
            AgingBucket::Days61To90 => "61-90",
            AgingBucket::Over90 => "90+",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BucketTotal {
    pub bucket: AgingBucket,
    pub amount: f64,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgingReport {
    /// Always all four buckets, youngest first.
    pub buckets: Vec<BucketTotal>,
    pub total: f64,
    pub weighted_average_age: Option<i64>,
}

/// Bucket `(amount, age_in_days)` items and compute the amount-weighted age.
pub fn age_items(items: &[(f64, i64)]) -> AgingReport {
    let mut buckets: Vec<BucketTotal> = AgingBucket::ALL
        .iter()
        .map(|&bucket| BucketTotal {
            bucket,
            amount: 0.0,
            count: 0,
        })
        .collect();

    for &(amount, age) in items {
        let slot = AgingBucket::for_age(age) as usize;
        buckets[slot].amount += amount;
        buckets[slot].count += 1;
    }
    for b in &mut buckets {
        b.amount = round_to(b.amount, 2);
    }

    AgingReport {
        total: round_to(items.iter().map(|(a, _)| a).sum(), 2),
        weighted_average_age: weighted_average_age(items),
        buckets,
    }
}

/// `Σ(age × amount) / Σ(amount)` rounded to whole days; `None` without any
/// amount to weigh. Ages below zero count as zero.
pub fn weighted_average_age(items: &[(f64, i64)]) -> Option<i64> {
    let weight: f64 = items.iter().map(|(a, _)| a).sum();
    if weight == 0.0 {
        return None;
    }
    let weighted: f64 = items.iter().map(|&(a, age)| a * age.max(0) as f64).sum();
    Some((weighted / weight).round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn percentage_change_reference_values() {
        assert_eq!(percentage_change(100_000.0, 50_000.0), Some(100.0));
        assert_eq!(percentage_change(0.0, 0.0), None);
        assert_eq!(percentage_change(5_000.0, 0.0), Some(100.0));
        assert_eq!(percentage_change(40_000.0, 100_000.0), Some(-60.0));
        assert_eq!(percentage_change(103.0, 100.0), Some(3.0));
        assert_eq!(percentage_change(1.0, 3.0), Some(-66.7));
    }

    #[test]
    fn trends_follow_the_threshold() {
        assert_eq!(Change::between(0.0, 0.0).trend, Trend::Stable);
        assert_eq!(Change::between(5_000.0, 0.0).trend, Trend::Up);
        assert_eq!(Change::between(40_000.0, 100_000.0).trend, Trend::Down);
        assert_eq!(Trend::from_change(Some(5.0)), Trend::Stable);
        assert_eq!(Trend::from_change(Some(-5.1)), Trend::Down);
    }

    #[test]
    fn weighted_age_is_not_the_plain_mean() {
        let items = [(5_000.0, 10), (1_000.0, 100)];
        assert_eq!(weighted_average_age(&items), Some(25));
        assert_eq!(weighted_average_age(&[]), None);
    }

    #[test]
    fn buckets_are_inclusive_at_the_upper_edge() {
        assert_eq!(AgingBucket::for_age(-4), AgingBucket::UpTo30);
        assert_eq!(AgingBucket::for_age(30), AgingBucket::UpTo30);
        assert_eq!(AgingBucket::for_age(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_age(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_age(91), AgingBucket::Over90);
    }

    #[test]
    fn aging_report_keeps_every_bucket() {
        let report = age_items(&[(100.0, 5), (50.0, 95), (25.5, 45)]);
        assert_eq!(report.buckets.len(), 4);
        assert_eq!(report.buckets[0].amount, 100.0);
        assert_eq!(report.buckets[1].amount, 25.5);
        assert_eq!(report.buckets[2].count, 0);
        assert_eq!(report.buckets[3].amount, 50.0);
        assert_eq!(report.total, 175.5);
        let v = serde_json::to_value(&report.buckets[3]).unwrap();
        assert_eq!(v["bucket"], "90+");
    }

    #[test]
    fn shares() {
        assert_eq!(share_of(25.0, 200.0), Some(12.5));
        assert_eq!(share_of(1.0, 0.0), None);
        assert_eq!(round_to(2.346, 2), 2.35);
        assert_eq!(round_to(-2.5, 0), -3.0);
    }

    proptest! {
        #[test]
        fn change_from_positive_baseline_is_defined(cur in 0.0f64..1e9, prev in 1.0f64..1e9) {
            let c = percentage_change(cur, prev).unwrap();
            prop_assert!(c >= -100.0);
            prop_assert_eq!(Trend::from_change(Some(c)) == Trend::Up, c > TREND_THRESHOLD);
        }

        #[test]
        fn weighted_age_lies_between_extremes(
            items in proptest::collection::vec((0.01f64..1e6, 0i64..400), 1..30)
        ) {
            let avg = weighted_average_age(&items).unwrap();
            let min = items.iter().map(|(_, a)| *a).min().unwrap();
            let max = items.iter().map(|(_, a)| *a).max().unwrap();
            prop_assert!(min <= avg && avg <= max);
        }

        #[test]
        fn bucket_amounts_sum_to_total(
            items in proptest::collection::vec((0i64..100_000, -30i64..400), 0..30)
        ) {
            let items: Vec<(f64, i64)> = items.into_iter().map(|(c, a)| (c as f64 / 100.0, a)).collect();
            let report = age_items(&items);
            let bucket_sum: f64 = report.buckets.iter().map(|b| b.amount).sum();
            prop_assert!((bucket_sum - report.total).abs() < 0.05);
            prop_assert_eq!(report.buckets.iter().map(|b| b.count).sum::<u64>(), items.len() as u64);
        }
    }
}
