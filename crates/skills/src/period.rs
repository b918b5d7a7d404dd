//! Reporting periods.

use core::fmt;
use std::str::FromStr;

use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::result::SkillError;
use crate::schema::{FieldSpec, InputSchema};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PeriodPreset {
    Today,
    Yesterday,
    ThisWeek,
    LastWeek,
    ThisMonth,
    LastMonth,
    ThisQuarter,
    LastQuarter,
    ThisYear,
    LastYear,
    Last7Days,
    Last30Days,
    Last90Days,
}

impl PeriodPreset {
    pub const ALL: [PeriodPreset; 13] = [
        PeriodPreset::Today,
        PeriodPreset::Yesterday,
        PeriodPreset::ThisWeek,
        PeriodPreset::LastWeek,
        PeriodPreset::ThisMonth,
        PeriodPreset::LastMonth,
        PeriodPreset::ThisQuarter,
        PeriodPreset::LastQuarter,
        PeriodPreset::ThisYear,
        PeriodPreset::LastYear,
        PeriodPreset::Last7Days,
        PeriodPreset::Last30Days,
        PeriodPreset::Last90Days,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PeriodPreset::Today => "today",
            PeriodPreset::Yesterday => "yesterday",
            PeriodPreset::ThisWeek => "this_week",
            PeriodPreset::LastWeek => "last_week",
            PeriodPreset::ThisMonth => "this_month",
            PeriodPreset::LastMonth => "last_month",
            PeriodPreset::ThisQuarter => "this_quarter",
            PeriodPreset::LastQuarter => "last_quarter",
            PeriodPreset::ThisYear => "this_year",
            PeriodPreset::LastYear => "last_year",
            PeriodPreset::Last7Days => "last_7_days",
            PeriodPreset::Last30Days => "last_30_days",
            PeriodPreset::Last90Days => "last_90_days",
        }
    }
}

impl fmt::Display for PeriodPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PeriodPreset {
    type Err = SkillError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        PeriodPreset::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| SkillError::invalid(format!("unknown period `{s}`")))
    }
}

/// How a period repeats backwards: calendar months keep month alignment,
/// anything else steps back by its length in days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Span {
    Days,
    Months(u32),
}

/// An inclusive date window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Period {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(skip)]
    span: Span,
}

fn out_of_range() -> SkillError {
    SkillError::invalid("period is outside the supported date range")
}

fn month_start(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.day0()))
}

fn quarter_start(d: NaiveDate) -> NaiveDate {
    month_start(d) - Months::new(d.month0() % 3)
}

fn year_start(d: NaiveDate) -> NaiveDate {
    month_start(d) - Months::new(d.month0())
}

fn week_start(d: NaiveDate) -> NaiveDate {
    d - Days::new(u64::from(d.weekday().num_days_from_monday()))
}

impl Period {
    fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            span: Span::Days,
        }
    }

    fn months(start: NaiveDate, months: u32) -> Result<Self, SkillError> {
        let end = start
            .checked_add_months(Months::new(months))
            .and_then(|d| d.pred_opt())
            .ok_or_else(out_of_range)?;
        Ok(Self {
            start,
            end,
            span: Span::Months(months),
        })
    }

    /// Resolve a preset relative to `today`.
    pub fn preset(preset: PeriodPreset, today: NaiveDate) -> Result<Self, SkillError> {
        let back = |n: u64| today.checked_sub_days(Days::new(n)).ok_or_else(out_of_range);
        let month = month_start(today);
        match preset {
            PeriodPreset::Today => Ok(Self::days(today, today)),
            PeriodPreset::Yesterday => {
                let y = back(1)?;
                Ok(Self::days(y, y))
            }
            PeriodPreset::ThisWeek => {
                let start = week_start(today);
                Ok(Self::days(start, start + Days::new(6)))
            }
            PeriodPreset::LastWeek => {
                let start = week_start(today) - Days::new(7);
                Ok(Self::days(start, start + Days::new(6)))
            }
            PeriodPreset::ThisMonth => Self::months(month, 1),
            PeriodPreset::LastMonth => Self::months(
                month.checked_sub_months(Months::new(1)).ok_or_else(out_of_range)?,
                1,
            ),
            PeriodPreset::ThisQuarter => Self::months(quarter_start(today), 3),
            PeriodPreset::LastQuarter => Self::months(
                quarter_start(today)
                    .checked_sub_months(Months::new(3))
                    .ok_or_else(out_of_range)?,
                3,
            ),
            PeriodPreset::ThisYear => Self::months(year_start(today), 12),
            PeriodPreset::LastYear => Self::months(
                year_start(today)
                    .checked_sub_months(Months::new(12))
                    .ok_or_else(out_of_range)?,
                12,
            ),
            PeriodPreset::Last7Days => Ok(Self::days(back(6)?, today)),
            PeriodPreset::Last30Days => Ok(Self::days(back(29)?, today)),
            PeriodPreset::Last90Days => Ok(Self::days(back(89)?, today)),
        }
    }

    /// An explicit window. Whole calendar months keep month alignment when
    /// stepped back with [`Period::previous`].
    pub fn custom(start: NaiveDate, end: NaiveDate) -> Result<Self, SkillError> {
        if start > end {
            return Err(SkillError::invalid(format!(
                "date_from ({start}) must not be after date_to ({end})"
            )));
        }
        let whole_months = start.day() == 1 && end.succ_opt().is_some_and(|next| next.day() == 1);
        if whole_months {
            let months = (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32 + 1;
            if let Ok(months) = u32::try_from(months) {
                return Self::months(start, months);
            }
        }
        Ok(Self::days(start, end))
    }

    /// Number of days covered, both ends included.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The window of equal length that ends the day before this one starts.
    pub fn previous(&self) -> Result<Self, SkillError> {
        match self.span {
            Span::Months(n) => {
                let start = self
                    .start
                    .checked_sub_months(Months::new(n))
                    .ok_or_else(out_of_range)?;
                Self::months(start, n)
            }
            Span::Days => {
                let end = self.start.pred_opt().ok_or_else(out_of_range)?;
                let start = end
                    .checked_sub_days(Days::new((self.len_days() - 1) as u64))
                    .ok_or_else(out_of_range)?;
                Ok(Self::days(start, end))
            }
        }
    }

    /// This window and the previous one, both cut to the part elapsed by
    /// `today` when this window is still running. An unfinished month is
    /// compared day for day with the start of the month before it.
    pub fn elapsed_with_previous(&self, today: NaiveDate) -> Result<(Self, Self), SkillError> {
        let previous = self.previous()?;
        if !self.is_running(today) {
            return Ok((*self, previous));
        }
        let elapsed = Days::new((today - self.start).num_days().unsigned_abs());
        let previous_end = previous
            .start
            .checked_add_days(elapsed)
            .ok_or_else(out_of_range)?
            .min(previous.end);
        Ok((Self::days(self.start, today), Self::days(previous.start, previous_end)))
    }

    /// Whether `today` falls inside the window before its last day.
    pub fn is_running(&self, today: NaiveDate) -> bool {
        self.contains(today) && today < self.end
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

/// Period fields shared by every time-bounded skill input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PeriodInput {
    #[serde(default)]
    pub period: Option<String>,
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
}

impl PeriodInput {
    /// Adds `period`, `date_from` and `date_to` to a schema.
    pub fn schema_fields(schema: InputSchema, default: PeriodPreset) -> InputSchema {
        let names: Vec<&str> = PeriodPreset::ALL.iter().map(PeriodPreset::as_str).collect();
        schema
            .field(
                FieldSpec::choice("period", "named reporting period", &names).default_value(default.as_str()),
            )
            .field(FieldSpec::date(
                "date_from",
                "custom period start (inclusive); overrides `period` together with date_to",
            ))
            .field(FieldSpec::date("date_to", "custom period end (inclusive)"))
    }

    /// Custom dates win over the named preset; no input means the current month.
    pub fn resolve(&self, today: NaiveDate) -> Result<Period, SkillError> {
        match (self.date_from, self.date_to) {
            (Some(from), Some(to)) => Period::custom(from, to),
            (Some(_), None) | (None, Some(_)) => {
                Err(SkillError::invalid("date_from and date_to must be given together"))
            }
            (None, None) => {
                let preset = match &self.period {
                    Some(name) => name.parse()?,
                    None => PeriodPreset::ThisMonth,
                };
                Period::preset(preset, today)
            }
        }
    }
}
