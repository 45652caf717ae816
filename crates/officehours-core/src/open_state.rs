//! Open/closed evaluation and next-edge prediction.

use chrono::{DateTime, TimeZone};

use crate::office_hour::OfficeHour;
use crate::time_rules::AbsoluteInterval;

/// Open state at an instant.
#[derive(Debug, Clone)]
pub struct OpenState<Tz: TimeZone> {
    /// Whether any candidate range contains the instant.
    pub is_open: bool,
    /// First rule with a range containing the instant.
    pub applied: Option<OfficeHour>,
    /// Earliest range start or end strictly after the instant.
    pub next_edge: Option<DateTime<Tz>>,
}

impl<Tz: TimeZone> OpenState<Tz> {
    /// Closed, no applied rule, nothing scheduled.
    pub fn closed() -> Self {
        Self {
            is_open: false,
            applied: None,
            next_edge: None,
        }
    }
}

/// Evaluates `now` against the rules that apply today and yesterday.
///
/// `today` rules have every range anchored to the current day. Of the
/// `previous_day` rules only overnight ranges are considered, since only they
/// reach into today. Today's rules are checked first.
pub fn evaluate<Tz: TimeZone>(
    now: &DateTime<Tz>,
    today: &[OfficeHour],
    previous_day: &[OfficeHour],
) -> OpenState<Tz> {
    let tz = now.timezone();
    let day = now.date_naive();

    let mut intervals: Vec<(&OfficeHour, AbsoluteInterval<Tz>)> = Vec::new();
    for rule in today {
        for range in rule.time_ranges() {
            intervals.push((rule, range.resolve(day, &tz)));
        }
    }
    if let Some(yesterday) = day.pred_opt() {
        for rule in previous_day {
            for range in rule.time_ranges().iter().filter(|r| r.is_overnight()) {
                intervals.push((rule, range.resolve(yesterday, &tz)));
            }
        }
    }

    let mut state = OpenState::closed();
    for (rule, interval) in intervals {
        if interval.contains(now) && state.applied.is_none() {
            state.is_open = true;
            state.applied = Some(rule.clone());
        }

        for edge in [interval.start, interval.end] {
            if edge > *now && state.next_edge.as_ref().map_or(true, |next| edge < *next) {
                state.next_edge = Some(edge);
            }
        }
    }

    state
}
