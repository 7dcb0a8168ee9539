use std::str::FromStr;
use std::time::Duration as StdDuration;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use rand::Rng;

const WINDOW_TIME_FORMAT: &str = "%H:%M";

/// Local time-of-day window, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DailyWindow {
    start: NaiveTime,
    end: NaiveTime,
}

impl FromStr for DailyWindow {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let (start, end) = raw
            .split_once('-')
            .ok_or_else(|| format!("expected HH:MM-HH:MM, got {raw}"))?;
        let parse = |part: &str| {
            NaiveTime::parse_from_str(part.trim(), WINDOW_TIME_FORMAT)
                .map_err(|err| format!("invalid time {part:?}: {err}"))
        };
        let (start, end) = (parse(start)?, parse(end)?);
        if start > end {
            return Err(format!("window start {start} is after its end {end}"));
        }
        Ok(Self { start, end })
    }
}

/// When fetch-then-normalize runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Trigger {
    /// A single immediate run.
    Once,
    /// Once a day at a random time inside the window.
    Daily(DailyWindow),
    /// Immediately, then at a fixed cadence.
    Interval(StdDuration),
}

/// Plans successive runs for a [`Trigger`].
pub(crate) struct Scheduler {
    trigger: Trigger,
    runs: u64,
    last_planned_day: Option<NaiveDate>,
}

impl Scheduler {
    pub(crate) fn new(trigger: Trigger) -> Self {
        Self {
            trigger,
            runs: 0,
            last_planned_day: None,
        }
    }

    /// Whether failures should be logged and the loop kept alive.
    pub(crate) fn is_periodic(&self) -> bool {
        !matches!(self.trigger, Trigger::Once)
    }

    /// Delay from `now` until the next run, or `None` once no runs remain.
    pub(crate) fn next_delay<R: Rng>(
        &mut self,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Option<StdDuration> {
        let delay = match self.trigger {
            Trigger::Once if self.runs > 0 => return None,
            Trigger::Once => StdDuration::ZERO,
            Trigger::Interval(_) if self.runs == 0 => StdDuration::ZERO,
            Trigger::Interval(every) => every,
            Trigger::Daily(window) => {
                let at = self.next_daily_run(window, now, rng)?;
                (at - now).to_std().unwrap_or_default()
            }
        };
        self.runs += 1;
        Some(delay)
    }

    fn next_daily_run<R: Rng>(
        &mut self,
        window: DailyWindow,
        now: NaiveDateTime,
        rng: &mut R,
    ) -> Option<NaiveDateTime> {
        let today = now.date();
        let already_planned = self.last_planned_day.is_some_and(|day| day >= today);
        let day = if already_planned || now.time() > window.end {
            today.succ_opt()?
        } else {
            today
        };

        let earliest = if day == today {
            window.start.max(now.time())
        } else {
            window.start
        };
        let span = (window.end - earliest).num_seconds().max(0);
        let offset = rng.random_range(0..=span);

        self.last_planned_day = Some(day);
        Some(day.and_time(earliest) + TimeDelta::seconds(offset))
    }
}
