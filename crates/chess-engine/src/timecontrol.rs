//! Time controls and the per-game clock that tracks them.
//!
//! A [`TimeControl`] is a small ordered list of periods, parsed from (and
//! rendered back to) either of two textual grammars: the "human" grammar
//! PGN writers put in free text, and the terser grammar the `TimeControl`
//! PGN tag itself uses. [`TimeTracker`] pairs a `TimeControl` with the
//! running clock state for one side of a game in progress.

use std::fmt;

/// One segment of a time control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    /// `moves` moves in `time_secs` seconds, then the period repeats.
    Rollover {
        moves: u32,
        time_secs: u32,
        increment_secs: u32,
    },
    /// All remaining moves in `time_secs` seconds.
    GameIn {
        time_secs: u32,
        increment_secs: u32,
    },
    /// A single move in `time_secs` seconds (no increment).
    MovesIn { time_secs: u32 },
}

impl Period {
    fn time_secs(self) -> u32 {
        match self {
            Period::Rollover { time_secs, .. } => time_secs,
            Period::GameIn { time_secs, .. } => time_secs,
            Period::MovesIn { time_secs } => time_secs,
        }
    }

    fn increment_secs(self) -> u32 {
        match self {
            Period::Rollover { increment_secs, .. } => increment_secs,
            Period::GameIn { increment_secs, .. } => increment_secs,
            Period::MovesIn { .. } => 0,
        }
    }

    fn is_valid(self) -> bool {
        match self {
            Period::Rollover { moves, time_secs, .. } => moves > 0 && time_secs > 0,
            Period::GameIn { time_secs, .. } => time_secs > 0,
            Period::MovesIn { time_secs } => time_secs > 0,
        }
    }

    fn is_terminal(self) -> bool {
        !matches!(self, Period::Rollover { .. })
    }
}

/// Error constructing or parsing a [`TimeControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeControlError {
    /// No periods given.
    Empty,
    /// A period failed its own validity rule (e.g. `moves=0` for a rollover).
    InvalidPeriod(Period),
    /// A game-in or moves-in period appeared before the last slot.
    TerminalPeriodNotLast,
    /// The notation didn't match either grammar.
    Malformed(String),
}

impl fmt::Display for TimeControlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeControlError::Empty => write!(f, "time control has no periods"),
            TimeControlError::InvalidPeriod(p) => write!(f, "invalid period: {p:?}"),
            TimeControlError::TerminalPeriodNotLast => {
                write!(f, "game-in/moves-in period must be last")
            }
            TimeControlError::Malformed(s) => write!(f, "malformed time control: {s}"),
        }
    }
}

impl std::error::Error for TimeControlError {}

/// Which textual grammar to parse or render with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notation {
    /// `,`-joined: `G/<min>[/<inc_s>]`, `M/<sec>`, `<moves>/<min>[/<inc_s>]`.
    Human,
    /// `:`-joined: `<moves>/<sec>[+|-<inc_s>]`, `<sec>[+|-<inc_s>]`, `*<sec>`.
    Pgn,
}

/// An ordered list of time-control periods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeControl {
    periods: Vec<Period>,
}

impl TimeControl {
    /// Builds a time control from explicit periods, checking the
    /// validity rules from the data model (non-empty, each period
    /// individually valid, only the last period may be terminal).
    pub fn new(periods: Vec<Period>) -> Result<Self, TimeControlError> {
        if periods.is_empty() {
            return Err(TimeControlError::Empty);
        }
        for (i, &p) in periods.iter().enumerate() {
            if !p.is_valid() {
                return Err(TimeControlError::InvalidPeriod(p));
            }
            if p.is_terminal() && i + 1 != periods.len() {
                return Err(TimeControlError::TerminalPeriodNotLast);
            }
        }
        Ok(TimeControl { periods })
    }

    pub fn periods(&self) -> &[Period] {
        &self.periods
    }

    /// Parses either grammar, auto-detecting from punctuation when the
    /// string is a single bare `moves/time` period with no other hint:
    /// PGN if `time >= 300`, human otherwise.
    pub fn parse(s: &str) -> Result<Self, TimeControlError> {
        let s = s.trim();
        if s.contains(':') {
            return Self::parse_pgn(s);
        }
        if s.contains(',') || s.starts_with("G/") || s.starts_with("M/") {
            return Self::parse_human(s);
        }
        if s.starts_with('*') || s.contains('+') || s.contains('-') {
            return Self::parse_pgn(s);
        }
        // Bare "<moves>/<time>" with no disambiguating hint.
        if let Some((moves_str, time_str)) = s.split_once('/') {
            if !time_str.contains('/') {
                let time: u32 = time_str
                    .parse()
                    .map_err(|_| TimeControlError::Malformed(s.to_string()))?;
                return if time >= 300 {
                    Self::parse_pgn(s)
                } else {
                    Self::parse_human(s)
                };
            }
        }
        Self::parse_human(s)
    }

    /// Parses the `,`-joined human grammar.
    pub fn parse_human(s: &str) -> Result<Self, TimeControlError> {
        let mut periods = Vec::new();
        for part in s.trim().split(',') {
            periods.push(parse_human_period(part.trim())?);
        }
        Self::new(periods)
    }

    /// Parses the `:`-joined PGN grammar.
    pub fn parse_pgn(s: &str) -> Result<Self, TimeControlError> {
        let mut periods = Vec::new();
        for part in s.trim().split(':') {
            periods.push(parse_pgn_period(part.trim())?);
        }
        Self::new(periods)
    }

    /// Renders this time control in the requested notation.
    pub fn notation(&self, format: Notation) -> String {
        let rendered: Vec<String> = self
            .periods
            .iter()
            .map(|&p| match format {
                Notation::Human => render_human_period(p),
                Notation::Pgn => render_pgn_period(p),
            })
            .collect();
        let sep = match format {
            Notation::Human => ",",
            Notation::Pgn => ":",
        };
        rendered.join(sep)
    }
}

fn parse_human_period(s: &str) -> Result<Period, TimeControlError> {
    let bad = || TimeControlError::Malformed(s.to_string());
    if let Some(rest) = s.strip_prefix("G/") {
        let mut parts = rest.split('/');
        let minutes: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
        let inc: u32 = match parts.next() {
            Some(v) => v.parse().map_err(|_| bad())?,
            None => 0,
        };
        return Ok(Period::GameIn {
            time_secs: minutes * 60,
            increment_secs: inc,
        });
    }
    if let Some(rest) = s.strip_prefix("M/") {
        let secs: u32 = rest.parse().map_err(|_| bad())?;
        return Ok(Period::MovesIn { time_secs: secs });
    }
    let (moves_str, rest) = s.split_once('/').ok_or_else(bad)?;
    let moves: u32 = moves_str.parse().map_err(|_| bad())?;
    let mut parts = rest.split('/');
    let minutes: u32 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let inc: u32 = match parts.next() {
        Some(v) => v.parse().map_err(|_| bad())?,
        None => 0,
    };
    Ok(Period::Rollover {
        moves,
        time_secs: minutes * 60,
        increment_secs: inc,
    })
}

fn parse_pgn_period(s: &str) -> Result<Period, TimeControlError> {
    let bad = || TimeControlError::Malformed(s.to_string());
    if let Some(rest) = s.strip_prefix('*') {
        let secs: u32 = rest.parse().map_err(|_| bad())?;
        return Ok(Period::MovesIn { time_secs: secs });
    }
    let (body, increment_secs) = split_increment(s);
    if let Some((moves_str, time_str)) = body.split_once('/') {
        let moves: u32 = moves_str.parse().map_err(|_| bad())?;
        let secs: u32 = time_str.parse().map_err(|_| bad())?;
        Ok(Period::Rollover {
            moves,
            time_secs: secs,
            increment_secs,
        })
    } else {
        let secs: u32 = body.parse().map_err(|_| bad())?;
        Ok(Period::GameIn {
            time_secs: secs,
            increment_secs,
        })
    }
}

/// Splits a PGN period body on a trailing `+N`/`-N` increment suffix.
/// A leading `-` (there is none, moves/seconds are unsigned) is never
/// mistaken for one because we only look past the first character.
fn split_increment(s: &str) -> (&str, u32) {
    if let Some(pos) = s[1..].find(['+', '-']).map(|p| p + 1) {
        let inc = s[pos + 1..].parse().unwrap_or(0);
        (&s[..pos], inc)
    } else {
        (s, 0)
    }
}

fn render_human_period(p: Period) -> String {
    match p {
        Period::GameIn {
            time_secs,
            increment_secs,
        } => {
            if increment_secs == 0 {
                format!("G/{}", time_secs / 60)
            } else {
                format!("G/{}/{}", time_secs / 60, increment_secs)
            }
        }
        Period::MovesIn { time_secs } => format!("M/{time_secs}"),
        Period::Rollover {
            moves,
            time_secs,
            increment_secs,
        } => {
            if increment_secs == 0 {
                format!("{}/{}", moves, time_secs / 60)
            } else {
                format!("{}/{}/{}", moves, time_secs / 60, increment_secs)
            }
        }
    }
}

fn render_pgn_period(p: Period) -> String {
    match p {
        Period::MovesIn { time_secs } => format!("*{time_secs}"),
        Period::GameIn {
            time_secs,
            increment_secs,
        } => {
            if increment_secs == 0 {
                format!("{time_secs}")
            } else {
                format!("{time_secs}+{increment_secs}")
            }
        }
        Period::Rollover {
            moves,
            time_secs,
            increment_secs,
        } => {
            if increment_secs == 0 {
                format!("{moves}/{time_secs}")
            } else {
                format!("{moves}/{time_secs}+{increment_secs}")
            }
        }
    }
}

/// Tracks the running clock for one side playing under a [`TimeControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeTracker {
    control: TimeControl,
    active_period: usize,
    time_left_ms: u64,
    moves_left_in_period: u32,
    out_of_time: bool,
}

impl TimeTracker {
    /// Creates a tracker over `control`, already reset to its first period.
    pub fn new(control: TimeControl) -> Self {
        let mut tracker = TimeTracker {
            control,
            active_period: 0,
            time_left_ms: 0,
            moves_left_in_period: 0,
            out_of_time: false,
        };
        tracker.reset();
        tracker
    }

    /// Resets the clock to the start of the first period.
    pub fn reset(&mut self) {
        self.active_period = 0;
        let period = self.control.periods[0];
        self.time_left_ms = period.time_secs() as u64 * 1000;
        self.moves_left_in_period = starting_moves_left(period);
        self.out_of_time = false;
    }

    pub fn time_left_ms(&self) -> u64 {
        self.time_left_ms
    }

    pub fn moves_left_in_period(&self) -> u32 {
        self.moves_left_in_period
    }

    pub fn out_of_time(&self) -> bool {
        self.out_of_time
    }

    /// Records that the side just spent `elapsed_ms` thinking, updating
    /// the clock, any increment, period rollover, and the out-of-time
    /// flag per the engine's deterministic clock rule.
    pub fn record_think(&mut self, elapsed_ms: u64) {
        if self.out_of_time {
            return;
        }
        if elapsed_ms > self.time_left_ms {
            self.time_left_ms = 0;
            self.out_of_time = true;
            return;
        }
        self.time_left_ms -= elapsed_ms;
        let period = self.control.periods[self.active_period];
        self.time_left_ms += period.increment_secs() as u64 * 1000;

        match period {
            Period::Rollover { .. } => {
                if self.moves_left_in_period > 0 {
                    self.moves_left_in_period -= 1;
                }
                if self.moves_left_in_period == 0 && self.active_period + 1 < self.control.periods.len() {
                    self.active_period += 1;
                    let next = self.control.periods[self.active_period];
                    let surplus = self.time_left_ms;
                    self.time_left_ms = next.time_secs() as u64 * 1000 + surplus;
                    self.moves_left_in_period = starting_moves_left(next);
                }
            }
            Period::MovesIn { time_secs } => {
                self.time_left_ms = time_secs as u64 * 1000;
            }
            Period::GameIn { .. } => {}
        }
    }
}

fn starting_moves_left(period: Period) -> u32 {
    match period {
        Period::Rollover { moves, .. } => moves,
        Period::MovesIn { .. } => 1,
        Period::GameIn { .. } => 0,
    }
}
