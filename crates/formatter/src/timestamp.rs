//! Custom date/time patterns (`yyyy-MM-dd HH:mm:ss.fff zzz`)
//!
//! Patterns are compiled once into parts so rendering cannot fail.

use chrono::{DateTime, Datelike, FixedOffset, Timelike};
use std::fmt::Write;

use crate::template::TemplateError;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Literal(String),
    /// Year with the given minimum width; width 2 renders the last two digits
    Year(usize),
    /// Month number (1 or 2 digits)
    Month(usize),
    MonthAbbrev,
    MonthName,
    Day(usize),
    DayAbbrev,
    DayName,
    Hour24(usize),
    Hour12(usize),
    Minute(usize),
    Second(usize),
    /// Fraction of a second with this many digits
    Fraction(usize),
    /// Like `Fraction`, trailing zeros dropped (`F`)
    TrimmedFraction(usize),
    /// UTC offset: 1 = `+2`, 2 = `+02`, 3 = `+02:00`
    Offset(usize),
    /// AM/PM designator, full (`PM`) or first letter (`P`)
    Meridiem(usize),
}

/// A compiled date/time pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimestampPattern {
    parts: Vec<Part>,
}

impl TimestampPattern {
    /// Pattern used when a `Timestamp` token carries no format
    pub const DEFAULT: &'static str = "yyyy-MM-dd HH:mm:ss.fff zzz";

    /// Compile a pattern
    ///
    /// # Errors
    /// Unterminated quoted literal, dangling escape, or fraction wider than 9 digits
    pub fn parse(pattern: &str) -> Result<Self, TemplateError> {
        let chars: Vec<char> = pattern.chars().collect();
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if c == '\'' || c == '"' {
                let close = chars[i + 1..]
                    .iter()
                    .position(|&q| q == c)
                    .ok_or_else(|| {
                        TemplateError::timestamp(pattern, "unterminated quoted literal")
                    })?;
                literal.extend(&chars[i + 1..i + 1 + close]);
                i += close + 2;
                continue;
            }

            if c == '\\' {
                let escaped = chars
                    .get(i + 1)
                    .ok_or_else(|| TemplateError::timestamp(pattern, "dangling escape"))?;
                literal.push(*escaped);
                i += 2;
                continue;
            }

            let run = chars[i..].iter().take_while(|&&r| r == c).count();
            let part = match c {
                'y' => Some(Part::Year(if run == 2 { 2 } else { run.max(4) })),
                'M' => Some(match run {
                    1 | 2 => Part::Month(run),
                    3 => Part::MonthAbbrev,
                    _ => Part::MonthName,
                }),
                'd' => Some(match run {
                    1 | 2 => Part::Day(run),
                    3 => Part::DayAbbrev,
                    _ => Part::DayName,
                }),
                'H' => Some(Part::Hour24(run.min(2))),
                'h' => Some(Part::Hour12(run.min(2))),
                'm' => Some(Part::Minute(run.min(2))),
                's' => Some(Part::Second(run.min(2))),
                'f' | 'F' => {
                    if run > 9 {
                        return Err(TemplateError::timestamp(
                            pattern,
                            "fraction supports at most 9 digits",
                        ));
                    }
                    Some(if c == 'F' {
                        Part::TrimmedFraction(run)
                    } else {
                        Part::Fraction(run)
                    })
                }
                'z' => Some(Part::Offset(run.min(3))),
                'K' => Some(Part::Offset(3)),
                't' => Some(Part::Meridiem(run.min(2))),
                _ => None,
            };

            match part {
                Some(part) => {
                    if !literal.is_empty() {
                        parts.push(Part::Literal(std::mem::take(&mut literal)));
                    }
                    parts.push(part);
                    i += run;
                }
                None => {
                    literal.push(c);
                    i += 1;
                }
            }
        }

        if !literal.is_empty() {
            parts.push(Part::Literal(literal));
        }

        Ok(Self { parts })
    }

    /// Append the rendered timestamp to `out`
    pub fn render(&self, ts: &DateTime<FixedOffset>, out: &mut String) {
        for part in &self.parts {
            // Writing into a String cannot fail
            let _ = match part {
                Part::Literal(text) => {
                    out.push_str(text);
                    Ok(())
                }
                Part::Year(2) => write!(out, "{:02}", ts.year().rem_euclid(100)),
                Part::Year(width) => write!(out, "{:0width$}", ts.year(), width = *width),
                Part::Month(width) => write!(out, "{:0width$}", ts.month(), width = *width),
                Part::MonthAbbrev => {
                    out.push_str(&MONTH_NAMES[ts.month0() as usize][..3]);
                    Ok(())
                }
                Part::MonthName => {
                    out.push_str(MONTH_NAMES[ts.month0() as usize]);
                    Ok(())
                }
                Part::Day(width) => write!(out, "{:0width$}", ts.day(), width = *width),
                Part::DayAbbrev => {
                    let day = DAY_NAMES[ts.weekday().num_days_from_monday() as usize];
                    out.push_str(&day[..3]);
                    Ok(())
                }
                Part::DayName => {
                    out.push_str(DAY_NAMES[ts.weekday().num_days_from_monday() as usize]);
                    Ok(())
                }
                Part::Hour24(width) => write!(out, "{:0width$}", ts.hour(), width = *width),
                Part::Hour12(width) => {
                    write!(out, "{:0width$}", ts.hour12().1, width = *width)
                }
                Part::Minute(width) => write!(out, "{:0width$}", ts.minute(), width = *width),
                Part::Second(width) => write!(out, "{:0width$}", ts.second(), width = *width),
                Part::Fraction(digits) => {
                    write!(out, "{:0width$}", fraction(ts, *digits), width = *digits)
                }
                Part::TrimmedFraction(digits) => {
                    let text = format!("{:0width$}", fraction(ts, *digits), width = *digits);
                    let text = text.trim_end_matches('0');
                    // A zero fraction also takes its separator with it
                    if text.is_empty() && out.ends_with('.') {
                        out.pop();
                    }
                    out.push_str(text);
                    Ok(())
                }
                Part::Offset(style) => write_offset(ts.offset(), *style, out),
                Part::Meridiem(style) => {
                    let designator = if ts.hour12().0 { "PM" } else { "AM" };
                    out.push_str(if *style == 1 {
                        &designator[..1]
                    } else {
                        designator
                    });
                    Ok(())
                }
            };
        }
    }
}

impl Default for TimestampPattern {
    fn default() -> Self {
        Self::parse(Self::DEFAULT).unwrap_or(Self { parts: Vec::new() })
    }
}

/// First `digits` digits of the second fraction
fn fraction(ts: &DateTime<FixedOffset>, digits: usize) -> u32 {
    // Leap-second nanos can exceed 999_999_999
    let nanos = ts.nanosecond() % 1_000_000_000;
    nanos / 10u32.pow(9 - digits as u32)
}

fn write_offset(offset: &FixedOffset, style: usize, out: &mut String) -> std::fmt::Result {
    let seconds = offset.local_minus_utc();
    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    match style {
        1 => write!(out, "{sign}{hours}"),
        2 => write!(out, "{sign}{hours:02}"),
        _ => write!(out, "{sign}{hours:02}:{minutes:02}"),
    }
}
