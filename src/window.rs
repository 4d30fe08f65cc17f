//! Result window and response shape for a GET.

use crate::error::AppError;
use crate::extractors::Preferences;
use crate::query::RequestQuery;

/// Half-open row range `[start, stop)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub start: u64,
    pub stop: u64,
}

impl Window {
    pub fn len(&self) -> u64 {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `Content-Range` value: inclusive bounds, then the total or `*`.
    pub fn content_range(&self, count: Option<u64>) -> String {
        let total = count.map_or_else(|| "*".to_string(), |n| n.to_string());
        if self.is_empty() {
            format!("*/{}", total)
        } else {
            format!("{}-{}/{}", self.start, self.stop - 1, total)
        }
    }

    fn clamp(self, max_window: u64) -> Self {
        Window {
            start: self.start,
            stop: self.start.saturating_add(self.len().min(max_window)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    /// One JSON object; 404 when nothing matches.
    Single,
    Collection,
}

/// Decide shape and window. Precedence: single-object Accept, then `limit`/`offset`,
/// then `Range`, then the default window.
pub fn resolve(
    prefs: &Preferences,
    query: &RequestQuery,
    default_window: u64,
    max_window: u64,
) -> Result<(Shape, Window), AppError> {
    if prefs.single_object {
        return Ok((Shape::Single, Window { start: 0, stop: 1 }));
    }
    let window = if query.has_limit_or_offset() {
        let start = match query.offset.as_deref() {
            Some(raw) => parse_bound("offset", raw)?,
            None => 0,
        };
        let len = match query.limit.as_deref() {
            Some(raw) => parse_bound("limit", raw)?,
            None => default_window,
        };
        Window {
            start,
            stop: start.saturating_add(len),
        }
    } else if let Some(range) = prefs.range.as_deref() {
        parse_range(range, default_window)?
    } else {
        Window {
            start: 0,
            stop: default_window,
        }
    };
    Ok((Shape::Collection, window.clamp(max_window)))
}

/// Row offsets are bound as SQLite integers, so anything past `i64::MAX` is rejected.
fn parse_offset(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|&n| i64::try_from(n).is_ok())
}

fn parse_bound(name: &str, raw: &str) -> Result<u64, AppError> {
    parse_offset(raw)
        .ok_or_else(|| AppError::BadRequest(format!("{} must be an integer from 0 to {}, got '{}'", name, i64::MAX, raw)))
}

/// `start-stop` with an inclusive stop, or `start-` for a default-sized window.
fn parse_range(raw: &str, default_window: u64) -> Result<Window, AppError> {
    let bad = || AppError::BadRequest(format!("malformed Range header '{}'", raw));
    let bounds = raw.trim();
    let bounds = bounds.strip_prefix("items=").unwrap_or(bounds);
    let (start, stop) = bounds.split_once('-').ok_or_else(bad)?;
    let start = parse_offset(start).ok_or_else(bad)?;
    if stop.trim().is_empty() {
        return Ok(Window {
            start,
            stop: start.saturating_add(default_window),
        });
    }
    let stop = parse_offset(stop).ok_or_else(bad)?;
    if stop < start {
        return Err(bad());
    }
    Ok(Window {
        start,
        stop: stop.saturating_add(1),
    })
}
