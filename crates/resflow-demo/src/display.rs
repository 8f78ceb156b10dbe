//! Console rendering of simulation snapshots.

use std::fmt::Write;
use std::time::{Duration, Instant};

use resflow_core::query::SimSnapshot;

const ANSI_CLEAR: &str = "\x1b[2J";
const ANSI_MV_TL: &str = "\x1b[H";

/// Render one frame: a cleared screen, resource levels, then system statuses.
pub fn render(snapshot: &SimSnapshot) -> String {
    let mut out = String::new();
    out.push_str(ANSI_CLEAR);
    out.push_str(ANSI_MV_TL);
    out.push_str(&render_plain(snapshot));
    out
}

/// Same as [`render`] without terminal control codes.
pub fn render_plain(snapshot: &SimSnapshot) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_frame(&mut out, snapshot);
    out
}

fn write_frame(out: &mut String, snapshot: &SimSnapshot) -> std::fmt::Result {
    writeln!(out, "Current Resource Amounts:")?;
    writeln!(out, "-------------------------")?;
    for r in &snapshot.resources {
        writeln!(out, "{}: {} / {}", r.name, r.amount, r.max_capacity)?;
    }

    writeln!(out, "\nSystem Statuses:")?;
    writeln!(out, "---------------")?;
    for s in &snapshot.systems {
        if s.amount_stored > 0 {
            writeln!(out, "{}: {} (holding {})", s.name, s.status, s.amount_stored)?;
        } else {
            writeln!(out, "{}: {}", s.name, s.status)?;
        }
    }
    writeln!(out)
}

/// Rate limiter for redraws.
#[derive(Debug, Clone)]
pub struct Throttle {
    interval: Duration,
    last: Option<Instant>,
}

impl Throttle {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// Whether a frame may be drawn at `now`. Records the draw if so.
    pub fn ready(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.saturating_duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }
}
