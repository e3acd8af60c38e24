//! Positional field extraction for ptp4l log lines
//!
//! ptp4l prints two report shapes that carry synchronization quality:
//!
//! ```text
//! ptp4l[5196.819]: master offset -18 s2 freq -2165 path delay 547
//! ptp4l[5197.819]: rms 12 max 21 freq -2170 +/- 9 delay 546 +/- 1
//! ```
//!
//! Fields are read by token position. A missing or non-numeric token
//! yields zero for that field only; the rest of the line is still used.

use serde::Serialize;

const MASTER_OFFSET_MARKER: &str = "master offset";
const RMS_MARKER: &str = "rms";

/// Measurements extracted from one ptp4l report line
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Ptp4lSample {
    pub offset: i64,
    pub frequency: i64,
    pub path_delay: i64,
}

/// Token layout of a recognized report shape
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportLayout {
    MasterOffset,
    Rms,
}

impl ReportLayout {
    /// Classify a line by marker substring. "master offset" wins over "rms".
    pub fn classify(line: &str) -> Option<Self> {
        if line.contains(MASTER_OFFSET_MARKER) {
            Some(ReportLayout::MasterOffset)
        } else if line.contains(RMS_MARKER) {
            Some(ReportLayout::Rms)
        } else {
            None
        }
    }

    /// Token indices of (offset, frequency, path delay)
    pub const fn indices(&self) -> (usize, usize, usize) {
        match self {
            ReportLayout::MasterOffset => (3, 6, 9),
            ReportLayout::Rms => (2, 6, 10),
        }
    }
}

/// Extract offset, frequency and path delay from a ptp4l line.
///
/// Returns `None` when the line matches neither report shape.
pub fn parse_ptp4l_line(line: &str) -> Option<Ptp4lSample> {
    let layout = ReportLayout::classify(line)?;
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let (offset, frequency, path_delay) = layout.indices();

    Some(Ptp4lSample {
        offset: int_at(&tokens, offset),
        frequency: int_at(&tokens, frequency),
        path_delay: int_at(&tokens, path_delay),
    })
}

fn int_at(tokens: &[&str], index: usize) -> i64 {
    tokens
        .get(index)
        .and_then(|token| token.parse::<i64>().ok())
        .unwrap_or(0)
}
