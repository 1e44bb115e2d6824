//! Page-range resolution for the split tool.
//!
//! A [`SplitPlan`] says *how* to cut a document; [`resolve`] turns it into
//! concrete 1-indexed [`PageRange`]s once the page count is known. Parsing
//! and bounds checking are deliberately separate steps: a custom range list
//! can be validated as text before the document is even loaded.

use crate::error::DocToolsError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// `n` or `a-b`, whitespace tolerated around numbers and the dash.
static RANGE_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d+)\s*(?:-\s*(\d+)\s*)?$").expect("valid range regex"));

/// Inclusive, 1-indexed page range with `start ≤ end`.
///
/// Deserialisation goes through [`PageRange::new`], so a reversed range is
/// rejected there too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPageRange")]
pub struct PageRange {
    start: usize,
    end: usize,
}

#[derive(Deserialize)]
struct RawPageRange {
    start: usize,
    end: usize,
}

impl TryFrom<RawPageRange> for PageRange {
    type Error = DocToolsError;

    fn try_from(raw: RawPageRange) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl PageRange {
    /// Build a range; fails when `start > end`.
    pub fn new(start: usize, end: usize) -> Result<Self, DocToolsError> {
        if start > end {
            return Err(DocToolsError::InvalidRange {
                token: format!("{start}-{end}"),
                reason: "start page is after end page".into(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn single(page: usize) -> Self {
        Self {
            start: page,
            end: page,
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// `1 ≤ start ≤ end ≤ total`.
    pub fn fits(&self, total: usize) -> bool {
        self.start >= 1 && self.start <= self.end && self.end <= total
    }

    /// 0-based page indices covered by this range.
    pub fn indices(&self) -> Vec<usize> {
        (self.start - 1..self.end).collect()
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// How a document is cut by the split tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SplitPlan {
    /// One output per page.
    SinglePages,
    /// One output per listed range; ranges may overlap.
    CustomRanges(Vec<PageRange>),
    /// `n` near-equal consecutive parts.
    EqualParts(usize),
}

/// Parse `"1-5, 7-10, 15"`.
///
/// Empty tokens (`"1,,3"`) are skipped; a list with no tokens at all is
/// rejected. Bounds against a page count are checked later by [`resolve`].
pub fn parse_custom_ranges(input: &str) -> Result<Vec<PageRange>, DocToolsError> {
    let mut ranges = Vec::new();

    for token in input.split(',') {
        if token.trim().is_empty() {
            continue;
        }
        let caps = RANGE_TOKEN
            .captures(token)
            .ok_or_else(|| DocToolsError::InvalidRange {
                token: token.trim().to_string(),
                reason: "expected a page number or 'start-end'".into(),
            })?;

        let parse = |s: &str| {
            s.parse::<usize>().map_err(|_| DocToolsError::InvalidRange {
                token: token.trim().to_string(),
                reason: "page number is too large".into(),
            })
        };

        let start = parse(&caps[1])?;
        let end = match caps.get(2) {
            Some(m) => parse(m.as_str())?,
            None => start,
        };
        let range = PageRange::new(start, end).map_err(|_| DocToolsError::InvalidRange {
            token: token.trim().to_string(),
            reason: "start page is after end page".into(),
        })?;
        ranges.push(range);
    }

    if ranges.is_empty() {
        return Err(DocToolsError::EmptyRangeList);
    }
    Ok(ranges)
}

/// Resolve `plan` against a document of `total` pages.
pub fn resolve(plan: &SplitPlan, total: usize) -> Result<Vec<PageRange>, DocToolsError> {
    match plan {
        SplitPlan::SinglePages => Ok((1..=total).map(PageRange::single).collect()),

        SplitPlan::CustomRanges(ranges) => {
            if ranges.is_empty() {
                return Err(DocToolsError::EmptyRangeList);
            }
            if let Some(bad) = ranges.iter().find(|r| !r.fits(total)) {
                return Err(DocToolsError::RangeOutOfBounds {
                    start: bad.start,
                    end: bad.end,
                    total,
                });
            }
            Ok(ranges.clone())
        }

        SplitPlan::EqualParts(n) => {
            let n = *n;
            if n < 2 {
                return Err(DocToolsError::InvalidPartsCount(n));
            }
            let size = total.div_ceil(n);
            let mut parts = Vec::with_capacity(n);
            for i in 0..n {
                let start = i * size + 1;
                if start > total {
                    break;
                }
                let end = ((i + 1) * size).min(total);
                parts.push(PageRange { start, end });
            }
            Ok(parts)
        }
    }
}
