//! Growing lookup-formula ranges to cover appended data.
//!
//! Only the range argument of lookup functions (`VLOOKUP(key, range, ...)`
//! and friends) is touched. Every other part of a formula, and every formula
//! without such a call, is passed through byte for byte.

use std::borrow::Cow;
use std::fmt;

use finmerge_sheet::{to_a1_notation, CellRect, CellValue, Sheet};
use regex::{Captures, Regex};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{MergeError, MergeResult};
use crate::extent::ExtentMap;

/// Sheet prefix of a range as written in the formula.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetQualifier {
    /// Resolved sheet name, quotes removed.
    pub name: String,
    /// Prefix exactly as written, including quotes and the trailing `!`.
    pub raw: String,
}

impl SheetQualifier {
    fn parse(raw: &str) -> Self {
        let body = raw.strip_suffix('!').unwrap_or(raw);
        let name = match body.strip_prefix('\'').and_then(|b| b.strip_suffix('\'')) {
            Some(quoted) => quoted.replace("''", "'"),
            None => body.to_string(),
        };
        SheetQualifier {
            name,
            raw: raw.to_string(),
        }
    }

    pub fn is_quoted(&self) -> bool {
        self.raw.starts_with('\'')
    }
}

/// A range argument parsed out of a lookup call.
///
/// Column tokens keep their `$` markers verbatim (`$B$` in `$B$5`), so
/// re-serializing an unchanged reference reproduces the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeReference {
    pub sheet: Option<SheetQualifier>,
    pub start_col: String,
    pub start_row: u32,
    pub end_col: String,
    pub end_row: u32,
}

impl RangeReference {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        Some(RangeReference {
            sheet: caps.name("sheet").map(|m| SheetQualifier::parse(m.as_str())),
            start_col: caps.name("start_col")?.as_str().to_string(),
            start_row: caps.name("start_row")?.as_str().parse().ok()?,
            end_col: caps.name("end_col")?.as_str().to_string(),
            end_row: caps.name("end_row")?.as_str().parse().ok()?,
        })
    }

    /// Name of the sheet the range points at.
    pub fn target_sheet<'a>(&'a self, current_sheet: &'a str) -> &'a str {
        self.sheet.as_ref().map_or(current_sheet, |q| q.name.as_str())
    }

    #[must_use]
    pub fn with_end_row(&self, end_row: u32) -> Self {
        RangeReference {
            end_row,
            ..self.clone()
        }
    }
}

impl fmt::Display for RangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            f.write_str(&sheet.raw)?;
        }
        write!(
            f,
            "{}{}:{}{}",
            self.start_col, self.start_row, self.end_col, self.end_row
        )
    }
}

/// One formula changed by a region rewrite.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormulaUpdate {
    pub sheet: String,
    pub cell: String,
    pub before: String,
    pub after: String,
}

/// What a region rewrite changed and how many references it left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    pub updates: Vec<FormulaUpdate>,
    pub skipped: usize,
}

impl RewriteSummary {
    pub fn merge(&mut self, other: RewriteSummary) {
        self.updates.extend(other.updates);
        self.skipped += other.skipped;
    }
}

/// Rewrites the end row of lookup ranges from resolved data extents.
///
/// The lookup key (first argument) must not contain a comma, so a call such
/// as `VLOOKUP(CONCATENATE(A2,B2),Data!A5:B10,2)` is not recognized and is
/// left unchanged; such calls are reported at debug level.
#[derive(Debug, Clone)]
pub struct FormulaRangeRewriter {
    pattern: Regex,
    calls: Regex,
}

impl FormulaRangeRewriter {
    /// Build a rewriter for the given function names (case-insensitive).
    pub fn new<S: AsRef<str>>(functions: &[S]) -> MergeResult<Self> {
        if functions.is_empty() {
            return Err(MergeError::Configuration(
                "no lookup functions configured".to_string(),
            ));
        }
        // Longest first so `VLOOKUP` wins over `LOOKUP` at the same position.
        let mut names: Vec<&str> = functions.iter().map(AsRef::as_ref).collect();
        names.sort_by_key(|name| std::cmp::Reverse(name.len()));
        let alternation = names
            .iter()
            .map(|name| regex::escape(name))
            .collect::<Vec<_>>()
            .join("|");

        let pattern = format!(
            r"(?i)\b(?:{alternation})\s*\(\s*[^,]+?,\s*(?P<range>(?P<sheet>'(?:[^']|'')+'!|[^'!,\s()]+!)?(?P<start_col>\$?[A-Za-z]{{1,3}}\$?)(?P<start_row>\d+):(?P<end_col>\$?[A-Za-z]{{1,3}}\$?)(?P<end_row>\d+))\s*[,)]"
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| MergeError::Configuration(format!("invalid lookup pattern: {e}")))?;
        let calls = Regex::new(&format!(r"(?i)\b(?:{alternation})\s*\("))
            .map_err(|e| MergeError::Configuration(format!("invalid lookup pattern: {e}")))?;
        Ok(FormulaRangeRewriter { pattern, calls })
    }

    /// Range references of every lookup call in `formula`.
    pub fn references(&self, formula: &str) -> Vec<RangeReference> {
        self.pattern
            .captures_iter(formula)
            .filter_map(|caps| RangeReference::from_captures(&caps))
            .collect()
    }

    /// Rewrite one formula. Returns the input unchanged (borrowed) when no
    /// range needed to move.
    pub fn rewrite_formula<'a>(
        &self,
        formula: &'a str,
        current_sheet: &str,
        extents: &ExtentMap,
    ) -> Cow<'a, str> {
        let mut skipped = 0;
        self.rewrite_counting(formula, current_sheet, extents, &mut skipped)
    }

    fn rewrite_counting<'a>(
        &self,
        formula: &'a str,
        current_sheet: &str,
        extents: &ExtentMap,
        skipped: &mut usize,
    ) -> Cow<'a, str> {
        let recognized = self.pattern.find_iter(formula).count();
        if self.calls.find_iter(formula).count() > recognized {
            debug!(
                formula,
                sheet = current_sheet,
                "lookup call with unsupported arguments left unchanged"
            );
        }

        let rewritten = self.pattern.replace_all(formula, |caps: &Captures<'_>| {
            let whole = &caps[0];
            let (Some(whole_match), Some(range_match)) = (caps.get(0), caps.name("range")) else {
                return whole.to_string();
            };
            let Some(reference) = RangeReference::from_captures(caps) else {
                warn!(formula, range = range_match.as_str(), "unparseable lookup range");
                *skipped += 1;
                return whole.to_string();
            };

            let target = reference.target_sheet(current_sheet);
            let Some(extent) = extents.get(target) else {
                warn!(
                    formula,
                    sheet = target,
                    range = range_match.as_str(),
                    "no data extent for referenced sheet, leaving range unchanged"
                );
                *skipped += 1;
                return whole.to_string();
            };

            if extent.last_row < reference.start_row {
                if extent.last_row + 1 < reference.start_row {
                    warn!(
                        formula,
                        sheet = target,
                        range = range_match.as_str(),
                        new_end_row = extent.last_row,
                        "new end row is before range start, leaving range unchanged"
                    );
                    *skipped += 1;
                }
                return whole.to_string();
            }

            let updated = reference.with_end_row(extent.last_row);
            let offset = whole_match.start();
            format!(
                "{}{}{}",
                &whole[..range_match.start() - offset],
                updated,
                &whole[range_match.end() - offset..]
            )
        });

        // replace_all always allocates once anything matched; hand back the
        // original borrow when the text came out identical.
        match rewritten {
            Cow::Owned(text) if text == formula => Cow::Borrowed(formula),
            other => other,
        }
    }

    /// Rewrite every formula cell of `region` on `sheet`.
    ///
    /// The region is clipped to the sheet's stored area. Rewritten cells
    /// lose their cached result, which the next recalculation refills.
    pub fn rewrite_region(&self, sheet: &mut Sheet, region: CellRect, extents: &ExtentMap) -> RewriteSummary {
        let mut summary = RewriteSummary::default();
        let clipped = sheet.clip(&region);
        if clipped.is_empty() {
            return summary;
        }

        let sheet_name = sheet.name().to_string();
        info!(sheet = %sheet_name, region = %region, "processing formulas");

        for row in clipped.first_row..=clipped.last_row {
            for col in clipped.first_col..=clipped.last_col {
                let Some(source) = sheet.value(row, col).formula_source() else {
                    continue;
                };
                let updated = match self.rewrite_counting(source, &sheet_name, extents, &mut summary.skipped) {
                    Cow::Borrowed(_) => continue,
                    Cow::Owned(updated) => updated,
                };

                let cell = to_a1_notation(row, col);
                info!(
                    sheet = %sheet_name,
                    cell = %cell,
                    from = source,
                    to = %updated,
                    "updating formula"
                );
                summary.updates.push(FormulaUpdate {
                    sheet: sheet_name.clone(),
                    cell,
                    before: source.to_string(),
                    after: updated.clone(),
                });
                if let Err(err) = sheet.set_value(row, col, CellValue::formula(updated)) {
                    warn!(sheet = %sheet_name, row, col, %err, "could not store rewritten formula");
                }
            }
        }

        summary
    }
}
