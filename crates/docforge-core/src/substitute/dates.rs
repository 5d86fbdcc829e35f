//! Date formatting, billing-cycle computation and date-sentence substitution.

use chrono::{Datelike, Months, NaiveDate};
use regex::{Captures, NoExpand};

use crate::error::{DocforgeError, Result};

use super::literal::compile;
use super::Applied;

/// Month names, indexed by zero-based month.
pub const MONTH_NAMES: [&str; 12] = [
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

/// Input formats accepted for date fields: the form's date picker and `MM/DD/YYYY`.
const INPUT_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Sentence stating the initial billing period.
const INITIAL_PERIOD_PATTERN: &str =
    r"The initial billing period shall run from [^,]+, \d{4}, to [^,]+, \d{4}\.";

/// Sentence listing the quarterly billing dates.
const QUARTERLY_PATTERN: &str =
    r"Thereafter, quarterly billing shall begin on [^,]+, \d{4}, and continue on [^.]+\.";

/// `"January 1, 2026"`.
pub fn format_date(date: NaiveDate) -> String {
    format!("{} {}, {}", MONTH_NAMES[date.month0() as usize], date.day(), date.year())
}

/// Parse a user-supplied date in any accepted input format.
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    INPUT_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
        .ok_or_else(|| DocforgeError::MalformedInput(format!("unparseable date {value:?}")))
}

/// Quarterly billing schedule derived from an initial billing period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BillingCycle {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// First day of the month after `end`.
    pub first_billing: NaiveDate,
    /// `first_billing` plus 0, 3, 6 and 9 months.
    pub quarters: [NaiveDate; 4],
}

impl BillingCycle {
    pub fn compute(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(DocforgeError::MalformedInput(format!(
                "billing period starts after it ends ({start} > {end})"
            )));
        }
        let overflow = || DocforgeError::MalformedInput(format!("date out of range after {end}"));

        let first_billing = end
            .with_day(1)
            .and_then(|d| d.checked_add_months(Months::new(1)))
            .ok_or_else(overflow)?;

        let mut quarters = [first_billing; 4];
        for (i, quarter) in quarters.iter_mut().enumerate().skip(1) {
            *quarter = first_billing
                .checked_add_months(Months::new(3 * i as u32))
                .ok_or_else(overflow)?;
        }

        Ok(Self {
            start,
            end,
            first_billing,
            quarters,
        })
    }

    /// Month-only yearly pattern, e.g. `"January 1, April 1, July 1, and October 1"`.
    ///
    /// Months wrap modulo 12 and carry no year.
    pub fn recurring_pattern(&self) -> String {
        let base = self.first_billing.month0() as usize;
        let month = |offset: usize| MONTH_NAMES[(base + offset) % 12];
        format!(
            "{} 1, {} 1, {} 1, and {} 1",
            month(0),
            month(3),
            month(6),
            month(9)
        )
    }

    pub fn initial_period_sentence(&self) -> String {
        format!(
            "The initial billing period shall run from {} to {}.",
            format_date(self.start),
            format_date(self.end)
        )
    }

    pub fn quarterly_sentence(&self) -> String {
        let [q1, q2, q3, q4] = self.quarters.map(format_date);
        format!(
            "Thereafter, quarterly billing shall begin on {q1}, {q2}, {q3}, {q4}, and continue on {} each year.",
            self.recurring_pattern()
        )
    }
}

/// Rewrite the initial-period and quarterly sentences for the given period.
///
/// Fails with [`DocforgeError::PatternNotMatched`] when neither sentence is present.
pub fn replace_billing_cycle(text: &str, start: &str, end: &str) -> Result<Applied> {
    let cycle = BillingCycle::compute(parse_date(start)?, parse_date(end)?)?;

    let mut count = 0;
    let mut out = text.to_string();
    for (pattern, sentence) in [
        (INITIAL_PERIOD_PATTERN, cycle.initial_period_sentence()),
        (QUARTERLY_PATTERN, cycle.quarterly_sentence()),
    ] {
        let re = compile(pattern, false)?;
        let found = re.find_iter(&out).count();
        if found == 0 {
            tracing::debug!(pattern, "billing sentence not present");
            continue;
        }
        count += found;
        out = re.replace_all(&out, NoExpand(&sentence)).into_owned();
    }

    if count == 0 {
        return Err(DocforgeError::PatternNotMatched(
            "billing period sentences".into(),
        ));
    }
    Ok(Applied { text: out, count })
}

/// Replace the long-form date that directly follows `anchor` (e.g. `"effective as of "`).
pub fn replace_date_expression(text: &str, anchor: &str, value: &str) -> Result<Applied> {
    let date = parse_date(value)?;
    let months = MONTH_NAMES.join("|");
    let pattern = format!(r"(?P<anchor>{})(?:{months}) \d{{1,2}}, \d{{4}}", regex::escape(anchor));
    let re = compile(&pattern, false)?;

    let count = re.find_iter(text).count();
    if count == 0 {
        return Err(DocforgeError::PatternNotMatched(format!(
            "date after {anchor:?}"
        )));
    }
    let formatted = format_date(date);
    let out = re.replace_all(text, |caps: &Captures<'_>| {
        format!("{}{formatted}", &caps["anchor"])
    });
    Ok(Applied {
        text: out.into_owned(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(date(2026, 1, 1)), "January 1, 2026");
        assert_eq!(format_date(date(2025, 12, 31)), "December 31, 2025");
    }

    #[test]
    fn test_parse_both_formats() {
        assert_eq!(parse_date("2025-12-01").unwrap(), date(2025, 12, 1));
        assert_eq!(parse_date("02/28/2026").unwrap(), date(2026, 2, 28));
        assert!(matches!(
            parse_date("28.02.2026"),
            Err(DocforgeError::MalformedInput(_))
        ));
    }

    #[test]
    fn test_december_period_rolls_year() {
        let cycle = BillingCycle::compute(date(2025, 12, 1), date(2025, 12, 31)).unwrap();
        assert_eq!(cycle.first_billing, date(2026, 1, 1));
        assert_eq!(
            cycle.quarters,
            [date(2026, 1, 1), date(2026, 4, 1), date(2026, 7, 1), date(2026, 10, 1)]
        );
        assert_eq!(
            cycle.recurring_pattern(),
            "January 1, April 1, July 1, and October 1"
        );
    }

    #[test]
    fn test_quarters_cross_year() {
        let cycle = BillingCycle::compute(date(2026, 4, 15), date(2026, 5, 20)).unwrap();
        assert_eq!(cycle.first_billing, date(2026, 6, 1));
        assert_eq!(cycle.quarters[3], date(2027, 3, 1));
        assert_eq!(
            cycle.recurring_pattern(),
            "June 1, September 1, December 1, and March 1"
        );
    }

    #[test]
    fn test_reversed_period_rejected() {
        let err = BillingCycle::compute(date(2026, 2, 1), date(2026, 1, 1)).unwrap_err();
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_replace_billing_sentences() {
        let text = concat!(
            "<w:t>3.3. Fallyx shall invoice the Client quarterly. ",
            "The initial billing period shall run from December 1, 2025, to December 31, 2025. ",
            "Thereafter, quarterly billing shall begin on January 1, 2026, and continue on ",
            "January 1, April 1, July 1, and October 1 each year. If the Agreement</w:t>"
        );
        let out = replace_billing_cycle(text, "2026-02-01", "2026-02-28").unwrap();
        assert_eq!(out.count, 2);
        assert!(out
            .text
            .contains("The initial billing period shall run from February 1, 2026 to February 28, 2026."));
        assert!(out.text.contains(
            "Thereafter, quarterly billing shall begin on March 1, 2026, June 1, 2026, \
             September 1, 2026, December 1, 2026, and continue on March 1, June 1, \
             September 1, and December 1 each year. If the Agreement"
        ));
    }

    #[test]
    fn test_missing_sentences_not_matched() {
        let err = replace_billing_cycle("<w:t>no dates</w:t>", "2026-01-01", "2026-01-31").unwrap_err();
        assert!(matches!(err, DocforgeError::PatternNotMatched(_)));
    }

    #[test]
    fn test_date_expression() {
        let text = "<w:t>This Agreement is effective as of January 1, 2026 between</w:t>";
        let out = replace_date_expression(text, "effective as of ", "03/15/2026").unwrap();
        assert_eq!(
            out.text,
            "<w:t>This Agreement is effective as of March 15, 2026 between</w:t>"
        );
        let err = replace_date_expression(text, "shall terminate on ", "03/15/2026").unwrap_err();
        assert!(matches!(err, DocforgeError::PatternNotMatched(_)));
    }
}
