use chrono::{DateTime, Datelike, Days, NaiveDate, Utc};

use super::status::{OrderStatus, PaymentStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateRangePreset {
    Today,
    /// Trailing 7 days, inclusive of today.
    Weeks,
    /// Calendar month to date.
    Months,
    /// Trailing 3 calendar months.
    Months3,
    /// Caller-supplied custom range expected to align to a calendar quarter;
    /// carries no implicit bounds of its own.
    Quarter,
}

impl DateRangePreset {
    pub fn parse(s: &str) -> Option<DateRangePreset> {
        match s {
            "today" => Some(DateRangePreset::Today),
            "weeks" => Some(DateRangePreset::Weeks),
            "months" => Some(DateRangePreset::Months),
            "months3" => Some(DateRangePreset::Months3),
            "quarter" => Some(DateRangePreset::Quarter),
            _ => None,
        }
    }
}

/// Which order timestamp a report range filters on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateFilterType {
    Created,
    /// Cash-basis reporting: filter on when payment was received.
    #[default]
    Payment,
}

impl DateFilterType {
    pub fn parse(s: &str) -> Option<DateFilterType> {
        match s {
            "created" => Some(DateFilterType::Created),
            "payment" => Some(DateFilterType::Payment),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeLabel {
    Today(NaiveDate),
    WeekEnding(NaiveDate),
    MonthOf(NaiveDate),
    Last3MonthsTo(NaiveDate),
    Quarter(u32, i32),
    Custom(NaiveDate, NaiveDate),
    AllTime,
}

/// Resolved date bounds plus the label used for the report filename.
/// `start`/`end` are `None` for the unbounded "all time" report.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub label: RangeLabel,
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_opt(0, 0, 0).expect("valid time").and_utc()
}

fn end_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_hms_milli_opt(23, 59, 59, 999)
        .expect("valid time")
        .and_utc()
}

fn first_of_month_back(date: NaiveDate, months_back: u32) -> NaiveDate {
    let total = date.year() * 12 + date.month0() as i32 - months_back as i32;
    NaiveDate::from_ymd_opt(total.div_euclid(12), total.rem_euclid(12) as u32 + 1, 1)
        .expect("valid date")
}

fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let first_of_next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    first_of_next.expect("valid date").pred_opt().expect("valid date")
}

/// Detect a range exactly covering one calendar quarter: it must start on the
/// 1st of Jan/Apr/Jul/Oct and end on the last day of the matching quarter in
/// the same year. Returns (quarter ordinal, year).
pub fn quarter_of(start: NaiveDate, end: NaiveDate) -> Option<(u32, i32)> {
    if start.day() != 1 || start.year() != end.year() {
        return None;
    }
    let quarter = match (start.month(), end.month()) {
        (1, 3) => 1,
        (4, 6) => 2,
        (7, 9) => 3,
        (10, 12) => 4,
        _ => return None,
    };
    if end != last_day_of_month(end.year(), end.month()) {
        return None;
    }
    Some((quarter, start.year()))
}

/// Resolve report bounds. Priority: explicit custom start+end dates override
/// any named preset, which overrides "all time" (no bounds).
pub fn resolve_range(
    preset: Option<DateRangePreset>,
    custom_start: Option<NaiveDate>,
    custom_end: Option<NaiveDate>,
    now: DateTime<Utc>,
) -> ResolvedRange {
    if let (Some(start), Some(end)) = (custom_start, custom_end) {
        let label = match quarter_of(start, end) {
            Some((quarter, year)) => RangeLabel::Quarter(quarter, year),
            None => RangeLabel::Custom(start, end),
        };
        return ResolvedRange {
            start: Some(start_of_day(start)),
            end: Some(end_of_day(end)),
            label,
        };
    }

    let today = now.date_naive();
    match preset {
        Some(DateRangePreset::Today) => ResolvedRange {
            start: Some(start_of_day(today)),
            end: Some(end_of_day(today)),
            label: RangeLabel::Today(today),
        },
        Some(DateRangePreset::Weeks) => {
            let start = today.checked_sub_days(Days::new(6)).expect("valid date");
            ResolvedRange {
                start: Some(start_of_day(start)),
                end: Some(end_of_day(today)),
                label: RangeLabel::WeekEnding(today),
            }
        }
        Some(DateRangePreset::Months) => ResolvedRange {
            start: Some(start_of_day(first_of_month_back(today, 0))),
            end: Some(end_of_day(today)),
            label: RangeLabel::MonthOf(today),
        },
        Some(DateRangePreset::Months3) => ResolvedRange {
            start: Some(start_of_day(first_of_month_back(today, 2))),
            end: Some(end_of_day(today)),
            label: RangeLabel::Last3MonthsTo(today),
        },
        // Quarter without custom dates has nothing to anchor on.
        Some(DateRangePreset::Quarter) | None => ResolvedRange {
            start: None,
            end: None,
            label: RangeLabel::AllTime,
        },
    }
}

/// 1 → "1st", 2 → "2nd", 11–13 → "11th".."13th", 21 → "21st", ...
pub fn ordinal_day(day: u32) -> String {
    let suffix = match day % 100 {
        11..=13 => "th",
        _ => match day % 10 {
            1 => "st",
            2 => "nd",
            3 => "rd",
            _ => "th",
        },
    };
    format!("{}{}", day, suffix)
}

fn day_token(date: NaiveDate) -> String {
    format!(
        "{}-{}-{}",
        date.format("%b"),
        ordinal_day(date.day()),
        date.year()
    )
}

impl RangeLabel {
    fn token(&self) -> String {
        match self {
            RangeLabel::Today(date) => format!("Today-{}", day_token(*date)),
            RangeLabel::WeekEnding(date) => format!("Week-ending-{}", day_token(*date)),
            RangeLabel::MonthOf(date) => format!("Month-of-{}-{}", date.format("%b"), date.year()),
            RangeLabel::Last3MonthsTo(date) => format!("Last-3-Months-to-{}", day_token(*date)),
            RangeLabel::Quarter(quarter, year) => format!("Q{}-{}", quarter, year),
            RangeLabel::Custom(start, end) => {
                format!("{}-to-{}", start.format("%Y-%m-%d"), end.format("%Y-%m-%d"))
            }
            RangeLabel::AllTime => "All-Time".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    Orders,
    Earnings,
}

impl ReportKind {
    fn base_name(&self) -> &'static str {
        match self {
            ReportKind::Orders => "Orders",
            ReportKind::Earnings => "Earnings",
        }
    }
}

fn status_token(status: OrderStatus) -> &'static str {
    match status {
        OrderStatus::Pending => "Pending",
        OrderStatus::Processing => "Processing",
        OrderStatus::Completed => "Completed",
        OrderStatus::Cancelled => "Cancelled",
    }
}

fn payment_token(payment: PaymentStatus) -> &'static str {
    match payment {
        PaymentStatus::Pending => "Unpaid",
        PaymentStatus::Completed => "Paid",
    }
}

/// Deterministic report filename. Downstream consumers key off these names,
/// so the mapping is fixed by the unit tests below.
pub fn report_filename(
    kind: ReportKind,
    status: Option<OrderStatus>,
    payment: Option<PaymentStatus>,
    label: &RangeLabel,
) -> String {
    let mut parts: Vec<String> = Vec::new();
    if let Some(status) = status {
        parts.push(status_token(status).to_string());
    }
    if let Some(payment) = payment {
        parts.push(payment_token(payment).to_string());
    }
    parts.push(kind.base_name().to_string());
    parts.push(label.token());
    format!("{}.xlsx", parts.join("-"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 8, 23, 14, 30, 0).unwrap()
    }

    #[test]
    fn weeks_preset_spans_trailing_seven_days_inclusive() {
        let range = resolve_range(Some(DateRangePreset::Weeks), None, None, fixed_now());
        assert_eq!(
            range.start,
            Some(Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap())
        );
        assert_eq!(
            range.end,
            Some(
                Utc.with_ymd_and_hms(2026, 8, 23, 23, 59, 59)
                    .unwrap()
                    .checked_add_signed(chrono::Duration::milliseconds(999))
                    .unwrap()
            )
        );
    }

    #[test]
    fn custom_dates_override_preset() {
        let range = resolve_range(
            Some(DateRangePreset::Today),
            Some(date(2026, 2, 10)),
            Some(date(2026, 2, 12)),
            fixed_now(),
        );
        assert_eq!(range.start, Some(start_of_day(date(2026, 2, 10))));
        assert_eq!(range.end, Some(end_of_day(date(2026, 2, 12))));
        assert_eq!(
            range.label,
            RangeLabel::Custom(date(2026, 2, 10), date(2026, 2, 12))
        );
    }

    #[test]
    fn custom_start_alone_does_not_override() {
        let range = resolve_range(
            Some(DateRangePreset::Today),
            Some(date(2026, 2, 10)),
            None,
            fixed_now(),
        );
        assert_eq!(range.label, RangeLabel::Today(date(2026, 8, 23)));
    }

    #[test]
    fn months_preset_is_month_to_date() {
        let range = resolve_range(Some(DateRangePreset::Months), None, None, fixed_now());
        assert_eq!(range.start, Some(start_of_day(date(2026, 8, 1))));
        assert_eq!(range.end, Some(end_of_day(date(2026, 8, 23))));
    }

    #[test]
    fn months3_preset_anchors_two_months_back() {
        let range = resolve_range(Some(DateRangePreset::Months3), None, None, fixed_now());
        assert_eq!(range.start, Some(start_of_day(date(2026, 6, 1))));

        // Year boundary: anchored in the previous year.
        let january = Utc.with_ymd_and_hms(2026, 1, 15, 9, 0, 0).unwrap();
        let range = resolve_range(Some(DateRangePreset::Months3), None, None, january);
        assert_eq!(range.start, Some(start_of_day(date(2025, 11, 1))));
    }

    #[test]
    fn no_preset_means_all_time() {
        let range = resolve_range(None, None, None, fixed_now());
        assert_eq!(range.start, None);
        assert_eq!(range.end, None);
        assert_eq!(range.label, RangeLabel::AllTime);
    }

    #[test]
    fn quarter_preset_without_custom_dates_is_unbounded() {
        let range = resolve_range(Some(DateRangePreset::Quarter), None, None, fixed_now());
        assert_eq!(range.label, RangeLabel::AllTime);
    }

    #[test]
    fn exact_quarter_ranges_are_detected() {
        assert_eq!(quarter_of(date(2026, 1, 1), date(2026, 3, 31)), Some((1, 2026)));
        assert_eq!(quarter_of(date(2026, 4, 1), date(2026, 6, 30)), Some((2, 2026)));
        assert_eq!(quarter_of(date(2026, 7, 1), date(2026, 9, 30)), Some((3, 2026)));
        assert_eq!(quarter_of(date(2026, 10, 1), date(2026, 12, 31)), Some((4, 2026)));
    }

    #[test]
    fn near_quarter_ranges_are_not_detected() {
        // Wrong start day
        assert_eq!(quarter_of(date(2026, 4, 2), date(2026, 6, 30)), None);
        // Short by one day
        assert_eq!(quarter_of(date(2026, 4, 1), date(2026, 6, 29)), None);
        // Crosses a year boundary
        assert_eq!(quarter_of(date(2025, 10, 1), date(2026, 12, 31)), None);
        // Not a quarter-shaped month span
        assert_eq!(quarter_of(date(2026, 2, 1), date(2026, 4, 30)), None);
    }

    #[test]
    fn quarter_shaped_custom_range_names_by_quarter() {
        let range = resolve_range(
            None,
            Some(date(2026, 4, 1)),
            Some(date(2026, 6, 30)),
            fixed_now(),
        );
        assert_eq!(range.label, RangeLabel::Quarter(2, 2026));
        let name = report_filename(ReportKind::Earnings, None, None, &range.label);
        assert_eq!(name, "Earnings-Q2-2026.xlsx");
    }

    #[test]
    fn ordinal_suffixes() {
        assert_eq!(ordinal_day(1), "1st");
        assert_eq!(ordinal_day(2), "2nd");
        assert_eq!(ordinal_day(3), "3rd");
        assert_eq!(ordinal_day(4), "4th");
        assert_eq!(ordinal_day(11), "11th");
        assert_eq!(ordinal_day(12), "12th");
        assert_eq!(ordinal_day(13), "13th");
        assert_eq!(ordinal_day(21), "21st");
        assert_eq!(ordinal_day(22), "22nd");
        assert_eq!(ordinal_day(23), "23rd");
        assert_eq!(ordinal_day(31), "31st");
    }

    #[test]
    fn filename_mapping() {
        assert_eq!(
            report_filename(
                ReportKind::Orders,
                None,
                None,
                &RangeLabel::Today(date(2026, 8, 23))
            ),
            "Orders-Today-Aug-23rd-2026.xlsx"
        );
        assert_eq!(
            report_filename(
                ReportKind::Orders,
                Some(OrderStatus::Pending),
                Some(PaymentStatus::Pending),
                &RangeLabel::WeekEnding(date(2026, 8, 23))
            ),
            "Pending-Unpaid-Orders-Week-ending-Aug-23rd-2026.xlsx"
        );
        assert_eq!(
            report_filename(
                ReportKind::Orders,
                Some(OrderStatus::Completed),
                Some(PaymentStatus::Completed),
                &RangeLabel::MonthOf(date(2026, 8, 1))
            ),
            "Completed-Paid-Orders-Month-of-Aug-2026.xlsx"
        );
        assert_eq!(
            report_filename(
                ReportKind::Earnings,
                None,
                None,
                &RangeLabel::Last3MonthsTo(date(2026, 8, 1))
            ),
            "Earnings-Last-3-Months-to-Aug-1st-2026.xlsx"
        );
        assert_eq!(
            report_filename(ReportKind::Orders, None, None, &RangeLabel::AllTime),
            "Orders-All-Time.xlsx"
        );
        assert_eq!(
            report_filename(
                ReportKind::Orders,
                None,
                None,
                &RangeLabel::Custom(date(2026, 2, 10), date(2026, 2, 12))
            ),
            "Orders-2026-02-10-to-2026-02-12.xlsx"
        );
    }
}
