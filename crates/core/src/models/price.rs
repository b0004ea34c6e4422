use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A single price sample (date → native-currency price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Find the latest sample dated on or before `date`.
///
/// The history is not required to be pre-sorted — reads behave as if it
/// were sorted ascending. When several samples share the winning date
/// (possible only transiently, between a stray write and the next
/// same-day collapse), the last one in the sequence wins.
pub fn latest_on_or_before(history: &[PricePoint], date: NaiveDate) -> Option<&PricePoint> {
    let mut best: Option<&PricePoint> = None;
    for point in history {
        if point.date > date {
            continue;
        }
        match best {
            Some(b) if b.date > point.date => {}
            _ => best = Some(point),
        }
    }
    best
}

/// Append a sample, or overwrite the last sample's price in place when it
/// carries the same calendar date. Re-running a refresh twice in one day is
/// therefore a no-op beyond the final value: at most one point per date.
pub fn append_or_update(history: &mut Vec<PricePoint>, date: NaiveDate, price: f64) {
    match history.last_mut() {
        Some(last) if last.date == date => last.price = price,
        _ => history.push(PricePoint { date, price }),
    }
}

/// Replace the anchor sample at index 0 (creating it when the history is
/// empty). The anchor represents the cost-basis price at purchase and is
/// overwritten — never duplicated — whenever quantity/cost/date are edited.
pub fn reanchor(history: &mut Vec<PricePoint>, buy_date: NaiveDate, price: f64) {
    let anchor = PricePoint {
        date: buy_date,
        price,
    };
    if history.is_empty() {
        history.push(anchor);
    } else {
        history[0] = anchor;
    }
}
