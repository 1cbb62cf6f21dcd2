//! Simulation calendar arithmetic.

use chrono::{Days, Months};
use concordat_protocol::{GameDate, TimeJump};

/// Advance a game date by one time jump.
///
/// Month and year jumps use calendar arithmetic (adding one month to
/// Jan 31 lands on the last day of February), matching how players read
/// "one month later". Day-count jumps saturate rather than overflow at the
/// edges of the representable range.
pub fn advance_date(date: GameDate, jump: &TimeJump) -> GameDate {
    match jump {
        TimeJump::Week => date.checked_add_days(Days::new(7)).unwrap_or(date),
        TimeJump::Month => date.checked_add_months(Months::new(1)).unwrap_or(date),
        TimeJump::ThreeMonths => date.checked_add_months(Months::new(3)).unwrap_or(date),
        TimeJump::SixMonths => date.checked_add_months(Months::new(6)).unwrap_or(date),
        TimeJump::Year => date.checked_add_months(Months::new(12)).unwrap_or(date),
        TimeJump::Days(n) => {
            if *n >= 0 {
                date.checked_add_days(Days::new(*n as u64)).unwrap_or(date)
            } else {
                date.checked_sub_days(Days::new(n.unsigned_abs())).unwrap_or(date)
            }
        }
    }
}
