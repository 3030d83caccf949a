use chrono::NaiveDateTime;

use crate::models::{Booking, BookingHistory, BookingStatus};

/// Splits a requester's bookings into what is still ahead of them and
/// everything else. Both halves are ordered by start time, upcoming
/// soonest-first and past most-recent-first.
pub fn split_history(bookings: Vec<Booking>, now: &NaiveDateTime) -> BookingHistory {
    let (mut upcoming, mut past): (Vec<_>, Vec<_>) = bookings.into_iter().partition(|b| {
        b.end_time > *now
            && !matches!(b.status, BookingStatus::Cancelled | BookingStatus::Completed)
    });

    upcoming.sort_by(|a, b| a.start_time.cmp(&b.start_time));
    past.sort_by(|a, b| b.start_time.cmp(&a.start_time));

    BookingHistory { upcoming, past }
}
