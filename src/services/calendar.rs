use crate::models::{Booking, BookingStatus, Workspace};

const ICS_TIME: &str = "%Y%m%dT%H%M%SZ";

/// Escapes TEXT values per RFC 5545 §3.3.11.
fn escape_text(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace(';', "\\;")
        .replace(',', "\\,")
        .replace('\n', "\\n")
}

/// Content lines longer than this many octets are folded (RFC 5545 §3.1).
const MAX_LINE_OCTETS: usize = 75;

/// Splits a content line into physical lines of at most 75 octets, never
/// inside a UTF-8 sequence. Continuation lines start with a single space.
fn fold_line(line: &str) -> String {
    let mut folded = String::with_capacity(line.len() + line.len() / MAX_LINE_OCTETS * 3);
    let mut width = 0;
    for ch in line.chars() {
        if width + ch.len_utf8() > MAX_LINE_OCTETS {
            folded.push_str("\r\n ");
            width = 1;
        }
        folded.push(ch);
        width += ch.len_utf8();
    }
    folded
}

pub fn generate_ics(booking: &Booking, workspace: &Workspace, check_in_url: &str) -> String {
    let status = match booking.status {
        BookingStatus::Cancelled => "CANCELLED",
        BookingStatus::Pending => "TENTATIVE",
        _ => "CONFIRMED",
    };

    let lines = [
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        "PRODID:-//Deskbook//Workspace Booking//EN".to_string(),
        "BEGIN:VEVENT".to_string(),
        format!("UID:{}@deskbook", booking.id),
        format!("DTSTAMP:{}", booking.created_at.format(ICS_TIME)),
        format!("DTSTART:{}", booking.start_time.format(ICS_TIME)),
        format!("DTEND:{}", booking.end_time.format(ICS_TIME)),
        format!("SUMMARY:{}", escape_text(&format!("Booking at {}", workspace.name))),
        format!("LOCATION:{}", escape_text(&workspace.location)),
        format!("DESCRIPTION:{}", escape_text(&format!("Check in: {check_in_url}"))),
        format!("STATUS:{status}"),
        "END:VEVENT".to_string(),
        "END:VCALENDAR".to_string(),
    ];

    lines
        .iter()
        .map(|line| fold_line(line) + "\r\n")
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::queries::fixtures::{booking, dt};

    fn workspace() -> Workspace {
        Workspace {
            id: "ws-1".to_string(),
            owner_id: "owner-1".to_string(),
            name: "Loft, Desk 4".to_string(),
            description: String::new(),
            location: "Westlands; Nairobi".to_string(),
            category: "Coworking".to_string(),
            hourly_rate: Some(500),
            daily_rate: 3000,
            monthly_rate: None,
            images: vec![],
            created_at: dt("2025-01-01 00:00"),
        }
    }

    #[test]
    fn test_generate_ics() {
        let b = booking("test-123", "ws-1", "2025-03-15 14:00", "2025-03-15 15:30");
        let ics = generate_ics(&b, &workspace(), "https://deskbook.test/check-in/test-123");

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\n"));
        assert!(ics.contains("DTSTART:20250315T140000Z"));
        assert!(ics.contains("DTEND:20250315T153000Z"));
        assert!(ics.contains("UID:test-123@deskbook"));
        assert!(ics.contains("SUMMARY:Booking at Loft\\, Desk 4"));
        assert!(ics.contains("LOCATION:Westlands\\; Nairobi"));
        assert!(ics.contains("DESCRIPTION:Check in: https://deskbook.test/check-in/test-123"));
        assert!(ics.contains("STATUS:CONFIRMED"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
    }

    #[test]
    fn test_cancelled_booking_is_marked() {
        let mut b = booking("test-456", "ws-1", "2025-04-01 09:30", "2025-04-01 10:00");
        b.status = BookingStatus::Cancelled;
        let ics = generate_ics(&b, &workspace(), "https://deskbook.test/check-in/test-456");
        assert!(ics.contains("STATUS:CANCELLED"));
    }

    #[test]
    fn test_long_lines_are_folded() {
        let mut ws = workspace();
        ws.name = "Café Étoile ".repeat(12);
        let b = booking("test-789", "ws-1", "2025-04-01 09:30", "2025-04-01 10:00");
        let ics = generate_ics(&b, &ws, "https://deskbook.test/check-in/test-789");

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line too long: {line:?}");
        }
        let summary = ics
            .replace("\r\n ", "")
            .lines()
            .find(|l| l.starts_with("SUMMARY:"))
            .map(str::to_string)
            .unwrap();
        assert_eq!(summary, format!("SUMMARY:Booking at {}", ws.name));
        assert!(ics.contains("\r\n "));
    }

    #[test]
    fn test_short_lines_are_untouched() {
        assert_eq!(fold_line("STATUS:CONFIRMED"), "STATUS:CONFIRMED");
        let exact = "X".repeat(75);
        assert_eq!(fold_line(&exact), exact);
        let over = "X".repeat(76);
        assert_eq!(fold_line(&over), format!("{}\r\n X", "X".repeat(75)));
    }
}
