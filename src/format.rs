//! Pure functions that turn task values into display strings

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::projector::{DateGroup, Projection};
use crate::task::{Due, Priority, Task};

/// Two-digit hour, as in `09:05 AM`
const TIME_OF_DAY_FORMAT: &str = "%I:%M %p";
const CALENDAR_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Heading displayed for the group of tasks that have no (valid) due date
pub const UNDATED_HEADING: &str = "No due date";


/// Render a 24-hour `HH:MM` (or `HH:MM:SS`) value as a 12-hour time, e.g. `21:30` becomes `09:30 PM`.
///
/// An empty input gives an empty string, and unparseable input is returned unchanged.
pub fn format_time_of_day(time: &str) -> String {
    let trimmed = time.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S%.f"))
        .map(|t| t.format(TIME_OF_DAY_FORMAT).to_string())
        .unwrap_or_else(|_| time.to_string())
}

/// Render a `YYYY-MM-DD` value as `M/D/YYYY`.
///
/// The value is read as a calendar day and not as a point in time, so that the day that is displayed is the one that was meant, whatever the local timezone.
/// Unparseable input is returned unchanged.
pub fn format_calendar_date(date: &str) -> String {
    match NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d") {
        Ok(d) => format_date(d),
        Err(_) => date.to_string(),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(CALENDAR_DATE_FORMAT).to_string()
}

pub fn format_time(time: NaiveTime) -> String {
    time.format(TIME_OF_DAY_FORMAT).to_string()
}

/// Whether `due` is strictly earlier than `now`.
///
/// Date-only values are due at the start of their day. Malformed values are never past due.
pub fn is_past_due(due: &Due, now: NaiveDateTime) -> bool {
    match due.instant() {
        Some(instant) => instant < now,
        None => false,
    }
}

/// The CSS-like class used to highlight a priority
pub fn priority_class(priority: Option<Priority>) -> &'static str {
    match priority {
        Some(Priority::Urgent) => "priority-urgent",
        Some(Priority::High) => "priority-high",
        Some(Priority::Medium) => "priority-medium",
        Some(Priority::Low) => "priority-low",
        None => "priority-none",
    }
}

/// The label of a priority, falling back to the raw value the server sent
pub fn priority_label(task: &Task) -> &str {
    match task.priority() {
        Some(p) => p.as_str(),
        None => task.unknown_priority().unwrap_or("none"),
    }
}

/// The "Due: ..." line of a task, e.g. `1/10/2024 09:00 AM`.
///
/// Malformed values are displayed verbatim. Returns an empty string for tasks that have no due date.
pub fn format_due(due: Option<&Due>) -> String {
    match due {
        None => String::new(),
        Some(Due::Date(d)) => format_date(*d),
        Some(Due::DateTime(dt)) => format!("{} {}", format_date(dt.date()), format_time(dt.time())),
        Some(Due::Malformed(raw)) => raw.clone(),
    }
}

/// The heading of a date group
pub fn group_heading(group: &DateGroup) -> String {
    match group.date() {
        Some(d) => format_date(d),
        None => UNDATED_HEADING.to_string(),
    }
}


/// A debug utility that pretty-prints a projection
pub fn print_projection(projection: &Projection, now: NaiveDateTime) {
    if projection.pending().is_empty() {
        println!("No tasks found. Start by adding a new task!");
    }
    for group in projection.pending() {
        print_group(group, now);
    }

    if projection.completed().is_empty() == false {
        println!();
        println!("Completed tasks");
        for group in projection.completed() {
            print_group(group, now);
        }
    }
}

fn print_group(group: &DateGroup, now: NaiveDateTime) {
    println!("{}", group_heading(group));
    for task in group.tasks() {
        print_task(task, now);
    }
}

pub fn print_task(task: &Task, now: NaiveDateTime) {
    let completion = if task.completed() { "✓" } else { " " };
    let past_due = match task.due() {
        Some(due) if task.completed() == false && is_past_due(due, now) => "!",
        _ => " ",
    };
    let due = format_due(task.due());
    println!("    {}{} {}\t[{}]\t{}\t(id {})", completion, past_due, task.description(), priority_label(task), due, task.id());
}


#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("09:00", "09:00 AM")]
    #[case("00:15", "12:15 AM")]
    #[case("12:00", "12:00 PM")]
    #[case("21:30", "09:30 PM")]
    #[case("21:30:59", "09:30 PM")]
    #[case("", "")]
    #[case("soon", "soon")]
    #[case("25:00", "25:00")]
    fn time_of_day(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_time_of_day(input), expected);
    }

    #[rstest]
    #[case("2024-01-10", "1/10/2024")]
    #[case("2023-12-31", "12/31/2023")]
    #[case("2024-02-30", "2024-02-30")]
    #[case("tomorrow", "tomorrow")]
    #[case("", "")]
    fn calendar_date(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(format_calendar_date(input), expected);
    }

    #[test]
    fn past_due() {
        let now = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(9, 0, 0).unwrap();

        let before = Due::parse("2024-01-10T08:59").unwrap();
        let boundary = Due::parse("2024-01-10T09:00").unwrap();
        let after = Due::parse("2024-01-10T09:01").unwrap();
        assert!(is_past_due(&before, now));
        assert!(is_past_due(&boundary, now) == false);
        assert!(is_past_due(&after, now) == false);

        // Date-only values are due at the start of their day
        assert!(is_past_due(&Due::parse("2024-01-10").unwrap(), now));
        assert!(is_past_due(&Due::parse("2024-01-11").unwrap(), now) == false);
        let midnight = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert!(is_past_due(&Due::parse("2024-01-10").unwrap(), midnight) == false);

        assert!(is_past_due(&Due::Malformed("whenever".to_string()), now) == false);
    }

    #[test]
    fn due_lines() {
        assert_eq!(format_due(None), "");
        assert_eq!(format_due(Due::parse("2024-01-10").as_ref()), "1/10/2024");
        assert_eq!(format_due(Due::parse("2024-01-10T14:05").as_ref()), "1/10/2024 02:05 PM");
        assert_eq!(format_due(Due::parse("by friday").as_ref()), "by friday");
    }

    #[test]
    fn priority_classes() {
        assert_eq!(priority_class(Some(Priority::Urgent)), "priority-urgent");
        assert_eq!(priority_class(Some(Priority::Low)), "priority-low");
        assert_eq!(priority_class(None), "priority-none");
    }
}
