//! To-do tasks, as they are exchanged with the task service

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

use crate::error::{Error, ParsePriorityError};


/// Formats a `Due::DateTime` is sent with (the same as an HTML `datetime-local` input)
const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M";
const WIRE_DATETIME_SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";

/// The date-time layouts accepted from the server, most common first
const ACCEPTED_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];


/// The opaque identifier of a task, as assigned by the task service.
///
/// Servers usually send integers, but this is not guaranteed, so the ID is kept as a string.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId {
    content: String,
}

impl TaskId {
    pub fn as_str(&self) -> &str {
        &self.content
    }
}
impl From<String> for TaskId {
    fn from(content: String) -> Self {
        Self { content }
    }
}
impl From<&str> for TaskId {
    fn from(content: &str) -> Self {
        Self { content: content.to_string() }
    }
}
impl From<u64> for TaskId {
    fn from(n: u64) -> Self {
        Self { content: n.to_string() }
    }
}
impl Display for TaskId {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.content)
    }
}

/// Used to support serde
impl Serialize for TaskId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Send numeric IDs back the way the server sent them
        match self.content.parse::<u64>() {
            Ok(n) => serializer.serialize_u64(n),
            Err(_) => serializer.serialize_str(&self.content),
        }
    }
}
/// Used to support serde
impl<'de> Deserialize<'de> for TaskId {
    fn deserialize<D>(deserializer: D) -> Result<TaskId, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Number(u64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Number(n) => TaskId::from(n),
            RawId::Text(s) => TaskId::from(s),
        })
    }
}



/// How urgent a task is.
///
/// The variants are declared in rank order, so that the derived `Ord` sorts `Urgent` first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Priority {
    Urgent,
    High,
    Medium,
    Low,
}

/// Rank given to tasks whose priority is not known, so that they sort after `Low`
pub const UNKNOWN_PRIORITY_RANK: u8 = 99;

impl Priority {
    /// The rank of this priority (1 for `Urgent`, 4 for `Low`)
    pub fn rank(&self) -> u8 {
        match self {
            Priority::Urgent => 1,
            Priority::High => 2,
            Priority::Medium => 3,
            Priority::Low => 4,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

impl FromStr for Priority {
    type Err = ParsePriorityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Priority::Urgent),
            "high" => Ok(Priority::High),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            _ => Err(ParsePriorityError(s.to_string())),
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for Priority {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}



/// When a task is due.
///
/// A date-only value is kept as a calendar date, and is never interpreted as a point in time of some timezone.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Due {
    /// A calendar day, without any time
    Date(NaiveDate),
    /// A day and a wall-clock time
    DateTime(NaiveDateTime),
    /// A value that could not be parsed. It is kept verbatim, so that it can still be displayed
    Malformed(String),
}

impl Due {
    /// Parse a due value, as sent by the server.
    ///
    /// Returns `None` for empty values. This never fails: unparseable values become `Due::Malformed`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        // A trailing 'T' with no time part is what some forms send when only a date was picked
        let date_part = trimmed.strip_suffix('T').unwrap_or(trimmed);
        if let Ok(date) = NaiveDate::parse_from_str(date_part, WIRE_DATE_FORMAT) {
            return Some(Due::Date(date));
        }

        for format in ACCEPTED_DATETIME_FORMATS.iter() {
            if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Some(Due::DateTime(dt));
            }
        }

        // The wall-clock time is what the user typed in; the offset is dropped
        if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(trimmed) {
            return Some(Due::DateTime(dt.naive_local()));
        }

        Some(Due::Malformed(raw.to_string()))
    }

    /// Build a due value from a date and an optional time (e.g. from two separate form inputs)
    pub fn from_parts(date: NaiveDate, time: Option<NaiveTime>) -> Self {
        match time {
            None => Due::Date(date),
            Some(t) => Due::DateTime(date.and_time(t)),
        }
    }

    /// Build a due value from the separate date (`YYYY-MM-DD`) and time (`HH:MM`) fields of a form.
    ///
    /// Empty fields are ignored. A time without a date is an error.
    pub fn from_form(date: Option<&str>, time: Option<&str>) -> Result<Option<Self>, Error> {
        let date = date.map(str::trim).filter(|d| d.is_empty() == false);
        let time = time.map(str::trim).filter(|t| t.is_empty() == false);

        let date = match (date, time) {
            (None, None) => return Ok(None),
            (None, Some(_)) => return Err(Error::InvalidTask("a due time needs a due date".to_string())),
            (Some(d), _) => NaiveDate::parse_from_str(d, WIRE_DATE_FORMAT)
                .map_err(|err| Error::InvalidTask(format!("invalid due date {:?}: {}", d, err)))?,
        };
        let time = match time {
            None => None,
            Some(t) => Some(NaiveTime::parse_from_str(t, "%H:%M")
                .map_err(|err| Error::InvalidTask(format!("invalid due time {:?}: {}", t, err)))?),
        };
        Ok(Some(Self::from_parts(date, time)))
    }

    /// The calendar day, unless this value is malformed
    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Due::Date(d) => Some(*d),
            Due::DateTime(dt) => Some(dt.date()),
            Due::Malformed(_) => None,
        }
    }

    /// The time of day, if any
    pub fn time(&self) -> Option<NaiveTime> {
        match self {
            Due::DateTime(dt) => Some(dt.time()),
            _ => None,
        }
    }

    /// The instant this value is due at. A date-only value is due at the very start of its day
    pub fn instant(&self) -> Option<NaiveDateTime> {
        match self {
            Due::Date(d) => d.and_hms_opt(0, 0, 0),
            Due::DateTime(dt) => Some(*dt),
            Due::Malformed(_) => None,
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, Due::Malformed(_))
    }
}

impl Display for Due {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        match self {
            Due::Date(d) => write!(f, "{}", d.format(WIRE_DATE_FORMAT)),
            Due::DateTime(dt) if dt.second() == 0 => write!(f, "{}", dt.format(WIRE_DATETIME_FORMAT)),
            Due::DateTime(dt) => write!(f, "{}", dt.format(WIRE_DATETIME_SECONDS_FORMAT)),
            Due::Malformed(raw) => write!(f, "{}", raw),
        }
    }
}

/// A task, as it is sent over the wire
#[derive(Clone, Debug, Serialize, Deserialize)]
struct TaskRecord {
    id: TaskId,
    task: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    priority: Option<String>,
    /// Missing and `null` both mean pending
    #[serde(default)]
    completed: Option<bool>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let due = record.date.as_deref().and_then(Due::parse);
        let (priority, unknown_priority) = match record.priority {
            None => (None, None),
            Some(raw) => match raw.parse::<Priority>() {
                Ok(p) => (Some(p), None),
                // Unknown priorities are not an error: the task is still displayed, with no priority
                Err(err) => {
                    log::debug!("Task {}: {}", record.id, err);
                    (None, Some(raw))
                },
            },
        };

        Self {
            id: record.id,
            description: record.task,
            due,
            priority,
            unknown_priority,
            completed: record.completed.unwrap_or(false),
        }
    }
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        let priority = match task.priority {
            Some(p) => Some(p.as_str().to_string()),
            None => task.unknown_priority,
        };
        Self {
            id: task.id,
            task: task.description,
            date: task.due.map(|d| d.to_string()),
            priority,
            completed: Some(task.completed),
        }
    }
}



/// A to-do task
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "TaskRecord", into = "TaskRecord")]
pub struct Task {
    id: TaskId,
    /// The free-text label of this task
    description: String,
    /// When this task is due
    due: Option<Due>,
    /// `None` when the server sent no priority, or a priority this crate does not know about
    priority: Option<Priority>,
    /// The raw priority value, in case it is not known to this crate
    unknown_priority: Option<String>,
    completed: bool,
}


impl Task {
    pub fn new(id: TaskId, description: String, due: Option<Due>, priority: Option<Priority>, completed: bool) -> Self {
        Self { id, description, due, priority, unknown_priority: None, completed }
    }

    pub fn id(&self) -> &TaskId             { &self.id          }
    pub fn description(&self) -> &str       { &self.description }
    pub fn due(&self) -> Option<&Due>       { self.due.as_ref() }
    pub fn priority(&self) -> Option<Priority> { self.priority  }
    pub fn unknown_priority(&self) -> Option<&str> { self.unknown_priority.as_deref() }
    pub fn completed(&self) -> bool         { self.completed    }

    /// The sort rank of this task's priority. Unknown priorities rank after `Low`
    pub fn priority_rank(&self) -> u8 {
        self.priority.map(|p| p.rank()).unwrap_or(UNKNOWN_PRIORITY_RANK)
    }

    /// Whether this task is overdue at the time this function is called.
    ///
    /// This depends on the current time, so that it should be evaluated again every time tasks are displayed.
    pub fn is_past_due_now(&self) -> bool {
        match &self.due {
            None => false,
            Some(due) => crate::format::is_past_due(due, Local::now().naive_local()),
        }
    }

    /// Set the completion status.
    ///
    /// Only task services should call this: clients must ask the service instead, and fetch the tasks again.
    pub(crate) fn set_completed(&mut self, completed: bool) {
        self.completed = completed;
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parse_due_values() {
        assert_eq!(Due::parse("2024-01-10"), Some(Due::Date(date(2024, 1, 10))));
        assert_eq!(Due::parse("2024-01-10T"), Some(Due::Date(date(2024, 1, 10))));
        assert_eq!(Due::parse("2024-01-10T09:00"), Some(Due::DateTime(date(2024, 1, 10).and_hms_opt(9, 0, 0).unwrap())));
        assert_eq!(Due::parse("2024-01-10T21:30:15"), Some(Due::DateTime(date(2024, 1, 10).and_hms_opt(21, 30, 15).unwrap())));
        assert_eq!(Due::parse("2024-01-10 08:05"), Some(Due::DateTime(date(2024, 1, 10).and_hms_opt(8, 5, 0).unwrap())));
        assert_eq!(Due::parse("2024-01-10T09:00:00+05:00"), Some(Due::DateTime(date(2024, 1, 10).and_hms_opt(9, 0, 0).unwrap())));
        assert_eq!(Due::parse(""), None);
        assert_eq!(Due::parse("   "), None);
        assert_eq!(Due::parse("next tuesday"), Some(Due::Malformed("next tuesday".to_string())));
        assert_eq!(Due::parse("2024-13-45"), Some(Due::Malformed("2024-13-45".to_string())));
    }

    #[test]
    fn due_display_is_the_wire_format() {
        assert_eq!(Due::parse("2024-01-10").unwrap().to_string(), "2024-01-10");
        assert_eq!(Due::parse("2024-01-10T09:00:00").unwrap().to_string(), "2024-01-10T09:00");
        assert_eq!(Due::parse("2024-01-10T21:30:15").unwrap().to_string(), "2024-01-10T21:30:15");
        assert_eq!(Due::parse("garbage").unwrap().to_string(), "garbage");
    }

    #[test]
    fn form_values() {
        assert_eq!(Due::from_form(None, None).unwrap(), None);
        assert_eq!(Due::from_form(Some(""), Some(" ")).unwrap(), None);
        assert_eq!(Due::from_form(Some("2024-01-10"), None).unwrap(), Some(Due::Date(date(2024, 1, 10))));
        assert_eq!(Due::from_form(Some("2024-01-10"), Some("17:45")).unwrap(),
                   Some(Due::DateTime(date(2024, 1, 10).and_hms_opt(17, 45, 0).unwrap())));
        assert!(matches!(Due::from_form(None, Some("17:45")), Err(Error::InvalidTask(_))));
        assert!(matches!(Due::from_form(Some("10/01/2024"), None), Err(Error::InvalidTask(_))));
        assert!(matches!(Due::from_form(Some("2024-01-10"), Some("5pm")), Err(Error::InvalidTask(_))));
    }

    #[test]
    fn priorities() {
        assert_eq!("urgent".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!("High".parse::<Priority>().unwrap(), Priority::High);
        assert_eq!(" LOW ".parse::<Priority>().unwrap(), Priority::Low);
        assert!("critical".parse::<Priority>().is_err());

        assert!(Priority::Urgent < Priority::High);
        assert!(Priority::Medium < Priority::Low);
        assert_eq!(Priority::Urgent.rank(), 1);
        assert_eq!(Priority::Low.rank(), 4);
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn deserialize_wire_records() {
        let json = r#"[
            {"id": 1, "task": "Buy milk", "date": "2024-01-10T09:00:00", "priority": "High", "completed": false},
            {"id": "abc", "task": "Call mom", "date": null, "priority": "someday", "completed": true},
            {"id": 3, "task": "Pay rent", "date": "the 1st", "priority": "low"},
            {"id": 4, "task": "Fix the bike", "date": "2024-01-11", "priority": "medium", "completed": null}
        ]"#;
        let tasks: Vec<Task> = serde_json::from_str(json).unwrap();

        assert_eq!(tasks[0].id(), &TaskId::from(1));
        assert_eq!(tasks[0].description(), "Buy milk");
        assert_eq!(tasks[0].priority(), Some(Priority::High));
        assert_eq!(tasks[0].due().and_then(|d| d.time()), NaiveTime::from_hms_opt(9, 0, 0));

        assert_eq!(tasks[1].id().as_str(), "abc");
        assert_eq!(tasks[1].due(), None);
        assert_eq!(tasks[1].priority(), None);
        assert_eq!(tasks[1].unknown_priority(), Some("someday"));
        assert_eq!(tasks[1].priority_rank(), UNKNOWN_PRIORITY_RANK);
        assert!(tasks[1].completed());

        assert_eq!(tasks[2].due(), Some(&Due::Malformed("the 1st".to_string())));
        assert!(tasks[2].completed() == false);

        // A null completion status does not make the whole list unreadable
        assert_eq!(tasks.len(), 4);
        assert_eq!(tasks[3].description(), "Fix the bike");
        assert!(tasks[3].completed() == false);
    }

    #[test]
    fn serialize_keeps_numeric_ids() {
        let task = Task::new(TaskId::from(7), "Walk the dog".to_string(), Due::parse("2024-03-02"), Some(Priority::Urgent), false);
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["id"], serde_json::json!(7));
        assert_eq!(value["task"], "Walk the dog");
        assert_eq!(value["date"], "2024-03-02");
        assert_eq!(value["priority"], "urgent");
        assert_eq!(value["completed"], false);
    }

    #[test]
    fn date_only_tasks_are_due_at_midnight() {
        let due = Due::parse("2024-01-10").unwrap();
        assert_eq!(due.instant(), Some(date(2024, 1, 10).and_hms_opt(0, 0, 0).unwrap()));
        assert_eq!(due.time(), None);
        assert_eq!(Due::Malformed("x".to_string()).instant(), None);
    }
}
