//! TaskPilot board items.

use chrono::{DateTime, Utc};

use crate::codec::{Entity, Record, RecordReader, RecordWriter, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: u64,
    pub title: String,
    pub description: String,
    /// Higher is more urgent.
    pub priority: i32,
    pub completed: bool,
    pub due: Option<DateTime<Utc>>,
    /// Paths of attached files.
    pub attachments: Vec<String>,
}

impl TaskItem {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: 0,
            title: title.into(),
            description: String::new(),
            priority: 0,
            completed: false,
            due: None,
            attachments: Vec::new(),
        }
    }

    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.due.is_some_and(|due| due < now)
    }
}

impl Record for TaskItem {
    fn encode(&self, w: &mut RecordWriter) -> Result<()> {
        w.write_u64(self.id);
        w.write_str(&self.title)?;
        w.write_str(&self.description)?;
        w.write_i32(self.priority);
        w.write_bool(self.completed);
        w.write_opt_timestamp(self.due.as_ref());
        w.write_str_list(&self.attachments)
    }

    fn decode(r: &mut RecordReader<'_>) -> Result<Self> {
        Ok(Self {
            id: r.read_u64()?,
            title: r.read_string()?,
            description: r.read_string()?,
            priority: r.read_i32()?,
            completed: r.read_bool()?,
            due: r.read_opt_timestamp()?,
            attachments: r.read_str_list()?,
        })
    }
}

impl Entity for TaskItem {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Open tasks first, then by descending priority, then by earliest due date.
pub fn sort_for_display(tasks: &mut [TaskItem]) {
    tasks.sort_by(|a, b| {
        a.completed
            .cmp(&b.completed)
            .then(b.priority.cmp(&a.priority))
            .then_with(|| match (a.due, b.due) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.id.cmp(&b.id),
            })
    });
}
