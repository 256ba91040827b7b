use std::{fmt, str::FromStr, sync::LazyLock};

use anyhow::{Context, bail, ensure};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::{EnumIter, IntoStaticStr, VariantArray};

use crate::color::DEFAULT_FILL;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([0-1]?[0-9]|2[0-3]):([0-5][0-9])$").expect("time pattern is valid")
});

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    EnumIter,
    IntoStaticStr,
    VariantArray,
)]
pub enum Priority {
    High = 1,
    #[default]
    Medium = 2,
    Low = 3,
}

impl Priority {
    pub fn from_level(level: u8) -> anyhow::Result<Self> {
        match level {
            1 => Ok(Priority::High),
            2 => Ok(Priority::Medium),
            3 => Ok(Priority::Low),
            other => bail!("Priority must be 1 (High), 2 (Medium) or 3 (Low), got {other}"),
        }
    }

    pub fn level(&self) -> u8 {
        *self as u8
    }

    pub fn name(&self) -> &'static str {
        self.into()
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Priority {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(self.level())
    }
}

impl<'de> Deserialize<'de> for Priority {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u8::deserialize(deserializer)?;
        Priority::from_level(level).map_err(serde::de::Error::custom)
    }
}

/// Wall-clock time of an event, 24-hour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EventTime {
    pub hour: u8,
    pub minute: u8,
}

impl EventTime {
    /// Parses an optional time field; blank input means "no time".
    pub fn parse_optional(s: &str) -> anyhow::Result<Option<Self>> {
        let s = s.trim();
        if s.is_empty() {
            Ok(None)
        } else {
            s.parse().map(Some)
        }
    }

    pub fn minutes(&self) -> u32 {
        self.hour as u32 * 60 + self.minute as u32
    }
}

impl FromStr for EventTime {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let captures = TIME_PATTERN
            .captures(s)
            .context("Invalid time format. Use HH:MM (24-hour).")?;
        Ok(Self {
            hour: captures[1].parse()?,
            minute: captures[2].parse()?,
        })
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "EventRecord", try_from = "Value")]
pub struct Event {
    pub text: String,
    pub color: Option<String>,
    pub time: Option<EventTime>,
    pub priority: Priority,
}

impl Event {
    /// Builds an event from raw form input.
    pub fn from_input(
        text: &str,
        time: &str,
        priority: Priority,
        color: Option<String>,
    ) -> anyhow::Result<Self> {
        let text = text.trim();
        ensure!(!text.is_empty(), "Event description cannot be empty.");
        let time = EventTime::parse_optional(time)?;
        let color = color
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        Ok(Self {
            text: text.to_string(),
            color,
            time,
            priority,
        })
    }

    pub fn time_label(&self) -> String {
        self.time
            .map(|t| t.to_string())
            .unwrap_or_else(|| "N/A".into())
    }

    pub fn summary(&self) -> String {
        format!(
            "{} (Time: {}, Priority: {})",
            self.text,
            self.time_label(),
            self.priority
        )
    }
}

/// On-disk shape of an event: `[text, color, "HH:MM" or "", priority]`.
#[derive(Debug, Clone, Serialize)]
struct EventRecord(String, Option<String>, String, u8);

impl From<Event> for EventRecord {
    fn from(event: Event) -> Self {
        EventRecord(
            event.text,
            event.color,
            event.time.map(|t| t.to_string()).unwrap_or_default(),
            event.priority.level(),
        )
    }
}

/// Reads a record by position. Older or hand-written files may carry fewer
/// columns, extra columns, or just the text. Unreadable colour, time and
/// priority fields fall back on their own instead of failing the record.
impl TryFrom<Value> for Event {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        let fields = match value {
            Value::Array(fields) => fields,
            Value::String(text) => vec![Value::String(text)],
            other => bail!("Expected an event record, got {other}"),
        };
        let mut fields = fields.into_iter();
        let text = match fields.next() {
            Some(Value::String(text)) => text,
            Some(value @ (Value::Number(_) | Value::Bool(_))) => value.to_string(),
            Some(other) => bail!("Event text must be a string, got {other}"),
            None => bail!("Event record is empty"),
        };
        let color = match fields.next() {
            None => Some(DEFAULT_FILL.to_string()),
            Some(Value::Null) => None,
            Some(Value::String(color)) => Some(color),
            Some(other) => {
                log::warn!("Ignoring colour {other} of event {text:?}");
                None
            }
        };
        let time = match fields.next() {
            None | Some(Value::Null) => None,
            Some(Value::String(time)) => EventTime::parse_optional(&time).unwrap_or_else(|err| {
                log::warn!("Dropping unreadable time {time:?} of event {text:?}: {err}");
                None
            }),
            Some(other) => {
                log::warn!("Dropping unreadable time {other} of event {text:?}");
                None
            }
        };
        let priority = match fields.next() {
            None | Some(Value::Null) => Priority::default(),
            Some(level) => level
                .as_u64()
                .and_then(|level| u8::try_from(level).ok())
                .context("not a small integer")
                .and_then(Priority::from_level)
                .unwrap_or_else(|err| {
                    log::warn!("Priority {level} of event {text:?}: {err:#}; using Medium");
                    Priority::Medium
                }),
        };
        if fields.len() > 0 {
            log::debug!("Ignoring {} extra fields of event {text:?}", fields.len());
        }
        Ok(Event {
            text,
            color,
            time,
            priority,
        })
    }
}
