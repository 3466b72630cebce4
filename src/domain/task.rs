use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};

use super::audio::AudioClip;
use super::error::DomainError;

/// Priority tier of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    None,
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::None => "None",
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" => Ok(Priority::None),
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(DomainError::Validation(format!(
                "Unknown priority '{}', expected one of None, Low, Medium, High",
                other
            ))),
        }
    }
}

/// Inferred (or merged) intent for one task description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIntent {
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    /// True when inference failed and the fixed fallback was used.
    #[serde(default)]
    pub degraded: bool,
}

impl TaskIntent {
    pub fn new(priority: Priority, due_date: Option<NaiveDate>) -> Self {
        Self {
            priority,
            due_date,
            degraded: false,
        }
    }

    /// Substituted when classification or resolution fails.
    pub fn fallback() -> Self {
        Self {
            priority: Priority::Medium,
            due_date: None,
            degraded: true,
        }
    }

    /// Apply caller overrides; explicit fields win over inferred ones.
    #[must_use]
    pub fn merged_with(self, overrides: &TaskOverrides) -> Self {
        Self {
            priority: overrides.priority.unwrap_or(self.priority),
            due_date: overrides.due_date.unwrap_or(self.due_date),
            degraded: self.degraded,
        }
    }
}

/// Fields the caller set explicitly.
///
/// `due_date`: `None` = unspecified, `Some(None)` = explicitly no due date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskOverrides {
    #[serde(default)]
    pub priority: Option<Priority>,
    #[serde(
        default,
        deserialize_with = "deserialize_explicit",
        skip_serializing_if = "Option::is_none"
    )]
    pub due_date: Option<Option<NaiveDate>>,
}

fn deserialize_explicit<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Raw input for task creation, as decoded by the API layer.
#[derive(Debug, Default)]
pub struct TaskRequest {
    pub text: Option<String>,
    pub audio: Option<AudioClip>,
    pub overrides: TaskOverrides,
}

impl TaskRequest {
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn from_audio(audio: AudioClip) -> Self {
        Self {
            audio: Some(audio),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_overrides(mut self, overrides: TaskOverrides) -> Self {
        self.overrides = overrides;
        self
    }
}

/// Text the task was created from and its merged intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTask {
    pub text: String,
    #[serde(flatten)]
    pub intent: TaskIntent,
}

/// Fields an update should write. Unset fields keep their stored value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<NaiveDate>>,
}

impl From<TaskOverrides> for TaskPatch {
    fn from(overrides: TaskOverrides) -> Self {
        Self {
            priority: overrides.priority,
            due_date: overrides.due_date,
        }
    }
}

/// Parse a caller-supplied due date, normalizing timestamps to their date.
pub fn parse_due_date(value: &str) -> Result<NaiveDate, DomainError> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(value) {
        return Ok(ts.date_naive());
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S") {
        return Ok(ts.date());
    }

    Err(DomainError::Validation(format!(
        "Invalid due date '{}', expected YYYY-MM-DD",
        value
    )))
}
