//! Weekly timetable

use serde::{Deserialize, Serialize};
use studysync_store::{Entity, Record};

/// Days in the internal week, Monday = 0 .. Sunday = 6
pub const DAYS_PER_WEEK: u8 = 7;

/// A recurring weekly class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimetableClass {
    /// Document id
    pub id: String,
    /// Day index, Monday = 0 .. Sunday = 6
    pub day: u8,
    /// Start time `HH:MM`
    pub time: String,
    /// Length in minutes
    #[serde(default)]
    pub duration: u32,
    /// Subject label
    pub subject: String,
    /// Class kind (lecture, lab, ...)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Display colour
    #[serde(default)]
    pub color: String,
}

impl Record for TimetableClass {
    fn validate(&self) -> Result<(), String> {
        if self.day >= DAYS_PER_WEEK {
            return Err(format!("day {} out of range 0..7", self.day));
        }
        Ok(())
    }
}

impl Entity for TimetableClass {
    const COLLECTION: &'static str = "timetable";
    const ID_PREFIX: &'static str = "class";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Caller-supplied fields of a new class
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewClass {
    /// Day index, Monday = 0 .. Sunday = 6
    pub day: u8,
    /// Start time `HH:MM`
    pub time: String,
    /// Length in minutes
    pub duration: u32,
    /// Subject label
    pub subject: String,
    /// Class kind
    #[serde(rename = "type")]
    pub kind: String,
    /// Display colour
    pub color: String,
}

impl NewClass {
    /// Materialize with an id
    #[must_use]
    pub fn into_class(self, id: String) -> TimetableClass {
        TimetableClass {
            id,
            day: self.day,
            time: self.time,
            duration: self.duration,
            subject: self.subject,
            kind: self.kind,
            color: self.color,
        }
    }
}

/// Subset of mutable class fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassPatch {
    /// New day
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day: Option<u8>,
    /// New start time
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    /// New length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    /// New subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_seven_is_invalid() {
        let class = NewClass {
            day: 7,
            ..NewClass::default()
        }
        .into_class("c".into());
        assert!(class.validate().is_err());
    }
}
