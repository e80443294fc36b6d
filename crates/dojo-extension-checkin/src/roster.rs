//! Gym roster: members, today's classes and their attendance.

use crate::fuzzy::{best_match, DEFAULT_MIN_SCORE};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use thiserror::Error;
use tokio::sync::RwLock;

/// Roster errors.
#[derive(Debug, Error)]
pub enum CheckInError {
    #[error("member not found: {0}")]
    UnknownMember(String),

    #[error("class not found: {0}")]
    UnknownClass(String),

    #[error("{member} is already checked in to {class}")]
    AlreadyCheckedIn { member: String, class: String },

    #[error("{class} is full ({max} attendees)")]
    ClassFull { class: String, max: u32 },

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Belt {
    White,
    Blue,
    Purple,
    Brown,
    Black,
}

impl std::fmt::Display for Belt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::White => "white",
            Self::Blue => "blue",
            Self::Purple => "purple",
            Self::Brown => "brown",
            Self::Black => "black",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ClassTag {
    Kids,
    Yoga,
    Mma,
    Bjj,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: String,
    pub name: String,
    pub belt: Belt,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub initials: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GymClass {
    pub id: String,
    pub name: String,
    pub time: String,
    pub end_time: String,
    #[serde(default)]
    pub tags: Vec<ClassTag>,
    pub instructor: Instructor,
    /// Member ids, in check-in order.
    #[serde(default)]
    pub attendees: Vec<String>,
    pub max_attendees: u32,
}

impl GymClass {
    pub fn is_full(&self) -> bool {
        self.attendees.len() >= self.max_attendees as usize
    }
}

/// Serializable roster snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterData {
    pub members: Vec<Member>,
    pub classes: Vec<GymClass>,
}

impl RosterData {
    fn validate(&self) -> Result<(), CheckInError> {
        let mut member_ids = HashSet::new();
        for member in &self.members {
            if !member_ids.insert(member.id.as_str()) {
                return Err(CheckInError::InvalidRoster(format!(
                    "duplicate member id {:?}",
                    member.id
                )));
            }
        }
        let mut class_ids = HashSet::new();
        for class in &self.classes {
            if !class_ids.insert(class.id.as_str()) {
                return Err(CheckInError::InvalidRoster(format!(
                    "duplicate class id {:?}",
                    class.id
                )));
            }
            let unknown = class
                .attendees
                .iter()
                .find(|id| !member_ids.contains(id.as_str()));
            if let Some(unknown) = unknown {
                return Err(CheckInError::InvalidRoster(format!(
                    "class {:?} lists unknown attendee {unknown:?}",
                    class.id
                )));
            }
        }
        Ok(())
    }
}

/// Outcome of a successful check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReceipt {
    pub member_id: String,
    pub member_name: String,
    pub class_id: String,
    pub class_name: String,
    pub attendees: usize,
    pub max_attendees: u32,
}

struct RosterState {
    data: RosterData,
    /// Receipts by idempotency key, so a replayed check-in is reported once.
    applied: HashMap<String, CheckInReceipt>,
}

/// Shared, mutable roster.
pub struct Roster {
    state: RwLock<RosterState>,
}

impl Roster {
    pub fn new(data: RosterData) -> Result<Self, CheckInError> {
        data.validate()?;
        Ok(Self {
            state: RwLock::new(RosterState {
                data,
                applied: HashMap::new(),
            }),
        })
    }

    pub fn from_json_str(raw: &str) -> Result<Self, CheckInError> {
        let data: RosterData =
            serde_json::from_str(raw).map_err(|e| CheckInError::InvalidRoster(e.to_string()))?;
        Self::new(data)
    }

    /// Load a roster JSON file.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, CheckInError> {
        let raw = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_json_str(&raw)
    }

    /// Built-in roster used when none is configured.
    pub fn sample() -> Self {
        let instructor = |id: &str, name: &str, initials: &str| Instructor {
            id: id.to_string(),
            name: name.to_string(),
            initials: initials.to_string(),
        };
        let member = |id: &str, name: &str, belt| Member {
            id: id.to_string(),
            name: name.to_string(),
            belt,
        };
        let class = |id: &str, name: &str, slot: (&str, &str), tags: Vec<ClassTag>, instructor, max| {
            GymClass {
                id: id.to_string(),
                name: name.to_string(),
                time: slot.0.to_string(),
                end_time: slot.1.to_string(),
                tags,
                instructor,
                attendees: Vec::new(),
                max_attendees: max,
            }
        };
        let data = RosterData {
            members: vec![
                member("m1", "Bob Johnson", Belt::Blue),
                member("m2", "Alice Chen", Belt::Purple),
                member("m3", "Marcus Silva", Belt::Black),
                member("m4", "Priya Patel", Belt::White),
                member("m5", "Tom Becker", Belt::Brown),
            ],
            classes: vec![
                class(
                    "c1",
                    "BJJ / Grappling",
                    ("10:00", "11:00"),
                    vec![ClassTag::Bjj, ClassTag::Mma],
                    instructor("i1", "Lautaro S.", "LS"),
                    30,
                ),
                class(
                    "c2",
                    "Kids BJJ",
                    ("11:30", "12:30"),
                    vec![ClassTag::Kids, ClassTag::Bjj],
                    instructor("i2", "Maria G.", "MG"),
                    20,
                ),
                class(
                    "c3",
                    "Yoga Flow",
                    ("13:00", "14:00"),
                    vec![ClassTag::Yoga],
                    instructor("i3", "John D.", "JD"),
                    25,
                ),
                class(
                    "c4",
                    "MMA Striking",
                    ("14:30", "15:30"),
                    vec![ClassTag::Mma],
                    instructor("i4", "Sarah K.", "SK"),
                    30,
                ),
                class(
                    "c5",
                    "Jiu Jitsu",
                    ("18:00", "19:30"),
                    vec![ClassTag::Bjj],
                    instructor("i5", "Carlos R.", "CR"),
                    30,
                ),
            ],
        };
        Self {
            state: RwLock::new(RosterState {
                data,
                applied: HashMap::new(),
            }),
        }
    }

    pub async fn snapshot(&self) -> RosterData {
        self.state.read().await.data.clone()
    }

    /// Resolve a spoken member name to a roster entry.
    pub async fn find_member(&self, name: &str) -> Option<Member> {
        let state = self.state.read().await;
        best_match(name, &state.data.members, |m| m.name.as_str(), DEFAULT_MIN_SCORE)
            .map(|m| m.item.clone())
    }

    /// Resolve a spoken class name to a roster entry.
    pub async fn find_class(&self, name: &str) -> Option<GymClass> {
        let state = self.state.read().await;
        best_match(name, &state.data.classes, |c| c.name.as_str(), DEFAULT_MIN_SCORE)
            .map(|c| c.item.clone())
    }

    /// Members checked in to a class, in check-in order.
    pub async fn attendees(&self, class_id: &str) -> Result<Vec<Member>, CheckInError> {
        let state = self.state.read().await;
        let class = state
            .data
            .classes
            .iter()
            .find(|c| c.id == class_id)
            .ok_or_else(|| CheckInError::UnknownClass(class_id.to_string()))?;
        Ok(class
            .attendees
            .iter()
            .filter_map(|id| state.data.members.iter().find(|m| &m.id == id).cloned())
            .collect())
    }

    /// Add a member to a class.
    ///
    /// With an idempotency key, repeating an applied check-in returns the
    /// first receipt instead of `AlreadyCheckedIn`. A key only replays a
    /// receipt for the same member and class.
    pub async fn check_in(
        &self,
        class_id: &str,
        member_id: &str,
        idempotency_key: Option<&str>,
    ) -> Result<CheckInReceipt, CheckInError> {
        let mut state = self.state.write().await;
        if let Some(receipt) = idempotency_key.and_then(|key| state.applied.get(key)) {
            if receipt.class_id == class_id && receipt.member_id == member_id {
                return Ok(receipt.clone());
            }
            tracing::warn!(
                member_id,
                class_id,
                previous_member = %receipt.member_id,
                previous_class = %receipt.class_id,
                "idempotency key reused for a different check-in"
            );
        }

        let member = state
            .data
            .members
            .iter()
            .find(|m| m.id == member_id)
            .cloned()
            .ok_or_else(|| CheckInError::UnknownMember(member_id.to_string()))?;
        let class = state
            .data
            .classes
            .iter_mut()
            .find(|c| c.id == class_id)
            .ok_or_else(|| CheckInError::UnknownClass(class_id.to_string()))?;

        if class.attendees.iter().any(|id| id == member_id) {
            return Err(CheckInError::AlreadyCheckedIn {
                member: member.name,
                class: class.name.clone(),
            });
        }
        if class.is_full() {
            return Err(CheckInError::ClassFull {
                class: class.name.clone(),
                max: class.max_attendees,
            });
        }
        class.attendees.push(member.id.clone());

        let receipt = CheckInReceipt {
            member_id: member.id,
            member_name: member.name,
            class_id: class.id.clone(),
            class_name: class.name.clone(),
            attendees: class.attendees.len(),
            max_attendees: class.max_attendees,
        };
        if let Some(key) = idempotency_key {
            state.applied.insert(key.to_string(), receipt.clone());
        }
        tracing::info!(
            member = %receipt.member_name,
            class = %receipt.class_name,
            attendees = receipt.attendees,
            "member checked in"
        );
        Ok(receipt)
    }

    /// Plain-text roster description for the system prompt.
    pub async fn context_summary(&self) -> String {
        let state = self.state.read().await;
        let mut out = String::from("Members:\n");
        for m in &state.data.members {
            out.push_str(&format!("- {} ({} belt)\n", m.name, m.belt));
        }
        out.push_str("\nClasses today:\n");
        for c in &state.data.classes {
            out.push_str(&format!(
                "- {} {}-{} with {} ({}/{} checked in)\n",
                c.name,
                c.time,
                c.end_time,
                c.instructor.name,
                c.attendees.len(),
                c.max_attendees
            ));
        }
        out
    }
}
