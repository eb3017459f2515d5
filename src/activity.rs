//! Activity feed reconciliation.
//!
//! Every operation here takes an immutable snapshot of the feed and returns
//! a new one; nothing is held between calls. Targeting an id that is not in
//! the snapshot is a no-op, never an error, so a double-tapped button is
//! absorbed silently.
//!
//! ## Example
//! ```rust
//! use lifting_lads::activity::{partition_and_order, reject, ActivityEvent};
//!
//! let feed = vec![
//!     ActivityEvent::personal_record(3, "Ana", 0, Some("Squat 140kg".into())),
//!     ActivityEvent::request(1, "Sarah", 5),
//! ];
//! let ordered = partition_and_order(&feed);
//! assert_eq!(ordered[0].id, 1); // requests always come first
//!
//! let feed = reject(&feed, 1);
//! assert_eq!(feed.len(), 1);
//! ```

use std::collections::HashSet;

use chrono::Duration;
use log::debug;
use serde::{Deserialize, Serialize};

/// Timestamp shown for events that were created moments ago.
pub const JUST_NOW: &str = "Just now";

/// Kind of social activity. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ffi", derive(uniffi::Enum))]
pub enum ActivityKind {
    /// Someone wants to be your lifting lad (actionable)
    #[serde(rename = "REQUEST")]
    Request,
    /// A lifting-lad connection was made
    #[serde(rename = "ACCEPT")]
    Accept,
    /// Someone posted a personal record
    #[serde(rename = "PR")]
    PersonalRecord,
}

/// A single entry in the activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEvent {
    /// Unique within a feed snapshot
    pub id: u64,
    kind: ActivityKind,
    /// Display name of the user the event originates from
    pub actor: String,
    /// Ordering key, lower = more recent
    pub recency_rank: u32,
    /// Human-readable relative time, recomputed at render time
    pub display_timestamp: String,
    /// Free-text message (personal records only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Relationship asked for by a request ("friend", "closeFriend")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friend_type: Option<String>,
    /// Actor's profile picture URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub picture: Option<String>,
}

impl ActivityEvent {
    fn new(id: u64, kind: ActivityKind, actor: impl Into<String>, recency_rank: u32) -> Self {
        Self {
            id,
            kind,
            actor: actor.into(),
            recency_rank,
            display_timestamp: JUST_NOW.to_string(),
            note: None,
            friend_type: None,
            picture: None,
        }
    }

    /// A pending lifting-lad request.
    pub fn request(id: u64, actor: impl Into<String>, recency_rank: u32) -> Self {
        Self::new(id, ActivityKind::Request, actor, recency_rank)
    }

    /// An accepted connection.
    pub fn accept(id: u64, actor: impl Into<String>, recency_rank: u32) -> Self {
        Self::new(id, ActivityKind::Accept, actor, recency_rank)
    }

    /// A personal-record announcement, optionally with the lifter's note.
    pub fn personal_record(
        id: u64,
        actor: impl Into<String>,
        recency_rank: u32,
        note: Option<String>,
    ) -> Self {
        Self {
            note,
            ..Self::new(id, ActivityKind::PersonalRecord, actor, recency_rank)
        }
    }

    pub fn with_timestamp(mut self, display_timestamp: impl Into<String>) -> Self {
        self.display_timestamp = display_timestamp.into();
        self
    }

    pub fn with_friend_type(mut self, friend_type: impl Into<String>) -> Self {
        self.friend_type = Some(friend_type.into());
        self
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn kind(&self) -> ActivityKind {
        self.kind
    }

    pub fn is_request(&self) -> bool {
        self.kind == ActivityKind::Request
    }

    /// The `ACCEPT` event that replaces this request once accepted.
    fn accepted(&self, id: u64) -> Self {
        Self {
            friend_type: self.friend_type.clone(),
            picture: self.picture.clone(),
            ..Self::accept(id, self.actor.clone(), 0)
        }
    }
}

// ============================================================================
// Id Generation
// ============================================================================

/// Supplies ids for events synthesized locally.
pub trait IdSource {
    /// Next id, distinct from every id in `existing`.
    fn next_id(&mut self, existing: &[ActivityEvent]) -> u64;
}

fn max_id(events: &[ActivityEvent]) -> Option<u64> {
    events.iter().map(|e| e.id).max()
}

/// `max(existing ids) + 1`, or `1` for an empty feed. `None` once the
/// largest id is `u64::MAX`.
fn id_above(events: &[ActivityEvent]) -> Option<u64> {
    max_id(events).map_or(Some(1), |max| max.checked_add(1))
}

/// Smallest positive id not used in `events`.
fn lowest_free_id(events: &[ActivityEvent]) -> u64 {
    let used: HashSet<u64> = events.iter().map(|e| e.id).collect();
    // At most events.len() candidates are taken, so this terminates
    (1..=u64::MAX).find(|id| !used.contains(id)).unwrap_or(0)
}

/// `max(existing ids) + 1`, or `1` for an empty feed.
///
/// Depends only on the snapshot, so two accepts computed from the same
/// snapshot receive the same id. Prefer [`MonotonicIds`] when mutations can
/// overlap. When the snapshot already holds `u64::MAX`, falls back to the
/// lowest unused id.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxPlusOne;

impl IdSource for MaxPlusOne {
    fn next_id(&mut self, existing: &[ActivityEvent]) -> u64 {
        id_above(existing).unwrap_or_else(|| lowest_free_id(existing))
    }
}

/// Monotonic counter that never hands out the same id twice and never
/// collides with an id already in the snapshot.
///
/// Once the counter or the snapshot reaches `u64::MAX`, ids are only
/// guaranteed distinct from the snapshot.
#[derive(Debug, Clone)]
pub struct MonotonicIds {
    /// `None` once `u64::MAX` has been issued
    next: Option<u64>,
}

impl MonotonicIds {
    pub fn new() -> Self {
        Self { next: Some(1) }
    }

    /// Start counting at `first` (clamped to at least 1).
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: Some(first.max(1)),
        }
    }
}

impl Default for MonotonicIds {
    fn default() -> Self {
        Self::new()
    }
}

impl IdSource for MonotonicIds {
    fn next_id(&mut self, existing: &[ActivityEvent]) -> u64 {
        match (self.next, id_above(existing)) {
            (Some(next), Some(floor)) => {
                let id = next.max(floor);
                self.next = id.checked_add(1);
                id
            }
            _ => lowest_free_id(existing),
        }
    }
}

// ============================================================================
// Reconciliation
// ============================================================================

/// Index of the event with `target_id`, if it is in the snapshot.
pub fn position_of(events: &[ActivityEvent], target_id: u64) -> Option<usize> {
    events.iter().position(|e| e.id == target_id)
}

/// Order a feed for display.
///
/// Requests come first, then everything else. Each group is sorted by
/// ascending `recency_rank`; the sort is stable so same-rank events keep
/// their input order.
pub fn partition_and_order(events: &[ActivityEvent]) -> Vec<ActivityEvent> {
    let (mut requests, mut others): (Vec<ActivityEvent>, Vec<ActivityEvent>) =
        events.iter().cloned().partition(|e| e.is_request());

    requests.sort_by_key(|e| e.recency_rank);
    others.sort_by_key(|e| e.recency_rank);

    requests.extend(others);
    requests
}

/// Accept the event with `target_id`, replacing it with a fresh `ACCEPT`
/// event whose id is `max(existing ids) + 1`.
///
/// Returns the snapshot unchanged if `target_id` is absent.
pub fn accept(events: &[ActivityEvent], target_id: u64) -> Vec<ActivityEvent> {
    accept_with(events, target_id, &mut MaxPlusOne)
}

/// Same as [`accept`], drawing the new id from `ids`.
///
/// The id is computed against the snapshot before removal, so the accepted
/// event never reuses the id of the request it replaces.
pub fn accept_with<I: IdSource + ?Sized>(
    events: &[ActivityEvent],
    target_id: u64,
    ids: &mut I,
) -> Vec<ActivityEvent> {
    let index = match position_of(events, target_id) {
        Some(index) => index,
        None => {
            debug!("[Activity] accept: id {} not in feed, ignoring", target_id);
            return events.to_vec();
        }
    };

    let new_id = ids.next_id(events);
    let mut next = events.to_vec();
    next[index] = events[index].accepted(new_id);

    debug!(
        "[Activity] accepted {} from {} as event {}",
        target_id, events[index].actor, new_id
    );
    next
}

/// Remove the event with `target_id`. No replacement is created.
///
/// Returns the snapshot unchanged if `target_id` is absent.
pub fn reject(events: &[ActivityEvent], target_id: u64) -> Vec<ActivityEvent> {
    match position_of(events, target_id) {
        Some(index) => {
            let mut next = events.to_vec();
            let removed = next.remove(index);
            debug!("[Activity] rejected {} from {}", target_id, removed.actor);
            next
        }
        None => {
            debug!("[Activity] reject: id {} not in feed, ignoring", target_id);
            events.to_vec()
        }
    }
}

// ============================================================================
// Labels
// ============================================================================

/// How actor names are shown in request/accept labels.
///
/// Older builds of the app appended `_user` to these names; the default
/// style shows the bare name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelStyle {
    /// Appended to the actor name for non-PR events
    #[serde(default)]
    pub suffix: Option<String>,
}

impl LabelStyle {
    pub fn with_suffix(suffix: impl Into<String>) -> Self {
        Self {
            suffix: Some(suffix.into()),
        }
    }

    fn display_name(&self, actor: &str) -> String {
        match &self.suffix {
            Some(suffix) => format!("{}{}", actor, suffix),
            None => actor.to_string(),
        }
    }
}

/// User-facing message for an event.
pub fn render_label(event: &ActivityEvent, style: &LabelStyle) -> String {
    match event.kind {
        ActivityKind::Request => format!(
            "{} wants to be your lifting lad.",
            style.display_name(&event.actor)
        ),
        ActivityKind::Accept => format!("{} became your lad!", style.display_name(&event.actor)),
        ActivityKind::PersonalRecord => match &event.note {
            Some(note) => format!("{}: {}", event.actor, note),
            None => format!("{} just hit a new PR!", event.actor),
        },
    }
}

/// Relative time label for an event that happened `elapsed` ago.
///
/// Negative durations (clock skew) are shown as "Just now".
pub fn relative_timestamp(elapsed: Duration) -> String {
    let minutes = elapsed.num_minutes();
    if minutes < 1 {
        JUST_NOW.to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if elapsed.num_hours() < 24 {
        format!("{}h ago", elapsed.num_hours())
    } else if elapsed.num_days() < 7 {
        format!("{}d ago", elapsed.num_days())
    } else {
        format!("{}w ago", elapsed.num_weeks())
    }
}

// ============================================================================
// Tests
// ============================================================================
