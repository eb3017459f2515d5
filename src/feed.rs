//! # Activity Feed
//!
//! Stateful wrapper around the snapshot operations in [`crate::activity`].
//!
//! Accepting or ignoring a request also needs a remote mutation. Whether the
//! local transition happens before the server answers (optimistic) or only
//! after it confirms (deferred) is a caller policy, set through
//! [`FeedConfig::optimistic`]:
//!
//! ```rust
//! use lifting_lads::{ActivityEvent, ActivityFeed, FeedConfig};
//!
//! let mut feed = ActivityFeed::with_config(FeedConfig { optimistic: true, ..Default::default() });
//! feed.replace(vec![ActivityEvent::request(1, "Sarah", 0)]);
//!
//! let pending = feed.begin_accept(1).expect("request is in the feed");
//! assert!(feed.get(1).is_none()); // already applied locally
//!
//! // remote call failed
//! feed.rollback(pending);
//! assert!(feed.get(1).is_some());
//! ```

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::activity::{
    accept_with, partition_and_order, position_of, reject, relative_timestamp, render_label,
    ActivityEvent, ActivityKind, LabelStyle, MonotonicIds, JUST_NOW,
};
use crate::Result;

/// Production API host used by the mobile app.
pub const DEFAULT_API_BASE_URL: &str = "https://lifting-lads-api.onrender.com";

// ============================================================================
// Session & Configuration
// ============================================================================

/// The signed-in user. Passed explicitly to whatever needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub nickname: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
}

fn default_api_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

impl Session {
    pub fn new(nickname: impl Into<String>) -> Self {
        Self {
            nickname: nickname.into(),
            picture: None,
            api_base_url: default_api_base_url(),
        }
    }

    pub fn with_picture(mut self, picture: impl Into<String>) -> Self {
        self.picture = Some(picture.into());
        self
    }

    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Feed behaviour knobs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedConfig {
    /// How actor names are rendered in labels
    #[serde(default)]
    pub label_style: LabelStyle,
    /// Apply accept/reject locally before the server confirms.
    /// Default: false (wait for confirmation)
    #[serde(default)]
    pub optimistic: bool,
}

impl FeedConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ============================================================================
// Remote Feed Payloads
// ============================================================================

/// Relationship requested when adding a lifting lad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FriendType {
    Friend,
    CloseFriend,
}

impl FriendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendType::Friend => "friend",
            FriendType::CloseFriend => "closeFriend",
        }
    }
}

/// A pending request as returned by `GET /lifting-lad-requests/{nickname}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityRequest {
    pub requester_name: String,
    #[serde(default)]
    pub friend_type: Option<String>,
    #[serde(default)]
    pub requester_picture: Option<String>,
    /// Not sent by the current backend
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// Map fetched requests into feed events, using the current time for
/// relative timestamps.
pub fn events_from_requests(requests: &[ActivityRequest]) -> Vec<ActivityEvent> {
    events_from_requests_at(requests, Utc::now())
}

/// Map fetched requests into feed events.
///
/// Ids are assigned by position (`index + 1`). Requests carrying a creation
/// time are ranked by minutes elapsed since then; the rest are ranked 0 and
/// shown as "Just now".
pub fn events_from_requests_at(
    requests: &[ActivityRequest],
    now: DateTime<Utc>,
) -> Vec<ActivityEvent> {
    requests
        .iter()
        .enumerate()
        .map(|(index, req)| {
            let (rank, timestamp) = match req.created_at {
                Some(created) => {
                    let elapsed = now.signed_duration_since(created);
                    let minutes = elapsed.num_minutes().clamp(0, u32::MAX as i64) as u32;
                    (minutes, relative_timestamp(elapsed))
                }
                None => (0, JUST_NOW.to_string()),
            };

            let mut event = ActivityEvent::request(index as u64 + 1, req.requester_name.clone(), rank)
                .with_timestamp(timestamp);
            event.friend_type = req.friend_type.clone();
            event.picture = req.requester_picture.clone();
            event
        })
        .collect()
}

// ============================================================================
// Pending Mutations
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Accept,
    Reject,
}

/// A local transition waiting on the matching remote call.
///
/// Hand it back to [`ActivityFeed::confirm`] on success,
/// [`ActivityFeed::rollback`] on failure, or [`ActivityFeed::cancel`] if the
/// remote call was never made. A mutation begun before the last
/// [`ActivityFeed::replace`] is stale and all three ignore it.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a pending mutation must be confirmed or rolled back"]
pub struct PendingMutation {
    pub kind: MutationKind,
    /// The event as it was when the mutation began
    pub target: ActivityEvent,
    index: usize,
    /// Id of the synthesized ACCEPT event, once applied
    accepted_id: Option<u64>,
    optimistic: bool,
    /// Snapshot generation the mutation was begun against
    generation: u64,
}

impl PendingMutation {
    pub fn target_id(&self) -> u64 {
        self.target.id
    }

    /// Whether the local transition has already been applied.
    pub fn is_applied(&self) -> bool {
        self.optimistic
    }
}

// ============================================================================
// Activity Feed
// ============================================================================

/// The activity feed for one signed-in user.
#[derive(Debug, Clone, Default)]
pub struct ActivityFeed {
    events: Vec<ActivityEvent>,
    ids: MonotonicIds,
    config: FeedConfig,
    in_flight: HashSet<u64>,
    /// Bumped by every `replace`
    generation: u64,
}

impl ActivityFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: FeedConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Install a freshly fetched snapshot.
    ///
    /// Fetched ids are positional, so ids from the previous snapshot mean
    /// nothing here: every outstanding mutation becomes stale and its id is
    /// released.
    pub fn replace(&mut self, events: Vec<ActivityEvent>) {
        info!("[ActivityFeed] Loaded {} events", events.len());
        if !self.in_flight.is_empty() {
            debug!(
                "[ActivityFeed] dropping {} in-flight mutations from previous snapshot",
                self.in_flight.len()
            );
        }
        self.events = events;
        self.in_flight.clear();
        self.generation += 1;
    }

    /// Current snapshot in storage order.
    pub fn events(&self) -> &[ActivityEvent] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn get(&self, id: u64) -> Option<&ActivityEvent> {
        self.events.iter().find(|e| e.id == id)
    }

    /// Number of requests still waiting for an answer.
    pub fn pending_requests(&self) -> usize {
        self.events
            .iter()
            .filter(|e| e.kind() == ActivityKind::Request)
            .count()
    }

    /// Snapshot in display order.
    pub fn ordered(&self) -> Vec<ActivityEvent> {
        partition_and_order(&self.events)
    }

    /// Display-ordered events paired with their labels.
    pub fn labels(&self) -> Vec<(ActivityEvent, String)> {
        self.ordered()
            .into_iter()
            .map(|event| {
                let label = render_label(&event, &self.config.label_style);
                (event, label)
            })
            .collect()
    }

    /// Start accepting `id`. `None` if it is absent or already in flight.
    pub fn begin_accept(&mut self, id: u64) -> Option<PendingMutation> {
        self.begin(MutationKind::Accept, id)
    }

    /// Start rejecting `id`. `None` if it is absent or already in flight.
    pub fn begin_reject(&mut self, id: u64) -> Option<PendingMutation> {
        self.begin(MutationKind::Reject, id)
    }

    fn begin(&mut self, kind: MutationKind, id: u64) -> Option<PendingMutation> {
        if self.in_flight.contains(&id) {
            debug!("[ActivityFeed] {:?} for {} already in flight, ignoring", kind, id);
            return None;
        }
        let index = match position_of(&self.events, id) {
            Some(index) => index,
            None => {
                debug!("[ActivityFeed] {:?}: id {} not in feed, ignoring", kind, id);
                return None;
            }
        };

        let mut pending = PendingMutation {
            kind,
            target: self.events[index].clone(),
            index,
            accepted_id: None,
            optimistic: self.config.optimistic,
            generation: self.generation,
        };
        if pending.optimistic {
            pending.accepted_id = self.apply(kind, id);
        }

        self.in_flight.insert(id);
        Some(pending)
    }

    /// Apply a transition to the snapshot, returning the new ACCEPT id if one
    /// was created.
    fn apply(&mut self, kind: MutationKind, id: u64) -> Option<u64> {
        match kind {
            MutationKind::Accept => {
                let index = position_of(&self.events, id)?;
                self.events = accept_with(&self.events, id, &mut self.ids);
                Some(self.events[index].id)
            }
            MutationKind::Reject => {
                self.events = reject(&self.events, id);
                None
            }
        }
    }

    /// Release the id of a current mutation. `false` if `pending` is stale.
    fn settle(&mut self, pending: &PendingMutation) -> bool {
        if pending.generation != self.generation {
            debug!(
                "[ActivityFeed] {:?} of {} predates the current snapshot, ignoring",
                pending.kind,
                pending.target_id()
            );
            return false;
        }
        self.in_flight.remove(&pending.target_id());
        true
    }

    /// The remote call succeeded. Applies the transition now if it was
    /// deferred; returns the id of the ACCEPT event, if any.
    pub fn confirm(&mut self, pending: PendingMutation) -> Option<u64> {
        if !self.settle(&pending) {
            return None;
        }
        if pending.optimistic {
            return pending.accepted_id;
        }
        self.apply(pending.kind, pending.target_id())
    }

    /// The remote call failed. Undoes an optimistic transition; a deferred
    /// one was never applied and needs nothing.
    pub fn rollback(&mut self, pending: PendingMutation) {
        if !self.settle(&pending) || !pending.optimistic {
            return;
        }
        let target_id = pending.target_id();

        if let Some(accepted_id) = pending.accepted_id {
            self.events.retain(|e| e.id != accepted_id);
        }
        if position_of(&self.events, target_id).is_none() {
            let index = pending.index.min(self.events.len());
            self.events.insert(index, pending.target);
        }
        debug!("[ActivityFeed] rolled back {:?} of {}", pending.kind, target_id);
    }

    /// Forget a mutation whose remote call was never made, leaving the
    /// snapshot as it is and freeing its id for a new `begin_*`.
    pub fn cancel(&mut self, pending: PendingMutation) {
        self.settle(&pending);
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn sample_feed() -> Vec<ActivityEvent> {
        vec![
            ActivityEvent::request(1, "Sarah", 1),
            ActivityEvent::accept(2, "Stan", 2),
            ActivityEvent::request(3, "Tom", 0),
        ]
    }

    fn feed(optimistic: bool) -> ActivityFeed {
        let mut feed = ActivityFeed::with_config(FeedConfig {
            optimistic,
            ..Default::default()
        });
        feed.replace(sample_feed());
        feed
    }

    #[test]
    fn test_optimistic_accept_applies_immediately() {
        let mut feed = feed(true);
        let pending = feed.begin_accept(1).unwrap();
        assert!(pending.is_applied());
        assert!(feed.get(1).is_none());
        assert_eq!(feed.len(), 3);

        let new_id = feed.confirm(pending).unwrap();
        assert_eq!(new_id, 4);
        assert_eq!(feed.get(new_id).unwrap().kind(), ActivityKind::Accept);
        assert_eq!(feed.get(new_id).unwrap().actor, "Sarah");
    }

    #[test]
    fn test_optimistic_rollback_restores_snapshot() {
        let mut feed = feed(true);
        let before = feed.events().to_vec();

        let pending = feed.begin_accept(1).unwrap();
        feed.rollback(pending);
        assert_eq!(feed.events(), before.as_slice());

        let pending = feed.begin_reject(3).unwrap();
        assert_eq!(feed.len(), 2);
        feed.rollback(pending);
        assert_eq!(feed.events(), before.as_slice());
    }

    #[test]
    fn test_deferred_accept_waits_for_confirm() {
        let mut feed = feed(false);
        let before = feed.events().to_vec();

        let pending = feed.begin_accept(1).unwrap();
        assert!(!pending.is_applied());
        assert_eq!(feed.events(), before.as_slice());

        let new_id = feed.confirm(pending).unwrap();
        assert!(feed.get(1).is_none());
        assert_eq!(feed.get(new_id).unwrap().recency_rank, 0);
    }

    #[test]
    fn test_deferred_rollback_is_noop() {
        let mut feed = feed(false);
        let before = feed.events().to_vec();
        let pending = feed.begin_reject(1).unwrap();
        feed.rollback(pending);
        assert_eq!(feed.events(), before.as_slice());

        // Id is free again after rollback
        assert!(feed.begin_reject(1).is_some());
    }

    #[test]
    fn test_double_tap_absorbed() {
        let mut feed = feed(false);
        let pending = feed.begin_accept(1).unwrap();
        assert!(feed.begin_accept(1).is_none());
        assert!(feed.begin_reject(1).is_none());
        assert!(feed.confirm(pending).is_some());

        // Gone after confirm
        assert!(feed.begin_accept(1).is_none());
    }

    #[test]
    fn test_missing_id_is_noop() {
        let mut feed = feed(true);
        assert!(feed.begin_accept(42).is_none());
        assert!(feed.begin_reject(42).is_none());
        assert_eq!(feed.events(), sample_feed().as_slice());
    }

    #[test]
    fn test_deferred_confirm_after_refresh_removed_target() {
        let mut feed = feed(false);
        let pending = feed.begin_accept(1).unwrap();
        feed.replace(vec![ActivityEvent::request(3, "Tom", 0)]);
        assert!(feed.confirm(pending).is_none());
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_rollback_after_refresh_leaves_new_snapshot_alone() {
        let mut feed = ActivityFeed::with_config(FeedConfig {
            optimistic: true,
            ..Default::default()
        });
        feed.replace(vec![
            ActivityEvent::request(1, "Sarah", 0),
            ActivityEvent::request(2, "Tom", 0),
        ]);
        let pending = feed.begin_accept(1).unwrap();
        assert_eq!(feed.get(3).unwrap().actor, "Sarah");

        // Refetch reissues positional ids 1..=3
        let refreshed = vec![
            ActivityEvent::request(1, "Tom", 0),
            ActivityEvent::request(2, "Kim", 0),
            ActivityEvent::request(3, "Jo", 0),
        ];
        feed.replace(refreshed.clone());
        feed.rollback(pending);
        assert_eq!(feed.events(), refreshed.as_slice());

        // Ids from the old snapshot no longer block the new one
        assert!(feed.begin_reject(1).is_some());
    }

    #[test]
    fn test_confirm_after_refresh_does_not_touch_reused_id() {
        let mut feed = feed(false);
        let pending = feed.begin_accept(1).unwrap();
        let refreshed = vec![ActivityEvent::request(1, "Kim", 0)];
        feed.replace(refreshed.clone());

        assert!(feed.confirm(pending).is_none());
        assert_eq!(feed.events(), refreshed.as_slice());
    }

    #[test]
    fn test_cancel_releases_id() {
        let mut feed = feed(false);
        let before = feed.events().to_vec();
        let pending = feed.begin_accept(1).unwrap();
        assert!(feed.begin_accept(1).is_none());

        feed.cancel(pending);
        assert_eq!(feed.events(), before.as_slice());
        let retry = feed.begin_accept(1).unwrap();
        assert!(feed.confirm(retry).is_some());
    }

    #[test]
    fn test_labels_in_display_order() {
        let mut feed = ActivityFeed::with_config(FeedConfig {
            label_style: LabelStyle::with_suffix("_user"),
            optimistic: false,
        });
        feed.replace(sample_feed());

        let labels: Vec<String> = feed.labels().into_iter().map(|(_, l)| l).collect();
        assert_eq!(
            labels,
            vec![
                "Tom_user wants to be your lifting lad.",
                "Sarah_user wants to be your lifting lad.",
                "Stan_user became your lad!",
            ]
        );
        assert_eq!(feed.pending_requests(), 2);
    }

    #[test]
    fn test_events_from_requests() {
        let now = Utc::now();
        let requests = vec![
            ActivityRequest {
                requester_name: "Sarah".into(),
                friend_type: Some("closeFriend".into()),
                requester_picture: Some("https://example.com/s.png".into()),
                created_at: None,
            },
            ActivityRequest {
                requester_name: "Tom".into(),
                friend_type: Some("friend".into()),
                requester_picture: None,
                created_at: Some(now - Duration::minutes(90)),
            },
        ];

        let events = events_from_requests_at(&requests, now);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].id, 1);
        assert!(events[0].is_request());
        assert_eq!(events[0].display_timestamp, "Just now");
        assert_eq!(events[0].recency_rank, 0);
        assert_eq!(events[0].picture.as_deref(), Some("https://example.com/s.png"));
        assert_eq!(events[1].id, 2);
        assert_eq!(events[1].recency_rank, 90);
        assert_eq!(events[1].display_timestamp, "1h ago");
    }

    #[test]
    fn test_request_payload_parses() {
        let json = r#"{"requesterName":"Sarah","friendType":"friend","requesterPicture":"p.png"}"#;
        let req: ActivityRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.requester_name, "Sarah");
        assert!(req.created_at.is_none());
    }

    #[test]
    fn test_config_from_json() {
        let config =
            FeedConfig::from_json(r#"{"label_style":{"suffix":"_user"},"optimistic":true}"#)
                .unwrap();
        assert!(config.optimistic);
        assert_eq!(config.label_style.suffix.as_deref(), Some("_user"));

        assert_eq!(FeedConfig::from_json("{}").unwrap(), FeedConfig::default());
        assert!(FeedConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_session_from_json() {
        let session = Session::from_json(r#"{"nickname":"liftqueen"}"#).unwrap();
        assert_eq!(session.nickname, "liftqueen");
        assert_eq!(session.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(
            serde_json::to_string(&FriendType::CloseFriend).unwrap(),
            "\"closeFriend\""
        );
        assert_eq!(FriendType::Friend.as_str(), "friend");
    }
}
