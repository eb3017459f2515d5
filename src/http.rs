//! HTTP client for the lifting-lad request endpoints.
//!
//! This module provides:
//! - Fetching pending requests into feed events
//! - Accept/ignore calls, wired to [`ActivityFeed`]'s mutation policy
//! - Sending new lifting-lad requests
//!
//! Failures are returned, never retried.

use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::feed::{events_from_requests, ActivityFeed, ActivityRequest, FriendType, Session};
use crate::{ActivityEvent, Result};

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Response body of `GET /lifting-lad-requests/{nickname}`
#[derive(Debug, Deserialize)]
struct RequestsResponse {
    #[serde(default)]
    requests: Vec<ActivityRequest>,
}

/// Body of the accept/ignore/add endpoints
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LadPayload<'a> {
    requester_name: &'a str,
    requested_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    requester_picture: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    friend_type: Option<&'a str>,
}

/// Client for the remote feed.
pub struct FeedClient {
    client: Client,
    base_url: String,
}

impl FeedClient {
    /// Create a client for the session's API host.
    pub fn new(session: &Session) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: session.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Fetch pending requests addressed to `nickname`.
    pub async fn fetch_requests(&self, nickname: &str) -> Result<Vec<ActivityEvent>> {
        let url = self.url(&format!(
            "lifting-lad-requests/{}",
            urlencoding::encode(nickname)
        ));
        debug!("[FeedClient] GET {}", url);

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body: RequestsResponse = response.json().await?;

        info!(
            "[FeedClient] Fetched {} requests for {}",
            body.requests.len(),
            nickname
        );
        Ok(events_from_requests(&body.requests))
    }

    /// Tell the server the signed-in user accepted `event`.
    pub async fn accept(&self, session: &Session, event: &ActivityEvent) -> Result<()> {
        let payload = LadPayload {
            requester_name: &event.actor,
            requested_name: &session.nickname,
            requester_picture: event.picture.as_deref(),
            friend_type: event.friend_type.as_deref(),
        };
        self.post("accept-lifting-lad", &payload).await
    }

    /// Tell the server the signed-in user ignored `event`.
    pub async fn ignore(&self, session: &Session, event: &ActivityEvent) -> Result<()> {
        let payload = LadPayload {
            requester_name: &event.actor,
            requested_name: &session.nickname,
            requester_picture: None,
            friend_type: None,
        };
        self.post("ignore-lifting-lad", &payload).await
    }

    /// Ask `nickname` to become the signed-in user's lifting lad.
    pub async fn send_request(
        &self,
        session: &Session,
        nickname: &str,
        friend_type: FriendType,
    ) -> Result<()> {
        let payload = LadPayload {
            requester_name: &session.nickname,
            requested_name: nickname,
            requester_picture: session.picture.as_deref(),
            friend_type: Some(friend_type.as_str()),
        };
        self.post("add-lifting-lad", &payload).await
    }

    async fn post<T: Serialize>(&self, path: &str, payload: &T) -> Result<()> {
        let url = self.url(path);
        debug!("[FeedClient] POST {}", url);
        self.client
            .post(&url)
            .json(payload)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    /// Replace the feed with the latest requests for the session user.
    pub async fn refresh(&self, session: &Session, feed: &mut ActivityFeed) -> Result<usize> {
        let events = self.fetch_requests(&session.nickname).await?;
        let count = events.len();
        feed.replace(events);
        Ok(count)
    }

    /// Accept `id` remotely and reconcile the feed according to its policy.
    ///
    /// Returns the id of the new ACCEPT event, or `Ok(None)` if `id` is not
    /// in the feed or already in flight.
    pub async fn accept_in_feed(
        &self,
        session: &Session,
        feed: &mut ActivityFeed,
        id: u64,
    ) -> Result<Option<u64>> {
        let pending = match feed.begin_accept(id) {
            Some(pending) => pending,
            None => return Ok(None),
        };

        match self.accept(session, &pending.target).await {
            Ok(()) => {
                info!("[FeedClient] Accepted request from {}", pending.target.actor);
                Ok(feed.confirm(pending))
            }
            Err(e) => {
                warn!(
                    "[FeedClient] Accepting request from {} failed: {}",
                    pending.target.actor, e
                );
                feed.rollback(pending);
                Err(e)
            }
        }
    }

    /// Ignore `id` remotely and reconcile the feed according to its policy.
    ///
    /// Returns `Ok(false)` if `id` is not in the feed or already in flight.
    pub async fn ignore_in_feed(
        &self,
        session: &Session,
        feed: &mut ActivityFeed,
        id: u64,
    ) -> Result<bool> {
        let pending = match feed.begin_reject(id) {
            Some(pending) => pending,
            None => return Ok(false),
        };

        match self.ignore(session, &pending.target).await {
            Ok(()) => {
                info!("[FeedClient] Ignored request from {}", pending.target.actor);
                feed.confirm(pending);
                Ok(true)
            }
            Err(e) => {
                warn!(
                    "[FeedClient] Ignoring request from {} failed: {}",
                    pending.target.actor, e
                );
                feed.rollback(pending);
                Err(e)
            }
        }
    }
}
