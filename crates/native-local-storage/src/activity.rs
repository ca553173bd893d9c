//! Live activities driven by a stored count.
//!
//! The host can start a single live activity whose content is a count read
//! from the preference store, push new counts into it, and end it. At most
//! one activity is tracked at a time; starting a new one ends the previous.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

/// Name given to activities when none is configured.
pub const DEFAULT_ACTIVITY_NAME: &str = "Hello World";

/// Content displayed by a live activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActivityState {
    pub count: i64,
}

/// Lifecycle of a live activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    Active,
    Ended,
}

/// Snapshot of a live activity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveActivity {
    pub id: String,
    pub name: String,
    pub state: ActivityState,
    pub status: ActivityStatus,
    pub started_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LiveActivity {
    fn start(name: &str, count: i64) -> Self {
        let now = Utc::now();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            state: ActivityState { count },
            status: ActivityStatus::Active,
            started_at: now,
            updated_at: now,
        }
    }

    fn set_count(&mut self, count: i64) {
        self.state.count = count;
        self.updated_at = Utc::now();
    }
}

/// Tracks the current live activity.
pub struct ActivityManager {
    name: String,
    activities: Mutex<Vec<LiveActivity>>,
}

impl Default for ActivityManager {
    fn default() -> Self {
        Self::new(DEFAULT_ACTIVITY_NAME)
    }
}

impl ActivityManager {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            activities: Mutex::new(Vec::new()),
        }
    }

    /// The tracked activity, if any.
    pub fn current(&self) -> Option<LiveActivity> {
        self.activities.lock().first().cloned()
    }

    /// Drop every tracked activity and start a new one showing `count`.
    pub fn start(&self, count: i64) -> LiveActivity {
        let mut activities = self.activities.lock();
        activities.clear();

        let activity = LiveActivity::start(&self.name, count);
        activities.push(activity.clone());
        activity
    }

    /// Push `count` into the tracked activity. `None` when nothing is tracked.
    pub fn update(&self, count: i64) -> Option<LiveActivity> {
        let mut activities = self.activities.lock();
        let activity = activities.first_mut()?;
        activity.set_count(count);
        Some(activity.clone())
    }

    /// End the tracked activity with a final `count` and stop tracking it.
    pub fn end(&self, count: i64) -> Option<LiveActivity> {
        let mut activities = self.activities.lock();
        let mut activity = activities.first().cloned()?;
        activities.clear();

        activity.set_count(count);
        activity.status = ActivityStatus::Ended;
        Some(activity)
    }

    /// Update the tracked activity, or start one if none is tracked.
    pub fn update_or_start(&self, count: i64) -> LiveActivity {
        let mut activities = self.activities.lock();
        if let Some(activity) = activities.first_mut() {
            activity.set_count(count);
            return activity.clone();
        }

        let activity = LiveActivity::start(&self.name, count);
        activities.push(activity.clone());
        activity
    }
}
