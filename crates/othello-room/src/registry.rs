//! Room registry: the supervisor that creates, lists and tears down rooms.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use othello_protocol::{RoomId, RoomSummary};

use crate::room::spawn_room;
use crate::{BotCapability, RatingService, RoomConfig, RoomError, RoomHandle};

/// Owns every live room, keyed by id.
///
/// Rooms are created lazily on first attach and removed either explicitly
/// or once [`expire_idle`] reports them. The registry itself holds no game
/// state and never awaits; callers keep it behind one lock, clone handles
/// out of it and talk to rooms after the lock is released.
pub struct RoomRegistry {
    rooms: HashMap<RoomId, RoomHandle>,
    /// Next candidate for [`create_room`](Self::create_room).
    next_id: u64,
    config: RoomConfig,
    bots: Arc<dyn BotCapability>,
    ratings: Arc<dyn RatingService>,
}

impl RoomRegistry {
    pub fn new(
        config: RoomConfig,
        bots: Arc<dyn BotCapability>,
        ratings: Arc<dyn RatingService>,
    ) -> Self {
        Self {
            rooms: HashMap::new(),
            next_id: 1,
            config,
            bots,
            ratings,
        }
    }

    /// Returns the room for `room_id`, spawning it if needed.
    ///
    /// A room whose actor has stopped is replaced.
    pub fn get_or_create(&mut self, room_id: &RoomId) -> RoomHandle {
        if let Some(handle) = self.rooms.get(room_id) {
            if !handle.is_closed() {
                return handle.clone();
            }
        }
        self.spawn(room_id.clone())
    }

    /// Spawns a room under a fresh numeric id.
    pub fn create_room(&mut self) -> RoomId {
        let room_id = loop {
            let candidate = RoomId::new(self.next_id.to_string());
            self.next_id += 1;
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
        };
        self.spawn(room_id.clone());
        room_id
    }

    pub fn get(&self, room_id: &RoomId) -> Option<RoomHandle> {
        self.rooms.get(room_id).cloned()
    }

    /// Forgets a room and hands its handle back so the caller can shut it
    /// down after releasing whatever lock guards the registry.
    pub fn remove(&mut self, room_id: &RoomId) -> Result<RoomHandle, RoomError> {
        self.rooms
            .remove(room_id)
            .ok_or_else(|| RoomError::NotFound(room_id.clone()))
    }

    /// Forgets `handle`'s room unless its id has since been taken by a newer
    /// room. Returns whether anything was removed.
    pub fn forget(&mut self, handle: &RoomHandle) -> bool {
        let current = self.rooms.get(handle.room_id());
        if !current.is_some_and(|room| room.same_room(handle)) {
            return false;
        }
        self.rooms.remove(handle.room_id());
        tracing::debug!(room_id = %handle.room_id(), "room forgotten");
        true
    }

    /// Returns cloned handles to all rooms.
    pub fn room_handles(&self) -> Vec<RoomHandle> {
        self.rooms.values().cloned().collect()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn spawn(&mut self, room_id: RoomId) -> RoomHandle {
        let handle = spawn_room(
            room_id.clone(),
            self.config.clone(),
            Arc::clone(&self.bots),
            Arc::clone(&self.ratings),
        );
        self.rooms.insert(room_id.clone(), handle.clone());
        tracing::info!(%room_id, "room created");
        handle
    }
}

/// Summaries of the given rooms, ordered by id.
///
/// Rooms that fail to respond (e.g., shutting down) are silently skipped.
pub async fn summarize(handles: &[RoomHandle]) -> Vec<RoomSummary> {
    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        if let Ok(summary) = handle.summary().await {
            summaries.push(summary);
        }
    }
    summaries.sort_by(|a, b| a.room_id.cmp(&b.room_id));
    summaries
}

/// Stops every room that has had no connection for at least `ttl` and
/// returns those rooms, along with any whose actor had already stopped.
///
/// Each room decides for itself whether it expired, so a connection that
/// attached in the meantime keeps it alive.
pub async fn expire_idle(handles: &[RoomHandle], ttl: Duration) -> Vec<RoomHandle> {
    let mut expired = Vec::new();
    for handle in handles {
        match handle.expire(ttl).await {
            Ok(false) => {}
            Ok(true) | Err(_) => {
                tracing::debug!(room_id = %handle.room_id(), "reaping idle room");
                expired.push(handle.clone());
            }
        }
    }
    expired
}
