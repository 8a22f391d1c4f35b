//! Tracks open rooms by join code.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::game::entities::Deck;

use super::{RoomActor, RoomConfig, RoomError, RoomHandle, RoomId};

/// Creates rooms and resolves join codes to live handles. Closed rooms
/// are reaped lazily, which keeps codes unique among open rooms without
/// any callback plumbing from the actors.
#[derive(Default)]
pub struct RoomManager {
    rooms: Mutex<HashMap<RoomId, RoomHandle>>,
}

impl RoomManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a room and return its handle; the join code is on the
    /// handle.
    pub async fn create(&self, config: RoomConfig) -> Result<RoomHandle, RoomError> {
        config.validate()?;
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, handle| !handle.is_closed());
        let id = loop {
            let id = RoomId::generate();
            if !rooms.contains_key(&id) {
                break id;
            }
        };
        let handle = RoomActor::spawn_with(id.clone(), config, Deck::new());
        rooms.insert(id, handle.clone());
        Ok(handle)
    }

    /// Look up an open room by join code.
    pub async fn get(&self, id: &RoomId) -> Option<RoomHandle> {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, handle| !handle.is_closed());
        rooms.get(id).cloned()
    }

    /// Join codes of every currently open room.
    pub async fn open_rooms(&self) -> Vec<RoomId> {
        let mut rooms = self.rooms.lock().await;
        rooms.retain(|_, handle| !handle.is_closed());
        rooms.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // === Manager Tests ===

    #[tokio::test]
    async fn test_create_and_look_up() {
        let manager = RoomManager::new();
        let handle = manager.create(RoomConfig::default()).await.unwrap();
        let found = manager.get(handle.id()).await.expect("room is open");
        assert_eq!(found.id(), handle.id());
        assert_eq!(manager.open_rooms().await.len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_code_resolves_to_nothing() {
        let manager = RoomManager::new();
        assert!(manager.get(&RoomId::from("NOSUCHRM")).await.is_none());
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let manager = RoomManager::new();
        let config = RoomConfig {
            rounds: 0,
            ..RoomConfig::default()
        };
        assert!(matches!(
            manager.create(config).await,
            Err(RoomError::InvalidConfig(_))
        ));
    }
}
