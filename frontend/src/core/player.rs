use crate::core::models::{Channel, Episode};
use crate::core::storage::{read_object, KeyValueStorage, LoadError, StorageError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const PLAYER_KEY: &str = "aum_player";

/// Audio player state as last persisted. Every field is optional and none
/// are validated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct PlayerState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<Episode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<Channel>,
    /// Playback position in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_time: Option<f64>,
    /// 0.0 - 1.0
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playback_rate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub native_controls: Option<bool>,
    /// Keys written by other versions; carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlayerState {
    pub fn is_empty(&self) -> bool {
        *self == PlayerState::default()
    }
}

pub struct PlayerStore<S: KeyValueStorage> {
    storage: Option<S>,
    current: PlayerState,
}

impl<S: KeyValueStorage> PlayerStore<S> {
    pub fn open(storage: Option<S>) -> Self {
        let mut store = Self {
            storage,
            current: PlayerState::default(),
        };
        store.current = store.load();
        store
    }

    pub fn try_load(&self) -> Result<Option<PlayerState>, LoadError> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        let Some(fields) = read_object(storage, PLAYER_KEY)? else {
            return Ok(None);
        };
        serde_json::from_value(Value::Object(fields))
            .map(Some)
            .map_err(|source| LoadError::Parse { key: PLAYER_KEY, source })
    }

    /// Empty state whenever nothing usable is stored.
    pub fn load(&self) -> PlayerState {
        match self.try_load() {
            Ok(state) => state.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(key = PLAYER_KEY, error = %e, "Ignoring unreadable player state");
                PlayerState::default()
            }
        }
    }

    pub fn get(&self) -> &PlayerState {
        &self.current
    }

    pub fn get_mut(&mut self) -> &mut PlayerState {
        &mut self.current
    }

    /// Replaces the in-memory state. Storage is untouched until [`save`](Self::save).
    pub fn set(&mut self, state: PlayerState) {
        self.current = state;
    }

    /// Starts `episode` from the beginning with the player visible.
    pub fn play(&mut self, channel: Channel, episode: Episode) {
        self.current.channel = Some(channel);
        self.current.episode = Some(episode);
        self.current.current_time = Some(0.0);
        self.current.open = Some(true);
    }

    /// Writes the current state. Nothing is persisted unless this is called.
    pub fn save(&self) -> Result<(), StorageError> {
        let Some(storage) = &self.storage else {
            return Ok(());
        };
        let json = serde_json::to_string(&self.current)?;
        storage.set_item(PLAYER_KEY, &json)?;
        tracing::debug!(bytes = json.len(), "Saved player state");
        Ok(())
    }

    #[cfg(test)]
    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::storage::MemoryStorage;

    fn episode(id: &str) -> Episode {
        Episode {
            id: id.to_string(),
            title: format!("Episode {id}"),
            sound_url: format!("https://cdn.example/{id}.mp3"),
            ..Default::default()
        }
    }

    #[test]
    fn test_open_without_anything_stored() {
        let store = PlayerStore::open(Some(MemoryStorage::default()));
        assert!(store.get().is_empty());

        let store = PlayerStore::<MemoryStorage>::open(None);
        assert!(store.get().is_empty());
        assert!(store.save().is_ok());
    }

    #[test]
    fn test_unparsable_is_empty() {
        for raw in ["{not json", "[]", r#"{"volume":"loud"}"#] {
            let store = PlayerStore::open(Some(MemoryStorage::with_item(PLAYER_KEY, raw)));
            assert!(store.get().is_empty(), "{raw}");
        }
    }

    #[test]
    fn test_unknown_channel_type_keeps_state() {
        for channel_type in [r#""CHANNEL_TYPE_VIDEO""#, "1"] {
            let raw = format!(r#"{{"currentTime":12.5,"channel":{{"id":"c","type":{channel_type}}}}}"#);
            let store = PlayerStore::open(Some(MemoryStorage::with_item(PLAYER_KEY, &raw)));
            assert_eq!(store.get().current_time, Some(12.5), "{raw}");
            assert_eq!(store.get().channel.as_ref().map(|c| c.id.as_str()), Some("c"));
        }
    }

    #[test]
    fn test_partial_state_loads() {
        let storage = MemoryStorage::with_item(PLAYER_KEY, r#"{"volume":0.4,"open":false}"#);
        let store = PlayerStore::open(Some(storage));
        assert_eq!(store.get().volume, Some(0.4));
        assert_eq!(store.get().open, Some(false));
        assert_eq!(store.get().current_time, None);
    }

    #[test]
    fn test_save_only_on_request() {
        let mut store = PlayerStore::open(Some(MemoryStorage::default()));
        store.get_mut().volume = Some(0.8);
        assert!(store.storage().unwrap().raw(PLAYER_KEY).is_none());

        store.save().unwrap();
        assert_eq!(store.storage().unwrap().raw(PLAYER_KEY).as_deref(), Some(r#"{"volume":0.8}"#));
    }

    #[test]
    fn test_play_and_restore() {
        let mut store = PlayerStore::open(Some(MemoryStorage::default()));
        store.get_mut().current_time = Some(1200.5);
        let channel = Channel { id: "c1".into(), title: "Show".into(), ..Default::default() };
        store.play(channel.clone(), episode("e7"));
        store.get_mut().playback_rate = Some(1.5);
        store.save().unwrap();

        let raw = store.storage().unwrap().raw(PLAYER_KEY).unwrap();
        let reopened = PlayerStore::open(Some(MemoryStorage::with_item(PLAYER_KEY, &raw)));
        let state = reopened.get();
        assert_eq!(state.channel.as_ref(), Some(&channel));
        assert_eq!(state.episode.as_ref().map(|e| e.id.as_str()), Some("e7"));
        assert_eq!(state.current_time, Some(0.0));
        assert_eq!(state.playback_rate, Some(1.5));
        assert_eq!(state.open, Some(true));
    }

    #[test]
    fn test_unknown_keys_survive_save() {
        let storage = MemoryStorage::with_item(PLAYER_KEY, r#"{"muted":true,"volume":1.0}"#);
        let store = PlayerStore::open(Some(storage));
        assert_eq!(store.get().extra.get("muted"), Some(&Value::Bool(true)));

        store.save().unwrap();
        let raw = store.storage().unwrap().raw(PLAYER_KEY).unwrap();
        assert!(raw.contains(r#""muted":true"#));
    }

    #[test]
    fn test_set_replaces_until_saved() {
        let storage = MemoryStorage::with_item(PLAYER_KEY, r#"{"volume":0.2,"open":true}"#);
        let mut store = PlayerStore::open(Some(storage));
        store.set(PlayerState { playback_rate: Some(2.0), ..Default::default() });
        assert_eq!(store.get().volume, None);
        assert_eq!(
            store.storage().unwrap().raw(PLAYER_KEY).as_deref(),
            Some(r#"{"volume":0.2,"open":true}"#)
        );

        store.save().unwrap();
        assert_eq!(store.storage().unwrap().raw(PLAYER_KEY).as_deref(), Some(r#"{"playbackRate":2.0}"#));
    }

    #[test]
    fn test_write_failure_is_reported() {
        let store = PlayerStore::open(Some(MemoryStorage::failing()));
        assert!(matches!(store.save(), Err(StorageError::Io(_))));
    }
}
