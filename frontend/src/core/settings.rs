use crate::core::storage::{read_object, KeyValueStorage, LoadError, StorageError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

pub const SETTINGS_KEY: &str = "aum_settings";

/// Which app episodes and feeds should be handed off to.
///
/// Any string deserializes. Values outside the known set land in
/// `Unrecognized` and are rejected by [`validate`], not by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PodcastPlayer {
    #[default]
    Unset,
    Overcast,
    ApplePodcasts,
    Custom,
    Unrecognized(String),
}

impl PodcastPlayer {
    pub fn as_str(&self) -> &str {
        match self {
            PodcastPlayer::Unset => "",
            PodcastPlayer::Overcast => "overcast",
            PodcastPlayer::ApplePodcasts => "apple-podcasts",
            PodcastPlayer::Custom => "custom",
            PodcastPlayer::Unrecognized(other) => other,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            PodcastPlayer::Unset => "(none)",
            PodcastPlayer::Overcast => "Overcast",
            PodcastPlayer::ApplePodcasts => "Apple Podcasts",
            PodcastPlayer::Custom => "Custom",
            PodcastPlayer::Unrecognized(other) => other,
        }
    }
}

impl From<&str> for PodcastPlayer {
    fn from(value: &str) -> Self {
        match value {
            "" => PodcastPlayer::Unset,
            "overcast" => PodcastPlayer::Overcast,
            "apple-podcasts" => PodcastPlayer::ApplePodcasts,
            "custom" => PodcastPlayer::Custom,
            other => PodcastPlayer::Unrecognized(other.to_string()),
        }
    }
}

impl Serialize for PodcastPlayer {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for PodcastPlayer {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(PodcastPlayer::from(raw.as_str()))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub preferred_podcast_player: PodcastPlayer,
    pub custom_podcast_player_url: String,
}

impl UserSettings {
    /// Merges stored fields over the defaults. Unknown keys are ignored.
    fn from_stored(fields: &Map<String, Value>) -> Self {
        let mut settings = UserSettings::default();

        match fields.get(SettingsField::PreferredPodcastPlayer.as_str()) {
            Some(Value::String(raw)) => {
                settings.preferred_podcast_player = PodcastPlayer::from(raw.as_str());
            }
            // A non-string value is kept verbatim so that validation reports it.
            Some(other) => {
                settings.preferred_podcast_player = PodcastPlayer::Unrecognized(other.to_string());
            }
            None => {}
        }

        match fields.get(SettingsField::CustomPodcastPlayerUrl.as_str()) {
            Some(Value::String(url)) => settings.custom_podcast_player_url = url.clone(),
            Some(other) => {
                tracing::warn!(value = %other, "Ignoring non-string customPodcastPlayerUrl");
            }
            None => {}
        }

        settings
    }

    fn reset(&mut self, field: SettingsField) {
        let defaults = UserSettings::default();
        match field {
            SettingsField::PreferredPodcastPlayer => {
                self.preferred_podcast_player = defaults.preferred_podcast_player;
            }
            SettingsField::CustomPodcastPlayerUrl => {
                self.custom_podcast_player_url = defaults.custom_podcast_player_url;
            }
        }
    }
}

// ── Validation ───────────────────────────────────────────────────

#[derive(Debug, Serialize, PartialEq, Eq, PartialOrd, Ord, Hash, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub enum SettingsField {
    PreferredPodcastPlayer,
    CustomPodcastPlayerUrl,
}

impl SettingsField {
    pub const ALL: [SettingsField; 2] = [
        SettingsField::PreferredPodcastPlayer,
        SettingsField::CustomPodcastPlayerUrl,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SettingsField::PreferredPodcastPlayer => "preferredPodcastPlayer",
            SettingsField::CustomPodcastPlayerUrl => "customPodcastPlayerUrl",
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
pub struct FieldError {
    pub message: String,
    /// Set when the error belongs to another field and is only echoed here.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub shadow: bool,
}

impl FieldError {
    fn new(message: impl Into<String>) -> Self {
        Self { message: message.into(), shadow: false }
    }

    fn shadow(message: impl Into<String>) -> Self {
        Self { message: message.into(), shadow: true }
    }
}

/// Per-field validation errors. Every field has an entry, empty when clean.
#[derive(Debug, Serialize, PartialEq, Eq, Clone)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<SettingsField, Vec<FieldError>>);

impl ValidationErrors {
    fn new() -> Self {
        Self(SettingsField::ALL.iter().map(|f| (*f, Vec::new())).collect())
    }

    fn push(&mut self, field: SettingsField, error: FieldError) {
        self.0.entry(field).or_default().push(error);
    }

    pub fn get(&self, field: SettingsField) -> &[FieldError] {
        self.0.get(&field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SettingsField, &FieldError)> {
        self.0
            .iter()
            .flat_map(|(field, errors)| errors.iter().map(move |e| (*field, e)))
    }

    /// Fields whose own value broke a rule (shadow-only fields excluded).
    pub fn root_fields(&self) -> impl Iterator<Item = SettingsField> + '_ {
        self.0
            .iter()
            .filter(|(_, errors)| errors.iter().any(|e| !e.shadow))
            .map(|(field, _)| *field)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in self.iter().filter(|(_, e)| !e.shadow) {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", field.as_str(), error.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Checks `settings` against the rule set. `None` means valid.
pub fn validate(settings: &UserSettings) -> Option<ValidationErrors> {
    let mut errors = ValidationErrors::new();

    // Judge the value as it would be written, not by variant.
    match PodcastPlayer::from(settings.preferred_podcast_player.as_str()) {
        PodcastPlayer::Unset | PodcastPlayer::Overcast | PodcastPlayer::ApplePodcasts => {}
        PodcastPlayer::Custom => {
            if settings.custom_podcast_player_url.is_empty() {
                errors.push(
                    SettingsField::CustomPodcastPlayerUrl,
                    FieldError::new("must be set when preferredPodcastPlayer is set to custom"),
                );
                errors.push(
                    SettingsField::PreferredPodcastPlayer,
                    FieldError::shadow(
                        "customPodcastPlayerUrl must be set when preferredPodcastPlayer is set to custom",
                    ),
                );
            }
        }
        PodcastPlayer::Unrecognized(value) => {
            errors.push(
                SettingsField::PreferredPodcastPlayer,
                FieldError::new(format!(
                    "invalid value: {value}. Must be one of: ['apple-podcasts', 'overcast', 'custom']"
                )),
            );
        }
    }

    if errors.is_empty() { None } else { Some(errors) }
}

// ── Store ────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum SaveError {
    #[error("Invalid settings: {0}")]
    Invalid(ValidationErrors),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Owns the session's settings and their persistence.
///
/// `storage` is `None` outside a browser-like context; reads then fall back
/// to defaults and writes only touch memory.
pub struct SettingsStore<S: KeyValueStorage> {
    storage: Option<S>,
    current: UserSettings,
}

impl<S: KeyValueStorage> SettingsStore<S> {
    pub fn open(storage: Option<S>) -> Self {
        let mut store = Self {
            storage,
            current: UserSettings::default(),
        };
        store.current = store.load(None);
        store
    }

    /// Reads and repairs the stored settings. `Ok(None)` when nothing is
    /// stored or no storage is attached.
    pub fn try_load(&self) -> Result<Option<UserSettings>, LoadError> {
        let Some(storage) = &self.storage else {
            return Ok(None);
        };
        let Some(fields) = read_object(storage, SETTINGS_KEY)? else {
            return Ok(None);
        };
        Ok(Some(repair(UserSettings::from_stored(&fields))))
    }

    /// Like [`try_load`](Self::try_load), but never fails: unreadable or
    /// absent settings yield `previous`, else the defaults.
    pub fn load(&self, previous: Option<UserSettings>) -> UserSettings {
        match self.try_load() {
            Ok(Some(settings)) => settings,
            Ok(None) => previous.unwrap_or_default(),
            Err(e) => {
                tracing::error!(key = SETTINGS_KEY, error = %e, "Discarding unreadable settings");
                previous.unwrap_or_default()
            }
        }
    }

    pub fn get(&self) -> &UserSettings {
        &self.current
    }

    /// Edits are not validated until the next save.
    pub fn get_mut(&mut self) -> &mut UserSettings {
        &mut self.current
    }

    pub fn set(&mut self, settings: UserSettings) {
        self.current = settings;
    }

    /// Validates and persists `settings`, which then become current.
    /// Invalid settings leave both storage and the current value untouched.
    pub fn save(&mut self, settings: UserSettings) -> Result<(), SaveError> {
        self.persist(&settings)?;
        self.current = settings;
        Ok(())
    }

    #[cfg(test)]
    pub fn storage(&self) -> Option<&S> {
        self.storage.as_ref()
    }

    #[cfg(test)]
    fn into_storage(self) -> Option<S> {
        self.storage
    }

    fn persist(&self, settings: &UserSettings) -> Result<(), SaveError> {
        if let Some(errors) = validate(settings) {
            return Err(SaveError::Invalid(errors));
        }
        let Some(storage) = &self.storage else {
            tracing::debug!("No local storage attached, settings kept in memory only");
            return Ok(());
        };
        let json = serde_json::to_string(settings).map_err(StorageError::from)?;
        storage.set_item(SETTINGS_KEY, &json)?;
        tracing::info!(
            player = settings.preferred_podcast_player.as_str(),
            "Saved user settings"
        );
        Ok(())
    }
}

/// Resets every field that carries a non-shadow error.
fn repair(mut settings: UserSettings) -> UserSettings {
    let Some(errors) = validate(&settings) else {
        return settings;
    };
    for field in errors.root_fields() {
        tracing::warn!(field = field.as_str(), "Dropping invalid stored setting");
        settings.reset(field);
    }
    settings
}
