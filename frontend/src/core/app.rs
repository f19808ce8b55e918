use crate::core::feed::FeedApi;
use crate::core::input::{InputError, LineSource, Prompt};
use crate::core::pages::load_channel;
use crate::core::player::{PlayerState, PlayerStore};
use crate::core::settings::{PodcastPlayer, SaveError, SettingsField, SettingsStore};
use crate::core::storage::KeyValueStorage;

const PLAYERS: [PodcastPlayer; 4] = [
    PodcastPlayer::Overcast,
    PodcastPlayer::ApplePodcasts,
    PodcastPlayer::Custom,
    PodcastPlayer::Unset,
];

/// Terminal front end: edits settings, browses the feed service and drives
/// the player state.
pub struct App<S: KeyValueStorage + Clone, L: LineSource> {
    settings: SettingsStore<S>,
    player: PlayerStore<S>,
    feed: Box<dyn FeedApi>,
    input: Prompt<L>,
}

impl<S: KeyValueStorage + Clone, L: LineSource> App<S, L> {
    pub fn new(storage: Option<S>, feed: Box<dyn FeedApi>, source: L) -> Self {
        Self {
            settings: SettingsStore::open(storage.clone()),
            player: PlayerStore::open(storage),
            feed,
            input: Prompt::new(source),
        }
    }

    pub fn run(&mut self) {
        println!("== AUDIO MIRROR ==");

        loop {
            println!("\n[1] Settings  [2] Preferred Player  [3] Custom URL  [4] Save Settings");
            println!("[5] Browse  [6] Now Playing  [7] Player Controls  [8] Save Player  [9] Revert Settings  [0] Exit");
            let choice = match self.input.text("Selection: ") {
                Ok(c) => c,
                Err(InputError::Io(_)) => break,
                Err(_) => continue,
            };

            match choice.as_str() {
                "1" => self.show_settings(),
                "2" => self.choose_player_flow(),
                "3" => self.custom_url_flow(),
                "4" => self.save_settings_flow(),
                "5" => self.browse_flow(),
                "6" => self.now_playing(),
                "7" => self.player_controls_flow(),
                "8" => self.save_player(),
                "9" => self.revert_settings(),
                "0" => break,
                _ => println!("Invalid selection, please try again."),
            }
        }

        if !self.player.get().is_empty() {
            self.save_player();
        }
        println!("Goodbye!");
    }

    fn show_settings(&self) {
        let settings = self.settings.get();
        println!("\n--- Settings ---");
        println!("  Preferred player: {}", settings.preferred_podcast_player.label());
        if !settings.custom_podcast_player_url.is_empty() {
            println!("  Custom URL:       {}", settings.custom_podcast_player_url);
        }
    }

    fn choose_player_flow(&mut self) {
        for (i, p) in PLAYERS.iter().enumerate() {
            println!("  [{}] {}", i + 1, p.label());
        }
        let Some(idx) = self.input.choice("Player #: ", PLAYERS.len()) else {
            println!("Invalid selection.");
            return;
        };
        self.settings.get_mut().preferred_podcast_player = PLAYERS[idx].clone();
        println!("Preferred player set to {} (not saved yet).", PLAYERS[idx].label());
    }

    fn custom_url_flow(&mut self) {
        let Ok(url) = self.input.text("Custom player URL (empty to clear): ") else {
            return;
        };
        self.settings.get_mut().custom_podcast_player_url = url;
    }

    fn save_settings_flow(&mut self) {
        let draft = self.settings.get().clone();
        match self.settings.save(draft) {
            Ok(()) => println!("Settings saved."),
            Err(SaveError::Invalid(errors)) => {
                println!("Settings not saved:");
                for field in SettingsField::ALL {
                    for error in errors.get(field) {
                        let marker = if error.shadow { " (see related field)" } else { "" };
                        println!("  {}: {}{}", field.as_str(), error.message, marker);
                    }
                }
            }
            Err(e) => eprintln!("Save failed: {e}"),
        }
    }

    fn revert_settings(&mut self) {
        let stored = self.settings.load(None);
        self.settings.set(stored);
        println!("Unsaved settings changes discarded.");
    }

    fn browse_flow(&mut self) {
        let channels = match self.feed.get_channels() {
            Ok(c) if c.is_empty() => { println!("No channels available."); return; }
            Ok(c) => c,
            Err(e) => { eprintln!("Could not load channels: {e}"); return; }
        };

        println!("\nChannels:");
        for (i, c) in channels.iter().enumerate() {
            println!("  {}. {} — {}", i + 1, c.title, c.channel_type.label());
        }
        let Some(idx) = self.input.choice("\nChannel # (0 to cancel): ", channels.len()) else {
            return;
        };

        let page = match load_channel(self.feed.as_ref(), &channels[idx].id) {
            Ok(p) => p,
            Err(e) => { eprintln!("Could not load channel: {e}"); return; }
        };
        if page.episodes.is_empty() {
            println!("'{}' has no episodes yet.", page.channel.title);
            return;
        }

        println!("\n--- {} ---", page.channel.title);
        if !page.channel.feed_url.is_empty() {
            println!("  Feed: {}", page.channel.feed_url);
        }
        for (i, e) in page.episodes.iter().enumerate() {
            println!("  {}. {}", i + 1, e.title);
        }
        let Some(idx) = self.input.choice("\nPlay # (0 to cancel): ", page.episodes.len()) else {
            return;
        };

        let episode = page.episodes.into_iter().nth(idx).unwrap_or_default();
        println!("Now playing: {}", episode.title);
        self.player.play(page.channel, episode);
    }

    fn now_playing(&self) {
        let state = self.player.get();
        let Some(episode) = &state.episode else {
            println!("Nothing is playing.");
            return;
        };
        let channel = state.channel.as_ref().map(|c| c.title.as_str()).unwrap_or("?");
        println!("\n--- {} ---", episode.title);
        println!("  Channel:  {channel}");
        println!("  Position: {}", format_position(state.current_time.unwrap_or(0.0)));
        println!("  Volume:   {:.0}%", state.volume.unwrap_or(1.0) * 100.0);
        println!("  Speed:    {:.2}x", state.playback_rate.unwrap_or(1.0));
        if state.native_controls == Some(true) {
            println!("  Native controls enabled");
        }
        if state.open == Some(false) {
            println!("  (player hidden)");
        }
    }

    fn player_controls_flow(&mut self) {
        println!("[1] Volume  [2] Speed  [3] Seek  [4] Native Controls  [5] Show/Hide  [6] Stop  [0] Cancel");
        let Ok(choice) = self.input.text("Action: ") else {
            return;
        };

        match choice.as_str() {
            "1" => match self.input.number::<f64>("Volume (0.0 - 1.0): ") {
                Ok(v) if (0.0..=1.0).contains(&v) => self.player.get_mut().volume = Some(v),
                _ => println!("Volume must be between 0 and 1."),
            },
            "2" => match self.input.number::<f64>("Speed (e.g. 1.25): ") {
                Ok(v) if v > 0.0 => self.player.get_mut().playback_rate = Some(v),
                _ => println!("Speed must be a positive number."),
            },
            "3" => match self.input.number::<f64>("Position in seconds: ") {
                Ok(v) if v >= 0.0 => self.player.get_mut().current_time = Some(v),
                _ => println!("Invalid position."),
            },
            "4" => {
                let state = self.player.get_mut();
                let enabled = !state.native_controls.unwrap_or(false);
                state.native_controls = Some(enabled);
                println!("Native controls {}.", if enabled { "on" } else { "off" });
            }
            "5" => {
                let state = self.player.get_mut();
                state.open = Some(!state.open.unwrap_or(false));
            }
            "6" => self.stop(),
            _ => {}
        }
    }

    /// Drops the current episode but keeps listening preferences.
    fn stop(&mut self) {
        let current = self.player.get();
        let stopped = PlayerState {
            volume: current.volume,
            playback_rate: current.playback_rate,
            native_controls: current.native_controls,
            extra: current.extra.clone(),
            ..Default::default()
        };
        self.player.set(stopped);
        println!("Playback stopped.");
    }

    fn save_player(&self) {
        if let Err(e) = self.player.save() {
            eprintln!("Could not save player state: {e}");
        }
    }

    #[cfg(test)]
    fn settings(&self) -> &SettingsStore<S> {
        &self.settings
    }

    #[cfg(test)]
    fn player(&self) -> &PlayerStore<S> {
        &self.player
    }
}

fn format_position(seconds: f64) -> String {
    let total = seconds.max(0.0) as u64;
    let (h, m, s) = (total / 3600, (total % 3600) / 60, total % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::stub::StubFeed;
    use crate::core::input::scripted::Scripted;
    use crate::core::player::PLAYER_KEY;
    use crate::core::settings::SETTINGS_KEY;
    use crate::core::storage::MemoryStorage;

    fn run_script<'a>(storage: &'a MemoryStorage, answers: &[&str]) -> App<&'a MemoryStorage, Scripted> {
        let feed = StubFeed::default()
            .with_channel("tal", "This American Life", &["1", "2"])
            .with_channel("empty", "Nothing Yet", &[]);
        let mut app = App::new(Some(storage), Box::new(feed), Scripted::new(answers));
        app.run();
        app
    }

    #[test]
    fn test_choose_and_save_player() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["2", "1", "4", "0"]);
        assert_eq!(app.settings().get().preferred_podcast_player, PodcastPlayer::Overcast);
        assert!(storage.raw(SETTINGS_KEY).unwrap().contains("overcast"));
    }

    #[test]
    fn test_custom_without_url_is_not_saved() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["2", "3", "4", "0"]);
        assert_eq!(app.settings().get().preferred_podcast_player, PodcastPlayer::Custom);
        assert!(storage.raw(SETTINGS_KEY).is_none());
    }

    #[test]
    fn test_custom_with_url_is_saved() {
        let storage = MemoryStorage::default();
        run_script(&storage, &["3", "https://my.player/add?url=", "2", "3", "4", "0"]);
        let raw = storage.raw(SETTINGS_KEY).unwrap();
        assert!(raw.contains(r#""preferredPodcastPlayer":"custom""#));
        assert!(raw.contains("https://my.player/add?url="));
    }

    #[test]
    fn test_revert_discards_unsaved_changes() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["2", "2", "4", "2", "1", "9", "0"]);
        assert_eq!(app.settings().get().preferred_podcast_player, PodcastPlayer::ApplePodcasts);
    }

    #[test]
    fn test_browse_and_play_then_exit_saves_player() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["5", "1", "2", "7", "1", "0.5", "0"]);

        let state = app.player().get();
        assert_eq!(state.channel.as_ref().map(|c| c.id.as_str()), Some("tal"));
        assert_eq!(state.episode.as_ref().map(|e| e.id.as_str()), Some("2"));
        assert_eq!(state.volume, Some(0.5));
        assert_eq!(state.open, Some(true));

        let raw = storage.raw(PLAYER_KEY).unwrap();
        assert!(raw.contains(r#""volume":0.5"#));
    }

    #[test]
    fn test_rejects_out_of_range_controls() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["7", "1", "1.5", "7", "2", "-1", "7", "3", "90"]);
        let state = app.player().get();
        assert_eq!(state.volume, None);
        assert_eq!(state.playback_rate, None);
        assert_eq!(state.current_time, Some(90.0));
    }

    #[test]
    fn test_stop_keeps_preferences() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["5", "1", "1", "7", "2", "1.5", "7", "6", "0"]);

        let state = app.player().get();
        assert!(state.episode.is_none());
        assert!(state.channel.is_none());
        assert_eq!(state.current_time, None);
        assert_eq!(state.open, None);
        assert_eq!(state.playback_rate, Some(1.5));
        assert_eq!(storage.raw(PLAYER_KEY).as_deref(), Some(r#"{"playbackRate":1.5}"#));
    }

    #[test]
    fn test_channel_without_episodes_leaves_player_alone() {
        let storage = MemoryStorage::default();
        let app = run_script(&storage, &["5", "2"]);
        assert!(app.player().get().is_empty());
    }

    #[test]
    fn test_format_position() {
        assert_eq!(format_position(0.0), "0:00");
        assert_eq!(format_position(75.9), "1:15");
        assert_eq!(format_position(3725.0), "1:02:05");
    }
}
