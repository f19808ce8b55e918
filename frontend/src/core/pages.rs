//! Data loaders for the two pages: the channel index and a single channel.

use crate::core::feed::{FeedApi, FeedError};
use crate::core::models::{Channel, Episode};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HomePage {
    pub channels: Vec<Channel>,
    /// Prepend to a channel id to get its public RSS feed.
    pub feed_url_prefix: String,
}

#[derive(Debug, Serialize)]
pub struct ChannelPage {
    pub channel: Channel,
    pub episodes: Vec<Episode>,
}

/// Public URL for `path` on `origin`. Proxies in front of the server
/// terminate TLS, so a plain-http origin is upgraded.
pub fn root_url(origin: &str, path: &str) -> String {
    let origin = match origin.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => origin.to_string(),
    };
    format!("{origin}{path}")
}

pub fn load_home(api: &dyn FeedApi, origin: &str) -> Result<HomePage, FeedError> {
    let channels = api.get_channels()?;
    tracing::debug!(count = channels.len(), "Loaded channel index");
    Ok(HomePage {
        channels,
        feed_url_prefix: root_url(origin, "/feed"),
    })
}

pub fn load_channel(api: &dyn FeedApi, id: &str) -> Result<ChannelPage, FeedError> {
    let response = api.get_channel(id)?;
    // The service answers unknown ids with an empty channel rather than an error.
    match response.channel {
        Some(channel) if !channel.id.is_empty() => Ok(ChannelPage {
            channel,
            episodes: response.episodes,
        }),
        _ => Err(FeedError::NotFound(id.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::feed::stub::StubFeed;

    #[test]
    fn test_root_url_upgrades_http_only() {
        assert_eq!(root_url("http://pods.local:8080", "/feed"), "https://pods.local:8080/feed");
        assert_eq!(root_url("https://pods.example", "/feed"), "https://pods.example/feed");
        assert_eq!(root_url("https://pods.example", ""), "https://pods.example");
    }

    #[test]
    fn test_load_home() {
        let feed = StubFeed::default()
            .with_channel("a", "Alpha", &[])
            .with_channel("b", "Beta", &["1"]);
        let page = load_home(&feed, "http://localhost:3000").unwrap();
        assert_eq!(page.channels.len(), 2);
        assert_eq!(page.feed_url_prefix, "https://localhost:3000/feed");

        let json = serde_json::to_value(&page).unwrap();
        assert!(json.get("feedUrlPrefix").is_some());
    }

    #[test]
    fn test_load_channel() {
        let feed = StubFeed::default().with_channel("b", "Beta", &["1", "2"]);
        let page = load_channel(&feed, "b").unwrap();
        assert_eq!(page.channel.title, "Beta");
        assert_eq!(page.episodes.len(), 2);

        assert!(matches!(load_channel(&feed, "zzz"), Err(FeedError::NotFound(id)) if id == "zzz"));
    }

    #[test]
    fn test_feed_errors_pass_through() {
        let feed = StubFeed { offline: true, ..Default::default() };
        assert!(matches!(load_home(&feed, "http://x"), Err(FeedError::Network(_))));
        assert!(matches!(load_channel(&feed, "a"), Err(FeedError::Network(_))));
    }
}
