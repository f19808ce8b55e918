use crate::core::models::{Channel, Episode};
use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("API error ({code}): {message}")]
    Api { code: String, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Channel not found: {0}")]
    NotFound(String),
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelList {
    pub channels: Vec<Channel>,
}

/// One channel with its episodes. `channel` is absent when the id is unknown.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ChannelWithEpisodes {
    pub channel: Option<Channel>,
    pub episodes: Vec<Episode>,
}

/// Read side of the feed service.
pub trait FeedApi: Send + Sync {
    fn get_channels(&self) -> Result<Vec<Channel>, FeedError>;
    fn get_channel(&self, id: &str) -> Result<ChannelWithEpisodes, FeedError>;
}
