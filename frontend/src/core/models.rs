use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Wire names follow the feed service's proto3 JSON mapping.
///
/// Parsing accepts the enum name or its number. Values this build does not
/// know read as `Unspecified`.
#[derive(Debug, Serialize, PartialEq, Eq, Hash, Clone, Copy, Default)]
pub enum ChannelType {
    #[default]
    #[serde(rename = "CHANNEL_TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "CHANNEL_TYPE_PODCAST")]
    Podcast,
    #[serde(rename = "CHANNEL_TYPE_AUDIO_BOOK")]
    AudioBook,
}

impl ChannelType {
    pub fn label(self) -> &'static str {
        match self {
            ChannelType::Unspecified => "Channel",
            ChannelType::Podcast => "Podcast",
            ChannelType::AudioBook => "Audiobook",
        }
    }

    fn from_number(n: i64) -> Self {
        match n {
            1 => ChannelType::Podcast,
            2 => ChannelType::AudioBook,
            _ => ChannelType::Unspecified,
        }
    }

    fn from_name(name: &str) -> Self {
        match name {
            "CHANNEL_TYPE_PODCAST" => ChannelType::Podcast,
            "CHANNEL_TYPE_AUDIO_BOOK" => ChannelType::AudioBook,
            _ => ChannelType::Unspecified,
        }
    }
}

impl<'de> Deserialize<'de> for ChannelType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Value::deserialize(deserializer)? {
            Value::String(name) => ChannelType::from_name(&name),
            Value::Number(n) => n.as_i64().map_or(ChannelType::Unspecified, ChannelType::from_number),
            _ => ChannelType::Unspecified,
        })
    }
}

// proto3 JSON omits fields holding their default value, so every field
// has to default on the way in.

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Channel {
    pub id: String,
    #[serde(rename = "type")]
    pub channel_type: ChannelType,
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub feed_url: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct Episode {
    pub id: String,
    pub image_url: String,
    pub title: String,
    pub description: String,
    pub sound_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_from_sparse_json() {
        let channel: Channel =
            serde_json::from_str(r#"{"id":"abc","type":"CHANNEL_TYPE_AUDIO_BOOK","title":"Tales"}"#)
                .unwrap();
        assert_eq!(channel.id, "abc");
        assert_eq!(channel.channel_type, ChannelType::AudioBook);
        assert!(channel.feed_url.is_empty());
    }

    #[test]
    fn test_channel_serializes_camel_case() {
        let channel = Channel {
            id: "1".into(),
            channel_type: ChannelType::Podcast,
            image_url: "https://img".into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&channel).unwrap();
        assert_eq!(json["type"], "CHANNEL_TYPE_PODCAST");
        assert_eq!(json["imageUrl"], "https://img");
    }

    #[test]
    fn test_channel_type_by_number() {
        let channel: Channel = serde_json::from_str(r#"{"id":"c","type":1}"#).unwrap();
        assert_eq!(channel.channel_type, ChannelType::Podcast);
        let channel: Channel = serde_json::from_str(r#"{"id":"c","type":2}"#).unwrap();
        assert_eq!(channel.channel_type, ChannelType::AudioBook);
    }

    #[test]
    fn test_unknown_channel_type_is_unspecified() {
        for raw in [
            r#"{"id":"c","type":"CHANNEL_TYPE_VIDEO"}"#,
            r#"{"id":"c","type":7}"#,
            r#"{"id":"c","type":null}"#,
        ] {
            let channel: Channel = serde_json::from_str(raw).unwrap();
            assert_eq!(channel.id, "c");
            assert_eq!(channel.channel_type, ChannelType::Unspecified, "{raw}");
        }
    }
}
