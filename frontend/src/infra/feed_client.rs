use crate::core::feed::{ChannelList, ChannelWithEpisodes, FeedApi, FeedError};
use crate::core::models::Channel;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const SERVICE: &str = "api.v1.FeedService";

// ── Request types ────────────────────────────────────────────────

#[derive(Serialize)]
struct GetChannelsRequest {}

#[derive(Serialize)]
struct GetChannelRequest<'a> {
    id: &'a str,
}

/// Body of a failed Connect unary call.
#[derive(Deserialize)]
struct ConnectError {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

// ── Client ───────────────────────────────────────────────────────

/// Feed service client speaking the Connect protocol with the JSON codec.
pub struct ConnectFeedClient {
    client: Client,
    base_url: String,
}

impl ConnectFeedClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn procedure_url(&self, method: &str) -> String {
        format!("{}/{SERVICE}/{method}", self.base_url)
    }

    fn call<Req: Serialize, Res: DeserializeOwned>(
        &self,
        method: &str,
        request: &Req,
    ) -> Result<Res, FeedError> {
        let url = self.procedure_url(method);
        tracing::debug!(%url, "Feed RPC");

        let resp = self
            .client
            .post(&url)
            .header("Connect-Protocol-Version", "1")
            .json(request)
            .send()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| FeedError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(error_from_body(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|e| FeedError::Parse(e.to_string()))
    }
}

fn error_from_body(status: u16, body: &str) -> FeedError {
    match serde_json::from_str::<ConnectError>(body) {
        Ok(err) if !err.code.is_empty() => FeedError::Api {
            code: err.code,
            message: err.message,
        },
        _ => FeedError::Api {
            code: format!("http_{status}"),
            message: body.chars().take(200).collect(),
        },
    }
}

impl FeedApi for ConnectFeedClient {
    fn get_channels(&self) -> Result<Vec<Channel>, FeedError> {
        let list: ChannelList = self.call("GetChannels", &GetChannelsRequest {})?;
        Ok(list.channels)
    }

    fn get_channel(&self, id: &str) -> Result<ChannelWithEpisodes, FeedError> {
        self.call("GetChannel", &GetChannelRequest { id })
    }
}
