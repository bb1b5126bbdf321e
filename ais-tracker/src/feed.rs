use std::sync::Mutex;

use futures::{StreamExt, TryStreamExt};
use reqwest::{Client, Url};
use serde::Serialize;
use snafu::ResultExt;
use tokio::io::AsyncRead;

use crate::error::{
    Result,
    error::{FeedRequestSnafu, FeedStatusSnafu},
};

/// Streaming client for the topic-tagged vessel feed. Handshake and reconnect
/// internals stay with the server and the caller's reconnect loop; this
/// client only opens a stream subscribed to the recorded topic patterns.
pub struct FeedClient {
    api_address: Url,
    client: Client,
    topics: Mutex<Vec<String>>,
}

#[derive(Serialize)]
struct FeedSubscription<'a> {
    topics: &'a [String],
}

impl FeedClient {
    pub fn new(api_address: Url) -> FeedClient {
        FeedClient {
            api_address,
            client: Client::new(),
            topics: Mutex::new(Vec::new()),
        }
    }

    /// Records a topic pattern. It takes effect on the next (re)connect.
    pub fn subscribe(&self, pattern: String) {
        let mut topics = self.topics.lock().unwrap();
        if !topics.contains(&pattern) {
            topics.push(pattern);
        }
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics.lock().unwrap().clone()
    }

    /// Returns the feed as a stream which will continuously receive frames
    /// for the subscribed topics.
    pub async fn streamer(&self) -> Result<impl AsyncRead> {
        let topics = self.topics();

        let response = self
            .client
            .post(self.api_address.clone())
            .json(&FeedSubscription { topics: &topics })
            .header("Content-type", "application/json")
            .send()
            .await
            .context(FeedRequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            return FeedStatusSnafu {
                url: self.api_address.to_string(),
                status,
                body: response.text().await.context(FeedRequestSnafu)?,
            }
            .fail();
        }

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(|e| std::io::Error::other(format!("{e:?}"))))
            .into_async_read();

        Ok(tokio_util::compat::FuturesAsyncReadCompatExt::compat(
            stream,
        ))
    }
}
