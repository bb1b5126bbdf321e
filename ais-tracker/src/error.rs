use reqwest::StatusCode;
use snafu::{Location, Snafu};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Snafu)]
#[snafu(module, visibility(pub))]
pub enum Error {
    #[snafu(display("registry request failed"))]
    RegistryRequest {
        #[snafu(implicit)]
        location: Location,
        source: reqwest::Error,
    },
    #[snafu(display("registry fetch failed, status: '{status}', url: '{url}', body: '{body}'"))]
    RegistryStatus {
        #[snafu(implicit)]
        location: Location,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[snafu(display("registry response was not a valid vessel list"))]
    RegistryDecode {
        #[snafu(implicit)]
        location: Location,
        source: reqwest::Error,
    },
    #[snafu(display("malformed feed topic: '{topic}'"))]
    MalformedTopic {
        #[snafu(implicit)]
        location: Location,
        topic: String,
    },
    #[snafu(display("malformed payload on topic '{topic}'"))]
    MalformedPayload {
        #[snafu(implicit)]
        location: Location,
        topic: String,
        source: serde_json::Error,
    },
    #[snafu(display("feed request failed"))]
    FeedRequest {
        #[snafu(implicit)]
        location: Location,
        source: reqwest::Error,
    },
    #[snafu(display("feed request failed, status: '{status}', url: '{url}', body: '{body}'"))]
    FeedStatus {
        #[snafu(implicit)]
        location: Location,
        url: String,
        status: StatusCode,
        body: String,
    },
    #[snafu(display("feed stream closed unexpectedly"))]
    StreamClosed {
        #[snafu(implicit)]
        location: Location,
    },
}
