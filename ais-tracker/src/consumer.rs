use std::sync::Arc;

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::{error, instrument, trace};

use crate::{
    cache::{IngestOutcome, VesselCache},
    error::{Result, error::StreamClosedSnafu},
    models::FeedEnvelope,
};

/// Frames larger than this are dropped by the codec; real feed messages are a
/// few hundred bytes.
const MAX_FRAME_LENGTH: usize = 16_384;

/// Drains the line-delimited feed and hands each frame to the cache. A single
/// bad frame never stops the loop; a closed stream does, and the caller
/// decides whether to reconnect.
pub struct Consumer {
    cache: Arc<VesselCache>,
}

impl Consumer {
    pub fn new(cache: Arc<VesselCache>) -> Consumer {
        Consumer { cache }
    }

    pub async fn run(&self, source: impl AsyncRead + Unpin) -> Result<()> {
        let codec = LinesCodec::new_with_max_length(MAX_FRAME_LENGTH);
        let mut framed_read = FramedRead::new(source, codec);

        while let Some(message) = framed_read.next().await {
            match message {
                Ok(message) => self.process_frame(&message),
                Err(e) => error!("failed to consume feed frame: {e:?}"),
            }
        }

        StreamClosedSnafu.fail()
    }

    #[instrument(skip_all)]
    fn process_frame(&self, frame: &str) {
        let envelope: FeedEnvelope = match serde_json::from_str(frame) {
            Ok(envelope) => envelope,
            Err(e) => {
                error!("failed to decode feed frame: {e:?}");
                return;
            }
        };

        match self.cache.ingest(&envelope.topic, envelope.payload.get()) {
            Ok(IngestOutcome::Stored(kind)) => {
                trace!("stored {kind:?} frame from '{}'", envelope.topic)
            }
            // Most traffic on a shared feed is vessels we do not follow.
            Ok(IngestOutcome::NotFollowed) => {}
            Err(e) => error!("{e:?}"),
        }
    }
}
