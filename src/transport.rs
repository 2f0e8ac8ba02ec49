use std::path::PathBuf;

use log::{debug, info, warn};
use reqwest::Client;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use url::Url;

use crate::auth::FeedToken;
use crate::error::{Result, TestboardError};
use crate::events::{InboundEvent, OutboundEvent};

/// Where newline-delimited inbound events are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventSource {
    Stdin,
    File(PathBuf),
    Http(Url),
}

impl EventSource {
    /// `-` is stdin, `http(s)://` is fetched, anything else is a file path.
    pub fn parse(input: &str) -> Result<Self> {
        if input == "-" {
            return Ok(Self::Stdin);
        }
        if input.starts_with("http://") || input.starts_with("https://") {
            return Ok(Self::Http(Url::parse(input)?));
        }
        if input.is_empty() {
            return Err(TestboardError::Config("Empty event source".to_string()));
        }
        Ok(Self::File(PathBuf::from(input)))
    }
}

pub struct FeedClient {
    client: Client,
    token: Option<FeedToken>,
}

impl FeedClient {
    pub fn new(token: Option<FeedToken>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("Testboard/0.1.0")
            .build()
            .map_err(|e| TestboardError::Config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, token })
    }

    fn auth_request(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => token.authorize(request),
            None => request,
        }
    }

    pub async fn fetch_event_log(&self, url: &Url) -> Result<String> {
        let request = self.auth_request(self.client.get(url.clone()));

        let response = request.send().await?.error_for_status()?;
        Ok(response.text().await?)
    }
}

/// Decodes one event line. Blank and undecodable lines yield `None`.
pub fn decode_line(line: &str) -> Option<InboundEvent> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    match serde_json::from_str(line) {
        Ok(event) => Some(event),
        Err(e) => {
            warn!("Skipping undecodable event line: {e}");
            None
        }
    }
}

async fn forward_lines<R>(reader: R, events: &mpsc::Sender<InboundEvent>) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut forwarded = 0;

    while let Some(line) = lines.next_line().await? {
        let Some(event) = decode_line(&line) else {
            continue;
        };
        if events.send(event).await.is_err() {
            debug!("Event consumer went away, stopping after {forwarded} events");
            break;
        }
        forwarded += 1;
    }

    Ok(forwarded)
}

/// Reads the source to the end, forwarding each decoded event in order.
/// Returns how many events were forwarded.
pub async fn forward_events(
    source: &EventSource,
    token: Option<FeedToken>,
    events: mpsc::Sender<InboundEvent>,
) -> Result<usize> {
    let forwarded = match source {
        EventSource::Stdin => forward_lines(BufReader::new(tokio::io::stdin()), &events).await?,
        EventSource::File(path) => {
            let file = tokio::fs::File::open(path).await?;
            forward_lines(BufReader::new(file), &events).await?
        }
        EventSource::Http(url) => {
            let body = FeedClient::new(token)?.fetch_event_log(url).await?;
            forward_lines(body.as_bytes(), &events).await?
        }
    };

    info!("Forwarded {forwarded} events from {source:?}");
    Ok(forwarded)
}

/// Consumer side of the collector link: asks for a snapshot on start and
/// relays add/remove requests.
pub struct Subscription {
    outbound: mpsc::Sender<OutboundEvent>,
}

impl Subscription {
    pub async fn start(outbound: mpsc::Sender<OutboundEvent>) -> Result<Self> {
        let subscription = Self { outbound };
        subscription.send(OutboundEvent::Get).await?;
        Ok(subscription)
    }

    async fn send(&self, event: OutboundEvent) -> Result<()> {
        self.outbound
            .send(event)
            .await
            .map_err(|_| TestboardError::ChannelClosed)
    }

    pub async fn add_pipeline(&self, name: &str) -> Result<()> {
        self.send(OutboundEvent::Add(name.to_string())).await
    }

    pub async fn remove_report(&self, id: &str) -> Result<()> {
        self.send(OutboundEvent::Remove(id.to_string())).await
    }
}
