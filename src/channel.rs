//! Notification channel: subscriptions and live topic delivery
//!
//! A [`NotificationChannel`] is created from the [`ChannelInfo`] the platform
//! returns for `POST /api/v2/notifications/channels`. Frames read from the
//! channel's WebSocket are decoded into [`TopicEvent`]s and pushed into a
//! bounded queue drained through [`NotificationChannel::take_receiver`].
//!
//! ```rust,no_run
//! use tower_gcloudcx::prelude::*;
//!
//! # async fn example(info: ChannelInfo, user: uuid::Uuid) -> CodecResult<()> {
//! let channel = NotificationChannel::new(info, CodecConfig::from_env());
//! channel
//!     .subscribe([NotificationTopic::new(TopicKind::UserPresence).with([user])])
//!     .await?;
//!
//! let mut events = channel.take_receiver().await.expect("first consumer");
//! let mut reader = channel.connect().await?;
//! tokio::spawn(async move { while let Some(event) = events.recv().await { println!("{event:?}") } });
//! channel.run(&mut reader).await
//! # }
//! ```

use std::{collections::BTreeSet, fmt, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::{mpsc, watch, Mutex, RwLock};
use url::Url;
use uuid::Uuid;

use crate::{
    codec::Decode,
    config::CodecConfig,
    protocol::{
        error::{CodecError, CodecResult},
        redact::Redact,
    },
    topic::{NotificationTopic, TopicEvent, TopicState},
    transport::{FrameReader, Transport, TransportExt, TransportResponse, WebSocketFrameReader},
};

const REJECT_INCOMPLETE: &str = "topic is missing target ids";

/// A notification channel as created by the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelInfo {
    pub id: Uuid,
    #[serde(default, with = "crate::protocol::scalar::url_opt")]
    pub connect_uri: Option<Url>,
    #[serde(default, with = "crate::protocol::scalar::instant_opt")]
    pub expires: Option<DateTime<Utc>>,
}

impl ChannelInfo {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            connect_uri: None,
            expires: None,
        }
    }

    pub fn with_connect_uri(mut self, connect_uri: Url) -> Self {
        self.connect_uri = Some(connect_uri);
        self
    }

    pub fn subscriptions_endpoint(&self) -> String {
        format!("/api/v2/notifications/channels/{}/subscriptions", self.id)
    }
}

#[derive(Deserialize)]
struct TopicStates {
    #[serde(default)]
    entities: Vec<Value>,
}

/// Subscribes to topics and dispatches their events
pub struct NotificationChannel {
    info: ChannelInfo,
    config: CodecConfig,
    transport: Option<Arc<dyn Transport>>,
    topics: RwLock<BTreeSet<NotificationTopic>>,
    sender: RwLock<Option<mpsc::Sender<TopicEvent>>>,
    receiver: Mutex<Option<mpsc::Receiver<TopicEvent>>>,
    closed: watch::Sender<bool>,
}

impl NotificationChannel {
    pub fn new(info: ChannelInfo, config: CodecConfig) -> Self {
        let (sender, receiver) = mpsc::channel(config.channel_buffer.max(1));
        let (closed, _) = watch::channel(false);
        Self {
            info,
            config,
            transport: None,
            topics: RwLock::new(BTreeSet::new()),
            sender: RwLock::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            closed,
        }
    }

    /// Mirror subscription changes to the platform through `transport`
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    pub fn info(&self) -> &ChannelInfo {
        &self.info
    }

    pub fn id(&self) -> Uuid {
        self.info.id
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Open the channel's WebSocket
    pub async fn connect(&self) -> CodecResult<WebSocketFrameReader> {
        let url = self
            .info
            .connect_uri
            .as_ref()
            .ok_or_else(|| CodecError::missing("connectUri"))?;
        WebSocketFrameReader::connect(url).await
    }

    /// Add topics to the subscriptions
    ///
    /// Topics missing some of their target ids are rejected and not added.
    /// Subscribing twice to a topic is a no-op.
    pub async fn subscribe(
        &self,
        topics: impl IntoIterator<Item = NotificationTopic>,
    ) -> CodecResult<Vec<TopicState>> {
        self.ensure_open()?;
        let (accepted, mut states) = partition(topics);
        if accepted.is_empty() {
            return Ok(states);
        }

        let acked = match &self.transport {
            Some(transport) => {
                let request = accepted.iter().cloned().map(TopicState::new).collect::<Vec<_>>();
                let response = transport
                    .post(&self.info.subscriptions_endpoint(), &request)
                    .await
                    .map_err(|err| {
                        tracing::error!(channel = %self.info.id, "subscribe failed: {err}");
                        err
                    })?;
                topic_states(&response, &accepted)?
            }
            None => accepted.into_iter().map(TopicState::new).collect(),
        };

        let mut subscribed = self.topics.write().await;
        for state in &acked {
            if !state.is_rejected() {
                subscribed.insert(state.topic.clone());
            }
        }
        tracing::debug!(channel = %self.info.id, topics = subscribed.len(), "subscribed");
        states.extend(acked);
        Ok(states)
    }

    /// Replace the subscriptions
    pub async fn set_topics(
        &self,
        topics: impl IntoIterator<Item = NotificationTopic>,
    ) -> CodecResult<Vec<TopicState>> {
        self.ensure_open()?;
        let (accepted, mut states) = partition(topics);

        let acked = self.put_topics(&accepted).await?;
        let mut subscribed = self.topics.write().await;
        *subscribed = acked
            .iter()
            .filter(|state| !state.is_rejected())
            .map(|state| state.topic.clone())
            .collect();
        states.extend(acked);
        Ok(states)
    }

    /// Drop some subscriptions, or all of them when `topics` is empty
    pub async fn unsubscribe(
        &self,
        topics: impl IntoIterator<Item = NotificationTopic>,
    ) -> CodecResult<()> {
        let topics: Vec<_> = topics.into_iter().collect();
        let mut subscribed = self.topics.write().await;

        if topics.is_empty() {
            if let Some(transport) = &self.transport {
                transport.delete(&self.info.subscriptions_endpoint()).await?;
            }
            subscribed.clear();
            return Ok(());
        }

        let remaining: Vec<_> = subscribed
            .iter()
            .filter(|topic| !topics.contains(topic))
            .cloned()
            .collect();
        self.put_topics(&remaining).await?;
        *subscribed = remaining.into_iter().collect();
        Ok(())
    }

    pub async fn is_subscribed(&self, topic: &NotificationTopic) -> bool {
        self.topics.read().await.contains(topic)
    }

    pub async fn topics(&self) -> Vec<NotificationTopic> {
        self.topics.read().await.iter().cloned().collect()
    }

    /// The consumer end of the event queue, available once
    pub async fn take_receiver(&self) -> Option<mpsc::Receiver<TopicEvent>> {
        self.receiver.lock().await.take()
    }

    /// Decode one frame and queue its event
    ///
    /// Returns whether an event was queued: heartbeats are dropped unless
    /// the configuration asks to log them.
    pub async fn deliver(&self, frame: &[u8]) -> CodecResult<bool> {
        self.ensure_open()?;
        let value: Value = serde_json::from_slice(frame).map_err(CodecError::unmarshal)?;
        let event = TopicEvent::from_value_with(value, &self.config)?;

        if event.is_heartbeat() && !self.config.log_heartbeat {
            return Ok(false);
        }
        tracing::trace!(channel = %self.info.id, topic = %event.topic, event = ?event.redact_with(&self.config), "received");

        let sender = self
            .sender
            .read()
            .await
            .clone()
            .ok_or(CodecError::ChannelClosed)?;
        sender
            .send_timeout(event, self.config.delivery_timeout)
            .await
            .map_err(|err| match err {
                mpsc::error::SendTimeoutError::Timeout(_) => {
                    CodecError::DeliveryTimeout(self.config.delivery_timeout)
                }
                mpsc::error::SendTimeoutError::Closed(_) => CodecError::ChannelClosed,
            })?;
        Ok(true)
    }

    /// Deliver every frame of `reader`
    ///
    /// Stops at the end of the stream or once the channel is closed. Frames
    /// that fail to decode, and events that time out, are logged and
    /// skipped.
    pub async fn run<R: FrameReader + ?Sized>(&self, reader: &mut R) -> CodecResult<()> {
        let mut closed = self.closed.subscribe();
        loop {
            if *closed.borrow_and_update() {
                break;
            }
            let frame = tokio::select! {
                _ = closed.changed() => continue,
                frame = reader.next_frame() => frame,
            };
            let frame = match frame {
                None => break,
                Some(Ok(frame)) => frame,
                Some(Err(err)) => {
                    tracing::error!(channel = %self.info.id, "failed to read frame: {err}");
                    continue;
                }
            };
            match self.deliver(&frame).await {
                Ok(_) => {}
                Err(CodecError::ChannelClosed) => break,
                Err(err @ CodecError::DeliveryTimeout(_)) => {
                    tracing::error!(channel = %self.info.id, "dropped event: {err}");
                }
                Err(err) => {
                    tracing::warn!(channel = %self.info.id, size = frame.len(), "{err}");
                }
            }
        }
        tracing::info!(channel = %self.info.id, "stopped receiving");
        Ok(())
    }

    /// Stop accepting work
    ///
    /// Events already queued stay receivable, the consumer then sees the end
    /// of the stream. Platform subscriptions are cleared on a best effort
    /// basis. Closing twice is a no-op.
    pub async fn close(&self) -> CodecResult<()> {
        if self.closed.send_replace(true) {
            return Ok(());
        }
        self.sender.write().await.take();

        let mut subscribed = self.topics.write().await;
        if let Some(transport) = &self.transport {
            if !subscribed.is_empty() {
                if let Err(err) = transport.delete(&self.info.subscriptions_endpoint()).await {
                    tracing::warn!(channel = %self.info.id, "failed to clear subscriptions: {err}");
                }
            }
        }
        subscribed.clear();
        tracing::info!(channel = %self.info.id, "closed");
        Ok(())
    }

    pub fn is_closed(&self) -> bool {
        *self.closed.borrow()
    }

    fn ensure_open(&self) -> CodecResult<()> {
        if self.is_closed() {
            return Err(CodecError::ChannelClosed);
        }
        Ok(())
    }

    async fn put_topics(&self, topics: &[NotificationTopic]) -> CodecResult<Vec<TopicState>> {
        match &self.transport {
            Some(transport) => {
                let request = topics.iter().cloned().map(TopicState::new).collect::<Vec<_>>();
                let response = transport
                    .put(&self.info.subscriptions_endpoint(), &request)
                    .await
                    .map_err(|err| {
                        tracing::error!(channel = %self.info.id, "set topics failed: {err}");
                        err
                    })?;
                topic_states(&response, topics)
            }
            None => Ok(topics.iter().cloned().map(TopicState::new).collect()),
        }
    }
}

impl fmt::Debug for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationChannel")
            .field("info", &self.info)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.info.id)
    }
}

fn partition(
    topics: impl IntoIterator<Item = NotificationTopic>,
) -> (Vec<NotificationTopic>, Vec<TopicState>) {
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();
    for topic in topics {
        if topic.is_complete() {
            if !accepted.contains(&topic) {
                accepted.push(topic);
            }
        } else {
            rejected.push(TopicState::rejected(topic, REJECT_INCOMPLETE));
        }
    }
    (accepted, rejected)
}

/// The states the platform answered with, or plain acks of `requested`
/// when it answered with no body
fn topic_states(
    response: &TransportResponse,
    requested: &[NotificationTopic],
) -> CodecResult<Vec<TopicState>> {
    if response.body.is_empty() {
        return Ok(requested.iter().cloned().map(TopicState::new).collect());
    }
    let states: TopicStates = response.json()?;
    Ok(states
        .entities
        .into_iter()
        .filter_map(|value| match TopicState::from_value(value) {
            Ok(state) => Some(state),
            Err(err) => {
                tracing::warn!("ignoring topic state: {err}");
                None
            }
        })
        .collect())
}
