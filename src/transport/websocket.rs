//! Notification frames read from the platform WebSocket

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{Stream, StreamExt};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{self, protocol::Message},
    MaybeTlsStream, WebSocketStream,
};
use url::Url;

use crate::protocol::error::{CodecError, CodecResult};

use super::FrameReader;

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Reads text and binary frames from a notification WebSocket
///
/// Control frames are skipped. The reader ends on a close frame, on the end
/// of the underlying stream, or after reporting a receive error.
pub struct WebSocketFrameReader<S = WsStream> {
    source: S,
    done: bool,
}

impl WebSocketFrameReader {
    /// Connect to the `connectUri` of a notification channel
    pub async fn connect(url: &Url) -> CodecResult<Self> {
        let (stream, _) = connect_async(url.as_str())
            .await
            .map_err(|e| CodecError::Transport(format!("WebSocket connection failed: {e}")))?;
        tracing::debug!(%url, "notification socket connected");
        Ok(Self::from_stream(stream))
    }
}

impl<S> WebSocketFrameReader<S>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send,
{
    pub fn from_stream(source: S) -> Self {
        Self {
            source,
            done: false,
        }
    }
}

#[async_trait]
impl<S> FrameReader for WebSocketFrameReader<S>
where
    S: Stream<Item = Result<Message, tungstenite::Error>> + Unpin + Send,
{
    async fn next_frame(&mut self) -> Option<CodecResult<Bytes>> {
        while !self.done {
            match self.source.next().await {
                Some(Ok(Message::Text(text))) => return Some(Ok(Bytes::from(text))),
                Some(Ok(Message::Binary(data))) => return Some(Ok(Bytes::from(data))),
                Some(Ok(Message::Close(frame))) => {
                    tracing::debug!(?frame, "notification socket closed");
                    self.done = true;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    self.done = true;
                    return Some(Err(CodecError::Transport(format!(
                        "WebSocket receive failed: {e}"
                    ))));
                }
                None => self.done = true,
            }
        }
        None
    }
}

impl<S> std::fmt::Debug for WebSocketFrameReader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebSocketFrameReader")
            .field("done", &self.done)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use futures::stream;

    use super::*;

    #[tokio::test]
    async fn test_yields_data_frames_until_close() {
        let frames = vec![
            Ok(Message::Ping(vec![1])),
            Ok(Message::Text(r#"{"topicName":"channel.metadata"}"#.to_string())),
            Ok(Message::Binary(b"{}".to_vec())),
            Ok(Message::Close(None)),
            Ok(Message::Text("after close".to_string())),
        ];
        let mut reader = WebSocketFrameReader::from_stream(stream::iter(frames));

        assert_eq!(
            reader.next_frame().await.unwrap().unwrap(),
            Bytes::from_static(br#"{"topicName":"channel.metadata"}"#)
        );
        assert_eq!(reader.next_frame().await.unwrap().unwrap(), Bytes::from_static(b"{}"));
        assert!(reader.next_frame().await.is_none());
        assert!(reader.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_receive_error_ends_the_reader() {
        let frames = vec![Err(tungstenite::Error::ConnectionClosed)];
        let mut reader = WebSocketFrameReader::from_stream(stream::iter(frames));

        let err = reader.next_frame().await.unwrap().unwrap_err();
        assert!(matches!(err, CodecError::Transport(_)));
        assert!(reader.next_frame().await.is_none());
    }
}
