use async_trait::async_trait;
use bytes::Bytes;
use tokio::sync::mpsc;

use crate::protocol::error::CodecResult;

/// Source of raw notification frames
///
/// `None` means the stream ended and no further frames will come.
#[async_trait]
pub trait FrameReader: Send {
    async fn next_frame(&mut self) -> Option<CodecResult<Bytes>>;
}

#[async_trait]
impl<R: FrameReader + ?Sized> FrameReader for Box<R> {
    async fn next_frame(&mut self) -> Option<CodecResult<Bytes>> {
        (**self).next_frame().await
    }
}

/// Frames pushed through an in-process channel
///
/// Ends once every sender is dropped.
#[derive(Debug)]
pub struct ChannelFrameReader {
    receiver: mpsc::Receiver<CodecResult<Bytes>>,
}

impl ChannelFrameReader {
    pub fn new(receiver: mpsc::Receiver<CodecResult<Bytes>>) -> Self {
        Self { receiver }
    }

    /// A reader and the sender feeding it
    pub fn pair(buffer: usize) -> (mpsc::Sender<CodecResult<Bytes>>, Self) {
        let (sender, receiver) = mpsc::channel(buffer);
        (sender, Self::new(receiver))
    }
}

#[async_trait]
impl FrameReader for ChannelFrameReader {
    async fn next_frame(&mut self) -> Option<CodecResult<Bytes>> {
        self.receiver.recv().await
    }
}

#[cfg(test)]
mod tests {
    use tokio_test::{assert_pending, assert_ready, task};

    use crate::protocol::error::CodecError;

    use super::*;

    #[tokio::test]
    async fn test_channel_reader_waits_for_frames() {
        let (sender, mut reader) = ChannelFrameReader::pair(1);
        {
            let mut next = task::spawn(reader.next_frame());
            assert_pending!(next.poll());
            sender.try_send(Ok(Bytes::from_static(b"{}"))).unwrap();
            assert!(next.is_woken());
            let frame = assert_ready!(next.poll());
            assert_eq!(frame.unwrap().unwrap(), Bytes::from_static(b"{}"));
        }
        drop(sender);
        assert!(reader.next_frame().await.is_none());
    }

    #[tokio::test]
    async fn test_channel_reader_ends_when_senders_drop() {
        let (sender, mut reader) = ChannelFrameReader::pair(4);
        sender.send(Ok(Bytes::from_static(b"{}"))).await.unwrap();
        sender
            .send(Err(CodecError::Transport("reset".to_string())))
            .await
            .unwrap();
        drop(sender);

        assert_eq!(reader.next_frame().await.unwrap().unwrap(), Bytes::from_static(b"{}"));
        assert!(reader.next_frame().await.unwrap().is_err());
        assert!(reader.next_frame().await.is_none());
    }
}
