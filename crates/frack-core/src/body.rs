//! Request and response bodies.
//!
//! A [`Body`] is an ordered sequence of byte chunks. It is either fully known
//! up front (a list of [`Bytes`]) or produced lazily by a stream, in which case
//! reading it may suspend and may fail part-way through.

use std::collections::VecDeque;
use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::{Bytes, BytesMut};
use futures::stream::{BoxStream, Stream, StreamExt};

use crate::error::{BoxError, Failure};

/// An ordered sequence of byte chunks, possibly streamed.
#[derive(Default)]
pub struct Body {
    inner: Inner,
}

enum Inner {
    Chunks(VecDeque<Bytes>),
    Stream(BoxStream<'static, Result<Bytes, BoxError>>),
}

impl Default for Inner {
    fn default() -> Self {
        Inner::Chunks(VecDeque::new())
    }
}

impl Body {
    /// A body with no chunks.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A body made of the given chunks, in order.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        Self {
            inner: Inner::Chunks(chunks.into_iter().map(Into::into).collect()),
        }
    }

    /// A body whose chunks are produced lazily.
    pub fn from_stream<S, E>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self {
            inner: Inner::Stream(stream.map(|chunk| chunk.map_err(Into::into)).boxed()),
        }
    }

    /// Returns `true` if the body is known to hold no bytes.
    ///
    /// A streamed body is never reported empty, since its length is unknown
    /// until it has been read.
    pub fn is_empty(&self) -> bool {
        match &self.inner {
            Inner::Chunks(chunks) => chunks.iter().all(Bytes::is_empty),
            Inner::Stream(_) => false,
        }
    }

    /// Returns `true` if the chunks are produced by a stream.
    pub fn is_streaming(&self) -> bool {
        matches!(self.inner, Inner::Stream(_))
    }

    /// Total length in bytes, when known without reading the body.
    pub fn content_length(&self) -> Option<usize> {
        match &self.inner {
            Inner::Chunks(chunks) => Some(chunks.iter().map(Bytes::len).sum()),
            Inner::Stream(_) => None,
        }
    }

    /// Reads every chunk.
    ///
    /// If the underlying stream yields an error, the chunks read so far are
    /// discarded and the error is returned as a [`Failure`].
    pub async fn into_chunks(self) -> Result<Vec<Bytes>, Failure> {
        match self.inner {
            Inner::Chunks(chunks) => Ok(chunks.into()),
            Inner::Stream(mut stream) => {
                let mut chunks = Vec::new();
                while let Some(chunk) = stream.next().await {
                    chunks.push(chunk.map_err(Failure::new)?);
                }
                Ok(chunks)
            }
        }
    }

    /// Reads every chunk and concatenates them.
    pub async fn to_bytes(self) -> Result<Bytes, Failure> {
        let chunks = self.into_chunks().await?;
        if chunks.len() == 1 {
            return Ok(chunks.into_iter().next().unwrap_or_default());
        }
        let mut buf = BytesMut::with_capacity(chunks.iter().map(Bytes::len).sum());
        for chunk in chunks {
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }
}

impl Stream for Body {
    type Item = Result<Bytes, Failure>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.get_mut().inner {
            Inner::Chunks(chunks) => Poll::Ready(chunks.pop_front().map(Ok)),
            Inner::Stream(stream) => stream
                .poll_next_unpin(cx)
                .map(|chunk| chunk.map(|c| c.map_err(Failure::new))),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            Inner::Chunks(chunks) => (chunks.len(), Some(chunks.len())),
            Inner::Stream(stream) => stream.size_hint(),
        }
    }
}

impl fmt::Debug for Body {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner {
            Inner::Chunks(chunks) => f.debug_tuple("Body").field(chunks).finish(),
            Inner::Stream(_) => f.write_str("Body(<stream>)"),
        }
    }
}

impl From<Bytes> for Body {
    fn from(bytes: Bytes) -> Self {
        Self::from_chunks([bytes])
    }
}

impl From<Vec<Bytes>> for Body {
    fn from(chunks: Vec<Bytes>) -> Self {
        Self::from_chunks(chunks)
    }
}

impl From<Vec<u8>> for Body {
    fn from(bytes: Vec<u8>) -> Self {
        Self::from(Bytes::from(bytes))
    }
}

impl From<String> for Body {
    fn from(text: String) -> Self {
        Self::from(Bytes::from(text))
    }
}

impl From<&'static str> for Body {
    fn from(text: &'static str) -> Self {
        Self::from(Bytes::from_static(text.as_bytes()))
    }
}

impl From<&'static [u8]> for Body {
    fn from(bytes: &'static [u8]) -> Self {
        Self::from(Bytes::from_static(bytes))
    }
}
