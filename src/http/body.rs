//! Response body types.
//!
//! Small bodies (error pages, listings, preflight replies) are buffered;
//! file payloads go through [`FileStream`], which reads the negotiated byte
//! span in bounded chunks so that serving a multi-gigabyte video costs the
//! same memory as serving a thumbnail.

use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::task::{Context, Poll};

use bytes::Bytes;
use http_body::{Body, Frame, SizeHint};
use http_body_util::combinators::BoxBody;
use http_body_util::{BodyExt, Empty, Full};
use pin_project::pin_project;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, ReadBuf};

/// Unified body type returned by every handler.
pub type ResponseBody = BoxBody<Bytes, io::Error>;

/// Transfer chunk size. Bounded so large files never sit in memory whole.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Buffered body from in-memory data.
pub fn full(data: impl Into<Bytes>) -> ResponseBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

/// Zero-length body (HEAD responses, 416, preflight).
#[must_use]
pub fn empty() -> ResponseBody {
    Empty::<Bytes>::new()
        .map_err(|never| match never {})
        .boxed()
}

/// Body that streams `length` bytes of an open file starting at `start`.
pub fn file_stream(file: File, start: u64, length: u64) -> ResponseBody {
    FileStream::new(file, start, length).boxed()
}

/// Chunked reader over an open file, bounded to a byte span.
///
/// Seeks to the span start on first poll, then emits frames of at most
/// [`CHUNK_SIZE`] bytes until the span is exhausted. A short read (the file
/// shrank underneath us) ends the stream cleanly rather than erroring. The
/// file handle is owned by the stream and released when the body is dropped,
/// on every exit path.
#[pin_project]
pub struct FileStream {
    #[pin]
    file: File,
    state: StreamState,
    remaining: u64,
}

#[derive(Debug)]
enum StreamState {
    Seek { start: u64 },
    Seeking,
    Reading,
}

impl FileStream {
    /// Wrap an open file, bounding the stream to `length` bytes at `start`.
    #[must_use]
    pub const fn new(file: File, start: u64, length: u64) -> Self {
        Self {
            file,
            state: StreamState::Seek { start },
            remaining: length,
        }
    }
}

impl Body for FileStream {
    type Data = Bytes;
    type Error = io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<io::Result<Frame<Bytes>>>> {
        let mut this = self.project();

        if let StreamState::Seek { start } = *this.state {
            if let Err(e) = this.file.as_mut().start_seek(SeekFrom::Start(start)) {
                return Poll::Ready(Some(Err(e)));
            }
            *this.state = StreamState::Seeking;
        }

        if let StreamState::Seeking = this.state {
            match this.file.as_mut().poll_complete(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(e))),
                Poll::Ready(Ok(_)) => *this.state = StreamState::Reading,
            }
        }

        if *this.remaining == 0 {
            return Poll::Ready(None);
        }

        // Read at most one chunk, never past the end of the span
        let want = usize::try_from((*this.remaining).min(CHUNK_SIZE as u64))
            .unwrap_or(CHUNK_SIZE);
        let mut buf = vec![0u8; want];
        let mut read_buf = ReadBuf::new(&mut buf);

        match this.file.as_mut().poll_read(cx, &mut read_buf) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Some(Err(e))),
            Poll::Ready(Ok(())) => {
                let n = read_buf.filled().len();
                if n == 0 {
                    // Premature EOF: stop cleanly
                    *this.remaining = 0;
                    return Poll::Ready(None);
                }
                buf.truncate(n);
                *this.remaining -= n as u64;
                Poll::Ready(Some(Ok(Frame::data(Bytes::from(buf)))))
            }
        }
    }

    fn is_end_stream(&self) -> bool {
        self.remaining == 0 && matches!(self.state, StreamState::Reading)
    }

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.remaining)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn patterned(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn fixture(data: &[u8]) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().expect("create temp file");
        f.write_all(data).expect("write fixture");
        f
    }

    async fn collect(body: FileStream) -> Vec<u8> {
        body.collect().await.expect("collect body").to_bytes().to_vec()
    }

    #[tokio::test]
    async fn streams_whole_file_across_chunk_boundaries() {
        let data = patterned(200_000); // > 3 chunks
        let fx = fixture(&data);
        let file = File::open(fx.path()).await.unwrap();

        let body = FileStream::new(file, 0, data.len() as u64);
        assert_eq!(body.size_hint().exact(), Some(200_000));
        assert_eq!(collect(body).await, data);
    }

    #[tokio::test]
    async fn streams_exact_span() {
        let data = patterned(200_000);
        let fx = fixture(&data);
        let file = File::open(fx.path()).await.unwrap();

        let body = FileStream::new(file, 100_000, 1000);
        assert_eq!(collect(body).await, &data[100_000..101_000]);
    }

    #[tokio::test]
    async fn single_byte_span_at_end_of_file() {
        let data = patterned(1000);
        let fx = fixture(&data);
        let file = File::open(fx.path()).await.unwrap();

        let body = FileStream::new(file, 999, 1);
        assert_eq!(collect(body).await, &data[999..]);
    }

    #[tokio::test]
    async fn short_read_stops_cleanly() {
        let data = patterned(500);
        let fx = fixture(&data);
        let file = File::open(fx.path()).await.unwrap();

        // Span claims more bytes than the file holds
        let body = FileStream::new(file, 0, 10_000);
        assert_eq!(collect(body).await, data);
    }

    #[tokio::test]
    async fn empty_span_yields_no_frames() {
        let fx = fixture(b"");
        let file = File::open(fx.path()).await.unwrap();

        let body = FileStream::new(file, 0, 0);
        assert!(collect(body).await.is_empty());
    }
}
