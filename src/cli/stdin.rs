//! Terminal input read on its own OS thread.
//!
//! A blocking read of the terminal cannot be cancelled. Running it on a
//! detached thread lets the session end, and the process exit, while a read
//! is still pending.

use std::io::{self, BufRead, Read};
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio::sync::mpsc;
use tracing::debug;

const LINE_BUFFER: usize = 16;

/// Lines from a blocking reader, delivered over a channel.
///
/// Wrap it in a `tokio::io::BufReader` to get an `AsyncBufRead`.
pub struct LineChannel {
    lines: mpsc::Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    pos: usize,
}

impl LineChannel {
    /// Reads the process's standard input.
    pub fn stdin() -> io::Result<Self> {
        Self::spawn(io::stdin())
    }

    /// Starts the reader thread. The thread stops at end of input, on a read
    /// error, or once the channel is dropped and the next line arrives.
    pub fn spawn<T>(source: T) -> io::Result<Self>
    where
        T: Read + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(LINE_BUFFER);

        std::thread::Builder::new()
            .name("linguabot-stdin".to_string())
            .spawn(move || {
                let mut source = io::BufReader::new(source);
                loop {
                    let mut line = Vec::new();
                    let item = match source.read_until(b'\n', &mut line) {
                        Ok(0) => break,
                        Ok(_) => Ok(line),
                        Err(e) => Err(e),
                    };
                    let failed = item.is_err();
                    if tx.blocking_send(item).is_err() || failed {
                        break;
                    }
                }
                debug!("Input reader stopped");
            })?;

        Ok(Self {
            lines: rx,
            pending: Vec::new(),
            pos: 0,
        })
    }
}

impl AsyncRead for LineChannel {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();

        if this.pos >= this.pending.len() {
            match ready!(this.lines.poll_recv(cx)) {
                Some(Ok(line)) => {
                    this.pending = line;
                    this.pos = 0;
                }
                Some(Err(e)) => return Poll::Ready(Err(e)),
                // Sender gone: end of input.
                None => return Poll::Ready(Ok(())),
            }
        }

        let n = buf.remaining().min(this.pending.len() - this.pos);
        buf.put_slice(&this.pending[this.pos..this.pos + n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Console;
    use crate::testing::Stalled;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn forwards_lines_then_end_of_input() {
        let source = io::Cursor::new("hola\nadiós\r\nsin salto".as_bytes().to_vec());
        let reader = BufReader::new(LineChannel::spawn(source).unwrap());
        let mut console = Console::new(reader, Vec::new());

        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("hola"));
        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("adiós"));
        assert_eq!(console.read_line().await.unwrap().as_deref(), Some("sin salto"));
        assert_eq!(console.read_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn pending_read_can_be_abandoned() {
        let reader = BufReader::new(LineChannel::spawn(Stalled).unwrap());
        let mut console = Console::new(reader, Vec::new());

        tokio::select! {
            biased;
            _ = tokio::task::yield_now() => {}
            _ = console.read_line() => panic!("a stalled reader produced a line"),
        }

        drop(console);
    }

    #[tokio::test]
    async fn read_errors_surface() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "terminal gone"))
            }
        }

        let reader = BufReader::new(LineChannel::spawn(Broken).unwrap());
        let mut console = Console::new(reader, Vec::new());
        let err = console.read_line().await.unwrap_err();
        assert_eq!(err.to_string(), "terminal gone");
    }
}
