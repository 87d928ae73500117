use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll, Waker};

type Responder = Box<dyn FnMut(&str) -> Option<Vec<u8>> + Send>;

/// In-memory instrument.
///
/// Every complete line written by the host is passed to the responder;
/// whatever it returns becomes readable. `None` means the instrument stays
/// silent and reads stay pending.
pub(crate) struct FakeInstrument {
    responder: Responder,
    inbound: Vec<u8>,
    response_buf: Vec<u8>,
    written: Arc<Mutex<Vec<u8>>>,
    chunk: usize,
    fail_after: Option<usize>,
    lines: usize,
    waker: Option<Waker>,
}

impl FakeInstrument {
    pub(crate) fn new(responder: impl FnMut(&str) -> Option<Vec<u8>> + Send + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            inbound: Vec::new(),
            response_buf: Vec::new(),
            written: Arc::new(Mutex::new(Vec::new())),
            chunk: 64,
            fail_after: None,
            lines: 0,
            waker: None,
        }
    }

    /// Replies are terminated with CR-LF like the real meter.
    pub(crate) fn replying(
        mut responder: impl FnMut(&str) -> Option<String> + Send + 'static,
    ) -> Self {
        Self::new(move |cmd| responder(cmd).map(|r| format!("{}\r\n", r).into_bytes()))
    }

    /// Answers like an XDM1041 whose inputs sit at fixed values.
    pub(crate) fn steady(voltage: &'static str, current: &'static str) -> Self {
        Self::replying(move |cmd| match cmd {
            "*IDN?" => Some(String::from("OWON,XDM1041,2147483,V3.7.2")),
            "MEAS:VOLT?" => Some(voltage.to_string()),
            "MEAS:CURRENT?" => Some(current.to_string()),
            _ => None,
        })
    }

    /// Handle on everything the host wrote.
    pub(crate) fn written(&self) -> Arc<Mutex<Vec<u8>>> {
        self.written.clone()
    }

    pub(crate) fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// The first reply to `command` is held back until the host writes its
    /// next line, as if it came in after the host stopped waiting.
    pub(crate) fn delay_first(mut self, command: &'static str) -> Self {
        let mut inner = std::mem::replace(&mut self.responder, Box::new(|_: &str| None));
        let mut held: Option<Vec<u8>> = None;
        let mut delayed = false;
        self.responder = Box::new(move |cmd| {
            let late = held.take();
            let reply = inner(cmd);
            if cmd == command && !delayed {
                delayed = true;
                held = reply;
                return late;
            }
            match (late, reply) {
                (None, None) => None,
                (late, reply) => {
                    Some([late.unwrap_or_default(), reply.unwrap_or_default()].concat())
                }
            }
        });
        self
    }

    /// Writes fail with a broken pipe once `lines` commands went through.
    pub(crate) fn fail_after(mut self, lines: usize) -> Self {
        self.fail_after = Some(lines);
        self
    }
}

impl tokio::io::AsyncRead for FakeInstrument {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut tokio::io::ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        if self.response_buf.is_empty() {
            self.waker = Some(cx.waker().clone());
            return Poll::Pending;
        }
        let c = self.chunk.min(buf.remaining()).min(self.response_buf.len());
        buf.put_slice(&self.response_buf[0..c]);
        self.response_buf.drain(0..c);
        Poll::Ready(Ok(()))
    }
}

impl tokio::io::AsyncWrite for FakeInstrument {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::result::Result<usize, std::io::Error>> {
        if let Some(limit) = self.fail_after {
            if self.lines >= limit {
                return Poll::Ready(Err(std::io::Error::new(
                    std::io::ErrorKind::BrokenPipe,
                    "instrument unplugged",
                )));
            }
        }

        if let Ok(mut written) = self.written.lock() {
            written.extend_from_slice(buf);
        }
        self.inbound.extend_from_slice(buf);

        while let Some(n) = self.inbound.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.inbound.drain(0..=n).collect();
            let cmd = String::from_utf8_lossy(&line[..n]).to_string();
            self.lines += 1;
            if let Some(reply) = (self.responder)(&cmd) {
                self.response_buf.extend_from_slice(&reply);
            }
        }
        if !self.response_buf.is_empty() {
            if let Some(waker) = self.waker.take() {
                waker.wake();
            }
        }
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<std::result::Result<(), std::io::Error>> {
        Poll::Ready(Ok(()))
    }
}
