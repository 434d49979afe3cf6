use std::io::Write;
use std::sync::Arc;

use tracing_subscriber::fmt::MakeWriter;

/// A log sink wrapper that strips known secret values from every line
/// before it reaches the underlying writer.
///
/// Credentials must never appear in diagnostic output, not even inside
/// error bodies echoed back by the server.
#[derive(Clone)]
pub struct RedactingMakeWriter<M> {
    inner: M,
    secrets: Arc<Vec<String>>,
}

impl<M> RedactingMakeWriter<M> {
    pub fn new(inner: M, secrets: Vec<String>) -> Self {
        // Empty secrets would turn replacement into an infinite loop of no-ops
        let secrets = secrets.into_iter().filter(|s| !s.is_empty()).collect();
        Self {
            inner,
            secrets: Arc::new(secrets),
        }
    }
}

impl<'a, M> MakeWriter<'a> for RedactingMakeWriter<M>
where
    M: MakeWriter<'a>,
{
    type Writer = RedactingWriter<M::Writer>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter {
            inner: self.inner.make_writer(),
            secrets: Arc::clone(&self.secrets),
        }
    }
}

pub struct RedactingWriter<W> {
    inner: W,
    secrets: Arc<Vec<String>>,
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let mut text = String::from_utf8_lossy(buf).into_owned();
        for secret in self.secrets.iter() {
            if text.contains(secret.as_str()) {
                text = text.replace(secret.as_str(), "[REDACTED]");
            }
        }
        self.inner.write_all(text.as_bytes())?;
        // Report the original length so callers never see a partial write
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.inner.flush()
    }
}
