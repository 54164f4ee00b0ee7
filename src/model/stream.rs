use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::{error::ServiceError, model::GenerationFragment};

#[derive(Deserialize)]
#[serde(untagged)]
enum WireFragment {
    Failure { error: String },
    Fragment(GenerationFragment),
}

/// Incremental decoder for a body made of back-to-back JSON objects.
///
/// Bytes are buffered until a complete object is available, so chunk
/// boundaries may fall anywhere, including inside a multi-byte character.
/// The buffer is only re-parsed once a chunk carrying a `}` arrives, since
/// no object can complete without one.
#[derive(Debug, Default)]
pub struct FragmentDecoder {
    buf: Vec<u8>,
    ready: bool,
}

impl FragmentDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &[u8]) {
        self.buf.extend_from_slice(chunk);
        if chunk.contains(&b'}') {
            self.ready = true;
        }
    }

    /// Returns `Ok(None)` when the buffer holds no complete object yet.
    pub fn next_fragment(&mut self) -> Result<Option<GenerationFragment>, ServiceError> {
        if !self.ready {
            return Ok(None);
        }

        let mut objects =
            serde_json::Deserializer::from_slice(&self.buf).into_iter::<WireFragment>();

        match objects.next() {
            None => {
                // only whitespace left
                self.buf.clear();
                self.ready = false;
                Ok(None)
            }
            Some(Ok(wire)) => {
                let consumed = objects.byte_offset();
                self.buf.drain(..consumed);
                match wire {
                    WireFragment::Fragment(fragment) => Ok(Some(fragment)),
                    WireFragment::Failure { error } => Err(ServiceError::Upstream(error)),
                }
            }
            Some(Err(err)) if err.is_eof() => {
                self.ready = false;
                Ok(None)
            }
            Some(Err(err)) => Err(ServiceError::Decode(err.to_string())),
        }
    }

    /// Fails if the body ended in the middle of an object.
    pub fn finish(&self) -> Result<(), ServiceError> {
        if self.buf.iter().all(u8::is_ascii_whitespace) {
            Ok(())
        } else {
            Err(ServiceError::Decode(format!(
                "response ended inside a fragment ({} trailing bytes)",
                self.buf.len()
            )))
        }
    }
}

/// Concatenates fragment text in arrival order.
///
/// Stops at the first terminal fragment without reading further, and
/// returns what was gathered if the stream ends before one arrives.
/// Stream errors keep their own classification, so a timeout while the
/// body is still arriving stays a timeout.
pub async fn aggregate_fragments<S, B, E>(stream: S) -> Result<String, ServiceError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<ServiceError>,
{
    let mut decoder = FragmentDecoder::new();
    let mut text = String::new();
    let mut fragments = 0usize;

    futures::pin_mut!(stream);
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(Into::<ServiceError>::into)?;
        decoder.push(chunk.as_ref());

        while let Some(fragment) = decoder.next_fragment()? {
            fragments += 1;
            text.push_str(&fragment.response);
            if fragment.done {
                tracing::debug!(fragments, bytes = text.len(), "generation complete");
                return Ok(text);
            }
        }
    }

    decoder.finish()?;
    tracing::debug!(fragments, "response ended without a terminal fragment");
    Ok(text)
}
