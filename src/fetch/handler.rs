use bzip2::read::MultiBzDecoder;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

/// How a response body is turned into the cached file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentHandler {
    /// Copy the body unchanged, chunk by chunk.
    #[default]
    Identity,
    /// Buffer the whole body and bzip2-decompress it.
    Bzip2,
}

#[derive(Debug)]
pub(crate) enum HandlerError {
    Transfer(reqwest::Error),
    Write(io::Error),
    Decompress(io::Error),
}

impl ContentHandler {
    /// Streams `response` into `sink`, returning the number of bytes written.
    pub(crate) async fn write_body(
        self,
        mut response: Response,
        sink: &mut impl Write,
    ) -> Result<u64, HandlerError> {
        match self {
            ContentHandler::Identity => {
                let mut written = 0u64;
                while let Some(chunk) = response.chunk().await.map_err(HandlerError::Transfer)? {
                    sink.write_all(&chunk).map_err(HandlerError::Write)?;
                    written += chunk.len() as u64;
                }
                sink.flush().map_err(HandlerError::Write)?;
                Ok(written)
            }
            ContentHandler::Bzip2 => {
                let body = response.bytes().await.map_err(HandlerError::Transfer)?;
                decompress_into(&body, sink)
            }
        }
    }
}

/// Decompresses a complete (possibly multi-stream) bzip2 payload into `sink`.
pub(crate) fn decompress_into(compressed: &[u8], sink: &mut impl Write) -> Result<u64, HandlerError> {
    let mut decompressed = Vec::new();
    MultiBzDecoder::new(compressed)
        .read_to_end(&mut decompressed)
        .map_err(HandlerError::Decompress)?;

    sink.write_all(&decompressed).map_err(HandlerError::Write)?;
    sink.flush().map_err(HandlerError::Write)?;
    Ok(decompressed.len() as u64)
}
