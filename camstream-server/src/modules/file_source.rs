use std::{
    path::Path,
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use bytes::Bytes;
use camstream_core::{find_nalu_indices, EncodedBuffer, FrameOutcome, NaluType, Pipeline};

/// Encoder output replayed from a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceChunk {
    pub data: Bytes,
    pub is_config: bool,
}

#[derive(Debug, Clone, Copy)]
struct ChunkSpan {
    start: usize,
    end: usize,
    is_config: bool,
    has_slice: bool,
}

/// Units that open a new access unit once the current one has a picture.
fn starts_access_unit(nalu_type: NaluType) -> bool {
    matches!(
        nalu_type,
        NaluType::AccessUnitDelimiter | NaluType::Sei | NaluType::Sps | NaluType::Pps
    )
}

/// `first_mb_in_slice` is the first `ue(v)` of the slice header and is zero
/// only when its leading bit is set.
fn starts_picture(payload: &[u8]) -> bool {
    payload.get(1).is_none_or(|byte| byte & 0x80 != 0)
}

/// Annex-B elementary stream cut into the buffers a hardware encoder would
/// hand out: one configuration buffer per parameter set run and one buffer
/// per picture.
#[derive(Debug)]
pub struct AnnexBFileSource {
    chunks: Vec<SourceChunk>,
}

impl AnnexBFileSource {
    pub fn open(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let source = Self::from_bytes(Bytes::from(data));
        if source.is_empty() {
            bail!("no H.264 NAL units found in {}", path.display());
        }
        Ok(source)
    }

    pub fn from_bytes(data: Bytes) -> Self {
        let mut spans: Vec<ChunkSpan> = Vec::new();
        let mut current: Option<ChunkSpan> = None;

        for index in find_nalu_indices(&data) {
            if index.payload_size == 0 {
                continue;
            }
            let payload = &data[index.payload_range()];
            let nalu_type = NaluType::from_header(payload[0]);

            let starts_chunk = match &current {
                Some(chunk) if nalu_type.is_parameter_set() => chunk.has_slice,
                Some(chunk) if chunk.is_config => true,
                Some(chunk) if nalu_type.is_slice() => {
                    chunk.has_slice && starts_picture(payload)
                }
                Some(chunk) => chunk.has_slice && starts_access_unit(nalu_type),
                None => false,
            };
            if starts_chunk {
                spans.extend(current.take());
            }

            let chunk = current.get_or_insert(ChunkSpan {
                start: index.start_offset,
                end: index.start_offset,
                is_config: false,
                has_slice: false,
            });
            chunk.end = index.payload_range().end;
            // delimiters and SEI ahead of the parameter sets travel with them
            chunk.is_config |= nalu_type.is_parameter_set();
            chunk.has_slice |= nalu_type.is_slice();
        }

        if let Some(chunk) = current {
            match spans.last_mut() {
                // trailing units without a picture belong to the last picture
                Some(last) if !chunk.has_slice && !chunk.is_config && !last.is_config => {
                    last.end = chunk.end;
                }
                _ => spans.push(chunk),
            }
        }

        let chunks: Vec<SourceChunk> = spans
            .into_iter()
            .map(|span| SourceChunk {
                data: data.slice(span.start..span.end),
                is_config: span.is_config,
            })
            .collect();

        tracing::debug!("Split {} bytes into {} chunks.", data.len(), chunks.len());

        Self { chunks }
    }

    pub fn chunks(&self) -> &[SourceChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Feeds every chunk into `pipeline` in real time.
    ///
    /// Configuration chunks share the timestamp of the picture that follows
    /// them. Returns the number of frames dispatched.
    pub fn run(
        &self,
        pipeline: &mut Pipeline,
        frame_duration_us: u64,
        loop_input: bool,
        stop: &AtomicBool,
    ) -> usize {
        let started_at = Instant::now();
        let mut pts_us = 0;
        let mut dispatched = 0;

        loop {
            for chunk in &self.chunks {
                if stop.load(Ordering::Relaxed) {
                    return dispatched;
                }

                let buffer = EncodedBuffer::new(&chunk.data, pts_us, chunk.is_config);
                let outcome = pipeline.on_buffer(buffer);
                if chunk.is_config {
                    continue;
                }
                if let FrameOutcome::Dispatched(_) = outcome {
                    dispatched += 1;
                }

                pts_us += frame_duration_us;
                let deadline = started_at + Duration::from_micros(pts_us);
                let now = Instant::now();
                if deadline > now {
                    std::thread::sleep(deadline - now);
                }
            }

            if !loop_input {
                tracing::info!("Reached the end of the input.");
                return dispatched;
            }
            tracing::debug!("Looping the input.");
        }
    }
}
