//! Frame sources.
//!
//! [`FrameSource`] abstracts the decode side of the pipeline: an ordered,
//! finite, non-restartable sequence of [`RawFrame`]s plus an approximate
//! total-count hint. [`VideoSource`] is the FFmpeg-backed implementation —
//! it demuxes and decodes a video file sequentially, converting each frame
//! to the requested pixel format on the fly.
//!
//! Decoding is inherently stateful and sequential; the pipeline never calls
//! [`next_frame`](FrameSource::next_frame) concurrently.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ffmpeg_next::{
    Error as FfmpegError,
    Packet,
    codec::context::Context as CodecContext,
    decoder::Video as VideoDecoder,
    format::context::Input,
    frame::Video as VideoFrame,
    media::Type,
    software::scaling::{Context as ScalingContext, Flags as ScalingFlags},
};

use crate::{
    error::FramesplitError,
    frame::{PixelFormat, RawFrame},
};

/// An ordered, finite, non-restartable sequence of decoded frames.
///
/// Implementations are consumed by
/// [`ExtractionPipeline::run_with_source`](crate::ExtractionPipeline). The
/// pipeline assigns frame indices itself; sources only produce buffers in
/// decode order.
pub trait FrameSource {
    /// Approximate total frame count, or 0 when unknown.
    ///
    /// The value comes from container metadata and is not guaranteed
    /// accurate — callers must not treat it as exact, and must not divide
    /// by it without checking for zero.
    fn total_hint(&self) -> u64;

    /// Produce the next frame, or `None` once the stream is exhausted.
    fn next_frame(&mut self) -> Option<RawFrame>;

    /// Release decoder resources. Idempotent; subsequent
    /// [`next_frame`](FrameSource::next_frame) calls return `None`.
    fn close(&mut self);
}

/// Sequential FFmpeg-backed video decoder.
///
/// Opens a video file, locates the best video stream, and yields every frame
/// in decode order as a packed [`RawFrame`] in the requested
/// [`PixelFormat`]. Frames are decoded lazily — each
/// [`next_frame`](FrameSource::next_frame) call reads just enough packets to
/// produce one frame, so memory use is independent of video length.
///
/// # Example
///
/// ```no_run
/// use framesplit::{FrameSource, FramesplitError, PixelFormat, VideoSource};
///
/// let mut source = VideoSource::open("input.mp4", PixelFormat::Rgb8)?;
/// println!("~{} frames expected", source.total_hint());
/// while let Some(frame) = source.next_frame() {
///     println!("{}x{}", frame.width(), frame.height());
/// }
/// # Ok::<(), FramesplitError>(())
/// ```
pub struct VideoSource {
    input: Input,
    decoder: VideoDecoder,
    scaler: ScalingContext,
    stream_index: usize,
    width: u32,
    height: u32,
    pixel_format: PixelFormat,
    total_hint: u64,
    file_path: PathBuf,
    decoded_frame: VideoFrame,
    scaled_frame: VideoFrame,
    eof_sent: bool,
    finished: bool,
}

impl VideoSource {
    /// Open a video file for sequential frame decoding.
    ///
    /// Initializes FFmpeg (idempotent), opens the file, locates the best
    /// video stream, and builds the decoder and pixel-format converter.
    ///
    /// # Errors
    ///
    /// - [`FramesplitError::FileOpen`] if the file is missing, unreadable,
    ///   or the container cannot be parsed. Fatal — corrupt input is not
    ///   transient, so callers should not retry.
    /// - [`FramesplitError::NoVideoStream`] if the container has no video.
    pub fn open<P: AsRef<Path>>(
        path: P,
        pixel_format: PixelFormat,
    ) -> Result<Self, FramesplitError> {
        let path = path.as_ref();
        let file_path = path.to_path_buf();

        log::debug!("Opening video file: {}", file_path.display());

        ffmpeg_next::init().map_err(|error| FramesplitError::FileOpen {
            path: file_path.clone(),
            reason: format!("FFmpeg initialisation failed: {error}"),
        })?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| {
            FramesplitError::FileOpen {
                path: file_path.clone(),
                reason: error.to_string(),
            }
        })?;

        let stream = input
            .streams()
            .best(Type::Video)
            .ok_or(FramesplitError::NoVideoStream)?;
        let stream_index = stream.index();

        let decoder_context = CodecContext::from_parameters(stream.parameters()).map_err(
            |error| FramesplitError::FileOpen {
                path: file_path.clone(),
                reason: format!("Failed to read video codec parameters: {error}"),
            },
        )?;
        let decoder =
            decoder_context
                .decoder()
                .video()
                .map_err(|error| FramesplitError::FileOpen {
                    path: file_path.clone(),
                    reason: format!("Failed to create video decoder: {error}"),
                })?;

        let width = decoder.width();
        let height = decoder.height();

        let scaler = ScalingContext::get(
            decoder.format(),
            width,
            height,
            pixel_format.to_ffmpeg_pixel(),
            width,
            height,
            ScalingFlags::BILINEAR,
        )?;

        let total_hint = frame_count_hint(&input, stream_index);

        log::info!(
            "Opened video file: {} ({}x{}, ~{} frames)",
            file_path.display(),
            width,
            height,
            total_hint,
        );

        Ok(Self {
            input,
            decoder,
            scaler,
            stream_index,
            width,
            height,
            pixel_format,
            total_hint,
            file_path,
            decoded_frame: VideoFrame::empty(),
            scaled_frame: VideoFrame::empty(),
            eof_sent: false,
            finished: false,
        })
    }

    /// Frame width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Convert the current `decoded_frame` into a packed [`RawFrame`].
    fn convert_current_frame(&mut self) -> Result<RawFrame, FramesplitError> {
        self.scaler.run(&self.decoded_frame, &mut self.scaled_frame)?;

        let data = packed_buffer(
            &self.scaled_frame,
            self.width,
            self.height,
            self.pixel_format.bytes_per_pixel(),
        );

        Ok(RawFrame::new(self.width, self.height, self.pixel_format, data))
    }
}

impl FrameSource for VideoSource {
    fn total_hint(&self) -> u64 {
        self.total_hint
    }

    /// Decode the next frame in stream order.
    ///
    /// A decode error mid-stream is logged and ends the stream — the demuxer
    /// cannot reliably distinguish a truncated file from a clean end, and a
    /// partial frame set is still useful to the caller.
    fn next_frame(&mut self) -> Option<RawFrame> {
        if self.finished {
            return None;
        }

        loop {
            // Drain frames the decoder has already produced.
            if self.decoder.receive_frame(&mut self.decoded_frame).is_ok() {
                match self.convert_current_frame() {
                    Ok(frame) => return Some(frame),
                    Err(error) => {
                        log::warn!(
                            "Stopping decode of {}: {error}",
                            self.file_path.display(),
                        );
                        self.finished = true;
                        return None;
                    }
                }
            }

            if self.eof_sent {
                // Decoder fully drained after EOF.
                self.finished = true;
                return None;
            }

            // Feed the decoder more packets.
            let mut packet = Packet::empty();
            match packet.read(&mut self.input) {
                Ok(()) => {
                    if packet.stream() == self.stream_index
                        && let Err(error) = self.decoder.send_packet(&packet)
                    {
                        log::warn!(
                            "Stopping decode of {}: {error}",
                            self.file_path.display(),
                        );
                        self.finished = true;
                        return None;
                    }
                    // Non-video packets are silently skipped.
                }
                Err(FfmpegError::Eof) => {
                    if let Err(error) = self.decoder.send_eof() {
                        log::warn!(
                            "Stopping decode of {}: {error}",
                            self.file_path.display(),
                        );
                        self.finished = true;
                        return None;
                    }
                    self.eof_sent = true;
                }
                Err(_) => {
                    // Non-fatal read error — try the next packet.
                }
            }
        }
    }

    fn close(&mut self) {
        if !self.finished {
            log::debug!("Closing video file: {}", self.file_path.display());
        }
        // Decoder and demuxer contexts are released on drop.
        self.finished = true;
    }
}

/// Best-effort total frame count for a stream, 0 when unknown.
///
/// Prefers the container's frame-count field; falls back to duration ×
/// average frame rate when the container omits it (common for AVI and
/// streamed MP4). Either way the value is approximate.
fn frame_count_hint(input: &Input, stream_index: usize) -> u64 {
    let Some(stream) = input.stream(stream_index) else {
        return 0;
    };

    let declared = stream.frames();
    if declared > 0 {
        return declared as u64;
    }

    let duration_microseconds = input.duration();
    if duration_microseconds <= 0 {
        return 0;
    }
    let duration = Duration::from_micros(duration_microseconds as u64);

    let frame_rate = stream.avg_frame_rate();
    let frames_per_second = if frame_rate.denominator() != 0 {
        frame_rate.numerator() as f64 / frame_rate.denominator() as f64
    } else {
        let rate = stream.rate();
        if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        }
    };

    if frames_per_second > 0.0 {
        (duration.as_secs_f64() * frames_per_second) as u64
    } else {
        0
    }
}

/// Copy pixel data from an FFmpeg frame into a tightly packed buffer.
///
/// FFmpeg frames frequently carry per-row padding (stride > width ×
/// bytes_per_pixel). This strips the padding so the result can be handed to
/// an image encoder directly.
fn packed_buffer(
    video_frame: &VideoFrame,
    width: u32,
    height: u32,
    bytes_per_pixel: usize,
) -> Vec<u8> {
    let stride = video_frame.stride(0);
    let row_bytes = width as usize * bytes_per_pixel;
    let data = video_frame.data(0);

    if stride == row_bytes {
        // No padding — copy the entire plane at once.
        data[..row_bytes * height as usize].to_vec()
    } else {
        // Stride includes padding bytes — copy row by row.
        let mut buffer = Vec::with_capacity(row_bytes * height as usize);
        for row in 0..height as usize {
            let row_start = row * stride;
            buffer.extend_from_slice(&data[row_start..row_start + row_bytes]);
        }
        buffer
    }
}
