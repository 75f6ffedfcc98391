use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use crate::capture::domain::camera_device::{CameraDescriptor, CameraPosition, DeviceType};
use crate::capture::domain::camera_input::CameraInput;
use crate::capture::error::CaptureError;
use crate::shared::frame::{Frame, PixelFormat};

/// Frame rate requested from live devices.
const DEVICE_FRAMERATE: &str = "30";

/// Camera input backed by libavdevice (live cameras) or libavformat (a
/// recorded clip replayed as if it were a camera).
///
/// Decoded frames are converted to the selected [`PixelFormat`] and stripped
/// of row padding.
pub struct FfmpegCameraInput {
    descriptor: CameraDescriptor,
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    format: PixelFormat,
    width: u32,
    height: u32,
    video_stream_index: usize,
    frame_index: usize,
    flushing: bool,
    done: bool,
    pacing: Option<Pacing>,
}

/// Holds a replayed clip to its native frame rate.
struct Pacing {
    interval: Duration,
    last: Option<Instant>,
}

// Safety: FfmpegCameraInput is owned by one capture thread at a time.
// The raw pointers inside ffmpeg types are never shared across threads.
unsafe impl Send for FfmpegCameraInput {}

impl FfmpegCameraInput {
    /// Opens a live camera through the platform capture device format.
    pub fn open_device(descriptor: &CameraDescriptor) -> Result<Self, CaptureError> {
        let open_error = |message: String| CaptureError::Open {
            device: descriptor.id.clone(),
            message,
        };

        ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;

        let format_name = platform_device_format();
        let device_format = ffmpeg_next::device::input::video()
            .find(|f| f.name() == format_name)
            .ok_or_else(|| open_error(format!("capture format {format_name} not available")))?;

        let mut options = ffmpeg_next::Dictionary::new();
        options.set("framerate", DEVICE_FRAMERATE);

        let url = platform_device_url(&descriptor.id);
        let context = ffmpeg_next::format::open_with(
            &url,
            &ffmpeg_next::format::format::Format::Input(device_format),
            options,
        )
        .map_err(|e| open_error(e.to_string()))?;

        let ictx = match context {
            ffmpeg_next::format::context::Context::Input(ictx) => ictx,
            ffmpeg_next::format::context::Context::Output(_) => {
                return Err(open_error("device opened as an output".to_string()));
            }
        };

        Self::from_input(descriptor.clone(), ictx, false)
    }

    /// Opens a recorded clip and replays it at its own frame rate.
    pub fn open_file(path: &Path) -> Result<Self, CaptureError> {
        let descriptor = file_descriptor(path);
        let open_error = |message: String| CaptureError::Open {
            device: descriptor.id.clone(),
            message,
        };

        ffmpeg_next::init().map_err(|e| open_error(e.to_string()))?;
        let ictx = ffmpeg_next::format::input(path).map_err(|e| open_error(e.to_string()))?;

        Self::from_input(descriptor, ictx, true)
    }

    /// Delivers replayed frames as fast as they decode.
    pub fn without_pacing(mut self) -> Self {
        self.pacing = None;
        self
    }

    fn from_input(
        descriptor: CameraDescriptor,
        ictx: ffmpeg_next::format::context::Input,
        paced: bool,
    ) -> Result<Self, CaptureError> {
        let open_error = |message: String| CaptureError::Open {
            device: descriptor.id.clone(),
            message,
        };

        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or_else(|| open_error("no video stream found".to_string()))?;

        let video_stream_index = stream.index();
        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
            .map_err(|e| open_error(e.to_string()))?;
        let decoder = codec_ctx
            .decoder()
            .video()
            .map_err(|e| open_error(e.to_string()))?;

        let rate = stream.rate();
        let pacing = (paced && rate.numerator() > 0 && rate.denominator() > 0).then(|| Pacing {
            interval: Duration::from_secs_f64(rate.denominator() as f64 / rate.numerator() as f64),
            last: None,
        });

        let width = decoder.width();
        let height = decoder.height();
        let format = PixelFormat::default();
        let scaler = build_scaler(&decoder, format).map_err(|e| open_error(e.to_string()))?;

        log::info!(
            "Opened {} ({}x{}, codec {})",
            descriptor.name,
            width,
            height,
            decoder
                .codec()
                .map(|c| c.name().to_string())
                .unwrap_or_default()
        );

        Ok(Self {
            descriptor,
            ictx,
            decoder,
            scaler,
            format,
            width,
            height,
            video_stream_index,
            frame_index: 0,
            flushing: false,
            done: false,
            pacing,
        })
    }

    fn read_error(&self, e: impl ToString) -> CaptureError {
        CaptureError::Read {
            device: self.descriptor.id.clone(),
            message: e.to_string(),
        }
    }

    fn try_receive(&mut self) -> Option<Result<Frame, CaptureError>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return None;
        }

        let mut converted = ffmpeg_next::util::frame::video::Video::empty();
        if let Err(e) = self.scaler.run(&decoded, &mut converted) {
            return Some(Err(self.read_error(e)));
        }

        let pixels = extract_packed_pixels(&converted, self.width, self.height, self.format);
        let frame = Frame::new(
            pixels,
            self.width,
            self.height,
            self.format,
            self.frame_index,
        );
        self.frame_index += 1;
        Some(Ok(frame))
    }

    fn decode_next(&mut self) -> Result<Option<Frame>, CaptureError> {
        if self.done {
            return Ok(None);
        }
        if let Some(result) = self.try_receive() {
            return result.map(Some);
        }
        if self.flushing {
            self.done = true;
            return Ok(None);
        }

        loop {
            let Some((stream, packet)) = self.ictx.packets().next() else {
                let _ = self.decoder.send_eof();
                self.flushing = true;
                if let Some(result) = self.try_receive() {
                    return result.map(Some);
                }
                self.done = true;
                return Ok(None);
            };

            if stream.index() != self.video_stream_index {
                continue;
            }
            if self.decoder.send_packet(&packet).is_err() {
                continue;
            }
            if let Some(result) = self.try_receive() {
                return result.map(Some);
            }
        }
    }
}

impl CameraInput for FfmpegCameraInput {
    fn descriptor(&self) -> &CameraDescriptor {
        &self.descriptor
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn set_pixel_format(&mut self, format: PixelFormat) -> Result<(), CaptureError> {
        if format == self.format {
            return Ok(());
        }
        self.scaler = build_scaler(&self.decoder, format).map_err(|e| CaptureError::Open {
            device: self.descriptor.id.clone(),
            message: e.to_string(),
        })?;
        self.format = format;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<Frame>, CaptureError> {
        let frame = self.decode_next()?;
        if frame.is_some() {
            if let Some(ref mut pacing) = self.pacing {
                pacing.wait();
            }
        }
        Ok(frame)
    }
}

impl Pacing {
    fn wait(&mut self) {
        let now = Instant::now();
        if let Some(last) = self.last {
            let due = last + self.interval;
            if due > now {
                thread::sleep(due - now);
            }
        }
        self.last = Some(Instant::now());
    }
}

fn build_scaler(
    decoder: &ffmpeg_next::decoder::Video,
    format: PixelFormat,
) -> Result<ffmpeg_next::software::scaling::Context, ffmpeg_next::Error> {
    ffmpeg_next::software::scaling::Context::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        ffmpeg_pixel(format),
        decoder.width(),
        decoder.height(),
        ffmpeg_next::software::scaling::Flags::BILINEAR,
    )
}

fn ffmpeg_pixel(format: PixelFormat) -> ffmpeg_next::format::Pixel {
    match format {
        PixelFormat::Bgra32 => ffmpeg_next::format::Pixel::BGRA,
        PixelFormat::Rgb24 => ffmpeg_next::format::Pixel::RGB24,
    }
}

fn platform_device_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

fn platform_device_url(id: &str) -> String {
    if cfg!(target_os = "windows") && !id.starts_with("video=") {
        format!("video={id}")
    } else {
        id.to_string()
    }
}

/// Describes a recorded clip standing in for a camera.
pub fn file_descriptor(path: &Path) -> CameraDescriptor {
    CameraDescriptor {
        id: path.display().to_string(),
        name: path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string()),
        device_type: DeviceType::External,
        position: CameraPosition::Unspecified,
    }
}

/// Copies pixel data from an ffmpeg frame into a tightly packed buffer.
///
/// ffmpeg frames may pad each row (stride > width * channels).
fn extract_packed_pixels(
    converted: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
    format: PixelFormat,
) -> Vec<u8> {
    let stride = converted.stride(0);
    let data = converted.data(0);
    let row_len = width as usize * format.channels() as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(row_len * h);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + row_len]);
    }
    pixels
}
