//! Image references and background payload encoding.
//!
//! An [`ImageRef`] owns the compressed byte payload for one image
//! XObject. The payload is produced by a background encode task spawned
//! at construction time; the compiler checks [`ImageRef::is_constructed`]
//! immediately before the image would be written and fails hard if the
//! encode has not finished. Callers wanting a guarantee use the
//! blocking constructors or [`ImageRef::join`] before compiling.
//!
//! A color image may carry one soft-mask image (single-channel alpha)
//! supplying per-pixel transparency.

use std::sync::{Arc, Mutex, OnceLock};
use std::thread::JoinHandle;

use bytes::Bytes;

use crate::error::{Error, Result};

/// How pixel data is compressed into the output payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodeMode {
    /// Lossy JPEG encoding of RGB pixels (DCTDecode filter)
    Lossy,
    /// Lossless deflate of raw RGB triples (FlateDecode filter)
    LosslessRgb,
    /// Lossless deflate of a single alpha channel (FlateDecode filter,
    /// DeviceGray)
    LosslessAlpha,
}

/// Background encode task.
///
/// A thin wrapper over a worker thread so "is the payload ready" and
/// "wait for the payload" are expressible without callers touching the
/// threading primitive.
#[derive(Debug)]
struct EncodeTask {
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl EncodeTask {
    fn pending() -> Self {
        Self {
            handle: Mutex::new(None),
        }
    }

    fn start(&self, f: impl FnOnce() + Send + 'static) {
        *self.handle.lock().expect("encode task lock poisoned") = Some(std::thread::spawn(f));
    }

    /// Wait for the task to finish. Safe to call more than once.
    fn join(&self) -> Result<()> {
        let handle = self.handle.lock().expect("encode task lock poisoned").take();
        if let Some(handle) = handle {
            handle
                .join()
                .map_err(|_| Error::ImageEncode("encode task panicked".to_string()))?;
        }
        Ok(())
    }
}

/// A reference-counted image with an asynchronously produced payload.
#[derive(Debug)]
pub struct ImageRef {
    width: u32,
    height: u32,
    mode: EncodeMode,
    /// Set exactly once by the encode task
    payload: OnceLock<std::result::Result<Bytes, String>>,
    task: EncodeTask,
    /// Optional soft mask, attachable once after construction
    mask: OnceLock<Arc<ImageRef>>,
}

impl ImageRef {
    /// Encode RGB pixel data (`width * height * 3` bytes) in the
    /// background.
    ///
    /// `mode` must be [`EncodeMode::Lossy`] or
    /// [`EncodeMode::LosslessRgb`]; `level` is a 0-9 compression hint
    /// (higher compresses more).
    pub fn encode_rgb(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        mode: EncodeMode,
        level: u32,
    ) -> Arc<ImageRef> {
        let mode = match mode {
            EncodeMode::LosslessAlpha => EncodeMode::LosslessRgb,
            other => other,
        };
        Self::spawn_encode(width, height, pixels, mode, level, 3)
    }

    /// Encode a single-channel alpha mask (`width * height` bytes) in
    /// the background.
    pub fn encode_alpha(width: u32, height: u32, alpha: Vec<u8>, level: u32) -> Arc<ImageRef> {
        Self::spawn_encode(width, height, alpha, EncodeMode::LosslessAlpha, level, 1)
    }

    /// Encode an already-decoded bitmap. An alpha channel, if present,
    /// becomes an attached soft mask.
    pub fn encode_bitmap(bitmap: &image::DynamicImage, mode: EncodeMode, level: u32) -> Arc<ImageRef> {
        let rgba = bitmap.to_rgba8();
        let (width, height) = rgba.dimensions();
        let mut rgb = Vec::with_capacity((width * height * 3) as usize);
        let mut alpha = Vec::with_capacity((width * height) as usize);
        let mut has_alpha = false;
        for pixel in rgba.pixels() {
            rgb.extend_from_slice(&pixel.0[..3]);
            alpha.push(pixel.0[3]);
            if pixel.0[3] != 0xFF {
                has_alpha = true;
            }
        }
        let image = Self::encode_rgb(width, height, rgb, mode, level);
        if has_alpha {
            image.attach_mask(Self::encode_alpha(width, height, alpha, level));
        }
        image
    }

    /// Like [`ImageRef::encode_rgb`] but waits for the encode to finish
    /// and surfaces its error.
    pub fn encode_rgb_blocking(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
        mode: EncodeMode,
        level: u32,
    ) -> Result<Arc<ImageRef>> {
        let image = Self::encode_rgb(width, height, pixels, mode, level);
        image.join()?;
        Ok(image)
    }

    /// Like [`ImageRef::encode_alpha`] but waits for the encode to
    /// finish and surfaces its error.
    pub fn encode_alpha_blocking(
        width: u32,
        height: u32,
        alpha: Vec<u8>,
        level: u32,
    ) -> Result<Arc<ImageRef>> {
        let image = Self::encode_alpha(width, height, alpha, level);
        image.join()?;
        Ok(image)
    }

    fn spawn_encode(
        width: u32,
        height: u32,
        data: Vec<u8>,
        mode: EncodeMode,
        level: u32,
        components: u32,
    ) -> Arc<ImageRef> {
        let image = Arc::new(ImageRef {
            width,
            height,
            mode,
            payload: OnceLock::new(),
            task: EncodeTask::pending(),
            mask: OnceLock::new(),
        });

        let worker = Arc::clone(&image);
        image.task.start(move || {
            let result = encode_payload(width, height, &data, mode, level, components);
            let _ = worker.payload.set(result.map(Bytes::from));
        });
        image
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Encoding mode of the payload.
    pub fn mode(&self) -> EncodeMode {
        self.mode
    }

    /// Attach a soft mask. Only the first attachment takes effect.
    pub fn attach_mask(&self, mask: Arc<ImageRef>) {
        let _ = self.mask.set(mask);
    }

    /// The attached soft mask, if any.
    pub fn mask(&self) -> Option<&Arc<ImageRef>> {
        self.mask.get()
    }

    /// Whether the background encode completed successfully.
    pub fn is_constructed(&self) -> bool {
        matches!(self.payload.get(), Some(Ok(_)))
    }

    /// Block until the encode task finishes, surfacing its error.
    pub fn join(&self) -> Result<()> {
        self.task.join()?;
        match self.payload.get() {
            Some(Ok(_)) => Ok(()),
            Some(Err(msg)) => Err(Error::ImageEncode(msg.clone())),
            None => Err(Error::ImageEncode(
                "encode task finished without a payload".to_string(),
            )),
        }
    }

    /// Encoded payload bytes; fails if the encode has not completed.
    pub(crate) fn payload(&self) -> Result<&Bytes> {
        match self.payload.get() {
            Some(Ok(bytes)) => Ok(bytes),
            Some(Err(msg)) => Err(Error::ImageEncode(msg.clone())),
            None => Err(Error::ImageNotReady {
                width: self.width,
                height: self.height,
            }),
        }
    }
}

#[cfg(test)]
impl ImageRef {
    /// An image whose payload never arrives, for not-ready paths.
    pub(crate) fn stub_unconstructed(width: u32, height: u32) -> Arc<ImageRef> {
        Arc::new(ImageRef {
            width,
            height,
            mode: EncodeMode::LosslessRgb,
            payload: OnceLock::new(),
            task: EncodeTask::pending(),
            mask: OnceLock::new(),
        })
    }
}

fn encode_payload(
    width: u32,
    height: u32,
    data: &[u8],
    mode: EncodeMode,
    level: u32,
    components: u32,
) -> std::result::Result<Vec<u8>, String> {
    let expected = (width * height * components) as usize;
    if data.len() != expected {
        return Err(format!(
            "pixel buffer is {} bytes, expected {} for {}x{}x{}",
            data.len(),
            expected,
            width,
            height,
            components
        ));
    }

    match mode {
        EncodeMode::Lossy => {
            let quality = 100u8.saturating_sub((level.min(9) * 5) as u8);
            let mut buf = Vec::new();
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut buf, quality);
            encoder
                .encode(data, width, height, image::ColorType::Rgb8)
                .map_err(|e| e.to_string())?;
            Ok(buf)
        },
        EncodeMode::LosslessRgb | EncodeMode::LosslessAlpha => {
            use flate2::write::ZlibEncoder;
            use flate2::Compression;
            use std::io::Write;

            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level.min(9)));
            encoder.write_all(data).map_err(|e| e.to_string())?;
            encoder.finish().map_err(|e| e.to_string())
        },
    }
}
