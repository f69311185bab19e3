//! QR symbol decoding.

use super::camera::PixelBuffer;

/// Finds a QR payload in a frame.
///
/// A frame without a readable code yields `None`. That is the normal result
/// for most frames of a continuous scan, not an error.
pub trait QrDecoder: Send + Sync + 'static {
    fn decode(&self, frame: &PixelBuffer) -> Option<String>;
}

/// Decoder backed by `rqrr`, run on the luma projection of the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RqrrDecoder;

impl QrDecoder for RqrrDecoder {
    fn decode(&self, frame: &PixelBuffer) -> Option<String> {
        if frame.is_empty() {
            return None;
        }

        let width = frame.width();
        let luma = frame.to_luma();
        let mut image =
            rqrr::PreparedImage::prepare_from_greyscale(width, frame.height(), |x, y| {
                luma[y * width + x]
            });

        image
            .detect_grids()
            .into_iter()
            .find_map(|grid| grid.decode().ok().map(|(_meta, content)| content))
    }
}
