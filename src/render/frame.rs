use crate::foundation::core::mul_div255_u16;
use crate::foundation::error::{AnnotateError, AnnotateResult};

/// One decoded video frame as opaque RGBA8, tightly packed, row-major.
///
/// Owned by the frame pipeline and reused across iterations; overlays borrow it for one frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoFrame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, `width * height * 4` long.
    pub data: Vec<u8>,
}

impl VideoFrame {
    /// Allocate a frame filled with `rgba`.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = vec![0u8; byte_len(width, height)];
        for px in data.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Allocate an opaque black frame.
    pub fn black(width: u32, height: u32) -> Self {
        Self::filled(width, height, [0, 0, 0, 255])
    }

    /// Expected `data` length for the frame dimensions.
    pub fn expected_len(&self) -> usize {
        byte_len(self.width, self.height)
    }

    /// RGBA value at `(x, y)`, if inside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let off = (y as usize * self.width as usize + x as usize) * 4;
        let px = self.data.get(off..off + 4)?;
        Some([px[0], px[1], px[2], px[3]])
    }
}

pub(crate) fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * 4
}

/// Porter-Duff source-over of a premultiplied RGBA8 layer onto `dst` in place.
pub(crate) fn premul_over_in_place(dst: &mut [u8], src: &[u8]) -> AnnotateResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(AnnotateError::validation(
            "premul_over_in_place expects equal-length rgba8 buffers",
        ));
    }

    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3];
        if a == 0 {
            continue;
        }
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255u16 - u16::from(a);
        for c in 0..4 {
            let v = u16::from(s[c]) + mul_div255_u16(u16::from(d[c]), inv);
            d[c] = v.min(255) as u8;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/frame.rs"]
mod tests;
