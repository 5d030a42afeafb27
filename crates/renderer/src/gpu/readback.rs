use std::sync::mpsc;

use crate::types::RenderError;

use super::targets::SampleTarget;

/// Row pitch for a texture-to-buffer copy, rounded up to wgpu's alignment.
pub(crate) fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> u32 {
    let unpadded = width * bytes_per_pixel;
    unpadded.div_ceil(wgpu::COPY_BYTES_PER_ROW_ALIGNMENT) * wgpu::COPY_BYTES_PER_ROW_ALIGNMENT
}

/// Records the copy of the sample target into its readback buffer.
pub(crate) fn encode_sample_copy(encoder: &mut wgpu::CommandEncoder, target: &SampleTarget) {
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture: &target.texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer: &target.readback,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(target.padded_bytes_per_row),
                rows_per_image: Some(target.edge),
            },
        },
        wgpu::Extent3d {
            width: target.edge,
            height: target.edge,
            depth_or_array_layers: 1,
        },
    );
}

/// Blocks until the sample copy lands and returns its pixels.
///
/// The readback buffer is left unmapped on every return path.
pub(crate) fn read_samples(
    device: &wgpu::Device,
    target: &SampleTarget,
) -> Result<Vec<[f32; 4]>, RenderError> {
    let slice = target.readback.slice(..);
    let (sender, receiver) = mpsc::channel();
    slice.map_async(wgpu::MapMode::Read, move |result| {
        let _ = sender.send(result);
    });
    let polled = device.poll(wgpu::PollType::Wait);

    match receiver.try_recv() {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            return Err(RenderError::Readback(format!(
                "mapping sample buffer failed: {err}"
            )));
        }
        Err(_) => {
            // still pending; unmapping cancels the request
            target.readback.unmap();
            let reason = match polled {
                Err(err) => err.to_string(),
                Ok(_) => "map callback never fired".to_string(),
            };
            return Err(RenderError::Readback(reason));
        }
    }

    let samples = {
        let mapped = slice.get_mapped_range();
        parse_rgba_f32_rows(&mapped, target.edge, target.edge, target.padded_bytes_per_row)
    };
    target.readback.unmap();
    samples
}

/// Unpacks tightly packed RGBA32F pixels from a row-padded buffer.
pub(crate) fn parse_rgba_f32_rows(
    bytes: &[u8],
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
) -> Result<Vec<[f32; 4]>, RenderError> {
    let row_bytes = (width * SampleTarget::BYTES_PER_PIXEL) as usize;
    let pitch = padded_bytes_per_row as usize;
    let needed = pitch * height.saturating_sub(1) as usize + row_bytes;
    if height > 0 && bytes.len() < needed {
        return Err(RenderError::Readback(format!(
            "readback holds {} bytes, expected at least {needed}",
            bytes.len()
        )));
    }

    let mut pixels = Vec::with_capacity((width * height) as usize);
    for row in 0..height as usize {
        let start = row * pitch;
        for texel in bytes[start..start + row_bytes].chunks_exact(16) {
            let mut pixel = [0.0f32; 4];
            for (channel, raw) in pixel.iter_mut().zip(texel.chunks_exact(4)) {
                *channel = f32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
            }
            pixels.push(pixel);
        }
    }
    Ok(pixels)
}
