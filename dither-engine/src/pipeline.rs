use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgba32FImage, RgbaImage};

use crate::buffer::PixelBuffer;
use crate::dither::{DitherRequest, dither_image};

/// Parameters for one processed file.
pub struct ProcessParams<'a> {
    pub request: &'a DitherRequest,
    pub output_dir: &'a Path,
    /// Integer nearest-neighbour upscale; 1 keeps the source size.
    pub upscale: u32,
}

/// Decode an image into an achromatic buffer (luma replicated to R, G, B).
pub fn decode_to_buffer(img: &DynamicImage) -> Result<PixelBuffer> {
    let la = img.to_luma_alpha32f();
    let (w, h) = la.dimensions();
    let buf = PixelBuffer::from_luma_alpha(w as usize, h as usize, la.as_raw())?;
    Ok(buf)
}

/// Encode a dithered buffer as 8-bit RGBA, upscaled by `upscale`.
pub fn encode_buffer(buf: PixelBuffer, upscale: u32) -> Result<RgbaImage> {
    let (w, h) = (buf.width() as u32, buf.height() as u32);
    let float = Rgba32FImage::from_raw(w, h, buf.into_samples())
        .ok_or_else(|| anyhow::anyhow!("buffer does not fit {w}x{h} RGBA"))?;
    let rgba = DynamicImage::ImageRgba32F(float).to_rgba8();
    if upscale <= 1 {
        return Ok(rgba);
    }
    let (Some(out_w), Some(out_h)) = (w.checked_mul(upscale), h.checked_mul(upscale)) else {
        anyhow::bail!("{w}x{h} upscaled by {upscale} overflows the image dimensions");
    };
    Ok(imageops::resize(&rgba, out_w, out_h, FilterType::Nearest))
}

/// `{stem}_{algorithm}_{factor}[_rand].png`
pub fn output_name(stem: &str, request: &DitherRequest) -> String {
    format!(
        "{stem}_{}_{}{}.png",
        request.algorithm,
        request.factor,
        if request.randomize_weights { "_rand" } else { "" }
    )
}

/// Load, dither and write a single file. Returns the written path.
pub fn process_file(input: &Path, params: &ProcessParams) -> Result<PathBuf> {
    let start = Instant::now();
    let img = image::open(input).with_context(|| format!("decoding {}", input.display()))?;
    let mut buf = decode_to_buffer(&img)?;
    dither_image(&mut buf, params.request)
        .with_context(|| format!("dithering {}", input.display()))?;
    let out = encode_buffer(buf, params.upscale)?;

    fs::create_dir_all(params.output_dir)
        .with_context(|| format!("creating {}", params.output_dir.display()))?;
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let path = params.output_dir.join(output_name(&stem, params.request));
    out.save(&path)
        .with_context(|| format!("writing {}", path.display()))?;
    tracing::info!(
        input = %input.display(),
        output = %path.display(),
        algorithm = %params.request.algorithm,
        factor = params.request.factor,
        randomize = params.request.randomize_weights,
        elapsed_ms = start.elapsed().as_millis() as u64,
        "dithered image"
    );
    Ok(path)
}
