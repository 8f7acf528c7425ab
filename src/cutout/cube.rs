//! Direct cutout extraction from cloud-hosted cutout cubes
//!
//! A cutout cube is one large binary object per sector and channel holding
//! every frame of that channel over time. Cubes live under a fixed naming
//! scheme in the public mission bucket, so a target's channel label addresses
//! its cube directly and a cutout needs only ranged reads of the byte windows
//! covering the requested pixels; no full-frame download happens.

use async_trait::async_trait;
use std::path::{Path, PathBuf};

use super::{CutoutFetcher, write_artifact};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::types::{ChannelLabel, Sector, SkyCoord, Target};

/// Object key of the cutout cube for one sector and channel
///
/// The scheme embeds the zero-padded sector number and the channel label:
/// `tess/public/mast/tess-s0055-3-2-cube.fits`.
pub fn cube_key(sector: Sector, label: ChannelLabel) -> String {
    format!(
        "tess/public/mast/tess-s{}-{}-{}-cube.fits",
        sector.zero_padded(),
        label.camera,
        label.ccd
    )
}

/// Pixel window of a cutout within one frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelWindow {
    /// First row of the window
    pub row0: u32,
    /// First column of the window
    pub col0: u32,
    /// Window height in rows
    pub height: u32,
    /// Window width in columns
    pub width: u32,
}

/// Layout and sky mapping of a cutout cube
///
/// Frames are stored frame-major, rows row-major within a frame. The sky
/// mapping is the linear approximation that is adequate at cutout scales: a
/// reference pixel, its coordinate, and a constant plate scale.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CubeGeometry {
    /// Rows per frame
    pub rows: u32,
    /// Columns per frame
    pub cols: u32,
    /// Number of frames (time steps) in the cube
    pub frames: u32,
    /// Bytes per pixel
    pub bytes_per_pixel: u32,
    /// Byte offset of the first pixel of the first frame
    pub data_offset: u64,
    /// Row of the reference pixel
    pub ref_row: f64,
    /// Column of the reference pixel
    pub ref_col: f64,
    /// Sky coordinate of the reference pixel
    pub ref_coord: SkyCoord,
    /// Plate scale in degrees per pixel
    pub scale_deg_per_px: f64,
}

impl CubeGeometry {
    /// Fractional pixel position (row, col) of a sky coordinate
    pub fn pixel_of(&self, coord: SkyCoord) -> (f64, f64) {
        let row = self.ref_row + (coord.dec_deg - self.ref_coord.dec_deg) / self.scale_deg_per_px;
        let col = self.ref_col + (coord.ra_deg - self.ref_coord.ra_deg) / self.scale_deg_per_px;
        (row, col)
    }

    /// The `size x size` pixel window centered on a coordinate, clamped to
    /// the frame bounds
    ///
    /// A window that falls entirely off the frame is invalid input: the
    /// target was not observed by this channel.
    pub fn window_around(&self, coord: SkyCoord, size: u32) -> Result<PixelWindow> {
        let (row, col) = self.pixel_of(coord);
        let (row0, height) = clamp_axis(row, size, self.rows).ok_or_else(|| {
            Error::InvalidInput(format!("cutout at {coord} falls outside the cube rows"))
        })?;
        let (col0, width) = clamp_axis(col, size, self.cols).ok_or_else(|| {
            Error::InvalidInput(format!("cutout at {coord} falls outside the cube columns"))
        })?;
        Ok(PixelWindow {
            row0,
            col0,
            height,
            width,
        })
    }

    /// Inclusive byte range of the full-width row band covering `window` in
    /// one frame
    ///
    /// One ranged read per frame fetches the band; column slicing happens
    /// locally. Full-width bands keep it to a single contiguous range per
    /// frame instead of one request per row.
    pub fn band_range(&self, frame: u32, window: &PixelWindow) -> (u64, u64) {
        let row_bytes = u64::from(self.cols) * u64::from(self.bytes_per_pixel);
        let frame_bytes = u64::from(self.rows) * row_bytes;
        let start =
            self.data_offset + u64::from(frame) * frame_bytes + u64::from(window.row0) * row_bytes;
        let len = u64::from(window.height) * row_bytes;
        (start, start + len - 1)
    }

    /// Expected byte length of one band
    fn band_len(&self, window: &PixelWindow) -> usize {
        (u64::from(window.height) * u64::from(self.cols) * u64::from(self.bytes_per_pixel)) as usize
    }
}

/// Clamp a `size`-pixel axis window centered at `center` to `[0, extent)`
///
/// Returns the clamped start and length, or `None` when the intersection is
/// empty.
fn clamp_axis(center: f64, size: u32, extent: u32) -> Option<(u32, u32)> {
    let half = i64::from(size / 2);
    let start = center.round() as i64 - half;
    let end = start + i64::from(size);
    let start_clamped = start.max(0);
    let end_clamped = end.min(i64::from(extent));
    if start_clamped >= end_clamped {
        return None;
    }
    Some((
        start_clamped as u32,
        (end_clamped - start_clamped) as u32,
    ))
}

/// Fetcher reading cutouts directly out of cloud-hosted cubes
#[derive(Clone, Debug)]
pub struct CubeCutoutFetcher {
    client: reqwest::Client,
    base_url: String,
    sector: Sector,
    size: u32,
    geometry: CubeGeometry,
}

impl CubeCutoutFetcher {
    /// Create a fetcher against an explicit cube store base URL
    pub fn new(
        base_url: impl Into<String>,
        sector: Sector,
        size: u32,
        geometry: CubeGeometry,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            sector,
            size,
            geometry,
        }
    }

    /// Create a fetcher from the library configuration
    pub fn from_config(config: &Config, geometry: CubeGeometry) -> Self {
        Self::new(
            config.endpoints.cube_store_base_url.clone(),
            config.fetch.sector,
            config.fetch.cutout_size,
            geometry,
        )
    }

    /// Fetch one full-width row band of one frame via an HTTP range request
    async fn fetch_band(&self, url: &str, frame: u32, window: &PixelWindow) -> Result<Vec<u8>> {
        let (start, end) = self.geometry.band_range(frame, window);
        let response = self
            .client
            .get(url)
            .header(reqwest::header::RANGE, format!("bytes={start}-{end}"))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;

        let expected = self.geometry.band_len(window);
        if bytes.len() != expected {
            return Err(Error::InvalidInput(format!(
                "cube store returned {} bytes for frame {frame}, expected {expected}",
                bytes.len()
            )));
        }
        Ok(bytes.to_vec())
    }

    /// Slice the column window out of a full-width row band
    fn slice_band(&self, band: &[u8], window: &PixelWindow, out: &mut Vec<u8>) {
        let bpp = self.geometry.bytes_per_pixel as usize;
        let row_bytes = self.geometry.cols as usize * bpp;
        for r in 0..window.height as usize {
            let start = r * row_bytes + window.col0 as usize * bpp;
            let end = start + window.width as usize * bpp;
            out.extend_from_slice(&band[start..end]);
        }
    }
}

#[async_trait]
impl CutoutFetcher for CubeCutoutFetcher {
    async fn fetch_and_save(&self, target: &Target, out_dir: &Path) -> Result<PathBuf> {
        let key = cube_key(self.sector, target.channel);
        let url = format!("{}/{}", self.base_url, key);
        let window = self.geometry.window_around(target.coord, self.size)?;

        let mut pixels = Vec::with_capacity(
            self.geometry.frames as usize
                * window.height as usize
                * window.width as usize
                * self.geometry.bytes_per_pixel as usize,
        );
        for frame in 0..self.geometry.frames {
            let band = self.fetch_band(&url, frame, &window).await?;
            self.slice_band(&band, &window, &mut pixels);
        }

        let path = out_dir.join(format!("{}.fits", target.id));
        write_artifact(&path, &pixels).await?;
        tracing::info!(
            target = %target.id,
            cube = %key,
            frames = self.geometry.frames,
            path = %path.display(),
            "Saved cube cutout"
        );
        Ok(path)
    }
}
