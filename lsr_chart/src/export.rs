use crate::debug_hooks;
use crate::error::ExportError;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use egui::{vec2, ColorImage, Pos2, Rect};
use image::{ImageFormat, RgbaImage};
use std::borrow::Cow;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// How long an export waits for the viewport screenshot before giving up.
pub const SCREENSHOT_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportMode {
    Download,
    Clipboard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// No view to capture.
    Skipped,
    Saved(PathBuf),
    Copied,
    Failed(String),
}

/// Turns a rendered view into a PNG data URL.
pub trait Rasterizer {
    type View;

    fn to_png_data_url(&self, view: &Self::View) -> Result<String, ExportError>;
}

/// Where exported images end up.
pub trait ExportTarget {
    fn save_png(&mut self, file_name: &str, png: &[u8]) -> Result<PathBuf, ExportError>;

    fn copy_image(&mut self, image: &RgbaImage) -> Result<(), ExportError>;
}

/// Capture `view` as `<symbol>.png` (download) or put it on the clipboard.
///
/// A missing view is a no-op. Failures come back as `ExportOutcome::Failed`
/// and never escape as errors or panics.
pub fn export_image<R, T>(
    view: Option<&R::View>,
    symbol: &str,
    mode: ExportMode,
    rasterizer: &R,
    target: &mut T,
) -> ExportOutcome
where
    R: Rasterizer,
    T: ExportTarget,
{
    let Some(view) = view else {
        return ExportOutcome::Skipped;
    };

    let outcome = match run_export(view, symbol, mode, rasterizer, target) {
        Ok(outcome) => outcome,
        Err(err) => ExportOutcome::Failed(err.to_string()),
    };
    debug_hooks::log_export(symbol, mode, &outcome);
    outcome
}

fn run_export<R, T>(
    view: &R::View,
    symbol: &str,
    mode: ExportMode,
    rasterizer: &R,
    target: &mut T,
) -> Result<ExportOutcome, ExportError>
where
    R: Rasterizer,
    T: ExportTarget,
{
    let data_url = rasterizer.to_png_data_url(view)?;
    let png = decode_data_url(&data_url)?;

    match mode {
        ExportMode::Download => {
            let path = target.save_png(&export_file_name(symbol), &png)?;
            Ok(ExportOutcome::Saved(path))
        }
        ExportMode::Clipboard => {
            let image = image::load_from_memory_with_format(&png, ImageFormat::Png)?.to_rgba8();
            target.copy_image(&image)?;
            Ok(ExportOutcome::Copied)
        }
    }
}

/// `<symbol>.png`, with path separators and other awkward characters replaced.
pub fn export_file_name(symbol: &str) -> String {
    let stem: String = symbol
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = if stem.is_empty() { "chart".to_string() } else { stem };
    format!("{stem}.png")
}

pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, ExportError> {
    let mut out = Cursor::new(Vec::new());
    image.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

pub fn png_data_url(png: &[u8]) -> String {
    format!("{PNG_DATA_URL_PREFIX}{}", STANDARD.encode(png))
}

pub fn decode_data_url(url: &str) -> Result<Vec<u8>, ExportError> {
    let payload = url
        .strip_prefix(PNG_DATA_URL_PREFIX)
        .ok_or_else(|| ExportError::DataUrl("expected a base64 PNG data url".to_string()))?;
    STANDARD
        .decode(payload)
        .map_err(|e| ExportError::DataUrl(e.to_string()))
}

// ---- egui capture ----------------------------------------------------------

/// Where a chart was painted: its rect and the clip rect of the ui around it
/// (a scroll area hides whatever falls outside the clip).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartArea {
    pub rect: Rect,
    pub clip: Rect,
}

impl ChartArea {
    pub fn fully_visible(&self) -> bool {
        self.clip.expand(0.5).contains_rect(self.rect)
    }
}

/// A viewport screenshot plus the chart's area inside it.
#[derive(Clone)]
pub struct CapturedView {
    pub screenshot: Arc<ColorImage>,
    pub area: ChartArea,
    pub pixels_per_point: f32,
}

/// An export request waiting for the next viewport screenshot.
#[derive(Debug, Clone)]
pub struct PendingCapture {
    pub panel_id: u64,
    pub symbol: String,
    pub mode: ExportMode,
    requested_at: Instant,
}

impl PendingCapture {
    pub fn new(panel_id: u64, symbol: impl Into<String>, mode: ExportMode, now: Instant) -> Self {
        Self {
            panel_id,
            symbol: symbol.into(),
            mode,
            requested_at: now,
        }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.requested_at) >= SCREENSHOT_TIMEOUT
    }
}

/// Crops the chart out of a viewport screenshot.
#[derive(Debug, Default)]
pub struct ScreenshotRasterizer;

impl Rasterizer for ScreenshotRasterizer {
    type View = CapturedView;

    fn to_png_data_url(&self, view: &CapturedView) -> Result<String, ExportError> {
        let ppp = view.pixels_per_point;
        if !(ppp > 0.0) {
            return Err(ExportError::Rasterize(format!("bad pixels_per_point {ppp}")));
        }
        let [sw, sh] = view.screenshot.size;
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(sw as f32 / ppp, sh as f32 / ppp));
        if !view.area.fully_visible() {
            return Err(ExportError::Rasterize(
                "chart is partly scrolled out of view; scroll it into view and try again".to_string(),
            ));
        }
        let region = view.area.rect.intersect(bounds);
        if !region.is_positive() {
            return Err(ExportError::Rasterize("chart area is empty".to_string()));
        }
        let cropped = view.screenshot.region(&region, Some(ppp));
        let [w, h] = cropped.size;
        if w == 0 || h == 0 {
            return Err(ExportError::Rasterize("chart is outside the screenshot".to_string()));
        }

        let bytes: Vec<u8> = cropped.pixels.iter().flat_map(|c| c.to_array()).collect();
        let image = RgbaImage::from_raw(w as u32, h as u32, bytes)
            .ok_or_else(|| ExportError::Rasterize("pixel buffer size mismatch".to_string()))?;
        Ok(png_data_url(&encode_png(&image)?))
    }
}

/// Files go to a download directory, images to the system clipboard.
pub struct DesktopTarget {
    download_dir: PathBuf,
    clipboard: Option<arboard::Clipboard>,
}

impl DesktopTarget {
    pub fn new(download_dir: PathBuf) -> Self {
        Self {
            download_dir,
            clipboard: None,
        }
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }
}

impl ExportTarget for DesktopTarget {
    fn save_png(&mut self, file_name: &str, png: &[u8]) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(&self.download_dir)?;
        let path = self.download_dir.join(file_name);
        std::fs::write(&path, png)?;
        Ok(path)
    }

    fn copy_image(&mut self, image: &RgbaImage) -> Result<(), ExportError> {
        let clipboard = match self.clipboard.take() {
            Some(clipboard) => clipboard,
            None => arboard::Clipboard::new()?,
        };
        let clipboard = self.clipboard.insert(clipboard);
        clipboard.set_image(arboard::ImageData {
            width: image.width() as usize,
            height: image.height() as usize,
            bytes: Cow::Borrowed(image.as_raw()),
        })?;
        Ok(())
    }
}
