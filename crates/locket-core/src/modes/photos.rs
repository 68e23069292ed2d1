//! Birthday photo slideshow.
//!
//! Shows BMP photos mirrored into `/birthday` on internal flash by the
//! intake mode. Photos are decoded straight out of a bounded read buffer;
//! anything that fails to list, fit, or parse degrades to a notice.

use core::fmt::Write;

use embedded_graphics::{pixelcolor::Rgb888, prelude::*};
use heapless::{String, Vec};
use log::{info, warn};
use tinybmp::Bmp;

use crate::canvas::{SCREEN_H, SCREEN_W, rgb888_to_332};
use crate::error::ModeError;
use crate::input::Button;
use crate::render::{self, BG, FONT_SMALL, TEXT};
use crate::shell::{Mode, Platform, Services};
use crate::storage::{EntryKind, PATH_BYTES, Volume, join_path};

/// Folder scanned for photos.
pub const PHOTOS_FOLDER: &str = "/birthday";
/// Maximum photos tracked per scan.
pub const MAX_PHOTOS: usize = 32;
/// Largest photo file the read buffer accepts; a 240x240 8-bit BMP fits.
pub const PHOTO_FILE_BYTES: usize = 64 * 1024;

const NAMESPACE: &str = "birthday";

pub struct PhotosMode {
    paths: Vec<String<PATH_BYTES>, MAX_PHOTOS>,
    current: usize,
    error: Option<ModeError>,
    file_buf: Vec<u8, PHOTO_FILE_BYTES>,
}

impl PhotosMode {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            current: 0,
            error: None,
            file_buf: Vec::new(),
        }
    }

    pub fn photo_count(&self) -> usize {
        self.paths.len()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_path(&self) -> Option<&str> {
        self.paths.get(self.current).map(|p| p.as_str())
    }

    pub fn last_error(&self) -> Option<ModeError> {
        self.error
    }

    fn scan_photos<P: Platform>(&mut self, svc: &mut Services<'_, P>) -> Result<(), ModeError> {
        self.paths.clear();

        if !svc.platform.internal().is_ready() {
            return Err(ModeError::StorageUnavailable);
        }

        let listing = svc
            .platform
            .internal()
            .list_dir(PHOTOS_FOLDER)
            .map_err(|_| ModeError::NoDocuments)?;
        for entry in &listing {
            if entry.name.starts_with('.') || entry.kind != EntryKind::Photo {
                continue;
            }
            let Some(path) = join_path(PHOTOS_FOLDER, entry.name.as_str()) else {
                continue;
            };
            if self.paths.push(path).is_err() {
                break;
            }
        }

        if self.paths.is_empty() {
            return Err(ModeError::NoDocuments);
        }

        self.paths.sort_unstable();
        Ok(())
    }

    fn draw_current<P: Platform>(&mut self, svc: &mut Services<'_, P>) {
        match self.error {
            Some(ModeError::StorageUnavailable) => {
                render::draw_notice(svc.frame, "Storage not", Some("available"));
                svc.present();
                return;
            }
            Some(ModeError::NoDocuments) => {
                render::draw_notice(svc.frame, "No photos", Some("Run Intake first"));
                svc.present();
                return;
            }
            _ => {}
        }

        let Some(path) = self.paths.get(self.current).cloned() else {
            return;
        };
        info!(
            "photos: showing {}/{}: {}",
            self.current + 1,
            self.paths.len(),
            path
        );

        if !self.load_current_file(svc) {
            svc.present();
            return;
        }

        let frame = &mut *svc.frame;
        match Bmp::<Rgb888>::from_slice(self.file_buf.as_slice()) {
            Ok(bmp) => {
                let size = bmp.size();
                let offset = Point::new(
                    (SCREEN_W as i32 - size.width as i32) / 2,
                    (SCREEN_H as i32 - size.height as i32) / 2,
                );

                frame.fill(BG);
                for Pixel(point, color) in bmp.pixels() {
                    let at = point + offset;
                    if at.x >= 0 && at.y >= 0 {
                        frame.set_pixel(at.x as usize, at.y as usize, rgb888_to_332(color));
                    }
                }

                let mut overlay: String<16> = String::new();
                let _ = write!(overlay, "{}/{}", self.current + 1, self.paths.len());
                render::draw_label(frame, &FONT_SMALL, TEXT, overlay.as_str(), 4, 4);
            }
            Err(error) => {
                warn!("photos: cannot decode {path}: {error:?}");
                self.error = Some(ModeError::DocumentOpenFailed);
                render::draw_notice(frame, "Failed to load", Some("photo"));
            }
        }
        svc.present();
    }

    /// Reads the current photo into the bounded buffer. On failure an
    /// error notice is drawn and `false` returned.
    fn load_current_file<P: Platform>(&mut self, svc: &mut Services<'_, P>) -> bool {
        self.file_buf.clear();
        let Some(path) = self.paths.get(self.current) else {
            return false;
        };

        let size = match svc.platform.internal().stat(path.as_str()) {
            Ok(Some(entry)) => entry.size as usize,
            Ok(None) | Err(_) => {
                self.error = Some(ModeError::DocumentOpenFailed);
                render::draw_notice(svc.frame, "Failed to load", Some("photo"));
                return false;
            }
        };
        if size > PHOTO_FILE_BYTES {
            warn!("photos: {path} is {size} bytes, over the {PHOTO_FILE_BYTES} cap");
            self.error = Some(ModeError::DocumentOpenFailed);
            render::draw_notice(svc.frame, "Photo too large", None);
            return false;
        }

        let _ = self.file_buf.resize_default(size);
        match svc
            .platform
            .internal()
            .read(path.as_str(), 0, self.file_buf.as_mut_slice())
        {
            Ok(read) if read == size => true,
            other => {
                warn!("photos: short or failed read of {path}: {other:?}");
                self.error = Some(ModeError::DocumentOpenFailed);
                render::draw_notice(svc.frame, "Failed to load", Some("photo"));
                false
            }
        }
    }

    fn step<P: Platform>(&mut self, svc: &mut Services<'_, P>, delta: i32) {
        let count = self.paths.len() as i32;
        self.current = (self.current as i32 + delta).rem_euclid(count) as usize;
        svc.persist_index(NAMESPACE, self.current);
        self.error = None;
        self.draw_current(svc);
    }
}

impl Default for PhotosMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for PhotosMode {
    fn name(&self) -> &'static str {
        "Birthday"
    }

    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, _now_ms: u64) {
        self.current = 0;
        self.error = None;

        if let Err(error) = self.scan_photos(svc) {
            self.error = Some(error);
            self.draw_current(svc);
            return;
        }

        self.current = svc.restore_index(NAMESPACE, self.paths.len());
        info!(
            "photos: found {} photos, resuming at {}",
            self.paths.len(),
            self.current + 1
        );
        self.draw_current(svc);
    }

    fn update<P: Platform>(&mut self, _svc: &mut Services<'_, P>, _now_ms: u64) {
        // Static screen between presses.
    }

    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, _now_ms: u64) {
        if self.paths.is_empty() {
            return;
        }
        match button {
            Button::Bottom => self.step(svc, 1),
            Button::Top => self.step(svc, -1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::KvStore;
    use crate::testutil::TestPlatform;

    /// Builds a minimal bottom-up 24-bit BMP.
    fn bmp_24bit(width: u32, height: u32, rgb: (u8, u8, u8)) -> std::vec::Vec<u8> {
        let row_bytes = (width * 3).div_ceil(4) * 4;
        let data_size = row_bytes * height;
        let file_size = 54 + data_size;

        let mut out = std::vec::Vec::new();
        out.extend_from_slice(b"BM");
        out.extend_from_slice(&file_size.to_le_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&54u32.to_le_bytes());
        out.extend_from_slice(&40u32.to_le_bytes());
        out.extend_from_slice(&width.to_le_bytes());
        out.extend_from_slice(&height.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes());
        out.extend_from_slice(&24u16.to_le_bytes());
        out.extend_from_slice(&[0; 24]);
        for _ in 0..height {
            for _ in 0..width {
                out.extend_from_slice(&[rgb.2, rgb.1, rgb.0]);
            }
            for _ in width * 3..row_bytes {
                out.push(0);
            }
        }
        out
    }

    fn platform_with_photos(names: &[&str]) -> TestPlatform {
        let mut platform = TestPlatform::new();
        let bmp = bmp_24bit(2, 2, (255, 0, 0));
        for name in names {
            let mut path = std::string::String::from("/birthday/");
            path.push_str(name);
            platform.flash.insert(&path, &bmp);
        }
        platform
    }

    fn enter(mode: &mut PhotosMode, platform: &mut TestPlatform) {
        let mut frame = crate::canvas::FrameCanvas::new();
        let mut svc = Services {
            platform,
            frame: &mut frame,
        };
        mode.enter(&mut svc, 0);
    }

    fn press(mode: &mut PhotosMode, platform: &mut TestPlatform, button: Button) {
        let mut frame = crate::canvas::FrameCanvas::new();
        let mut svc = Services {
            platform,
            frame: &mut frame,
        };
        mode.on_button(&mut svc, button, 0);
    }

    #[test]
    fn photos_are_listed_sorted_and_stepped_with_wrap() {
        let mut platform = platform_with_photos(&["b.bmp", "a.bmp", "c.bmp"]);
        let mut mode = PhotosMode::new();
        enter(&mut mode, &mut platform);

        assert_eq!(mode.photo_count(), 3);
        assert_eq!(mode.current_path(), Some("/birthday/a.bmp"));

        press(&mut mode, &mut platform, Button::Top);
        assert_eq!(mode.current_path(), Some("/birthday/c.bmp"));
        press(&mut mode, &mut platform, Button::Bottom);
        assert_eq!(mode.current_path(), Some("/birthday/a.bmp"));
        assert_eq!(platform.kv.get_i32("birthday", "idx"), Ok(Some(0)));
    }

    #[test]
    fn decoded_pixels_land_centered_in_the_frame() {
        let mut platform = platform_with_photos(&["a.bmp"]);
        let mut mode = PhotosMode::new();

        let mut frame = crate::canvas::FrameCanvas::new();
        {
            let mut svc = Services {
                platform: &mut platform,
                frame: &mut frame,
            };
            mode.enter(&mut svc, 0);
        }

        // 2x2 red photo centers at (119..121, 119..121).
        use embedded_graphics::pixelcolor::Rgb332;
        assert_eq!(frame.pixel(119, 119), Some(Rgb332::new(7, 0, 0)));
        assert_eq!(frame.pixel(120, 120), Some(Rgb332::new(7, 0, 0)));
        assert_eq!(frame.pixel(118, 119), Some(Rgb332::BLACK));
    }

    #[test]
    fn empty_folder_shows_the_intake_hint() {
        let mut platform = TestPlatform::new();
        let mut mode = PhotosMode::new();
        enter(&mut mode, &mut platform);

        assert_eq!(mode.last_error(), Some(ModeError::NoDocuments));
        press(&mut mode, &mut platform, Button::Bottom);
        assert_eq!(mode.photo_count(), 0);
    }

    #[test]
    fn out_of_range_persisted_index_resolves_to_zero() {
        let mut platform = platform_with_photos(&["a.bmp", "b.bmp"]);
        platform.kv.put_i32("birthday", "idx", 12).unwrap();

        let mut mode = PhotosMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.current_index(), 0);
    }

    #[test]
    fn undecodable_files_degrade_to_a_notice() {
        let mut platform = TestPlatform::new();
        platform.flash.insert("/birthday/junk.bmp", b"not a bitmap");

        let mut mode = PhotosMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.last_error(), Some(ModeError::DocumentOpenFailed));
    }
}
