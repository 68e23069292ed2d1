//! One-shot intake utility.
//!
//! Mirrors `/birthday` from the SD card to internal flash so the slideshow
//! and reader run without the card present. Files already present with the
//! same size are skipped; a failed copy removes its partial file so a
//! re-sync starts clean.

use core::fmt::Write;

use heapless::{String, Vec};
use log::{info, warn};

use crate::input::Button;
use crate::render::{self, ACCENT, ALERT, BG, FONT_LARGE, FONT_SMALL, RING, TEXT};
use crate::shell::{Mode, Platform, Services};
use crate::storage::{ENTRY_NAME_BYTES, EntryKind, PATH_BYTES, Volume, VolumeMut, join_path};

/// Folder mirrored from card to flash.
pub const INTAKE_FOLDER: &str = "/birthday";

const COPY_CHUNK: usize = 4096;
const MAX_COPY_FILES: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IntakeStatus {
    Idle,
    Done,
    CopyError,
    NoCard,
    NoStore,
    NoFiles,
}

struct PlanEntry {
    path: String<PATH_BYTES>,
    name: String<ENTRY_NAME_BYTES>,
    size: u32,
    needs_copy: bool,
}

pub struct IntakeMode {
    status: IntakeStatus,
    copied: u32,
    skipped: u32,
    total: u32,
    chunk: [u8; COPY_CHUNK],
}

impl IntakeMode {
    pub const fn new() -> Self {
        Self {
            status: IntakeStatus::Idle,
            copied: 0,
            skipped: 0,
            total: 0,
            chunk: [0u8; COPY_CHUNK],
        }
    }

    pub fn status(&self) -> IntakeStatus {
        self.status
    }

    /// `(copied, skipped, total)` of the last run.
    pub fn summary(&self) -> (u32, u32, u32) {
        (self.copied, self.skipped, self.total)
    }

    fn run<P: Platform>(&mut self, svc: &mut Services<'_, P>) {
        self.copied = 0;
        self.skipped = 0;
        self.total = 0;

        if !svc.platform.removable().is_ready() {
            self.status = IntakeStatus::NoCard;
            self.draw_result(svc);
            return;
        }
        if !svc.platform.internal().is_ready() {
            self.status = IntakeStatus::NoStore;
            self.draw_result(svc);
            return;
        }

        let plan = self.build_plan(svc);
        self.total = plan.len() as u32;
        if plan.is_empty() {
            self.status = IntakeStatus::NoFiles;
            self.draw_result(svc);
            return;
        }

        let to_copy = plan.iter().filter(|e| e.needs_copy).count() as u32;
        if to_copy == 0 {
            self.skipped = self.total;
            self.status = IntakeStatus::Done;
            self.draw_result(svc);
            return;
        }

        if let Err(error) = svc.platform.internal().make_dir(INTAKE_FOLDER) {
            warn!("intake: cannot ensure {INTAKE_FOLDER}: {error:?}");
        }

        let mut failed = false;
        let mut progress = 0u32;
        for entry in &plan {
            if !entry.needs_copy {
                self.skipped += 1;
                continue;
            }

            progress += 1;
            self.draw_progress(svc, progress, to_copy, entry.name.as_str());

            let free = svc.platform.internal().free_bytes();
            if u64::from(entry.size) > free {
                warn!(
                    "intake: not enough space for {} ({} > {} free)",
                    entry.path, entry.size, free
                );
                failed = true;
                break;
            }

            if self.copy_file(svc, entry.path.as_str()) {
                self.copied += 1;
            } else {
                failed = true;
                break;
            }
        }

        self.status = if failed {
            IntakeStatus::CopyError
        } else {
            IntakeStatus::Done
        };
        self.draw_result(svc);
    }

    fn build_plan<P: Platform>(&mut self, svc: &mut Services<'_, P>) -> Vec<PlanEntry, MAX_COPY_FILES> {
        let mut plan = Vec::new();

        let listing = match svc.platform.removable().list_dir(INTAKE_FOLDER) {
            Ok(listing) => listing,
            Err(error) => {
                warn!("intake: cannot list {INTAKE_FOLDER}: {error:?}");
                return plan;
            }
        };

        for entry in &listing {
            // macOS resource forks (._*, .DS_Store) and subfolders are not
            // mirrored.
            if entry.name.starts_with('.') || entry.kind == EntryKind::Directory {
                continue;
            }
            let Some(path) = join_path(INTAKE_FOLDER, entry.name.as_str()) else {
                continue;
            };

            let needs_copy = match svc.platform.internal().stat(path.as_str()) {
                Ok(Some(existing)) => existing.size != entry.size,
                Ok(None) => true,
                Err(error) => {
                    warn!("intake: cannot stat {path}: {error:?}");
                    true
                }
            };

            if plan
                .push(PlanEntry {
                    path,
                    name: entry.name.clone(),
                    size: entry.size,
                    needs_copy,
                })
                .is_err()
            {
                break;
            }
        }
        plan
    }

    /// Streams one file card -> flash in chunks. A failed transfer removes
    /// the partial destination file.
    fn copy_file<P: Platform>(&mut self, svc: &mut Services<'_, P>, path: &str) -> bool {
        if let Err(error) = svc.platform.internal().write(path, &[]) {
            warn!("intake: cannot create {path}: {error:?}");
            return false;
        }

        let mut offset = 0u32;
        loop {
            let read = match svc.platform.removable().read(path, offset, &mut self.chunk) {
                Ok(read) => read,
                Err(error) => {
                    warn!("intake: read of {path} failed at {offset}: {error:?}");
                    let _ = svc.platform.internal().remove(path);
                    return false;
                }
            };
            if read == 0 {
                break;
            }

            if let Err(error) = svc.platform.internal().append(path, &self.chunk[..read]) {
                warn!("intake: write of {path} failed at {offset} (disk full?): {error:?}");
                let _ = svc.platform.internal().remove(path);
                return false;
            }
            offset += read as u32;
        }

        info!("intake: copied {path} ({offset} bytes)");
        true
    }

    fn draw_progress<P: Platform>(&self, svc: &mut Services<'_, P>, current: u32, total: u32, name: &str) {
        let frame = &mut *svc.frame;
        frame.fill(BG);
        render::draw_centered(frame, &FONT_LARGE, RING, "Intake", 30);

        let mut counter: String<32> = String::new();
        let _ = write!(counter, "{current} / {total}");
        render::draw_centered(frame, &FONT_LARGE, TEXT, counter.as_str(), 92);
        render::draw_centered(frame, &FONT_SMALL, TEXT, short_name(name), 126);

        render::draw_progress_bar(frame, 40, 155, 160, 12, current, total);
        svc.present();
    }

    fn draw_result<P: Platform>(&self, svc: &mut Services<'_, P>) {
        let (used_kb, total_kb) = {
            let flash = svc.platform.internal();
            (flash.used_bytes() / 1024, flash.total_bytes() / 1024)
        };

        let frame = &mut *svc.frame;
        frame.fill(BG);

        match self.status {
            IntakeStatus::NoCard => {
                render::draw_centered(frame, &FONT_LARGE, TEXT, "No SD Card", 92);
                render::draw_centered(frame, &FONT_SMALL, TEXT, "Insert card & reboot", 134);
            }
            IntakeStatus::NoStore => {
                render::draw_centered(frame, &FONT_LARGE, TEXT, "Storage Error", 92);
                render::draw_centered(frame, &FONT_SMALL, TEXT, "Internal flash failed", 134);
            }
            IntakeStatus::NoFiles => {
                render::draw_centered(frame, &FONT_LARGE, TEXT, "No Files", 92);
                render::draw_centered(frame, &FONT_SMALL, TEXT, "Nothing in /birthday", 134);
            }
            IntakeStatus::CopyError => {
                render::draw_centered(frame, &FONT_LARGE, ALERT, "Copy Error", 72);

                let mut line: String<48> = String::new();
                let failed = self.total - self.copied - self.skipped;
                let _ = write!(line, "{} copied, {} failed", self.copied, failed);
                render::draw_centered(frame, &FONT_SMALL, TEXT, line.as_str(), 114);

                line.clear();
                let _ = write!(line, "{used_kb}KB / {total_kb}KB used");
                render::draw_centered(frame, &FONT_SMALL, TEXT, line.as_str(), 144);
            }
            IntakeStatus::Done => {
                render::draw_centered(frame, &FONT_LARGE, ACCENT, "Complete!", 62);

                let mut line: String<48> = String::new();
                let _ = write!(line, "{} copied, {} skipped", self.copied, self.skipped);
                render::draw_centered(frame, &FONT_SMALL, TEXT, line.as_str(), 104);

                line.clear();
                let _ = write!(line, "{used_kb}KB / {total_kb}KB used");
                render::draw_centered(frame, &FONT_SMALL, TEXT, line.as_str(), 134);

                render::draw_centered(frame, &FONT_SMALL, TEXT, "Bottom btn: re-sync", 174);
            }
            IntakeStatus::Idle => {}
        }
        svc.present();
    }
}

impl Default for IntakeMode {
    fn default() -> Self {
        Self::new()
    }
}

impl Mode for IntakeMode {
    fn name(&self) -> &'static str {
        "Intake"
    }

    fn enter<P: Platform>(&mut self, svc: &mut Services<'_, P>, _now_ms: u64) {
        self.run(svc);
    }

    fn update<P: Platform>(&mut self, _svc: &mut Services<'_, P>, _now_ms: u64) {
        // The sync runs to completion in enter; nothing to animate.
    }

    fn on_button<P: Platform>(&mut self, svc: &mut Services<'_, P>, button: Button, _now_ms: u64) {
        if button == Button::Bottom {
            self.run(svc);
        }
    }
}

/// Truncates a file name to fit the progress screen.
fn short_name(name: &str) -> &str {
    match name.char_indices().nth(23) {
        Some((offset, _)) => &name[..offset],
        None => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::TestPlatform;

    fn enter(mode: &mut IntakeMode, platform: &mut TestPlatform) {
        let mut frame = crate::canvas::FrameCanvas::new();
        let mut svc = Services {
            platform,
            frame: &mut frame,
        };
        mode.enter(&mut svc, 0);
    }

    #[test]
    fn mirrors_card_files_to_flash() {
        let mut platform = TestPlatform::new();
        platform.sd.insert("/birthday/cake.bmp", &[7u8; 3000]);
        platform.sd.insert("/birthday/note.md", b"# For you");
        platform.sd.insert("/birthday/.DS_Store", b"junk");

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);

        assert_eq!(mode.status(), IntakeStatus::Done);
        assert_eq!(mode.summary(), (2, 0, 2));
        assert_eq!(platform.flash.contents("/birthday/cake.bmp").unwrap(), &[7u8; 3000][..]);
        assert_eq!(platform.flash.contents("/birthday/note.md").unwrap(), b"# For you");
        assert!(platform.flash.contents("/birthday/.DS_Store").is_none());
    }

    #[test]
    fn unchanged_files_are_skipped_on_resync() {
        let mut platform = TestPlatform::new();
        platform.sd.insert("/birthday/cake.bmp", &[7u8; 100]);

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.summary(), (1, 0, 1));

        enter(&mut mode, &mut platform);
        assert_eq!(mode.status(), IntakeStatus::Done);
        assert_eq!(mode.summary(), (0, 1, 1));
    }

    #[test]
    fn size_changes_trigger_a_recopy() {
        let mut platform = TestPlatform::new();
        platform.sd.insert("/birthday/cake.bmp", &[7u8; 100]);
        platform.sd.insert("/birthday/song.md", b"la la");

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);

        platform.sd.insert("/birthday/cake.bmp", &[9u8; 150]);
        enter(&mut mode, &mut platform);

        assert_eq!(mode.summary(), (1, 1, 2));
        assert_eq!(platform.flash.contents("/birthday/cake.bmp").unwrap(), &[9u8; 150][..]);
    }

    #[test]
    fn missing_card_reports_no_card() {
        let mut platform = TestPlatform::new();
        platform.sd.set_ready(false);

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.status(), IntakeStatus::NoCard);
    }

    #[test]
    fn broken_flash_reports_store_error() {
        let mut platform = TestPlatform::new();
        platform.sd.insert("/birthday/cake.bmp", &[7u8; 10]);
        platform.flash.set_ready(false);

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.status(), IntakeStatus::NoStore);
    }

    #[test]
    fn empty_card_folder_reports_no_files() {
        let mut platform = TestPlatform::new();
        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);
        assert_eq!(mode.status(), IntakeStatus::NoFiles);
    }

    #[test]
    fn insufficient_space_stops_the_run_with_an_error() {
        let mut platform = TestPlatform::with_flash_capacity(50);
        platform.sd.insert("/birthday/big.bmp", &[1u8; 200]);

        let mut mode = IntakeMode::new();
        enter(&mut mode, &mut platform);

        assert_eq!(mode.status(), IntakeStatus::CopyError);
        assert_eq!(mode.summary(), (0, 0, 1));
        assert!(platform.flash.contents("/birthday/big.bmp").is_none());
    }

    #[test]
    fn failed_transfers_remove_the_partial_file() {
        let mut platform = TestPlatform::with_flash_capacity(50);
        platform.sd.insert("/birthday/big.bmp", &[1u8; 200]);

        let mut mode = IntakeMode::new();
        let mut frame = crate::canvas::FrameCanvas::new();
        let mut svc = Services {
            platform: &mut platform,
            frame: &mut frame,
        };
        // Bypass the free-space guard and drive the chunked copy directly.
        assert!(!mode.copy_file(&mut svc, "/birthday/big.bmp"));
        drop(svc);

        assert!(platform.flash.contents("/birthday/big.bmp").is_none());
    }
}
