use super::*;
use crate::error::ModeError;
use crate::settings::KvStore;
use crate::shell::Services;
use crate::storage::VolumeMut;
use crate::testutil::TestPlatform;

const POEM_SHORT: &[u8] = b"# Short\nonly a couple of lines\nnothing to scroll";

fn long_poem() -> std::string::String {
    let mut poem = std::string::String::from("# The Long Road\n");
    for i in 0..20 {
        poem.push_str(&std::format!("stanza line number {i}\n"));
    }
    poem
}

fn platform_with_poems(names: &[(&str, &[u8])]) -> TestPlatform {
    let mut platform = TestPlatform::new();
    for (name, body) in names {
        let mut path = std::string::String::from("/poems/");
        path.push_str(name);
        platform.flash.insert(&path, body);
    }
    platform
}

fn enter(mode: &mut PoemsMode, platform: &mut TestPlatform, now_ms: u64) {
    let mut frame = crate::canvas::FrameCanvas::new();
    let mut svc = Services {
        platform,
        frame: &mut frame,
    };
    mode.enter(&mut svc, now_ms);
}

fn update(mode: &mut PoemsMode, platform: &mut TestPlatform, now_ms: u64) {
    let mut frame = crate::canvas::FrameCanvas::new();
    let mut svc = Services {
        platform,
        frame: &mut frame,
    };
    mode.update(&mut svc, now_ms);
}

fn press(mode: &mut PoemsMode, platform: &mut TestPlatform, button: Button, now_ms: u64) {
    let mut frame = crate::canvas::FrameCanvas::new();
    let mut svc = Services {
        platform,
        frame: &mut frame,
    };
    mode.on_button(&mut svc, button, now_ms);
}

fn new_mode() -> PoemsMode {
    PoemsMode::new(ScrollConfig::default(), Some(LineCanvas::new()))
}

#[test]
fn documents_are_visited_in_lexicographic_order() {
    let mut platform = platform_with_poems(&[
        ("c.md", POEM_SHORT),
        ("a.md", POEM_SHORT),
        ("b.md", POEM_SHORT),
    ]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    assert_eq!(mode.document_count(), 3);
    assert_eq!(mode.current_path(), Some("/poems/a.md"));

    press(&mut mode, &mut platform, Button::Bottom, 10);
    assert_eq!(mode.current_path(), Some("/poems/b.md"));
    press(&mut mode, &mut platform, Button::Bottom, 20);
    assert_eq!(mode.current_path(), Some("/poems/c.md"));
}

#[test]
fn stepping_wraps_in_both_directions() {
    let mut platform = platform_with_poems(&[("a.md", POEM_SHORT), ("b.md", POEM_SHORT)]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    press(&mut mode, &mut platform, Button::Top, 10);
    assert_eq!(mode.current_path(), Some("/poems/b.md"));
    press(&mut mode, &mut platform, Button::Bottom, 20);
    assert_eq!(mode.current_path(), Some("/poems/a.md"));
    press(&mut mode, &mut platform, Button::Bottom, 30);
    assert_eq!(mode.current_path(), Some("/poems/b.md"));
}

#[test]
fn non_documents_and_dotfiles_are_ignored() {
    let mut platform = platform_with_poems(&[
        ("a.md", POEM_SHORT),
        (".hidden.md", POEM_SHORT),
        ("photo.bmp", b"not a poem"),
        ("notes.txt", b"not a poem"),
    ]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    assert_eq!(mode.document_count(), 1);
}

#[test]
fn persisted_index_survives_a_restart() {
    let mut platform = platform_with_poems(&[
        ("a.md", POEM_SHORT),
        ("b.md", POEM_SHORT),
        ("c.md", POEM_SHORT),
    ]);

    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);
    press(&mut mode, &mut platform, Button::Bottom, 10);
    press(&mut mode, &mut platform, Button::Bottom, 20);
    assert_eq!(platform.kv.get_i32("poems", "idx"), Ok(Some(2)));

    // Fresh mode instance over the same storage: resumes at c.md.
    let mut restarted = new_mode();
    enter(&mut restarted, &mut platform, 0);
    assert_eq!(restarted.current_path(), Some("/poems/c.md"));
}

#[test]
fn out_of_range_persisted_index_resolves_to_zero() {
    let mut platform = platform_with_poems(&[("a.md", POEM_SHORT), ("b.md", POEM_SHORT)]);
    platform.kv.put_i32("poems", "idx", 99).unwrap();

    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);
    assert_eq!(mode.current_index(), 0);
}

#[test]
fn scroll_advances_monotonically_and_resets_on_step() {
    let poem = long_poem();
    let mut platform = platform_with_poems(&[("long.md", poem.as_bytes())]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);
    assert!(mode.layout().scroll_ceiling() > 0);

    let mut now = 0u64;
    let mut previous = mode.scroll_offset();
    for _ in 0..50 {
        now += 16;
        update(&mut mode, &mut platform, now);
        assert!(mode.scroll_offset() >= previous);
        previous = mode.scroll_offset();
    }
    assert!(mode.scroll_offset() > 0.0);

    press(&mut mode, &mut platform, Button::Bottom, now);
    assert_eq!(mode.scroll_offset(), 0.0);
}

#[test]
fn frame_throttle_limits_scroll_rate() {
    let poem = long_poem();
    let mut platform = platform_with_poems(&[("long.md", poem.as_bytes())]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 1000);

    update(&mut mode, &mut platform, 1010);
    assert_eq!(mode.scroll_offset(), 0.0);

    update(&mut mode, &mut platform, 1016);
    let step = ScrollConfig::default().step_px;
    assert_eq!(mode.scroll_offset(), step);

    // Same timestamp again: throttled, no double advance.
    update(&mut mode, &mut platform, 1016);
    assert_eq!(mode.scroll_offset(), step);
}

#[test]
fn fully_scrolled_documents_rotate_forward_and_persist() {
    let poem = long_poem();
    let mut platform = platform_with_poems(&[("a.md", poem.as_bytes()), ("b.md", POEM_SHORT)]);
    // A coarser step keeps the simulated session short.
    let config = ScrollConfig {
        step_px: 8.0,
        ..ScrollConfig::default()
    };
    let mut mode = PoemsMode::new(config, Some(LineCanvas::new()));
    enter(&mut mode, &mut platform, 0);

    let ceiling = mode.layout().scroll_ceiling();
    let ticks_needed = ((ceiling + config.overshoot_px) as f32 / config.step_px) as u64 + 10;

    let mut now = 0u64;
    for _ in 0..ticks_needed {
        now += config.frame_interval_ms;
        update(&mut mode, &mut platform, now);
        if mode.current_index() == 1 {
            break;
        }
    }

    assert_eq!(mode.current_index(), 1);
    assert_eq!(mode.scroll_offset(), 0.0);
    assert_eq!(platform.kv.get_i32("poems", "idx"), Ok(Some(1)));
}

#[test]
fn content_fitting_on_screen_never_auto_advances() {
    let mut platform = platform_with_poems(&[("a.md", POEM_SHORT), ("b.md", POEM_SHORT)]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    // Force a layout whose content fits the viewport entirely.
    let mut fitting = layout_document(b"# Short");
    fitting.total_height = 200;
    mode.inject_layout(fitting);
    assert!(mode.layout().scroll_ceiling() <= 0);

    let mut now = 0u64;
    for _ in 0..500 {
        now += 16;
        update(&mut mode, &mut platform, now);
    }

    assert_eq!(mode.current_index(), 0);
    assert_eq!(mode.scroll_offset(), 0.0);
}

#[test]
fn empty_folder_shows_a_notice_and_idles() {
    let mut platform = TestPlatform::new();
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    assert_eq!(mode.last_error(), Some(ModeError::NoDocuments));
    assert_eq!(mode.document_count(), 0);
    assert!(platform.sink.frames_pushed >= 1);

    // Ticks and presses are inert while idle.
    update(&mut mode, &mut platform, 100);
    press(&mut mode, &mut platform, Button::Bottom, 200);
    assert_eq!(mode.document_count(), 0);
}

#[test]
fn unavailable_storage_degrades_to_a_notice() {
    let mut platform = TestPlatform::new();
    platform.flash.set_ready(false);

    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);
    assert_eq!(mode.last_error(), Some(ModeError::StorageUnavailable));
}

#[test]
fn unreadable_document_resets_to_empty_layout() {
    let mut platform = platform_with_poems(&[("a.md", POEM_SHORT), ("b.md", POEM_SHORT)]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);

    // The file disappears between the scan and the next load.
    platform.flash.remove("/poems/b.md").unwrap();
    press(&mut mode, &mut platform, Button::Bottom, 10);

    assert_eq!(mode.last_error(), Some(ModeError::DocumentOpenFailed));
    assert!(mode.layout().is_empty());

    // Updates stay inert until the user steps to a readable document.
    update(&mut mode, &mut platform, 100);
    press(&mut mode, &mut platform, Button::Bottom, 200);
    assert_eq!(mode.last_error(), None);
    assert!(!mode.layout().is_empty());
}

#[test]
fn missing_scratch_canvas_disables_the_compositor_without_crashing() {
    let poem = long_poem();
    let mut platform = platform_with_poems(&[("a.md", poem.as_bytes())]);
    let mut mode = PoemsMode::new(ScrollConfig::default(), None);
    enter(&mut mode, &mut platform, 0);

    assert_eq!(mode.last_error(), Some(ModeError::RenderTargetAllocationFailed));

    let mut now = 0u64;
    for _ in 0..20 {
        now += 16;
        update(&mut mode, &mut platform, now);
    }
    assert!(mode.scroll_offset() > 0.0);
}

#[test]
fn left_edge_is_narrowest_at_screen_center() {
    let center = left_edge(120.0 - BODY_LINE_H as f32 / 2.0);
    assert!((center - (120.0 - EDGE_RADIUS + EDGE_INSET)).abs() < 0.01);

    // Indent grows toward top and bottom and keeps growing past the bezel.
    assert!(left_edge(20.0) > center);
    assert!(left_edge(200.0) > center);
    assert!(left_edge(250.0) > left_edge(220.0));
}

#[test]
fn frames_are_presented_while_scrolling() {
    let poem = long_poem();
    let mut platform = platform_with_poems(&[("a.md", poem.as_bytes())]);
    let mut mode = new_mode();
    enter(&mut mode, &mut platform, 0);
    let after_enter = platform.sink.frames_pushed;
    assert!(after_enter >= 1);

    update(&mut mode, &mut platform, 16);
    assert_eq!(platform.sink.frames_pushed, after_enter + 1);
}
