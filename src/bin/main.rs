//! Locket entry point and main loop.
//!
//! Boot sequence: logger -> panel -> storage -> shell. The main loop polls
//! the buttons and drives the shell's cooperative tick; every mode
//! self-throttles against wall-clock time, so the loop cadence only needs
//! to stay under the fastest frame interval.

#![no_std]
#![no_main]

use core::cell::RefCell;

use embedded_hal_bus::spi::RefCellDevice;
use esp_backtrace as _;
use esp_hal::Blocking;
use esp_hal::clock::CpuClock;
use esp_hal::delay::Delay;
use esp_hal::gpio::{Input, InputConfig, Level, Output, OutputConfig, Pull};
use esp_hal::spi::Mode as SpiMode;
use esp_hal::spi::master::{Config as SpiConfig, Spi};
use esp_hal::time::{Instant, Rate};
use log::{info, warn};
use static_cell::StaticCell;

use locket_core::input::InputProvider;
use locket_core::shell::Shell;
use locket_hal_esp32c3::buttons::Buttons;
use locket_hal_esp32c3::display::PanelDisplay;
use locket_hal_esp32c3::{Board, flashfs, kv::FlashKv, sdcard};

esp_bootloader_esp_idf::esp_app_desc!();

const DISPLAY_SPI_MHZ: u32 = 40;
const LOOP_PAUSE_MS: u32 = 5;

type SharedSpi = RefCellDevice<'static, Spi<'static, Blocking>, Output<'static>, Delay>;

static SPI_BUS: StaticCell<RefCell<Spi<'static, Blocking>>> = StaticCell::new();
static SHELL: StaticCell<Shell> = StaticCell::new();

fn now_ms() -> u64 {
    Instant::now().duration_since_epoch().as_millis()
}

#[esp_hal::main]
fn main() -> ! {
    esp_println::logger::init_logger_from_env();
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    let peripherals = esp_hal::init(config);
    let mut delay = Delay::new();

    info!("booting...");

    // Panel and SD card share the SPI bus; each gets its own chip select.
    let spi = Spi::new(
        peripherals.SPI2,
        SpiConfig::default()
            .with_frequency(Rate::from_mhz(DISPLAY_SPI_MHZ))
            .with_mode(SpiMode::_0),
    )
    .expect("SPI init")
    .with_sck(peripherals.GPIO6)
    .with_mosi(peripherals.GPIO7)
    .with_miso(peripherals.GPIO2);
    let spi_bus = SPI_BUS.init(RefCell::new(spi));

    let tft_cs = Output::new(peripherals.GPIO10, Level::High, OutputConfig::default());
    let sd_cs = Output::new(peripherals.GPIO1, Level::High, OutputConfig::default());
    let tft_dc = Output::new(peripherals.GPIO3, Level::Low, OutputConfig::default());
    let tft_rst = Output::new(peripherals.GPIO8, Level::High, OutputConfig::default());

    // Backlight on (active high).
    let mut backlight = Output::new(peripherals.GPIO5, Level::High, OutputConfig::default());
    backlight.set_high();

    let panel_spi: SharedSpi = RefCellDevice::new(spi_bus, tft_cs, delay).expect("panel CS");
    let sd_spi: SharedSpi = RefCellDevice::new(spi_bus, sd_cs, delay).expect("sd CS");

    let mut panel = PanelDisplay::new(panel_spi, tft_dc, tft_rst, gc9a01::Config::default());
    if let Err(error) = panel.init(&mut delay) {
        warn!("panel init failed: {error:?}");
    }
    info!("panel initialized (GC9A01, 240x240)");

    let sd = sdcard::mount(sd_spi, delay);
    let flash = flashfs::mount();
    let settings = FlashKv::new();

    let mut board = Board {
        panel,
        sd,
        flash,
        settings,
    };

    let input_config = InputConfig::default().with_pull(Pull::Up);
    let bottom = Input::new(peripherals.GPIO4, input_config);
    let top = Input::new(peripherals.GPIO9, input_config);
    let mut buttons = Buttons::new(bottom, top);
    info!("buttons configured (bottom=GPIO4, top=GPIO9)");

    let shell = SHELL.init(Shell::new());
    info!("shell ready.");

    loop {
        let now = now_ms();
        if let Ok(Some(event)) = buttons.poll_event(now) {
            shell.on_event(&mut board, event, now);
        }
        shell.tick(&mut board, now);
        delay.delay_ms(LOOP_PAUSE_MS);
    }
}
