#![cfg_attr(not(test), no_std)]

//! GC9A01 (1.28" 240x240 round TFT) driver primitives.

pub mod protocol;

use embedded_hal::{delay::DelayNs, digital::OutputPin, spi::SpiDevice};

/// Driver configuration.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Config {
    /// Expected SPI clock in Hz (documented for board glue).
    pub spi_hz: u32,
    /// MADCTL value applied after the init sequence.
    pub madctl: u8,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spi_hz: 40_000_000,
            madctl: protocol::MADCTL_BGR,
        }
    }
}

/// Driver errors.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Error<SpiErr, DcErr, RstErr> {
    /// SPI transaction failed.
    Spi(SpiErr),
    /// Data/command pin operation failed.
    Dc(DcErr),
    /// Reset pin operation failed.
    Rst(RstErr),
    /// Window coordinates are outside the panel.
    InvalidWindow,
}

pub type DriverResult<SpiErr, DcErr, RstErr> = Result<(), Error<SpiErr, DcErr, RstErr>>;

/// GC9A01 driver over a 4-wire SPI interface with a D/C select pin.
#[derive(Debug)]
pub struct Gc9a01<SPI, DC, RST> {
    spi: SPI,
    dc: DC,
    rst: RST,
    config: Config,
}

impl<SPI, DC, RST> Gc9a01<SPI, DC, RST>
where
    SPI: SpiDevice<u8>,
    DC: OutputPin,
    RST: OutputPin,
{
    /// Creates a new driver instance.
    pub fn new(spi: SPI, dc: DC, rst: RST, config: Config) -> Self {
        Self {
            spi,
            dc,
            rst,
            config,
        }
    }

    /// Returns current configuration.
    pub fn config(&self) -> Config {
        self.config
    }

    /// Releases owned bus and pins.
    pub fn release(self) -> (SPI, DC, RST) {
        (self.spi, self.dc, self.rst)
    }

    /// Pulses the hardware reset line.
    pub fn hard_reset(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.rst.set_high().map_err(Error::Rst)?;
        delay.delay_ms(10);
        self.rst.set_low().map_err(Error::Rst)?;
        delay.delay_ms(10);
        self.rst.set_high().map_err(Error::Rst)?;
        delay.delay_ms(120);
        Ok(())
    }

    /// Resets the panel and runs the power-on sequence.
    pub fn init(
        &mut self,
        delay: &mut impl DelayNs,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.hard_reset(delay)?;

        for op in protocol::INIT_SEQUENCE {
            match *op {
                protocol::InitOp::Cmd(command, params) => self.write_command(command, params)?,
                protocol::InitOp::DelayMs(ms) => delay.delay_ms(ms),
            }
        }

        self.write_command(protocol::CMD_MADCTL, &[self.config.madctl])?;
        self.write_command(protocol::CMD_COLMOD, &[protocol::COLMOD_16BPP])
    }

    /// Sets the inclusive drawing window for subsequent pixel writes.
    pub fn set_window(
        &mut self,
        x0: u16,
        y0: u16,
        x1: u16,
        y1: u16,
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        let columns = protocol::encode_column_window(x0, x1).ok_or(Error::InvalidWindow)?;
        let rows = protocol::encode_row_window(y0, y1).ok_or(Error::InvalidWindow)?;

        self.write_command(protocol::CMD_CASET, &columns)?;
        self.write_command(protocol::CMD_RASET, &rows)
    }

    /// Starts a RAM write for the current window.
    pub fn begin_pixels(&mut self) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.write_command(protocol::CMD_RAMWR, &[])
    }

    /// Streams big-endian RGB565 pixel bytes into the current window.
    ///
    /// Must follow [`Self::begin_pixels`]; may be called repeatedly to
    /// stream a window in slices.
    pub fn write_pixels(&mut self, data: &[u8]) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.dc.set_high().map_err(Error::Dc)?;
        self.spi.write(data).map_err(Error::Spi)
    }

    fn write_command(
        &mut self,
        command: u8,
        params: &[u8],
    ) -> DriverResult<SPI::Error, DC::Error, RST::Error> {
        self.dc.set_low().map_err(Error::Dc)?;
        self.spi.write(&[command]).map_err(Error::Spi)?;

        if !params.is_empty() {
            self.dc.set_high().map_err(Error::Dc)?;
            self.spi.write(params).map_err(Error::Spi)?;
        }
        Ok(())
    }
}
