//! ESP32 SPI/DMA transport for the DMX stream.
//!
//! Only MOSI is used: the bus is brought up without pins and the TX GPIO
//! is attached to the SPI data-out signal afterwards through the GPIO
//! matrix, so no clock or chip-select pin is claimed.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: queues one DMA transaction per frame from a DMA-capable
//! copy of the frame and polls its completion without blocking.
//! On host/test: simulates a wire that stays busy for the time the frame
//! takes to shift out, and keeps the last frame for inspection.

use log::info;

use crate::app::ports::{SerialTransport, SpiSettings, TransportError};
use crate::frame::FRAME_LEN;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use crate::app::ports::{BitOrder, SpiMode};

/// SPI transport driving the DMX transceiver.
pub struct EspSpiTransport {
    host: u32,
    tx_gpio: i32,
    #[cfg(target_os = "espidf")]
    hw: EspSpiState,
    #[cfg(not(target_os = "espidf"))]
    sim: SimWire,
}

#[cfg(target_os = "espidf")]
struct EspSpiState {
    device: spi_device_handle_t,
    /// DMA-capable copy of the frame in flight.
    dma_buf: *mut u8,
    /// Boxed so its address stays put while the driver holds it.
    trans: Box<spi_transaction_t>,
    in_flight: bool,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimWire {
    clock_hz: u32,
    busy_until: Option<std::time::Instant>,
    last_frame: Vec<u8>,
    frames: u64,
}

impl EspSpiTransport {
    /// Transport on SPI `host`, driving `tx_gpio`.  Nothing is touched
    /// until [`SerialTransport::configure`].
    pub fn new(host: u32, tx_gpio: i32) -> Self {
        Self {
            host,
            tx_gpio,
            #[cfg(target_os = "espidf")]
            hw: EspSpiState {
                device: core::ptr::null_mut(),
                dma_buf: core::ptr::null_mut(),
                trans: Box::default(),
                in_flight: false,
            },
            #[cfg(not(target_os = "espidf"))]
            sim: SimWire::default(),
        }
    }
}

// ── ESP-IDF implementation ────────────────────────────────────

#[cfg(target_os = "espidf")]
impl SerialTransport for EspSpiTransport {
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError> {
        let mut bus_cfg = spi_bus_config_t {
            sclk_io_num: -1,
            max_transfer_sz: FRAME_LEN as i32,
            ..Default::default()
        };
        bus_cfg.__bindgen_anon_1.mosi_io_num = -1;
        bus_cfg.__bindgen_anon_2.miso_io_num = -1;
        bus_cfg.__bindgen_anon_3.quadwp_io_num = -1;
        bus_cfg.__bindgen_anon_4.quadhd_io_num = -1;

        // SAFETY: called once from the main task before any transfer.
        let ret = unsafe {
            spi_bus_initialize(self.host, &bus_cfg, crate::pins::DMX_SPI_DMA_CHANNEL)
        };
        if ret != ESP_OK as i32 {
            return Err(TransportError::InitFailed(ret));
        }

        let mode = match settings.mode {
            SpiMode::Mode0 => 0,
            SpiMode::Mode1 => 1,
            SpiMode::Mode2 => 2,
            SpiMode::Mode3 => 3,
        };
        let flags = match settings.bit_order {
            BitOrder::LsbFirst => SPI_DEVICE_TXBIT_LSBFIRST,
            BitOrder::MsbFirst => 0,
        };
        let dev_cfg = spi_device_interface_config_t {
            clock_speed_hz: settings.clock_hz as i32,
            mode,
            spics_io_num: -1,
            queue_size: 1,
            flags,
            ..Default::default()
        };
        // SAFETY: bus initialised above; handle written once here.
        let ret = unsafe { spi_bus_add_device(self.host, &dev_cfg, &mut self.hw.device) };
        if ret != ESP_OK as i32 {
            return Err(TransportError::InitFailed(ret));
        }

        // SAFETY: plain allocation; null-checked below.
        self.hw.dma_buf = unsafe { heap_caps_malloc(FRAME_LEN, MALLOC_CAP_DMA) } as *mut u8;
        if self.hw.dma_buf.is_null() {
            return Err(TransportError::InitFailed(ESP_ERR_NO_MEM as i32));
        }

        info!(
            "spi: host {} configured ({} Hz, {:?}, {:?})",
            self.host, settings.clock_hz, settings.bit_order, settings.mode
        );
        Ok(())
    }

    fn route_pin(&mut self) -> Result<(), TransportError> {
        // SAFETY: pin number comes from `pins`; single-threaded init path.
        unsafe {
            esp_rom_gpio_pad_select_gpio(self.tx_gpio as u32);
            let ret = gpio_set_direction(self.tx_gpio, gpio_mode_t_GPIO_MODE_OUTPUT);
            if ret != ESP_OK as i32 {
                return Err(TransportError::PinRouting(ret));
            }
            esp_rom_gpio_connect_out_signal(self.tx_gpio as u32, FSPID_OUT_IDX, false, false);
        }
        info!("spi: GPIO{} routed to MOSI", self.tx_gpio);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        if !self.hw.in_flight {
            return false;
        }
        let mut done: *mut spi_transaction_t = core::ptr::null_mut();
        // SAFETY: device handle is valid after configure(); zero timeout
        // makes this a non-blocking poll.
        let ret = unsafe { spi_device_get_trans_result(self.hw.device, &mut done, 0) };
        if ret == ESP_OK as i32 {
            self.hw.in_flight = false;
        }
        self.hw.in_flight
    }

    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.hw.in_flight {
            return Err(TransportError::TransferFailed(ESP_ERR_INVALID_STATE as i32));
        }
        if frame.len() > FRAME_LEN {
            return Err(TransportError::Unsupported("frame larger than DMA buffer"));
        }

        // SAFETY: dma_buf holds FRAME_LEN bytes and no transfer reads it
        // right now (`in_flight` is false).
        unsafe {
            core::ptr::copy_nonoverlapping(frame.as_ptr(), self.hw.dma_buf, frame.len());
        }
        *self.hw.trans = spi_transaction_t {
            length: frame.len() * 8,
            ..Default::default()
        };
        self.hw.trans.__bindgen_anon_1.tx_buffer = self.hw.dma_buf as *const _;

        // SAFETY: `trans` and `dma_buf` outlive the transaction; the next
        // queue call waits for is_busy() to report completion.
        let ret = unsafe { spi_device_queue_trans(self.hw.device, &mut *self.hw.trans, 0) };
        if ret != ESP_OK as i32 {
            return Err(TransportError::TransferFailed(ret));
        }
        self.hw.in_flight = true;
        Ok(())
    }

    fn yield_now(&mut self) {
        esp_idf_hal::task::do_yield();
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
impl SerialTransport for EspSpiTransport {
    fn configure(&mut self, settings: &SpiSettings) -> Result<(), TransportError> {
        if settings.clock_hz == 0 {
            return Err(TransportError::Unsupported("zero clock rate"));
        }
        self.sim.clock_hz = settings.clock_hz;
        info!(
            "spi(sim): host {} configured ({} Hz, {:?})",
            self.host,
            settings.clock_hz,
            settings.bit_order
        );
        Ok(())
    }

    fn route_pin(&mut self) -> Result<(), TransportError> {
        info!("spi(sim): GPIO{} routed to MOSI", self.tx_gpio);
        Ok(())
    }

    fn is_busy(&mut self) -> bool {
        self.sim
            .busy_until
            .is_some_and(|t| std::time::Instant::now() < t)
    }

    fn transfer_async(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        if self.sim.clock_hz == 0 {
            return Err(TransportError::Unsupported("not configured"));
        }
        if frame.len() > FRAME_LEN {
            return Err(TransportError::Unsupported("frame larger than DMA buffer"));
        }
        if self.is_busy() {
            return Err(TransportError::TransferFailed(-1));
        }
        let wire_us = frame.len() as u64 * 8 * 1_000_000 / u64::from(self.sim.clock_hz);
        self.sim.busy_until =
            Some(std::time::Instant::now() + std::time::Duration::from_micros(wire_us));
        self.sim.last_frame.clear();
        self.sim.last_frame.extend_from_slice(frame);
        self.sim.frames += 1;
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl EspSpiTransport {
    /// Last frame handed to the simulated wire.
    pub fn last_frame(&self) -> &[u8] {
        &self.sim.last_frame
    }

    /// Frames started on the simulated wire.
    pub fn frames_sent(&self) -> u64 {
        self.sim.frames
    }
}
