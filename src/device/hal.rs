use crate::device::{Device, DeviceError, Peripheral, Register};

pub const GPIO_PINS: u32 = 32;
pub const ADC_CHANNELS: u32 = 8;
pub const ADC_MAX: u16 = 4095;
pub const DEFAULT_BAUDRATE: u32 = 115_200;
/// Upper bound on status register polls before a peripheral is declared stuck.
pub const MAX_POLLS: u32 = 10_000;

const ENABLE: u32 = 0x1;
const READY: u32 = 0x1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Input,
    Output,
}

/// Typed helpers over a [`Device`], one per hardware operation checks use.
#[derive(Debug)]
pub struct Hal<'a> {
    device: &'a mut dyn Device,
}

impl<'a> Hal<'a> {
    pub fn new(device: &'a mut dyn Device) -> Self {
        Self { device }
    }

    pub fn system_init(&mut self) -> Result<(), DeviceError> {
        debug!("Initializing HAL");
        self.gpio_init()?;
        self.uart_init(DEFAULT_BAUDRATE)?;
        self.timer_init()?;
        self.adc_init()
    }

    pub fn gpio_init(&mut self) -> Result<(), DeviceError> {
        self.device.init(Peripheral::Gpio)?;
        self.device.write(Register::GpioDirection, 0)?;
        self.device.write(Register::GpioData, 0)
    }

    pub fn gpio_set_direction(&mut self, pin: u32, direction: Direction) -> Result<(), DeviceError> {
        let mask = pin_mask(pin)?;
        let current = self.device.read(Register::GpioDirection)?;
        let value = match direction {
            Direction::Output => current | mask,
            Direction::Input => current & !mask,
        };
        trace!("GPIO pin {} set as {:?}", pin, direction);
        self.device.write(Register::GpioDirection, value)
    }

    pub fn gpio_direction(&mut self, pin: u32) -> Result<Direction, DeviceError> {
        let mask = pin_mask(pin)?;
        let value = self.device.read(Register::GpioDirection)?;
        Ok(if value & mask != 0 {
            Direction::Output
        } else {
            Direction::Input
        })
    }

    pub fn gpio_write(&mut self, pin: u32, high: bool) -> Result<(), DeviceError> {
        let mask = pin_mask(pin)?;
        let current = self.device.read(Register::GpioData)?;
        let value = if high { current | mask } else { current & !mask };
        trace!("GPIO pin {} set to {}", pin, if high { "HIGH" } else { "LOW" });
        self.device.write(Register::GpioData, value)
    }

    pub fn gpio_read(&mut self, pin: u32) -> Result<bool, DeviceError> {
        let mask = pin_mask(pin)?;
        Ok(self.device.read(Register::GpioData)? & mask != 0)
    }

    pub fn uart_init(&mut self, baudrate: u32) -> Result<(), DeviceError> {
        self.device.init(Peripheral::Uart)?;
        debug!("UART initialized at {} baud", baudrate);
        self.device.write(Register::UartControl, ENABLE)
    }

    pub fn uart_send_byte(&mut self, byte: u8) -> Result<(), DeviceError> {
        self.poll_ready(Register::UartStatus)?;
        self.device.write(Register::UartData, u32::from(byte))
    }

    /// Sends `text` and returns how many bytes the UART accepted. A transmitter
    /// that stalls part way stops the send short; one that never gets ready
    /// is a `Timeout`.
    pub fn uart_send(&mut self, text: &str) -> Result<usize, DeviceError> {
        for (sent, byte) in text.bytes().enumerate() {
            match self.uart_send_byte(byte) {
                Ok(()) => {}
                Err(DeviceError::Timeout { register, polls }) if sent > 0 => {
                    warn!("{} not ready after {} polls, {} of {} bytes sent", register, polls, sent, text.len());
                    return Ok(sent);
                }
                Err(e) => return Err(e),
            }
        }
        Ok(text.len())
    }

    pub fn timer_init(&mut self) -> Result<(), DeviceError> {
        self.device.init(Peripheral::Timer)?;
        self.device.write(Register::TimerCount, 0)?;
        self.device.write(Register::TimerControl, ENABLE)
    }

    pub fn timer_count(&mut self) -> Result<u32, DeviceError> {
        self.device.read(Register::TimerCount)
    }

    pub fn timer_set_compare(&mut self, value: u32) -> Result<(), DeviceError> {
        self.device.write(Register::TimerCompare, value)
    }

    pub fn adc_init(&mut self) -> Result<(), DeviceError> {
        self.device.init(Peripheral::Adc)?;
        self.device.write(Register::AdcControl, ENABLE)
    }

    /// Starts a conversion on `channel` and waits for the raw 12-bit sample.
    pub fn adc_read_channel(&mut self, channel: u32) -> Result<u16, DeviceError> {
        if channel >= ADC_CHANNELS {
            return Err(DeviceError::InvalidChannel(channel));
        }
        self.device.write(Register::AdcControl, ENABLE | (channel << 4))?;
        self.poll_ready(Register::AdcStatus)?;
        let raw = self.device.read(Register::AdcData)?;
        Ok((raw & u32::from(ADC_MAX)) as u16)
    }

    fn poll_ready(&mut self, status: Register) -> Result<(), DeviceError> {
        for _ in 0..MAX_POLLS {
            if self.device.read(status)? & READY != 0 {
                return Ok(());
            }
        }
        Err(DeviceError::Timeout {
            register: status,
            polls: MAX_POLLS,
        })
    }
}

fn pin_mask(pin: u32) -> Result<u32, DeviceError> {
    if pin >= GPIO_PINS {
        return Err(DeviceError::InvalidPin(pin));
    }
    Ok(1 << pin)
}

/// Raw ADC sample to volts for a 12-bit converter.
pub fn adc_to_volts(raw: u16, reference: f64) -> f64 {
    f64::from(raw) * reference / f64::from(ADC_MAX)
}
