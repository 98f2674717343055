use crate::device::hal::{ADC_CHANNELS, ADC_MAX};
use crate::device::{Device, DeviceError, Peripheral, Register, FPGA_BASE_ADDR};
use crate::time::{Clock, MonotonicClock};
use derivative::*;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use std::time::Duration;

/// 32-bit words covering the four peripheral blocks.
const REGISTER_WORDS: usize = 0x4000 >> 2;
const DEFAULT_ADC_SAMPLE: u16 = 2048;

/// Register file standing in for the FPGA when no hardware is attached.
///
/// The timer counts microseconds of the shared clock once enabled, ADC
/// conversions finish instantly, and the UART is always ready to transmit.
#[derive(Derivative)]
#[derivative(Debug)]
pub struct SimulatedDevice {
    #[derivative(Debug = "ignore")]
    registers: Vec<u32>,
    clock: Rc<dyn Clock>,
    timer_started: Option<Duration>,
    adc_samples: [u16; ADC_CHANNELS as usize],
    stuck_pins: BTreeMap<u32, bool>,
    transmitted: Vec<u8>,
    initialized: HashSet<Peripheral>,
}

impl SimulatedDevice {
    pub fn new(clock: Rc<dyn Clock>) -> Self {
        Self {
            registers: vec![0; REGISTER_WORDS],
            clock,
            timer_started: None,
            adc_samples: [DEFAULT_ADC_SAMPLE; ADC_CHANNELS as usize],
            stuck_pins: BTreeMap::new(),
            transmitted: Vec::new(),
            initialized: HashSet::new(),
        }
    }

    /// Sets the raw sample the given ADC channel converts to, clamped to 12 bits.
    pub fn with_adc_sample(mut self, channel: u32, raw: u16) -> Self {
        if let Some(sample) = self.adc_samples.get_mut(channel as usize) {
            *sample = raw.min(ADC_MAX);
        }
        self
    }

    /// Forces a GPIO pin to read back `level` whatever gets written to it.
    pub fn with_stuck_pin(mut self, pin: u32, level: bool) -> Self {
        let _ = self.stuck_pins.insert(pin, level);
        self
    }

    /// Bytes written to the UART data register so far.
    pub fn transmitted(&self) -> &[u8] {
        &self.transmitted
    }

    pub fn is_initialized(&self, peripheral: Peripheral) -> bool {
        self.initialized.contains(&peripheral)
    }

    fn index(register: Register) -> usize {
        ((register.address() - FPGA_BASE_ADDR) >> 2) as usize
    }

    fn load(&self, register: Register) -> u32 {
        self.registers[Self::index(register)]
    }

    fn store(&mut self, register: Register, value: u32) {
        self.registers[Self::index(register)] = value;
    }

    fn timer_count(&self) -> u32 {
        let base = self.load(Register::TimerCount);
        match self.timer_started {
            Some(started) => {
                let elapsed = self.clock.now().checked_sub(started).unwrap_or_default();
                base.wrapping_add(elapsed.as_micros() as u32)
            }
            None => base,
        }
    }

    fn apply_stuck_pins(&self, value: u32) -> u32 {
        self.stuck_pins.iter().fold(value, |acc, (pin, level)| {
            let mask = 1u32.checked_shl(*pin).unwrap_or(0);
            if *level {
                acc | mask
            } else {
                acc & !mask
            }
        })
    }
}

impl Default for SimulatedDevice {
    fn default() -> Self {
        Self::new(Rc::new(MonotonicClock::new()))
    }
}

impl Device for SimulatedDevice {
    fn init(&mut self, peripheral: Peripheral) -> Result<(), DeviceError> {
        debug!("Simulated {} initialized", peripheral);
        let _ = self.initialized.insert(peripheral);
        Ok(())
    }

    fn write(&mut self, register: Register, value: u32) -> Result<(), DeviceError> {
        trace!("write {} <- {:#x}", register, value);
        match register {
            Register::TimerCount => {
                // Restart counting from the written value.
                self.store(register, value);
                if self.timer_started.is_some() {
                    self.timer_started = Some(self.clock.now());
                }
            }
            Register::TimerControl => {
                let enable = value & 0x1 != 0;
                match (enable, self.timer_started) {
                    (true, None) => self.timer_started = Some(self.clock.now()),
                    (false, Some(_)) => {
                        let frozen = self.timer_count();
                        self.store(Register::TimerCount, frozen);
                        self.timer_started = None;
                    }
                    _ => {}
                }
                self.store(register, value);
            }
            Register::AdcControl => {
                self.store(register, value);
                if value & 0x1 != 0 {
                    let channel = ((value >> 4) & 0x7) as usize;
                    let sample = self.adc_samples[channel];
                    self.store(Register::AdcData, u32::from(sample));
                    self.store(Register::AdcStatus, 0x1);
                }
            }
            Register::UartData => {
                self.transmitted.push((value & 0xFF) as u8);
                self.store(register, value);
            }
            Register::GpioData
            | Register::GpioDirection
            | Register::GpioInterrupt
            | Register::UartStatus
            | Register::UartControl
            | Register::TimerCompare
            | Register::AdcData
            | Register::AdcStatus => self.store(register, value),
        }
        Ok(())
    }

    fn read(&mut self, register: Register) -> Result<u32, DeviceError> {
        let value = match register {
            Register::TimerCount => self.timer_count(),
            Register::UartStatus => 0x1,
            Register::GpioData => self.apply_stuck_pins(self.load(register)),
            Register::GpioDirection
            | Register::GpioInterrupt
            | Register::UartData
            | Register::UartControl
            | Register::TimerCompare
            | Register::TimerControl
            | Register::AdcData
            | Register::AdcControl
            | Register::AdcStatus => self.load(register),
        };
        trace!("read {} -> {:#x}", register, value);
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::hal::Hal;
    use crate::time::ManualClock;

    fn device() -> (SimulatedDevice, ManualClock) {
        let clock = ManualClock::new();
        (SimulatedDevice::new(Rc::new(clock.clone())), clock)
    }

    #[test]
    fn test_timer_counts_microseconds_once_enabled() {
        let (mut device, clock) = device();
        clock.advance(Duration::from_millis(3));
        assert_eq!(device.read(Register::TimerCount), Ok(0));

        Hal::new(&mut device).timer_init().unwrap();
        clock.advance(Duration::from_millis(100));

        assert_eq!(device.read(Register::TimerCount), Ok(100_000));
    }

    #[test]
    fn test_disabling_timer_freezes_count() {
        let (mut device, clock) = device();
        Hal::new(&mut device).timer_init().unwrap();
        clock.advance(Duration::from_micros(250));
        device.write(Register::TimerControl, 0).unwrap();
        clock.advance(Duration::from_millis(5));

        assert_eq!(device.read(Register::TimerCount), Ok(250));
    }

    #[test]
    fn test_adc_returns_configured_sample() {
        let (device, _) = device();
        let mut device = device.with_adc_sample(2, 1000).with_adc_sample(3, 9999);
        let mut hal = Hal::new(&mut device);

        assert_eq!(hal.adc_read_channel(2), Ok(1000));
        assert_eq!(hal.adc_read_channel(3), Ok(ADC_MAX));
        assert_eq!(hal.adc_read_channel(0), Ok(DEFAULT_ADC_SAMPLE));
    }

    #[test]
    fn test_uart_captures_transmitted_bytes() {
        let (mut device, _) = device();
        let mut hal = Hal::new(&mut device);
        hal.uart_init(9600).unwrap();

        assert_eq!(hal.uart_send("ok\n"), Ok(3));
        assert_eq!(device.transmitted(), b"ok\n");
        assert!(device.is_initialized(Peripheral::Uart));
    }

    #[test]
    fn test_stuck_pin_ignores_writes() {
        let (device, _) = device();
        let mut device = device.with_stuck_pin(1, false);
        let mut hal = Hal::new(&mut device);
        hal.gpio_write(1, true).unwrap();
        hal.gpio_write(0, true).unwrap();

        assert_eq!(hal.gpio_read(1), Ok(false));
        assert_eq!(hal.gpio_read(0), Ok(true));
    }
}
