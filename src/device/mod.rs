//! Access to the device under test.
//!
//! The framework never talks to hardware itself. Checks reach the device
//! through the [`Device`] trait, usually via the typed helpers in [`hal`].
//! Whether registers are memory mapped silicon or the [`simulated`] register
//! file makes no difference to the checks.

pub mod hal;
pub mod simulated;

use std::fmt;
use thiserror::Error;

pub const FPGA_BASE_ADDR: u32 = 0x4000_0000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Peripheral {
    Gpio,
    Uart,
    Timer,
    Adc,
}

impl Peripheral {
    pub const ALL: [Peripheral; 4] = [
        Peripheral::Gpio,
        Peripheral::Uart,
        Peripheral::Timer,
        Peripheral::Adc,
    ];

    pub fn base_address(self) -> u32 {
        let offset = match self {
            Peripheral::Gpio => 0x0000,
            Peripheral::Uart => 0x1000,
            Peripheral::Timer => 0x2000,
            Peripheral::Adc => 0x3000,
        };
        FPGA_BASE_ADDR + offset
    }
}

impl fmt::Display for Peripheral {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Peripheral::Gpio => "GPIO",
            Peripheral::Uart => "UART",
            Peripheral::Timer => "Timer",
            Peripheral::Adc => "ADC",
        };
        f.write_str(name)
    }
}

/// A named 32-bit register of one of the peripherals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    GpioData,
    GpioDirection,
    GpioInterrupt,
    UartData,
    UartStatus,
    UartControl,
    TimerCount,
    TimerCompare,
    TimerControl,
    AdcData,
    AdcControl,
    AdcStatus,
}

impl Register {
    pub fn peripheral(self) -> Peripheral {
        match self {
            Register::GpioData | Register::GpioDirection | Register::GpioInterrupt => {
                Peripheral::Gpio
            }
            Register::UartData | Register::UartStatus | Register::UartControl => Peripheral::Uart,
            Register::TimerCount | Register::TimerCompare | Register::TimerControl => {
                Peripheral::Timer
            }
            Register::AdcData | Register::AdcControl | Register::AdcStatus => Peripheral::Adc,
        }
    }

    pub fn offset(self) -> u32 {
        match self {
            Register::GpioData | Register::UartData | Register::TimerCount | Register::AdcData => 0x00,
            Register::GpioDirection
            | Register::UartStatus
            | Register::TimerCompare
            | Register::AdcControl => 0x04,
            Register::GpioInterrupt
            | Register::UartControl
            | Register::TimerControl
            | Register::AdcStatus => 0x08,
        }
    }

    /// Memory mapped address of the register.
    pub fn address(self) -> u32 {
        self.peripheral().base_address() + self.offset()
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}@{:#010x}", self, self.address())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("GPIO pin {0} out of range (0..32)")]
    InvalidPin(u32),
    #[error("ADC channel {0} out of range (0..8)")]
    InvalidChannel(u32),
    #[error("{register} not ready after {polls} polls")]
    Timeout { register: Register, polls: u32 },
}

/// Synchronous register level access to the device under test.
pub trait Device: fmt::Debug {
    fn init(&mut self, peripheral: Peripheral) -> Result<(), DeviceError>;
    fn write(&mut self, register: Register, value: u32) -> Result<(), DeviceError>;
    fn read(&mut self, register: Register) -> Result<u32, DeviceError>;
}
