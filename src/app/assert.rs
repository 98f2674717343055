use crate::app::case::Outcome;

pub trait Assertable<T> {
    fn assert(&self, measured: &T) -> bool;
}

/// `expected ± tolerance`, both ends inclusive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub expected: f64,
    pub tolerance: f64,
}

impl Tolerance {
    pub fn new(expected: f64, tolerance: f64) -> Self {
        Self {
            expected,
            tolerance,
        }
    }

    pub fn exact(expected: f64) -> Self {
        Self::new(expected, 0.0)
    }

    /// Passed when `measured` is inside the band, Failed with `message` otherwise.
    pub fn judge(&self, measured: f64, message: impl Into<String>) -> Outcome {
        let ok = self.assert(&measured);
        trace!(
            "Check {} within {} ± {}: {}",
            measured,
            self.expected,
            self.tolerance,
            ok
        );
        Outcome::judge(ok, measured, self.expected, self.tolerance, message)
    }
}

impl Assertable<f64> for Tolerance {
    fn assert(&self, measured: &f64) -> bool {
        within_tolerance(*measured, self.expected, self.tolerance)
    }
}

/// Integer frequency band in hertz.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrequencyBand {
    pub expected_hz: u32,
    pub tolerance_hz: u32,
}

impl Assertable<u32> for FrequencyBand {
    fn assert(&self, measured_hz: &u32) -> bool {
        validate_frequency(*measured_hz, self.expected_hz, self.tolerance_hz)
    }
}

pub fn within_tolerance(measured: f64, expected: f64, tolerance: f64) -> bool {
    (measured - expected).abs() <= tolerance
}

pub fn validate_frequency(measured_hz: u32, expected_hz: u32, tolerance_hz: u32) -> bool {
    let diff = if measured_hz > expected_hz {
        measured_hz - expected_hz
    } else {
        expected_hz - measured_hz
    };
    diff <= tolerance_hz
}
