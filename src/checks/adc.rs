use crate::app::assert::Tolerance;
use crate::app::case::TestPriority;
use crate::app::error::ConfigurationError;
use crate::app::hooks::{Check, CheckResult, Context};
use crate::app::{Framework, SuiteId};
use crate::checks::BenchSettings;
use crate::device::hal::{adc_to_volts, ADC_CHANNELS};

pub const SUITE: &str = "ADC Validation";

/// Converts one channel and expects a reading anywhere in `0..=reference` volts.
#[derive(Debug, Clone, Copy)]
pub struct ChannelRange {
    pub channel: u32,
    pub reference: f64,
}

impl Check for ChannelRange {
    fn execute(&mut self, ctx: &mut Context<'_>) -> CheckResult {
        let mut hal = ctx.hal();
        hal.adc_init()?;
        let raw = hal.adc_read_channel(self.channel)?;
        let volts = adc_to_volts(raw, self.reference);
        if ctx.verbose() {
            debug!("ADC channel {}: raw {} -> {:.3} V", self.channel, raw, volts);
        }
        let half = self.reference / 2.0;
        Ok(Tolerance::new(half, half).judge(volts, "ADC voltage out of range"))
    }
}

pub fn register(framework: &mut Framework, bench: &BenchSettings) -> Result<SuiteId, ConfigurationError> {
    let suite = framework.add_suite(SUITE, ADC_CHANNELS as usize)?;
    for channel in 0..bench.adc_channels {
        let _ = framework.add_check(
            suite,
            format!("ADC_Channel_{}", channel),
            format!("Verify ADC channel {} readings", channel),
            TestPriority::Medium,
            ChannelRange {
                channel,
                reference: bench.adc_reference,
            },
        )?;
    }
    Ok(suite)
}
