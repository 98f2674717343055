use crate::app::assert::{Assertable, FrequencyBand, Tolerance};
use crate::app::case::{Outcome, TestPriority};
use crate::app::error::ConfigurationError;
use crate::app::hooks::{CheckResult, Context};
use crate::app::{Framework, SuiteId};
use crate::checks::{micros, BenchSettings};
use crate::device::Register;
use std::time::Duration;

pub const SUITE: &str = "Timer Validation";
/// Ticks a freshly started timer may already show when first read.
const STARTUP_TICKS: f64 = 1000.0;
const TIMER_BAND: FrequencyBand = FrequencyBand {
    expected_hz: 1_000_000,
    tolerance_hz: 50_000,
};

pub fn register(framework: &mut Framework, bench: &BenchSettings) -> Result<SuiteId, ConfigurationError> {
    let suite = framework.add_suite(SUITE, 5)?;
    let _ = framework.add_check(
        suite,
        "Timer_Initialization",
        "Verify timer initialization and basic counting",
        TestPriority::High,
        |ctx: &mut Context<'_>| -> CheckResult {
            let mut hal = ctx.hal();
            hal.timer_init()?;
            let count = hal.timer_count()?;
            Ok(Tolerance::new(0.0, STARTUP_TICKS).judge(f64::from(count), "Timer initialization failed"))
        },
    )?;
    let settle = bench.timer_settle;
    let _ = framework.add_check(
        suite,
        "Timer_Counting",
        "Verify timer counting accuracy",
        TestPriority::High,
        move |ctx: &mut Context<'_>| -> CheckResult {
            let start = ctx.hal().timer_count()?;
            ctx.delay(settle);
            let end = ctx.hal().timer_count()?;
            let elapsed = f64::from(end.wrapping_sub(start));
            let expected = micros(settle);
            Ok(Tolerance::new(expected, expected / 2.0).judge(elapsed, "Timer counting out of range"))
        },
    )?;
    let _ = framework.add_check(
        suite,
        "Timer_Frequency",
        "Verify timer tick rate against the bench clock",
        TestPriority::Medium,
        move |ctx: &mut Context<'_>| -> CheckResult { frequency(ctx, settle) },
    )?;
    Ok(suite)
}

/// Arms the compare register for the window, then derives the tick rate from
/// counts taken against the bench clock.
fn frequency(ctx: &mut Context<'_>, window: Duration) -> CheckResult {
    let window_ticks = micros(window) as u32;
    ctx.hal().timer_set_compare(window_ticks)?;
    let armed = ctx.device().read(Register::TimerCompare)?;
    if armed != window_ticks {
        return Ok(Outcome::failed(
            f64::from(armed),
            f64::from(window_ticks),
            0.0,
            "Timer compare register readback mismatch",
        ));
    }

    let (started, first) = (ctx.now(), ctx.hal().timer_count()?);
    ctx.delay(window);
    let (ended, last) = (ctx.now(), ctx.hal().timer_count()?);

    let seconds = ended.checked_sub(started).unwrap_or_default().as_secs_f64();
    if seconds <= 0.0 {
        return Ok(Outcome::error("Bench clock did not advance over the timer window"));
    }
    let hz = (f64::from(last.wrapping_sub(first)) / seconds).round() as u32;
    Ok(Outcome::judge(
        TIMER_BAND.assert(&hz),
        f64::from(hz),
        f64::from(TIMER_BAND.expected_hz),
        f64::from(TIMER_BAND.tolerance_hz),
        "Timer frequency out of range",
    ))
}
