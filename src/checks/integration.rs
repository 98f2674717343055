use crate::app::case::{Outcome, TestPriority};
use crate::app::error::ConfigurationError;
use crate::app::hooks::{CheckResult, Context};
use crate::app::{Framework, SuiteId};
use crate::checks::{micros, BenchSettings};
use crate::device::hal::Direction;

pub const SUITE: &str = "Integration Tests";

pub fn register(framework: &mut Framework, bench: &BenchSettings) -> Result<SuiteId, ConfigurationError> {
    let suite = framework.add_suite(SUITE, 3)?;
    let settle = bench.integration_settle;
    let _ = framework.add_check(
        suite,
        "System_Integration",
        "Test all peripherals working together",
        TestPriority::Critical,
        move |ctx: &mut Context<'_>| -> CheckResult { system(ctx, settle) },
    )?;
    let iterations = bench.benchmark_iterations;
    let budget = micros(bench.benchmark_budget);
    let _ = framework.add_check(
        suite,
        "Performance_Benchmark",
        "Measure system performance metrics",
        TestPriority::Medium,
        move |ctx: &mut Context<'_>| -> CheckResult { benchmark(ctx, iterations, budget) },
    )?;
    Ok(suite)
}

/// Brings every peripheral up, toggles a pin around a timed wait and samples the ADC.
fn system(ctx: &mut Context<'_>, settle: std::time::Duration) -> CheckResult {
    let mut hal = ctx.hal();
    hal.system_init()?;
    hal.gpio_set_direction(0, Direction::Output)?;
    hal.gpio_write(0, true)?;
    let start = hal.timer_count()?;

    ctx.delay(settle);

    let mut hal = ctx.hal();
    let end = hal.timer_count()?;
    let sample = hal.adc_read_channel(0)?;
    hal.gpio_write(0, false)?;

    // A stalled conversion already surfaced as a device error above.
    debug!("Integration ADC sample {}", sample);
    let ok = end != start;
    Ok(Outcome::judge(
        ok,
        if ok { 1.0 } else { 0.0 },
        1.0,
        0.0,
        "System integration test failed: timer did not advance",
    ))
}

/// Times `iterations` GPIO toggles on the device timer, in microseconds.
/// The run must finish strictly inside `budget`.
fn benchmark(ctx: &mut Context<'_>, iterations: u32, budget: f64) -> CheckResult {
    let mut hal = ctx.hal();
    let start = hal.timer_count()?;
    for i in 0..iterations {
        hal.gpio_write(0, i % 2 == 1)?;
    }
    let end = hal.timer_count()?;
    let elapsed = f64::from(end.wrapping_sub(start));
    if ctx.verbose() {
        debug!("{} GPIO toggles took {} us", iterations, elapsed);
    }
    Ok(Outcome::judge(
        elapsed < budget,
        elapsed,
        budget,
        0.0,
        "Performance below expectations",
    ))
}
