use crate::app::case::{Outcome, TestPriority};
use crate::app::error::ConfigurationError;
use crate::app::hooks::{CheckResult, Context};
use crate::app::{Framework, SuiteId};
use crate::device::hal::Direction;

pub const SUITE: &str = "GPIO Validation";
const PATTERN_PINS: u32 = 3;

pub fn register(framework: &mut Framework) -> Result<SuiteId, ConfigurationError> {
    let suite = framework.add_suite(SUITE, 10)?;
    let _ = framework.add_check(
        suite,
        "GPIO_Direction_Control",
        "Verify GPIO direction register control",
        TestPriority::High,
        direction_control,
    )?;
    let _ = framework.add_check(
        suite,
        "GPIO_Data_WriteRead",
        "Verify GPIO data write and read operations",
        TestPriority::High,
        data_write_read,
    )?;
    let _ = framework.add_check(
        suite,
        "GPIO_Pattern_Test",
        "Test GPIO with various bit patterns",
        TestPriority::Medium,
        pattern,
    )?;
    Ok(suite)
}

fn direction_control(ctx: &mut Context<'_>) -> CheckResult {
    let mut hal = ctx.hal();
    hal.gpio_init()?;
    hal.gpio_set_direction(0, Direction::Output)?;
    hal.gpio_set_direction(1, Direction::Input)?;
    let pin0 = hal.gpio_direction(0)?;
    let pin1 = hal.gpio_direction(1)?;
    let ok = pin0 == Direction::Output && pin1 == Direction::Input;
    Ok(Outcome::judge(
        ok,
        if ok { 1.0 } else { 0.0 },
        1.0,
        0.0,
        format!(
            "GPIO direction control failed: pin 0 is {:?}, pin 1 is {:?}",
            pin0, pin1
        ),
    ))
}

fn data_write_read(ctx: &mut Context<'_>) -> CheckResult {
    let mut hal = ctx.hal();
    hal.gpio_set_direction(0, Direction::Output)?;
    hal.gpio_write(0, true)?;
    let high = hal.gpio_read(0)?;
    Ok(Outcome::judge(
        high,
        if high { 1.0 } else { 0.0 },
        1.0,
        0.0,
        "GPIO write/read mismatch",
    ))
}

/// Walks every 3-bit value over pins 0..3 and reads each pin back.
fn pattern(ctx: &mut Context<'_>) -> CheckResult {
    let patterns = 1u32 << PATTERN_PINS;
    let mut hal = ctx.hal();
    for pin in 0..PATTERN_PINS {
        hal.gpio_set_direction(pin, Direction::Output)?;
    }
    for step in 0..patterns {
        for pin in 0..PATTERN_PINS {
            hal.gpio_write(pin, step & (1 << pin) != 0)?;
        }
        for pin in 0..PATTERN_PINS {
            let expected = step & (1 << pin) != 0;
            if hal.gpio_read(pin)? != expected {
                return Ok(Outcome::failed(
                    f64::from(step),
                    f64::from(patterns),
                    0.0,
                    format!("GPIO pattern verification failed at step {} on pin {}", step, pin),
                ));
            }
        }
    }
    Ok(Outcome::passed(f64::from(patterns), f64::from(patterns), 0.0))
}
