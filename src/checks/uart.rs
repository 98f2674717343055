use crate::app::case::{Outcome, TestPriority};
use crate::app::error::ConfigurationError;
use crate::app::hooks::{CheckResult, Context};
use crate::app::{Framework, SuiteId};
use crate::checks::BenchSettings;
use crate::device::Register;

pub const SUITE: &str = "UART Validation";
pub const MESSAGE: &str = "FPGA Validation Test\n";

pub fn register(framework: &mut Framework, bench: &BenchSettings) -> Result<SuiteId, ConfigurationError> {
    let suite = framework.add_suite(SUITE, 5)?;
    let baudrate = bench.uart_baudrate;
    let _ = framework.add_check(
        suite,
        "UART_Transmit",
        "Verify UART transmission functionality",
        TestPriority::Medium,
        move |ctx: &mut Context<'_>| -> CheckResult {
            let mut hal = ctx.hal();
            hal.uart_init(baudrate)?;
            let sent = hal.uart_send(MESSAGE)?;
            let last = ctx.device().read(Register::UartData)? & 0xFF;
            let expected = MESSAGE.len();
            let ok = sent == expected && MESSAGE.bytes().last().map(u32::from) == Some(last);
            Ok(Outcome::judge(
                ok,
                sent as f64,
                expected as f64,
                0.0,
                format!("UART transmitted {} of {} bytes", sent, expected),
            ))
        },
    )?;
    Ok(suite)
}
