// Driver guard rails: the bounded acknowledgment wait and the protocol
// checks that reject malformed requests before they reach the bus. One
// session per process, so everything runs in a single suite.

use echotb::prelude::*;

async fn read_in_reset_times_out(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), 2);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    reset.assert_reset();
    utils::clock_cycles(dut.c("clk"), 2).await;

    let master = BusMaster::attach(dut, "s_wb").with_timeout(8);
    match master.read(0).await {
        Err(TbError::Timeout { cycles }) => {
            check_eq!(cycles, 8u32, "timeout cycle bound");
            Ok(Val::None)
        }
        Err(e) => Err(e),
        Ok(v) => Err(TbError::Mismatch {
            context: "acknowledgment while in reset".to_string(),
            expected: 0,
            observed: v,
        }),
    }
}

async fn burst_length_mismatch_rejected(dut: SimObject) -> TestResult {
    let master = BusMaster::attach(dut, "s_wb");
    match master.write_burst(&[0, 4], &[1]).await {
        Err(TbError::Protocol(msg)) if msg.contains("length mismatch") => Ok(Val::None),
        Err(e) => Err(e),
        Ok(()) => Err(TbError::Protocol(
            "mismatched burst lengths were accepted".to_string(),
        )),
    }
}

async fn oversized_request_rejected(dut: SimObject) -> TestResult {
    let master = MicroMaster::attach(dut, "up");
    let span = 1u64 << dut.c("ADDR_WIDTH").u64();
    match master.write(span, 0).await {
        Err(TbError::Protocol(_)) => {}
        other => {
            return Err(TbError::Protocol(format!(
                "oversized address was not rejected: {:?}",
                other
            )))
        }
    }
    let too_wide = 1u64 << dut.c("DATA_WIDTH").u64();
    match master.write(0, too_wide).await {
        Err(TbError::Protocol(_)) => Ok(Val::None),
        other => Err(TbError::Protocol(format!(
            "oversized data was not rejected: {:?}",
            other
        ))),
    }
}

#[test]
fn driver_guards_hold() {
    let mut tests = Tests::new();
    tests.push(Test::new(
        "read_in_reset_times_out".to_string(),
        |dut| read_in_reset_times_out(dut).boxed(),
    ));
    tests.push(Test::new(
        "burst_length_mismatch_rejected".to_string(),
        |dut| burst_length_mismatch_rejected(dut).boxed(),
    ));
    tests.push(Test::new(
        "oversized_request_rejected".to_string(),
        |dut| oversized_request_rejected(dut).boxed(),
    ));

    let summary = sim::run_session(DeviceConfig::default(), tests);
    let failures: Vec<String> = summary
        .scenarios()
        .iter()
        .filter(|r| r.outcome != Outcome::Passed)
        .map(|r| format!("{}: {}", r.name, r.message))
        .collect();
    assert!(failures.is_empty(), "failed scenarios: {:?}", failures);
}
