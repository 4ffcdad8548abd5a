// Full conformance suite run against the echo device. Kernel state is
// process-global, so this file holds exactly one session.

use echotb::prelude::*;
use echotb::scenarios::*;

fn suite() -> Tests {
    let mut tests = Tests::new();
    tests.push(Test::new(
        "register_round_trip".to_string(),
        |dut| register_round_trip(dut).boxed(),
    ));
    tests.push(Test::new(
        "register_round_trip_stream".to_string(),
        |dut| register_round_trip_stream(dut).boxed(),
    ));
    tests.push(Test::new(
        "micro_port_round_trip".to_string(),
        |dut| micro_port_round_trip(dut).boxed(),
    ));
    tests.push(Test::new(
        "round_trip_without_stalls".to_string(),
        |dut| round_trip_without_stalls(dut).boxed(),
    ));
    tests.push(Test::new(
        "ack_idle_in_reset".to_string(),
        |dut| ack_idle_in_reset(dut).boxed(),
    ));
    tests.push(Test::new(
        "ack_idle_no_clock".to_string(),
        |dut| ack_idle_no_clock(dut).boxed(),
    ));
    tests
}

#[test]
fn full_suite_passes() {
    let summary = sim::run_session(DeviceConfig::default(), suite());

    let failures: Vec<String> = summary
        .scenarios()
        .iter()
        .filter(|r| r.outcome != Outcome::Passed)
        .map(|r| format!("{}: {}", r.name, r.message))
        .collect();
    assert!(failures.is_empty(), "failed scenarios: {:?}", failures);
    assert_eq!(summary.scenarios().len(), 6);

    // 2^8 addresses, one beat each
    let single = summary.scenario("register_round_trip").unwrap();
    assert_eq!(single.message, "256 round trips matched");

    // stall injection must not change the data, only the latency
    let no_stalls = summary.scenario("round_trip_without_stalls").unwrap();
    assert_eq!(no_stalls.message, single.message);
    assert!(no_stalls.sim_time_ns < single.sim_time_ns);

    // 256 / BUS_WIDTH element-wise matches, in order
    let stream = summary.scenario("register_round_trip_stream").unwrap();
    assert!(
        stream.message.contains("expected=64, received=64, matched=64, errors=0"),
        "unexpected scoreboard stats: {}",
        stream.message
    );

    let micro = summary.scenario("micro_port_round_trip").unwrap();
    assert_eq!(micro.message, "32 micro-port round trips matched");
}
