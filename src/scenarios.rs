//! The conformance scenarios. Each one brings up its own clock and reset
//! against the shared device, runs its stimulus and returns a result; a
//! scenario's pending tasks and triggers are torn down when it finishes, so
//! no state leaks into the next one.

use crate::check_eq;
use crate::prelude::*;

pub const CLK_HALF_PERIOD_NS: u64 = 2;
pub const RESET_HOLD_NS: u64 = 20;
pub const STALL_SEED: u64 = 42;

/// Write then read back every address in the register space, one beat at a
/// time, with stall injection enabled.
pub async fn register_round_trip(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    let master = BusMaster::attach(dut, "s_wb").with_stalls(IdleInjector::with_seed(STALL_SEED));

    reset.reset_and_release(RESET_HOLD_NS, "ns").await;

    let span = 1u64 << dut.c("ADDR_WIDTH").u64();
    for addr in 0..span {
        master.write(addr, addr).await?;
        dut.c("clk").rising_edge().await;
        let data = master.read(addr).await?;
        check_eq!(data, addr, format!("readback at address {:#x}", addr));
    }
    utils::clock_cycles(dut.c("clk"), 1).await;
    Ok(Val::String(format!("{} round trips matched", span)))
}

/// Stream a burst across the register space, stepped by the device's bus
/// width, then read the same burst back in one call.
pub async fn register_round_trip_stream(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    let master = BusMaster::attach(dut, "s_wb").with_stalls(IdleInjector::with_seed(STALL_SEED));

    reset.reset_and_release(RESET_HOLD_NS, "ns").await;

    let span = 1u64 << dut.c("ADDR_WIDTH").u64();
    let step = dut.c("BUS_WIDTH").u64().max(1);
    let addrs: Vec<u64> = (0..span).step_by(step as usize).collect();

    master.write_burst(&addrs, &addrs).await?;
    let data = master.read_burst(&addrs).await?;

    let scoreboard = Scoreboard::new();
    for addr in &addrs {
        scoreboard.add_exp(*addr);
    }
    for word in &data {
        scoreboard.add_recv(*word);
    }
    utils::clock_cycles(dut.c("clk"), 1).await;
    scoreboard.result()
}

/// Round trips over the secondary control interface; both interfaces must
/// show the same echo behavior.
pub async fn micro_port_round_trip(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    let master = MicroMaster::attach(dut, "up").with_stalls(IdleInjector::with_seed(STALL_SEED));

    reset.reset_and_release(RESET_HOLD_NS, "ns").await;

    let span = 1u64 << dut.c("ADDR_WIDTH").u64();
    let mut beats = 0u64;
    for addr in (0..span).step_by(8) {
        let value = span - 1 - addr;
        master.write(addr, value).await?;
        let data = master.read(addr).await?;
        check_eq!(data, value, format!("micro-port readback at address {:#x}", addr));
        beats += 1;
    }
    utils::clock_cycles(dut.c("clk"), 1).await;
    Ok(Val::String(format!("{} micro-port round trips matched", beats)))
}

/// Same traffic as `register_round_trip` with injection disabled: stalls may
/// change latency only, never the data coming back.
pub async fn round_trip_without_stalls(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    let master = BusMaster::attach(dut, "s_wb");

    reset.reset_and_release(RESET_HOLD_NS, "ns").await;

    let span = 1u64 << dut.c("ADDR_WIDTH").u64();
    for addr in 0..span {
        master.write(addr, addr).await?;
        dut.c("clk").rising_edge().await;
        let data = master.read(addr).await?;
        check_eq!(data, addr, format!("readback at address {:#x}", addr));
    }
    utils::clock_cycles(dut.c("clk"), 1).await;
    Ok(Val::String(format!("{} round trips matched", span)))
}

/// With the clock running but reset held, no interface may acknowledge.
pub async fn ack_idle_in_reset(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    clock.start();
    let reset = ResetSequencer::new(dut.c("rst"));
    reset.assert_reset();

    Trigger::timer_ro(10, "ns").await;
    sim::log(&format!(
        "sampling acks, session state: {:?}",
        session_state(&clock, dut.c("rst"))
    ));

    check_eq!(dut.c("up_wack").u64(), 0u64, "micro-port write ack while in reset");
    check_eq!(dut.c("up_rack").u64(), 0u64, "micro-port read ack while in reset");
    check_eq!(dut.c("s_wb_ack").u64(), 0u64, "bus ack while in reset");
    Ok(Val::String("acks held low while in reset".to_string()))
}

/// With reset held and the clock never started, the device must not make
/// progress of any kind; the acks stay low.
pub async fn ack_idle_no_clock(dut: SimObject) -> TestResult {
    let clock = ClockSource::new(dut.c("clk"), CLK_HALF_PERIOD_NS);
    let reset = ResetSequencer::new(dut.c("rst"));
    reset.assert_reset();

    Trigger::timer_ro(5, "ns").await;
    sim::log(&format!(
        "sampling acks, session state: {:?}",
        session_state(&clock, dut.c("rst"))
    ));

    check_eq!(dut.c("up_wack").u64(), 0u64, "micro-port write ack without clock");
    check_eq!(dut.c("up_rack").u64(), 0u64, "micro-port read ack without clock");
    check_eq!(dut.c("s_wb_ack").u64(), 0u64, "bus ack without clock");
    Ok(Val::String("acks held low without a clock".to_string()))
}
