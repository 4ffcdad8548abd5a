//! Bus masters. Each transaction drives address/data and a strobe, then
//! waits for the device's synchronous acknowledgment; the nominal cost is
//! one clock edge per beat. Bursts issue back-to-back and results come back
//! in issuance order. An attached idle injector may insert one extra idle
//! cycle ahead of a beat; it never touches data or ordering.

use crate::error::TbError;
use crate::obj::TbObj;
use crate::signal::SimObject;
use crate::testbench::IdleInjector;

const ACK_TIMEOUT_CYCLES: u32 = 64;

/// Master for the primary bus port: shared address and data lines, a
/// write-strobe, a read-strobe and one acknowledgment covering both.
pub struct BusMaster {
    clk: SimObject,
    adr: SimObject,
    wdata: SimObject,
    rdata: SimObject,
    wstb: SimObject,
    rstb: SimObject,
    ack: SimObject,
    addr_width: u32,
    data_width: u32,
    timeout: u32,
    stalls: Option<TbObj<IdleInjector>>,
}

impl BusMaster {
    pub fn attach(dut: SimObject, prefix: &str) -> Self {
        let sig = |suffix: &str| dut.c(&format!("{}_{}", prefix, suffix));
        let adr = sig("adr");
        let wdata = sig("wdata");
        let addr_width = adr.width();
        let data_width = wdata.width();
        Self {
            clk: dut.c("clk"),
            adr,
            wdata,
            rdata: sig("rdata"),
            wstb: sig("wstb"),
            rstb: sig("rstb"),
            ack: sig("ack"),
            addr_width,
            data_width,
            timeout: ACK_TIMEOUT_CYCLES,
            stalls: None,
        }
    }

    pub fn with_stalls(mut self, injector: IdleInjector) -> Self {
        self.stalls = Some(TbObj::new(injector));
        self
    }

    pub fn with_timeout(mut self, cycles: u32) -> Self {
        self.timeout = cycles;
        self
    }

    pub async fn write(&self, addr: u64, value: u64) -> Result<(), TbError> {
        check_range("address", addr, self.addr_width)?;
        check_range("data", value, self.data_width)?;
        self.write_beat(addr, value).await
    }

    pub async fn write_burst(&self, addrs: &[u64], values: &[u64]) -> Result<(), TbError> {
        check_lengths(addrs.len(), values.len())?;
        for (addr, value) in addrs.iter().zip(values) {
            check_range("address", *addr, self.addr_width)?;
            check_range("data", *value, self.data_width)?;
        }
        for (addr, value) in addrs.iter().zip(values) {
            self.write_beat(*addr, *value).await?;
        }
        Ok(())
    }

    pub async fn read(&self, addr: u64) -> Result<u64, TbError> {
        check_range("address", addr, self.addr_width)?;
        self.read_beat(addr).await
    }

    pub async fn read_burst(&self, addrs: &[u64]) -> Result<Vec<u64>, TbError> {
        for addr in addrs {
            check_range("address", *addr, self.addr_width)?;
        }
        let mut data = Vec::with_capacity(addrs.len());
        for addr in addrs {
            data.push(self.read_beat(*addr).await?);
        }
        Ok(data)
    }

    async fn write_beat(&self, addr: u64, value: u64) -> Result<(), TbError> {
        stall(&self.stalls, self.clk).await;
        self.adr.set(addr);
        self.wdata.set(value);
        self.wstb.set(1);
        let acked = wait_ack(self.clk, self.ack, self.timeout).await;
        self.wstb.set(0);
        acked
    }

    async fn read_beat(&self, addr: u64) -> Result<u64, TbError> {
        stall(&self.stalls, self.clk).await;
        self.adr.set(addr);
        self.rstb.set(1);
        let acked = wait_ack(self.clk, self.ack, self.timeout).await;
        self.rstb.set(0);
        acked?;
        Ok(self.rdata.u64())
    }
}

/// Master for the micro-port: independent write and read channels, each with
/// its own address, data, strobe and acknowledgment.
pub struct MicroMaster {
    clk: SimObject,
    waddr: SimObject,
    wdata: SimObject,
    wstb: SimObject,
    wack: SimObject,
    raddr: SimObject,
    rdata: SimObject,
    rstb: SimObject,
    rack: SimObject,
    addr_width: u32,
    data_width: u32,
    timeout: u32,
    stalls: Option<TbObj<IdleInjector>>,
}

impl MicroMaster {
    pub fn attach(dut: SimObject, prefix: &str) -> Self {
        let sig = |suffix: &str| dut.c(&format!("{}_{}", prefix, suffix));
        let waddr = sig("waddr");
        let wdata = sig("wdata");
        let addr_width = waddr.width();
        let data_width = wdata.width();
        Self {
            clk: dut.c("clk"),
            waddr,
            wdata,
            wstb: sig("wstb"),
            wack: sig("wack"),
            raddr: sig("raddr"),
            rdata: sig("rdata"),
            rstb: sig("rstb"),
            rack: sig("rack"),
            addr_width,
            data_width,
            timeout: ACK_TIMEOUT_CYCLES,
            stalls: None,
        }
    }

    pub fn with_stalls(mut self, injector: IdleInjector) -> Self {
        self.stalls = Some(TbObj::new(injector));
        self
    }

    pub fn with_timeout(mut self, cycles: u32) -> Self {
        self.timeout = cycles;
        self
    }

    pub async fn write(&self, addr: u64, value: u64) -> Result<(), TbError> {
        check_range("address", addr, self.addr_width)?;
        check_range("data", value, self.data_width)?;
        self.write_beat(addr, value).await
    }

    pub async fn write_burst(&self, addrs: &[u64], values: &[u64]) -> Result<(), TbError> {
        check_lengths(addrs.len(), values.len())?;
        for (addr, value) in addrs.iter().zip(values) {
            check_range("address", *addr, self.addr_width)?;
            check_range("data", *value, self.data_width)?;
        }
        for (addr, value) in addrs.iter().zip(values) {
            self.write_beat(*addr, *value).await?;
        }
        Ok(())
    }

    pub async fn read(&self, addr: u64) -> Result<u64, TbError> {
        check_range("address", addr, self.addr_width)?;
        self.read_beat(addr).await
    }

    pub async fn read_burst(&self, addrs: &[u64]) -> Result<Vec<u64>, TbError> {
        for addr in addrs {
            check_range("address", *addr, self.addr_width)?;
        }
        let mut data = Vec::with_capacity(addrs.len());
        for addr in addrs {
            data.push(self.read_beat(*addr).await?);
        }
        Ok(data)
    }

    async fn write_beat(&self, addr: u64, value: u64) -> Result<(), TbError> {
        stall(&self.stalls, self.clk).await;
        self.waddr.set(addr);
        self.wdata.set(value);
        self.wstb.set(1);
        let acked = wait_ack(self.clk, self.wack, self.timeout).await;
        self.wstb.set(0);
        acked
    }

    async fn read_beat(&self, addr: u64) -> Result<u64, TbError> {
        stall(&self.stalls, self.clk).await;
        self.raddr.set(addr);
        self.rstb.set(1);
        let acked = wait_ack(self.clk, self.rack, self.timeout).await;
        self.rstb.set(0);
        acked?;
        Ok(self.rdata.u64())
    }
}

async fn stall(stalls: &Option<TbObj<IdleInjector>>, clk: SimObject) {
    if let Some(stalls) = stalls {
        if stalls.with_mut(|s| s.next_idle()) {
            clk.rising_edge().await;
        }
    }
}

// Sample the acknowledgment after each rising edge, once values have
// settled. The bound keeps a dead device from parking the scenario.
async fn wait_ack(clk: SimObject, ack: SimObject, timeout: u32) -> Result<(), TbError> {
    for _ in 0..timeout {
        clk.rising_edge_ro().await;
        if ack.u64() == 1 {
            return Ok(());
        }
    }
    Err(TbError::Timeout { cycles: timeout })
}

fn check_range(what: &str, value: u64, width: u32) -> Result<(), TbError> {
    if width < 64 && value >> width != 0 {
        return Err(TbError::Protocol(format!(
            "{} {:#x} exceeds the {}-bit bus",
            what, value, width
        )));
    }
    Ok(())
}

fn check_lengths(addrs: usize, values: usize) -> Result<(), TbError> {
    if addrs != values {
        return Err(TbError::Protocol(format!(
            "burst length mismatch: {} addresses, {} values",
            addrs, values
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{check_lengths, check_range};
    use crate::error::TbError;

    #[test]
    fn in_range_values_pass() {
        assert!(check_range("address", 0xff, 8).is_ok());
        assert!(check_range("data", u64::from(u32::MAX), 32).is_ok());
        assert!(check_range("data", u64::MAX, 64).is_ok());
    }

    #[test]
    fn out_of_range_values_are_protocol_errors() {
        let err = check_range("address", 0x100, 8).unwrap_err();
        assert!(matches!(err, TbError::Protocol(_)));
        assert!(err.to_string().contains("0x100"));
    }

    #[test]
    fn mismatched_burst_lengths_are_protocol_errors() {
        assert!(check_lengths(4, 4).is_ok());
        let err = check_lengths(2, 1).unwrap_err();
        assert!(matches!(err, TbError::Protocol(_)));
    }
}
