//! The register-echo device the harness drives: a black-box double that
//! stores writes per address and presents them again on read, acknowledging
//! synchronously to the clock. Two interfaces front one store: the primary
//! bus port (shared address/data lines, separate strobes, one shared ack)
//! and the micro-port (independent write and read channels with one ack
//! each). While reset is asserted, or while no clock edge arrives, every
//! acknowledgment output is held deasserted and no register changes.

use intmap::IntMap;

use crate::signal::ObjectKind;
use crate::sim;

#[derive(Clone, Copy, Debug)]
pub struct DeviceConfig {
    pub addr_width: u32,
    pub data_width: u32,
    /// Bus width in bytes, surfaced as the BUS_WIDTH parameter.
    pub bus_width: u32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            addr_width: 8,
            data_width: 32,
            bus_width: 4,
        }
    }
}

pub(crate) fn create_ports(cfg: &DeviceConfig) {
    let bit = |name: &str| {
        sim::create_object(&format!("dut.{}", name), 1, ObjectKind::Bit, 0);
    };
    let vector = |name: &str, width: u32| {
        sim::create_object(&format!("dut.{}", name), width, ObjectKind::Vector(width), 0);
    };
    let param = |name: &str, value: u64| {
        sim::create_object(&format!("dut.{}", name), 32, ObjectKind::Param, value);
    };

    sim::create_object("dut", 0, ObjectKind::Hier, 0);
    bit("clk");
    bit("rst");

    vector("s_wb_adr", cfg.addr_width);
    vector("s_wb_wdata", cfg.data_width);
    vector("s_wb_rdata", cfg.data_width);
    bit("s_wb_wstb");
    bit("s_wb_rstb");
    bit("s_wb_ack");

    vector("up_waddr", cfg.addr_width);
    vector("up_wdata", cfg.data_width);
    bit("up_wstb");
    bit("up_wack");
    vector("up_raddr", cfg.addr_width);
    vector("up_rdata", cfg.data_width);
    bit("up_rstb");
    bit("up_rack");

    param("ADDR_WIDTH", cfg.addr_width as u64);
    param("DATA_WIDTH", cfg.data_width as u64);
    param("BUS_WIDTH", cfg.bus_width as u64);
}

struct PortHandles {
    clk: usize,
    rst: usize,
    wb_adr: usize,
    wb_wdata: usize,
    wb_rdata: usize,
    wb_wstb: usize,
    wb_rstb: usize,
    wb_ack: usize,
    up_waddr: usize,
    up_wdata: usize,
    up_wstb: usize,
    up_wack: usize,
    up_raddr: usize,
    up_rdata: usize,
    up_rstb: usize,
    up_rack: usize,
}

fn hdl(name: &str) -> usize {
    sim::lookup(name)
        .unwrap_or_else(|_| panic!("device port {} missing", name))
        .0
}

pub(crate) struct EchoCore {
    regs: IntMap<u64>,
    last_clk: u64,
    h: PortHandles,
}

impl EchoCore {
    pub(crate) fn bind() -> Self {
        let h = PortHandles {
            clk: hdl("dut.clk"),
            rst: hdl("dut.rst"),
            wb_adr: hdl("dut.s_wb_adr"),
            wb_wdata: hdl("dut.s_wb_wdata"),
            wb_rdata: hdl("dut.s_wb_rdata"),
            wb_wstb: hdl("dut.s_wb_wstb"),
            wb_rstb: hdl("dut.s_wb_rstb"),
            wb_ack: hdl("dut.s_wb_ack"),
            up_waddr: hdl("dut.up_waddr"),
            up_wdata: hdl("dut.up_wdata"),
            up_wstb: hdl("dut.up_wstb"),
            up_wack: hdl("dut.up_wack"),
            up_raddr: hdl("dut.up_raddr"),
            up_rdata: hdl("dut.up_rdata"),
            up_rstb: hdl("dut.up_rstb"),
            up_rack: hdl("dut.up_rack"),
        };
        Self {
            regs: IntMap::new(),
            last_clk: sim::peek(h.clk),
            h,
        }
    }

    // Synchronous logic, run on every settled signal change; register and
    // acknowledgment updates happen only on a rising clock edge.
    pub(crate) fn eval(&mut self) {
        let clk = sim::peek(self.h.clk);
        let rising = self.last_clk == 0 && clk == 1;
        self.last_clk = clk;
        if !rising {
            return;
        }

        if sim::peek(self.h.rst) == 1 {
            sim::drive(self.h.wb_ack, 0);
            sim::drive(self.h.up_wack, 0);
            sim::drive(self.h.up_rack, 0);
            return;
        }

        // primary port: one ack covers both strobes
        let wstb = sim::peek(self.h.wb_wstb);
        let rstb = sim::peek(self.h.wb_rstb);
        if wstb == 1 {
            self.store(sim::peek(self.h.wb_adr), sim::peek(self.h.wb_wdata));
        }
        if rstb == 1 {
            let data = self.load(sim::peek(self.h.wb_adr));
            sim::drive(self.h.wb_rdata, data);
        }
        sim::drive(self.h.wb_ack, wstb | rstb);

        // micro-port: independent write and read channels
        let up_wstb = sim::peek(self.h.up_wstb);
        if up_wstb == 1 {
            self.store(sim::peek(self.h.up_waddr), sim::peek(self.h.up_wdata));
        }
        sim::drive(self.h.up_wack, up_wstb);

        let up_rstb = sim::peek(self.h.up_rstb);
        if up_rstb == 1 {
            let data = self.load(sim::peek(self.h.up_raddr));
            sim::drive(self.h.up_rdata, data);
        }
        sim::drive(self.h.up_rack, up_rstb);
    }

    fn store(&mut self, addr: u64, data: u64) {
        if let Some(slot) = self.regs.get_mut(addr) {
            *slot = data;
        } else {
            self.regs.insert(addr, data);
        }
    }

    fn load(&self, addr: u64) -> u64 {
        self.regs.get(addr).copied().unwrap_or(0)
    }
}
