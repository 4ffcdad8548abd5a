use crate::sim;
use crate::trigger::Trigger;
use crate::SimpleResult;

#[derive(Copy, Clone, Debug)]
pub enum ObjectKind {
    Bit,
    Vector(u32),
    Param,
    Hier,
}

/// Copyable handle to a named object in the device hierarchy: a driveable
/// signal, a read-only parameter or a hierarchy scope.
#[derive(Clone, Copy, Debug)]
pub struct SimObject {
    handle: usize,
    kind: ObjectKind,
}

impl SimObject {
    pub fn handle(&self) -> usize {
        self.handle
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }

    pub fn name(&self) -> String {
        sim::name_of(self.handle)
    }

    pub fn width(&self) -> u32 {
        match self.kind {
            ObjectKind::Bit => 1,
            ObjectKind::Vector(width) => width,
            _ => panic!("{} does not have a width", self.name()),
        }
    }

    pub fn get_root() -> SimpleResult<Self> {
        let (handle, kind) = sim::root()?;
        Ok(SimObject { handle, kind })
    }

    pub fn from_name(full_name: &str) -> SimpleResult<Self> {
        let (handle, kind) = sim::lookup(full_name)?;
        Ok(SimObject { handle, kind })
    }

    pub fn get_child(&self, name: &str) -> SimpleResult<Self> {
        let mut child_name = self.name();
        child_name.push('.');
        child_name.push_str(name);
        SimObject::from_name(child_name.as_str())
    }

    pub fn c(&self, name: &str) -> Self {
        self.get_child(name)
            .unwrap_or_else(|_| panic!("could not get object {}.{}", self.name(), name))
    }

    pub fn u64(&self) -> u64 {
        match self.kind {
            ObjectKind::Hier => panic!("{} does not have a value", self.name()),
            _ => sim::peek(self.handle),
        }
    }

    pub fn u32(&self) -> u32 {
        self.u64() as u32
    }

    pub fn set(&self, val: u64) {
        sim::drive(self.handle, val);
    }

    // convenience functions to get edge triggers for this signal
    pub fn rising_edge(self) -> Trigger {
        Trigger::rising_edge(self)
    }
    pub async fn rising_edge_ro(self) {
        self.rising_edge().await;
        Trigger::read_only().await;
    }
    pub fn falling_edge(self) -> Trigger {
        Trigger::falling_edge(self)
    }
    pub fn edge(self) -> Trigger {
        Trigger::edge(self)
    }
}
