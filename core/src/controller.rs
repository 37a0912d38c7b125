//! Owns the ICS and ICP layers together and threads the mutually
//! recursive calls between them.
//!
//! A single owning struct exposes a handful of narrow operations, each
//! validating its inputs before touching internal state.

use alloc::boxed::Box;

use xics_hal::output::OutputPin;

use crate::icp::Icp;
use crate::ics::Ics;

/// Error constructing a controller with an unusable topology.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructError {
    /// No interrupt sources were requested.
    NoSources,
    /// No virtual processors were requested.
    NoServers,
}

impl core::fmt::Display for ConstructError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NoSources => write!(f, "xics: controller requires at least one interrupt source"),
            Self::NoServers => write!(f, "xics: controller requires at least one virtual processor"),
        }
    }
}

/// The complete controller: one [`Ics`] and one [`Icp`] joined for
/// mutually recursive dispatch.
#[derive(Debug)]
pub struct XicsController {
    ics: Ics,
    icp: Icp,
}

impl XicsController {
    /// Build a controller with `nr_irqs` sources starting at `offset`,
    /// and one presenter per item yielded by `outputs`.
    ///
    /// # Errors
    /// Returns [`ConstructError`] if either layer would be empty.
    pub fn new(
        nr_irqs: usize,
        offset: u32,
        outputs: impl IntoIterator<Item = Box<dyn OutputPin + Send>>,
    ) -> Result<Self, ConstructError> {
        if nr_irqs == 0 {
            return Err(ConstructError::NoSources);
        }
        let icp = Icp::new(outputs);
        if icp.nr_servers() == 0 {
            return Err(ConstructError::NoServers);
        }
        Ok(Self {
            ics: Ics::new(nr_irqs, offset),
            icp,
        })
    }

    /// Number of interrupt sources.
    #[must_use]
    pub fn nr_irqs(&self) -> usize {
        self.ics.nr_irqs()
    }

    /// Number of virtual processors.
    #[must_use]
    pub fn nr_servers(&self) -> usize {
        self.icp.nr_servers()
    }

    /// First valid interrupt number.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.ics.offset()
    }

    /// Whether `nr` names a source owned by this controller.
    #[must_use]
    pub fn valid_irq(&self, nr: u32) -> bool {
        self.ics.valid_irq(nr)
    }

    /// Whether `server` names a virtual processor owned by this
    /// controller.
    #[must_use]
    pub fn valid_server(&self, server: usize) -> bool {
        server < self.icp.nr_servers()
    }

    /// Retype a source as level-sensitive or message-signaled.
    pub fn set_irq_type(&mut self, nr: u32, lsi: bool) {
        self.ics.set_irq_type(nr, lsi);
    }

    /// Current `(server, priority)` routing for `nr`.
    #[must_use]
    pub fn get_xive(&self, nr: u32) -> (usize, u8) {
        self.ics.get_xive(nr)
    }

    /// Priority remembered across an int-off/int-on mask cycle for `nr`.
    #[must_use]
    pub fn saved_priority(&self, nr: u32) -> u8 {
        self.ics.saved_priority(nr)
    }

    /// Update routing/mask state for `nr`.
    pub fn write_xive(&mut self, nr: u32, server: usize, priority: u8, saved_priority: u8) {
        self.ics.write_xive(&mut self.icp, nr, server, priority, saved_priority);
    }

    /// Device-facing line toggle for source `srcno` (dense array index).
    pub fn set_irq(&mut self, srcno: usize, level: bool) {
        self.ics.set_irq(&mut self.icp, srcno, level);
    }

    /// Current CPPR at `server`.
    #[must_use]
    pub fn cppr(&self, server: usize) -> u8 {
        self.icp.cppr(server)
    }

    /// Update the current processor priority at `server`.
    pub fn set_cppr(&mut self, server: usize, cppr: u8) {
        self.icp.set_cppr(&mut self.ics, server, cppr);
    }

    /// Current MFRR at `server`.
    #[must_use]
    pub fn mfrr(&self, server: usize) -> u8 {
        self.icp.mfrr(server)
    }

    /// Update the MFRR at `server`.
    pub fn set_mfrr(&mut self, server: usize, mfrr: u8) {
        self.icp.set_mfrr(&mut self.ics, server, mfrr);
    }

    /// Currently pending source number at `server`, or `0` if none.
    #[must_use]
    pub fn pending_xisr(&self, server: usize) -> u32 {
        self.icp.pending_xisr(server)
    }

    /// Priority of the currently pending source at `server`. Only
    /// meaningful while [`Self::pending_xisr`] is non-zero.
    #[must_use]
    pub fn pending_priority(&self, server: usize) -> u8 {
        self.icp.pending_priority(server)
    }

    /// Guest read port: accept the pending interrupt at `server`.
    pub fn accept(&mut self, server: usize) -> u32 {
        self.icp.accept(server)
    }

    /// Guest write port: end-of-interrupt at `server`.
    pub fn eoi(&mut self, server: usize, xirr: u32) {
        self.icp.eoi(&mut self.ics, server, xirr);
    }

    /// Reset both layers to their power-on state.
    pub fn reset(&mut self) {
        self.icp.reset();
        self.ics.reset();
    }
}
