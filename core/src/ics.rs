//! Source layer (ICS): per-source routing, masking, and resend state.
//!
//! Owns a dense array of source states indexed by a contiguous interrupt
//! number space `[offset, offset + nr_irqs)`: a fixed-size, index-addressed
//! table of per-line state, generalized from "list of registered
//! handlers" to "priority/mask/status state machine per line".

use alloc::vec::Vec;

use xics_hal::wire::PRIORITY_MASKED;

use crate::icp::Icp;
use crate::status::SourceStatus;

/// State tracked for a single interrupt source.
#[derive(Debug, Clone)]
struct Source {
    /// Target presenter index for this source.
    server: usize,
    /// Delivery priority; `0xFF` means masked.
    priority: u8,
    /// Priority remembered across an int-off/int-on mask cycle.
    saved_priority: u8,
    status: SourceStatus,
    /// `true` for level-sensitive, `false` for message-signaled/edge.
    lsi: bool,
}

impl Source {
    const fn new() -> Self {
        Self {
            server: 0,
            priority: PRIORITY_MASKED,
            saved_priority: PRIORITY_MASKED,
            status: SourceStatus::empty(),
            lsi: false,
        }
    }

    const fn masked(&self) -> bool {
        self.priority == PRIORITY_MASKED
    }
}

/// The interrupt source layer.
///
/// `offset` is the first valid interrupt number; numbers below it
/// (including the IPI pseudo-source, see [`crate::icp::XICS_IPI`]) never
/// reach this layer.
#[derive(Debug)]
pub struct Ics {
    offset: u32,
    sources: Vec<Source>,
}

impl Ics {
    /// Create a new source layer with `nr_irqs` sources starting at
    /// `offset`, all masked and untyped (MSI) — matching the reset state.
    #[must_use]
    pub fn new(nr_irqs: usize, offset: u32) -> Self {
        Self {
            offset,
            sources: alloc::vec![Source::new(); nr_irqs],
        }
    }

    /// Number of sources.
    #[must_use]
    pub fn nr_irqs(&self) -> usize {
        self.sources.len()
    }

    /// First valid interrupt number.
    #[must_use]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// Whether `nr` names a source owned by this layer.
    #[must_use]
    pub fn valid_irq(&self, nr: u32) -> bool {
        nr >= self.offset && (nr - self.offset) < self.sources.len() as u32
    }

    fn srcno(&self, nr: u32) -> usize {
        debug_assert!(self.valid_irq(nr), "xics: irq {nr} out of range");
        (nr - self.offset) as usize
    }

    /// Retype a source as level-sensitive or message-signaled. Does not
    /// disturb any other field.
    pub fn set_irq_type(&mut self, nr: u32, lsi: bool) {
        let srcno = self.srcno(nr);
        self.sources[srcno].lsi = lsi;
    }

    /// Current `(server, priority)` routing for `nr`.
    #[must_use]
    pub fn get_xive(&self, nr: u32) -> (usize, u8) {
        let src = &self.sources[self.srcno(nr)];
        (src.server, src.priority)
    }

    /// Priority remembered across an int-off/int-on mask cycle for `nr`.
    #[must_use]
    pub fn saved_priority(&self, nr: u32) -> u8 {
        self.sources[self.srcno(nr)].saved_priority
    }

    /// Device-facing line toggle. `srcno` is the dense array index, *not*
    /// the global interrupt number.
    pub fn set_irq(&mut self, icp: &mut Icp, srcno: usize, level: bool) {
        let nr = self.offset + srcno as u32;
        let src = &mut self.sources[srcno];
        if src.lsi {
            src.status.set(SourceStatus::ASSERTED, level);
            self.resend_lsi(icp, srcno);
        } else if level {
            let src = &mut self.sources[srcno];
            if src.masked() {
                src.status.insert(SourceStatus::MASKED_PENDING);
            } else {
                let (server, priority) = (src.server, src.priority);
                icp.irq(self, server, nr, priority);
            }
        }
    }

    /// Update routing/mask state for `nr` and attempt delivery if the
    /// change makes one eligible.
    pub fn write_xive(&mut self, icp: &mut Icp, nr: u32, server: usize, priority: u8, saved_priority: u8) {
        let srcno = self.srcno(nr);
        {
            let src = &mut self.sources[srcno];
            src.server = server;
            src.priority = priority;
            src.saved_priority = saved_priority;
        }
        if self.sources[srcno].lsi {
            self.resend_lsi(icp, srcno);
        } else {
            let src = &mut self.sources[srcno];
            if src.status.contains(SourceStatus::MASKED_PENDING) && !src.masked() {
                src.status.remove(SourceStatus::MASKED_PENDING);
                let (server, priority) = (src.server, src.priority);
                icp.irq(self, server, nr, priority);
            }
        }
    }

    /// Called by the presentation layer when a presented interrupt is
    /// displaced by a higher-priority one. `nr` may name the IPI
    /// pseudo-source (it is whatever was pending at the presenter) — this
    /// layer owns no state for it, so that case is a no-op rather than an
    /// out-of-range access.
    pub fn reject(&mut self, nr: u32) {
        if !self.valid_irq(nr) {
            return;
        }
        let srcno = self.srcno(nr);
        let src = &mut self.sources[srcno];
        src.status.insert(SourceStatus::REJECTED);
        src.status.remove(SourceStatus::SENT);
        log::trace!("xics: source {nr} rejected");
    }

    /// Sweep every source attempting to redeliver latent/rejected
    /// interrupts. Does not filter by target server: a source can be
    /// resent even if the calling presenter is not its target. Known
    /// limitation, not yet addressed.
    pub fn resend(&mut self, icp: &mut Icp) {
        for srcno in 0..self.sources.len() {
            if self.sources[srcno].lsi {
                self.resend_lsi(icp, srcno);
            } else {
                self.resend_msi(icp, srcno);
            }
        }
    }

    /// End-of-interrupt for `nr`. No-op for MSI sources, and a no-op when
    /// `nr` is the IPI pseudo-source or otherwise unowned by this layer —
    /// every accept/EOI round trip passes through here whether or not the
    /// delivery it closes was ever a real ICS source.
    pub fn eoi(&mut self, nr: u32) {
        if !self.valid_irq(nr) {
            return;
        }
        let srcno = self.srcno(nr);
        let src = &mut self.sources[srcno];
        if src.lsi {
            src.status.remove(SourceStatus::SENT);
        }
    }

    fn resend_lsi(&mut self, icp: &mut Icp, srcno: usize) {
        let nr = self.offset + srcno as u32;
        let src = &mut self.sources[srcno];
        if !src.masked() && src.status.contains(SourceStatus::ASSERTED) && !src.status.contains(SourceStatus::SENT) {
            src.status.insert(SourceStatus::SENT);
            let (server, priority) = (src.server, src.priority);
            icp.irq(self, server, nr, priority);
        }
    }

    fn resend_msi(&mut self, icp: &mut Icp, srcno: usize) {
        let nr = self.offset + srcno as u32;
        let src = &mut self.sources[srcno];
        if src.status.contains(SourceStatus::REJECTED) {
            src.status.remove(SourceStatus::REJECTED);
            if !src.masked() {
                let (server, priority) = (src.server, src.priority);
                log::debug!("xics: source {nr} redelivered to server {server} after reject");
                icp.irq(self, server, nr, priority);
            }
        }
    }

    /// Reset every source except its `lsi` type bit.
    pub fn reset(&mut self) {
        for src in &mut self.sources {
            src.server = 0;
            src.status = SourceStatus::empty();
            src.priority = PRIORITY_MASKED;
            src.saved_priority = PRIORITY_MASKED;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::icp::Icp;
    use crate::output::RecordingPin;

    fn setup(nr_irqs: usize, nr_servers: usize) -> (Ics, Icp) {
        let ics = Ics::new(nr_irqs, 16);
        let icp = Icp::new((0..nr_servers).map(|_| alloc::boxed::Box::new(RecordingPin::default()) as _));
        (ics, icp)
    }

    #[test]
    fn masked_msi_becomes_masked_pending() {
        let (mut ics, mut icp) = setup(4, 1);
        icp.set_cppr(&mut ics, 0, 0xff);
        ics.write_xive(&mut icp, 16, 0, 0xff, 5);
        ics.set_irq(&mut icp, 0, true);
        let (server, priority) = ics.get_xive(16);
        assert_eq!((server, priority), (0, 0xff));
        assert_eq!(icp.pending_xisr(0), 0);

        ics.write_xive(&mut icp, 16, 0, 3, 3);
        assert_eq!(icp.pending_xisr(0), 16);
        assert_eq!(icp.pending_priority(0), 3);
    }

    #[test]
    fn reject_is_idempotent() {
        let (mut ics, _icp) = setup(4, 1);
        ics.reject(16);
        let status_once = ics.sources[0].status;
        ics.reject(16);
        assert_eq!(ics.sources[0].status, status_once);
    }

    #[test]
    fn valid_irq_bounds() {
        let ics = Ics::new(4, 16);
        assert!(!ics.valid_irq(15));
        assert!(ics.valid_irq(16));
        assert!(ics.valid_irq(19));
        assert!(!ics.valid_irq(20));
    }

    #[test]
    fn lsi_resend_redelivers_while_asserted() {
        let (mut ics, mut icp) = setup(4, 1);
        icp.set_cppr(&mut ics, 0, 0xff);
        ics.set_irq_type(16, true);
        ics.write_xive(&mut icp, 16, 0, 4, 4);
        ics.set_irq(&mut icp, 0, true);
        assert_eq!(icp.pending_xisr(0), 16);

        let xirr = icp.accept(0);
        icp.eoi(&mut ics, 0, xirr);
        // Still asserted: a subsequent resend (e.g. via set_cppr) redelivers.
        icp.set_cppr(&mut ics, 0, 0);
        icp.set_cppr(&mut ics, 0, 0xff);
        assert_eq!(icp.pending_xisr(0), 16);
    }

    /// Firing N distinct MSI sources against a presenter that's already
    /// busy with a higher-priority interrupt loses nothing: each fires
    /// into `REJECTED` rather than vanishing, and once the presenter frees
    /// up a resend sweep delivers exactly one of them while the rest stay
    /// `REJECTED` — so deliveries plus still-`REJECTED` sources at
    /// quiescence accounts for every one of the N firings.
    #[test]
    fn msi_fired_n_times_against_busy_presenter_loses_no_interrupt() {
        const N: usize = 5;
        let (mut ics, mut icp) = setup(N + 1, 1);
        icp.set_cppr(&mut ics, 0, 0xff);

        // Source 0 (nr 16) occupies the presenter at the most favored
        // priority and is never drained until step two below.
        ics.write_xive(&mut icp, 16, 0, 0, 0);
        ics.set_irq(&mut icp, 0, true);
        assert_eq!(icp.pending_xisr(0), 16);

        // N less-favored sources all fire while the presenter is busy.
        for srcno in 1..=N {
            let nr = 16 + srcno as u32;
            ics.write_xive(&mut icp, nr, 0, 1, 1);
            ics.set_irq(&mut icp, srcno, true);
        }
        assert_eq!(icp.pending_xisr(0), 16, "busy presenter must not be disturbed");
        for srcno in 1..=N {
            assert!(ics.sources[srcno].status.contains(SourceStatus::REJECTED));
        }

        // Drain the busy source; the resend sweep this triggers delivers
        // exactly one of the N rejected sources.
        let xirr = icp.accept(0);
        icp.eoi(&mut ics, 0, xirr);

        let delivered = icp.pending_xisr(0);
        assert_ne!(delivered, 0, "one of the rejected sources must be redelivered");
        let delivered_srcno = (delivered - 16) as usize;

        let still_rejected =
            (1..=N).filter(|&srcno| srcno != delivered_srcno && ics.sources[srcno].status.contains(SourceStatus::REJECTED)).count();
        assert_eq!(1 + still_rejected, N);
    }
}
