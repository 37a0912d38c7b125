//! Presentation layer (ICP): per-processor priority arbitration.
//!
//! Owns one presenter per virtual processor and arbitrates a pending
//! interrupt against that processor's CPPR and MFRR: a small per-presenter
//! piece of routing state behind a handful of narrow methods, generalized
//! from "pick a target CPU" to "arbitrate priority against a threshold".
//!
//! Every method that needs to displace or replay a source takes `&mut
//! Ics` explicitly rather than holding a back-pointer to it, avoiding two
//! structures with independent lifetimes pointing at each other;
//! [`crate::controller`] is the single owner that threads the two layers
//! together.

use alloc::boxed::Box;
use alloc::vec::Vec;

use xics_hal::output::OutputPin;
use xics_hal::wire::{pack_xirr, xirr_cppr, xirr_xisr, PRIORITY_MASKED};

use crate::ics::Ics;

/// Pseudo-source number used for the IPI channel. Fixed below any real
/// `offset`, so it can never collide with a device-owned source and never
/// round-trips through [`Ics::reject`].
pub const XICS_IPI: u32 = 2;

struct Presenter {
    cppr: u8,
    xisr: u32,
    pending_priority: u8,
    mfrr: u8,
    output: Box<dyn OutputPin + Send>,
}

impl Presenter {
    fn new(output: Box<dyn OutputPin + Send>) -> Self {
        Self {
            cppr: 0,
            xisr: 0,
            pending_priority: 0,
            mfrr: PRIORITY_MASKED,
            output,
        }
    }
}

/// The interrupt presentation layer: one entry per virtual processor.
pub struct Icp {
    presenters: Vec<Presenter>,
}

impl core::fmt::Debug for Icp {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Icp").field("nr_servers", &self.presenters.len()).finish()
    }
}

impl Icp {
    /// Build one presenter per item yielded by `outputs`, in server-index
    /// order.
    pub fn new(outputs: impl IntoIterator<Item = Box<dyn OutputPin + Send>>) -> Self {
        Self {
            presenters: outputs.into_iter().map(Presenter::new).collect(),
        }
    }

    /// Number of presenters (virtual processors).
    #[must_use]
    pub fn nr_servers(&self) -> usize {
        self.presenters.len()
    }

    /// Currently pending source number at `server`, or `0` if none.
    #[must_use]
    pub fn pending_xisr(&self, server: usize) -> u32 {
        self.presenters[server].xisr
    }

    /// Priority of the currently pending source at `server`. Only
    /// meaningful while [`Self::pending_xisr`] is non-zero.
    #[must_use]
    pub fn pending_priority(&self, server: usize) -> u8 {
        self.presenters[server].pending_priority
    }

    /// Current CPPR at `server`.
    #[must_use]
    pub fn cppr(&self, server: usize) -> u8 {
        self.presenters[server].cppr
    }

    /// Current MFRR at `server`.
    #[must_use]
    pub fn mfrr(&self, server: usize) -> u8 {
        self.presenters[server].mfrr
    }

    /// Update the current processor priority. Lowering past a pending
    /// interrupt's priority withdraws it for replay; raising with nothing
    /// pending re-examines latent/rejected work.
    pub fn set_cppr(&mut self, ics: &mut Ics, server: usize, cppr: u8) {
        let old_cppr = self.presenters[server].cppr;
        self.presenters[server].cppr = cppr;

        if cppr < old_cppr {
            let ss = &mut self.presenters[server];
            if ss.xisr != 0 && ss.pending_priority >= cppr {
                let old_xisr = ss.xisr;
                ss.xisr = 0;
                ss.output.lower();
                ics.reject(old_xisr);
            }
        } else if self.presenters[server].xisr == 0 {
            self.resend(ics, server);
        }
    }

    /// Update the MFRR, the IPI priority channel; re-evaluates the IPI
    /// if this newly makes it eligible.
    pub fn set_mfrr(&mut self, ics: &mut Ics, server: usize, mfrr: u8) {
        self.presenters[server].mfrr = mfrr;
        if mfrr < self.presenters[server].cppr {
            self.check_ipi(ics, server);
        }
    }

    /// Guest read port: return the full packed XIRR, clear the pending
    /// source, and lower the output pin.
    ///
    /// The internal CPPR is not restored to its pre-delivery value here —
    /// it is raised to the accepted interrupt's own priority so that a
    /// second, lower-or-equal-priority interrupt cannot preempt the one
    /// being serviced. The prior CPPR is written back by the matching
    /// [`Self::eoi`].
    pub fn accept(&mut self, server: usize) -> u32 {
        let ss = &mut self.presenters[server];
        ss.output.lower();
        let xirr = pack_xirr(ss.cppr, ss.xisr);
        ss.cppr = ss.pending_priority;
        ss.xisr = 0;
        xirr
    }

    /// Guest write port: restore the caller-supplied CPPR and inform the
    /// source layer the delivery closed.
    pub fn eoi(&mut self, ics: &mut Ics, server: usize, xirr: u32) {
        self.presenters[server].cppr = xirr_cppr(xirr);
        ics.eoi(xirr_xisr(xirr));
        if self.presenters[server].xisr == 0 {
            self.resend(ics, server);
        }
    }

    /// Invoked by the source layer to deliver `nr` at `priority` to
    /// `server`. Rejects either the new interrupt or the one currently
    /// pending, whichever is less favored.
    pub(crate) fn irq(&mut self, ics: &mut Ics, server: usize, nr: u32, priority: u8) {
        let ss = &mut self.presenters[server];
        if priority >= ss.cppr || (ss.xisr != 0 && ss.pending_priority <= priority) {
            ics.reject(nr);
            return;
        }
        if ss.xisr != 0 {
            let old_xisr = ss.xisr;
            ics.reject(old_xisr);
        }
        let ss = &mut self.presenters[server];
        ss.xisr = nr;
        ss.pending_priority = priority;
        ss.output.raise();
        log::trace!("xics: irq {nr} delivered to server {server} at priority {priority}");
    }

    /// Raise the IPI pseudo-source at `server` if the MFRR now warrants
    /// it, displacing whatever is currently pending.
    fn check_ipi(&mut self, ics: &mut Ics, server: usize) {
        let ss = &mut self.presenters[server];
        if ss.xisr != 0 && ss.pending_priority <= ss.mfrr {
            return;
        }
        if ss.xisr != 0 {
            let old_xisr = ss.xisr;
            ics.reject(old_xisr);
        }
        let ss = &mut self.presenters[server];
        ss.xisr = XICS_IPI;
        ss.pending_priority = ss.mfrr;
        ss.output.raise();
        log::debug!("xics: ipi installed at server {server} priority {}", ss.mfrr);
    }

    /// Re-examine the IPI channel (if warranted) and replay any
    /// latent/rejected source-layer interrupts. Note that the replay
    /// sweep is global across every presenter, not scoped to `server` —
    /// same limitation as [`Ics::resend`].
    pub fn resend(&mut self, ics: &mut Ics, server: usize) {
        let ss = &self.presenters[server];
        if ss.mfrr < ss.cppr {
            self.check_ipi(ics, server);
        }
        ics.resend(self);
    }

    /// Reset every presenter to its power-on state: no pending source,
    /// `mfrr = 0xff`, output deasserted. Sets fields directly rather than
    /// going through the regular setters, which would try to resend
    /// against source state that may not be reset yet.
    pub fn reset(&mut self) {
        for ss in &mut self.presenters {
            ss.cppr = 0;
            ss.xisr = 0;
            ss.pending_priority = 0;
            ss.mfrr = PRIORITY_MASKED;
            ss.output.lower();
        }
    }
}
