//! PAPR hypercall bodies: `H_CPPR`, `H_IPI`, `H_XIRR`, `H_EOI`.
//!
//! Each method here is what a hypercall dispatcher (an external
//! collaborator, not part of this crate) invokes once it has decoded a raw
//! hcall number and unpacked the guest's register arguments. `cpu` is the
//! calling processor's own index — determined by which CPU trapped into
//! the hypervisor, not by a guest-supplied argument — so it is always a
//! valid server index and none of `hcall_cppr`/`hcall_xirr`/`hcall_eoi`
//! range-check it. `hcall_ipi`'s target server, by contrast, is
//! guest-supplied and is the one argument these four calls validate —
//! narrow, purpose-built checks rather than a general schema validator.

use xics_hal::papr::HcallStatus;

use crate::controller::XicsController;

impl XicsController {
    /// `H_CPPR`: set the calling processor's current priority.
    pub fn hcall_cppr(&mut self, cpu: usize, cppr: u8) -> HcallStatus {
        self.set_cppr(cpu, cppr);
        HcallStatus::success()
    }

    /// `H_IPI`: send an interprocessor interrupt to `server` at
    /// `mfrr`, the new MFRR for that processor.
    pub fn hcall_ipi(&mut self, server: usize, mfrr: u8) -> HcallStatus {
        if !self.valid_server(server) {
            log::warn!("xics: h_ipi rejected out-of-range server {server}");
            return HcallStatus::parameter_error();
        }
        self.set_mfrr(server, mfrr);
        HcallStatus::success()
    }

    /// `H_XIRR`: accept the pending interrupt at the calling processor
    /// `cpu`, returning the packed XIRR register value alongside the
    /// call status.
    pub fn hcall_xirr(&mut self, cpu: usize) -> (HcallStatus, u32) {
        (HcallStatus::success(), self.accept(cpu))
    }

    /// `H_EOI`: end-of-interrupt at the calling processor `cpu` for the
    /// packed XIRR value the guest previously accepted.
    pub fn hcall_eoi(&mut self, cpu: usize, xirr: u32) -> HcallStatus {
        self.eoi(cpu, xirr);
        HcallStatus::success()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::RecordingPin;
    use alloc::boxed::Box;

    fn controller(nr_irqs: usize, nr_servers: usize) -> XicsController {
        XicsController::new(nr_irqs, 16, (0..nr_servers).map(|_| Box::new(RecordingPin::default()) as _)).unwrap()
    }

    #[test]
    fn ipi_to_out_of_range_server_is_h_parameter() {
        let mut c = controller(4, 1);
        assert_eq!(c.hcall_ipi(1, 0x10), HcallStatus::parameter_error());
    }

    #[test]
    fn round_trip_accept_and_eoi() {
        let mut c = controller(4, 1);
        assert_eq!(c.hcall_cppr(0, 0xff), HcallStatus::success());
        c.write_xive(16, 0, 5, 5);
        c.set_irq(0, true);

        let (status, xirr) = c.hcall_xirr(0);
        assert_eq!(status, HcallStatus::success());
        assert_eq!(xirr & 0x00ff_ffff, 16);

        assert_eq!(c.hcall_eoi(0, xirr), HcallStatus::success());
        assert_eq!(c.pending_xisr(0), 0);
    }

    #[test]
    fn ipi_sets_mfrr_and_can_preempt() {
        let mut c = controller(4, 1);
        c.hcall_cppr(0, 0xff);
        c.write_xive(16, 0, 0x20, 0x20);
        c.set_irq(0, true);

        assert_eq!(c.hcall_ipi(0, 0x10), HcallStatus::success());
        assert_eq!(c.pending_xisr(0), crate::icp::XICS_IPI);
    }
}
