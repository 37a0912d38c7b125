//! RTAS call bodies: `ibm,set-xive`, `ibm,get-xive`, `ibm,int-off`,
//! `ibm,int-on`.
//!
//! Each function receives the counted-argument calling convention
//! directly — [`RtasArgs`]/[`RtasRets`] — and is responsible for its own
//! `nargs`/`nret` check, not just the semantic argument checks. Decoding
//! an RTAS token into a call to one of these four functions is the RTAS
//! dispatcher's job and stays an external collaborator; these bodies are
//! where the token-specific argument counts and shapes live.

use xics_hal::rtas::{RtasArgs, RtasRets, RtasStatus};

use crate::controller::XicsController;

/// `ibm,set-xive`: `args = [nr, server, priority]`, `rets = [status]`.
pub fn set_xive(controller: &mut XicsController, args: RtasArgs<'_>, mut rets: RtasRets<'_>) {
    if !args.matches(3) || !rets.matches(1) {
        log::warn!("xics: rtas set-xive called with nargs={} nret={}, expected 3/1", args.nargs(), rets.nret());
        rets.store_status(RtasStatus::parameter_error());
        return;
    }
    let (nr, server, priority) = (args.get(0).unwrap(), args.get(1).unwrap() as usize, args.get(2).unwrap());
    let status = if !controller.valid_irq(nr) || !controller.valid_server(server) || priority > 0xff {
        log::warn!("xics: rtas set-xive rejected nr={nr} server={server} priority={priority}");
        RtasStatus::parameter_error()
    } else {
        controller.rtas_set_xive(nr, server, priority as u8)
    };
    rets.store_status(status);
}

/// `ibm,get-xive`: `args = [nr]`, `rets = [status, server, priority]`.
pub fn get_xive(controller: &XicsController, args: RtasArgs<'_>, mut rets: RtasRets<'_>) {
    if !args.matches(1) || !rets.matches(3) {
        log::warn!("xics: rtas get-xive called with nargs={} nret={}, expected 1/3", args.nargs(), rets.nret());
        rets.store_status(RtasStatus::parameter_error());
        return;
    }
    let (status, server, priority) = controller.rtas_get_xive(args.get(0).unwrap());
    rets.store_status(status);
    if status == RtasStatus::success() {
        rets.set(1, server as u32);
        rets.set(2, u32::from(priority));
    }
}

/// `ibm,int-off`: `args = [nr]`, `rets = [status]`.
pub fn int_off(controller: &mut XicsController, args: RtasArgs<'_>, mut rets: RtasRets<'_>) {
    if !args.matches(1) || !rets.matches(1) {
        log::warn!("xics: rtas int-off called with nargs={} nret={}, expected 1/1", args.nargs(), rets.nret());
        rets.store_status(RtasStatus::parameter_error());
        return;
    }
    rets.store_status(controller.rtas_int_off(args.get(0).unwrap()));
}

/// `ibm,int-on`: `args = [nr]`, `rets = [status]`.
pub fn int_on(controller: &mut XicsController, args: RtasArgs<'_>, mut rets: RtasRets<'_>) {
    if !args.matches(1) || !rets.matches(1) {
        log::warn!("xics: rtas int-on called with nargs={} nret={}, expected 1/1", args.nargs(), rets.nret());
        rets.store_status(RtasStatus::parameter_error());
        return;
    }
    rets.store_status(controller.rtas_int_on(args.get(0).unwrap()));
}

impl XicsController {
    /// Route `nr` to `server` at `priority`, overwriting the saved
    /// priority too. Semantic body behind [`set_xive`].
    pub fn rtas_set_xive(&mut self, nr: u32, server: usize, priority: u8) -> RtasStatus {
        if !self.valid_irq(nr) || !self.valid_server(server) {
            return RtasStatus::parameter_error();
        }
        self.write_xive(nr, server, priority, priority);
        RtasStatus::success()
    }

    /// Read back `nr`'s current `(server, priority)`. Semantic body
    /// behind [`get_xive`].
    #[must_use]
    pub fn rtas_get_xive(&self, nr: u32) -> (RtasStatus, usize, u8) {
        if !self.valid_irq(nr) {
            return (RtasStatus::parameter_error(), 0, 0);
        }
        let (server, priority) = self.get_xive(nr);
        (RtasStatus::success(), server, priority)
    }

    /// Mask `nr` while remembering its current priority for a matching
    /// `int_on`. Semantic body behind [`int_off`].
    pub fn rtas_int_off(&mut self, nr: u32) -> RtasStatus {
        if !self.valid_irq(nr) {
            return RtasStatus::parameter_error();
        }
        let (server, priority) = self.get_xive(nr);
        self.write_xive(nr, server, 0xff, priority);
        RtasStatus::success()
    }

    /// Unmask `nr`, restoring the priority saved by the matching
    /// `int_off`. Semantic body behind [`int_on`].
    pub fn rtas_int_on(&mut self, nr: u32) -> RtasStatus {
        if !self.valid_irq(nr) {
            return RtasStatus::parameter_error();
        }
        let (server, _) = self.get_xive(nr);
        let saved = self.saved_priority(nr);
        self.write_xive(nr, server, saved, saved);
        RtasStatus::success()
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
    fn wrong_arg_count_is_parameter_error() {
        let mut c = controller(4, 1);
        let mut rets = [7u32; 1];
        set_xive(&mut c, RtasArgs::new(2, &[16, 0]), RtasRets::new(1, &mut rets));
        assert_eq!(rets[0] as i32, -3);
    }

    #[test]
    fn out_of_range_irq_is_parameter_error() {
        let mut c = controller(4, 1);
        let mut rets = [0u32; 1];
        set_xive(&mut c, RtasArgs::new(3, &[99, 0, 5]), RtasRets::new(1, &mut rets));
        assert_eq!(rets[0] as i32, -3);

        let mut rets3 = [0u32; 3];
        get_xive(&c, RtasArgs::new(1, &[99]), RtasRets::new(3, &mut rets3));
        assert_eq!(rets3[0] as i32, -3);
    }

    #[test]
    fn priority_above_0xff_is_parameter_error() {
        let mut c = controller(4, 1);
        let mut rets = [0u32; 1];
        set_xive(&mut c, RtasArgs::new(3, &[16, 0, 0x100]), RtasRets::new(1, &mut rets));
        assert_eq!(rets[0] as i32, -3);
    }

    #[test]
    fn get_xive_reports_current_routing() {
        let mut c = controller(4, 1);
        let mut set_rets = [0u32; 1];
        set_xive(&mut c, RtasArgs::new(3, &[16, 0, 5]), RtasRets::new(1, &mut set_rets));
        assert_eq!(set_rets[0], 0);

        let mut get_rets = [7u32; 3];
        get_xive(&c, RtasArgs::new(1, &[16]), RtasRets::new(3, &mut get_rets));
        assert_eq!(get_rets, [0, 0, 5]);
    }

    #[test]
    fn int_off_then_on_restores_priority() {
        let mut c = controller(4, 1);
        c.hcall_cppr(0, 0xff);
        let mut rets = [0u32; 1];
        set_xive(&mut c, RtasArgs::new(3, &[16, 0, 5]), RtasRets::new(1, &mut rets));

        int_off(&mut c, RtasArgs::new(1, &[16]), RtasRets::new(1, &mut rets));
        assert_eq!(rets[0], 0);
        assert_eq!(c.rtas_get_xive(16), (RtasStatus::success(), 0, 0xff));

        int_on(&mut c, RtasArgs::new(1, &[16]), RtasRets::new(1, &mut rets));
        assert_eq!(rets[0], 0);
        assert_eq!(c.rtas_get_xive(16), (RtasStatus::success(), 0, 5));
    }

    #[test]
    fn edge_arriving_while_masked_redelivers_on_int_on() {
        let mut c = controller(4, 1);
        c.hcall_cppr(0, 0xff);
        let mut rets = [0u32; 1];
        set_xive(&mut c, RtasArgs::new(3, &[16, 0, 5]), RtasRets::new(1, &mut rets));
        int_off(&mut c, RtasArgs::new(1, &[16]), RtasRets::new(1, &mut rets));

        c.set_irq(0, true);
        assert_eq!(c.pending_xisr(0), 0);

        int_on(&mut c, RtasArgs::new(1, &[16]), RtasRets::new(1, &mut rets));
        assert_eq!(c.pending_xisr(0), 16);
    }
}
