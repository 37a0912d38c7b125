//! Per-presenter external interrupt pin.
//!
//! A presenter drives exactly one output line into its virtual processor.
//! The controller only ever issues level commands on this line — raise,
//! lower, or `set(level)` — never an edge; implementors must treat repeated
//! identical commands as no-ops rather than assuming the sink observes a
//! transition.

/// A level-triggered output line into a virtual processor.
pub trait OutputPin {
    /// Assert the line.
    fn raise(&mut self);

    /// Deassert the line.
    fn lower(&mut self);

    /// Drive the line to the given level.
    fn set(&mut self, level: bool) {
        if level {
            self.raise();
        } else {
            self.lower();
        }
    }
}
