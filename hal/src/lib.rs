//! # XICS HAL
//!
//! Narrow machine-facing interfaces consumed by the `xics-core` controller:
//! the per-presenter output pin, the PAPR hypercall wire status, the RTAS
//! wire status, and the packed XIRR register layout.
//!
//! This crate has no internal state of its own; it only defines the shapes
//! at the boundary between the controller core and the rest of the
//! emulated machine (hypercall dispatcher, RTAS dispatcher, per-CPU
//! interrupt pin). Those dispatchers themselves stay external collaborators.

#![no_std]

pub mod output;
pub mod papr;
pub mod rtas;
pub mod wire;

pub use output::OutputPin;
pub use papr::HcallStatus;
pub use rtas::RtasStatus;
