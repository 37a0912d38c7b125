//! # XICS core
//!
//! The PAPR XICS virtualized external interrupt controller: an ICS
//! (interrupt source) layer and an ICP (interrupt presentation) layer,
//! joined by [`controller::XicsController`], plus the PAPR hypercall and
//! RTAS call bodies that drive them from guest-visible entry points.
//!
//! No internal locking is performed anywhere in this crate — a
//! [`controller::XicsController`] is `!Sync` by default and the embedding
//! machine model is responsible for serializing access the same way it
//! serializes access to any other emulated device (e.g. behind a
//! `spin::Mutex` alongside the rest of the machine state).

#![no_std]

extern crate alloc;

pub mod controller;
pub mod icp;
pub mod ics;
pub mod papr;
pub mod rtas;
pub mod status;

#[cfg(test)]
pub(crate) mod output;

pub use controller::{ConstructError, XicsController};
pub use icp::{Icp, XICS_IPI};
pub use ics::Ics;
pub use status::SourceStatus;
