//! PAPR hypercall wire status.
//!
//! The four ICS/ICP hypercalls (H_CPPR, H_IPI, H_XIRR, H_EOI) return one of
//! two register-width status values. Decoding a raw hcall number into one
//! of these four calls is the hypercall dispatcher's job and stays an
//! external collaborator; this module only names the status values the
//! core's four hcall methods hand back.

/// Hypercall succeeded.
pub const H_SUCCESS: i64 = 0;

/// Hypercall argument was invalid (PAPR `H_Parameter`).
pub const H_PARAMETER: i64 = -2;

/// Status returned by a PAPR hypercall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct HcallStatus(i64);

impl HcallStatus {
    /// Wrap a raw hypercall status value.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        Self(raw)
    }

    /// `H_SUCCESS`.
    #[must_use]
    pub const fn success() -> Self {
        Self(H_SUCCESS)
    }

    /// `H_PARAMETER`.
    #[must_use]
    pub const fn parameter_error() -> Self {
        Self(H_PARAMETER)
    }

    /// The raw register-width status value.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Whether this status is `H_SUCCESS`.
    #[must_use]
    pub const fn is_success(self) -> bool {
        self.0 == H_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_is_zero() {
        assert!(HcallStatus::success().is_success());
        assert_eq!(HcallStatus::success().raw(), 0);
    }

    #[test]
    fn parameter_error_is_not_success() {
        assert!(!HcallStatus::parameter_error().is_success());
        assert_eq!(HcallStatus::parameter_error().raw(), H_PARAMETER);
    }
}
