use crate::mesh_error::MeshError;

/// Trait for validating data structure invariants.
pub trait DebugInvariants {
    /// Assert invariants in debug builds or when invariant checking is enabled.
    fn debug_assert_invariants(&self);
    /// Validate invariants and return the first error encountered.
    fn validate_invariants(&self) -> Result<(), MeshError>;
}

/// Helper macro to run a fallible check and panic on error when invariant
/// checking is enabled.
#[macro_export]
macro_rules! debug_invariants {
    ($expr:expr, $($ctx:tt)*) => {
        #[cfg(any(debug_assertions, feature = "strict-invariants", feature = "check-invariants"))]
        if let Err(e) = $expr {
            panic!(concat!("[invariants] ", $($ctx)*, ": {}"), e);
        }
    };
}

/// Check a CSR pair: `xadj` starts at 0, is non-decreasing, ends at
/// `values.len()`, and every value is below `bound`.
pub(crate) fn validate_csr(
    what: &str,
    xadj: &[usize],
    values: &[usize],
    bound: usize,
) -> Result<(), MeshError> {
    let fail = |msg: String| Err(MeshError::InvariantViolation(format!("{what}: {msg}")));
    match (xadj.first(), xadj.last()) {
        (Some(0), Some(&end)) if end == values.len() => {}
        _ => return fail(format!("offsets do not span {} values", values.len())),
    }
    if let Some(i) = xadj.windows(2).position(|w| w[0] > w[1]) {
        return fail(format!("offsets decrease at row {i}"));
    }
    if let Some(&v) = values.iter().find(|&&v| v >= bound) {
        return fail(format!("value {v} out of range 0..{bound}"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csr_checks() {
        assert!(validate_csr("g", &[0, 2, 3], &[1, 2, 0], 3).is_ok());
        assert!(validate_csr("g", &[0, 2, 1], &[1, 2, 0], 3).is_err());
        assert!(validate_csr("g", &[0, 2], &[1, 2, 0], 3).is_err());
        assert!(validate_csr("g", &[0, 3], &[1, 5, 0], 3).is_err());
        assert!(validate_csr("g", &[], &[], 0).is_err());
    }
}
