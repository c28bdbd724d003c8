//! Sanity filters for incoming FDM sensor fields.
//!
//! The simulator occasionally delivers NaN/Inf fields or wild jumps;
//! each sensor channel is checked independently so a bad channel never
//! poisons the others.

/// Maximum accepted deviation from the previous value, in channel units.
// TODO: unconfirmed tunable carried over from the original bridge; never
// validated against real simulator noise.
pub const VALIDITY_THRESHOLD: f32 = 2.5;

/// Check a three-component sensor channel against its last-accepted value.
///
/// Rejects any NaN or infinite component, and any component that
/// deviates from the reference by more than `threshold`.
pub fn channel_ok(candidate: &[f32; 3], reference: &[f32; 3], threshold: f32) -> bool {
    for (c, r) in candidate.iter().zip(reference.iter()) {
        if !c.is_finite() {
            return false;
        }
        if (c - r).abs() > threshold {
            return false;
        }
    }
    true
}

/// Check an attitude quaternion.
///
/// Only the NaN/Inf check applies: quaternion magnitude is bounded by
/// construction on the simulator side, so there is no deviation gate.
pub fn quat_ok(q: &[f32; 4]) -> bool {
    q.iter().all(|c| c.is_finite())
}
