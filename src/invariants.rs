//! Debug assertion macros for the sequencing invariants.
//!
//! Only active in debug builds (`debug_assert!`), so there is zero
//! overhead in release builds.

/// A published stamp must map back to the slot it was stored in:
/// `stamp & (capacity - 1) == index` for every non-sentinel stamp.
macro_rules! debug_assert_slot_identity {
    ($stamp:expr, $index:expr, $capacity:expr) => {
        debug_assert!(
            $stamp >= 0 && ($stamp as usize) & ($capacity - 1) == $index,
            "slot identity violated: stamp {} does not map to slot {} (capacity {})",
            $stamp,
            $index,
            $capacity
        )
    };
}

/// Sequences only move forward.
macro_rules! debug_assert_monotonic {
    ($name:literal, $old:expr, $new:expr) => {
        debug_assert!(
            $new >= $old,
            "{} decreased from {} to {}",
            $name,
            $old,
            $new
        )
    };
}

/// A writer may publish only once every reader has consumed past the
/// slot this sequence reuses: `claimed - capacity <= min_consumer`.
macro_rules! debug_assert_in_window {
    ($claimed:expr, $min_consumer:expr, $capacity:expr) => {
        debug_assert!(
            $claimed - $capacity as i64 <= $min_consumer,
            "write window violated: publishing {} with minimum consumer at {} (capacity {})",
            $claimed,
            $min_consumer,
            $capacity
        )
    };
}

/// A reader waiting for a stamp must never observe a larger one; that
/// would mean a writer lapped it through the slot it was parked on.
macro_rules! debug_assert_not_lapped {
    ($stamp:expr, $expected:expr) => {
        debug_assert!(
            $stamp <= $expected,
            "reader lapped: found stamp {} while waiting for {}",
            $stamp,
            $expected
        )
    };
}

pub(crate) use debug_assert_in_window;
pub(crate) use debug_assert_monotonic;
pub(crate) use debug_assert_not_lapped;
pub(crate) use debug_assert_slot_identity;
