/// Party kernel — Arithmetic Primitives
///
/// Integer-only helpers. No float: replay hashes must not depend on
/// platform rounding.

/// Numerator/denominator of the shared-experience level spread.
pub const LEVEL_SPREAD_NUM: u64 = 2;
pub const LEVEL_SPREAD_DEN: u64 = 3;

/// Lowest level allowed to share experience with `highest_level`:
/// `ceil(highest_level * 2 / 3)`.
pub fn min_shared_level(highest_level: u32) -> u32 {
    let scaled = u64::from(highest_level) * LEVEL_SPREAD_NUM;
    scaled.div_ceil(LEVEL_SPREAD_DEN) as u32
}

/// `ceil(current / max(maximum, 1) * 100)` clamped to `0..=100`.
pub fn percent(current: i32, maximum: i32) -> u8 {
    if current <= 0 {
        return 0;
    }
    let max = i64::from(maximum.max(1));
    let scaled = i64::from(current) * 100;
    let pct = (scaled + max - 1) / max;
    pct.min(100) as u8
}

/// Elapsed logical time, zero if `earlier` lies in the future.
pub fn elapsed_ms(now: u64, earlier: u64) -> u64 {
    now.saturating_sub(earlier)
}
