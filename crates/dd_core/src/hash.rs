/// Hash a field name the way the game hashes its state keys.
///
/// Deterministic and total over any string; the container format stores
/// this value in place of the name itself.
pub fn name_hash(name: &str) -> u32 {
    name.bytes()
        .fold(0u32, |h, b| h.wrapping_mul(53).wrapping_add(u32::from(b)))
}
