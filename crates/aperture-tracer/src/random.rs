use glam::UVec2;

pub fn wangh_hash(x: u32) -> u32 {
    let mut state = (x ^ 61u32) ^ (x >> 16u32);
    state = state.wrapping_mul(9u32);
    state = state ^ (state >> 4u32);
    state = state.wrapping_mul(0x27d4eb2du32);
    state ^ (state >> 15u32)
}

pub fn pcg_hash(x: u32) -> u32 {
    let state: u32 = x.wrapping_mul(747796405u32).wrapping_add(2891336453u32);
    let word: u32 = ((state >> ((state >> 28u32) + 4u32)) ^ state).wrapping_mul(277803737u32);
    (word >> 22u32) ^ word
}

/// Fast high quality random number generator
pub fn xor_shift_u32(state: &mut u32) -> u32 {
    *state ^= *state << 13;
    *state ^= *state >> 17;
    *state ^= *state << 5;
    *state
}

/// Fast high quality random f32 generator based on the `xor_shift_u32` in the range of [0, 1]
pub fn random_f32(state: &mut u32) -> f32 {
    xor_shift_u32(state) as f32 * 2.328_306_4e-10_f32
}

/// RNG state for one pixel sample, a pure function of the sample's identity.
///
/// Any invocation can reproduce a sample's random sequence given the same
/// compute parameters, which is what makes dispatch order irrelevant.
pub fn pixel_seed(pixel: UVec2, frame_index: u32, sample_index: u32) -> u32 {
    let flat = pixel.y.wrapping_mul(0x9e3779b9).wrapping_add(pixel.x);
    let seed = pcg_hash(flat ^ wangh_hash(frame_index.wrapping_mul(4096).wrapping_add(sample_index)));
    // xor_shift must never run on a zero state.
    seed.max(1)
}
