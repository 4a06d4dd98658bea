//! Cascade split distances
//!
//! Practical split scheme: each boundary blends a uniform split with a
//! logarithmic one. Logarithmic splits keep the shadow texel to screen pixel
//! ratio constant; uniform splits spend resolution evenly along the view.

/// Uniform split of `[near, far]` at `weight`
#[inline]
pub fn linear_split(near: f32, far: f32, weight: f32) -> f32 {
    near + (far - near) * weight
}

/// Logarithmic split of `[near, far]` at `weight`
#[inline]
pub fn logarithmic_split(near: f32, far: f32, weight: f32) -> f32 {
    near * (far / near).powf(weight)
}

/// Far distance of every cascade, ascending.
///
/// The last entry is exactly `far`. `distribution` blends linear (0) and
/// logarithmic (1) splits and is not clamped; values outside [0, 1]
/// extrapolate and may break monotonicity.
pub fn split_distances(near: f32, far: f32, count: usize, distribution: f32) -> Vec<f32> {
    let count = count.max(1);
    let mut distances = Vec::with_capacity(count);

    for i in 0..count - 1 {
        let weight = (i + 1) as f32 / count as f32;
        let linear = linear_split(near, far, weight);
        let log = logarithmic_split(near, far, weight);
        distances.push(linear + (log - linear) * distribution);
    }

    distances.push(far);
    distances
}

/// Cascade index covering a view-space depth
pub fn cascade_for_depth(distances: &[f32], depth: f32) -> usize {
    distances
        .iter()
        .position(|&far| depth < far)
        .unwrap_or(distances.len().saturating_sub(1))
}
