//! Small vector helpers shared by the embedder, index and graph builders.

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

pub fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Cosine similarity; zero vectors are similar to nothing.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let denom = norm(a) * norm(b);
    if denom <= f32::EPSILON { return 0.0; }
    (dot(a, b) / denom).clamp(-1.0, 1.0)
}

pub fn l2_normalize(v: &mut [f32]) {
    let n = norm(v).max(1e-6);
    for x in v.iter_mut() { *x /= n; }
}
