//! Small dense complex linear algebra on row-major `m x m` matrices.
//!
//! Everything works in caller-provided buffers so the audio thread never
//! allocates.

use num_complex::Complex32;

const ZERO: Complex32 = Complex32::new(0.0, 0.0);

/// `a^H b`
#[inline]
pub fn dot_h(a: &[Complex32], b: &[Complex32]) -> Complex32 {
    a.iter().zip(b).map(|(x, y)| x.conj() * y).sum()
}

#[inline]
pub fn norm_sqr(a: &[Complex32]) -> f32 {
    a.iter().map(|x| x.norm_sqr()).sum()
}

/// Real part of the trace.
pub fn trace(matrix: &[Complex32], m: usize) -> f32 {
    (0..m).map(|i| matrix[i * m + i].re).sum()
}

/// `out = matrix * v`
pub fn mat_vec(matrix: &[Complex32], v: &[Complex32], out: &mut [Complex32]) {
    let m = v.len();
    for (row, o) in matrix.chunks_exact(m).zip(out.iter_mut()) {
        *o = row.iter().zip(v).map(|(a, b)| a * b).sum();
    }
}

/// One-pole update `R = alpha * R + (1 - alpha) * x x^H`.
pub fn smooth_outer(matrix: &mut [Complex32], x: &[Complex32], alpha: f32) {
    let m = x.len();
    let beta = 1.0 - alpha;
    for (i, row) in matrix.chunks_exact_mut(m).enumerate() {
        let xi = x[i] * beta;
        for (r, xj) in row.iter_mut().zip(x) {
            *r = *r * alpha + xi * xj.conj();
        }
    }
}

/// Refine `v` towards the principal eigenvector of the Hermitian `matrix`
/// and return the matching eigenvalue. `v` is left unit-norm.
pub fn power_iteration(
    matrix: &[Complex32],
    v: &mut [Complex32],
    tmp: &mut [Complex32],
    iterations: usize,
) -> f32 {
    normalise_or_reset(v);
    for _ in 0..iterations {
        mat_vec(matrix, v, tmp);
        v.copy_from_slice(tmp);
        normalise_or_reset(v);
    }
    mat_vec(matrix, v, tmp);
    dot_h(v, tmp).re.max(0.0)
}

fn normalise_or_reset(v: &mut [Complex32]) {
    let norm = norm_sqr(v).sqrt();
    if norm > f32::EPSILON && norm.is_finite() {
        for x in v.iter_mut() {
            *x /= norm;
        }
    } else {
        v.fill(ZERO);
        if let Some(first) = v.first_mut() {
            *first = Complex32::new(1.0, 0.0);
        }
    }
}

/// Solve `a x = b` in place by Gaussian elimination with partial pivoting.
/// `a` is destroyed and `b` holds `x` on return. False if `a` is singular.
pub fn solve_in_place(a: &mut [Complex32], b: &mut [Complex32]) -> bool {
    let m = b.len();
    for col in 0..m {
        let pivot = (col..m)
            .max_by(|&i, &j| a[i * m + col].norm_sqr().total_cmp(&a[j * m + col].norm_sqr()))
            .unwrap_or(col);
        if a[pivot * m + col].norm_sqr() <= f32::MIN_POSITIVE {
            return false;
        }
        if pivot != col {
            for k in 0..m {
                a.swap(pivot * m + k, col * m + k);
            }
            b.swap(pivot, col);
        }

        let inv = a[col * m + col].inv();
        for row in col + 1..m {
            let factor = a[row * m + col] * inv;
            if factor == ZERO {
                continue;
            }
            for k in col..m {
                let v = a[col * m + k];
                a[row * m + k] -= factor * v;
            }
            let v = b[col];
            b[row] -= factor * v;
        }
    }

    for row in (0..m).rev() {
        let mut acc = b[row];
        for k in row + 1..m {
            acc -= a[row * m + k] * b[k];
        }
        b[row] = acc / a[row * m + row];
    }
    true
}
