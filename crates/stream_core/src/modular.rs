//! Fixed-size modular linear algebra.
//!
//! Every operation works over the integers modulo a prime `m < 2^32` on
//! square matrices of order `K`. Products are formed in 64 bits and reduced
//! before they are accumulated, so no intermediate can overflow. The
//! functions are `const` so generator tables (sub-stream jumps, default
//! stream spacing) are evaluated at compile time.

/// Square matrix of order `K` with entries in `[0, m)`.
pub type Matrix<const K: usize> = [[u32; K]; K];

/// Column vector of order `K` with entries in `[0, m)`.
pub type Vector<const K: usize> = [u32; K];

/// Order used by every combined recursive generator in this crate.
pub type Matrix3 = Matrix<3>;

/// State vector of one component recurrence.
pub type Vector3 = Vector<3>;

#[inline]
const fn mul_mod(a: u32, b: u32, m: u32) -> u64 {
    (a as u64 * b as u64) % m as u64
}

/// Multiplicative inverse of `a` modulo the prime `m` (Fermat).
pub const fn inv_mod(a: u32, m: u32) -> u32 {
    let mut result = 1u64;
    let mut base = a as u64 % m as u64;
    let mut exp = m - 2;
    while exp > 0 {
        if exp & 1 == 1 {
            result = result * base % m as u64;
        }
        base = base * base % m as u64;
        exp >>= 1;
    }
    result as u32
}

/// `(m - a * b mod m) mod m`.
pub const fn neg_mul_mod(a: u32, b: u32, m: u32) -> u32 {
    ((m as u64 - mul_mod(a, b, m)) % m as u64) as u32
}

/// The identity matrix of order `K`.
pub const fn identity<const K: usize>() -> Matrix<K> {
    let mut out = [[0u32; K]; K];
    let mut i = 0;
    while i < K {
        out[i][i] = 1;
        i += 1;
    }
    out
}

/// Compute `a * v mod m`.
pub const fn mat_vec<const K: usize>(a: &Matrix<K>, v: &Vector<K>, m: u32) -> Vector<K> {
    let mut out = [0u32; K];
    let mut i = 0;
    while i < K {
        let mut acc = 0u64;
        let mut j = 0;
        while j < K {
            acc = (acc + mul_mod(a[i][j], v[j], m)) % m as u64;
            j += 1;
        }
        out[i] = acc as u32;
        i += 1;
    }
    out
}

/// Compute `a * b mod m`.
pub const fn mat_mat<const K: usize>(a: &Matrix<K>, b: &Matrix<K>, m: u32) -> Matrix<K> {
    let mut out = [[0u32; K]; K];
    let mut i = 0;
    while i < K {
        let mut j = 0;
        while j < K {
            let mut acc = 0u64;
            let mut k = 0;
            while k < K {
                acc = (acc + mul_mod(a[i][k], b[k][j], m)) % m as u64;
                k += 1;
            }
            out[i][j] = acc as u32;
            j += 1;
        }
        i += 1;
    }
    out
}

/// Compute `a^n mod m` by square-and-multiply.
///
/// Uses `O(log n)` matrix products; `n = 0` yields the identity.
pub const fn mat_pow<const K: usize>(a: &Matrix<K>, n: u64, m: u32) -> Matrix<K> {
    let mut result = identity::<K>();
    let mut base = *a;
    let mut n = n;
    while n > 0 {
        if n & 1 == 1 {
            result = mat_mat(&base, &result, m);
        }
        n >>= 1;
        if n > 0 {
            base = mat_mat(&base, &base, m);
        }
    }
    result
}

/// Compute `a^(2^e) mod m` by `e` successive squarings.
pub const fn mat_pow_log2<const K: usize>(a: &Matrix<K>, e: u32, m: u32) -> Matrix<K> {
    let mut result = *a;
    let mut i = 0;
    while i < e {
        result = mat_mat(&result, &result, m);
        i += 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const M: u32 = 2_147_483_647;

    const A: Matrix3 = [[0, 4_194_304, 129], [1, 0, 0], [0, 1, 0]];

    fn naive_pow(a: &Matrix3, n: u64, m: u32) -> Matrix3 {
        let mut out = identity::<3>();
        for _ in 0..n {
            out = mat_mat(a, &out, m);
        }
        out
    }

    #[test]
    fn pow_zero_is_identity() {
        assert_eq!(mat_pow(&A, 0, M), identity::<3>());
    }

    #[test]
    fn pow_log2_zero_is_the_matrix_itself() {
        assert_eq!(mat_pow_log2(&A, 0, M), A);
    }

    #[test]
    fn pow_log2_matches_general_pow() {
        for e in 0..12u32 {
            assert_eq!(mat_pow_log2(&A, e, M), mat_pow(&A, 1u64 << e, M), "e={e}");
        }
    }

    #[test]
    fn mat_vec_reduces_near_modulus() {
        // Entries just below a 32-bit modulus would overflow a 64-bit
        // accumulator without per-term reduction.
        let m = 4_294_967_087;
        let a: Matrix3 = [[m - 1; 3]; 3];
        let v: Vector3 = [m - 1; 3];
        // (m-1)^2 = 1 (mod m), summed three times.
        assert_eq!(mat_vec(&a, &v, m), [3, 3, 3]);
    }

    #[test]
    fn inverse_of_129_mod_mersenne_prime() {
        let inv = inv_mod(129, M);
        assert_eq!(inv, 1_531_538_725);
        assert_eq!(mul_mod(inv, 129, M), 1);
    }

    #[test]
    fn const_evaluation_matches_runtime() {
        const SQUARED: Matrix3 = mat_pow_log2(&A, 10, M);
        assert_eq!(SQUARED, mat_pow(&A, 1024, M));
    }

    proptest! {
        #[test]
        fn pow_agrees_with_repeated_products(n in 0u64..64) {
            prop_assert_eq!(mat_pow(&A, n, M), naive_pow(&A, n, M));
        }

        #[test]
        fn pow_is_additive_in_the_exponent(p in 0u64..1_000_000, q in 0u64..1_000_000) {
            let lhs = mat_pow(&A, p + q, M);
            let rhs = mat_mat(&mat_pow(&A, p, M), &mat_pow(&A, q, M), M);
            prop_assert_eq!(lhs, rhs);
        }

        #[test]
        fn mat_vec_stays_below_modulus(v in prop::array::uniform3(0u32..M)) {
            let out = mat_vec(&A, &v, M);
            prop_assert!(out.iter().all(|&x| x < M));
        }
    }
}
