//! Gate matrices
//!
//! Fixed gates are compile-time constants; parametrised gates are small
//! functions of their angles. Every matrix lists its first wire as the most
//! significant bit of the local index.

use num_complex::Complex64;

// Compile-time constant helpers
pub(crate) const ZERO: Complex64 = Complex64::new(0.0, 0.0);
pub(crate) const ONE: Complex64 = Complex64::new(1.0, 0.0);
pub(crate) const I: Complex64 = Complex64::new(0.0, 1.0);
const NEG_I: Complex64 = Complex64::new(0.0, -1.0);
const NEG_ONE: Complex64 = Complex64::new(-1.0, 0.0);

const INV_SQRT2: f64 = std::f64::consts::FRAC_1_SQRT_2;

// Single-qubit gate matrices (2x2)

/// Hadamard
/// H = 1/√2 * [[1,  1],
///             [1, -1]]
pub const HADAMARD: [[Complex64; 2]; 2] = [
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(INV_SQRT2, 0.0),
    ],
    [
        Complex64::new(INV_SQRT2, 0.0),
        Complex64::new(-INV_SQRT2, 0.0),
    ],
];

/// X = [[0, 1],
///      [1, 0]]
pub const PAULI_X: [[Complex64; 2]; 2] = [[ZERO, ONE], [ONE, ZERO]];

/// Y = [[0, -i],
///      [i,  0]]
pub const PAULI_Y: [[Complex64; 2]; 2] = [[ZERO, NEG_I], [I, ZERO]];

/// Z = [[1,  0],
///      [0, -1]]
pub const PAULI_Z: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, NEG_ONE]];

pub const IDENTITY: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, ONE]];

/// S = [[1, 0],
///      [0, i]]
pub const S_GATE: [[Complex64; 2]; 2] = [[ONE, ZERO], [ZERO, I]];

/// T = [[1, 0],
///      [0, e^(iπ/4)]]
pub const T_GATE: [[Complex64; 2]; 2] = [
    [ONE, ZERO],
    [ZERO, Complex64::new(INV_SQRT2, INV_SQRT2)],
];

/// SX = 1/2 * [[1+i, 1-i],
///             [1-i, 1+i]]
pub const SX_GATE: [[Complex64; 2]; 2] = [
    [Complex64::new(0.5, 0.5), Complex64::new(0.5, -0.5)],
    [Complex64::new(0.5, -0.5), Complex64::new(0.5, 0.5)],
];

/// Projector onto |1⟩
pub const PROJ_ONE: [[Complex64; 2]; 2] = [[ZERO, ZERO], [ZERO, ONE]];

// Two-qubit gate matrices (4x4)

pub const CNOT: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
    [ZERO, ZERO, ONE, ZERO],
];

pub const CY: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, NEG_I],
    [ZERO, ZERO, I, ZERO],
];

pub const CZ: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO],
    [ZERO, ZERO, ZERO, NEG_ONE],
];

pub const SWAP: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO],
    [ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
];

pub const ISWAP: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, I, ZERO],
    [ZERO, I, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE],
];

// Three-qubit gate matrices (8x8)

/// Flips the last wire when both controls are |1⟩
pub const TOFFOLI: [[Complex64; 8]; 8] = [
    [ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO],
];

/// Swaps the last two wires when the first is |1⟩
pub const CSWAP: [[Complex64; 8]; 8] = [
    [ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ONE, ZERO, ZERO],
    [ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ZERO, ONE],
];

// Parameterized gate matrices

/// RX(θ) = [[cos(θ/2),    -i·sin(θ/2)],
///          [-i·sin(θ/2),  cos(θ/2)]]
#[inline]
pub fn rotation_x(theta: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(cos_val, 0.0), Complex64::new(0.0, -sin_val)],
        [Complex64::new(0.0, -sin_val), Complex64::new(cos_val, 0.0)],
    ]
}

/// RY(θ) = [[cos(θ/2),  -sin(θ/2)],
///          [sin(θ/2),   cos(θ/2)]]
#[inline]
pub fn rotation_y(theta: f64) -> [[Complex64; 2]; 2] {
    let (sin_val, cos_val) = (theta / 2.0).sin_cos();
    [
        [Complex64::new(cos_val, 0.0), Complex64::new(-sin_val, 0.0)],
        [Complex64::new(sin_val, 0.0), Complex64::new(cos_val, 0.0)],
    ]
}

/// RZ(θ) = [[e^(-iθ/2),  0       ],
///          [0,          e^(iθ/2)]]
#[inline]
pub fn rotation_z(theta: f64) -> [[Complex64; 2]; 2] {
    [
        [Complex64::from_polar(1.0, -theta / 2.0), ZERO],
        [ZERO, Complex64::from_polar(1.0, theta / 2.0)],
    ]
}

/// P(θ) = [[1, 0     ],
///         [0, e^(iθ)]]
#[inline]
pub fn phase_shift(theta: f64) -> [[Complex64; 2]; 2] {
    [[ONE, ZERO], [ZERO, Complex64::from_polar(1.0, theta)]]
}

/// Rot(φ, θ, ω) = RZ(ω)·RY(θ)·RZ(φ)
pub fn rot(phi: f64, theta: f64, omega: f64) -> [[Complex64; 2]; 2] {
    let (s, c) = (theta / 2.0).sin_cos();
    [
        [
            Complex64::from_polar(c, -(phi + omega) / 2.0),
            -Complex64::from_polar(s, (phi - omega) / 2.0),
        ],
        [
            Complex64::from_polar(s, -(phi - omega) / 2.0),
            Complex64::from_polar(c, (phi + omega) / 2.0),
        ],
    ]
}

/// |0⟩⟨0|⊗I + |1⟩⟨1|⊗U
pub fn controlled(u: [[Complex64; 2]; 2]) -> [[Complex64; 4]; 4] {
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ONE, ZERO, ZERO],
        [ZERO, ZERO, u[0][0], u[0][1]],
        [ZERO, ZERO, u[1][0], u[1][1]],
    ]
}

/// IsingXX(θ) = exp(-i θ/2 X⊗X)
#[inline]
pub fn ising_xx(theta: f64) -> [[Complex64; 4]; 4] {
    let (s, c) = (theta / 2.0).sin_cos();
    let c = Complex64::new(c, 0.0);
    let is = Complex64::new(0.0, -s);
    [
        [c, ZERO, ZERO, is],
        [ZERO, c, is, ZERO],
        [ZERO, is, c, ZERO],
        [is, ZERO, ZERO, c],
    ]
}

/// IsingYY(θ) = exp(-i θ/2 Y⊗Y)
#[inline]
pub fn ising_yy(theta: f64) -> [[Complex64; 4]; 4] {
    let (s, c) = (theta / 2.0).sin_cos();
    let c = Complex64::new(c, 0.0);
    let pos = Complex64::new(0.0, s);
    let neg = Complex64::new(0.0, -s);
    [
        [c, ZERO, ZERO, pos],
        [ZERO, c, neg, ZERO],
        [ZERO, neg, c, ZERO],
        [pos, ZERO, ZERO, c],
    ]
}

/// IsingZZ(θ) = exp(-i θ/2 Z⊗Z)
#[inline]
pub fn ising_zz(theta: f64) -> [[Complex64; 4]; 4] {
    let e_neg = Complex64::from_polar(1.0, -theta / 2.0);
    let e_pos = Complex64::from_polar(1.0, theta / 2.0);
    [
        [e_neg, ZERO, ZERO, ZERO],
        [ZERO, e_pos, ZERO, ZERO],
        [ZERO, ZERO, e_pos, ZERO],
        [ZERO, ZERO, ZERO, e_neg],
    ]
}

/// IsingXY(θ) = exp(i θ/4 (X⊗X + Y⊗Y))
#[inline]
pub fn ising_xy(theta: f64) -> [[Complex64; 4]; 4] {
    let (s, c) = (theta / 2.0).sin_cos();
    let c = Complex64::new(c, 0.0);
    let is = Complex64::new(0.0, s);
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, c, is, ZERO],
        [ZERO, is, c, ZERO],
        [ZERO, ZERO, ZERO, ONE],
    ]
}

/// Givens rotation in the {|01⟩, |10⟩} subspace
#[inline]
pub fn single_excitation(theta: f64) -> [[Complex64; 4]; 4] {
    let (s, c) = (theta / 2.0).sin_cos();
    let c = Complex64::new(c, 0.0);
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, c, Complex64::new(-s, 0.0), ZERO],
        [ZERO, Complex64::new(s, 0.0), c, ZERO],
        [ZERO, ZERO, ZERO, ONE],
    ]
}

/// SingleExcitation with a phase `e^{±iθ/2}` on |00⟩ and |11⟩
///
/// `sign = 1.0` is the Plus variant, `-1.0` the Minus variant.
#[inline]
pub fn single_excitation_phased(theta: f64, sign: f64) -> [[Complex64; 4]; 4] {
    let mut m = single_excitation(theta);
    let phase = Complex64::from_polar(1.0, sign * theta / 2.0);
    m[0][0] = phase;
    m[3][3] = phase;
    m
}

/// PSWAP(φ) = SWAP·diag(1, e^{iφ}, e^{iφ}, 1)
#[inline]
pub fn pswap(phi: f64) -> [[Complex64; 4]; 4] {
    let e = Complex64::from_polar(1.0, phi);
    [
        [ONE, ZERO, ZERO, ZERO],
        [ZERO, ZERO, e, ZERO],
        [ZERO, e, ZERO, ZERO],
        [ZERO, ZERO, ZERO, ONE],
    ]
}

/// Square root of ISWAP
pub const SISWAP: [[Complex64; 4]; 4] = [
    [ONE, ZERO, ZERO, ZERO],
    [ZERO, Complex64::new(INV_SQRT2, 0.0), Complex64::new(0.0, INV_SQRT2), ZERO],
    [ZERO, Complex64::new(0.0, INV_SQRT2), Complex64::new(INV_SQRT2, 0.0), ZERO],
    [ZERO, ZERO, ZERO, ONE],
];

/// Echoed cross-resonance gate
pub const ECR: [[Complex64; 4]; 4] = [
    [ZERO, ZERO, Complex64::new(INV_SQRT2, 0.0), Complex64::new(0.0, INV_SQRT2)],
    [ZERO, ZERO, Complex64::new(0.0, INV_SQRT2), Complex64::new(INV_SQRT2, 0.0)],
    [Complex64::new(INV_SQRT2, 0.0), Complex64::new(0.0, -INV_SQRT2), ZERO, ZERO],
    [Complex64::new(0.0, -INV_SQRT2), Complex64::new(INV_SQRT2, 0.0), ZERO, ZERO],
];

// Four-qubit gate matrices (16x16); |0011⟩ is index 3 and |1100⟩ index 12

/// Givens rotation between |0011⟩ and |1100⟩; every other basis state picks
/// up `outer`
fn double_excitation_with(theta: f64, outer: Complex64) -> [[Complex64; 16]; 16] {
    let (s, c) = (theta / 2.0).sin_cos();
    let mut m = [[ZERO; 16]; 16];
    for (i, row) in m.iter_mut().enumerate() {
        row[i] = outer;
    }
    m[3][3] = Complex64::new(c, 0.0);
    m[12][12] = Complex64::new(c, 0.0);
    m[3][12] = Complex64::new(-s, 0.0);
    m[12][3] = Complex64::new(s, 0.0);
    m
}

#[inline]
pub fn double_excitation(theta: f64) -> [[Complex64; 16]; 16] {
    double_excitation_with(theta, ONE)
}

/// DoubleExcitation with `e^{±iθ/2}` outside the excitation subspace
///
/// `sign = 1.0` is the Plus variant, `-1.0` the Minus variant.
#[inline]
pub fn double_excitation_phased(theta: f64, sign: f64) -> [[Complex64; 16]; 16] {
    double_excitation_with(theta, Complex64::from_polar(1.0, sign * theta / 2.0))
}

/// OrbitalRotation(θ) = F·(SE(θ)⊗SE(θ))·F with F the fermionic swap of the
/// two middle wires
pub fn orbital_rotation(theta: f64) -> [[Complex64; 16]; 16] {
    let se = single_excitation(theta);
    fermionic_conjugate(&kron4(&se, &se))
}

/// `a ⊗ b` for two 4x4 blocks, `a` on the leading wires
pub(crate) fn kron4(a: &[[Complex64; 4]; 4], b: &[[Complex64; 4]; 4]) -> [[Complex64; 16]; 16] {
    let mut m = [[ZERO; 16]; 16];
    for (i, a_row) in a.iter().enumerate() {
        for (j, &a_ij) in a_row.iter().enumerate() {
            for (k, b_row) in b.iter().enumerate() {
                for (l, &b_kl) in b_row.iter().enumerate() {
                    m[4 * i + k][4 * j + l] = a_ij * b_kl;
                }
            }
        }
    }
    m
}

/// `F·m·F` where `F` swaps local wires 1 and 2 and negates |·11·⟩
///
/// `F` is a real symmetric signed permutation and its own inverse, so
/// `(F·m·F)[r][c] = sign(r)·sign(c)·m[π(r)][π(c)]`.
pub(crate) fn fermionic_conjugate(m: &[[Complex64; 16]; 16]) -> [[Complex64; 16]; 16] {
    let permute = |b: usize| {
        let w1 = (b >> 2) & 1;
        let w2 = (b >> 1) & 1;
        (b & !0b0110) | (w2 << 2) | (w1 << 1)
    };
    let sign = |b: usize| if (b >> 1) & 0b11 == 0b11 { -1.0 } else { 1.0 };

    let mut out = [[ZERO; 16]; 16];
    for (r, row) in out.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            *cell = m[permute(r)][permute(c)] * (sign(r) * sign(c));
        }
    }
    out
}

/// Diagonal of MultiRZ(θ) = exp(-i θ/2 Z⊗…⊗Z) on `num_wires` wires
pub fn multi_rz_diagonal(theta: f64, num_wires: usize) -> Vec<Complex64> {
    let e_neg = Complex64::from_polar(1.0, -theta / 2.0);
    let e_pos = Complex64::from_polar(1.0, theta / 2.0);
    (0..1usize << num_wires)
        .map(|b| if b.count_ones() % 2 == 0 { e_neg } else { e_pos })
        .collect()
}
