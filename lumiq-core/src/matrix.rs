//! Dense and compressed-sparse-row matrices carried by operations and observables

use crate::{QuantumError, Result};
use num_complex::Complex64;

/// Square complex matrix stored in row-major order
///
/// Matrices act on a list of wires; the first wire is the most significant
/// bit of the local row/column index.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseMatrix {
    dim: usize,
    data: Vec<Complex64>,
}

impl DenseMatrix {
    /// Build from row-major data
    ///
    /// # Errors
    /// Returns `MalformedMatrix` if the data is empty or not a square of a power of two.
    pub fn from_row_major(data: Vec<Complex64>) -> Result<Self> {
        let dim = square_dim(data.len())?;
        Ok(Self { dim, data })
    }

    /// Build from a fixed-size array of rows
    pub fn from_rows<const N: usize>(rows: [[Complex64; N]; N]) -> Result<Self> {
        Self::from_row_major(rows.iter().flatten().copied().collect())
    }

    /// Build from column-major (Fortran order) data
    pub fn from_column_major(data: &[Complex64]) -> Result<Self> {
        let dim = square_dim(data.len())?;
        let mut row_major = vec![Complex64::new(0.0, 0.0); data.len()];
        for col in 0..dim {
            for row in 0..dim {
                row_major[row * dim + col] = data[col * dim + row];
            }
        }
        Ok(Self {
            dim,
            data: row_major,
        })
    }

    /// Identity of the given dimension
    pub fn identity(dim: usize) -> Self {
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            data[i * dim + i] = Complex64::new(1.0, 0.0);
        }
        Self { dim, data }
    }

    /// Diagonal matrix from its diagonal entries
    pub fn from_diagonal(diagonal: &[Complex64]) -> Self {
        let dim = diagonal.len();
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for (i, &d) in diagonal.iter().enumerate() {
            data[i * dim + i] = d;
        }
        Self { dim, data }
    }

    /// Row/column dimension
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of wires this matrix acts on
    #[inline]
    pub fn num_wires(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    /// Row-major entries
    #[inline]
    pub fn data(&self) -> &[Complex64] {
        &self.data
    }

    /// Entry at (row, col)
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Complex64 {
        self.data[row * self.dim + col]
    }

    /// Conjugate transpose
    pub fn adjoint(&self) -> Self {
        let dim = self.dim;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for row in 0..dim {
            for col in 0..dim {
                data[col * dim + row] = self.data[row * dim + col].conj();
            }
        }
        Self { dim, data }
    }

    /// Matrix product `self · other`
    ///
    /// # Errors
    /// Returns `MalformedMatrix` on a dimension mismatch.
    pub fn matmul(&self, other: &DenseMatrix) -> Result<Self> {
        if self.dim != other.dim {
            return Err(QuantumError::MalformedMatrix(format!(
                "cannot multiply {}x{} by {}x{}",
                self.dim, self.dim, other.dim, other.dim
            )));
        }
        let dim = self.dim;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for i in 0..dim {
            for k in 0..dim {
                let a = self.data[i * dim + k];
                if a.norm_sqr() == 0.0 {
                    continue;
                }
                for j in 0..dim {
                    data[i * dim + j] += a * other.data[k * dim + j];
                }
            }
        }
        Ok(Self { dim, data })
    }

    /// Kronecker product `self ⊗ other`; `self` occupies the high bits
    pub fn kron(&self, other: &DenseMatrix) -> Self {
        let dim = self.dim * other.dim;
        let mut data = vec![Complex64::new(0.0, 0.0); dim * dim];
        for ar in 0..self.dim {
            for ac in 0..self.dim {
                let a = self.get(ar, ac);
                if a.norm_sqr() == 0.0 {
                    continue;
                }
                for br in 0..other.dim {
                    for bc in 0..other.dim {
                        let row = ar * other.dim + br;
                        let col = ac * other.dim + bc;
                        data[row * dim + col] = a * other.get(br, bc);
                    }
                }
            }
        }
        Self { dim, data }
    }

    /// Multiply every entry by a real factor
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            dim: self.dim,
            data: self.data.iter().map(|&z| z * factor).collect(),
        }
    }

    /// Entry-wise sum
    pub fn add(&self, other: &DenseMatrix) -> Result<Self> {
        if self.dim != other.dim {
            return Err(QuantumError::MalformedMatrix(format!(
                "cannot add {}x{} to {}x{}",
                self.dim, self.dim, other.dim, other.dim
            )));
        }
        Ok(Self {
            dim: self.dim,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| a + b)
                .collect(),
        })
    }

    /// True when all off-diagonal entries vanish
    pub fn is_diagonal(&self) -> bool {
        (0..self.dim).all(|row| {
            (0..self.dim).all(|col| row == col || self.get(row, col).norm_sqr() < 1e-30)
        })
    }

    /// Diagonal entries
    pub fn diagonal(&self) -> Vec<Complex64> {
        (0..self.dim).map(|i| self.get(i, i)).collect()
    }
}

fn square_dim(len: usize) -> Result<usize> {
    if len == 0 {
        return Err(QuantumError::MalformedMatrix("matrix of zero length".into()));
    }
    let dim = (len as f64).sqrt().round() as usize;
    if dim * dim != len || !dim.is_power_of_two() {
        return Err(QuantumError::MalformedMatrix(format!(
            "{} entries do not form a 2^k x 2^k matrix",
            len
        )));
    }
    Ok(dim)
}

/// Compressed-sparse-row matrix over the full register
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    dim: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<Complex64>,
}

impl CsrMatrix {
    /// Build from CSR arrays
    ///
    /// # Errors
    /// Returns `MalformedSparse` if the arrays are inconsistent with a
    /// `dim x dim` matrix.
    pub fn new(
        dim: usize,
        indptr: Vec<usize>,
        indices: Vec<usize>,
        data: Vec<Complex64>,
    ) -> Result<Self> {
        if !dim.is_power_of_two() {
            return Err(QuantumError::MalformedSparse(format!(
                "dimension {} is not a power of two",
                dim
            )));
        }
        if indptr.len() != dim + 1 {
            return Err(QuantumError::MalformedSparse(format!(
                "indptr has length {}, expected {}",
                indptr.len(),
                dim + 1
            )));
        }
        if indices.len() != data.len() {
            return Err(QuantumError::MalformedSparse(
                "indices and data lengths differ".into(),
            ));
        }
        if indptr.windows(2).any(|w| w[0] > w[1]) || indptr[dim] != data.len() {
            return Err(QuantumError::MalformedSparse("indptr is not monotone".into()));
        }
        if let Some(&col) = indices.iter().find(|&&col| col >= dim) {
            return Err(QuantumError::MalformedSparse(format!(
                "column index {} out of range",
                col
            )));
        }
        Ok(Self {
            dim,
            indptr,
            indices,
            data,
        })
    }

    /// Compress a dense matrix, dropping exact zeros
    pub fn from_dense(matrix: &DenseMatrix) -> Self {
        let dim = matrix.dim();
        let mut indptr = Vec::with_capacity(dim + 1);
        let mut indices = Vec::new();
        let mut data = Vec::new();
        indptr.push(0);
        for row in 0..dim {
            for col in 0..dim {
                let value = matrix.get(row, col);
                if value.norm_sqr() != 0.0 {
                    indices.push(col);
                    data.push(value);
                }
            }
            indptr.push(data.len());
        }
        Self {
            dim,
            indptr,
            indices,
            data,
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn num_wires(&self) -> usize {
        self.dim.trailing_zeros() as usize
    }

    #[inline]
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    /// Iterate `(column, value)` pairs of one row
    pub fn row(&self, row: usize) -> impl Iterator<Item = (usize, Complex64)> + '_ {
        let span = self.indptr[row]..self.indptr[row + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.data[span].iter().copied())
    }
}
