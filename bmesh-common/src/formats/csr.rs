//! Offset-delimited variable-length rows
//!
//! A [`Csr`] stores `n` rows as one flat `values` array plus `n + 1`
//! monotonic `offsets`: row `i` is `values[offsets[i]..offsets[i + 1]]`.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CsrError {
    #[error("offsets array is empty")]
    EmptyOffsets,

    #[error("offsets must start at 0, found {0}")]
    NonZeroStart(u32),

    #[error("offsets decrease at index {index}")]
    Decreasing { index: usize },

    #[error("last offset {last} does not match value count {values}")]
    LengthMismatch { last: u32, values: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Csr<T> {
    offsets: Vec<u32>,
    values: Vec<T>,
}

impl<T> Default for Csr<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Csr<T> {
    pub fn new() -> Self {
        Self {
            offsets: vec![0],
            values: Vec::new(),
        }
    }

    pub fn from_rows<I, R>(rows: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = T>,
    {
        let mut csr = Self::new();
        for row in rows {
            csr.push_row(row);
        }
        csr
    }

    /// Validate and wrap an offsets / values pair
    pub fn from_parts(offsets: Vec<u32>, values: Vec<T>) -> Result<Self, CsrError> {
        let first = *offsets.first().ok_or(CsrError::EmptyOffsets)?;
        if first != 0 {
            return Err(CsrError::NonZeroStart(first));
        }
        if let Some(index) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(CsrError::Decreasing { index: index + 1 });
        }
        let last = offsets[offsets.len() - 1];
        if last as usize != values.len() {
            return Err(CsrError::LengthMismatch {
                last,
                values: values.len(),
            });
        }
        Ok(Self { offsets, values })
    }

    pub fn push_row<R: IntoIterator<Item = T>>(&mut self, row: R) {
        self.values.extend(row);
        self.offsets.push(self.values.len() as u32);
    }

    /// Number of rows
    pub fn rows(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.rows() == 0
    }

    pub fn row(&self, index: usize) -> Option<&[T]> {
        let start = *self.offsets.get(index)? as usize;
        let end = *self.offsets.get(index + 1)? as usize;
        self.values.get(start..end)
    }

    /// Start of row `index` in the flat value array
    pub fn row_start(&self, index: usize) -> Option<u32> {
        if index < self.rows() {
            Some(self.offsets[index])
        } else {
            None
        }
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &[T]> + '_ {
        self.offsets
            .windows(2)
            .map(|w| &self.values[w[0] as usize..w[1] as usize])
    }

    pub fn offsets(&self) -> &[u32] {
        &self.offsets
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn into_parts(self) -> (Vec<u32>, Vec<T>) {
        (self.offsets, self.values)
    }
}
