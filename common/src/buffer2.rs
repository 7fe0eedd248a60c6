//! Owned row-major 2D buffer.
//!
//! Element `(x, y)` lives at `y * width + x`. Row 0 is the first row in memory,
//! which for raster grids is the northernmost scanline.

use std::ops::{Deref, Index};
use std::slice;

use crate::AllocError;

#[derive(Debug, Clone, PartialEq)]
pub struct Buffer2<T> {
    values: Vec<T>,
    width: usize,
    height: usize,
}

impl<T> Buffer2<T> {
    pub fn new(width: usize, height: usize, values: Vec<T>) -> Self {
        assert_eq!(
            values.len(),
            width * height,
            "values length must equal width * height"
        );
        Self {
            values,
            width,
            height,
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every element in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> T) -> Self {
        let mut values = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                values.push(f(x, y));
            }
        }
        Self {
            values,
            width,
            height,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index_of(&self, x: usize, y: usize) -> usize {
        debug_assert!(x < self.width && y < self.height);
        y * self.width + x
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.values[self.index_of(x, y)]
    }

    #[inline]
    pub fn row_mut(&mut self, y: usize) -> &mut [T] {
        let start = y * self.width;
        &mut self.values[start..start + self.width]
    }

    pub fn rows_mut(&mut self) -> slice::ChunksExactMut<'_, T> {
        self.values.chunks_exact_mut(self.width.max(1))
    }

    #[inline]
    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Same-shaped buffer with `f` applied to every element.
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Buffer2<U> {
        Buffer2 {
            values: self.values.iter().map(f).collect(),
            width: self.width,
            height: self.height,
        }
    }
}

impl<T: Clone> Buffer2<T> {
    /// Buffer with every element set to `value`; allocation failure is reported
    /// instead of aborting.
    pub fn try_new_filled(width: usize, height: usize, value: T) -> Result<Self, AllocError> {
        let len = width.checked_mul(height).ok_or(AllocError {
            bytes: usize::MAX,
        })?;
        let mut values = Vec::new();
        values.try_reserve_exact(len).map_err(|_| AllocError {
            bytes: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
        values.resize(len, value);
        Ok(Self {
            values,
            width,
            height,
        })
    }
}

impl<T> Index<(usize, usize)> for Buffer2<T> {
    type Output = T;

    #[inline]
    fn index(&self, (x, y): (usize, usize)) -> &Self::Output {
        self.get(x, y)
    }
}

impl<T> Deref for Buffer2<T> {
    type Target = [T];

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.values
    }
}
