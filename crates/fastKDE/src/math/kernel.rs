//! Smoothing kernels for density accumulation.
//!
//! ## Purpose
//!
//! This module defines the kernel families, the [`KernelSpec`] configuration
//! (bandwidth, truncation, normalization), and the grid-resolved form used by
//! the accumulation loop.
//!
//! ## Design notes
//!
//! * **Separable**: every family is evaluated as a product of 1-D profiles,
//!   one per axis. A point's footprint weight is therefore the product of
//!   per-axis weight vectors, which is what lets the inner loop run over a
//!   contiguous row with a single scalar prefactor.
//! * **Units**: bandwidth is in world units; distances inside the kernel are
//!   in cells and are rescaled by `spacing / bandwidth` per axis.
//! * **Truncation**: a fixed radius in cells, a tail-mass tolerance from
//!   which a per-axis radius is derived, or none at all.
//!
//! ## Key concepts
//!
//! * **UnitMass normalization**: the per-axis discrete weight is
//!   `(spacing / bandwidth) * k(t)`, so the weights of a point far from the
//!   boundary sum to approximately its weight. The Gaussian peak is
//!   `prod(spacing / (sqrt(2 pi) * bandwidth))`.
//! * **Peak normalization**: `k(t) / k(0)`, so the peak is exactly 1.
//! * **Tail mass**: continuous mass of the kernel outside the truncation box,
//!   `1 - prod(1 - tail_axis)`.
//!
//! ## Invariants
//!
//! * Bandwidths are finite and strictly positive.
//! * Explicit truncation radii are finite and strictly positive.
//! * Cells farther than the radius from a point receive exactly zero.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::primitives::errors::{KdeError, Result};
use crate::primitives::grid::Grid;

/// `1 / sqrt(2 pi)`.
pub const FRAC_1_SQRT_2PI: f64 = 0.398_942_280_401_432_7;

/// Default tail-mass tolerance used by [`Truncation::default`].
pub const DEFAULT_TAIL_TOLERANCE: f64 = 1e-6;

/// Largest standardized radius considered when solving for a tail tolerance.
const MAX_STANDARDIZED_RADIUS: f64 = 40.0;

// ============================================================================
// Kernel Families
// ============================================================================

/// Separable kernel family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum KernelFamily {
    /// Standard normal profile, infinite support.
    #[default]
    Gaussian,
    /// `0.75 (1 - t^2)` on `[-1, 1]`.
    Epanechnikov,
    /// `0.5` on `[-1, 1]`.
    Uniform,
}

impl KernelFamily {
    /// Unit-mass 1-D profile at standardized distance `t`.
    #[inline]
    pub fn profile(self, t: f64) -> f64 {
        match self {
            KernelFamily::Gaussian => FRAC_1_SQRT_2PI * (-0.5 * t * t).exp(),
            KernelFamily::Epanechnikov => {
                if t.abs() <= 1.0 {
                    0.75 * (1.0 - t * t)
                } else {
                    0.0
                }
            }
            KernelFamily::Uniform => {
                if t.abs() <= 1.0 {
                    0.5
                } else {
                    0.0
                }
            }
        }
    }

    /// Standardized half-width of the support, `None` for infinite support.
    pub fn support(self) -> Option<f64> {
        match self {
            KernelFamily::Gaussian => None,
            KernelFamily::Epanechnikov | KernelFamily::Uniform => Some(1.0),
        }
    }

    /// Continuous mass of the 1-D profile outside `[-t, t]`.
    pub fn tail_mass(self, t: f64) -> f64 {
        let t = t.max(0.0);
        match self {
            KernelFamily::Gaussian => libm::erfc(t / std::f64::consts::SQRT_2),
            KernelFamily::Epanechnikov => {
                if t >= 1.0 {
                    0.0
                } else {
                    1.0 - (1.5 * t - 0.5 * t * t * t)
                }
            }
            KernelFamily::Uniform => (1.0 - t).max(0.0),
        }
    }

    /// Smallest standardized radius whose 1-D tail mass is at most `tolerance`.
    pub fn radius_for_tail(self, tolerance: f64) -> f64 {
        if let Some(support) = self.support() {
            return support;
        }
        let (mut lo, mut hi) = (0.0_f64, MAX_STANDARDIZED_RADIUS);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if self.tail_mass(mid) <= tolerance {
                hi = mid;
            } else {
                lo = mid;
            }
            if hi - lo < 1e-12 {
                break;
            }
        }
        hi
    }
}

// ============================================================================
// Configuration
// ============================================================================

/// How far a point's footprint extends.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Truncation {
    /// Fixed radius in cells, applied on every axis.
    Cells(f64),
    /// Radius derived per axis so the dropped tail mass is at most this value.
    TailMass(f64),
    /// No truncation: every point reaches every cell within the family's support.
    Unbounded,
}

impl Truncation {
    /// Radius of `floor(radius)` whole cells; below one cell (or not finite)
    /// the footprint is [`Truncation::Unbounded`].
    pub fn whole_cells(radius: f64) -> Self {
        let cells = radius.floor();
        if cells.is_finite() && cells >= 1.0 {
            Truncation::Cells(cells)
        } else {
            Truncation::Unbounded
        }
    }
}

impl Default for Truncation {
    fn default() -> Self {
        Truncation::TailMass(DEFAULT_TAIL_TOLERANCE)
    }
}

/// Scaling applied to the kernel profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Normalization {
    /// Each point contributes (approximately) its weight in total.
    #[default]
    UnitMass,
    /// Each point contributes its weight at zero distance.
    Peak,
}

/// Immutable kernel parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KernelSpec {
    family: KernelFamily,
    bandwidth: Vec<f64>,
    truncation: Truncation,
    #[cfg_attr(feature = "serde", serde(default))]
    normalization: Normalization,
    #[cfg_attr(feature = "serde", serde(default))]
    max_tail_mass: Option<f64>,
}

impl KernelSpec {
    /// Create a validated kernel specification.
    ///
    /// A single bandwidth is broadcast to every axis of the grid it is
    /// resolved against.
    pub fn new(family: KernelFamily, bandwidth: Vec<f64>, truncation: Truncation) -> Result<Self> {
        let spec = Self {
            family,
            bandwidth,
            truncation,
            normalization: Normalization::default(),
            max_tail_mass: None,
        };
        spec.validate()?;
        Ok(spec)
    }

    /// Gaussian kernel with per-axis bandwidth.
    pub fn gaussian(bandwidth: Vec<f64>, truncation: Truncation) -> Result<Self> {
        Self::new(KernelFamily::Gaussian, bandwidth, truncation)
    }

    /// Same bandwidth on every axis.
    pub fn isotropic(family: KernelFamily, bandwidth: f64, truncation: Truncation) -> Result<Self> {
        Self::new(family, vec![bandwidth], truncation)
    }

    /// Set the profile normalization.
    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Reject grids on which the truncated tail mass would exceed `tolerance`.
    pub fn with_max_tail_mass(mut self, tolerance: f64) -> Result<Self> {
        if !(tolerance.is_finite() && tolerance > 0.0 && tolerance < 1.0) {
            return Err(KdeError::config(format!(
                "max tail mass must be in (0, 1), got {tolerance}"
            )));
        }
        self.max_tail_mass = Some(tolerance);
        Ok(self)
    }

    /// Kernel family.
    pub fn family(&self) -> KernelFamily {
        self.family
    }

    /// Bandwidth per axis (or a single broadcast value).
    pub fn bandwidth(&self) -> &[f64] {
        &self.bandwidth
    }

    /// Truncation rule.
    pub fn truncation(&self) -> Truncation {
        self.truncation
    }

    /// Profile normalization.
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Check the grid-independent invariants.
    pub fn validate(&self) -> Result<()> {
        if self.bandwidth.is_empty() {
            return Err(KdeError::config("bandwidth must not be empty"));
        }
        if let Some(axis) = self
            .bandwidth
            .iter()
            .position(|&h| !(h.is_finite() && h > 0.0))
        {
            return Err(KdeError::config(format!(
                "bandwidth on axis {axis} must be finite and > 0, got {}",
                self.bandwidth[axis]
            )));
        }
        match self.truncation {
            Truncation::Cells(r) if !(r.is_finite() && r > 0.0) => Err(KdeError::config(format!(
                "truncation radius must be finite and > 0, got {r}"
            ))),
            Truncation::TailMass(tol) if !(tol.is_finite() && tol > 0.0 && tol < 1.0) => Err(
                KdeError::config(format!("tail tolerance must be in (0, 1), got {tol}")),
            ),
            _ => Ok(()),
        }
    }

    /// Bind the kernel to a grid.
    pub fn resolve(&self, grid: &Grid) -> Result<ResolvedKernel> {
        self.validate()?;
        let dims = grid.dims();
        if self.bandwidth.len() != 1 && self.bandwidth.len() != dims {
            return Err(KdeError::config(format!(
                "kernel has {} bandwidths but the grid has {dims} axes",
                self.bandwidth.len()
            )));
        }

        let peak_profile = self.family.profile(0.0);
        let axes: Vec<AxisKernel> = (0..dims)
            .map(|axis| {
                let h = if self.bandwidth.len() == 1 {
                    self.bandwidth[0]
                } else {
                    self.bandwidth[axis]
                };
                let scale = grid.spacing()[axis] / h;
                let standardized = match self.truncation {
                    Truncation::Cells(r) => {
                        let t = r * scale;
                        self.family.support().map_or(t, |s| t.min(s))
                    }
                    Truncation::TailMass(tol) => self.family.radius_for_tail(tol / dims as f64),
                    Truncation::Unbounded => self.family.support().unwrap_or(f64::INFINITY),
                };
                let factor = match self.normalization {
                    Normalization::UnitMass => scale,
                    Normalization::Peak => 1.0 / peak_profile,
                };
                AxisKernel {
                    scale,
                    radius: standardized / scale,
                    factor,
                }
            })
            .collect();

        let retained: f64 = axes
            .iter()
            .map(|axis| 1.0 - self.family.tail_mass(axis.radius * axis.scale))
            .product();
        let tail_mass = (1.0 - retained).max(0.0);

        if let Some(limit) = self.max_tail_mass {
            if tail_mass > limit {
                return Err(KdeError::config(format!(
                    "truncation drops {tail_mass:.3e} of the kernel mass, \
                     above the limit {limit:.3e}"
                )));
            }
        }

        Ok(ResolvedKernel {
            family: self.family,
            axes,
            tail_mass,
        })
    }

    /// Continuous kernel mass dropped by truncation on `grid`.
    pub fn tail_mass(&self, grid: &Grid) -> Result<f64> {
        Ok(self.resolve(grid)?.tail_mass())
    }

    /// Continuous kernel mass kept inside the truncation box on `grid`.
    pub fn retained_mass(&self, grid: &Grid) -> Result<f64> {
        Ok(1.0 - self.resolve(grid)?.tail_mass())
    }

    /// Weight deposited on the cell a unit-weight point sits exactly on.
    pub fn peak_weight(&self, grid: &Grid) -> Result<f64> {
        Ok(self.resolve(grid)?.peak())
    }
}

// ============================================================================
// Grid-Resolved Kernel
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
struct AxisKernel {
    /// Cells to standardized units (`spacing / bandwidth`).
    scale: f64,
    /// Truncation radius in cells.
    radius: f64,
    /// Multiplier applied to the profile.
    factor: f64,
}

/// A [`KernelSpec`] bound to a specific grid.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedKernel {
    family: KernelFamily,
    axes: Vec<AxisKernel>,
    tail_mass: f64,
}

impl ResolvedKernel {
    /// Number of axes.
    pub fn dims(&self) -> usize {
        self.axes.len()
    }

    /// Truncation radius in cells on `axis`.
    #[inline]
    pub fn radius(&self, axis: usize) -> f64 {
        self.axes[axis].radius
    }

    /// Weight of a cell `offset` cells away from the point along `axis`.
    #[inline]
    pub fn weight(&self, axis: usize, offset: f64) -> f64 {
        let ax = &self.axes[axis];
        ax.factor * self.family.profile(offset * ax.scale)
    }

    /// Product of per-axis weights at zero distance.
    pub fn peak(&self) -> f64 {
        (0..self.dims()).map(|axis| self.weight(axis, 0.0)).product()
    }

    /// Continuous mass outside the truncation box.
    pub fn tail_mass(&self) -> f64 {
        self.tail_mass
    }
}
