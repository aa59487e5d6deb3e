//! Call-counting kernel decorator.

use std::sync::atomic::{AtomicUsize, Ordering};

use serde::Serialize;

use crate::geom::{Brep, Curve, Plane, Tolerance};

use super::{CornerStyle, GeometryKernel, LoftStyle};

/// Snapshot of primitive call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KernelCallCounts {
    pub offset: usize,
    pub loft: usize,
    pub sweep: usize,
    pub boolean_difference: usize,
    pub cap: usize,
    pub join: usize,
    pub best_fit_plane: usize,
    pub discontinuities: usize,
}

impl KernelCallCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.offset
            + self.loft
            + self.sweep
            + self.boolean_difference
            + self.cap
            + self.join
            + self.best_fit_plane
            + self.discontinuities
    }
}

#[derive(Debug, Default)]
struct Counters {
    offset: AtomicUsize,
    loft: AtomicUsize,
    sweep: AtomicUsize,
    boolean_difference: AtomicUsize,
    cap: AtomicUsize,
    join: AtomicUsize,
    best_fit_plane: AtomicUsize,
    discontinuities: AtomicUsize,
}

fn bump(counter: &AtomicUsize) {
    counter.fetch_add(1, Ordering::Relaxed);
}

/// Wraps a kernel and counts calls to its primitives.
///
/// Predicates and Brep repair calls are forwarded uncounted.
#[derive(Debug, Default)]
pub struct InstrumentedKernel<K> {
    inner: K,
    counters: Counters,
}

impl<K: GeometryKernel> InstrumentedKernel<K> {
    #[must_use]
    pub fn new(inner: K) -> Self {
        Self {
            inner,
            counters: Counters::default(),
        }
    }

    #[must_use]
    pub fn inner(&self) -> &K {
        &self.inner
    }

    #[must_use]
    pub fn counts(&self) -> KernelCallCounts {
        let c = &self.counters;
        let load = |a: &AtomicUsize| a.load(Ordering::Relaxed);
        KernelCallCounts {
            offset: load(&c.offset),
            loft: load(&c.loft),
            sweep: load(&c.sweep),
            boolean_difference: load(&c.boolean_difference),
            cap: load(&c.cap),
            join: load(&c.join),
            best_fit_plane: load(&c.best_fit_plane),
            discontinuities: load(&c.discontinuities),
        }
    }

    pub fn reset(&self) {
        let c = &self.counters;
        for counter in [
            &c.offset,
            &c.loft,
            &c.sweep,
            &c.boolean_difference,
            &c.cap,
            &c.join,
            &c.best_fit_plane,
            &c.discontinuities,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl<K: GeometryKernel> GeometryKernel for InstrumentedKernel<K> {
    fn offset(&self, curve: &Curve, distance: f64, tol: Tolerance, style: CornerStyle) -> Option<Curve> {
        bump(&self.counters.offset);
        self.inner.offset(curve, distance, tol, style)
    }

    fn is_valid_curve(&self, curve: &Curve) -> bool {
        self.inner.is_valid_curve(curve)
    }

    fn directions_match(&self, a: &Curve, b: &Curve) -> bool {
        self.inner.directions_match(a, b)
    }

    fn loft(&self, curves: &[Curve], style: LoftStyle, closed: bool) -> Option<Vec<Brep>> {
        bump(&self.counters.loft);
        self.inner.loft(curves, style, closed)
    }

    fn iso_curve(&self, patch: &Brep, v: f64) -> Option<Curve> {
        self.inner.iso_curve(patch, v)
    }

    fn sweep_along_rail(&self, rail: &Curve, sections: &[Curve], params: &[f64], closed: bool) -> Option<Vec<Brep>> {
        bump(&self.counters.sweep);
        self.inner.sweep_along_rail(rail, sections, params, closed)
    }

    fn boolean_difference(&self, targets: &[Brep], cutters: &[Brep], tol: Tolerance) -> Option<Vec<Brep>> {
        bump(&self.counters.boolean_difference);
        self.inner.boolean_difference(targets, cutters, tol)
    }

    fn cap_planar_holes(&self, brep: &Brep, tol: Tolerance) -> Option<Brep> {
        bump(&self.counters.cap);
        self.inner.cap_planar_holes(brep, tol)
    }

    fn join_surfaces(&self, patches: &[Brep], tol: Tolerance) -> Option<Vec<Brep>> {
        bump(&self.counters.join);
        self.inner.join_surfaces(patches, tol)
    }

    fn best_fit_plane(&self, curve: &Curve) -> Option<Plane> {
        bump(&self.counters.best_fit_plane);
        self.inner.best_fit_plane(curve)
    }

    fn discontinuities(&self, curve: &Curve) -> Vec<f64> {
        bump(&self.counters.discontinuities);
        self.inner.discontinuities(curve)
    }

    fn standardize(&self, brep: &Brep, tol: Tolerance) -> Brep {
        self.inner.standardize(brep, tol)
    }

    fn split_kinky_faces(&self, brep: &Brep, angle: f64) -> Brep {
        self.inner.split_kinky_faces(brep, angle)
    }

    fn join_naked_edges(&self, brep: &Brep, tol: Tolerance) -> Brep {
        self.inner.join_naked_edges(brep, tol)
    }
}
