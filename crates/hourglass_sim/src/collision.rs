//! Wall response against the sampled SDF.

use crate::config::SimConfig;
use glam::Vec3;
use hourglass_asset::SdfVolume;

/// Projection attempts before a particle is reverted.
pub const MAX_SNAP_ITERATIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionParams {
    pub boundary_threshold: f32,
    pub restitution: f32,
    pub friction_damping: f32,
    pub substeps: usize,
}

impl From<&SimConfig> for CollisionParams {
    fn from(config: &SimConfig) -> Self {
        Self {
            boundary_threshold: config.boundary_threshold,
            restitution: config.restitution,
            friction_damping: config.friction_damping,
            substeps: config.substeps.max(1),
        }
    }
}

/// Result of one wall check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contact {
    /// Clear of the boundary band.
    Free,
    /// Pushed back inside; velocity adjusted if it was heading outward.
    Resolved,
    /// In the band but the field had no usable gradient; left untouched.
    Degenerate,
}

/// Push `position` back inside when it is within `boundary_threshold` of the
/// wall (or beyond it), and reflect the outward part of `velocity`.
pub fn resolve_contact(
    volume: &SdfVolume,
    position: &mut Vec3,
    velocity: &mut Vec3,
    params: &CollisionParams,
) -> Contact {
    let d = volume.sample(*position);
    if d <= -params.boundary_threshold {
        return Contact::Free;
    }
    let Some(normal) = volume.normal(*position) else {
        return Contact::Degenerate;
    };

    *position -= normal * (d + params.boundary_threshold);

    let vn = velocity.dot(normal);
    if vn > 0.0 {
        let normal_part = normal * vn;
        let tangent = *velocity - normal_part;
        *velocity = -normal_part * params.restitution + tangent * params.friction_damping;
    }
    Contact::Resolved
}

/// Advance `position` by `velocity · dt` in `substeps` slices, resolving wall
/// contacts after each. Returns the number of degenerate contacts.
pub fn advance_with_collisions(
    volume: &SdfVolume,
    position: &mut Vec3,
    velocity: &mut Vec3,
    dt: f32,
    params: &CollisionParams,
) -> u32 {
    let h = dt / params.substeps as f32;
    let mut degenerate = 0;
    for _ in 0..params.substeps {
        *position += *velocity * h;
        if resolve_contact(volume, position, velocity, params) == Contact::Degenerate {
            degenerate += 1;
        }
    }
    degenerate
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validation {
    /// Candidate position was already within the threshold.
    Accepted { position: Vec3, sdf: f32 },
    /// Candidate was projected back onto the allowed side.
    Snapped { position: Vec3, sdf: f32 },
    /// Projection failed; the caller must fall back to the previous state.
    Rejected,
}

/// Make sure a committed position never sits further than
/// `boundary_threshold` outside the wall.
pub fn validate_position(
    volume: &SdfVolume,
    candidate: Vec3,
    boundary_threshold: f32,
) -> Validation {
    if !candidate.is_finite() {
        return Validation::Rejected;
    }
    let mut p = candidate;
    let mut d = volume.sample(p);
    if d <= boundary_threshold {
        return Validation::Accepted { position: p, sdf: d };
    }
    for _ in 0..MAX_SNAP_ITERATIONS {
        let Some(normal) = volume.normal(p) else {
            return Validation::Rejected;
        };
        p -= normal * (d + boundary_threshold);
        d = volume.sample(p);
        if d <= boundary_threshold && p.is_finite() {
            return Validation::Snapped { position: p, sdf: d };
        }
    }
    Validation::Rejected
}
