//! Ring design: named slots around the ring rail and the mirror policy that
//! keeps left and right in step.

use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_2, PI, TAU};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geom::{Plane, Point3, Vec3};
use crate::pipeline::{BuildError, BuildResult};

use super::params::{finite, positive};

/// Canonical slot positions, in rail order from the bottom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotPosition {
    BottomStart,
    Right,
    Top,
    Left,
    BottomEnd,
}

impl SlotPosition {
    pub const ALL: [SlotPosition; 5] = [
        SlotPosition::BottomStart,
        SlotPosition::Right,
        SlotPosition::Top,
        SlotPosition::Left,
        SlotPosition::BottomEnd,
    ];

    /// Angle from the bottom, counter-clockwise about the finger axis.
    #[must_use]
    pub const fn default_angle(self) -> f64 {
        match self {
            Self::BottomStart => 0.0,
            Self::Right => FRAC_PI_2,
            Self::Top => PI,
            Self::Left => 3.0 * FRAC_PI_2,
            Self::BottomEnd => TAU,
        }
    }

    /// Partner slot under the mirror policy.
    #[must_use]
    pub const fn mirror_partner(self) -> Option<SlotPosition> {
        match self {
            Self::Right => Some(Self::Left),
            Self::Left => Some(Self::Right),
            Self::BottomStart | Self::Top | Self::BottomEnd => None,
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::BottomStart => "bottom-start",
            Self::Right => "right",
            Self::Top => "top",
            Self::Left => "left",
            Self::BottomEnd => "bottom-end",
        }
    }
}

impl fmt::Display for SlotPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One slot on the ring rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingSlot {
    /// Radians from the bottom of the ring.
    pub angle: f64,
    /// Extent along the finger axis, in mm.
    pub width: f64,
    /// Thickness outward from the finger, in mm.
    pub height: f64,
    pub profile: String,
    /// Degrees about the section normal.
    pub rotation: f64,
    /// Shift along the finger axis, in mm.
    pub lateral_offset: f64,
    pub active: bool,
}

impl Default for RingSlot {
    fn default() -> Self {
        Self {
            angle: 0.0,
            width: 3.0,
            height: 1.6,
            profile: "comfort".into(),
            rotation: 0.0,
            lateral_offset: 0.0,
            active: true,
        }
    }
}

impl RingSlot {
    #[must_use]
    pub fn at(position: SlotPosition) -> Self {
        Self {
            angle: position.default_angle(),
            ..Self::default()
        }
    }

    /// Whether two slots produce the same section.
    #[must_use]
    pub fn same_shape(&self, other: &RingSlot) -> bool {
        self.profile.eq_ignore_ascii_case(&other.profile)
            && self.width == other.width
            && self.height == other.height
            && self.rotation == other.rotation
            && self.lateral_offset == other.lateral_offset
    }

    fn copy_shape_from(&mut self, source: &RingSlot) {
        self.width = source.width;
        self.height = source.height;
        self.profile.clone_from(&source.profile);
        self.rotation = source.rotation;
        self.lateral_offset = source.lateral_offset;
    }

    fn validate(&self, position: SlotPosition) -> BuildResult<()> {
        finite("slot.angle", self.angle)?;
        positive("slot.width", self.width)?;
        positive("slot.height", self.height)?;
        finite("slot.rotation", self.rotation)?;
        finite("slot.lateral_offset", self.lateral_offset)?;
        if self.profile.trim().is_empty() {
            return Err(BuildError::InvalidGeometry(format!("slot {position} has no profile")));
        }
        Ok(())
    }
}

/// Partial slot change; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlotUpdate {
    pub angle: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub profile: Option<String>,
    pub rotation: Option<f64>,
    pub lateral_offset: Option<f64>,
    pub active: Option<bool>,
}

impl SlotUpdate {
    fn apply(&self, slot: &mut RingSlot) {
        if let Some(angle) = self.angle {
            slot.angle = angle;
        }
        if let Some(width) = self.width {
            slot.width = width;
        }
        if let Some(height) = self.height {
            slot.height = height;
        }
        if let Some(profile) = &self.profile {
            slot.profile.clone_from(profile);
        }
        if let Some(rotation) = self.rotation {
            slot.rotation = rotation;
        }
        if let Some(lateral_offset) = self.lateral_offset {
            slot.lateral_offset = lateral_offset;
        }
        if let Some(active) = self.active {
            slot.active = active;
        }
    }
}

/// Slots of one ring plus its rail.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RingDesign {
    /// Finger radius, in mm.
    pub inner_radius: f64,
    /// Ring plane: X points at the bottom of the ring, the normal is the finger axis.
    pub plane: Plane,
    /// Keep `Left` a mirror image of `Right`.
    pub mirror_x: bool,
    pub slots: BTreeMap<SlotPosition, RingSlot>,
}

impl Default for RingDesign {
    fn default() -> Self {
        Self {
            inner_radius: 8.5,
            plane: Plane::from_frame(Point3::ORIGIN, Vec3::new(0.0, -1.0, 0.0), Vec3::X, Vec3::Z),
            mirror_x: true,
            slots: SlotPosition::ALL.iter().map(|&p| (p, RingSlot::at(p))).collect(),
        }
    }
}

impl RingDesign {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn slot(&self, position: SlotPosition) -> Option<&RingSlot> {
        self.slots.get(&position)
    }

    /// Applies `update` to the slot at `position`, creating it at its default
    /// angle when absent. Under `mirror_x` the partner slot takes the new shape
    /// and the mirrored angle.
    ///
    /// Returns the positions that changed. The design is left untouched when
    /// the updated slot is invalid.
    pub fn update_section(&mut self, position: SlotPosition, update: &SlotUpdate) -> BuildResult<Vec<SlotPosition>> {
        let mut slot = self.slots.get(&position).cloned().unwrap_or_else(|| RingSlot::at(position));
        update.apply(&mut slot);
        slot.validate(position)?;

        let mut changed = vec![position];
        if self.mirror_x {
            if let Some(partner) = position.mirror_partner() {
                let mirrored = self.slots.entry(partner).or_insert_with(|| RingSlot::at(partner));
                mirrored.copy_shape_from(&slot);
                mirrored.angle = TAU - slot.angle;
                log::debug!("mirrored {position} onto {partner}");
                changed.push(partner);
            }
        }
        self.slots.insert(position, slot);
        Ok(changed)
    }

    /// Active slots in rail order.
    pub fn active_slots(&self) -> impl Iterator<Item = (SlotPosition, &RingSlot)> {
        self.slots.iter().filter(|(_, slot)| slot.active).map(|(&p, slot)| (p, slot))
    }

    /// The band wraps round when both bottom slots are active and identical;
    /// otherwise it is swept open from bottom to bottom.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        match (self.slot(SlotPosition::BottomStart), self.slot(SlotPosition::BottomEnd)) {
            (Some(start), Some(end)) => start.active && end.active && start.same_shape(end),
            _ => false,
        }
    }

    pub fn validate(&self) -> BuildResult<()> {
        positive("inner_radius", self.inner_radius)?;
        if !self.plane.is_orthonormal() {
            return Err(BuildError::InvalidGeometry("ring plane is not orthonormal".into()));
        }
        let mut active = 0;
        for (position, slot) in self.active_slots() {
            slot.validate(position)?;
            active += 1;
        }
        if active == 0 {
            return Err(BuildError::InsufficientSamples { count: 0 });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_design_has_five_slots_in_rail_order() {
        let design = RingDesign::default();
        let angles: Vec<f64> = design.slots.values().map(|s| s.angle).collect();
        assert_eq!(angles, vec![0.0, FRAC_PI_2, PI, 3.0 * FRAC_PI_2, TAU]);
        assert!(design.is_closed());
        assert!(design.validate().is_ok());
    }

    #[test]
    fn test_mirror_copies_shape_to_partner() {
        let mut design = RingDesign::default();
        let changed = design
            .update_section(
                SlotPosition::Right,
                &SlotUpdate {
                    width: Some(4.2),
                    height: Some(2.1),
                    angle: Some(1.2),
                    ..SlotUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(changed, vec![SlotPosition::Right, SlotPosition::Left]);
        let left = design.slot(SlotPosition::Left).unwrap();
        assert_eq!((left.width, left.height), (4.2, 2.1));
        assert!((left.angle - (TAU - 1.2)).abs() < 1e-12);
    }

    #[test]
    fn test_without_mirror_partner_is_untouched() {
        let mut design = RingDesign {
            mirror_x: false,
            ..RingDesign::default()
        };
        let before = design.slot(SlotPosition::Right).cloned();
        design
            .update_section(
                SlotPosition::Left,
                &SlotUpdate {
                    width: Some(5.0),
                    ..SlotUpdate::default()
                },
            )
            .unwrap();
        assert_eq!(design.slot(SlotPosition::Right).cloned(), before);
    }

    #[test]
    fn test_invalid_update_is_rejected_whole() {
        let mut design = RingDesign::default();
        let before = design.clone();
        let err = design
            .update_section(
                SlotPosition::Right,
                &SlotUpdate {
                    width: Some(-1.0),
                    ..SlotUpdate::default()
                },
            )
            .unwrap_err();
        assert_eq!(err, BuildError::InvalidParameter { name: "slot.width", value: -1.0 });
        assert_eq!(design, before);
    }

    #[test]
    fn test_differing_bottoms_open_the_band() {
        let mut design = RingDesign::default();
        design
            .update_section(
                SlotPosition::BottomEnd,
                &SlotUpdate {
                    profile: Some("square".into()),
                    ..SlotUpdate::default()
                },
            )
            .unwrap();
        assert!(!design.is_closed());
    }

    #[test]
    fn test_design_round_trips_through_json() {
        let design = RingDesign::default();
        let json = serde_json::to_string(&design).unwrap();
        let back: RingDesign = serde_json::from_str(&json).unwrap();
        assert_eq!(back, design);
    }
}
