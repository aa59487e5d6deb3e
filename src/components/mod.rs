//! Jewelry components: parameter records and one builder per component.
//!
//! Builders take a [`BuildContext`](crate::pipeline::BuildContext), a source
//! curve and a parameter record, and return a build record holding the world
//! space solid next to the parameters that produced it.

pub mod bezel;
pub mod gem_cutter;
pub mod head;
pub mod params;
pub mod ring;
pub mod ring_design;

pub use bezel::{BezelBuild, build_bezel};
pub use gem_cutter::{GemCutterBuild, build_gem_cutter};
pub use head::{HeadBuild, HeadParams, build_head};
pub use params::{BezelParams, GemCutterParams, GemMetrics, HeadRailParams, ProngParams, REFERENCE_DENSITY};
pub use ring::{RingBuild, build_ring};
pub use ring_design::{RingDesign, RingSlot, SlotPosition, SlotUpdate};
