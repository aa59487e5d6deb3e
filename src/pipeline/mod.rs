//! Profile-to-solid construction pipeline.
//!
//! Stages, leaves first: frame normalization, robust offsetting, seam
//! alignment, profile stacks, shell assembly and the seat cutter for the
//! bezel family; rail frames and prong axes for heads; slot mapping and sweep
//! post-processing for rings. Every stage borrows a [`BuildContext`] and works
//! on private copies of its inputs.

mod config;
mod cutter;
mod error;
mod frame;
mod offset;
mod prong;
mod rail;
mod ring;
mod seam;
mod shell;
mod stack;

#[cfg(test)]
pub(crate) mod tests;

pub use config::{BuildContext, PipelineConfig};
pub use cutter::{CutOutcome, build_void, subtract_seat};
pub use error::{BuildError, BuildResult, Diagnostics};
pub use frame::{NormalizedProfile, normalize_profile};
pub use offset::{OffsetOutcome, RobustOffsetter, ZERO_OFFSET_EPS};
pub use prong::{ProngAxis, ProngOutcome, ProngSolid, build_prong, build_prongs, prong_axis};
pub use rail::{RailFrame, RailSolid, build_rail_solid, fit_section, rail_frames, sample_parameters};
pub use ring::{SlotSection, SweptRing, smart_rebuild, sweep_ring};
pub use seam::{AlignmentReport, align_chain, align_profiles};
pub use shell::{AssembledShell, ShellRepair, assemble_stack, close_shell};
pub use stack::{ProfileRole, ProfileStack, StackEntry, build_bezel_stack, build_cutter_stack};
