//! Sample configuration
//!
//! [`MultipassConfig`] holds everything fixed at startup (attachment formats,
//! tile budget, overlay). [`RuntimeState`] holds the four option groups the
//! user can change every frame and the selection that was last applied.

use crate::backend::types::{TextureFormat, TextureUsage};
use crate::error::{MultipassError, MultipassResult};
use crate::resources::AttachmentRole;

/// How many times a pass family is repeated each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum RepeatTier {
    #[default]
    X1,
    X4,
    X8,
    X12,
}

impl RepeatTier {
    pub const ALL: [RepeatTier; 4] = [RepeatTier::X1, RepeatTier::X4, RepeatTier::X8, RepeatTier::X12];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    /// `tier * 4`, except tier 0 which runs once
    pub fn iterations(self) -> u32 {
        let tier = self.index() as u32;
        tier * 4 + u32::from(tier == 0)
    }
}

/// Frame rate the pacer caps update cadence to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TargetRate {
    #[default]
    Fps20,
    Fps30,
    Fps40,
    Fps60,
}

impl TargetRate {
    pub const ALL: [TargetRate; 4] = [
        TargetRate::Fps20,
        TargetRate::Fps30,
        TargetRate::Fps40,
        TargetRate::Fps60,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn fps(self) -> f32 {
        match self {
            TargetRate::Fps20 => 20.0,
            TargetRate::Fps30 => 30.0,
            TargetRate::Fps40 => 40.0,
            TargetRate::Fps60 => 60.0,
        }
    }

    /// Target frame time in seconds
    pub fn frame_time(self) -> f32 {
        1.0 / self.fps()
    }
}

const REPEAT_OPTIONS: [&str; 4] = ["1x", "4x", "8x", "12x"];
const RATE_OPTIONS: [&str; 4] = ["20", "30", "40", "60"];

/// User-facing option groups, in the order the options window lists them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionGroup {
    GeometryPassCount,
    LightingPassCount,
    PostProcessingPassCount,
    TargetFps,
}

impl OptionGroup {
    pub const ALL: [OptionGroup; 4] = [
        OptionGroup::GeometryPassCount,
        OptionGroup::LightingPassCount,
        OptionGroup::PostProcessingPassCount,
        OptionGroup::TargetFps,
    ];

    pub const COUNT: usize = Self::ALL.len();

    fn slot(self) -> usize {
        self as usize
    }

    /// Label shown in the options window
    pub fn description(self) -> &'static str {
        match self {
            OptionGroup::GeometryPassCount => "GeometryPassCount",
            OptionGroup::LightingPassCount => "LightingPassCount",
            OptionGroup::PostProcessingPassCount => "PostProcessingPassCount",
            OptionGroup::TargetFps => "Set Target FPS",
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            OptionGroup::TargetFps => &RATE_OPTIONS,
            _ => &REPEAT_OPTIONS,
        }
    }
}

/// Iteration counts for one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PassIterations {
    pub geometry: u32,
    pub lighting: u32,
    pub post_process: u32,
}

/// Per-frame mutable selections.
///
/// `selected` is what the options window shows; `applied` is what the frame
/// actually runs with. They only differ between a UI change and the next
/// [`RuntimeState::apply_changes`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RuntimeState {
    selected: [usize; OptionGroup::COUNT],
    applied: [usize; OptionGroup::COUNT],
}

impl RuntimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `index` selected and applied for `group`. Out-of-range
    /// indices leave the startup default in place.
    pub fn with_selection(mut self, group: OptionGroup, index: usize) -> Self {
        if self.select(group, index) {
            self.applied[group.slot()] = index;
        } else {
            log::warn!(
                "Ignoring option {index} for {}, it has {} options",
                group.description(),
                group.options().len()
            );
        }
        self
    }

    /// Select an option; returns `false` if `index` is outside the group
    pub fn select(&mut self, group: OptionGroup, index: usize) -> bool {
        if index >= group.options().len() {
            return false;
        }
        self.selected[group.slot()] = index;
        true
    }

    pub fn selection(&self, group: OptionGroup) -> usize {
        self.selected[group.slot()]
    }

    pub(crate) fn selection_mut(&mut self, group: OptionGroup) -> &mut usize {
        &mut self.selected[group.slot()]
    }

    /// Adopt every pending selection, logging each group that changed
    pub fn apply_changes(&mut self) -> Vec<OptionGroup> {
        let mut changed = Vec::new();
        for group in OptionGroup::ALL {
            let slot = group.slot();
            if self.selected[slot] != self.applied[slot] {
                log::info!(
                    "Changing {} to {}",
                    group.description(),
                    group.options()[self.selected[slot]]
                );
                self.applied[slot] = self.selected[slot];
                changed.push(group);
            }
        }
        changed
    }

    /// Applied repeat tier of a pass family
    pub fn repeat_tier(&self, group: OptionGroup) -> RepeatTier {
        RepeatTier::from_index(self.applied[group.slot()]).unwrap_or_default()
    }

    pub fn target_rate(&self) -> TargetRate {
        TargetRate::from_index(self.applied[OptionGroup::TargetFps.slot()]).unwrap_or_default()
    }

    pub fn iterations(&self) -> PassIterations {
        PassIterations {
            geometry: self.repeat_tier(OptionGroup::GeometryPassCount).iterations(),
            lighting: self.repeat_tier(OptionGroup::LightingPassCount).iterations(),
            post_process: self
                .repeat_tier(OptionGroup::PostProcessingPassCount)
                .iterations(),
        }
    }
}

/// Fixed startup configuration
#[derive(Debug, Clone)]
pub struct MultipassConfig {
    pub albedo_format: TextureFormat,
    pub normal_format: TextureFormat,
    pub post_input_format: TextureFormat,
    /// Depth formats in order of preference
    pub depth_format_candidates: Vec<TextureFormat>,
    /// Usage added to every attachment besides the attachment bit itself
    pub attachment_usage: TextureUsage,
    /// Per-attachment colour budget that keeps subpasses mergeable in tile memory
    pub tile_budget_bits: u32,
    /// Draw the debug UI on the last lighting iteration
    pub ui_overlay: bool,
}

impl Default for MultipassConfig {
    fn default() -> Self {
        Self {
            albedo_format: TextureFormat::Rgba8Unorm,
            normal_format: TextureFormat::A2b10g10r10UnormPack32,
            post_input_format: TextureFormat::Rgba8Unorm,
            depth_format_candidates: vec![
                TextureFormat::Depth32Float,
                TextureFormat::Depth24UnormStencil8,
                TextureFormat::Depth16Unorm,
            ],
            attachment_usage: TextureUsage::INPUT_ATTACHMENT | TextureUsage::TRANSIENT_ATTACHMENT,
            tile_budget_bits: 32,
            ui_overlay: true,
        }
    }
}

impl MultipassConfig {
    /// Colour formats of the transient attachments, by role
    pub fn color_formats(&self) -> [(AttachmentRole, TextureFormat); 3] {
        [
            (AttachmentRole::Albedo, self.albedo_format),
            (AttachmentRole::Normal, self.normal_format),
            (AttachmentRole::PostInput, self.post_input_format),
        ]
    }

    /// Check that every transient colour attachment fits the tile budget
    pub fn validate(&self) -> MultipassResult<()> {
        for (role, format) in self.color_formats() {
            let bits = format.bits_per_pixel();
            if format.is_depth() || bits > self.tile_budget_bits {
                return Err(MultipassError::TileBudgetExceeded {
                    role,
                    bits,
                    budget: self.tile_budget_bits,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::once(RepeatTier::X1, 1)]
    #[case::four(RepeatTier::X4, 4)]
    #[case::eight(RepeatTier::X8, 8)]
    #[case::twelve(RepeatTier::X12, 12)]
    fn test_tier_iterations(#[case] tier: RepeatTier, #[case] expected: u32) {
        assert_eq!(tier.iterations(), expected);
        let t = tier.index() as u32;
        assert_eq!(tier.iterations(), t * 4 + u32::from(t == 0));
    }

    #[rstest]
    #[case(0, 20.0)]
    #[case(1, 30.0)]
    #[case(2, 40.0)]
    #[case(3, 60.0)]
    fn test_rate_table(#[case] index: usize, #[case] fps: f32) {
        let rate = TargetRate::from_index(index).unwrap();
        assert_eq!(rate.fps(), fps);
        assert_eq!(rate.frame_time(), 1.0 / fps);
    }

    #[test]
    fn test_startup_defaults() {
        let state = RuntimeState::new();
        for group in OptionGroup::ALL {
            assert_eq!(state.selection(group), 0);
        }
        assert_eq!(state.target_rate(), TargetRate::Fps20);
        assert_eq!(
            state.iterations(),
            PassIterations {
                geometry: 1,
                lighting: 1,
                post_process: 1
            }
        );
    }

    #[test]
    fn test_select_rejects_out_of_range() {
        let mut state = RuntimeState::new();
        assert!(!state.select(OptionGroup::GeometryPassCount, 4));
        assert!(state.select(OptionGroup::GeometryPassCount, 3));
        assert_eq!(state.selection(OptionGroup::GeometryPassCount), 3);
    }

    #[test]
    fn test_selection_applies_on_next_frame() {
        let mut state = RuntimeState::new();
        state.select(OptionGroup::LightingPassCount, 2);
        assert_eq!(state.iterations().lighting, 1);

        let changed = state.apply_changes();
        assert_eq!(changed, vec![OptionGroup::LightingPassCount]);
        assert_eq!(state.iterations().lighting, 8);
    }

    #[test]
    fn test_unchanged_selection_is_idempotent() {
        let mut state = RuntimeState::new();
        state.select(OptionGroup::PostProcessingPassCount, 1);
        state.apply_changes();
        let before = state.iterations();

        for _ in 0..3 {
            assert!(state.apply_changes().is_empty());
            assert_eq!(state.iterations(), before);
        }
    }

    #[test]
    fn test_groups_are_independent() {
        let mut state = RuntimeState::new();
        state.select(OptionGroup::GeometryPassCount, 3);
        state.select(OptionGroup::TargetFps, 3);
        state.apply_changes();

        let iterations = state.iterations();
        assert_eq!(iterations.geometry, 12);
        assert_eq!(iterations.lighting, 1);
        assert_eq!(iterations.post_process, 1);
        assert_eq!(state.target_rate(), TargetRate::Fps60);
    }

    #[test]
    fn test_startup_selection_needs_no_apply() {
        let mut state = RuntimeState::new()
            .with_selection(OptionGroup::GeometryPassCount, 3)
            .with_selection(OptionGroup::TargetFps, 9);

        assert!(state.apply_changes().is_empty());
        assert_eq!(state.iterations().geometry, 12);
        assert_eq!(state.target_rate(), TargetRate::Fps20);
    }

    #[test]
    fn test_default_formats_fit_tile_budget() {
        assert!(MultipassConfig::default().validate().is_ok());
    }

    #[test]
    fn test_wide_normal_format_exceeds_budget() {
        let config = MultipassConfig {
            normal_format: TextureFormat::Rgba16Float,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(
            err,
            MultipassError::TileBudgetExceeded {
                role: AttachmentRole::Normal,
                bits: 64,
                budget: 32
            }
        ));
    }
}
