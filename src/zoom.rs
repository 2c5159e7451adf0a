//! Continuous-to-discrete zoom controller for the photo grid.
//!
//! A pinch gesture reports a continuous multiplicative scale signal (1.0 at
//! gesture start). The controller maps it onto a finite, orientation-dependent
//! ladder of column counts with direction-aware hysteresis: committed stage
//! changes re-anchor the gesture baseline, in-between motion is rendered as a
//! live scale so the grid appears to zoom continuously, and releasing the
//! gesture either commits one more outward stage or springs back to neutral.

/// Elastic floor when pinching inward at the innermost stage.
const ELASTIC_IN_FLOOR: f32 = 0.95;
/// Elastic ceiling when spreading outward at the outermost stage.
const ELASTIC_OUT_CEIL: f32 = 1.1;
/// Horizontal spacing reserved per column, in layout units.
const COLUMN_SPACING: f32 = 2.0;

/// Default persisted item size when no viewport has been measured yet.
pub const DEFAULT_ITEM_SIZE: f32 = 100.0;
/// Default persisted position in the ladder.
pub const DEFAULT_STAGE_INDEX: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    /// Column-count ladder, index 0 = most zoomed in (fewest columns).
    #[must_use]
    pub fn stages(self) -> &'static [u32] {
        match self {
            Orientation::Portrait => &[1, 3, 5],
            Orientation::Landscape => &[4, 6, 8, 9],
        }
    }
}

/// What the renderer should do when a gesture ends.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEnd {
    /// The net magnification crossed the commit threshold: animate the live
    /// scale to `animate_to`, then call [`ZoomStageController::finish_commit`].
    CommitOut { animate_to: f32 },
    /// Below the threshold: the controller already snapped back to neutral.
    SpringBack,
}

#[derive(Debug)]
pub struct ZoomStageController {
    orientation: Orientation,
    viewport_width: f32,
    stage_index: usize,
    item_size: f32,
    /// Size ratio to the next stage outward; the live scale saturates here.
    zoom_factor: f32,
    // Transient gesture state; neutral while idle.
    scale: f32,
    scale_factor: f32,
    baseline: f32,
    last_adjusted: f32,
    is_magnifying: bool,
    active: bool,
    pending_commit: bool,
}

impl ZoomStageController {
    /// Restore a controller from persisted preferences. Sizes are provisional
    /// until [`set_viewport_width`](Self::set_viewport_width) is called with a
    /// measured width.
    #[must_use]
    pub fn new(orientation: Orientation, stage_index: usize, item_size: f32) -> Self {
        let max = orientation.stages().len() - 1;
        Self {
            orientation,
            viewport_width: 0.0,
            stage_index: stage_index.min(max),
            item_size,
            zoom_factor: 1.0,
            scale: 1.0,
            scale_factor: 1.0,
            baseline: 0.0,
            last_adjusted: 0.0,
            is_magnifying: false,
            active: false,
            pending_commit: false,
        }
    }

    #[must_use]
    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    #[must_use]
    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    /// Column count at the current stage.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.stage_columns(self.stage_index as isize)
    }

    /// Rendered item size for the current stage.
    #[must_use]
    pub fn item_size(&self) -> f32 {
        self.item_size
    }

    /// Live scale multiplier for the grid; 1.0 while idle.
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Ladder lookup with boundary clamping: an out-of-range index yields the
    /// boundary stage rather than failing.
    #[must_use]
    pub fn stage_columns(&self, index: isize) -> u32 {
        let stages = self.orientation.stages();
        if index < 0 {
            stages[0]
        } else if index as usize >= stages.len() {
            stages[stages.len() - 1]
        } else {
            stages[index as usize]
        }
    }

    /// Item size for an arbitrary ladder position: the viewport minus the
    /// per-column spacing, split across the columns.
    #[must_use]
    pub fn item_size_for(&self, index: isize) -> f32 {
        let columns = self.stage_columns(index) as f32;
        (self.viewport_width - COLUMN_SPACING * columns) / columns
    }

    /// The grid measured (or re-measured) its width; recompute sizes.
    pub fn set_viewport_width(&mut self, width: f32) {
        self.viewport_width = width;
        if width > 0.0 {
            self.refresh();
        }
    }

    /// Orientation change swaps the whole ladder; an in-flight gesture is
    /// abandoned and the index clamped into the new ladder.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        if orientation == self.orientation {
            return;
        }
        self.orientation = orientation;
        self.stage_index = self.stage_index.min(orientation.stages().len() - 1);
        self.reset_transients();
    }

    /// A new pinch began. Ignored while another gesture is active.
    pub fn begin_gesture(&mut self) {
        if self.active {
            return;
        }
        self.active = true;
    }

    /// Apply one update of the continuous gesture signal.
    pub fn update(&mut self, signal: f32) {
        if !self.active {
            self.begin_gesture();
        }
        let mut adjusted = signal - self.baseline;

        if self.scale <= 1.0 && adjusted < 1.0 {
            // Pinch-in motion at or below neutral: step inward on the ladder
            // (more columns, smaller items), or stretch elastically at the end.
            self.is_magnifying = false;
            if self.stage_index >= self.max_stage_index() {
                adjusted = adjusted.max(ELASTIC_IN_FLOOR);
                self.scale = self.scale_factor - (1.0 - adjusted);
            } else {
                let updated = self.item_size_for(self.stage_index as isize + 1);
                // Measure the next delta from here; otherwise the same finger
                // travel would be counted into the following stage too.
                self.baseline = signal - 1.0;
                self.zoom_factor = updated / self.item_size;
                self.scale_factor = self.item_size / updated;
                self.scale = self.scale_factor;
                self.item_size = updated;
                self.stage_index += 1;
            }
        } else if self.scale >= self.zoom_factor && adjusted > 1.0 {
            // Spread motion past the expansion threshold: step outward, or
            // stretch elastically at the outermost stage.
            self.is_magnifying = true;
            if self.stage_index == 0 {
                adjusted = adjusted.min(ELASTIC_OUT_CEIL);
                self.scale = adjusted;
            } else {
                self.stage_index -= 1;
                self.baseline = signal - 1.0;
                self.refresh();
                self.scale_factor = 1.0;
                self.scale = 1.0;
            }
        } else {
            // Neither threshold crossed: interpolate so the in-between motion
            // renders continuously instead of snapping.
            self.scale = if self.is_magnifying {
                adjusted
            } else {
                self.scale_factor - (1.0 - adjusted)
            };
        }

        self.last_adjusted = adjusted;
    }

    /// The fingers lifted. Decides between committing one outward stage and
    /// springing back to neutral.
    pub fn end_gesture(&mut self) -> GestureEnd {
        if !self.active {
            return GestureEnd::SpringBack;
        }
        if self.last_adjusted > 1.0 {
            // Finish the pending outward step after the caller's animation.
            self.pending_commit = true;
            GestureEnd::CommitOut {
                animate_to: self.zoom_factor,
            }
        } else {
            self.reset_transients();
            GestureEnd::SpringBack
        }
    }

    /// Called after the commit animation finishes: take the final outward
    /// step (clamped at the floor) and return to idle.
    pub fn finish_commit(&mut self) {
        if !self.pending_commit {
            return;
        }
        if self.stage_index > 0 {
            self.stage_index -= 1;
        }
        self.reset_transients();
    }

    fn max_stage_index(&self) -> usize {
        self.orientation.stages().len() - 1
    }

    /// Recompute the current item size and the outward expansion ratio.
    fn refresh(&mut self) {
        let current = self.item_size_for(self.stage_index as isize);
        let magnified = self.item_size_for(self.stage_index as isize - 1);
        self.zoom_factor = magnified / current;
        self.item_size = current;
    }

    fn reset_transients(&mut self) {
        if self.viewport_width > 0.0 {
            self.refresh();
        }
        self.scale = 1.0;
        self.scale_factor = 1.0;
        self.baseline = 0.0;
        self.last_adjusted = 0.0;
        self.is_magnifying = false;
        self.active = false;
        self.pending_commit = false;
    }
}
