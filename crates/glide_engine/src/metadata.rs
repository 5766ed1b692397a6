//! Scroll metadata
//!
//! The authoritative description of one scrollable region: offset, zoom,
//! composition bounds, scrollable rect, overscroll policy and snap points.
//! Owned exclusively by the controller; the content thread replaces it
//! wholesale via `notify_layers_updated`, never field by field.
//!
//! Units: the scroll offset and scrollable rect are in content (CSS)
//! pixels; composition bounds are in screen pixels; `zoom` converts
//! between the two.

use glide_core::geometry::COORD_EPSILON;
use glide_core::{Point, Rect, Vector};
use thiserror::Error;

/// Per-axis policy for what happens to unconsumed scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverscrollBehavior {
    /// Allow both the local overscroll effect and handoff.
    #[default]
    Auto,
    /// No handoff to ancestors; local overscroll still allowed.
    Contain,
    /// Neither handoff nor local overscroll.
    None,
}

impl OverscrollBehavior {
    pub fn allows_handoff(&self) -> bool {
        matches!(self, OverscrollBehavior::Auto)
    }

    pub fn allows_overscroll_effect(&self) -> bool {
        !matches!(self, OverscrollBehavior::None)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollDirection {
    Horizontal,
    Vertical,
}

/// A content-declared snap offset with a stable identity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapPoint {
    pub offset: f32,
    pub id: u64,
}

/// Snap targets selected by the last snapping scroll, reported to content
/// when the scroll settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SnapTargetIds {
    pub x: Option<u64>,
    pub y: Option<u64>,
}

/// How a destination should be adjusted toward snap points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapFlags {
    /// Snap to the point nearest the intended end position.
    IntendedEndPosition,
    /// Snap to the next point in the direction of travel, even when the
    /// raw delta falls short of it.
    IntendedDirection,
}

/// Snap point declarations for both axes, sorted by offset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SnapInfo {
    pub x: Vec<SnapPoint>,
    pub y: Vec<SnapPoint>,
}

fn select_snap(
    points: &[SnapPoint],
    current: f32,
    destination: f32,
    flags: SnapFlags,
) -> Option<(f32, u64)> {
    match flags {
        SnapFlags::IntendedEndPosition => points
            .iter()
            .min_by(|a, b| {
                let da = (a.offset - destination).abs();
                let db = (b.offset - destination).abs();
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
            })
            .map(|p| (p.offset, p.id)),
        SnapFlags::IntendedDirection => {
            let direction = destination - current;
            if direction.abs() <= COORD_EPSILON {
                return None;
            }
            points
                .iter()
                .filter(|p| (p.offset - current) * direction.signum() > COORD_EPSILON)
                .min_by(|a, b| {
                    let da = (a.offset - current).abs();
                    let db = (b.offset - current).abs();
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
                .map(|p| (p.offset, p.id))
        }
    }
}

impl SnapInfo {
    pub fn is_empty(&self) -> bool {
        self.x.is_empty() && self.y.is_empty()
    }

    /// Adjust a scroll destination toward declared snap points. Returns
    /// `None` when no axis snaps, leaving the raw destination in effect.
    pub fn adjust_destination(
        &self,
        current: Point,
        destination: Point,
        flags: SnapFlags,
    ) -> Option<(Point, SnapTargetIds)> {
        let snap_x = select_snap(&self.x, current.x, destination.x, flags);
        let snap_y = select_snap(&self.y, current.y, destination.y, flags);
        if snap_x.is_none() && snap_y.is_none() {
            return None;
        }
        let mut adjusted = destination;
        let mut ids = SnapTargetIds::default();
        if let Some((offset, id)) = snap_x {
            adjusted.x = offset;
            ids.x = Some(id);
        }
        if let Some((offset, id)) = snap_y {
            adjusted.y = offset;
            ids.y = Some(id);
        }
        Some((adjusted, ids))
    }
}

/// Rejected metadata update; the prior metadata stays in effect.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("zoom must be finite and positive, got {0}")]
    InvalidZoom(f32),
    #[error("composition bounds must be finite and non-empty")]
    InvalidCompositionBounds,
    #[error("scrollable rect must be finite")]
    InvalidScrollableRect,
    #[error("scroll offset must be finite")]
    NonFiniteOffset,
}

/// Authoritative layout state for one scrollable region.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrollMetadata {
    /// Visual scroll offset in content units.
    pub scroll_offset: Point,
    /// Content-to-screen scale.
    pub zoom: f32,
    /// Viewport rect in screen units.
    pub composition_bounds: Rect,
    /// Scrollable content rect in content units.
    pub scrollable_rect: Rect,
    pub overscroll_behavior_x: OverscrollBehavior,
    pub overscroll_behavior_y: OverscrollBehavior,
    /// A direction the region refuses to scroll (single-line text inputs);
    /// displacement along it converts directly to overscroll.
    pub disregarded_direction: Option<ScrollDirection>,
    /// Content-side scroll generation, bumped on each authoritative update.
    pub generation: u64,
    pub snap: SnapInfo,
}

impl Default for ScrollMetadata {
    fn default() -> Self {
        Self {
            scroll_offset: Point::ZERO,
            zoom: 1.0,
            composition_bounds: Rect::default(),
            scrollable_rect: Rect::default(),
            overscroll_behavior_x: OverscrollBehavior::default(),
            overscroll_behavior_y: OverscrollBehavior::default(),
            disregarded_direction: None,
            generation: 0,
            snap: SnapInfo::default(),
        }
    }
}

impl ScrollMetadata {
    /// Reject structurally invalid updates (NaN zoom, empty bounds).
    pub fn validate(&self) -> Result<(), MetadataError> {
        if !self.zoom.is_finite() || self.zoom <= 0.0 {
            return Err(MetadataError::InvalidZoom(self.zoom));
        }
        if !self.composition_bounds.is_finite() || self.composition_bounds.is_empty() {
            return Err(MetadataError::InvalidCompositionBounds);
        }
        if !self.scrollable_rect.is_finite() {
            return Err(MetadataError::InvalidScrollableRect);
        }
        if !self.scroll_offset.is_finite() {
            return Err(MetadataError::NonFiniteOffset);
        }
        Ok(())
    }

    /// Composition bounds expressed in content units at the current zoom.
    pub fn composition_size_in_content(&self) -> Point {
        self.composition_bounds.size() / self.zoom
    }

    /// Scroll range along X in content units: `(min, max)`.
    pub fn scroll_range_x(&self) -> (f32, f32) {
        let comp = self.composition_size_in_content();
        let min = self.scrollable_rect.x;
        let max = (self.scrollable_rect.right() - comp.x).max(min);
        (min, max)
    }

    /// Scroll range along Y in content units: `(min, max)`.
    pub fn scroll_range_y(&self) -> (f32, f32) {
        let comp = self.composition_size_in_content();
        let min = self.scrollable_rect.y;
        let max = (self.scrollable_rect.bottom() - comp.y).max(min);
        (min, max)
    }

    /// Clamp the stored offset into the scroll range.
    pub fn clamp_scroll_offset(&mut self) {
        let (min_x, max_x) = self.scroll_range_x();
        let (min_y, max_y) = self.scroll_range_y();
        self.scroll_offset = self
            .scroll_offset
            .clamp(Point::new(min_x, min_y), Point::new(max_x, max_y));
    }

    /// Convert a screen-space displacement to content units. A degenerate
    /// zoom yields zero ("no scroll possible") rather than dividing by it.
    pub fn screen_to_content(&self, v: Vector) -> Vector {
        v / self.zoom
    }

    /// Scale the zoom about a focus point in content coordinates, keeping
    /// the focal point visually fixed. The offset is re-clamped afterward,
    /// so zooming near an edge cannot leave the offset out of range.
    pub fn scale_with_focus(&mut self, ratio: f32, focus: Point) {
        if !ratio.is_finite() || ratio <= 0.0 {
            tracing::warn!(ratio, "ignoring degenerate zoom ratio");
            return;
        }
        self.zoom *= ratio;
        self.scroll_offset += focus * (1.0 - 1.0 / ratio);
        self.clamp_scroll_offset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata() -> ScrollMetadata {
        ScrollMetadata {
            composition_bounds: Rect::new(0.0, 0.0, 400.0, 400.0),
            scrollable_rect: Rect::new(0.0, 0.0, 400.0, 1000.0),
            ..Default::default()
        }
    }

    #[test]
    fn scroll_range_accounts_for_zoom() {
        let mut m = metadata();
        assert_eq!(m.scroll_range_y(), (0.0, 600.0));
        m.zoom = 2.0;
        // Half the content is visible, so more of it can scroll past.
        assert_eq!(m.scroll_range_y(), (0.0, 800.0));
    }

    #[test]
    fn range_is_empty_when_content_fits() {
        let mut m = metadata();
        m.scrollable_rect = Rect::new(0.0, 0.0, 300.0, 300.0);
        assert_eq!(m.scroll_range_x(), (0.0, 0.0));
        assert_eq!(m.scroll_range_y(), (0.0, 0.0));
    }

    #[test]
    fn validate_rejects_degenerate_updates() {
        let mut m = metadata();
        assert!(m.validate().is_ok());
        m.zoom = f32::NAN;
        assert!(m.validate().is_err());

        let mut m = metadata();
        m.composition_bounds = Rect::default();
        assert!(m.validate().is_err());
    }

    #[test]
    fn scale_with_focus_keeps_offset_in_range() {
        let mut m = metadata();
        m.scroll_offset = Point::new(0.0, 600.0);
        m.scale_with_focus(4.0, Point::new(200.0, 800.0));
        let (min_y, max_y) = m.scroll_range_y();
        assert!(m.scroll_offset.y >= min_y && m.scroll_offset.y <= max_y);
        assert_eq!(m.zoom, 4.0);
    }

    #[test]
    fn zero_ratio_scale_is_rejected() {
        let mut m = metadata();
        let before = m.clone();
        m.scale_with_focus(0.0, Point::new(10.0, 10.0));
        m.scale_with_focus(f32::NAN, Point::new(10.0, 10.0));
        assert_eq!(m, before);
    }

    #[test]
    fn direction_snap_retargets_short_deltas() {
        let snap = SnapInfo {
            x: Vec::new(),
            y: vec![
                SnapPoint { offset: 0.0, id: 1 },
                SnapPoint { offset: 500.0, id: 2 },
            ],
        };
        // A small downward wheel tick from 0 falls far short of the snap
        // point at 500, but IntendedDirection still retargets to it.
        let (dest, ids) = snap
            .adjust_destination(
                Point::new(0.0, 0.0),
                Point::new(0.0, 40.0),
                SnapFlags::IntendedDirection,
            )
            .unwrap();
        assert_eq!(dest.y, 500.0);
        assert_eq!(ids.y, Some(2));
        assert_eq!(ids.x, None);
    }

    #[test]
    fn end_position_snap_picks_nearest() {
        let snap = SnapInfo {
            x: Vec::new(),
            y: vec![
                SnapPoint { offset: 0.0, id: 1 },
                SnapPoint { offset: 500.0, id: 2 },
            ],
        };
        let (dest, ids) = snap
            .adjust_destination(
                Point::new(0.0, 450.0),
                Point::new(0.0, 450.0),
                SnapFlags::IntendedEndPosition,
            )
            .unwrap();
        assert_eq!(dest.y, 500.0);
        assert_eq!(ids.y, Some(2));
    }

    #[test]
    fn no_snap_points_leaves_destination_untouched() {
        let snap = SnapInfo::default();
        assert!(snap
            .adjust_destination(
                Point::ZERO,
                Point::new(0.0, 40.0),
                SnapFlags::IntendedDirection
            )
            .is_none());
    }
}
