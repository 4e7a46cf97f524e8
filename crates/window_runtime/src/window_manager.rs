//! Shared geometry helpers used by the dialog controller: viewport bounds, snap targets, and
//! resize math.

use crate::{
    config::DesktopConfig,
    model::{PointerPosition, PositionMode, ResizeEdge, SnapSide, Viewport, WindowGeometry},
};

/// Keeps the window top at or below the menu bar.
pub fn clamp_below_menu_bar(geometry: WindowGeometry, menu_bar_height: i32) -> WindowGeometry {
    WindowGeometry {
        top: geometry.top.max(menu_bar_height),
        ..geometry
    }
}

/// Height available between the menu bar and the dock.
pub fn usable_height(viewport: Viewport, config: &DesktopConfig) -> i32 {
    (viewport.height - config.menu_bar_height - config.dock_reserved_height)
        .max(config.min_window_height)
}

/// Geometry for a window maximized into the usable viewport.
pub fn maximized_geometry(
    viewport: Viewport,
    config: &DesktopConfig,
    position_mode: PositionMode,
) -> WindowGeometry {
    WindowGeometry {
        left: 0,
        top: config.menu_bar_height,
        width: viewport.width.max(config.min_window_width),
        height: usable_height(viewport, config),
        position_mode,
    }
}

/// Geometry for a window snapped to half the viewport against `side`.
pub fn snapped_geometry(
    side: SnapSide,
    viewport: Viewport,
    config: &DesktopConfig,
    position_mode: PositionMode,
) -> WindowGeometry {
    let half_width = (viewport.width / 2).max(config.min_window_width);
    WindowGeometry {
        left: match side {
            SnapSide::Left => 0,
            SnapSide::Right => viewport.width - half_width,
        },
        top: config.menu_bar_height,
        width: half_width,
        height: usable_height(viewport, config),
        position_mode,
    }
}

/// Returns the edge a drag release would snap to, if any.
///
/// A window is a left candidate when its left edge or the pointer is within the threshold of
/// the viewport's left edge; the right side mirrors this with the window's right edge. When both
/// match, the closer edge wins and ties go left.
pub fn snap_candidate(
    geometry: WindowGeometry,
    pointer: PointerPosition,
    viewport: Viewport,
    config: &DesktopConfig,
) -> Option<SnapSide> {
    let threshold = config.snap.for_viewport_width(viewport.width);
    let left_distance = f64::from(geometry.left.min(pointer.x));
    let right_distance =
        f64::from((viewport.width - geometry.right()).min(viewport.width - pointer.x));

    let near_left = left_distance <= threshold;
    let near_right = right_distance <= threshold;
    match (near_left, near_right) {
        (true, true) if right_distance < left_distance => Some(SnapSide::Right),
        (true, _) => Some(SnapSide::Left),
        (false, true) => Some(SnapSide::Right),
        (false, false) => None,
    }
}

/// Restores `prior` size around the pointer when a drag pulls a window out of a snap.
///
/// The pointer keeps the same fractional x offset and the same y offset inside the header so
/// the cursor stays anchored to the grab point.
pub fn unsnap_under_pointer(
    snapped: WindowGeometry,
    prior: WindowGeometry,
    pointer: PointerPosition,
    menu_bar_height: i32,
) -> WindowGeometry {
    let width = snapped.width.max(1);
    let grab_x = (pointer.x - snapped.left).clamp(0, width);
    let anchored_x = i64::from(grab_x) * i64::from(prior.width) / i64::from(width);
    let anchored_x = i32::try_from(anchored_x).unwrap_or(prior.width);
    let grab_y = (pointer.y - snapped.top).clamp(0, prior.height.max(0));

    clamp_below_menu_bar(
        WindowGeometry {
            left: pointer.x - anchored_x,
            top: pointer.y - grab_y,
            ..prior
        },
        menu_bar_height,
    )
}

/// Applies resize deltas for a given edge/corner drag.
pub fn resize_rect(start: WindowGeometry, edge: ResizeEdge, dx: i32, dy: i32) -> WindowGeometry {
    match edge {
        ResizeEdge::East => WindowGeometry {
            width: start.width + dx,
            ..start
        },
        ResizeEdge::West => WindowGeometry {
            left: start.left + dx,
            width: start.width - dx,
            ..start
        },
        ResizeEdge::South => WindowGeometry {
            height: start.height + dy,
            ..start
        },
        ResizeEdge::North => WindowGeometry {
            top: start.top + dy,
            height: start.height - dy,
            ..start
        },
        ResizeEdge::NorthEast => WindowGeometry {
            top: start.top + dy,
            height: start.height - dy,
            width: start.width + dx,
            ..start
        },
        ResizeEdge::NorthWest => WindowGeometry {
            left: start.left + dx,
            top: start.top + dy,
            width: start.width - dx,
            height: start.height - dy,
            ..start
        },
        ResizeEdge::SouthEast => WindowGeometry {
            width: start.width + dx,
            height: start.height + dy,
            ..start
        },
        ResizeEdge::SouthWest => WindowGeometry {
            left: start.left + dx,
            width: start.width - dx,
            height: start.height + dy,
            ..start
        },
    }
}

/// Resizes from `start` and enforces minimum size plus the menu-bar boundary.
///
/// Edges opposite the dragged handle stay fixed. A north handle that would cross the menu bar
/// pins the top to it and shrinks the height instead.
pub fn constrained_resize(
    start: WindowGeometry,
    edge: ResizeEdge,
    dx: i32,
    dy: i32,
    config: &DesktopConfig,
) -> WindowGeometry {
    let mut next = resize_rect(start, edge, dx, dy);

    if next.width < config.min_window_width {
        next.width = config.min_window_width;
        if edge.moves_left_edge() {
            next.left = start.right() - config.min_window_width;
        }
    }

    if edge.moves_top_edge() {
        let bottom = start.bottom();
        if next.top < config.menu_bar_height {
            next.top = config.menu_bar_height;
            next.height = bottom - next.top;
        }
        if next.height < config.min_window_height {
            next.height = config.min_window_height;
            next.top = (bottom - config.min_window_height).max(config.menu_bar_height);
        }
    } else if next.height < config.min_window_height {
        next.height = config.min_window_height;
    }

    next
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn viewport() -> Viewport {
        Viewport {
            width: 800,
            height: 600,
        }
    }

    #[test]
    fn snapped_geometry_uses_half_width_and_usable_height() {
        let config = DesktopConfig::default();
        let left = snapped_geometry(SnapSide::Left, viewport(), &config, PositionMode::Fixed);
        let right = snapped_geometry(SnapSide::Right, viewport(), &config, PositionMode::Fixed);

        assert_eq!(left, WindowGeometry::new(0, 24, 400, 504));
        assert_eq!(right, WindowGeometry::new(400, 24, 400, 504));
    }

    #[test]
    fn snap_candidate_uses_window_edge_or_pointer() {
        let config = DesktopConfig::default();
        let far = WindowGeometry::new(200, 100, 300, 200);

        assert_eq!(
            snap_candidate(far, PointerPosition::new(300, 110), viewport(), &config),
            None
        );
        assert_eq!(
            snap_candidate(far, PointerPosition::new(2, 110), viewport(), &config),
            Some(SnapSide::Left)
        );
        assert_eq!(
            snap_candidate(far, PointerPosition::new(798, 110), viewport(), &config),
            Some(SnapSide::Right)
        );
        let flush_right = WindowGeometry::new(500, 100, 300, 200);
        assert_eq!(
            snap_candidate(flush_right, PointerPosition::new(600, 110), viewport(), &config),
            Some(SnapSide::Right)
        );
        let past_left = WindowGeometry::new(-40, 100, 300, 200);
        assert_eq!(
            snap_candidate(past_left, PointerPosition::new(100, 110), viewport(), &config),
            Some(SnapSide::Left)
        );
    }

    #[test]
    fn unsnap_keeps_pointer_proportionally_anchored() {
        let snapped = WindowGeometry::new(0, 24, 400, 504);
        let prior = WindowGeometry::new(300, 200, 200, 150);

        let restored = unsnap_under_pointer(snapped, prior, PointerPosition::new(100, 34), 24);

        assert_eq!(restored.width, 200);
        assert_eq!(restored.height, 150);
        assert_eq!(restored.left, 50);
        assert_eq!(restored.top, 24);
    }

    #[test]
    fn resize_west_below_minimum_keeps_right_edge() {
        let config = DesktopConfig::default();
        let start = WindowGeometry::new(100, 100, 300, 200);

        let next = constrained_resize(start, ResizeEdge::West, 200, 0, &config);

        assert_eq!(next.width, config.min_window_width);
        assert_eq!(next.right(), start.right());
    }

    #[test]
    fn resize_north_shrinks_instead_of_crossing_menu_bar() {
        let config = DesktopConfig::default();
        let start = WindowGeometry::new(100, 100, 300, 200);

        let next = constrained_resize(start, ResizeEdge::North, 0, -500, &config);

        assert_eq!(next.top, config.menu_bar_height);
        assert_eq!(next.bottom(), start.bottom());
    }

    #[test]
    fn resize_south_east_grows_both_axes() {
        let config = DesktopConfig::default();
        let start = WindowGeometry::new(10, 50, 300, 200);
        assert_eq!(
            constrained_resize(start, ResizeEdge::SouthEast, 25, 40, &config),
            WindowGeometry::new(10, 50, 325, 240)
        );
    }
}
