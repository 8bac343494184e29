//! Geometry helpers shared by the window state machine and the environment.

use crate::model::{ResizeHandle, Viewport, WindowRect};

/// Minimum allowed window width.
pub const MIN_WINDOW_WIDTH: i32 = 200;
/// Minimum allowed window height.
pub const MIN_WINDOW_HEIGHT: i32 = 100;
/// Left/top margin of the first default placement.
pub const CASCADE_ORIGIN: i32 = 40;
const CASCADE_SLOTS: i32 = 8;

/// Moves `rect` so `0 <= x <= width - w` and `0 <= y <= height - h`. Size is untouched.
pub fn clamp_position(rect: WindowRect, viewport: Viewport) -> WindowRect {
    let max_x = (viewport.width - rect.w).max(0);
    let max_y = (viewport.height - rect.h).max(0);
    WindowRect {
        x: rect.x.clamp(0, max_x),
        y: rect.y.clamp(0, max_y),
        ..rect
    }
}

/// Applies the minimum size, shrinks to the viewport where possible, then clamps position.
pub fn fit_rect(rect: WindowRect, viewport: Viewport) -> WindowRect {
    let w = rect
        .w
        .max(MIN_WINDOW_WIDTH)
        .min(viewport.width.max(MIN_WINDOW_WIDTH));
    let h = rect
        .h
        .max(MIN_WINDOW_HEIGHT)
        .min(viewport.height.max(MIN_WINDOW_HEIGHT));
    clamp_position(WindowRect { w, h, ..rect }, viewport)
}

/// Position for a drag: the start rect displaced by the pointer delta, kept inside the viewport.
pub fn drag_rect(start: WindowRect, dx: i32, dy: i32, viewport: Viewport) -> WindowRect {
    clamp_position(start.offset(dx, dy), viewport)
}

/// Geometry for a resize drag of `handle` by `(dx, dy)` from `start`.
///
/// Grips on the left/top move the position so the opposite edge stays where it was.
pub fn resize_rect(
    start: WindowRect,
    handle: ResizeHandle,
    dx: i32,
    dy: i32,
    viewport: Viewport,
) -> WindowRect {
    let (h_dir, v_dir) = handle.direction();
    let (x, w) = resize_axis(start.x, start.w, h_dir, dx, MIN_WINDOW_WIDTH, viewport.width);
    let (y, h) = resize_axis(start.y, start.h, v_dir, dy, MIN_WINDOW_HEIGHT, viewport.height);
    clamp_position(WindowRect { x, y, w, h }, viewport)
}

fn resize_axis(
    origin: i32,
    length: i32,
    direction: i32,
    delta: i32,
    min: i32,
    bound: i32,
) -> (i32, i32) {
    match direction.signum() {
        0 => (origin, length),
        1 => {
            let limit = (bound - origin).max(min);
            (origin, (length + delta).max(min).min(limit))
        }
        _ => {
            let far = origin + length;
            let resized = (length - delta).max(min).min(far.max(min));
            (far - resized, resized)
        }
    }
}

/// Default placement for the `index`-th window: a diagonal cascade that wraps every few slots.
pub fn cascade_rect(index: usize, step: i32, w: i32, h: i32, viewport: Viewport) -> WindowRect {
    let slot = (index as i32) % CASCADE_SLOTS;
    fit_rect(
        WindowRect {
            x: CASCADE_ORIGIN + slot * step,
            y: CASCADE_ORIGIN + slot * step,
            w,
            h,
        },
        viewport,
    )
}

/// Returns whether `rect` satisfies the viewport and minimum-size invariants.
pub fn rect_within(rect: WindowRect, viewport: Viewport) -> bool {
    rect.w >= MIN_WINDOW_WIDTH
        && rect.h >= MIN_WINDOW_HEIGHT
        && rect.x >= 0
        && rect.y >= 0
        && rect.x <= (viewport.width - rect.w).max(0)
        && rect.y <= (viewport.height - rect.h).max(0)
}
