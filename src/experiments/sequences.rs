use crate::frame::Frame;

/// All-off frame.
pub fn blank(width: usize) -> Frame {
    Frame::zeros(width, width)
}

/// A full-height vertical line at column `x`.
pub fn column(width: usize, x: usize) -> Frame {
    Frame::from_fn(width, width, |cx, _| cx == x)
}

/// A vertical line stepping one column right per frame, left edge to right edge.
pub fn moving_line(width: usize) -> Vec<Frame> {
    (0..width).map(|x| column(width, x)).collect()
}

/// A single pixel bouncing off the walls of a `size` x `size` square.
///
/// The pixel moves one column per frame and one row every other frame. On a
/// 16 x 16 grid it returns to its start after 60 steps.
pub fn bouncing_pixel(size: usize, steps: usize) -> Vec<Frame> {
    if size == 0 {
        return Vec::new();
    }
    let (mut x, mut y) = (0i64, 0i64);
    let (mut dx, mut dy) = (1i64, 1i64);
    let bound = 0..size as i64;
    let mut frames = Vec::with_capacity(steps);
    for i in 0..steps {
        if !bound.contains(&(x + dx)) {
            dx = -dx;
        }
        if !bound.contains(&(y + dy)) {
            dy = -dy;
        }
        let mut f = blank(size);
        f.set(x as usize, y as usize, true);
        frames.push(f);
        x += dx;
        if i % 2 == 1 {
            y += dy;
        }
    }
    frames
}

/// Bouncing pixel for one full period, then a moving line.
pub fn bounce_then_line(size: usize) -> Vec<Frame> {
    let mut frames = bouncing_pixel(size, 61);
    frames.extend(moving_line(size));
    frames
}

/// Look up a named sequence for a `width` x `width` grid.
pub fn by_name(name: &str, width: usize) -> Option<Vec<Frame>> {
    match name {
        "line" => Some(moving_line(width)),
        "bounce" => Some(bouncing_pixel(width, 61)),
        "bounce-then-line" => Some(bounce_then_line(width)),
        _ => None,
    }
}
