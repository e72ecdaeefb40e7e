use crate::braille::BrailleCanvas;

/// Draw a line using Bresenham's algorithm.
pub fn draw_line(canvas: &mut BrailleCanvas, x0: i32, y0: i32, x1: i32, y1: i32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    let mut x = x0;
    let mut y = y0;

    loop {
        canvas.set_pixel_signed(x, y);

        if x == x1 && y == y1 {
            break;
        }

        let e2 = 2 * err;

        if e2 >= dy {
            if x == x1 {
                break;
            }
            err += dy;
            x += sx;
        }

        if e2 <= dx {
            if y == y1 {
                break;
            }
            err += dx;
            y += sy;
        }
    }
}

/// Draw a filled circle (marker body).
pub fn draw_circle(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw a circle outline (incomplete-module marker).
pub fn draw_ring(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: i32) {
    let inner = (radius - 1).max(0);
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            let d2 = dx * dx + dy * dy;
            if d2 <= radius * radius && d2 > inner * inner {
                canvas.set_pixel_signed(cx + dx, cy + dy);
            }
        }
    }
}

/// Draw the circular horizon of the globe disk.
pub fn draw_disk_outline(canvas: &mut BrailleCanvas, cx: i32, cy: i32, radius: f64) {
    let steps = ((radius * std::f64::consts::TAU) as usize).clamp(32, 2048);
    for i in 0..steps {
        let angle = i as f64 / steps as f64 * std::f64::consts::TAU;
        let x = cx + (angle.cos() * radius).round() as i32;
        let y = cy + (angle.sin() * radius).round() as i32;
        canvas.set_pixel_signed(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_line_sets_pixels() {
        let mut canvas = BrailleCanvas::new(5, 1);
        draw_line(&mut canvas, 0, 0, 9, 0);
        assert!(canvas.to_string().chars().all(|c| c != '\u{2800}'));
    }

    #[test]
    fn single_point_line() {
        let mut canvas = BrailleCanvas::new(1, 1);
        draw_line(&mut canvas, 1, 1, 1, 1);
        assert_eq!(canvas.to_string(), "⠐"); // dot (1,1) = 0x10
    }

    #[test]
    fn ring_leaves_center_empty() {
        let mut canvas = BrailleCanvas::new(4, 2);
        draw_ring(&mut canvas, 4, 4, 3);
        // Center pixel untouched: cell (2,1) of char (2,1)
        let mut reference = BrailleCanvas::new(4, 2);
        draw_circle(&mut reference, 4, 4, 3);
        assert_ne!(canvas.to_string(), reference.to_string());
    }

    #[test]
    fn disk_outline_stays_in_bounds() {
        let mut canvas = BrailleCanvas::new(10, 5);
        // Larger than the canvas; must not panic
        draw_disk_outline(&mut canvas, 10, 10, 40.0);
    }
}
