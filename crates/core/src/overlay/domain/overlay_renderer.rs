use crate::attention::domain::landmark_set::{LandmarkError, LandmarkLayout, LandmarkSet, Point3};
use crate::attention::domain::verdict::Verdict;
use crate::shared::frame::{Frame, Rgb};

pub const FOCUSED_COLOR: Rgb = [0, 255, 0];
pub const WARNING_COLOR: Rgb = [255, 165, 0];
pub const DISTRACTED_COLOR: Rgb = [255, 0, 0];

/// Fraction of the yaw threshold at which the heading arrow turns orange.
pub const WARNING_FRACTION: f64 = 0.7;

const ARROW_LENGTH: f64 = 100.0;
/// Arrowhead length relative to the shaft.
const ARROW_TIP_FRACTION: f64 = 0.2;
const STROKE: i64 = 2;

/// Draws the eye outline and a heading arrow onto a frame.
///
/// The eye quadrilateral joins both outer and inner corners; the arrow
/// starts at the nose tip and points sideways along `sin(yaw)`.
#[derive(Clone, Debug)]
pub struct OverlayRenderer {
    layout: LandmarkLayout,
    yaw_threshold: f64,
}

impl OverlayRenderer {
    pub fn new(layout: LandmarkLayout, yaw_threshold: f64) -> Self {
        Self {
            layout,
            yaw_threshold,
        }
    }

    /// Annotates `frame` in place. Frames without landmarks or without a
    /// measured pose are left untouched.
    pub fn draw(
        &self,
        frame: &mut Frame,
        landmarks: Option<&LandmarkSet>,
        verdict: &Verdict,
    ) -> Result<(), LandmarkError> {
        let (Some(landmarks), Some(pose)) = (landmarks, verdict.pose()) else {
            return Ok(());
        };

        let [left_outer, _, _, left_inner, _, _] = self.layout.left_eye;
        let [right_inner, _, _, right_outer, _, _] = self.layout.right_eye;
        let outline_color = if verdict.distracted {
            DISTRACTED_COLOR
        } else {
            FOCUSED_COLOR
        };
        for (a, b) in [
            (left_outer, left_inner),
            (left_outer, right_inner),
            (right_inner, right_outer),
            (right_outer, left_inner),
        ] {
            let (a, b) = (landmarks.get(a)?, landmarks.get(b)?);
            draw_line(frame, pixel(a), pixel(b), outline_color);
        }

        let nose = pixel(landmarks.get(self.layout.nose_tip)?);
        let reach = (ARROW_LENGTH * pose.yaw.to_radians().sin()) as i64;
        draw_arrow(frame, nose, (nose.0 + reach, nose.1), self.heading_color(pose.yaw));
        Ok(())
    }

    pub fn heading_color(&self, yaw: f64) -> Rgb {
        let yaw = yaw.abs();
        if yaw > self.yaw_threshold {
            DISTRACTED_COLOR
        } else if yaw > self.yaw_threshold * WARNING_FRACTION {
            WARNING_COLOR
        } else {
            FOCUSED_COLOR
        }
    }
}

fn pixel(p: &Point3) -> (i64, i64) {
    (p.x as i64, p.y as i64)
}

fn draw_arrow(frame: &mut Frame, from: (i64, i64), to: (i64, i64), color: Rgb) {
    draw_line(frame, from, to, color);

    let (dx, dy) = ((from.0 - to.0) as f64, (from.1 - to.1) as f64);
    let tip = dx.hypot(dy) * ARROW_TIP_FRACTION;
    if tip < 1.0 {
        return;
    }
    let back = dy.atan2(dx);
    for side in [std::f64::consts::FRAC_PI_4, -std::f64::consts::FRAC_PI_4] {
        let barb = (
            to.0 + (tip * (back + side).cos()).round() as i64,
            to.1 + (tip * (back + side).sin()).round() as i64,
        );
        draw_line(frame, to, barb, color);
    }
}

/// Bresenham line with a square pen of `STROKE` pixels.
fn draw_line(frame: &mut Frame, from: (i64, i64), to: (i64, i64), color: Rgb) {
    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        for oy in 0..STROKE {
            for ox in 0..STROKE {
                frame.put_pixel(x + ox, y + oy, color);
            }
        }
        if (x, y) == to {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}
