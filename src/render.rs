use ab_glyph::{FontRef, PxScale};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{self, Blend, Canvas};
use imageproc::point::Point as PolyPoint;
use poseguide_core::overlay::{Color, DrawCommand, TextAlign};
use poseguide_core::shapes::point::Point;
use poseguide_core::shapes::rect::Rect;
use std::f32::consts::FRAC_PI_2;
use tracing::{Level, span, trace};

const CORNER_SEGMENTS: usize = 6;

fn rgba(color: Color) -> Rgba<u8> {
    Rgba(color.0)
}

/// Rasterize overlay commands onto `img`, alpha blended. Text is centred
/// vertically on its anchor and skipped without a font.
pub fn draw(img: &mut RgbaImage, cmds: &[DrawCommand], font: Option<&FontRef>) {
    let span = span!(Level::DEBUG, "render_overlay");
    let _guard = span.enter();

    let mut canvas = Blend(std::mem::replace(img, RgbaImage::new(0, 0)));
    for cmd in cmds {
        draw_one(&mut canvas, cmd, font);
    }
    *img = canvas.0;
}

fn draw_one(canvas: &mut Blend<RgbaImage>, cmd: &DrawCommand, font: Option<&FontRef>) {
    match cmd {
        DrawCommand::Line {
            from,
            to,
            color,
            width,
            dash,
        } => match dash {
            Some((on, off)) => dashed_line(canvas, *from, *to, *on, *off, *width, rgba(*color)),
            None => thick_line(canvas, *from, *to, *width, rgba(*color)),
        },
        DrawCommand::Rect {
            rect,
            color,
            filled,
            corner_radius,
        } => {
            let outline = rounded_rect(rect, *corner_radius);
            if *filled {
                fill_polygon(canvas, &outline, rgba(*color));
            } else {
                outline_polygon(canvas, &outline, rgba(*color));
            }
        }
        DrawCommand::Circle {
            center,
            radius,
            color,
        } => drawing::draw_filled_circle_mut(
            canvas,
            (center.x.round() as i32, center.y.round() as i32),
            radius.round() as i32,
            rgba(*color),
        ),
        DrawCommand::Polygon { points, color } => {
            let poly: Vec<_> = points.iter().map(|p| PolyPoint::new(p.x, p.y)).collect();
            fill_polygon(canvas, &poly, rgba(*color));
        }
        DrawCommand::Text {
            anchor,
            text,
            size,
            color,
            align,
        } => {
            let Some(font) = font else {
                trace!("No font loaded, skipping text {text:?}");
                return;
            };

            let scale = PxScale::from(*size);
            let (w, h) = drawing::text_size(scale, font, text);
            let x = match align {
                TextAlign::Left => anchor.x,
                TextAlign::Center => anchor.x - w as f32 / 2.,
            };
            let y = anchor.y - h as f32 / 2.;
            drawing::draw_text_mut(
                canvas,
                rgba(*color),
                x.round() as i32,
                y.round() as i32,
                scale,
                font,
                text,
            );
        }
    }
}

fn thick_line(canvas: &mut Blend<RgbaImage>, from: Point, to: Point, width: f32, color: Rgba<u8>) {
    let d = to - from;
    let len = (d.x * d.x + d.y * d.y).sqrt();
    if width <= 1. || len == 0. {
        drawing::draw_line_segment_mut(canvas, (from.x, from.y), (to.x, to.y), color);
        return;
    }

    let n = Point::new(-d.y / len, d.x / len) * (width / 2.);
    let quad = [from + n, to + n, to - n, from - n]
        .map(|p| PolyPoint::new(p.x, p.y));
    fill_polygon(canvas, &quad, color);
}

fn dashed_line(
    canvas: &mut Blend<RgbaImage>,
    from: Point,
    to: Point,
    on: f32,
    off: f32,
    width: f32,
    color: Rgba<u8>,
) {
    let len = from.distance(&to);
    if on <= 0. || len == 0. {
        thick_line(canvas, from, to, width, color);
        return;
    }

    let dir = (to - from) * (1. / len);
    let mut t = 0.;
    while t < len {
        let end = (t + on).min(len);
        thick_line(canvas, from + dir * t, from + dir * end, width, color);
        t = end + off.max(0.);
    }
}

// Clockwise outline with arcs swept through each corner.
fn rounded_rect(rect: &Rect, radius: f32) -> Vec<PolyPoint<f32>> {
    let r = radius.min(rect.width() / 2.).min(rect.height() / 2.).max(0.);
    if r == 0. {
        return vec![
            PolyPoint::new(rect.left, rect.top),
            PolyPoint::new(rect.right, rect.top),
            PolyPoint::new(rect.right, rect.bottom),
            PolyPoint::new(rect.left, rect.bottom),
        ];
    }

    let corners = [
        (rect.right - r, rect.top + r, -FRAC_PI_2),
        (rect.right - r, rect.bottom - r, 0.),
        (rect.left + r, rect.bottom - r, FRAC_PI_2),
        (rect.left + r, rect.top + r, 2. * FRAC_PI_2),
    ];

    corners
        .iter()
        .flat_map(|&(cx, cy, start)| {
            (0..=CORNER_SEGMENTS).map(move |i| {
                let a = start + FRAC_PI_2 * i as f32 / CORNER_SEGMENTS as f32;
                PolyPoint::new(cx + r * a.cos(), cy + r * a.sin())
            })
        })
        .collect()
}

// imageproc rejects outlines whose first and last points coincide.
fn fill_polygon(canvas: &mut Blend<RgbaImage>, points: &[PolyPoint<f32>], color: Rgba<u8>) {
    let mut poly: Vec<PolyPoint<i32>> = Vec::with_capacity(points.len());
    for p in points {
        let p = PolyPoint::new(p.x.round() as i32, p.y.round() as i32);
        if poly.last() != Some(&p) {
            poly.push(p);
        }
    }
    while poly.len() > 1 && poly.first() == poly.last() {
        poly.pop();
    }

    match poly.len() {
        0 => {}
        1 => {
            let (w, h) = canvas.dimensions();
            let p = poly[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < w && (p.y as u32) < h {
                canvas.draw_pixel(p.x as u32, p.y as u32, color);
            }
        }
        2 => drawing::draw_line_segment_mut(
            canvas,
            (poly[0].x as f32, poly[0].y as f32),
            (poly[1].x as f32, poly[1].y as f32),
            color,
        ),
        _ => drawing::draw_polygon_mut(canvas, &poly, color),
    }
}

fn outline_polygon(canvas: &mut Blend<RgbaImage>, points: &[PolyPoint<f32>], color: Rgba<u8>) {
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        drawing::draw_line_segment_mut(canvas, (a.x, a.y), (b.x, b.y), color);
    }
}
