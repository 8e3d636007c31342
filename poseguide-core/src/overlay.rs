//! Turns comparison results into drawing instructions.
//!
//! Everything here is in canvas pixels. Nothing is rasterized; callers hand
//! the commands to whatever canvas they have.

use crate::face::FaceComparison;
use crate::guidance::{Locale, Zoom};
use crate::pose::PoseComparison;
use crate::scoring::ScoreTier;
use crate::shapes::point::Point;
use crate::shapes::rect::Rect;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub [u8; 4]);

impl Color {
    pub const WHITE: Color = Color([255, 255, 255, 255]);
    pub const RED: Color = Color([255, 0, 0, 255]);
    pub const GREEN: Color = Color([0, 255, 0, 255]);
    pub const YELLOW: Color = Color([255, 255, 0, 255]);
    pub const CYAN: Color = Color([0, 255, 255, 255]);
    pub const MAGENTA: Color = Color([255, 0, 255, 255]);
    pub const DIM: Color = Color([0, 0, 0, 0x66]);

    pub fn with_alpha(self, alpha: u8) -> Color {
        let [r, g, b, _] = self.0;
        Color([r, g, b, alpha])
    }

    pub fn alpha(&self) -> u8 {
        self.0[3]
    }

    pub fn for_tier(tier: ScoreTier) -> Color {
        match tier {
            ScoreTier::Good => Color::GREEN,
            ScoreTier::Fair => Color::YELLOW,
            ScoreTier::Poor => Color::RED,
        }
    }

    pub fn for_zoom(zoom: Zoom) -> Color {
        match zoom {
            Zoom::ZoomOut => Color::YELLOW,
            Zoom::ZoomIn => Color::RED,
            Zoom::Perfect => Color::GREEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextAlign {
    Left,
    Center,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DrawCommand {
    Line {
        from: Point,
        to: Point,
        color: Color,
        width: f32,
        /// `(on, off)` lengths for a dashed stroke.
        dash: Option<(f32, f32)>,
    },
    Rect {
        rect: Rect,
        color: Color,
        filled: bool,
        corner_radius: f32,
    },
    Circle {
        center: Point,
        radius: f32,
        color: Color,
    },
    Polygon {
        points: Vec<Point>,
        color: Color,
    },
    Text {
        anchor: Point,
        text: String,
        size: f32,
        color: Color,
        align: TextAlign,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Left,
    Right,
    Up,
    Down,
}

const GAUGE_HEIGHT: f32 = 20.;
const GAUGE_RADIUS: f32 = 10.;
const COM_DOT_RADIUS: f32 = 15.;

#[derive(Debug, Clone, Copy)]
pub struct Overlay {
    width: f32,
    height: f32,
    locale: Locale,
    phase: f32,
}

impl Overlay {
    pub fn new(width: u32, height: u32) -> Overlay {
        Overlay {
            width: width as f32,
            height: height as f32,
            locale: Locale::default(),
            phase: 0.,
        }
    }

    pub fn with_locale(mut self, locale: Locale) -> Overlay {
        self.locale = locale;
        self
    }

    /// Animation phase, wrapped into `[0, 1)`.
    pub fn with_phase(mut self, phase: f32) -> Overlay {
        self.phase = phase.rem_euclid(1.);
        self
    }

    fn wave(&self) -> f32 {
        (self.phase * 2. * PI).sin()
    }

    pub fn thirds_grid(&self) -> Vec<DrawCommand> {
        let (w, h) = (self.width, self.height);
        let color = Color::WHITE.with_alpha(70);
        let line = |from, to| DrawCommand::Line {
            from,
            to,
            color,
            width: 2.,
            dash: None,
        };

        vec![
            line(Point::new(w / 3., 0.), Point::new(w / 3., h)),
            line(Point::new(w * 2. / 3., 0.), Point::new(w * 2. / 3., h)),
            line(Point::new(0., h / 3.), Point::new(w, h / 3.)),
            line(Point::new(0., h * 2. / 3.), Point::new(w, h * 2. / 3.)),
        ]
    }

    fn dim(&self) -> DrawCommand {
        DrawCommand::Rect {
            rect: Rect::new(0., 0., self.width, self.height),
            color: Color::DIM,
            filled: true,
            corner_radius: 0.,
        }
    }

    fn gauge(&self, score: f32) -> Vec<DrawCommand> {
        let padding = self.width * 0.05;
        let top = self.height * 0.02;
        let bottom = top + GAUGE_HEIGHT;
        let fill_right = (self.width - padding)
            .min((self.width - padding * 2.) * (score / 100.) + padding);

        vec![
            DrawCommand::Rect {
                rect: Rect::new(padding, top, self.width - padding, bottom),
                color: Color::DIM,
                filled: true,
                corner_radius: GAUGE_RADIUS,
            },
            DrawCommand::Rect {
                rect: Rect::new(padding, top, fill_right, bottom),
                color: Color::for_tier(ScoreTier::of(score)),
                filled: true,
                corner_radius: GAUGE_RADIUS,
            },
        ]
    }

    fn com_markers(&self, current: Point, target: Point) -> Vec<DrawCommand> {
        let label = |anchor: Point, text: &str| DrawCommand::Text {
            anchor: Point::new(anchor.x + 20., anchor.y),
            text: text.to_string(),
            size: 30.,
            color: Color::WHITE,
            align: TextAlign::Left,
        };

        vec![
            DrawCommand::Line {
                from: current,
                to: target,
                color: Color::WHITE,
                width: 4.,
                dash: Some((10., 10.)),
            },
            DrawCommand::Circle {
                center: current,
                radius: COM_DOT_RADIUS,
                color: Color::RED,
            },
            label(current, "Current"),
            DrawCommand::Circle {
                center: target,
                radius: COM_DOT_RADIUS,
                color: Color::GREEN,
            },
            label(target, "Target"),
        ]
    }

    /// Shaft plus two head strokes swept `spread` radians off the shaft.
    pub fn arrow(
        from: Point,
        to: Point,
        head: f32,
        spread: f32,
        color: Color,
        width: f32,
    ) -> Vec<DrawCommand> {
        let angle = (to.y - from.y).atan2(to.x - from.x);
        let stroke = |end: Point| DrawCommand::Line {
            from: to,
            to: end,
            color,
            width,
            dash: None,
        };

        vec![
            DrawCommand::Line {
                from,
                to,
                color,
                width,
                dash: None,
            },
            stroke(Point::new(
                to.x - head * (angle - spread).cos(),
                to.y - head * (angle - spread).sin(),
            )),
            stroke(Point::new(
                to.x - head * (angle + spread).cos(),
                to.y - head * (angle + spread).sin(),
            )),
        ]
    }

    fn guide_arrow(&self, current: Point, target: Point, score: f32) -> Vec<DrawCommand> {
        if score >= 90. {
            return Vec::new();
        }

        let d = target - current;
        if d.x.abs() < 0.01 && d.y.abs() < 0.01 {
            return Vec::new();
        }

        let alpha = ((self.wave() + 1.) * 127.5).round().clamp(0., 255.) as u8;
        Self::arrow(
            current,
            target,
            self.width * 0.05,
            PI / 4.,
            Color::WHITE.with_alpha(alpha),
            8.,
        )
    }

    fn zoom_label(&self, zoom: Zoom) -> DrawCommand {
        DrawCommand::Text {
            anchor: Point::new(self.width / 2., self.height * 0.1),
            text: zoom.label().to_string(),
            size: 60.,
            color: Color::for_zoom(zoom),
            align: TextAlign::Center,
        }
    }

    pub fn pose(&self, result: &PoseComparison) -> Vec<DrawCommand> {
        let mut cmds = self.thirds_grid();
        cmds.extend(self.gauge(result.center_score));
        cmds.push(self.dim());

        let current = Point::new(
            self.width * result.current_com.x,
            self.height * result.current_com.y,
        );
        let target = Point::new(
            self.width * result.target_com.x,
            self.height * result.target_com.y,
        );

        let on_canvas = (0. ..=self.width).contains(&current.x)
            && (0. ..=self.height).contains(&current.y);
        if on_canvas {
            cmds.extend(self.com_markers(current, target));
        }

        cmds.extend(self.guide_arrow(current, target, result.center_score));
        cmds.push(self.zoom_label(result.zoom));

        cmds
    }

    fn score_label(&self, score: f32) -> String {
        let pct = score as i32;
        match self.locale {
            Locale::Ko => format!("아재력: {pct}%"),
            Locale::En => format!("Score: {pct}%"),
        }
    }

    fn direction_arrow(&self, direction: Direction, color: Color) -> DrawCommand {
        let s = self.width * 0.1;
        let (cx, cy) = (self.width / 2., self.height / 2.);
        let off = s * 0.2 * self.wave();

        let points = match direction {
            Direction::Left => vec![
                Point::new(cx - s * 2. + off, cy),
                Point::new(cx - s + off, cy - s),
                Point::new(cx - s + off, cy + s),
            ],
            Direction::Right => vec![
                Point::new(cx + s * 2. - off, cy),
                Point::new(cx + s - off, cy - s),
                Point::new(cx + s - off, cy + s),
            ],
            // apex and base pulse in opposite directions
            Direction::Up => vec![
                Point::new(cx, cy - s * 2. + off),
                Point::new(cx - s, cy - s - off),
                Point::new(cx + s, cy - s - off),
            ],
            Direction::Down => vec![
                Point::new(cx, cy + s * 2. - off),
                Point::new(cx - s, cy + s + off),
                Point::new(cx + s, cy + s + off),
            ],
        };

        DrawCommand::Polygon { points, color }
    }

    pub fn face(&self, result: &FaceComparison) -> Vec<DrawCommand> {
        let mut cmds = self.thirds_grid();
        cmds.push(self.dim());

        cmds.push(DrawCommand::Text {
            anchor: Point::new(self.width / 2., self.height * 0.15),
            text: self.score_label(result.overall_score),
            size: 80.,
            color: Color::for_tier(ScoreTier::of(result.overall_score)),
            align: TextAlign::Center,
        });

        // lower scores get bolder arrows
        let alpha = ((100. - result.overall_score) * 2.55).round().clamp(0., 255.) as u8;
        let b = result.balance;
        // point the way back towards the target
        for (flag, direction, color) in [
            (b.right, Direction::Left, Color::CYAN),
            (b.left, Direction::Right, Color::CYAN),
            (b.bottom, Direction::Up, Color::MAGENTA),
            (b.top, Direction::Down, Color::MAGENTA),
        ] {
            if flag {
                cmds.push(self.direction_arrow(direction, color.with_alpha(alpha)));
            }
        }

        cmds
    }
}
