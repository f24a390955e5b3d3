//! Overlay placement.
//!
//! Grid anchors inset the overlay by `padding` from the edges they name and
//! center it along the other axis. Percentage placement centers the overlay
//! on a point. Neither clamps: an overlay may end up partly off-canvas.

use crate::settings::Anchor;

/// Top-left pixel offset of an overlay. May be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

/// An overlay box to be placed on a canvas at a grid anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchoredBox {
    pub anchor: Anchor,
    pub content_width: u32,
    pub content_height: u32,
    pub canvas_width: u32,
    pub canvas_height: u32,
    pub padding: u32,
}

#[derive(Clone, Copy)]
enum Align {
    Start,
    Middle,
    End,
}

impl Anchor {
    fn alignment(self) -> (Align, Align) {
        match self {
            Anchor::TopLeft => (Align::Start, Align::Start),
            Anchor::TopCenter => (Align::Middle, Align::Start),
            Anchor::TopRight => (Align::End, Align::Start),
            Anchor::MiddleLeft => (Align::Start, Align::Middle),
            Anchor::Center => (Align::Middle, Align::Middle),
            Anchor::MiddleRight => (Align::End, Align::Middle),
            Anchor::BottomLeft => (Align::Start, Align::End),
            Anchor::BottomCenter => (Align::Middle, Align::End),
            Anchor::BottomRight => (Align::End, Align::End),
        }
    }
}

impl AnchoredBox {
    pub fn resolve(&self) -> Point {
        let (h, v) = self.anchor.alignment();
        Point {
            x: place(h, self.content_width, self.canvas_width, self.padding),
            y: place(v, self.content_height, self.canvas_height, self.padding),
        }
    }
}

fn place(align: Align, content: u32, canvas: u32, padding: u32) -> i64 {
    let (content, canvas, padding) = (content as i64, canvas as i64, padding as i64);
    match align {
        Align::Start => padding,
        // Floor division keeps odd slack deterministic for oversized content too.
        Align::Middle => (canvas - content).div_euclid(2),
        Align::End => canvas - content - padding,
    }
}

/// Top-left offset that centers a `content` box on (`x_pct`%, `y_pct`%) of the canvas.
pub fn center_on_percentage(
    content_width: u32,
    content_height: u32,
    canvas_width: u32,
    canvas_height: u32,
    x_pct: f64,
    y_pct: f64,
) -> Point {
    let x = canvas_width as f64 * x_pct / 100.0 - content_width as f64 / 2.0;
    let y = canvas_height as f64 * y_pct / 100.0 - content_height as f64 / 2.0;
    Point {
        x: x.round() as i64,
        y: y.round() as i64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anchored(anchor: Anchor, padding: u32) -> AnchoredBox {
        AnchoredBox {
            anchor,
            content_width: 200,
            content_height: 100,
            canvas_width: 1000,
            canvas_height: 800,
            padding,
        }
    }

    #[test]
    fn test_center_ignores_padding() {
        for padding in [0, 20, 500] {
            let p = anchored(Anchor::Center, padding).resolve();
            assert_eq!(p, Point { x: 400, y: 350 });
        }
    }

    #[test]
    fn test_top_left_is_padding() {
        let p = anchored(Anchor::TopLeft, 37).resolve();
        assert_eq!(p, Point { x: 37, y: 37 });
    }

    #[test]
    fn test_every_anchor() {
        let cases = [
            (Anchor::TopCenter, 400, 20),
            (Anchor::TopRight, 780, 20),
            (Anchor::MiddleLeft, 20, 350),
            (Anchor::MiddleRight, 780, 350),
            (Anchor::BottomLeft, 20, 680),
            (Anchor::BottomCenter, 400, 680),
            (Anchor::BottomRight, 780, 680),
        ];
        for (anchor, x, y) in cases {
            assert_eq!(anchored(anchor, 20).resolve(), Point { x, y }, "{anchor}");
        }
    }

    #[test]
    fn test_oversized_content_goes_negative() {
        let b = AnchoredBox {
            anchor: Anchor::BottomRight,
            content_width: 300,
            content_height: 300,
            canvas_width: 100,
            canvas_height: 100,
            padding: 10,
        };
        assert_eq!(b.resolve(), Point { x: -210, y: -210 });
    }

    #[test]
    fn test_percentage_centers_on_point() {
        // 200px square signature centered on the middle of a 1000x1000 canvas.
        let p = center_on_percentage(200, 200, 1000, 1000, 50.0, 50.0);
        assert_eq!(p, Point { x: 400, y: 400 });

        let p = center_on_percentage(200, 80, 1000, 1000, 50.0, 50.0);
        assert_eq!(p, Point { x: 400, y: 460 });
    }

    #[test]
    fn test_percentage_out_of_range_is_not_clamped() {
        let p = center_on_percentage(100, 100, 1000, 500, 110.0, -10.0);
        assert_eq!(p, Point { x: 1050, y: -100 });
    }
}
