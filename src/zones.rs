// Zones: hot regions mapped onto the frame that fire an action when the
// marker dwells in them. Visual: the outlined, labeled rectangles around the
// edges of the stream: Clear/Flip at the top corners, the palette and pen
// size buttons along the bottom, the tool row along the top.

use crate::board::{PALETTE, Tool};
use crate::types::Point;

/// One edge of a zone rectangle, relative to the frame size it is resolved
/// against. Resolution happens on every use; nothing is cached, so a zone
/// keeps hugging its edge whatever size the frames come in at.
#[derive(Clone, Debug, PartialEq)]
pub enum Coord {
    /// >= 0: absolute pixel offset. < 0: `size + value`, i.e. anchored to
    /// the bottom/right edge.
    Px(i32),
    /// Fraction of the frame dimension, in [0, 1).
    Frac(f32),
    /// Sum of parts, each resolved with the full rule. This is what lets an
    /// indexed family of zones (palette swatches, tool buttons) share one
    /// shape with a per-index offset.
    Sum(Vec<Coord>),
}

impl Coord {
    fn resolve(&self, size: i32) -> i32 {
        match self {
            Coord::Px(v) if *v < 0 => size + v,
            Coord::Px(v) => *v,
            Coord::Frac(f) => (size as f32 * f) as i32,
            Coord::Sum(parts) => parts.iter().map(|c| c.resolve(size)).sum(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct BBox {
    pub x1: Coord,
    pub y1: Coord,
    pub x2: Coord,
    pub y2: Coord,
}

impl BBox {
    /// Shorthand for a box of plain pixel coords (negative = edge-anchored).
    pub fn px(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self { x1: Coord::Px(x1), y1: Coord::Px(y1), x2: Coord::Px(x2), y2: Coord::Px(y2) }
    }

    /// Resolve all four coordinates against a frame size. The result holds
    /// only absolute `Px` values, so normalising it again is a no-op.
    pub fn normalised(&self, size_x: i32, size_y: i32) -> BBox {
        let (x1, y1, x2, y2) = self.corners(size_x, size_y);
        BBox::px(x1, y1, x2, y2)
    }

    /// The raw resolved corner pairs, in declaration order (not sorted).
    pub fn corners(&self, size_x: i32, size_y: i32) -> (i32, i32, i32, i32) {
        (
            self.x1.resolve(size_x),
            self.y1.resolve(size_y),
            self.x2.resolve(size_x),
            self.y2.resolve(size_y),
        )
    }

    /// Inclusive bounds test. Edge anchors may flip the declared corner
    /// order, so each axis is sorted to a true min/max first.
    pub fn contains(&self, x: i32, y: i32, size_x: i32, size_y: i32) -> bool {
        let (x1, y1, x2, y2) = self.corners(size_x, size_y);
        let (lo_x, hi_x) = (x1.min(x2), x1.max(x2));
        let (lo_y, hi_y) = (y1.min(y2), y1.max(y2));
        lo_x <= x && x <= hi_x && lo_y <= y && y <= hi_y
    }
}

/// Everything a zone is allowed to do. One closed set, dispatched through a
/// single exhaustive `match` in the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ZoneAction {
    Clear,
    Eraser,
    SetColour(&'static str),
    SizeUp,
    SizeDown,
    SizeReset,
    Flip,
    SetTool(Tool),
}

pub struct Zone {
    pub name: &'static str,
    pub bbox: BBox,
    pub action: ZoneAction,
    pub colour: u32, // highlight/outline colour in the UI layer
}

const ZONE_WHITE: u32 = 0x00FFFFFF;
const ZONE_GRAY: u32 = 0x00C8C8C8;

pub struct ZoneMap {
    zones: Vec<Zone>,
}

impl ZoneMap {
    pub fn new(zones: Vec<Zone>) -> Self {
        Self { zones }
    }

    /// No zones at all. Used where gestures should land on bare canvas.
    pub fn empty() -> Self {
        Self { zones: Vec::new() }
    }

    /// The fixed board layout.
    /// Visual: CLEAR top-left, FLIP top-right, the tool row along the top
    /// between them; bottom edge holds ERASER, the palette swatches, and
    /// the pen size -,+,RESET cluster on the right.
    pub fn standard() -> Self {
        let mut zones = vec![
            Zone { name: "CLEAR", bbox: BBox::px(0, 0, 150, 150), action: ZoneAction::Clear, colour: ZONE_WHITE },
            Zone { name: "FLIP", bbox: BBox::px(-150, 0, -5, 150), action: ZoneAction::Flip, colour: ZONE_WHITE },
            Zone { name: "ERASER", bbox: BBox::px(5, -100, 95, -5), action: ZoneAction::Eraser, colour: ZONE_GRAY },
            Zone { name: "+", bbox: BBox::px(-100, -100, -5, -5), action: ZoneAction::SizeUp, colour: ZONE_WHITE },
            Zone { name: "-", bbox: BBox::px(-200, -100, -105, -5), action: ZoneAction::SizeDown, colour: ZONE_WHITE },
            Zone { name: "RESET", bbox: BBox::px(-300, -100, -205, -5), action: ZoneAction::SizeReset, colour: ZONE_WHITE },
        ];

        // One swatch per palette entry, marching right along the bottom.
        for (i, &(name, colour)) in PALETTE.iter().enumerate() {
            let step = (100 * i) as i32;
            zones.push(Zone {
                name,
                bbox: BBox {
                    x1: Coord::Sum(vec![Coord::Px(105), Coord::Px(step)]),
                    y1: Coord::Px(-100),
                    x2: Coord::Sum(vec![Coord::Px(195), Coord::Px(step)]),
                    y2: Coord::Px(-5),
                },
                action: ZoneAction::SetColour(name),
                colour,
            });
        }

        // One button per tool, marching right along the top.
        for (i, &(name, tool)) in Tool::ALL.iter().enumerate() {
            let step = (80 * i) as i32;
            zones.push(Zone {
                name,
                bbox: BBox {
                    x1: Coord::Sum(vec![Coord::Px(160), Coord::Px(step)]),
                    y1: Coord::Px(5),
                    x2: Coord::Sum(vec![Coord::Px(230), Coord::Px(step)]),
                    y2: Coord::Px(85),
                },
                action: ZoneAction::SetTool(tool),
                colour: ZONE_WHITE,
            });
        }

        Self { zones }
    }

    /// First zone containing the point, resolved against the given frame
    /// size, or None when the point is on bare canvas.
    pub fn find(&self, p: Point, size_x: i32, size_y: i32) -> Option<&Zone> {
        self.zones.iter().find(|z| z.bbox.contains(p.x, p.y, size_x, size_y))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Zone> {
        self.zones.iter()
    }
}
