// The board: everything between a marker reading and a finished composite.
// Visual expectation per frame:
// • A green marker outside every zone draws (or previews a shape).
// • A green marker entering a zone fires that zone's action, once.
// • A red marker stamps a pending shape onto the canvas.
// • The persistent canvas, the zone UI and the per-frame overlay are
//   layered onto the live image back-to-front.

use crate::compose;
use crate::draw;
use crate::types::{FrameBuffer, MarkerReading, Point};
use crate::vision;
use crate::zones::{ZoneAction, ZoneMap};

/// Pen colours, as shown in the bottom swatch row. "BLACK" is (2,2,2):
/// near-black ink that survives the non-background mask, unlike the eraser.
pub const PALETTE: [(&str, u32); 9] = [
    ("WHITE", 0x00FFFFFF),
    ("BLACK", 0x00020202),
    ("RED", 0x00EC111A),
    ("ORANGE", 0x00FB6330),
    ("YELLOW", 0x00FFD42F),
    ("GREEN", 0x0013AC54),
    ("BLUE", 0x00009DD6),
    ("PURPLE", 0x007849B8),
    ("PINK", 0x00F2609E),
];

/// Pure black: pixels painted with it read as background everywhere, which
/// is exactly how the eraser erases.
const ERASER_COLOUR: u32 = 0x00000000;

const PEN_SIZE_MIN: i32 = 5;
const PEN_SIZE_MAX: i32 = 50;
const PEN_SIZE_STEP: i32 = 5;
const PEN_SIZE_DEFAULT: i32 = 15;
const DEFAULT_PALETTE_INDEX: usize = 2; // RED

const CANVAS_OPACITY: f32 = 0.7;
const CURSOR_GREEN: u32 = 0x0000FF00;
const CURSOR_RED: u32 = 0x00FF0000;
const HUD_WHITE: u32 = 0x00FFFFFF;
const ZONE_OUTLINE_THICKNESS: i32 = 3;
const LABEL_SCALE: i32 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Freehand,
    Line,
    Rect,
    Circle,
}

impl Tool {
    /// Display name and variant for every tool button, in button order.
    pub const ALL: [(&'static str, Tool); 4] = [
        ("FREE", Tool::Freehand),
        ("LINE", Tool::Line),
        ("RECT", Tool::Rect),
        ("CIRC", Tool::Circle),
    ];
}

/// The active drawing instrument.
#[derive(Clone, Copy, Debug)]
pub struct PenState {
    pub tool: Tool,
    pub colour: u32,
    pub active_index: usize, // palette slot the colour came from
    pub size: i32,           // always within [PEN_SIZE_MIN, PEN_SIZE_MAX]
}

impl Default for PenState {
    fn default() -> Self {
        Self {
            tool: Tool::Freehand,
            colour: PALETTE[DEFAULT_PALETTE_INDEX].1,
            active_index: DEFAULT_PALETTE_INDEX,
            size: PEN_SIZE_DEFAULT,
        }
    }
}

/// Transient per-gesture state, all in one place so a frame update is a
/// plain function of (reading, pen, stroke) and tests can assert on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StrokeSession {
    /// Last drawing-eligible marker position. Connects freehand strokes
    /// across frames and debounces zone triggers.
    pub continuity: Option<Point>,
    /// Anchor of the shape being previewed, set on the first green hit of a
    /// shape tool and cleared on finalize/clear/tool switch.
    pub shape_start: Option<Point>,
}

/// One drawing session: pen, gesture state, the persistent canvas and the
/// cached zone UI. Owned by the frame producer; nothing here is global.
pub struct Board {
    zones: ZoneMap,
    pub pen: PenState,
    pub stroke: StrokeSession,
    pub canvas: Option<FrameBuffer>,
    ui: Option<FrameBuffer>,
    pub mirror: bool,
    /// Diagnostic: stream the raw detector match mask instead of the board.
    pub probe_mask: bool,
}

impl Board {
    pub fn new(zones: ZoneMap) -> Self {
        Self {
            zones,
            pen: PenState::default(),
            stroke: StrokeSession::default(),
            canvas: None,
            ui: None,
            mirror: false,
            probe_mask: false,
        }
    }

    /// Fresh session: empty canvas, no pending gesture, mirroring as asked.
    pub fn reset(&mut self, mirror: bool) {
        self.clear_canvas();
        self.mirror = mirror;
    }

    /// Zero the canvas and drop any gesture in flight.
    fn clear_canvas(&mut self) {
        if let Some(canvas) = self.canvas.as_mut() {
            canvas.pixels.fill(0);
        }
        self.stroke = StrokeSession::default();
    }

    /// Run one captured frame through the whole pipeline and return the
    /// composited output ready for encoding.
    pub fn process_frame(&mut self, mut frame: FrameBuffer) -> FrameBuffer {
        // Mirror first so detection coordinates match what the viewer sees.
        if self.mirror {
            vision::mirror_in_place(&mut frame);
        }

        // Diagnostic short-circuit: show what the detector would latch onto.
        if self.probe_mask {
            return vision::match_mask_view(&frame);
        }

        let reading = vision::detect(&frame);
        self.ensure_layers(&frame);

        let mut overlay = FrameBuffer::zeroed_like(&frame);
        self.apply_reading(&reading, &mut overlay);
        self.draw_hud(&mut overlay);

        if let Some(canvas) = self.canvas.as_ref() {
            compose::blit(&mut frame, canvas, CANVAS_OPACITY);
        }
        if let Some(ui) = self.ui.as_ref() {
            compose::blit(&mut frame, ui, 1.0);
        }
        compose::blit(&mut frame, &overlay, 1.0);
        frame
    }

    /// Allocate the canvas and render the zone UI on the first frame; both
    /// are sized to that frame and the UI is never regenerated after.
    pub fn ensure_layers(&mut self, frame: &FrameBuffer) {
        if self.canvas.is_none() {
            self.canvas = Some(FrameBuffer::zeroed_like(frame));
        }
        if self.ui.is_none() {
            self.ui = Some(self.render_ui(frame.width, frame.height));
        }
    }

    /// The gesture state machine: one marker reading in, zero or more
    /// canvas/overlay mutations out.
    pub fn apply_reading(&mut self, reading: &MarkerReading, overlay: &mut FrameBuffer) {
        // 1) Candidate selection: green draws; red only confirms. Losing
        //    the green marker breaks stroke continuity immediately.
        let (candidate, drawing) = if let Some(g) = reading.green {
            (g, true)
        } else if let Some(r) = reading.red {
            self.stroke.continuity = None;
            (r, false)
        } else {
            self.stroke.continuity = None;
            return;
        };

        let (w, h) = match self.canvas.as_ref() {
            Some(c) => (c.width as i32, c.height as i32),
            None => return,
        };

        // 2) Cursor: pen-coloured dab ringed in the marker's own colour.
        let ring = if drawing { CURSOR_GREEN } else { CURSOR_RED };
        draw::fill_circle(overlay, candidate.x, candidate.y, self.pen.size, self.pen.colour);
        draw::draw_ring(overlay, candidate.x, candidate.y, self.pen.size, 3, ring);

        // 3) Zone hit, resolved against the current canvas dimensions.
        let zone_action = self.zones.find(candidate, w, h).map(|z| z.action);

        if drawing {
            match zone_action {
                None => self.draw_with_tool(candidate, overlay),
                Some(action) => {
                    // Edge-triggered: fires only on the frame the marker
                    // arrived; dwelling re-fires nothing.
                    if self.stroke.continuity.is_none() {
                        self.apply_action(action);
                    }
                    self.stroke.continuity = Some(candidate);
                }
            }
        } else if let Some(start) = self.stroke.shape_start.take() {
            // Red stamps the pending shape. Taking the start point here
            // makes the confirm single-shot: the next red frame finds
            // nothing left to commit.
            let (tool, colour, size) = (self.pen.tool, self.pen.colour, self.pen.size);
            if let Some(canvas) = self.canvas.as_mut() {
                render_shape(canvas, tool, start, candidate, colour, size);
            }
        }
    }

    /// Green candidate on open canvas: draw (freehand) or preview (shapes).
    fn draw_with_tool(&mut self, candidate: Point, overlay: &mut FrameBuffer) {
        let PenState { tool, colour, size, .. } = self.pen;
        match tool {
            Tool::Freehand => {
                if let Some(canvas) = self.canvas.as_mut() {
                    match self.stroke.continuity {
                        // Connected stroke: twice the pen size, so the line
                        // matches the dab the stroke started with.
                        Some(prev) => draw::thick_line(canvas, prev, candidate, 2 * size, colour),
                        None => draw::fill_circle(canvas, candidate.x, candidate.y, size, colour),
                    }
                }
                self.stroke.continuity = Some(candidate);
            }
            _ => {
                let start = *self.stroke.shape_start.get_or_insert(candidate);
                // Preview lives on the overlay only; the canvas stays
                // untouched until a red confirm.
                render_shape(overlay, tool, start, candidate, colour, size);
                // Continuity here only debounces zones; it never draws.
                self.stroke.continuity = Some(candidate);
            }
        }
    }

    /// The one exhaustive handler for everything a zone can do.
    pub fn apply_action(&mut self, action: ZoneAction) {
        match action {
            ZoneAction::Clear => self.clear_canvas(),
            ZoneAction::Eraser => self.pen.colour = ERASER_COLOUR,
            ZoneAction::SetColour(name) => {
                for (i, &(n, colour)) in PALETTE.iter().enumerate() {
                    if n == name {
                        self.pen.active_index = i;
                        self.pen.colour = colour;
                        break;
                    }
                }
            }
            ZoneAction::SizeUp => {
                self.pen.size = (self.pen.size + PEN_SIZE_STEP).min(PEN_SIZE_MAX);
            }
            ZoneAction::SizeDown => {
                self.pen.size = (self.pen.size - PEN_SIZE_STEP).max(PEN_SIZE_MIN);
            }
            ZoneAction::SizeReset => self.pen.size = PEN_SIZE_DEFAULT,
            ZoneAction::Flip => self.mirror = !self.mirror,
            ZoneAction::SetTool(tool) => {
                self.pen.tool = tool;
                // A half-made shape dies with its tool; a stale anchor must
                // not leak into geometry the user never previewed.
                self.stroke.shape_start = None;
            }
        }
    }

    /// Render the static UI layer: every zone as an outlined rectangle with
    /// its label centred inside. Positions resolve against the first
    /// frame's size, once.
    fn render_ui(&self, width: usize, height: usize) -> FrameBuffer {
        let mut ui = FrameBuffer::zeroed(width, height);
        let (sx, sy) = (width as i32, height as i32);
        for zone in self.zones.iter() {
            let (x1, y1, x2, y2) = zone.bbox.corners(sx, sy);
            draw::draw_rect_outline(&mut ui, x1, y1, x2, y2, ZONE_OUTLINE_THICKNESS, zone.colour);

            let (lo_x, hi_x) = (x1.min(x2), x1.max(x2));
            let (lo_y, hi_y) = (y1.min(y2), y1.max(y2));
            let tx = lo_x + (hi_x - lo_x - draw::text_width(zone.name, LABEL_SCALE)) / 2;
            let ty = lo_y + (hi_y - lo_y - draw::text_height(LABEL_SCALE)) / 2;
            draw::draw_text_5x7(&mut ui, tx, ty, zone.name, zone.colour, LABEL_SCALE);
        }
        ui
    }

    /// Per-frame HUD on the overlay: arrows marking the active colour and
    /// tool, plus the pen size readout.
    fn draw_hud(&self, overlay: &mut FrameBuffer) {
        let (w, h) = (overlay.width as i32, overlay.height as i32);

        // Colour arrow points down into the bottom strip: slot 0 is the
        // eraser cell, palette slots follow at a 100px pitch.
        let slot = if self.pen.colour == ERASER_COLOUR {
            0
        } else {
            self.pen.active_index as i32 + 1
        };
        let cx = 50 + 100 * slot;
        draw::draw_arrow(overlay, Point::new(cx, h - 145), Point::new(cx, h - 110), 5, HUD_WHITE);

        // Tool arrow points up at the active tool button in the top row.
        if let Some(i) = Tool::ALL.iter().position(|&(_, t)| t == self.pen.tool) {
            let tx = 195 + 80 * i as i32;
            draw::draw_arrow(overlay, Point::new(tx, 145), Point::new(tx, 110), 5, HUD_WHITE);
        }

        let readout = format!("PEN SIZE: {}", self.pen.size);
        draw::draw_text_5x7(overlay, w - 200, h - 120, &readout, HUD_WHITE, LABEL_SCALE);
    }
}

/// Shape geometry shared by preview and commit: same tool, same anchor and
/// candidate, same stroke; only the target layer differs.
fn render_shape(target: &mut FrameBuffer, tool: Tool, a: Point, b: Point, colour: u32, size: i32) {
    match tool {
        // Freehand never takes the shape path.
        Tool::Freehand => {}
        Tool::Line => draw::thick_line(target, a, b, 2 * size, colour),
        Tool::Rect => draw::draw_rect_outline(target, a.x, a.y, b.x, b.y, size, colour),
        Tool::Circle => {
            let (dx, dy) = ((b.x - a.x) as f32, (b.y - a.y) as f32);
            let radius = (dx * dx + dy * dy).sqrt().round() as i32;
            draw::draw_ring(target, a.x, a.y, radius, size, colour);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::{BBox, Zone, ZoneMap};

    const W: usize = 320;
    const H: usize = 240;

    fn board(zones: ZoneMap) -> Board {
        let mut b = Board::new(zones);
        b.ensure_layers(&FrameBuffer::zeroed(W, H));
        b
    }

    fn green(x: i32, y: i32) -> MarkerReading {
        MarkerReading { green: Some(Point::new(x, y)), red: None }
    }

    fn red(x: i32, y: i32) -> MarkerReading {
        MarkerReading { green: None, red: Some(Point::new(x, y)) }
    }

    fn canvas_px(b: &Board, x: usize, y: usize) -> u32 {
        b.canvas.as_ref().expect("canvas allocated").pixels[y * W + x]
    }

    fn canvas_is_blank(b: &Board) -> bool {
        b.canvas.as_ref().expect("canvas allocated").pixels.iter().all(|&p| p == 0)
    }

    fn step(b: &mut Board, reading: MarkerReading) -> FrameBuffer {
        let mut overlay = FrameBuffer::zeroed(W, H);
        b.apply_reading(&reading, &mut overlay);
        overlay
    }

    #[test]
    fn no_marker_leaves_canvas_and_clears_continuity() {
        let mut b = board(ZoneMap::empty());
        b.stroke.continuity = Some(Point::new(5, 5));
        step(&mut b, MarkerReading::default());
        assert!(canvas_is_blank(&b));
        assert_eq!(b.stroke.continuity, None);
    }

    #[test]
    fn freehand_strokes_connect_across_frames() {
        let mut b = board(ZoneMap::empty());
        b.pen.size = 2;
        let colour = b.pen.colour;
        step(&mut b, green(10, 100));
        step(&mut b, green(40, 100));
        step(&mut b, green(70, 100));
        // Midpoints between hits are inked: segments, not disjoint dots.
        assert_eq!(canvas_px(&b, 25, 100), colour);
        assert_eq!(canvas_px(&b, 55, 100), colour);
        assert_eq!(canvas_px(&b, 10, 100), colour);
        assert_eq!(b.stroke.continuity, Some(Point::new(70, 100)));
    }

    #[test]
    fn losing_the_marker_breaks_the_stroke() {
        let mut b = board(ZoneMap::empty());
        b.pen.size = 2;
        step(&mut b, green(10, 100));
        step(&mut b, MarkerReading::default());
        step(&mut b, green(70, 100));
        // No bridge between the two dabs.
        assert_eq!(canvas_px(&b, 40, 100), 0);
    }

    #[test]
    fn zone_dwell_fires_exactly_once() {
        let clear_zone = Zone {
            name: "CLEAR",
            bbox: BBox::px(0, 0, 20, 20),
            action: ZoneAction::Clear,
            colour: 0x00FFFFFF,
        };
        let mut b = board(ZoneMap::new(vec![clear_zone]));

        // Seed some ink, then enter the zone: the transition frame clears it.
        b.canvas.as_mut().expect("canvas").pixels[100 * W + 100] = 0x99;
        step(&mut b, green(10, 10));
        assert!(canvas_is_blank(&b));

        // Seed again and dwell: no further frame may clear.
        b.canvas.as_mut().expect("canvas").pixels[100 * W + 100] = 0x99;
        for _ in 0..4 {
            step(&mut b, green(11, 10));
        }
        assert_eq!(canvas_px(&b, 100, 100), 0x99);
    }

    #[test]
    fn shape_previews_then_commits_on_red() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::SetTool(Tool::Rect));

        let overlay = step(&mut b, green(10, 10));
        assert_eq!(b.stroke.shape_start, Some(Point::new(10, 10)));
        assert!(overlay.pixels.iter().any(|&p| p != 0));
        assert!(canvas_is_blank(&b));

        // Sweeping the marker keeps previewing, never commits.
        step(&mut b, green(30, 30));
        step(&mut b, green(50, 50));
        assert!(canvas_is_blank(&b));

        // Red stamps the rectangle (10,10)-(50,50) and clears the anchor.
        step(&mut b, red(50, 50));
        assert_eq!(canvas_px(&b, 30, 10), b.pen.colour); // top edge
        assert_eq!(b.stroke.shape_start, None);
    }

    #[test]
    fn second_red_frame_commits_nothing() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::SetTool(Tool::Rect));
        step(&mut b, green(10, 10));
        step(&mut b, red(50, 50));
        let snapshot = b.canvas.clone();
        step(&mut b, red(80, 80));
        assert_eq!(b.canvas, snapshot);
    }

    #[test]
    fn red_without_pending_shape_is_inert() {
        let mut b = board(ZoneMap::empty());
        step(&mut b, red(50, 50));
        assert!(canvas_is_blank(&b));
    }

    #[test]
    fn switching_tools_cancels_a_pending_shape() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::SetTool(Tool::Line));
        step(&mut b, green(10, 10));
        assert!(b.stroke.shape_start.is_some());
        b.apply_action(ZoneAction::SetTool(Tool::Rect));
        assert_eq!(b.stroke.shape_start, None);
    }

    #[test]
    fn pen_size_stays_clamped() {
        let mut b = board(ZoneMap::empty());
        for _ in 0..20 {
            b.apply_action(ZoneAction::SizeUp);
        }
        assert_eq!(b.pen.size, PEN_SIZE_MAX);
        for _ in 0..30 {
            b.apply_action(ZoneAction::SizeDown);
        }
        assert_eq!(b.pen.size, PEN_SIZE_MIN);
        b.apply_action(ZoneAction::SizeReset);
        assert_eq!(b.pen.size, PEN_SIZE_DEFAULT);
    }

    #[test]
    fn eraser_paints_background() {
        let mut b = board(ZoneMap::empty());
        step(&mut b, green(100, 100));
        assert_ne!(canvas_px(&b, 100, 100), 0);

        step(&mut b, MarkerReading::default()); // break the stroke
        b.apply_action(ZoneAction::Eraser);
        step(&mut b, green(100, 100));
        assert_eq!(canvas_px(&b, 100, 100), 0);
    }

    #[test]
    fn palette_actions_set_colour_and_slot() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::SetColour("BLUE"));
        assert_eq!(b.pen.colour, 0x00009DD6);
        assert_eq!(b.pen.active_index, 6);
        // Unknown names change nothing.
        b.apply_action(ZoneAction::SetColour("CHARTREUSE"));
        assert_eq!(b.pen.colour, 0x00009DD6);
    }

    #[test]
    fn clear_action_drops_gesture_state() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::SetTool(Tool::Circle));
        step(&mut b, green(60, 60));
        b.apply_action(ZoneAction::Clear);
        assert_eq!(b.stroke, StrokeSession::default());
        assert!(canvas_is_blank(&b));
    }

    #[test]
    fn reset_clears_everything_and_sets_mirror() {
        let mut b = board(ZoneMap::empty());
        step(&mut b, green(100, 100));
        b.reset(true);
        assert!(canvas_is_blank(&b));
        assert_eq!(b.stroke, StrokeSession::default());
        assert!(b.mirror);
    }

    #[test]
    fn flip_action_toggles_mirroring() {
        let mut b = board(ZoneMap::empty());
        b.apply_action(ZoneAction::Flip);
        assert!(b.mirror);
        b.apply_action(ZoneAction::Flip);
        assert!(!b.mirror);
    }

    #[test]
    fn composite_prefers_overlay_over_canvas() {
        // Ink on the canvas and ink on the overlay at the same spot: the
        // overlay is composited last and must win.
        let mut b = board(ZoneMap::empty());
        b.canvas.as_mut().expect("canvas").pixels[50 * W + 50] = 0x00AA0000;
        let mut out = FrameBuffer::zeroed(W, H);
        if let Some(canvas) = b.canvas.as_ref() {
            compose::blit(&mut out, canvas, CANVAS_OPACITY);
        }
        let mut overlay = FrameBuffer::zeroed(W, H);
        overlay.pixels[50 * W + 50] = 0x0000BB00;
        compose::blit(&mut out, &overlay, 1.0);
        assert_eq!(out.pixels[50 * W + 50], 0x0000BB00);
    }

    #[test]
    fn probe_mask_short_circuits_the_pipeline() {
        let mut b = board(ZoneMap::empty());
        b.probe_mask = true;
        let mut frame = FrameBuffer::zeroed(W, H);
        frame.pixels[10 * W + 10] = 0x0000FF00; // one vivid green pixel
        let out = b.process_frame(frame);
        // Output is the match mask: the green pixel survives, and no UI or
        // HUD was composited anywhere.
        assert_eq!(out.pixels[10 * W + 10], 0x0000FF00);
        assert_eq!(out.pixels.iter().filter(|&&p| p != 0).count(), 1);
    }
}
