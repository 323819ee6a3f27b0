use ndarray::Array2;
use sumfruit_core as game;
use game::ToNdIndex;
use web_sys::CanvasRenderingContext2d;

/// How much a freshly spawned token grows per frame until full size.
pub(crate) const SPAWN_GROWTH_PER_FRAME: f64 = 0.1;

/// Canvas colors, switchable to the softer palette.
#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) struct Palette {
    pub token_fill: &'static str,
    pub stem: &'static str,
    pub value_text: &'static str,
    pub select_fill: &'static str,
    pub select_stroke: &'static str,
    pub match_stroke: &'static str,
    pub miss_stroke: &'static str,
}

impl Palette {
    pub(crate) const fn for_light_colors(light_colors: bool) -> Self {
        Self {
            token_fill: if light_colors { "#ffadad" } else { "#e74c3c" },
            stem: "#8d6e63",
            value_text: "#fff",
            select_fill: "rgba(0, 200, 83, 0.3)",
            select_stroke: "#00c853",
            match_stroke: "#00e676",
            miss_stroke: "#ff3d00",
        }
    }
}

/// Advances the per-cell spawn pop-in. Returns whether anything is still
/// animating.
pub(crate) fn advance_spawn_scales(scales: &mut Array2<f64>) -> bool {
    let mut animating = false;
    for scale in scales.iter_mut() {
        if *scale < 1.0 {
            *scale = (*scale + SPAWN_GROWTH_PER_FRAME).min(1.0);
            animating = true;
        }
    }
    animating
}

/// Repaints the whole board: live tokens, the in-flight selection box, and
/// the feedback flash. Removed tokens leave their cells empty.
pub(crate) fn draw(
    ctx: &CanvasRenderingContext2d,
    engine: &game::RoundEngine,
    gesture_rect: Option<game::SelectRect>,
    scales: &Array2<f64>,
    cell_size: f64,
    palette: &Palette,
    canvas_w: f64,
    canvas_h: f64,
) {
    ctx.clear_rect(0.0, 0.0, canvas_w, canvas_h);

    if let Some(board) = engine.board() {
        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        ctx.set_font(&format!("bold {}px Arial", cell_size * 0.6));

        for (coords, token) in board.iter_live() {
            let scale = scales
                .get(coords.to_nd_index())
                .copied()
                .unwrap_or(1.0);
            draw_token(ctx, coords, token.value(), scale, cell_size, palette);
        }
    }

    if let Some(rect) = gesture_rect
        && engine.phase().is_running()
    {
        ctx.set_fill_style_str(palette.select_fill);
        ctx.fill_rect(rect.x, rect.y, rect.w, rect.h);
        ctx.set_stroke_style_str(palette.select_stroke);
        ctx.set_line_width(2.0);
        ctx.stroke_rect(rect.x, rect.y, rect.w, rect.h);
    }

    if let Some(feedback) = engine.feedback() {
        let stroke = match feedback.kind {
            game::FeedbackKind::Match => palette.match_stroke,
            game::FeedbackKind::Miss => palette.miss_stroke,
        };
        ctx.set_stroke_style_str(stroke);
        ctx.set_line_width(5.0);
        ctx.stroke_rect(
            feedback.rect.x,
            feedback.rect.y,
            feedback.rect.w,
            feedback.rect.h,
        );
    }
}

fn draw_token(
    ctx: &CanvasRenderingContext2d,
    (x, y): game::Coord2,
    value: u8,
    scale: f64,
    cell_size: f64,
    palette: &Palette,
) {
    let center_x = f64::from(x) * cell_size + cell_size / 2.0;
    let center_y = f64::from(y) * cell_size + cell_size / 2.0;
    let radius = cell_size * 0.4 * scale;

    ctx.set_fill_style_str(palette.token_fill);
    ctx.begin_path();
    ctx.arc(
        center_x,
        center_y + radius * 0.1,
        radius,
        0.0,
        std::f64::consts::PI * 2.0,
    )
    .ok();
    ctx.fill();

    ctx.set_stroke_style_str(palette.stem);
    ctx.set_line_width(2.0);
    ctx.begin_path();
    ctx.arc(
        center_x,
        center_y - radius,
        radius * 0.3,
        std::f64::consts::PI * 0.7,
        std::f64::consts::PI * 1.3,
    )
    .ok();
    ctx.stroke();

    ctx.set_fill_style_str(palette.value_text);
    ctx.fill_text(&value.to_string(), center_x, center_y + radius * 0.1)
        .ok();
}
