use bitflags::bitflags;
use chrono::prelude::*;
use clap::Args;
use gloo::events::EventListener;
use gloo::render::{AnimationFrame, request_animation_frame};
use gloo::timers::callback::Interval;
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use sumfruit_core as game;
use game::ToNdIndex;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent};
use yew::prelude::*;

use crate::render::{self, Palette};
use crate::settings::{self, SettingsView};
use crate::utils::*;

fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap()
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
    pub(crate) struct MouseButtons: u16 {
        const LEFT    = 1;
        const RIGHT   = 1 << 1;
        const MIDDLE  = 1 << 2;
        const BACK    = 1 << 3;
        const FORWARD = 1 << 4;
    }
}

/// The engine plus the wall-clock bookkeeping needed to persist a round
/// across reloads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct RoundSession {
    pub engine: game::RoundEngine,
    pub saved_at: Option<DateTime<Utc>>,
}

impl RoundSession {
    fn new(config: game::GameConfig) -> Self {
        Self {
            engine: game::RoundEngine::new(config),
            saved_at: None,
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.saved_at = Some(now);
    }

    /// Replays the seconds that passed while the page was gone. The engine's
    /// own stale-tick guard stops the countdown at zero.
    fn catch_up(&mut self, now: DateTime<Utc>) {
        let Some(saved_at) = self.saved_at else {
            return;
        };
        if !self.engine.phase().is_running() {
            return;
        }

        let missed = (now - saved_at).num_seconds().max(0);
        for _ in 0..missed {
            if self.engine.tick() != game::TickOutcome::Ticked {
                break;
            }
        }
    }
}

impl Default for RoundSession {
    fn default() -> Self {
        Self::new(game::GameConfig::default())
    }
}

impl StorageKey for RoundSession {
    const KEY: &'static str = "sumfruit:game:v1";
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct DragGesture {
    start: game::PxPoint,
    current: game::PxPoint,
}

impl DragGesture {
    fn rect(self) -> game::SelectRect {
        game::SelectRect::from_corners(self.start, self.current)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum GestureMsg {
    Down {
        pos: game::PxPoint,
        buttons: MouseButtons,
    },
    Move(game::PxPoint),
    Up(game::PxPoint),
    Cancel,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub(crate) enum Msg {
    Gesture(GestureMsg),
    Tick,
    Frame(f64),
    Start,
    Reset,
    Resize,
    ToggleSettings,
    UpdateSettings(settings::Settings),
}

#[derive(Args, Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    /// Force a seed instead of random
    #[arg(short, long)]
    #[prop_or_default]
    pub seed: Option<u64>,
}

pub(crate) struct GameView {
    settings: settings::Settings,
    session: RoundSession,
    forced_seed: Option<u64>,
    canvas: NodeRef,
    cell_size: f64,
    gesture: Option<DragGesture>,
    scales: Array2<f64>,
    settings_open: bool,
    _timer: Option<Interval>,
    _frame: Option<AnimationFrame>,
    _resize: Option<EventListener>,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        Interval::new(1000, move || link.send_message(Msg::Tick))
    }

    fn schedule_frame(&mut self, ctx: &Context<Self>) {
        let link = ctx.link().clone();
        self._frame = Some(request_animation_frame(move |timestamp| {
            link.send_message(Msg::Frame(timestamp))
        }));
    }

    fn canvas_and_context(&self) -> Option<(HtmlCanvasElement, CanvasRenderingContext2d)> {
        let canvas = self.canvas.cast::<HtmlCanvasElement>()?;
        let ctx = canvas
            .get_context("2d")
            .ok()
            .flatten()?
            .dyn_into::<CanvasRenderingContext2d>()
            .ok()?;
        Some((canvas, ctx))
    }

    /// Picks the largest whole-pixel cell that keeps the board inside the
    /// viewport, then sizes the canvas to an exact multiple of it.
    fn apply_canvas_size(&mut self) {
        let Some((canvas, _)) = self.canvas_and_context() else {
            return;
        };

        let window = gloo::utils::window();
        let inner_w = window
            .inner_width()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(800.0);
        let inner_h = window
            .inner_height()
            .ok()
            .and_then(|v| v.as_f64())
            .unwrap_or(600.0);

        let (cols, rows) = self.session.engine.config().size;
        let max_cell_w = inner_w * 0.9 / f64::from(cols);
        let max_cell_h = inner_h * 0.75 / f64::from(rows);
        self.cell_size = max_cell_w.min(max_cell_h).floor().max(1.0);

        canvas.set_width((self.cell_size * f64::from(cols)) as u32);
        canvas.set_height((self.cell_size * f64::from(rows)) as u32);
    }

    fn draw(&self) {
        let Some((canvas, ctx)) = self.canvas_and_context() else {
            return;
        };

        render::draw(
            &ctx,
            &self.session.engine,
            self.gesture.map(DragGesture::rect),
            &self.scales,
            self.cell_size,
            &Palette::for_light_colors(self.settings.light_colors),
            canvas.width() as f64,
            canvas.height() as f64,
        );
    }

    fn start_round(&mut self, ctx: &Context<Self>) -> bool {
        let seed = self.forced_seed.unwrap_or_else(js_random_seed);

        match self
            .session
            .engine
            .start(game::RandomBoardGenerator::new(seed))
        {
            Ok(()) => {
                log::debug!("round started, seed: {}", seed);
                self.scales =
                    Array2::from_elem(self.session.engine.config().size.to_nd_index(), 0.0);
                self.gesture = None;
                self._timer = Some(Self::create_timer(ctx));
                true
            }
            Err(err) => {
                log::warn!("start rejected: {}", err);
                false
            }
        }
    }

    fn finish_drag(&mut self, pos: game::PxPoint) -> bool {
        let Some(gesture) = self.gesture.take() else {
            return false;
        };

        let rect = game::SelectRect::from_corners(gesture.start, pos);
        match self
            .session
            .engine
            .apply_selection(rect, self.cell_size, performance_now_ms())
        {
            Ok(outcome) => {
                log::trace!("selection {:?} -> {:?}", rect, outcome);
                outcome.has_update()
            }
            Err(err) => {
                log::trace!("selection rejected: {}", err);
                false
            }
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let settings: settings::Settings = LocalOrDefault::local_or_default();
        let mut session: RoundSession = LocalOrDefault::local_or_default();

        // a stored round keeps its own config; only idle sessions adopt the
        // configured board
        if matches!(session.engine.phase(), game::RoundPhase::NotStarted)
            && session.engine.config() != settings.game_config
        {
            session = RoundSession::new(settings.game_config);
        }
        session.catch_up(utc_now());

        let scales = Array2::from_elem(session.engine.config().size.to_nd_index(), 1.0);
        let timer = session
            .engine
            .phase()
            .is_running()
            .then(|| Self::create_timer(ctx));

        Self {
            settings,
            session,
            forced_seed: ctx.props().seed,
            canvas: NodeRef::default(),
            cell_size: 30.0,
            gesture: None,
            scales,
            settings_open: false,
            _timer: timer,
            _frame: None,
            _resize: None,
        }
    }

    fn rendered(&mut self, ctx: &Context<Self>, first_render: bool) {
        if first_render {
            self.apply_canvas_size();
            let link = ctx.link().clone();
            self._resize = Some(EventListener::new(
                &gloo::utils::window(),
                "resize",
                move |_| link.send_message(Msg::Resize),
            ));
            self.schedule_frame(ctx);
        }
    }

    fn update(&mut self, ctx: &Context<Self>, msg: Self::Message) -> bool {
        use GestureMsg::*;
        use Msg::*;

        let updated = match msg {
            Gesture(Down { pos, buttons }) => {
                if self.session.engine.phase().is_running()
                    && buttons.contains(MouseButtons::LEFT)
                {
                    self.gesture = Some(DragGesture {
                        start: pos,
                        current: pos,
                    });
                }
                false
            }
            Gesture(Move(pos)) => {
                if let Some(gesture) = &mut self.gesture {
                    gesture.current = pos;
                }
                false
            }
            Gesture(Up(pos)) => self.finish_drag(pos),
            Gesture(Cancel) => {
                self.gesture = None;
                false
            }
            Tick => match self.session.engine.tick() {
                game::TickOutcome::Ended => {
                    log::debug!("time up, final score {}", self.session.engine.score());
                    self._timer = None;
                    self.gesture = None;
                    true
                }
                game::TickOutcome::Ticked => true,
                game::TickOutcome::Ignored => {
                    // stale interval outliving the round, drop it
                    self._timer = None;
                    false
                }
            },
            Frame(timestamp) => {
                self.session.engine.expire_feedback(timestamp);
                render::advance_spawn_scales(&mut self.scales);
                self.draw();
                self.schedule_frame(ctx);
                false
            }
            Start => self.start_round(ctx),
            Reset => {
                self.session.engine.reset();
                self._timer = None;
                self.gesture = None;
                true
            }
            Resize => {
                self.apply_canvas_size();
                true
            }
            ToggleSettings => {
                self.settings_open = !self.settings_open;
                if !self.settings_open {
                    self.settings = LocalOrDefault::local_or_default();
                }
                true
            }
            UpdateSettings(settings) => {
                if self.settings != settings {
                    self.settings = settings;
                    self.settings.local_save();
                    if matches!(self.session.engine.phase(), game::RoundPhase::NotStarted)
                        && self.session.engine.config() != settings.game_config
                    {
                        self.session = RoundSession::new(settings.game_config);
                        self.scales =
                            Array2::from_elem(settings.game_config.size.to_nd_index(), 1.0);
                        self.apply_canvas_size();
                    }
                    true
                } else {
                    false
                }
            }
        };

        if updated {
            self.session.touch(utc_now());
            self.session.local_save();
        }
        updated
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        use Msg::*;

        let engine = &self.session.engine;
        let config = engine.config();
        let phase = engine.phase();
        let score = engine.score();
        let remaining = engine.remaining_secs();

        let board_w = self.cell_size * f64::from(config.size.0);
        let board_h = self.cell_size * f64::from(config.size.1);
        let time_pct = f64::from(remaining) / f64::from(config.round_secs) * 100.0;

        let onpointerdown = ctx.link().callback(|e: PointerEvent| {
            e.prevent_default();
            // keep receiving moves while the drag leaves the canvas
            if let Some(target) = e.target_dyn_into::<web_sys::Element>() {
                let _ = target.set_pointer_capture(e.pointer_id());
            }
            Gesture(GestureMsg::Down {
                pos: (e.offset_x().into(), e.offset_y().into()),
                buttons: MouseButtons::from_bits_truncate(e.buttons()),
            })
        });
        let onpointermove = ctx.link().callback(|e: PointerEvent| {
            Gesture(GestureMsg::Move((e.offset_x().into(), e.offset_y().into())))
        });
        let onpointerup = ctx.link().callback(|e: PointerEvent| {
            Gesture(GestureMsg::Up((e.offset_x().into(), e.offset_y().into())))
        });
        let onpointercancel = ctx
            .link()
            .callback(|_: PointerEvent| Gesture(GestureMsg::Cancel));

        let cb_start = ctx.link().callback(|_: MouseEvent| Start);
        let cb_reset = ctx.link().callback(|_: MouseEvent| Reset);
        let cb_show_settings = ctx.link().callback(|_: MouseEvent| ToggleSettings);
        let cb_update_settings = ctx.link().callback(UpdateSettings);
        let cb_close_settings = ctx.link().callback(|()| ToggleSettings);

        html! {
            <div class="sumfruit" oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}>
                <header>
                    <div class="pill title">{"Sum Fruit"}</div>
                    <div class="pill">{format!("Score: {}", score)}</div>
                    <div class="pill">{format!("Time: {}s", remaining)}</div>
                    <a class="pill" href="#/dashboard">{"Back"}</a>
                </header>
                <main>
                    <div
                        class="board"
                        style={format!(
                            "width:{}px;height:{}px;background-size:{}px {}px",
                            board_w, board_h, self.cell_size, self.cell_size,
                        )}
                    >
                        <canvas
                            ref={self.canvas.clone()}
                            {onpointerdown}
                            {onpointermove}
                            {onpointerup}
                            {onpointercancel}
                        />
                        if matches!(phase, game::RoundPhase::NotStarted) {
                            <div class="overlay">
                                <h1>{"Sum Fruit"}</h1>
                                <p>{"Drag to select apples. If sum == 10, they pop!"}</p>
                                <p>{"Score points and clear the board."}</p>
                                <button onclick={cb_start}>{"Start Game"}</button>
                            </div>
                        }
                        if phase.is_finished() {
                            <div class="overlay">
                                <h1>{"Time's Up!"}</h1>
                                <h2>{format!("Final Score: {}", score)}</h2>
                                <button onclick={cb_reset.clone()}>{"Play Again"}</button>
                            </div>
                        }
                    </div>
                    <aside class="time-bar">
                        <div class="time-left" style={format!("height:{}%", time_pct)}/>
                    </aside>
                </main>
                <footer>
                    <button onclick={cb_reset}>{"Reset"}</button>
                    <small onclick={cb_show_settings}>{"···"}</small>
                </footer>
                <SettingsView
                    open={self.settings_open}
                    settings={self.settings}
                    onupdate={cb_update_settings}
                    onclose={cb_close_settings}
                />
            </div>
        }
    }
}
