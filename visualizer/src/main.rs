mod plot;

use calipsocore::granule::{GranuleSource, JsonGranuleReader, PlotKind, SyntheticConfig, SyntheticGranule};
use calipsocore::render::ColorMap;
use calipsocore::telemetry::{init_logging, install_panic_hook, LogConfig};
use calipsocore::toolbar::{
    BindContext, NavMode, Navigator, Relief, ToggleRegistry, ToggleTool, ToolId, Tooltip, ViewLimits,
};
use calipsocore::{PlotProduct, ProductBuilder, ProductConfig};
use iced::{
    event, keyboard,
    widget::{button, column, container, mouse_area, row, scrollable, text, Canvas, Column},
    Alignment, Element, Event, Length, Padding, Point, Subscription, Task, Theme,
};
use log::{info, warn};
use plot::{Heatmap, Overlay, PLOT_HEIGHT, PLOT_WIDTH};

/// Granule JSON to open instead of the synthetic one.
const GRANULE_ENV: &str = "CALIPSO_GRANULE";
const TOOL_BUTTON_WIDTH: f32 = 90.0;
const TOOLBAR_SPACING: f32 = 8.0;

fn main() -> iced::Result {
    if let Err(err) = init_logging(&LogConfig::default()) {
        eprintln!("logging disabled: {}", err);
    }
    install_panic_hook();
    iced::application(Viewer::boot, Viewer::update, Viewer::view)
        .title(application_title)
        .subscription(application_subscription)
        .theme(application_theme)
        .run()
}

fn application_title(state: &Viewer) -> String {
    match &state.product {
        Some(product) => format!("CALIPSO Viewer - {}", product.kind),
        None => "CALIPSO Viewer".into(),
    }
}

fn application_subscription(_: &Viewer) -> Subscription<Message> {
    event::listen_with(key_event)
}

fn application_theme(_: &Viewer) -> Theme {
    Theme::Dark
}

fn key_event(event: Event, _status: event::Status, _window: iced::window::Id) -> Option<Message> {
    match event {
        Event::Keyboard(keyboard::Event::KeyPressed { key, .. }) => key_name(&key).map(Message::KeyPressed),
        _ => None,
    }
}

fn key_name(key: &keyboard::Key) -> Option<String> {
    match key {
        keyboard::Key::Named(keyboard::key::Named::Escape) => Some("Escape".into()),
        keyboard::Key::Named(keyboard::key::Named::Enter) => Some("Return".into()),
        keyboard::Key::Character(c) => Some(c.to_string()),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tool {
    Draw,
    Zoom,
    Pan,
}

impl Tool {
    const ALL: [Tool; 3] = [Tool::Draw, Tool::Zoom, Tool::Pan];

    fn label(self) -> &'static str {
        match self {
            Tool::Draw => "Draw",
            Tool::Zoom => "Zoom",
            Tool::Pan => "Pan",
        }
    }

    fn hint(self) -> &'static str {
        match self {
            Tool::Draw => "Click to add vertices, Enter closes the shape, Esc drops it, c clears all",
            Tool::Zoom => "Drag a box to zoom in",
            Tool::Pan => "Drag to move the view",
        }
    }
}

#[derive(Debug, Clone)]
enum Message {
    ToolPressed(Tool),
    TipEnter(Tool),
    TipLeave(Tool),
    Home,
    Back,
    Forward,
    SwitchPlot,
    Reload,
    PlotEntered,
    PlotExited,
    PointerMoved(Point),
    PointerPressed,
    PointerReleased,
    KeyPressed(String),
}

/// Everything the toolbar callbacks are allowed to touch.
struct PlotState {
    navigator: Navigator,
    overlay: Overlay,
    drawing: bool,
    sketch: Vec<(f64, f64)>,
    shapes: Vec<Vec<(f64, f64)>>,
    /// Last pointer position in figure coordinates.
    pointer: (f32, f32),
    hovering: bool,
}

impl PlotState {
    fn new(home: ViewLimits) -> Self {
        Self {
            navigator: Navigator::new(home),
            overlay: Overlay::default(),
            drawing: false,
            sketch: Vec::new(),
            shapes: Vec::new(),
            pointer: (0.0, 0.0),
            hovering: false,
        }
    }

    fn close_sketch(&mut self) {
        if self.sketch.len() >= 3 {
            self.shapes.push(std::mem::take(&mut self.sketch));
        }
    }
}

struct ToolSlot {
    tool: Tool,
    id: ToolId,
    tip: Tooltip,
}

fn build_toolbar() -> (ToggleRegistry<PlotState>, Vec<ToolSlot>) {
    let mut registry = ToggleRegistry::new();
    let draw = registry.register(
        ToggleTool::new(Tool::Draw.label())
            .cursor("pencil")
            .bind(BindContext::Canvas, "Return", PlotState::close_sketch)
            .bind(BindContext::Canvas, "Escape", |plot: &mut PlotState| plot.sketch.clear())
            .bind(BindContext::Canvas, "c", |plot: &mut PlotState| {
                plot.sketch.clear();
                plot.shapes.clear();
            })
            .on_release(|plot: &mut PlotState| {
                plot.drawing = false;
                plot.sketch.clear();
            })
            .on_toggle(|plot: &mut PlotState, active: bool| plot.drawing = active),
    );
    let zoom = registry.register(
        ToggleTool::new(Tool::Zoom.label())
            .cursor("crosshair")
            .on_release(|plot: &mut PlotState| plot.navigator.set_mode(NavMode::None))
            .on_toggle(|plot: &mut PlotState, active: bool| {
                if active {
                    plot.navigator.set_mode(NavMode::Zoom);
                }
            }),
    );
    let pan = registry.register(
        ToggleTool::new(Tool::Pan.label())
            .cursor("fleur")
            .on_release(|plot: &mut PlotState| plot.navigator.set_mode(NavMode::None))
            .on_toggle(|plot: &mut PlotState, active: bool| {
                if active {
                    plot.navigator.set_mode(NavMode::Pan);
                }
            }),
    );
    let slots = Tool::ALL
        .into_iter()
        .zip([draw, zoom, pan])
        .map(|(tool, id)| ToolSlot {
            tool,
            id,
            tip: Tooltip::new(tool.hint()),
        })
        .collect();
    (registry, slots)
}

fn load_product(plot: PlotKind, seed: u64) -> Result<PlotProduct, String> {
    let builder = ProductBuilder::new(ProductConfig {
        plot,
        ..ProductConfig::default()
    });
    let source: Box<dyn GranuleSource> = match std::env::var_os(GRANULE_ENV) {
        Some(path) => Box::new(JsonGranuleReader::new(path)),
        None => Box::new(SyntheticGranule::new(SyntheticConfig {
            seed,
            ..SyntheticConfig::default()
        })),
    };
    builder.build(source.as_ref()).map_err(|e| e.to_string())
}

struct Viewer {
    plot_kind: PlotKind,
    seed: u64,
    product: Option<PlotProduct>,
    colormap: ColorMap,
    registry: ToggleRegistry<PlotState>,
    tools: Vec<ToolSlot>,
    plot: PlotState,
    status: String,
    history: Vec<String>,
}

impl Viewer {
    fn boot() -> (Self, Task<Message>) {
        let (registry, tools) = build_toolbar();
        let mut viewer = Viewer {
            plot_kind: PlotKind::Backscattered,
            seed: 7,
            product: None,
            colormap: ColorMap::backscatter(),
            registry,
            tools,
            plot: PlotState::new(ViewLimits::from_extent([0.0, 1.0, 0.0, 1.0])),
            status: "Loading granule...".into(),
            history: Vec::new(),
        };
        viewer.reload();
        (viewer, Task::none())
    }

    fn reload(&mut self) {
        self.registry.deactivate_all(&mut self.plot);
        match load_product(self.plot_kind, self.seed) {
            Ok(product) => {
                info!("Loaded {} ({})", product.title, product.kind);
                self.plot.navigator.reset(ViewLimits::from_extent(product.extent));
                self.plot.shapes.clear();
                self.colormap = product.colormap();
                self.status = product.title.clone();
                self.push_history(format!("Loaded {} with seed {}", product.kind, self.seed));
                self.product = Some(product);
            }
            Err(err) => {
                warn!("Failed to build product: {}", err);
                self.status = format!("Failed to build product: {}", err);
                self.push_history(self.status.clone());
                self.product = None;
            }
        }
    }

    fn update(state: &mut Self, message: Message) -> Task<Message> {
        match message {
            Message::ToolPressed(tool) => {
                if let Some(id) = state.slot(tool).map(|slot| slot.id) {
                    match state.registry.toggle(id, &mut state.plot) {
                        Ok(active) => {
                            let verb = if active { "on" } else { "off" };
                            state.push_history(format!("{} {}", tool.label(), verb));
                        }
                        Err(err) => warn!("Toolbar error: {}", err),
                    }
                }
            }
            Message::TipEnter(tool) => {
                if let Some(slot) = state.tools.iter_mut().find(|slot| slot.tool == tool) {
                    slot.tip.enter();
                }
            }
            Message::TipLeave(tool) => {
                if let Some(slot) = state.tools.iter_mut().find(|slot| slot.tool == tool) {
                    slot.tip.leave();
                }
            }
            Message::Home => state.plot.navigator.home(),
            Message::Back => state.plot.navigator.back(),
            Message::Forward => state.plot.navigator.forward(),
            Message::SwitchPlot => {
                state.plot_kind = match state.plot_kind {
                    PlotKind::Backscattered => PlotKind::Depolarized,
                    _ => PlotKind::Backscattered,
                };
                state.reload();
            }
            Message::Reload => {
                state.seed = state.seed.wrapping_add(1);
                state.reload();
            }
            Message::PlotEntered => state.plot.hovering = true,
            Message::PlotExited => state.plot.hovering = false,
            Message::PointerMoved(point) => {
                let (x, y) = (point.x, PLOT_HEIGHT - point.y);
                state.plot.pointer = (x, y);
                let PlotState { navigator, overlay, .. } = &mut state.plot;
                navigator.drag(overlay, x, y);
            }
            Message::PointerPressed => {
                let (x, y) = state.plot.pointer;
                if state.plot.drawing {
                    let point = state.plot.navigator.data_at(&state.plot.overlay, x, y);
                    state.plot.sketch.push(point);
                } else {
                    state.plot.navigator.press(x, y);
                }
            }
            Message::PointerReleased => {
                let (x, y) = state.plot.pointer;
                let PlotState { navigator, overlay, .. } = &mut state.plot;
                navigator.release(overlay, x, y);
            }
            Message::KeyPressed(key) => {
                let context = if state.plot.hovering {
                    BindContext::Canvas
                } else {
                    BindContext::Root
                };
                if !state.registry.dispatch_key(&context, &key, &mut state.plot) && key == "h" {
                    state.plot.navigator.home();
                }
            }
        }
        Task::none()
    }

    fn slot(&self, tool: Tool) -> Option<&ToolSlot> {
        self.tools.iter().find(|slot| slot.tool == tool)
    }

    fn view(state: &Self) -> Element<'_, Message> {
        let tool_buttons = state.tools.iter().fold(row![].spacing(TOOLBAR_SPACING), |bar, slot| {
            let relief = state.registry.relief(slot.id).unwrap_or(Relief::Raised);
            let style: fn(&Theme, button::Status) -> button::Style = match relief {
                Relief::Sunken => button::primary,
                Relief::Raised => button::secondary,
            };
            let tool_button = button(text(slot.tool.label()))
                .width(Length::Fixed(TOOL_BUTTON_WIDTH))
                .style(style)
                .on_press(Message::ToolPressed(slot.tool));
            bar.push(
                mouse_area(tool_button)
                    .on_enter(Message::TipEnter(slot.tool))
                    .on_exit(Message::TipLeave(slot.tool)),
            )
        });

        let toolbar = row![
            tool_buttons,
            button(text("Home")).on_press(Message::Home),
            button(text("Back")).on_press(Message::Back),
            button(text("Forward")).on_press(Message::Forward),
            button(text("Switch plot")).on_press(Message::SwitchPlot),
            button(text("New granule")).on_press(Message::Reload),
        ]
        .spacing(TOOLBAR_SPACING)
        .align_y(Alignment::Center);

        let tip_line: Element<'_, Message> = match state
            .tools
            .iter()
            .enumerate()
            .find(|(_, slot)| slot.tip.is_visible())
        {
            Some((index, slot)) => {
                let anchor = (index as f32 * (TOOL_BUTTON_WIDTH + TOOLBAR_SPACING), 0.0);
                let (left, top) = slot.tip.placement(anchor);
                container(text(slot.tip.text()).size(12))
                    .padding(Padding {
                        top: top / 3.0,
                        left,
                        ..Padding::ZERO
                    })
                    .into()
            }
            None => text("").size(12).into(),
        };

        let plot_area: Element<'_, Message> = match &state.product {
            Some(product) => {
                let heatmap = Canvas::new(Heatmap {
                    product,
                    colormap: &state.colormap,
                    view: state.plot.navigator.view(),
                    band: state.plot.overlay.band,
                    shapes: &state.plot.shapes,
                    sketch: &state.plot.sketch,
                })
                .width(Length::Fixed(PLOT_WIDTH))
                .height(Length::Fixed(PLOT_HEIGHT));
                mouse_area(heatmap)
                    .on_move(Message::PointerMoved)
                    .on_press(Message::PointerPressed)
                    .on_release(Message::PointerReleased)
                    .on_enter(Message::PlotEntered)
                    .on_exit(Message::PlotExited)
                    .into()
            }
            None => container(text("No product loaded"))
                .width(Length::Fixed(PLOT_WIDTH))
                .height(Length::Fixed(PLOT_HEIGHT))
                .center_x(Length::Fixed(PLOT_WIDTH))
                .center_y(Length::Fixed(PLOT_HEIGHT))
                .into(),
        };

        let readout = match &state.product {
            Some(product) => {
                let (x, y) = state.plot.pointer;
                let (dx, dz) = state.plot.navigator.data_at(&state.plot.overlay, x, y);
                let mode = match state.plot.navigator.mode() {
                    NavMode::None => "",
                    NavMode::Pan => "pan",
                    NavMode::Zoom => "zoom",
                };
                let cursor = state.registry.active_cursor().unwrap_or("arrow");
                text(format!(
                    "{} = {:.2}, {} = {:.2} km | {} {} | cursor {}",
                    product.x_label, dx, product.y_label, dz, mode, state.plot.shapes.len(), cursor
                ))
                .size(14)
            }
            None => text("").size(14),
        };

        let labels = match &state.product {
            Some(product) => text(format!(
                "{} | x: {} | y: {}",
                product.colorbar_label, product.x_label, product.y_label
            ))
            .size(12),
            None => text("").size(12),
        };

        let history_list = if state.history.is_empty() {
            Column::new().push(text("No activity yet").size(12))
        } else {
            state
                .history
                .iter()
                .rev()
                .fold(Column::new().spacing(4), |col, entry| {
                    col.push(text(entry.clone()).size(12))
                })
        };

        let layout = column![
            text(state.status.clone()).size(20),
            toolbar,
            tip_line,
            plot_area,
            readout,
            labels,
            text("Activity log").size(16),
            container(scrollable(history_list).height(Length::Fixed(90.0))).padding(6),
        ]
        .spacing(10)
        .padding(20);

        container(layout).width(Length::Fill).height(Length::Fill).into()
    }

    fn push_history(&mut self, entry: String) {
        self.history.push(entry);
        if self.history.len() > 20 {
            self.history.remove(0);
        }
    }
}
