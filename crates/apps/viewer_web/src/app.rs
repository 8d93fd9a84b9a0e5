use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};

use gloo_net::http::Request;
use serde::Serialize;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_futures::spawn_local;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use catalog::{DatasetStore, InMemoryStore, LocalStorageStore, StoreError};
use compute::analysis::Statistics;
use compute::{ComputeQueue, MirrorRequest, MirrorTask, run_mirror};
use formats::{Edge, GeneDensity, parse_gene_density};
use foundation::ids::BinId;
use runtime::budget::TaskBudget;
use runtime::event_bus::EventBus;
use scene::picking::{PickOptions, pick_ray};
use scene::query::filter_edges;
use scene::world::SceneWorld;
use scene::{SessionEvent, SessionState, parse_bin_input};
use streaming::{DatasetBundle, DatasetLoader, FetchError};
use views::{
    BrushRect, ColorMode, HeatmapView, LinkMark, ParallelView, PlanarView, Viewport,
};

use crate::camera::OrbitCamera;
use crate::render;

// Guard to prevent double-initialization of global state (relevant during
// hot reload).
static INITIALIZED: AtomicBool = AtomicBool::new(false);

const STORE_NAMESPACE: &str = "contact_atlas.datasets";

// Heatmap plot margins inside its canvas; left hosts the y labels, right
// hosts the legend, bottom hosts the x labels and density strip.
const HEATMAP_MARGIN_LEFT: f64 = 50.0;
const HEATMAP_MARGIN_TOP: f64 = 0.0;
const HEATMAP_MARGIN_RIGHT: f64 = 100.0;
const HEATMAP_MARGIN_BOTTOM: f64 = 100.0;

// Footer reserved under the parallel plot for the categorical legend.
const PARALLEL_LEGEND_STRIP: f64 = 40.0;

const LINK_HIT_TOLERANCE_PX: f64 = 3.0;

/// Yield to the browser event loop so heavy compute never starves input
/// processing.
async fn yield_now() {
    let promise = js_sys::Promise::new(&mut |resolve, _| {
        if let Some(window) = web_sys::window() {
            let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, 0);
        }
    });
    let _ = JsFuture::from(promise).await;
}

struct CanvasSlot {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSlot {
    fn width(&self) -> f64 {
        self.canvas.width() as f64
    }

    fn height(&self) -> f64 {
        self.canvas.height() as f64
    }
}

struct Canvases {
    scene: CanvasSlot,
    planar: CanvasSlot,
    heatmap: CanvasSlot,
    parallel: CanvasSlot,
}

struct Dashboard {
    session: SessionState,
    bus: EventBus<SessionEvent>,
    loader: DatasetLoader,
    bundle: Option<DatasetBundle>,
    density: Vec<GeneDensity>,
    /// The one filtered edge subset every view renders this turn.
    filtered: Vec<Edge>,
    world: SceneWorld,
    planar: PlanarView,
    heatmap: HeatmapView,
    parallel: ParallelView,
    parallel_links: Vec<LinkMark>,
    mirror: MirrorTask,
    compute: ComputeQueue<MirrorRequest>,
    camera: OrbitCamera,
    canvases: Option<Canvases>,
    brush_origin: Option<(f64, f64)>,
    load_error: Option<String>,
}

impl Dashboard {
    fn new() -> Self {
        Self {
            session: SessionState::new(),
            bus: EventBus::new(),
            loader: DatasetLoader::new(),
            bundle: None,
            density: Vec::new(),
            filtered: Vec::new(),
            world: SceneWorld::new(),
            planar: PlanarView::new(),
            heatmap: HeatmapView::new(),
            parallel: ParallelView::new(),
            parallel_links: Vec::new(),
            mirror: MirrorTask::new(),
            compute: ComputeQueue::new(2),
            camera: OrbitCamera::default(),
            canvases: None,
            brush_origin: None,
            load_error: None,
        }
    }

    fn opacity(&self) -> f64 {
        self.session.link_opacity() as f64 / 100.0
    }

    fn heatmap_plot_size(&self) -> f64 {
        let Some(canvases) = &self.canvases else {
            return 0.0;
        };
        let slot = &canvases.heatmap;
        (slot.width() - HEATMAP_MARGIN_LEFT - HEATMAP_MARGIN_RIGHT)
            .min(slot.height() - HEATMAP_MARGIN_TOP - HEATMAP_MARGIN_BOTTOM)
            .max(0.0)
    }

    /// Re-runs the shared edge filter from the session state.
    fn refilter(&mut self) {
        let Some(bundle) = &self.bundle else {
            self.filtered.clear();
            return;
        };
        self.filtered = filter_edges(
            &bundle.edges_top_k,
            &self.session.selected_ids(),
            self.session.interaction_filters(),
            self.session.edge_weight_percentile(),
        );
    }

    /// One selection-changed pass: re-filter once, then refresh each view
    /// from the same subset.
    fn refresh_from_selection(&mut self) {
        self.refilter();
        let opacity = self.opacity();
        self.world.clear_edges();
        self.world.build_edges(&self.filtered, opacity);
        self.world.highlight_nodes(&self.session.selected_ids());
        self.world.set_clicked(self.session.clicked_node());
        self.paint_all();
    }

    /// Opacity-only pass: one control, three renderers, no re-fetching or
    /// re-filtering.
    fn refresh_opacity(&mut self) {
        self.world.set_line_opacity(self.opacity());
        self.paint_scene();
        self.paint_planar();
        self.paint_parallel();
    }

    fn drain_events(&mut self) {
        let events = self.bus.drain();
        if events.is_empty() {
            return;
        }
        let opacity_only = events
            .iter()
            .all(|e| matches!(e, SessionEvent::LinkOpacityChanged));
        if opacity_only {
            self.refresh_opacity();
        } else {
            self.refresh_from_selection();
        }
    }

    fn teardown_views(&mut self) {
        self.world.clear();
        self.planar = PlanarView::new();
        self.heatmap.clear();
        self.parallel.clear();
        self.parallel_links.clear();
        self.filtered.clear();
        self.bundle = None;
        self.density.clear();
        self.brush_origin = None;
        self.paint_all();
    }

    fn paint_all(&mut self) {
        self.paint_scene();
        self.paint_planar();
        self.paint_heatmap();
        self.paint_parallel();
    }

    fn paint_scene(&self) {
        let Some(canvases) = &self.canvases else {
            return;
        };
        let slot = &canvases.scene;
        render::paint_scene(&slot.ctx, &self.world, &self.camera, slot.width(), slot.height());
    }

    fn paint_planar(&self) {
        let Some(canvases) = &self.canvases else {
            return;
        };
        let slot = &canvases.planar;
        let circles = self.planar.circles();
        let segments = if self.planar.positions().is_empty() {
            Vec::new()
        } else {
            self.planar.draw_edges(&self.filtered, self.opacity())
        };
        render::paint_planar(&slot.ctx, &circles, &segments, slot.width(), slot.height());
    }

    fn paint_heatmap(&self) {
        let Some(canvases) = &self.canvases else {
            return;
        };
        let slot = &canvases.heatmap;
        render::clear(&slot.ctx, slot.width(), slot.height());
        if !self.heatmap.is_built() {
            return;
        }
        let cells = self.heatmap.cells();
        let highlights = self.heatmap.highlights(self.session.selection());
        let x_ticks = self.heatmap.x_ticks();
        let y_ticks = self.heatmap.y_ticks();
        let legend = self.heatmap.legend();
        let density = self.heatmap.density_strip(&self.density);
        render::paint_heatmap(
            &slot.ctx,
            &render::HeatmapFrame {
                cells: &cells,
                highlights: &highlights,
                x_ticks: &x_ticks,
                y_ticks: &y_ticks,
                legend: legend.as_ref(),
                density: &density,
                size: self.heatmap.plot_size(),
                margin_left: HEATMAP_MARGIN_LEFT,
                margin_top: HEATMAP_MARGIN_TOP,
            },
        );
    }

    fn paint_parallel(&mut self) {
        let Some(canvases) = &self.canvases else {
            return;
        };
        let slot = &canvases.parallel;
        if !self.parallel.is_built() {
            render::clear(&slot.ctx, slot.width(), slot.height());
            self.parallel_links.clear();
            return;
        }
        self.parallel_links = self.parallel.links(&self.filtered, self.opacity());
        let ticks = self.parallel.ticks();
        let legend = self.parallel.legend_entries();
        let density = self.parallel.density_strip(&self.density);
        render::paint_parallel(
            &slot.ctx,
            &render::ParallelFrame {
                links: &self.parallel_links,
                ticks: &ticks,
                legend: &legend,
                density: &density,
                width: slot.width(),
                height: slot.height() - PARALLEL_LEGEND_STRIP,
                axis_inset: views::AXIS_INSET,
            },
        );
    }
}

thread_local! {
    static STATE: RefCell<Dashboard> = RefCell::new(Dashboard::new());
    static STORE: RefCell<Option<Box<dyn DatasetStore>>> = const { RefCell::new(None) };
}

fn with_state<R>(f: impl FnOnce(&mut Dashboard) -> R) -> R {
    STATE.with(|state| f(&mut state.borrow_mut()))
}

fn with_store<R>(f: impl FnOnce(&mut dyn DatasetStore) -> R) -> R {
    STORE.with(|store| {
        let mut slot = store.borrow_mut();
        let store = slot.get_or_insert_with(|| match LocalStorageStore::new(STORE_NAMESPACE) {
            Ok(persistent) => Box::new(persistent) as Box<dyn DatasetStore>,
            Err(e) => {
                log::warn!("persistent store unavailable ({e}); caching in memory only");
                Box::new(InMemoryStore::new())
            }
        });
        f(store.as_mut())
    })
}

/// Clears the store ahead of a dataset switch. Blocked is informational:
/// the switch proceeds and a later clear can finish the job.
fn clear_store_for_switch() {
    with_store(|store| match store.clear() {
        Ok(()) => {}
        Err(StoreError::Blocked) => {
            log::warn!("dataset store clear blocked by an open handle; continuing");
        }
        Err(e) => log::warn!("dataset store clear failed: {e}"),
    });
}

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    // Avoid double-initialization (can happen during hot-reload edge cases).
    if INITIALIZED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }
    console_error_panic_hook::set_once();
    let _ = console_log::init_with_level(log::Level::Info);
    Ok(())
}

/// Binds the four view canvases by element id.
#[wasm_bindgen]
pub fn init_canvases(
    scene_id: &str,
    planar_id: &str,
    heatmap_id: &str,
    parallel_id: &str,
) -> Result<(), JsValue> {
    let scene = canvas_slot(scene_id)?;
    let planar = canvas_slot(planar_id)?;
    let heatmap = canvas_slot(heatmap_id)?;
    let parallel = canvas_slot(parallel_id)?;
    with_state(|state| {
        state.canvases = Some(Canvases {
            scene,
            planar,
            heatmap,
            parallel,
        });
        state.paint_all();
    });
    Ok(())
}

fn canvas_slot(id: &str) -> Result<CanvasSlot, JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("missing canvas #{id}")))?
        .dyn_into::<HtmlCanvasElement>()?;
    let ctx = canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    Ok(CanvasSlot { canvas, ctx })
}

/// Switches the active dataset.
///
/// Sequence: tear down all four views, clear the store, restart the
/// compute task, then fetch all four resources. No view is populated until
/// every resource is confirmed present; the returned promise rejects with
/// the aggregate error otherwise.
#[wasm_bindgen]
pub async fn select_dataset(name: String) -> Result<(), JsValue> {
    let mut assembly = with_state(|state| {
        state.teardown_views();
        state.mirror.restart();
        state.load_error = None;
        state.loader.begin(&name)
    });

    clear_store_for_switch();

    for request in assembly.requests() {
        let cached = with_store(|store| store.get(request.storage_key));
        match cached {
            Ok(Some(raw)) => {
                assembly.provide_raw(request.kind, &raw);
                continue;
            }
            Ok(None) => {}
            Err(e) => log::warn!("store read for {} failed: {e}", request.storage_key),
        }

        match Request::get(&request.path).send().await {
            Ok(response) if response.ok() => match response.text().await {
                Ok(body) => {
                    let stored = with_store(|store| store.put(request.storage_key, &body));
                    if let Err(e) = stored {
                        log::warn!("store write for {} failed: {e}", request.storage_key);
                    }
                    assembly.provide_raw(request.kind, &body);
                }
                Err(e) => assembly.record_fetch_failure(FetchError {
                    path: request.path.clone(),
                    status: None,
                    message: e.to_string(),
                }),
            },
            Ok(response) => assembly.record_fetch_failure(FetchError {
                path: request.path.clone(),
                status: Some(response.status()),
                message: response.status_text(),
            }),
            Err(e) => assembly.record_fetch_failure(FetchError {
                path: request.path.clone(),
                status: None,
                message: e.to_string(),
            }),
        }
    }

    // Optional per-bin density track; absence is expected for some
    // organisms and never fails the load.
    let density = match Request::get(&format!("{name}_gene_density.json")).send().await {
        Ok(response) if response.ok() => match response.text().await {
            Ok(body) => parse_gene_density("gene_density", &body).unwrap_or_else(|e| {
                log::info!("gene density track unreadable: {e}");
                Vec::new()
            }),
            Err(_) => Vec::new(),
        },
        _ => Vec::new(),
    };

    let superseded = with_state(|state| !state.loader.is_current(&assembly));
    if superseded {
        // A newer switch already owns the views; this load's results must
        // not touch them.
        log::info!("dataset load for {name} superseded; discarding");
        return Ok(());
    }

    let bundle = match assembly.finish() {
        Ok(bundle) => bundle,
        Err(failure) => {
            let message = failure.to_string();
            for error in &failure.errors {
                log::error!("{error}");
            }
            with_state(|state| state.load_error = Some(message.clone()));
            return Err(JsValue::from_str(&message));
        }
    };

    with_state(|state| {
        let event = state.session.set_dataset(&name);
        state.bus.publish(event);

        state.world.build_nodes(&bundle.nodes_3d);
        if let Some(canvases) = &state.canvases {
            let viewport = Viewport {
                width: canvases.planar.width(),
                height: canvases.planar.height(),
            };
            state.planar.draw(&bundle.nodes_2d, viewport);
            state.parallel.setup(
                &bundle.edges_top_k,
                canvases.parallel.width(),
                canvases.parallel.height() - PARALLEL_LEGEND_STRIP,
            );
        }

        let request = state.mirror.request(bundle.edges_full.clone());
        if state.compute.try_submit(0, 2, request).is_err() {
            log::warn!("compute queue full; heatmap preprocessing deferred");
        }

        state.density = density;
        state.bundle = Some(bundle);
        state.drain_events();
    });

    drive_compute();
    Ok(())
}

/// Drains the compute queue off the input path, yielding to the browser
/// between jobs, and delivers results through the exactly-once task.
fn drive_compute() {
    spawn_local(async move {
        loop {
            let job = with_state(|state| {
                let mut budget = TaskBudget::new(4);
                state.compute.pop_next_with_budget(&mut budget)
            });
            let Some((_id, request)) = job else {
                break;
            };

            yield_now().await;
            let response = run_mirror(&request);

            with_state(|state| {
                let Some(result) = state.mirror.accept(response) else {
                    log::info!("stale heatmap preprocessing result discarded");
                    return;
                };
                match result {
                    Ok(mirrored) => {
                        let size = state.heatmap_plot_size();
                        state.heatmap.build(&mirrored, size);
                        state.paint_heatmap();
                    }
                    Err(message) => log::error!("heatmap preprocessing failed: {message}"),
                }
            });
        }
    });
}

#[derive(Debug, Serialize)]
struct NodeOption {
    id: String,
    #[serde(rename = "numericId")]
    numeric_id: u32,
    checked: bool,
}

/// Node checkbox options for the host's dropdown, as JSON.
///
/// Every tenth bin in 1..=401 starts checked, matching the default
/// selection the dashboard opens with.
#[wasm_bindgen]
pub fn node_options_json() -> String {
    let options = with_state(|state| {
        let Some(bundle) = &state.bundle else {
            return Vec::new();
        };
        bundle
            .nodes_3d
            .iter()
            .filter_map(|node| {
                let bin = node.bin_id()?;
                let n = bin.value();
                Some(NodeOption {
                    id: node.id.clone(),
                    numeric_id: n,
                    checked: (1..=401).contains(&n) && (n - 1) % 10 == 0,
                })
            })
            .collect::<Vec<_>>()
    });
    serde_json::to_string(&options).unwrap_or_else(|_| "[]".to_string())
}

fn parse_id_list(csv: &str) -> Vec<BinId> {
    csv.split(',')
        .filter_map(|part| part.trim().parse::<u32>().ok())
        .map(BinId)
        .collect()
}

/// Visualize the checkbox selection. Both sliders snap back to 100%.
#[wasm_bindgen]
pub fn visualize_checkbox(ids_csv: String) -> Result<(), JsValue> {
    with_state(|state| {
        let ids = parse_id_list(&ids_csv);
        let e1 = state.session.set_weight_percentile(100);
        let e2 = state.session.set_link_opacity(100);
        let e3 = state.session.select_by_checkbox(ids);
        state.bus.publish(e1);
        state.bus.publish(e2);
        state.bus.publish(e3);
        state.drain_events();
    });
    Ok(())
}

/// Visualize a contiguous bin range. Validation happens before any state
/// mutation; the host surfaces the rejection to the user.
#[wasm_bindgen]
pub fn visualize_range(from: String, to: String) -> Result<(), JsValue> {
    let from = parse_bin_input(&from).map_err(|e| JsValue::from_str(&e.to_string()))?;
    let to = parse_bin_input(&to).map_err(|e| JsValue::from_str(&e.to_string()))?;
    apply_range(from, to)
}

/// The single visualize-range entry point shared by manual input and the
/// heatmap brush.
fn apply_range(from: u32, to: u32) -> Result<(), JsValue> {
    with_state(|state| {
        let event = state
            .session
            .select_by_range(from, to)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let e1 = state.session.set_weight_percentile(100);
        let e2 = state.session.set_link_opacity(100);
        state.bus.publish(e1);
        state.bus.publish(e2);
        state.bus.publish(event);
        state.drain_events();
        Ok(())
    })
}

/// Applies the interaction-type filter; rejects an empty code set the way
/// the original control does.
#[wasm_bindgen]
pub fn apply_interaction_filters(codes_csv: String) -> Result<u32, JsValue> {
    let codes: Vec<i32> = codes_csv
        .split(',')
        .filter_map(|part| part.trim().parse::<i32>().ok())
        .collect();
    if codes.is_empty() {
        return Err(JsValue::from_str("Please select at least one interaction type."));
    }
    Ok(with_state(|state| {
        let event = state.session.set_interaction_filters(codes);
        state.bus.publish(event);
        state.drain_events();
        state.filtered.len() as u32
    }))
}

/// Edge-weight percentile slider. Returns the number of edges now shown,
/// for the host's slider label.
#[wasm_bindgen]
pub fn set_edge_weight_percentile(value: i32) -> u32 {
    with_state(|state| {
        let event = state.session.set_weight_percentile(value as i64);
        state.bus.publish(event);
        state.drain_events();
        state.filtered.len() as u32
    })
}

/// Link-opacity slider: one control, three renderers (parallel paths, 2D
/// strokes, 3D line materials), no re-fetch and no re-filter.
#[wasm_bindgen]
pub fn set_link_opacity(value: i32) {
    with_state(|state| {
        let event = state.session.set_link_opacity(value as i64);
        state.bus.publish(event);
        state.drain_events();
    });
}

/// Parallel-plot color mode; returns whether the legend is now visible.
#[wasm_bindgen]
pub fn set_parallel_color_mode(mode: String) -> bool {
    with_state(|state| {
        let mode = match mode.as_str() {
            "gray" | "weight" => ColorMode::Weight,
            _ => ColorMode::Categorical,
        };
        state.parallel.set_color_mode(mode);
        state.paint_parallel();
        state.parallel.legend_visible()
    })
}

/// The clear button: resets the session and empties all four views. The
/// persistent store is cleared too; a blocked clear is only a warning.
#[wasm_bindgen]
pub fn clear_visualizations() {
    with_state(|state| {
        let event = state.session.reset();
        state.bus.publish(event);
        state.teardown_views();
        state.bus.drain();
    });
    clear_store_for_switch();
}

#[wasm_bindgen]
pub fn edge_weight_percentile() -> u32 {
    with_state(|state| state.session.edge_weight_percentile() as u32)
}

#[wasm_bindgen]
pub fn link_opacity() -> u32 {
    with_state(|state| state.session.link_opacity() as u32)
}

#[wasm_bindgen]
pub fn shown_edge_count() -> u32 {
    with_state(|state| state.filtered.len() as u32)
}

#[wasm_bindgen]
pub fn last_load_error() -> Option<String> {
    with_state(|state| state.load_error.clone())
}

/// 3D hover: ray cast, emissive highlight, anchored tooltip text.
#[wasm_bindgen]
pub fn scene_pointer_move(x: f64, y: f64) -> Option<String> {
    with_state(|state| {
        let canvases = state.canvases.as_ref()?;
        let (w, h) = (canvases.scene.width(), canvases.scene.height());
        let ray = state.camera.screen_ray(x, y, w, h);
        let hit = pick_ray(&state.world, ray, PickOptions::default());

        state.world.set_hovered(hit.map(|h| h.bin));
        state.paint_scene();
        hit.map(|h| format!("Bin: {}", h.bin))
    })
}

/// 3D click: toggles the single clicked node, separate from multi-select.
#[wasm_bindgen]
pub fn scene_click(x: f64, y: f64) -> Option<String> {
    with_state(|state| {
        let canvases = state.canvases.as_ref()?;
        let (w, h) = (canvases.scene.width(), canvases.scene.height());
        let ray = state.camera.screen_ray(x, y, w, h);
        let hit = pick_ray(&state.world, ray, PickOptions::default())?;

        let clicked = state.session.toggle_clicked_node(hit.bin);
        state.world.set_clicked(clicked);
        state.paint_scene();
        clicked.map(|bin| bin.to_string())
    })
}

#[wasm_bindgen]
pub fn scene_orbit(d_yaw: f64, d_pitch: f64) {
    with_state(|state| {
        state.camera.rotate(d_yaw, d_pitch);
        state.paint_scene();
    });
}

#[wasm_bindgen]
pub fn scene_zoom(factor: f64) {
    with_state(|state| {
        state.camera.zoom(factor);
        state.paint_scene();
    });
}

/// 2D hover: O(n) hit test, tooltip with the original node id, hovered
/// node recolored. The full node set is redrawn on each hover change.
#[wasm_bindgen]
pub fn planar_pointer_move(x: f64, y: f64) -> Option<String> {
    with_state(|state| {
        let hit = state.planar.hit_test(x, y);
        if state.planar.set_hovered(hit) {
            state.paint_planar();
        }
        let bin = hit?;
        let label = state.planar.label(bin)?.to_string();
        Some(format!("Bin: {label}"))
    })
}

/// Parallel-plot hover: nearest link within tolerance.
#[wasm_bindgen]
pub fn parallel_pointer_move(x: f64, y: f64) -> Option<String> {
    with_state(|state| {
        let link = state
            .parallel_links
            .iter()
            .find(|l| point_segment_distance(x, y, l.x1, l.y1, l.x2, l.y2) < LINK_HIT_TOLERANCE_PX)?;
        Some(format!(
            "Source: {}\nTarget: {}\nWeight: {:.4}",
            link.source,
            link.target,
            weight_of(state, link.source, link.target).unwrap_or(0.0)
        ))
    })
}

fn weight_of(state: &Dashboard, source: u32, target: u32) -> Option<f64> {
    state
        .filtered
        .iter()
        .find(|e| e.source == source && e.target == target)
        .map(|e| e.weight)
}

fn point_segment_distance(px: f64, py: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    let (dx, dy) = (x2 - x1, y2 - y1);
    let len2 = dx * dx + dy * dy;
    let t = if len2 <= 0.0 {
        0.0
    } else {
        (((px - x1) * dx + (py - y1) * dy) / len2).clamp(0.0, 1.0)
    };
    let (cx, cy) = (x1 + t * dx, y1 + t * dy);
    ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
}

fn brush_rect(origin: (f64, f64), x: f64, y: f64) -> BrushRect {
    BrushRect {
        x0: origin.0.min(x) - HEATMAP_MARGIN_LEFT,
        y0: origin.1.min(y) - HEATMAP_MARGIN_TOP,
        x1: origin.0.max(x) - HEATMAP_MARGIN_LEFT,
        y1: origin.1.max(y) - HEATMAP_MARGIN_TOP,
    }
}

#[wasm_bindgen]
pub fn heatmap_brush_start(x: f64, y: f64) {
    with_state(|state| state.brush_origin = Some((x, y)));
}

/// Live brush: returns the range/average tooltip while dragging.
#[wasm_bindgen]
pub fn heatmap_brush_move(x: f64, y: f64) -> Option<String> {
    with_state(|state| {
        let origin = state.brush_origin?;
        let summary = state.heatmap.brush_update(brush_rect(origin, x, y))?;
        Some(format!(
            "Source: Bin {} - Bin {}\nTarget: Bin {} - Bin {}\nAverage Weight: {:.6}",
            summary.source_min, summary.source_max, summary.target_min, summary.target_max,
            summary.mean_weight
        ))
    })
}

/// Brush release: the covered source-axis range becomes a range selection
/// through the same entry point manual range entry uses. Returns the
/// applied `[from, to]` so the host can fill its inputs.
#[wasm_bindgen]
pub fn heatmap_brush_end(x: f64, y: f64) -> Result<Option<Vec<u32>>, JsValue> {
    let range = with_state(|state| {
        let origin = state.brush_origin.take()?;
        state.heatmap.brush_release(brush_rect(origin, x, y))
    });
    let Some((from, to)) = range else {
        return Ok(None);
    };
    apply_range(from, to)?;
    Ok(Some(vec![from, to]))
}

/// Mean weight across the currently shown edges; the summary line under
/// the sliders.
#[wasm_bindgen]
pub fn shown_mean_weight() -> Option<f64> {
    with_state(|state| {
        let weights: Vec<f64> = state.filtered.iter().map(|e| e.weight).collect();
        Statistics::mean(&weights)
    })
}
