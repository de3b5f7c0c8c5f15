/*!
 * Desktop map for wbi-map
 *
 * Draws the country GeoJSON with a plain lon/lat scale and feeds pointer
 * events to the interaction coordinator:
 * - hover shows a tooltip with the country name
 * - click flashes the country and loads its indicators into the side panel
 *
 * Platform support: Windows, macOS, Linux
 */

use eframe::egui;
use egui::epaint::Mesh;
use egui::{Color32, Pos2, Rect, Sense, Shape, Stroke};
use geo::TriangulateEarcut;
use num_format::Locale;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};
use wbi_map::display::{PanelBody, PanelView};
use wbi_map::geometry::FeatureCollection;
use wbi_map::{ExplorerConfig, InteractionCoordinator};

const LAND: Color32 = Color32::from_rgb(0x9c, 0xb8, 0xa0);
const LAND_HOVER: Color32 = Color32::from_rgb(0x7f, 0xa3, 0x85);
const FLASH: Color32 = Color32::from_rgb(0xe8, 0x6a, 0x33);
const WATER: Color32 = Color32::from_rgb(0xd6, 0xe6, 0xf2);
const BORDER: Color32 = Color32::from_rgb(0x4a, 0x5a, 0x4e);

fn main() -> Result<(), eframe::Error> {
    env_logger::init();

    let config = match ExplorerConfig::load(None) {
        Ok(c) => c,
        Err(err) => {
            log::warn!("ignoring config: {:#}", err);
            ExplorerConfig::default()
        }
    };

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_min_inner_size([700.0, 400.0])
            .with_title("World Bank Indicators - map"),
        ..Default::default()
    };

    eframe::run_native(
        "wbi-map",
        options,
        Box::new(move |_cc| Ok(Box::new(MapApp::new(config)))),
    )
}

/// Triangles and outline rings of one country, in lon/lat.
struct CountryShape {
    name: String,
    triangles: Vec<[(f64, f64); 3]>,
    rings: Vec<Vec<(f64, f64)>>,
}

impl CountryShape {
    fn from_feature(feature: &wbi_map::CountryFeature) -> Self {
        let mut triangles = Vec::new();
        let mut rings = Vec::new();
        for polygon in &feature.geometry {
            for t in polygon.earcut_triangles() {
                let [a, b, c] = t.to_array();
                triangles.push([(a.x, a.y), (b.x, b.y), (c.x, c.y)]);
            }
            rings.push(polygon.exterior().coords().map(|c| (c.x, c.y)).collect());
        }
        Self {
            name: feature.name.clone(),
            triangles,
            rings,
        }
    }
}

enum LoadResult {
    Loaded(FeatureCollection),
    Failed(String),
}

struct MapApp {
    coord: Option<InteractionCoordinator>,
    startup_error: String,
    features: FeatureCollection,
    shapes: Vec<CountryShape>,
    map_status: String,
    loader: Option<mpsc::Receiver<LoadResult>>,
}

impl MapApp {
    fn new(config: ExplorerConfig) -> Self {
        let (coord, startup_error) = match InteractionCoordinator::from_config(&config) {
            Ok(c) => (Some(c), String::new()),
            Err(err) => (None, format!("Failed to start: {:#}", err)),
        };
        let mut app = Self {
            coord,
            startup_error,
            features: FeatureCollection::default(),
            shapes: Vec::new(),
            map_status: String::new(),
            loader: None,
        };
        app.start_loading(config.geometry_source.clone());
        app
    }

    /// Load geometry on a background thread; the map stays empty meanwhile.
    fn start_loading(&mut self, source: String) {
        let (sender, receiver) = mpsc::channel();
        self.loader = Some(receiver);
        self.map_status = format!("Loading countries from {}...", source);
        thread::spawn(move || {
            let result = match FeatureCollection::load(&source) {
                Ok(fc) => LoadResult::Loaded(fc),
                Err(err) => LoadResult::Failed(format!("{:#}", err)),
            };
            let _ = sender.send(result);
        });
    }

    fn check_loader(&mut self) {
        if let Some(receiver) = &self.loader
            && let Ok(result) = receiver.try_recv()
        {
            self.loader = None;
            match result {
                LoadResult::Loaded(fc) => {
                    self.shapes = fc.features().iter().map(CountryShape::from_feature).collect();
                    self.map_status = format!("{} countries", fc.len());
                    self.features = fc;
                }
                LoadResult::Failed(err) => {
                    log::warn!("geometry load failed: {}", err);
                    self.map_status = format!("No map: {}", err);
                }
            }
        }
    }

    fn side_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Country data");
        ui.add_space(8.0);

        let Some(coord) = &self.coord else {
            ui.colored_label(Color32::RED, &self.startup_error);
            return;
        };

        let view = PanelView::from_coordinator(coord, &Locale::en);
        if let Some(title) = &view.title {
            ui.strong(title);
            ui.add_space(4.0);
        }
        match &view.body {
            PanelBody::Empty => {
                ui.label("Click a country to load its indicators.");
            }
            PanelBody::Loading => {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Fetching from World Bank API...");
                });
            }
            PanelBody::NoData => {
                ui.label(wbi_map::display::NO_DATA);
            }
            PanelBody::Rows(rows) => {
                egui::Grid::new("dataset")
                    .num_columns(2)
                    .striped(true)
                    .show(ui, |ui| {
                        for (label, value) in rows {
                            ui.label(label);
                            ui.monospace(value);
                            ui.end_row();
                        }
                    });
            }
        }

        ui.add_space(12.0);
        ui.collapsing("Diagnostics", |ui| {
            let failures: Vec<_> = coord.failures().collect();
            if failures.is_empty() {
                ui.label("No failures recorded.");
            }
            for f in failures.iter().rev().take(10) {
                ui.small(f.to_string());
            }
        });

        ui.add_space(12.0);
        ui.separator();
        ui.small(&self.map_status);
        if ui
            .add_enabled(self.loader.is_none(), egui::Button::new("Open GeoJSON..."))
            .clicked()
            && let Some(path) = rfd::FileDialog::new()
                .add_filter("GeoJSON", &["json", "geojson"])
                .pick_file()
        {
            self.open_file(path);
        }
    }

    fn open_file(&mut self, path: PathBuf) {
        self.start_loading(path.to_string_lossy().to_string());
    }

    fn map(&mut self, ui: &mut egui::Ui, now: Instant) {
        let (response, painter) = ui.allocate_painter(ui.available_size(), Sense::click());
        let rect = response.rect;
        painter.rect_filled(rect, 0.0, WATER);

        let hovered = response.hover_pos().and_then(|p| {
            let (lon, lat) = unproject(rect, p);
            self.features.feature_at(lon, lat)
        });

        if let Some(coord) = &mut self.coord {
            match (hovered, response.hover_pos()) {
                (Some(f), Some(p)) => {
                    if coord.tooltip().country() == Some(f.name.as_str()) {
                        coord.mouse_move(p.x, p.y);
                    } else {
                        coord.hover(f, p.x, p.y);
                    }
                }
                _ => {
                    if coord.tooltip().is_visible() {
                        coord.mouse_leave();
                    }
                }
            }
            if response.clicked()
                && let Some(f) = hovered
            {
                coord.click(f, now);
            }
        }

        let hovered_name = hovered.map(|f| f.name.as_str());
        for shape in &self.shapes {
            let flashing = self
                .coord
                .as_ref()
                .is_some_and(|c| c.is_highlighted(&shape.name, now));
            let fill = if flashing {
                FLASH
            } else if hovered_name == Some(shape.name.as_str()) {
                LAND_HOVER
            } else {
                LAND
            };

            let mut mesh = Mesh::default();
            for tri in &shape.triangles {
                let base = mesh.vertices.len() as u32;
                for &(lon, lat) in tri {
                    mesh.colored_vertex(project(rect, lon, lat), fill);
                }
                mesh.add_triangle(base, base + 1, base + 2);
            }
            painter.add(Shape::mesh(mesh));

            for ring in &shape.rings {
                let points: Vec<Pos2> = ring.iter().map(|&(lon, lat)| project(rect, lon, lat)).collect();
                painter.add(Shape::closed_line(points, Stroke::new(0.5, BORDER)));
            }
        }

        if let Some(coord) = &self.coord
            && let (Some(name), Some((x, y))) = (coord.tooltip().country(), coord.tooltip().position())
        {
            egui::Area::new(egui::Id::new("country_tooltip"))
                .order(egui::Order::Tooltip)
                .fixed_pos(Pos2::new(x + 14.0, y + 14.0))
                .interactable(false)
                .show(ui.ctx(), |ui| {
                    egui::Frame::popup(ui.style()).show(ui, |ui| {
                        ui.label(name);
                    });
                });
        }
    }
}

/// Lon/lat to screen, equirectangular.
fn project(rect: Rect, lon: f64, lat: f64) -> Pos2 {
    let x = rect.left() + ((lon + 180.0) / 360.0) as f32 * rect.width();
    let y = rect.top() + ((90.0 - lat) / 180.0) as f32 * rect.height();
    Pos2::new(x, y)
}

fn unproject(rect: Rect, p: Pos2) -> (f64, f64) {
    let lon = ((p.x - rect.left()) / rect.width()) as f64 * 360.0 - 180.0;
    let lat = 90.0 - ((p.y - rect.top()) / rect.height()) as f64 * 180.0;
    (lon, lat)
}

impl eframe::App for MapApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.check_loader();
        if self.loader.is_some() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }

        if let Some(coord) = &mut self.coord {
            coord.poll(now);
            if coord.is_loading() {
                ctx.request_repaint_after(Duration::from_millis(50));
            }
            if let Some(wake) = coord.next_wakeup(now) {
                ctx.request_repaint_after(wake);
            }
        }

        egui::SidePanel::right("country_panel")
            .min_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| self.side_panel(ui));
            });

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| self.map(ui, now));
    }
}
