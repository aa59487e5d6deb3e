#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod geom;
pub mod kernel;
pub mod library;
pub mod pipeline;

use std::fmt;

use components::{BezelParams, GemCutterParams, HeadParams, RingDesign};
use geom::{Brep, Curve, Plane, Point3, Tolerance};
use kernel::PolylineKernel;
use library::{ProfileCatalog, ProfileLibrary};
use pipeline::{BuildContext, BuildError, BuildResult, Diagnostics, PipelineConfig};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("could not start the rayon thread pool: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

// ────────────────────────────────────────────────────────────────────────────
// Wire types
// ────────────────────────────────────────────────────────────────────────────

/// Source curve as sent by the host.
#[derive(Debug, Clone, Deserialize)]
struct CurveInput {
    points: Vec<[f64; 3]>,
    /// Inferred from coinciding end points when absent.
    #[serde(default)]
    closed: Option<bool>,
    /// Plane the outline lies in; its best-fit plane when absent.
    #[serde(default)]
    plane: Option<Plane>,
}

impl CurveInput {
    fn to_curve(&self, tol: Tolerance) -> BuildResult<Curve> {
        let points: Vec<Point3> = self.points.iter().map(|&[x, y, z]| Point3::new(x, y, z)).collect();
        let closed = self.closed.unwrap_or_else(|| match (points.first(), points.last()) {
            (Some(first), Some(last)) => points.len() > 3 && first.distance_to(*last) <= tol.eps,
            _ => false,
        });
        let count = points.len();
        Curve::polyline(points, closed).ok_or_else(|| {
            BuildError::InvalidGeometry(format!("curve of {count} points is degenerate"))
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct MeshExport {
    vertices: Vec<[f64; 3]>,
    faces: Vec<Vec<u32>>,
}

impl From<&Brep> for MeshExport {
    fn from(brep: &Brep) -> Self {
        let compact = brep.compacted();
        Self {
            vertices: compact.vertices.iter().map(|p| [p.x, p.y, p.z]).collect(),
            faces: compact.polygons().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct BuildExport {
    meshes: Vec<MeshExport>,
    warnings: Vec<String>,
    /// Estimated stone weight in carats, for gem cutters.
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<f64>,
}

impl BuildExport {
    fn new<'a>(solids: impl IntoIterator<Item = &'a Brep>, diagnostics: Diagnostics) -> Self {
        Self {
            meshes: solids.into_iter().map(MeshExport::from).collect(),
            warnings: diagnostics.warnings,
            weight: None,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Engine
// ────────────────────────────────────────────────────────────────────────────

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct JewelEngine {
    kernel: PolylineKernel,
    library: ProfileCatalog,
    config: PipelineConfig,
}

impl Default for JewelEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl JewelEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> JewelEngine {
        JewelEngine {
            kernel: PolylineKernel::default(),
            library: ProfileCatalog::with_builtins(),
            config: PipelineConfig::default(),
        }
    }

    /// Adds the profiles of a catalog document. Returns how many were read.
    #[wasm_bindgen]
    pub fn load_profiles(&mut self, xml: &str) -> Result<usize, JsValue> {
        self.library.load_xml_str(xml).map_err(to_js_error)
    }

    #[wasm_bindgen]
    pub fn profile_names(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.library.names()).map_err(to_js_error)
    }

    /// Replaces the pipeline policy; missing fields keep their defaults.
    #[wasm_bindgen]
    pub fn set_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: PipelineConfig = decode_or_default(config)?;
        self.kernel = self.kernel.with_kink_angle(config.kink_radians());
        self.config = config;
        Ok(())
    }

    #[wasm_bindgen]
    pub fn build_bezel(&self, outline: JsValue, params: JsValue) -> Result<JsValue, JsValue> {
        let outline: CurveInput = decode(outline)?;
        let params: BezelParams = decode_or_default(params)?;
        encode(&self.bezel(&outline, &params))
    }

    #[wasm_bindgen]
    pub fn build_gem_cutter(&self, outline: JsValue, params: JsValue) -> Result<JsValue, JsValue> {
        let outline: CurveInput = decode(outline)?;
        let params: GemCutterParams = decode_or_default(params)?;
        encode(&self.gem_cutter(&outline, &params))
    }

    #[wasm_bindgen]
    pub fn build_head(&self, rail: JsValue, params: JsValue) -> Result<JsValue, JsValue> {
        let rail: CurveInput = decode(rail)?;
        let params: HeadParams = decode_or_default(params)?;
        encode(&self.head(&rail, &params))
    }

    #[wasm_bindgen]
    pub fn build_ring(&self, design: JsValue) -> Result<JsValue, JsValue> {
        let design: RingDesign = decode_or_default(design)?;
        encode(&self.ring(&design))
    }
}

impl JewelEngine {
    fn context(&self) -> BuildContext<'_> {
        BuildContext::new(&self.kernel, &self.library).with_config(self.config)
    }

    fn bezel(&self, outline: &CurveInput, params: &BezelParams) -> BuildResult<BuildExport> {
        let ctx = self.context();
        let curve = outline.to_curve(ctx.tol())?;
        let build = components::build_bezel(&ctx, &curve, outline.plane.as_ref(), params)?;
        Ok(BuildExport::new([&build.solid], build.diagnostics))
    }

    fn gem_cutter(&self, outline: &CurveInput, params: &GemCutterParams) -> BuildResult<BuildExport> {
        let ctx = self.context();
        let curve = outline.to_curve(ctx.tol())?;
        let build = components::build_gem_cutter(&ctx, &curve, outline.plane.as_ref(), params)?;
        Ok(BuildExport {
            weight: Some(build.weight),
            ..BuildExport::new([&build.solid], build.diagnostics)
        })
    }

    fn head(&self, rail: &CurveInput, params: &HeadParams) -> BuildResult<BuildExport> {
        let ctx = self.context();
        let curve = rail.to_curve(ctx.tol())?;
        let build = components::build_head(&ctx, &curve, params)?;
        let solids = build.solids();
        Ok(BuildExport::new(solids, build.diagnostics.clone()))
    }

    fn ring(&self, design: &RingDesign) -> BuildResult<BuildExport> {
        let build = components::build_ring(&self.context(), design)?;
        Ok(BuildExport::new([&build.solid], build.diagnostics))
    }
}

fn decode<T: DeserializeOwned>(value: JsValue) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(to_js_error)
}

fn decode_or_default<T: DeserializeOwned + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_undefined() || value.is_null() {
        return Ok(T::default());
    }
    decode(value)
}

fn encode(result: &BuildResult<BuildExport>) -> Result<JsValue, JsValue> {
    match result {
        Ok(export) => serde_wasm_bindgen::to_value(export).map_err(to_js_error),
        Err(err) => Err(to_js_error(err)),
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}
