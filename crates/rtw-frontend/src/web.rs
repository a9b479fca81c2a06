//! Browser bindings
//!
//! Wires the controller to the page: number inputs, scene selector, scene
//! editor, render button, console textarea and canvas. The rendering
//! capability is the page's `rayTracer` module (`init()` and `draw(...)`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use rtw_core::{
    DiagnosticDisplay, DiagnosticSink, DrawSurface, ErrorChannel, FieldConstraints, FieldInput,
    ParamField, RenderRequest, SceneCatalog, SceneCatalogEntry,
};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    CanvasRenderingContext2d, Document, Event, HtmlButtonElement, HtmlCanvasElement,
    HtmlInputElement, HtmlOptionElement, HtmlSelectElement, HtmlTextAreaElement, Response,
};

use crate::capability::{CapabilityError, RenderingCapability};
use crate::config::AppConfig;
use crate::controller::{ControllerError, RenderController, SharedController};
use crate::fetch::{FetchError, SceneFetcher};
use crate::logging::init_logging;
use crate::panel::ControlPanel;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = rayTracer, js_name = init, catch)]
    fn ray_tracer_init() -> Result<js_sys::Promise, JsValue>;

    #[wasm_bindgen(js_namespace = rayTracer, js_name = draw, catch)]
    fn ray_tracer_draw(
        ctx: &CanvasRenderingContext2d,
        json: &str,
        width: u32,
        height: u32,
        num_samples: u32,
        max_bounces: u32,
    ) -> Result<(), JsValue>;
}

/// Readable text for a thrown JS value
fn js_error_text(value: &JsValue) -> String {
    if let Some(text) = value.as_string() {
        return text;
    }
    if let Some(error) = value.dyn_ref::<js_sys::Error>() {
        return String::from(error.message());
    }
    format!("{:?}", value)
}

/// Page element ids of the parameter fields
fn field_element_id(field: ParamField) -> &'static str {
    match field {
        ParamField::ImageWidth => "img-width",
        ParamField::ImageHeight => "img-height",
        ParamField::SamplesPerPixel => "samples-per-pixel",
        ParamField::MaxBounces => "max-bounces",
    }
}

fn element<T: JsCast>(document: &Document, id: &str) -> Result<T, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("Missing element #{}", id)))?
        .dyn_into::<T>()
        .map_err(|_| JsValue::from_str(&format!("Element #{} has an unexpected type", id)))
}

fn page_console() -> Result<JsValue, JsValue> {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("console"))
}

/// The page console: `console.error(...parts)`
///
/// Bound to the `console.error` present at construction, so reports keep
/// reaching the real console while a [`ConsoleCapture`] is installed.
pub struct ConsoleChannel {
    console: JsValue,
    error: js_sys::Function,
}

impl ConsoleChannel {
    pub fn new() -> Result<Self, JsValue> {
        let console = page_console()?;
        let error = js_sys::Reflect::get(&console, &JsValue::from_str("error"))?
            .dyn_into::<js_sys::Function>()?;
        Ok(Self { console, error })
    }
}

impl ErrorChannel for ConsoleChannel {
    fn error(&self, parts: &[String]) {
        let args = js_sys::Array::new();
        for part in parts {
            args.push(&JsValue::from_str(part));
        }
        if let Err(e) = self.error.apply(&self.console, &args) {
            tracing::warn!("console.error failed: {}", js_error_text(&e));
        }
    }
}

/// Buffers the page's `console.error` calls while installed
///
/// The ray tracer reports its own failures (panics included) through
/// `console.error`. The capture swaps in a buffering function for the
/// duration of one capability call; [`ConsoleCapture::finish`] restores the
/// original and replays the buffered reports into a channel. Dropping the
/// capture restores the original as well.
struct ConsoleCapture {
    console: JsValue,
    original: JsValue,
    captured: Rc<RefCell<Vec<Vec<String>>>>,
    _forward: Closure<dyn FnMut(js_sys::Array)>,
}

impl ConsoleCapture {
    fn install() -> Result<Self, JsValue> {
        let console = page_console()?;
        let original = js_sys::Reflect::get(&console, &JsValue::from_str("error"))?;

        let captured = Rc::new(RefCell::new(Vec::new()));
        let buffer = Rc::clone(&captured);
        let forward = Closure::<dyn FnMut(js_sys::Array)>::new(move |args: js_sys::Array| {
            buffer
                .borrow_mut()
                .push(args.iter().map(|arg| js_error_text(&arg)).collect());
        });

        let wrap = js_sys::Function::new_with_args(
            "forward",
            "return function(...parts) { forward(parts); };",
        );
        let replacement = wrap.call1(&JsValue::NULL, forward.as_ref())?;
        js_sys::Reflect::set(&console, &JsValue::from_str("error"), &replacement)?;

        Ok(Self {
            console,
            original,
            captured,
            _forward: forward,
        })
    }

    fn restore(&self) {
        if let Err(e) = js_sys::Reflect::set(&self.console, &JsValue::from_str("error"), &self.original) {
            tracing::error!("Failed to restore console.error: {}", js_error_text(&e));
        }
    }

    /// Restore `console.error` and replay the captured reports
    ///
    /// Returns the number of reports replayed.
    fn finish(self, channel: &dyn ErrorChannel) -> usize {
        self.restore();
        let captured = self.captured.take();
        for parts in &captured {
            channel.error(parts);
        }
        captured.len()
    }
}

impl Drop for ConsoleCapture {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Run `call` with `console.error` captured, then replay into `channel`
///
/// A thrown error is reported only when the call reported nothing itself;
/// after a panic the thrown value is just `unreachable`, and the panic
/// message has already been captured.
fn with_console_capture<T>(
    channel: &dyn ErrorChannel,
    call: impl FnOnce() -> Result<T, JsValue>,
) -> Option<T> {
    let capture = match ConsoleCapture::install() {
        Ok(capture) => Some(capture),
        Err(e) => {
            tracing::warn!("console.error capture unavailable: {}", js_error_text(&e));
            None
        }
    };

    let result = call();
    let replayed = capture.map_or(0, |capture| capture.finish(channel));

    match result {
        Ok(value) => Some(value),
        Err(e) => {
            if replayed == 0 {
                channel.error(&[js_error_text(&e)]);
            }
            None
        }
    }
}

/// Read-only console textarea
pub struct TextAreaDisplay {
    element: HtmlTextAreaElement,
}

impl TextAreaDisplay {
    pub fn new(element: HtmlTextAreaElement) -> Self {
        Self { element }
    }
}

impl DiagnosticDisplay for TextAreaDisplay {
    fn show(&self, text: &str) {
        self.element.set_value(text);
    }
}

/// `<canvas>` render target
pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas }
    }

    fn context_2d(&self) -> Result<CanvasRenderingContext2d, String> {
        self.canvas
            .get_context("2d")
            .map_err(|e| js_error_text(&e))?
            .ok_or_else(|| "Canvas has no 2d context".to_string())?
            .dyn_into::<CanvasRenderingContext2d>()
            .map_err(|_| "Canvas context is not 2d".to_string())
    }
}

impl DrawSurface for CanvasSurface {
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        // Assigning the size clears the canvas, even when it is unchanged
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }
}

/// Number inputs and the scene editor
pub struct DomControlPanel {
    inputs: HashMap<ParamField, HtmlInputElement>,
    scene: HtmlTextAreaElement,
}

impl DomControlPanel {
    pub fn from_document(document: &Document) -> Result<Self, JsValue> {
        let mut inputs = HashMap::new();
        for field in ParamField::ALL {
            inputs.insert(field, element(document, field_element_id(field))?);
        }
        Ok(Self {
            inputs,
            scene: element(document, "json")?,
        })
    }

    /// Let the browser show why a field was rejected
    pub fn report_validity(&self, field: ParamField) {
        if let Some(input) = self.inputs.get(&field) {
            input.report_validity();
        }
    }

    fn constraints(input: &HtmlInputElement) -> FieldConstraints {
        let bound = |text: String| text.trim().parse::<f64>().ok();
        let step = input.step();
        let step = match step.trim() {
            "" => Some(1.0),
            "any" => None,
            other => other.parse::<f64>().ok().filter(|s| *s > 0.0).or(Some(1.0)),
        };
        FieldConstraints {
            required: input.required(),
            min: bound(input.min()),
            max: bound(input.max()),
            step,
        }
    }
}

impl ControlPanel for DomControlPanel {
    fn field_input(&self, field: ParamField) -> FieldInput {
        match self.inputs.get(&field) {
            Some(input) => FieldInput::new(input.value(), Self::constraints(input)),
            None => FieldInput::new("", FieldConstraints::default()),
        }
    }

    fn scene_text(&self) -> String {
        self.scene.value()
    }

    fn set_scene_text(&mut self, text: &str) {
        self.scene.set_value(text);
    }
}

/// `window.fetch` as text
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserSceneFetcher;

impl SceneFetcher for BrowserSceneFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let network = |reason: String| FetchError::Network {
            url: url.to_string(),
            reason,
        };

        let window = web_sys::window().ok_or_else(|| network("No window object".into()))?;
        let response = JsFuture::from(window.fetch_with_str(url))
            .await
            .map_err(|e| network(js_error_text(&e)))?
            .dyn_into::<Response>()
            .map_err(|_| network("Unexpected fetch result".into()))?;

        if !response.ok() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let text = response.text().map_err(|e| network(js_error_text(&e)))?;
        JsFuture::from(text)
            .await
            .map_err(|e| network(js_error_text(&e)))?
            .as_string()
            .ok_or_else(|| network("Response body is not text".into()))
    }
}

/// The page's `rayTracer` module
#[derive(Debug, Default)]
pub struct WasmRayTracer;

impl RenderingCapability for WasmRayTracer {
    type Surface = CanvasSurface;

    fn name(&self) -> &str {
        "rayTracer"
    }

    async fn initialize(&mut self, channel: &dyn ErrorChannel) -> Result<(), CapabilityError> {
        let capture = ConsoleCapture::install()
            .inspect_err(|e| tracing::warn!("console.error capture unavailable: {}", js_error_text(e)))
            .ok();

        let result = match ray_tracer_init() {
            Ok(promise) => JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|e| CapabilityError::Initialization(js_error_text(&e))),
            Err(e) => Err(CapabilityError::NotAvailable(js_error_text(&e))),
        };

        if let Some(capture) = capture {
            capture.finish(channel);
        }
        result
    }

    fn draw(
        &mut self,
        surface: &mut CanvasSurface,
        request: &RenderRequest,
        channel: &dyn ErrorChannel,
    ) {
        let ctx = match surface.context_2d() {
            Ok(ctx) => ctx,
            Err(reason) => {
                channel.error(&[reason]);
                return;
            }
        };

        with_console_capture(channel, || {
            ray_tracer_draw(
                &ctx,
                &request.scene_text,
                request.width,
                request.height,
                request.samples_per_pixel,
                request.max_bounces,
            )
        });
    }
}

type PageController = SharedController<WasmRayTracer, BrowserSceneFetcher, DomControlPanel>;

fn scene_catalog(select: &HtmlSelectElement) -> SceneCatalog {
    (0..select.length())
        .filter_map(|i| select.item(i))
        .filter_map(|e| e.dyn_into::<HtmlOptionElement>().ok())
        .map(|option| SceneCatalogEntry::new(option.text(), option.value()))
        .collect()
}

fn install_render_button(button: &HtmlButtonElement, controller: PageController) -> Result<(), JsValue> {
    let on_click = Closure::<dyn FnMut() -> Result<(), JsValue>>::new(move || {
        match controller.trigger_render() {
            Ok(_) => Ok(()),
            Err(err) => {
                if let ControllerError::Validation(invalid) = &err {
                    controller.lock().panel().report_validity(invalid.field);
                }
                Err(js_sys::Error::new(&err.to_string()).into())
            }
        }
    });
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    Ok(())
}

fn install_scene_selector(select: &HtmlSelectElement, controller: PageController) -> Result<(), JsValue> {
    let on_change = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
        let Some(select) = event
            .target()
            .and_then(|t| t.dyn_into::<HtmlSelectElement>().ok())
        else {
            return;
        };
        let url = select.value();
        let controller = controller.clone();
        wasm_bindgen_futures::spawn_local(async move {
            // Failures have already reached the diagnostic sink
            if let Err(e) = controller.select_scene(&url).await {
                tracing::debug!("Scene selection of {} ended: {}", url, e);
            }
        });
    });
    select.add_event_listener_with_callback("change", on_change.as_ref().unchecked_ref())?;
    on_change.forget();
    Ok(())
}

/// Page entry point
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    let config = AppConfig::new();
    init_logging(&config.logging.filter);
    let window = web_sys::window().ok_or("No window object")?;
    let document = window.document().ok_or("No document object")?;

    let sink = DiagnosticSink::shared(
        ConsoleChannel::new()?,
        TextAreaDisplay::new(element(&document, "console")?),
    );
    let select: HtmlSelectElement = element(&document, "scene-json")?;
    let button: HtmlButtonElement = element(&document, "render")?;

    let controller = SharedController::new(
        RenderController::new(
            WasmRayTracer,
            BrowserSceneFetcher,
            DomControlPanel::from_document(&document)?,
            CanvasSurface::new(element(&document, "drawing")?),
            sink,
        )
        .with_catalog(scene_catalog(&select)),
    );

    install_render_button(&button, controller.clone())?;
    install_scene_selector(&select, controller.clone())?;

    let default_scene = config.scenes.default_scene;
    wasm_bindgen_futures::spawn_local(async move {
        if let Err(e) = controller.bootstrap(&default_scene).await {
            tracing::debug!("Bootstrap ended: {}", e);
        }
    });

    Ok(())
}
