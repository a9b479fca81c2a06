//! Render request controller
//!
//! Owns the rendering capability, the draw surface and the control panel,
//! and drives them through three operations:
//!
//! - **Bootstrap**: initialize the capability once, then load the default scene
//! - **Scene loading**: fetch a scene, pretty-print it into the scene editor,
//!   then render it
//! - **Render trigger**: validate parameters, resize the surface, call `draw`
//!
//! Phases: `Uninitialized -> Initializing -> Ready | Failed`. Scene loading
//! and rendering are rejected outside `Ready`, so `draw` can never run before
//! initialization has finished.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::{Mutex, MutexGuard};
use rtw_core::{
    DiagnosticSink, DrawSurface, RenderRequest, SceneCatalog, SceneError, ValidationError,
    format_scene, validate,
};

use crate::capability::{CapabilityError, RenderingCapability};
use crate::fetch::{FetchError, SceneFetcher};
use crate::panel::ControlPanel;

/// Controller lifecycle phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerPhase {
    Uninitialized,
    Initializing,
    Ready,
    /// Initialization failed; terminal
    Failed,
}

/// Scene could not be acquired
#[derive(Debug, Clone, thiserror::Error)]
pub enum AcquisitionError {
    #[error("Failed to fetch scene: {0}")]
    Fetch(#[from] FetchError),

    #[error("Failed to load scene {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: SceneError,
    },
}

/// Errors returned by controller operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum ControllerError {
    #[error("Controller is not ready (phase: {0:?})")]
    NotReady(ControllerPhase),

    #[error("Controller has already been bootstrapped")]
    AlreadyBootstrapped,

    #[error("A render is already in progress")]
    Busy,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),

    #[error(transparent)]
    Capability(#[from] CapabilityError),

    #[error("Loading {url} was superseded by a newer scene selection")]
    Superseded { url: String },
}

impl ControllerError {
    /// Whether the user still has to be told about this error
    ///
    /// Acquisition and capability failures are reported to the diagnostic
    /// sink where they happen. A superseded load is not a failure.
    pub fn needs_report(&self) -> bool {
        !matches!(
            self,
            ControllerError::Acquisition(_)
                | ControllerError::Capability(_)
                | ControllerError::Superseded { .. }
        )
    }
}

/// A scene load that has been started but not finished
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLoad {
    /// URL being fetched
    pub url: String,
    generation: u64,
}

/// The render request controller
pub struct RenderController<C: RenderingCapability, F, P> {
    capability: C,
    fetcher: F,
    panel: P,
    surface: C::Surface,
    sink: Arc<DiagnosticSink>,
    catalog: SceneCatalog,
    phase: ControllerPhase,
    /// Bumped by every scene selection; older loads are discarded
    load_generation: u64,
    renders_issued: u64,
}

impl<C, F, P> RenderController<C, F, P>
where
    C: RenderingCapability,
    F: SceneFetcher,
    P: ControlPanel,
{
    pub fn new(
        capability: C,
        fetcher: F,
        panel: P,
        surface: C::Surface,
        sink: Arc<DiagnosticSink>,
    ) -> Self {
        Self {
            capability,
            fetcher,
            panel,
            surface,
            sink,
            catalog: SceneCatalog::default(),
            phase: ControllerPhase::Uninitialized,
            load_generation: 0,
            renders_issued: 0,
        }
    }

    /// Scenes that can be selected by label
    pub fn with_catalog(mut self, catalog: SceneCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn phase(&self) -> ControllerPhase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == ControllerPhase::Ready
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut P {
        &mut self.panel
    }

    pub fn surface(&self) -> &C::Surface {
        &self.surface
    }

    pub fn sink(&self) -> &Arc<DiagnosticSink> {
        &self.sink
    }

    pub fn catalog(&self) -> &SceneCatalog {
        &self.catalog
    }

    /// Number of `draw` calls issued so far
    pub fn renders_issued(&self) -> u64 {
        self.renders_issued
    }

    fn set_phase(&mut self, phase: ControllerPhase) {
        tracing::debug!("Controller phase: {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }

    fn ensure_ready(&self) -> Result<(), ControllerError> {
        if self.is_ready() {
            Ok(())
        } else {
            Err(ControllerError::NotReady(self.phase))
        }
    }

    /// Initialize the rendering capability
    ///
    /// Runs at most once. A failure is reported to the diagnostic sink and
    /// leaves the controller in [`ControllerPhase::Failed`].
    pub async fn initialize(&mut self) -> Result<(), ControllerError> {
        if self.phase != ControllerPhase::Uninitialized {
            return Err(ControllerError::AlreadyBootstrapped);
        }
        self.set_phase(ControllerPhase::Initializing);

        let sink = Arc::clone(&self.sink);
        match self.capability.initialize(sink.as_ref()).await {
            Ok(()) => {
                tracing::info!("Rendering capability '{}' initialized", self.capability.name());
                self.set_phase(ControllerPhase::Ready);
                Ok(())
            }
            Err(err) => {
                self.set_phase(ControllerPhase::Failed);
                self.sink.report(err.to_string());
                Err(err.into())
            }
        }
    }

    /// Initialize, then load `default_scene`, which fires the first render
    pub async fn bootstrap(&mut self, default_scene: &str) -> Result<RenderRequest, ControllerError> {
        self.initialize().await?;
        self.select_scene(default_scene).await
    }

    /// Load a scene by label or URL and render it
    pub async fn select_scene(&mut self, source: &str) -> Result<RenderRequest, ControllerError> {
        let pending = self.begin_scene_load(source)?;
        let fetched = self.fetcher.fetch(&pending.url).await;
        self.finish_scene_load(pending, fetched)
    }

    /// Start a scene load
    ///
    /// Any load started earlier and not yet finished is superseded.
    pub fn begin_scene_load(&mut self, source: &str) -> Result<PendingLoad, ControllerError> {
        self.ensure_ready()?;
        self.load_generation += 1;
        let url = self.catalog.resolve(source).to_string();
        tracing::debug!("Loading scene {} (load #{})", url, self.load_generation);
        Ok(PendingLoad {
            url,
            generation: self.load_generation,
        })
    }

    /// Finish a scene load with the fetched body, then render
    ///
    /// On a fetch or parse failure the problem is reported to the diagnostic
    /// sink, the scene text is left untouched and nothing is rendered.
    pub fn finish_scene_load(
        &mut self,
        pending: PendingLoad,
        fetched: Result<String, FetchError>,
    ) -> Result<RenderRequest, ControllerError> {
        self.ensure_ready()?;
        if pending.generation != self.load_generation {
            tracing::debug!("Discarding superseded load of {}", pending.url);
            return Err(ControllerError::Superseded { url: pending.url });
        }

        let scene_text = fetched
            .map_err(AcquisitionError::from)
            .and_then(|body| {
                format_scene(&body).map_err(|source| AcquisitionError::Parse {
                    url: pending.url.clone(),
                    source,
                })
            });

        let scene_text = match scene_text {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!("{}", err);
                self.sink.report(err.to_string());
                return Err(err.into());
            }
        };

        self.panel.set_scene_text(&scene_text);
        tracing::info!("Loaded scene {}", pending.url);

        self.trigger_render()
    }

    /// Validate the parameters and render the current scene text
    ///
    /// Nothing is touched when validation fails. Errors raised by the
    /// capability while drawing only reach the diagnostic sink.
    pub fn trigger_render(&mut self) -> Result<RenderRequest, ControllerError> {
        self.ensure_ready()?;

        let panel = &self.panel;
        let params = validate(|field| panel.field_input(field))?;

        self.surface.resize(params.width, params.height);
        let request = RenderRequest::new(self.panel.scene_text(), params);

        tracing::info!("Rendering {}", request);
        self.capability
            .draw(&mut self.surface, &request, self.sink.as_ref());
        self.renders_issued += 1;

        Ok(request)
    }
}

/// A controller shared between event handlers
///
/// Event handlers never hold the lock across a scene fetch. A trigger that
/// arrives while the controller is locked is rejected instead of queued:
/// with [`ControllerError::NotReady`] while initialization runs, otherwise
/// with [`ControllerError::Busy`].
///
/// Scene selection and bootstrap run detached from any caller, so their
/// failures are reported to the diagnostic sink unless the controller
/// already did so.
pub struct SharedController<C: RenderingCapability, F, P> {
    inner: Arc<Mutex<RenderController<C, F, P>>>,
    sink: Arc<DiagnosticSink>,
    initializing: Arc<AtomicBool>,
}

impl<C: RenderingCapability, F, P> Clone for SharedController<C, F, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            sink: Arc::clone(&self.sink),
            initializing: Arc::clone(&self.initializing),
        }
    }
}

impl<C, F, P> SharedController<C, F, P>
where
    C: RenderingCapability,
    F: SceneFetcher + Clone,
    P: ControlPanel,
{
    pub fn new(controller: RenderController<C, F, P>) -> Self {
        Self {
            sink: Arc::clone(controller.sink()),
            inner: Arc::new(Mutex::new(controller)),
            initializing: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Lock the controller, waiting if needed
    pub fn lock(&self) -> MutexGuard<'_, RenderController<C, F, P>> {
        self.inner.lock()
    }

    /// Lock the controller without waiting
    pub fn try_lock(&self) -> Result<MutexGuard<'_, RenderController<C, F, P>>, ControllerError> {
        self.inner.try_lock().ok_or_else(|| {
            if self.initializing.load(Ordering::Acquire) {
                ControllerError::NotReady(ControllerPhase::Initializing)
            } else {
                ControllerError::Busy
            }
        })
    }

    fn report(&self, err: ControllerError) -> ControllerError {
        if err.needs_report() {
            tracing::warn!("{}", err);
            self.sink.report(err.to_string());
        }
        err
    }

    /// Initialize, then load the default scene
    pub async fn bootstrap(&self, default_scene: &str) -> Result<RenderRequest, ControllerError> {
        let initialized = match self.try_lock() {
            Ok(mut controller) => {
                self.initializing.store(true, Ordering::Release);
                let result = controller.initialize().await;
                self.initializing.store(false, Ordering::Release);
                result
            }
            Err(err) => Err(err),
        };
        initialized.map_err(|err| self.report(err))?;
        self.select_scene(default_scene).await
    }

    /// Load a scene without holding the lock during the fetch
    pub async fn select_scene(&self, source: &str) -> Result<RenderRequest, ControllerError> {
        self.load_scene(source).await.map_err(|err| self.report(err))
    }

    async fn load_scene(&self, source: &str) -> Result<RenderRequest, ControllerError> {
        let (pending, fetcher) = {
            let mut controller = self.try_lock()?;
            let pending = controller.begin_scene_load(source)?;
            (pending, controller.fetcher().clone())
        };

        let fetched = fetcher.fetch(&pending.url).await;
        self.try_lock()?.finish_scene_load(pending, fetched)
    }

    /// Render the current scene text
    pub fn trigger_render(&self) -> Result<RenderRequest, ControllerError> {
        self.try_lock()?.trigger_render()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use rtw_core::{MemoryChannel, ParamField, PixelSurface, TextDisplay};

    use super::*;
    use crate::capability::DryRunCapability;
    use crate::config::RenderConfig;
    use crate::panel::FormState;

    #[derive(Clone, Default)]
    struct MapFetcher {
        bodies: HashMap<String, String>,
    }

    impl MapFetcher {
        fn with(mut self, url: &str, body: &str) -> Self {
            self.bodies.insert(url.to_string(), body.to_string());
            self
        }
    }

    impl SceneFetcher for MapFetcher {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            self.bodies.get(url).cloned().ok_or_else(|| FetchError::Status {
                url: url.to_string(),
                status: 404,
            })
        }
    }

    type TestController = RenderController<DryRunCapability, MapFetcher, FormState>;

    fn controller(fetcher: MapFetcher) -> TestController {
        RenderController::new(
            DryRunCapability::new(),
            fetcher,
            FormState::from_config(&RenderConfig::default()),
            PixelSurface::default(),
            DiagnosticSink::shared(MemoryChannel::new(), TextDisplay::new()),
        )
    }

    #[test]
    fn test_operations_rejected_before_ready() {
        let mut controller = controller(MapFetcher::default());

        assert!(matches!(
            controller.trigger_render(),
            Err(ControllerError::NotReady(ControllerPhase::Uninitialized))
        ));
        assert!(matches!(
            controller.begin_scene_load("scenes/a.json"),
            Err(ControllerError::NotReady(_))
        ));
        assert_eq!(controller.capability().draws(), 0);
    }

    #[test]
    fn test_bootstrap_runs_once() {
        let fetcher = MapFetcher::default().with("scenes/a.json", "{}");
        let mut controller = controller(fetcher);

        pollster::block_on(controller.bootstrap("scenes/a.json")).unwrap();
        assert_eq!(controller.phase(), ControllerPhase::Ready);
        assert_eq!(controller.capability().draws(), 1);

        let again = pollster::block_on(controller.bootstrap("scenes/a.json"));
        assert!(matches!(again, Err(ControllerError::AlreadyBootstrapped)));
        assert_eq!(controller.capability().draws(), 1);
    }

    #[test]
    fn test_superseded_load_is_discarded() {
        let mut controller = controller(MapFetcher::default());
        pollster::block_on(controller.initialize()).unwrap();

        let first = controller.begin_scene_load("scenes/first.json").unwrap();
        let second = controller.begin_scene_load("scenes/second.json").unwrap();

        let stale = controller.finish_scene_load(first, Ok(r#"{"first":true}"#.into()));
        assert!(matches!(stale, Err(ControllerError::Superseded { .. })));
        assert!(controller.panel().scene_text().is_empty());

        controller
            .finish_scene_load(second, Ok(r#"{"second":true}"#.into()))
            .unwrap();
        assert_eq!(controller.panel().scene_text(), "{\n\t\"second\": true\n}");
        assert_eq!(controller.renders_issued(), 1);
    }

    #[test]
    fn test_select_by_label() {
        let fetcher = MapFetcher::default().with("scenes/materials.json", "[]");
        let mut controller = controller(fetcher).with_catalog(SceneCatalog::new(vec![
            rtw_core::SceneCatalogEntry::new("Materials", "scenes/materials.json"),
        ]));
        pollster::block_on(controller.initialize()).unwrap();

        pollster::block_on(controller.select_scene("Materials")).unwrap();
        assert_eq!(controller.panel().scene_text(), "[]");
    }

    #[test]
    fn test_shared_controller_busy_while_locked() {
        let fetcher = MapFetcher::default().with("scenes/a.json", "{}");
        let shared = SharedController::new(controller(fetcher));
        pollster::block_on(shared.bootstrap("scenes/a.json")).unwrap();

        {
            let _guard = shared.lock();
            assert!(matches!(shared.trigger_render(), Err(ControllerError::Busy)));
        }

        shared.trigger_render().unwrap();
        assert_eq!(shared.lock().renders_issued(), 2);
    }

    #[test]
    fn test_render_failure_keeps_ready() {
        let mut controller = controller(MapFetcher::default());
        pollster::block_on(controller.initialize()).unwrap();

        controller.panel_mut().set_scene_text("{ broken");
        controller.panel_mut().set_field(ParamField::ImageWidth, "8");
        controller.trigger_render().unwrap();

        assert_eq!(controller.sink().log().len(), 1);
        assert!(controller.is_ready());
        assert_eq!(controller.surface().size(), (8, 300));
    }
}
