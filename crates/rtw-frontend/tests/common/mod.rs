//! Test doubles shared by the integration tests

#![allow(dead_code)]

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use rtw_core::{
    DiagnosticSink, DrawSurface, ErrorChannel, MemoryChannel, PixelSurface, RenderRequest,
    SharedSink, TextDisplay,
};
use rtw_frontend::{
    CapabilityError, FetchError, FormState, RenderController, RenderingCapability, SceneFetcher,
    config::RenderConfig,
};

/// Records initialization, every request and the surface size it saw
#[derive(Default)]
pub struct RecordingCapability {
    fail_init: Option<String>,
    init_reports: Vec<Vec<String>>,
    suspend_init: bool,
    reports: Vec<Vec<String>>,
    requests: Vec<RenderRequest>,
    surface_sizes: Vec<(u32, u32)>,
    events: Arc<Mutex<Vec<&'static str>>>,
}

impl RecordingCapability {
    pub fn new() -> Self {
        Self::default()
    }

    /// `initialize` fails with `reason`
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_init: Some(reason.to_string()),
            ..Self::default()
        }
    }

    /// Report `parts` through the channel while initializing
    pub fn reporting_on_init(mut self, parts: &[&str]) -> Self {
        self.init_reports
            .push(parts.iter().map(|p| p.to_string()).collect());
        self
    }

    /// `initialize` is pending once before it completes
    pub fn suspending_init(mut self) -> Self {
        self.suspend_init = true;
        self
    }

    /// Report `parts` through the channel on every draw
    pub fn reporting(mut self, parts: &[&str]) -> Self {
        self.reports
            .push(parts.iter().map(|p| p.to_string()).collect());
        self
    }

    pub fn requests(&self) -> &[RenderRequest] {
        &self.requests
    }

    pub fn surface_sizes(&self) -> &[(u32, u32)] {
        &self.surface_sizes
    }

    /// "initialize" and "draw", in call order
    pub fn events(&self) -> Vec<&'static str> {
        self.events.lock().clone()
    }
}

impl RenderingCapability for RecordingCapability {
    type Surface = PixelSurface;

    fn name(&self) -> &str {
        "recording"
    }

    async fn initialize(&mut self, channel: &dyn ErrorChannel) -> Result<(), CapabilityError> {
        self.events.lock().push("initialize");
        if self.suspend_init {
            YieldOnce(false).await;
        }
        for parts in &self.init_reports {
            channel.error(parts);
        }
        match &self.fail_init {
            Some(reason) => Err(CapabilityError::Initialization(reason.clone())),
            None => Ok(()),
        }
    }

    fn draw(
        &mut self,
        surface: &mut PixelSurface,
        request: &RenderRequest,
        channel: &dyn ErrorChannel,
    ) {
        self.events.lock().push("draw");
        self.requests.push(request.clone());
        self.surface_sizes.push(surface.size());

        let filled = vec![0xff; surface.as_rgba().len()];
        if let Err(e) = surface.put_rgba(&filled) {
            channel.error(&[e.to_string()]);
        }

        for parts in &self.reports {
            channel.error(parts);
        }
    }
}

/// Pending on the first poll, ready on the second
struct YieldOnce(bool);

impl Future for YieldOnce {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        if self.0 {
            Poll::Ready(())
        } else {
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }
}

/// In-memory url -> body map; unknown urls are a 404
#[derive(Clone, Default)]
pub struct MapFetcher {
    bodies: HashMap<String, String>,
}

impl MapFetcher {
    pub fn with(mut self, url: &str, body: &str) -> Self {
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

/// The pieces of a sink the tests look at
pub struct Diagnostics {
    pub sink: SharedSink,
    pub channel: Arc<MemoryChannel>,
    pub display: Arc<TextDisplay>,
}

impl Diagnostics {
    pub fn new() -> Self {
        let channel = Arc::new(MemoryChannel::new());
        let display = Arc::new(TextDisplay::new());
        let sink = DiagnosticSink::shared(channel.clone(), display.clone());
        Self {
            sink,
            channel,
            display,
        }
    }
}

pub type TestController = RenderController<RecordingCapability, MapFetcher, FormState>;

/// Controller with default fields (400/300/10/5) and a 300x150 surface
pub fn controller(capability: RecordingCapability, fetcher: MapFetcher) -> (TestController, Diagnostics) {
    let diagnostics = Diagnostics::new();
    let controller = RenderController::new(
        capability,
        fetcher,
        FormState::from_config(&RenderConfig::default()),
        PixelSurface::default(),
        diagnostics.sink.clone(),
    );
    (controller, diagnostics)
}

/// Controller that has finished initialization
pub fn ready_controller(fetcher: MapFetcher) -> (TestController, Diagnostics) {
    let (mut controller, diagnostics) = controller(RecordingCapability::new(), fetcher);
    pollster::block_on(controller.initialize()).expect("initialize");
    (controller, diagnostics)
}
