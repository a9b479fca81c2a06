//! RTW dry-run driver
//!
//! Runs the render request controller outside the browser: loads a scene,
//! validates the parameters and logs the request a real renderer would get.

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    native::run()
}

// The browser entry point is `rtw_frontend::web::start`
#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::path::PathBuf;
    use std::process::ExitCode;

    use clap::Parser;
    use rtw_core::{DiagnosticSink, ParamField, PixelSurface, TextDisplay, TracingChannel};
    use rtw_frontend::{
        ConfigManager, DryRunCapability, FormState, NativeSceneFetcher, RenderController,
        init_logging,
    };

    #[derive(Debug, Parser)]
    #[command(name = "rtw")]
    #[command(about = "Check ray tracer scenes and render parameters")]
    struct Cli {
        /// Configuration file (RON)
        #[arg(long = "config")]
        config: Option<PathBuf>,
        /// Write the effective configuration to its path and exit
        #[arg(long = "init-config")]
        init_config: bool,
        /// Print the scene catalog and exit
        #[arg(long = "list-scenes")]
        list_scenes: bool,
        /// Scene label or URL to load
        #[arg(long = "scene")]
        scene: Option<String>,
        /// Image width
        #[arg(long = "width")]
        width: Option<String>,
        /// Image height
        #[arg(long = "height")]
        height: Option<String>,
        /// Samples per pixel
        #[arg(long = "samples")]
        samples: Option<String>,
        /// Max reflection bounces
        #[arg(long = "bounces")]
        bounces: Option<String>,
    }

    impl Cli {
        fn field_overrides(&self) -> [(ParamField, Option<&String>); 4] {
            [
                (ParamField::ImageWidth, self.width.as_ref()),
                (ParamField::ImageHeight, self.height.as_ref()),
                (ParamField::SamplesPerPixel, self.samples.as_ref()),
                (ParamField::MaxBounces, self.bounces.as_ref()),
            ]
        }
    }

    pub fn run() -> ExitCode {
        let cli = Cli::parse();

        let mut manager = match &cli.config {
            Some(path) if cli.init_config => ConfigManager::with_defaults(path),
            Some(path) => match ConfigManager::open(path) {
                Ok(manager) => manager,
                Err(e) => {
                    eprintln!("Failed to load {}: {}", path.display(), e);
                    return ExitCode::FAILURE;
                }
            },
            None if cli.init_config => ConfigManager::with_defaults(ConfigManager::default_path()),
            None => ConfigManager::new(),
        };

        init_logging(&manager.config().logging.filter);
        tracing::info!("Starting RTW dry run");

        if cli.init_config {
            return match manager.save() {
                Ok(()) => {
                    println!("{}", manager.config_file_path().display());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Failed to write config: {}", e);
                    ExitCode::FAILURE
                }
            };
        }

        let config = manager.config();
        let catalog = config.scenes.catalog();

        if cli.list_scenes {
            for entry in catalog.entries() {
                println!("{}\t{}", entry.label, entry.url);
            }
            return ExitCode::SUCCESS;
        }

        let mut form = FormState::from_config(&config.render);
        for (field, value) in cli.field_overrides() {
            if let Some(value) = value {
                form.set_field(field, value.as_str());
            }
        }

        let sink = DiagnosticSink::shared(TracingChannel, TextDisplay::new());
        let mut controller = RenderController::new(
            DryRunCapability::new(),
            NativeSceneFetcher::new(&config.scenes.base_dir),
            form,
            PixelSurface::default(),
            sink.clone(),
        )
        .with_catalog(catalog);

        let scene = cli
            .scene
            .clone()
            .unwrap_or_else(|| config.scenes.default_scene.clone());

        match pollster::block_on(controller.bootstrap(&scene)) {
            Ok(request) if sink.log().is_empty() => {
                println!("{}", request);
                ExitCode::SUCCESS
            }
            Ok(request) => {
                println!("{}", request);
                eprintln!("{}", sink.log().joined());
                ExitCode::FAILURE
            }
            Err(e) => {
                eprintln!("{}", e);
                ExitCode::FAILURE
            }
        }
    }
}
