//! Loadout demo host.
//!
//! Loads a product manifest and a glTF scene, optionally restores a saved
//! configuration, runs the material pass and prints the order summary.
//!
//! ```text
//! loadout <manifest.json> <scene.gltf|glb> [state.json] [settings.json]
//! ```

use loadout::config::serialization::{load_state_from_file, SerializationError};
use loadout::config::settings::SettingsError;
use loadout::scene::SceneImportError;
use loadout::{
    load_manifest_from_file, load_scene_from_gltf, Configurator, EngineSettings, ImageFileLoader,
    ManifestError,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::{Duration, Instant};

const TEXTURE_WAIT: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
enum DemoError {
    #[error("usage: loadout <manifest.json> <scene.gltf|glb> [state.json] [settings.json]")]
    Usage,
    #[error(transparent)]
    Manifest(#[from] ManifestError),
    #[error(transparent)]
    Scene(#[from] SceneImportError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("failed to load configuration: {0}")]
    State(#[from] SerializationError),
    #[error("failed to encode summary: {0}")]
    Summary(#[from] serde_json::Error),
}

struct Args {
    manifest: PathBuf,
    scene: PathBuf,
    state: Option<PathBuf>,
    settings: Option<PathBuf>,
}

impl Args {
    fn parse() -> Result<Self, DemoError> {
        let mut args = std::env::args_os().skip(1).map(PathBuf::from);
        let manifest = args.next().ok_or(DemoError::Usage)?;
        let scene = args.next().ok_or(DemoError::Usage)?;
        Ok(Self {
            manifest,
            scene,
            state: args.next(),
            settings: args.next(),
        })
    }
}

fn run() -> Result<(), DemoError> {
    let args = Args::parse()?;

    let settings = match &args.settings {
        Some(path) => EngineSettings::load_from_file(path)?,
        None => EngineSettings::default(),
    };
    let manifest = load_manifest_from_file(&args.manifest)?;
    let mut scene = load_scene_from_gltf(&args.scene)?;

    let loader = ImageFileLoader::new(settings.texture_root.clone());
    let mut configurator = Configurator::new(manifest, &settings, Box::new(loader));
    if let Some(path) = &args.state {
        configurator.restore_state(load_state_from_file(path)?);
        log::info!("Configuration restored from {:?}", path);
    }

    let report = configurator.apply(&mut scene);
    if !report.failures.is_empty() {
        log::warn!("{} meshes fell back to the neutral finish", report.failures.len());
    }

    let deadline = Instant::now() + TEXTURE_WAIT;
    while configurator.applicator().factory().textures().pending_loads() > 0
        && Instant::now() < deadline
    {
        std::thread::sleep(Duration::from_millis(20));
        configurator.frame(&mut scene);
    }

    for node in scene.meshes() {
        let part = node.part().unwrap_or("-");
        match node.material() {
            Some(material) => match &material.map {
                Some(texture) => log::info!(
                    "{:<40} {:<10} {:?} texture {} repeat {:?}",
                    node.name(),
                    part,
                    material.kind,
                    texture.url(),
                    texture.repeat()
                ),
                None => log::info!(
                    "{:<40} {:<10} {:?} color {:?}",
                    node.name(),
                    part,
                    material.kind,
                    material.base_color.to_array()
                ),
            },
            None => log::info!("{:<40} {:<10} untouched", node.name(), part),
        }
    }

    println!("{}", configurator.summary().to_json()?);
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
