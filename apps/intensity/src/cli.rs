//! # CLI Commands
//!
//! One function per subcommand. Each returns what it printed so the
//! integration tests can check results without scraping stdout.

use crate::error::CliError;
use crate::loader::{load_image, load_objects, parse_named_path};
use intensity_core::formats::{decode_settings, encode_settings, revision_of};
use intensity_core::settings::SETTINGS_REVISION;
use intensity_core::{
    ColumnKind, FeatureValue, ImageMeasurement, ImageSet, MeasureImageIntensity,
    MeasureImageIntensitySettings, MeasurementColumn, MeasurementStore, ModuleRegistry, ObjectSet,
    StatisticsRow, Workspace,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// =============================================================================
// SETTINGS FILES
// =============================================================================

/// Parse an `IMAGE` or `IMAGE:OBJECTS` entry.
pub fn parse_entry(spec: &str) -> Result<ImageMeasurement, CliError> {
    let entry = match spec.split_once(':') {
        Some((image, objects)) => ImageMeasurement::with_objects(image.trim(), objects.trim()),
        None => ImageMeasurement::image(spec.trim()),
    };
    if entry.image_name.is_empty() || (entry.wants_objects && entry.object_name.is_empty()) {
        return Err(CliError::InvalidArgument(format!(
            "expected IMAGE or IMAGE:OBJECTS, got {spec:?}"
        )));
    }
    Ok(entry)
}

/// Read a settings file, returning its stored revision and upgraded settings.
pub fn load_settings(path: &Path) -> Result<(u8, MeasureImageIntensitySettings), CliError> {
    let bytes = std::fs::read(path).map_err(|e| CliError::io(path, e))?;
    let revision = revision_of(&bytes)?;
    let settings = decode_settings(&bytes)?;
    Ok((revision, settings))
}

/// Write settings at the current revision.
pub fn save_settings(settings: &MeasureImageIntensitySettings, path: &Path) -> Result<(), CliError> {
    let bytes = encode_settings(settings)?;
    std::fs::write(path, bytes).map_err(|e| CliError::io(path, e))
}

// =============================================================================
// INIT / SHOW / UPGRADE
// =============================================================================

/// Create a settings file from `IMAGE[:OBJECTS]` entries.
pub fn cmd_init(path: &Path, entries: &[String], force: bool) -> Result<(), CliError> {
    if path.exists() && !force {
        return Err(CliError::AlreadyExists(path.to_path_buf()));
    }

    let images = entries
        .iter()
        .map(|spec| parse_entry(spec))
        .collect::<Result<Vec<_>, _>>()?;
    let settings = MeasureImageIntensitySettings::new(images);
    settings.validate()?;

    save_settings(&settings, path)?;
    tracing::info!(
        path = %path.display(),
        entries = settings.images.len(),
        "settings written"
    );
    println!("Initialized {} with {} measurement(s)", path.display(), settings.images.len());
    Ok(())
}

#[derive(Serialize)]
struct SettingsView<'a> {
    revision: u8,
    current_revision: u8,
    images: &'a [ImageMeasurement],
}

/// Print the settings, upgraded to the current revision.
pub fn cmd_show(path: &Path, json: bool) -> Result<MeasureImageIntensitySettings, CliError> {
    let (revision, settings) = load_settings(path)?;

    if json {
        let view = SettingsView {
            revision,
            current_revision: SETTINGS_REVISION,
            images: &settings.images,
        };
        println!("{}", serde_json::to_string_pretty(&view)?);
    } else {
        println!("Settings revision: {} (current {})", revision, SETTINGS_REVISION);
        for (index, entry) in settings.images.iter().enumerate() {
            match entry.object_name() {
                Some(objects) => println!("  [{}] {} within {}", index + 1, entry.image_name, objects),
                None => println!("  [{}] {}", index + 1, entry.image_name),
            }
        }
    }
    Ok(settings)
}

/// Rewrite a settings file at the current revision.
///
/// Returns the revision the file had before. Already-current files are left as is.
pub fn cmd_upgrade(path: &Path) -> Result<u8, CliError> {
    let (revision, settings) = load_settings(path)?;

    if revision == SETTINGS_REVISION {
        tracing::debug!(path = %path.display(), "settings already current");
        println!("{} is already at revision {}", path.display(), revision);
        return Ok(revision);
    }

    save_settings(&settings, path)?;
    tracing::info!(
        path = %path.display(),
        from = revision,
        to = SETTINGS_REVISION,
        "settings upgraded"
    );
    println!(
        "Upgraded {} from revision {} to {}",
        path.display(),
        revision,
        SETTINGS_REVISION
    );
    Ok(revision)
}

// =============================================================================
// COLUMNS
// =============================================================================

/// Print the columns the settings will produce.
pub fn cmd_columns(path: &Path, json: bool) -> Result<Vec<MeasurementColumn>, CliError> {
    let bytes = std::fs::read(path).map_err(|e| CliError::io(path, e))?;
    let module = ModuleRegistry::with_builtin().load(MeasureImageIntensity::MODULE_NAME, &bytes)?;
    let columns = module.measurement_columns();

    if json {
        println!("{}", serde_json::to_string_pretty(&columns)?);
    } else {
        for column in &columns {
            println!("{}\t{}\t{}", column.namespace, column.feature, column.kind);
        }
    }
    Ok(columns)
}

// =============================================================================
// MEASURE
// =============================================================================

/// Files to measure, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct MeasureInputs {
    /// `NAME=PATH` image files.
    pub images: Vec<String>,
    /// `NAME=PATH` mask files, keyed by image name.
    pub masks: Vec<String>,
    /// `NAME=PATH` label-map files.
    pub objects: Vec<String>,
}

#[derive(Serialize)]
struct MeasurementRecord<'a> {
    namespace: String,
    feature: &'a str,
    kind: ColumnKind,
    value: FeatureValue,
}

#[derive(Serialize)]
struct MeasureReport<'a> {
    module: &'static str,
    image_set: u32,
    measurements: Vec<MeasurementRecord<'a>>,
}

fn named_paths(specs: &[String]) -> Result<BTreeMap<String, PathBuf>, CliError> {
    let mut paths = BTreeMap::new();
    for spec in specs {
        let (name, path) = parse_named_path(spec)?;
        if paths.insert(name.clone(), path).is_some() {
            return Err(CliError::InvalidArgument(format!("{name} given twice")));
        }
    }
    Ok(paths)
}

fn load_sources(inputs: &MeasureInputs) -> Result<(ImageSet, ObjectSet), CliError> {
    let image_paths = named_paths(&inputs.images)?;
    let mut mask_paths = named_paths(&inputs.masks)?;

    let mut images = ImageSet::new();
    for (name, path) in image_paths {
        let mask = mask_paths.remove(&name);
        let image = load_image(&path, mask.as_deref())?;
        tracing::debug!(
            image = %name,
            path = %path.display(),
            masked = mask.is_some(),
            shape = ?image.dim(),
            "image loaded"
        );
        images.add(name, image);
    }
    if let Some(orphan) = mask_paths.keys().next() {
        return Err(CliError::InvalidArgument(format!(
            "mask given for {orphan}, which is not loaded"
        )));
    }

    let mut objects = ObjectSet::new();
    for (name, path) in named_paths(&inputs.objects)? {
        let labels = load_objects(&path)?;
        tracing::debug!(objects = %name, path = %path.display(), shape = ?labels.dim(), "objects loaded");
        objects.add(name, labels);
    }

    Ok((images, objects))
}

fn print_rows(rows: &[StatisticsRow]) {
    println!("{:<20} {:<20} {:<24} {:>12}", "Image", "Objects", "Measurement", "Value");
    for row in rows {
        println!(
            "{:<20} {:<20} {:<24} {:>12}",
            row.image_name,
            row.object_name,
            row.measurement,
            row.value.to_string()
        );
    }
}

/// Measure the loaded files with the given settings.
///
/// Prints a table (or JSON) and, when `output` is set, writes the JSON report
/// there as well. Returns the filled measurement store.
pub fn cmd_measure(
    settings_path: &Path,
    inputs: &MeasureInputs,
    json: bool,
    output: Option<&Path>,
) -> Result<MeasurementStore, CliError> {
    let bytes = std::fs::read(settings_path).map_err(|e| CliError::io(settings_path, e))?;
    let module = ModuleRegistry::with_builtin().load(MeasureImageIntensity::MODULE_NAME, &bytes)?;

    let (images, objects) = load_sources(inputs)?;
    tracing::info!(
        module = module.module_name(),
        images = images.len(),
        objects = objects.names().count(),
        "running"
    );

    let mut store = MeasurementStore::new();
    let rows = module.run(&mut Workspace::new(&images, &objects, &mut store))?;

    let columns = module.measurement_columns();
    let measurements: Vec<MeasurementRecord<'_>> = columns
        .iter()
        .filter_map(|column| {
            store
                .current_value(&column.namespace, &column.feature)
                .map(|value| MeasurementRecord {
                    namespace: column.namespace.to_string(),
                    feature: &column.feature,
                    kind: column.kind,
                    value,
                })
        })
        .collect();
    for record in &measurements {
        tracing::debug!(feature = record.feature, value = %record.value, "measured");
    }

    let report = MeasureReport {
        module: module.module_name(),
        image_set: store.image_set_number(),
        measurements,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_rows(&rows);
    }

    if let Some(output) = output {
        let text = serde_json::to_string_pretty(&report)?;
        std::fs::write(output, text).map_err(|e| CliError::io(output, e))?;
        tracing::info!(path = %output.display(), "report written");
    }

    Ok(store)
}

// =============================================================================
// TESTS
// =============================================================================
