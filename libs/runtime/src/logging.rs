//! Logging bootstrap for the ReviewHub binaries.
//!
//! The `logging` config map has a `default` section plus optional sections
//! keyed by crate name (`fwkit`, `product_reviews`, ...). Each section sets a
//! console level and an optional rotating JSON log file. Crates with their own
//! section are excluded from `default`.

use crate::config::{LoggingConfig, Section};
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    ContentLimit, FileRotate,
};
use parking_lot::Mutex;
use std::{
    io::{IsTerminal, Write},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{level_filters::LevelFilter, Level, Metadata};
use tracing_subscriber::{
    filter::{EnvFilter, FilterFn, Targets},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    Layer, Registry,
};

const DEFAULT_SECTION: &str = "default";
const DEFAULT_MAX_SIZE_MB: u64 = 20;
const DEFAULT_MAX_BACKUPS: usize = 3;

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync + 'static>;

/// `None` disables the sink; unknown names fall back to INFO.
fn parse_level(s: &str) -> Option<Level> {
    match s.to_ascii_lowercase().as_str() {
        "trace" => Some(Level::TRACE),
        "debug" => Some(Level::DEBUG),
        "info" => Some(Level::INFO),
        "warn" => Some(Level::WARN),
        "error" => Some(Level::ERROR),
        "off" | "none" => None,
        _ => Some(Level::INFO),
    }
}

/// `target` is `prefix` itself or one of its modules.
fn is_under(target: &str, prefix: &str) -> bool {
    target
        .strip_prefix(prefix)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with("::"))
}

// -------- rotating files --------

/// Rotating log file shared by every writer handle routed to it.
#[derive(Clone)]
struct SharedFile(Arc<Mutex<FileRotate<AppendTimestamp>>>);

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.0.lock().flush()
    }
}

/// Writer handed to `fmt`; records with no file are discarded.
struct FileSink(Option<SharedFile>);

impl Write for FileSink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        match &mut self.0 {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> std::io::Result<()> {
        match &mut self.0 {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

/// Picks the log file for a record by its target.
#[derive(Clone, Default)]
struct FileRoutes {
    fallback: Option<SharedFile>,
    by_crate: Vec<(String, SharedFile)>,
}

impl FileRoutes {
    fn route(&self, target: &str) -> Option<SharedFile> {
        self.by_crate
            .iter()
            .find(|(name, _)| is_under(target, name))
            .map(|(_, file)| file.clone())
            .or_else(|| self.fallback.clone())
    }

    fn is_empty(&self) -> bool {
        self.fallback.is_none() && self.by_crate.is_empty()
    }
}

impl<'a> fmt::MakeWriter<'a> for FileRoutes {
    type Writer = FileSink;

    fn make_writer(&'a self) -> Self::Writer {
        FileSink(self.fallback.clone())
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> Self::Writer {
        FileSink(self.route(meta.target()))
    }
}

/// Absolute paths are kept; relative ones are placed under `base_dir`.
fn resolve_log_path(file: &str, base_dir: &Path) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn open_rotating(path: &Path, max_bytes: usize, max_files: usize) -> std::io::Result<SharedFile> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let rot = FileRotate::new(
        path,
        AppendTimestamp::default(FileLimit::MaxFiles(max_files)),
        ContentLimit::BytesSurpassed(max_bytes),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    Ok(SharedFile(Arc::new(Mutex::new(rot))))
}

/// Logging is not up yet, so failures go straight to stderr.
fn open_section_file(name: &str, section: &Section, base_dir: &Path) -> Option<SharedFile> {
    if section.file.trim().is_empty() {
        return None;
    }
    let max_bytes = section.max_size_mb.unwrap_or(DEFAULT_MAX_SIZE_MB) * 1024 * 1024;
    let max_files = section.max_backups.unwrap_or(DEFAULT_MAX_BACKUPS);
    let path = resolve_log_path(&section.file, base_dir);
    match open_rotating(&path, max_bytes as usize, max_files) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to open log file for '{name}': {} ({e})", path.display());
            None
        }
    }
}

// -------- sections --------

struct Sections<'a> {
    default: Option<&'a Section>,
    by_crate: Vec<(&'a str, &'a Section)>,
}

impl<'a> Sections<'a> {
    fn from_config(cfg: &'a LoggingConfig) -> Self {
        let mut by_crate: Vec<_> = cfg
            .iter()
            .filter(|(name, _)| name.as_str() != DEFAULT_SECTION)
            .map(|(name, section)| (name.as_str(), section))
            .collect();
        // Longest prefix first so nested crates win the file routing.
        by_crate.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then(a.0.cmp(b.0)));
        Self {
            default: cfg.get(DEFAULT_SECTION),
            by_crate,
        }
    }

    fn crate_names(&self) -> Vec<String> {
        self.by_crate.iter().map(|(name, _)| name.to_string()).collect()
    }

    /// Per-crate targets for the sections that enable this sink.
    fn targets(&self, level_of: impl Fn(&Section) -> Option<&str>) -> Targets {
        self.by_crate
            .iter()
            .filter_map(|&(name, section)| {
                let level = level_of(section).and_then(parse_level)?;
                Some((name.to_string(), LevelFilter::from_level(level)))
            })
            .fold(Targets::new().with_default(LevelFilter::OFF), |t, (name, level)| {
                t.with_target(name, level)
            })
    }

    fn file_routes(&self, base_dir: &Path) -> FileRoutes {
        FileRoutes {
            fallback: self
                .default
                .and_then(|s| open_section_file(DEFAULT_SECTION, s, base_dir)),
            by_crate: self
                .by_crate
                .iter()
                .filter_map(|&(name, section)| {
                    open_section_file(name, section, base_dir).map(|f| (name.to_string(), f))
                })
                .collect(),
        }
    }
}

/// Records up to `max_level` from crates without a section of their own.
fn unclaimed(crate_names: Vec<String>, max_level: Level) -> FilterFn<impl Fn(&Metadata<'_>) -> bool> {
    FilterFn::new(move |meta: &Metadata<'_>| {
        meta.level() <= &max_level && !crate_names.iter().any(|c| is_under(meta.target(), c))
    })
}

fn console_layer<F>(filter: F) -> BoxedLayer
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(true)
        .with_writer(std::io::stderr)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_filter(filter)
        .boxed()
}

fn json_file_layer<F>(routes: FileRoutes, filter: F) -> BoxedLayer
where
    F: tracing_subscriber::layer::Filter<Registry> + Send + Sync + 'static,
{
    fmt::layer()
        .json()
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::UtcTime::rfc_3339())
        .with_writer(routes)
        .with_filter(filter)
        .boxed()
}

// -------- public init --------

/// Install the global subscriber described by `cfg`.
///
/// Relative log file paths are resolved against `base_dir` (the client home
/// dir). Console output goes to stderr so command output on stdout stays
/// clean. Calling this twice keeps the first subscriber.
pub fn init_logging_from_config(cfg: &LoggingConfig, base_dir: &Path) {
    let _ = tracing_log::LogTracer::init();

    if cfg.is_empty() {
        init_env_logging();
        return;
    }

    let sections = Sections::from_config(cfg);
    let routes = sections.file_routes(base_dir);
    let mut layers: Vec<BoxedLayer> = vec![console_layer(sections.targets(|s| Some(s.console_level.as_str())))];

    if let Some(level) = sections.default.and_then(|s| parse_level(&s.console_level)) {
        layers.push(console_layer(unclaimed(sections.crate_names(), level)));
    }

    if !routes.is_empty() {
        let per_crate = sections.targets(|s| (!s.file.trim().is_empty()).then_some(s.file_level.as_str()));
        layers.push(json_file_layer(routes.clone(), per_crate));

        if routes.fallback.is_some() {
            if let Some(level) = sections.default.and_then(|s| parse_level(&s.file_level)) {
                layers.push(json_file_layer(routes, unclaimed(sections.crate_names(), level)));
            }
        }
    }

    let _ = Registry::default().with(layers).try_init();
}

/// No sections configured: honor `RUST_LOG`, warnings by default.
fn init_env_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = Registry::default().with(console_layer(filter)).try_init();
}
