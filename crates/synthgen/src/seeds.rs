//! Seed catalog: the read-only template payloads generated files are copied from.
//!
//! Two families exist ([`SeedKind::Xml`] and [`SeedKind::Json`]). A [`SeedSource`]
//! resolves each family into seeds once; the resulting [`SeedCatalog`] is immutable
//! and shared by every generate call.

use crate::error::{Result, SynthError};
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;
use std::fs::File;
use std::io::{self, Read};
use std::path::PathBuf;
use tracing::info;

/// Content family of a seed and of the files generated from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeedKind {
    Xml,
    Json,
}

impl SeedKind {
    pub const ALL: [SeedKind; 2] = [SeedKind::Xml, SeedKind::Json];

    /// File extension, also the name of the seed subdirectory.
    pub fn extension(self) -> &'static str {
        match self {
            SeedKind::Xml => "xml",
            SeedKind::Json => "json",
        }
    }
}

impl fmt::Display for SeedKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

#[derive(Debug, Clone)]
enum Payload {
    Bundled(&'static [u8]),
    File(PathBuf),
}

/// A named template payload. Its family is the catalog list it sits in.
#[derive(Debug, Clone)]
pub struct Seed {
    name: String,
    payload: Payload,
}

impl Seed {
    pub fn bundled(name: &str, bytes: &'static [u8]) -> Self {
        Self {
            name: name.to_string(),
            payload: Payload::Bundled(bytes),
        }
    }

    pub fn file(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self {
            name,
            payload: Payload::File(path),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Open the payload as a byte stream.
    pub fn open(&self) -> io::Result<Box<dyn Read + '_>> {
        match &self.payload {
            Payload::Bundled(bytes) => Ok(Box::new(*bytes)),
            Payload::File(path) => Ok(Box::new(File::open(path)?)),
        }
    }
}

/// Resolves a seed family into concrete seeds.
pub trait SeedSource {
    fn load(&self, kind: SeedKind) -> Result<Vec<Seed>>;

    /// Human-readable origin for logs.
    fn describe(&self) -> String;
}

const BUNDLED_XML: &[(&str, &[u8])] = &[
    ("customer-order.xml", include_bytes!("../seeds/xml/customer-order.xml")),
    ("invoice.xml", include_bytes!("../seeds/xml/invoice.xml")),
    ("sensor-readings.xml", include_bytes!("../seeds/xml/sensor-readings.xml")),
];

const BUNDLED_JSON: &[(&str, &[u8])] = &[
    ("metrics-snapshot.json", include_bytes!("../seeds/json/metrics-snapshot.json")),
    ("shipment-event.json", include_bytes!("../seeds/json/shipment-event.json")),
    ("user-profile.json", include_bytes!("../seeds/json/user-profile.json")),
];

/// Seeds compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledSeeds;

impl BundledSeeds {
    fn seeds(kind: SeedKind) -> Vec<Seed> {
        let table = match kind {
            SeedKind::Xml => BUNDLED_XML,
            SeedKind::Json => BUNDLED_JSON,
        };
        table
            .iter()
            .map(|&(name, bytes)| Seed::bundled(name, bytes))
            .collect()
    }
}

impl SeedSource for BundledSeeds {
    fn load(&self, kind: SeedKind) -> Result<Vec<Seed>> {
        Ok(Self::seeds(kind))
    }

    fn describe(&self) -> String {
        "bundled".to_string()
    }
}

/// Seeds read from `<root>/xml/*.xml` and `<root>/json/*.json`.
#[derive(Debug, Clone)]
pub struct DirectorySeeds {
    root: PathBuf,
}

impl DirectorySeeds {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn pattern(&self, kind: SeedKind) -> String {
        let dir = self.root.join(kind.extension());
        format!(
            "{}/*.{}",
            glob::Pattern::escape(&dir.to_string_lossy()),
            kind.extension()
        )
    }
}

impl SeedSource for DirectorySeeds {
    fn load(&self, kind: SeedKind) -> Result<Vec<Seed>> {
        let mut seeds = Vec::new();
        for entry in glob::glob(&self.pattern(kind))? {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                SynthError::file_io("read seed", path, e.into_error())
            })?;
            if path.is_file() {
                seeds.push(Seed::file(path));
            }
        }
        seeds.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(seeds)
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// Immutable pool of seeds for both families.
#[derive(Debug, Clone, Default)]
pub struct SeedCatalog {
    xml: Vec<Seed>,
    json: Vec<Seed>,
}

impl SeedCatalog {
    pub fn load(source: &dyn SeedSource) -> Result<Self> {
        let catalog = Self {
            xml: source.load(SeedKind::Xml)?,
            json: source.load(SeedKind::Json)?,
        };
        info!(
            source = %source.describe(),
            xml = catalog.xml.len(),
            json = catalog.json.len(),
            "Seed catalog loaded"
        );
        Ok(catalog)
    }

    /// Catalog of the compiled-in seeds.
    pub fn bundled() -> Self {
        Self {
            xml: BundledSeeds::seeds(SeedKind::Xml),
            json: BundledSeeds::seeds(SeedKind::Json),
        }
    }

    pub fn seeds(&self, kind: SeedKind) -> &[Seed] {
        match kind {
            SeedKind::Xml => &self.xml,
            SeedKind::Json => &self.json,
        }
    }

    /// Both families need at least one seed before anything is generated.
    pub fn ensure_ready(&self) -> Result<()> {
        let missing: Vec<&str> = SeedKind::ALL
            .iter()
            .filter(|kind| self.seeds(**kind).is_empty())
            .map(|kind| kind.extension())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(SynthError::NoSeeds(format!(
                "missing {} seeds",
                missing.join(" and ")
            )))
        }
    }

    /// Uniformly random seed of the given family.
    pub fn pick<R: Rng + ?Sized>(&self, kind: SeedKind, rng: &mut R) -> Result<&Seed> {
        self.seeds(kind)
            .choose(rng)
            .ok_or_else(|| SynthError::NoSeeds(format!("missing {kind} seeds")))
    }
}
