use std::path::Path;

use color_eyre::eyre::Result;
use serde::Serialize;
use tracing::{info, warn};

use crate::music_api::ItemKind;

/// What happened to one destination collection during a run
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct CollectionReport {
    /// Destination playlist name, or "saved albums" / "saved artists" / "saved tracks"
    pub collection: String,
    pub added: usize,
    pub missing: Vec<MissingItem>,
    pub failed: Vec<FailedItem>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct MissingItem {
    pub kind: ItemKind,
    pub name: String,
    pub artist: Option<String>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct FailedItem {
    pub kind: ItemKind,
    pub name: String,
    pub artist: Option<String>,
    pub error: String,
}

#[derive(Serialize, Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub collections: Vec<CollectionReport>,
}

impl CollectionReport {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            added: 0,
            missing: vec![],
            failed: vec![],
        }
    }

    pub fn record_missing(&mut self, kind: ItemKind, name: &str, artist: Option<&str>) {
        self.missing.push(MissingItem {
            kind,
            name: name.to_string(),
            artist: artist.map(str::to_string),
        });
    }

    pub fn record_failed(&mut self, kind: ItemKind, name: &str, artist: Option<&str>, error: String) {
        self.failed.push(FailedItem {
            kind,
            name: name.to_string(),
            artist: artist.map(str::to_string),
            error,
        });
    }

    pub fn total(&self) -> usize {
        self.added + self.missing.len() + self.failed.len()
    }

    /// Share of items that made it to the destination, 1.0 for an empty collection
    pub fn conversion_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 1.0;
        }
        self.added as f64 / total as f64
    }
}

impl SyncReport {
    pub fn push(&mut self, collection: CollectionReport) {
        self.collections.push(collection);
    }

    pub fn extend(&mut self, other: SyncReport) {
        self.collections.extend(other.collections);
    }

    pub fn missing_count(&self) -> usize {
        self.collections.iter().map(|c| c.missing.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.collections.iter().map(|c| c.failed.len()).sum()
    }

    pub fn log_summary(&self) {
        for c in &self.collections {
            info!(
                "\"{}\": {}/{} synchronized ({:.1}%)",
                c.collection,
                c.added,
                c.total(),
                c.conversion_rate() * 100.0
            );
        }
        let failed = self.failed_count();
        if failed > 0 {
            warn!("{} items failed to be written to the destination", failed);
        }
        info!("{} items could not be found on the destination", self.missing_count());
    }
}

pub fn write_report(report: &SyncReport, output: &Path, minify: bool) -> Result<()> {
    let file = std::fs::File::create(output)?;
    if minify {
        serde_json::to_writer(file, report)?;
    } else {
        serde_json::to_writer_pretty(file, report)?;
    }
    info!("wrote synchronization report to: {:?}", output);
    Ok(())
}
