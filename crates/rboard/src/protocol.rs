//! Where complete file contents come from
//!
//! Review Board 3.0 serves original and patched files directly. Older
//! servers only serve the rendered chunks, so the legacy path reads the file
//! from source control and overlays the chunk text onto it.

use crate::source_control::SourceControl;
use async_trait::async_trait;
use log::debug;
use rb_client::{FileDiffSummary, FileKey, ProtocolVersion, Result, ReviewBoardClient, ServerVersion};
use rb_diff::{reconstruct_destination, ReconciledDiff};
use std::sync::Arc;

/// Both sides of a file, ready for display
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileLines {
    /// `None` when the file is new in this diff
    pub source: Option<Vec<String>>,
    pub dest: Vec<String>,
}

/// Fetches the full source and destination text of one filediff
#[async_trait]
pub trait ContentProtocol: Send + Sync {
    fn version(&self) -> ProtocolVersion;

    /// Full text of both sides of `file`
    ///
    /// `reconciled` is the line map built from the same filediff; only the
    /// legacy protocol reads it.
    async fn file_lines(
        &self,
        client: &dyn ReviewBoardClient,
        file: &FileDiffSummary,
        key: FileKey,
        reconciled: &ReconciledDiff,
    ) -> Result<FileLines>;
}

/// Pick the protocol matching the server version
pub fn select(
    version: ServerVersion,
    source_control: Arc<dyn SourceControl>,
) -> Box<dyn ContentProtocol> {
    let protocol: Box<dyn ContentProtocol> = match version.protocol() {
        ProtocolVersion::Legacy => Box::new(LegacyProtocol::new(source_control)),
        ProtocolVersion::Modern => Box::new(ModernProtocol),
    };
    debug!("Server {} uses the {:?} protocol", version, protocol.version());
    protocol
}

/// Servers >= 3.0: both files come from the server
#[derive(Debug, Default)]
pub struct ModernProtocol;

#[async_trait]
impl ContentProtocol for ModernProtocol {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::Modern
    }

    async fn file_lines(
        &self,
        client: &dyn ReviewBoardClient,
        file: &FileDiffSummary,
        key: FileKey,
        _reconciled: &ReconciledDiff,
    ) -> Result<FileLines> {
        let full = client.get_full_file(key).await?;
        Ok(FileLines {
            source: (!file.is_new_file()).then_some(full.original_lines),
            dest: full.patched_lines,
        })
    }
}

/// Servers < 3.0: files come from source control
pub struct LegacyProtocol {
    source_control: Arc<dyn SourceControl>,
}

impl LegacyProtocol {
    pub fn new(source_control: Arc<dyn SourceControl>) -> Self {
        Self { source_control }
    }
}

#[async_trait]
impl ContentProtocol for LegacyProtocol {
    fn version(&self) -> ProtocolVersion {
        ProtocolVersion::Legacy
    }

    async fn file_lines(
        &self,
        _client: &dyn ReviewBoardClient,
        file: &FileDiffSummary,
        _key: FileKey,
        reconciled: &ReconciledDiff,
    ) -> Result<FileLines> {
        let raw_dest = self.source_control.fetch_file(&file.dest_file).await?;
        let dest = reconstruct_destination(raw_dest, &reconciled.dst_updates);

        let source = if file.is_new_file() {
            None
        } else {
            Some(self.source_control.fetch_file(&file.source_file).await?)
        };

        Ok(FileLines { source, dest })
    }
}
