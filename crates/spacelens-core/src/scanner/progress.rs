/// Scan progress reporting — lightweight messages sent from the scanning
/// thread to whoever is rendering progress, via a crossbeam channel.

/// A batch-completion snapshot, emitted while the scan root's immediate
/// children are being processed.
///
/// `scanned` counts entries whose batch has completed (failed entries
/// included — they were attempted), `total` is the number of immediate
/// children of the root. Consumers should overwrite their displayed state
/// with each message rather than accumulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanProgress {
    /// Immediate children of the root processed so far.
    pub scanned: usize,
    /// Total immediate children of the root.
    pub total: usize,
}
