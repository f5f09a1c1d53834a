//! Flushing: committing the staged tree to its backing store
//!
//! Every pending change is applied in the order of its most recent mutation.
//! On a `DiskStore` that means:
//!
//! 1.  **Create Directories**: parent directories are created as needed.
//!
//! 2.  **Write Content**: the file content replaces whatever was on disk.
//!
//! 3.  **Set Permissions**: on Unix-like systems the stored mode is applied.
//!
//! 4.  **Delete**: deleted paths are removed from disk.
//!
//! The first failing path stops the flush. Paths applied before it remain.

use log::{info, warn};

use crate::error::{Error, Result};
use crate::tree::{FlushReport, Tree};

/// Commit `tree` to its backing store.
pub fn execute(tree: Tree<'_>) -> Result<FlushReport> {
    match tree.commit() {
        Ok(report) => {
            info!(
                "Wrote {} file(s), deleted {} file(s)",
                report.written.len(),
                report.deleted.len()
            );
            Ok(report)
        }
        Err(e) => {
            if let Error::Flush { path, applied, .. } = &e {
                warn!("Flush stopped at {} after {} change(s)", path, applied);
            }
            Err(e)
        }
    }
}
