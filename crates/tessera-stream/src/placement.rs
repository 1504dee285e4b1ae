//! Core affinity and OS priority for the worker thread.
//!
//! Both apply to the calling thread only. Failures are logged and the
//! worker carries on unplaced.

use thread_priority::ThreadPriority;
use tracing::{debug, warn};

use crate::config::WorkerPriority;

/// Pins the calling thread to logical core `core`.
///
/// Returns `false` if the core is not available to this process or the OS
/// refuses the request.
pub(crate) fn pin_current_thread(core: usize) -> bool {
    let Some(ids) = core_affinity::get_core_ids() else {
        warn!(core, "could not list cores, worker not pinned");
        return false;
    };
    let Some(id) = ids.into_iter().find(|id| id.id == core) else {
        warn!(core, "core not available, worker not pinned");
        return false;
    };
    if !core_affinity::set_for_current(id) {
        warn!(core, "failed to pin worker");
        return false;
    }
    debug!(core, "worker pinned");
    true
}

/// Applies `priority` to the calling thread. `Normal` leaves it unchanged.
pub(crate) fn apply_priority(priority: WorkerPriority) -> bool {
    match priority {
        WorkerPriority::Normal => true,
        WorkerPriority::Low => match thread_priority::set_current_thread_priority(ThreadPriority::Min) {
            Ok(()) => {
                debug!("worker priority lowered");
                true
            }
            Err(e) => {
                warn!(error = ?e, "failed to lower worker priority");
                false
            }
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
