use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-wide bookkeeping shared by all the sessions.
#[derive(Debug)]
struct EngineState {
    booted: bool,
    live_sessions: usize,
    next_session_id: u32,
}

static ENGINE: Mutex<EngineState> = Mutex::new(EngineState {
    booted: false,
    live_sessions: 0,
    next_session_id: 1,
});

/// A panic in another thread while holding the lock leaves the counters intact, so a
/// poisoned lock is simply recovered.
fn lock_engine() -> MutexGuard<'static, EngineState> {
    ENGINE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Initializes the engine. Calling it again while booted does nothing.
pub fn boot() {
    let mut engine = lock_engine();
    if !engine.booted {
        engine.booted = true;
        log::debug!("Engine booted");
    }
}

/// Shuts the engine down. Calling it while not booted does nothing; sessions which are
/// still alive keep working and boot the engine again when the next session is opened.
pub fn shutdown() {
    let mut engine = lock_engine();
    if engine.booted {
        engine.booted = false;
        if engine.live_sessions > 0 {
            log::warn!(
                "Engine shut down with {} sessions still alive",
                engine.live_sessions
            );
        } else {
            log::debug!("Engine shut down");
        }
    }
}

/// Whether the engine is currently booted.
pub fn is_booted() -> bool {
    lock_engine().booted
}

/// The number of sessions which have been opened and not yet disposed.
pub fn live_sessions() -> usize {
    lock_engine().live_sessions
}

/// Registers a new session, booting the engine if needed, and returns its identifier.
pub(crate) fn register_session() -> u32 {
    let mut engine = lock_engine();
    if !engine.booted {
        engine.booted = true;
        log::debug!("Engine booted by the first session");
    }
    let session_id = engine.next_session_id;
    engine.next_session_id = engine.next_session_id.wrapping_add(1).max(1);
    engine.live_sessions += 1;
    session_id
}

/// Unregisters a disposed session.
pub(crate) fn release_session(session_id: u32) {
    let mut engine = lock_engine();
    engine.live_sessions = engine.live_sessions.saturating_sub(1);
    log::trace!(
        "Released session {}, {} sessions still alive",
        session_id,
        engine.live_sessions
    );
}
