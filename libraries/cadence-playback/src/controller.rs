//! Playback controller - command surface, worker and seek requests
//!
//! All mutable playback state (transport, queue, decode session) lives in
//! one `Core` behind one mutex. The command surface takes the lock only to
//! flip flags or edit the queue; the worker holds it for one frame of
//! decode-and-write at a time; seek requests hold it while skipping.
//!
//! ```text
//!   surface ──lock──► Core { transport, queue, session } ◄──lock── worker
//!      │                        ▲                                  │
//!      │ spawn                  └─────────lock─── seek thread      │ events
//!      └──────────────────────────────────────────────────────────►│──► surface
//! ```

use crate::cancel::CancellationToken;
use crate::error::{PlaybackError, Result};
use crate::events::{self, EventSender, PlayerEvent};
use crate::queue::{EntryId, PlaybackQueue, RemoveOutcome};
use crate::seek::{frame_for_position, seek_session, SeekOutcome};
use crate::session::DecodeSession;
use crate::source::{SinkFactory, Track};
use crate::transport::{Transition, TransportState};
use crate::types::{
    IconState, PlayPause, PlaybackConfig, PlaybackPhase, TrackInfo, TransportControls,
};
use crossbeam_channel::Receiver;
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Longest sleep between checks while the sink plays out a finished track
const PLAYOUT_POLL: Duration = Duration::from_millis(20);

/// Everything guarded by the controller lock
struct Core {
    transport: TransportState,
    queue: PlaybackQueue,
    session: DecodeSession,
    phase: PlaybackPhase,

    /// Incremented each time a track is loaded
    load_serial: u64,

    /// Consecutive loads whose session failed to open
    unopened_run: usize,
}

impl Core {
    fn controls(&self) -> TransportControls {
        if self.phase.is_active() {
            TransportControls::loaded(
                self.queue.cursor(),
                self.queue.len(),
                self.queue.is_looping(),
                self.session.is_open(),
            )
        } else {
            TransportControls::idle(self.queue.len())
        }
    }

    fn queue_events(&self) -> [PlayerEvent; 2] {
        [
            PlayerEvent::QueueChanged {
                entries: self.queue.entries(),
            },
            PlayerEvent::TransportEnabled(self.controls()),
        ]
    }

    /// Release the session and tell the surface nothing is selected
    ///
    /// The events go out before `Idle` is visible, so a caller that observes
    /// the idle phase can never see them arrive after its own `play_at`.
    fn enter_idle(&mut self, events: &EventSender) {
        self.session.release();
        self.transport.clear_pending();
        self.transport.set_play_state(PlayPause::Paused);

        events.emit_all([
            PlayerEvent::PlaybackIcon(IconState::Play),
            PlayerEvent::TransportEnabled(TransportControls::idle(self.queue.len())),
            PlayerEvent::Reset,
        ]);
        self.phase = PlaybackPhase::Idle;
    }

    /// Elapsed and total milliseconds of the loaded track
    fn progress(&self) -> Option<(u64, u64)> {
        self.session.track().map(|track| {
            let elapsed = (self.transport.current_frame() as f64 * track.ms_per_frame()) as u64;
            (elapsed, track.ms_length())
        })
    }
}

/// State shared between the controller, its worker and seek threads
struct Shared {
    core: Mutex<Core>,

    /// Signalled on resume, pending commands, cancellation and worker exit
    wake: Condvar,

    sinks: Arc<dyn SinkFactory>,
    events: EventSender,
    progress_interval: u64,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Core> {
        self.core.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Read-only view of the controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSnapshot {
    pub phase: PlaybackPhase,
    pub play_state: PlayPause,
    pub current_index: Option<usize>,
    pub current_frame: u64,
    pub queue_len: usize,
    pub shuffled: bool,
    pub looping: bool,
}

/// Handle to a running seek request
pub struct SeekHandle {
    handle: JoinHandle<SeekOutcome>,
}

impl SeekHandle {
    /// Block until the seek has been applied
    pub fn wait(self) -> SeekOutcome {
        self.handle.join().unwrap_or(SeekOutcome::NotOpen)
    }
}

struct Worker {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// How a worker step ended
enum Step {
    Continue,
    Finished,
    Cancelled,
}

/// Queued playback controller
///
/// Owns the queue, the transport and at most one playback worker. Commands
/// return immediately; their effects reach the worker by the next frame
/// boundary and are reported through the event channel returned by
/// [`PlaybackController::new`].
pub struct PlaybackController {
    shared: Arc<Shared>,
    worker: Option<Worker>,

    /// Target recorded by the last scrub press or drag
    scrub_target: Option<u64>,
}

impl PlaybackController {
    /// Create a controller and the receiver its events are delivered to
    pub fn new(
        config: PlaybackConfig,
        sinks: Arc<dyn SinkFactory>,
    ) -> (Self, Receiver<PlayerEvent>) {
        let (events, receiver) = events::channel();

        let mut queue = PlaybackQueue::new().with_fixed_seed(config.seed);
        queue.set_looping(config.looping);
        if config.shuffle {
            queue.toggle_shuffle(false);
        }

        let shared = Arc::new(Shared {
            core: Mutex::new(Core {
                transport: TransportState::new(),
                queue,
                session: DecodeSession::new(),
                phase: PlaybackPhase::Idle,
                load_serial: 0,
                unopened_run: 0,
            }),
            wake: Condvar::new(),
            sinks,
            events,
            progress_interval: u64::from(config.progress_interval.max(1)),
        });

        let controller = Self {
            shared,
            worker: None,
            scrub_target: None,
        };
        (controller, receiver)
    }

    // ===== Commands =====

    /// Start playing the entry at `index`, replacing any running worker
    ///
    /// The old worker is cancelled here; the new worker waits for it to
    /// release its decode session before loading.
    pub fn play_at(&mut self, index: usize) -> Result<()> {
        let previous = self.worker.take();
        {
            let mut core = self.shared.lock();
            if index >= core.queue.len() {
                self.worker = previous;
                return Err(PlaybackError::IndexOutOfBounds(index));
            }

            if let Some(previous) = &previous {
                previous.token.cancel();
            }
            core.queue.set_cursor(index);
            core.transport.clear_pending();
            core.unopened_run = 0;
            core.phase = PlaybackPhase::Loading;
        }
        self.shared.wake.notify_all();

        let token = CancellationToken::new();
        let shared = Arc::clone(&self.shared);
        let worker_token = token.clone();
        let previous = previous.map(|w| w.handle);

        let spawned = thread::Builder::new()
            .name("cadence-playback".into())
            .spawn(move || run_worker(&shared, &worker_token, previous));
        let handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                warn!("Could not spawn playback worker: {}", e);
                self.abandon_start();
                return Err(e.into());
            }
        };

        info!(index, "Playback requested");
        self.worker = Some(Worker { token, handle });
        Ok(())
    }

    /// Return to idle after a `play_at` whose worker never started
    ///
    /// The cancelled worker it replaced skips its own idle transition.
    fn abandon_start(&self) {
        {
            let mut core = self.shared.lock();
            core.queue.stop();
            core.enter_idle(&self.shared.events);
        }
        self.shared.wake.notify_all();
    }

    /// Flip between playing and paused
    ///
    /// Returns the new state, or `None` when nothing is loaded.
    pub fn toggle_play_pause(&self) -> Option<PlayPause> {
        let state = {
            let mut core = self.shared.lock();
            if !core.phase.is_active() {
                return None;
            }
            core.transport.toggle_play_pause()
        };
        self.shared.wake.notify_all();
        self.shared
            .events
            .emit(PlayerEvent::PlaybackIcon(IconState::from(state)));
        Some(state)
    }

    /// Stop at the next frame boundary
    pub fn stop(&self) {
        self.request(TransportState::request_stop);
    }

    /// Skip forward at the next frame boundary
    pub fn next(&self) {
        self.request(TransportState::request_next);
    }

    /// Skip back at the next frame boundary
    pub fn previous(&self) {
        self.request(TransportState::request_previous);
    }

    fn request(&self, raise: fn(&mut TransportState)) {
        {
            let mut core = self.shared.lock();
            if !core.phase.is_active() {
                return;
            }
            raise(&mut core.transport);
        }
        self.shared.wake.notify_all();
    }

    /// Append a track to the queue
    pub fn add(&self, track: Arc<dyn Track>) -> EntryId {
        let (id, events) = {
            let mut core = self.shared.lock();
            let id = core.queue.add(track);
            (id, core.queue_events())
        };
        self.shared.events.emit_all(events);
        id
    }

    /// Remove the entry at `index` of the presentation order
    ///
    /// Removing the playing entry raises stop (if it was last) or
    /// remove-current so the worker lets go of its session first.
    pub fn remove_at(&self, index: usize) -> Result<()> {
        let (title, outcome, events) = {
            let mut core = self.shared.lock();
            let active = core.phase.is_active();
            let (entry, outcome) = core.queue.remove_at(index, active)?;
            match outcome {
                RemoveOutcome::StopCurrent => core.transport.request_stop(),
                RemoveOutcome::RemoveCurrent => core.transport.request_remove_current(),
                RemoveOutcome::Removed => {}
            }
            (entry.info().title.clone(), outcome, core.queue_events())
        };

        if outcome != RemoveOutcome::Removed {
            self.shared.wake.notify_all();
        }
        debug!(index, ?outcome, "Removed {}", title);
        self.shared.events.emit_all(events);
        Ok(())
    }

    /// Flip shuffle; returns the new flag
    pub fn toggle_shuffle(&self) -> bool {
        let (shuffled, seed, events) = {
            let mut core = self.shared.lock();
            let active = core.phase.is_active();
            let shuffled = core.queue.toggle_shuffle(active);
            (shuffled, core.queue.shuffle_seed(), core.queue_events())
        };
        info!(shuffled, ?seed, "Shuffle toggled");
        self.shared.events.emit_all(events);
        shuffled
    }

    /// Flip loop; returns the new flag
    pub fn toggle_loop(&self) -> bool {
        let (looping, controls) = {
            let mut core = self.shared.lock();
            let looping = core.queue.toggle_loop();
            (looping, core.controls())
        };
        info!(looping, "Loop toggled");
        self.shared
            .events
            .emit(PlayerEvent::TransportEnabled(controls));
        looping
    }

    /// Record the scrub target under the pointer
    pub fn scrub_press(&mut self, position_ms: u64) {
        self.scrub_target = self.frame_at(position_ms);
    }

    /// Follow the scrubber while it is dragged
    pub fn scrub_drag(&mut self, position_ms: u64) -> Option<SeekHandle> {
        self.scrub_target = self.frame_at(position_ms);
        self.scrub_target.and_then(|frame| self.seek_to(frame))
    }

    /// Seek to where the scrubber was let go
    pub fn scrub_release(&mut self, position_ms: u64) -> Option<SeekHandle> {
        let target = self.frame_at(position_ms).or(self.scrub_target.take());
        self.scrub_target = None;
        target.and_then(|frame| self.seek_to(frame))
    }

    /// Reposition the loaded track to `frame` on a short-lived thread
    ///
    /// Returns `None` when no track is loaded.
    pub fn seek_to(&self, frame: u64) -> Option<SeekHandle> {
        let (serial, progress) = {
            let core = self.shared.lock();
            if !core.phase.is_active() {
                return None;
            }
            let track = core.session.track()?;
            let elapsed = (frame as f64 * track.ms_per_frame()) as u64;
            (
                core.load_serial,
                PlayerEvent::Progress {
                    elapsed_ms: elapsed.min(track.ms_length()),
                    total_ms: track.ms_length(),
                },
            )
        };

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name("cadence-seek".into())
            .spawn(move || {
                shared.events.emit(progress);
                run_seek(&shared, serial, frame)
            });

        match handle {
            Ok(handle) => Some(SeekHandle { handle }),
            Err(e) => {
                warn!("Could not spawn seek thread: {}", e);
                None
            }
        }
    }

    fn frame_at(&self, position_ms: u64) -> Option<u64> {
        let core = self.shared.lock();
        core.session
            .track()
            .map(|track| frame_for_position(position_ms, track.ms_per_frame()))
    }

    /// Cancel the worker and release the session
    pub fn shutdown(&mut self) {
        if let Some(worker) = self.worker.take() {
            {
                let _core = self.shared.lock();
                worker.token.cancel();
            }
            self.shared.wake.notify_all();
            if worker.handle.join().is_err() {
                warn!("Playback worker panicked");
            }
        }

        let mut core = self.shared.lock();
        core.session.release();
        core.transport.clear_pending();
        core.phase = PlaybackPhase::Idle;
    }

    // ===== Queries =====

    pub fn phase(&self) -> PlaybackPhase {
        self.shared.lock().phase
    }

    /// Index of the loaded entry, if a track is loaded
    pub fn current_index(&self) -> Option<usize> {
        let core = self.shared.lock();
        if core.phase.is_active() {
            core.queue.current_index()
        } else {
            None
        }
    }

    pub fn current_frame(&self) -> u64 {
        self.shared.lock().transport.current_frame()
    }

    pub fn queue_len(&self) -> usize {
        self.shared.lock().queue.len()
    }

    /// Display metadata in presentation order
    pub fn entries(&self) -> Vec<TrackInfo> {
        self.shared.lock().queue.entries()
    }

    pub fn snapshot(&self) -> ControllerSnapshot {
        let core = self.shared.lock();
        ControllerSnapshot {
            phase: core.phase,
            play_state: core.transport.play_state(),
            current_index: if core.phase.is_active() {
                core.queue.current_index()
            } else {
                None
            },
            current_frame: core.transport.current_frame(),
            queue_len: core.queue.len(),
            shuffled: core.queue.is_shuffled(),
            looping: core.queue.is_looping(),
        }
    }

    /// Block until the worker has terminated or `timeout` elapses
    ///
    /// Returns whether the controller is idle.
    pub fn wait_until_idle(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut core = self.shared.lock();
        while core.phase.is_active() {
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            core = self
                .shared
                .wake
                .wait_timeout(core, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
        true
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ===== Worker =====

fn run_worker(shared: &Shared, token: &CancellationToken, previous: Option<JoinHandle<()>>) {
    if let Some(previous) = previous {
        if previous.join().is_err() {
            warn!("Previous playback worker panicked");
        }
    }

    loop {
        match load_current(shared, token) {
            Step::Continue => {}
            Step::Finished => break,
            Step::Cancelled => return,
        }
        match play_frames(shared, token) {
            Step::Cancelled => return,
            Step::Continue | Step::Finished => {}
        }
        match drain(shared, token) {
            Step::Continue => {}
            Step::Finished => break,
            Step::Cancelled => return,
        }
    }

    finish(shared, token);
}

/// Loading: open a session for the entry under the cursor
fn load_current(shared: &Shared, token: &CancellationToken) -> Step {
    let (info, controls, progress) = {
        let mut core = shared.lock();
        if token.is_cancelled() {
            core.session.release();
            return Step::Cancelled;
        }

        let Some(entry) = core.queue.current_entry().cloned() else {
            return Step::Finished;
        };

        core.phase = PlaybackPhase::Loading;
        core.transport.begin_track();
        core.load_serial += 1;
        let opened = core.session.open(Arc::clone(entry.track()), shared.sinks.as_ref());
        core.unopened_run = if opened { 0 } else { core.unopened_run + 1 };
        core.phase = PlaybackPhase::Playing;

        info!(
            index = core.queue.cursor(),
            opened,
            "Loaded {}",
            entry.info().title
        );
        (entry.info().clone(), core.controls(), core.progress())
    };

    shared.events.emit_all([
        PlayerEvent::PlaybackIcon(IconState::Pause),
        PlayerEvent::TransportEnabled(controls),
        PlayerEvent::track_changed(&info),
    ]);
    if let Some((elapsed_ms, total_ms)) = progress {
        shared.events.emit(PlayerEvent::Progress {
            elapsed_ms,
            total_ms,
        });
    }
    Step::Continue
}

/// Playing/Paused: one frame per lock acquisition until something stops us
fn play_frames(shared: &Shared, token: &CancellationToken) -> Step {
    let mut playout_deadline = None;
    loop {
        if token.is_cancelled() {
            shared.lock().session.release();
            return Step::Cancelled;
        }

        let mut core = shared.lock();
        if token.is_cancelled() {
            core.session.release();
            return Step::Cancelled;
        }
        if core.transport.has_pending() {
            return Step::Continue;
        }

        if core.transport.is_paused() {
            core.phase = PlaybackPhase::Paused;
            debug!(frame = core.transport.current_frame(), "Paused");
            let mut core = shared
                .wake
                .wait_while(core, |c| {
                    c.transport.is_paused() && !c.transport.has_pending() && !token.is_cancelled()
                })
                .unwrap_or_else(PoisonError::into_inner);
            if core.phase == PlaybackPhase::Paused {
                core.phase = PlaybackPhase::Playing;
            }
            continue;
        }

        match core.session.play_frame() {
            Ok(true) => {
                core.transport.frame_done();
                playout_deadline = None;
            }
            Ok(false) => {
                // Let the sink play out its queue before the track is drained
                let queued = core.session.queued();
                let deadline = *playout_deadline
                    .get_or_insert_with(|| Instant::now() + queued + PLAYOUT_POLL);
                if queued.is_zero() || Instant::now() >= deadline {
                    return Step::Continue;
                }
                drop(core);
                thread::sleep(queued.min(PLAYOUT_POLL));
                continue;
            }
            Err(e) => {
                warn!("Decode fault, stopping: {}", e);
                core.session.close();
                core.transport.request_stop();
                return Step::Continue;
            }
        }

        let frame = core.transport.current_frame();
        let progress = core.progress();
        drop(core);

        if frame % shared.progress_interval == 0 {
            if let Some((elapsed_ms, total_ms)) = progress {
                shared.events.emit(PlayerEvent::Progress {
                    elapsed_ms,
                    total_ms,
                });
            }
        }
    }
}

/// Draining: apply exactly one transition and decide whether to go on
fn drain(shared: &Shared, token: &CancellationToken) -> Step {
    let mut core = shared.lock();
    if token.is_cancelled() {
        core.session.release();
        return Step::Cancelled;
    }

    core.phase = PlaybackPhase::Draining;
    let transition = core.transport.take_transition();
    core.session.close();

    if transition == Transition::NaturalEnd && core.unopened_run >= core.queue.len() {
        warn!("No entry in the queue could be opened, stopping");
        core.queue.stop();
        return Step::Finished;
    }

    match transition {
        Transition::Stop => core.queue.stop(),
        Transition::Next | Transition::NaturalEnd => core.queue.advance(),
        Transition::Previous => core.queue.retreat(),
        Transition::RemoveCurrent => {}
    }
    if transition != Transition::Stop {
        core.queue.wrap_if_looping();
    }

    info!(?transition, cursor = core.queue.cursor(), "Track drained");
    if core.queue.current_entry().is_some() {
        Step::Continue
    } else {
        Step::Finished
    }
}

/// Idle: release everything and tell the surface nothing is selected
fn finish(shared: &Shared, token: &CancellationToken) {
    {
        let mut core = shared.lock();
        if token.is_cancelled() {
            core.session.release();
            return;
        }
        info!("Playback finished");
        core.enter_idle(&shared.events);
    }
    shared.wake.notify_all();
}

// ===== Seek =====

fn run_seek(shared: &Shared, serial: u64, target: u64) -> SeekOutcome {
    let mut core = shared.lock();
    if !core.phase.is_active() || core.load_serial != serial {
        debug!(target, "Dropping seek for a track that is no longer loaded");
        return SeekOutcome::Stale;
    }

    let Core {
        transport, session, ..
    } = &mut *core;

    match seek_session(transport, session, shared.sinks.as_ref(), target) {
        Ok(outcome) => {
            debug!(target, ?outcome, "Seek applied");
            outcome
        }
        Err(e) => {
            warn!("Decode fault while seeking, stopping: {}", e);
            session.close();
            transport.request_stop();
            drop(core);
            shared.wake.notify_all();
            SeekOutcome::NotOpen
        }
    }
}
