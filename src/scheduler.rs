use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::broadcast::{Event, Publisher};
use crate::clock::Clock;
use crate::config::ScheduleConfig;
use crate::error::ControlError;
use crate::log::{EventLog, LogEntry, LogEvent};

/// Whether a run is active. Written only by the scheduler actor; status
/// queries read it through [`SchedulerHandle::is_running`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

enum Command {
    Start(ScheduleConfig, oneshot::Sender<Result<(), ControlError>>),
    Stop(oneshot::Sender<Result<(), ControlError>>),
}

/// The control loop.
///
/// Accepts one start command at a time; a run waits until its scheduled
/// start instant and then alternates match and pause phases forever, logging
/// and broadcasting each transition, until a stop command cancels it. Every
/// run gets its own cancellation token; cancellation is observed at the next
/// suspension point.
pub struct Scheduler<C: Clock> {
    cmd_rx: mpsc::UnboundedReceiver<Command>,
    state: Arc<Mutex<RunState>>,
    log: Arc<EventLog>,
    publisher: Publisher,
    clock: C,
    active: Option<CancellationToken>,
}

#[derive(Clone, Debug)]
pub struct SchedulerHandle {
    cmd_tx: mpsc::UnboundedSender<Command>,
    state: Arc<Mutex<RunState>>,
}

impl SchedulerHandle {
    pub async fn start(&self, config: ScheduleConfig) -> Result<(), ControlError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Start(config, tx))
            .map_err(|_| ControlError::Unavailable)?;
        rx.await.map_err(|_| ControlError::Unavailable)?
    }

    pub async fn stop(&self) -> Result<(), ControlError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Stop(tx))
            .map_err(|_| ControlError::Unavailable)?;
        rx.await.map_err(|_| ControlError::Unavailable)?
    }

    pub fn is_running(&self) -> bool {
        *self.state.lock().unwrap() == RunState::Running
    }
}

impl<C: Clock> Scheduler<C> {
    pub fn new(clock: C, log: Arc<EventLog>, publisher: Publisher) -> (Self, SchedulerHandle) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state = Arc::new(Mutex::new(RunState::Idle));

        let scheduler = Self {
            cmd_rx,
            state: Arc::clone(&state),
            log,
            publisher,
            clock,
            active: None,
        };

        (scheduler, SchedulerHandle { cmd_tx, state })
    }

    pub async fn run(mut self) {
        while let Some(cmd) = self.cmd_rx.recv().await {
            match cmd {
                Command::Start(config, reply) => {
                    let result = self.handle_start(config);
                    if reply.send(result).is_err() {
                        warn!("start caller went away before the reply");
                    }
                }
                Command::Stop(reply) => {
                    let result = self.handle_stop();
                    if reply.send(result).is_err() {
                        warn!("stop caller went away before the reply");
                    }
                }
            }
        }
        debug!("scheduler command channel closed");
    }

    fn handle_start(&mut self, config: ScheduleConfig) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();
        if *state == RunState::Running {
            return Err(ControlError::AlreadyRunning);
        }

        let config = config.normalized();
        let now = self.clock.now();
        let start_at = config.start_instant(now)?;
        *state = RunState::Running;
        drop(state);

        info!("timer started, first match at {start_at}");
        self.log.append(LogEntry::with_configuration(
            LogEvent::TimerStarted,
            now,
            config.clone(),
        ));

        let token = CancellationToken::new();
        self.active = Some(token.clone());

        tokio::spawn(run_sequence(
            self.clock.clone(),
            config,
            start_at,
            token,
            Arc::clone(&self.log),
            self.publisher.clone(),
        ));

        Ok(())
    }

    fn handle_stop(&mut self) -> Result<(), ControlError> {
        let mut state = self.state.lock().unwrap();
        if *state == RunState::Idle {
            return Err(ControlError::NotRunning);
        }
        *state = RunState::Idle;
        drop(state);

        if let Some(token) = self.active.take() {
            token.cancel();
        }

        info!("timer stopped");
        self.log
            .append(LogEntry::new(LogEvent::TimerStopped, self.clock.now()));

        Ok(())
    }
}

/// One run: wait for the start instant, then alternate match and pause
/// phases until cancelled. The alternation has no natural end.
async fn run_sequence<C: Clock>(
    clock: C,
    config: ScheduleConfig,
    start_at: DateTime<Local>,
    token: CancellationToken,
    log: Arc<EventLog>,
    publisher: Publisher,
) {
    let initial_delay = (start_at - clock.now()).to_std().unwrap_or_default();
    debug!("waiting {initial_delay:?} for the scheduled start");
    if !sleep_unless_cancelled(&clock, initial_delay, &token).await {
        debug!("run cancelled before the scheduled start");
        return;
    }

    loop {
        publisher.publish(Event::match_start());
        log.append(LogEntry::new(LogEvent::MatchStart, clock.now()));

        if !sleep_unless_cancelled(&clock, config.match_period(), &token).await {
            debug!("run cancelled during a match phase");
            return;
        }

        publisher.publish(Event::match_end());
        log.append(LogEntry::new(LogEvent::MatchEnd, clock.now()));

        if !sleep_unless_cancelled(&clock, config.pause_period(), &token).await {
            debug!("run cancelled during a pause phase");
            return;
        }
    }
}

/// Suspends for `duration`; returns false when the run was cancelled first.
/// An already-cancelled token wins over an elapsed sleep.
async fn sleep_unless_cancelled<C: Clock>(
    clock: &C,
    duration: Duration,
    token: &CancellationToken,
) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        _ = clock.sleep(duration) => true,
    }
}
