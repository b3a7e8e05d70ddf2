//! Debate session controller.
//!
//! One controller owns one debate: its phase, the floor, the transcript, the
//! feedback ledger, both audio adapters, the countdown clock and every
//! pending delayed task. All of it is mutated from a single task that pulls
//! events off the session queue one at a time, so nothing here needs a lock.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::capture::{CaptureEvent, SpeechCapture, SpeechProvider};
use crate::clock::Clock;
use crate::config::{Config, ModeratorConfig, SessionTiming, render_template};
use crate::error::{CaptureError, SessionError, SessionWarning};
use crate::evaluator::{FeedbackEvaluator, RubricEvaluator};
use crate::event::{EventSink, ScheduledTask, SessionEvent, SessionSignal, SignalCallback};
use crate::feedback::{FeedbackEntry, FeedbackLedger, FinalResult};
use crate::generator::{DebateContext, FALLBACK_REBUTTAL, ResponseGenerator, RotatingRebuttals};
use crate::participant::{Participants, Side, Speaker, Topic};
use crate::policy::{CommentaryPolicy, RandomCommentary, RangeSampler, ScoreSampler};
use crate::reporter::{LogReporter, ResultReporter};
use crate::scheduler::Scheduler;
use crate::transcript::TranscriptLog;
use crate::voice::{PacedVoice, UtteranceId, VoiceBackend, VoiceEvent, VoiceOutput};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Phase {
    Loading,
    Active,
    Ended,
}

/// Who holds the floor. Only one side can, so capture and playback can
/// never both be live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Floor {
    #[default]
    Open,
    /// The human's speech is being captured.
    Human,
    /// The opponent's utterance is being rendered.
    Opponent(UtteranceId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TurnState {
    floor: Floor,
    opponent_interrupted: bool,
    voice_loading: bool,
}

impl TurnState {
    pub fn floor(&self) -> Floor {
        self.floor
    }

    pub fn speaker(&self) -> Option<Side> {
        match self.floor {
            Floor::Open => None,
            Floor::Human => Some(Side::Human),
            Floor::Opponent(_) => Some(Side::Opponent),
        }
    }

    pub fn human_capturing(&self) -> bool {
        self.floor == Floor::Human
    }

    pub fn opponent_speaking(&self) -> bool {
        matches!(self.floor, Floor::Opponent(_))
    }

    /// The human barged in on the most recent opponent utterance.
    pub fn opponent_interrupted(&self) -> bool {
        self.opponent_interrupted
    }

    /// The opponent's next utterance is being prepared or spoken.
    pub fn voice_loading(&self) -> bool {
        self.voice_loading
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    TimeExpired,
    Requested,
}

/// Cloneable remote control for a running session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    sink: EventSink,
}

impl SessionHandle {
    pub fn start_capture(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::StartCapture)
    }

    pub fn stop_capture(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::StopCapture)
    }

    /// Confirmed request to end the debate early.
    pub fn end_now(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::EndRequested)
    }

    pub fn teardown(&self) -> Result<(), SessionError> {
        self.post(SessionEvent::Teardown)
    }

    fn post(&self, event: SessionEvent) -> Result<(), SessionError> {
        if self.sink.send(event) {
            Ok(())
        } else {
            Err(SessionError::Closed)
        }
    }
}

/// Assembles a [`SessionController`] from a [`Config`] and its collaborators.
/// Anything not supplied is built from the config.
pub struct SessionBuilder {
    config: Config,
    speech: Option<Box<dyn SpeechProvider>>,
    voice: Option<Arc<dyn VoiceBackend>>,
    generator: Option<Arc<dyn ResponseGenerator>>,
    evaluator: Option<Box<dyn FeedbackEvaluator>>,
    sampler: Option<Box<dyn ScoreSampler>>,
    commentary: Option<Box<dyn CommentaryPolicy>>,
    reporter: Option<Arc<dyn ResultReporter>>,
    seed: Option<u64>,
}

impl SessionBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            speech: None,
            voice: None,
            generator: None,
            evaluator: None,
            sampler: None,
            commentary: None,
            reporter: None,
            seed: None,
        }
    }

    /// Without a provider the session runs with capture unsupported.
    pub fn speech(mut self, provider: Box<dyn SpeechProvider>) -> Self {
        self.speech = Some(provider);
        self
    }

    pub fn voice(mut self, backend: Arc<dyn VoiceBackend>) -> Self {
        self.voice = Some(backend);
        self
    }

    pub fn generator(mut self, generator: Arc<dyn ResponseGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn evaluator(mut self, evaluator: Box<dyn FeedbackEvaluator>) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    /// Score sampler for the default rubric evaluator.
    pub fn sampler(mut self, sampler: Box<dyn ScoreSampler>) -> Self {
        self.sampler = Some(sampler);
        self
    }

    pub fn commentary(mut self, policy: Box<dyn CommentaryPolicy>) -> Self {
        self.commentary = Some(policy);
        self
    }

    pub fn reporter(mut self, reporter: Arc<dyn ResultReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Seed the default chance policies for a repeatable debate.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<SessionController, SessionError> {
        self.config.validate()?;
        let config = self.config;
        let scoring = &config.scoring;
        let seed = self.seed;

        let (sink, inbox) = EventSink::channel();

        let voice = self
            .voice
            .unwrap_or_else(|| Arc::new(PacedVoice::from_config(&config.voice)));
        let generator = self.generator.unwrap_or_else(|| {
            Arc::new(RotatingRebuttals::new(config.opponent.rebuttals.clone()))
        });
        let evaluator = match self.evaluator {
            Some(evaluator) => evaluator,
            None => {
                let sampler = self.sampler.unwrap_or_else(|| match seed {
                    Some(seed) => Box::new(RangeSampler::seeded(
                        scoring.human_score,
                        scoring.opponent_score,
                        seed,
                    )),
                    None => Box::new(RangeSampler::new(
                        scoring.human_score,
                        scoring.opponent_score,
                    )),
                });
                Box::new(RubricEvaluator::new(sampler, config.feedback.clone()))
            }
        };
        let commentary = self.commentary.unwrap_or_else(|| match seed {
            Some(seed) => Box::new(RandomCommentary::seeded(
                scoring.commentary_probability,
                seed.wrapping_add(1),
            )),
            None => Box::new(RandomCommentary::new(scoring.commentary_probability)),
        });
        let reporter = self.reporter.unwrap_or_else(|| Arc::new(LogReporter));

        let id = Uuid::new_v4();
        info!(session = %id, topic = %config.topic.title, "debate session created");

        Ok(SessionController {
            id,
            topic: config.topic.to_topic(),
            participants: config.participants.to_participants(),
            feedback: FeedbackLedger::new(scoring.fallback()),
            timing: config.session.clone(),
            moderator: config.moderator.clone(),
            opening_statement: config.opponent.opening_statement.clone(),
            phase: Phase::Loading,
            deadline: None,
            time_remaining: config.session.duration_secs,
            turn: TurnState::default(),
            transcript: TranscriptLog::new(),
            result: None,
            result_announced: false,
            capture: SpeechCapture::new(self.speech, sink.clone()),
            voice: VoiceOutput::new(voice, sink.clone()),
            clock: Clock::new(),
            scheduler: Scheduler::new(sink.clone()),
            generator,
            evaluator,
            commentary,
            reporter,
            inbox,
            sink,
            callback: None,
            opponent_turns: 0,
            capture_unsupported: false,
            torn_down: false,
            finished: false,
        })
    }
}

enum Next {
    Tick,
    Event(Option<SessionEvent>),
}

/// Drives one debate from the moderator's welcome to the final result.
pub struct SessionController {
    id: Uuid,
    topic: Topic,
    participants: Participants,
    timing: SessionTiming,
    moderator: ModeratorConfig,
    opening_statement: String,
    phase: Phase,
    deadline: Option<DateTime<Utc>>,
    time_remaining: u32,
    turn: TurnState,
    transcript: TranscriptLog,
    feedback: FeedbackLedger,
    result: Option<FinalResult>,
    result_announced: bool,
    capture: SpeechCapture,
    voice: VoiceOutput,
    clock: Clock,
    scheduler: Scheduler,
    generator: Arc<dyn ResponseGenerator>,
    evaluator: Box<dyn FeedbackEvaluator>,
    commentary: Box<dyn CommentaryPolicy>,
    reporter: Arc<dyn ResultReporter>,
    inbox: mpsc::UnboundedReceiver<SessionEvent>,
    sink: EventSink,
    callback: Option<SignalCallback>,
    opponent_turns: usize,
    capture_unsupported: bool,
    torn_down: bool,
    finished: bool,
}

impl SessionController {
    pub fn builder(config: Config) -> SessionBuilder {
        SessionBuilder::new(config)
    }

    /// Set a callback for session signals.
    pub fn with_callback(mut self, callback: SignalCallback) -> Self {
        self.callback = Some(callback);
        self
    }

    pub fn handle(&self) -> SessionHandle {
        SessionHandle {
            sink: self.sink.clone(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn topic(&self) -> &Topic {
        &self.topic
    }

    pub fn participants(&self) -> &Participants {
        &self.participants
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.deadline
    }

    pub fn time_remaining(&self) -> u32 {
        self.time_remaining
    }

    pub fn turn(&self) -> TurnState {
        self.turn
    }

    pub fn transcript(&self) -> &TranscriptLog {
        &self.transcript
    }

    pub fn feedback(&self) -> &FeedbackLedger {
        &self.feedback
    }

    pub fn result(&self) -> Option<&FinalResult> {
        self.result.as_ref()
    }

    pub fn capture_supported(&self) -> bool {
        !self.capture_unsupported && self.capture.is_supported()
    }

    /// True once the result has been announced or the session torn down.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Leave `Loading`: welcome the audience, start the countdown and queue
    /// the opening statement. Does nothing outside `Loading`.
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Loading {
            return Ok(());
        }

        if !self.capture.is_supported() {
            self.capture_unsupported = true;
            self.raise(SessionWarning::UnsupportedEnvironment);
        }

        let welcome = render_template(
            &self.moderator.welcome,
            &[("topic", self.topic.title.as_str())],
        );
        let begin = self.moderator.begin.clone();
        self.append(Speaker::Moderator, welcome)?;
        self.append(Speaker::Moderator, begin)?;

        let duration = self.timing.duration_secs;
        self.phase = Phase::Active;
        self.time_remaining = duration;
        self.deadline = Some(Utc::now() + chrono::Duration::seconds(i64::from(duration)));
        info!(session = %self.id, duration_secs = duration, "debate started");
        self.emit(SessionSignal::PhaseChanged(Phase::Active));

        if duration == 0 {
            self.end_debate(EndReason::TimeExpired);
            return Ok(());
        }

        self.clock.start();
        self.scheduler
            .schedule(self.timing.opening_delay(), ScheduledTask::OpeningStatement);
        Ok(())
    }

    /// Start the session and process events until the result is ready or
    /// the session is torn down.
    pub async fn run(&mut self) -> Result<Option<FinalResult>, SessionError> {
        self.start()?;
        while self.step().await {}
        self.teardown();
        Ok(self.result.clone())
    }

    /// Wait for and handle the next clock tick or queued event. Returns
    /// false once the session is finished.
    pub async fn step(&mut self) -> bool {
        if self.finished {
            return false;
        }

        let ticking = self.clock.is_running();
        let next = tokio::select! {
            _ = self.clock.tick(), if ticking => Next::Tick,
            event = self.inbox.recv() => Next::Event(event),
        };

        match next {
            Next::Tick => self.on_tick(),
            Next::Event(Some(event)) => self.dispatch(event).await,
            Next::Event(None) => self.finished = true,
        }
        !self.finished
    }

    /// Handle one queued event.
    pub async fn dispatch(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::StartCapture => {
                if let Err(e) = self.start_capture() {
                    debug!(error = %e, "capture not started");
                }
            }
            SessionEvent::StopCapture => self.stop_capture(),
            SessionEvent::EndRequested => {
                if let Err(e) = self.end_now() {
                    debug!(error = %e, "end request ignored");
                }
            }
            SessionEvent::Teardown => self.teardown(),
            SessionEvent::Capture(event) => self.on_capture(event),
            SessionEvent::Voice(event) => self.on_voice(event),
            SessionEvent::Scheduled { epoch, task } => {
                if self.scheduler.is_current(epoch) {
                    self.run_task(task).await;
                } else {
                    debug!(?task, epoch, "dropping stale task");
                }
            }
        }
    }

    /// The human takes the floor, cutting off the opponent if it is speaking.
    pub fn start_capture(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotActive);
        }
        if self.turn.human_capturing() {
            return Ok(());
        }
        if self.capture_unsupported {
            return Err(SessionError::UnsupportedEnvironment);
        }

        if let Err(e) = self.capture.start() {
            match &e {
                CaptureError::PermissionDenied => self.raise(SessionWarning::PermissionDenied),
                CaptureError::Unsupported => self.raise(SessionWarning::UnsupportedEnvironment),
                CaptureError::Provider(msg) => {
                    self.raise(SessionWarning::CaptureFailure(msg.clone()))
                }
            }
            return Err(e.into());
        }

        if let Floor::Opponent(utterance) = self.turn.floor {
            self.voice.interrupt();
            self.turn.opponent_interrupted = true;
            self.turn.voice_loading = false;
            info!(utterance, "human barged in on the opponent");
        }
        self.turn.floor = Floor::Human;
        self.emit(SessionSignal::Turn(self.turn));
        Ok(())
    }

    /// The human releases the floor. No-op when not capturing.
    pub fn stop_capture(&mut self) {
        if !self.turn.human_capturing() {
            return;
        }
        self.capture.stop();
        self.turn.floor = Floor::Open;
        self.emit(SessionSignal::Turn(self.turn));
    }

    /// Confirmed early end of the debate.
    pub fn end_now(&mut self) -> Result<(), SessionError> {
        if self.phase != Phase::Active {
            return Err(SessionError::NotActive);
        }
        self.end_debate(EndReason::Requested);
        Ok(())
    }

    /// Release both adapters, stop the clock and cancel all pending work.
    /// Safe to call repeatedly.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.finished = true;

        self.clock.stop();
        self.scheduler.cancel_all();
        self.capture.stop();
        self.voice.interrupt();
        self.turn.floor = Floor::Open;
        self.turn.voice_loading = false;
        info!(session = %self.id, phase = ?self.phase, "session torn down");
    }

    fn on_tick(&mut self) {
        if self.phase != Phase::Active {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(1);
        self.emit(SessionSignal::Tick {
            remaining: self.time_remaining,
        });

        if self.time_remaining == 0 {
            self.end_debate(EndReason::TimeExpired);
        }
    }

    fn on_capture(&mut self, event: CaptureEvent) {
        match event {
            // Interim hypotheses are never recorded.
            CaptureEvent::Partial(text) => debug!(chars = text.len(), "partial transcription"),
            CaptureEvent::Final(text) => self.on_utterance(text),
            CaptureEvent::Failed(message) => {
                warn!(error = %message, "speech capture failed");
                if self.turn.human_capturing() {
                    self.capture.stop();
                    self.turn.floor = Floor::Open;
                    self.emit(SessionSignal::Turn(self.turn));
                }
                self.raise(SessionWarning::CaptureFailure(message));
            }
        }
    }

    fn on_utterance(&mut self, text: String) {
        if self.phase != Phase::Active {
            debug!("utterance arrived after the debate ended");
            return;
        }
        if text.trim().is_empty() {
            debug!("ignoring empty utterance");
            return;
        }
        if let Err(e) = self.append(Speaker::Human, text.clone()) {
            error!(error = %e, "failed to record utterance");
            return;
        }

        if self.commentary.should_comment() {
            self.scheduler.schedule(
                self.timing.commentary_delay(),
                ScheduledTask::Commentary { utterance: text },
            );
        }
        self.scheduler
            .schedule(self.timing.reply_delay(), ScheduledTask::OpponentReply);
    }

    fn on_voice(&mut self, event: VoiceEvent) {
        let (utterance, failure) = match event {
            VoiceEvent::Completed(id) => (id, None),
            VoiceEvent::Failed { utterance, message } => (utterance, Some(message)),
        };

        if !self.voice.settle(utterance) {
            debug!(utterance, "ignoring event for a finished utterance");
            return;
        }
        if self.turn.floor == Floor::Opponent(utterance) {
            self.turn.floor = Floor::Open;
            self.turn.voice_loading = false;
            self.emit(SessionSignal::Turn(self.turn));
        }
        if let Some(message) = failure {
            self.raise(SessionWarning::VoiceFailure(message));
        }
    }

    async fn run_task(&mut self, task: ScheduledTask) {
        match task {
            ScheduledTask::Evaluate => self.evaluate().await,
            ScheduledTask::ResultReady => self.announce_result(),
            _ if self.phase != Phase::Active => {
                debug!(?task, "debate no longer active");
            }
            ScheduledTask::OpeningStatement => {
                let opening = self.opening_statement.clone();
                self.deliver_opponent(opening);
            }
            ScheduledTask::Commentary { utterance } => self.comment_on(&utterance),
            ScheduledTask::OpponentReply => self.request_opponent_turn(),
            ScheduledTask::OpponentArgument { text } => self.deliver_opponent(text),
        }
    }

    fn comment_on(&mut self, utterance: &str) {
        let remark = self.moderator.commentary.clone();
        if let Err(e) = self.append(Speaker::Moderator, remark) {
            error!(error = %e, "failed to record commentary");
            return;
        }
        let entry = self.evaluator.evaluate(Side::Human, utterance);
        self.record_feedback(entry);
    }

    /// Ask the generator for the opponent's next argument in the background.
    fn request_opponent_turn(&mut self) {
        self.turn.voice_loading = true;
        self.emit(SessionSignal::Turn(self.turn));

        let context = DebateContext {
            topic: self.topic.clone(),
            participants: self.participants.clone(),
            opponent_turns: self.opponent_turns,
            history: self.transcript.all().to_vec(),
        };
        let generator = Arc::clone(&self.generator);

        self.scheduler.spawn(async move {
            let mut text = generator.next(&context).await;
            if text.trim().is_empty() {
                text = FALLBACK_REBUTTAL.to_string();
            }
            ScheduledTask::OpponentArgument { text }
        });
    }

    /// Record, voice and score one opponent utterance.
    fn deliver_opponent(&mut self, text: String) {
        if let Err(e) = self.append(Speaker::Opponent, text.clone()) {
            error!(error = %e, "failed to record opponent argument");
            self.turn.voice_loading = false;
            return;
        }
        self.opponent_turns += 1;

        if self.turn.human_capturing() {
            // Playback never takes the floor from a live microphone.
            debug!("human holds the floor, opponent argument recorded without voice");
            self.turn.voice_loading = false;
        } else {
            let utterance = self.voice.speak(&text);
            self.turn.floor = Floor::Opponent(utterance);
            self.turn.opponent_interrupted = false;
            self.turn.voice_loading = true;
        }
        self.emit(SessionSignal::Turn(self.turn));

        let entry = self.evaluator.evaluate(Side::Opponent, &text);
        self.record_feedback(entry);
    }

    /// Hard stop: everything live is cut off and pending work is dropped
    /// before the moderator starts evaluating.
    fn end_debate(&mut self, reason: EndReason) {
        if self.phase == Phase::Ended {
            return;
        }
        self.phase = Phase::Ended;
        info!(session = %self.id, ?reason, remaining = self.time_remaining, "debate ended");

        self.clock.stop();
        self.scheduler.cancel_all();
        self.capture.stop();
        self.voice.interrupt();
        self.turn.floor = Floor::Open;
        self.turn.voice_loading = false;

        self.emit(SessionSignal::PhaseChanged(Phase::Ended));
        self.emit(SessionSignal::Turn(self.turn));

        let evaluating = self.moderator.evaluating.clone();
        if let Err(e) = self.append(Speaker::Moderator, evaluating) {
            error!(error = %e, "failed to record evaluation notice");
        }
        self.scheduler
            .schedule(self.timing.evaluation_delay(), ScheduledTask::Evaluate);
    }

    async fn evaluate(&mut self) {
        if self.result.is_some() {
            return;
        }

        let result = FinalResult::from_ledger(self.id, &self.topic.title, &self.feedback);
        let human_score = format!("{:.1}", result.human_score);
        let opponent_score = format!("{:.1}", result.opponent_score);
        let verdict = render_template(
            &self.moderator.verdict,
            &[
                ("human", self.participants.human.name.as_str()),
                ("opponent", self.participants.opponent.name.as_str()),
                ("human_score", human_score.as_str()),
                ("opponent_score", opponent_score.as_str()),
                ("winner", self.participants.get(result.winner).name.as_str()),
            ],
        );
        if let Err(e) = self.append(Speaker::Moderator, verdict) {
            error!(error = %e, "failed to record verdict");
        }
        info!(
            session = %self.id,
            human_score = result.human_score,
            opponent_score = result.opponent_score,
            winner = result.winner.display_name(),
            "debate evaluated"
        );
        self.result = Some(result.clone());

        if let Err(e) = self.reporter.save(&result).await {
            self.raise(SessionWarning::ReportingFailure(e.to_string()));
        }

        self.scheduler
            .schedule(self.timing.result_ready_delay(), ScheduledTask::ResultReady);
    }

    fn announce_result(&mut self) {
        if self.result_announced {
            return;
        }
        if let Some(result) = self.result.clone() {
            self.result_announced = true;
            self.finished = true;
            self.emit(SessionSignal::ResultReady(result));
        }
    }

    fn append(&mut self, speaker: Speaker, text: String) -> Result<(), SessionError> {
        let entry = self.transcript.append(speaker, text)?.clone();
        debug!(sequence = entry.sequence, speaker = speaker.display_name(), "transcript entry");
        self.emit(SessionSignal::Transcript(entry));
        Ok(())
    }

    fn record_feedback(&mut self, entry: FeedbackEntry) {
        self.feedback.record(entry.clone());
        self.emit(SessionSignal::Feedback(entry));
    }

    fn raise(&self, warning: SessionWarning) {
        warn!(session = %self.id, "{}", warning);
        self.emit(SessionSignal::Warning(warning));
    }

    /// Emit a signal if a callback is registered.
    fn emit(&self, signal: SessionSignal) {
        if let Some(ref callback) = self.callback {
            callback(signal);
        }
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turn_state_views() {
        let mut turn = TurnState::default();
        assert_eq!(turn.speaker(), None);
        assert!(!turn.human_capturing());
        assert!(!turn.opponent_speaking());

        turn.floor = Floor::Human;
        assert_eq!(turn.speaker(), Some(Side::Human));
        assert!(turn.human_capturing());
        assert!(!turn.opponent_speaking());

        turn.floor = Floor::Opponent(3);
        assert_eq!(turn.speaker(), Some(Side::Opponent));
        assert!(!turn.human_capturing());
        assert!(turn.opponent_speaking());
    }

    #[test]
    fn test_builder_starts_in_loading() {
        let session = SessionController::builder(Config::default()).build().unwrap();
        assert_eq!(session.phase(), Phase::Loading);
        assert_eq!(session.time_remaining(), 300);
        assert!(session.transcript().is_empty());
        assert!(session.deadline().is_none());
    }

    #[test]
    fn test_builder_rejects_blank_moderator_line() {
        let mut config = Config::default();
        config.moderator.welcome = "   ".to_string();
        assert!(matches!(
            SessionController::builder(config).build(),
            Err(SessionError::ConfigError(_))
        ));
    }

    #[test]
    fn test_capture_rejected_before_start() {
        let mut session = SessionController::builder(Config::default()).build().unwrap();
        assert!(matches!(
            session.start_capture(),
            Err(SessionError::NotActive)
        ));
        assert!(matches!(session.end_now(), Err(SessionError::NotActive)));
    }
}
