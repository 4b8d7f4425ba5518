//! Stream driver for a single job's progress feed.
//!
//! Owns the read loop: bytes -> lines -> stage updates -> session
//! transitions. Only two things ever leave the driver: `on_update` calls for
//! accepted progress, and exactly one `on_terminal` call carrying the
//! session's outcome. Parse problems and transport failures are absorbed
//! here.

use std::pin::Pin;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use serde::Serialize;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::FeedConfig;
use crate::error::StreamError;
use crate::feed::{FeedParser, FrameDecoder, StageUpdate};
use crate::session::{SessionSnapshot, StreamSession, TerminalOutcome, Transition};

/// Failure reason used when the feed closes before a terminal event.
pub const STREAM_ENDED_REASON: &str = "stream ended without a terminal event";

/// Boxed byte stream as produced by a job submitter.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StreamError>> + Send>>;

/// Summary of a finished (or abandoned) run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeedReport {
    pub session_id: Uuid,
    /// `None` only when the session was abandoned before a terminal event
    pub outcome: Option<TerminalOutcome>,
    /// Number of `on_update` calls made
    pub updates_applied: u64,
    /// Event lines dropped as malformed or untrusted
    pub parse_errors: u64,
    /// Non-event lines skipped (comments, keep-alives, unknown fields)
    pub ignored_lines: u64,
    /// Completion/failure events that arrived after the session was terminal
    pub late_terminal_events: u64,
    /// Run stopped through cancellation
    pub abandoned: bool,
}

enum ReadOutcome<B> {
    Chunk(B),
    End,
    Failed(StreamError),
}

/// Drives one session from a byte stream to its terminal outcome.
///
/// # Example
///
/// ```
/// use jobfeed::driver::StreamDriver;
/// use jobfeed::error::StreamError;
/// use jobfeed::session::TerminalOutcome;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let chunks = vec![
///     Ok::<_, StreamError>(&b"data: {\"stage\":\"setup\",\"message\":\"Starting\",\"progress\":5}\n"[..]),
///     Ok(&b"data: {\"stage\":\"complete\",\"message\":\"Done\",\"progress\":100,\"data\":{}}\n"[..]),
/// ];
/// let mut result = None;
/// let report = StreamDriver::new()
///     .run(futures::stream::iter(chunks), |_| {}, |outcome| result = Some(outcome))
///     .await;
/// assert_eq!(report.updates_applied, 1);
/// assert!(matches!(result, Some(TerminalOutcome::Completed(_))));
/// # });
/// ```
pub struct StreamDriver {
    session: StreamSession,
    decoder: FrameDecoder,
    parser: FeedParser,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    cancel: Option<CancellationToken>,
    idle_timeout: Option<Duration>,
    updates_applied: u64,
    parse_errors: u64,
    late_terminal_events: u64,
}

impl Default for StreamDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamDriver {
    /// Create a driver with a fresh session.
    pub fn new() -> Self {
        Self::with_session(StreamSession::new())
    }

    /// Create a driver around an existing (normally fresh) session.
    pub fn with_session(session: StreamSession) -> Self {
        let (snapshot_tx, _) = watch::channel(session.snapshot());
        Self {
            session,
            decoder: FrameDecoder::new(),
            parser: FeedParser::new(),
            snapshot_tx,
            cancel: None,
            idle_timeout: None,
            updates_applied: 0,
            parse_errors: 0,
            late_terminal_events: 0,
        }
    }

    /// Create a driver using the timeouts from `config`.
    pub fn from_config(config: &FeedConfig) -> Self {
        Self::new().with_idle_timeout(config.idle_timeout)
    }

    /// Stop the run, without further callbacks, once `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Treat a silence longer than `timeout` between chunks as a lost stream.
    pub fn with_idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.idle_timeout = timeout;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session.id()
    }

    /// Watch the session snapshot. Updated on every accepted transition,
    /// terminal ones included.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot_tx.subscribe()
    }

    /// Consume `stream` until it ends, fails, or is cancelled.
    ///
    /// `on_update` fires for each accepted non-terminal update.
    /// `on_terminal` fires exactly once unless the run is abandoned first;
    /// a stream that ends or errors without a terminal event resolves as
    /// `Failed`. After the terminal event the rest of the stream is drained
    /// and ignored.
    pub async fn run<S, B, E, U, T>(
        mut self,
        stream: S,
        mut on_update: U,
        on_terminal: T,
    ) -> FeedReport
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Into<StreamError>,
        U: FnMut(&SessionSnapshot),
        T: FnOnce(TerminalOutcome),
    {
        let span = tracing::info_span!("feed_session", session_id = %self.session.id());
        async move {
            let cancel = self.cancel.clone();
            let idle_timeout = self.idle_timeout;
            let mut on_terminal = Some(on_terminal);
            futures::pin_mut!(stream);

            loop {
                let read = tokio::select! {
                    biased;
                    _ = wait_cancelled(cancel.as_ref()) => {
                        tracing::info!("Session abandoned by caller");
                        return self.report(true);
                    }
                    read = read_next(&mut stream, idle_timeout) => read,
                };

                match read {
                    ReadOutcome::Chunk(chunk) => {
                        for line in self.decoder.push(chunk.as_ref()) {
                            if self.is_cancelled() {
                                tracing::info!("Session abandoned by caller");
                                return self.report(true);
                            }
                            self.handle_line(&line, &mut on_update, &mut on_terminal);
                        }
                    }
                    ReadOutcome::End => {
                        self.flush(&mut on_update, &mut on_terminal);
                        if !self.session.is_terminal() {
                            tracing::warn!("{}", STREAM_ENDED_REASON);
                        }
                        self.fail_if_open(STREAM_ENDED_REASON.to_string(), &mut on_terminal);
                        break;
                    }
                    ReadOutcome::Failed(err) => {
                        if self.session.is_terminal() {
                            tracing::debug!("Read failed after terminal event: {}", err);
                            break;
                        }
                        tracing::error!(code = err.error_code(), "Feed read failed: {}", err);
                        self.flush(&mut on_update, &mut on_terminal);
                        let reason = format!("{}: {}", STREAM_ENDED_REASON, err);
                        self.fail_if_open(reason, &mut on_terminal);
                        break;
                    }
                }
            }

            self.report(false)
        }
        .instrument(span)
        .await
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|token| token.is_cancelled())
    }

    fn handle_line<U, T>(&mut self, line: &str, on_update: &mut U, on_terminal: &mut Option<T>)
    where
        U: FnMut(&SessionSnapshot),
        T: FnOnce(TerminalOutcome),
    {
        match self.parser.feed_line(line) {
            Ok(Some(update)) => self.apply(update, on_update, on_terminal),
            Ok(None) => {}
            Err(err) => {
                self.parse_errors += 1;
                tracing::warn!(code = err.error_code(), "Dropping feed line: {}", err);
            }
        }
    }

    fn apply<U, T>(&mut self, update: StageUpdate, on_update: &mut U, on_terminal: &mut Option<T>)
    where
        U: FnMut(&SessionSnapshot),
        T: FnOnce(TerminalOutcome),
    {
        tracing::debug!(stage = %update.stage, progress = update.progress, "Stage update");
        match self.session.apply(update) {
            Transition::Progressed => {
                self.updates_applied += 1;
                let snapshot = self.session.snapshot();
                self.snapshot_tx.send_replace(snapshot.clone());
                on_update(&snapshot);
            }
            Transition::Terminated(outcome) => self.resolve(outcome, on_terminal),
            Transition::Ignored { late_terminal: true } => {
                self.late_terminal_events += 1;
                tracing::warn!("Terminal event received after session already terminal");
            }
            Transition::Ignored { late_terminal: false } => {
                tracing::debug!("Ignoring progress update after session already terminal");
            }
        }
    }

    fn flush<U, T>(&mut self, on_update: &mut U, on_terminal: &mut Option<T>)
    where
        U: FnMut(&SessionSnapshot),
        T: FnOnce(TerminalOutcome),
    {
        if let Some(line) = self.decoder.finish() {
            self.handle_line(&line, on_update, on_terminal);
        }
    }

    fn fail_if_open<T>(&mut self, reason: String, on_terminal: &mut Option<T>)
    where
        T: FnOnce(TerminalOutcome),
    {
        if self.session.is_terminal() {
            return;
        }
        if let Transition::Terminated(outcome) = self.session.fail(reason) {
            self.resolve(outcome, on_terminal);
        }
    }

    fn resolve<T>(&mut self, outcome: TerminalOutcome, on_terminal: &mut Option<T>)
    where
        T: FnOnce(TerminalOutcome),
    {
        self.snapshot_tx.send_replace(self.session.snapshot());
        match &outcome {
            TerminalOutcome::Completed(_) => tracing::info!("Session completed"),
            TerminalOutcome::Failed(reason) => tracing::info!("Session failed: {}", reason),
        }
        if let Some(callback) = on_terminal.take() {
            callback(outcome);
        }
    }

    fn report(&self, abandoned: bool) -> FeedReport {
        FeedReport {
            session_id: self.session.id(),
            outcome: self.session.outcome().cloned(),
            updates_applied: self.updates_applied,
            parse_errors: self.parse_errors,
            ignored_lines: self.parser.ignored_lines(),
            late_terminal_events: self.late_terminal_events,
            abandoned,
        }
    }
}

async fn wait_cancelled(token: Option<&CancellationToken>) {
    match token {
        Some(token) => token.cancelled().await,
        None => std::future::pending().await,
    }
}

async fn read_next<S, B, E>(stream: &mut S, idle_timeout: Option<Duration>) -> ReadOutcome<B>
where
    S: Stream<Item = Result<B, E>> + Unpin,
    E: Into<StreamError>,
{
    let next = match idle_timeout {
        Some(window) => match tokio::time::timeout(window, stream.next()).await {
            Ok(next) => next,
            Err(_) => return ReadOutcome::Failed(StreamError::idle_timeout(window)),
        },
        None => stream.next().await,
    };

    match next {
        Some(Ok(chunk)) => ReadOutcome::Chunk(chunk),
        Some(Err(err)) => ReadOutcome::Failed(err.into()),
        None => ReadOutcome::End,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::SessionPhase;
    use futures::stream;
    use serde_json::json;
    use std::cell::RefCell;

    type Chunk = Result<&'static [u8], StreamError>;

    fn ok(bytes: &'static [u8]) -> Chunk {
        Ok(bytes)
    }

    struct Recorded {
        updates: Vec<SessionSnapshot>,
        terminals: Vec<TerminalOutcome>,
        report: FeedReport,
    }

    async fn drive(chunks: Vec<Chunk>) -> Recorded {
        let updates = RefCell::new(Vec::new());
        let terminals = RefCell::new(Vec::new());
        let report = StreamDriver::new()
            .run(
                stream::iter(chunks),
                |snapshot| updates.borrow_mut().push(snapshot.clone()),
                |outcome| terminals.borrow_mut().push(outcome),
            )
            .await;
        Recorded {
            updates: updates.into_inner(),
            terminals: terminals.into_inner(),
            report,
        }
    }

    #[tokio::test]
    async fn test_progress_then_completion() {
        let recorded = drive(vec![
            ok(b"data: {\"stage\":\"setup\",\"message\":\"Starting\",\"progress\":5}\n"),
            ok(b"data: {\"stage\":\"complete\",\"message\":\"Done\",\"progress\":100,\"data\":{\"id\":1}}\n"),
        ])
        .await;

        assert_eq!(recorded.updates.len(), 1);
        assert_eq!(recorded.updates[0].stage, "setup");
        assert_eq!(recorded.updates[0].progress, 5);
        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Completed(json!({"id": 1}))]
        );
        assert_eq!(recorded.report.updates_applied, 1);
        assert!(!recorded.report.abandoned);
    }

    #[tokio::test]
    async fn test_empty_stream_fails() {
        let recorded = drive(vec![]).await;
        assert!(recorded.updates.is_empty());
        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Failed(STREAM_ENDED_REASON.to_string())]
        );
    }

    #[tokio::test]
    async fn test_unterminated_final_line_is_salvaged() {
        let recorded = drive(vec![ok(
            b"data: {\"stage\":\"error\",\"message\":\"Error: x\",\"error\":\"x\"}",
        )])
        .await;
        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Failed("x".to_string())]
        );
    }

    #[tokio::test]
    async fn test_transport_error_fails_session() {
        let recorded = drive(vec![
            ok(b"data: {\"stage\":\"generating\",\"message\":\"Writing\",\"progress\":10}\n"),
            Err(StreamError::ConnectionLost {
                message: "reset".to_string(),
            }),
        ])
        .await;

        assert_eq!(recorded.updates.len(), 1);
        assert_eq!(recorded.terminals.len(), 1);
        let reason = recorded.terminals[0].reason().unwrap();
        assert!(reason.starts_with(STREAM_ENDED_REASON));
        assert!(reason.contains("reset"));
    }

    #[tokio::test]
    async fn test_second_terminal_is_ignored_and_counted() {
        let recorded = drive(vec![
            ok(b"data: {\"stage\":\"complete\",\"message\":\"Done\",\"data\":{\"ok\":true}}\n"),
            ok(b"data: {\"stage\":\"error\",\"message\":\"Error\",\"error\":\"late\"}\n"),
            ok(b"data: {\"stage\":\"saving\",\"message\":\"late progress\",\"progress\":90}\n"),
        ])
        .await;

        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Completed(json!({"ok": true}))]
        );
        assert!(recorded.updates.is_empty());
        assert_eq!(recorded.report.late_terminal_events, 1);
    }

    #[tokio::test]
    async fn test_error_after_terminal_does_not_refire() {
        let recorded = drive(vec![
            ok(b"data: {\"stage\":\"error\",\"message\":\"Error\",\"error\":\"boom\"}\n"),
            Err(StreamError::Other {
                message: "closed".to_string(),
            }),
        ])
        .await;
        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Failed("boom".to_string())]
        );
    }

    #[tokio::test]
    async fn test_soft_errors_are_counted() {
        let recorded = drive(vec![
            ok(b": keep-alive\n\n"),
            ok(b"data: {not valid json}\n"),
            ok(b"data: {\"stage\":\"complete\",\"message\":\"Done\"}\n"),
        ])
        .await;

        assert_eq!(recorded.report.parse_errors, 2);
        assert_eq!(recorded.report.ignored_lines, 1);
        assert_eq!(
            recorded.terminals,
            vec![TerminalOutcome::Failed(STREAM_ENDED_REASON.to_string())]
        );
    }

    #[tokio::test]
    async fn test_subscribe_sees_terminal_snapshot() {
        let driver = StreamDriver::new();
        let rx = driver.subscribe();
        assert_eq!(rx.borrow().phase, SessionPhase::Pending);

        driver
            .run(
                stream::iter(vec![Ok::<_, StreamError>(
                    &b"data: {\"stage\":\"complete\",\"message\":\"Done\",\"progress\":100,\"data\":{}}\n"[..],
                )]),
                |_| {},
                |_| {},
            )
            .await;

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.phase, SessionPhase::Completed);
        assert_eq!(snapshot.progress, 100);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_makes_no_callbacks() {
        let token = CancellationToken::new();
        token.cancel();
        let mut calls = 0;
        let report = StreamDriver::new()
            .with_cancellation(token)
            .run(
                stream::iter(vec![Ok::<_, StreamError>(
                    &b"data: {\"stage\":\"setup\",\"message\":\"s\"}\n"[..],
                )]),
                |_| calls += 1,
                |_| panic!("terminal callback after abandonment"),
            )
            .await;
        assert_eq!(calls, 0);
        assert!(report.abandoned);
        assert!(report.outcome.is_none());
    }

    #[tokio::test]
    async fn test_cancel_from_update_callback_stops_remaining_lines() {
        let token = CancellationToken::new();
        let canceller = token.clone();
        let mut updates = 0;
        let report = StreamDriver::new()
            .with_cancellation(token)
            .run(
                stream::iter(vec![Ok::<_, StreamError>(
                    &b"data: {\"stage\":\"setup\",\"message\":\"a\"}\ndata: {\"stage\":\"generating\",\"message\":\"b\"}\n"[..],
                )]),
                |_| {
                    updates += 1;
                    canceller.cancel();
                },
                |_| panic!("terminal callback after abandonment"),
            )
            .await;
        assert_eq!(updates, 1);
        assert!(report.abandoned);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_fails_session() {
        let first = stream::iter(vec![Ok::<_, StreamError>(
            &b"data: {\"stage\":\"setup\",\"message\":\"s\",\"progress\":5}\n"[..],
        )]);
        let silent = first.chain(stream::pending());

        let mut outcome = None;
        let report = StreamDriver::new()
            .with_idle_timeout(Some(Duration::from_secs(30)))
            .run(silent, |_| {}, |o| outcome = Some(o))
            .await;

        let reason = outcome.unwrap().reason().unwrap().to_string();
        assert!(reason.contains("timeout after 30 seconds"));
        assert_eq!(report.updates_applied, 1);
    }
}
