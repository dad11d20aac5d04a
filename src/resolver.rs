//! Obtaining answers for questions nothing in memory could answer
//!
//! Free-text questions go to an interactive line prompt. Binary and
//! single-choice questions are answered by watching the form itself: the
//! resolver polls an observed UI value until the operator has made a choice.
//! Every wait, the free-text prompt included, is bounded by the operator
//! timeout and can be cancelled. A cancelled resolver stays cancelled until
//! [`Resolver::reset`] is called.

use crate::error::{AnswerError, Result};
use crate::store::AnswerStore;
use crate::types::BinaryAnswer;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Placeholder a dropdown shows before anything is selected
pub const DEFAULT_CHOICE_PLACEHOLDER: &str = "Select an option";

/// Line-oriented channel to the operator
#[async_trait]
pub trait OperatorPrompt: Send {
    /// Ask for an answer to `question`; returns the trimmed reply
    async fn ask(&mut self, question: &str) -> Result<String>;
}

/// Observed state of a Yes/No control
#[async_trait]
pub trait BinaryProbe: Send + Sync {
    /// `None` while neither option is selected or the state is unreadable
    async fn observe(&self) -> Result<Option<BinaryAnswer>>;
}

/// Observed value of a dropdown
#[async_trait]
pub trait ChoiceProbe: Send + Sync {
    /// Currently displayed value, placeholder included; `None` if unavailable
    async fn selected(&self) -> Result<Option<String>>;
}

/// Prompt over any async line reader and writer
pub struct LinePrompt<R, W> {
    reader: R,
    writer: W,
}

impl LinePrompt<BufReader<tokio::io::Stdin>, tokio::io::Stdout> {
    /// Prompt on the process terminal
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LinePrompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }
}

#[async_trait]
impl<R, W> OperatorPrompt for LinePrompt<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn ask(&mut self, question: &str) -> Result<String> {
        self.writer
            .write_all(format!("Answer for \"{question}\": ").as_bytes())
            .await?;
        self.writer.flush().await?;

        let mut line = String::new();
        if self.reader.read_line(&mut line).await? == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input closed before an answer was given",
            )
            .into());
        }
        Ok(line.trim().to_string())
    }
}

/// Latest observed UI value, published by whoever watches the form
#[derive(Debug, Clone)]
pub struct WatchedSelection {
    current: watch::Receiver<Option<String>>,
}

impl WatchedSelection {
    /// Create a selection and the sender used to publish observed values
    pub fn channel() -> (watch::Sender<Option<String>>, Self) {
        let (tx, rx) = watch::channel(None);
        (tx, Self { current: rx })
    }

    pub fn new(current: watch::Receiver<Option<String>>) -> Self {
        Self { current }
    }

    fn current(&self) -> Option<String> {
        self.current.borrow().clone()
    }
}

#[async_trait]
impl BinaryProbe for WatchedSelection {
    async fn observe(&self) -> Result<Option<BinaryAnswer>> {
        Ok(self.current().and_then(|v| v.parse().ok()))
    }
}

#[async_trait]
impl ChoiceProbe for WatchedSelection {
    async fn selected(&self) -> Result<Option<String>> {
        Ok(self.current())
    }
}

/// Resolver configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Poll interval for Yes/No controls
    pub binary_poll_interval_ms: u64,
    /// Poll interval for dropdowns
    pub choice_poll_interval_ms: u64,
    /// Longest wait for the operator; `None` waits forever
    pub operator_timeout_ms: Option<u64>,
    /// Dropdown value meaning "nothing selected"
    pub choice_placeholder: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            binary_poll_interval_ms: 1_000,
            choice_poll_interval_ms: 500,
            operator_timeout_ms: Some(300_000),
            choice_placeholder: DEFAULT_CHOICE_PLACEHOLDER.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn binary_poll_interval(&self) -> Duration {
        Duration::from_millis(self.binary_poll_interval_ms.max(1))
    }

    pub fn choice_poll_interval(&self) -> Duration {
        Duration::from_millis(self.choice_poll_interval_ms.max(1))
    }

    pub fn operator_timeout(&self) -> Option<Duration> {
        self.operator_timeout_ms.map(Duration::from_millis)
    }
}

/// Configuration builder
#[derive(Debug, Default)]
pub struct ResolverConfigBuilder {
    config: ResolverConfig,
}

impl ResolverConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn binary_poll_interval(mut self, interval: Duration) -> Self {
        self.config.binary_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn choice_poll_interval(mut self, interval: Duration) -> Self {
        self.config.choice_poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn operator_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.operator_timeout_ms = timeout.map(|t| t.as_millis() as u64);
        self
    }

    pub fn choice_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.config.choice_placeholder = placeholder.into();
        self
    }

    pub fn build(self) -> ResolverConfig {
        self.config
    }
}

/// Obtains and persists answers for unmatched questions
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    config: ResolverConfig,
    cancel: CancellationToken,
}

impl Resolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self {
            config,
            cancel: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Token that aborts any pending prompt or poll when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Replace a cancelled token so later calls wait again. Tokens handed
    /// out before the reset stay bound to the old one.
    pub fn reset(&mut self) {
        if self.cancel.is_cancelled() {
            debug!("Resetting cancelled resolver");
            self.cancel = CancellationToken::new();
        }
    }

    /// Ask the operator and store the reply
    pub async fn resolve_free_text(
        &self,
        question: &str,
        store: &mut AnswerStore,
        prompt: &mut dyn OperatorPrompt,
    ) -> Result<String> {
        info!(question, "No sufficiently similar question found, asking the operator");

        let wait = async {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    Err(AnswerError::Cancelled { question: question.to_string() })
                }
                answer = prompt.ask(question) => answer,
            }
        };
        let answer = self.bounded(question, wait).await?;

        store.put(question, answer.clone())?;
        Ok(answer)
    }

    /// Wait for a Yes/No selection and store it
    pub async fn resolve_binary(
        &self,
        question: &str,
        store: &mut AnswerStore,
        probe: &dyn BinaryProbe,
    ) -> Result<BinaryAnswer> {
        info!(question, "Waiting for a Yes/No selection in the form");

        let answer = self
            .poll(question, self.config.binary_poll_interval(), || probe.observe())
            .await?;

        store.put(question, answer.as_str())?;
        Ok(answer)
    }

    /// Wait for the dropdown to leave its placeholder and store the value
    pub async fn resolve_choice(
        &self,
        question: &str,
        store: &mut AnswerStore,
        probe: &dyn ChoiceProbe,
    ) -> Result<String> {
        info!(question, "Waiting for a dropdown selection in the form");

        let placeholder = self.config.choice_placeholder.as_str();
        let answer = self
            .poll(question, self.config.choice_poll_interval(), || async move {
                Ok::<_, AnswerError>(
                    probe
                        .selected()
                        .await?
                        .map(|v| v.trim().to_string())
                        .filter(|v| !v.is_empty() && v != placeholder),
                )
            })
            .await?;

        store.put(question, answer.clone())?;
        Ok(answer)
    }

    /// Call `probe` every `every` until it yields a value, the operator
    /// timeout elapses or the resolver is cancelled
    async fn poll<T, F, Fut>(&self, question: &str, every: Duration, mut probe: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let wait = async {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = self.cancel.cancelled() => {
                        return Err(AnswerError::Cancelled { question: question.to_string() });
                    }
                    _ = ticker.tick() => {}
                }

                match probe().await {
                    Ok(Some(value)) => return Ok(value),
                    Ok(None) => debug!(question, "No selection yet"),
                    Err(e) => warn!(question, error = %e, "Could not read the selection state"),
                }
            }
        };

        self.bounded(question, wait).await
    }

    /// Apply the operator timeout, if any, to `wait`
    async fn bounded<T, Fut>(&self, question: &str, wait: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match self.config.operator_timeout() {
            Some(limit) => tokio::time::timeout(limit, wait).await.map_err(|_| {
                AnswerError::OperatorTimeout {
                    question: question.to_string(),
                    waited: limit,
                }
            })?,
            None => wait.await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Category;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn fast_resolver(timeout: Option<Duration>) -> Resolver {
        Resolver::new(
            ResolverConfigBuilder::new()
                .binary_poll_interval(Duration::from_millis(5))
                .choice_poll_interval(Duration::from_millis(5))
                .operator_timeout(timeout)
                .build(),
        )
    }

    fn store(dir: &tempfile::TempDir, category: Category) -> AnswerStore {
        let path = dir.path().join(category.default_file_name());
        if category.requires_existing_store() {
            std::fs::write(&path, "{}").unwrap();
        }
        AnswerStore::open(path, category).unwrap()
    }

    #[tokio::test]
    async fn test_line_prompt_trims_reply() {
        let reader = tokio_test::io::Builder::new().read(b"  3 \n").build();
        let writer = tokio_test::io::Builder::new()
            .write(b"Answer for \"Years with Go?\": ")
            .build();
        let mut prompt = LinePrompt::new(BufReader::new(reader), writer);

        assert_eq!(prompt.ask("Years with Go?").await.unwrap(), "3");
    }

    #[tokio::test]
    async fn test_line_prompt_eof_is_error() {
        let reader = tokio_test::io::Builder::new().build();
        let mut prompt = LinePrompt::new(BufReader::new(reader), tokio::io::sink());
        assert!(matches!(
            prompt.ask("Anything?").await.unwrap_err(),
            AnswerError::Io(_)
        ));
    }

    #[tokio::test]
    async fn test_free_text_answer_is_stored() {
        let dir = tempfile::tempdir().unwrap();
        let mut answers = store(&dir, Category::FreeText);
        let reader = tokio_test::io::Builder::new().read(b"3\n").build();
        let mut prompt = LinePrompt::new(BufReader::new(reader), tokio::io::sink());

        let answer = fast_resolver(None)
            .resolve_free_text("Years with Go?", &mut answers, &mut prompt)
            .await
            .unwrap();

        assert_eq!(answer, "3");
        assert_eq!(answers.get("Years with Go?"), Some("3"));
    }

    #[tokio::test]
    async fn test_binary_waits_for_selection() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = store(&dir, Category::Binary);
        let (tx, selection) = WatchedSelection::channel();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(Some("No".to_string())).ok();
            // keep the sender alive until the value is read
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let answer = fast_resolver(Some(Duration::from_secs(5)))
            .resolve_binary("Do you need sponsorship?", &mut binary, &selection)
            .await
            .unwrap();

        assert_eq!(answer, BinaryAnswer::No);
        assert_eq!(binary.get("Do you need sponsorship?"), Some("No"));
    }

    #[tokio::test]
    async fn test_choice_ignores_placeholder() {
        let dir = tempfile::tempdir().unwrap();
        let mut choices = store(&dir, Category::SingleChoice);
        let (tx, selection) = WatchedSelection::channel();
        tx.send(Some(DEFAULT_CHOICE_PLACEHOLDER.to_string())).unwrap();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            tx.send(Some("Master's".to_string())).ok();
            tokio::time::sleep(Duration::from_millis(200)).await;
        });

        let answer = fast_resolver(Some(Duration::from_secs(5)))
            .resolve_choice("Highest degree", &mut choices, &selection)
            .await
            .unwrap();

        assert_eq!(answer, "Master's");
        assert_eq!(choices.get("Highest degree"), Some("Master's"));
    }

    #[tokio::test]
    async fn test_poll_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut choices = store(&dir, Category::SingleChoice);
        let (tx, selection) = WatchedSelection::channel();
        tx.send(Some(DEFAULT_CHOICE_PLACEHOLDER.to_string())).unwrap();

        let err = fast_resolver(Some(Duration::from_millis(50)))
            .resolve_choice("Highest degree", &mut choices, &selection)
            .await
            .unwrap_err();

        assert!(matches!(err, AnswerError::OperatorTimeout { .. }));
        assert!(choices.is_empty());
        drop(tx);
    }

    #[tokio::test]
    async fn test_cancel_stops_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = store(&dir, Category::Binary);
        let (_tx, selection) = WatchedSelection::channel();

        let resolver = fast_resolver(None);
        let token = resolver.cancellation_token();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });

        let err = resolver
            .resolve_binary("Are you over 18?", &mut binary, &selection)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Cancelled { .. }));
    }

    #[tokio::test]
    async fn test_silent_operator_times_out() {
        let dir = tempfile::tempdir().unwrap();
        let mut answers = store(&dir, Category::FreeText);
        let reader = tokio_test::io::Builder::new()
            .wait(Duration::from_secs(5))
            .build();
        let mut prompt = LinePrompt::new(BufReader::new(reader), tokio::io::sink());

        let err = fast_resolver(Some(Duration::from_millis(50)))
            .resolve_free_text("Years with Go?", &mut answers, &mut prompt)
            .await
            .unwrap_err();

        assert!(matches!(err, AnswerError::OperatorTimeout { .. }));
        assert!(answers.is_empty());
    }

    #[tokio::test]
    async fn test_reset_after_cancel_resumes_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = store(&dir, Category::Binary);
        let (tx, selection) = WatchedSelection::channel();

        let mut resolver = fast_resolver(Some(Duration::from_secs(5)));
        resolver.cancel();
        let err = resolver
            .resolve_binary("Are you over 18?", &mut binary, &selection)
            .await
            .unwrap_err();
        assert!(matches!(err, AnswerError::Cancelled { .. }));

        resolver.reset();
        assert!(!resolver.is_cancelled());
        tx.send(Some("Yes".to_string())).unwrap();
        let answer = resolver
            .resolve_binary("Are you over 18?", &mut binary, &selection)
            .await
            .unwrap();
        assert_eq!(answer, BinaryAnswer::Yes);
    }

    struct FlakyProbe {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl BinaryProbe for FlakyProbe {
        async fn observe(&self) -> Result<Option<BinaryAnswer>> {
            match self.calls.fetch_add(1, Ordering::SeqCst) {
                0 => Err(AnswerError::Other(anyhow::anyhow!("control detached"))),
                1 => Ok(None),
                _ => Ok(Some(BinaryAnswer::Yes)),
            }
        }
    }

    #[tokio::test]
    async fn test_probe_errors_do_not_stop_polling() {
        let dir = tempfile::tempdir().unwrap();
        let mut binary = store(&dir, Category::Binary);
        let probe = FlakyProbe {
            calls: AtomicUsize::new(0),
        };

        let answer = fast_resolver(Some(Duration::from_secs(5)))
            .resolve_binary("Are you over 18?", &mut binary, &probe)
            .await
            .unwrap();

        assert_eq!(answer, BinaryAnswer::Yes);
        assert_eq!(probe.calls.load(Ordering::SeqCst), 3);
    }
}
