//! The evaluation harness: render, ask the judge once, interpret.

use futures::future::join_all;
use std::sync::Arc;

use arbiter_core::{
    metadata_keys, EvaluationRequest, EvaluationResponse, Evaluator, EvaluatorMode, HarnessConfig,
};

use crate::config::RuntimeConfig;
use crate::judge::JudgeModel;
use crate::providers::ProviderRegistry;
use crate::HarnessError;

/// Evaluates requests with an injected judge model.
///
/// # Guarantees
/// - Exactly one judge invocation per `evaluate` call, no retries here
/// - Judge failures are errors; they are never turned into `pass = false`
/// - No mutable state: concurrent calls need no coordination
#[derive(Clone)]
pub struct EvaluationHarness {
    evaluator: Evaluator,
    judge: Arc<dyn JudgeModel>,
}

impl EvaluationHarness {
    /// Validate `config` and bind it to `judge`.
    pub fn new(config: &HarnessConfig, judge: Arc<dyn JudgeModel>) -> Result<Self, HarnessError> {
        Ok(Self {
            evaluator: Evaluator::new(config)?,
            judge,
        })
    }

    /// Bind an already validated evaluator to `judge`.
    pub fn with_evaluator(evaluator: Evaluator, judge: Arc<dyn JudgeModel>) -> Self {
        Self { evaluator, judge }
    }

    /// Relevancy harness with default prompt and tokens.
    pub fn relevancy(judge: Arc<dyn JudgeModel>) -> Self {
        Self::with_evaluator(Evaluator::relevancy(), judge)
    }

    /// Fact-checking harness with default prompt and tokens.
    pub fn fact_checking(judge: Arc<dyn JudgeModel>) -> Self {
        Self::with_evaluator(Evaluator::fact_checking(), judge)
    }

    /// Build the harness and its judge stack from runtime configuration.
    pub fn from_runtime_config(
        config: &RuntimeConfig,
        registry: &ProviderRegistry,
    ) -> Result<Self, HarnessError> {
        let evaluator = Evaluator::new(&config.harness)?;
        let judge = config.build_judge(registry)?;
        Ok(Self::with_evaluator(evaluator, judge))
    }

    pub fn mode(&self) -> EvaluatorMode {
        self.evaluator.mode()
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// The prompt `evaluate` would send for `request`.
    pub fn render_prompt(&self, request: &EvaluationRequest) -> String {
        self.evaluator.render_prompt(request)
    }

    /// Evaluate one request.
    pub async fn evaluate(
        &self,
        request: &EvaluationRequest,
    ) -> Result<EvaluationResponse, HarnessError> {
        let prompt = self.evaluator.render_prompt(request);
        tracing::debug!(
            mode = %self.mode(),
            judge = self.judge.name(),
            prompt_len = prompt.len(),
            context_items = request.context_items.len(),
            "Invoking judge"
        );

        let reply = self.judge.invoke(&prompt).await.map_err(|e| {
            tracing::warn!(mode = %self.mode(), judge = self.judge.name(), error = %e, "Judge invocation failed");
            HarnessError::JudgeInvocation(e)
        })?;

        let mut response = self.evaluator.interpret(&reply);
        response.metadata.insert(metadata_keys::JUDGE, self.judge.name());

        if response.is_ambiguous() {
            tracing::warn!(
                mode = %self.mode(),
                judge = self.judge.name(),
                reply_len = reply.len(),
                "Judge reply not recognized, failing closed"
            );
        }

        Ok(response)
    }

    /// Evaluate many requests concurrently.
    ///
    /// Results are returned in input order; one failure does not affect the
    /// other evaluations.
    pub async fn evaluate_batch(
        &self,
        requests: &[EvaluationRequest],
    ) -> Vec<Result<EvaluationResponse, HarnessError>> {
        join_all(requests.iter().map(|request| self.evaluate(request))).await
    }
}

impl std::fmt::Debug for EvaluationHarness {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvaluationHarness")
            .field("mode", &self.evaluator.mode())
            .field("judge", &self.judge.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::judge::{FixedJudge, JudgeError};
    use arbiter_core::{ConfigurationError, Verdict};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use proptest::prelude::*;
    use std::time::Duration;

    /// Replies with a canned answer and records every prompt.
    struct StubJudge {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl StubJudge {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl JudgeModel for StubJudge {
        async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
            self.prompts.lock().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "stub"
        }
    }

    /// Always times out.
    struct TimeoutJudge;

    #[async_trait]
    impl JudgeModel for TimeoutJudge {
        async fn invoke(&self, _prompt: &str) -> Result<String, JudgeError> {
            Err(JudgeError::Timeout(Duration::from_secs(30)))
        }
    }

    /// Answers YES to prompts mentioning "forest", NO otherwise.
    struct KeywordJudge;

    #[async_trait]
    impl JudgeModel for KeywordJudge {
        async fn invoke(&self, prompt: &str) -> Result<String, JudgeError> {
            tokio::task::yield_now().await;
            if prompt.contains("forest") {
                Ok("YES".to_string())
            } else if prompt.contains("fail") {
                Err(JudgeError::Other("provider down".to_string()))
            } else {
                Ok("NO".to_string())
            }
        }
    }

    fn forest_request() -> EvaluationRequest {
        EvaluationRequest::new(
            "Where does the adventure take place?",
            "The adventure takes place in a forest.",
        )
        .with_context(["The story is set in a forest."])
    }

    #[tokio::test]
    async fn test_relevancy_scenario_passes() {
        let judge = StubJudge::new("YES");
        let harness = EvaluationHarness::relevancy(judge.clone());

        let response = harness.evaluate(&forest_request()).await.unwrap();

        assert!(response.pass);
        assert_eq!(response.verdict, Verdict::Affirmative);
        assert_eq!(response.raw_feedback, "YES");
        assert_eq!(response.metadata.get("mode"), Some("relevancy"));
        assert_eq!(response.metadata.get("judge"), Some("stub"));

        let prompts = judge.prompts.lock();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("The story is set in a forest."));
    }

    #[tokio::test]
    async fn test_fact_check_scenario_fails() {
        let judge = StubJudge::new("NO");
        let harness = EvaluationHarness::fact_checking(judge.clone());
        let request = EvaluationRequest::fact_check(
            "The Earth is the third planet from the Sun and the only astronomical object known to harbor life.",
            "The Earth is the fourth planet from the Sun.",
        );

        let response = harness.evaluate(&request).await.unwrap();

        assert!(!response.pass);
        assert_eq!(response.verdict, Verdict::Negative);
        assert_eq!(response.metadata.get("mode"), Some("fact_checking"));
        assert!(judge.prompts.lock()[0].contains("The Earth is the fourth planet from the Sun."));
    }

    #[tokio::test]
    async fn test_timeout_is_an_error_not_a_verdict() {
        let harness = EvaluationHarness::relevancy(Arc::new(TimeoutJudge));
        let result = harness.evaluate(&forest_request()).await;
        assert!(matches!(
            result,
            Err(HarnessError::JudgeInvocation(JudgeError::Timeout(_)))
        ));
    }

    #[tokio::test]
    async fn test_ambiguous_reply_fails_closed() {
        let reply = "It is hard to say without more context.";
        let harness = EvaluationHarness::relevancy(Arc::new(FixedJudge::new(reply)));

        let response = harness.evaluate(&forest_request()).await.unwrap();

        assert!(!response.pass);
        assert!(response.is_ambiguous());
        assert_eq!(response.raw_feedback, reply);
        assert_eq!(response.metadata.get("confidence"), Some("low"));
    }

    #[tokio::test]
    async fn test_whitespace_and_case_tolerated() {
        let harness = EvaluationHarness::relevancy(Arc::new(FixedJudge::new("\n  yEs \t")));
        assert!(harness.evaluate(&forest_request()).await.unwrap().pass);
    }

    #[tokio::test]
    async fn test_supported_labels() {
        let config = HarnessConfig::fact_checking().with_tokens(["SUPPORTED"], ["UNSUPPORTED"]);
        let harness =
            EvaluationHarness::new(&config, Arc::new(FixedJudge::new("Supported."))).unwrap();
        let response = harness
            .evaluate(&EvaluationRequest::fact_check("doc", "claim"))
            .await
            .unwrap();
        assert!(response.pass);
    }

    #[test]
    fn test_bad_template_fails_at_construction() {
        let judge = StubJudge::new("YES");
        let config = HarnessConfig::relevancy().with_template("Query: {query}\nAnswer: {response}");

        let result = EvaluationHarness::new(&config, judge.clone());

        assert!(matches!(
            result,
            Err(HarnessError::Configuration(ConfigurationError::MissingPlaceholder { .. }))
        ));
        assert!(judge.prompts.lock().is_empty());
    }

    #[tokio::test]
    async fn test_repeated_evaluations_send_identical_prompts() {
        let judge = StubJudge::new("YES");
        let harness = EvaluationHarness::relevancy(judge.clone());

        harness.evaluate(&forest_request()).await.unwrap();
        harness.evaluate(&forest_request()).await.unwrap();

        let prompts = judge.prompts.lock();
        assert_eq!(prompts[0], prompts[1]);
        assert_eq!(prompts[0], harness.render_prompt(&forest_request()));
    }

    #[tokio::test]
    async fn test_batch_preserves_order_and_isolates_failures() {
        let harness = EvaluationHarness::relevancy(Arc::new(KeywordJudge));
        let requests = vec![
            forest_request(),
            EvaluationRequest::new("q", "desert"),
            EvaluationRequest::new("q", "fail"),
        ];

        let results = harness.evaluate_batch(&requests).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].as_ref().unwrap().pass);
        assert!(!results[1].as_ref().unwrap().pass);
        assert!(matches!(results[2], Err(HarnessError::JudgeInvocation(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_evaluations_share_harness() {
        let harness = EvaluationHarness::relevancy(Arc::new(KeywordJudge));
        let mut handles = Vec::new();
        for i in 0..16 {
            let harness = harness.clone();
            handles.push(tokio::spawn(async move {
                let request = if i % 2 == 0 {
                    forest_request()
                } else {
                    EvaluationRequest::new("q", "desert")
                };
                (i, harness.evaluate(&request).await.unwrap().pass)
            }));
        }
        for handle in handles {
            let (i, pass) = handle.await.unwrap();
            assert_eq!(pass, i % 2 == 0);
        }
    }

    #[test]
    fn test_from_runtime_config() {
        let config = RuntimeConfig::from_yaml(
            "harness:\n  mode: relevancy\nprovider:\n  type: static\n  config:\n    reply: 'YES'\n",
        )
        .unwrap();
        let harness =
            EvaluationHarness::from_runtime_config(&config, &ProviderRegistry::with_defaults())
                .unwrap();
        assert_eq!(harness.mode(), EvaluatorMode::Relevancy);
    }

    proptest! {
        #[test]
        fn prop_evaluate_passes_only_on_affirmative(reply in ".*") {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            let harness = EvaluationHarness::relevancy(Arc::new(FixedJudge::new(reply.clone())));
            let response = runtime.block_on(harness.evaluate(&forest_request())).unwrap();

            prop_assert_eq!(response.pass, response.verdict == Verdict::Affirmative);
            prop_assert_eq!(&response.raw_feedback, &reply);
            if !arbiter_core::verdict::normalize_reply(&reply).starts_with("yes") {
                prop_assert!(!response.pass);
            }
        }
    }
}
