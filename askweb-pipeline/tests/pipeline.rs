use askweb_common::{AskwebError, Result as AskwebResult};
use askweb_llm::traits::{LlmClient, LlmResponse};
use askweb_pipeline::{
    AnswerService, INSUFFICIENT_INFO, PageStatus, Pipeline, PipelineSettings, Query, Stage,
    Summarizer, SummarizerSettings,
};
use askweb_web::{FetchError, Fetcher, SearchError, Searcher};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct FakeSearcher {
    result: std::result::Result<Vec<String>, String>,
}

#[async_trait]
impl Searcher for FakeSearcher {
    async fn search(&self, _query: &str, limit: usize) -> Result<Vec<String>, SearchError> {
        match &self.result {
            Ok(urls) => Ok(urls.iter().take(limit).cloned().collect()),
            Err(cause) => Err(SearchError::Unavailable {
                provider: "fake",
                cause: cause.clone(),
            }),
        }
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Serves canned pages; URLs without a page fail with the given cause.
#[derive(Default)]
struct FakeFetcher {
    pages: HashMap<String, String>,
    failures: HashMap<String, String>,
    seen: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.into(), html.into());
        self
    }

    fn failing(mut self, url: &str, cause: &str) -> Self {
        self.failures.insert(url.into(), cause.into());
        self
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> Result<Vec<u8>, FetchError> {
        self.seen.lock().unwrap().push(url.to_string());
        if let Some(html) = self.pages.get(url) {
            return Ok(html.clone().into_bytes());
        }
        Err(FetchError {
            url: url.to_string(),
            cause: self
                .failures
                .get(url)
                .cloned()
                .unwrap_or_else(|| "connection refused".into()),
        })
    }
}

/// Records prompts; page prompts echo a fixed summary, synthesis returns `answer`.
/// Page prompts containing `page_failure.0` fail with cause `page_failure.1`.
struct FakeLlm {
    answer: std::result::Result<String, String>,
    page_failure: Option<(&'static str, &'static str)>,
    prompts: Mutex<Vec<String>>,
}

impl FakeLlm {
    fn answering(answer: &str) -> Self {
        Self {
            answer: Ok(answer.to_string()),
            page_failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn failing_pages_containing(mut self, marker: &'static str, cause: &'static str) -> Self {
        self.page_failure = Some((marker, cause));
        self
    }

    fn failing_synthesis(cause: &str) -> Self {
        Self {
            answer: Err(cause.to_string()),
            page_failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    fn synthesis_prompt(&self) -> String {
        self.prompts()
            .into_iter()
            .find(|p| p.contains("Question:"))
            .expect("synthesis prompt sent")
    }
}

#[async_trait]
impl LlmClient for FakeLlm {
    async fn generate(
        &self,
        prompt: &str,
        _system_prompt: Option<&str>,
        _max_tokens: Option<u32>,
        _temperature: Option<f32>,
    ) -> AskwebResult<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let text = if prompt.starts_with("Summarize the following article content:") {
            if let Some((marker, cause)) = self.page_failure {
                if prompt.contains(marker) {
                    return Err(AskwebError::Provider(cause.to_string()));
                }
            }
            "  Paris is the capital of France.  ".to_string()
        } else {
            self.answer.clone().map_err(AskwebError::Provider)?
        };
        Ok(LlmResponse {
            text,
            model: Some("fake".into()),
            tokens_used: None,
        })
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

fn pipeline(searcher: FakeSearcher, fetcher: Arc<FakeFetcher>, llm: Arc<FakeLlm>) -> Pipeline {
    Pipeline::new(
        Arc::new(searcher),
        fetcher,
        Summarizer::new(llm, SummarizerSettings::default()),
        PipelineSettings::default(),
    )
}

fn found(urls: &[&str]) -> FakeSearcher {
    FakeSearcher {
        result: Ok(urls.iter().map(|u| u.to_string()).collect()),
    }
}

const A: &str = "https://a.example/paris";
const B: &str = "https://b.example/france";

#[tokio::test]
async fn capital_of_france_scenario() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(A, "<p>Paris is the capital and largest city of France.</p>")
            .page(B, "<html><body><p>France's capital: Paris.</p></body></html>"),
    );
    let llm = Arc::new(FakeLlm::answering("- The capital of France is Paris.\n"));
    let p = pipeline(found(&[A, B]), fetcher, llm.clone());

    let report = p.run(&Query::new("capital of France?").unwrap()).await.unwrap();

    assert_eq!(report.answer.answer_text, "- The capital of France is Paris.");
    assert_eq!(report.answer.sources, vec![A, B]);
    assert_eq!(report.summaries.len(), 2);
    assert!(report.summaries.iter().all(|s| s.is_ok()));
    assert_eq!(report.summaries[0].summary, "Paris is the capital of France.");

    let prompts = llm.prompts();
    assert_eq!(prompts.len(), 3);
    assert_eq!(
        prompts[0],
        "Summarize the following article content:\n\nParis is the capital and largest city of France."
    );
    let synthesis = llm.synthesis_prompt();
    assert!(synthesis.contains(&format!("Source: {A}\nParis is the capital of France.")));
}

#[tokio::test]
async fn zero_results_still_synthesizes() {
    let llm = Arc::new(FakeLlm::answering(INSUFFICIENT_INFO));
    let fetcher = Arc::new(FakeFetcher::default());
    let p = pipeline(found(&[]), fetcher.clone(), llm.clone());

    let report = p.run(&Query::new("obscure").unwrap()).await.unwrap();

    assert!(report.answer.sources.is_empty());
    assert!(report.summaries.is_empty());
    assert_eq!(report.answer.answer_text, INSUFFICIENT_INFO);
    assert!(fetcher.seen.lock().unwrap().is_empty());
    assert_eq!(llm.prompts().len(), 1);
    assert!(llm.synthesis_prompt().contains("Summaries:\n\n"));
}

#[tokio::test]
async fn fetch_failure_becomes_error_entry_and_run_continues() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .failing(A, "HTTP 403: forbidden")
            .page(B, "<p>Paris.</p>"),
    );
    let llm = Arc::new(FakeLlm::answering("- Paris."));
    let p = pipeline(found(&[A, B]), fetcher.clone(), llm.clone());

    let report = p.run(&Query::new("capital?").unwrap()).await.unwrap();

    let first = &report.summaries[0];
    assert_eq!(first.url, A);
    assert_eq!(first.summary, format!("Error processing {A}: HTTP 403: forbidden"));
    assert_eq!(first.status, PageStatus::Error(first.summary.clone()));
    assert!(report.summaries[1].is_ok());
    assert_eq!(*fetcher.seen.lock().unwrap(), vec![A, B]);
    assert_eq!(report.answer.sources, vec![A, B]);
    assert!(llm.synthesis_prompt().contains(&format!("Source: {A}\nError processing {A}")));
}

#[tokio::test]
async fn summarize_failure_becomes_error_entry_and_run_continues() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(A, "<p>Paywalled teaser.</p>")
            .page(B, "<p>Paris.</p>"),
    );
    let llm = Arc::new(FakeLlm::answering("- Paris.").failing_pages_containing("Paywalled", "quota exceeded"));
    let p = pipeline(found(&[A, B]), fetcher, llm.clone());

    let report = p.run(&Query::new("capital?").unwrap()).await.unwrap();

    let first = &report.summaries[0];
    assert_eq!(first.url, A);
    assert!(matches!(first.status, PageStatus::Error(_)));
    assert!(first.summary.starts_with(&format!("Error processing {A}: ")));
    assert!(first.summary.contains("quota exceeded"), "summary: {}", first.summary);
    assert_eq!(report.summaries[1].status, PageStatus::Ok);
    assert_eq!(report.summaries[1].summary, "Paris is the capital of France.");

    let synthesis = llm.synthesis_prompt();
    assert!(synthesis.contains(&format!("Source: {A}\nError processing {A}")));
    assert!(synthesis.contains(&format!("Source: {B}\nParis is the capital of France.")));
    assert_eq!(report.answer.sources, vec![A, B]);
}

#[tokio::test]
async fn one_timeout_out_of_two() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(A, "<p>Paris.</p>")
            .failing(B, "request timed out after 10s"),
    );
    let llm = Arc::new(FakeLlm::answering("- Paris."));
    let p = pipeline(found(&[A, B]), fetcher, llm.clone());

    let report = p.run(&Query::new("capital?").unwrap()).await.unwrap();

    assert_eq!(report.summaries.len(), 2);
    assert!(report.summaries[0].is_ok());
    assert!(!report.summaries[1].is_ok());
    assert!(report.summaries[1].summary.contains(B));
    assert!(report.summaries[1].summary.contains("timed out"));
    let synthesis = llm.synthesis_prompt();
    assert!(synthesis.contains(&format!("Source: {A}")));
    assert!(synthesis.contains(&format!("Source: {B}")));
}

#[tokio::test]
async fn sources_follow_search_order_and_limit() {
    let urls = ["https://3.example", "https://1.example", "https://2.example"];
    let fetcher = Arc::new(FakeFetcher::default());
    let llm = Arc::new(FakeLlm::answering("- x"));
    let p = Pipeline::new(
        Arc::new(found(&urls)),
        fetcher,
        Summarizer::new(llm, SummarizerSettings::default()),
        PipelineSettings {
            max_results: 2,
            ..PipelineSettings::default()
        },
    );

    let report = p.run(&Query::new("q").unwrap()).await.unwrap();

    assert_eq!(report.answer.sources, vec![urls[0], urls[1]]);
    let order: Vec<_> = report.summaries.iter().map(|s| s.url.as_str()).collect();
    assert_eq!(order, report.answer.sources);
}

#[tokio::test]
async fn long_articles_are_truncated_before_summarizing() {
    let html = format!("<p>{}</p>", "x".repeat(5000));
    let fetcher = Arc::new(FakeFetcher::default().page(A, &html));
    let llm = Arc::new(FakeLlm::answering("- x"));
    let p = pipeline(found(&[A]), fetcher, llm.clone());

    p.run(&Query::new("q").unwrap()).await.unwrap();

    let page_prompt = &llm.prompts()[0];
    let article = page_prompt
        .strip_prefix("Summarize the following article content:\n\n")
        .unwrap();
    assert_eq!(article.chars().count(), 3000);
}

#[tokio::test]
async fn search_failure_is_fatal() {
    let llm = Arc::new(FakeLlm::answering("- unused"));
    let p = pipeline(
        FakeSearcher {
            result: Err("HTTP 503".into()),
        },
        Arc::new(FakeFetcher::default()),
        llm.clone(),
    );

    let err = p.run(&Query::new("q").unwrap()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Search);
    assert!(err.to_string().starts_with("Tool failed:"));
    assert!(err.to_string().contains("HTTP 503"));
    assert!(llm.prompts().is_empty());
}

#[tokio::test]
async fn synthesis_failure_is_fatal() {
    let fetcher = Arc::new(FakeFetcher::default().page(A, "<p>Paris.</p>"));
    let llm = Arc::new(FakeLlm::failing_synthesis("rate limited"));
    let p = pipeline(found(&[A]), fetcher, llm);

    let err = p.run(&Query::new("q").unwrap()).await.unwrap_err();

    assert_eq!(err.stage, Stage::Synthesis);
    assert!(err.to_string().starts_with("Tool failed:"));
    assert!(err.cause.contains("rate limited"));
}

#[tokio::test]
async fn repeated_runs_are_identical() {
    let fetcher = Arc::new(
        FakeFetcher::default()
            .page(A, "<p>Paris.</p>")
            .failing(B, "dns error"),
    );
    let llm = Arc::new(FakeLlm::answering("- Paris."));
    let p = pipeline(found(&[A, B]), fetcher, llm);
    let q = Query::new("capital?").unwrap();

    let first = p.run(&q).await.unwrap();
    let second = p.run(&q).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn answer_service_returns_final_answer() {
    let fetcher = Arc::new(FakeFetcher::default().page(A, "<p>Paris.</p>"));
    let llm = Arc::new(FakeLlm::answering("- The capital of France is Paris."));
    let service: Box<dyn AnswerService> = Box::new(pipeline(found(&[A]), fetcher, llm));

    let answer = service
        .answer(&Query::new("capital of France?").unwrap())
        .await
        .unwrap();
    assert_eq!(answer.answer_text, "- The capital of France is Paris.");
    assert_eq!(answer.sources, vec![A]);
    assert_eq!(
        answer.to_markdown(),
        format!("- The capital of France is Paris.\n\n**Sources:**\n1. [{A}]({A})")
    );
}
