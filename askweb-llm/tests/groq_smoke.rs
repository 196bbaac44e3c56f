mod common;
use askweb_common::Result;
use askweb_llm::groq::GroqClient;
use askweb_llm::traits::LlmClient;
use askweb_llm::DEFAULT_GROQ_MODEL;

fn make_client() -> GroqClient {
    let key = std::env::var("GROQ_API_KEY").expect("GROQ_API_KEY must be set for live tests");
    let model = std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string());
    GroqClient::new(key, model, None).expect("client builds")
}

#[tokio::test]
#[ignore]
async fn groq_generate_smoketest() -> Result<()> {
    common::init_test_tracing();
    let client = make_client();

    let response = client.generate("Say Ok", None, Some(8), Some(0.2)).await?;
    tracing::debug!("Groq response is: {}", response.text);

    assert!(
        !response.text.trim().is_empty(),
        "response text should not be empty"
    );
    Ok(())
}

#[tokio::test]
#[ignore]
async fn groq_health_check_passes_with_valid_key() -> Result<()> {
    common::init_test_tracing();
    assert!(make_client().health_check().await?);
    Ok(())
}
