use insights_core::{CoreError, LlmError, Severity};
use llm_interface::{
    ExtractionOutcome, InsightExtractor, LlmProvider, LlmSettings, OpenAiProvider, SYSTEM_MESSAGE,
};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn completion(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "choices": [{"index": 0, "message": {"role": "assistant", "content": content}}]
    })
}

fn extractor_for(server: &MockServer, default_key: Option<&str>) -> InsightExtractor {
    InsightExtractor::new(
        default_key.map(str::to_string),
        LlmSettings {
            base_url: format!("{}/v1", server.uri()),
            model: "gpt-4o".to_string(),
            temperature: 0.3,
        },
    )
}

#[tokio::test]
async fn test_extraction_posts_json_mode_request() {
    let server = MockServer::start().await;
    let insights = json!({
        "summary": "People want cheaper CRMs",
        "pain_points": [{"pain": "Pricing", "severity": "critical", "quotes": ["too expensive"]}],
        "buying_intent": [{"signal": "CRM under $20", "urgency": "high | medium"}]
    });

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(header("authorization", "Bearer sk-server"))
        .and(body_partial_json(json!({
            "model": "gpt-4o",
            "response_format": {"type": "json_object"},
            "messages": [{"role": "system", "content": SYSTEM_MESSAGE}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion(&insights.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server, Some("sk-server"));
    let extraction = extractor.extract("THREAD", "smallbusiness", None).await;

    let result = extraction.outcome.insights().expect("insights");
    assert_eq!(result.summary, "People want cheaper CRMs");
    assert_eq!(result.pain_points[0].severity, Severity::Critical);
    assert_eq!(result.buying_intent[0].signal, "CRM under $20");
}

#[tokio::test]
async fn test_user_key_overrides_server_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("authorization", "Bearer sk-user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(1)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server, Some("sk-server"));
    let extraction = extractor.extract("THREAD", "SaaS", Some(" sk-user ")).await;
    assert!(matches!(extraction.outcome, ExtractionOutcome::Insights(_)));
}

#[tokio::test]
async fn test_no_key_makes_no_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(completion("{}")))
        .expect(0)
        .mount(&server)
        .await;

    let extractor = extractor_for(&server, None);
    let extraction = extractor.extract("THREAD", "SaaS", Some("")).await;
    assert!(extraction.outcome.is_prompt_only());
}

#[tokio::test]
async fn test_unauthorized_is_reported_as_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
        .mount(&server)
        .await;

    let extractor = extractor_for(&server, Some("sk-wrong"));
    let extraction = extractor.extract("THREAD", "SaaS", None).await;
    match extraction.outcome {
        ExtractionOutcome::Failed { message } => {
            assert_eq!(
                message,
                "LLM analysis failed: API key invalid or missing for openai"
            );
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(extraction.raw_data, "THREAD");
}

#[tokio::test]
async fn test_provider_status_mapping() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::new("sk-test", format!("{}/v1", server.uri()), "gpt-4o").unwrap();
    let err = provider.complete_json("sys", "prompt").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Llm(LlmError::RateLimitExceeded { retry_after: 7, .. })
    ));
}

#[tokio::test]
async fn test_empty_completion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"choices": []})))
        .mount(&server)
        .await;

    let provider =
        OpenAiProvider::new("sk-test", format!("{}/v1", server.uri()), "gpt-4o").unwrap();
    let err = provider.complete_json("sys", "prompt").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Llm(LlmError::EmptyCompletion { .. })
    ));
}
