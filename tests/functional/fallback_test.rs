//! Functional tests for the provider fallback orchestrator

use async_trait::async_trait;
use imagegen_fallback::config::{ProviderConfig, Settings};
use imagegen_fallback::error::{AppError, Result};
use imagegen_fallback::gateway::{FallbackOrchestrator, ALL_PROVIDERS_FAILED};
use imagegen_fallback::output::{ArtifactMetadata, GenerationResult};
use imagegen_fallback::provider::{
    GenerationOptions, GenerationRequest, ImageProvider, ImageSize, ProviderRegistry,
};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

#[derive(Clone)]
enum Outcome {
    Image(Vec<u8>),
    Empty,
    Error,
}

type CallLog = Arc<Mutex<Vec<(String, GenerationOptions)>>>;

struct FakeProvider {
    name: String,
    outcome: Outcome,
    calls: CallLog,
}

#[async_trait]
impl ImageProvider for FakeProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn generate(&self, _prompt: &str, options: &GenerationOptions) -> Result<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push((self.name.clone(), options.clone()));

        match &self.outcome {
            Outcome::Image(data) => Ok(data.clone()),
            Outcome::Empty => Ok(Vec::new()),
            Outcome::Error => Err(AppError::Provider(format!("{} is down", self.name))),
        }
    }
}

struct Harness {
    dir: TempDir,
    calls: CallLog,
    orchestrator: FallbackOrchestrator,
}

impl Harness {
    fn new(providers: Vec<(ProviderConfig, Outcome)>) -> Self {
        Self::with_metadata(providers, true)
    }

    fn with_metadata(providers: Vec<(ProviderConfig, Outcome)>, save_metadata: bool) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let calls: CallLog = Arc::new(Mutex::new(Vec::new()));

        let mut registry = ProviderRegistry::new();
        for (config, outcome) in providers {
            let provider = FakeProvider {
                name: config.name.clone(),
                outcome,
                calls: calls.clone(),
            };
            registry.register(config, Arc::new(provider)).unwrap();
        }

        let settings = Settings {
            output_dir: dir.path().join("out").to_string_lossy().into_owned(),
            save_metadata,
            ..Settings::default()
        };
        let orchestrator = FallbackOrchestrator::new(Arc::new(registry), &settings).unwrap();

        Self {
            dir,
            calls,
            orchestrator,
        }
    }

    fn attempted(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn output_files(&self) -> Vec<String> {
        let out = self.dir.path().join("out");
        let mut files: Vec<String> = std::fs::read_dir(out)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        files.sort();
        files
    }
}

fn provider(name: &str, priority: i32) -> ProviderConfig {
    ProviderConfig::new(name, priority)
}

fn success_path(result: &GenerationResult) -> &Path {
    match result {
        GenerationResult::Success { filepath, .. } => filepath,
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_tries_providers_in_priority_order() {
    let harness = Harness::new(vec![
        (provider("slow", 3), Outcome::Error),
        (provider("first", 1), Outcome::Empty),
        (provider("second", 2), Outcome::Error),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("a quiet harbor"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["first", "second", "slow"]);
    assert_eq!(
        result,
        GenerationResult::Failure {
            reason: ALL_PROVIDERS_FAILED.to_string(),
            prompt: "a quiet harbor".to_string(),
        }
    );
}

#[tokio::test]
async fn test_all_failed_writes_nothing() {
    let harness = Harness::new(vec![
        (provider("a", 1), Outcome::Error),
        (provider("b", 2), Outcome::Empty),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("nothing works"))
        .await
        .unwrap();

    assert!(!result.is_success());
    assert!(harness.output_files().is_empty());
}

#[tokio::test]
async fn test_disabled_providers_skipped() {
    let harness = Harness::new(vec![
        (provider("off", 1).with_enabled(false), Outcome::Image(vec![9])),
        (provider("on", 2), Outcome::Image(vec![7])),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("skip me"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["on"]);
    assert_eq!(std::fs::read(success_path(&result)).unwrap(), vec![7]);
}

#[tokio::test]
async fn test_first_success_short_circuits() {
    let harness = Harness::new(vec![
        (provider("a", 1), Outcome::Image(vec![1])),
        (provider("b", 2), Outcome::Image(vec![2])),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("one is enough"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["a"]);
    match result {
        GenerationResult::Success { provider, prompt, .. } => {
            assert_eq!(provider, "a");
            assert_eq!(prompt, "one is enough");
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_falls_through_to_next_provider() {
    let harness = Harness::new(vec![
        (provider("broken", 1), Outcome::Error),
        (provider("empty", 2), Outcome::Empty),
        (provider("works", 3), Outcome::Image(vec![3, 3])),
        (provider("unused", 4), Outcome::Image(vec![4])),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("third time lucky"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["broken", "empty", "works"]);
    let path = success_path(&result);
    assert!(path
        .file_name()
        .unwrap()
        .to_string_lossy()
        .starts_with("works_"));
}

#[tokio::test]
async fn test_explicit_provider_only() {
    let harness = Harness::new(vec![
        (provider("a", 1), Outcome::Image(vec![1])),
        (provider("b", 2), Outcome::Error),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("only b").with_provider("b"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["b"]);
    assert!(!result.is_success());
}

#[tokio::test]
async fn test_explicit_disabled_provider_is_invoked() {
    let harness = Harness::new(vec![
        (provider("a", 1), Outcome::Image(vec![1])),
        (provider("off", 2).with_enabled(false), Outcome::Image(vec![5])),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("named").with_provider("off"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["off"]);
    assert_eq!(std::fs::read(success_path(&result)).unwrap(), vec![5]);
}

#[tokio::test]
async fn test_unknown_explicit_provider_uses_fallback_order() {
    let harness = Harness::new(vec![
        (provider("b", 2), Outcome::Image(vec![2])),
        (provider("a", 1), Outcome::Error),
    ]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("who?").with_provider("dalle"))
        .await
        .unwrap();

    assert_eq!(harness.attempted(), vec!["a", "b"]);
    assert!(result.is_success());
}

#[tokio::test]
async fn test_output_is_byte_exact() {
    let harness = Harness::new(vec![(provider("a", 1), Outcome::Image(b"\x01\x02".to_vec()))]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("two bytes"))
        .await
        .unwrap();

    let path = success_path(&result);
    assert_eq!(std::fs::read(path).unwrap(), b"\x01\x02");
    assert_eq!(path.extension().unwrap(), "jpg");
}

#[tokio::test]
async fn test_metadata_round_trip() {
    let harness = Harness::new(vec![(provider("a", 1), Outcome::Image(vec![1, 2, 3]))]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("misty forest").with_size(ImageSize::new(768, 512)))
        .await
        .unwrap();

    let image_path = success_path(&result);
    let raw = std::fs::read(image_path.with_extension("json")).unwrap();
    let metadata: ArtifactMetadata = serde_json::from_slice(&raw).unwrap();

    assert_eq!(metadata.prompt, "misty forest");
    assert_eq!(metadata.provider, "a");
    assert_eq!(metadata.size, "768x512");
    assert_eq!(
        metadata.filename,
        image_path.file_name().unwrap().to_string_lossy()
    );
}

#[tokio::test]
async fn test_metadata_uses_default_size() {
    let harness = Harness::new(vec![(provider("a", 1), Outcome::Image(vec![1]))]);

    let result = harness
        .orchestrator
        .generate(GenerationRequest::new("default size"))
        .await
        .unwrap();

    let raw = std::fs::read(success_path(&result).with_extension("json")).unwrap();
    let metadata: ArtifactMetadata = serde_json::from_slice(&raw).unwrap();
    assert_eq!(metadata.size, "1024x1024");
}

#[tokio::test]
async fn test_metadata_disabled() {
    let harness =
        Harness::with_metadata(vec![(provider("a", 1), Outcome::Image(vec![1]))], false);

    harness
        .orchestrator
        .generate(GenerationRequest::new("no sidecar"))
        .await
        .unwrap();

    let files = harness.output_files();
    assert_eq!(files.len(), 1);
    assert!(!files[0].ends_with(".json"));
}

#[tokio::test]
async fn test_repeated_calls_get_distinct_files() {
    let harness = Harness::with_metadata(vec![(provider("a", 1), Outcome::Image(vec![1]))], false);

    let mut paths = Vec::new();
    for _ in 0..3 {
        let result = harness
            .orchestrator
            .generate(GenerationRequest::new("again and again"))
            .await
            .unwrap();
        paths.push(success_path(&result).to_path_buf());
    }

    paths.sort();
    paths.dedup();
    assert_eq!(paths.len(), 3);
    assert_eq!(harness.output_files().len(), 3);
}

#[tokio::test]
async fn test_options_reach_provider() {
    let harness = Harness::new(vec![(provider("a", 1), Outcome::Image(vec![1]))]);

    harness
        .orchestrator
        .generate(
            GenerationRequest::new("options")
                .with_size(ImageSize::new(640, 480))
                .with_option("quality", "hd"),
        )
        .await
        .unwrap();

    let calls = harness.calls.lock().unwrap();
    let (_, options) = &calls[0];
    assert_eq!(options.size, ImageSize::new(640, 480));
    assert_eq!(options.get("quality"), Some("hd"));
}

#[tokio::test]
async fn test_empty_prompt_rejected() {
    let harness = Harness::new(vec![(provider("a", 1), Outcome::Image(vec![1]))]);

    let err = harness
        .orchestrator
        .generate(GenerationRequest::new("   "))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidRequest(_)));
    assert!(harness.attempted().is_empty());
}

#[tokio::test]
async fn test_unwritable_output_dir_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("file");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let mut registry = ProviderRegistry::new();
    registry
        .register(
            provider("a", 1),
            Arc::new(FakeProvider {
                name: "a".to_string(),
                outcome: Outcome::Image(vec![1]),
                calls: Arc::new(Mutex::new(Vec::new())),
            }),
        )
        .unwrap();

    let settings = Settings {
        output_dir: blocker.join("out").to_string_lossy().into_owned(),
        ..Settings::default()
    };
    let orchestrator = FallbackOrchestrator::new(Arc::new(registry), &settings).unwrap();

    let err = orchestrator
        .generate(GenerationRequest::new("nowhere to go"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Io(_)));
    assert!(!err.is_transient());
}
