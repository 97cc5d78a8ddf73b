use std::collections::HashMap;

use anyhow::Result;
use serde_json::json;

use super::*;
use crate::fixtures::{event_data, FakeResources};
use runfeed_core::{ComponentArtifact, ComponentArtifactInstance, NamespacedName};

fn output(name: &str, path: &str) -> Result<OutputArtifact> {
    Ok(OutputArtifact {
        name: name.into(),
        path: path.parse()?,
    })
}

fn instance(uri: &str, metadata: serde_json::Value) -> ComponentArtifactInstance {
    let metadata: HashMap<String, serde_json::Value> = serde_json::from_value(metadata).unwrap_or_default();
    ComponentArtifactInstance { uri: uri.into(), metadata }
}

fn components() -> Vec<PipelineComponent> {
    vec![
        PipelineComponent {
            name: "train".into(),
            component_artifacts: vec![ComponentArtifact {
                name: "model".into(),
                artifacts: vec![
                    instance("gs://models/pushed", json!({"pushed": 1})),
                    instance("gs://models/blessed", json!({"pushed": 0})),
                    instance("", json!({"pushed": 1})),
                ],
            }],
        },
        PipelineComponent {
            name: "evaluate".into(),
            component_artifacts: vec![ComponentArtifact {
                name: "report".into(),
                artifacts: vec![instance("gs://reports/eval", json!({}))],
            }],
        },
    ]
}

#[test]
fn filter_selects_matching_artifact_under_declared_name() -> Result<()> {
    let declared = vec![output("serving", "train:model:0[pushed == 1]")?];
    let artifacts = filter_artifacts(&components(), &declared);
    let expected = vec![Artifact {
        name: "serving".into(),
        location: "gs://models/pushed".into(),
    }];
    assert!(artifacts == expected, "unexpected artifacts, got {:?}, expected {:?}", artifacts, expected);
    Ok(())
}

#[test]
fn filter_rejects_each_mismatch_independently() -> Result<()> {
    let cases = [
        // Component name mismatch.
        "deploy:model:0",
        // Artifact name mismatch.
        "train:metrics:0",
        // Index out of bounds.
        "train:model:3",
        // Empty URI.
        "train:model:2",
        // Filter evaluates false.
        "train:model:1[pushed == 1]",
        // Filter fails to evaluate.
        "train:model:0[missing == 1]",
    ];
    for path in cases {
        let declared = vec![output("out", path)?];
        let artifacts = filter_artifacts(&components(), &declared);
        assert!(artifacts.is_empty(), "expected no artifacts for {}, got {:?}", path, artifacts);
    }
    Ok(())
}

#[test]
fn filter_defaults_to_first_index_and_keeps_declaration_order() -> Result<()> {
    let declared = vec![output("report", "evaluate:report")?, output("model", "train:model:")?];
    let artifacts = filter_artifacts(&components(), &declared);
    let names: Vec<&str> = artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["report", "model"], "unexpected artifact names, got {:?}", names);
    assert!(
        artifacts[1].location == "gs://models/pushed",
        "unexpected location, got {}, expected {}",
        artifacts[1].location,
        "gs://models/pushed"
    );
    Ok(())
}

#[test]
fn filter_skips_declaration_with_invalid_filter() -> Result<()> {
    let declared = vec![output("bad", "train:model:0[pushed ==]")?, output("good", "evaluate:report:0")?];
    let artifacts = filter_artifacts(&components(), &declared);
    let names: Vec<&str> = artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["good"], "unexpected artifact names, got {:?}", names);
    Ok(())
}

#[tokio::test]
async fn run_configuration_declarations_take_precedence() -> Result<()> {
    let rc_name = NamespacedName::new("ns", "rc");
    let run_name = NamespacedName::new("ns", "run");
    let resources = FakeResources::default()
        .with_run_configuration(&rc_name, vec![output("from-rc", "train:model:0")?])
        .with_run(&run_name, vec![output("from-run", "evaluate:report:0")?]);
    let processor = EventProcessor::new(Arc::new(resources));

    let mut data = event_data(Some(rc_name), Some(run_name));
    data.pipeline_components = components();
    let event = processor.to_event(data).await?;

    let names: Vec<&str> = event.artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["from-rc"], "unexpected artifact names, got {:?}", names);
    assert!(event.run_id == "marker", "unexpected run id, got {}, expected {}", event.run_id, "marker");
    assert!(
        event.serving_model_artifacts.len() == 1,
        "expected serving model artifacts to be carried over, got {:?}",
        event.serving_model_artifacts
    );
    Ok(())
}

#[tokio::test]
async fn run_declarations_are_used_without_run_configuration() -> Result<()> {
    let run_name = NamespacedName::new("ns", "run");
    let resources = FakeResources::default().with_run(&run_name, vec![output("from-run", "evaluate:report:0")?]);
    let processor = EventProcessor::new(Arc::new(resources));

    let mut data = event_data(None, Some(run_name));
    data.pipeline_components = components();
    let event = processor.to_event(data).await?;

    let names: Vec<&str> = event.artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["from-run"], "unexpected artifact names, got {:?}", names);
    Ok(())
}

#[tokio::test]
async fn conversion_errors_are_classified() -> Result<()> {
    let processor = EventProcessor::new(Arc::new(FakeResources::default()));

    let res = processor.to_event(event_data(None, None)).await;
    assert!(matches!(res, Err(EventError::InvalidEvent(_))), "expected invalid event without references, got {:?}", res);

    let res = processor.to_event(event_data(None, Some(NamespacedName::new("ns", "gone")))).await;
    assert!(matches!(res, Err(EventError::MissingResource(_))), "expected missing resource for unknown run, got {:?}", res);

    let unavailable = FakeResources {
        unavailable: true,
        ..Default::default()
    };
    let processor = EventProcessor::new(Arc::new(unavailable));
    let res = processor.to_event(event_data(Some(NamespacedName::new("ns", "rc")), None)).await;
    assert!(matches!(res, Err(EventError::Fatal(_))), "expected fatal error for unavailable API, got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn missing_run_configuration_falls_back_to_run() -> Result<()> {
    let run_name = NamespacedName::new("ns", "run");
    let resources = FakeResources::default().with_run(&run_name, vec![output("from-run", "evaluate:report:0")?]);
    let processor = EventProcessor::new(Arc::new(resources));

    let mut data = event_data(Some(NamespacedName::new("ns", "gone-rc")), Some(run_name));
    data.pipeline_components = components();
    let event = processor.to_event(data).await?;

    let names: Vec<&str> = event.artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["from-run"], "unexpected artifact names, got {:?}", names);
    Ok(())
}

#[tokio::test]
async fn missing_run_does_not_fail_present_run_configuration() -> Result<()> {
    let rc_name = NamespacedName::new("ns", "rc");
    let resources = FakeResources::default().with_run_configuration(&rc_name, vec![output("from-rc", "train:model:0")?]);
    let processor = EventProcessor::new(Arc::new(resources));

    let mut data = event_data(Some(rc_name), Some(NamespacedName::new("ns", "gone-run")));
    data.pipeline_components = components();
    let event = processor.to_event(data).await?;

    let names: Vec<&str> = event.artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["from-rc"], "unexpected artifact names, got {:?}", names);
    Ok(())
}

#[tokio::test]
async fn event_is_missing_resources_only_when_every_reference_is_gone() -> Result<()> {
    let processor = EventProcessor::new(Arc::new(FakeResources::default()));
    let data = event_data(Some(NamespacedName::new("ns", "gone-rc")), Some(NamespacedName::new("ns", "gone-run")));
    let res = processor.to_event(data).await;
    assert!(matches!(res, Err(EventError::MissingResource(_))), "expected missing resource, got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn run_configuration_without_namespace_is_skipped() -> Result<()> {
    let run_name = NamespacedName::new("ns", "run");
    let resources = FakeResources::default().with_run(&run_name, vec![output("from-run", "evaluate:report:0")?]);
    let processor = EventProcessor::new(Arc::new(resources));

    let mut data = event_data(Some(NamespacedName::named("legacy-rc")), Some(run_name));
    data.pipeline_components = components();
    let event = processor.to_event(data).await?;

    let names: Vec<&str> = event.artifacts.iter().map(|artifact| artifact.name.as_str()).collect();
    assert!(names == vec!["from-run"], "unexpected artifact names, got {:?}", names);

    let event = processor.to_event(event_data(Some(NamespacedName::named("legacy-rc")), None)).await?;
    assert!(event.artifacts.is_empty(), "expected no declared artifacts, got {:?}", event.artifacts);
    Ok(())
}
