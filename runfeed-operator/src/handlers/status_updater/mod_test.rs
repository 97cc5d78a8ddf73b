use anyhow::Result;

use super::*;
use crate::fixtures::{event, FakeResources};
use runfeed_core::Artifact;

fn names() -> (NamespacedName, NamespacedName) {
    (NamespacedName::new("ns", "rc"), NamespacedName::new("ns", "run"))
}

#[tokio::test]
async fn succeeded_run_updates_both_resources() -> Result<()> {
    let (rc_name, run_name) = names();
    let resources = Arc::new(FakeResources::default().with_run(&run_name, vec![]).with_run_configuration(&rc_name, vec![]));
    let updater = StatusUpdater::new(resources.clone());

    let mut event = event(Some(rc_name.clone()), Some(run_name.clone()));
    event.artifacts = vec![Artifact {
        name: "model".into(),
        location: "gs://models/pushed".into(),
    }];
    updater.handle(&event).await?;

    let run_patches = resources.run_patches();
    let expected_run = vec![(
        run_name,
        RunStatus {
            completion_state: Some(CompletionState::Succeeded),
        },
    )];
    assert!(run_patches == expected_run, "unexpected Run patches, got {:?}, expected {:?}", run_patches, expected_run);

    let rc_patches = resources.run_configuration_patches();
    assert!(rc_patches.len() == 1, "expected one RunConfiguration patch, got {:?}", rc_patches);
    let latest = &rc_patches[0].1.latest_runs.succeeded;
    assert!(latest.provider_id == "marker", "unexpected provider id, got {}, expected {}", latest.provider_id, "marker");
    assert!(latest.artifacts == event.artifacts, "unexpected artifacts, got {:?}, expected {:?}", latest.artifacts, event.artifacts);
    Ok(())
}

#[tokio::test]
async fn failed_run_only_updates_run() -> Result<()> {
    let (rc_name, run_name) = names();
    let resources = Arc::new(FakeResources::default().with_run(&run_name, vec![]).with_run_configuration(&rc_name, vec![]));
    let updater = StatusUpdater::new(resources.clone());

    let mut event = event(Some(rc_name), Some(run_name));
    event.status = RunCompletionStatus::Failed;
    updater.handle(&event).await?;

    let run_patches = resources.run_patches();
    let state = run_patches.first().and_then(|(_, status)| status.completion_state);
    assert!(state == Some(CompletionState::Failed), "unexpected completion state, got {:?}", state);
    let rc_patches = resources.run_configuration_patches();
    assert!(rc_patches.is_empty(), "expected no RunConfiguration patch, got {:?}", rc_patches);
    Ok(())
}

#[tokio::test]
async fn references_without_namespace_are_skipped() -> Result<()> {
    let resources = Arc::new(FakeResources::default());
    let updater = StatusUpdater::new(resources.clone());

    let event = event(Some(NamespacedName::named("rc")), Some(NamespacedName::named("run")));
    updater.handle(&event).await?;

    assert!(resources.run_patches().is_empty(), "expected no Run patch");
    assert!(resources.run_configuration_patches().is_empty(), "expected no RunConfiguration patch");
    Ok(())
}

#[tokio::test]
async fn missing_resources_are_reported_only_when_all_are_missing() -> Result<()> {
    let (rc_name, run_name) = names();

    // Both references missing.
    let updater = StatusUpdater::new(Arc::new(FakeResources::default()));
    let res = updater.handle(&event(Some(rc_name.clone()), Some(run_name.clone()))).await;
    assert!(matches!(res, Err(EventError::MissingResource(_))), "expected missing resource error, got {:?}", res);

    // Only the run configuration is missing.
    let resources = Arc::new(FakeResources::default().with_run(&run_name, vec![]));
    let updater = StatusUpdater::new(resources.clone());
    let res = updater.handle(&event(Some(rc_name), Some(run_name))).await;
    assert!(res.is_ok(), "expected partial update to succeed, got {:?}", res);
    assert!(resources.run_patches().len() == 1, "expected the Run to be patched, got {:?}", resources.run_patches());
    Ok(())
}

#[tokio::test]
async fn api_errors_are_fatal() -> Result<()> {
    let (_, run_name) = names();
    let resources = FakeResources {
        unavailable: true,
        ..Default::default()
    };
    let updater = StatusUpdater::new(Arc::new(resources));

    let res = updater.handle(&event(None, Some(run_name))).await;
    assert!(matches!(res, Err(EventError::Fatal(_))), "expected fatal error, got {:?}", res);
    Ok(())
}
