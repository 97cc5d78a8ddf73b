use anyhow::Result;

use super::*;
use crate::providers::identity::ResolverChain;
use crate::providers::kfp::fixtures::{workflow, FakeKfpApi};
use crate::providers::kfp::{ApiJob, ResourceKey, ResourceReference};

fn reference(kind: &str, id: &str, name: &str, relationship: &str) -> ResourceReference {
    ResourceReference {
        key: ResourceKey { kind: kind.into(), id: id.into() },
        name: name.into(),
        relationship: relationship.into(),
    }
}

fn context(description: &str, references: Vec<ResourceReference>) -> KfpRunContext {
    KfpRunContext {
        run: ApiRun {
            id: "run-id".into(),
            name: "legacy-run".into(),
            description: description.into(),
            resource_references: references,
            ..Default::default()
        },
        workflow: workflow("wf", "run-id", "Succeeded"),
    }
}

#[tokio::test]
async fn description_document_is_parsed() -> Result<()> {
    let ctx = context("pipelineName: ns/p\nrunName: ns/r\n", vec![]);
    let res = DescriptionResolver.resolve(&ctx).await?;
    let expected = ResourceReferences {
        pipeline_name: NamespacedName::new("ns", "p"),
        run_name: NamespacedName::new("ns", "r"),
        ..Default::default()
    };
    assert!(res == Resolution::Resolved(expected.clone()), "unexpected resolution, got {:?}, expected {:?}", res, expected);
    Ok(())
}

#[tokio::test]
async fn empty_description_defers() -> Result<()> {
    let res = DescriptionResolver.resolve(&context("  ", vec![])).await?;
    assert!(res == Resolution::Defer, "expected resolver to defer, got {:?}", res);
    Ok(())
}

#[tokio::test]
async fn invalid_description_is_malformed() {
    let res = DescriptionResolver.resolve(&context("pipelineName: a/b/c", vec![])).await;
    assert!(matches!(res, Err(ProviderError::Malformed(_))), "expected malformed error, got {:?}", res);
}

#[tokio::test]
async fn creator_job_description_is_used() -> Result<()> {
    let mut api = FakeKfpApi::default();
    api.jobs.insert(
        "job-1".into(),
        ApiJob {
            id: "job-1".into(),
            name: "job".into(),
            description: "pipelineName: ns/p\nrunConfigurationName: ns/rc\n".into(),
        },
    );
    let resolver = LegacyReferencesResolver::new(Arc::new(api));
    let ctx = context("", vec![reference(RESOURCE_TYPE_JOB, "job-1", "job", RELATIONSHIP_CREATOR)]);

    let res = resolver.resolve(&ctx).await?;
    let expected = ResourceReferences {
        pipeline_name: NamespacedName::new("ns", "p"),
        run_configuration_name: NamespacedName::new("ns", "rc"),
        ..Default::default()
    };
    assert!(res == Resolution::Resolved(expected.clone()), "unexpected resolution, got {:?}, expected {:?}", res, expected);
    Ok(())
}

#[tokio::test]
async fn legacy_references_name_run_configuration_and_run() -> Result<()> {
    let mut api = FakeKfpApi::default();
    api.jobs.insert("job-1".into(), ApiJob::default());
    let api = Arc::new(api);
    let resolver = LegacyReferencesResolver::new(api.clone());
    let ctx = context(
        "",
        vec![
            reference(RESOURCE_TYPE_JOB, "job-1", "legacy-rc", RELATIONSHIP_CREATOR),
            reference(RESOURCE_TYPE_NAMESPACE, "team-ns", "", RELATIONSHIP_OWNER),
            reference("EXPERIMENT", "exp-1", "experiment", RELATIONSHIP_OWNER),
        ],
    );

    let res = resolver.resolve(&ctx).await?;
    let expected = ResourceReferences {
        run_configuration_name: NamespacedName::named("legacy-rc"),
        run_name: NamespacedName::new("team-ns", "legacy-run"),
        ..Default::default()
    };
    assert!(res == Resolution::Resolved(expected.clone()), "unexpected resolution, got {:?}, expected {:?}", res, expected);
    let requests = api.job_requests.lock().map(|ids| ids.clone()).unwrap_or_default();
    assert!(requests == vec!["job-1".to_string()], "unexpected job requests, got {:?}", requests);
    Ok(())
}

#[tokio::test]
async fn unrelated_references_defer() -> Result<()> {
    let resolver = LegacyReferencesResolver::new(Arc::new(FakeKfpApi::default()));
    let ctx = context("", vec![reference("EXPERIMENT", "exp-1", "experiment", RELATIONSHIP_OWNER)]);
    let res = resolver.resolve(&ctx).await?;
    assert!(res == Resolution::Defer, "expected resolver to defer, got {:?}", res);
    Ok(())
}

#[test]
fn pipeline_name_prefers_spec_annotation() -> Result<()> {
    let mut wf = workflow("wf", "run-id", "Succeeded");
    let name = workflow_pipeline_name(&wf);
    assert!(name == "pipeline-from-spec", "unexpected pipeline name, got {}", name);

    wf.metadata.annotations = None;
    let name = workflow_pipeline_name(&wf);
    assert!(name == "entrypoint-pipeline", "unexpected pipeline name, got {}", name);
    Ok(())
}

#[tokio::test]
async fn chain_fills_pipeline_name_of_legacy_runs() -> Result<()> {
    let api = Arc::new(FakeKfpApi::default());
    let chain = ResolverChain::new(vec![
        Box::new(DescriptionResolver),
        Box::new(LegacyReferencesResolver::new(api)),
        Box::new(WorkflowPipelineNameResolver),
    ]);
    let ctx = context("", vec![reference(RESOURCE_TYPE_NAMESPACE, "team-ns", "", RELATIONSHIP_OWNER)]);

    let res = chain.resolve(&ctx).await?;
    assert!(res.pipeline_name == NamespacedName::named("pipeline-from-spec"), "unexpected pipeline name, got {:?}", res.pipeline_name);
    assert!(res.run_name == NamespacedName::new("team-ns", "legacy-run"), "unexpected run name, got {:?}", res.run_name);
    Ok(())
}
