//! Integration tests for the query pipeline and worker
//!
//! Drives full request/response cycles: merging batches, filtering,
//! selection, sorting, grouped expansion and generation ordering.

mod common;

use common::{project_batch, raw_run, ResponseAssertions};
use runboard_runtime::selection;
use runboard_sdk::{
    EngineConfig, FilterNode, FilterOperator, Grouping, LatestResponse, Level, Query, RunKey,
    RunsPipeline, RunsRequest, RunsWorker, SdkError, SortSpec,
};

fn pipeline() -> RunsPipeline {
    RunsPipeline::new(EngineConfig::default())
}

// ============================================================================
// Pipeline
// ============================================================================

#[test]
fn test_full_pass() {
    let mut pipeline = pipeline();
    let lr = RunKey::config("lr");
    let selections = selection::add_bound(&selection::all(), &lr, FilterOperator::Ge, Some(0.01));

    let query = Query::new(FilterNode::leaf(
        RunKey::config("optimizer"),
        FilterOperator::Eq,
        "sgd",
    ))
    .with_selections(selections)
    .with_sort(SortSpec::by("summary:acc", false));

    let response = pipeline
        .handle(RunsRequest::new(query).with_raw_batch(project_batch()))
        .unwrap();

    assert_eq!(response.base.len(), 5);
    assert_eq!(response.filtered_names(), vec!["r5", "r1", "r4"]);
    assert_eq!(response.filtered_runs_by_id.len(), 3);
    assert!(response.filtered_runs_by_id.contains_key("r5"));
    assert_eq!(response.selected_runs.len(), 3);
    assert_eq!(response.selected_runs_by_id.get("r1").map(String::as_str), Some("1"));
    assert_eq!(response.row_names(), vec!["r5", "r1", "r4"]);
    assert_eq!(response.total_rows, 3);
    assert!(response.column_names.contains(&"config:lr".to_string()));
    assert!(response
        .axis_options
        .iter()
        .any(|o| o.key == "summary:acc"));
}

#[test]
fn test_pipeline_is_idempotent() {
    let mut pipeline = pipeline();
    let request = RunsRequest::new(Query::default().with_sort(SortSpec::by("config:lr", true)))
        .with_raw_batch(project_batch());
    let first = pipeline.handle(request.clone()).unwrap();
    let second = pipeline.handle(request).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_incremental_batches() {
    let mut pipeline = pipeline();
    let first = project_batch();
    pipeline
        .handle(RunsRequest::new(Query::default()).with_raw_batch(first.clone()))
        .unwrap();

    let update = vec![raw_run("2", "r2", "adam", 0.01, 0.99), raw_run("6", "r6", "sgd", 0.2, 0.5)];
    let response = pipeline
        .handle(
            RunsRequest::new(Query::default())
                .with_previous_raw_batch(first)
                .with_raw_batch(update),
        )
        .unwrap();

    assert_eq!(response.filtered_names(), vec!["r1", "r2", "r3", "r4", "r5", "r6"]);
    let acc = response.filtered[1].summary().get("acc").and_then(|v| v.as_number());
    assert_eq!(acc, Some(0.99));
}

#[test]
fn test_selection_none_selects_nothing() {
    let mut pipeline = pipeline();
    let response = pipeline
        .handle(RunsRequest::new(Query::default()).with_raw_batch(project_batch()))
        .unwrap();
    assert!(response.selected_runs.is_empty());
    assert!(response.selected_runs_by_id.is_empty());
}

// ============================================================================
// Grouping
// ============================================================================

#[test]
fn test_grouped_expansion() {
    let config = EngineConfig::default();
    let mut pipeline = RunsPipeline::new(config.clone());
    let grouping =
        Grouping::new(RunKey::config("optimizer")).with_subgroup(RunKey::config("lr"));
    let query = Query::default().with_grouping(grouping);

    // Collapsed: one row per optimizer
    let collapsed = pipeline
        .handle(RunsRequest::new(query.clone()).with_raw_batch(project_batch()))
        .unwrap();
    assert_eq!(collapsed.row_names(), vec!["r2", "r1"]);
    assert_eq!(collapsed.rows[1].group_counts, vec![3, 2]);
    assert!(collapsed.column_names.contains(&"Subgroup".to_string()));

    // Expand sgd into its subgroups
    let sgd = collapsed.rows[1].run.clone();
    let expanded = query.expand_group(&sgd, &config).unwrap();
    assert_eq!(expanded.level, Level::Subgroup);
    assert_eq!(expanded.page.map(|p| p.size), Some(500));

    let response = pipeline.handle(RunsRequest::new(expanded.clone())).unwrap();
    let counts: Vec<_> = response.rows.iter().map(|r| r.group_counts.clone()).collect();
    assert_eq!(counts, vec![vec![1, 3], vec![2, 3]]);
    let subgroup_total: usize = counts.iter().map(|c| c[0]).sum();
    assert_eq!(subgroup_total, 3);

    // Expand the lr=0.1 subgroup into runs
    let runs = expanded.expand_subgroup(&sgd, &config).unwrap();
    assert_eq!(runs.page.map(|p| p.size), Some(1000));
    let response = pipeline.handle(RunsRequest::new(runs)).unwrap();
    assert_eq!(response.row_names(), vec!["r1", "r4"]);
    assert!(response.rows.iter().all(|r| r.group_counts.is_empty()));
}

#[test]
fn test_expand_ungrouped_query() {
    let config = EngineConfig::default();
    let mut pipeline = RunsPipeline::new(config.clone());
    let response = pipeline
        .handle(RunsRequest::new(Query::default()).with_raw_batch(project_batch()))
        .unwrap();
    assert!(Query::default().expand_group(&response.filtered[0], &config).is_none());
}

#[test]
fn test_expand_group_without_subgroup_lists_runs() {
    let config = EngineConfig::default();
    let query = Query::default().with_grouping(Grouping::new(RunKey::config("optimizer")));
    let mut pipeline = RunsPipeline::new(config.clone());
    let collapsed = pipeline
        .handle(RunsRequest::new(query.clone()).with_raw_batch(project_batch()))
        .unwrap();

    let adam = collapsed.rows[0].run.clone();
    let expanded = query.expand_group(&adam, &config).unwrap();
    assert_eq!(expanded.level, Level::Run);
    assert_eq!(expanded.page.map(|p| p.size), Some(config.run_page_size));
    assert!(expanded.expand_subgroup(&adam, &config).is_none());

    let response = pipeline.handle(RunsRequest::new(expanded)).unwrap();
    assert_eq!(response.row_names(), vec!["r2", "r3"]);
}

// ============================================================================
// Worker
// ============================================================================

#[tokio::test]
async fn test_worker_round_trip() {
    let worker = RunsWorker::spawn(EngineConfig::default()).unwrap();
    let client = worker.client();

    let first = client
        .submit(RunsRequest::new(Query::default()).with_raw_batch(project_batch()))
        .await
        .unwrap();
    let second = client
        .submit(RunsRequest::new(Query::default().reusing_base()))
        .await
        .unwrap();

    assert!(second.generation > first.generation);
    assert_eq!(second.filtered_names(), first.filtered_names());

    let mut latest = LatestResponse::new();
    assert!(latest.offer(second));
    assert!(!latest.offer(first));
    assert_eq!(latest.get().map(|r| r.base.len()), Some(5));

    tokio::task::spawn_blocking(move || worker.shutdown())
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn test_worker_answers_in_issue_order() {
    let worker = RunsWorker::spawn(EngineConfig::default()).unwrap();
    let client = worker.client();
    let request = |i: usize| {
        let batch = vec![raw_run(&i.to_string(), &format!("r{}", i), "sgd", 0.1, 0.5)];
        RunsRequest::new(Query::default()).with_raw_batch(batch)
    };

    // join! polls each submit once before waiting on any reply, so all five
    // requests are queued while earlier ones are still in flight
    let (r0, r1, r2, r3, r4) = tokio::join!(
        client.submit(request(0)),
        client.submit(request(1)),
        client.submit(request(2)),
        client.submit(request(3)),
        client.submit(request(4)),
    );
    let replies = vec![r0.unwrap(), r1.unwrap(), r2.unwrap(), r3.unwrap(), r4.unwrap()];

    let generations: Vec<u64> = replies.iter().map(|r| r.generation).collect();
    assert_eq!(generations, vec![1, 2, 3, 4, 5]);
    // Each request saw exactly the batches queued before it
    let sizes: Vec<usize> = replies.iter().map(|r| r.response.base.len()).collect();
    assert_eq!(sizes, vec![1, 2, 3, 4, 5]);

    let mut latest = LatestResponse::new();
    let mut replies = replies.into_iter().rev();
    assert!(latest.offer(replies.next().unwrap()));
    for stale in replies {
        assert!(!latest.offer(stale));
    }
    assert_eq!(latest.generation(), 5);
    assert_eq!(latest.get().map(|r| r.base.len()), Some(5));
}

#[tokio::test]
async fn test_worker_missing_query() {
    let worker = RunsWorker::spawn(EngineConfig::default()).unwrap();
    let err = worker.submit(RunsRequest::default()).await.unwrap_err();
    assert!(matches!(err, SdkError::MissingQuery));
}
