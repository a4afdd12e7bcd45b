use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tempfile::{TempDir, tempdir};
use xferd::adapters::LocalTransfertool;
use xferd::config::AppConfig;
use xferd::context::AppContext;
use xferd::core::{
    JobOutcome, JobParams, RequestState, SourceEntry, TransferError, TransferRequest,
    Transfertool,
};
use xferd::db;

async fn setup() -> (TempDir, LocalTransfertool) {
    let dir = tempdir().expect("tempdir");
    let config = AppConfig {
        base_directory: dir.path().join("sites"),
        database_path: dir.path().join("xferd.db"),
        sync_files: false,
        retention_days: None,
        verbose: false,
        json_logs: false,
    };
    let conn = db::init(&config.database_path).await.expect("db init");
    let ctx = AppContext::new(config, conn);
    (dir, LocalTransfertool::new(ctx))
}

fn seed_source(base: &Path, site: &str, name: &str, content: &[u8]) {
    let path = base.join("sites").join(site).join(name);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn request(id: &str, source: &str, dest: &str) -> TransferRequest {
    TransferRequest {
        request_id: id.to_string(),
        dest_url: dest.to_string(),
        legacy_sources: vec![SourceEntry {
            tag: "1".to_string(),
            url: source.to_string(),
        }],
        checksums: Default::default(),
        size: None,
        source_rse_id: None,
        source_rse: Some("SITEA".to_string()),
        dest_rse_id: None,
        dest_rse: Some("SITEB".to_string()),
    }
}

#[tokio::test]
async fn submit_then_query_moves_the_file() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let requests = vec![request(
        "req-1",
        "local://sitea/in.dat",
        "local://siteb/out.dat",
    )];
    let jobs = tool.group_into_submit_jobs(vec![requests]);
    let job_id = tool
        .submit(&jobs[0].requests, &jobs[0].job_params)
        .await
        .unwrap();

    // Submission alone moves nothing.
    assert!(!dir.path().join("sites/siteb/out.dat").exists());

    let outcomes = tool.query(&[job_id.clone()], false).await.unwrap();
    assert_eq!(
        outcomes[&job_id],
        JobOutcome::Summary {
            state: RequestState::Done
        }
    );
    assert_eq!(
        fs::read(dir.path().join("sites/siteb/out.dat")).unwrap(),
        b"hi"
    );
}

#[tokio::test]
async fn repeated_query_reports_same_outcome_without_recopying() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "local://siteb/out.dat",
            )],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let first = tool.query(&[job_id.clone()], true).await.unwrap();

    // Change the source after the first execution; a buggy re-copy would
    // propagate it (or fail refusing to overwrite).
    seed_source(dir.path(), "sitea", "in.dat", b"changed");

    let second = tool.query(&[job_id.clone()], true).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        fs::read(dir.path().join("sites/siteb/out.dat")).unwrap(),
        b"hi"
    );
}

#[tokio::test]
async fn unknown_job_is_a_typed_error() {
    let (_dir, tool) = setup().await;

    let err = tool
        .query(&["not-a-job".to_string()], false)
        .await
        .unwrap_err();

    match err {
        TransferError::UnknownJob(id) => assert_eq!(id, "not-a-job"),
        other => panic!("expected UnknownJob, got {other:?}"),
    }
}

#[tokio::test]
async fn unsupported_destination_is_a_failed_outcome_not_an_error() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "https://remote.example/out.dat",
            )],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let outcomes = tool.query(&[job_id.clone()], true).await.unwrap();
    let JobOutcome::Details { requests } = &outcomes[&job_id] else {
        panic!("expected details");
    };

    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].new_state, RequestState::Failed);
    assert_eq!(requests[0].status, "error");
    assert!(requests[0].comment.contains("unsupported transfer class"));
}

#[tokio::test]
async fn mixed_job_fails_as_a_whole_but_keeps_per_request_states() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "good.dat", b"ok");

    let job_id = tool
        .submit(
            &[
                request("req-good", "local://sitea/good.dat", "local://siteb/good.dat"),
                request("req-bad", "local://sitea/absent.dat", "local://siteb/bad.dat"),
            ],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let outcomes = tool.query(&[job_id.clone()], true).await.unwrap();
    let JobOutcome::Details { requests } = &outcomes[&job_id] else {
        panic!("expected details");
    };

    assert_eq!(requests[0].new_state, RequestState::Done);
    assert_eq!(requests[1].new_state, RequestState::Failed);
    assert_eq!(outcomes[&job_id].state(), RequestState::Failed);

    // The good half of the job still moved.
    assert!(dir.path().join("sites/siteb/good.dat").exists());
}

#[tokio::test]
async fn detail_records_use_canonical_field_names() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "local://siteb/out.dat",
            )],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let outcomes = tool.query(&[job_id.clone()], true).await.unwrap();
    let JobOutcome::Details { requests } = &outcomes[&job_id] else {
        panic!("expected details");
    };

    let detail = &requests[0];
    assert_eq!(detail.request_id, "req-1");
    assert_eq!(detail.transfer_id, job_id);
    assert_eq!(detail.new_state, RequestState::Done);
    assert_eq!(detail.fields["dst_url"], "local://siteb/out.dat");
    assert_eq!(detail.fields["src_rse"], "SITEA");
    assert_eq!(detail.fields["dst_rse"], "SITEB");
    assert!(!detail.fields.contains_key("dest_url"));
    assert!(!detail.fields.contains_key("source_rse"));
}

#[tokio::test]
async fn concurrent_queries_execute_the_transfer_once() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "local://siteb/out.dat",
            )],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let tool = Arc::new(tool);
    let mut handles = Vec::new();
    for _ in 0..8 {
        let tool = tool.clone();
        let job_id = job_id.clone();
        handles.push(tokio::spawn(async move {
            tool.query(&[job_id], false).await.unwrap()
        }));
    }

    let mut observed = Vec::new();
    for handle in handles {
        observed.push(handle.await.unwrap());
    }

    // Every caller saw the same consistent terminal outcome. Had the
    // copy run twice, the overwrite refusal would have produced a FAILED
    // outcome for the losers.
    for outcomes in &observed {
        assert_eq!(
            outcomes[&job_id],
            JobOutcome::Summary {
                state: RequestState::Done
            }
        );
    }
    assert_eq!(
        fs::read(dir.path().join("sites/siteb/out.dat")).unwrap(),
        b"hi"
    );
}

#[tokio::test]
async fn cancel_and_update_priority_always_succeed() {
    let (_dir, tool) = setup().await;

    assert!(tool.cancel(&["whatever".to_string()]).await.unwrap());
    assert!(tool.update_priority("whatever", 99).await.unwrap());
}

#[tokio::test]
async fn bulk_query_matches_query_semantics() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "local://siteb/out.dat",
            )],
            &JobParams::new(),
        )
        .await
        .unwrap();

    let bulk = tool
        .bulk_query(&[job_id.clone()], Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let plain = tool.query(&[job_id.clone()], false).await.unwrap();

    assert_eq!(bulk, plain);
}

#[tokio::test]
async fn terminal_outcomes_survive_a_restart() {
    let dir = tempdir().unwrap();
    let config = AppConfig {
        base_directory: dir.path().join("sites"),
        database_path: dir.path().join("xferd.db"),
        sync_files: false,
        retention_days: None,
        verbose: false,
        json_logs: false,
    };
    seed_source(dir.path(), "sitea", "in.dat", b"hi");

    let job_id = {
        let conn = db::init(&config.database_path).await.unwrap();
        let tool = LocalTransfertool::new(AppContext::new(config.clone(), conn));
        let job_id = tool
            .submit(
                &[request(
                    "req-1",
                    "local://sitea/in.dat",
                    "local://siteb/out.dat",
                )],
                &JobParams::new(),
            )
            .await
            .unwrap();
        tool.query(&[job_id.clone()], false).await.unwrap();
        job_id
    };

    // Fresh adapter instance over the same store; even with the source
    // gone the cached outcome is reported as-is.
    fs::remove_file(dir.path().join("sites/sitea/in.dat")).unwrap();

    let conn = db::init(&config.database_path).await.unwrap();
    let tool = LocalTransfertool::new(AppContext::new(config, conn));
    let outcomes = tool.query(&[job_id.clone()], false).await.unwrap();

    assert_eq!(
        outcomes[&job_id],
        JobOutcome::Summary {
            state: RequestState::Done
        }
    );
}

#[tokio::test]
async fn job_params_overwrite_allows_replacing_destination() {
    let (dir, tool) = setup().await;
    seed_source(dir.path(), "sitea", "in.dat", b"new");
    seed_source(dir.path(), "siteb", "out.dat", b"old");

    let mut params = JobParams::new();
    params.insert("overwrite".to_string(), serde_json::Value::Bool(true));

    let job_id = tool
        .submit(
            &[request(
                "req-1",
                "local://sitea/in.dat",
                "local://siteb/out.dat",
            )],
            &params,
        )
        .await
        .unwrap();

    let outcomes = tool.query(&[job_id.clone()], false).await.unwrap();
    assert_eq!(outcomes[&job_id].state(), RequestState::Done);
    assert_eq!(
        fs::read(dir.path().join("sites/siteb/out.dat")).unwrap(),
        b"new"
    );
}
