use candidate_matcher::domain::ports::{RecordPointRepository, VectorStoreError};
use candidate_matcher::domain::services::record_loader::RecordLoaderError;
use candidate_matcher::handlers::index_records::{
    ensure_indexed, EnsureIndexedError, IndexingContext, IndexingReport,
};
use fake::{faker::lorem::en::Sentences, Fake};

use crate::helpers::{FailingEmbeddingsProvider, TestContext, SCENARIO_CSV};

#[tokio::test]
async fn indexing_partitions_records_into_both_collections() {
    let app = TestContext::with_records(SCENARIO_CSV);

    let report = ensure_indexed(&app.context()).await.unwrap();

    assert_eq!(
        report,
        IndexingReport {
            candidates_indexed: 2,
            jobs_indexed: 1
        }
    );
    assert_eq!(app.candidates.count().await.unwrap(), 2);
    assert_eq!(app.jobs.count().await.unwrap(), 1);
}

#[tokio::test]
async fn indexing_twice_is_a_noop() {
    let app = TestContext::with_records(SCENARIO_CSV);

    ensure_indexed(&app.context()).await.unwrap();
    let second_report = ensure_indexed(&app.context()).await.unwrap();

    assert_eq!(second_report, IndexingReport::default());
    assert_eq!(app.candidates.count().await.unwrap(), 2);
    assert_eq!(app.jobs.count().await.unwrap(), 1);
    // No second upsert reached either collection
    assert_eq!(app.candidates.nb_save_calls(), 1);
    assert_eq!(app.jobs.nb_save_calls(), 1);
}

#[tokio::test]
async fn only_the_empty_collection_is_indexed() {
    use candidate_matcher::domain::entities::record_point::{RecordPayload, RecordPoint};

    let app = TestContext::with_records(SCENARIO_CSV);

    // Candidates were already populated by an earlier run
    app.candidates
        .batch_save(vec![RecordPoint {
            id: "1".into(),
            payload: RecordPayload::Candidate {
                name: "Alice Martin".into(),
                resume: "Senior Python developer".into(),
            },
            vector: crate::helpers::fake_embedding("Senior Python developer"),
        }])
        .await
        .unwrap();

    let report = ensure_indexed(&app.context()).await.unwrap();

    assert_eq!(report.candidates_indexed, 0);
    assert_eq!(report.jobs_indexed, 1);
    assert_eq!(app.candidates.count().await.unwrap(), 1);
    assert_eq!(app.jobs.count().await.unwrap(), 1);
}

#[tokio::test]
async fn unknown_record_type_fails_the_pipeline() {
    let csv = "id,type,name_or_title,text\n\
               1,candidate,Alice,Python developer\n\
               2,recruiter,Eve,Should fail the load\n";
    let app = TestContext::with_records(csv);

    let error = ensure_indexed(&app.context()).await.unwrap_err();

    assert!(matches!(
        error,
        EnsureIndexedError::RecordLoaderError(RecordLoaderError::UnknownRecordType { .. })
    ));
    // Nothing was committed
    assert_eq!(app.candidates.count().await.unwrap(), 0);
    assert_eq!(app.jobs.count().await.unwrap(), 0);
}

#[tokio::test]
async fn missing_records_file_surfaces_as_input_not_found() {
    let mut app = TestContext::with_records(SCENARIO_CSV);
    app.data_file = std::path::PathBuf::from("/definitely/not/here.csv");

    let error = ensure_indexed(&app.context()).await.unwrap_err();

    assert!(matches!(
        error,
        EnsureIndexedError::RecordLoaderError(RecordLoaderError::InputNotFound { .. })
    ));
}

#[tokio::test]
async fn embedding_failure_commits_nothing() {
    let app = TestContext::with_records(SCENARIO_CSV);
    let context = IndexingContext {
        data_file: &app.data_file,
        embeddings: &FailingEmbeddingsProvider,
        candidates: &app.candidates,
        jobs: &app.jobs,
    };

    let error = ensure_indexed(&context).await.unwrap_err();

    assert!(matches!(error, EnsureIndexedError::EmbeddingsError(_)));
    assert_eq!(app.candidates.count().await.unwrap(), 0);
    assert_eq!(app.jobs.count().await.unwrap(), 0);
    assert_eq!(app.candidates.nb_save_calls(), 0);
}

#[tokio::test]
async fn duplicate_record_ids_are_rejected() {
    let resume: String = Sentences(2..4).fake::<Vec<String>>().join(" ");
    let csv = format!(
        "id,type,name_or_title,text\n\
         1,candidate,Alice,{resume}\n\
         1,candidate,Alice again,{resume}\n"
    );
    let app = TestContext::with_records(&csv);

    let error = ensure_indexed(&app.context()).await.unwrap_err();

    assert!(matches!(
        error,
        EnsureIndexedError::VectorStoreError(VectorStoreError::DuplicateIds(_))
    ));
}

#[tokio::test]
async fn an_empty_table_indexes_nothing_without_failing() {
    let app = TestContext::with_records("id,type,name_or_title,text\n");

    let report = ensure_indexed(&app.context()).await.unwrap();

    assert_eq!(report, IndexingReport::default());
    assert_eq!(app.candidates.count().await.unwrap(), 0);
}
