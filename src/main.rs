use candidate_matcher::{
    configuration::get_configuration,
    domain::{entities::record::RecordKind, services::similarity::similarity_from_distance},
    startup::Application,
    telemetry::{get_tracing_subscriber, init_tracing_subscriber},
};

const EXAMPLE_JOB_DESCRIPTION: &str = "Looking for a Python developer with Django experience";
const EXAMPLE_TOP_K: usize = 3;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let tracing_subscriber =
        get_tracing_subscriber("candidate_matcher".into(), "info".into(), std::io::stdout);
    init_tracing_subscriber(tracing_subscriber);

    // Panics if the configuration can't be read
    let configuration = get_configuration().expect("Failed to read configuration.");

    let application = match Application::build(configuration).await {
        Ok(application) => application,
        Err(error) => panic!("Failed to build application: {:?}", error),
    };

    if let Err(error) = application.ensure_indexed().await {
        panic!("Failed to index records: {:?}", error);
    }

    let matches = match application
        .find_similar(RecordKind::Candidate, EXAMPLE_JOB_DESCRIPTION, EXAMPLE_TOP_K)
        .await
    {
        Ok(matches) => matches,
        Err(error) => panic!("Failed to find matching candidates: {:?}", error),
    };

    for candidate_match in matches {
        let similarity =
            similarity_from_distance(application.distance_metric(), candidate_match.distance)
                .expect("Similarity scores require cosine collections");

        let resume_summary: String = candidate_match.payload.text().chars().take(100).collect();

        println!(
            "Candidate: {}, Similarity Score: {:.2}",
            candidate_match.payload.label(),
            similarity
        );
        println!("Resume Summary: {}...\n", resume_summary);
    }

    Ok(())
}
