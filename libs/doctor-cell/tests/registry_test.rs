use assert_matches::assert_matches;
use chrono::Utc;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{CreateDoctorRequest, Doctor, DoctorError};
use doctor_cell::services::registry::{
    DoctorRegistry, InMemoryDoctorRegistry, SupabaseDoctorRegistry,
};
use shared_config::AppConfig;

fn test_doctor(name: &str, workload: i32) -> Doctor {
    let now = Utc::now();
    Doctor {
        id: Uuid::new_v4(),
        user_id: None,
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        license_number: format!("MED-{}", Uuid::new_v4()),
        specialty: "General Practice".to_string(),
        is_active: true,
        workload_count: workload,
        created_at: now,
        updated_at: now,
    }
}

fn mock_config(url: &str) -> AppConfig {
    AppConfig {
        supabase_url: url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from_address: "noreply@test".to_string(),
        documents_dir: "generated_documents".to_string(),
    }
}

#[tokio::test]
async fn test_create_doctor_starts_active_with_zero_workload() {
    let registry = InMemoryDoctorRegistry::new();

    let doctor = registry
        .create(CreateDoctorRequest {
            full_name: "Jane Citizen".to_string(),
            email: "jane@example.com".to_string(),
            license_number: "MED-0001".to_string(),
            specialty: "General Practice".to_string(),
            user_id: None,
        })
        .await
        .expect("create should succeed");

    assert!(doctor.is_active);
    assert_eq!(doctor.workload_count, 0);
}

#[tokio::test]
async fn test_create_doctor_rejects_duplicate_license() {
    let registry = InMemoryDoctorRegistry::new();

    let request = CreateDoctorRequest {
        full_name: "Jane Citizen".to_string(),
        email: "jane@example.com".to_string(),
        license_number: "MED-0001".to_string(),
        specialty: "General Practice".to_string(),
        user_id: None,
    };
    registry.create(request.clone()).await.expect("first create");

    let result = registry.create(request).await;
    assert_matches!(result, Err(DoctorError::ValidationError(_)));
}

#[tokio::test]
async fn test_list_active_excludes_deactivated_and_keeps_order() {
    let registry = InMemoryDoctorRegistry::new();
    let first = test_doctor("First Doctor", 0);
    let second = test_doctor("Second Doctor", 0);
    let third = test_doctor("Third Doctor", 0);
    registry.seed(first.clone()).await;
    registry.seed(second.clone()).await;
    registry.seed(third.clone()).await;

    registry
        .set_active(second.id, false)
        .await
        .expect("deactivate");

    let active = registry.list_active().await.expect("list");
    let ids: Vec<Uuid> = active.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![first.id, third.id]);
}

#[tokio::test]
async fn test_adjust_workload_floors_at_zero() {
    let registry = InMemoryDoctorRegistry::new();
    let doctor = test_doctor("Floor Doctor", 0);
    registry.seed(doctor.clone()).await;

    let applied = registry
        .adjust_workload(doctor.id, -1)
        .await
        .expect("adjust should succeed even at zero");
    // A floored decrement reports that nothing was applied.
    assert_eq!(applied, 0);

    let stored = registry.get(doctor.id).await.expect("get").expect("exists");
    assert_eq!(stored.workload_count, 0);

    let applied = registry.adjust_workload(doctor.id, 2).await.expect("adjust");
    assert_eq!(applied, 2);
    let applied = registry.adjust_workload(doctor.id, -1).await.expect("adjust");
    assert_eq!(applied, -1);
    let stored = registry.get(doctor.id).await.expect("get").expect("exists");
    assert_eq!(stored.workload_count, 1);
}

#[tokio::test]
async fn test_adjust_workload_unknown_doctor_is_not_found() {
    let registry = InMemoryDoctorRegistry::new();
    let result = registry.adjust_workload(Uuid::new_v4(), 1).await;
    assert_matches!(result, Err(DoctorError::NotFound));
}

#[tokio::test]
async fn test_supabase_adjust_workload_calls_rpc() {
    let mock_server = MockServer::start().await;
    let doctor_id = Uuid::new_v4();

    Mock::given(method("POST"))
        .and(path("/rest/v1/rpc/adjust_doctor_workload"))
        .and(body_partial_json(serde_json::json!({
            "p_doctor_id": doctor_id,
            "p_delta": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!(1)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = SupabaseDoctorRegistry::new(&mock_config(&mock_server.uri()));
    let applied = registry
        .adjust_workload(doctor_id, 1)
        .await
        .expect("rpc adjust should succeed");
    assert_eq!(applied, 1);
}

#[tokio::test]
async fn test_supabase_list_active_filters_and_orders() {
    let mock_server = MockServer::start().await;
    let doctor = test_doctor("Remote Doctor", 3);

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([doctor])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let registry = SupabaseDoctorRegistry::new(&mock_config(&mock_server.uri()));
    let active = registry.list_active().await.expect("list should succeed");

    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, doctor.id);
    assert_eq!(active[0].workload_count, 3);
}
