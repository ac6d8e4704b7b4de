use postgresflex_provider::resource::{
    ImportStateRequest, ImportStateResponse, ResourceWithImportState, ResourceWithValidateConfig,
    ValidateConfigRequest, ValidateConfigResponse,
};
use postgresflex_provider::utils::join_id;
use postgresflex_provider::{DatabaseModel, DatabaseResource, Severity};

mod common;

use common::{INSTANCE_ID, PROJECT_ID};

async fn import(id: &str) -> ImportStateResponse<DatabaseModel> {
    let resource = DatabaseResource::new();
    let mut resp = ImportStateResponse::default();
    resource
        .import_state(ImportStateRequest { id: id.to_string() }, &mut resp)
        .await;
    resp
}

#[tokio::test]
async fn test_import_seeds_identifiers() {
    let id = join_id(&[PROJECT_ID, INSTANCE_ID, "db-1"]);
    let resp = import(&id).await;

    assert!(!resp.diagnostics.has_error());
    let state = resp.state.get().unwrap();
    assert_eq!(state.project_id.as_deref(), Some(PROJECT_ID));
    assert_eq!(state.instance_id.as_deref(), Some(INSTANCE_ID));
    assert_eq!(state.database_id.as_deref(), Some("db-1"));
    assert!(state.name.is_none());
    assert!(state.owner.is_none());
    assert!(state.id.is_none());
}

#[tokio::test]
async fn test_import_warns_about_password() {
    let resp = import("p,i,d").await;

    let warnings: Vec<_> = resp.diagnostics.warnings().collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].severity, Severity::Warning);
    assert_eq!(
        warnings[0].summary,
        "Postgresflex database imported with empty password"
    );
}

#[tokio::test]
async fn test_import_rejects_malformed_identifiers() {
    for id in ["", "p", "p,i", "p,i,d,x", ",i,d", "p,,d", "p,i,", ",,"] {
        let resp = import(id).await;

        assert!(resp.state.is_null(), "state set for {:?}", id);
        let err = resp.diagnostics.errors().next().unwrap();
        assert_eq!(err.summary, "Error importing database");
        assert!(
            err.detail
                .contains("[project_id],[instance_id],[database_id]"),
            "unexpected detail for {:?}: {}",
            id,
            err.detail
        );
        assert_eq!(resp.diagnostics.warnings().count(), 0);
    }
}

#[test]
fn test_validate_config_accepts_planned_record() {
    let resource = DatabaseResource::new();
    let mut resp = ValidateConfigResponse::default();
    resource.validate_config(
        &ValidateConfigRequest {
            config: common::planned_model("mydb", "alice"),
        },
        &mut resp,
    );

    assert!(resp.diagnostics.is_empty(), "{:?}", resp.diagnostics);
}

#[test]
fn test_validate_config_rejects_bad_identifiers() {
    let resource = DatabaseResource::new();
    let mut resp = ValidateConfigResponse::default();
    let mut config = DatabaseModel::new("not-a-uuid", INSTANCE_ID, "mydb", "alice");
    config.database_id = Some("a,b".to_string());
    resource.validate_config(&ValidateConfigRequest { config }, &mut resp);

    let details: Vec<_> = resp.diagnostics.errors().map(|d| d.detail.clone()).collect();
    assert_eq!(details.len(), 2, "{:?}", details);
    assert!(details.iter().any(|d| d.contains("project_id")));
    assert!(details.iter().any(|d| d.contains("database_id")));
}

#[test]
fn test_validate_config_requires_inputs() {
    let resource = DatabaseResource::new();
    let mut resp = ValidateConfigResponse::default();
    resource.validate_config(
        &ValidateConfigRequest {
            config: DatabaseModel::default(),
        },
        &mut resp,
    );

    // project_id, instance_id, name, owner
    assert_eq!(resp.diagnostics.errors().count(), 4);
}
