use voidweaver::db::{self, CredentialKind};
use voidweaver::handlers::{clear_key, set_key, show_keys, App};
use voidweaver::model::EngineType;
use voidweaver::tests::util::init_test_db;
use voidweaver::{AppState, BackendClient};

#[tokio::test]
async fn migrated_store_persists_credentials() {
    let db = db::open("sqlite::memory:").await.unwrap();
    db.set_credential(CredentialKind::Gemini, "g").await.unwrap();
    db.set_credential(CredentialKind::Google, "{}").await.unwrap();
    let creds = db.load_credentials().await.unwrap();
    assert_eq!(creds.gemini_api_key.as_deref(), Some("g"));
    assert_eq!(creds.for_engine(EngineType::GoogleImagen), Some("{}"));
    assert_eq!(creds.for_engine(EngineType::NovelAi), None);
}

#[tokio::test]
async fn storage_keys_are_stable() {
    let db = init_test_db().await;
    db.set_credential(CredentialKind::NovelAi, "n").await.unwrap();
    let key: String = sqlx::query_scalar("SELECT key FROM credentials")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(key, "voidweaver_novelai_key");
}

#[tokio::test]
async fn key_commands_never_print_values() {
    let app = App::new(
        AppState::default(),
        init_test_db().await,
        BackendClient::new(Default::default()),
    );
    assert_eq!(show_keys(&app).await.unwrap(), "No credentials saved.");

    set_key(&app, CredentialKind::Gemini, "AIzaSecretValue1234").await.unwrap();
    let shown = show_keys(&app).await.unwrap();
    assert!(shown.contains("Gemini API key: ********1234"), "{shown}");
    assert!(!shown.contains("Secret"));

    let ignored = set_key(&app, CredentialKind::Gemini, "   ").await.unwrap();
    assert!(ignored.contains("unchanged"));
    assert!(app
        .db
        .get_credential(CredentialKind::Gemini)
        .await
        .unwrap()
        .is_some());

    clear_key(&app, CredentialKind::Gemini).await.unwrap();
    assert!(app
        .db
        .get_credential(CredentialKind::Gemini)
        .await
        .unwrap()
        .is_none());
}

#[test]
fn credential_kinds_parse_from_cli_names() {
    assert_eq!("gemini".parse::<CredentialKind>().unwrap(), CredentialKind::Gemini);
    assert_eq!("NovelAI".parse::<CredentialKind>().unwrap(), CredentialKind::NovelAi);
    assert_eq!("google".parse::<CredentialKind>().unwrap(), CredentialKind::Google);
    assert!("openai".parse::<CredentialKind>().is_err());
}
