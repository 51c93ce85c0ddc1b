// Integration tests for mixto-lite
use mixto_lite::client::{MixtoClient, NewCommit};
use mixto_lite::config::MixtoConfig;
use mixto_lite::platforms::import::ImportOutcome;
use mixto_lite::platforms::{ChallengeImporter, Platform};
use mixto_lite::progress::ProgressIndicator;
use mixto_lite::prompt::ScriptedPrompter;
use mixto_lite::types::CommitType;
use mixto_lite::writeups::{CtftimeClient, ImportLedger, WriteupImporter};
use mixto_lite::MixtoError;

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn mixto_client(server: &MockServer) -> MixtoClient {
    let config = MixtoConfig::new(&server.uri(), "integration-key")
        .unwrap()
        .with_workspace("ws-1")
        .with_categories(["web", "pwn", "crypto"]);
    MixtoClient::new(config).unwrap()
}

#[tokio::test]
async fn test_end_to_end_ctfd_import() {
    // Scoring platform
    let ctfd = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/challenges"))
        .and(header("cookie", "session=s3ss10n"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "data": [
                {"id": 1, "name": "Cookie Monster", "category": "Web"},
                {"id": 2, "name": "ret2win", "category": "PWN"},
                {"id": 3, "name": "Lost Keys", "category": "rev"}
            ]
        })))
        .expect(1)
        .mount(&ctfd)
        .await;

    // Mixto with an empty workspace
    let mixto = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workspace/ws-1"))
        .and(header("x-api-key", "integration-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries_count": 0})))
        .expect(1)
        .mount(&mixto)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/entry/ws-1"))
        .and(body_json(json!([
            {"title": "Cookie Monster", "category": "web"},
            {"title": "ret2win", "category": "pwn"},
            {"title": "Lost Keys", "category": "other"}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"entry_id": "id-1", "title": "Cookie Monster", "category": "web"},
            {"entry_id": "id-2", "title": "ret2win", "category": "pwn"},
            {"entry_id": "id-3", "title": "Lost Keys", "category": "other"}
        ])))
        .expect(1)
        .mount(&mixto)
        .await;

    let client = mixto_client(&mixto);
    let adapter = Platform::Ctfd.adapter(Some(ctfd.uri().as_str()), None).unwrap();
    let mut prompter = ScriptedPrompter::new()
        .answer_with("s3ss10n")
        .confirm_with(true);

    let outcome = ChallengeImporter::new(&client)
        .run(adapter.as_ref(), &mut prompter)
        .await
        .unwrap();

    let ImportOutcome::Created(entries) = outcome else {
        panic!("expected created entries");
    };
    assert_eq!(entries.len(), 3);
    assert_eq!(
        entries.iter().map(|e| e.entry_id.as_str()).collect::<Vec<_>>(),
        vec!["id-1", "id-2", "id-3"]
    );
    // Empty workspace: only the "add N entries" confirmation
    assert_eq!(prompter.confirm_messages.len(), 1);
}

#[tokio::test]
async fn test_platform_failure_aborts_before_mixto() {
    let ctfd = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&ctfd)
        .await;

    let mixto = MockServer::start().await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mixto)
        .await;

    let client = mixto_client(&mixto);
    let adapter = Platform::Ctfd.adapter(Some(ctfd.uri().as_str()), None).unwrap();
    let mut prompter = ScriptedPrompter::new().answer_with("cookie");

    let err = ChallengeImporter::new(&client)
        .run(adapter.as_ref(), &mut prompter)
        .await
        .unwrap_err();
    assert!(matches!(err, MixtoError::PlatformRequest { status: 500, .. }));
}

#[tokio::test]
async fn test_ctftime_writeups_end_to_end() {
    let ctftime = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/event/1900/tasks/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table>
                 <tr><td><a href="/task/1">Baby ROP</a></td><td>2</td><td><a href="/task/1">Writeups</a></td></tr>
               </table>"#,
        ))
        .mount(&ctftime)
        .await;
    Mock::given(method("GET"))
        .and(path("/task/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<table><tr><td><a href="/writeup/9">Read</a></td></tr></table>"#,
        ))
        .mount(&ctftime)
        .await;
    Mock::given(method("GET"))
        .and(path("/writeup/9"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="well"><a href="https://blog.example/baby-rop">original</a></div>"#,
        ))
        .mount(&ctftime)
        .await;

    let mixto = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/workspace"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"entries": [{"entry_id": "e1", "title": "baby rop", "category": "pwn"}]}
        })))
        .mount(&mixto)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/v1/commit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "commit_id": "c1", "entry_id": "e1", "commit_type": "url"
        })))
        .expect(1)
        .mount(&mixto)
        .await;

    let client = mixto_client(&mixto);
    let source = CtftimeClient::with_base_url(Url::parse(&ctftime.uri()).unwrap()).unwrap();
    let dir = tempfile::TempDir::new().unwrap();
    let ledger = ImportLedger::open(&dir.path().join("ctftime.sqlite")).await.unwrap();
    let progress = ProgressIndicator::new(false);

    let importer = WriteupImporter::new(&client, &source, &ledger, "1900");
    let first = importer.run(false, false, &progress).await.unwrap();
    assert_eq!(first[0].commit_id.as_deref(), Some("c1"));

    // Second run finds nothing new; the commit mock expects exactly one call
    let second = importer.run(false, false, &progress).await.unwrap();
    assert!(second.is_empty());
    assert!(ledger.has_imported("e1").await.unwrap());
}

#[tokio::test]
async fn test_commit_with_env_entry_id() {
    let mixto = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/commit"))
        .and(body_json(json!({
            "data": "rax 0x0",
            "workspace_id": null,
            "entry_id": "env-entry",
            "commit_type": "stdout",
            "title": "(gdb) - info registers",
            "meta": {}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"commit_id": "c7"})))
        .expect(1)
        .mount(&mixto)
        .await;

    let config = MixtoConfig::new(&mixto.uri(), "k")
        .unwrap()
        .with_default_entry_id("env-entry");
    let client = MixtoClient::new(config).unwrap();

    let commit = client
        .add_commit(
            Some("ignored"),
            NewCommit::new("rax 0x0")
                .title("(gdb) - info registers")
                .commit_type(CommitType::Stdout),
        )
        .await
        .unwrap();

    assert_eq!(commit.commit_id, "c7");
    assert_eq!(commit.entry_id, "env-entry");
}
