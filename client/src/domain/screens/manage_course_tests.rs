//! Tests for the course editor screen.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::{Value, json};

use super::*;
use crate::domain::ports::{DataGatewayError, MockDataGateway, NotificationLevel};
use crate::domain::{ChapterStatus, ChapterTitle, ErrorCode, Role, VideoLink};
use crate::test_support::{InMemoryGateway, Operation, RecordingNotifier, identity};

const ADMIN_ID: &str = "3fa85f64-5717-4562-b3fc-2c963f66afa6";

fn record(value: Value) -> Record {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn access() -> AdminAccess {
    identity(ADMIN_ID, "Ada", "ada@example.com", Some(Role::Admin))
        .admin_access()
        .expect("admin identity")
}

fn draft(title: &str, module_id: &str) -> ChapterDraft {
    ChapterDraft {
        title: ChapterTitle::new(title).expect("valid title"),
        module_id: ModuleId::new(module_id).expect("valid id"),
        youtube_link: VideoLink::new("https://youtu.be/abcdefghijk").expect("valid link"),
        status: ChapterStatus::Draft,
    }
}

#[fixture]
fn gateway() -> Arc<InMemoryGateway> {
    let gateway = InMemoryGateway::new();
    gateway.seed_row(Table::Modules, record(json!({ "id": "m1", "title": "Intro" })));
    gateway.seed_row(Table::Modules, record(json!({ "id": "m2", "title": "Breath" })));
    gateway.seed_row(
        Table::Chapters,
        record(json!({
            "id": "c1",
            "title": "Welcome",
            "module_id": "m1",
            "youtube_link": "https://youtu.be/abcdefghijk",
            "status": "draft"
        })),
    );
    Arc::new(gateway)
}

async fn loaded(
    gateway: &Arc<InMemoryGateway>,
    notifier: &RecordingNotifier,
) -> ManageCourseScreen {
    let mut screen = ManageCourseScreen::new(access(), gateway.clone(), Arc::new(notifier.clone()));
    screen.load().await.expect("load succeeds");
    screen
}

fn module_titles(screen: &ManageCourseScreen) -> Vec<String> {
    screen
        .course()
        .iter()
        .map(|entry| entry.module.title().to_string())
        .collect()
}

#[rstest]
#[tokio::test]
async fn load_groups_chapters_under_modules(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let screen = loaded(&gateway, &notifier).await;

    assert!(!screen.is_loading());
    assert_eq!(module_titles(&screen), vec!["Breath", "Intro"]);
    let intro = screen
        .module(&ModuleId::new("m1").expect("valid id"))
        .expect("listed");
    assert_eq!(intro.chapters.len(), 1);
    assert_eq!(intro.chapters[0].status(), ChapterStatus::Draft);
}

#[rstest]
#[tokio::test]
async fn load_failure_notifies(gateway: Arc<InMemoryGateway>) {
    gateway.fail_data(
        Operation::Select,
        Table::Chapters,
        DataGatewayError::forbidden("policy"),
    );
    let notifier = RecordingNotifier::new();
    let mut screen = ManageCourseScreen::new(access(), gateway.clone(), Arc::new(notifier.clone()));

    let err = screen.load().await.expect_err("load fails");

    assert_eq!(err.code(), ErrorCode::Forbidden);
    assert!(!screen.is_loading());
    assert!(screen.course().is_empty());
    assert!(notifier.contains(NotificationLevel::Error, LOAD_COURSE_FAILED));
}

#[rstest]
#[tokio::test]
async fn create_module_appends_in_title_order(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;

    let module = screen.create_module("  Advanced ").await.expect("created");

    assert_eq!(module.title().as_ref(), "Advanced");
    assert_eq!(module_titles(&screen), vec!["Advanced", "Breath", "Intro"]);
    assert!(notifier.contains(NotificationLevel::Success, "Module created successfully"));
    assert_eq!(gateway.rows(Table::Modules).len(), 3);
}

#[rstest]
#[tokio::test]
async fn lowercase_title_sorts_like_a_reload(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;

    screen.create_module("apple").await.expect("created");

    assert_eq!(module_titles(&screen), vec!["apple", "Breath", "Intro"]);
    let reloaded = loaded(&gateway, &notifier).await;
    assert_eq!(module_titles(&reloaded), module_titles(&screen));
}

#[rstest]
#[tokio::test]
async fn blank_module_title_is_rejected_locally(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    gateway.clear_calls();

    let err = screen.create_module("   ").await.expect_err("blank title");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert!(gateway.calls().is_empty());
    assert_eq!(notifier.last().map(|n| n.level), Some(NotificationLevel::Error));
}

#[rstest]
#[tokio::test]
async fn rename_updates_list_after_gateway_accepts(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    let id = ModuleId::new("m1").expect("valid id");

    screen.rename_module(&id, "Getting started").await.expect("renamed");

    assert_eq!(module_titles(&screen), vec!["Breath", "Getting started"]);
    assert!(notifier.contains(NotificationLevel::Success, "Module updated successfully"));
    assert_eq!(gateway.calls_of(Operation::Update).len(), 1);
}

#[rstest]
#[tokio::test]
async fn rename_failure_leaves_list_untouched(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    gateway.fail_data(
        Operation::Update,
        Table::Modules,
        DataGatewayError::connection("reset"),
    );

    let err = screen
        .rename_module(&ModuleId::new("m1").expect("valid id"), "Renamed")
        .await
        .expect_err("update fails");

    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    assert_eq!(module_titles(&screen), vec!["Breath", "Intro"]);
    assert!(notifier.contains(NotificationLevel::Error, SAVE_MODULE_FAILED));
}

#[rstest]
#[tokio::test]
async fn rename_sends_title_patch_for_module_id() {
    let mut data = MockDataGateway::new();
    data.expect_select().returning(|table, _| match table {
        Table::Modules => Ok(vec![record(json!({ "id": "m1", "title": "Intro" }))]),
        _ => Ok(Vec::new()),
    });
    data.expect_update()
        .withf(|table, patch, filter| {
            *table == Table::Modules
                && patch.get("title") == Some(&Value::String("Getting started".to_owned()))
                && filter.column() == "id"
                && filter.value() == "m1"
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    let notifier = RecordingNotifier::new();
    let mut screen = ManageCourseScreen::new(access(), Arc::new(data), Arc::new(notifier.clone()));
    screen.load().await.expect("load succeeds");

    screen
        .rename_module(&ModuleId::new("m1").expect("valid id"), "Getting started")
        .await
        .expect("renamed");

    assert_eq!(module_titles(&screen), vec!["Getting started"]);
}

#[rstest]
#[tokio::test]
async fn module_with_chapters_cannot_be_deleted(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    gateway.clear_calls();

    let err = screen
        .delete_module(&ModuleId::new("m1").expect("valid id"))
        .await
        .expect_err("module has chapters");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert!(gateway.calls().is_empty());
    assert_eq!(screen.course().len(), 2);
}

#[rstest]
#[tokio::test]
async fn empty_module_is_deleted(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;

    screen
        .delete_module(&ModuleId::new("m2").expect("valid id"))
        .await
        .expect("deleted");

    assert_eq!(module_titles(&screen), vec!["Intro"]);
    assert_eq!(gateway.rows(Table::Modules).len(), 1);
    assert!(notifier.contains(NotificationLevel::Success, "Module deleted successfully"));
}

#[rstest]
#[tokio::test]
async fn create_chapter_defaults_to_draft_and_sorts(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;

    let chapter = screen
        .create_chapter(draft("Arrival", "m1"))
        .await
        .expect("created");

    assert_eq!(chapter.status(), ChapterStatus::Draft);
    let intro = screen
        .module(&ModuleId::new("m1").expect("valid id"))
        .expect("listed");
    let titles: Vec<_> = intro.chapters.iter().map(|c| c.title().to_string()).collect();
    assert_eq!(titles, vec!["Arrival", "Welcome"]);
    assert!(notifier.contains(NotificationLevel::Success, "Chapter created successfully"));
}

#[rstest]
#[tokio::test]
async fn create_chapter_in_unknown_module_is_rejected(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    gateway.clear_calls();

    let err = screen
        .create_chapter(draft("Lost", "m404"))
        .await
        .expect_err("module missing");

    assert_eq!(err.code(), ErrorCode::NotFound);
    assert!(gateway.calls().is_empty());
}

#[rstest]
#[tokio::test]
async fn edit_chapter_moves_between_modules(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    let mut moved = draft("Welcome back", "m2");
    moved.status = ChapterStatus::Live;

    screen
        .edit_chapter(&ChapterId::new("c1").expect("valid id"), moved)
        .await
        .expect("updated");

    let breath = screen
        .module(&ModuleId::new("m2").expect("valid id"))
        .expect("listed");
    assert_eq!(breath.chapters.len(), 1);
    assert!(breath.chapters[0].is_live());
    let intro = screen
        .module(&ModuleId::new("m1").expect("valid id"))
        .expect("listed");
    assert!(intro.chapters.is_empty());
    assert!(notifier.contains(NotificationLevel::Success, "Chapter updated successfully"));
}

#[rstest]
#[tokio::test]
async fn delete_chapter_failure_keeps_chapter(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;
    gateway.fail_data(
        Operation::Delete,
        Table::Chapters,
        DataGatewayError::forbidden("policy"),
    );

    screen
        .delete_chapter(&ChapterId::new("c1").expect("valid id"))
        .await
        .expect_err("delete fails");

    let intro = screen
        .module(&ModuleId::new("m1").expect("valid id"))
        .expect("listed");
    assert_eq!(intro.chapters.len(), 1);
    assert!(notifier.contains(NotificationLevel::Error, DELETE_CHAPTER_FAILED));
}

#[rstest]
#[tokio::test]
async fn delete_chapter_removes_it(gateway: Arc<InMemoryGateway>) {
    let notifier = RecordingNotifier::new();
    let mut screen = loaded(&gateway, &notifier).await;

    screen
        .delete_chapter(&ChapterId::new("c1").expect("valid id"))
        .await
        .expect("deleted");

    assert!(gateway.rows(Table::Chapters).is_empty());
    assert!(notifier.contains(NotificationLevel::Success, "Chapter deleted successfully"));
}
