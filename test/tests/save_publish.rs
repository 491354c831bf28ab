/// End-to-end tests for saving and publishing a changeset
/// Covers sanitized drafts, the uuid swap after publish, conflicts and token refresh

use std::time::Duration;

use serde_json::json;

use livesync_pane::{
    NoticeEvent, PaneError, SaveOutcome, SavedEvent, SessionNotice, TransactionError,
};
use livesync_preview::PreviewDocument;
use livesync_shared::{
    ChangesetStatus, ChangesetUuid, Nonces, SaveErrorCode, ServerResponse, CHANGESET_UUID_PARAM,
};
use livesync_test::{fresh_uuid, saved, Session};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn edited(uuid: &str) -> Session {
    let mut session = Session::started(uuid);
    session.pane.set("blogname", json!("New Title"), session.now()).unwrap();
    session.exchange();
    session
}

#[test]
fn draft_save_adopts_sanitized_value_in_both_windows() {
    init_logger();
    let mut session = edited("U1");

    let outcome = session.pane.save(ChangesetStatus::Draft).unwrap();
    assert!(matches!(outcome, SaveOutcome::Sent(_)));
    let (id, request) = session.pane_server.next_save().expect("save posted");
    assert_eq!(request.changeset_uuid.as_str(), "U1");
    assert_eq!(request.status, ChangesetStatus::Draft);
    assert_eq!(request.settings.get("blogname"), Some(&json!("New Title")));
    assert_eq!(request.nonce, "save-1");

    let response = saved("U1", &[("blogname", json!("New Title (sanitized)"))]);
    session.pane.receive_response(id, Ok(response), session.now());
    session.exchange();

    assert_eq!(session.pane.get("blogname"), Some(&json!("New Title (sanitized)")));
    assert!(!session.pane.store().is_dirty("blogname"));
    assert_eq!(session.preview.get("blogname"), Some(&json!("New Title (sanitized)")));
    assert!(!session.preview.store().is_dirty("blogname"));

    let mut events = session.pane.take_events();
    let reports: Vec<_> = events.read::<SavedEvent>().collect();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].cleaned, vec!["blogname".to_string()]);
    assert_eq!(reports[0].current_uuid.as_str(), "U1");
}

#[test]
fn publish_swaps_uuid_everywhere() {
    init_logger();
    let mut session = edited("U1");
    let next = fresh_uuid();

    session.pane.save(ChangesetStatus::Publish).unwrap();
    let (id, request) = session.pane_server.next_save().expect("publish posted");
    assert_eq!(request.changeset_uuid.as_str(), "U1");
    assert_eq!(request.status, ChangesetStatus::Publish);

    session
        .pane
        .receive_response(id, Ok(saved(next.as_str(), &[])), session.now());
    session.exchange();

    assert_eq!(session.pane.transaction().uuid(), &next);
    assert_eq!(session.preview.changeset_uuid(), &next);

    let stale = format!("{}=U1", CHANGESET_UUID_PARAM);
    let current = format!("{}={}", CHANGESET_UUID_PARAM, next);
    let document = session.preview.document();
    let stamped: Vec<String> = document
        .hrefs()
        .into_iter()
        .filter(|href| href.contains(CHANGESET_UUID_PARAM))
        .collect();
    assert!(!stamped.is_empty());
    assert!(stamped.iter().all(|href| href.contains(&current)));
    assert!(stamped.iter().all(|href| !href.contains(&stale)));

    assert!(document.location().contains(&current));
    let form = document.forms(None)[0];
    assert_eq!(
        document.hidden_input(form, CHANGESET_UUID_PARAM).as_deref(),
        Some(next.as_str())
    );
}

#[test]
fn save_after_publish_uses_new_uuid() {
    init_logger();
    let mut session = edited("U1");
    let next = ChangesetUuid::new("U2");

    session.pane.save(ChangesetStatus::Publish).unwrap();
    let (id, _) = session.pane_server.next_save().unwrap();
    session
        .pane
        .receive_response(id, Ok(saved("U2", &[])), session.now());
    session.exchange();

    session.pane.set("blogname", json!("Later"), session.now()).unwrap();
    session.pane.save(ChangesetStatus::Draft).unwrap();
    let (_, request) = session.pane_server.next_save().unwrap();
    assert_eq!(request.changeset_uuid, next);
    assert_eq!(session.pane.transaction().changeset().status, ChangesetStatus::Draft);
}

#[test]
fn conflict_keeps_edits_in_both_windows() {
    init_logger();
    let mut session = edited("U1");

    session.pane.save(ChangesetStatus::Draft).unwrap();
    let (id, _) = session.pane_server.next_save().unwrap();
    let rejected = ServerResponse::SaveRejected {
        code: SaveErrorCode::InvalidTransactionUuid,
    };
    session.pane.receive_response(id, Ok(rejected), session.now());
    session.exchange();

    let mut events = session.pane.take_events();
    let notices: Vec<_> = events.read::<NoticeEvent>().collect();
    assert_eq!(
        notices,
        vec![SessionNotice::SaveFailed(TransactionError::Conflict {
            uuid: ChangesetUuid::new("U1")
        })]
    );

    assert_eq!(session.pane.get("blogname"), Some(&json!("New Title")));
    assert!(session.pane.store().is_dirty("blogname"));
    assert_eq!(session.preview.get("blogname"), Some(&json!("New Title")));
    assert!(matches!(
        session.pane.save(ChangesetStatus::Draft),
        Err(PaneError::Transaction(TransactionError::SessionInvalid { .. }))
    ));
}

#[test]
fn expired_token_is_refreshed_and_shared_with_preview() {
    init_logger();
    let mut session = edited("U1");

    session.pane.save(ChangesetStatus::Draft).unwrap();
    let (id, _) = session.pane_server.next_save().unwrap();
    let rejected = ServerResponse::SaveRejected {
        code: SaveErrorCode::BadNonce,
    };
    session.pane.receive_response(id, Ok(rejected), session.now());

    let refresh = session.pane_server.next_nonce_refresh().expect("tokens refreshed");
    let nonces = Nonces::from([("save", "save-2"), ("preview", "preview-2")]);
    session
        .pane
        .receive_response(refresh, Ok(ServerResponse::Nonces(nonces)), session.now());
    session.exchange();

    let (_, retried) = session.pane_server.next_save().expect("save retried");
    assert_eq!(retried.nonce, "save-2");
    assert_eq!(session.preview.nonces().get("preview"), Some("preview-2"));
    assert!(!session.pane.take_events().has::<NoticeEvent>());
}

#[test]
fn autosave_follows_quiet_period() {
    init_logger();
    let mut session = edited("U1");

    session.advance(Duration::from_secs(4));
    assert!(session.pane_server.next_save().is_none());

    session.advance(Duration::from_secs(1));
    let (_, request) = session.pane_server.next_save().expect("autosave posted");
    assert_eq!(request.status, ChangesetStatus::Draft);
    assert_eq!(request.settings.get("blogname"), Some(&json!("New Title")));
}

#[test]
fn invalid_setting_stays_dirty_while_others_save() {
    init_logger();
    let mut session = edited("U1");
    session
        .pane
        .set("blogdescription", json!("<script>"), session.now())
        .unwrap();
    session.exchange();

    session.pane.save(ChangesetStatus::Draft).unwrap();
    let (id, _) = session.pane_server.next_save().unwrap();
    let mut response = livesync_shared::SaveResponse {
        changeset_uuid: ChangesetUuid::new("U1"),
        ..Default::default()
    };
    response
        .setting_validities
        .insert("blogdescription".to_string(), "Markup is not allowed".to_string());
    session
        .pane
        .receive_response(id, Ok(ServerResponse::Saved(response)), session.now());
    session.exchange();

    assert!(!session.pane.store().is_dirty("blogname"));
    assert!(session.pane.store().is_dirty("blogdescription"));
    assert!(!session.preview.store().is_dirty("blogname"));
    assert!(session.preview.store().is_dirty("blogdescription"));

    let mut events = session.pane.take_events();
    let notices: Vec<_> = events.read::<NoticeEvent>().collect();
    assert_eq!(
        notices,
        vec![SessionNotice::InvalidSetting {
            id: "blogdescription".to_string(),
            message: "Markup is not allowed".to_string(),
        }]
    );
}
