/// End-to-end tests for values crossing between the pane and a preview
/// Covers the ready handshake, live setting delivery and reload-only settings

use std::time::Duration;

use serde_json::json;

use livesync_pane::{PreviewReadyEvent, ReloadEvent, TitleEvent};
use livesync_preview::{Preview, PreviewConfig, PreviewDocument, PreviewError};
use livesync_shared::{ChannelId, CreateOptions, Instant};
use livesync_test::{
    sample_bootstrap, sample_document, LocalWindowPair, MockServer, Session, TestDocument,
    CHANNEL, PANE_URL,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn setting_changed_in_pane_reaches_preview() {
    init_logger();
    let mut session = Session::started("U1");

    session.pane.set("blogname", json!("Foo"), session.now()).unwrap();
    session.exchange();

    assert_eq!(session.preview.get("blogname"), Some(&json!("Foo")));
    assert!(session.preview.store().is_dirty("blogname"));
}

#[test]
fn handshake_announces_preview_and_title() {
    init_logger();
    let mut session = Session::new(&sample_bootstrap("U1"), sample_document("U1"));
    session.exchange();

    let mut events = session.pane.take_events();
    let ready: Vec<_> = events.read::<PreviewReadyEvent>().collect();
    assert_eq!(ready.len(), 1);
    let (channel, payload) = &ready[0];
    assert_eq!(channel.as_ref(), Some(&ChannelId::new(CHANNEL)));
    assert!(payload.current_url.starts_with("https://example.org/"));
    assert_eq!(payload.active_controls.get("blogname"), Some(&true));

    let titles: Vec<_> = events.read::<TitleEvent>().collect();
    assert_eq!(titles, vec![(Some(ChannelId::new(CHANNEL)), "Site".to_string())]);
    assert!(session.pane.preview(session.channel()).unwrap().is_ready());
}

#[test]
fn edits_before_ready_are_delivered_after_handshake() {
    init_logger();
    let mut session = Session::new(&sample_bootstrap("U1"), sample_document("U1"));

    // the preview's ready has not been delivered yet
    session.pane.set("blogname", json!("Early"), session.now()).unwrap();
    let frame = session.pane.preview(session.channel()).unwrap();
    assert!(!frame.is_ready());
    assert_eq!(frame.queued_len(), 1);

    session.exchange();

    assert_eq!(session.preview.get("blogname"), Some(&json!("Early")));
    assert_eq!(session.pane.preview(session.channel()).unwrap().queued_len(), 0);
}

#[test]
fn edits_for_lost_preview_are_not_queued() {
    init_logger();
    let mut session = Session::new(&sample_bootstrap("U1"), sample_document("U1"));

    session.pane.set("blogname", json!("Early"), session.now()).unwrap();
    assert_eq!(session.pane.preview(session.channel()).unwrap().queued_len(), 1);

    let now = session.clock.advance(Duration::from_secs(5));
    session.pane.update(now);
    let frame = session.pane.preview(session.channel()).unwrap();
    assert!(frame.is_lost());
    assert_eq!(frame.queued_len(), 0);

    session.pane.set("blogname", json!("Later"), now).unwrap();
    assert_eq!(session.pane.preview(session.channel()).unwrap().queued_len(), 0);

    // the late ready is answered with a sync of the current values
    session.exchange();
    assert_eq!(session.preview.get("blogname"), Some(&json!("Later")));
}

#[test]
fn forms_stay_in_preview_frame() {
    init_logger();
    let session = Session::started("U1");
    let document = session.preview.document();
    let form = document.forms(None)[0];
    assert_eq!(document.attribute(form, "target").as_deref(), Some("_self"));
}

#[test]
fn preview_without_valid_location_fails_to_start() {
    init_logger();
    let windows = LocalWindowPair::new();
    let server = MockServer::new();
    let result = Preview::new(
        &sample_bootstrap("U1"),
        PreviewConfig::default(),
        PANE_URL,
        windows.preview_port(),
        server.link(),
        TestDocument::new("not a url"),
        Instant::from_millis(0),
    );
    assert!(matches!(result, Err(PreviewError::InvalidLocation { .. })));
    assert!(windows.is_idle());
}

#[test]
fn setting_created_in_pane_is_created_dirty_in_preview() {
    init_logger();
    let mut session = Session::started("U1");

    session
        .pane
        .create(
            "nav_menu_item[-1]",
            json!({"title": "Home"}),
            CreateOptions::dirty().with_transport(livesync_shared::Transport::PostMessage),
            session.now(),
        )
        .unwrap();
    session.exchange();

    assert_eq!(
        session.preview.get("nav_menu_item[-1]"),
        Some(&json!({"title": "Home"}))
    );
    assert!(session.preview.store().is_dirty("nav_menu_item[-1]"));
}

#[test]
fn refresh_transport_reloads_preview_after_debounce() {
    init_logger();
    let mut session = Session::started("U1");

    session.pane.set("show_on_front", json!("page"), session.now()).unwrap();
    session.exchange();
    // the preview never sees the value of a reload-only setting
    assert_eq!(session.preview.get("show_on_front"), Some(&json!("posts")));

    session.advance(Duration::from_millis(100));
    assert!(!session.pane.take_events().has::<ReloadEvent>());

    session.advance(Duration::from_millis(150));
    let mut events = session.pane.take_events();
    let reloads: Vec<_> = events.read::<ReloadEvent>().collect();
    assert_eq!(reloads, vec![Some(ChannelId::new(CHANNEL))]);
    assert!(session.preview.is_loading());
}

#[test]
fn bursts_of_reload_only_edits_coalesce() {
    init_logger();
    let mut session = Session::started("U1");

    for value in ["page", "posts", "page"] {
        session.pane.set("show_on_front", json!(value), session.now()).unwrap();
        session.advance(Duration::from_millis(100));
    }
    session.advance(Duration::from_millis(250));

    let mut events = session.pane.take_events();
    assert_eq!(events.read::<ReloadEvent>().count(), 1);
}

#[test]
fn scroll_position_is_replayed_to_preview() {
    init_logger();
    let mut session = Session::started("U1");

    session.pane.set_scroll(480);
    session.exchange();

    assert_eq!(
        livesync_preview::PreviewDocument::scroll(session.preview.document()),
        480
    );
}
