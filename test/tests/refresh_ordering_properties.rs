/// Property tests for selective refresh ordering
/// Whatever order render responses arrive in, the last scheduled render wins

use std::time::Duration;

use proptest::prelude::*;
use serde_json::json;

use livesync_preview::PreviewDocument;
use livesync_test::{rendered, Session};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn last_scheduled_render_wins(order in prop::collection::vec(any::<u8>(), 1..6)) {
        let mut session = Session::started("U1");
        let title = session.preview.document().select(".site-title")[0];

        let mut requests = Vec::new();
        for index in 0..order.len() {
            let value = format!("v{}", index);
            session.pane.set("blogname", json!(value), session.now()).unwrap();
            session.exchange();
            session.advance(Duration::from_millis(250));
            let (id, _) = session.preview_server.next_render().unwrap();
            requests.push((id, value));
        }
        let expected = requests.last().map(|(_, value)| value.clone()).unwrap();

        // resolve in an arbitrary order
        let mut shuffled: Vec<_> = requests.into_iter().zip(order).collect();
        shuffled.sort_by_key(|(_, key)| *key);
        let now = session.now();
        for ((id, value), _) in shuffled {
            session.preview.receive_response(id, Ok(rendered("blogname", &[value.as_str()])), now);
        }

        prop_assert_eq!(session.preview.document().html(title), Some(expected.as_str()));
    }
}
