use super::*;
use crate::{
    page_source::Pages,
    session::{PanelOptions, SessionState, END_ID, NEXT_ID, PREV_ID, START_ID},
    test_support::{event, pages, Call, RecordingTransport, CHANNEL, OTHER, OWNER},
};
use shared::domain::MessageId;

async fn open(
    count: usize,
    options: PanelOptions,
) -> (Arc<RecordingTransport>, Panel, MessageId) {
    let transport = RecordingTransport::new();
    let session = PanelSession::new(
        transport.clone(),
        OWNER,
        Pages::from_embeds(pages(count)),
        options,
    )
    .await
    .unwrap();
    let mut panel = Panel::new(session);
    let handle = panel.send(CHANNEL).await.unwrap();
    transport.clear().await;
    (transport, panel, handle.message_id)
}

fn title(panel: &Panel) -> String {
    panel.session().page().title.clone().unwrap_or_default()
}

#[tokio::test]
async fn four_pages_wrap_in_both_directions() {
    let (transport, mut panel, message) = open(4, PanelOptions::default()).await;

    let mut visited = Vec::new();
    for control in [PREV_ID, NEXT_ID, NEXT_ID] {
        let outcome = panel.handle_event(&event(message, control, OWNER)).await.unwrap();
        assert_eq!(outcome, EventOutcome::Handled(Redraw::Page));
        visited.push(panel.session().current_page());
    }

    assert_eq!(visited, vec![4, 1, 2]);
    assert_eq!(title(&panel), "page 2");
    let edits = transport.edits().await;
    assert_eq!(edits.len(), 3);
    assert!(edits
        .iter()
        .all(|call| matches!(call, Call::Edit { page: Some(_), controls: Some(_), .. })));
}

#[tokio::test]
async fn three_pages_clamp_without_roll_around() {
    let options = PanelOptions {
        roll_around: false,
        ..PanelOptions::default()
    };
    let (_, mut panel, message) = open(3, options).await;

    let mut visited = Vec::new();
    for control in [PREV_ID, NEXT_ID, NEXT_ID, NEXT_ID, END_ID, START_ID] {
        panel.handle_event(&event(message, control, OWNER)).await.unwrap();
        visited.push(panel.session().current_page());
    }
    assert_eq!(visited, vec![1, 2, 3, 3, 3, 1]);
}

#[tokio::test]
async fn owner_lock_blocks_other_users() {
    let (transport, mut panel, message) = open(3, PanelOptions::default()).await;

    let outcome = panel.handle_event(&event(message, LOCK_ID, OWNER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Handled(Redraw::Controls));
    assert_eq!(panel.session().grid().get(LOCK_ID).unwrap().emoji, "🔒");
    let edits = transport.edits().await;
    assert!(matches!(&edits[..], [Call::Edit { page: None, controls: Some(_), .. }]));

    transport.clear().await;
    let outcome = panel.handle_event(&event(message, NEXT_ID, OTHER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Rejected);
    assert_eq!(panel.session().current_page(), 1);
    assert!(transport.edits().await.is_empty());
    assert_eq!(
        transport.private_replies().await,
        vec![PanelError::NotAuthor.to_string()]
    );

    panel.handle_event(&event(message, NEXT_ID, OWNER)).await.unwrap();
    assert_eq!(panel.session().current_page(), 2);
}

#[tokio::test]
async fn non_owner_lock_toggle_changes_nothing() {
    let (transport, mut panel, message) = open(3, PanelOptions::default()).await;

    let outcome = panel.handle_event(&event(message, LOCK_ID, OTHER)).await.unwrap();

    assert_eq!(outcome, EventOutcome::Rejected);
    assert!(!panel.session().lock().is_locked());
    assert!(transport.edits().await.is_empty());
    assert!(matches!(
        &transport.calls().await[..],
        [Call::Private { actor, .. }] if *actor == OTHER
    ));
}

#[tokio::test]
async fn perma_locked_panel_refuses_others_without_lock_control() {
    let options = PanelOptions {
        perma_lock: true,
        ..PanelOptions::default()
    };
    let (_, mut panel, message) = open(2, options).await;
    assert!(!panel.session().grid().contains(LOCK_ID));

    let outcome = panel.handle_event(&event(message, NEXT_ID, OTHER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Rejected);
}

#[tokio::test]
async fn unknown_controls_fall_through() {
    let (transport, mut panel, message) = open(2, PanelOptions::default()).await;
    let outcome = panel
        .handle_event(&event(message, "poll:vote", OWNER))
        .await
        .unwrap();
    assert_eq!(outcome, EventOutcome::Unhandled);
    assert!(transport.calls().await.is_empty());
}

#[tokio::test]
async fn events_for_other_messages_are_ignored() {
    let (_, mut panel, message) = open(2, PanelOptions::default()).await;
    let stray = MessageId(message.0 + 1);
    let outcome = panel.handle_event(&event(stray, NEXT_ID, OWNER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Ignored);
    assert_eq!(panel.session().current_page(), 1);
}

#[tokio::test]
async fn transport_failure_is_fatal_and_later_events_are_ignored() {
    let (transport, mut panel, message) = open(3, PanelOptions::default()).await;
    transport.fail_edits();

    let err = panel
        .handle_event(&event(message, NEXT_ID, OWNER))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
    assert_eq!(panel.session().state(), SessionState::Dead);

    let outcome = panel.handle_event(&event(message, NEXT_ID, OWNER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Ignored);
}

#[tokio::test]
async fn failed_private_notice_does_not_break_the_panel() {
    let (transport, mut panel, message) = open(3, PanelOptions::default()).await;
    transport.fail_private();

    let outcome = panel.handle_event(&event(message, LOCK_ID, OTHER)).await.unwrap();

    assert_eq!(outcome, EventOutcome::Rejected);
    assert!(panel.session().is_active());
}

struct Intercept;

#[async_trait]
impl PanelHandler for Intercept {
    async fn on_control(
        &self,
        _session: &mut PanelSession,
        event: &ControlEvent,
    ) -> PanelResult<Flow> {
        if event.control_id == NEXT_ID {
            return Ok(Flow::Done(Redraw::Nothing));
        }
        Ok(Flow::Continue)
    }
}

#[tokio::test]
async fn specialised_handlers_run_first() {
    let (transport, panel, message) = open(3, PanelOptions::default()).await;
    let mut panel = panel.with_handler(Intercept);

    let outcome = panel.handle_event(&event(message, NEXT_ID, OWNER)).await.unwrap();
    assert_eq!(outcome, EventOutcome::Handled(Redraw::Nothing));
    assert_eq!(panel.session().current_page(), 1);
    assert!(transport.edits().await.is_empty());

    panel.handle_event(&event(message, PREV_ID, OWNER)).await.unwrap();
    assert_eq!(panel.session().current_page(), 3);
}
