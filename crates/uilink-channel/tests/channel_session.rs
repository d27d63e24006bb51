//! Message channel behavior over the embedded transport.

use std::time::Duration;

use serde_json::json;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::time::timeout;
use uilink_channel::{
    bulk, ChannelError, ChannelEvent, Environment, HostEvent, HostPort, Session, SessionBuilder,
    Value,
};

const WAIT: Duration = Duration::from_secs(5);

/// Host port that forwards every posting to the test.
struct ObservablePort {
    posted: mpsc::UnboundedSender<Vec<Value>>,
}

impl HostPort for ObservablePort {
    fn post_message(&self, values: Vec<Value>) {
        let _ = self.posted.send(values);
    }
}

/// Connect an embedded session and consume the automatic `ready` call.
async fn embedded_session() -> (Session, mpsc::UnboundedReceiver<Vec<Value>>) {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::new()
        .with_host_port(Box::new(ObservablePort { posted: tx }))
        .connect(Environment::embedded())
        .expect("embedded session should connect");

    let ready = next_posted(&mut rx).await;
    assert_eq!(ready, vec![json!("UI"), json!("ready")]);

    (session, rx)
}

async fn next_posted(rx: &mut mpsc::UnboundedReceiver<Vec<Value>>) -> Vec<Value> {
    timeout(WAIT, rx.recv())
        .await
        .expect("posting should arrive in time")
        .expect("port stream should be live")
}

async fn next_event(session: &mut Session) -> ChannelEvent {
    timeout(WAIT, session.events.recv())
        .await
        .expect("event should arrive in time")
        .expect("event stream should be live")
}

#[tokio::test]
async fn calls_are_delivered_in_issuance_order() {
    let (session, mut rx) = embedded_session().await;
    let channel = &session.channel;

    channel.set_width(100).expect("set_width should enqueue");
    channel.set_height(200).expect("set_height should enqueue");
    channel.send_note(0, 60, 127).expect("send_note should enqueue");

    assert_eq!(
        next_posted(&mut rx).await,
        vec![json!("UI"), json!("setWidth"), json!(100)]
    );
    assert_eq!(
        next_posted(&mut rx).await,
        vec![json!("UI"), json!("setHeight"), json!(200)]
    );
    assert_eq!(
        next_posted(&mut rx).await,
        vec![json!("UI"), json!("sendNote"), json!(0), json!(60), json!(127)]
    );
}

#[tokio::test]
async fn reply_resolves_pending_call() {
    let (session, mut rx) = embedded_session().await;
    let injector = session.injector.clone().expect("embedded session has an injector");

    let (width, _) = tokio::join!(session.channel.get_width(), async {
        let posted = next_posted(&mut rx).await;
        assert_eq!(posted, vec![json!("UI"), json!("getWidth")]);
        injector
            .deliver(vec![json!("UI"), json!("getWidth"), json!(640)])
            .expect("reply delivery should succeed");
    });

    assert_eq!(width.expect("getWidth should resolve"), 640);
}

#[tokio::test]
async fn one_reply_resolves_every_waiter_and_clears_the_pending_list() {
    let (session, mut rx) = embedded_session().await;
    let injector = session.injector.clone().expect("embedded session has an injector");
    let channel = &session.channel;

    let first = channel.call_and_expect_reply("getHeight", false, Vec::new());
    let second = channel.call_and_expect_reply("getHeight", false, Vec::new());

    let (first, second, _) = tokio::join!(first, second, async {
        next_posted(&mut rx).await;
        next_posted(&mut rx).await;
        injector
            .deliver(vec![json!("UI"), json!("getHeight"), json!(480)])
            .expect("reply delivery should succeed");
    });

    assert_eq!(first.expect("first waiter should resolve"), vec![json!(480)]);
    assert_eq!(second.expect("second waiter should resolve"), vec![json!(480)]);

    // The pending list drained; a fresh uncached call goes back out.
    let third = channel.call_and_expect_reply("getHeight", false, Vec::new());
    let (third, _) = tokio::join!(third, async {
        let posted = next_posted(&mut rx).await;
        assert_eq!(posted, vec![json!("UI"), json!("getHeight")]);
        injector
            .deliver(vec![json!("UI"), json!("getHeight"), json!(481)])
            .expect("reply delivery should succeed");
    });
    assert_eq!(third.expect("third call should resolve"), vec![json!(481)]);
}

#[tokio::test]
async fn cacheable_read_short_circuits_after_first_reply() {
    let (session, mut rx) = embedded_session().await;
    let injector = session.injector.clone().expect("embedded session has an injector");
    let channel = &session.channel;

    // Two cacheable calls in a row with no reply in between: both go out and
    // both wait.
    let first = channel.is_resizable();
    let second = channel.is_resizable();

    let (first, second, _) = tokio::join!(first, second, async {
        assert_eq!(
            next_posted(&mut rx).await,
            vec![json!("UI"), json!("isResizable")]
        );
        assert_eq!(
            next_posted(&mut rx).await,
            vec![json!("UI"), json!("isResizable")]
        );
        injector
            .deliver(vec![json!("UI"), json!("isResizable"), json!(true)])
            .expect("reply delivery should succeed");
    });

    assert!(first.expect("first read should resolve"));
    assert!(second.expect("second read should resolve"));

    // Third read resolves from the cache without a transport send.
    assert!(channel.is_resizable().await.expect("cached read should resolve"));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn close_rejects_every_pending_future_exactly_once() {
    let (mut session, mut rx) = embedded_session().await;
    let channel = session.channel.clone();

    let first = channel.call_and_expect_reply("getHeight", false, Vec::new());
    let second = channel.call_and_expect_reply("getHeight", false, Vec::new());

    let (first, second, _) = tokio::join!(first, second, async {
        next_posted(&mut rx).await;
        next_posted(&mut rx).await;
        channel.close();
    });

    assert!(matches!(first, Err(ChannelError::Closed)));
    assert!(matches!(second, Err(ChannelError::Closed)));

    assert!(matches!(next_event(&mut session).await, ChannelEvent::Open));
    assert!(matches!(next_event(&mut session).await, ChannelEvent::Closed));

    // The session is gone; later calls fail instead of resolving.
    let err = channel
        .call_and_expect_reply("getWidth", false, Vec::new())
        .await
        .expect_err("call after close should fail");
    assert!(matches!(err, ChannelError::Shutdown | ChannelError::Closed));
}

#[tokio::test]
async fn unsolicited_envelopes_dispatch_as_host_events() {
    let (mut session, _rx) = embedded_session().await;
    let injector = session.injector.clone().expect("embedded session has an injector");

    injector
        .deliver(vec![json!("UI"), json!("parameterChanged"), json!(3), json!(0.5)])
        .expect("event delivery should succeed");
    // No matching variant and no waiter: dropped silently.
    injector
        .deliver(vec![json!("UI"), json!("bogusMethod"), json!(1)])
        .expect("unknown method delivery should succeed");
    injector
        .deliver(vec![json!("midi"), json!("noteOn"), json!(60), json!(127)])
        .expect("foreign delivery should succeed");

    assert!(matches!(next_event(&mut session).await, ChannelEvent::Open));
    match next_event(&mut session).await {
        ChannelEvent::Host(HostEvent::ParameterChanged { index, value }) => {
            assert_eq!(index, 3);
            assert_eq!(value, 0.5);
        }
        other => panic!("expected parameter change, got {other:?}"),
    }
    match next_event(&mut session).await {
        ChannelEvent::Foreign(envelope) => {
            assert_eq!(envelope.namespace, "midi");
            assert_eq!(envelope.method, "noteOn");
            assert_eq!(envelope.args, vec![json!(60), json!(127)]);
        }
        other => panic!("expected foreign passthrough, got {other:?}"),
    }
}

#[tokio::test]
async fn pong_updates_the_latency_sample() {
    let (session, mut rx) = embedded_session().await;
    let injector = session.injector.clone().expect("embedded session has an injector");
    let channel = &session.channel;

    assert_eq!(channel.latency(), Duration::ZERO);

    channel.ping().expect("ping should enqueue");
    assert_eq!(next_posted(&mut rx).await, vec![json!("UI"), json!("ping")]);

    tokio::time::sleep(Duration::from_millis(20)).await;
    injector
        .deliver(vec![json!("UI"), json!("pong")])
        .expect("pong delivery should succeed");

    let mut waited = Duration::ZERO;
    while channel.latency() == Duration::ZERO && waited < WAIT {
        tokio::time::sleep(Duration::from_millis(5)).await;
        waited += Duration::from_millis(5);
    }
    assert!(channel.latency() >= Duration::from_millis(10));
}

#[tokio::test]
async fn bulk_and_broadcast_calls_have_the_expected_shapes() {
    let (session, mut rx) = embedded_session().await;
    let channel = &session.channel;

    channel
        .broadcast(vec![json!("hello"), json!(7)])
        .expect("broadcast should enqueue");
    channel
        .write_shared_memory(&[1, 2, 3], 16, 2)
        .expect("shared memory write should enqueue");
    channel
        .sideload_binary("main.wasm", &[9, 9])
        .expect("sideload should enqueue");

    assert_eq!(
        next_posted(&mut rx).await,
        vec![json!("UI"), json!("broadcast"), json!("hello"), json!(7)]
    );

    let write = next_posted(&mut rx).await;
    assert_eq!(write[0], json!("UI"));
    assert_eq!(write[1], json!("writeSharedMemory"));
    let payload = write[2].as_str().expect("payload should be base64 text");
    assert_eq!(bulk::decode(payload).expect("payload should decode").as_ref(), &[1, 2, 3]);
    assert_eq!(write[3], json!(16));
    assert_eq!(write[4], json!(2));

    let sideload = next_posted(&mut rx).await;
    assert_eq!(sideload[0], json!("UI"));
    assert_eq!(sideload[1], json!("writeSharedMemory"));
    assert_eq!(sideload[2], json!("main.wasm"));
    let payload = sideload[3].as_str().expect("payload should be base64 text");
    assert_eq!(bulk::decode(payload).expect("payload should decode").as_ref(), &[9, 9]);
}

#[tokio::test]
async fn standalone_session_opens_without_a_host() {
    let mut session = SessionBuilder::new()
        .connect(Environment::standalone())
        .expect("standalone session should connect");

    assert!(matches!(next_event(&mut session).await, ChannelEvent::Open));
    session
        .channel
        .set_parameter_value(0, 0.25)
        .expect("standalone calls should be accepted and dropped");
}

#[tokio::test]
async fn builder_rejects_missing_endpoints() {
    let err = SessionBuilder::new()
        .connect(Environment::networked())
        .expect_err("networked session without endpoint should fail");
    assert!(matches!(err, ChannelError::MissingSocketEndpoint));

    let err = SessionBuilder::new()
        .connect(Environment::embedded())
        .expect_err("embedded session without port should fail");
    assert!(matches!(err, ChannelError::MissingHostPort));
}
