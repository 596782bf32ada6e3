mod helpers;

use helpers::{EngineBehaviour, MockMdnsEngine};
use mdnsd_application::use_cases::{BrowseUseCase, PublishRecordUseCase};
use mdnsd_domain::{
    BrowseEvent, BrowseEventKind, RData, RecordType, RequestError, ResourceRecord,
};
use std::net::Ipv4Addr;

fn ptr_event(kind: BrowseEventKind) -> BrowseEvent {
    BrowseEvent {
        kind,
        interface: "eth0".to_string(),
        record: ResourceRecord::new(
            "_http._tcp.local",
            4500,
            RData::Ptr("web._http._tcp.local".to_string()),
        )
        .unwrap(),
    }
}

#[tokio::test]
async fn test_browse_appends_local_domain() {
    let engine = MockMdnsEngine::new();
    let use_case = BrowseUseCase::new(engine.clone());

    use_case.execute("_http._tcp").await.unwrap();
    use_case.execute("_ipp._tcp.local").await.unwrap();

    let asked = engine.questions();
    assert_eq!(asked[0].name, "_http._tcp.local");
    assert_eq!(asked[1].name, "_ipp._tcp.local");
    assert!(asked.iter().all(|q| q.qtype == RecordType::PTR));
}

#[tokio::test]
async fn test_browse_streams_events_in_order() {
    let engine = MockMdnsEngine::new();
    let use_case = BrowseUseCase::new(engine.clone());
    let mut sub = use_case.execute("_http._tcp").await.unwrap();

    engine.push_browse_event(ptr_event(BrowseEventKind::Added));
    engine.push_browse_event(ptr_event(BrowseEventKind::Removed));

    assert_eq!(sub.next().await.unwrap().kind, BrowseEventKind::Added);
    assert_eq!(sub.next().await.unwrap().kind, BrowseEventKind::Removed);
}

#[tokio::test]
async fn test_cancel_forwards_subscription_id() {
    let engine = MockMdnsEngine::new();
    let use_case = BrowseUseCase::new(engine.clone());
    let sub = use_case.execute("_http._tcp").await.unwrap();
    let id = sub.id;

    use_case.cancel(sub).await.unwrap();

    assert_eq!(engine.cancelled(), vec![id]);
}

#[tokio::test]
async fn test_browse_not_connected() {
    let engine = MockMdnsEngine::new();
    engine.set_behaviour(EngineBehaviour::Disconnected);
    let use_case = BrowseUseCase::new(engine);

    let err = use_case.execute("_http._tcp").await.unwrap_err();
    assert_eq!(err, RequestError::NotConnected);
}

#[tokio::test]
async fn test_publish_and_withdraw_forwarded() {
    let engine = MockMdnsEngine::new();
    let use_case = PublishRecordUseCase::new(engine.clone());
    let rr = ResourceRecord::new("host.local", 120, RData::A(Ipv4Addr::new(10, 0, 0, 5)))
        .unwrap()
        .unique();

    use_case.publish(rr.clone()).await.unwrap();
    use_case.withdraw("host.local.", RecordType::A).await.unwrap();

    assert_eq!(engine.published(), vec![rr]);
    assert_eq!(
        engine.withdrawn(),
        vec![("host.local".to_string(), RecordType::A)]
    );
}
