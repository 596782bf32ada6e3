mod helpers;

use helpers::*;
use mdnsd_domain::{Message, Question, RData, RecordType};
use mdnsd_infrastructure::mdns::wire::{self, WireError};

#[test]
fn test_every_record_type_survives_the_wire() {
    let records = vec![
        RecordBuilder::a("host.local", [192, 168, 1, 10]).unique().build(),
        RecordBuilder::ns("local", "ns.local").build(),
        RecordBuilder::cname("www.local", "host.local").build(),
        RecordBuilder::ptr("_http._tcp.local", "Web._http._tcp.local").build(),
        RecordBuilder::hinfo("host.local", "x86_64", "linux").unique().build(),
        RecordBuilder::txt("Web._http._tcp.local", &["path=/", "v=1"]).ttl(4500).build(),
        RecordBuilder::txt("Empty._http._tcp.local", &[]).build(),
        RecordBuilder::srv("Web._http._tcp.local", 8080, "host.local").unique().build(),
    ];

    for rr in records {
        let msg = Message::response().with_answer(rr.clone());
        let decoded = wire::decode(&encode(&msg)).unwrap();

        assert_eq!(decoded.answers.len(), 1, "{}", rr);
        let back = &decoded.answers[0];
        assert!(back.same_data(&rr), "{} came back as {}", rr, back);
        assert_eq!(back.ttl, rr.ttl);
        assert_eq!(back.cache_flush, rr.cache_flush);
    }
}

#[test]
fn test_all_sections_and_header_survive() {
    let mut msg = Message::query()
        .with_question(Question::new("host.local", RecordType::ANY).with_unicast_response());
    msg.header.id = 0x1234;
    msg.answers
        .push(RecordBuilder::a("host.local", [10, 0, 0, 1]).build());
    msg.authorities
        .push(RecordBuilder::a("host.local", [10, 0, 0, 2]).unique().build());
    msg.additionals
        .push(RecordBuilder::hinfo("host.local", "arm", "bsd").build());

    let decoded = wire::decode(&encode(&msg)).unwrap();
    assert_eq!(decoded.header, msg.header);
    assert_eq!(decoded.questions, msg.questions);
    assert!(decoded.wants_unicast_response());
    assert_eq!(decoded.answers, msg.answers);
    assert_eq!(decoded.authorities, msg.authorities);
    assert_eq!(decoded.additionals, msg.additionals);
}

#[test]
fn test_shared_suffixes_are_compressed() {
    let first = RecordBuilder::a("alpha.example.local", [10, 0, 0, 1]).build();
    let second = RecordBuilder::a("beta.example.local", [10, 0, 0, 2]).build();

    let alone = |rr| wire::encoded_len(&Message::response().with_answer(rr)).unwrap();
    let separate = alone(first.clone()) + alone(second.clone()) - wire::HEADER_LEN;

    let together = Message::response().with_answer(first).with_answer(second);
    assert!(wire::encoded_len(&together).unwrap() < separate);
}

#[test]
fn test_embedded_names_use_pointers() {
    let msg = Message::response()
        .with_answer(RecordBuilder::a("host.local", [10, 0, 0, 1]).build())
        .with_answer(RecordBuilder::ptr("1.0.0.10.in-addr.arpa", "host.local").build());
    let bytes = encode(&msg);

    // "host.local" is spelled out once; the PTR target is a pointer.
    let spelled = bytes.windows(5).filter(|w| *w == b"\x04host").count();
    assert_eq!(spelled, 1);

    let decoded = wire::decode(&bytes).unwrap();
    assert_eq!(
        decoded.answers[1].rdata,
        RData::Ptr("host.local".to_string())
    );
}

#[test]
fn test_oversized_message_drops_whole_records() {
    let mut msg = Message::query().with_question(Question::new("host.local", RecordType::A));
    for i in 0..50u8 {
        msg.answers
            .push(RecordBuilder::txt("host.local", &[&"x".repeat(200), &i.to_string()]).build());
    }

    let bytes = wire::encode_with_limit(&msg, 1500).unwrap();
    assert!(bytes.len() <= 1500);

    let decoded = wire::decode(&bytes).unwrap();
    assert!(decoded.header.is_truncated());
    assert!(!decoded.answers.is_empty());
    assert!(decoded.answers.len() < 50);
    assert_eq!(decoded.answers[..], msg.answers[..decoded.answers.len()]);
}

#[test]
fn test_questions_larger_than_limit_fail() {
    let msg = Message::query().with_question(Question::new("host.local", RecordType::A));
    let err = wire::encode_with_limit(&msg, 20).unwrap_err();
    assert!(matches!(err, WireError::MessageTooLarge(_)));
}

fn header(qd: u16, an: u16) -> Vec<u8> {
    let mut buf = vec![0, 0, 0x84, 0];
    for count in [qd, an, 0, 0] {
        buf.extend_from_slice(&count.to_be_bytes());
    }
    buf
}

#[test]
fn test_unknown_record_type_is_skipped() {
    let mut buf = header(0, 2);
    // NULL-ish type 99 with 3 bytes of RDATA.
    buf.extend_from_slice(b"\x01x\x05local\x00");
    buf.extend_from_slice(&[0, 99, 0, 1, 0, 0, 0, 120, 0, 3, 1, 2, 3]);
    // A record after it.
    buf.extend_from_slice(b"\x01y\xc0\x0e");
    buf.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 120, 0, 4, 10, 0, 0, 7]);

    let decoded = wire::decode(&buf).unwrap();
    assert_eq!(decoded.answers.len(), 1);
    assert_eq!(decoded.answers[0].name, "y.local");
    assert_eq!(
        decoded.answers[0].rdata,
        RData::A("10.0.0.7".parse().unwrap())
    );
}

#[test]
fn test_dotted_instance_label_survives_reencoding() {
    let mut buf = header(0, 1);
    buf.extend_from_slice(b"\x05_http\x04_tcp\x05local\x00");
    buf.extend_from_slice(&[0, 12, 0, 1, 0, 0, 0, 120, 0, 13]);
    buf.extend_from_slice(b"\x0aMy.Printer\xc0\x0c");

    let decoded = wire::decode(&buf).unwrap();
    assert_eq!(
        decoded.answers[0].rdata,
        RData::Ptr("My\\.Printer._http._tcp.local".to_string())
    );
    assert_eq!(encode(&decoded), buf);
}

#[test]
fn test_non_utf8_label_survives_reencoding() {
    let mut buf = header(0, 1);
    buf.extend_from_slice(b"\x02\xffA\x05local\x00");
    buf.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 120, 0, 4, 10, 0, 0, 7]);

    let decoded = wire::decode(&buf).unwrap();
    assert_eq!(decoded.answers[0].name, "\\255A.local");
    assert_eq!(encode(&decoded), buf);
}

#[test]
fn test_forward_pointer_is_rejected() {
    let mut buf = header(0, 1);
    // Owner name points past itself.
    buf.extend_from_slice(&[0xc0, 0x1c]);
    buf.extend_from_slice(&[0, 1, 0, 1, 0, 0, 0, 120, 0, 4, 10, 0, 0, 7]);
    buf.extend_from_slice(b"\x01z\x00");

    let err = wire::decode(&buf).unwrap_err();
    assert!(matches!(err, WireError::BadPointer { .. }));
}

#[test]
fn test_short_header_is_truncated() {
    assert_eq!(wire::decode(&[0u8; 11]).unwrap_err(), WireError::Truncated);
}

#[test]
fn test_hickory_reads_our_packets() {
    use hickory_proto::op::Message as HickoryMessage;
    use hickory_proto::rr::RData as HickoryRData;

    let msg = Message::response()
        .with_answer(RecordBuilder::a("host.local", [192, 168, 1, 10]).build())
        .with_answer(RecordBuilder::ptr("_http._tcp.local", "Web._http._tcp.local").build())
        .with_answer(RecordBuilder::srv("Web._http._tcp.local", 8080, "host.local").build())
        .with_answer(RecordBuilder::txt("Web._http._tcp.local", &["path=/"]).build());

    let parsed = HickoryMessage::from_vec(&encode(&msg)).unwrap();
    let answers = parsed.answers();
    assert_eq!(answers.len(), 4);

    let names: Vec<String> = answers
        .iter()
        .map(|r| r.name().to_utf8().trim_end_matches('.').to_string())
        .collect();
    assert_eq!(
        names,
        vec![
            "host.local",
            "_http._tcp.local",
            "Web._http._tcp.local",
            "Web._http._tcp.local"
        ]
    );

    match answers[0].data() {
        HickoryRData::A(a) => assert_eq!(a.0, "192.168.1.10".parse::<std::net::Ipv4Addr>().unwrap()),
        other => panic!("expected A, got {:?}", other),
    }
    match answers[1].data() {
        HickoryRData::PTR(ptr) => assert_eq!(ptr.0.to_utf8(), "Web._http._tcp.local."),
        other => panic!("expected PTR, got {:?}", other),
    }
    match answers[2].data() {
        HickoryRData::SRV(srv) => {
            assert_eq!(srv.port(), 8080);
            assert_eq!(srv.target().to_utf8(), "host.local.");
        }
        other => panic!("expected SRV, got {:?}", other),
    }
}
