//! Property-based tests using proptest
//!
//! Framing round trips, fragmented delivery and id allocation, checked
//! against arbitrary inputs.

use std::collections::HashSet;

use fusenet::protocol::{Encoder, Frame, FrameCursor, FrameDecoder, Request};
use fusenet::session::ServerSession;
use fusenet::storage::{ArticleContent, Database, MemoryDatabase, shared};
use fusenet::transport::SocketTransport;
use fusenet::types::{ArticleId, ClientAddress, MaxStringLength, NewsgroupId};
use proptest::prelude::*;

fn peer() -> ClientAddress {
    ClientAddress::from(std::net::SocketAddr::from(([127, 0, 0, 1], 4000)))
}

fn encode(build: impl FnOnce(&mut Encoder<'_>)) -> Vec<u8> {
    let mut transport = SocketTransport::new("prop");
    build(&mut Encoder::new(&mut transport));
    transport.take_outgoing()
}

/// Any request a client could send
fn arb_request() -> impl Strategy<Value = Request> {
    let group = any::<i32>().prop_map(NewsgroupId::new);
    let article = any::<i32>().prop_map(ArticleId::new);
    let text = ".{0,40}";
    prop_oneof![
        Just(Request::ListNewsgroups),
        text.prop_map(|name| Request::CreateNewsgroup { name }),
        group.clone().prop_map(|group| Request::DeleteNewsgroup { group }),
        group.clone().prop_map(|group| Request::ListArticles { group }),
        (group.clone(), text, text, text).prop_map(|(group, title, author, text)| {
            Request::CreateArticle {
                group,
                content: ArticleContent::new(title, author, text),
            }
        }),
        (group.clone(), article.clone()).prop_map(|(group, article)| Request::DeleteArticle { group, article }),
        (group, article).prop_map(|(group, article)| Request::GetArticle { group, article }),
    ]
}

/// Server output for `bytes` delivered in the given chunk sizes
fn serve_in_chunks(bytes: &[u8], chunk: usize) -> Vec<u8> {
    let db = shared(MemoryDatabase::new());
    let mut session = ServerSession::new(peer(), db, MaxStringLength::DEFAULT);
    let mut transport = SocketTransport::new("prop");
    for piece in bytes.chunks(chunk.max(1)) {
        session.feed(piece, &mut transport).expect("valid request stream");
    }
    transport.take_outgoing()
}

proptest! {
    #[test]
    fn prop_string_round_trip(s in any::<String>()) {
        let bytes = encode(|e| e.send_string(&s));
        let frames = FrameDecoder::default().decode_all(&bytes).unwrap();
        let mut cursor = FrameCursor::new(&frames);
        prop_assert_eq!(cursor.receive_string().unwrap(), s);
        prop_assert!(cursor.finish().is_ok());
    }

    #[test]
    fn prop_number_round_trip(n in any::<i32>()) {
        let bytes = encode(|e| e.send_number(n));
        prop_assert_eq!(bytes.len(), 5);
        let frames = FrameDecoder::default().decode_all(&bytes).unwrap();
        prop_assert_eq!(frames, vec![Frame::Number(n)]);
    }

    #[test]
    fn prop_decoding_is_split_invariant(
        strings in prop::collection::vec(".{0,20}", 0..5),
        numbers in prop::collection::vec(any::<i32>(), 0..5),
        split in any::<prop::sample::Index>(),
    ) {
        let bytes = encode(|e| {
            for s in &strings {
                e.send_string(s);
            }
            for n in &numbers {
                e.send_number(*n);
            }
        });
        let whole = FrameDecoder::default().decode_all(&bytes).unwrap();

        let at = if bytes.is_empty() { 0 } else { split.index(bytes.len() + 1) };
        let mut decoder = FrameDecoder::default();
        let mut parts = Vec::new();
        decoder.decode(&bytes[..at], &mut parts).unwrap();
        decoder.decode(&bytes[at..], &mut parts).unwrap();

        prop_assert!(decoder.is_at_boundary());
        prop_assert_eq!(parts, whole);
    }

    #[test]
    fn prop_request_round_trip(request in arb_request()) {
        let bytes = encode(|e| request.encode(e));
        let frames = FrameDecoder::default().decode_all(&bytes).unwrap();
        prop_assert_eq!(Request::decode(&frames).unwrap(), request);
    }

    #[test]
    fn prop_fragmented_delivery_matches_whole(
        requests in prop::collection::vec(arb_request(), 1..6),
        chunk in 1usize..8,
    ) {
        let mut bytes = Vec::new();
        for request in &requests {
            bytes.extend(encode(|e| request.encode(e)));
        }

        let whole = serve_in_chunks(&bytes, bytes.len());
        prop_assert_eq!(serve_in_chunks(&bytes, 1), whole.clone());
        prop_assert_eq!(serve_in_chunks(&bytes, chunk), whole);
    }

    #[test]
    fn prop_live_newsgroup_ids_unique(ops in prop::collection::vec((any::<bool>(), 0usize..8), 1..40)) {
        let mut db = MemoryDatabase::new();
        let mut issued = HashSet::new();
        let mut live = Vec::new();

        for (i, (create, pick)) in ops.into_iter().enumerate() {
            if create || live.is_empty() {
                let id = db.create_newsgroup(&format!("group{i}")).unwrap();
                prop_assert!(issued.insert(id), "id {} issued twice", id);
                live.push(id);
            } else {
                let id = live.remove(pick % live.len());
                db.delete_newsgroup(id).unwrap();
            }

            let listed: Vec<_> = db.get_newsgroup_list().unwrap().into_iter().map(|g| g.id).collect();
            let unique: HashSet<_> = listed.iter().collect();
            prop_assert_eq!(unique.len(), listed.len());
            prop_assert_eq!(listed.len(), live.len());
        }
    }
}
