//! Session store benchmark: append and full load for both backends.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use keystyle::config::DEFAULT_PROMPT;
use keystyle::storage::{JsonSessionStore, SecureSessionStore, SessionStore};
use keystyle::{KeyEvent, Session};
use tempfile::tempdir;

fn make_session() -> Session {
    let events = DEFAULT_PROMPT
        .chars()
        .enumerate()
        .map(|(i, ch)| KeyEvent::new(ch.to_string(), i as f64 * 120.0, i as f64 * 120.0 + 85.0))
        .collect();
    Session::new("bench", DEFAULT_PROMPT, events)
}

fn bench_sqlite_append(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let store = SecureSessionStore::open(&dir.path().join("sessions.db"), b"bench-secret").unwrap();
    let session = make_session();

    c.bench_function("sqlite_append_session", |b| {
        b.iter(|| {
            let mut s = session.clone();
            s.id = uuid::Uuid::new_v4().to_string();
            black_box(store.append(&s)).unwrap()
        })
    });
}

fn bench_load_all(c: &mut Criterion) {
    let dir = tempdir().unwrap();
    let sqlite = SecureSessionStore::open(&dir.path().join("sessions.db"), b"bench-secret").unwrap();
    let json = JsonSessionStore::new(dir.path().join("sessions.json"));
    for _ in 0..30 {
        let s = make_session();
        sqlite.append(&s).unwrap();
        json.append(&s).unwrap();
    }

    c.bench_function("sqlite_load_30_sessions", |b| {
        b.iter(|| black_box(sqlite.load_all()).unwrap())
    });
    c.bench_function("json_load_30_sessions", |b| {
        b.iter(|| black_box(json.load_all()).unwrap())
    });
}

criterion_group!(benches, bench_sqlite_append, bench_load_all);
criterion_main!(benches);
