//! End-to-end restoration: URL precedence, stripping, legacy fragments and
//! draft fallback.

use chrono::{DateTime, Duration, TimeZone, Utc};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use selcodec::lz::compress_to_encoded_uri_component;
use selcodec::{
    encode_shortest, share_url, Catalog, CatalogIndex, DraftConfig, DraftRecord, DraftWriter,
    FileStore, KeyValueStore, MemoryStore, RestoreState, Restorer, SelectionSet,
    SelectionSource, SelectionStateStore, Transport,
};
use url::Url;

const CATALOG: &str = r#"[
    {
        "liveName": "Spring Tour",
        "years": [
            {"year": 2024, "shows": [
                {"date": "2024-04-01", "venue": "Hall A", "prefecture": "Tokyo"},
                {"date": "2024-04-02", "time": "AM", "venue": "Hall B", "prefecture": "Tokyo"},
                {"date": "2024-04-02", "time": "PM", "venue": "Hall B", "prefecture": "Tokyo"},
                {"date": "2024-04-05", "venue": "Dome", "prefecture": "Osaka"}
            ]}
        ]
    },
    {
        "liveName": "Winter Hall",
        "years": [
            {"year": "2025", "shows": [
                {"date": "2025-01-10", "venue": "Rock Hall", "prefecture": "Aichi"},
                {"date": "2025-01-11", "venue": "Rock Hall", "prefecture": "Aichi"},
                {"date": "2025-01-12", "venue": "Sea  Arena", "prefecture": "Fukuoka"},
                {"date": "2025-01-13", "venue": "Sea Arena", "prefecture": "Fukuoka"},
                {"date": "2025-01-14", "venue": "Sky Hall", "prefecture": "Hokkaido"},
                {"date": "2025-01-15", "venue": "Sky Hall", "prefecture": "Hokkaido"}
            ]}
        ]
    }
]"#;

fn index() -> CatalogIndex {
    CatalogIndex::new(&Catalog::from_json_str(CATALOG).unwrap())
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 1, 9, 30, 0).unwrap()
}

fn drafts() -> SelectionStateStore<MemoryStore> {
    SelectionStateStore::new(MemoryStore::new(), &DraftConfig::default())
}

fn saved_draft(index: &CatalogIndex, selection: &[u32], saved_at: DateTime<Utc>) -> SelectionStateStore<MemoryStore> {
    let mut store = drafts();
    let record = DraftRecord::capture(index, &selection.into(), "draft name", "drafty", saved_at);
    store.save(&record).unwrap();
    store
}

fn transport(href: &str) -> Transport {
    Transport::parse(href).unwrap()
}

#[test]
fn share_link_round_trips_through_restore() {
    let index = index();
    let selection: SelectionSet = [0u32, 1, 2, 9].into();
    let encoded = encode_shortest(&selection, index.len());
    let base = Url::parse("https://lives.example/").unwrap();
    let link = share_url(&base, &encoded, "mika", "@mika");

    let out = Restorer::new(&index).from_transport(&Transport::from_url(link));
    assert_eq!(out.selection, Some(selection));
    assert_eq!(out.name.as_deref(), Some("mika"));
    assert_eq!(out.handle.as_deref(), Some("mika"));
    assert!(out.errors.is_empty());
}

#[test]
fn checked_state_follows_selection() {
    let index = index();
    let out = Restorer::new(&index).from_transport(&transport("https://lives.example/?r=1-2,99"));
    let checked = out.checked(&index).unwrap();
    assert_eq!(
        checked,
        vec![false, true, true, false, false, false, false, false, false, false]
    );
}

#[test]
fn stripping_is_idempotent() {
    let index = index();
    let restorer = Restorer::new(&index);

    let first = restorer.from_transport(&transport("https://lives.example/?b=Bg&n=mika&x=mika"));
    assert_eq!(first.state, RestoreState::BitsetPresent);
    assert_eq!(first.selection.unwrap().to_sorted_vec(), vec![1, 2]);

    let visible = first.replace_url.unwrap();
    assert_eq!(visible.as_str(), "https://lives.example/?n=mika&x=mika");

    let second = restorer.from_transport(&Transport::from_url(visible));
    assert_eq!(second.state, RestoreState::NoState);
    assert_eq!(second.selection, None);
    assert_eq!(second.replace_url, None);
    assert_eq!(second.name.as_deref(), Some("mika"));
    assert_eq!(second.handle.as_deref(), Some("mika"));
}

#[test]
fn range_beats_delta_beats_bitset() {
    let index = index();
    let restorer = Restorer::new(&index);

    let out = restorer.from_transport(&transport("https://lives.example/?b=Bg&d=5&r=0"));
    assert_eq!(out.state, RestoreState::RangePresent);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![0]);

    let out = restorer.from_transport(&transport("https://lives.example/?b=Bg&d=5"));
    assert_eq!(out.state, RestoreState::DeltaPresent);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![5]);
}

#[test]
fn explicit_empty_selection_differs_from_absence() {
    let index = index();
    let restorer = Restorer::new(&index);

    let cleared = restorer.from_transport(&transport("https://lives.example/?r="));
    assert_eq!(cleared.checked(&index), Some(vec![false; 10]));

    let untouched = restorer.from_transport(&transport("https://lives.example/"));
    assert_eq!(untouched.checked(&index), None);
}

#[test]
fn legacy_compressed_fragment() {
    let index = index();
    let json = r#"{"v":1,"n":"old","x":"@oldie","c":["SPRING TOUR|2024-04-02|HALL B|PM","WINTER HALL|2025-01-12|SEA ARENA|"]}"#;
    let href = format!(
        "https://lives.example/#s={}",
        compress_to_encoded_uri_component(json)
    );

    let out = Restorer::new(&index).from_transport(&transport(&href));
    assert_eq!(out.state, RestoreState::LegacyCompressed);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![2, 6]);
    assert_eq!(out.name.as_deref(), Some("old"));
    assert_eq!(out.handle.as_deref(), Some("oldie"));
    assert_eq!(out.replace_url, None);
}

#[test]
fn legacy_plain_fragment_with_short_ids() {
    let index = index();
    let short = index.items()[3].legacy_short_id();
    let json = format!(r#"{{"v":1,"n":"","x":"","c":["{}"]}}"#, short);
    let href = format!(
        "https://lives.example/#s0={}",
        utf8_percent_encode(&json, NON_ALPHANUMERIC)
    );

    let t = transport(&href);
    assert!(matches!(t.source(), SelectionSource::LegacyPlain(_)));
    let out = Restorer::new(&index).from_transport(&t);
    assert_eq!(out.state, RestoreState::LegacyPlain);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![3]);
}

#[test]
fn draft_fills_in_when_url_is_bare() {
    let index = index();
    let mut store = saved_draft(&index, &[4, 5, 6], now() - Duration::days(2));

    let out = Restorer::new(&index).restore(&transport("https://lives.example/"), &mut store, now());
    assert_eq!(out.state, RestoreState::DraftOnly);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![4, 5, 6]);
    assert_eq!(out.name.as_deref(), Some("draft name"));
    assert_eq!(out.handle.as_deref(), Some("drafty"));
}

#[test]
fn url_fields_win_over_draft_field_by_field() {
    let index = index();
    let mut store = saved_draft(&index, &[4, 5, 6], now() - Duration::days(2));

    let out = Restorer::new(&index).restore(
        &transport("https://lives.example/?r=0&n=from+url"),
        &mut store,
        now(),
    );
    assert_eq!(out.state, RestoreState::RangePresent);
    assert_eq!(out.selection.unwrap().to_sorted_vec(), vec![0]);
    assert_eq!(out.name.as_deref(), Some("from url"));
    // No `x` in the URL, so the draft's handle is used.
    assert_eq!(out.handle.as_deref(), Some("drafty"));
}

#[test]
fn any_fragment_blocks_draft_selection() {
    let index = index();
    let mut store = saved_draft(&index, &[4], now() - Duration::days(1));

    let out = Restorer::new(&index).restore(
        &transport("https://lives.example/#s=!!!"),
        &mut store,
        now(),
    );
    assert_eq!(out.state, RestoreState::LegacyCompressed);
    assert_eq!(out.selection, None);
    assert_eq!(out.name.as_deref(), Some("draft name"));
    assert_eq!(out.errors.len(), 1);
}

#[test]
fn expired_draft_is_ignored_and_removed() {
    let index = index();
    let mut store = saved_draft(&index, &[4, 5], now() - Duration::days(31));

    let out = Restorer::new(&index).restore(&transport("https://lives.example/"), &mut store, now());
    assert_eq!(out.state, RestoreState::NoState);
    assert_eq!(out.selection, None);
    assert_eq!(out.name, None);
    assert_eq!(store.inner().get("pgll_draft_v1").unwrap(), None);
}

#[test]
fn corrupt_draft_is_reported_not_raised() {
    let index = index();
    let mut inner = MemoryStore::new();
    inner.set("pgll_draft_v1", "{\"t\": \"yesterday\"}").unwrap();
    let mut store = SelectionStateStore::new(inner, &DraftConfig::default());

    let out = Restorer::new(&index).restore(&transport("https://lives.example/?n=a"), &mut store, now());
    assert_eq!(out.state, RestoreState::NoState);
    assert_eq!(out.name.as_deref(), Some("a"));
    assert_eq!(out.errors.len(), 1);
}

#[test]
fn draft_written_to_disk_restores_later() {
    let index = index();
    let dir = tempfile::tempdir().unwrap();
    let config = DraftConfig::default();

    let mut store = SelectionStateStore::new(FileStore::open(dir.path()).unwrap(), &config);
    let mut writer = DraftWriter::new(&config);
    let selection: SelectionSet = [7u32, 8, 9].into();
    let record = DraftRecord::capture(&index, &selection, "mika", "mika", now());
    assert!(writer.write_now(&mut store, &record));

    let mut reopened = SelectionStateStore::new(FileStore::open(dir.path()).unwrap(), &config);
    let out = Restorer::new(&index).restore(
        &transport("https://lives.example/"),
        &mut reopened,
        now() + Duration::hours(1),
    );
    assert_eq!(out.state, RestoreState::DraftOnly);
    assert_eq!(out.selection, Some(selection));
    assert_eq!(out.handle.as_deref(), Some("mika"));
}

#[test]
fn stale_indices_are_ignored_on_apply() {
    let index = index();
    let out = Restorer::new(&index).from_transport(&transport("https://lives.example/?d=9.1"));
    assert_eq!(out.selection.as_ref().unwrap().to_sorted_vec(), vec![9]);
    assert_eq!(out.checked(&index).unwrap().iter().filter(|&&on| on).count(), 1);
}
