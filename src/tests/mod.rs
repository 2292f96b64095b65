use std::cell::RefCell;

use crate::favourites::Toggled;
use crate::render::SurfaceKind;
use crate::runner::{Gesture, Options, RunnerError, Session};
use crate::search::{SearchMode, SearchOutcome};
use crate::source::{CharacterId, CharacterRecord, CharacterSource, SourceError};
use crate::store::{FileStore, KeyValueStore, MemoryStore, FAVOURITES_KEY};

#[derive(Default)]
struct StaticSource {
    catalog: Vec<CharacterRecord>,
    fail_page: bool,
    fail_search: bool,
    calls: RefCell<Vec<String>>,
}

impl StaticSource {
    fn new(catalog: Vec<CharacterRecord>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CharacterSource for StaticSource {
    async fn fetch_page(&self, size: u32) -> Result<Vec<CharacterRecord>, SourceError> {
        self.calls.borrow_mut().push(format!("page:{size}"));
        if self.fail_page {
            return Err(SourceError::Status {
                url: "http://catalog/character".to_string(),
                status: 503,
            });
        }
        Ok(self.catalog.iter().take(size as usize).cloned().collect())
    }

    async fn fetch_by_id(&self, id: CharacterId) -> Result<CharacterRecord, SourceError> {
        self.calls.borrow_mut().push(format!("id:{id}"));
        self.catalog
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(SourceError::NotFound { id })
    }

    async fn search_by_name(&self, text: &str) -> Result<Vec<CharacterRecord>, SourceError> {
        self.calls.borrow_mut().push(format!("name:{text}"));
        if self.fail_search {
            return Err(SourceError::Status {
                url: "http://catalog/character".to_string(),
                status: 500,
            });
        }
        let needle = text.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}

fn mickey_and_donald() -> Vec<CharacterRecord> {
    vec![
        CharacterRecord::new(1, "Mickey"),
        CharacterRecord::new(2, "Donald"),
    ]
}

fn catalog() -> Vec<CharacterRecord> {
    vec![
        CharacterRecord::new(1, "Mickey Mouse"),
        CharacterRecord::new(2, "Donald Duck"),
        CharacterRecord::new(3, "Goofy"),
        CharacterRecord::new(4, "Minnie Mouse").with_image("https://img/minnie.png"),
        CharacterRecord::new(99, "Scrooge McDuck"),
    ]
}

fn session_with<S: KeyValueStore>(
    source: StaticSource,
    store: S,
    options: Options,
) -> Session<StaticSource, S> {
    Session::new(options, source, store).unwrap()
}

fn session(source: StaticSource) -> Session<StaticSource, MemoryStore> {
    session_with(source, MemoryStore::new(), Options::default())
}

fn persisted<C: CharacterSource>(session: &Session<C, MemoryStore>) -> Option<String> {
    session
        .synchronizer()
        .store()
        .inner()
        .get(FAVOURITES_KEY)
        .unwrap()
}

fn ids(session: &Session<StaticSource, impl KeyValueStore>, kind: SurfaceKind) -> Vec<i64> {
    session
        .state()
        .surface(kind)
        .cards()
        .iter()
        .map(|c| c.id)
        .collect()
}

#[tokio::test]
async fn page_load_without_favourites_shows_undecorated_cards() {
    let mut s = session(StaticSource::new(mickey_and_donald()));
    let report = s.start().await.unwrap();
    assert_eq!(report.restored, 0);
    assert_eq!(report.rendered, 2);
    assert_eq!(report.error, None);

    let primary = s.state().surface(SurfaceKind::Primary);
    assert_eq!(primary.len(), 2);
    assert!(primary.cards().iter().all(|c| !c.decorated));
    assert!(s.state().surface(SurfaceKind::Favourites).is_empty());
    assert_eq!(s.source().calls(), vec!["page:50".to_string()]);
}

#[tokio::test]
async fn activating_a_card_favourites_and_persists_it() {
    let mut s = session(StaticSource::new(mickey_and_donald()));
    s.start().await.unwrap();

    assert_eq!(s.dispatch(Gesture::Activate(1)).unwrap(), Toggled::Added);
    assert_eq!(s.state().favourites().ids().collect::<Vec<_>>(), vec![1]);
    let fav = s.state().surface(SurfaceKind::Favourites).find(1).unwrap();
    assert!(fav.decorated);
    assert!(fav.close_control);
    assert_eq!(
        persisted(&s).as_deref(),
        Some(r#"[{"_id":1,"name":"Mickey"}]"#)
    );
}

#[tokio::test]
async fn close_control_unfavourites_everywhere() {
    let mut s = session(StaticSource::new(mickey_and_donald()));
    s.start().await.unwrap();
    s.dispatch(Gesture::Activate(1)).unwrap();

    assert_eq!(s.dispatch(Gesture::Close(1)).unwrap(), Toggled::Removed);
    assert!(s.state().favourites().is_empty());
    assert!(s.state().surface(SurfaceKind::Favourites).is_empty());
    assert!(!s.state().surface(SurfaceKind::Primary).find(1).unwrap().decorated);
    assert_eq!(persisted(&s).as_deref(), Some("[]"));
}

#[tokio::test]
async fn close_on_a_card_without_close_control_is_rejected() {
    let mut s = session(StaticSource::new(mickey_and_donald()));
    s.start().await.unwrap();
    let err = s.dispatch(Gesture::Close(2)).unwrap_err();
    assert!(matches!(err, RunnerError::NotAFavourite { id: 2 }));
    assert_eq!(persisted(&s), None);
}

#[tokio::test]
async fn search_without_matches_renders_empty_list() {
    let mut s = session(StaticSource::new(catalog()));
    s.start().await.unwrap();
    s.dispatch(Gesture::Activate(3)).unwrap();

    let outcome = s.search("xyz-no-match").await.unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::Rendered {
            count: 0,
            surface: SurfaceKind::Primary
        }
    );
    assert!(s.state().surface(SurfaceKind::Primary).is_empty());
    assert_eq!(s.state().display().error, None);
    assert_eq!(s.state().favourites().ids().collect::<Vec<_>>(), vec![3]);
    assert_eq!(s.state().check_consistency(), Ok(()));
}

#[tokio::test]
async fn empty_search_text_is_sent_as_is() {
    let mut s = session(StaticSource::new(catalog()));
    s.start().await.unwrap();
    s.search("").await.unwrap();
    assert_eq!(s.source().calls().last().map(String::as_str), Some("name:"));
    assert_eq!(s.state().surface(SurfaceKind::Primary).len(), catalog().len());
}

#[tokio::test]
async fn reset_with_three_favourites_clears_all_views() {
    let mut s = session(StaticSource::new(catalog()));
    s.start().await.unwrap();
    for id in [1, 2, 3] {
        s.dispatch(Gesture::Activate(id)).unwrap();
    }
    assert_eq!(s.reset().unwrap(), 3);

    assert!(s.state().favourites().is_empty());
    assert!(s.state().surface(SurfaceKind::Favourites).is_empty());
    assert!(s
        .state()
        .surface(SurfaceKind::Primary)
        .cards()
        .iter()
        .all(|c| !c.decorated));
    assert_eq!(persisted(&s).as_deref(), Some("[]"));
}

#[tokio::test]
async fn search_keeps_favourite_decoration_and_prevents_duplicates() {
    let mut s = session(StaticSource::new(catalog()));
    s.start().await.unwrap();
    s.dispatch(Gesture::Activate(1)).unwrap();

    s.search("mouse").await.unwrap();
    assert_eq!(ids(&s, SurfaceKind::Primary), vec![1, 4]);
    assert!(s.state().surface(SurfaceKind::Primary).find(1).unwrap().decorated);

    // Favouriting the other result appends it once; the first stays single.
    assert_eq!(s.dispatch(Gesture::Activate(4)).unwrap(), Toggled::Added);
    assert_eq!(ids(&s, SurfaceKind::Favourites), vec![1, 4]);
    assert_eq!(s.state().favourites().len(), 2);
    assert_eq!(s.state().check_consistency(), Ok(()));
}

#[tokio::test]
async fn swap_mode_uses_a_separate_list_and_can_go_back() {
    let options = Options {
        search_mode: SearchMode::Swap,
        ..Options::default()
    };
    let mut s = session_with(StaticSource::new(catalog()), MemoryStore::new(), options);
    s.start().await.unwrap();
    s.dispatch(Gesture::Activate(2)).unwrap();

    let outcome = s.search("duck").await.unwrap();
    assert_eq!(
        outcome,
        SearchOutcome::Rendered {
            count: 2,
            surface: SurfaceKind::Search
        }
    );
    assert_eq!(s.state().display().visible, SurfaceKind::Search);
    assert_eq!(ids(&s, SurfaceKind::Search), vec![2, 99]);
    assert_eq!(s.state().surface(SurfaceKind::Primary).len(), 5);

    // Unfavouriting from the search list clears the primary card too.
    assert_eq!(s.dispatch(Gesture::Activate(2)).unwrap(), Toggled::Removed);
    assert!(!s.state().surface(SurfaceKind::Primary).find(2).unwrap().decorated);
    assert_eq!(s.state().check_consistency(), Ok(()));

    s.show_all().unwrap();
    assert_eq!(s.state().display().visible, SurfaceKind::Primary);
}

#[tokio::test]
async fn persisted_favourites_are_restored_and_decorated() {
    let mut store = MemoryStore::new();
    store
        .set(
            FAVOURITES_KEY,
            r#"[{"_id":3,"name":"Goofy"},{"_id":1234,"name":"Not on the page"}]"#,
        )
        .unwrap();
    let mut s = session_with(StaticSource::new(catalog()), store, Options::default());
    let report = s.start().await.unwrap();

    assert_eq!(report.restored, 2);
    assert_eq!(ids(&s, SurfaceKind::Favourites), vec![3, 1234]);
    assert!(s.state().surface(SurfaceKind::Primary).find(3).unwrap().decorated);
    assert_eq!(s.state().check_consistency(), Ok(()));
    // Restoring does not write the snapshot back.
    assert_eq!(
        persisted(&s).as_deref(),
        Some(r#"[{"_id":3,"name":"Goofy"},{"_id":1234,"name":"Not on the page"}]"#)
    );
}

#[tokio::test]
async fn failed_page_load_is_recovered_into_an_error_indicator() {
    let mut store = MemoryStore::new();
    store
        .set(FAVOURITES_KEY, r#"[{"_id":3,"name":"Goofy"}]"#)
        .unwrap();
    let source = StaticSource {
        fail_page: true,
        ..StaticSource::new(catalog())
    };
    let mut s = session_with(source, store, Options::default());
    let report = s.start().await.unwrap();

    assert_eq!(report.rendered, 0);
    assert!(report.error.is_some());
    assert!(s.state().display().error.is_some());
    assert!(s.state().surface(SurfaceKind::Primary).is_empty());
    assert_eq!(ids(&s, SurfaceKind::Favourites), vec![3]);
}

#[tokio::test]
async fn failed_search_leaves_favourites_alone() {
    let source = StaticSource {
        fail_search: true,
        ..StaticSource::new(catalog())
    };
    let mut s = session(source);
    s.start().await.unwrap();
    s.dispatch(Gesture::Activate(1)).unwrap();
    let before = persisted(&s);

    let outcome = s.search("mickey").await.unwrap();
    assert!(matches!(outcome, SearchOutcome::Failed { .. }));
    assert!(s.state().display().error.is_some());
    assert!(s.state().surface(SurfaceKind::Primary).is_empty());
    assert_eq!(ids(&s, SurfaceKind::Favourites), vec![1]);
    assert_eq!(persisted(&s), before);

    // A later successful search clears the indicator.
    let mut ok = session(StaticSource::new(catalog()));
    ok.start().await.unwrap();
    ok.search("goofy").await.unwrap();
    assert_eq!(ok.state().display().error, None);
}

#[tokio::test]
async fn activating_an_unrendered_id_fetches_it_first() {
    let options = Options {
        page_size: 2,
        ..Options::default()
    };
    let mut s = session_with(StaticSource::new(catalog()), MemoryStore::new(), options);
    s.start().await.unwrap();
    assert_eq!(ids(&s, SurfaceKind::Primary), vec![1, 2]);

    assert_eq!(s.activate_by_id(99).await.unwrap(), Toggled::Added);
    assert_eq!(ids(&s, SurfaceKind::Primary), vec![1, 2, 99]);
    assert!(s.source().calls().contains(&"id:99".to_string()));

    // Already rendered: no extra lookup.
    assert_eq!(s.activate_by_id(1).await.unwrap(), Toggled::Added);
    assert!(!s.source().calls().contains(&"id:1".to_string()));
}

#[tokio::test]
async fn activating_an_unknown_id_changes_nothing() {
    let mut s = session(StaticSource::new(mickey_and_donald()));
    s.start().await.unwrap();
    let err = s.activate_by_id(404).await.unwrap_err();
    assert!(matches!(
        err,
        RunnerError::Source(SourceError::NotFound { id: 404 })
    ));
    assert_eq!(s.state().surface(SurfaceKind::Primary).len(), 2);
    assert!(s.state().favourites().is_empty());
}

#[tokio::test]
async fn membership_stays_consistent_across_mixed_gestures() {
    let options = Options {
        search_mode: SearchMode::Swap,
        ..Options::default()
    };
    let mut s = session_with(StaticSource::new(catalog()), MemoryStore::new(), options);
    s.start().await.unwrap();

    s.dispatch(Gesture::Activate(1)).unwrap();
    s.dispatch(Gesture::Activate(3)).unwrap();
    s.search("mouse").await.unwrap();
    s.dispatch(Gesture::Activate(4)).unwrap();
    s.dispatch(Gesture::Close(1)).unwrap();
    s.show_all().unwrap();
    s.dispatch(Gesture::Activate(1)).unwrap();
    s.dispatch(Gesture::Activate(3)).unwrap();
    s.search("goofy").await.unwrap();

    assert_eq!(s.state().check_consistency(), Ok(()));
    assert_eq!(ids(&s, SurfaceKind::Favourites), vec![4, 1]);
    let stored: Vec<CharacterRecord> =
        serde_json::from_str(&persisted(&s).unwrap()).unwrap();
    assert_eq!(stored.as_slice(), s.state().favourites().records());
}

#[tokio::test]
async fn favourites_survive_a_new_session_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");

    let mut first = session_with(
        StaticSource::new(catalog()),
        FileStore::new(&path),
        Options::default(),
    );
    first.start().await.unwrap();
    first.dispatch(Gesture::Activate(4)).unwrap();
    first.dispatch(Gesture::Activate(2)).unwrap();

    let mut second = session_with(
        StaticSource::new(catalog()),
        FileStore::new(&path),
        Options::default(),
    );
    let report = second.start().await.unwrap();
    assert_eq!(report.restored, 2);
    assert_eq!(ids(&second, SurfaceKind::Favourites), vec![4, 2]);
    let minnie = second
        .state()
        .surface(SurfaceKind::Favourites)
        .find(4)
        .unwrap();
    assert_eq!(minnie.image_url, "https://img/minnie.png");
}

#[test]
fn zero_page_size_is_rejected() {
    let result = Session::new(
        Options {
            page_size: 0,
            ..Options::default()
        },
        StaticSource::default(),
        MemoryStore::new(),
    );
    assert!(matches!(
        result,
        Err(RunnerError::InvalidPageSize { value: 0 })
    ));
}
