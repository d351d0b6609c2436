#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use log::{debug, info, warn};

use crate::utils::errors::Errors;
use crate::utils::title::{canonical_key, display_title, page_route};
use crate::utils::wiki_types::{Archive, ArchiveEntry, LoadOutcome, Page};
use crate::utils::wiki_utils::get_files_in_dir;

// ***************************************************************************
//                                Constants
// ***************************************************************************
const PAGE_EXT        : &str = "txt";
const PAGE_FILE_MODE  : u32  = 0o600;

// ***************************************************************************
//                               PageStore
// ***************************************************************************
/** Flat-file persistence for pages.  Each page lives in its own
 * `<canonical title>.txt` file directly under the data directory.
 *
 * Writes to the same title are serialized through a per-title lock.  Writes
 * are not atomic; a crash during a save can leave a partially written file.
 */
#[derive(Debug)]
pub struct PageStore {
    data_dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl PageStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {data_dir: data_dir.into(), locks: Mutex::new(HashMap::new())}
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    // -----------------------------------------------------------------------
    // load:
    // -----------------------------------------------------------------------
    /** Read a page.  Every failure, including permission problems, is
     * reported as Absent because the caller's only recovery is to offer an
     * empty edit form.
     */
    pub fn load(&self, title: &str) -> LoadOutcome {
        let path = match self.page_path(title) {
            Ok(p) => p,
            Err(e) => {
                debug!("{}", e);
                return LoadOutcome::Absent;
            }
        };

        match fs::read(&path) {
            Ok(body) => LoadOutcome::Found(Page::new(canonical_key(title), body)),
            Err(e) => {
                if e.kind() != ErrorKind::NotFound {
                    warn!("Unable to read page file {:?}: {}", path, e);
                }
                LoadOutcome::Absent
            }
        }
    }

    // -----------------------------------------------------------------------
    // save:
    // -----------------------------------------------------------------------
    /** Write the page body, creating or truncating its file. */
    pub fn save(&self, page: &Page) -> Result<(), Errors> {
        self.write_page(page, false).map(|_| ())
    }

    // -----------------------------------------------------------------------
    // create:
    // -----------------------------------------------------------------------
    /** Write the page only if no file exists for its title yet.  Returns
     * true when the file was created.
     */
    pub fn create(&self, page: &Page) -> Result<bool, Errors> {
        self.write_page(page, true)
    }

    // -----------------------------------------------------------------------
    // list_titles:
    // -----------------------------------------------------------------------
    /** Enumerate the pages in the data directory, sorted by canonical title
     * and truncated to limit entries.  The archive records how many pages
     * exist in total so callers can indicate that the listing is partial.
     */
    pub fn list_titles(&self, limit: usize) -> Result<Archive, Errors> {
        if !self.data_dir.is_dir() {
            return Ok(Archive::new(vec!(), 0));
        }

        let dir = self.data_dir.to_string_lossy();
        let files = get_files_in_dir(&dir).map_err(|e| Errors::WikiError(e.to_string()))?;

        let mut titles: Vec<String> = files.iter()
            .filter(|f| f.extension().map_or(false, |ext| ext == PAGE_EXT))
            .filter_map(|f| f.file_stem().and_then(|s| s.to_str()))
            .map(canonical_key)
            .collect();
        titles.sort();
        titles.dedup();

        // Files whose names cannot be expressed as a route are not listed.
        let entries: Vec<ArchiveEntry> = titles.iter()
            .filter_map(|t| page_route(t).map(|route| ArchiveEntry {title: display_title(t), route}))
            .collect();

        let total = entries.len();
        Ok(Archive::new(entries.into_iter().take(limit).collect(), total))
    }

    // ***********************************************************************
    //                          Private Methods
    // ***********************************************************************
    fn write_page(&self, page: &Page, create_only: bool) -> Result<bool, Errors> {
        let key = canonical_key(&page.title);
        let path = self.page_path(&key)?;

        // Serialize writers of the same title.
        let lock = self.title_lock(&key);
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut options = OpenOptions::new();
        options.write(true).mode(PAGE_FILE_MODE);
        if create_only {options.create_new(true);} else {options.create(true).truncate(true);}

        let mut file = match options.open(&path) {
            Ok(f) => f,
            Err(e) if create_only && e.kind() == ErrorKind::AlreadyExists => {
                debug!("Page '{}' already exists, not overwritten.", key);
                return Ok(false);
            }
            Err(e) => return Err(Errors::PageSave {title: key, source: e}),
        };

        file.write_all(&page.body)
            .map_err(|e| Errors::PageSave {title: key.clone(), source: e})?;
        info!("Saved page '{}' ({} bytes).", key, page.body.len());
        Ok(true)
    }

    // One lock per title ever written, so the table is bounded by the page count.
    fn title_lock(&self, key: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(key.to_string()).or_default().clone()
    }

    /** Map a title to its file, refusing anything that would escape the
     * flat data directory.
     */
    fn page_path(&self, title: &str) -> Result<PathBuf, Errors> {
        let key = canonical_key(title);
        if key.is_empty() || key == "." || key == ".."
            || key.contains(['/', '\\', '\0']) {
            return Err(Errors::InvalidTitle(title.to_string()));
        }
        Ok(self.data_dir.join(format!("{}.{}", key, PAGE_EXT)))
    }
}

// ***************************************************************************
//                                  Tests
// ***************************************************************************
#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::title::normalize;
    use std::thread;

    fn create_test_store() -> (tempfile::TempDir, PageStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path());
        (dir, store)
    }

    #[test]
    fn save_then_load_round_trips_body() {
        let (_dir, store) = create_test_store();
        let body = b"line one\nline two\n\xff raw".to_vec();
        store.save(&Page::new("hello".to_string(), body.clone())).unwrap();

        match store.load("hello") {
            LoadOutcome::Found(p) => {
                assert_eq!(p.body, body);
                assert_eq!(p.title, "hello");
            },
            LoadOutcome::Absent => panic!("saved page not found"),
        }
    }

    #[test]
    fn load_missing_is_absent() {
        let (_dir, store) = create_test_store();
        assert_eq!(store.load("nothing-here"), LoadOutcome::Absent);
    }

    #[test]
    fn load_missing_data_dir_is_absent() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path().join("gone"));
        assert_eq!(store.load("hello"), LoadOutcome::Absent);
    }

    #[test]
    fn filename_is_lower_cased_title() {
        let (dir, store) = create_test_store();
        store.save(&Page::new("My Page".to_string(), b"x".to_vec())).unwrap();
        assert!(dir.path().join("my page.txt").is_file());
        assert!(store.load("MY PAGE").is_found());
    }

    #[test]
    fn save_truncates_previous_content() {
        let (_dir, store) = create_test_store();
        store.save(&Page::new("t".to_string(), b"a much longer body".to_vec())).unwrap();
        store.save(&Page::new("t".to_string(), b"short".to_vec())).unwrap();
        assert_eq!(store.load("t"), LoadOutcome::Found(Page::new("t".to_string(), b"short".to_vec())));
    }

    #[test]
    fn create_does_not_overwrite() {
        let (_dir, store) = create_test_store();
        assert!(store.create(&Page::empty("notes".to_string())).unwrap());
        store.save(&Page::new("notes".to_string(), b"kept".to_vec())).unwrap();
        assert!(!store.create(&Page::empty("notes".to_string())).unwrap());
        assert_eq!(store.load("notes"),
                   LoadOutcome::Found(Page::new("notes".to_string(), b"kept".to_vec())));
    }

    #[test]
    fn rejects_path_escaping_titles() {
        let (_dir, store) = create_test_store();
        for t in ["", ".", "..", "../x", "a/b", "a\\b"] {
            assert!(matches!(store.save(&Page::empty(t.to_string())), Err(Errors::InvalidTitle(_))));
            assert_eq!(store.load(t), LoadOutcome::Absent);
        }
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path().join("gone"));
        let result = store.save(&Page::new("x".to_string(), b"y".to_vec()));
        assert!(matches!(result, Err(Errors::PageSave {..})));
    }

    #[test]
    fn listing_is_sorted_and_capped() {
        let (dir, store) = create_test_store();
        for t in ["golf", "alpha", "foxtrot", "charlie", "echo", "bravo", "delta", "my page"] {
            store.save(&Page::empty(t.to_string())).unwrap();
        }
        fs::write(dir.path().join("notes.md"), "ignored").unwrap();
        fs::create_dir(dir.path().join("sub.txt")).unwrap();

        let archive = store.list_titles(6).unwrap();
        let titles: Vec<&str> = archive.wikis.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Foxtrot"]);
        assert_eq!(archive.total, 8);
        assert!(archive.has_more);

        let all = store.list_titles(100).unwrap();
        assert_eq!(all.wikis.len(), 8);
        assert!(!all.has_more);
        assert!(all.wikis.contains(&ArchiveEntry {title: "My Page".to_string(), route: "my-page".to_string()}));
    }

    #[test]
    fn listing_route_round_trips_repeated_separators() {
        let (_dir, store) = create_test_store();
        for t in ["a  b", " x"] {
            store.save(&Page::new(t.to_string(), b"body".to_vec())).unwrap();
        }

        let archive = store.list_titles(6).unwrap();
        let routes: Vec<&str> = archive.wikis.iter().map(|e| e.route.as_str()).collect();
        assert_eq!(routes, vec!["-x", "a--b"]);
        for route in routes {
            assert!(store.load(&normalize(route)).is_found());
        }
    }

    #[test]
    fn listing_seven_pages_returns_six() {
        let (_dir, store) = create_test_store();
        for i in 0..7 {
            store.save(&Page::empty(format!("page{}", i))).unwrap();
        }
        assert_eq!(store.list_titles(6).unwrap().wikis.len(), 6);
    }

    #[test]
    fn listing_missing_dir_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = PageStore::new(dir.path().join("gone"));
        let archive = store.list_titles(6).unwrap();
        assert!(archive.wikis.is_empty());
        assert_eq!(archive.total, 0);
    }

    #[test]
    fn concurrent_saves_leave_one_complete_body() {
        let (_dir, store) = create_test_store();
        let store = Arc::new(store);
        let bodies: Vec<Vec<u8>> = (0..8u8).map(|i| vec![b'a' + i; 4096]).collect();

        let handles: Vec<_> = bodies.iter().cloned().map(|body| {
            let store = Arc::clone(&store);
            thread::spawn(move || store.save(&Page::new("shared".to_string(), body)).unwrap())
        }).collect();
        for h in handles {h.join().unwrap();}

        match store.load("shared") {
            LoadOutcome::Found(p) => assert!(bodies.contains(&p.body)),
            LoadOutcome::Absent => panic!("page missing"),
        }
    }
}
