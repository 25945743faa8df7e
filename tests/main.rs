// This test suite is incomplete and doesn't cover all available functionality.
// Contributions to improve test coverage would be highly appreciated!

use std::{
    fs::{
        self,
        File,
    },
    io::Write,
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use futures_util::StreamExt;
use inotify_async::{
    Config,
    Error,
    Event,
    Inotify,
    Mask,
};
use tempdir::TempDir;
use tokio::time::timeout;


const PATIENCE: Duration = Duration::from_secs(5);


#[tokio::test]
async fn it_should_watch_a_file() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();

    let inotify = Inotify::init().unwrap();
    let watch = inotify.add_watch(&path, Some(Mask::MODIFY), false).unwrap();

    write_to(&mut file);

    let events = collect_events(&inotify, 1).await;

    assert!(!events.is_empty());
    for event in events {
        assert_eq!(watch, event.wd);
        assert!(event.mask.contains(Mask::MODIFY));
        assert_eq!(Path::new(""), event.name);
    }
}

#[tokio::test]
async fn it_should_report_create_then_delete_in_order() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    let watch = inotify
        .add_watch(testdir.path(), Some(Mask::CREATE | Mask::DELETE), false)
        .unwrap();

    let file = testdir.path().join("a.txt");
    File::create(&file).unwrap();
    fs::remove_file(&file).unwrap();

    let events = collect_events(&inotify, 2).await;

    assert_eq!(2, events.len());
    assert!(events[0].mask.contains(Mask::CREATE));
    assert!(events[1].mask.contains(Mask::DELETE));
    for event in &events {
        assert_eq!(watch, event.wd);
        assert_eq!(Path::new("a.txt"), event.name);
        assert_eq!(Some(file.clone()), inotify.event_path(event));
    }
}

#[tokio::test]
async fn it_should_pair_rename_halves_by_cookie() {
    let testdir = TestDir::new();
    let old = testdir.path().join("old.txt");
    File::create(&old).unwrap();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(testdir.path(), Some(Mask::MOVE), false).unwrap();

    fs::rename(&old, testdir.path().join("new.txt")).unwrap();

    let events = collect_events(&inotify, 2).await;

    assert_eq!(2, events.len());
    assert!(events[0].mask.contains(Mask::MOVED_FROM));
    assert_eq!(Path::new("old.txt"), events[0].name);
    assert!(events[1].mask.contains(Mask::MOVED_TO));
    assert_eq!(Path::new("new.txt"), events[1].name);
    assert_ne!(0, events[0].cookie);
    assert!(events[0].pairs_with(&events[1]));
}

#[tokio::test]
async fn it_should_suspend_until_events_arrive() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(testdir.path(), Some(Mask::CREATE), false).unwrap();

    // Nothing queued yet, so this must still be waiting when the timeout hits.
    let waiting = timeout(Duration::from_millis(100), inotify.next_events()).await;
    assert!(waiting.is_err());

    File::create(testdir.path().join("late")).unwrap();

    let events = timeout(PATIENCE, inotify.next_events()).await
        .expect("timed out waiting for events")
        .unwrap();

    assert_eq!(1, events.len());
    assert_eq!(Path::new("late"), events[0].name);
}

#[tokio::test]
async fn it_should_not_return_duplicate_events() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(&path, Some(Mask::MODIFY), false).unwrap();

    write_to(&mut file);
    collect_events(&inotify, 1).await;

    let again = timeout(Duration::from_millis(100), inotify.next_events()).await;
    assert!(again.is_err());
}

#[tokio::test]
async fn it_should_watch_a_tree_recursively() {
    let testdir = TestDir::new();
    fs::create_dir_all(testdir.path().join("one/two")).unwrap();
    fs::create_dir_all(testdir.path().join("three")).unwrap();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(testdir.path(), Some(Mask::MODIFY), true).unwrap();

    assert_eq!(4, inotify.watch_count());

    // The recursive mask adds `CREATE` even though only `MODIFY` was asked for.
    let nested = testdir.path().join("one/two");
    fs::create_dir(nested.join("new")).unwrap();

    let events = collect_events(&inotify, 1).await;

    assert!(events[0].mask.contains(Mask::CREATE | Mask::ISDIR));
    assert_eq!(Some(nested.clone()), inotify.watched_path(events[0].wd));
    assert_eq!(Some(nested.join("new")), inotify.event_path(&events[0]));

    // `one/two/new` was never watched.
    assert!(matches!(
        inotify.del_watch(testdir.path()),
        Err(Error::Inconsistent(_))
    ));
    assert_eq!(4, inotify.watch_count());

    fs::remove_dir(nested.join("new")).unwrap();
    inotify.del_watch(testdir.path()).unwrap();

    assert_eq!(0, inotify.watch_count());
    assert!(inotify.watched().is_empty());
}

#[tokio::test]
async fn it_should_refuse_duplicate_paths() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    let first = inotify.add_watch(testdir.path(), None, false).unwrap();

    match inotify.add_watch(testdir.path(), None, false) {
        Err(Error::DuplicatePath(path)) => assert_eq!(testdir.path(), path),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(vec![(testdir.path().to_path_buf(), first)], inotify.watched());

    inotify.del_watch(testdir.path()).unwrap();
    assert_eq!(None, inotify.watch_descriptor(testdir.path()));

    inotify.add_watch(testdir.path(), None, false).unwrap();
    assert_eq!(1, inotify.watch_count());
}

#[tokio::test]
async fn it_should_use_the_configured_default_mask() {
    let testdir = TestDir::new();

    let config = Config::default().default_mask(Mask::DELETE);
    let inotify = Inotify::with_config(config).unwrap();
    inotify.add_watch(testdir.path(), None, false).unwrap();

    // Not part of the default mask, so no event.
    File::create(testdir.path().join("ignored")).unwrap();
    fs::remove_file(testdir.path().join("ignored")).unwrap();

    let events = collect_events(&inotify, 1).await;

    assert_eq!(1, events.len());
    assert!(events[0].mask.contains(Mask::DELETE));
}

#[tokio::test]
async fn it_should_report_removal_of_the_watch() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    let watch = inotify.add_watch(testdir.path(), None, false).unwrap();

    inotify.del_watch(testdir.path()).unwrap();

    let events = collect_events(&inotify, 1).await;

    assert_eq!(watch, events[0].wd);
    assert!(events[0].mask.contains(Mask::IGNORED));
    assert_eq!(None, inotify.event_path(&events[0]));
}

#[tokio::test]
async fn it_should_forget_watches_the_kernel_removed() {
    let testdir = TestDir::new();
    let sub = testdir.path().join("s");
    fs::create_dir(&sub).unwrap();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(testdir.path(), Some(Mask::DELETE_SELF), true).unwrap();
    let watch = inotify.watch_descriptor(&sub).unwrap();
    assert_eq!(2, inotify.watch_count());

    fs::remove_dir(&sub).unwrap();

    let ignored = |event: &Event| event.wd == watch && event.mask.contains(Mask::IGNORED);
    let mut events: Vec<Event> = Vec::new();
    while !events.iter().any(ignored) {
        events.extend(collect_events(&inotify, 1).await);
    }

    assert_eq!(None, inotify.watch_descriptor(&sub));
    assert_eq!(None, inotify.watched_path(watch));
    assert_eq!(1, inotify.watch_count());

    inotify.del_watch(testdir.path()).unwrap();
    assert_eq!(0, inotify.watch_count());
    assert!(inotify.watched().is_empty());

    fs::create_dir(&sub).unwrap();
    inotify.add_watch(&sub, None, false).unwrap();
    assert_eq!(1, inotify.watch_count());
}

#[tokio::test]
async fn it_should_drop_a_watch_the_kernel_already_removed() {
    let mut testdir = TestDir::new();
    let (path, mut file) = testdir.new_file();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(&path, Some(Mask::ONESHOT | Mask::MODIFY), false).unwrap();

    // A one-shot watch is gone as soon as the write returns. No events are
    // read, so only the removal attempt can find out.
    write_to(&mut file);

    match inotify.del_watch(&path) {
        Err(Error::Io(error)) => assert_eq!(Some(libc::EINVAL), error.raw_os_error()),
        other => panic!("unexpected result: {:?}", other),
    }
    assert_eq!(0, inotify.watch_count());
    assert_eq!(None, inotify.watch_descriptor(&path));

    // The `IN_IGNORED` record that follows finds nothing left to forget.
    let events = collect_events(&inotify, 2).await;
    assert!(events[0].mask.contains(Mask::MODIFY));
    assert!(events.iter().any(|event| event.mask.contains(Mask::IGNORED)));
    assert_eq!(0, inotify.watch_count());
}

#[tokio::test]
async fn it_should_stream_events_one_at_a_time() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    inotify
        .add_watch(testdir.path(), Some(Mask::CREATE), false)
        .unwrap();

    for name in ["x", "y", "z"] {
        File::create(testdir.path().join(name)).unwrap();
    }

    let names: Vec<PathBuf> = timeout(PATIENCE, async {
        inotify
            .event_stream()
            .take(3)
            .map(|event| event.unwrap().name)
            .collect()
            .await
    })
    .await
    .expect("timed out waiting for events");

    assert_eq!(
        vec![PathBuf::from("x"), PathBuf::from("y"), PathBuf::from("z")],
        names,
    );
}

#[tokio::test]
async fn it_should_close_explicitly() {
    let testdir = TestDir::new();

    let inotify = Inotify::init().unwrap();
    inotify.add_watch(testdir.path(), None, false).unwrap();

    inotify.close().unwrap();
}


struct TestDir {
    dir: TempDir,
    counter: u32,
}

impl TestDir {
    fn new() -> TestDir {
        TestDir {
            dir: TempDir::new("inotify-async-test").unwrap(),
            counter: 0,
        }
    }

    fn path(&self) -> &Path {
        self.dir.path()
    }

    fn new_file(&mut self) -> (PathBuf, File) {
        let id = self.counter;
        self.counter += 1;

        let path = self.dir.path().join("file-".to_string() + &id.to_string());
        let file = File::create(&path)
            .unwrap_or_else(|error| panic!("Failed to create temporary file: {}", error));

        (path, file)
    }
}

fn write_to(file: &mut File) {
    file
        .write(b"This should trigger an inotify event.")
        .unwrap_or_else(|error|
            panic!("Failed to write to file: {}", error)
        );
}

/// Reads batches until at least `count` events have arrived
async fn collect_events(inotify: &Inotify, count: usize) -> Vec<Event> {
    let mut events = Vec::new();

    while events.len() < count {
        let batch = timeout(PATIENCE, inotify.next_events()).await
            .expect("timed out waiting for events")
            .unwrap();
        events.extend(batch);
    }

    events
}
