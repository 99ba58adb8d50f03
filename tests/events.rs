// tests/events.rs

use std::path::PathBuf;

use notify::event::{
    AccessKind, CreateKind, DataChange, MetadataKind, ModifyKind, RemoveKind, RenameMode,
};
use notify::{Event, EventKind};

use respawn::watch::{classify, PathChange};

fn event(kind: EventKind, paths: &[&str]) -> Event {
    let mut ev = Event::new(kind);
    for path in paths {
        ev = ev.add_path(PathBuf::from(path));
    }
    ev
}

#[test]
fn removals_and_creations_map_directly() {
    let removed = classify(&event(EventKind::Remove(RemoveKind::File), &["/p/a"]));
    assert_eq!(removed, vec![(PathBuf::from("/p/a"), PathChange::Removed)]);

    let created = classify(&event(EventKind::Create(CreateKind::Folder), &["/p/d"]));
    assert_eq!(created, vec![(PathBuf::from("/p/d"), PathChange::Changed)]);
}

#[test]
fn data_modification_is_a_change() {
    let changed = classify(&event(
        EventKind::Modify(ModifyKind::Data(DataChange::Content)),
        &["/p/a"],
    ));
    assert_eq!(changed, vec![(PathBuf::from("/p/a"), PathChange::Changed)]);
}

#[test]
fn metadata_and_access_events_are_ignored() {
    let chmod = classify(&event(
        EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
        &["/p/a"],
    ));
    assert!(chmod.is_empty());

    let access = classify(&event(EventKind::Access(AccessKind::Any), &["/p/a"]));
    assert!(access.is_empty());
}

#[test]
fn rename_sides_are_split() {
    let from = classify(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::From)),
        &["/p/old"],
    ));
    assert_eq!(from, vec![(PathBuf::from("/p/old"), PathChange::Removed)]);

    let to = classify(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::To)),
        &["/p/new"],
    ));
    assert_eq!(to, vec![(PathBuf::from("/p/new"), PathChange::Changed)]);

    let both = classify(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
        &["/p/old", "/p/new"],
    ));
    assert_eq!(
        both,
        vec![
            (PathBuf::from("/p/old"), PathChange::Removed),
            (PathBuf::from("/p/new"), PathChange::Changed),
        ]
    );
}

#[test]
fn ambiguous_rename_degrades_to_removal() {
    let any = classify(&event(
        EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
        &["/p/moved"],
    ));
    assert_eq!(any, vec![(PathBuf::from("/p/moved"), PathChange::Removed)]);
}
