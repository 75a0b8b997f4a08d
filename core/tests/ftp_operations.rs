//! Operations gateway against the in-memory FTP server.

mod common;

use common::{operations, operations_with, site, MemoryServer};
use ftpgate_core::config::GatewaySettings;
use ftpgate_core::files::{DeleteTarget, EntryType};

fn names(entries: &[ftpgate_core::files::DirectoryEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

// --- listing ---

#[test]
fn list_directory_splits_and_sorts() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.list_directory("/site");
    assert!(result.success, "{}", result.message);
    let listing = result.data.unwrap();

    assert_eq!(listing.path, "/site");
    assert_eq!(names(&listing.folders), vec!["current", "images", "releases"]);
    assert_eq!(names(&listing.files), vec!["About.txt", "home.html", "index.html"]);
}

#[test]
fn symlink_to_directory_is_listed_as_folder() {
    let server = site();
    let mut ops = operations(&server);

    let listing = ops.list_directory("/site").data.unwrap();
    let current = listing.folders.iter().find(|e| e.name == "current").unwrap();
    assert_eq!(current.entry_type, EntryType::Directory);
    assert!(current.is_symlink);
    assert_eq!(current.path, "/site/current");
    assert_eq!(current.real_path, "/site/releases/v2");

    let home = listing.files.iter().find(|e| e.name == "home.html").unwrap();
    assert!(home.is_symlink);
    assert_eq!(home.entry_type, EntryType::File);
}

#[test]
fn listing_restores_working_directory() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.list_directory("/site/images").success);
    // A relative listing must still start from the login directory.
    let listing = ops.list_directory("site").data.unwrap();
    assert_eq!(names(&listing.folders), vec!["current", "images", "releases"]);
}

#[test]
fn list_missing_directory_fails() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.list_directory("/nope");
    assert!(!result.success);
    assert_eq!(result.message, "Directory not found or not accessible");
    assert!(result.data.is_none());
}

#[test]
fn list_rejects_traversal() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.list_directory("/site/../etc");
    assert!(!result.success);
    assert_eq!(result.message, "Invalid path");
}

#[test]
fn list_file_entries_carry_size_and_date() {
    let server = site();
    let mut ops = operations(&server);

    let listing = ops.list_directory("/site/images").data.unwrap();
    let logo = &listing.files[0];
    assert_eq!(logo.name, "logo.png");
    assert_eq!(logo.size, 4);
    assert_eq!(logo.modified, "03/03/2023");
    assert_eq!(logo.permissions, "-rw-r--r--");
}

// --- tree ---

#[test]
fn tree_lists_folders_first_with_placeholders() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.get_tree("/site", 10, 0);
    assert!(result.success);
    let tree = result.data.unwrap().tree;

    assert_eq!(
        names(&tree),
        vec!["current", "images", "releases", "About.txt", "home.html", "index.html"]
    );
    assert_eq!(tree[0].children, Some(Vec::new()));
    assert_eq!(tree[5].children, None);
}

#[test]
fn tree_stops_at_max_depth() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.get_tree("/site", 3, 3);
    assert!(result.success);
    assert_eq!(result.message, "Maximum tree depth reached");
    assert!(result.data.unwrap().tree.is_empty());
}

// --- read / write / create ---

#[test]
fn write_then_read_round_trips_bytes() {
    let server = site();
    let mut ops = operations(&server);
    let content: Vec<u8> = (0u8..=255).collect();

    assert!(ops.write_file("/site/blob.bin", &content).success);
    let read = ops.read_file("/site/blob.bin");
    assert!(read.success);
    let file = read.data.unwrap();
    assert_eq!(file.data, content);
    assert_eq!(file.size, 256);
}

#[test]
fn write_overwrites_existing_file() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.write_file("/site/index.html", b"new").success);
    assert_eq!(server.content("/site/index.html").unwrap(), b"new");
}

#[test]
fn read_missing_file_fails() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.read_file("/site/missing.txt");
    assert!(!result.success);
    assert_eq!(result.message, "Failed to read file");
}

#[test]
fn read_over_limit_is_refused_before_download() {
    let server = site();
    let settings = GatewaySettings {
        read_limit: Some(4),
        ..GatewaySettings::default()
    };
    let mut ops = operations_with(&server, settings);

    let result = ops.read_file("/site/index.html");
    assert!(!result.success);
    assert_eq!(result.message, "File is too large to open (11 bytes, limit 4)");
    assert!(result.data.is_none());
    assert_eq!(server.retrs(), 0);

    let logo = ops.read_file("/site/images/logo.png");
    assert!(logo.success, "{}", logo.message);
    assert_eq!(server.retrs(), 1);
}

#[test]
fn create_file_refuses_existing() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.create_file("/site/index.html");
    assert!(!result.success);
    assert_eq!(result.message, "File already exists");
    assert_eq!(server.content("/site/index.html").unwrap(), b"<h1>hi</h1>");
}

#[test]
fn create_file_makes_empty_file() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.create_file("/site/new.txt");
    assert!(result.success);
    assert_eq!(server.content("/site/new.txt").unwrap(), Vec::<u8>::new());
}

#[test]
fn create_folder_then_duplicate_fails() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.create_folder("/site/docs").success);
    assert!(ops.is_directory("/site/docs"));

    let again = ops.create_folder("/site/docs");
    assert!(!again.success);
    assert_eq!(again.message, "Failed to create folder. It may already exist");
}

// --- rename ---

#[test]
fn rename_moves_file() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.rename("/site/About.txt", "/site/about.txt");
    assert!(result.success);
    assert!(!server.exists("/site/About.txt"));
    assert_eq!(server.content("/site/about.txt").unwrap(), b"about");
}

#[test]
fn rename_refuses_existing_destination_without_issuing_rnfr() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.rename("/site/About.txt", "/site/index.html");
    assert!(!result.success);
    assert_eq!(
        result.message,
        "A file or folder with that name already exists"
    );
    assert_eq!(server.renames(), 0);

    let onto_dir = ops.rename("/site/About.txt", "/site/images");
    assert!(!onto_dir.success);
    assert_eq!(server.renames(), 0);
}

#[test]
fn rename_directory_moves_children() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.rename("/site/images", "/site/img").success);
    assert_eq!(
        server.content("/site/img/logo.png").unwrap(),
        vec![0x89, 0x50, 0x4e, 0x47]
    );
}

// --- delete ---

#[test]
fn delete_batch_reports_each_item() {
    let server = MemoryServer::new().dir("/a").file("/a/f1.txt", b"1");
    let mut ops = operations(&server);

    let target = DeleteTarget::from(vec![
        "/a/f1.txt".to_string(),
        "/a/missing.txt".to_string(),
    ]);
    let result = ops.delete(target);
    assert!(!result.success);
    assert_eq!(result.message, "Deleted 1 of 2 item(s), 1 failed");

    let report = result.data.unwrap();
    assert_eq!(report.success_count, 1);
    assert_eq!(report.failed_count, 1);
    assert!(report.results[0].success);
    assert!(!report.results[1].success);
    assert_eq!(report.results[1].path, "/a/missing.txt");
    assert!(!server.exists("/a/f1.txt"));
}

#[test]
fn delete_single_path() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.delete("/site/About.txt".into());
    assert!(result.success);
    assert_eq!(result.message, "Deleted 1 item(s)");
    assert_eq!(result.data.unwrap().results[0].message, "File deleted");
}

#[test]
fn delete_folder_recurses() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.delete("/site/releases".into());
    assert!(result.success, "{}", result.message);
    assert!(!server.exists("/site/releases"));
    assert!(!server.exists("/site/releases/v2"));
    assert!(!server.exists("/site/releases/v2/app.js"));
    assert!(server.exists("/site/index.html"));
}

#[test]
fn delete_folder_removes_symlinks_without_following() {
    let server = MemoryServer::new()
        .dir("/keep")
        .file("/keep/data.txt", b"keep me")
        .dir("/trash")
        .symlink("/trash/link", "/keep");
    let mut ops = operations(&server);

    let result = ops.delete("/trash".into());
    assert!(result.success, "{}", result.message);
    assert!(!server.exists("/trash"));
    assert_eq!(server.content("/keep/data.txt").unwrap(), b"keep me");
}

#[test]
fn delete_top_level_symlink_keeps_target() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.delete("/site/current".into());
    assert!(result.success, "{}", result.message);
    assert_eq!(result.data.unwrap().results[0].message, "Link deleted");
    assert!(!server.exists("/site/current"));
    assert_eq!(
        server.content("/site/releases/v2/app.js").unwrap(),
        b"console.log(2)"
    );
}

#[test]
fn delete_symlink_to_file_keeps_target() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.delete("/site/home.html".into()).success);
    assert!(!server.exists("/site/home.html"));
    assert!(server.exists("/site/index.html"));
}

#[test]
fn delete_keeps_earlier_items_when_a_later_one_fails() {
    let server = MemoryServer::new()
        .file("/one.txt", b"1")
        .file("/two.txt", b"2")
        .protect("/two.txt");
    let mut ops = operations(&server);

    let target = DeleteTarget::from(vec!["/one.txt".to_string(), "/two.txt".to_string()]);
    let report = ops.delete(target).data.unwrap();
    assert_eq!(report.success_count, 1);
    assert!(!server.exists("/one.txt"));
    assert!(server.exists("/two.txt"));
}

#[test]
fn delete_refuses_root() {
    let server = site();
    let mut ops = operations(&server);

    let report = ops.delete("/".into()).data.unwrap();
    assert_eq!(report.failed_count, 1);
    assert!(server.exists("/site/index.html"));
}

#[test]
fn delete_empty_batch_succeeds() {
    let server = site();
    let mut ops = operations(&server);

    let result = ops.delete(DeleteTarget::Many(Vec::new()));
    assert!(result.success);
    assert_eq!(result.data.unwrap().success_count, 0);
}

// --- probes and connection state ---

#[test]
fn is_directory_probe() {
    let server = site();
    let mut ops = operations(&server);

    assert!(ops.is_directory("/site"));
    assert!(ops.is_directory("/site/current"));
    assert!(!ops.is_directory("/site/index.html"));
    assert!(!ops.is_directory("/missing"));
    assert!(!ops.is_directory("/site/../etc"));
}

#[test]
fn operations_after_disconnect_report_not_connected() {
    let server = site();
    let mut ops = operations(&server);
    ops.disconnect();

    assert!(!ops.is_connected());
    let result = ops.list_directory("/site");
    assert!(!result.success);
    assert_eq!(result.message, "Not connected to FTP server");
    assert!(!ops.is_directory("/site"));
    assert_eq!(ops.write_file("/x", b"x").message, "Not connected to FTP server");
}

#[test]
fn dropping_gateway_closes_connection() {
    let server = site();
    {
        let mut ops = operations(&server);
        assert!(ops.list_directory("/").success);
    }
    assert_eq!(server.opened(), 1);
    assert_eq!(server.quits(), 1);
}
