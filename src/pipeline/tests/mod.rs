use super::*;
use crate::config::TrackerConfig;
use crate::error::Error;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TORRENT_BYTES: &[u8] = b"d8:announce35:http://tracker.example/announce.htmle";

/// One tracker run's worth of on-disk and mock-server scaffolding.
struct TestEnv {
    server: MockServer,
    dir: TempDir,
}

impl TestEnv {
    async fn new(store_rows: &str) -> Self {
        let server = MockServer::start().await;
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("store.tsv"), store_rows).unwrap();
        fs::create_dir(dir.path().join("torrents")).unwrap();
        Self { server, dir }
    }

    /// A store row for an item hosted on the mock server.
    fn store_row(&self, title: &str, id: u32, torrent: bool) -> String {
        let torrent_url = if torrent {
            format!("{}/torrents/download/id/{}.html", self.server.uri(), id)
        } else {
            String::new()
        };
        format!(
            "2024-01-01T00:00:00\t{}\t{}/torrents/{}.html\t{}\n",
            title,
            self.server.uri(),
            id,
            torrent_url
        )
    }

    fn write_store(&self, rows: &str) {
        fs::write(self.dir.path().join("store.tsv"), rows).unwrap();
    }

    fn write_feed(&self, entries: &[(&str, u32, &str)]) {
        let mut items = String::new();
        for (title, id, description) in entries {
            items.push_str(&format!(
                "<item><title>{}</title>\
                 <link>{}/torrents/{}.html</link>\
                 <pubDate>Fri, 24 Jun 2016 15:30:44 +0000</pubDate>\
                 <description>{}</description></item>",
                title,
                self.server.uri(),
                id,
                description
            ));
        }
        let feed = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Tracker Feed</title><link>http://tracker.example</link><description>new torrents</description>{}</channel></rss>"#,
            items
        );
        fs::write(self.dir.path().join("feed.xml"), feed).unwrap();
    }

    async fn mock_torrent(&self, id: u32, template: ResponseTemplate, expected_calls: u64) {
        Mock::given(method("GET"))
            .and(path(format!("/torrents/download/id/{}.html", id)))
            .respond_with(template)
            .expect(expected_calls)
            .mount(&self.server)
            .await;
    }

    fn config(&self, blacklist: Option<&str>) -> Config {
        let blacklist_path = blacklist.map(|pattern| {
            let path = self.dir.path().join("blacklist.txt");
            fs::write(&path, pattern).unwrap();
            path
        });
        Config {
            store_path: self.dir.path().join("store.tsv"),
            feed_source: self.dir.path().join("feed.xml").display().to_string(),
            output_dir: self.dir.path().join("torrents"),
            blacklist_path,
            tracker: TrackerConfig::default(),
        }
    }

    async fn tracker(&self, blacklist: Option<&str>) -> Tracker {
        Tracker::new(self.config(blacklist), reqwest::Client::new())
            .await
            .unwrap()
    }

    fn store_content(&self) -> String {
        fs::read_to_string(self.dir.path().join("store.tsv")).unwrap()
    }

    fn backups(&self) -> Vec<PathBuf> {
        fs::read_dir(self.dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| {
                p.file_name()
                    .map(|n| n.to_string_lossy().ends_with("_store.tsv"))
                    .unwrap_or(false)
            })
            .collect()
    }

    fn torrent_file(&self, name: &str) -> PathBuf {
        self.dir.path().join("torrents").join(name)
    }
}

fn bittorrent_response() -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("Content-Type", "application/x-bittorrent")
        .set_body_bytes(TORRENT_BYTES.to_vec())
}

#[tokio::test]
async fn pending_store_item_resolves_and_commits() {
    let env = TestEnv::new("").await;
    let prior = env.store_row("Album A", 1, false);
    env.write_store(&prior);
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    env.mock_torrent(1, bittorrent_response(), 1).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            resolved: 1,
            still_pending: 0,
            blacklisted: 0
        }
    );

    // Torrent payload written under the title
    assert_eq!(
        fs::read(env.torrent_file("Album A.torrent")).unwrap(),
        TORRENT_BYTES
    );

    // Store row carries the derived torrent URL now
    let content = env.store_content();
    assert_eq!(content.lines().count(), 1);
    assert!(content.contains(&format!(
        "{}/torrents/download/id/1.html",
        env.server.uri()
    )));

    // Backup holds the pre-commit content
    let backups = env.backups();
    assert_eq!(backups.len(), 1);
    assert_eq!(fs::read_to_string(&backups[0]).unwrap(), prior);
}

#[tokio::test]
async fn not_ready_item_stays_pending_with_no_commit() {
    let env = TestEnv::new("").await;
    let prior = env.store_row("Album A", 1, false);
    env.write_store(&prior);
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    env.mock_torrent(
        1,
        ResponseTemplate::new(200)
            .insert_header("Content-Type", "text/html")
            .set_body_string("<html>not generated yet</html>"),
        1,
    )
    .await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            resolved: 0,
            still_pending: 1,
            blacklisted: 0
        }
    );
    assert!(!env.torrent_file("Album A.torrent").exists());
    // The merged table would be identical, so no commit and no backup
    assert_eq!(env.store_content(), prior);
    assert!(env.backups().is_empty());
}

#[tokio::test]
async fn new_item_with_failed_fetch_is_persisted_as_pending() {
    let env = TestEnv::new("").await;
    env.write_feed(&[("Album B", 2, "Style: Black Metal")]);
    env.mock_torrent(2, ResponseTemplate::new(404), 1).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            resolved: 0,
            still_pending: 1,
            blacklisted: 0
        }
    );

    // The unseen title must not be dropped: it lands in the store pending
    let content = env.store_content();
    let row = content.lines().next().unwrap();
    assert!(row.contains("Album B"));
    assert!(row.ends_with('\t'), "torrent column must be empty");
    assert_eq!(content.lines().count(), 1);
    assert_eq!(env.backups().len(), 1);
}

#[tokio::test]
async fn blacklisted_items_are_never_fetched_nor_committed() {
    let env = TestEnv::new("").await;
    env.write_feed(&[("Doomy Album", 3, "Style: Funeral Doom")]);
    // Zero calls expected against the torrent endpoint
    env.mock_torrent(3, bittorrent_response(), 0).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            resolved: 0,
            still_pending: 0,
            blacklisted: 1
        }
    );
    assert_eq!(env.store_content(), "");
    assert!(env.backups().is_empty());
}

#[tokio::test]
async fn without_a_blacklist_everything_is_whitelisted() {
    let env = TestEnv::new("").await;
    env.write_feed(&[("Doomy Album", 3, "Style: Funeral Doom")]);
    env.mock_torrent(3, bittorrent_response(), 1).await;

    let tracker = env.tracker(None).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(summary.resolved, 1);
    assert_eq!(summary.blacklisted, 0);
}

#[tokio::test]
async fn rerun_against_resolved_store_is_a_no_op() {
    let env = TestEnv::new("").await;
    env.write_store(&env.store_row("Album A", 1, false));
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    env.mock_torrent(1, bittorrent_response(), 1).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    tracker.run().await.unwrap();
    let after_first = env.store_content();

    let summary = tracker.run().await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert_eq!(env.store_content(), after_first, "store must be unchanged");
    assert_eq!(env.backups().len(), 1, "second run must not back up again");
}

#[tokio::test]
async fn pending_row_survives_a_failed_refetch_exactly_once() {
    let env = TestEnv::new("").await;
    env.write_store(&env.store_row("Album A", 1, false));
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    env.mock_torrent(1, ResponseTemplate::new(500), 1).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(summary.still_pending, 1);
    let content = env.store_content();
    let matching: Vec<&str> = content.lines().filter(|l| l.contains("Album A")).collect();
    assert_eq!(matching.len(), 1);
    assert!(matching[0].ends_with('\t'), "row must still be pending");
}

#[tokio::test]
async fn resolved_rows_are_never_downgraded_by_a_rerun() {
    let env = TestEnv::new("").await;
    let resolved = env.store_row("Album A", 1, true);
    env.write_store(&resolved);
    // The feed re-announces the already-resolved title
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    env.mock_torrent(1, bittorrent_response(), 0).await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(summary, RunSummary::default());
    assert_eq!(env.store_content(), resolved);
}

#[tokio::test]
async fn per_item_transport_errors_do_not_abort_the_run() {
    let env = TestEnv::new("").await;
    // Pending store row pointing at a dead endpoint
    env.write_store("2024-01-01T00:00:00\tAlbum X\thttp://127.0.0.1:1/torrents/9.html\t\n");
    env.write_feed(&[]);

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(summary.still_pending, 1);
    assert_eq!(summary.resolved, 0);
}

#[tokio::test]
async fn mixed_run_counts_and_persists_each_class() {
    let env = TestEnv::new("").await;
    env.write_store(&env.store_row("Old C", 3, false));
    env.write_feed(&[
        ("Fresh A", 1, "Style: Black Metal"),
        ("Doom B", 2, "Style: Funeral Doom"),
        ("Old C", 3, "Style: Heavy Metal"),
    ]);
    env.mock_torrent(1, bittorrent_response(), 1).await;
    env.mock_torrent(2, bittorrent_response(), 0).await;
    env.mock_torrent(
        3,
        ResponseTemplate::new(200).insert_header("Content-Type", "text/html"),
        1,
    )
    .await;

    let tracker = env.tracker(Some("doom|sludge")).await;
    let summary = tracker.run().await.unwrap();

    assert_eq!(
        summary,
        RunSummary {
            resolved: 1,
            still_pending: 1,
            blacklisted: 1
        }
    );

    let content = env.store_content();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 2);
    // Committed rows first: the freshly resolved item, then the pending one
    assert!(lines[0].contains("Fresh A"));
    assert!(lines[0].contains("/torrents/download/id/1.html"));
    assert!(lines[1].contains("Old C"));
    assert!(lines[1].ends_with('\t'));
    assert!(!content.contains("Doom B"));
}

#[tokio::test]
async fn missing_store_file_aborts_the_run() {
    let env = TestEnv::new("").await;
    env.write_feed(&[("Album A", 1, "Style: Black Metal")]);
    fs::remove_file(env.dir.path().join("store.tsv")).unwrap();

    let tracker = env.tracker(None).await;
    let result = tracker.run().await;

    assert!(matches!(result, Err(Error::Config { .. })));
}

#[tokio::test]
async fn invalid_blacklist_file_fails_tracker_construction() {
    let env = TestEnv::new("").await;
    env.write_feed(&[]);

    let result = Tracker::new(env.config(Some("doom|(")), reqwest::Client::new()).await;

    assert!(matches!(result, Err(Error::InvalidPattern { .. })));
}
