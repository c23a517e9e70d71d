use super::*;

fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("ranksavvy-file-cache-{}", uuid::Uuid::new_v4()))
}

async fn write_raw_entry(cache: &FileCache, key: &str, expires_at: f64) {
    let entry = CacheEntry {
        key: key.to_string(),
        value: "\"payload\"".to_string(),
        expires_at,
        created_at: expires_at - 10.0,
    };
    tokio::fs::write(cache.path_for(key), serde_json::to_vec(&entry).unwrap())
        .await
        .unwrap();
}

#[test]
fn sanitize_replaces_colons_and_slashes() {
    assert_eq!(
        sanitize("competitor_site:https://a.com/x"),
        "competitor_site_https___a.com_x"
    );
}

#[tokio::test]
async fn set_then_get_returns_value() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    assert!(cache.set("serp:plumber:None", "{\"a\":1}", None).await);
    assert_eq!(
        cache.get("serp:plumber:None").await.as_deref(),
        Some("{\"a\":1}")
    );
    assert!(cache.exists("serp:plumber:None").await);
}

#[tokio::test]
async fn entry_expired_one_second_ago_is_a_miss_and_is_deleted() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    write_raw_entry(&cache, "serp:old:None", now_epoch_secs() - 1.0).await;

    assert!(cache.get("serp:old:None").await.is_none());
    assert!(
        !cache.path_for("serp:old:None").exists(),
        "expired entry should be evicted on read"
    );
}

#[tokio::test]
async fn entry_expiring_far_in_future_is_returned() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    write_raw_entry(&cache, "serp:fresh:None", now_epoch_secs() + 1_000_000.0).await;

    assert_eq!(
        cache.get("serp:fresh:None").await.as_deref(),
        Some("\"payload\"")
    );
}

#[tokio::test]
async fn written_entry_has_expiry_after_creation() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    cache
        .try_set("k", "v", Some(Duration::from_secs(5)))
        .await
        .unwrap();
    let raw = tokio::fs::read_to_string(cache.path_for("k")).await.unwrap();
    let entry: CacheEntry = serde_json::from_str(&raw).unwrap();
    assert!(entry.expires_at > entry.created_at);
    assert!((entry.expires_at - entry.created_at - 5.0).abs() < 0.5);
}

#[tokio::test]
async fn corrupt_entry_fails_open() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    tokio::fs::write(cache.path_for("broken"), b"not json")
        .await
        .unwrap();

    let result = cache.try_get("broken").await;
    assert!(
        matches!(result, Err(CacheError::Serialize(_))),
        "expected Serialize error, got: {result:?}"
    );
    assert!(cache.get("broken").await.is_none());
}

#[tokio::test]
async fn delete_reports_whether_entry_existed() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    cache.set("k", "v", None).await;
    assert!(cache.delete("k").await);
    assert!(!cache.delete("k").await);
}

#[tokio::test]
async fn clear_pattern_removes_only_matching_keys() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    cache.set("serp:hvac:Pelham", "1", None).await;
    cache.set("serp:plumber:Austin", "2", None).await;
    cache.set("autocomplete:hvac:Pelham", "3", None).await;

    assert_eq!(cache.clear_pattern("serp:*").await, 2);
    assert!(cache.get("serp:hvac:Pelham").await.is_none());
    assert_eq!(
        cache.get("autocomplete:hvac:Pelham").await.as_deref(),
        Some("3")
    );
}

#[tokio::test]
async fn clear_pattern_on_missing_dir_is_zero() {
    let cache = FileCache {
        dir: scratch_dir(),
        default_ttl: Duration::from_secs(60),
    };
    assert_eq!(cache.clear_pattern("*").await, 0);
}

#[tokio::test]
async fn keys_sharing_a_file_name_do_not_read_each_other() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    let underscore = "competitor_site:https://a.example/x_y";
    let slash = "competitor_site:https://a.example/x/y";
    assert_eq!(cache.path_for(underscore), cache.path_for(slash));

    cache.set(underscore, "\"site-A\"", None).await;
    assert_eq!(cache.get(slash).await, None);
    assert!(!cache.exists(slash).await);
    assert_eq!(cache.get(underscore).await.as_deref(), Some("\"site-A\""));

    cache.set(slash, "\"site-B\"", None).await;
    assert_eq!(cache.get(underscore).await, None);
    assert_eq!(cache.get(slash).await.as_deref(), Some("\"site-B\""));
}

#[tokio::test]
async fn clear_pattern_matches_the_stored_key() {
    let cache = FileCache::open(scratch_dir(), Duration::from_secs(60))
        .await
        .unwrap();
    cache.set("serp:hvac_repair:Pelham", "1", None).await;
    cache.set("serp_cache:hvac:Pelham", "2", None).await;

    // Both file stems start with `serp_`; only one key starts with `serp:`.
    assert_eq!(cache.clear_pattern("serp:*").await, 1);
    assert_eq!(cache.get("serp_cache:hvac:Pelham").await.as_deref(), Some("2"));
}
