use chrono::{Duration, Utc};
use geofeed::{
    cluster_items, rank_items, ClusterConfig, FixedClock, GeoPoint, MapItem, RankingConfig,
};
use rand::prelude::*;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = StdRng::seed_from_u64(42);
    let now = Utc::now();

    // 2,000 photos scattered around central London over the last week
    let items: Vec<MapItem> = (0..2_000)
        .map(|i| {
            let position = GeoPoint::new(
                51.5 + rng.gen_range(-0.1..0.1),
                -0.12 + rng.gen_range(-0.15..0.15),
            );
            let created = now - Duration::minutes(rng.gen_range(0..10_080));
            MapItem::new(format!("photo-{i}"), position, created, rng.gen_range(-5..120))
        })
        .collect();

    // Cluster as the map would at zoom 13
    let config = ClusterConfig::for_zoom(13.0, 51.5, 40.0);
    let partition = cluster_items(&items, &config);
    println!(
        "threshold {:.0} m: {} circles, {} markers, {} single photos",
        config.threshold_meters,
        partition.large_clusters.len(),
        partition.small_clusters.len(),
        partition.unclustered.len()
    );

    // Rank the same photos for the feed
    let feed = rank_items(&items, &RankingConfig::default(), &FixedClock::new(now));
    println!("Top of feed: {} ({} votes)", feed[0].id, feed[0].vote_score);
    Ok(())
}
