use std::time::Duration;

use apcupsd_client::domain::{PowerStats, Reading, UpsStatus};
use serde_json::json;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    QueryBuilder, Row, Sqlite,
};
use time::{
    format_description::FormatItem, macros::format_description, Duration as TimeDuration,
    OffsetDateTime, PrimitiveDateTime, UtcOffset,
};

use crate::{
    config::{RatingConfig, StoreConfig},
    power,
};

/// Timestamps are stored as local-clock ISO-8601 text: lexicographic order
/// matches chronological order and SQLite's datetime functions accept it.
const SQL_TIMESTAMP_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");

/// Raw readings up to this window; 15-minute buckets up to
/// [`HOURLY_CUTOFF_HOURS`]; hourly buckets beyond.
const RAW_CUTOFF_HOURS: i64 = 72;
const HOURLY_CUTOFF_HOURS: i64 = 168;

/// A raw or 15-minute window whose earliest point starts later than this past
/// the window start gets a leading zero point so charts do not show a false
/// origin.
const RAW_GAP_THRESHOLD: TimeDuration = TimeDuration::minutes(5);

/// Events are acknowledged over this window, matching the widest window the
/// events query serves.
const ACK_WINDOW_DAYS: i64 = 7;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("stored status blob is not valid JSON: {0}")]
    Blob(#[from] serde_json::Error),
    #[error("timestamp format error: {0}")]
    Format(#[from] time::error::Format),
    #[error("stored timestamp does not parse: {0}")]
    Parse(#[from] time::error::Parse),
}

/// Time bucket used for aggregated history reads.
#[derive(Clone, Copy)]
enum Bucket {
    Hour,
    QuarterHour,
}

impl Bucket {
    /// SQL expression yielding the bucket's start timestamp for a row.
    fn sql_expr(self) -> &'static str {
        match self {
            Bucket::Hour => "strftime('%Y-%m-%dT%H:00:00', timestamp)",
            Bucket::QuarterHour => {
                "strftime('%Y-%m-%dT%H:', timestamp) \
                 || printf('%02d:00', (CAST(strftime('%M', timestamp) AS INTEGER) / 15) * 15)"
            }
        }
    }
}

/// Durable UPS reading time series over SQLite.
///
/// Every operation checks a connection out of the pool only for its own
/// scope; WAL mode keeps the collector's writes from blocking concurrent API
/// reads. The `data` blob is opaque to the store except for the `json_extract`
/// pulls the aggregation and event queries perform.
#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
    rating: RatingConfig,
    max_points: usize,
    offset: UtcOffset,
}

impl Store {
    /// Open the database (creating it if missing) and apply the schema.
    pub async fn connect(
        cfg: &StoreConfig,
        rating: RatingConfig,
        offset: UtcOffset,
    ) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&cfg.db_path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            .max_connections(cfg.max_connections)
            .connect_with(options)
            .await?;

        Self::with_pool(pool, rating, cfg.max_points, offset).await
    }

    pub async fn with_pool(
        pool: SqlitePool,
        rating: RatingConfig,
        max_points: usize,
        offset: UtcOffset,
    ) -> Result<Self, StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS ups_readings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp TEXT NOT NULL,
                data TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_ups_readings_timestamp ON ups_readings(timestamp)",
        )
        .execute(&pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS event_acks (
                event_timestamp TEXT PRIMARY KEY,
                acknowledged_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self {
            pool,
            rating,
            max_points,
            offset,
        })
    }

    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc().to_offset(self.offset)
    }

    fn format_ts(ts: OffsetDateTime) -> Result<String, StoreError> {
        Ok(ts.format(SQL_TIMESTAMP_FORMAT)?)
    }

    fn parse_ts(&self, value: &str) -> Result<OffsetDateTime, StoreError> {
        Ok(PrimitiveDateTime::parse(value, SQL_TIMESTAMP_FORMAT)?.assume_offset(self.offset))
    }

    /// Append one reading at the current time. The snapshot is stored as
    /// given; the store neither dedups nor validates it.
    pub async fn append(&self, status: &UpsStatus) -> Result<(), StoreError> {
        let data = serde_json::to_string(status)?;

        sqlx::query("INSERT INTO ups_readings (timestamp, data) VALUES (?1, ?2)")
            .bind(Self::format_ts(self.now())?)
            .bind(data)
            .execute(&self.pool)
            .await?;

        metrics::counter!("ups_readings_stored_total").increment(1);
        Ok(())
    }

    /// Readings (or bucket averages) covering the last `hours` hours, oldest
    /// first.
    ///
    /// Resolution drops with the window so responses stay chartable: raw rows
    /// up to 72 h, 15-minute buckets up to 168 h, hourly buckets beyond.
    /// Leading gaps are filled with zero points at the output granularity. At
    /// most `max_points` entries come back; larger sets are decimated by a
    /// fixed stride, which under-represents the window's tail (accepted
    /// trade-off, kept from the stride design).
    pub async fn history(&self, hours: i64) -> Result<Vec<Reading>, StoreError> {
        let window_start = self.now() - TimeDuration::hours(hours);
        let cutoff = Self::format_ts(window_start)?;

        let mut readings = if hours > HOURLY_CUTOFF_HOURS {
            self.bucketed(&cutoff, Bucket::Hour).await?
        } else if hours > RAW_CUTOFF_HOURS {
            self.bucketed(&cutoff, Bucket::QuarterHour).await?
        } else {
            self.raw_readings(&cutoff).await?
        };

        if hours > HOURLY_CUTOFF_HOURS {
            self.fill_hourly_gap(&mut readings, window_start)?;
        } else {
            self.fill_leading_gap(&mut readings, window_start)?;
        }

        Ok(decimate(readings, self.max_points))
    }

    async fn raw_readings(&self, cutoff: &str) -> Result<Vec<Reading>, StoreError> {
        let rows = sqlx::query(
            "SELECT timestamp, data FROM ups_readings WHERE timestamp > ?1 ORDER BY timestamp",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        reading_rows(rows)
    }

    async fn bucketed(&self, cutoff: &str, bucket: Bucket) -> Result<Vec<Reading>, StoreError> {
        let sql = format!(
            r#"
            SELECT
                {bucket} AS bucket,
                COALESCE(AVG(CAST(json_extract(data, '$.WATTS') AS REAL)), 0.0) AS watts,
                COALESCE(AVG(CAST(json_extract(data, '$.AMPS') AS REAL)), 0.0) AS amps,
                COALESCE(AVG(CAST(json_extract(data, '$.LOADPCT') AS REAL)), 0.0) AS load_pct,
                COALESCE(AVG(CAST(json_extract(data, '$.BCHARGE') AS REAL)), 0.0) AS bcharge,
                COUNT(*) AS samples
            FROM ups_readings
            WHERE timestamp > ?1
            GROUP BY bucket
            ORDER BY bucket
            "#,
            bucket = bucket.sql_expr()
        );

        let rows = sqlx::query(&sql).bind(cutoff).fetch_all(&self.pool).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                bucket_reading(
                    row.get("bucket"),
                    row.get("watts"),
                    row.get("amps"),
                    row.get("load_pct"),
                    row.get("bcharge"),
                    row.get("samples"),
                )
            })
            .collect())
    }

    /// Single zero point at the window start when the earliest raw/15-minute
    /// entry leaves a leading gap beyond the threshold.
    fn fill_leading_gap(
        &self,
        readings: &mut Vec<Reading>,
        window_start: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let Some(first) = readings.first() else {
            return Ok(());
        };
        let first_ts = self.parse_ts(&first.timestamp)?;

        if first_ts - window_start > RAW_GAP_THRESHOLD {
            readings.insert(0, zero_point(Self::format_ts(window_start)?));
        }
        Ok(())
    }

    /// Hour-aligned zero points from the window start up to the first real
    /// bucket; any leading gap at hourly resolution is filled.
    fn fill_hourly_gap(
        &self,
        readings: &mut Vec<Reading>,
        window_start: OffsetDateTime,
    ) -> Result<(), StoreError> {
        let Some(first) = readings.first() else {
            return Ok(());
        };
        let first_ts = self.parse_ts(&first.timestamp)?;

        let mut cursor = window_start
            .replace_minute(0)
            .unwrap_or(window_start)
            .replace_second(0)
            .unwrap_or(window_start)
            .replace_nanosecond(0)
            .unwrap_or(window_start);
        if cursor < window_start {
            cursor += TimeDuration::hours(1);
        }

        let mut fill = Vec::new();
        while cursor < first_ts {
            fill.push(zero_point(Self::format_ts(cursor)?));
            cursor += TimeDuration::hours(1);
        }
        readings.splice(0..0, fill);
        Ok(())
    }

    /// Readings that mark a transfer to battery: `NUMXFERS` changed from the
    /// previous reading, or `STATUS` contains the on-battery marker. The
    /// first reading in the window has no predecessor and is only flagged on
    /// status. Acknowledged events are excluded.
    pub async fn events(&self, days: i64) -> Result<Vec<Reading>, StoreError> {
        let cutoff = Self::format_ts(self.now() - TimeDuration::days(days))?;

        let rows = sqlx::query(
            r#"
            WITH ordered AS (
                SELECT
                    timestamp,
                    data,
                    json_extract(data, '$.NUMXFERS') AS curr_transfers,
                    LAG(json_extract(data, '$.NUMXFERS'))
                        OVER (ORDER BY timestamp) AS prev_transfers,
                    json_extract(data, '$.STATUS') AS status
                FROM ups_readings
                WHERE timestamp > ?1
            )
            SELECT o.timestamp, o.data
            FROM ordered o
            LEFT JOIN event_acks a ON a.event_timestamp = o.timestamp
            WHERE ((o.curr_transfers != o.prev_transfers AND o.prev_transfers IS NOT NULL)
                   OR o.status LIKE '%ONBATT%')
              AND a.event_timestamp IS NULL
            ORDER BY o.timestamp
            "#,
        )
        .bind(&cutoff)
        .fetch_all(&self.pool)
        .await?;

        reading_rows(rows)
    }

    /// Durably acknowledge every currently-unacknowledged event in the 7-day
    /// window. Re-acknowledging a timestamp is a no-op, not an error. Returns
    /// the number of acknowledgements recorded.
    pub async fn acknowledge_all(&self) -> Result<u64, StoreError> {
        let events = self.events(ACK_WINDOW_DAYS).await?;
        if events.is_empty() {
            return Ok(0);
        }

        let acknowledged_at = Self::format_ts(self.now())?;
        let mut builder = QueryBuilder::<Sqlite>::new(
            "INSERT INTO event_acks (event_timestamp, acknowledged_at) ",
        );
        builder.push_values(&events, |mut b, event| {
            b.push_bind(&event.timestamp).push_bind(&acknowledged_at);
        });
        builder.push(" ON CONFLICT(event_timestamp) DO NOTHING");

        let result = builder.build().execute(&self.pool).await?;
        metrics::counter!("ups_events_acknowledged_total").increment(result.rows_affected());
        Ok(result.rows_affected())
    }

    /// Summary statistics over readings whose watt value parses positive.
    /// An empty window yields all zeros, not an error.
    pub async fn statistics(&self, days: i64) -> Result<PowerStats, StoreError> {
        let cutoff = Self::format_ts(self.now() - TimeDuration::days(days))?;

        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) AS count,
                COALESCE(AVG(watts), 0.0) AS avg_watts,
                COALESCE(MIN(watts), 0.0) AS min_watts,
                COALESCE(MAX(watts), 0.0) AS max_watts,
                COALESCE(AVG(load_pct), 0.0) AS avg_load_pct
            FROM (
                SELECT
                    CAST(json_extract(data, '$.WATTS') AS REAL) AS watts,
                    CAST(json_extract(data, '$.LOADPCT') AS REAL) AS load_pct
                FROM ups_readings
                WHERE timestamp > ?1
            )
            WHERE watts > 0
            "#,
        )
        .bind(&cutoff)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.get("count");
        if count == 0 {
            return Ok(PowerStats::default());
        }

        let avg_watts: f64 = row.get("avg_watts");
        Ok(PowerStats {
            count,
            avg_watts: power::round_to(avg_watts, 1),
            min_watts: row.get("min_watts"),
            max_watts: row.get("max_watts"),
            avg_load_pct: power::round_to(row.get("avg_load_pct"), 1),
            cost_per_hour: power::cost_per_hour(&self.rating, avg_watts),
            cost_per_day: power::cost_per_day(&self.rating, avg_watts),
            cost_per_month: power::cost_per_month(&self.rating, avg_watts),
            cost_per_year: power::cost_per_year(&self.rating, avg_watts),
        })
    }

    /// Delete readings older than the retention window. Returns rows removed.
    pub async fn cleanup(&self, retention_days: i64) -> Result<u64, StoreError> {
        let cutoff = Self::format_ts(self.now() - TimeDuration::days(retention_days))?;

        let result = sqlx::query("DELETE FROM ups_readings WHERE timestamp < ?1")
            .bind(&cutoff)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Age of the newest reading, if any; the health endpoint uses this to
    /// judge whether the collector is alive.
    pub async fn latest_reading_age(&self) -> Result<Option<TimeDuration>, StoreError> {
        let row = sqlx::query("SELECT timestamp FROM ups_readings ORDER BY timestamp DESC LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let ts: String = row.get("timestamp");
        Ok(Some(self.now() - self.parse_ts(&ts)?))
    }
}

fn reading_rows(rows: Vec<sqlx::sqlite::SqliteRow>) -> Result<Vec<Reading>, StoreError> {
    rows.into_iter()
        .map(|row| {
            let timestamp: String = row.get("timestamp");
            let data: String = row.get("data");
            Ok(Reading {
                timestamp,
                data: serde_json::from_str(&data)?,
            })
        })
        .collect()
}

fn bucket_reading(
    timestamp: String,
    watts: f64,
    amps: f64,
    load_pct: f64,
    bcharge: f64,
    samples: i64,
) -> Reading {
    Reading {
        timestamp,
        data: json!({
            "WATTS": power::round_to(watts, 1),
            "AMPS": power::round_to(amps, 2),
            "LOADPCT": power::round_to(load_pct, 1),
            "BCHARGE": power::round_to(bcharge, 1),
            "SAMPLES": samples,
        }),
    }
}

fn zero_point(timestamp: String) -> Reading {
    Reading {
        timestamp,
        data: json!({
            "WATTS": 0.0,
            "AMPS": 0.0,
            "LOADPCT": 0.0,
            "BCHARGE": 0.0,
            "SAMPLES": 0,
        }),
    }
}

/// Keep at most `max_points` entries by fixed-stride decimation: the first of
/// every `len / max_points` entries survives.
fn decimate(readings: Vec<Reading>, max_points: usize) -> Vec<Reading> {
    if max_points == 0 || readings.len() <= max_points {
        return readings;
    }
    let stride = (readings.len() / max_points).max(1);
    readings
        .into_iter()
        .step_by(stride)
        .take(max_points)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> Store {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        Store::with_pool(pool, RatingConfig::default(), 200, UtcOffset::UTC)
            .await
            .unwrap()
    }

    async fn insert_at(store: &Store, ts: OffsetDateTime, data: serde_json::Value) {
        sqlx::query("INSERT INTO ups_readings (timestamp, data) VALUES (?1, ?2)")
            .bind(Store::format_ts(ts).unwrap())
            .bind(data.to_string())
            .execute(&store.pool)
            .await
            .unwrap();
    }

    fn sample(watts: f64, load_pct: &str, status: &str, numxfers: &str) -> serde_json::Value {
        json!({
            "STATUS": status,
            "LOADPCT": load_pct,
            "NUMXFERS": numxfers,
            "WATTS": watts,
            "AMPS": watts / 120.0,
            "BCHARGE": "100.0",
        })
    }

    #[tokio::test]
    async fn append_then_query_round_trips_the_snapshot() {
        let store = memory_store().await;

        let status = UpsStatus {
            status: Some("ONLINE".to_string()),
            load_pct: Some("25.0".to_string()),
            watts: 675.0,
            amps: 5.72,
            ..UpsStatus::default()
        };
        store.append(&status).await.unwrap();

        let readings = store.history(24).await.unwrap();
        // A leading zero point anchors the chart at the window start.
        assert_eq!(readings.len(), 2);
        assert_eq!(readings[0].data["WATTS"], 0.0);

        let stored = &readings[1];
        assert_eq!(stored.data["STATUS"], "ONLINE");
        assert_eq!(stored.data["LOADPCT"], "25.0");
        assert_eq!(stored.data["WATTS"], 675.0);
    }

    #[tokio::test]
    async fn transfer_count_changes_are_events_except_the_first_reading() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(10);

        for (i, xfers) in ["0", "0", "1", "1", "2"].iter().enumerate() {
            insert_at(
                &store,
                base + TimeDuration::minutes(i as i64),
                sample(600.0, "22.0", "ONLINE", xfers),
            )
            .await;
        }

        let events = store.events(1).await.unwrap();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].data["NUMXFERS"], "1");
        assert_eq!(events[1].data["NUMXFERS"], "2");
        assert_eq!(
            events[0].timestamp,
            Store::format_ts(base + TimeDuration::minutes(2)).unwrap()
        );
        assert_eq!(
            events[1].timestamp,
            Store::format_ts(base + TimeDuration::minutes(4)).unwrap()
        );
    }

    #[tokio::test]
    async fn on_battery_status_is_an_event_even_without_a_predecessor() {
        let store = memory_store().await;
        insert_at(
            &store,
            store.now() - TimeDuration::minutes(1),
            sample(600.0, "22.0", "ONBATT", "1"),
        )
        .await;

        let events = store.events(1).await.unwrap();
        assert_eq!(events.len(), 1);
    }

    #[tokio::test]
    async fn acknowledge_all_is_idempotent() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(5);

        insert_at(&store, base, sample(600.0, "22.0", "ONLINE", "0")).await;
        insert_at(
            &store,
            base + TimeDuration::minutes(1),
            sample(600.0, "22.0", "ONBATT", "1"),
        )
        .await;

        let first = store.acknowledge_all().await.unwrap();
        assert!(first > 0);
        assert!(store.events(7).await.unwrap().is_empty());

        let second = store.acknowledge_all().await.unwrap();
        assert_eq!(second, 0);
        assert!(store.events(7).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn statistics_on_an_empty_window_is_all_zero() {
        let store = memory_store().await;
        let stats = store.statistics(7).await.unwrap();
        assert_eq!(stats, PowerStats::default());
    }

    #[tokio::test]
    async fn statistics_ignore_readings_without_positive_watts() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(10);

        insert_at(&store, base, sample(600.0, "20.0", "ONLINE", "0")).await;
        insert_at(
            &store,
            base + TimeDuration::minutes(1),
            sample(700.0, "30.0", "ONLINE", "0"),
        )
        .await;
        insert_at(
            &store,
            base + TimeDuration::minutes(2),
            sample(0.0, "0.0", "ONLINE", "0"),
        )
        .await;

        let stats = store.statistics(7).await.unwrap();
        assert_eq!(stats.count, 2);
        assert_eq!(stats.avg_watts, 650.0);
        assert_eq!(stats.min_watts, 600.0);
        assert_eq!(stats.max_watts, 700.0);
        assert_eq!(stats.avg_load_pct, 25.0);
        assert_eq!(stats.cost_per_hour, 0.081);
        assert_eq!(stats.cost_per_day, 1.93);
    }

    #[tokio::test]
    async fn short_windows_return_raw_readings() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(10);

        insert_at(&store, base, sample(600.0, "22.0", "ONLINE", "0")).await;
        insert_at(
            &store,
            base + TimeDuration::minutes(1),
            sample(610.0, "23.0", "ONLINE", "0"),
        )
        .await;

        let readings = store.history(72).await.unwrap();
        // Leading zero point plus the two raw rows.
        assert_eq!(readings.len(), 3);
        assert_eq!(readings[0].data["WATTS"], 0.0);
        assert_eq!(readings[1].data["STATUS"], "ONLINE");
        assert!(readings[1].data.get("SAMPLES").is_none());
    }

    #[tokio::test]
    async fn mid_windows_aggregate_into_quarter_hour_buckets() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(30);

        // Two readings at the same instant are guaranteed to share a bucket.
        insert_at(&store, base, sample(600.0, "20.0", "ONLINE", "0")).await;
        insert_at(&store, base, sample(700.0, "30.0", "ONLINE", "0")).await;

        let readings = store.history(73).await.unwrap();
        let bucket = readings.last().unwrap();
        assert_eq!(bucket.data["SAMPLES"], 2);
        assert_eq!(bucket.data["WATTS"], 650.0);
        assert_eq!(bucket.data["LOADPCT"], 25.0);
        assert!(bucket.timestamp.ends_with(":00"));
    }

    #[tokio::test]
    async fn the_168_hour_boundary_separates_bucket_resolutions() {
        let store = memory_store().await;
        insert_at(
            &store,
            store.now() - TimeDuration::minutes(20),
            sample(600.0, "20.0", "ONLINE", "0"),
        )
        .await;

        // At exactly 168 h the bucket minute can be any quarter; above it the
        // bucket is always hour-aligned and the leading gap fills hourly.
        let at_boundary = store.history(168).await.unwrap();
        assert_eq!(at_boundary.len(), 2);

        let beyond = store.history(169).await.unwrap();
        assert!(beyond.len() > 150);
        assert_eq!(beyond[0].data["WATTS"], 0.0);
        assert_eq!(beyond[0].data["SAMPLES"], 0);
        let real: Vec<_> = beyond
            .iter()
            .filter(|r| r.data["SAMPLES"] != 0)
            .collect();
        assert_eq!(real.len(), 1);
        assert_eq!(real[0].data["SAMPLES"], 1);
        assert!(real[0].timestamp.ends_with(":00:00"));
    }

    #[tokio::test]
    async fn oversized_result_sets_are_decimated_by_stride() {
        let store = memory_store().await;
        let base = store.now() - TimeDuration::minutes(450);

        for i in 0..450 {
            insert_at(
                &store,
                base + TimeDuration::minutes(i),
                sample(600.0, "22.0", "ONLINE", "0"),
            )
            .await;
        }

        let readings = store.history(72).await.unwrap();
        assert_eq!(readings.len(), 200);
        for pair in readings.windows(2) {
            assert!(pair[0].timestamp < pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn cleanup_removes_only_expired_readings() {
        let store = memory_store().await;

        insert_at(
            &store,
            store.now() - TimeDuration::days(10),
            sample(600.0, "22.0", "ONLINE", "0"),
        )
        .await;
        insert_at(
            &store,
            store.now() - TimeDuration::hours(1),
            sample(610.0, "23.0", "ONLINE", "0"),
        )
        .await;

        let removed = store.cleanup(7).await.unwrap();
        assert_eq!(removed, 1);

        let readings = store.history(72).await.unwrap();
        let real: Vec<_> = readings
            .iter()
            .filter(|r| r.data.get("STATUS").is_some())
            .collect();
        assert_eq!(real.len(), 1);
    }

    #[tokio::test]
    async fn latest_reading_age_tracks_the_newest_row() {
        let store = memory_store().await;
        assert!(store.latest_reading_age().await.unwrap().is_none());

        insert_at(
            &store,
            store.now() - TimeDuration::seconds(60),
            sample(600.0, "22.0", "ONLINE", "0"),
        )
        .await;

        let age = store.latest_reading_age().await.unwrap().unwrap();
        assert!(age >= TimeDuration::seconds(59));
        assert!(age < TimeDuration::seconds(180));
    }
}
