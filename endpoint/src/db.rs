use crate::config::{Config, ConnectionMode};
use crate::errors::{Error, Result};
use crate::metrics::{CONNECTIONS_CHECKED_OUT, QUERY_LATENCY_SECONDS};
use crate::model::TemperatureReading;
use chrono::{DateTime, Utc};
use sqlx::pool::PoolConnection;
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions};
use sqlx::{Connection, Postgres};
use std::future::Future;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info, warn};

const INSERT_READING: &str = "INSERT INTO temperature (temperature, recorded_at) VALUES ($1, $2)";
const SELECT_READINGS: &str = "SELECT temperature::float8 AS temperature, \
     recorded_at::timestamptz AS recorded_at FROM temperature";

/// Storage operations the HTTP layer depends on.
pub trait ReadingStore: Clone + Send + Sync + 'static {
    /// Appends one reading stamped with the current server time; returns rows written.
    fn insert(&self, temperature: f64) -> impl Future<Output = Result<u64>> + Send;

    /// Returns every stored reading in storage order.
    fn select_all(&self) -> impl Future<Output = Result<Vec<TemperatureReading>>> + Send;
}

/// Where connections come from: a shared pool or a fresh connection per call.
#[derive(Debug, Clone)]
pub enum Connector {
    Pool(PgPool),
    PerRequest {
        options: PgConnectOptions,
        timeout: Duration,
    },
}

impl Connector {
    /// Builds a connector without touching the database; connections are opened on first use.
    pub fn from_config(config: &Config) -> Result<Self> {
        let options: PgConnectOptions = config.connection_string.parse()?;

        match config.connection_mode {
            ConnectionMode::Pool => {
                info!(
                    "Using connection pool (max_connections={}, acquire_timeout={:?})",
                    config.pool_max_connections, config.acquire_timeout
                );
                let pool = PgPoolOptions::new()
                    .max_connections(config.pool_max_connections)
                    .acquire_timeout(config.acquire_timeout)
                    .connect_lazy_with(options);
                Ok(Connector::Pool(pool))
            }
            ConnectionMode::PerRequest => {
                info!("Using a new connection per request");
                Ok(Connector::PerRequest {
                    options,
                    timeout: config.acquire_timeout,
                })
            }
        }
    }

    pub async fn acquire(&self) -> Result<Lease> {
        let conn = match self {
            Connector::Pool(pool) => Conn::Pooled(pool.acquire().await?),
            Connector::PerRequest { options, timeout } => {
                let connect = PgConnection::connect_with(options);
                match tokio::time::timeout(*timeout, connect).await {
                    Ok(conn) => Conn::Single(conn?),
                    Err(_) => {
                        return Err(Error::Storage(sqlx::Error::Io(std::io::Error::new(
                            std::io::ErrorKind::TimedOut,
                            "timed out opening database connection",
                        ))))
                    }
                }
            }
        };

        Ok(Lease {
            conn,
            _checkout: Checkout::start(),
        })
    }
}

enum Conn {
    Pooled(PoolConnection<Postgres>),
    Single(PgConnection),
}

/// A connection held for the duration of one operation.
///
/// `release` hands a pooled connection back or closes a per-request one
/// cleanly. A lease that is dropped instead (early return, cancelled
/// request) still gives its connection back: the pool reclaims it on drop
/// and a standalone connection closes its socket.
pub struct Lease {
    conn: Conn,
    _checkout: Checkout,
}

impl Lease {
    pub fn connection(&mut self) -> &mut PgConnection {
        match &mut self.conn {
            Conn::Pooled(c) => &mut **c,
            Conn::Single(c) => c,
        }
    }

    pub async fn release(self) {
        let Lease { conn, _checkout } = self;
        match conn {
            Conn::Pooled(c) => drop(c),
            Conn::Single(c) => {
                if let Err(e) = c.close().await {
                    warn!("Failed to close database connection cleanly: {}", e);
                }
            }
        }
    }
}

// Tracks the checked-out gauge for as long as a lease is alive.
struct Checkout;

impl Checkout {
    fn start() -> Self {
        CONNECTIONS_CHECKED_OUT.inc();
        Checkout
    }
}

impl Drop for Checkout {
    fn drop(&mut self) {
        CONNECTIONS_CHECKED_OUT.dec();
    }
}

/// The `temperature` table, reached through a [`Connector`].
#[derive(Debug, Clone)]
pub struct TemperatureStore {
    connector: Connector,
}

impl TemperatureStore {
    pub fn new(connector: Connector) -> Self {
        Self { connector }
    }
}

impl ReadingStore for TemperatureStore {
    async fn insert(&self, temperature: f64) -> Result<u64> {
        let start = Instant::now();
        let mut lease = self.connector.acquire().await?;
        let result = insert_reading(lease.connection(), temperature, Utc::now()).await;
        lease.release().await;
        QUERY_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
        result
    }

    async fn select_all(&self) -> Result<Vec<TemperatureReading>> {
        let start = Instant::now();
        let mut lease = self.connector.acquire().await?;
        let result = select_readings(lease.connection()).await;
        lease.release().await;
        QUERY_LATENCY_SECONDS.observe(start.elapsed().as_secs_f64());
        result
    }
}

async fn insert_reading(
    conn: &mut PgConnection,
    temperature: f64,
    recorded_at: DateTime<Utc>,
) -> Result<u64> {
    let done = sqlx::query(INSERT_READING)
        .bind(temperature)
        .bind(recorded_at)
        .execute(conn)
        .await?;

    debug!(
        "Inserted temperature {} at {}: {} rows",
        temperature,
        recorded_at,
        done.rows_affected()
    );
    Ok(done.rows_affected())
}

async fn select_readings(conn: &mut PgConnection) -> Result<Vec<TemperatureReading>> {
    let readings = sqlx::query_as::<_, TemperatureReading>(SELECT_READINGS)
        .fetch_all(conn)
        .await?;

    debug!("Fetched {} readings", readings.len());
    Ok(readings)
}
