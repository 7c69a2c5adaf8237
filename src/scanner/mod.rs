//! Domain scanning orchestration.
//!
//! A [`Scanner`] owns the nameserver pool, the result cache and the
//! concurrency limiter. For every domain it:
//! 1. Returns the cached result if one is still fresh
//! 2. Waits for a slot from the limiter
//! 3. Checks that the domain exists (NS, falling back to TXT)
//! 4. Resolves BIMI, DKIM, DMARC, MX and SPF concurrently
//! 5. Stores the merged result in the cache
//!
//! A failure for one domain is recorded on its [`ScanResult`] and never fails
//! the rest of the batch.

mod limiter;
mod result;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use hickory_proto::rr::RecordType;
use log::{debug, info, warn};
use tokio::io::AsyncRead;
use tokio::sync::RwLock;

use crate::cache::ResultCache;
use crate::config::{ScannerConfig, ScannerOption, INVALID_DOMAIN_ERROR};
use crate::dns::{Connector, NameserverPool, NetworkConnector, RecordResolver, Transport};
use crate::error_handling::{ConfigError, ScanError};
use crate::zone;

pub use limiter::ScanLimiter;
pub use result::ScanResult;

/// Everything needed to scan a domain under one configuration.
///
/// `overwrite_option` builds a new engine instead of editing this one, so a
/// scan keeps the configuration it started with.
struct Engine {
    resolver: RecordResolver,
    limiter: ScanLimiter,
}

impl Engine {
    /// Builds an engine from a normalized configuration.
    fn build(config: &ScannerConfig, connector: Arc<dyn Connector>) -> Result<Self, ConfigError> {
        let pool =
            NameserverPool::new(config.nameservers.clone()).ok_or(ConfigError::NoNameservers)?;
        let transport = Transport::new(
            connector,
            pool,
            config.protocol,
            config.dns_buffer,
            config.timeout,
        );
        Ok(Self {
            resolver: RecordResolver::new(transport, config.dkim_selectors.clone()),
            limiter: ScanLimiter::new(config.concurrency),
        })
    }

    async fn scan_domain(&self, domain: &str) -> ScanResult {
        let start = Instant::now();

        let mut result = match self.check_exists(domain).await {
            Ok(ns) => self.resolve(domain, ns).await,
            Err(error) => {
                debug!("Skipping {domain}: {error}");
                ScanResult::failed(domain, error)
            }
        };

        result.elapsed = start.elapsed();
        result
    }

    /// Returns the NS records of `domain` if it exists.
    ///
    /// Subdomains usually have no NS records of their own, so an empty NS
    /// answer falls back to a TXT query; the domain counts as existing if
    /// either returns something.
    async fn check_exists(&self, domain: &str) -> Result<Vec<String>, String> {
        let ns = self.resolver.ns(domain).await.map_err(|e| {
            warn!("NS lookup for {domain} failed: {e}");
            e.to_string()
        })?;
        if !ns.is_empty() {
            return Ok(ns);
        }

        match self.resolver.records(domain, RecordType::TXT).await {
            Ok(txt) if !txt.is_empty() => Ok(ns),
            Ok(_) => Err(INVALID_DOMAIN_ERROR.to_string()),
            Err(e) => {
                debug!("TXT lookup for {domain} failed: {e}");
                Err(INVALID_DOMAIN_ERROR.to_string())
            }
        }
    }

    async fn resolve(&self, domain: &str, ns: Vec<String>) -> ScanResult {
        let (bimi, dkim, dmarc, mx, spf) = tokio::join!(
            self.resolver.bimi(domain),
            self.resolver.dkim(domain),
            self.resolver.dmarc(domain),
            self.resolver.mx(domain),
            self.resolver.spf(domain),
        );

        match mx {
            Ok(mx) => ScanResult {
                domain: domain.to_string(),
                bimi,
                dkim,
                dmarc,
                mx,
                ns,
                spf,
                ..ScanResult::default()
            },
            Err(e) => {
                warn!("MX lookup for {domain} failed: {e}");
                ScanResult::failed(domain, e.to_string())
            }
        }
    }
}

struct ScannerState {
    config: ScannerConfig,
    engine: Arc<Engine>,
    /// Engines replaced by `overwrite_option` that running scans may still hold.
    retired: Vec<Weak<Engine>>,
}

/// Scans domains for email-security records.
///
/// ```no_run
/// use mailsec_scanner::{Scanner, ScannerConfig};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let scanner = Scanner::new(ScannerConfig::default().concurrency(16))?;
/// for result in scanner.scan(["example.org", "example.com"]).await? {
///     println!("{}: {}", result.domain, result.dmarc);
/// }
/// scanner.close().await;
/// # Ok(())
/// # }
/// ```
pub struct Scanner {
    state: RwLock<ScannerState>,
    connector: Arc<dyn Connector>,
    cache: Arc<ResultCache>,
    closed: AtomicBool,
}

impl Scanner {
    /// Creates a scanner that talks to the network.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any option is invalid. Nothing is sent
    /// before the configuration has been validated.
    pub fn new(config: ScannerConfig) -> Result<Self, ConfigError> {
        Self::with_connector(config, Arc::new(NetworkConnector::new()))
    }

    /// Creates a scanner that sends its queries through `connector`.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if any option is invalid.
    pub fn with_connector(
        config: ScannerConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Self, ConfigError> {
        let config = config.normalized()?;
        let engine = Engine::build(&config, Arc::clone(&connector))?;
        let cache = ResultCache::new(config.cache_duration);

        debug!(
            "Scanner ready: {} concurrent scans, {} over {}, cache {:?}",
            config.concurrency,
            config.nameservers.join(", "),
            config.protocol,
            config.cache_duration
        );

        Ok(Self {
            state: RwLock::new(ScannerState {
                config,
                engine: Arc::new(engine),
                retired: Vec::new(),
            }),
            connector,
            cache: Arc::new(cache),
            closed: AtomicBool::new(false),
        })
    }

    /// The effective configuration, with defaults filled in.
    pub async fn config(&self) -> ScannerConfig {
        self.state.read().await.config.clone()
    }

    /// Scans every domain and returns one result per domain.
    ///
    /// Domains are scanned concurrently up to the configured quota, so the
    /// results are not in input order. Per-domain failures are reported in
    /// [`ScanResult::error`].
    ///
    /// # Errors
    ///
    /// - `ScanError::Config` if `domains` is empty or contains an empty name
    /// - `ScanError::Closed` if the scanner has been closed
    pub async fn scan<I, S>(&self, domains: I) -> Result<Vec<ScanResult>, ScanError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ensure_open()?;

        let domains: Vec<String> = domains
            .into_iter()
            .map(|domain| domain.as_ref().to_string())
            .collect();
        if domains.is_empty() {
            return Err(ConfigError::NoDomains.into());
        }
        if domains.iter().any(|domain| domain.is_empty()) {
            return Err(ConfigError::EmptyDomain.into());
        }

        let engine = self.engine().await;
        let start = Instant::now();
        let total = domains.len();
        let mut results = Vec::with_capacity(total);
        let mut cached = 0;
        let mut tasks = FuturesUnordered::new();

        for domain in domains {
            if let Some(result) = self.cache.get(&domain).await {
                debug!("Cache hit for {domain}");
                cached += 1;
                results.push(result);
                continue;
            }

            let permit = engine.limiter.admit().await?;
            // `close` may have run while this scan waited for a slot
            self.ensure_open()?;
            let engine = Arc::clone(&engine);
            let cache = Arc::clone(&self.cache);
            let task_domain = domain.clone();
            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result = engine.scan_domain(&task_domain).await;
                cache.set(&task_domain, result.clone()).await;
                result
            });
            tasks.push(async move { (domain, handle.await) });
        }

        while let Some((domain, joined)) = tasks.next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => {
                    warn!("Scan task for {domain} did not complete: {e}");
                    results.push(ScanResult::failed(domain, e.to_string()));
                }
            }
        }

        info!(
            "Scanned {total} domain{} in {:.1}s ({cached} from cache)",
            if total == 1 { "" } else { "s" },
            start.elapsed().as_secs_f64()
        );
        Ok(results)
    }

    /// Reads domain names from an RFC 1035 zone file and scans them.
    ///
    /// # Errors
    ///
    /// `ScanError::Zone` if the zone cannot be read or parsed, plus every
    /// error [`scan`](Self::scan) returns.
    pub async fn scan_zone<R>(&self, reader: R) -> Result<Vec<ScanResult>, ScanError>
    where
        R: AsyncRead + Unpin,
    {
        self.ensure_open()?;
        let domains = zone::domains(reader).await?;
        self.scan(domains).await
    }

    /// Reads newline-separated domain names and scans them.
    ///
    /// # Errors
    ///
    /// Same as [`scan_zone`](Self::scan_zone).
    pub async fn scan_text<R>(&self, reader: R) -> Result<Vec<ScanResult>, ScanError>
    where
        R: AsyncRead + Unpin,
    {
        self.ensure_open()?;
        let domains = zone::domains_from_text(reader).await?;
        self.scan(domains).await
    }

    /// Looks up raw records of `record_type` for `name`, following CNAMEs.
    ///
    /// Bypasses the cache and the concurrency limiter.
    pub async fn lookup(
        &self,
        name: &str,
        record_type: RecordType,
    ) -> Result<Vec<String>, ScanError> {
        self.ensure_open()?;
        let engine = self.engine().await;
        Ok(engine.resolver.records(name, record_type).await?)
    }

    /// Changes one option of a running scanner.
    ///
    /// Scans already in progress finish with the previous configuration.
    /// Changing the concurrency creates a new limiter, so for a short while
    /// old and new scans together may exceed either quota.
    ///
    /// # Errors
    ///
    /// `ScanError::Config` if the new value is invalid, in which case the
    /// scanner is unchanged; `ScanError::Closed` after [`close`](Self::close).
    pub async fn overwrite_option(&self, option: ScannerOption) -> Result<(), ScanError> {
        self.ensure_open()?;

        let mut state = self.state.write().await;
        let mut config = state.config.clone();
        option.apply(&mut config)?;
        let config = config.normalized()?;
        let engine = Engine::build(&config, Arc::clone(&self.connector))?;

        if config.cache_duration != state.config.cache_duration {
            self.cache.set_ttl(config.cache_duration).await;
        }

        debug!("Scanner reconfigured: {config:?}");
        let previous = std::mem::replace(&mut state.engine, Arc::new(engine));
        state.retired.retain(|engine| engine.strong_count() > 0);
        state.retired.push(Arc::downgrade(&previous));
        state.config = config;
        Ok(())
    }

    /// Shuts the scanner down: pending admissions fail, the cache sweeper
    /// stops and the cache is flushed. Every later call returns
    /// `ScanError::Closed`, and scans still running stop admitting domains.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let state = self.state.read().await;
        state.engine.limiter.close();
        for engine in state.retired.iter().filter_map(Weak::upgrade) {
            engine.limiter.close();
        }
        drop(state);
        self.cache.close().await;
        debug!("Scanner closed");
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> Result<(), ScanError> {
        if self.is_closed() {
            return Err(ScanError::Closed);
        }
        Ok(())
    }

    async fn engine(&self) -> Arc<Engine> {
        Arc::clone(&self.state.read().await.engine)
    }
}
