//! OpenFoodFacts client
//!
//! Search degrades to an empty list on any upstream problem and skips the
//! cache when nothing answered; product lookup reports failures so the
//! caller can tell "unavailable" from "not found".

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::CatalogConfig;
use super::cache::CacheStore;
use super::product::CatalogProduct;
use super::transport::CatalogTransport;
use super::CatalogError;

/// How long search results stay cached
pub const SEARCH_CACHE_TTL: Duration = Duration::from_secs(6 * 60 * 60);

pub const MAX_SEARCH_LIMIT: usize = 30;

const SEARCH_FIELDS: &str = "code,product_name,generic_name,brands,nutriments";
const REGIONAL_FILTER: (&str, &str) = ("countries_tags_en", "russia");

/// Product codes are digit-only barcodes; anything else never reaches a URL
pub fn is_barcode(code: &str) -> bool {
    !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit())
}

pub struct CatalogClient {
    config: CatalogConfig,
    transport: Arc<dyn CatalogTransport>,
    cache: Option<Arc<dyn CacheStore>>,
}

impl CatalogClient {
    pub fn new(
        config: CatalogConfig,
        transport: Arc<dyn CatalogTransport>,
        cache: Option<Arc<dyn CacheStore>>,
    ) -> Self {
        Self { config, transport, cache }
    }

    fn cache_key(query: &str, limit: usize) -> String {
        format!("off_search_v3:{}:{}", query.trim().to_lowercase(), limit)
    }

    /// Search the catalog. Blank queries return nothing without a request.
    pub fn search(&self, query: &str, limit: usize) -> Vec<CatalogProduct> {
        let query = query.trim();
        if query.is_empty() {
            return Vec::new();
        }
        let limit = limit.clamp(1, MAX_SEARCH_LIMIT);
        let key = Self::cache_key(query, limit);

        if let Some(cached) = self.cache_get(&key) {
            debug!(query, limit, "Catalog search served from cache");
            return cached;
        }

        let base = vec![
            ("search_terms", query.to_string()),
            ("search_simple", "1".to_string()),
            ("action", "process".to_string()),
            ("json", "1".to_string()),
            ("page_size", limit.to_string()),
            ("fields", SEARCH_FIELDS.to_string()),
        ];
        let mut regional = base.clone();
        regional.push((REGIONAL_FILTER.0, REGIONAL_FILTER.1.to_string()));

        // `reached` is false only when no request got an answer
        let (raw, reached) = match self.fetch_products(&regional) {
            Ok(raw) if !raw.is_empty() => (raw, true),
            first => {
                info!(query, limit, "No regional catalog results, searching without country filter");
                match self.fetch_products(&base) {
                    Ok(raw) => (raw, true),
                    Err(_) => (Vec::new(), first.is_ok()),
                }
            }
        };

        let products: Vec<CatalogProduct> = raw
            .iter()
            .filter_map(|p| CatalogProduct::from_json(p, None))
            .collect();

        if reached {
            self.cache_set(&key, &products);
        } else {
            warn!(query, limit, "Catalog unreachable, result not cached");
        }
        products
    }

    /// Look up one product by barcode.
    ///
    /// `Ok(None)` for a blank or non-numeric code, HTTP 404 or a response
    /// whose `status` is not 1.
    pub fn get_product(&self, code: &str) -> Result<Option<CatalogProduct>, CatalogError> {
        let code = code.trim();
        if !is_barcode(code) {
            return Ok(None);
        }

        let url = format!("{}/api/v2/product/{}.json", self.config.base_url, code);
        let response = self.transport.get(&url, &[], self.config.product_timeout)?;
        if response.status == 404 {
            return Ok(None);
        }
        if !response.is_success() {
            return Err(CatalogError::Status(response.status));
        }

        let data: Value = serde_json::from_str(&response.body)?;
        if data.get("status").and_then(Value::as_i64) != Some(1) {
            return Ok(None);
        }

        let empty = Value::Object(Default::default());
        let product = data.get("product").filter(|p| p.is_object()).unwrap_or(&empty);
        Ok(CatalogProduct::from_json(product, Some(code)))
    }

    /// One search request. Transport, status and JSON failures are errors;
    /// a well-formed answer without a products list is an empty result.
    fn fetch_products(&self, query: &[(&str, String)]) -> Result<Vec<Value>, CatalogError> {
        let url = format!("{}/cgi/search.pl", self.config.base_url);
        let response = self
            .transport
            .get(&url, query, self.config.search_timeout)
            .map_err(|e| {
                warn!(error = %e, "Catalog search request failed");
                e
            })?;
        if !response.is_success() {
            warn!(status = response.status, "Catalog search returned error status");
            return Err(CatalogError::Status(response.status));
        }

        match serde_json::from_str::<Value>(&response.body) {
            Ok(Value::Object(mut obj)) => match obj.remove("products") {
                Some(Value::Array(products)) => Ok(products),
                _ => Ok(Vec::new()),
            },
            Ok(_) => Ok(Vec::new()),
            Err(e) => {
                warn!(error = %e, "Catalog search returned invalid JSON");
                Err(e.into())
            }
        }
    }

    fn cache_get(&self, key: &str) -> Option<Vec<CatalogProduct>> {
        let cache = self.cache.as_ref()?;
        match cache.get(key) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .map_err(|e| warn!(error = %e, key, "Discarding unreadable cache entry"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, key, "Cache read failed");
                None
            }
        }
    }

    fn cache_set(&self, key: &str, products: &[CatalogProduct]) {
        let Some(cache) = self.cache.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(products) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Could not serialise catalog results for cache");
                return;
            }
        };
        if let Err(e) = cache.set(key, &raw, SEARCH_CACHE_TTL) {
            warn!(error = %e, key, "Cache write failed");
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::cache::{CacheError, MemoryCache};
    use crate::catalog::transport::HttpResponse;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Recorded request
    #[derive(Debug, Clone)]
    pub struct Call {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    /// Transport that replays scripted responses in order and records calls
    #[derive(Default)]
    pub struct FakeTransport {
        responses: Mutex<VecDeque<Result<HttpResponse, CatalogError>>>,
        pub calls: Mutex<Vec<Call>>,
    }

    impl FakeTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn respond(self, status: u16, body: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(HttpResponse { status, body: body.to_string() }));
            self
        }

        pub fn fail(self, message: &str) -> Self {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(CatalogError::Network(message.to_string())));
            self
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl CatalogTransport for FakeTransport {
        fn get(&self, url: &str, query: &[(&str, String)], _timeout: Duration) -> Result<HttpResponse, CatalogError> {
            self.calls.lock().unwrap().push(Call {
                url: url.to_string(),
                query: query.iter().map(|(k, v)| (k.to_string(), v.clone())).collect(),
            });
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(CatalogError::Network("no scripted response".to_string())))
        }
    }

    struct BrokenCache;

    impl CacheStore for BrokenCache {
        fn get(&self, _key: &str) -> Result<Option<String>, CacheError> {
            Err(CacheError::Poisoned)
        }
        fn set(&self, _key: &str, _value: &str, _ttl: Duration) -> Result<(), CacheError> {
            Err(CacheError::Poisoned)
        }
    }

    fn client(transport: &Arc<FakeTransport>, cache: Option<Arc<dyn CacheStore>>) -> CatalogClient {
        CatalogClient::new(CatalogConfig::default(), transport.clone(), cache)
    }

    fn has_param(call: &Call, key: &str) -> bool {
        call.query.iter().any(|(k, _)| k == key)
    }

    fn param<'a>(call: &'a Call, key: &str) -> Option<&'a str> {
        call.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_blank_query_makes_no_request() {
        let transport = Arc::new(FakeTransport::new());
        let c = client(&transport, None);
        assert!(c.search("", 10).is_empty());
        assert!(c.search("   \t", 10).is_empty());
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn test_regional_empty_falls_back_to_unfiltered_search() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(200, r#"{"products": []}"#)
                .respond(200, r#"{"products": [{"code": "1", "product_name": "X", "brands": "B", "nutriments": {}}]}"#),
        );
        let c = client(&transport, None);

        let products = c.search("test", 1);
        assert_eq!(
            products,
            vec![CatalogProduct {
                code: "1".to_string(),
                name: "X".to_string(),
                brand: "B".to_string(),
                kcal_100g: None,
                protein_100g: None,
                fat_100g: None,
                carbs_100g: None,
            }]
        );

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].url.ends_with("/cgi/search.pl"));
        assert_eq!(param(&calls[0], "countries_tags_en"), Some("russia"));
        assert!(!has_param(&calls[1], "countries_tags_en"));
        assert_eq!(param(&calls[1], "search_terms"), Some("test"));
        assert_eq!(param(&calls[1], "page_size"), Some("1"));
        assert_eq!(param(&calls[1], "fields"), Some(SEARCH_FIELDS));
    }

    #[test]
    fn test_regional_hit_skips_fallback() {
        let transport = Arc::new(
            FakeTransport::new().respond(200, r#"{"products": [{"code": "7", "product_name": "Кефир"}]}"#),
        );
        let products = client(&transport, None).search("кефир", 5);
        assert_eq!(products.len(), 1);
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_limit_is_clamped() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(200, r#"{"products": [{"code": "1"}]}"#)
                .respond(200, r#"{"products": [{"code": "1"}]}"#),
        );
        let c = client(&transport, None);
        c.search("a", 500);
        c.search("b", 0);
        let calls = transport.calls();
        assert_eq!(param(&calls[0], "page_size"), Some("30"));
        assert_eq!(param(&calls[1], "page_size"), Some("1"));
    }

    #[test]
    fn test_failures_degrade_to_empty() {
        let transport = Arc::new(
            FakeTransport::new()
                .fail("timed out")
                .respond(500, "oops")
                .respond(200, "[1, 2, 3]")
                .respond(200, r#"{"products": "nope"}"#)
                .respond(200, "not json")
                .respond(200, "{}"),
        );
        let c = client(&transport, None);
        assert!(c.search("milk", 10).is_empty());
        assert!(c.search("bread", 10).is_empty());
        assert!(c.search("salt", 10).is_empty());
        assert_eq!(transport.calls().len(), 6);
    }

    #[test]
    fn test_entries_without_code_are_skipped() {
        let transport = Arc::new(FakeTransport::new().respond(
            200,
            r#"{"products": [{"product_name": "no code"}, "junk", {"code": "", "product_name": "blank"}, {"code": "9", "product_name": "ok"}]}"#,
        ));
        let products = client(&transport, None).search("x", 10);
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].code, "9");
    }

    #[test]
    fn test_cache_hit_skips_transport() {
        let transport = Arc::new(
            FakeTransport::new().respond(200, r#"{"products": [{"code": "5", "product_name": "Tvorog"}]}"#),
        );
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let c = client(&transport, Some(cache));

        let first = c.search("Tvorog", 10);
        let second = c.search("  tvorog ", 10);
        assert_eq!(first, second);
        assert_eq!(transport.calls().len(), 1);
    }

    #[test]
    fn test_empty_results_are_cached_too() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(200, r#"{"products": []}"#)
                .respond(200, r#"{"products": []}"#),
        );
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let c = client(&transport, Some(cache));
        assert!(c.search("zzz", 10).is_empty());
        assert!(c.search("zzz", 10).is_empty());
        assert_eq!(transport.calls().len(), 2);
    }

    #[test]
    fn test_outage_is_not_cached() {
        let transport = Arc::new(
            FakeTransport::new()
                .fail("timed out")
                .respond(503, "")
                .respond(200, r#"{"products": [{"code": "8", "product_name": "Ряженка"}]}"#),
        );
        let cache: Arc<dyn CacheStore> = Arc::new(MemoryCache::new());
        let c = client(&transport, Some(cache.clone()));

        assert!(c.search("ряженка", 10).is_empty());
        assert_eq!(cache.get("off_search_v3:ряженка:10").unwrap(), None);

        let products = c.search("ряженка", 10);
        assert_eq!(products.len(), 1);
        assert_eq!(transport.calls().len(), 3);
    }

    #[test]
    fn test_broken_cache_is_a_miss() {
        let transport = Arc::new(FakeTransport::new().respond(200, r#"{"products": [{"code": "3"}]}"#));
        let c = client(&transport, Some(Arc::new(BrokenCache)));
        assert_eq!(c.search("q", 10).len(), 1);
    }

    #[test]
    fn test_get_product() {
        let transport = Arc::new(FakeTransport::new().respond(
            200,
            r#"{"status": 1, "product": {"product_name": "Сырок", "brands": "Б.Ю.", "nutriments": {"energy-kcal_100g": "413", "proteins_100g": 8.5}}}"#,
        ));
        let c = client(&transport, None);
        let p = c.get_product(" 46001 ").unwrap().unwrap();
        assert_eq!(p.code, "46001");
        assert_eq!(p.name, "Сырок");
        assert_eq!(p.kcal_100g, Some(413.0));
        assert_eq!(p.protein_100g, Some(8.5));
        assert!(transport.calls()[0].url.ends_with("/api/v2/product/46001.json"));
    }

    #[test]
    fn test_get_product_not_found_and_failures() {
        let transport = Arc::new(
            FakeTransport::new()
                .respond(404, "")
                .respond(200, r#"{"status": 0, "status_verbose": "product not found"}"#)
                .respond(503, "")
                .fail("connection refused")
                .respond(200, "<html>"),
        );
        let c = client(&transport, None);
        assert!(c.get_product("").unwrap().is_none());
        assert!(c.get_product("1").unwrap().is_none());
        assert!(c.get_product("2").unwrap().is_none());
        assert!(matches!(c.get_product("3"), Err(CatalogError::Status(503))));
        assert!(matches!(c.get_product("4"), Err(CatalogError::Network(_))));
        assert!(matches!(c.get_product("5"), Err(CatalogError::Decode(_))));
    }

    #[test]
    fn test_non_numeric_codes_make_no_request() {
        let transport = Arc::new(FakeTransport::new());
        let c = client(&transport, None);
        for code in ["../../admin", "123?x=1", "12#3", "12/34", "abc", "4 6"] {
            assert!(c.get_product(code).unwrap().is_none(), "{}", code);
        }
        assert!(transport.calls().is_empty());
        assert!(is_barcode("4607001234567"));
        assert!(!is_barcode(""));
        assert_eq!(transport.calls().len(), 5);
    }
}
