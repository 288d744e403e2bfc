//! Server Configuration
//!
//! Everything is read from the environment (a `.env` file is loaded first).

use std::path::PathBuf;

use storefront_payments::DEFAULT_LINK_TTL_SECS;
use storefront_store::MongoConfig;

const DEFAULT_PORT: &str = "3000";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";
const DEFAULT_DATABASE: &str = "founderDB";
const DEFAULT_DOWNLOAD_DIR: &str = "pdfs";
const DEFAULT_ALLOWED_ORIGINS: [&str; 2] = [
    "http://localhost:5173",
    "https://founders-academy-front.vercel.app",
];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Public frontend, target of checkout redirects
    pub frontend_url: String,

    /// Public URL of this server, base of download links
    pub backend_url: String,

    /// Origins allowed to call the API from a browser
    pub allowed_origins: Vec<String>,

    /// Stripe secret key (None = payments disabled)
    pub stripe_secret_key: Option<String>,

    /// MongoDB connection (None = in-memory store)
    pub mongodb: Option<MongoConfig>,

    /// Directory holding the deliverable files
    pub download_dir: PathBuf,

    /// JSON catalog file (None = built-in catalog)
    pub catalog_path: Option<PathBuf>,

    /// Secret for signed download links (None = plain links)
    pub download_signing_secret: Option<String>,

    pub download_link_ttl_secs: i64,

    /// Whether call requests must name a company
    pub require_company: bool,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = var("PORT").unwrap_or_else(|| DEFAULT_PORT.into());
        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| format!("0.0.0.0:{port}"));

        let allowed_origins = var("ALLOWED_ORIGINS").map_or_else(
            || DEFAULT_ALLOWED_ORIGINS.iter().map(ToString::to_string).collect(),
            |list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|o| !o.is_empty())
                    .map(str::to_string)
                    .collect()
            },
        );

        let mongo_uri = var("MONGODB_URI").or_else(|| {
            let (user, pass, host) = (var("DB_USER")?, var("DB_PASS")?, var("DB_HOST")?);
            Some(format!("mongodb+srv://{user}:{pass}@{host}/?retryWrites=true&w=majority"))
        });
        let database = var("MONGODB_DATABASE").unwrap_or_else(|| DEFAULT_DATABASE.into());

        Self {
            bind_addr,
            frontend_url: var("FRONTEND_URL").unwrap_or_else(|| DEFAULT_FRONTEND_URL.into()),
            backend_url: var("BACKEND_URL").unwrap_or_else(|| format!("http://localhost:{port}")),
            allowed_origins,
            stripe_secret_key: var("STRIPE_SECRET_KEY"),
            mongodb: mongo_uri.map(|uri| MongoConfig::new(uri, database)),
            download_dir: var("DOWNLOAD_DIR").map_or_else(|| PathBuf::from(DEFAULT_DOWNLOAD_DIR), PathBuf::from),
            catalog_path: var("CATALOG_PATH").map(PathBuf::from),
            download_signing_secret: var("DOWNLOAD_SIGNING_SECRET"),
            download_link_ttl_secs: var("DOWNLOAD_LINK_TTL_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|ttl: &i64| *ttl > 0)
                .unwrap_or(DEFAULT_LINK_TTL_SECS),
            require_company: var("REQUIRE_COMPANY")
                .is_some_and(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes")),
        }
    }
}
