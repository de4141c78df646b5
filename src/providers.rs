use std::fmt;
use url::Url;

use crate::browser::FetchProfile;
use crate::config::ScraperConfig;
use crate::extractors::{BpExtractor, PertaminaExtractor, PriceExtractor, ShellExtractor};

pub const PERTAMINA_URL: &str = "https://mypertamina.id/about/product-price";
pub const SHELL_URL: &str =
    "https://www.shell.co.id/in_id/pengendara-bermotor/bahan-bakar-shell/how-shell-price-fuel.html";
pub const BP_URL: &str = "https://www.bp.com/id_id/indonesia/home/produk-dan-layanan/spbu/harga.html";

/// One scrape target: where to go, how to load it, how to read it.
pub struct ProviderSpec {
    pub name: String,
    pub url: String,
    pub profile: FetchProfile,
    pub extractor: Box<dyn PriceExtractor>,
}

impl ProviderSpec {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        profile: FetchProfile,
        extractor: Box<dyn PriceExtractor>,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            profile,
            extractor,
        }
    }

    /// Host part of the target URL, for log lines.
    pub fn host(&self) -> Option<String> {
        Url::parse(&self.url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string))
    }
}

impl fmt::Debug for ProviderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSpec")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("profile", &self.profile)
            .field("extractor", &self.extractor.name())
            .finish()
    }
}

/// Providers in scrape order.
pub fn default_providers(config: &ScraperConfig) -> Vec<ProviderSpec> {
    let profile = FetchProfile::from_config(config);

    vec![
        ProviderSpec::new("Pertamina", PERTAMINA_URL, profile.clone(), Box::new(PertaminaExtractor::new())),
        ProviderSpec::new("Shell", SHELL_URL, profile.clone(), Box::new(ShellExtractor::new())),
        ProviderSpec::new("BP", BP_URL, profile, Box::new(BpExtractor::new())),
    ]
}
